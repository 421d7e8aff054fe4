use std::fmt;
use std::str::FromStr;

/// One step into a value tree: an object/map key or a list index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Key(k) => write!(f, "{k}"),
            PathStep::Index(i) => write!(f, "{i}"),
        }
    }
}

/// Dotted attribute path, e.g. `monitor_thresholds.0.warning`. Purely
/// numeric segments parse as indexes, everything else as keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AttrPath(Vec<PathStep>);

impl AttrPath {
    pub fn root() -> Self {
        AttrPath(Vec::new())
    }

    pub fn attr(name: impl Into<String>) -> Self {
        AttrPath(vec![PathStep::Key(name.into())])
    }

    pub fn key(mut self, name: impl Into<String>) -> Self {
        self.0.push(PathStep::Key(name.into()));
        self
    }

    pub fn index(mut self, i: usize) -> Self {
        self.0.push(PathStep::Index(i));
        self
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The top-level attribute name this path descends into, if any.
    pub fn first_key(&self) -> Option<&str> {
        match self.0.first() {
            Some(PathStep::Key(k)) => Some(k),
            _ => None,
        }
    }

    pub fn starts_with(&self, prefix: &AttrPath) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }
}

impl fmt::Display for AttrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

impl FromStr for AttrPath {
    type Err = std::convert::Infallible;

    /// A purely numeric segment always becomes an index, so a map key that
    /// happens to look numeric (a `silenced` scope of "0", say) cannot be
    /// spelled in dotted form. Use the `attr`/`key` builders for those.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(AttrPath::root());
        }
        Ok(AttrPath(
            s.split('.')
                .map(|seg| match seg.parse::<usize>() {
                    Ok(i) => PathStep::Index(i),
                    Err(_) => PathStep::Key(seg.to_string()),
                })
                .collect(),
        ))
    }
}
