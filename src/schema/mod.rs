pub mod validate;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::diag::Diagnostics;
use crate::value::{AttrPath, Value};

/// Validates one configured value; diagnostics should carry the given path.
pub type ValidatorFn = Arc<dyn Fn(&Value, &AttrPath) -> Diagnostics + Send + Sync>;

/// Decides whether a (prior, configured) pair should be treated as equal for
/// planning. Receives the full configured root so gates on sibling attributes
/// are possible.
pub type SuppressFn = Arc<dyn Fn(&AttrPath, &Value, &Value, &Value) -> bool + Send + Sync>;

/// Canonicalizes a value before it enters prior state.
pub type NormalizeFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

#[derive(Clone)]
pub enum DefaultValue {
    Static(Value),
    Producer(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    pub fn produce(&self) -> Value {
        match self {
            DefaultValue::Static(v) => v.clone(),
            DefaultValue::Producer(f) => f(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requiredness {
    Required,
    Optional,
    /// Filled by the server, never by the user.
    Computed,
    /// User may set; if unset, the server decides.
    OptionalComputed,
}

impl Requiredness {
    pub fn user_settable(self) -> bool {
        !matches!(self, Requiredness::Computed)
    }

    pub fn computed(self) -> bool {
        matches!(self, Requiredness::Computed | Requiredness::OptionalComputed)
    }
}

/// Shape of one attribute. Composite kinds carry their element or object
/// shape recursively.
#[derive(Clone)]
pub enum Kind {
    String,
    Int,
    Float,
    Bool,
    List(Box<AttributeSchema>),
    Set(Box<AttributeSchema>),
    Map(Box<AttributeSchema>),
    Object(BTreeMap<String, AttributeSchema>),
}

impl Kind {
    pub fn name(&self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::Bool => "bool",
            Kind::List(_) => "list",
            Kind::Set(_) => "set",
            Kind::Map(_) => "map",
            Kind::Object(_) => "object",
        }
    }
}

/// Pure description of one attribute: no I/O, no references to the API
/// client. Built with the chained constructors below.
#[derive(Clone)]
pub struct AttributeSchema {
    pub kind: Kind,
    pub requiredness: Requiredness,
    pub force_new: bool,
    pub sensitive: bool,
    pub default: Option<DefaultValue>,
    pub validator: Option<ValidatorFn>,
    pub suppress_diff: Option<SuppressFn>,
    pub state_normalize: Option<NormalizeFn>,
    pub deprecated: Option<String>,
    pub conflicts_with: Vec<String>,
    pub exactly_one_of: Vec<String>,
    pub at_least_one_of: Vec<String>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
}

impl AttributeSchema {
    pub fn new(kind: Kind) -> Self {
        AttributeSchema {
            kind,
            requiredness: Requiredness::Optional,
            force_new: false,
            sensitive: false,
            default: None,
            validator: None,
            suppress_diff: None,
            state_normalize: None,
            deprecated: None,
            conflicts_with: Vec::new(),
            exactly_one_of: Vec::new(),
            at_least_one_of: Vec::new(),
            min_items: None,
            max_items: None,
        }
    }

    pub fn string() -> Self {
        AttributeSchema::new(Kind::String)
    }

    pub fn int() -> Self {
        AttributeSchema::new(Kind::Int)
    }

    pub fn float() -> Self {
        AttributeSchema::new(Kind::Float)
    }

    pub fn bool() -> Self {
        AttributeSchema::new(Kind::Bool)
    }

    pub fn list_of(element: AttributeSchema) -> Self {
        AttributeSchema::new(Kind::List(Box::new(element)))
    }

    pub fn set_of(element: AttributeSchema) -> Self {
        AttributeSchema::new(Kind::Set(Box::new(element)))
    }

    pub fn map_of(element: AttributeSchema) -> Self {
        AttributeSchema::new(Kind::Map(Box::new(element)))
    }

    pub fn object(shape: impl IntoIterator<Item = (&'static str, AttributeSchema)>) -> Self {
        AttributeSchema::new(Kind::Object(
            shape.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        ))
    }

    pub fn required(mut self) -> Self {
        self.requiredness = Requiredness::Required;
        self
    }

    pub fn computed(mut self) -> Self {
        self.requiredness = Requiredness::Computed;
        self
    }

    pub fn optional_computed(mut self) -> Self {
        self.requiredness = Requiredness::OptionalComputed;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(DefaultValue::Static(value));
        self
    }

    pub fn default_producer(mut self, f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.default = Some(DefaultValue::Producer(Arc::new(f)));
        self
    }

    pub fn validator(
        mut self,
        f: impl Fn(&Value, &AttrPath) -> Diagnostics + Send + Sync + 'static,
    ) -> Self {
        self.validator = Some(Arc::new(f));
        self
    }

    pub fn suppress(
        mut self,
        f: impl Fn(&AttrPath, &Value, &Value, &Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.suppress_diff = Some(Arc::new(f));
        self
    }

    pub fn normalize(mut self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.state_normalize = Some(Arc::new(f));
        self
    }

    pub fn deprecated(mut self, message: impl Into<String>) -> Self {
        self.deprecated = Some(message.into());
        self
    }

    pub fn conflicts_with(mut self, paths: &[&str]) -> Self {
        self.conflicts_with = paths.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn exactly_one_of(mut self, paths: &[&str]) -> Self {
        self.exactly_one_of = paths.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn at_least_one_of(mut self, paths: &[&str]) -> Self {
        self.at_least_one_of = paths.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn min_items(mut self, n: usize) -> Self {
        self.min_items = Some(n);
        self
    }

    pub fn max_items(mut self, n: usize) -> Self {
        self.max_items = Some(n);
        self
    }
}

/// Per-operation timeouts; the engine cancels a callback that exceeds its
/// budget and preserves prior state.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            create: Duration::from_secs(300),
            read: Duration::from_secs(120),
            update: Duration::from_secs(300),
            delete: Duration::from_secs(300),
        }
    }
}

/// Pure declarative description of a resource type. Lifecycle callbacks live
/// on the adapter trait; `supports_update = false` makes every top-level
/// attribute behave as force-new.
pub struct ResourceSchema {
    pub attributes: BTreeMap<String, AttributeSchema>,
    pub timeouts: Timeouts,
    pub deprecation_message: Option<String>,
    pub supports_update: bool,
}

impl ResourceSchema {
    pub fn new(attributes: impl IntoIterator<Item = (&'static str, AttributeSchema)>) -> Self {
        ResourceSchema {
            attributes: attributes
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            timeouts: Timeouts::default(),
            deprecation_message: None,
            supports_update: true,
        }
    }

    pub fn timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn without_update(mut self) -> Self {
        self.supports_update = false;
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeSchema> {
        self.attributes.get(name)
    }

    /// Schema sanity, checked once at registration. Catches descriptions
    /// that the type system cannot: required+computed, required with a
    /// default, cardinality bounds on scalars.
    pub fn check_consistency(&self) -> Result<(), String> {
        for (name, attr) in &self.attributes {
            check_attribute(name, attr)?;
        }
        Ok(())
    }
}

fn check_attribute(name: &str, attr: &AttributeSchema) -> Result<(), String> {
    if attr.requiredness == Requiredness::Required && attr.default.is_some() {
        return Err(format!("attribute '{name}': required attributes cannot have a default"));
    }
    if attr.requiredness == Requiredness::Computed && attr.default.is_some() {
        return Err(format!("attribute '{name}': computed attributes cannot have a default"));
    }
    if attr.requiredness == Requiredness::Required && !attr.conflicts_with.is_empty() {
        return Err(format!(
            "attribute '{name}': required attributes cannot declare conflicts_with"
        ));
    }
    match &attr.kind {
        Kind::List(el) | Kind::Set(el) | Kind::Map(el) => check_attribute(name, el)?,
        Kind::Object(shape) => {
            for (child, child_attr) in shape {
                check_attribute(&format!("{name}.{child}"), child_attr)?;
            }
        }
        _ => {
            if attr.min_items.is_some() || attr.max_items.is_some() {
                return Err(format!(
                    "attribute '{name}': min_items/max_items only apply to collections"
                ));
            }
        }
    }
    Ok(())
}
