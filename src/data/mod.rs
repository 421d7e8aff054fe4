//! Three-layer read/write handle over a value tree, passed to every adapter
//! callback: the configured tree from the user, the prior state from the last
//! apply, and the new state the callback is building.

use std::collections::BTreeMap;
use std::collections::HashSet;

use crate::value::{AttrPath, Value};

#[derive(Clone)]
pub struct ResourceData {
    id: String,
    config: Value,
    prior: Value,
    state: Value,
    partial: HashSet<String>,
}

impl ResourceData {
    /// Fresh handle for a create: no prior state, no ID.
    pub fn for_create(config: Value) -> Self {
        ResourceData {
            id: String::new(),
            config,
            prior: Value::Null,
            state: Value::Object(BTreeMap::new()),
            partial: HashSet::new(),
        }
    }

    /// Handle for refresh/update/delete against a known instance.
    pub fn for_instance(id: impl Into<String>, prior: Value, config: Value) -> Self {
        ResourceData {
            id: id.into(),
            config,
            prior,
            state: Value::Object(BTreeMap::new()),
            partial: HashSet::new(),
        }
    }

    /// Handle seeded with only an ID, as the import contract requires.
    pub fn for_import(id: impl Into<String>) -> Self {
        ResourceData {
            id: id.into(),
            config: Value::Null,
            prior: Value::Null,
            state: Value::Object(BTreeMap::new()),
            partial: HashSet::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Empty ID means "does not exist"; setting it empty inside read is the
    /// canonical deleted-remotely signal.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Read the effective value at a path: configured value if the user set
    /// one, otherwise whatever the new state or prior state holds.
    pub fn get(&self, path: &AttrPath) -> Value {
        self.get_ok(path).unwrap_or(Value::Null)
    }

    /// Like `get` but reports whether the path was set at all.
    pub fn get_ok(&self, path: &AttrPath) -> Option<Value> {
        for layer in [&self.config, &self.state, &self.prior] {
            if let Some(v) = layer.get(path) {
                if !v.is_null() {
                    return Some(v.clone());
                }
            }
        }
        None
    }

    /// Read from the configured layer only.
    pub fn config(&self, path: &AttrPath) -> Option<Value> {
        self.config.get(path).filter(|v| !v.is_null()).cloned()
    }

    /// Read from the prior-state layer only.
    pub fn prior(&self, path: &AttrPath) -> Option<Value> {
        self.prior.get(path).filter(|v| !v.is_null()).cloned()
    }

    /// Write into the new state being built (flatten target).
    pub fn set(&mut self, path: &AttrPath, value: Value) {
        // The state root is always an object; a write can only fail on a
        // kind clash deeper down, which means the adapter's flatten is
        // inconsistent with its own earlier writes.
        if let Err(err) = self.state.set(path, value) {
            tracing::error!(path = %path, error = %err, "dropping inconsistent state write");
        }
    }

    /// Raw comparison between prior state and configuration. Adapters use
    /// this to skip work; the planner applies normalization and suppression
    /// separately.
    pub fn has_change(&self, path: &AttrPath) -> bool {
        let (old, new) = self.get_change(path);
        old != new
    }

    /// The (prior, configured) pair at a path.
    pub fn get_change(&self, path: &AttrPath) -> (Value, Value) {
        let old = self.prior.get(path).cloned().unwrap_or(Value::Null);
        let new = self.config.get(path).cloned().unwrap_or(Value::Null);
        (old, new)
    }

    /// Advisory: this attribute has been persisted remotely even if a later
    /// step of the same callback fails.
    pub fn partial_mark(&mut self, path: &AttrPath) {
        self.partial.insert(path.to_string());
    }

    pub fn is_partial(&self, path: &AttrPath) -> bool {
        self.partial.contains(&path.to_string())
    }

    pub fn partial_paths(&self) -> impl Iterator<Item = &str> {
        self.partial.iter().map(String::as_str)
    }

    pub fn config_root(&self) -> &Value {
        &self.config
    }

    pub fn prior_root(&self) -> &Value {
        &self.prior
    }

    pub fn state_root(&self) -> &Value {
        &self.state
    }

    /// Hand the freshly-built state to the engine. Attributes the callback
    /// never wrote fall back to nothing; the engine normalizes before
    /// persisting.
    pub fn take_state(&mut self) -> Value {
        std::mem::replace(&mut self.state, Value::Object(BTreeMap::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> AttrPath {
        s.parse().unwrap()
    }

    #[test]
    fn get_prefers_config_over_prior() {
        let prior = Value::object([("name", Value::string("old"))]);
        let config = Value::object([("name", Value::string("new"))]);
        let data = ResourceData::for_instance("42", prior, config);
        assert_eq!(data.get(&path("name")), Value::string("new"));
        assert_eq!(data.prior(&path("name")), Some(Value::string("old")));
    }

    #[test]
    fn get_falls_back_to_prior_when_unconfigured() {
        let prior = Value::object([("external_id", Value::string("ext-1"))]);
        let data = ResourceData::for_instance("42", prior, Value::object([]));
        assert_eq!(data.get(&path("external_id")), Value::string("ext-1"));
        assert_eq!(data.get_ok(&path("missing")), None);
    }

    #[test]
    fn change_detection() {
        let prior = Value::object([("message", Value::string("notify"))]);
        let config = Value::object([("message", Value::string("page"))]);
        let data = ResourceData::for_instance("42", prior, config);
        assert!(data.has_change(&path("message")));
        let (old, new) = data.get_change(&path("message"));
        assert_eq!(old, Value::string("notify"));
        assert_eq!(new, Value::string("page"));
        assert!(!data.has_change(&path("absent")));
    }

    #[test]
    fn partial_marks_survive() {
        let mut data = ResourceData::for_create(Value::object([]));
        data.partial_mark(&path("membership"));
        assert!(data.is_partial(&path("membership")));
        assert!(!data.is_partial(&path("name")));
    }
}
