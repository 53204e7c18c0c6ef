use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque request context handed to handler, permission, validation and
/// sanitization callbacks.
///
/// The host owns request parsing; this crate only carries what the host
/// passes through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestRequest {
    pub method: String,
    pub route: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl RestRequest {
    pub fn new(method: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            route: route.into(),
            params: Map::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }
}
