//! Declarative JSON manifest for namespaces, endpoints and parameters.
//!
//! Callbacks are referenced by name and resolved through a
//! [`CallbackRegistry`]. A name the registry does not know becomes an
//! unresolved callback and is turned away by the usual accumulation checks,
//! so a manifest with a typo still installs everything else.
//!
//! ```json
//! {
//!   "namespaces": [{
//!     "namespace": "demo",
//!     "version": "v1",
//!     "endpoints": [{
//!       "endpoint": "items",
//!       "methods": "GET",
//!       "callback": "list_items",
//!       "parameters": [{ "name": "id", "type": "/", "match": "[0-9]+", "required": true }]
//!     }]
//!   }]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::callback::{Callback, HandlerFn, PermissionFn, SanitizeFn, ValidateFn};
use crate::diagnostics::{AddOutcome, DiagnosticSink};
use crate::endpoint::Endpoint;
use crate::error::{CoreError, RestError};
use crate::host::InitHooks;
use crate::namespace::Namespace;
use crate::parameter::{Parameter, DEFAULT_MATCH, DEFAULT_TYPE};
use crate::types::RestRequest;

// ---------------------------------------------------------------------------
// Manifest types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestManifest {
    #[serde(default)]
    pub namespaces: Vec<NamespaceManifest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceManifest {
    pub namespace: String,
    pub version: String,
    #[serde(default)]
    pub permission_callback: Option<String>,
    #[serde(default, rename = "override")]
    pub override_existing: bool,
    #[serde(default)]
    pub endpoints: Vec<EndpointManifest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointManifest {
    pub endpoint: String,
    pub methods: String,
    pub callback: String,
    #[serde(default)]
    pub permission_callback: Option<String>,
    #[serde(default, rename = "override")]
    pub override_existing: bool,
    #[serde(default)]
    pub parameters: Vec<ParameterManifest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterManifest {
    pub name: String,
    #[serde(default = "default_type", rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub required: bool,
    #[serde(default = "default_match", rename = "match")]
    pub pattern: String,
    #[serde(default)]
    pub validate_callback: Option<String>,
    #[serde(default)]
    pub sanitize_callback: Option<String>,
}

fn default_type() -> String {
    DEFAULT_TYPE.to_string()
}

fn default_match() -> String {
    DEFAULT_MATCH.to_string()
}

// ---------------------------------------------------------------------------
// Parsing and validation
// ---------------------------------------------------------------------------

/// Parse a manifest from JSON text.
pub fn parse_manifest(json: &str) -> Result<RestManifest, CoreError> {
    Ok(serde_json::from_str(json)?)
}

/// Read, parse and validate a manifest file.
pub fn load_manifest(path: &Path) -> Result<RestManifest, CoreError> {
    let text = std::fs::read_to_string(path)?;
    let manifest = parse_manifest(&text)?;
    validate_manifest(&manifest)?;
    Ok(manifest)
}

/// Check the structural fields the accumulation checks do not cover.
///
/// Returns the first problem found.
pub fn validate_manifest(manifest: &RestManifest) -> Result<(), CoreError> {
    for (i, ns) in manifest.namespaces.iter().enumerate() {
        if ns.namespace.trim().is_empty() {
            return Err(CoreError::Manifest(format!(
                "namespaces[{i}]: namespace must not be empty"
            )));
        }
        if ns.version.trim().is_empty() {
            return Err(CoreError::Manifest(format!(
                "namespace '{}': version must not be empty",
                ns.namespace
            )));
        }

        for ep in &ns.endpoints {
            if ep.endpoint.trim().is_empty() {
                return Err(CoreError::Manifest(format!(
                    "namespace '{}': endpoint path must not be empty",
                    ns.namespace
                )));
            }
            if ep.methods.trim().is_empty() {
                return Err(CoreError::Manifest(format!(
                    "endpoint '{}': methods must not be empty",
                    ep.endpoint
                )));
            }
            if let Some(param) = ep.parameters.iter().find(|p| p.name.trim().is_empty()) {
                return Err(CoreError::Manifest(format!(
                    "endpoint '{}': parameter name must not be empty (type '{}')",
                    ep.endpoint, param.kind
                )));
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Callback registry
// ---------------------------------------------------------------------------

/// Named callbacks available to manifests.
#[derive(Default)]
pub struct CallbackRegistry {
    handlers: HashMap<String, Arc<HandlerFn>>,
    permissions: HashMap<String, Arc<PermissionFn>>,
    validators: HashMap<String, Arc<ValidateFn>>,
    sanitizers: HashMap<String, Arc<SanitizeFn>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the `__return_true` and `__return_false`
    /// permission callbacks.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_permission("__return_true", |_| Ok(true));
        registry.register_permission("__return_false", |_| Ok(false));
        registry
    }

    pub fn register_handler<H>(&mut self, name: &str, handler: H) -> &mut Self
    where
        H: Fn(&RestRequest) -> Result<Value, RestError> + Send + Sync + 'static,
    {
        self.handlers.insert(name.to_string(), Arc::new(handler));
        self
    }

    pub fn register_permission<P>(&mut self, name: &str, check: P) -> &mut Self
    where
        P: Fn(&RestRequest) -> Result<bool, RestError> + Send + Sync + 'static,
    {
        self.permissions.insert(name.to_string(), Arc::new(check));
        self
    }

    pub fn register_validator<V>(&mut self, name: &str, validate: V) -> &mut Self
    where
        V: Fn(&Value, &RestRequest, &str) -> bool + Send + Sync + 'static,
    {
        self.validators.insert(name.to_string(), Arc::new(validate));
        self
    }

    pub fn register_sanitizer<S>(&mut self, name: &str, sanitize: S) -> &mut Self
    where
        S: Fn(&Value, &RestRequest, &str) -> Value + Send + Sync + 'static,
    {
        self.sanitizers.insert(name.to_string(), Arc::new(sanitize));
        self
    }

    pub fn handler(&self, name: &str) -> Callback<HandlerFn> {
        resolve(&self.handlers, name)
    }

    pub fn permission(&self, name: &str) -> Callback<PermissionFn> {
        resolve(&self.permissions, name)
    }

    pub fn validator(&self, name: &str) -> Callback<ValidateFn> {
        resolve(&self.validators, name)
    }

    pub fn sanitizer(&self, name: &str) -> Callback<SanitizeFn> {
        resolve(&self.sanitizers, name)
    }
}

fn resolve<F: ?Sized>(table: &HashMap<String, Arc<F>>, name: &str) -> Callback<F> {
    match table.get(name) {
        Some(func) => Callback::from_arc(name, Arc::clone(func)),
        None => {
            tracing::debug!(callback = %name, "Callback name did not resolve");
            Callback::unresolved(name)
        }
    }
}

// ---------------------------------------------------------------------------
// Installation
// ---------------------------------------------------------------------------

impl ParameterManifest {
    pub fn build(&self, registry: &CallbackRegistry) -> Parameter {
        let mut parameter = Parameter::new(&self.name)
            .kind(&self.kind)
            .required(self.required)
            .matching(&self.pattern);
        if let Some(default) = &self.default {
            parameter = parameter.default_value(default.clone());
        }
        if let Some(name) = &self.validate_callback {
            parameter = parameter.validate_with(registry.validator(name));
        }
        if let Some(name) = &self.sanitize_callback {
            parameter = parameter.sanitize_with(registry.sanitizer(name));
        }
        parameter
    }
}

impl EndpointManifest {
    pub fn build(&self, registry: &CallbackRegistry, sink: &dyn DiagnosticSink) -> Endpoint {
        let mut endpoint = Endpoint::new(
            &self.endpoint,
            &self.methods,
            registry.handler(&self.callback),
        )
        .override_existing(self.override_existing);
        if let Some(name) = &self.permission_callback {
            endpoint = endpoint.with_permissions(registry.permission(name));
        }
        endpoint.with_parameters(self.parameters.iter().map(|p| p.build(registry)), sink)
    }
}

impl NamespaceManifest {
    /// Create the namespace, subscribe it to `hooks` and attach its
    /// endpoints. Returns the namespace with the endpoint outcome.
    pub fn install(
        &self,
        registry: &CallbackRegistry,
        hooks: &mut dyn InitHooks,
        sink: &dyn DiagnosticSink,
    ) -> (Namespace, AddOutcome) {
        let mut builder = Namespace::builder(&self.namespace, &self.version)
            .override_existing(self.override_existing);
        if let Some(name) = &self.permission_callback {
            builder = builder.permissions(registry.permission(name));
        }
        let namespace = builder.attach(hooks, sink);
        let outcome =
            namespace.add_endpoints(self.endpoints.iter().map(|e| e.build(registry, sink)), sink);
        (namespace, outcome)
    }
}

impl RestManifest {
    /// Install every namespace in declaration order. Endpoint outcomes are
    /// merged across namespaces.
    pub fn install(
        &self,
        registry: &CallbackRegistry,
        hooks: &mut dyn InitHooks,
        sink: &dyn DiagnosticSink,
    ) -> (Vec<Namespace>, AddOutcome) {
        let mut outcome = AddOutcome::default();
        let namespaces = self
            .namespaces
            .iter()
            .map(|ns| {
                let (namespace, added) = ns.install(registry, hooks, sink);
                outcome.merge(added);
                namespace
            })
            .collect();
        (namespaces, outcome)
    }
}
