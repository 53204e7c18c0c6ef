//! The host REST server contract.
//!
//! The host owns the route table, dispatch, permission enforcement and
//! notice rendering. This crate only produces [`RouteDescriptor`]s and
//! submits them through these traits.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::callback::{Callback, HandlerFn, PermissionFn, SanitizeFn, ValidateFn};

/// Per-argument settings submitted with a route.
///
/// Absent fields are omitted when serialized.
#[derive(Debug, Clone, Serialize)]
pub struct ArgDescriptor {
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validate_callback: Option<Callback<ValidateFn>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sanitize_callback: Option<Callback<SanitizeFn>>,
}

/// Everything the host needs to serve one route.
#[derive(Debug, Clone, Serialize)]
pub struct RouteDescriptor {
    pub methods: String,
    pub callback: Callback<HandlerFn>,
    pub permission_callback: Callback<PermissionFn>,
    pub args: IndexMap<String, ArgDescriptor>,
}

/// The host's route table.
pub trait RestServer {
    /// Namespace keys (`"{namespace}/{version}"`) already known to the host.
    fn namespaces(&self) -> Vec<String>;

    /// Register one route. `replace` asks the host to replace an existing
    /// route with the same pattern instead of merging into it. Returns
    /// `false` when the host refuses the registration.
    fn register_route(
        &mut self,
        namespace: &str,
        route: &str,
        descriptor: RouteDescriptor,
        replace: bool,
    ) -> bool;
}

/// Listener fired once when the host initializes its REST API.
pub type InitListener = Box<dyn FnMut(&mut dyn RestServer)>;

/// The host's "REST API initialized" extension point.
pub trait InitHooks {
    fn on_rest_api_init(&mut self, listener: InitListener);
}

/// The host's admin-notice area and the privilege check that gates it.
pub trait AdminNotices {
    fn add_admin_notice(&self, html: String);

    fn current_user_can(&self, capability: &str) -> bool;
}
