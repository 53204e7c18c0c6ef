//! Namespace registration root.
//!
//! A [`Namespace`] collects endpoints under a `"{namespace}/{version}"` key
//! and, once the host's REST API initializes, turns each endpoint into a
//! route pattern plus [`RouteDescriptor`] and submits it to the host.
//!
//! Registration order equals insertion order, both across endpoints and
//! across the parameters of one endpoint. The host matches overlapping
//! patterns in registration order, so reordering would change which route
//! serves an ambiguous request.

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::callback::{Callback, PermissionFn};
use crate::diagnostics::{AddOutcome, Diagnostic, DiagnosticSink};
use crate::endpoint::Endpoint;
use crate::host::{ArgDescriptor, InitHooks, RestServer, RouteDescriptor};

// ---------------------------------------------------------------------------
// Route assembly
// ---------------------------------------------------------------------------

/// The host-side namespace key.
pub fn namespace_key(namespace: &str, version: &str) -> String {
    format!("{namespace}/{version}")
}

/// Build the route pattern for an endpoint: `"/" + path`, followed by one
/// `/(?P<name>pattern)` group per path-segment parameter.
pub fn assemble_route(endpoint: &Endpoint) -> String {
    let mut route = format!("/{}", endpoint.path());
    for parameter in endpoint.parameters().values() {
        if parameter.is_path_segment() {
            route.push_str(&format!(
                "/(?P<{}>{})",
                parameter.name(),
                parameter.pattern()
            ));
        }
    }
    route
}

/// Build the per-argument descriptors for an endpoint.
///
/// `required` is always present; `default`, `validate_callback` and
/// `sanitize_callback` only when the parameter carries them (callbacks only
/// when invokable).
pub fn argument_descriptors(endpoint: &Endpoint) -> IndexMap<String, ArgDescriptor> {
    endpoint
        .parameters()
        .iter()
        .map(|(name, parameter)| {
            let descriptor = ArgDescriptor {
                required: parameter.is_required(),
                default: parameter.default().cloned(),
                validate_callback: parameter
                    .validation_callback()
                    .filter(|cb| cb.is_invokable())
                    .cloned(),
                sanitize_callback: parameter
                    .sanitization_callback()
                    .filter(|cb| cb.is_invokable())
                    .cloned(),
            };
            (name.clone(), descriptor)
        })
        .collect()
}

/// Build the full descriptor for an endpoint. The endpoint's own permission
/// callback wins when it is present and invokable; otherwise `fallback`
/// applies.
pub fn route_descriptor(endpoint: &Endpoint, fallback: &Callback<PermissionFn>) -> RouteDescriptor {
    let permission_callback = endpoint
        .permissions_callback()
        .filter(|cb| cb.is_invokable())
        .unwrap_or(fallback)
        .clone();

    RouteDescriptor {
        methods: endpoint.allowed_methods().to_string(),
        callback: endpoint.callback().clone(),
        permission_callback,
        args: argument_descriptors(endpoint),
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// `Accumulating` until the host's init hook has run the registration pass
/// once, `Registered` afterwards. There is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NamespaceState {
    Accumulating,
    Registered,
}

/// What one registration pass did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Registration {
    /// The key already existed on the host and override was off.
    Skipped { namespace: String },
    /// Routes were submitted; `refused` lists those the host turned down.
    Submitted {
        namespace: String,
        routes: Vec<String>,
        refused: Vec<String>,
    },
}

// ---------------------------------------------------------------------------
// Namespace
// ---------------------------------------------------------------------------

/// Configures a [`Namespace`] before it is attached to the host.
#[derive(Debug, Clone)]
pub struct NamespaceBuilder {
    namespace: String,
    version: String,
    permissions_callback: Option<Callback<PermissionFn>>,
    override_existing: bool,
}

impl NamespaceBuilder {
    /// Namespace-wide permission callback, used by endpoints without their own.
    pub fn permissions(mut self, callback: Callback<PermissionFn>) -> Self {
        self.permissions_callback = Some(callback);
        self
    }

    /// Register even when the host already has this namespace key.
    pub fn override_existing(mut self, override_existing: bool) -> Self {
        self.override_existing = override_existing;
        self
    }

    /// Create the namespace and subscribe its registration pass to the
    /// host's init hook.
    ///
    /// Without an explicit permission callback every request is allowed. If
    /// the permission callback is not invokable, a diagnostic is reported
    /// and the namespace never subscribes, so nothing it collects will reach
    /// the host.
    pub fn attach(self, hooks: &mut dyn InitHooks, sink: &dyn DiagnosticSink) -> Namespace {
        let permissions_callback = self
            .permissions_callback
            .unwrap_or_else(Callback::allow_all);
        let subscribed = permissions_callback.is_invokable();

        let namespace = Namespace {
            shared: Rc::new(Shared {
                namespace: self.namespace,
                version: self.version,
                permissions_callback,
                override_existing: self.override_existing,
                subscribed,
                state: Cell::new(NamespaceState::Accumulating),
                endpoints: RefCell::new(IndexMap::new()),
            }),
        };

        if subscribed {
            let handle = namespace.clone();
            hooks.on_rest_api_init(Box::new(move |server: &mut dyn RestServer| {
                handle.register(server);
            }));
            tracing::debug!(namespace = %namespace.key(), "Subscribed to REST API init");
        } else {
            sink.report(&Diagnostic::NonCallableNamespacePermissions {
                namespace: namespace.shared.namespace.clone(),
            });
        }

        namespace
    }
}

struct Shared {
    namespace: String,
    version: String,
    permissions_callback: Callback<PermissionFn>,
    override_existing: bool,
    subscribed: bool,
    state: Cell<NamespaceState>,
    endpoints: RefCell<IndexMap<String, Endpoint>>,
}

/// Shared handle to a namespace; the host's init listener holds a clone.
#[derive(Clone)]
pub struct Namespace {
    shared: Rc<Shared>,
}

impl Namespace {
    /// Start configuring a namespace; nothing touches the host until
    /// [`NamespaceBuilder::attach`].
    pub fn builder(namespace: impl Into<String>, version: impl Into<String>) -> NamespaceBuilder {
        NamespaceBuilder {
            namespace: namespace.into(),
            version: version.into(),
            permissions_callback: None,
            override_existing: false,
        }
    }

    /// Attach endpoints in order.
    ///
    /// An endpoint is skipped (and reported) when its path is already taken,
    /// its handler is not invokable, or it carries a permission callback
    /// that is not invokable. Once the namespace has registered, every
    /// endpoint is rejected since it could never reach the host.
    pub fn add_endpoints<I>(&self, endpoints: I, sink: &dyn DiagnosticSink) -> AddOutcome
    where
        I: IntoIterator<Item = Endpoint>,
    {
        let mut outcome = AddOutcome::default();
        let registered = self.state() == NamespaceState::Registered;

        for endpoint in endpoints {
            let path = endpoint.path().to_string();
            let namespace = self.shared.namespace.clone();

            if registered {
                outcome.reject(
                    Diagnostic::EndpointAfterRegistration {
                        endpoint: path,
                        namespace,
                    },
                    sink,
                );
                continue;
            }

            if self.shared.endpoints.borrow().contains_key(&path) {
                outcome.reject(
                    Diagnostic::DuplicateEndpoint {
                        endpoint: path,
                        namespace,
                    },
                    sink,
                );
                continue;
            }

            if !endpoint.callback().is_invokable() {
                outcome.reject(
                    Diagnostic::NonCallableEndpointCallback {
                        endpoint: path,
                        namespace,
                    },
                    sink,
                );
                continue;
            }

            if endpoint
                .permissions_callback()
                .is_some_and(|cb| !cb.is_invokable())
            {
                outcome.reject(
                    Diagnostic::NonCallableEndpointPermissions {
                        endpoint: path,
                        namespace,
                    },
                    sink,
                );
                continue;
            }

            tracing::debug!(namespace = %self.key(), endpoint = %path, "Endpoint attached");
            outcome.accept(&path);
            self.shared.endpoints.borrow_mut().insert(path, endpoint);
        }

        outcome
    }

    /// Run the registration pass against `server`.
    ///
    /// Normally invoked by the init hook. A no-op when the host already has
    /// this namespace key and override is off.
    pub fn register(&self, server: &mut dyn RestServer) -> Registration {
        let key = self.key();
        self.shared.state.set(NamespaceState::Registered);

        if !self.shared.override_existing && server.namespaces().iter().any(|n| *n == key) {
            tracing::info!(namespace = %key, "Namespace already on host, skipping registration");
            return Registration::Skipped { namespace: key };
        }

        // Built up front so the host never runs while the endpoint map is borrowed.
        let pending: Vec<(String, RouteDescriptor, bool)> = self
            .shared
            .endpoints
            .borrow()
            .values()
            .map(|endpoint| {
                (
                    assemble_route(endpoint),
                    route_descriptor(endpoint, &self.shared.permissions_callback),
                    endpoint.overrides_existing(),
                )
            })
            .collect();
        let mut routes = Vec::with_capacity(pending.len());
        let mut refused = Vec::new();

        for (route, descriptor, replace) in pending {
            let methods = descriptor.methods.clone();
            if server.register_route(&key, &route, descriptor, replace) {
                tracing::debug!(namespace = %key, route = %route, methods = %methods, "Route submitted");
                routes.push(route);
            } else {
                tracing::warn!(namespace = %key, route = %route, "Host refused route");
                refused.push(route);
            }
        }

        tracing::info!(
            namespace = %key,
            routes = routes.len(),
            refused = refused.len(),
            "Namespace registered"
        );

        Registration::Submitted {
            namespace: key,
            routes,
            refused,
        }
    }

    /// `"{namespace}/{version}"`.
    pub fn key(&self) -> String {
        namespace_key(&self.shared.namespace, &self.shared.version)
    }

    /// Namespace name without the version.
    pub fn namespace(&self) -> &str {
        &self.shared.namespace
    }

    /// Version segment of the key.
    pub fn version(&self) -> &str {
        &self.shared.version
    }

    /// Fallback permission callback for endpoints without their own.
    pub fn permissions_callback(&self) -> &Callback<PermissionFn> {
        &self.shared.permissions_callback
    }

    /// Whether registration proceeds when the host already has the key.
    pub fn overrides_existing(&self) -> bool {
        self.shared.override_existing
    }

    /// Whether the registration pass was subscribed to the host's init hook.
    pub fn is_subscribed(&self) -> bool {
        self.shared.subscribed
    }

    /// Current lifecycle state.
    pub fn state(&self) -> NamespaceState {
        self.shared.state.get()
    }

    /// Attached endpoints in insertion order.
    pub fn endpoints(&self) -> Ref<'_, IndexMap<String, Endpoint>> {
        self.shared.endpoints.borrow()
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("key", &self.key())
            .field("override_existing", &self.shared.override_existing)
            .field("subscribed", &self.shared.subscribed)
            .field("state", &self.state())
            .field("endpoints", &self.endpoints().keys().collect::<Vec<_>>())
            .finish()
    }
}
