//! In-memory implementation of the host contract.
//!
//! Stands in for the CMS REST server in tests and in the `restns` tool: a
//! route table with the host's merge/replace rules, an init-hook registry,
//! and an admin-notice board.

use std::cell::RefCell;
use std::collections::BTreeSet;

use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::diagnostics::ADMIN_CAPABILITY;
use crate::host::{AdminNotices, InitHooks, InitListener, RestServer, RouteDescriptor};

// ---------------------------------------------------------------------------
// Route table
// ---------------------------------------------------------------------------

/// Route table keyed by namespace key, then by route pattern, both in
/// registration order. Each pattern holds one or more handler descriptors.
#[derive(Debug, Default, Clone, Serialize)]
#[serde(transparent)]
pub struct InMemoryServer {
    namespaces: IndexMap<String, IndexMap<String, Vec<RouteDescriptor>>>,
}

/// A route that matched a request path.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    pub namespace: &'a str,
    pub route: &'a str,
    pub descriptor: &'a RouteDescriptor,
    /// Named captures from the route pattern.
    pub params: Map<String, Value>,
}

impl InMemoryServer {
    /// An empty route table.
    pub fn new() -> Self {
        Self::default()
    }

    /// A server that already knows the given namespace keys, as if another
    /// plugin had registered them.
    pub fn with_namespaces<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let namespaces = keys
            .into_iter()
            .map(|key| (key.into().trim_matches('/').to_string(), IndexMap::new()))
            .collect();
        Self { namespaces }
    }

    /// Route patterns registered under `namespace`, in order.
    pub fn routes(&self, namespace: &str) -> Vec<&str> {
        self.namespaces
            .get(namespace)
            .map(|routes| routes.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Handler descriptors for one route pattern.
    pub fn handlers(&self, namespace: &str, route: &str) -> &[RouteDescriptor] {
        self.namespaces
            .get(namespace)
            .and_then(|routes| routes.get(route))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Route patterns across all namespaces.
    pub fn route_count(&self) -> usize {
        self.namespaces.values().map(IndexMap::len).sum()
    }

    /// Find the first route, in registration order, whose pattern matches
    /// `path` and which has a handler accepting `method`.
    ///
    /// `path` is the full REST path, e.g. `/demo/v1/items/7`. Matching is
    /// case-insensitive.
    pub fn match_route(&self, method: &str, path: &str) -> Option<RouteMatch<'_>> {
        for (namespace, routes) in &self.namespaces {
            for (route, descriptors) in routes {
                let pattern = format!("(?i)^/{namespace}{route}$");
                let regex = match Regex::new(&pattern) {
                    Ok(regex) => regex,
                    Err(err) => {
                        tracing::warn!(pattern = %pattern, error = %err, "Route pattern does not compile");
                        continue;
                    }
                };
                let Some(captures) = regex.captures(path) else {
                    continue;
                };
                let Some(descriptor) = descriptors
                    .iter()
                    .find(|d| allows_method(&d.methods, method))
                else {
                    continue;
                };

                let params = regex
                    .capture_names()
                    .flatten()
                    .filter_map(|name| {
                        captures
                            .name(name)
                            .map(|m| (name.to_string(), Value::String(m.as_str().to_string())))
                    })
                    .collect();

                return Some(RouteMatch {
                    namespace: namespace.as_str(),
                    route: route.as_str(),
                    descriptor,
                    params,
                });
            }
        }
        None
    }
}

/// Whether a methods string such as `"GET, POST"` admits `method`.
pub fn allows_method(methods: &str, method: &str) -> bool {
    methods
        .split([',', '|', ' '])
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .any(|m| m.eq_ignore_ascii_case(method))
}

impl RestServer for InMemoryServer {
    fn namespaces(&self) -> Vec<String> {
        self.namespaces.keys().cloned().collect()
    }

    fn register_route(
        &mut self,
        namespace: &str,
        route: &str,
        descriptor: RouteDescriptor,
        replace: bool,
    ) -> bool {
        let namespace = namespace.trim_matches('/');
        if namespace.is_empty() {
            tracing::warn!(route = %route, "Routes must be namespaced");
            return false;
        }
        if route.trim_matches('/').is_empty() {
            tracing::warn!(namespace = %namespace, "Route pattern must not be empty");
            return false;
        }

        let routes = self.namespaces.entry(namespace.to_string()).or_default();
        match routes.get_mut(route) {
            Some(existing) if !replace => existing.push(descriptor),
            _ => {
                routes.insert(route.to_string(), vec![descriptor]);
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Init hooks
// ---------------------------------------------------------------------------

/// Listeners for the "REST API initialized" event, fired in subscription
/// order.
#[derive(Default)]
pub struct HookRegistry {
    listeners: Vec<InitListener>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Run every listener against `server`. Returns how many ran.
    pub fn fire_rest_api_init(&mut self, server: &mut dyn RestServer) -> usize {
        for listener in self.listeners.iter_mut() {
            listener(&mut *server);
        }
        self.listeners.len()
    }
}

impl InitHooks for HookRegistry {
    fn on_rest_api_init(&mut self, listener: InitListener) {
        self.listeners.push(listener);
    }
}

// ---------------------------------------------------------------------------
// Admin notices
// ---------------------------------------------------------------------------

/// Collects rendered admin notices for one viewer.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    capabilities: BTreeSet<String>,
    notices: RefCell<Vec<String>>,
}

impl NoticeBoard {
    pub fn new<I, S>(capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            capabilities: capabilities.into_iter().map(Into::into).collect(),
            notices: RefCell::new(Vec::new()),
        }
    }

    /// A viewer holding the administrator capability.
    pub fn for_admin() -> Self {
        Self::new([ADMIN_CAPABILITY])
    }

    pub fn notices(&self) -> Vec<String> {
        self.notices.borrow().clone()
    }

    /// All notices concatenated, as the host would print them.
    pub fn render(&self) -> String {
        self.notices.borrow().concat()
    }
}

impl AdminNotices for NoticeBoard {
    fn add_admin_notice(&self, html: String) {
        self.notices.borrow_mut().push(html);
    }

    fn current_user_can(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }
}
