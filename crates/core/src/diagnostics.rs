//! Registration diagnostics and the sinks that receive them.
//!
//! Every problem found while assembling namespaces, endpoints and parameters
//! is non-fatal: the offending item is skipped and a [`Diagnostic`] is
//! delivered to the caller-supplied [`DiagnosticSink`].

use std::cell::RefCell;

use serde::Serialize;

use crate::host::AdminNotices;

/// Capability required to see rendered admin notices.
pub const ADMIN_CAPABILITY: &str = "administrator";

// ---------------------------------------------------------------------------
// Diagnostic
// ---------------------------------------------------------------------------

/// A rejected registration item. Messages carry inline HTML emphasis for the
/// host's notice area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    #[error("The parameter <strong><em>{parameter}</em></strong> for the endpoint <strong><em>{endpoint}</em></strong> already exists. Please update your parameter's name to a unique value for the endpoint.")]
    DuplicateParameter { parameter: String, endpoint: String },

    #[error("The parameter <strong><em>{parameter}</em></strong> for the endpoint <strong><em>{endpoint}</em></strong> has a non-callable validation callback. Please update your parameter's validation callback to a callable function.")]
    NonCallableValidation { parameter: String, endpoint: String },

    #[error("The parameter <strong><em>{parameter}</em></strong> for the endpoint <strong><em>{endpoint}</em></strong> has a non-callable sanitization callback. Please update your parameter's sanitization callback to a callable function.")]
    NonCallableSanitization { parameter: String, endpoint: String },

    #[error("The endpoint <strong><em>{endpoint}</em></strong> in the REST API namespace <strong><em>{namespace}</em></strong> already exists. Please update your endpoint to a unique value for the namespace.")]
    DuplicateEndpoint { endpoint: String, namespace: String },

    #[error("The callback for the endpoint <strong><em>{endpoint}</em></strong> in the REST API namespace <strong><em>{namespace}</em></strong> is not callable. Please update your endpoint's callback to a callable function.")]
    NonCallableEndpointCallback { endpoint: String, namespace: String },

    #[error("The permissions callback for the endpoint <strong><em>{endpoint}</em></strong> in the REST API namespace <strong><em>{namespace}</em></strong> is not callable. Please update your endpoint's permissions callback to a callable function.")]
    NonCallableEndpointPermissions { endpoint: String, namespace: String },

    #[error("The permissions callback for the REST API namespace <strong><em>{namespace}</em></strong> is not callable. Please update your namespace's permissions callback to a callable function.")]
    NonCallableNamespacePermissions { namespace: String },

    #[error("The endpoint <strong><em>{endpoint}</em></strong> was added to the REST API namespace <strong><em>{namespace}</em></strong> after its routes were registered. Please add your endpoints before the REST API is initialized.")]
    EndpointAfterRegistration { endpoint: String, namespace: String },
}

impl Diagnostic {
    /// Stable snake_case identifier for the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateParameter { .. } => "duplicate_parameter",
            Self::NonCallableValidation { .. } => "non_callable_validation",
            Self::NonCallableSanitization { .. } => "non_callable_sanitization",
            Self::DuplicateEndpoint { .. } => "duplicate_endpoint",
            Self::NonCallableEndpointCallback { .. } => "non_callable_endpoint_callback",
            Self::NonCallableEndpointPermissions { .. } => "non_callable_endpoint_permissions",
            Self::NonCallableNamespacePermissions { .. } => "non_callable_namespace_permissions",
            Self::EndpointAfterRegistration { .. } => "endpoint_after_registration",
        }
    }

    /// The HTML-bearing message shown to administrators.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// Wrap a message in the host's dismissible error-notice markup.
///
/// Returns an empty string for an empty message or a viewer without the
/// administrator capability.
pub fn render_admin_notice(message: &str, viewer_is_admin: bool) -> String {
    if message.is_empty() || !viewer_is_admin {
        return String::new();
    }
    format!(
        "<div style='background: white; padding: 12px 20px; border-radius: 3px; \
         border-left: 5px solid #dc3545;' class='notice notice-error is-dismissible'>\
         <p style='font-size: 16px;'>{message}</p>\
         <small><em>This message is only visible to site admins</em></small></div>"
    )
}

// ---------------------------------------------------------------------------
// AddOutcome
// ---------------------------------------------------------------------------

/// Result of an `add_*` accumulation call: what went in and what was turned
/// away.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddOutcome {
    /// Keys (parameter names or endpoint paths) that were inserted, in order.
    pub accepted: Vec<String>,
    pub rejected: Vec<Diagnostic>,
}

impl AddOutcome {
    /// Nothing was rejected.
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    pub(crate) fn accept(&mut self, key: &str) {
        self.accepted.push(key.to_string());
    }

    pub(crate) fn reject(&mut self, diagnostic: Diagnostic, sink: &dyn DiagnosticSink) {
        sink.report(&diagnostic);
        self.rejected.push(diagnostic);
    }

    /// Fold another outcome into this one, keeping order.
    pub fn merge(&mut self, other: AddOutcome) {
        self.accepted.extend(other.accepted);
        self.rejected.extend(other.rejected);
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Receiver for diagnostics raised during accumulation and namespace setup.
pub trait DiagnosticSink {
    fn report(&self, diagnostic: &Diagnostic);
}

impl<F> DiagnosticSink for F
where
    F: Fn(&Diagnostic),
{
    fn report(&self, diagnostic: &Diagnostic) {
        self(diagnostic)
    }
}

/// Discards every diagnostic.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _diagnostic: &Diagnostic) {}
}

/// Logs each diagnostic as a `tracing` warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: &Diagnostic) {
        tracing::warn!(kind = diagnostic.kind(), message = %diagnostic, "REST registration problem");
    }
}

/// Keeps every diagnostic in arrival order.
#[derive(Debug, Default)]
pub struct CollectingSink {
    seen: RefCell<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.seen.borrow().clone()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.seen.borrow().iter().map(Diagnostic::kind).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.seen.borrow().len()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: &Diagnostic) {
        self.seen.borrow_mut().push(diagnostic.clone());
    }
}

/// Forwards diagnostics to the host's admin-notice area, rendered for the
/// current viewer.
pub struct AdminNoticeSink<'a> {
    notices: &'a dyn AdminNotices,
}

impl<'a> AdminNoticeSink<'a> {
    pub fn new(notices: &'a dyn AdminNotices) -> Self {
        Self { notices }
    }
}

impl DiagnosticSink for AdminNoticeSink<'_> {
    fn report(&self, diagnostic: &Diagnostic) {
        let html = render_admin_notice(
            &diagnostic.message(),
            self.notices.current_user_can(ADMIN_CAPABILITY),
        );
        if !html.is_empty() {
            self.notices.add_admin_notice(html);
        }
    }
}
