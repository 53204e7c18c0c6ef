//! A single route within a namespace and the parameters attached to it.

use indexmap::IndexMap;

use crate::callback::{Callback, HandlerFn, PermissionFn};
use crate::diagnostics::{AddOutcome, Diagnostic, DiagnosticSink};
use crate::parameter::Parameter;

/// One route: a path relative to its namespace, the methods it answers,
/// a handler and its parameters.
#[derive(Debug, Clone)]
pub struct Endpoint {
    path: String,
    allowed_methods: String,
    callback: Callback<HandlerFn>,
    parameters: IndexMap<String, Parameter>,
    override_existing: bool,
    permissions_callback: Option<Callback<PermissionFn>>,
}

impl Endpoint {
    /// `path` is relative to the namespace (no leading slash); `methods` is
    /// passed to the host verbatim, e.g. `"GET"` or `"GET,POST"`.
    pub fn new(
        path: impl Into<String>,
        methods: impl Into<String>,
        callback: Callback<HandlerFn>,
    ) -> Self {
        Self {
            path: path.into(),
            allowed_methods: methods.into(),
            callback,
            parameters: IndexMap::new(),
            override_existing: false,
            permissions_callback: None,
        }
    }

    /// Allow this route to replace an identical route already on the host.
    pub fn override_existing(mut self, override_existing: bool) -> Self {
        self.override_existing = override_existing;
        self
    }

    /// Per-endpoint permission callback; takes precedence over the namespace's.
    pub fn with_permissions(mut self, callback: Callback<PermissionFn>) -> Self {
        self.permissions_callback = Some(callback);
        self
    }

    /// Attach parameters in order.
    ///
    /// A parameter is skipped (and reported) when its name is already taken
    /// on this endpoint or when it carries a validation or sanitization
    /// callback that is not invokable. Existing parameters are never
    /// overwritten.
    pub fn add_parameters<I>(&mut self, parameters: I, sink: &dyn DiagnosticSink) -> AddOutcome
    where
        I: IntoIterator<Item = Parameter>,
    {
        let mut outcome = AddOutcome::default();

        for parameter in parameters {
            let name = parameter.name().to_string();

            if self.parameters.contains_key(&name) {
                outcome.reject(
                    Diagnostic::DuplicateParameter {
                        parameter: name,
                        endpoint: self.path.clone(),
                    },
                    sink,
                );
                continue;
            }

            if parameter
                .validation_callback()
                .is_some_and(|cb| !cb.is_invokable())
            {
                outcome.reject(
                    Diagnostic::NonCallableValidation {
                        parameter: name,
                        endpoint: self.path.clone(),
                    },
                    sink,
                );
                continue;
            }

            if parameter
                .sanitization_callback()
                .is_some_and(|cb| !cb.is_invokable())
            {
                outcome.reject(
                    Diagnostic::NonCallableSanitization {
                        parameter: name,
                        endpoint: self.path.clone(),
                    },
                    sink,
                );
                continue;
            }

            tracing::debug!(endpoint = %self.path, parameter = %name, "Parameter attached");
            outcome.accept(&name);
            self.parameters.insert(name, parameter);
        }

        outcome
    }

    /// Chaining form of [`add_parameters`](Self::add_parameters).
    pub fn with_parameters<I>(mut self, parameters: I, sink: &dyn DiagnosticSink) -> Self
    where
        I: IntoIterator<Item = Parameter>,
    {
        self.add_parameters(parameters, sink);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Methods string as given to [`Endpoint::new`].
    pub fn allowed_methods(&self) -> &str {
        &self.allowed_methods
    }

    /// Handler invoked for matching requests.
    pub fn callback(&self) -> &Callback<HandlerFn> {
        &self.callback
    }

    /// Attached parameters in insertion order; empty when none were added.
    pub fn parameters(&self) -> &IndexMap<String, Parameter> {
        &self.parameters
    }

    /// Look up one attached parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.get(name)
    }

    /// Whether the route replaces an existing one on the host.
    pub fn overrides_existing(&self) -> bool {
        self.override_existing
    }

    pub fn permissions_callback(&self) -> Option<&Callback<PermissionFn>> {
        self.permissions_callback.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::{SanitizeFn, ValidateFn};
    use crate::diagnostics::CollectingSink;
    use crate::types::RestRequest;
    use assert_matches::assert_matches;
    use serde_json::{json, Value};

    fn endpoint() -> Endpoint {
        Endpoint::new(
            "items",
            "GET",
            Callback::handler("list_items", |_: &RestRequest| Ok(json!([]))),
        )
    }

    fn is_numeric() -> Callback<ValidateFn> {
        Callback::validator("is_numeric", |v: &Value, _: &RestRequest, _: &str| v.is_number())
    }

    #[test]
    fn new_endpoint_has_empty_parameter_map() {
        let ep = endpoint();
        assert!(ep.parameters().is_empty());
        assert!(ep.permissions_callback().is_none());
        assert!(!ep.overrides_existing());
        assert_eq!(ep.allowed_methods(), "GET");
    }

    #[test]
    fn first_seen_parameter_wins() {
        let sink = CollectingSink::new();
        let mut ep = endpoint();
        let outcome = ep.add_parameters(
            [
                Parameter::new("page").default_value(json!(1)),
                Parameter::new("page").default_value(json!(99)),
            ],
            &sink,
        );

        assert_eq!(outcome.accepted, vec!["page"]);
        assert_matches!(
            outcome.rejected.as_slice(),
            [Diagnostic::DuplicateParameter { parameter, endpoint }]
                if parameter == "page" && endpoint == "items"
        );
        assert_eq!(ep.parameters().len(), 1);
        assert_eq!(ep.parameter("page").unwrap().default(), Some(&json!(1)));
        assert_eq!(sink.kinds(), vec!["duplicate_parameter"]);
    }

    #[test]
    fn later_calls_only_add_new_names() {
        let sink = CollectingSink::new();
        let mut ep = endpoint();
        ep.add_parameters([Parameter::new("a")], &sink);
        let outcome = ep.add_parameters([Parameter::new("a"), Parameter::new("b")], &sink);

        assert_eq!(outcome.accepted, vec!["b"]);
        assert_eq!(ep.parameters().keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn non_invokable_validation_is_rejected() {
        let sink = CollectingSink::new();
        let mut ep = endpoint();
        let outcome = ep.add_parameters(
            [Parameter::new("q").validate_with(Callback::unresolved("missing"))],
            &sink,
        );

        assert!(ep.parameters().is_empty());
        assert!(outcome.accepted.is_empty());
        assert_eq!(sink.kinds(), vec!["non_callable_validation"]);
    }

    #[test]
    fn non_invokable_sanitization_is_rejected() {
        let sink = CollectingSink::new();
        let mut ep = endpoint();
        let bad: Callback<SanitizeFn> = Callback::unresolved("missing");
        ep.add_parameters(
            [Parameter::new("q").validate_with(is_numeric()).sanitize_with(bad)],
            &sink,
        );

        assert!(ep.parameters().is_empty());
        assert_eq!(sink.kinds(), vec!["non_callable_sanitization"]);
    }

    #[test]
    fn validation_is_checked_before_sanitization() {
        let sink = CollectingSink::new();
        let mut ep = endpoint();
        ep.add_parameters(
            [Parameter::new("q")
                .validate_with(Callback::unresolved("v"))
                .sanitize_with(Callback::unresolved("s"))],
            &sink,
        );
        assert_eq!(sink.kinds(), vec!["non_callable_validation"]);
    }

    #[test]
    fn rejected_name_can_be_retried_with_valid_callbacks() {
        let sink = CollectingSink::new();
        let mut ep = endpoint();
        ep.add_parameters(
            [
                Parameter::new("q").validate_with(Callback::unresolved("missing")),
                Parameter::new("q").validate_with(is_numeric()),
            ],
            &sink,
        );
        assert_eq!(ep.parameters().len(), 1);
        assert!(ep.parameter("q").unwrap().validation_callback().unwrap().is_invokable());
    }

    #[test]
    fn chaining_form_returns_the_endpoint() {
        let sink = CollectingSink::new();
        let ep = endpoint()
            .override_existing(true)
            .with_parameters([Parameter::path("id")], &sink)
            .with_parameters([Parameter::new("fields")], &sink);

        assert!(ep.overrides_existing());
        assert_eq!(ep.parameters().keys().collect::<Vec<_>>(), vec!["id", "fields"]);
        assert!(sink.is_empty());
    }
}
