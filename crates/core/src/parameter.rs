//! Route and query parameter declarations.

use serde_json::Value;

use crate::callback::{Callback, SanitizeFn, ValidateFn};

/// Type marker for a parameter that becomes a path segment of the route.
pub const PATH_SEGMENT: &str = "/";

/// Type marker used when none is given: a query/body argument.
pub const DEFAULT_TYPE: &str = "?";

/// Pattern used for path segments when none is given.
pub const DEFAULT_MATCH: &str = ".{1,128}";

/// One named argument of an endpoint.
///
/// Built with consuming setters and immutable afterwards. Construction never
/// fails; callbacks are only checked when the parameter is attached to an
/// [`Endpoint`](crate::endpoint::Endpoint).
#[derive(Debug, Clone)]
pub struct Parameter {
    name: String,
    kind: String,
    default: Option<Value>,
    required: bool,
    pattern: String,
    validation_callback: Option<Callback<ValidateFn>>,
    sanitization_callback: Option<Callback<SanitizeFn>>,
}

impl Parameter {
    /// A query/body argument named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DEFAULT_TYPE.to_string(),
            default: None,
            required: false,
            pattern: DEFAULT_MATCH.to_string(),
            validation_callback: None,
            sanitization_callback: None,
        }
    }

    /// A path-segment argument named `name`.
    pub fn path(name: impl Into<String>) -> Self {
        Self::new(name).kind(PATH_SEGMENT)
    }

    /// Type marker; [`PATH_SEGMENT`] turns the parameter into a route segment.
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// A JSON `null` clears the default.
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = (!value.is_null()).then_some(value);
        self
    }

    /// Whether the host rejects requests that omit the argument.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Regex fragment for the path segment. Ignored for query arguments.
    pub fn matching(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Callback the host runs to validate the incoming value.
    pub fn validate_with(mut self, callback: Callback<ValidateFn>) -> Self {
        self.validation_callback = Some(callback);
        self
    }

    /// Callback the host runs to clean the incoming value.
    pub fn sanitize_with(mut self, callback: Callback<SanitizeFn>) -> Self {
        self.sanitization_callback = Some(callback);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type marker as given.
    pub fn param_type(&self) -> &str {
        &self.kind
    }

    pub fn is_path_segment(&self) -> bool {
        self.kind == PATH_SEGMENT
    }

    /// Default value; `None` when absent.
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn validation_callback(&self) -> Option<&Callback<ValidateFn>> {
        self.validation_callback.as_ref()
    }

    pub fn sanitization_callback(&self) -> Option<&Callback<SanitizeFn>> {
        self.sanitization_callback.as_ref()
    }
}
