//! Callback references for handlers, permission checks, validators and
//! sanitizers.
//!
//! A [`Callback`] is either resolved to a function or an unresolved named
//! reference. Only resolved callbacks are invokable; unresolved ones are
//! rejected when the owning item is attached to its container.

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::RestError;
use crate::types::RestRequest;

/// Request handler: produces the response body or an error.
pub type HandlerFn = dyn Fn(&RestRequest) -> Result<Value, RestError> + Send + Sync;

/// Permission check: `Ok(true)` grants, `Ok(false)` or `Err` denies.
pub type PermissionFn = dyn Fn(&RestRequest) -> Result<bool, RestError> + Send + Sync;

/// Argument validator: receives the value, the request and the argument name.
pub type ValidateFn = dyn Fn(&Value, &RestRequest, &str) -> bool + Send + Sync;

/// Argument sanitizer: receives the value, the request and the argument name.
pub type SanitizeFn = dyn Fn(&Value, &RestRequest, &str) -> Value + Send + Sync;

/// Name given to the permission callback installed when a namespace is
/// created without one.
pub const DEFAULT_PERMISSIONS_NAME: &str = "default_permissions";

pub enum Callback<F: ?Sized> {
    /// Bound to a function; invokable.
    Resolved { name: String, func: Arc<F> },
    /// A named reference with no function behind it; never invokable.
    Unresolved { name: String },
}

impl<F: ?Sized> Callback<F> {
    pub fn from_arc(name: impl Into<String>, func: Arc<F>) -> Self {
        Self::Resolved {
            name: name.into(),
            func,
        }
    }

    pub fn unresolved(name: impl Into<String>) -> Self {
        Self::Unresolved { name: name.into() }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Resolved { name, .. } | Self::Unresolved { name } => name,
        }
    }

    pub fn is_invokable(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }

    pub fn func(&self) -> Option<&Arc<F>> {
        match self {
            Self::Resolved { func, .. } => Some(func),
            Self::Unresolved { .. } => None,
        }
    }
}

impl<F: ?Sized> Clone for Callback<F> {
    fn clone(&self) -> Self {
        match self {
            Self::Resolved { name, func } => Self::Resolved {
                name: name.clone(),
                func: Arc::clone(func),
            },
            Self::Unresolved { name } => Self::Unresolved { name: name.clone() },
        }
    }
}

impl<F: ?Sized> fmt::Debug for Callback<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("name", &self.name())
            .field("invokable", &self.is_invokable())
            .finish()
    }
}

/// Callbacks serialize as their name.
impl<F: ?Sized> Serialize for Callback<F> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl Callback<HandlerFn> {
    pub fn handler<H>(name: impl Into<String>, handler: H) -> Self
    where
        H: Fn(&RestRequest) -> Result<Value, RestError> + Send + Sync + 'static,
    {
        let func: Arc<HandlerFn> = Arc::new(handler);
        Self::from_arc(name, func)
    }

    pub fn invoke(&self, request: &RestRequest) -> Result<Value, RestError> {
        match self {
            Self::Resolved { func, .. } => (**func)(request),
            Self::Unresolved { name } => Err(RestError::not_callable(name)),
        }
    }
}

impl Callback<PermissionFn> {
    pub fn permission<P>(name: impl Into<String>, check: P) -> Self
    where
        P: Fn(&RestRequest) -> Result<bool, RestError> + Send + Sync + 'static,
    {
        let func: Arc<PermissionFn> = Arc::new(check);
        Self::from_arc(name, func)
    }

    /// Grants every request.
    pub fn allow_all() -> Self {
        Self::permission(DEFAULT_PERMISSIONS_NAME, |_| Ok(true))
    }

    pub fn check(&self, request: &RestRequest) -> Result<bool, RestError> {
        match self {
            Self::Resolved { func, .. } => (**func)(request),
            Self::Unresolved { name } => Err(RestError::not_callable(name)),
        }
    }
}

impl Callback<ValidateFn> {
    pub fn validator<V>(name: impl Into<String>, validate: V) -> Self
    where
        V: Fn(&Value, &RestRequest, &str) -> bool + Send + Sync + 'static,
    {
        let func: Arc<ValidateFn> = Arc::new(validate);
        Self::from_arc(name, func)
    }

    /// An unresolved validator never accepts a value.
    pub fn validate(&self, value: &Value, request: &RestRequest, key: &str) -> bool {
        match self {
            Self::Resolved { func, .. } => (**func)(value, request, key),
            Self::Unresolved { .. } => false,
        }
    }
}

impl Callback<SanitizeFn> {
    pub fn sanitizer<S>(name: impl Into<String>, sanitize: S) -> Self
    where
        S: Fn(&Value, &RestRequest, &str) -> Value + Send + Sync + 'static,
    {
        let func: Arc<SanitizeFn> = Arc::new(sanitize);
        Self::from_arc(name, func)
    }

    /// An unresolved sanitizer passes the value through unchanged.
    pub fn sanitize(&self, value: &Value, request: &RestRequest, key: &str) -> Value {
        match self {
            Self::Resolved { func, .. } => (**func)(value, request, key),
            Self::Unresolved { .. } => value.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn resolved_handler_is_invokable() {
        let cb = Callback::handler("echo", |req: &RestRequest| Ok(json!({ "route": req.route })));
        assert!(cb.is_invokable());
        let out = cb.invoke(&RestRequest::new("GET", "/x")).unwrap();
        assert_eq!(out, json!({ "route": "/x" }));
    }

    #[test]
    fn unresolved_handler_reports_not_callable() {
        let cb: Callback<HandlerFn> = Callback::unresolved("missing_fn");
        assert!(!cb.is_invokable());
        assert!(cb.func().is_none());
        assert_matches!(
            cb.invoke(&RestRequest::default()),
            Err(RestError { status: 500, .. })
        );
    }

    #[test]
    fn allow_all_grants_everything() {
        let cb = Callback::allow_all();
        assert_eq!(cb.name(), DEFAULT_PERMISSIONS_NAME);
        assert_eq!(cb.check(&RestRequest::default()), Ok(true));
    }

    #[test]
    fn unresolved_validator_rejects_and_sanitizer_passes_through() {
        let req = RestRequest::default();
        let v: Callback<ValidateFn> = Callback::unresolved("nope");
        let s: Callback<SanitizeFn> = Callback::unresolved("nope");
        assert!(!v.validate(&json!(1), &req, "id"));
        assert_eq!(s.sanitize(&json!(" a "), &req, "q"), json!(" a "));
    }

    #[test]
    fn callbacks_serialize_as_their_name() {
        let cb = Callback::sanitizer("trim", |v: &Value, _: &RestRequest, _: &str| v.clone());
        assert_eq!(serde_json::to_value(&cb).unwrap(), json!("trim"));
    }

    #[test]
    fn clones_share_the_same_function() {
        let cb = Callback::permission("admins", |_: &RestRequest| Ok(false));
        let copy = cb.clone();
        assert!(Arc::ptr_eq(cb.func().unwrap(), copy.func().unwrap()));
    }
}
