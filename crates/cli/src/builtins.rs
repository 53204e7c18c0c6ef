//! Named callbacks the `restns` tool makes available to manifests.

use restns_core::manifest::CallbackRegistry;
use restns_core::RestError;
use serde_json::{json, Value};

/// Registry with the core builtins plus demo handlers, validators and
/// sanitizers:
///
/// - handlers: `echo`, `not_implemented`
/// - validators: `is_numeric`
/// - sanitizers: `trim`, `absint`
pub fn demo_registry() -> CallbackRegistry {
    let mut registry = CallbackRegistry::with_builtins();
    registry
        .register_handler("echo", |req| {
            Ok(json!({
                "method": req.method,
                "route": req.route,
                "params": req.params,
            }))
        })
        .register_handler("not_implemented", |req| {
            Err(RestError::new(
                "rest_not_implemented",
                format!("{} {} is not implemented", req.method, req.route),
                501,
            ))
        })
        .register_validator("is_numeric", |value, _, _| is_numeric(value))
        .register_sanitizer("trim", |value, _, _| match value {
            Value::String(s) => Value::String(s.trim().to_string()),
            other => other.clone(),
        })
        .register_sanitizer("absint", |value, _, _| json!(absint(value)));
    registry
}

fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => s.trim().parse::<f64>().is_ok(),
        _ => false,
    }
}

/// Non-negative integer form of a value; anything unparsable becomes 0.
fn absint(value: &Value) -> u64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };
    n.abs().trunc() as u64
}
