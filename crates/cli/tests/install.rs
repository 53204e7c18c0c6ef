use std::io::Write;

use assert_matches::assert_matches;
use serde_json::json;

use restns_cli::config::CliConfig;
use restns_core::{CoreError, NamespaceState};

const MANIFEST: &str = r#"{
    "namespaces": [
        {
            "namespace": "demo",
            "version": "v1",
            "endpoints": [
                {
                    "endpoint": "items",
                    "methods": "GET",
                    "callback": "echo",
                    "parameters": [
                        { "name": "id", "type": "/", "match": "[0-9]+", "required": true },
                        { "name": "q", "sanitize_callback": "trim" },
                        { "name": "q", "default": "dupe" }
                    ]
                },
                { "endpoint": "items", "methods": "POST", "callback": "echo" },
                { "endpoint": "todo", "methods": "POST", "callback": "not_implemented",
                  "permission_callback": "__return_false" }
            ]
        },
        {
            "namespace": "locked",
            "version": "v1",
            "permission_callback": "missing_permission_fn",
            "endpoints": [{ "endpoint": "secret", "methods": "GET", "callback": "echo" }]
        },
        {
            "namespace": "wp",
            "version": "v2",
            "endpoints": [{ "endpoint": "posts", "methods": "GET", "callback": "echo" }]
        }
    ]
}"#;

fn manifest_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn config_for(file: &tempfile::NamedTempFile, admin: bool) -> CliConfig {
    CliConfig {
        manifest_path: file.path().to_path_buf(),
        viewer_is_admin: admin,
        existing_namespaces: vec!["wp/v2".to_string()],
    }
}

#[test]
fn installs_manifest_into_route_table() {
    let file = manifest_file(MANIFEST);
    let report = restns_cli::run(&config_for(&file, true)).unwrap();

    let routes = serde_json::to_value(&report.routes).unwrap();
    assert_eq!(
        routes["demo/v1"]["/items/(?P<id>[0-9]+)"][0]["args"],
        json!({
            "id": { "required": true },
            "q": { "required": false, "sanitize_callback": "trim" }
        })
    );
    assert_eq!(
        routes["demo/v1"]["/todo"][0]["permission_callback"],
        json!("__return_false")
    );
    assert!(routes.get("locked/v1").is_none());
    assert_eq!(routes["wp/v2"], json!({}));

    let kinds: Vec<_> = report.diagnostics.iter().map(|d| d.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            "duplicate_parameter",
            "duplicate_endpoint",
            "non_callable_namespace_permissions"
        ]
    );
    assert_eq!(report.notices.len(), 3);
}

#[test]
fn namespace_summaries_reflect_subscription() {
    let file = manifest_file(MANIFEST);
    let report = restns_cli::run(&config_for(&file, true)).unwrap();

    let keys: Vec<_> = report.namespaces.iter().map(|n| n.key.as_str()).collect();
    assert_eq!(keys, vec!["demo/v1", "locked/v1", "wp/v2"]);

    let locked = &report.namespaces[1];
    assert!(!locked.subscribed);
    assert_eq!(locked.state, NamespaceState::Accumulating);
    assert_eq!(locked.endpoints, vec!["secret"]);

    assert_eq!(report.namespaces[0].state, NamespaceState::Registered);
    assert_eq!(report.namespaces[0].endpoints, vec!["items", "todo"]);
}

#[test]
fn notices_hidden_from_non_admin_viewer() {
    let file = manifest_file(MANIFEST);
    let report = restns_cli::run(&config_for(&file, false)).unwrap();
    assert_eq!(report.diagnostics.len(), 3);
    assert!(report.notices.is_empty());
}

#[test]
fn missing_manifest_is_an_io_error() {
    let config = CliConfig {
        manifest_path: "/definitely/not/here.json".into(),
        viewer_is_admin: true,
        existing_namespaces: vec![],
    };
    assert_matches!(restns_cli::run(&config), Err(CoreError::Io(_)));
}

#[test]
fn invalid_manifest_is_rejected_before_install() {
    let file = manifest_file(r#"{ "namespaces": [{ "namespace": "demo", "version": "" }] }"#);
    assert_matches!(
        restns_cli::run(&config_for(&file, true)),
        Err(CoreError::Manifest(msg)) if msg.contains("version")
    );
}
