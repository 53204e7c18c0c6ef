//! `restns` tool library.
//!
//! Installs a JSON manifest against the in-memory host and reports the
//! resulting route table, diagnostics and admin notices. The binary and the
//! integration tests both go through [`run`] and [`install`].

pub mod builtins;
pub mod config;

use restns_core::diagnostics::{AdminNoticeSink, CollectingSink, DiagnosticSink, TracingSink};
use restns_core::manifest::{load_manifest, CallbackRegistry, RestManifest};
use restns_core::server::{HookRegistry, InMemoryServer, NoticeBoard};
use restns_core::{CoreError, Diagnostic, NamespaceState};
use serde::Serialize;

use crate::config::CliConfig;

/// Per-namespace summary after the init hook has fired.
#[derive(Debug, Clone, Serialize)]
pub struct NamespaceSummary {
    pub key: String,
    pub subscribed: bool,
    pub state: NamespaceState,
    pub endpoints: Vec<String>,
}

/// Everything one installation produced.
#[derive(Debug, Serialize)]
pub struct Report {
    pub namespaces: Vec<NamespaceSummary>,
    pub routes: InMemoryServer,
    pub diagnostics: Vec<Diagnostic>,
    pub notices: Vec<String>,
}

/// Load the configured manifest and install it.
pub fn run(config: &CliConfig) -> Result<Report, CoreError> {
    let manifest = load_manifest(&config.manifest_path)?;
    tracing::info!(
        path = %config.manifest_path.display(),
        namespaces = manifest.namespaces.len(),
        "Manifest loaded"
    );
    Ok(install(&manifest, &builtins::demo_registry(), config))
}

/// Install `manifest` against a fresh in-memory host seeded with the
/// configured existing namespaces, then fire the host's init hook once.
pub fn install(manifest: &RestManifest, registry: &CallbackRegistry, config: &CliConfig) -> Report {
    let board = if config.viewer_is_admin {
        NoticeBoard::for_admin()
    } else {
        NoticeBoard::new(Vec::<String>::new())
    };
    let notices = AdminNoticeSink::new(&board);
    let collected = CollectingSink::new();
    let sink = |diagnostic: &Diagnostic| {
        TracingSink.report(diagnostic);
        notices.report(diagnostic);
        collected.report(diagnostic);
    };

    let mut hooks = HookRegistry::new();
    let (namespaces, outcome) = manifest.install(registry, &mut hooks, &sink);
    if !outcome.is_clean() {
        tracing::debug!(
            accepted = outcome.accepted.len(),
            rejected = outcome.rejected.len(),
            "Some endpoints were not attached"
        );
    }

    let mut server = InMemoryServer::with_namespaces(config.existing_namespaces.iter().cloned());
    let fired = hooks.fire_rest_api_init(&mut server);
    tracing::info!(
        listeners = fired,
        routes = server.route_count(),
        viewer_is_admin = config.viewer_is_admin,
        "REST API initialized"
    );

    let namespaces = namespaces
        .iter()
        .map(|ns| NamespaceSummary {
            key: ns.key(),
            subscribed: ns.is_subscribed(),
            state: ns.state(),
            endpoints: ns.endpoints().keys().cloned().collect(),
        })
        .collect();

    Report {
        namespaces,
        routes: server,
        diagnostics: collected.diagnostics(),
        notices: board.notices(),
    }
}

