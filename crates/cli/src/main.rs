use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use restns_cli::config::CliConfig;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing (stderr, so stdout stays machine-readable) ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "restns_core=info,restns_cli=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // --- Configuration ---
    let config = CliConfig::from_env();
    tracing::info!(
        manifest = %config.manifest_path.display(),
        viewer_is_admin = config.viewer_is_admin,
        existing = ?config.existing_namespaces,
        "Loaded configuration"
    );

    // --- Install ---
    let report = restns_cli::run(&config).with_context(|| {
        format!(
            "failed to install manifest {}",
            config.manifest_path.display()
        )
    })?;

    for summary in &report.namespaces {
        if !summary.subscribed {
            tracing::warn!(namespace = %summary.key, "Namespace never subscribed to REST API init");
        }
    }
    if !report.diagnostics.is_empty() {
        tracing::warn!(count = report.diagnostics.len(), "Manifest entries were skipped");
    }

    println!("{}", serde_json::to_string_pretty(&report.routes)?);
    for notice in &report.notices {
        eprintln!("{notice}");
    }

    Ok(())
}
