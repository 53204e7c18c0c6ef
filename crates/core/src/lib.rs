//! Declarative REST namespace, endpoint and parameter registration.
//!
//! Callers describe [`Parameter`]s, attach them to [`Endpoint`]s, attach
//! those to a [`Namespace`], and the namespace submits its routes to the host
//! REST server when the host's API-init hook fires. Routing, dispatch and
//! permission enforcement stay with the host; this crate only validates and
//! assembles what is handed over.
//!
//! - [`parameter`], [`endpoint`], [`namespace`]: the three composing entities
//! - [`callback`]: resolved/unresolved callback references
//! - [`diagnostics`]: non-fatal registration problems and their sinks
//! - [`host`]: the host contract consumed by registration
//! - [`server`]: an in-memory host for tests and tooling
//! - [`manifest`]: JSON manifests with callbacks referenced by name

pub mod callback;
pub mod diagnostics;
pub mod endpoint;
pub mod error;
pub mod host;
pub mod manifest;
pub mod namespace;
pub mod parameter;
pub mod server;
pub mod types;

pub use callback::Callback;
pub use diagnostics::{AddOutcome, Diagnostic, DiagnosticSink};
pub use endpoint::Endpoint;
pub use error::{CoreError, RestError};
pub use namespace::{Namespace, NamespaceState, Registration};
pub use parameter::Parameter;
pub use types::RestRequest;
