// crates/mesh-procedures-api/src/lib.rs
// ============================================================================
// Module: Mesh Procedures API Library
// Description: HTTP adapters for the data mesh API and report webhooks.
// Purpose: Connect the transport-agnostic runtime to real endpoints.
// Dependencies: mesh-procedures-core, reqwest, url
// ============================================================================

//! ## Overview
//! [`HttpTransport`] implements the core transport trait with a blocking
//! `reqwest` client. [`WebhookNotifier`] posts run summaries to a chat
//! webhook. Both refuse redirects and bound how much they read.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod notifier;
pub mod transport;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use notifier::WebhookNotifier;
pub use transport::HttpTransport;
pub use transport::HttpTransportConfig;
pub use transport::TransportBuildError;
