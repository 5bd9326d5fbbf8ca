// crates/mesh-procedures-config/src/lib.rs
// ============================================================================
// Module: Mesh Procedures Config Library
// Description: Canonical config model, env overrides, and validation.
// Purpose: Single source of truth for mesh-procedures.toml semantics.
// Dependencies: mesh-procedures-core, serde, toml, url
// ============================================================================

//! ## Overview
//! `mesh-procedures-config` defines the configuration model for the
//! procedure runner: API endpoint and account, login credentials, compute
//! polling defaults, run policy, and report delivery. Loading is strict and
//! fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
