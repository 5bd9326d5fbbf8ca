// system-tests/src/lib.rs
// ============================================================================
// Module: Mesh Procedures System Tests Library
// Description: Shared configuration for system test scenarios.
// Purpose: Provide common settings for the mesh-procedures system-test binaries.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! This crate hosts shared configuration used by the system-test binaries in
//! `system-tests/tests`. The binaries drive the real HTTP transport against a
//! local mock of the data mesh API.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
