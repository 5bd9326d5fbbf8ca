// crates/mesh-procedures-core/src/core/identifiers.rs
// ============================================================================
// Module: Mesh Procedures Identifiers
// Description: Opaque identifiers for procedure steps, API entities, and jobs.
// Purpose: Keep step-local references and API-assigned identifiers distinct.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A procedure names the entities it creates with step-local references
//! ([`StepRef`]); the data mesh API answers with its own identifiers
//! ([`EntityIdentifier`], [`ComputeIdentifier`]). Both serialize as plain
//! strings. Keeping them as separate types prevents a step reference from
//! being sent to the API where an identifier is expected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Procedure-local reference to an entity created by an earlier step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepRef(String);

impl StepRef {
    /// Creates a new step reference.
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Returns the reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for StepRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for StepRef {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Identifier assigned to an entity by the data mesh API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityIdentifier(String);

impl EntityIdentifier {
    /// Creates a new entity identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for EntityIdentifier {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EntityIdentifier {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Identifier of an asynchronous compute job attached to an entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComputeIdentifier(String);

impl ComputeIdentifier {
    /// Creates a new compute identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComputeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ComputeIdentifier {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ComputeIdentifier {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Credentials
// ============================================================================

/// Bearer token returned by the login endpoint.
///
/// The token never appears in `Debug` output or serialized reports.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Creates a new access token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
