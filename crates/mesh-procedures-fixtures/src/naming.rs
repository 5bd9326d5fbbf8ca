// crates/mesh-procedures-fixtures/src/naming.rs
// ============================================================================
// Module: Fixture Naming
// Description: Random suffixes for entity names.
// Purpose: Keep names unique across repeated runs against one deployment.
// Dependencies: rand
// ============================================================================

//! Random entity names.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rand::Rng;
use rand::distributions::Alphanumeric;
use rand::thread_rng;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Suffix length for generated default names.
pub const DEFAULT_ID_LEN: usize = 6;
/// Suffix length appended to caller-supplied names.
pub const CUSTOM_ID_LEN: usize = 2;

// ============================================================================
// SECTION: Naming
// ============================================================================

/// Returns `len` random ASCII letters and digits.
#[must_use]
pub fn make_id(len: usize) -> String {
    make_id_with(&mut thread_rng(), len)
}

/// Returns `len` random ASCII letters and digits drawn from `rng`.
#[must_use]
pub fn make_id_with<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    rng.sample_iter(&Alphanumeric).take(len).map(char::from).collect()
}

/// Returns an entity display name.
///
/// A custom name gets a short suffix (`"Orders x7"`); otherwise the prefix
/// gets a longer one (`"Mesh a8Zk2Q"`).
#[must_use]
pub fn entity_name(prefix: &str, custom: Option<&str>) -> String {
    match custom.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => format!("{name} {}", make_id(CUSTOM_ID_LEN)),
        None => format!("{prefix} {}", make_id(DEFAULT_ID_LEN)),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
