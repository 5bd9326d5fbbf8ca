// crates/mesh-procedures-core/src/runtime/handlers/mod.rs
// ============================================================================
// Module: Built-In Step Handlers
// Description: Handlers behind every built-in step type.
// Purpose: Implement entity, link, configuration, and compute steps.
// Dependencies: crate::{core, runtime}
// ============================================================================

//! ## Overview
//! Handlers are small and parameterized by entity or link kind, so one type
//! covers the same operation across all five entity collections. Every
//! handler asserts a 2xx response before touching the id map.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod compute;
pub mod configure;
pub mod entity;
pub mod link;
pub mod transform;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use compute::CheckComputeStatus;
pub use configure::ConfigureEntity;
pub use configure::ConfigureTarget;
pub use entity::CreateEntity;
pub use entity::CreateProduct;
pub use entity::DeleteEntity;
pub use entity::GetEntity;
pub use entity::ListEntities;
pub use link::LinkEntities;
pub use transform::ApplyTransformation;
