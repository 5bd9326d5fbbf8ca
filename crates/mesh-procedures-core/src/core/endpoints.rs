// crates/mesh-procedures-core/src/core/endpoints.rs
// ============================================================================
// Module: Data Mesh Endpoints
// Description: Fixed REST endpoint table of the data mesh API.
// Purpose: Map operations and link kinds to request paths.
// Dependencies: crate::core::entity
// ============================================================================

//! ## Overview
//! All paths are relative to the API base URL. Collection calls (list,
//! create, link) use the bare path; calls addressed by a single `identifier`
//! query parameter use the path with a trailing slash.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::entity::EntityKind;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Query parameter carrying the primary identifier.
pub const IDENTIFIER_PARAM: &str = "identifier";
/// Query parameter carrying the linked child identifier.
pub const CHILD_IDENTIFIER_PARAM: &str = "child_identifier";

// ============================================================================
// SECTION: Link Kinds
// ============================================================================

/// Relationship kinds created through the link endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// System (parent) to source (child).
    SystemToSource,
    /// Source (parent) to object (child).
    ObjectToSource,
    /// Object (parent) to product (child).
    ProductToObject,
    /// Upstream product (parent) to downstream product (child).
    ProductToProduct,
}

impl LinkKind {
    /// Returns the stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SystemToSource => "system_to_source",
            Self::ObjectToSource => "object_to_source",
            Self::ProductToObject => "product_to_object",
            Self::ProductToProduct => "product_to_product",
        }
    }

    /// Kind sent as `identifier`.
    #[must_use]
    pub const fn parent_kind(self) -> EntityKind {
        match self {
            Self::SystemToSource => EntityKind::System,
            Self::ObjectToSource => EntityKind::Source,
            Self::ProductToObject => EntityKind::Object,
            Self::ProductToProduct => EntityKind::Product,
        }
    }

    /// Kind sent as `child_identifier`.
    #[must_use]
    pub const fn child_kind(self) -> EntityKind {
        match self {
            Self::SystemToSource => EntityKind::Source,
            Self::ObjectToSource => EntityKind::Object,
            Self::ProductToObject | Self::ProductToProduct => EntityKind::Product,
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Endpoints
// ============================================================================

/// REST endpoints of the data mesh API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Credential exchange.
    Login,
    /// Entity collection for a kind.
    Entity(EntityKind),
    /// Relationship creation.
    Link(LinkKind),
    /// Source connection details.
    SourceConnection,
    /// Source connection secrets.
    SourceSecret,
    /// Object file/format configuration.
    ObjectConfig,
    /// Product schema definition.
    ProductSchema,
    /// Product transformation builder.
    TransformationBuilder,
    /// Compute job status.
    ComputeStatus,
}

impl Endpoint {
    /// Returns the bare endpoint path.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Login => "/api/iam/login",
            Self::Entity(EntityKind::Mesh) => "/api/data/mesh",
            Self::Entity(EntityKind::System) => "/api/data/data_system",
            Self::Entity(EntityKind::Source) => "/api/data/origin",
            Self::Entity(EntityKind::Object) => "/api/data/resource",
            Self::Entity(EntityKind::Product) => "/api/data/product",
            Self::Link(LinkKind::SystemToSource) => "/api/data/link/data_system/origin",
            Self::Link(LinkKind::ObjectToSource) => "/api/data/link/origin/resource",
            Self::Link(LinkKind::ProductToObject) => "/api/data/link/resource/product",
            Self::Link(LinkKind::ProductToProduct) => "/api/data/link/product/product",
            Self::SourceConnection => "/api/data/origin/connection",
            Self::SourceSecret => "/api/data/origin/secret",
            Self::ObjectConfig => "/api/data/resource/config",
            Self::ProductSchema => "/api/data/product/schema",
            Self::TransformationBuilder => "/api/data/product/compute/builder",
            Self::ComputeStatus => "/api/data/data/compute",
        }
    }

    /// Returns the path used with an `identifier` query parameter.
    #[must_use]
    pub fn addressed_path(self) -> String {
        format!("{}/", self.path())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
