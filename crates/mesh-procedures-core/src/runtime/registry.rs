// crates/mesh-procedures-core/src/runtime/registry.rs
// ============================================================================
// Module: Step Registry
// Description: Registry of step handlers keyed by step type.
// Purpose: Resolve procedure step types, including legacy aliases, to handlers.
// Dependencies: crate::{core, runtime}
// ============================================================================

//! ## Overview
//! The registry owns one handler per canonical step type and a table of
//! aliases kept for procedure files written against older step names.
//! Resolution is exact: there is no prefix or case-insensitive matching.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use crate::core::endpoints::LinkKind;
use crate::core::entity::EntityKind;
use crate::runtime::handlers::ApplyTransformation;
use crate::runtime::handlers::CheckComputeStatus;
use crate::runtime::handlers::ConfigureEntity;
use crate::runtime::handlers::ConfigureTarget;
use crate::runtime::handlers::CreateEntity;
use crate::runtime::handlers::CreateProduct;
use crate::runtime::handlers::DeleteEntity;
use crate::runtime::handlers::GetEntity;
use crate::runtime::handlers::LinkEntities;
use crate::runtime::handlers::ListEntities;
use crate::runtime::step::StepError;
use crate::runtime::step::StepHandler;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Legacy step names and the canonical step types they map to.
pub const LEGACY_ALIASES: [(&str, &str); 6] = [
    ("configure_connection_details", "configure_source"),
    ("set_connection_secrets", "set_source_secret"),
    ("create_data_product_schema", "define_product_schema"),
    ("create_transformation_builder", "apply_product_transformation"),
    ("get_product", "get_product_by_id"),
    ("get_mesh_list", "get_all_mesh"),
];

// ============================================================================
// SECTION: Step Registry
// ============================================================================

/// Step handler registry.
pub struct StepRegistry {
    /// Handlers keyed by canonical step type.
    handlers: BTreeMap<String, Box<dyn StepHandler + Send + Sync>>,
    /// Alias to canonical step type.
    aliases: BTreeMap<String, String>,
}

impl StepRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
            aliases: BTreeMap::new(),
        }
    }

    /// Creates a registry with every built-in step type and alias.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register_builtin_steps();
        registry
    }

    /// Registers a handler under a canonical step type.
    pub fn register(
        &mut self,
        step_type: impl Into<String>,
        handler: impl StepHandler + Send + Sync + 'static,
    ) {
        self.handlers.insert(step_type.into(), Box::new(handler));
    }

    /// Registers an alias for a canonical step type.
    pub fn register_alias(&mut self, alias: impl Into<String>, target: impl Into<String>) {
        self.aliases.insert(alias.into(), target.into());
    }

    /// Registers the built-in step types and legacy aliases.
    pub fn register_builtin_steps(&mut self) {
        for kind in EntityKind::ALL {
            self.register(format!("get_all_{kind}"), ListEntities {
                kind,
            });
            self.register(format!("delete_{kind}"), DeleteEntity {
                kind,
            });
            if kind == EntityKind::Product {
                self.register("create_product", CreateProduct);
            } else {
                self.register(format!("create_{kind}"), CreateEntity {
                    kind,
                });
            }
        }
        for kind in [EntityKind::Source, EntityKind::Object, EntityKind::Product] {
            self.register(format!("get_{kind}_by_id"), GetEntity {
                kind,
            });
        }
        for (step_type, link) in [
            ("link_system_to_source", LinkKind::SystemToSource),
            ("link_object_to_source", LinkKind::ObjectToSource),
            ("link_product_to_object", LinkKind::ProductToObject),
            ("link_product_to_product", LinkKind::ProductToProduct),
        ] {
            self.register(step_type, LinkEntities {
                link,
            });
        }
        for (step_type, target) in [
            ("configure_source", ConfigureTarget::SourceConnection),
            ("set_source_secret", ConfigureTarget::SourceSecret),
            ("configure_object_details", ConfigureTarget::ObjectDetails),
            ("define_product_schema", ConfigureTarget::ProductSchema),
        ] {
            self.register(step_type, ConfigureEntity {
                target,
            });
        }
        self.register("apply_product_transformation", ApplyTransformation);
        self.register("check_status_compute", CheckComputeStatus);
        for (alias, target) in LEGACY_ALIASES {
            self.register_alias(alias, target);
        }
    }

    /// Returns the canonical step type for a name, following aliases.
    #[must_use]
    pub fn canonical_name<'s>(&'s self, step_type: &'s str) -> Option<&'s str> {
        if self.handlers.contains_key(step_type) {
            return Some(step_type);
        }
        self.aliases
            .get(step_type)
            .map(String::as_str)
            .filter(|target| self.handlers.contains_key(*target))
    }

    /// Resolves a step type to its handler.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::UnknownStepType`] when nothing is registered.
    pub fn resolve(&self, step_type: &str) -> Result<&(dyn StepHandler + Send + Sync), StepError> {
        self.canonical_name(step_type)
            .and_then(|name| self.handlers.get(name))
            .map(|handler| &**handler)
            .ok_or_else(|| StepError::UnknownStepType(step_type.to_string()))
    }

    /// Iterates canonical step types in name order.
    pub fn step_types(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Iterates `(alias, target)` pairs in alias order.
    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(alias, target)| (alias.as_str(), target.as_str()))
    }
}

impl Default for StepRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
