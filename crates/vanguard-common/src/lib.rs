//! # Vanguard Common
//!
//! Common types, utilities, and shared abstractions for Vanguard.
//!
//! This crate provides foundational types used across all Vanguard subsystems:
//! - ID types (EntityId, EffectInstanceId, ItemId)
//! - Elemental damage kinds
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod element;
pub mod error;
pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::element::*;
    pub use crate::error::*;
    pub use crate::ids::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_generation() {
        let id1 = EntityId::new();
        let id2 = EntityId::new();
        assert_ne!(id1, id2);
        assert!(id1.is_valid());
        assert!(!EntityId::NULL.is_valid());
    }

    #[test]
    fn test_effect_instance_ids_are_unique() {
        let a = EffectInstanceId::next();
        let b = EffectInstanceId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_element_names() {
        assert_eq!(ElementKind::Lightning.name(), "lightning");
        assert!(ElementKind::None.is_none());
        assert!(!ElementKind::Fire.is_none());
    }
}
