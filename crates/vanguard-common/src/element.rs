//! Elemental damage kinds.

use serde::{Deserialize, Serialize};

/// Element carried by a damage event.
///
/// `None` marks plain (non-elemental) damage such as a projectile or melee hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ElementKind {
    /// Plain damage.
    #[default]
    None,
    /// Fire damage.
    Fire,
    /// Poison damage.
    Poison,
    /// Lightning damage.
    Lightning,
    /// Ice damage.
    Ice,
}

impl ElementKind {
    /// All element kinds.
    pub const ALL: [Self; 5] = [
        Self::None,
        Self::Fire,
        Self::Poison,
        Self::Lightning,
        Self::Ice,
    ];

    /// Returns true for plain damage.
    #[must_use]
    pub const fn is_none(self) -> bool {
        matches!(self, Self::None)
    }

    /// Lowercase name used in logs and config files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Fire => "fire",
            Self::Poison => "poison",
            Self::Lightning => "lightning",
            Self::Ice => "ice",
        }
    }
}
