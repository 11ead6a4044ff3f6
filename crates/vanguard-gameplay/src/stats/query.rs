//! Stat keys and the query record that flows through the modifier pipeline.

use serde::{Deserialize, Serialize};

/// Type of stat being queried or modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatType {
    /// Damage of a basic projectile.
    ProjectileDamage,
    /// Damage of a melee swing.
    MeleeDamage,
    /// Damage of a ground slam.
    SlamDamage,
    /// Radius of a ground slam.
    SlamRadius,
    /// Damage of a shockwave.
    ShockwaveDamage,
    /// Radius of a shockwave.
    ShockwaveRadius,
    /// Attacks per second.
    AttackSpeed,
    /// Projectile spread in radians.
    ProjectileSpread,
    /// Number of homing projectiles (integer stat).
    HomingProjectiles,
    /// Maximum health.
    Health,
    /// Max move speed in units per second.
    MoveSpeed,
    /// Seconds for a knockback impulse to dissipate.
    KbDamping,
    /// Seconds controls stay locked after knockback.
    KbControlsLockTime,
    /// Seconds dashing stays locked after knockback.
    KbDashLockTime,
    /// Dash distance in units.
    DashDistance,
    /// Dash travel speed in units per second.
    DashSpeed,
    /// Seconds for dash charges to recover.
    DashCooldown,
    /// Number of dash charges (integer stat).
    DashCharges,
    /// Vertical jump strength.
    JumpForce,
}

impl StatType {
    /// All stat types.
    pub const ALL: [Self; 19] = [
        Self::ProjectileDamage,
        Self::MeleeDamage,
        Self::SlamDamage,
        Self::SlamRadius,
        Self::ShockwaveDamage,
        Self::ShockwaveRadius,
        Self::AttackSpeed,
        Self::ProjectileSpread,
        Self::HomingProjectiles,
        Self::Health,
        Self::MoveSpeed,
        Self::KbDamping,
        Self::KbControlsLockTime,
        Self::KbDashLockTime,
        Self::DashDistance,
        Self::DashSpeed,
        Self::DashCooldown,
        Self::DashCharges,
        Self::JumpForce,
    ];

    /// Returns true for stats read back as whole numbers.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::HomingProjectiles | Self::DashCharges)
    }
}

/// A single attribute computation request.
///
/// The stat key is fixed at construction; only the value accumulates as the
/// query passes through each modifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    stat: StatType,
    /// Accumulated value.
    pub value: f32,
}

impl Query {
    /// Creates a query seeded with a base value.
    #[must_use]
    pub const fn new(stat: StatType, value: f32) -> Self {
        Self { stat, value }
    }

    /// The stat being computed.
    #[must_use]
    pub const fn stat(&self) -> StatType {
        self.stat
    }
}
