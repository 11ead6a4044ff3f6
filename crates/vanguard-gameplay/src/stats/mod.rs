//! Attribute pipeline.
//!
//! Every attribute read builds a fresh [`Query`] seeded with the base value
//! and runs it through the entity's [`StatsMediator`]. Nothing is cached.

mod base;
mod mediator;
mod modifier;
mod query;

pub use base::BaseStats;
pub use mediator::{ModifierId, StatsMediator};
pub use modifier::{BasicStatsModifier, ModifierOperation, OperatorType, StatModifier};
pub use query::{Query, StatType};

use std::fmt;
use vanguard_common::EntityId;

/// Read-only attribute view over a mediator and a base table.
#[derive(Debug)]
pub struct Stats {
    owner: EntityId,
    mediator: StatsMediator,
    base: BaseStats,
}

impl Stats {
    /// Creates stats for an entity with no modifiers.
    #[must_use]
    pub fn new(owner: EntityId, base: BaseStats) -> Self {
        Self {
            owner,
            mediator: StatsMediator::new(),
            base,
        }
    }

    /// Entity these stats belong to.
    #[must_use]
    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// The modifier chain.
    #[must_use]
    pub fn mediator(&self) -> &StatsMediator {
        &self.mediator
    }

    /// The modifier chain, for installing or disposing modifiers.
    pub fn mediator_mut(&mut self) -> &mut StatsMediator {
        &mut self.mediator
    }

    /// The unmodified values.
    #[must_use]
    pub fn base(&self) -> &BaseStats {
        &self.base
    }

    /// Base value for a stat.
    #[must_use]
    pub fn base_value_for_stat(&self, stat: StatType) -> f32 {
        self.base.value(stat)
    }

    /// Current value of a stat with all modifiers applied.
    #[must_use]
    pub fn query(&self, stat: StatType) -> f32 {
        let mut query = Query::new(stat, self.base.value(stat));
        self.mediator.perform_query(self.owner, &mut query);
        query.value
    }

    /// Current value rounded up to a whole number.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn query_int(&self, stat: StatType) -> i32 {
        self.query(stat).ceil() as i32
    }

    /// Advances modifier countdowns and sweeps expired ones.
    pub fn update(&mut self, dt: f32) -> Vec<ModifierId> {
        self.mediator.update(dt)
    }

    // ========================================================================
    // Attack
    // ========================================================================

    /// Projectile damage.
    #[must_use]
    pub fn projectile_damage(&self) -> f32 {
        self.query(StatType::ProjectileDamage)
    }

    /// Melee damage.
    #[must_use]
    pub fn melee_damage(&self) -> f32 {
        self.query(StatType::MeleeDamage)
    }

    /// Slam damage.
    #[must_use]
    pub fn slam_damage(&self) -> f32 {
        self.query(StatType::SlamDamage)
    }

    /// Slam radius.
    #[must_use]
    pub fn slam_radius(&self) -> f32 {
        self.query(StatType::SlamRadius)
    }

    /// Shockwave damage.
    #[must_use]
    pub fn shockwave_damage(&self) -> f32 {
        self.query(StatType::ShockwaveDamage)
    }

    /// Shockwave radius.
    #[must_use]
    pub fn shockwave_radius(&self) -> f32 {
        self.query(StatType::ShockwaveRadius)
    }

    /// Attacks per second.
    #[must_use]
    pub fn attack_speed(&self) -> f32 {
        self.query(StatType::AttackSpeed)
    }

    /// Projectile spread in radians.
    #[must_use]
    pub fn projectile_spread(&self) -> f32 {
        self.query(StatType::ProjectileSpread)
    }

    /// Homing projectile count.
    #[must_use]
    pub fn homing_projectiles(&self) -> i32 {
        self.query_int(StatType::HomingProjectiles)
    }

    // ========================================================================
    // Health and movement
    // ========================================================================

    /// Maximum health.
    #[must_use]
    pub fn health(&self) -> f32 {
        self.query(StatType::Health)
    }

    /// Move speed.
    #[must_use]
    pub fn move_speed(&self) -> f32 {
        self.query(StatType::MoveSpeed)
    }

    /// Jump force.
    #[must_use]
    pub fn jump_force(&self) -> f32 {
        self.query(StatType::JumpForce)
    }

    // ========================================================================
    // Knockback
    // ========================================================================

    /// Knockback damping time.
    #[must_use]
    pub fn kb_damping(&self) -> f32 {
        self.query(StatType::KbDamping)
    }

    /// Controls lock after knockback.
    #[must_use]
    pub fn kb_controls_lock_time(&self) -> f32 {
        self.query(StatType::KbControlsLockTime)
    }

    /// Dash lock after knockback.
    #[must_use]
    pub fn kb_dash_lock_time(&self) -> f32 {
        self.query(StatType::KbDashLockTime)
    }

    // ========================================================================
    // Dash
    // ========================================================================

    /// Dash distance.
    #[must_use]
    pub fn dash_distance(&self) -> f32 {
        self.query(StatType::DashDistance)
    }

    /// Dash speed.
    #[must_use]
    pub fn dash_speed(&self) -> f32 {
        self.query(StatType::DashSpeed)
    }

    /// Dash cooldown.
    #[must_use]
    pub fn dash_cooldown(&self) -> f32 {
        self.query(StatType::DashCooldown)
    }

    /// Dash charges.
    #[must_use]
    pub fn dash_charges(&self) -> i32 {
        self.query_int(StatType::DashCharges)
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Health: {}, MoveSpeed: {:.1}, Projectile Damage: {}, \
             Melee Damage: {}, Slam Damage: {}, Attack Speed: {}",
            self.health(),
            self.move_speed(),
            self.projectile_damage(),
            self.melee_damage(),
            self.slam_damage(),
            self.attack_speed()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> Stats {
        Stats::new(EntityId::new(), BaseStats::default())
    }

    #[test]
    fn test_base_values() {
        let stats = stats();
        assert_eq!(stats.health(), 10.0);
        assert_eq!(stats.move_speed(), 10.0);
        assert_eq!(stats.dash_charges(), 2);
        assert_eq!(stats.base_value_for_stat(StatType::SlamRadius), 10.0);
    }

    #[test]
    fn test_recomputed_every_read() {
        let mut stats = stats();
        assert_eq!(stats.projectile_damage(), 1.0);

        let id = stats
            .mediator_mut()
            .add(BasicStatsModifier::add(StatType::ProjectileDamage, -1.0, 2.0));
        assert_eq!(stats.projectile_damage(), 3.0);

        stats.mediator_mut().dispose(id);
        assert_eq!(stats.projectile_damage(), 1.0);
    }

    #[test]
    fn test_integer_stats_round_up() {
        let mut stats = stats();
        stats
            .mediator_mut()
            .add(BasicStatsModifier::add(StatType::HomingProjectiles, -1.0, 0.2));
        assert_eq!(stats.homing_projectiles(), 1);

        stats
            .mediator_mut()
            .add(BasicStatsModifier::multiply(StatType::DashCharges, -1.0, 1.25));
        assert_eq!(stats.dash_charges(), 3);
    }

    #[test]
    fn test_timed_modifier_expires_through_stats() {
        let mut stats = stats();
        stats
            .mediator_mut()
            .add(BasicStatsModifier::multiply(StatType::MoveSpeed, 2.0, 1.5));
        assert_eq!(stats.move_speed(), 15.0);
        assert!(stats.update(1.0).is_empty());
        assert_eq!(stats.update(1.0).len(), 1);
        assert_eq!(stats.move_speed(), 10.0);
    }

    #[test]
    fn test_display() {
        let line = stats().to_string();
        assert!(line.starts_with("Health: 10, MoveSpeed: 10.0"));
    }
}
