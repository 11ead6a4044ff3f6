//! Base attribute table.

use serde::{Deserialize, Serialize};

use crate::stats::query::StatType;

/// Unmodified attribute values for one stat-bearing entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseStats {
    /// Basic projectile damage.
    pub projectile_damage: f32,
    /// Melee swing damage.
    pub melee_damage: f32,
    /// Ground slam damage.
    pub slam_damage: f32,
    /// Ground slam radius.
    pub slam_radius: f32,
    /// Shockwave damage.
    pub shockwave_damage: f32,
    /// Shockwave radius.
    pub shockwave_radius: f32,
    /// Attacks per second.
    pub attack_speed: f32,
    /// Projectile spread in radians.
    pub projectile_spread: f32,
    /// Homing projectile count.
    pub homing_projectiles: u32,
    /// Maximum health.
    pub health: f32,
    /// Max move speed in units per second.
    pub move_speed: f32,
    /// Seconds for a knockback impulse to dissipate.
    pub kb_damping: f32,
    /// Seconds controls stay locked after knockback.
    pub kb_controls_lock_time: f32,
    /// Seconds dashing stays locked after knockback.
    pub kb_dash_lock_time: f32,
    /// Dash distance in units.
    pub dash_distance: f32,
    /// Dash speed in units per second.
    pub dash_speed: f32,
    /// Dash cooldown in seconds.
    pub dash_cooldown: f32,
    /// Dash charges.
    pub dash_charges: u32,
    /// Vertical jump strength.
    pub jump_force: f32,
}

impl Default for BaseStats {
    fn default() -> Self {
        Self {
            projectile_damage: 1.0,
            melee_damage: 1.0,
            slam_damage: 2.0,
            slam_radius: 10.0,
            shockwave_damage: 2.0,
            shockwave_radius: 6.0,
            attack_speed: 5.0,
            projectile_spread: 0.1,
            homing_projectiles: 0,
            health: 10.0,
            move_speed: 10.0,
            kb_damping: 0.0,
            kb_controls_lock_time: 0.0,
            kb_dash_lock_time: 0.0,
            dash_distance: 14.0,
            dash_speed: 100.0,
            dash_cooldown: 2.0,
            dash_charges: 2,
            jump_force: 10.0,
        }
    }
}

impl BaseStats {
    /// Base value for a stat.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn value(&self, stat: StatType) -> f32 {
        match stat {
            StatType::ProjectileDamage => self.projectile_damage,
            StatType::MeleeDamage => self.melee_damage,
            StatType::SlamDamage => self.slam_damage,
            StatType::SlamRadius => self.slam_radius,
            StatType::ShockwaveDamage => self.shockwave_damage,
            StatType::ShockwaveRadius => self.shockwave_radius,
            StatType::AttackSpeed => self.attack_speed,
            StatType::ProjectileSpread => self.projectile_spread,
            StatType::HomingProjectiles => self.homing_projectiles as f32,
            StatType::Health => self.health,
            StatType::MoveSpeed => self.move_speed,
            StatType::KbDamping => self.kb_damping,
            StatType::KbControlsLockTime => self.kb_controls_lock_time,
            StatType::KbDashLockTime => self.kb_dash_lock_time,
            StatType::DashDistance => self.dash_distance,
            StatType::DashSpeed => self.dash_speed,
            StatType::DashCooldown => self.dash_cooldown,
            StatType::DashCharges => self.dash_charges as f32,
            StatType::JumpForce => self.jump_force,
        }
    }

    /// Clamps values that must not be negative.
    pub fn clamp(&mut self) {
        for value in [
            &mut self.projectile_damage,
            &mut self.melee_damage,
            &mut self.slam_damage,
            &mut self.slam_radius,
            &mut self.shockwave_damage,
            &mut self.shockwave_radius,
            &mut self.attack_speed,
            &mut self.projectile_spread,
            &mut self.move_speed,
            &mut self.kb_damping,
            &mut self.kb_controls_lock_time,
            &mut self.kb_dash_lock_time,
            &mut self.dash_distance,
            &mut self.dash_speed,
            &mut self.dash_cooldown,
            &mut self.jump_force,
        ] {
            *value = value.max(0.0);
        }
        self.health = self.health.max(1.0);
    }
}
