//! Damages enemies the owner lands on.

use glam::Vec3;
use std::cell::Cell;
use std::rc::Rc;
use tracing::debug;
use vanguard_common::{EffectError, EntityId};

use crate::combatant::{CombatantRef, TargetKind};
use crate::context::CombatContext;
use crate::effects::{impl_timed_effect, EffectCore};
use crate::events::CombatEventBus;
use crate::registry::{EffectKind, EffectRegistry, PublishedTuning, StompDetector};

/// The owner must be at least this far above the enemy.
const MIN_HEIGHT_ABOVE_ENEMY: f32 = 0.5;

/// Vertical component of the knockback direction.
const KNOCKBACK_LIFT: f32 = 0.3;

/// Knockback impulse magnitude.
const KNOCKBACK_FORCE: f32 = 5.0;

/// What a successful stomp did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StompOutcome {
    /// Damage dealt to the enemy.
    pub damage: f32,
    /// Upward force to apply to the owner.
    pub bounce_force: f32,
    /// Impulse to apply to the enemy.
    pub knockback: Vec3,
}

/// Stomp damage.
///
/// Publishes a [`StompDetector`] while it lives; the physics collaborator
/// uses it to find enemies under the owner and calls
/// [`StompDamage::on_enemy_detected`] for each.
pub struct StompDamage {
    core: EffectCore,
    bus: Rc<CombatEventBus>,
    registry: Rc<EffectRegistry>,
    detector: StompDetector,
    damage_per_stack: f32,
    bounce_force: f32,
    last_stomp_time: Cell<f32>,
}

impl StompDamage {
    /// Creates the effect and publishes its detector.
    ///
    /// # Errors
    ///
    /// Fails if another live instance already publishes a detector.
    pub fn new(
        ctx: &CombatContext,
        owner: EntityId,
        detector: StompDetector,
        damage_per_stack: f32,
        bounce_force: f32,
        initial_stacks: i32,
        duration: f32,
    ) -> Result<Rc<Self>, EffectError> {
        let effect = Rc::new(Self {
            core: EffectCore::new(EffectKind::StompDamage, owner, initial_stacks, duration),
            bus: Rc::clone(&ctx.bus),
            registry: Rc::clone(&ctx.registry),
            detector,
            damage_per_stack,
            bounce_force,
            last_stomp_time: Cell::new(-999.0),
        });
        effect
            .registry
            .publish(effect.core.id(), PublishedTuning::Stomp(detector))?;
        Ok(effect)
    }

    /// Detector published for this effect.
    #[must_use]
    pub fn detector(&self) -> StompDetector {
        self.detector
    }

    /// Damage a stomp deals at the current stacks.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn damage(&self) -> f32 {
        self.damage_per_stack * self.core.stacks() as f32
    }

    /// Handles an enemy entering the detector.
    ///
    /// Any detection starts the cooldown. The stomp only lands if the owner
    /// falls faster than the detector's minimum speed and is above the enemy.
    pub fn on_enemy_detected(
        &self,
        enemy: &CombatantRef,
        owner_position: Vec3,
        vertical_velocity: f32,
        now: f32,
    ) -> Option<StompOutcome> {
        if self.core.is_disposed() || enemy.kind() != TargetKind::Enemy || enemy.is_dead() {
            return None;
        }
        if now - self.last_stomp_time.get() < self.detector.cooldown {
            return None;
        }
        self.last_stomp_time.set(now);

        if vertical_velocity >= -self.detector.min_fall_speed {
            return None;
        }
        let enemy_position = enemy.position();
        if owner_position.y <= enemy_position.y + MIN_HEIGHT_ABOVE_ENEMY {
            return None;
        }

        let damage = self.damage();
        enemy.take_damage(damage);
        self.bus
            .report_physical_damage(self.core.owner(), enemy, damage);

        let mut direction = enemy_position - owner_position;
        direction.y = 0.0;
        let mut direction = direction.normalize_or_zero();
        direction.y = KNOCKBACK_LIFT;
        debug!("Stomp on {} for {:.1}", enemy.id(), damage);

        Some(StompOutcome {
            damage,
            bounce_force: self.bounce_force,
            knockback: direction * KNOCKBACK_FORCE,
        })
    }

    fn on_stacks_changed(&self) {}

    fn release(&self) {
        self.registry.retract(EffectKind::StompDamage, self.core.id());
    }
}

impl_timed_effect!(StompDamage);
