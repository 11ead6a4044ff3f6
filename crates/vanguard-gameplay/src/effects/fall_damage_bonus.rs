//! Extra slam damage proportional to fall height.

use std::cell::Cell;
use std::rc::Rc;
use tracing::{debug, warn};
use vanguard_common::{EffectError, EntityId};

use crate::context::CombatContext;
use crate::effects::{impl_timed_effect, EffectCore};
use crate::registry::{EffectKind, EffectRegistry, FallDamageTuning, PublishedTuning};

/// Fall damage bonus.
///
/// The slam collaborator records the height a slam starts from and asks for
/// the bonus when it lands. Each recorded height is consumed by one landing.
pub struct FallDamageBonus {
    core: EffectCore,
    registry: Rc<EffectRegistry>,
    damage_per_meter: f32,
    slam_start_height: Cell<Option<f32>>,
}

impl FallDamageBonus {
    /// Creates the effect and publishes its tuning.
    ///
    /// # Errors
    ///
    /// Fails if another live instance already publishes a fall bonus.
    pub fn new(
        ctx: &CombatContext,
        owner: EntityId,
        damage_per_meter: f32,
        initial_stacks: i32,
        duration: f32,
    ) -> Result<Rc<Self>, EffectError> {
        let effect = Rc::new(Self {
            core: EffectCore::new(EffectKind::FallDamageBonus, owner, initial_stacks, duration),
            registry: Rc::clone(&ctx.registry),
            damage_per_meter,
            slam_start_height: Cell::new(None),
        });
        effect
            .registry
            .publish(effect.core.id(), PublishedTuning::FallDamage(effect.tuning()))?;
        Ok(effect)
    }

    /// Current tuning, neutral once disposed.
    #[must_use]
    pub fn tuning(&self) -> FallDamageTuning {
        if self.core.is_disposed() {
            return FallDamageTuning::NEUTRAL;
        }
        FallDamageTuning {
            damage_per_meter: self.damage_per_meter,
            stacks: self.core.stacks(),
        }
    }

    /// Records the height a slam starts from.
    pub fn record_slam_start_height(&self, height: f32) {
        if self.core.is_disposed() {
            return;
        }
        self.slam_start_height.set(Some(height));
    }

    /// Bonus damage for a slam landing at `impact_height`.
    ///
    /// Consumes the recorded start height. Returns zero without a record or
    /// when the slam did not fall.
    pub fn bonus_slam_damage(&self, impact_height: f32) -> f32 {
        let Some(start) = self.slam_start_height.take() else {
            return 0.0;
        };
        if self.core.is_disposed() {
            return 0.0;
        }
        let bonus = self.tuning().bonus_for_fall(start - impact_height);
        debug!(
            "Fall bonus for {}: {:.1} m -> {:.1} dmg",
            self.core.owner(),
            start - impact_height,
            bonus
        );
        bonus
    }

    fn on_stacks_changed(&self) {
        if let Err(e) = self
            .registry
            .publish(self.core.id(), PublishedTuning::FallDamage(self.tuning()))
        {
            warn!("Failed to republish fall bonus: {}", e);
        }
    }

    fn release(&self) {
        self.registry
            .retract(EffectKind::FallDamageBonus, self.core.id());
        self.slam_start_height.set(None);
    }
}

impl_timed_effect!(FallDamageBonus);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::TimedEffect;

    fn bonus(ctx: &CombatContext, stacks: i32) -> Rc<FallDamageBonus> {
        FallDamageBonus::new(ctx, EntityId::new(), 2.0, stacks, -1.0).expect("fall bonus")
    }

    #[test]
    fn test_bonus_consumes_record() {
        let ctx = CombatContext::new();
        let effect = bonus(&ctx, 2);
        effect.record_slam_start_height(10.0);
        assert_eq!(effect.bonus_slam_damage(4.0), 24.0);
        assert_eq!(effect.bonus_slam_damage(4.0), 0.0);
    }

    #[test]
    fn test_no_fall_no_bonus() {
        let ctx = CombatContext::new();
        let effect = bonus(&ctx, 1);
        assert_eq!(effect.bonus_slam_damage(0.0), 0.0);
        effect.record_slam_start_height(2.0);
        assert_eq!(effect.bonus_slam_damage(3.0), 0.0);
    }

    #[test]
    fn test_stacks_republish() {
        let ctx = CombatContext::new();
        let effect = bonus(&ctx, 1);
        effect.add_stack(0);
        assert_eq!(ctx.registry.fall_damage().stacks, 2);
        assert_eq!(ctx.registry.fall_damage().bonus_for_fall(1.0), 4.0);
    }

    #[test]
    fn test_disposed_gives_nothing() {
        let ctx = CombatContext::new();
        let effect = bonus(&ctx, 3);
        effect.record_slam_start_height(10.0);
        effect.dispose();
        assert_eq!(effect.bonus_slam_damage(0.0), 0.0);
        assert_eq!(ctx.registry.fall_damage(), FallDamageTuning::NEUTRAL);
        assert_eq!(effect.tuning(), FallDamageTuning::NEUTRAL);
    }
}
