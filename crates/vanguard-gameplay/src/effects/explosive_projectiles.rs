//! Publishes explosion tuning for projectiles.

use std::cell::Cell;
use std::rc::Rc;
use tracing::warn;
use vanguard_common::{EffectError, EntityId};

use crate::context::CombatContext;
use crate::effects::{impl_timed_effect, stack_scale, EffectCore};
use crate::registry::{EffectKind, EffectRegistry, ExplosiveTuning, PublishedTuning};

/// Explosive projectiles.
pub struct ExplosiveProjectiles {
    core: EffectCore,
    registry: Rc<EffectRegistry>,
    base: ExplosiveTuning,
    current: Cell<ExplosiveTuning>,
}

impl ExplosiveProjectiles {
    /// Creates the effect and publishes its tuning.
    ///
    /// A non-positive `max_range` means projectiles only explode on impact.
    ///
    /// # Errors
    ///
    /// Fails if another live instance already publishes explosive tuning.
    pub fn new(
        ctx: &CombatContext,
        owner: EntityId,
        aoe_radius: f32,
        aoe_damage_multiplier: f32,
        max_range: f32,
        initial_stacks: i32,
        duration: f32,
    ) -> Result<Rc<Self>, EffectError> {
        let base = ExplosiveTuning {
            aoe_radius,
            aoe_damage_multiplier,
            max_range,
        };
        let effect = Rc::new(Self {
            core: EffectCore::new(
                EffectKind::ExplosiveProjectiles,
                owner,
                initial_stacks,
                duration,
            ),
            registry: Rc::clone(&ctx.registry),
            base,
            current: Cell::new(base),
        });
        effect.recompute();
        effect.registry.publish(
            effect.core.id(),
            PublishedTuning::Explosive(effect.current.get()),
        )?;
        Ok(effect)
    }

    /// Current tuning.
    #[must_use]
    pub fn tuning(&self) -> ExplosiveTuning {
        self.current.get()
    }

    #[allow(clippy::cast_precision_loss)]
    fn recompute(&self) {
        let stacks = self.core.stacks();
        let scale = stack_scale(stacks);
        self.current.set(ExplosiveTuning {
            aoe_radius: self.base.aoe_radius * scale,
            aoe_damage_multiplier: self.base.aoe_damage_multiplier * stacks as f32,
            max_range: if self.base.max_range > 0.0 {
                self.base.max_range * scale
            } else {
                0.0
            },
        });
    }

    fn on_stacks_changed(&self) {
        if self.core.stacks() <= 0 {
            return;
        }
        self.recompute();
        if let Err(e) = self.registry.publish(
            self.core.id(),
            PublishedTuning::Explosive(self.current.get()),
        ) {
            warn!("Failed to republish explosive tuning: {}", e);
        }
    }

    fn release(&self) {
        self.registry
            .retract(EffectKind::ExplosiveProjectiles, self.core.id());
        self.current.set(ExplosiveTuning::NEUTRAL);
    }
}

impl_timed_effect!(ExplosiveProjectiles);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::TimedEffect;

    #[test]
    fn test_scaling() {
        let ctx = CombatContext::new();
        let effect = ExplosiveProjectiles::new(&ctx, EntityId::new(), 3.0, 0.5, 10.0, 1, -1.0)
            .expect("explosive effect");
        assert_eq!(ctx.registry.explosive().aoe_radius, 3.0);

        effect.add_stack(2);
        let tuning = ctx.registry.explosive();
        assert!((tuning.aoe_radius - 4.2).abs() < 1e-5);
        assert!((tuning.aoe_damage_multiplier - 1.5).abs() < 1e-5);
        assert!((tuning.max_range - 14.0).abs() < 1e-5);
    }

    #[test]
    fn test_impact_only_keeps_zero_range() {
        let ctx = CombatContext::new();
        let effect = ExplosiveProjectiles::new(&ctx, EntityId::new(), 3.0, 0.5, 0.0, 4, -1.0)
            .expect("explosive effect");
        assert_eq!(effect.tuning().max_range, 0.0);
        assert_eq!(ctx.registry.explosive().max_range, 0.0);
    }

    #[test]
    fn test_expiry_resets_to_neutral() {
        let ctx = CombatContext::new();
        let effect = ExplosiveProjectiles::new(&ctx, EntityId::new(), 3.0, 0.5, 5.0, 2, 1.0)
            .expect("explosive effect");
        effect.update(0.5);
        assert!(ctx.registry.is_enabled(EffectKind::ExplosiveProjectiles));
        effect.update(0.5);
        assert!(effect.is_disposed());
        assert_eq!(ctx.registry.explosive(), ExplosiveTuning::NEUTRAL);
    }

    #[test]
    fn test_drop_retracts() {
        let ctx = CombatContext::new();
        {
            let _effect =
                ExplosiveProjectiles::new(&ctx, EntityId::new(), 3.0, 0.5, 5.0, 1, -1.0)
                    .expect("explosive effect");
            assert!(ctx.registry.is_enabled(EffectKind::ExplosiveProjectiles));
        }
        assert!(!ctx.registry.is_enabled(EffectKind::ExplosiveProjectiles));
    }
}
