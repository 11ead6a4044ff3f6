//! Publishes delayed-damage tuning for projectiles.

use std::cell::Cell;
use std::rc::Rc;
use tracing::warn;
use vanguard_common::{EffectError, EntityId};

use crate::context::CombatContext;
use crate::effects::{impl_timed_effect, stack_scale, EffectCore};
use crate::registry::{DelayedTuning, EffectKind, EffectRegistry, PublishedTuning};

/// Delayed projectiles.
///
/// Hits mark their target; the mark detonates after `delay_time` for the
/// marked damage times `damage_multiplier`. See
/// [`DelayedDamageMarks`](crate::delayed_marks::DelayedDamageMarks).
pub struct DelayedProjectiles {
    core: EffectCore,
    registry: Rc<EffectRegistry>,
    base: DelayedTuning,
    current: Cell<DelayedTuning>,
}

impl DelayedProjectiles {
    /// Creates the effect and publishes its tuning.
    ///
    /// # Errors
    ///
    /// Fails if another live instance already publishes delayed tuning.
    pub fn new(
        ctx: &CombatContext,
        owner: EntityId,
        delay_time: f32,
        damage_multiplier: f32,
        initial_stacks: i32,
        duration: f32,
    ) -> Result<Rc<Self>, EffectError> {
        let base = DelayedTuning {
            delay_time,
            damage_multiplier,
        };
        let effect = Rc::new(Self {
            core: EffectCore::new(EffectKind::DelayedProjectiles, owner, initial_stacks, duration),
            registry: Rc::clone(&ctx.registry),
            base,
            current: Cell::new(base),
        });
        effect.recompute();
        effect
            .registry
            .publish(effect.core.id(), PublishedTuning::Delayed(effect.current.get()))?;
        Ok(effect)
    }

    /// Current tuning.
    #[must_use]
    pub fn tuning(&self) -> DelayedTuning {
        self.current.get()
    }

    fn recompute(&self) {
        self.current.set(DelayedTuning {
            delay_time: self.base.delay_time,
            damage_multiplier: self.base.damage_multiplier * stack_scale(self.core.stacks()),
        });
    }

    fn on_stacks_changed(&self) {
        if self.core.stacks() <= 0 {
            return;
        }
        self.recompute();
        if let Err(e) = self
            .registry
            .publish(self.core.id(), PublishedTuning::Delayed(self.current.get()))
        {
            warn!("Failed to republish delayed tuning: {}", e);
        }
    }

    fn release(&self) {
        self.registry
            .retract(EffectKind::DelayedProjectiles, self.core.id());
        self.current.set(DelayedTuning::NEUTRAL);
    }
}

impl_timed_effect!(DelayedProjectiles);
