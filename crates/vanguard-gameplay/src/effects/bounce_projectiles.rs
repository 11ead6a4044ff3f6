//! Publishes bounce tuning for projectiles.

use std::cell::Cell;
use std::rc::Rc;
use tracing::warn;
use vanguard_common::{EffectError, EntityId};

use crate::context::CombatContext;
use crate::effects::{impl_timed_effect, stack_scale, EffectCore};
use crate::registry::{BounceTuning, EffectKind, EffectRegistry, PublishedTuning};

/// Bouncing projectiles.
///
/// Range grows 20% per extra stack and every extra stack adds one bounce.
/// Negative stack changes shrink the effect; it ends at zero stacks.
pub struct BounceProjectiles {
    core: EffectCore,
    registry: Rc<EffectRegistry>,
    base: BounceTuning,
    current: Cell<BounceTuning>,
}

impl BounceProjectiles {
    /// Creates the effect and publishes its tuning.
    ///
    /// # Errors
    ///
    /// Fails if another live instance already publishes bounce tuning.
    pub fn new(
        ctx: &CombatContext,
        owner: EntityId,
        range: f32,
        max_bounces: i32,
        damage_multiplier: f32,
        initial_stacks: i32,
        duration: f32,
    ) -> Result<Rc<Self>, EffectError> {
        let base = BounceTuning {
            range,
            max_bounces,
            damage_multiplier,
        };
        let effect = Rc::new(Self {
            core: EffectCore::new(EffectKind::BounceProjectiles, owner, initial_stacks, duration),
            registry: Rc::clone(&ctx.registry),
            base,
            current: Cell::new(base),
        });
        effect.recompute();
        effect
            .registry
            .publish(effect.core.id(), PublishedTuning::Bounce(effect.current.get()))?;
        Ok(effect)
    }

    /// Current tuning.
    #[must_use]
    pub fn tuning(&self) -> BounceTuning {
        self.current.get()
    }

    fn recompute(&self) {
        let stacks = self.core.stacks();
        self.current.set(BounceTuning {
            range: self.base.range * stack_scale(stacks),
            max_bounces: self.base.max_bounces + (stacks - 1),
            damage_multiplier: self.base.damage_multiplier,
        });
    }

    fn on_stacks_changed(&self) {
        if self.core.stacks() <= 0 {
            return;
        }
        self.recompute();
        if let Err(e) = self
            .registry
            .publish(self.core.id(), PublishedTuning::Bounce(self.current.get()))
        {
            warn!("Failed to republish bounce tuning: {}", e);
        }
    }

    fn release(&self) {
        self.registry
            .retract(EffectKind::BounceProjectiles, self.core.id());
        self.current.set(BounceTuning::NEUTRAL);
    }
}

impl_timed_effect!(BounceProjectiles);
