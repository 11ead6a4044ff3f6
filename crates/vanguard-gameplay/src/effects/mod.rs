//! Timed stacking effects.
//!
//! Each effect is created when a pickup is first collected, gains stacks on
//! repeat pickups, optionally expires after a duration and, once disposed,
//! undoes everything it installed: bus subscriptions, published tuning,
//! temporary element rules. Disposal is idempotent and also runs on drop.

use std::any::Any;
use vanguard_common::{EffectInstanceId, EntityId};

use crate::registry::EffectKind;

/// Per-stack growth applied to ranges and radii.
pub(crate) const STACK_SCALING: f32 = 0.2;

/// Scale factor `1 + (stacks - 1) * STACK_SCALING`.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn stack_scale(stacks: i32) -> f32 {
    1.0 + (stacks - 1) as f32 * STACK_SCALING
}

/// Shared interface of every effect variant.
pub trait TimedEffect {
    /// Variant.
    fn kind(&self) -> EffectKind;

    /// Instance id.
    fn instance_id(&self) -> EffectInstanceId;

    /// Owning entity.
    fn owner(&self) -> EntityId;

    /// Current stacks.
    fn stacks(&self) -> i32;

    /// Adds stacks and recomputes derived values immediately.
    fn add_stack(&self, count: i32);

    /// Sheds stacks whatever the stack policy; disposes at zero stacks.
    fn remove_stack(&self, count: i32);

    /// Counts down the duration; disposes on expiry.
    fn update(&self, dt: f32);

    /// Ends the effect and reverses everything it installed.
    fn dispose(&self);

    /// Returns true once disposed.
    fn is_disposed(&self) -> bool;

    /// For typed access through [`EffectSet::get_as`].
    fn as_any(&self) -> &dyn Any;
}

/// Implements the [`TimedEffect`] boilerplate on top of an `EffectCore` field
/// named `core` and inherent `on_stacks_changed` and `release` methods.
macro_rules! impl_timed_effect {
    ($ty:ty) => {
        impl $crate::effects::TimedEffect for $ty {
            fn kind(&self) -> $crate::registry::EffectKind {
                self.core.kind()
            }

            fn instance_id(&self) -> vanguard_common::EffectInstanceId {
                self.core.id()
            }

            fn owner(&self) -> vanguard_common::EntityId {
                self.core.owner()
            }

            fn stacks(&self) -> i32 {
                self.core.stacks()
            }

            fn add_stack(&self, count: i32) {
                if self.core.is_disposed() {
                    return;
                }
                let alive = self.core.add_stacks(count);
                self.on_stacks_changed();
                if !alive {
                    $crate::effects::TimedEffect::dispose(self);
                }
            }

            fn remove_stack(&self, count: i32) {
                if self.core.is_disposed() {
                    return;
                }
                if self.core.remove_stacks(count) {
                    self.on_stacks_changed();
                } else {
                    $crate::effects::TimedEffect::dispose(self);
                }
            }

            fn update(&self, dt: f32) {
                if self.core.tick(dt) {
                    $crate::effects::TimedEffect::dispose(self);
                }
            }

            fn dispose(&self) {
                if self.core.begin_dispose() {
                    self.release();
                }
            }

            fn is_disposed(&self) -> bool {
                self.core.is_disposed()
            }

            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
        }

        impl Drop for $ty {
            fn drop(&mut self) {
                $crate::effects::TimedEffect::dispose(self);
            }
        }
    };
}

pub(crate) use impl_timed_effect;

mod bounce_projectiles;
mod chain_lightning;
mod delayed_projectiles;
mod dot_on_hit;
mod effect_set;
mod element_fusion;
mod explosive_projectiles;
mod factory;
mod fall_damage_bonus;
mod heal_on_damage;
mod lifetime;
mod stomp_damage;

pub use bounce_projectiles::BounceProjectiles;
pub use chain_lightning::{ChainLightning, CHAIN_BOLT_LIFETIME};
pub use delayed_projectiles::DelayedProjectiles;
pub use dot_on_hit::DotOnHit;
pub use effect_set::EffectSet;
pub use element_fusion::ElementFusion;
pub use explosive_projectiles::ExplosiveProjectiles;
pub use factory::{
    BounceParams, ChainParams, DelayedParams, EffectFactory, EffectParams, EffectSpec,
    ExplosiveParams, FallParams, FusionParams, StompParams,
};
pub use fall_damage_bonus::FallDamageBonus;
pub use heal_on_damage::{HealFormula, HealOnDamage};
pub use lifetime::{EffectCore, StackLifetime, StackPolicy};
pub use stomp_damage::{StompDamage, StompOutcome};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_scale() {
        assert_eq!(stack_scale(1), 1.0);
        assert!((stack_scale(3) - 1.4).abs() < 1e-6);
        assert!((stack_scale(0) - 0.8).abs() < 1e-6);
    }
}
