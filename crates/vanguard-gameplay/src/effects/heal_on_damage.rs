//! Heals the owner whenever the owner deals damage.

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::{Rc, Weak};
use tracing::debug;
use vanguard_common::{EffectError, EntityId};

use crate::combatant::Damageable;
use crate::context::CombatContext;
use crate::effects::{impl_timed_effect, EffectCore};
use crate::events::{CombatEventBus, DamageEvent, DamageListener, ListenerId};
use crate::registry::EffectKind;

/// How much a hit heals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HealFormula {
    /// `amount_per_stack * stacks`, regardless of the damage dealt.
    FlatPerStack {
        /// Health restored per stack.
        amount_per_stack: f32,
    },
    /// `damage * percent_per_stack * stacks`.
    DamageProportional {
        /// Fraction of the damage restored per stack.
        percent_per_stack: f32,
    },
}

impl Default for HealFormula {
    fn default() -> Self {
        Self::FlatPerStack {
            amount_per_stack: 1.0,
        }
    }
}

impl HealFormula {
    /// Heal for a hit of `damage` at `stacks`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn heal_amount(&self, damage: f32, stacks: i32) -> f32 {
        let stacks = stacks as f32;
        match *self {
            Self::FlatPerStack { amount_per_stack } => amount_per_stack * stacks,
            Self::DamageProportional { percent_per_stack } => damage * percent_per_stack * stacks,
        }
    }
}

/// Lifesteal on hit.
pub struct HealOnDamage {
    core: EffectCore,
    bus: Rc<CombatEventBus>,
    owner_health: Option<Rc<dyn Damageable>>,
    formula: HealFormula,
    subscription: Cell<Option<ListenerId>>,
}

impl HealOnDamage {
    /// Creates the effect and subscribes it to the bus.
    ///
    /// Without `owner_health` the effect stays live but heals nothing.
    #[must_use]
    pub fn new(
        ctx: &CombatContext,
        owner: EntityId,
        owner_health: Option<Rc<dyn Damageable>>,
        formula: HealFormula,
        initial_stacks: i32,
        duration: f32,
    ) -> Rc<Self> {
        let effect = Rc::new(Self {
            core: EffectCore::new(EffectKind::HealOnDamage, owner, initial_stacks, duration),
            bus: Rc::clone(&ctx.bus),
            owner_health,
            formula,
            subscription: Cell::new(None),
        });
        let weak = Rc::downgrade(&effect);
        let listener: Weak<dyn DamageListener> = weak;
        effect.subscription.set(Some(ctx.bus.subscribe(listener)));
        effect
    }

    /// Heal formula in use.
    #[must_use]
    pub fn formula(&self) -> HealFormula {
        self.formula
    }

    fn on_stacks_changed(&self) {}

    fn release(&self) {
        if let Some(id) = self.subscription.take() {
            self.bus.unsubscribe(id);
        }
    }
}

impl DamageListener for HealOnDamage {
    fn on_damage_dealt(&self, event: &DamageEvent) -> Result<(), EffectError> {
        if self.core.is_disposed() || event.attacker != self.core.owner() {
            return Ok(());
        }
        let Some(health) = &self.owner_health else {
            return Ok(());
        };
        let amount = self.formula.heal_amount(event.damage, self.core.stacks());
        if amount > 0.0 {
            health.heal(amount);
            debug!("{} healed {} for {}", self.core.id(), self.core.owner(), amount);
        }
        Ok(())
    }
}

impl_timed_effect!(HealOnDamage);
