//! Applies a DOT entry to enemies the owner hits.

use std::cell::Cell;
use std::rc::{Rc, Weak};
use tracing::info;
use vanguard_common::{EffectError, EntityId};

use crate::combatant::TargetKind;
use crate::context::CombatContext;
use crate::dot::{DotRegistry, DotSpec};
use crate::effects::{impl_timed_effect, EffectCore};
use crate::events::{CombatEventBus, DamageEvent, DamageListener, ListenerId};
use crate::registry::{EffectKind, EffectRegistry};

/// DOT on hit.
///
/// The effect's own stacks are tracked but do not change the DOT it applies;
/// the DOT grows through its own stacking instead. Damage reported while the
/// DOT guard is held is a DOT tick and never applies a new DOT.
pub struct DotOnHit {
    core: EffectCore,
    bus: Rc<CombatEventBus>,
    registry: Rc<EffectRegistry>,
    dots: Rc<DotRegistry>,
    spec: DotSpec,
    subscription: Cell<Option<ListenerId>>,
}

impl DotOnHit {
    /// Creates the effect and subscribes it to the bus.
    #[must_use]
    pub fn new(
        ctx: &CombatContext,
        dots: Rc<DotRegistry>,
        owner: EntityId,
        spec: DotSpec,
        initial_stacks: i32,
        duration: f32,
    ) -> Rc<Self> {
        info!(
            "DOT on hit for {}: {} dmg/tick every {}s for {}s, max {} stacks{}",
            owner,
            spec.base_damage_per_tick,
            spec.tick_interval,
            spec.duration,
            spec.max_stacks,
            if spec.apply_immediately { " (instant)" } else { "" }
        );
        let effect = Rc::new(Self {
            core: EffectCore::new(EffectKind::DotOnHit, owner, initial_stacks, duration),
            bus: Rc::clone(&ctx.bus),
            registry: Rc::clone(&ctx.registry),
            dots,
            spec,
            subscription: Cell::new(None),
        });
        let weak = Rc::downgrade(&effect);
        let listener: Weak<dyn DamageListener> = weak;
        effect.subscription.set(Some(ctx.bus.subscribe(listener)));
        effect
    }

    /// DOT applied on hit.
    #[must_use]
    pub fn spec(&self) -> &DotSpec {
        &self.spec
    }

    fn on_stacks_changed(&self) {}

    fn release(&self) {
        if let Some(id) = self.subscription.take() {
            self.bus.unsubscribe(id);
        }
    }
}

impl DamageListener for DotOnHit {
    fn on_damage_dealt(&self, event: &DamageEvent) -> Result<(), EffectError> {
        if self.core.is_disposed() || event.attacker != self.core.owner() {
            return Ok(());
        }
        if self.registry.dot_guard().is_held() {
            return Ok(());
        }
        if event.target.kind() != TargetKind::Enemy {
            return Ok(());
        }
        self.dots
            .add_dot(&event.target, self.core.owner(), &self.spec);
        Ok(())
    }
}

impl_timed_effect!(DotOnHit);
