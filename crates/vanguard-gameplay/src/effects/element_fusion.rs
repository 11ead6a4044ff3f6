//! Temporarily lets one element trigger another.

use std::cell::Cell;
use std::rc::Rc;
use tracing::debug;
use vanguard_common::{ElementKind, EntityId};

use crate::context::CombatContext;
use crate::effects::{impl_timed_effect, EffectCore};
use crate::registry::{EffectKind, EffectRegistry};

/// Element fusion.
///
/// Holds a temporary `(trigger, effect)` rule while it lives. Overlapping
/// fusions on the same pair each hold the rule; it lasts until the last one
/// is disposed.
pub struct ElementFusion {
    core: EffectCore,
    registry: Rc<EffectRegistry>,
    trigger: ElementKind,
    effect: ElementKind,
    installed: Cell<bool>,
}

impl ElementFusion {
    /// Creates the effect and installs its rule.
    #[must_use]
    pub fn new(
        ctx: &CombatContext,
        owner: EntityId,
        trigger: ElementKind,
        effect: ElementKind,
        initial_stacks: i32,
        duration: f32,
    ) -> Rc<Self> {
        let holders = {
            let mut rules = ctx.registry.element_rules_mut();
            rules.add_temp_rule(trigger, effect);
            rules.temp_rule_holders(trigger, effect)
        };
        debug!(
            "Fusion {} -> {} for {} ({} holders)",
            trigger.name(),
            effect.name(),
            owner,
            holders
        );
        Rc::new(Self {
            core: EffectCore::new(EffectKind::ElementFusion, owner, initial_stacks, duration),
            registry: Rc::clone(&ctx.registry),
            trigger,
            effect,
            installed: Cell::new(true),
        })
    }

    /// Fused `(trigger, effect)` pair.
    #[must_use]
    pub fn rule(&self) -> (ElementKind, ElementKind) {
        (self.trigger, self.effect)
    }

    fn on_stacks_changed(&self) {}

    fn release(&self) {
        if self.installed.replace(false) {
            self.registry
                .element_rules_mut()
                .remove_temp_rule(self.trigger, self.effect);
        }
    }
}

impl_timed_effect!(ElementFusion);
