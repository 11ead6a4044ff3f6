//! Delayed damage marks left by delayed projectiles.

use std::rc::{Rc, Weak};
use tracing::debug;
use vanguard_common::EntityId;

use crate::combatant::{Combatant, CombatantRef, EffectSpawner, VfxKind};
use crate::events::CombatEventBus;
use crate::registry::{EffectKind, EffectRegistry};
use crate::timer::CountdownTimer;

struct DelayedMark {
    target: Weak<dyn Combatant>,
    target_id: EntityId,
    attacker: EntityId,
    damage: f32,
    multiplier: f32,
    timer: CountdownTimer,
}

/// A mark that went off.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detonation {
    /// Marked entity.
    pub target: EntityId,
    /// Entity credited with the damage.
    pub attacker: EntityId,
    /// Damage dealt.
    pub damage: f32,
}

/// Pending delayed damage.
///
/// Marks detonate in the order they were placed. A mark whose target died or
/// was dropped in the meantime fizzles.
pub struct DelayedDamageMarks {
    bus: Rc<CombatEventBus>,
    registry: Rc<EffectRegistry>,
    vfx: Option<Rc<dyn EffectSpawner>>,
    marks: Vec<DelayedMark>,
}

impl DelayedDamageMarks {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new(bus: Rc<CombatEventBus>, registry: Rc<EffectRegistry>) -> Self {
        Self {
            bus,
            registry,
            vfx: None,
            marks: Vec::new(),
        }
    }

    /// Sets the spawner for mark and detonation visuals.
    #[must_use]
    pub fn with_vfx(mut self, vfx: Rc<dyn EffectSpawner>) -> Self {
        self.vfx = Some(vfx);
        self
    }

    /// Marks `target` for `damage * multiplier` after `delay` seconds.
    pub fn mark(
        &mut self,
        target: &CombatantRef,
        damage: f32,
        attacker: EntityId,
        delay: f32,
        multiplier: f32,
    ) {
        let position = target.position();
        if let Some(vfx) = &self.vfx {
            vfx.spawn(VfxKind::DelayedMark, position, position, delay.max(0.0));
        }
        debug!("Marked {} for {:.1} x{:.2} in {:.2}s", target.id(), damage, multiplier, delay);
        self.marks.push(DelayedMark {
            target: Rc::downgrade(target),
            target_id: target.id(),
            attacker,
            damage,
            multiplier,
            timer: CountdownTimer::new(delay),
        });
    }

    /// Marks `target` with the published delayed tuning.
    ///
    /// Returns false without marking when no delayed effect is live.
    pub fn mark_with_published(
        &mut self,
        target: &CombatantRef,
        damage: f32,
        attacker: EntityId,
    ) -> bool {
        if !self.registry.is_enabled(EffectKind::DelayedProjectiles) {
            return false;
        }
        let tuning = self.registry.delayed();
        self.mark(target, damage, attacker, tuning.delay_time, tuning.damage_multiplier);
        true
    }

    /// Advances every mark and detonates the ones that are due.
    pub fn update(&mut self, dt: f32) -> Vec<Detonation> {
        let mut due = Vec::new();
        let mut pending = Vec::with_capacity(self.marks.len());
        for mut mark in self.marks.drain(..) {
            mark.timer.tick(dt);
            if mark.timer.is_finished() {
                due.push(mark);
            } else {
                pending.push(mark);
            }
        }
        self.marks = pending;

        let mut detonations = Vec::new();
        for mark in due {
            let Some(target) = mark.target.upgrade() else {
                debug!("Mark on {} fizzled: target gone", mark.target_id);
                continue;
            };
            if target.is_dead() {
                debug!("Mark on {} fizzled: target dead", mark.target_id);
                continue;
            }
            let damage = mark.damage * mark.multiplier;
            target.take_damage(damage);
            self.bus.report_physical_damage(mark.attacker, &target, damage);
            if let Some(vfx) = &self.vfx {
                let position = target.position();
                vfx.spawn(VfxKind::Detonation, position, position, 0.0);
            }
            detonations.push(Detonation {
                target: mark.target_id,
                attacker: mark.attacker,
                damage,
            });
        }
        detonations
    }

    /// Marks still waiting.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.marks.len()
    }

    /// Drops every pending mark.
    pub fn clear(&mut self) {
        self.marks.clear();
    }
}
