//! Damage over time.
//!
//! Every target carries a [`DotDebuff`] ledger with at most one entry per DOT
//! id. The [`DotRegistry`] owns the ledgers, keeps the DOT clock and applies
//! due ticks. Each tick's damage is applied and reported while the registry's
//! DOT guard is held, so listeners can tell a DOT tick from a fresh attack.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{debug, warn};
use vanguard_common::{ElementKind, EntityId};

use crate::combatant::{Combatant, CombatantRef};
use crate::events::CombatEventBus;
use crate::registry::EffectRegistry;

/// Parameters of one DOT application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DotSpec {
    /// DOT kind tag, e.g. `"poison"`. Applications without one are rejected.
    pub id: String,
    /// Damage per tick at one stack.
    pub base_damage_per_tick: f32,
    /// Extra damage per tick for each stack after the first.
    pub damage_per_stack: f32,
    /// Seconds between ticks.
    pub tick_interval: f32,
    /// Seconds the entry lives after its latest application.
    pub duration: f32,
    /// Whether repeat applications add stacks.
    pub can_stack: bool,
    /// Stack cap.
    pub max_stacks: u32,
    /// Whether the first tick lands on application.
    pub apply_immediately: bool,
}

impl Default for DotSpec {
    fn default() -> Self {
        Self {
            id: "poison".to_string(),
            base_damage_per_tick: 2.0,
            damage_per_stack: 1.0,
            tick_interval: 1.0,
            duration: 5.0,
            can_stack: true,
            max_stacks: 5,
            apply_immediately: false,
        }
    }
}

/// One active DOT on a target.
#[derive(Debug, Clone, PartialEq)]
pub struct DotEntry {
    /// DOT kind tag.
    pub id: String,
    /// Damage per tick at one stack.
    pub base_damage_per_tick: f32,
    /// Extra damage per tick per additional stack.
    pub damage_per_stack: f32,
    /// Seconds between ticks.
    pub tick_interval: f32,
    /// Seconds the entry lives after its latest application.
    pub duration: f32,
    /// Clock time of the next tick.
    pub next_tick_time: f32,
    /// Clock time the entry expires.
    pub end_time: f32,
    /// Entity credited with the damage.
    pub source: EntityId,
    /// Whether repeat applications add stacks.
    pub can_stack: bool,
    /// Current stacks.
    pub stack_count: u32,
}

impl DotEntry {
    /// Damage dealt by the next tick.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn total_damage_per_tick(&self) -> f32 {
        let extra = self.stack_count.saturating_sub(1) as f32;
        self.base_damage_per_tick + self.damage_per_stack * extra
    }
}

/// Outcome of [`DotDebuff::add_dot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DotApplication {
    /// A new entry was created.
    Added,
    /// A non-stacking entry was refreshed.
    Refreshed,
    /// A stacking entry gained a stack.
    Stacked {
        /// Stacks after the application.
        stacks: u32,
    },
    /// A stacking entry was at its cap and was only refreshed.
    MaxStacks {
        /// Stacks held.
        stacks: u32,
    },
}

/// A tick that came due.
#[derive(Debug, Clone, PartialEq)]
pub struct DotTick {
    /// DOT kind tag.
    pub id: String,
    /// Entity credited with the damage.
    pub source: EntityId,
    /// Damage to apply.
    pub damage: f32,
    /// Stacks at tick time.
    pub stacks: u32,
}

// ============================================================================
// Per-target ledger
// ============================================================================

/// Active DOTs on one target.
#[derive(Debug, Clone, Default)]
pub struct DotDebuff {
    entries: Vec<DotEntry>,
}

impl DotDebuff {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a DOT at clock time `now`.
    ///
    /// Returns `None` if the spec has no id.
    pub fn add_dot(
        &mut self,
        now: f32,
        source: EntityId,
        spec: &DotSpec,
    ) -> Option<DotApplication> {
        if spec.id.is_empty() {
            warn!("Cannot add DOT without id");
            return None;
        }

        let Some(index) = self.entries.iter().position(|e| e.id == spec.id) else {
            self.entries.push(DotEntry {
                id: spec.id.clone(),
                base_damage_per_tick: spec.base_damage_per_tick,
                damage_per_stack: spec.damage_per_stack,
                tick_interval: spec.tick_interval,
                duration: spec.duration,
                next_tick_time: if spec.apply_immediately {
                    now
                } else {
                    now + spec.tick_interval
                },
                end_time: now + spec.duration,
                source,
                can_stack: spec.can_stack,
                stack_count: 1,
            });
            debug!(
                "DOT {} added: {} dmg/tick every {}s for {}s",
                spec.id, spec.base_damage_per_tick, spec.tick_interval, spec.duration
            );
            return Some(DotApplication::Added);
        };

        let existing = &mut self.entries[index];
        existing.end_time = now + spec.duration;
        if !spec.can_stack {
            existing.base_damage_per_tick =
                existing.base_damage_per_tick.max(spec.base_damage_per_tick);
            debug!("DOT {} refreshed", spec.id);
            return Some(DotApplication::Refreshed);
        }

        if spec.apply_immediately {
            existing.next_tick_time = now;
        }
        if existing.stack_count >= spec.max_stacks {
            debug!(
                "DOT {} at max stacks ({}/{}), refreshed",
                spec.id, existing.stack_count, spec.max_stacks
            );
            return Some(DotApplication::MaxStacks {
                stacks: existing.stack_count,
            });
        }

        existing.stack_count += 1;
        debug!(
            "DOT {} stacked: {} dmg/tick ({}/{})",
            spec.id,
            existing.total_damage_per_tick(),
            existing.stack_count,
            spec.max_stacks
        );
        Some(DotApplication::Stacked {
            stacks: existing.stack_count,
        })
    }

    /// Removes expired entries and returns ticks due at `now`.
    ///
    /// Entries are visited last to first. A due entry's next tick moves one
    /// interval past the previous schedule.
    pub fn process(&mut self, now: f32) -> Vec<DotTick> {
        let mut ticks = Vec::new();
        for i in (0..self.entries.len()).rev() {
            if now >= self.entries[i].end_time {
                let expired = self.entries.remove(i);
                debug!("DOT {} expired", expired.id);
                continue;
            }
            let entry = &mut self.entries[i];
            if now >= entry.next_tick_time {
                ticks.push(DotTick {
                    id: entry.id.clone(),
                    source: entry.source,
                    damage: entry.total_damage_per_tick(),
                    stacks: entry.stack_count,
                });
                entry.next_tick_time += entry.tick_interval;
            }
        }
        ticks
    }

    /// Number of active entries.
    #[must_use]
    pub fn active_dot_count(&self) -> usize {
        self.entries.len()
    }

    /// Drops every entry.
    pub fn clear_all_dots(&mut self) {
        self.entries.clear();
    }

    /// Entry with the given id.
    #[must_use]
    pub fn entry(&self, id: &str) -> Option<&DotEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// All entries in application order.
    #[must_use]
    pub fn entries(&self) -> &[DotEntry] {
        &self.entries
    }
}

// ============================================================================
// Registry
// ============================================================================

struct TargetLedger {
    target: Weak<dyn Combatant>,
    debuff: DotDebuff,
}

#[derive(Default)]
struct DotState {
    now: f32,
    ledgers: AHashMap<EntityId, TargetLedger>,
}

/// Owns every target's DOT ledger and the DOT clock.
pub struct DotRegistry {
    bus: Rc<CombatEventBus>,
    registry: Rc<EffectRegistry>,
    state: RefCell<DotState>,
}

impl DotRegistry {
    /// Creates an empty registry with its clock at zero.
    #[must_use]
    pub fn new(bus: Rc<CombatEventBus>, registry: Rc<EffectRegistry>) -> Self {
        Self {
            bus,
            registry,
            state: RefCell::new(DotState::default()),
        }
    }

    /// Current DOT clock in seconds.
    #[must_use]
    pub fn now(&self) -> f32 {
        self.state.borrow().now
    }

    /// Applies a DOT to a target, creating its ledger on first use.
    pub fn add_dot(
        &self,
        target: &CombatantRef,
        source: EntityId,
        spec: &DotSpec,
    ) -> Option<DotApplication> {
        let mut state = self.state.borrow_mut();
        let now = state.now;
        let ledger = state.ledgers.entry(target.id()).or_insert_with(|| TargetLedger {
            target: Rc::downgrade(target),
            debuff: DotDebuff::new(),
        });
        ledger.debuff.add_dot(now, source, spec)
    }

    /// Active DOT entries on a target.
    #[must_use]
    pub fn active_dot_count(&self, target: EntityId) -> usize {
        self.state
            .borrow()
            .ledgers
            .get(&target)
            .map_or(0, |l| l.debuff.active_dot_count())
    }

    /// Drops every DOT on a target.
    pub fn clear_all_dots(&self, target: EntityId) {
        if let Some(ledger) = self.state.borrow_mut().ledgers.get_mut(&target) {
            ledger.debuff.clear_all_dots();
        }
    }

    /// Copy of one entry on a target.
    #[must_use]
    pub fn entry(&self, target: EntityId, id: &str) -> Option<DotEntry> {
        self.state
            .borrow()
            .ledgers
            .get(&target)
            .and_then(|l| l.debuff.entry(id).cloned())
    }

    /// Number of targets with a ledger.
    #[must_use]
    pub fn ledger_count(&self) -> usize {
        self.state.borrow().ledgers.len()
    }

    /// Advances the clock and applies every due tick.
    ///
    /// Ledgers of dead, dropped or fully expired targets are removed. Returns
    /// the number of ticks applied.
    pub fn update(&self, dt: f32) -> usize {
        let mut applied = 0;
        for (target, tick) in self.collect_due_ticks(dt) {
            if self.apply_tick(&target, &tick) {
                applied += 1;
            }
        }
        applied
    }

    fn collect_due_ticks(&self, dt: f32) -> Vec<(CombatantRef, DotTick)> {
        let mut state = self.state.borrow_mut();
        state.now += dt;
        let now = state.now;

        let mut ids: Vec<EntityId> = state.ledgers.keys().copied().collect();
        ids.sort_unstable();

        let mut due = Vec::new();
        for id in ids {
            let Some(ledger) = state.ledgers.get_mut(&id) else {
                continue;
            };
            let target = ledger.target.upgrade().filter(|t| !t.is_dead());
            let keep = match target {
                Some(target) => {
                    for tick in ledger.debuff.process(now) {
                        due.push((Rc::clone(&target), tick));
                    }
                    ledger.debuff.active_dot_count() > 0
                }
                None => {
                    ledger.debuff.clear_all_dots();
                    false
                }
            };
            if !keep {
                state.ledgers.remove(&id);
            }
        }
        due
    }

    fn apply_tick(&self, target: &CombatantRef, tick: &DotTick) -> bool {
        if target.is_dead() {
            return false;
        }
        let Some(_token) = self.registry.dot_guard().try_enter() else {
            return false;
        };
        target.take_damage(tick.damage);
        debug!(
            "DOT {} ticked {} on {} ({} stacks)",
            tick.id,
            tick.damage,
            target.id(),
            tick.stacks
        );
        self.bus
            .report_damage(tick.source, target, tick.damage, ElementKind::None);
        true
    }
}
