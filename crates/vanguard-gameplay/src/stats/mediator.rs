//! Ordered modifier collection with mark-and-sweep expiry.

use std::fmt;
use tracing::debug;
use vanguard_common::EntityId;

use crate::stats::modifier::StatModifier;
use crate::stats::query::Query;

/// Handle to a modifier installed in a [`StatsMediator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModifierId(u64);

impl ModifierId {
    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ModifierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "modifier#{}", self.0)
    }
}

/// Owns the live modifiers of one entity.
///
/// Queries visit modifiers in insertion order. Operations do not commute, so
/// the order is part of the contract.
#[derive(Debug, Default)]
pub struct StatsMediator {
    modifiers: Vec<(ModifierId, Box<dyn StatModifier>)>,
    next_id: u64,
}

impl StatsMediator {
    /// Creates an empty mediator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs a query through every live modifier in insertion order.
    pub fn perform_query(&self, sender: EntityId, query: &mut Query) {
        for (_, modifier) in &self.modifiers {
            modifier.handle(sender, query);
        }
    }

    /// Installs a modifier at the end of the chain.
    pub fn add_modifier(&mut self, modifier: Box<dyn StatModifier>) -> ModifierId {
        self.next_id += 1;
        let id = ModifierId(self.next_id);
        debug!("Added {} {:?}", id, modifier);
        self.modifiers.push((id, modifier));
        id
    }

    /// Installs a concrete modifier.
    pub fn add<M: StatModifier + 'static>(&mut self, modifier: M) -> ModifierId {
        self.add_modifier(Box::new(modifier))
    }

    /// Removes a modifier. Returns false if it was already gone.
    pub fn dispose(&mut self, id: ModifierId) -> bool {
        let before = self.modifiers.len();
        self.modifiers.retain(|(mid, _)| *mid != id);
        let removed = self.modifiers.len() != before;
        if removed {
            debug!("Disposed {}", id);
        }
        removed
    }

    /// Advances every countdown, then sweeps expired modifiers.
    ///
    /// Returns the ids removed this frame in insertion order.
    pub fn update(&mut self, dt: f32) -> Vec<ModifierId> {
        for (_, modifier) in &mut self.modifiers {
            modifier.update(dt);
        }

        let expired: Vec<ModifierId> = self
            .modifiers
            .iter()
            .filter(|(_, m)| m.is_marked_for_removal())
            .map(|(id, _)| *id)
            .collect();
        for id in &expired {
            self.dispose(*id);
        }
        expired
    }

    /// Returns true if the modifier is still live.
    #[must_use]
    pub fn contains(&self, id: ModifierId) -> bool {
        self.modifiers.iter().any(|(mid, _)| *mid == id)
    }

    /// Number of live modifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    /// Returns true if no modifiers are installed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    /// Live modifier ids in application order.
    #[must_use]
    pub fn ids(&self) -> Vec<ModifierId> {
        self.modifiers.iter().map(|(id, _)| *id).collect()
    }

    /// Removes every modifier.
    pub fn clear(&mut self) {
        self.modifiers.clear();
    }
}
