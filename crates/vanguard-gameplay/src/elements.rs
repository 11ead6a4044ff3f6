//! Elemental trigger rules.
//!
//! A rule `(trigger, effect)` lets a hit of element `trigger` set off an effect
//! of element `effect`. Base rules are permanent; temporary rules are
//! installed by fusion effects for as long as they live. Temporary rules are
//! counted per holder, so overlapping fusions on one pair keep it alive until
//! the last one ends.

use ahash::{AHashMap, AHashSet};
use vanguard_common::ElementKind;

/// Base and temporary trigger rules.
#[derive(Debug, Clone, Default)]
pub struct ElementRules {
    base: AHashMap<ElementKind, AHashSet<ElementKind>>,
    temp: AHashMap<ElementKind, AHashMap<ElementKind, u32>>,
}

impl ElementRules {
    /// Creates an empty rule table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a `trigger` hit may set off an `effect`.
    ///
    /// Plain damage on either side always triggers.
    #[must_use]
    pub fn can_trigger(&self, trigger: ElementKind, effect: ElementKind) -> bool {
        if trigger.is_none() || effect.is_none() {
            return true;
        }
        self.has_temp_rule(trigger, effect)
            || self
                .base
                .get(&trigger)
                .is_some_and(|set| set.contains(&effect))
    }

    /// Adds a permanent rule.
    pub fn add_base_rule(&mut self, trigger: ElementKind, effect: ElementKind) {
        self.base.entry(trigger).or_default().insert(effect);
    }

    /// Adds one holder of a temporary rule.
    pub fn add_temp_rule(&mut self, trigger: ElementKind, effect: ElementKind) {
        *self.temp.entry(trigger).or_default().entry(effect).or_insert(0) += 1;
    }

    /// Returns true if the temporary rule is installed.
    #[must_use]
    pub fn has_temp_rule(&self, trigger: ElementKind, effect: ElementKind) -> bool {
        self.temp
            .get(&trigger)
            .is_some_and(|holders| holders.contains_key(&effect))
    }

    /// Number of holders of a temporary rule.
    #[must_use]
    pub fn temp_rule_holders(&self, trigger: ElementKind, effect: ElementKind) -> u32 {
        self.temp
            .get(&trigger)
            .and_then(|holders| holders.get(&effect))
            .copied()
            .unwrap_or(0)
    }

    /// Releases one holder of a temporary rule; the rule goes away with its
    /// last holder. Returns false if it was not installed.
    pub fn remove_temp_rule(&mut self, trigger: ElementKind, effect: ElementKind) -> bool {
        let Some(holders) = self.temp.get_mut(&trigger) else {
            return false;
        };
        let Some(count) = holders.get_mut(&effect) else {
            return false;
        };
        *count -= 1;
        if *count == 0 {
            holders.remove(&effect);
        }
        if holders.is_empty() {
            self.temp.remove(&trigger);
        }
        true
    }

    /// Drops every temporary rule.
    pub fn clear_temp_rules(&mut self) {
        self.temp.clear();
    }

    /// Snapshot of temporary rules, sorted for stable output.
    #[must_use]
    pub fn temp_rules(&self) -> Vec<(ElementKind, ElementKind)> {
        let mut rules: Vec<_> = self
            .temp
            .iter()
            .flat_map(|(t, holders)| holders.keys().map(move |e| (*t, *e)))
            .collect();
        rules.sort_by_key(|(t, e)| (t.name(), e.name()));
        rules
    }
}
