//! Item definitions and the player's inventory.
//!
//! Picking up an item installs one stat modifier per stat spec per stack and
//! creates or stacks the runtime effects it grants. Removing the item undoes
//! exactly what it contributed.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};
use vanguard_common::{EntityId, ItemId};

use crate::effects::{EffectFactory, EffectSet, EffectSpec};
use crate::registry::EffectKind;
use crate::stats::{BasicStatsModifier, ModifierId, OperatorType, StatType, Stats};

// ============================================================================
// Definitions
// ============================================================================

/// One stat modifier granted by an item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatModSpec {
    /// Targeted stat.
    pub stat: StatType,
    /// Arithmetic kind.
    pub operator: OperatorType,
    /// Operand.
    pub value: f32,
    /// Seconds the modifier lasts; negative means permanent.
    pub duration: f32,
}

impl Default for StatModSpec {
    fn default() -> Self {
        Self {
            stat: StatType::Health,
            operator: OperatorType::Add,
            value: 1.0,
            duration: -1.0,
        }
    }
}

impl StatModSpec {
    /// Builds the modifier for `stats`; percentages use the stat's base value.
    #[must_use]
    pub fn build(&self, stats: &Stats) -> BasicStatsModifier {
        BasicStatsModifier::from_spec(
            self.stat,
            self.duration,
            self.operator,
            self.value,
            stats.base_value_for_stat(self.stat),
        )
    }
}

/// Item rarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ItemRarity {
    /// Common.
    #[default]
    Common,
    /// Uncommon.
    Uncommon,
    /// Rare.
    Rare,
    /// Legendary.
    Legendary,
}

impl fmt::Display for ItemRarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Common => "Common",
            Self::Uncommon => "Uncommon",
            Self::Rare => "Rare",
            Self::Legendary => "Legendary",
        };
        f.write_str(name)
    }
}

/// A pickup definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemData {
    /// Unique id.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Description text.
    pub description: String,
    /// Rarity.
    pub rarity: ItemRarity,
    /// Whether repeat pickups add stacks.
    pub can_stack: bool,
    /// Stack cap.
    pub max_stacks: u32,
    /// Stat modifiers installed per stack.
    pub stat_mods: Vec<StatModSpec>,
    /// Runtime effects granted per stack.
    pub effects: Vec<EffectSpec>,
}

impl Default for ItemData {
    fn default() -> Self {
        Self {
            id: ItemId::new(0),
            name: "New Item".to_string(),
            description: String::new(),
            rarity: ItemRarity::Common,
            can_stack: true,
            max_stacks: 99,
            stat_mods: Vec::new(),
            effects: Vec::new(),
        }
    }
}

// ============================================================================
// Inventory
// ============================================================================

/// Result of picking up an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemAddOutcome {
    /// First copy of the item.
    Added,
    /// Another stack was added.
    Stacked {
        /// Stack count after the pickup.
        count: u32,
    },
    /// The pickup was ignored.
    AtMaxStacks {
        /// Unchanged stack count.
        count: u32,
    },
}

#[derive(Debug)]
struct ItemStack {
    data: ItemData,
    count: u32,
    modifiers: Vec<ModifierId>,
    contributed: Vec<(EffectKind, i32)>,
}

impl ItemStack {
    fn contribute(&mut self, kind: EffectKind, stacks: i32) {
        match self.contributed.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, total)) => *total += stacks,
            None => self.contributed.push((kind, stacks)),
        }
    }
}

/// Items held by one player, plus the effects they granted.
pub struct ItemInventory {
    owner: EntityId,
    factory: EffectFactory,
    effects: EffectSet,
    items: AHashMap<ItemId, ItemStack>,
}

impl ItemInventory {
    /// Creates an empty inventory for `owner`.
    #[must_use]
    pub fn new(owner: EntityId, factory: EffectFactory) -> Self {
        Self {
            owner,
            factory,
            effects: EffectSet::new(),
            items: AHashMap::new(),
        }
    }

    /// Owning entity.
    #[must_use]
    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// Effects granted by the held items.
    #[must_use]
    pub fn effects(&self) -> &EffectSet {
        &self.effects
    }

    /// Picks up one copy of an item.
    pub fn add_item(&mut self, item: &ItemData, stats: &mut Stats) -> ItemAddOutcome {
        let outcome = match self.items.get(&item.id).map(|s| s.count) {
            None => {
                info!("Added new item: {}", item.name);
                ItemAddOutcome::Added
            }
            Some(count) if item.can_stack && count < item.max_stacks => {
                info!("Stacked item : {} : Count: {}", item.name, count + 1);
                ItemAddOutcome::Stacked { count: count + 1 }
            }
            Some(count) => {
                warn!("Max stacks reached for item : {} : {}", item.name, count);
                return ItemAddOutcome::AtMaxStacks { count };
            }
        };

        let stack = self.items.entry(item.id).or_insert_with(|| ItemStack {
            data: item.clone(),
            count: 0,
            modifiers: Vec::new(),
            contributed: Vec::new(),
        });
        stack.count += 1;

        for spec in &item.stat_mods {
            let modifier = spec.build(stats);
            stack.modifiers.push(stats.mediator_mut().add(modifier));
        }

        for spec in &item.effects {
            let kind = spec.kind();
            if self.effects.add_stacks(kind, 1) {
                stack.contribute(kind, 1);
                continue;
            }
            match self.factory.create(self.owner, spec, 1) {
                Ok(effect) => {
                    self.effects.insert(effect);
                    stack.contribute(kind, 1);
                }
                Err(e) => warn!("Item {} could not grant {}: {}", item.name, kind, e),
            }
        }
        outcome
    }

    /// Removes an item entirely. Returns false if it was not held.
    pub fn remove_item(&mut self, id: ItemId, stats: &mut Stats) -> bool {
        let Some(stack) = self.items.remove(&id) else {
            return false;
        };
        for modifier in &stack.modifiers {
            stats.mediator_mut().dispose(*modifier);
        }
        for (kind, stacks) in &stack.contributed {
            self.effects.remove_stacks(*kind, *stacks);
        }
        info!("Removed item : {}", stack.data.name);
        true
    }

    /// Stack count of an item, zero if not held.
    #[must_use]
    pub fn item_count(&self, id: ItemId) -> u32 {
        self.items.get(&id).map_or(0, |s| s.count)
    }

    /// Returns true if the item is held.
    #[must_use]
    pub fn has_item(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    /// Held items, sorted by id.
    #[must_use]
    pub fn items(&self) -> Vec<(&ItemData, u32)> {
        let mut items: Vec<_> = self.items.values().map(|s| (&s.data, s.count)).collect();
        items.sort_by_key(|(data, _)| data.id.raw());
        items
    }

    /// Ticks the granted effects. Returns the kinds that ended.
    pub fn update(&mut self, dt: f32) -> Vec<EffectKind> {
        self.effects.update(dt)
    }
}
