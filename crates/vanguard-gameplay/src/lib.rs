//! # Vanguard Gameplay
//!
//! Combat systems for Vanguard.
//!
//! This crate provides the engine-independent core of the combat layer:
//! - Stat pipeline (base values run through ordered, timed modifiers)
//! - Combat event bus for damage reports
//! - Effect registry with published tuning and reentrancy guards
//! - Elemental trigger rules
//! - Timed stacking effects (lifesteal, chain lightning, DOT on hit, ...)
//! - Per-target DOT ledgers and delayed damage marks
//! - Items, inventory and gameplay configuration
//!
//! Everything runs on the frame thread; shared state uses `Rc` and interior
//! mutability rather than locks.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod combatant;
pub mod config;
pub mod context;
pub mod delayed_marks;
pub mod dot;
pub mod effects;
pub mod elements;
pub mod events;
pub mod inventory;
pub mod registry;
pub mod stats;
pub mod timer;

#[cfg(test)]
mod testing;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::combatant::*;
    pub use crate::config::*;
    pub use crate::context::*;
    pub use crate::delayed_marks::*;
    pub use crate::dot::*;
    pub use crate::effects::*;
    pub use crate::elements::*;
    pub use crate::events::*;
    pub use crate::inventory::*;
    pub use crate::registry::*;
    pub use crate::stats::*;
    pub use crate::timer::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{health_of, MockCombatant, MockWorld};
    use glam::Vec3;
    use std::rc::Rc;
    use vanguard_common::{EntityId, ItemId};

    #[test]
    fn test_stat_pickup_then_expiry() {
        let mut stats = Stats::new(EntityId::new(), BaseStats::default());
        let base = stats.move_speed();
        stats
            .mediator_mut()
            .add(BasicStatsModifier::add(StatType::MoveSpeed, 1.0, 5.0));
        assert_eq!(stats.move_speed(), base + 5.0);
        stats.update(1.0);
        assert_eq!(stats.move_speed(), base);
    }

    #[test]
    fn test_combat_round() {
        let ctx = CombatContext::new();
        let dots = Rc::new(DotRegistry::new(
            Rc::clone(&ctx.bus),
            Rc::clone(&ctx.registry),
        ));
        let world = MockWorld::new();
        let player = MockCombatant::player(Vec3::ZERO);
        let first = MockCombatant::enemy(Vec3::new(1.0, 0.0, 0.0), 100.0);
        let second = MockCombatant::enemy(Vec3::new(3.0, 0.0, 0.0), 100.0);
        world.add(first.clone());
        world.add(second.clone());

        let mut factory = EffectFactory::new(ctx.clone(), Rc::clone(&dots)).with_spatial(world);
        if let Some(health) = health_of(&player) {
            factory = factory.with_owner_health(health);
        }
        let mut stats = Stats::new(player.id(), BaseStats::default());
        let mut inventory = ItemInventory::new(player.id(), factory);
        let item = ItemData {
            id: ItemId::new(1),
            name: "Storm Fang".to_string(),
            effects: vec![
                EffectSpec::permanent(EffectParams::ChainLightning(ChainParams {
                    damage_percent: 0.5,
                    max_chain_count: 1,
                    range: 5.0,
                })),
                EffectSpec::permanent(EffectParams::DotOnHit(DotSpec::default())),
                EffectSpec::permanent(EffectParams::HealOnDamage(HealFormula::default())),
            ],
            ..ItemData::default()
        };
        assert_eq!(inventory.add_item(&item, &mut stats), ItemAddOutcome::Added);

        let target: combatant::CombatantRef = first.clone();
        first.take_damage(10.0);
        ctx.bus.report_physical_damage(player.id(), &target, 10.0);

        // The chain hop lands on the second enemy as lightning damage.
        assert_eq!(second.damage_taken.get(), 5.0);
        // The plain hit applies poison; the lightning hop does too.
        assert_eq!(dots.active_dot_count(first.id()), 1);
        assert_eq!(dots.active_dot_count(second.id()), 1);
        // Lifesteal fires for the hit and the hop.
        assert_eq!(player.healed.get(), 2.0);

        // Ticks report plain damage: each one chains, but none applies a DOT.
        assert_eq!(dots.update(1.0), 2);
        assert_eq!(first.damage_taken.get(), 13.0);
        assert_eq!(second.damage_taken.get(), 8.0);
        for enemy in [&first, &second] {
            assert_eq!(
                dots.entry(enemy.id(), "poison").map(|e| e.stack_count),
                Some(1)
            );
        }
        assert_eq!(player.healed.get(), 6.0);

        assert!(inventory.remove_item(item.id, &mut stats));
        assert_eq!(ctx.bus.listener_count(), 0);
    }
}
