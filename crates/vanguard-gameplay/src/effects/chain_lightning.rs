//! Chains a fraction of the owner's hits to nearby enemies.

use ahash::AHashSet;
use std::cell::Cell;
use std::rc::{Rc, Weak};
use tracing::{debug, warn};
use vanguard_common::{EffectError, ElementKind, EntityId};

use crate::combatant::{
    nearest_living, CombatantRef, EffectSpawner, SpatialQuery, TargetKind, VfxKind,
};
use crate::context::CombatContext;
use crate::effects::{impl_timed_effect, EffectCore};
use crate::events::{CombatEventBus, DamageEvent, DamageListener, ListenerId};
use crate::registry::{EffectKind, EffectRegistry};

/// Seconds a chain bolt stays visible.
pub const CHAIN_BOLT_LIFETIME: f32 = 0.2;

/// Damage fraction gained per extra stack.
const DAMAGE_PERCENT_PER_STACK: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
struct ChainTuning {
    damage_percent: f32,
    max_chain_count: i32,
    range: f32,
}

/// Chain lightning on hit.
///
/// Only plain hits start a chain unless an element fusion lets another
/// element trigger lightning. Chain hops are reported as lightning damage
/// while the chain guard is held, so they never start chains of their own.
pub struct ChainLightning {
    core: EffectCore,
    bus: Rc<CombatEventBus>,
    registry: Rc<EffectRegistry>,
    spatial: Option<Rc<dyn SpatialQuery>>,
    vfx: Option<Rc<dyn EffectSpawner>>,
    base: ChainTuning,
    current: Cell<ChainTuning>,
    subscription: Cell<Option<ListenerId>>,
}

impl ChainLightning {
    /// Creates the effect and subscribes it to the bus.
    ///
    /// Without a spatial query the effect never finds chain targets.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ctx: &CombatContext,
        owner: EntityId,
        spatial: Option<Rc<dyn SpatialQuery>>,
        vfx: Option<Rc<dyn EffectSpawner>>,
        chain_damage_percent: f32,
        max_chain_count: i32,
        chain_range: f32,
        initial_stacks: i32,
        duration: f32,
    ) -> Rc<Self> {
        if spatial.is_none() {
            warn!("Chain lightning for {} has no spatial query; chains disabled", owner);
        }
        if vfx.is_none() {
            warn!("Chain lightning for {} has no VFX spawner", owner);
        }
        let base = ChainTuning {
            damage_percent: chain_damage_percent,
            max_chain_count,
            range: chain_range,
        };
        let effect = Rc::new(Self {
            core: EffectCore::new(EffectKind::ChainLightning, owner, initial_stacks, duration),
            bus: Rc::clone(&ctx.bus),
            registry: Rc::clone(&ctx.registry),
            spatial,
            vfx,
            base,
            current: Cell::new(base),
            subscription: Cell::new(None),
        });
        effect.on_stacks_changed();
        let weak = Rc::downgrade(&effect);
        let listener: Weak<dyn DamageListener> = weak;
        effect.subscription.set(Some(ctx.bus.subscribe(listener)));
        effect
    }

    /// Fraction of the triggering hit dealt by each hop.
    #[must_use]
    pub fn damage_percent(&self) -> f32 {
        self.current.get().damage_percent
    }

    /// Maximum hops per chain.
    #[must_use]
    pub fn max_chain_count(&self) -> i32 {
        self.current.get().max_chain_count
    }

    /// Search radius around the previous hop.
    #[must_use]
    pub fn range(&self) -> f32 {
        self.current.get().range
    }

    #[allow(clippy::cast_precision_loss)]
    fn on_stacks_changed(&self) {
        let extra = self.core.stacks() - 1;
        self.current.set(ChainTuning {
            damage_percent: self.base.damage_percent + extra as f32 * DAMAGE_PERCENT_PER_STACK,
            max_chain_count: self.base.max_chain_count + extra,
            range: self.base.range,
        });
    }

    fn release(&self) {
        if let Some(id) = self.subscription.take() {
            self.bus.unsubscribe(id);
        }
    }

    /// Walks from `origin` to the nearest unvisited enemy, hop by hop.
    ///
    /// Returns the number of enemies hit after the origin.
    fn chain_from(&self, origin: &CombatantRef, damage: f32, spatial: &dyn SpatialQuery) -> usize {
        let tuning = self.current.get();
        let owner = self.core.owner();
        let mut hit: AHashSet<EntityId> = AHashSet::new();
        hit.insert(origin.id());
        let mut from = origin.position();

        for hop in 0..tuning.max_chain_count {
            let candidates = spatial.find_nearby(from, tuning.range, TargetKind::Enemy);
            let Some(next) = nearest_living(&candidates, from, |id| hit.contains(&id)) else {
                break;
            };
            hit.insert(next.id());
            let to = next.position();

            next.take_damage(damage);
            debug!("Chain hop {} from {} hit {} for {}", hop + 1, owner, next.id(), damage);
            self.bus.report_damage(owner, &next, damage, ElementKind::Lightning);
            if let Some(vfx) = &self.vfx {
                vfx.spawn(VfxKind::LightningBolt, from, to, CHAIN_BOLT_LIFETIME);
            }
            from = to;
        }
        hit.len() - 1
    }
}

impl DamageListener for ChainLightning {
    fn on_damage_dealt(&self, event: &DamageEvent) -> Result<(), EffectError> {
        if self.core.is_disposed()
            || event.attacker != self.core.owner()
            || self.registry.chain_guard().is_held()
        {
            return Ok(());
        }
        if !self
            .registry
            .element_rules()
            .can_trigger(event.element, ElementKind::Lightning)
        {
            return Ok(());
        }
        if event.target.kind() != TargetKind::Enemy {
            return Ok(());
        }
        let Some(spatial) = &self.spatial else {
            return Ok(());
        };
        let Some(_token) = self.registry.chain_guard().try_enter() else {
            return Ok(());
        };

        let damage = event.damage * self.damage_percent();
        let hops = self.chain_from(&event.target, damage, spatial.as_ref());
        if hops > 0 {
            debug!("Chain from {} hit {} enemies", event.target.id(), hops);
        }
        Ok(())
    }
}

impl_timed_effect!(ChainLightning);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::{Combatant, Damageable};
    use crate::effects::TimedEffect;
    use crate::testing::{MockCombatant, MockWorld, RecordingSpawner};
    use glam::Vec3;

    struct Scene {
        ctx: CombatContext,
        world: Rc<MockWorld>,
        player: Rc<MockCombatant>,
        enemies: Vec<Rc<MockCombatant>>,
    }

    fn scene(enemy_count: usize) -> Scene {
        let ctx = CombatContext::new();
        let world = MockWorld::new();
        let player = MockCombatant::player(Vec3::new(0.0, 0.0, -5.0));
        let mut enemies = Vec::new();
        for i in 0..enemy_count {
            #[allow(clippy::cast_precision_loss)]
            let enemy = MockCombatant::enemy(Vec3::new(i as f32 * 2.0, 0.0, 0.0), 100.0);
            world.add(enemy.clone());
            enemies.push(enemy);
        }
        Scene {
            ctx,
            world,
            player,
            enemies,
        }
    }

    fn chain(scene: &Scene, max_chain: i32, stacks: i32) -> Rc<ChainLightning> {
        let spatial: Rc<dyn SpatialQuery> = scene.world.clone();
        ChainLightning::new(
            &scene.ctx,
            scene.player.id(),
            Some(spatial),
            None,
            0.5,
            max_chain,
            3.0,
            stacks,
            -1.0,
        )
    }

    fn hit(scene: &Scene, index: usize, damage: f32, element: ElementKind) {
        let target: CombatantRef = scene.enemies[index].clone();
        scene.enemies[index].take_damage(damage);
        scene
            .ctx
            .bus
            .report_damage(scene.player.id(), &target, damage, element);
    }

    #[test]
    fn test_chain_terminates_at_max_hops() {
        let scene = scene(5);
        let _chain = chain(&scene, 2, 1);
        hit(&scene, 0, 10.0, ElementKind::None);

        let damaged: Vec<u32> = scene.enemies.iter().map(|e| e.hits.get()).collect();
        assert_eq!(damaged, vec![1, 1, 1, 0, 0]);
        assert_eq!(scene.enemies[1].damage_taken.get(), 5.0);
        assert_eq!(scene.enemies[2].damage_taken.get(), 5.0);
        assert!(!scene.ctx.registry.chain_guard().is_held());
    }

    #[test]
    fn test_chain_never_revisits() {
        let scene = scene(3);
        let _chain = chain(&scene, 10, 1);
        hit(&scene, 1, 10.0, ElementKind::None);

        // From x=2 both neighbours are 2 away; the chain takes x=0, then has
        // nothing unvisited within range.
        let damaged: Vec<u32> = scene.enemies.iter().map(|e| e.hits.get()).collect();
        assert_eq!(damaged, vec![1, 1, 0]);
    }

    #[test]
    fn test_elemental_hits_do_not_chain() {
        let scene = scene(3);
        let _chain = chain(&scene, 2, 1);
        hit(&scene, 0, 10.0, ElementKind::Fire);
        assert_eq!(scene.enemies[1].hits.get(), 0);

        scene
            .ctx
            .registry
            .element_rules_mut()
            .add_temp_rule(ElementKind::Fire, ElementKind::Lightning);
        hit(&scene, 0, 10.0, ElementKind::Fire);
        assert_eq!(scene.enemies[1].hits.get(), 1);
    }

    #[test]
    fn test_guard_blocks_chain() {
        let scene = scene(3);
        let _chain = chain(&scene, 2, 1);
        {
            let _token = scene.ctx.registry.chain_guard().try_enter();
            hit(&scene, 0, 10.0, ElementKind::None);
        }
        assert_eq!(scene.enemies[1].hits.get(), 0);
    }

    #[test]
    fn test_ignores_non_enemy_targets_and_other_attackers() {
        let scene = scene(3);
        let _chain = chain(&scene, 2, 1);
        let prop: CombatantRef =
            MockCombatant::new(TargetKind::Prop, Vec3::new(1.0, 0.0, 0.0), 5.0);
        scene
            .ctx
            .bus
            .report_physical_damage(scene.player.id(), &prop, 10.0);
        let target: CombatantRef = scene.enemies[0].clone();
        scene
            .ctx
            .bus
            .report_physical_damage(EntityId::new(), &target, 10.0);
        assert!(scene.enemies.iter().all(|e| e.hits.get() == 0));
    }

    #[test]
    fn test_stacks_scale_tuning() {
        let scene = scene(1);
        let chain = chain(&scene, 2, 1);
        chain.add_stack(2);
        assert_eq!(chain.stacks(), 3);
        assert!((chain.damage_percent() - 0.6).abs() < 1e-6);
        assert_eq!(chain.max_chain_count(), 4);
        assert_eq!(chain.range(), 3.0);
        chain.add_stack(0);
        assert_eq!(chain.stacks(), 4);
    }

    #[test]
    fn test_dead_enemies_are_skipped() {
        let scene = scene(3);
        scene.enemies[1].kill();
        let _chain = chain(&scene, 1, 1);
        hit(&scene, 0, 10.0, ElementKind::None);
        assert_eq!(scene.enemies[1].hits.get(), 0);
        assert_eq!(scene.enemies[2].hits.get(), 0);
    }

    #[test]
    fn test_spawns_bolts() {
        let scene = scene(3);
        let spawner = Rc::new(RecordingSpawner::default());
        let spatial: Rc<dyn SpatialQuery> = scene.world.clone();
        let vfx: Rc<dyn EffectSpawner> = spawner.clone();
        let _chain = ChainLightning::new(
            &scene.ctx,
            scene.player.id(),
            Some(spatial),
            Some(vfx),
            0.5,
            2,
            3.0,
            1,
            -1.0,
        );
        hit(&scene, 0, 10.0, ElementKind::None);
        let spawned = spawner.spawned.borrow();
        assert_eq!(spawned.len(), 2);
        assert_eq!(spawned[0].0, VfxKind::LightningBolt);
        assert_eq!(spawned[0].3, CHAIN_BOLT_LIFETIME);
    }

    #[test]
    fn test_dispose_unsubscribes() {
        let scene = scene(3);
        let chain = chain(&scene, 2, 1);
        chain.dispose();
        chain.dispose();
        assert_eq!(scene.ctx.bus.listener_count(), 0);
        hit(&scene, 0, 10.0, ElementKind::None);
        assert_eq!(scene.enemies[1].hits.get(), 0);
    }
}
