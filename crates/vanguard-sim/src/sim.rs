//! Headless combat simulation.
//!
//! A player stands at the origin facing a line of enemies along +X. Every
//! frame the player fires one projectile at the nearest living enemy; every
//! few frames it also slams from a height. Projectiles resolve against the
//! published bounce, explosive and delayed tunings the way the game's
//! projectile prefabs do.

use glam::Vec3;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, info, warn};
use vanguard_common::EntityId;
use vanguard_gameplay::{
    nearest_living, CombatContext, Combatant, CombatantRef, Damageable,
    DelayedDamageMarks, DotRegistry, EffectFactory, EffectKind, EffectSpawner, FallDamageBonus,
    GameplayConfig, ItemAddOutcome, ItemInventory, SpatialQuery, Stats, StompDamage, TargetKind,
    VfxKind,
};

use crate::config::SimConfig;

// ============================================================================
// World
// ============================================================================

/// A combatant with plain health and running totals.
#[derive(Debug)]
pub struct Dummy {
    id: EntityId,
    kind: TargetKind,
    position: Cell<Vec3>,
    health: Cell<f32>,
    max_health: f32,
    damage_taken: Cell<f32>,
    healed: Cell<f32>,
}

impl Dummy {
    /// Creates a dummy at full health.
    #[must_use]
    pub fn new(kind: TargetKind, position: Vec3, max_health: f32) -> Rc<Self> {
        Rc::new(Self {
            id: EntityId::new(),
            kind,
            position: Cell::new(position),
            health: Cell::new(max_health),
            max_health,
            damage_taken: Cell::new(0.0),
            healed: Cell::new(0.0),
        })
    }

    /// Current health.
    #[must_use]
    pub fn health(&self) -> f32 {
        self.health.get()
    }

    /// Total damage received.
    #[must_use]
    pub fn damage_taken(&self) -> f32 {
        self.damage_taken.get()
    }

    /// Total healing received, including overheal.
    #[must_use]
    pub fn healed(&self) -> f32 {
        self.healed.get()
    }
}

impl Damageable for Dummy {
    fn is_dead(&self) -> bool {
        self.health.get() <= 0.0
    }

    fn take_damage(&self, amount: f32) {
        if self.is_dead() {
            return;
        }
        self.health.set(self.health.get() - amount);
        self.damage_taken.set(self.damage_taken.get() + amount);
    }

    fn heal(&self, amount: f32) {
        self.healed.set(self.healed.get() + amount);
        self.health
            .set((self.health.get() + amount).min(self.max_health));
    }
}

impl Combatant for Dummy {
    fn id(&self) -> EntityId {
        self.id
    }

    fn kind(&self) -> TargetKind {
        self.kind
    }

    fn position(&self) -> Vec3 {
        self.position.get()
    }
}

/// Enemies lined up along +X.
#[derive(Debug, Default)]
pub struct Arena {
    enemies: Vec<Rc<Dummy>>,
}

impl Arena {
    /// Places `count` enemies `spacing` apart, starting one spacing out.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn line(count: u32, spacing: f32, health: f32) -> Self {
        let enemies = (1..=count)
            .map(|i| Dummy::new(TargetKind::Enemy, Vec3::X * spacing * i as f32, health))
            .collect();
        Self { enemies }
    }

    /// All enemies, living or not.
    #[must_use]
    pub fn enemies(&self) -> &[Rc<Dummy>] {
        &self.enemies
    }

    fn combatants(&self) -> Vec<CombatantRef> {
        self.enemies
            .iter()
            .map(|e| Rc::clone(e) as CombatantRef)
            .collect()
    }

    /// Enemies with no health left.
    #[must_use]
    pub fn kills(&self) -> usize {
        self.enemies.iter().filter(|e| e.is_dead()).count()
    }
}

impl SpatialQuery for Arena {
    fn find_nearby(&self, center: Vec3, radius: f32, kind: TargetKind) -> Vec<CombatantRef> {
        if kind != TargetKind::Enemy {
            return Vec::new();
        }
        self.enemies
            .iter()
            .filter(|e| e.position().distance(center) <= radius)
            .map(|e| Rc::clone(e) as CombatantRef)
            .collect()
    }
}

/// Counts requested visuals instead of drawing them.
#[derive(Debug, Default)]
pub struct VfxCounter {
    spawned: Cell<u32>,
}

impl VfxCounter {
    /// Visuals requested so far.
    #[must_use]
    pub fn spawned(&self) -> u32 {
        self.spawned.get()
    }
}

impl EffectSpawner for VfxCounter {
    fn spawn(&self, kind: VfxKind, from: Vec3, to: Vec3, lifetime: f32) {
        self.spawned.set(self.spawned.get() + 1);
        debug!("VFX {kind:?} {from} -> {to} ({lifetime:.2}s)");
    }
}

// ============================================================================
// Summary
// ============================================================================

/// Totals reported at the end of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimSummary {
    /// Frames simulated.
    pub frames: u32,
    /// Projectiles fired.
    pub shots: u32,
    /// Slams performed.
    pub slams: u32,
    /// Damage dealt to enemies by any source.
    pub damage_dealt: f32,
    /// Healing received by the player.
    pub healing: f32,
    /// Enemies killed.
    pub kills: usize,
    /// Delayed marks that detonated.
    pub detonations: usize,
    /// Damage events reported on the bus.
    pub events: u64,
    /// Visual effects requested.
    pub vfx: u32,
    /// Player stats at the end of the run.
    pub stats_line: String,
}

impl fmt::Display for SimSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} frames, {} shots, {} slams: {:.1} damage, {:.1} healing, \
             {} kills, {} detonations, {} events, {} vfx",
            self.frames,
            self.shots,
            self.slams,
            self.damage_dealt,
            self.healing,
            self.kills,
            self.detonations,
            self.events,
            self.vfx
        )
    }
}

// ============================================================================
// Simulation
// ============================================================================

/// Downward speed the player lands a slam with.
const SLAM_FALL_SPEED: f32 = 20.0;

/// One headless combat run.
pub struct Simulation {
    config: SimConfig,
    ctx: CombatContext,
    dots: Rc<DotRegistry>,
    marks: DelayedDamageMarks,
    arena: Rc<Arena>,
    vfx: Rc<VfxCounter>,
    player: Rc<Dummy>,
    stats: Stats,
    inventory: ItemInventory,
    rng: fastrand::Rng,
    frame: u32,
    shots: u32,
    slams: u32,
    detonations: usize,
}

impl Simulation {
    /// Builds the arena and equips the player with every configured item.
    #[must_use]
    pub fn new(config: SimConfig, gameplay: &GameplayConfig) -> Self {
        let ctx = CombatContext::new();
        let dots = Rc::new(DotRegistry::new(
            Rc::clone(&ctx.bus),
            Rc::clone(&ctx.registry),
        ));
        let vfx = Rc::new(VfxCounter::default());
        let arena = Rc::new(Arena::line(
            config.enemy_count,
            config.enemy_spacing,
            config.enemy_health,
        ));
        let player = Dummy::new(TargetKind::Player, Vec3::ZERO, gameplay.base_stats.health);

        let factory = EffectFactory::new(ctx.clone(), Rc::clone(&dots))
            .with_spatial(Rc::clone(&arena) as Rc<dyn SpatialQuery>)
            .with_vfx(Rc::clone(&vfx) as Rc<dyn EffectSpawner>)
            .with_owner_health(Rc::clone(&player) as Rc<dyn Damageable>)
            .with_stomp_detector(gameplay.stomp_detector);

        let mut stats = Stats::new(player.id(), gameplay.base_stats.clone());
        let mut inventory = ItemInventory::new(player.id(), factory);
        for item in &gameplay.items {
            match inventory.add_item(item, &mut stats) {
                ItemAddOutcome::AtMaxStacks { count } => {
                    warn!("{} already at {} stacks", item.name, count);
                },
                outcome => debug!("Equipped {} ({:?})", item.name, outcome),
            }
        }
        info!(
            "Equipped {} items, effects: {:?}",
            gameplay.items.len(),
            inventory.effects().kinds()
        );

        let marks = DelayedDamageMarks::new(Rc::clone(&ctx.bus), Rc::clone(&ctx.registry))
            .with_vfx(Rc::clone(&vfx) as Rc<dyn EffectSpawner>);
        let rng = config
            .seed
            .map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);

        Self {
            config,
            ctx,
            dots,
            marks,
            arena,
            vfx,
            player,
            stats,
            inventory,
            rng,
            frame: 0,
            shots: 0,
            slams: 0,
            detonations: 0,
        }
    }

    /// Player stats.
    #[must_use]
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// The enemy line.
    #[must_use]
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// The player.
    #[must_use]
    pub fn player(&self) -> &Dummy {
        &self.player
    }

    /// The player's items and effects.
    #[must_use]
    pub fn inventory(&self) -> &ItemInventory {
        &self.inventory
    }

    /// Seconds simulated so far.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn time(&self) -> f32 {
        self.frame as f32 * self.config.frame_dt
    }

    /// Runs every configured frame and returns the totals.
    pub fn run(&mut self) -> SimSummary {
        for _ in 0..self.config.frames {
            if self.arena.kills() == self.arena.enemies().len() {
                info!("All enemies down after {} frames", self.frame);
                break;
            }
            self.step();
        }
        self.summary()
    }

    /// Simulates one frame.
    pub fn step(&mut self) {
        self.frame += 1;
        let dt = self.config.frame_dt;

        self.fire();
        if self.config.slam_every > 0 && self.frame % self.config.slam_every == 0 {
            self.slam();
        }

        let ticks = self.dots.update(dt);
        let detonated = self.marks.update(dt).len();
        self.detonations += detonated;
        let ended = self.inventory.update(dt);
        let expired = self.stats.update(dt);
        if ticks + detonated > 0 || !ended.is_empty() || !expired.is_empty() {
            debug!(
                "Frame {}: {} ticks, {} detonations, ended {:?}, {} modifiers expired",
                self.frame,
                ticks,
                detonated,
                ended,
                expired.len()
            );
        }
    }

    /// Totals so far.
    #[must_use]
    pub fn summary(&self) -> SimSummary {
        SimSummary {
            frames: self.frame,
            shots: self.shots,
            slams: self.slams,
            damage_dealt: self.arena.enemies().iter().map(|e| e.damage_taken()).sum(),
            healing: self.player.healed(),
            kills: self.arena.kills(),
            detonations: self.detonations,
            events: self.ctx.bus.events_reported(),
            vfx: self.vfx.spawned(),
            stats_line: self.stats.to_string(),
        }
    }

    fn jittered(&mut self, damage: f32) -> f32 {
        let variance = self.config.damage_variance;
        if variance <= 0.0 {
            return damage;
        }
        damage * (1.0 + variance * (self.rng.f32() * 2.0 - 1.0))
    }

    fn fire(&mut self) {
        let origin = self.player.position();
        let Some(target) = nearest_living(&self.arena.combatants(), origin, |_| false) else {
            return;
        };
        self.shots += 1;
        let damage = self.jittered(self.stats.projectile_damage());
        let registry = &self.ctx.registry;

        if registry.is_enabled(EffectKind::BounceProjectiles) {
            self.bounce_hit(&target, damage);
        } else if registry.is_enabled(EffectKind::ExplosiveProjectiles) {
            self.hit(&target, damage);
            self.explode(target.position(), damage);
        } else {
            self.hit(&target, damage);
        }
        self.marks
            .mark_with_published(&target, damage, self.player.id());
    }

    fn hit(&self, target: &CombatantRef, damage: f32) {
        target.take_damage(damage);
        self.ctx
            .bus
            .report_physical_damage(self.player.id(), target, damage);
    }

    fn bounce_hit(&self, first: &CombatantRef, damage: f32) {
        let tuning = self.ctx.registry.bounce();
        let mut visited = vec![first.id()];
        let mut current = Rc::clone(first);
        let mut bounces: i32 = 0;
        loop {
            self.hit(&current, damage * tuning.damage_multiplier.powi(bounces));
            bounces += 1;
            if bounces > tuning.max_bounces {
                break;
            }
            let from = current.position();
            let candidates = self.arena.find_nearby(from, tuning.range, TargetKind::Enemy);
            let Some(next) = nearest_living(&candidates, from, |id| visited.contains(&id)) else {
                break;
            };
            self.vfx.spawn(VfxKind::LightningBolt, from, next.position(), 0.1);
            visited.push(next.id());
            current = next;
        }
    }

    fn explode(&self, center: Vec3, damage: f32) {
        let tuning = self.ctx.registry.explosive();
        let aoe = damage * tuning.aoe_damage_multiplier;
        if aoe <= 0.0 || tuning.aoe_radius <= 0.0 {
            return;
        }
        for enemy in self
            .arena
            .find_nearby(center, tuning.aoe_radius, TargetKind::Enemy)
        {
            if !enemy.is_dead() {
                self.hit(&enemy, aoe);
            }
        }
    }

    fn slam(&mut self) {
        self.slams += 1;
        let origin = self.player.position();
        let height = self.config.slam_height;
        let now = self.time();

        let mut damage = self.stats.slam_damage();
        if let Some(bonus) = self
            .inventory
            .effects()
            .get_as::<FallDamageBonus>(EffectKind::FallDamageBonus)
        {
            bonus.record_slam_start_height(origin.y + height);
            damage += bonus.bonus_slam_damage(origin.y);
        }

        let targets = self
            .arena
            .find_nearby(origin, self.stats.slam_radius(), TargetKind::Enemy);
        for enemy in &targets {
            if !enemy.is_dead() {
                self.hit(enemy, damage);
            }
        }

        // The descent passes over the nearest enemy before landing.
        let Some(stomp) = self
            .inventory
            .effects()
            .get_as::<StompDamage>(EffectKind::StompDamage)
        else {
            return;
        };
        let Some(under) = nearest_living(&self.arena.combatants(), origin, |_| false) else {
            return;
        };
        let above = under.position() + Vec3::Y * (stomp.detector().radius + 0.5);
        if let Some(outcome) = stomp.on_enemy_detected(&under, above, -SLAM_FALL_SPEED, now) {
            debug!(
                "Stomped {} for {:.1}, bounce {:.1}",
                under.id(),
                outcome.damage,
                outcome.bounce_force
            );
        }
    }
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("frame", &self.frame)
            .field("enemies", &self.arena.enemies().len())
            .field("effects", &self.inventory.effects().kinds())
            .finish_non_exhaustive()
    }
}

/// Loads gameplay content for a run.
#[must_use]
pub fn load_gameplay(config: &SimConfig) -> GameplayConfig {
    match &config.gameplay_config {
        Some(path) => GameplayConfig::load_or_default(path),
        None => {
            info!("No gameplay config set, using built-in defaults");
            GameplayConfig::default()
        },
    }
}
