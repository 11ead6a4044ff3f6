//! Test doubles for combatants, spatial queries and VFX.

use glam::Vec3;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use vanguard_common::EntityId;

use crate::combatant::{
    Combatant, CombatantRef, Damageable, EffectSpawner, SpatialQuery, TargetKind, VfxKind,
};

/// A combatant that records everything done to it.
#[derive(Debug)]
pub struct MockCombatant {
    id: EntityId,
    kind: TargetKind,
    position: Cell<Vec3>,
    health: Cell<f32>,
    pub damage_taken: Cell<f32>,
    pub hits: Cell<u32>,
    pub healed: Cell<f32>,
}

impl MockCombatant {
    pub fn new(kind: TargetKind, position: Vec3, health: f32) -> Rc<Self> {
        Rc::new(Self {
            id: EntityId::new(),
            kind,
            position: Cell::new(position),
            health: Cell::new(health),
            damage_taken: Cell::new(0.0),
            hits: Cell::new(0),
            healed: Cell::new(0.0),
        })
    }

    pub fn enemy(position: Vec3, health: f32) -> Rc<Self> {
        Self::new(TargetKind::Enemy, position, health)
    }

    pub fn player(position: Vec3) -> Rc<Self> {
        Self::new(TargetKind::Player, position, 100.0)
    }

    pub fn health(&self) -> f32 {
        self.health.get()
    }

    pub fn set_position(&self, position: Vec3) {
        self.position.set(position);
    }

    pub fn kill(&self) {
        self.health.set(0.0);
    }
}

impl Damageable for MockCombatant {
    fn is_dead(&self) -> bool {
        self.health.get() <= 0.0
    }

    fn take_damage(&self, amount: f32) {
        self.health.set(self.health.get() - amount);
        self.damage_taken.set(self.damage_taken.get() + amount);
        self.hits.set(self.hits.get() + 1);
    }

    fn heal(&self, amount: f32) {
        self.health.set(self.health.get() + amount);
        self.healed.set(self.healed.get() + amount);
    }
}

impl Combatant for MockCombatant {
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

/// Health capability of a mock, as effects take it.
pub fn health_of(combatant: &Rc<MockCombatant>) -> Option<Rc<dyn Damageable>> {
    let health: Rc<dyn Damageable> = combatant.clone();
    Some(health)
}

/// Linear-scan spatial index over registered combatants.
#[derive(Default)]
pub struct MockWorld {
    combatants: RefCell<Vec<CombatantRef>>,
}

impl MockWorld {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn add(&self, combatant: CombatantRef) {
        self.combatants.borrow_mut().push(combatant);
    }
}

impl SpatialQuery for MockWorld {
    fn find_nearby(&self, center: Vec3, radius: f32, kind: TargetKind) -> Vec<CombatantRef> {
        self.combatants
            .borrow()
            .iter()
            .filter(|c| c.kind() == kind && c.position().distance(center) <= radius)
            .cloned()
            .collect()
    }
}

/// Records spawned VFX.
#[derive(Default)]
pub struct RecordingSpawner {
    pub spawned: RefCell<Vec<(VfxKind, Vec3, Vec3, f32)>>,
}

impl EffectSpawner for RecordingSpawner {
    fn spawn(&self, kind: VfxKind, from: Vec3, to: Vec3, lifetime: f32) {
        self.spawned.borrow_mut().push((kind, from, to, lifetime));
    }
}
