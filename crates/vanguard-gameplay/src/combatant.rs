//! Capabilities effects consume from the game world.
//!
//! Effects never discover collaborators on their own; the host hands them a
//! [`Damageable`], a [`SpatialQuery`] or an [`EffectSpawner`] at construction.
//! All implementations are driven from the frame thread and use interior
//! mutability for their own state.

use glam::Vec3;
use std::rc::Rc;
use vanguard_common::EntityId;

/// Something that can be damaged and healed.
pub trait Damageable {
    /// Returns true once health has run out.
    fn is_dead(&self) -> bool;

    /// Applies damage.
    fn take_damage(&self, amount: f32);

    /// Restores health.
    fn heal(&self, amount: f32);
}

/// Broad classification of a combatant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// The player character.
    Player,
    /// A hostile creature.
    Enemy,
    /// Breakables and training dummies that are neither.
    Prop,
}

/// A damageable entity with a position.
pub trait Combatant: Damageable {
    /// Entity id.
    fn id(&self) -> EntityId;

    /// Classification used by enemy-only effects.
    fn kind(&self) -> TargetKind;

    /// World position.
    fn position(&self) -> Vec3;
}

/// Shared handle to a combatant.
pub type CombatantRef = Rc<dyn Combatant>;

/// Finds combatants inside a sphere.
pub trait SpatialQuery {
    /// Returns combatants of `kind` within `radius` of `center`.
    fn find_nearby(&self, center: Vec3, radius: f32, kind: TargetKind) -> Vec<CombatantRef>;
}

/// Visual effects the core can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VfxKind {
    /// Lightning arc between two points.
    LightningBolt,
    /// Pending delayed-damage mark.
    DelayedMark,
    /// Delayed-damage detonation.
    Detonation,
}

/// Spawns short-lived visual effects.
pub trait EffectSpawner {
    /// Spawns an effect between two points that lives for `lifetime` seconds.
    fn spawn(&self, kind: VfxKind, from: Vec3, to: Vec3, lifetime: f32);
}

/// Picks the closest living candidate that is not excluded.
///
/// Ties keep the earliest candidate.
pub fn nearest_living<F>(
    candidates: &[CombatantRef],
    from: Vec3,
    mut exclude: F,
) -> Option<CombatantRef>
where
    F: FnMut(EntityId) -> bool,
{
    let mut best: Option<(f32, &CombatantRef)> = None;
    for candidate in candidates {
        if candidate.is_dead() || exclude(candidate.id()) {
            continue;
        }
        let dist = candidate.position().distance_squared(from);
        if best.map_or(true, |(d, _)| dist < d) {
            best = Some((dist, candidate));
        }
    }
    best.map(|(_, c)| Rc::clone(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockCombatant;

    #[test]
    fn test_nearest_living_skips_dead_and_excluded() {
        let near = MockCombatant::enemy(Vec3::new(1.0, 0.0, 0.0), 10.0);
        let dead = MockCombatant::enemy(Vec3::new(0.5, 0.0, 0.0), 0.0);
        let far = MockCombatant::enemy(Vec3::new(5.0, 0.0, 0.0), 10.0);
        let candidates: Vec<CombatantRef> = vec![
            far.clone() as CombatantRef,
            dead as CombatantRef,
            near.clone() as CombatantRef,
        ];

        let found = nearest_living(&candidates, Vec3::ZERO, |_| false);
        assert_eq!(found.map(|c| c.id()), Some(near.id()));

        let near_id = near.id();
        let found = nearest_living(&candidates, Vec3::ZERO, |id| id == near_id);
        assert_eq!(found.map(|c| c.id()), Some(far.id()));
    }
}
