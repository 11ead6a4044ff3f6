//! Shared effect state.
//!
//! Some effects publish their current tuning for collaborators outside the
//! core (projectiles read the bounce range, the slam reads the fall bonus).
//! At most one live effect instance owns each [`EffectKind`]; a second
//! instance trying to publish the same kind is rejected. The registry also
//! owns the two reentrancy guards that stop secondary damage from
//! retriggering chains and DOTs, and the elemental trigger rules.

use ahash::AHashMap;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use tracing::{debug, warn};
use vanguard_common::{EffectError, EffectInstanceId};

use crate::elements::ElementRules;

// ============================================================================
// Effect kinds
// ============================================================================

/// Every timed stacking effect variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Heals the owner when it deals damage.
    HealOnDamage,
    /// Applies a damage-over-time entry on hit.
    DotOnHit,
    /// Chains lightning to nearby enemies on hit.
    ChainLightning,
    /// Lets projectiles bounce between enemies.
    BounceProjectiles,
    /// Makes projectiles explode on impact.
    ExplosiveProjectiles,
    /// Marks targets for delayed extra damage.
    DelayedProjectiles,
    /// Adds slam damage proportional to fall height.
    FallDamageBonus,
    /// Damages enemies the owner lands on.
    StompDamage,
    /// Installs a temporary elemental trigger rule.
    ElementFusion,
}

impl EffectKind {
    /// All effect kinds.
    pub const ALL: [Self; 9] = [
        Self::HealOnDamage,
        Self::DotOnHit,
        Self::ChainLightning,
        Self::BounceProjectiles,
        Self::ExplosiveProjectiles,
        Self::DelayedProjectiles,
        Self::FallDamageBonus,
        Self::StompDamage,
        Self::ElementFusion,
    ];

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::HealOnDamage => "heal_on_damage",
            Self::DotOnHit => "dot_on_hit",
            Self::ChainLightning => "chain_lightning",
            Self::BounceProjectiles => "bounce_projectiles",
            Self::ExplosiveProjectiles => "explosive_projectiles",
            Self::DelayedProjectiles => "delayed_projectiles",
            Self::FallDamageBonus => "fall_damage_bonus",
            Self::StompDamage => "stomp_damage",
            Self::ElementFusion => "element_fusion",
        }
    }

    /// Returns true if negative stack counts shrink the effect.
    ///
    /// Other variants clamp every stack change to at least one.
    #[must_use]
    pub const fn supports_stack_removal(self) -> bool {
        matches!(
            self,
            Self::BounceProjectiles | Self::ExplosiveProjectiles | Self::DelayedProjectiles
        )
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Reentrancy guards
// ============================================================================

/// Non-reentrant critical section.
///
/// While a token is alive, further [`ReentrancyGuard::try_enter`] calls fail.
#[derive(Debug)]
pub struct ReentrancyGuard {
    name: &'static str,
    held: Cell<bool>,
}

impl ReentrancyGuard {
    /// Creates a released guard.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            held: Cell::new(false),
        }
    }

    /// Enters the section, or returns `None` if it is already held.
    #[must_use]
    pub fn try_enter(&self) -> Option<GuardToken<'_>> {
        if self.held.replace(true) {
            debug!("{} already held", self.name);
            return None;
        }
        Some(GuardToken { guard: self })
    }

    /// Returns true while a token is alive.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.held.get()
    }

    /// Guard name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Releases its guard when dropped.
#[derive(Debug)]
pub struct GuardToken<'a> {
    guard: &'a ReentrancyGuard,
}

impl Drop for GuardToken<'_> {
    fn drop(&mut self) {
        self.guard.held.set(false);
    }
}

// ============================================================================
// Published tuning
// ============================================================================

/// Current bounce tuning for projectiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BounceTuning {
    /// Search range for the next bounce target.
    pub range: f32,
    /// Maximum bounces per projectile.
    pub max_bounces: i32,
    /// Damage multiplier applied per bounce.
    pub damage_multiplier: f32,
}

impl BounceTuning {
    /// Values in force when no bounce effect is live.
    pub const NEUTRAL: Self = Self {
        range: 0.0,
        max_bounces: 0,
        damage_multiplier: 1.0,
    };
}

/// Current explosion tuning for projectiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplosiveTuning {
    /// Explosion radius.
    pub aoe_radius: f32,
    /// Fraction of the hit damage dealt as area damage.
    pub aoe_damage_multiplier: f32,
    /// Projectiles explode after travelling this far. Zero disables it.
    pub max_range: f32,
}

impl ExplosiveTuning {
    /// Values in force when no explosive effect is live.
    pub const NEUTRAL: Self = Self {
        aoe_radius: 0.0,
        aoe_damage_multiplier: 0.0,
        max_range: 0.0,
    };
}

/// Current delayed-damage tuning for projectiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayedTuning {
    /// Seconds before a mark detonates.
    pub delay_time: f32,
    /// Multiplier applied to the marked damage.
    pub damage_multiplier: f32,
}

impl DelayedTuning {
    /// Values in force when no delayed effect is live.
    pub const NEUTRAL: Self = Self {
        delay_time: 0.0,
        damage_multiplier: 1.0,
    };
}

/// Current fall damage bonus for slams.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallDamageTuning {
    /// Bonus damage per meter fallen per stack.
    pub damage_per_meter: f32,
    /// Current stack count.
    pub stacks: i32,
}

impl FallDamageTuning {
    /// Values in force when no fall bonus is live.
    pub const NEUTRAL: Self = Self {
        damage_per_meter: 0.0,
        stacks: 0,
    };

    /// Bonus damage for a fall of `distance` meters.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn bonus_for_fall(&self, distance: f32) -> f32 {
        if distance <= 0.0 {
            return 0.0;
        }
        distance * self.damage_per_meter * self.stacks as f32
    }
}

/// Trigger volume that detects enemies under a falling owner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StompDetector {
    /// Detection radius.
    pub radius: f32,
    /// Offset from the owner's position.
    pub offset: Vec3,
    /// Minimum downward speed for a stomp.
    pub min_fall_speed: f32,
    /// Seconds between stomps.
    pub cooldown: f32,
}

impl Default for StompDetector {
    fn default() -> Self {
        Self {
            radius: 1.5,
            offset: Vec3::new(0.0, -1.0, 0.0),
            min_fall_speed: 2.0,
            cooldown: 0.2,
        }
    }
}

impl StompDetector {
    /// Center of the detection volume for an owner at `position`.
    #[must_use]
    pub fn center(&self, position: Vec3) -> Vec3 {
        position + self.offset
    }
}

/// State an effect publishes while it is live.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PublishedTuning {
    /// Bounce projectiles.
    Bounce(BounceTuning),
    /// Explosive projectiles.
    Explosive(ExplosiveTuning),
    /// Delayed projectiles.
    Delayed(DelayedTuning),
    /// Fall damage bonus.
    FallDamage(FallDamageTuning),
    /// Stomp detector companion.
    Stomp(StompDetector),
}

impl PublishedTuning {
    /// Effect kind this state belongs to.
    #[must_use]
    pub const fn kind(&self) -> EffectKind {
        match self {
            Self::Bounce(_) => EffectKind::BounceProjectiles,
            Self::Explosive(_) => EffectKind::ExplosiveProjectiles,
            Self::Delayed(_) => EffectKind::DelayedProjectiles,
            Self::FallDamage(_) => EffectKind::FallDamageBonus,
            Self::Stomp(_) => EffectKind::StompDamage,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Publication {
    owner: EffectInstanceId,
    tuning: PublishedTuning,
}

// ============================================================================
// Registry
// ============================================================================

/// Process-wide effect state, made explicit.
#[derive(Debug)]
pub struct EffectRegistry {
    chain_guard: ReentrancyGuard,
    dot_guard: ReentrancyGuard,
    published: RefCell<AHashMap<EffectKind, Publication>>,
    elements: RefCell<ElementRules>,
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            chain_guard: ReentrancyGuard::new("chain"),
            dot_guard: ReentrancyGuard::new("dot"),
            published: RefCell::new(AHashMap::new()),
            elements: RefCell::new(ElementRules::new()),
        }
    }

    /// Held while a lightning chain resolves.
    #[must_use]
    pub fn chain_guard(&self) -> &ReentrancyGuard {
        &self.chain_guard
    }

    /// Held while a single DOT tick applies its damage.
    #[must_use]
    pub fn dot_guard(&self) -> &ReentrancyGuard {
        &self.dot_guard
    }

    /// Publishes or updates state for an effect kind.
    ///
    /// # Errors
    ///
    /// Returns [`EffectError::KindAlreadyOwned`] if another instance holds
    /// the kind.
    pub fn publish(
        &self,
        owner: EffectInstanceId,
        tuning: PublishedTuning,
    ) -> Result<(), EffectError> {
        let kind = tuning.kind();
        let mut published = self.published.borrow_mut();
        if let Some(current) = published.get(&kind) {
            if current.owner != owner {
                warn!("{} tried to publish {} owned by {}", owner, kind, current.owner);
                return Err(EffectError::KindAlreadyOwned {
                    kind: kind.name(),
                    owner: current.owner,
                });
            }
        }
        published.insert(kind, Publication { owner, tuning });
        Ok(())
    }

    /// Withdraws published state. Only the owner can retract; returns true
    /// if something was removed.
    pub fn retract(&self, kind: EffectKind, owner: EffectInstanceId) -> bool {
        let mut published = self.published.borrow_mut();
        match published.get(&kind) {
            Some(current) if current.owner == owner => {
                published.remove(&kind);
                debug!("{} retracted {}", owner, kind);
                true
            }
            _ => false,
        }
    }

    /// Instance currently owning a kind.
    #[must_use]
    pub fn owner_of(&self, kind: EffectKind) -> Option<EffectInstanceId> {
        self.published.borrow().get(&kind).map(|p| p.owner)
    }

    /// Returns true while some instance publishes the kind.
    #[must_use]
    pub fn is_enabled(&self, kind: EffectKind) -> bool {
        self.published.borrow().contains_key(&kind)
    }

    /// Raw published state for a kind.
    #[must_use]
    pub fn published(&self, kind: EffectKind) -> Option<PublishedTuning> {
        self.published.borrow().get(&kind).map(|p| p.tuning)
    }

    /// Current bounce tuning, neutral when disabled.
    #[must_use]
    pub fn bounce(&self) -> BounceTuning {
        match self.published(EffectKind::BounceProjectiles) {
            Some(PublishedTuning::Bounce(t)) => t,
            _ => BounceTuning::NEUTRAL,
        }
    }

    /// Current explosive tuning, neutral when disabled.
    #[must_use]
    pub fn explosive(&self) -> ExplosiveTuning {
        match self.published(EffectKind::ExplosiveProjectiles) {
            Some(PublishedTuning::Explosive(t)) => t,
            _ => ExplosiveTuning::NEUTRAL,
        }
    }

    /// Current delayed tuning, neutral when disabled.
    #[must_use]
    pub fn delayed(&self) -> DelayedTuning {
        match self.published(EffectKind::DelayedProjectiles) {
            Some(PublishedTuning::Delayed(t)) => t,
            _ => DelayedTuning::NEUTRAL,
        }
    }

    /// Current fall damage tuning, neutral when disabled.
    #[must_use]
    pub fn fall_damage(&self) -> FallDamageTuning {
        match self.published(EffectKind::FallDamageBonus) {
            Some(PublishedTuning::FallDamage(t)) => t,
            _ => FallDamageTuning::NEUTRAL,
        }
    }

    /// Live stomp detector, if any.
    #[must_use]
    pub fn stomp_detector(&self) -> Option<StompDetector> {
        match self.published(EffectKind::StompDamage) {
            Some(PublishedTuning::Stomp(d)) => Some(d),
            _ => None,
        }
    }

    /// Elemental trigger rules.
    #[must_use]
    pub fn element_rules(&self) -> Ref<'_, ElementRules> {
        self.elements.borrow()
    }

    /// Elemental trigger rules, for fusion effects.
    #[must_use]
    pub fn element_rules_mut(&self) -> RefMut<'_, ElementRules> {
        self.elements.borrow_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_is_not_reentrant() {
        let guard = ReentrancyGuard::new("test");
        {
            let token = guard.try_enter();
            assert!(token.is_some());
            assert!(guard.is_held());
            assert!(guard.try_enter().is_none());
            assert!(guard.is_held());
        }
        assert!(!guard.is_held());
        assert!(guard.try_enter().is_some());
    }

    #[test]
    fn test_single_owner() {
        let registry = EffectRegistry::new();
        let first = EffectInstanceId::next();
        let second = EffectInstanceId::next();
        let tuning = BounceTuning {
            range: 5.0,
            max_bounces: 2,
            damage_multiplier: 0.8,
        };

        assert!(registry.publish(first, PublishedTuning::Bounce(tuning)).is_ok());
        assert!(matches!(
            registry.publish(second, PublishedTuning::Bounce(BounceTuning::NEUTRAL)),
            Err(EffectError::KindAlreadyOwned { owner, .. }) if owner == first
        ));
        assert_eq!(registry.bounce(), tuning);

        assert!(!registry.retract(EffectKind::BounceProjectiles, second));
        assert!(registry.is_enabled(EffectKind::BounceProjectiles));
        assert!(registry.retract(EffectKind::BounceProjectiles, first));
        assert!(!registry.retract(EffectKind::BounceProjectiles, first));
        assert_eq!(registry.bounce(), BounceTuning::NEUTRAL);

        assert!(registry.publish(second, PublishedTuning::Bounce(tuning)).is_ok());
        assert_eq!(registry.owner_of(EffectKind::BounceProjectiles), Some(second));
    }

    #[test]
    fn test_neutral_defaults() {
        let registry = EffectRegistry::new();
        assert_eq!(registry.explosive(), ExplosiveTuning::NEUTRAL);
        assert_eq!(registry.delayed(), DelayedTuning::NEUTRAL);
        assert_eq!(registry.fall_damage(), FallDamageTuning::NEUTRAL);
        assert!(registry.stomp_detector().is_none());
        for kind in EffectKind::ALL {
            assert!(!registry.is_enabled(kind));
        }
    }

    #[test]
    fn test_fall_bonus() {
        let tuning = FallDamageTuning {
            damage_per_meter: 2.0,
            stacks: 3,
        };
        assert_eq!(tuning.bonus_for_fall(4.0), 24.0);
        assert_eq!(tuning.bonus_for_fall(-1.0), 0.0);
    }

    #[test]
    fn test_stack_removal_kinds() {
        assert!(EffectKind::BounceProjectiles.supports_stack_removal());
        assert!(!EffectKind::HealOnDamage.supports_stack_removal());
        assert_eq!(EffectKind::StompDamage.to_string(), "stomp_damage");
    }
}
