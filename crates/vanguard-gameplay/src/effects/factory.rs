//! Declarative effect definitions and the factory that builds them.

use serde::{Deserialize, Serialize};
use std::rc::Rc;
use tracing::info;
use vanguard_common::{EffectError, ElementKind, EntityId};

use crate::combatant::{Damageable, EffectSpawner, SpatialQuery};
use crate::context::CombatContext;
use crate::dot::{DotRegistry, DotSpec};
use crate::effects::{
    BounceProjectiles, ChainLightning, DelayedProjectiles, DotOnHit, ElementFusion,
    ExplosiveProjectiles, FallDamageBonus, HealFormula, HealOnDamage, StompDamage, TimedEffect,
};
use crate::registry::{EffectKind, StompDetector};

// ============================================================================
// Parameters
// ============================================================================

/// Chain lightning tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainParams {
    /// Fraction of the triggering hit dealt by each hop.
    pub damage_percent: f32,
    /// Hops per chain at one stack.
    pub max_chain_count: i32,
    /// Search radius around the previous hop.
    pub range: f32,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            damage_percent: 0.5,
            max_chain_count: 3,
            range: 8.0,
        }
    }
}

/// Bounce tuning at one stack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BounceParams {
    /// Search range for the next bounce target.
    pub range: f32,
    /// Bounces per projectile.
    pub max_bounces: i32,
    /// Damage multiplier per bounce.
    pub damage_multiplier: f32,
}

impl Default for BounceParams {
    fn default() -> Self {
        Self {
            range: 10.0,
            max_bounces: 2,
            damage_multiplier: 0.8,
        }
    }
}

/// Explosion tuning at one stack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplosiveParams {
    /// Explosion radius.
    pub aoe_radius: f32,
    /// Fraction of the hit dealt as area damage.
    pub aoe_damage_multiplier: f32,
    /// Travel distance after which projectiles explode; zero for impact only.
    pub max_range: f32,
}

impl Default for ExplosiveParams {
    fn default() -> Self {
        Self {
            aoe_radius: 3.0,
            aoe_damage_multiplier: 0.5,
            max_range: 0.0,
        }
    }
}

/// Delayed-damage tuning at one stack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayedParams {
    /// Seconds before a mark detonates.
    pub delay_time: f32,
    /// Multiplier applied to the marked damage.
    pub damage_multiplier: f32,
}

impl Default for DelayedParams {
    fn default() -> Self {
        Self {
            delay_time: 1.0,
            damage_multiplier: 1.5,
        }
    }
}

/// Fall bonus tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallParams {
    /// Bonus damage per meter fallen.
    pub damage_per_meter: f32,
    /// Factor applied on top of `damage_per_meter`.
    pub per_stack: f32,
}

impl Default for FallParams {
    fn default() -> Self {
        Self {
            damage_per_meter: 2.0,
            per_stack: 1.0,
        }
    }
}

/// Stomp tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StompParams {
    /// Damage per stack.
    pub damage_per_stack: f32,
    /// Upward force applied to the owner after a stomp.
    pub bounce_force: f32,
}

impl Default for StompParams {
    fn default() -> Self {
        Self {
            damage_per_stack: 10.0,
            bounce_force: 8.0,
        }
    }
}

/// Element fusion rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionParams {
    /// Element of the triggering hit.
    pub trigger: ElementKind,
    /// Element it may now set off.
    pub effect: ElementKind,
}

impl Default for FusionParams {
    fn default() -> Self {
        Self {
            trigger: ElementKind::Fire,
            effect: ElementKind::Lightning,
        }
    }
}

/// Per-kind tuning of an effect definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EffectParams {
    /// Lifesteal.
    HealOnDamage(HealFormula),
    /// DOT applied on hit.
    DotOnHit(DotSpec),
    /// Chain lightning.
    ChainLightning(ChainParams),
    /// Bouncing projectiles.
    BounceProjectiles(BounceParams),
    /// Exploding projectiles.
    ExplosiveProjectiles(ExplosiveParams),
    /// Delayed-damage projectiles.
    DelayedProjectiles(DelayedParams),
    /// Fall damage bonus.
    FallDamageBonus(FallParams),
    /// Stomp damage.
    StompDamage(StompParams),
    /// Element fusion.
    ElementFusion(FusionParams),
}

impl Default for EffectParams {
    fn default() -> Self {
        Self::HealOnDamage(HealFormula::default())
    }
}

impl EffectParams {
    /// Effect kind built from these parameters.
    #[must_use]
    pub const fn kind(&self) -> EffectKind {
        match self {
            Self::HealOnDamage(_) => EffectKind::HealOnDamage,
            Self::DotOnHit(_) => EffectKind::DotOnHit,
            Self::ChainLightning(_) => EffectKind::ChainLightning,
            Self::BounceProjectiles(_) => EffectKind::BounceProjectiles,
            Self::ExplosiveProjectiles(_) => EffectKind::ExplosiveProjectiles,
            Self::DelayedProjectiles(_) => EffectKind::DelayedProjectiles,
            Self::FallDamageBonus(_) => EffectKind::FallDamageBonus,
            Self::StompDamage(_) => EffectKind::StompDamage,
            Self::ElementFusion(_) => EffectKind::ElementFusion,
        }
    }

    /// Checks values no effect can work with.
    ///
    /// # Errors
    ///
    /// Returns [`EffectError::InvalidTuning`] naming the first bad value.
    pub fn validate(&self) -> Result<(), EffectError> {
        let kind = self.kind().name();
        let invalid = |reason: &str| {
            Err(EffectError::InvalidTuning {
                kind,
                reason: reason.to_string(),
            })
        };
        match self {
            Self::DotOnHit(spec) if spec.id.is_empty() => invalid("DOT id is empty"),
            Self::DotOnHit(spec) if spec.tick_interval <= 0.0 => {
                invalid("tick interval must be positive")
            },
            Self::ChainLightning(p) if p.range < 0.0 => invalid("range is negative"),
            Self::BounceProjectiles(p) if p.range < 0.0 => invalid("range is negative"),
            Self::ExplosiveProjectiles(p) if p.aoe_radius < 0.0 => invalid("radius is negative"),
            Self::DelayedProjectiles(p) if p.delay_time < 0.0 => invalid("delay is negative"),
            _ => Ok(()),
        }
    }
}

/// One runtime effect granted by an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectSpec {
    /// Seconds the effect lasts; negative means permanent.
    pub duration: f32,
    /// Per-kind tuning.
    pub params: EffectParams,
}

impl Default for EffectSpec {
    fn default() -> Self {
        Self::permanent(EffectParams::default())
    }
}

impl EffectSpec {
    /// Permanent effect with the given tuning.
    #[must_use]
    pub fn permanent(params: EffectParams) -> Self {
        Self {
            duration: -1.0,
            params,
        }
    }

    /// Effect kind this spec builds.
    #[must_use]
    pub fn kind(&self) -> EffectKind {
        self.params.kind()
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Builds effects for one owner from their declarative specs.
///
/// Holds the collaborators effects need; missing ones degrade the effects
/// that use them rather than failing creation.
#[derive(Clone)]
pub struct EffectFactory {
    ctx: CombatContext,
    dots: Rc<DotRegistry>,
    spatial: Option<Rc<dyn SpatialQuery>>,
    vfx: Option<Rc<dyn EffectSpawner>>,
    owner_health: Option<Rc<dyn Damageable>>,
    stomp_detector: StompDetector,
}

impl EffectFactory {
    /// Creates a factory without world collaborators.
    #[must_use]
    pub fn new(ctx: CombatContext, dots: Rc<DotRegistry>) -> Self {
        Self {
            ctx,
            dots,
            spatial: None,
            vfx: None,
            owner_health: None,
            stomp_detector: StompDetector::default(),
        }
    }

    /// Sets the spatial query used by chain lightning.
    #[must_use]
    pub fn with_spatial(mut self, spatial: Rc<dyn SpatialQuery>) -> Self {
        self.spatial = Some(spatial);
        self
    }

    /// Sets the VFX spawner.
    #[must_use]
    pub fn with_vfx(mut self, vfx: Rc<dyn EffectSpawner>) -> Self {
        self.vfx = Some(vfx);
        self
    }

    /// Sets the health lifesteal restores.
    #[must_use]
    pub fn with_owner_health(mut self, health: Rc<dyn Damageable>) -> Self {
        self.owner_health = Some(health);
        self
    }

    /// Sets the detector published by stomp effects.
    #[must_use]
    pub fn with_stomp_detector(mut self, detector: StompDetector) -> Self {
        self.stomp_detector = detector;
        self
    }

    /// Shared combat context.
    #[must_use]
    pub fn context(&self) -> &CombatContext {
        &self.ctx
    }

    /// Creates an effect.
    ///
    /// # Errors
    ///
    /// Fails on invalid tuning, or if the kind publishes shared tuning and
    /// another live instance already owns it.
    pub fn create(
        &self,
        owner: EntityId,
        spec: &EffectSpec,
        stacks: i32,
    ) -> Result<Rc<dyn TimedEffect>, EffectError> {
        spec.params.validate()?;
        let ctx = &self.ctx;
        let duration = spec.duration;
        let effect: Rc<dyn TimedEffect> = match &spec.params {
            EffectParams::HealOnDamage(formula) => HealOnDamage::new(
                ctx,
                owner,
                self.owner_health.clone(),
                *formula,
                stacks,
                duration,
            ),
            EffectParams::DotOnHit(dot) => DotOnHit::new(
                ctx,
                Rc::clone(&self.dots),
                owner,
                dot.clone(),
                stacks,
                duration,
            ),
            EffectParams::ChainLightning(p) => ChainLightning::new(
                ctx,
                owner,
                self.spatial.clone(),
                self.vfx.clone(),
                p.damage_percent,
                p.max_chain_count,
                p.range,
                stacks,
                duration,
            ),
            EffectParams::BounceProjectiles(p) => BounceProjectiles::new(
                ctx,
                owner,
                p.range,
                p.max_bounces,
                p.damage_multiplier,
                stacks,
                duration,
            )?,
            EffectParams::ExplosiveProjectiles(p) => ExplosiveProjectiles::new(
                ctx,
                owner,
                p.aoe_radius,
                p.aoe_damage_multiplier,
                p.max_range,
                stacks,
                duration,
            )?,
            EffectParams::DelayedProjectiles(p) => DelayedProjectiles::new(
                ctx,
                owner,
                p.delay_time,
                p.damage_multiplier,
                stacks,
                duration,
            )?,
            EffectParams::FallDamageBonus(p) => FallDamageBonus::new(
                ctx,
                owner,
                p.damage_per_meter * p.per_stack,
                stacks,
                duration,
            )?,
            EffectParams::StompDamage(p) => StompDamage::new(
                ctx,
                owner,
                self.stomp_detector,
                p.damage_per_stack,
                p.bounce_force,
                stacks,
                duration,
            )?,
            EffectParams::ElementFusion(p) => {
                ElementFusion::new(ctx, owner, p.trigger, p.effect, stacks, duration)
            }
        };
        info!("[Effect] {} created : Stacks {}", effect.kind(), effect.stacks());
        Ok(effect)
    }
}
