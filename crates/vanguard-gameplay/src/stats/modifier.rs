//! Stat modifiers.
//!
//! A modifier rewrites the value of one stat as a [`Query`] passes through the
//! mediator. Modifiers are either permanent or carry a countdown after which
//! the mediator sweeps them away.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;
use vanguard_common::EntityId;

use crate::stats::query::{Query, StatType};
use crate::timer::CountdownTimer;

/// Arithmetic kind of a declarative stat modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OperatorType {
    /// `v + x`
    #[default]
    Add,
    /// `v * x`
    Multiply,
    /// `v + base * x`, where `base` is the stat's base value.
    Percentage,
}

/// The function a modifier applies to the running value.
#[derive(Clone)]
pub enum ModifierOperation {
    /// Adds a flat amount.
    Add(f32),
    /// Multiplies the running value.
    Multiply(f32),
    /// Adds a fraction of a captured base value.
    ///
    /// The base is fixed at construction, so several percentage modifiers on
    /// the same stat add up instead of compounding.
    Percentage {
        /// Base value captured when the modifier was built.
        base: f32,
        /// Fraction of `base` to add.
        fraction: f32,
    },
    /// Arbitrary transform.
    Custom(Rc<dyn Fn(f32) -> f32>),
}

impl ModifierOperation {
    /// Applies the operation to a running value.
    #[must_use]
    pub fn apply(&self, value: f32) -> f32 {
        match self {
            Self::Add(amount) => value + amount,
            Self::Multiply(factor) => value * factor,
            Self::Percentage { base, fraction } => value + base * fraction,
            Self::Custom(f) => f(value),
        }
    }
}

impl fmt::Debug for ModifierOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add(amount) => write!(f, "Add({amount})"),
            Self::Multiply(factor) => write!(f, "Multiply({factor})"),
            Self::Percentage { base, fraction } => {
                write!(f, "Percentage({base} * {fraction})")
            }
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// A unit of mutation applied to queries.
///
/// Lifetime handling is shared: implementors expose their optional countdown
/// and get `update` and `is_marked_for_removal` for free.
pub trait StatModifier: fmt::Debug {
    /// Mutates `query.value` if the query targets this modifier's stat.
    fn handle(&self, sender: EntityId, query: &mut Query);

    /// Countdown, or `None` for a permanent modifier.
    fn timer(&self) -> Option<&CountdownTimer>;

    /// Mutable countdown, or `None` for a permanent modifier.
    fn timer_mut(&mut self) -> Option<&mut CountdownTimer>;

    /// Advances the countdown.
    fn update(&mut self, dt: f32) {
        if let Some(timer) = self.timer_mut() {
            timer.tick(dt);
        }
    }

    /// Returns true once the countdown has elapsed.
    fn is_marked_for_removal(&self) -> bool {
        self.timer().is_some_and(CountdownTimer::is_finished)
    }

    /// Returns true if the modifier never expires on its own.
    fn is_permanent(&self) -> bool {
        self.timer().is_none()
    }
}

/// Applies one [`ModifierOperation`] to a single stat.
#[derive(Debug, Clone)]
pub struct BasicStatsModifier {
    stat: StatType,
    operation: ModifierOperation,
    timer: Option<CountdownTimer>,
}

impl BasicStatsModifier {
    /// Creates a modifier. A `duration <= 0` makes it permanent.
    #[must_use]
    pub fn new(stat: StatType, duration: f32, operation: ModifierOperation) -> Self {
        let timer = (duration > 0.0).then(|| CountdownTimer::new(duration));
        Self {
            stat,
            operation,
            timer,
        }
    }

    /// Flat additive modifier.
    #[must_use]
    pub fn add(stat: StatType, duration: f32, amount: f32) -> Self {
        Self::new(stat, duration, ModifierOperation::Add(amount))
    }

    /// Multiplicative modifier.
    #[must_use]
    pub fn multiply(stat: StatType, duration: f32, factor: f32) -> Self {
        Self::new(stat, duration, ModifierOperation::Multiply(factor))
    }

    /// Percentage-of-base modifier.
    #[must_use]
    pub fn percentage(stat: StatType, duration: f32, base: f32, fraction: f32) -> Self {
        Self::new(stat, duration, ModifierOperation::Percentage { base, fraction })
    }

    /// Builds a modifier from a declarative operator.
    ///
    /// `base_value` is only read for [`OperatorType::Percentage`].
    #[must_use]
    pub fn from_spec(
        stat: StatType,
        duration: f32,
        operator: OperatorType,
        value: f32,
        base_value: f32,
    ) -> Self {
        match operator {
            OperatorType::Add => Self::add(stat, duration, value),
            OperatorType::Multiply => Self::multiply(stat, duration, value),
            OperatorType::Percentage => Self::percentage(stat, duration, base_value, value),
        }
    }

    /// Targeted stat.
    #[must_use]
    pub fn stat(&self) -> StatType {
        self.stat
    }

    /// Operation applied on match.
    #[must_use]
    pub fn operation(&self) -> &ModifierOperation {
        &self.operation
    }
}

impl StatModifier for BasicStatsModifier {
    fn handle(&self, _sender: EntityId, query: &mut Query) {
        if query.stat() == self.stat {
            query.value = self.operation.apply(query.value);
        }
    }

    fn timer(&self) -> Option<&CountdownTimer> {
        self.timer.as_ref()
    }

    fn timer_mut(&mut self) -> Option<&mut CountdownTimer> {
        self.timer.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operations() {
        assert_eq!(ModifierOperation::Add(5.0).apply(10.0), 15.0);
        assert_eq!(ModifierOperation::Multiply(2.0).apply(10.0), 20.0);
        let pct = ModifierOperation::Percentage {
            base: 100.0,
            fraction: 0.5,
        };
        assert_eq!(pct.apply(150.0), 200.0);
        let custom = ModifierOperation::Custom(Rc::new(|v| v.max(3.0)));
        assert_eq!(custom.apply(1.0), 3.0);
    }

    #[test]
    fn test_handle_ignores_other_stats() {
        let sender = EntityId::new();
        let modifier = BasicStatsModifier::add(StatType::MoveSpeed, -1.0, 5.0);

        let mut query = Query::new(StatType::Health, 10.0);
        modifier.handle(sender, &mut query);
        assert_eq!(query.value, 10.0);

        let mut query = Query::new(StatType::MoveSpeed, 10.0);
        modifier.handle(sender, &mut query);
        assert_eq!(query.value, 15.0);
    }

    #[test]
    fn test_lifetime() {
        let mut permanent = BasicStatsModifier::add(StatType::Health, 0.0, 1.0);
        assert!(permanent.is_permanent());
        permanent.update(1000.0);
        assert!(!permanent.is_marked_for_removal());

        let mut timed = BasicStatsModifier::add(StatType::Health, 1.0, 1.0);
        assert!(!timed.is_permanent());
        timed.update(0.6);
        assert!(!timed.is_marked_for_removal());
        timed.update(0.6);
        assert!(timed.is_marked_for_removal());
    }

    #[test]
    fn test_from_spec_percentage_uses_base() {
        let modifier = BasicStatsModifier::from_spec(
            StatType::Health,
            -1.0,
            OperatorType::Percentage,
            0.25,
            40.0,
        );
        let mut query = Query::new(StatType::Health, 100.0);
        modifier.handle(EntityId::new(), &mut query);
        assert_eq!(query.value, 110.0);
    }
}
