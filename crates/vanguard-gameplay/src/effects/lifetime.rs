//! Stack count and duration bookkeeping shared by every effect variant.

use std::cell::Cell;
use tracing::{debug, info};
use vanguard_common::{EffectInstanceId, EntityId};

use crate::registry::EffectKind;
use crate::timer::countdown_elapsed;

/// How an effect treats a stack change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackPolicy {
    /// Every change adds at least one stack.
    AtLeastOne,
    /// Changes are applied as given; the effect ends at zero stacks.
    Signed,
}

impl StackPolicy {
    /// Normalizes a requested stack change.
    #[must_use]
    pub const fn normalize(self, count: i32) -> i32 {
        match self {
            Self::AtLeastOne if count < 1 => 1,
            _ => count,
        }
    }
}

/// Stacks, duration countdown and the disposed flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StackLifetime {
    stacks: i32,
    duration: f32,
    timer: f32,
    disposed: bool,
    policy: StackPolicy,
}

impl StackLifetime {
    /// Creates an active lifetime. A negative `duration` never expires.
    #[must_use]
    pub fn new(initial_stacks: i32, duration: f32, policy: StackPolicy) -> Self {
        Self {
            stacks: initial_stacks.max(1),
            duration,
            timer: duration,
            disposed: false,
            policy,
        }
    }

    /// Current stacks.
    #[must_use]
    pub const fn stacks(&self) -> i32 {
        self.stacks
    }

    /// Configured duration, negative when permanent.
    #[must_use]
    pub const fn duration(&self) -> f32 {
        self.duration
    }

    /// Remaining seconds.
    #[must_use]
    pub const fn remaining(&self) -> f32 {
        self.timer
    }

    /// Returns true once disposed.
    #[must_use]
    pub const fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Applies a stack change. Returns false if the effect should now end.
    pub fn add_stacks(&mut self, count: i32) -> bool {
        self.stacks += self.policy.normalize(count);
        self.stacks > 0
    }

    /// Sheds up to `count` stacks regardless of policy. Returns false if the
    /// effect should now end.
    pub fn remove_stacks(&mut self, count: i32) -> bool {
        self.stacks -= count.max(0);
        self.stacks > 0
    }

    /// Counts down. Returns true when the effect should now end.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.duration < 0.0 || self.disposed {
            return false;
        }
        self.timer -= dt;
        countdown_elapsed(self.timer, self.duration)
    }

    /// Marks the lifetime disposed. Returns true only on the first call.
    pub fn mark_disposed(&mut self) -> bool {
        !std::mem::replace(&mut self.disposed, true)
    }
}

/// Identity plus lifetime of one effect instance.
///
/// Effects are shared through `Rc` and mutate through `&self`, so the
/// lifetime sits in a `Cell`.
#[derive(Debug)]
pub struct EffectCore {
    id: EffectInstanceId,
    owner: EntityId,
    kind: EffectKind,
    life: Cell<StackLifetime>,
}

impl EffectCore {
    /// Creates the core for a new instance.
    #[must_use]
    pub fn new(kind: EffectKind, owner: EntityId, initial_stacks: i32, duration: f32) -> Self {
        let policy = if kind.supports_stack_removal() {
            StackPolicy::Signed
        } else {
            StackPolicy::AtLeastOne
        };
        let core = Self {
            id: EffectInstanceId::next(),
            owner,
            kind,
            life: Cell::new(StackLifetime::new(initial_stacks, duration, policy)),
        };
        info!(
            "{} {} created for {} with {} stacks",
            kind,
            core.id,
            owner,
            core.stacks()
        );
        core
    }

    /// Instance id.
    #[must_use]
    pub fn id(&self) -> EffectInstanceId {
        self.id
    }

    /// Owning entity.
    #[must_use]
    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// Effect kind.
    #[must_use]
    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    /// Current stacks.
    #[must_use]
    pub fn stacks(&self) -> i32 {
        self.life.get().stacks()
    }

    /// Snapshot of the lifetime.
    #[must_use]
    pub fn lifetime(&self) -> StackLifetime {
        self.life.get()
    }

    /// Returns true once disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.life.get().is_disposed()
    }

    /// Applies a stack change. Returns false if the effect should now end.
    pub fn add_stacks(&self, count: i32) -> bool {
        let mut life = self.life.get();
        let alive = life.add_stacks(count);
        self.life.set(life);
        debug!("{} {} now has {} stacks", self.kind, self.id, life.stacks());
        alive
    }

    /// Sheds stacks regardless of policy. Returns false if the effect should
    /// now end.
    pub fn remove_stacks(&self, count: i32) -> bool {
        let mut life = self.life.get();
        let alive = life.remove_stacks(count);
        self.life.set(life);
        debug!("{} {} shed to {} stacks", self.kind, self.id, life.stacks());
        alive
    }

    /// Counts down. Returns true when the effect should now end.
    pub fn tick(&self, dt: f32) -> bool {
        let mut life = self.life.get();
        let expired = life.tick(dt);
        self.life.set(life);
        expired
    }

    /// Marks the instance disposed. Returns true only on the first call.
    pub fn begin_dispose(&self) -> bool {
        let mut life = self.life.get();
        let first = life.mark_disposed();
        self.life.set(life);
        if first {
            info!("{} {} disposed", self.kind, self.id);
        }
        first
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policies() {
        assert_eq!(StackPolicy::AtLeastOne.normalize(-3), 1);
        assert_eq!(StackPolicy::AtLeastOne.normalize(0), 1);
        assert_eq!(StackPolicy::AtLeastOne.normalize(4), 4);
        assert_eq!(StackPolicy::Signed.normalize(-3), -3);
    }

    #[test]
    fn test_signed_can_end() {
        let mut life = StackLifetime::new(2, -1.0, StackPolicy::Signed);
        assert!(life.add_stacks(-1));
        assert_eq!(life.stacks(), 1);
        assert!(!life.add_stacks(-1));
    }

    #[test]
    fn test_removal_ignores_policy() {
        let mut life = StackLifetime::new(3, -1.0, StackPolicy::AtLeastOne);
        assert!(life.add_stacks(-2));
        assert_eq!(life.stacks(), 4);
        assert!(life.remove_stacks(2));
        assert_eq!(life.stacks(), 2);
        assert!(life.remove_stacks(0));
        assert!(!life.remove_stacks(2));
    }

    #[test]
    fn test_countdown() {
        let mut permanent = StackLifetime::new(1, -1.0, StackPolicy::AtLeastOne);
        assert!(!permanent.tick(100.0));

        let mut timed = StackLifetime::new(0, 1.0, StackPolicy::AtLeastOne);
        assert_eq!(timed.stacks(), 1);
        assert!(!timed.tick(0.5));
        assert!(timed.tick(0.5));
        assert!(timed.mark_disposed());
        assert!(!timed.mark_disposed());
        assert!(!timed.tick(0.5));
    }

    #[test]
    fn test_countdown_frame_steps() {
        let mut timed = StackLifetime::new(1, 1.0, StackPolicy::AtLeastOne);
        for _ in 0..4 {
            assert!(!timed.tick(0.2));
        }
        assert!(timed.tick(0.2));
    }
}
