//! Owning container for one owner's live effects.

use std::rc::Rc;
use tracing::warn;

use crate::effects::TimedEffect;
use crate::registry::EffectKind;

/// At most one live effect per [`EffectKind`].
///
/// Effects are ticked in insertion order. Everything still live is disposed
/// when the set is dropped.
#[derive(Default)]
pub struct EffectSet {
    effects: Vec<Rc<dyn TimedEffect>>,
}

impl EffectSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an effect, disposing any live effect of the same kind.
    ///
    /// Returns the replaced effect.
    pub fn insert(&mut self, effect: Rc<dyn TimedEffect>) -> Option<Rc<dyn TimedEffect>> {
        let kind = effect.kind();
        let replaced = self
            .effects
            .iter()
            .position(|e| e.kind() == kind)
            .map(|index| self.effects.remove(index));
        if let Some(old) = &replaced {
            warn!("Replacing {} {} with {}", kind, old.instance_id(), effect.instance_id());
            old.dispose();
        }
        if effect.is_disposed() {
            warn!("Ignoring disposed {} {}", kind, effect.instance_id());
        } else {
            self.effects.push(effect);
        }
        replaced
    }

    /// Live effect of a kind.
    #[must_use]
    pub fn get(&self, kind: EffectKind) -> Option<Rc<dyn TimedEffect>> {
        self.effects
            .iter()
            .find(|e| e.kind() == kind && !e.is_disposed())
            .cloned()
    }

    /// Live effect of a kind, as its concrete type.
    #[must_use]
    pub fn get_as<T: 'static>(&self, kind: EffectKind) -> Option<&T> {
        self.effects
            .iter()
            .find(|e| e.kind() == kind && !e.is_disposed())
            .and_then(|e| e.as_any().downcast_ref::<T>())
    }

    /// Returns true if a live effect of the kind is present.
    #[must_use]
    pub fn contains(&self, kind: EffectKind) -> bool {
        self.get(kind).is_some()
    }

    /// Number of live effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.iter().filter(|e| !e.is_disposed()).count()
    }

    /// Returns true if no effect is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Kinds of the live effects, in insertion order.
    #[must_use]
    pub fn kinds(&self) -> Vec<EffectKind> {
        self.effects
            .iter()
            .filter(|e| !e.is_disposed())
            .map(|e| e.kind())
            .collect()
    }

    /// Adds stacks to the live effect of a kind. Returns false if none is live.
    pub fn add_stacks(&self, kind: EffectKind, count: i32) -> bool {
        let Some(effect) = self.get(kind) else {
            return false;
        };
        effect.add_stack(count);
        true
    }

    /// Removes stacks from the live effect of a kind, disposing it once none
    /// are left. Returns true if the effect is still live afterwards.
    pub fn remove_stacks(&self, kind: EffectKind, count: i32) -> bool {
        let Some(effect) = self.get(kind) else {
            return false;
        };
        if count > 0 {
            effect.remove_stack(count);
        }
        !effect.is_disposed()
    }

    /// Ticks every effect and drops the ones that ended.
    ///
    /// Returns the kinds that ended this frame, including effects disposed
    /// from outside since the last update.
    pub fn update(&mut self, dt: f32) -> Vec<EffectKind> {
        for effect in &self.effects {
            effect.update(dt);
        }
        let mut ended = Vec::new();
        self.effects.retain(|e| {
            if e.is_disposed() {
                ended.push(e.kind());
                false
            } else {
                true
            }
        });
        ended
    }

    /// Disposes and drops every effect.
    pub fn dispose_all(&mut self) {
        for effect in self.effects.drain(..) {
            effect.dispose();
        }
    }
}

impl Drop for EffectSet {
    fn drop(&mut self) {
        self.dispose_all();
    }
}
