//! Services shared by every effect of one simulation.

use std::rc::Rc;

use crate::events::CombatEventBus;
use crate::registry::EffectRegistry;

/// The bus and registry effects are built against.
///
/// Cloning is cheap; clones share the same bus and registry.
#[derive(Debug, Clone, Default)]
pub struct CombatContext {
    /// Damage event bus.
    pub bus: Rc<CombatEventBus>,
    /// Published effect state and reentrancy guards.
    pub registry: Rc<EffectRegistry>,
}

impl CombatContext {
    /// Creates a fresh bus and registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
