//! Combat event bus.
//!
//! Whoever applies damage announces it with [`CombatEventBus::report_damage`];
//! every subscribed [`DamageListener`] sees the event synchronously, in
//! subscription order. The bus holds listeners weakly, so an effect that has
//! been dropped can never fire again.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, warn};
use vanguard_common::{EffectError, ElementKind, EntityId};

use crate::combatant::CombatantRef;

/// A damage event as seen by listeners.
#[derive(Clone)]
pub struct DamageEvent {
    /// Entity that dealt the damage.
    pub attacker: EntityId,
    /// Entity that received it.
    pub target: CombatantRef,
    /// Amount dealt.
    pub damage: f32,
    /// Element of the hit. `None` for plain damage.
    pub element: ElementKind,
}

impl fmt::Debug for DamageEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DamageEvent")
            .field("attacker", &self.attacker)
            .field("target", &self.target.id())
            .field("damage", &self.damage)
            .field("element", &self.element)
            .finish()
    }
}

/// Reacts to damage events.
///
/// The bus does no filtering; listeners check the attacker themselves.
pub trait DamageListener {
    /// Handles one event. An error is logged and does not stop the broadcast.
    fn on_damage_dealt(&self, event: &DamageEvent) -> Result<(), EffectError>;
}

impl<F> DamageListener for F
where
    F: Fn(&DamageEvent) -> Result<(), EffectError>,
{
    fn on_damage_dealt(&self, event: &DamageEvent) -> Result<(), EffectError> {
        self(event)
    }
}

/// Subscription handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Multicast channel for damage events.
#[derive(Default)]
pub struct CombatEventBus {
    listeners: RefCell<Vec<(ListenerId, Weak<dyn DamageListener>)>>,
    next_id: Cell<u64>,
    events_reported: Cell<u64>,
}

impl CombatEventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener at the end of the invocation order.
    pub fn subscribe(&self, listener: Weak<dyn DamageListener>) -> ListenerId {
        let id = ListenerId(self.next_id.get() + 1);
        self.next_id.set(id.0);
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    /// Removes a listener. Returns false if it was not subscribed.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    /// Returns true if the listener is still subscribed.
    #[must_use]
    pub fn is_subscribed(&self, id: ListenerId) -> bool {
        self.listeners.borrow().iter().any(|(lid, _)| *lid == id)
    }

    /// Number of subscribed listeners that are still alive.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|(_, l)| l.strong_count() > 0)
            .count()
    }

    /// Total number of events reported, nested reports included.
    #[must_use]
    pub fn events_reported(&self) -> u64 {
        self.events_reported.get()
    }

    /// Broadcasts a damage event.
    ///
    /// Iterates a snapshot of the subscriber list. Listeners added during the
    /// broadcast wait for the next event; listeners removed during it are
    /// skipped if they have not run yet.
    pub fn report_damage(
        &self,
        attacker: EntityId,
        target: &CombatantRef,
        damage: f32,
        element: ElementKind,
    ) {
        self.events_reported.set(self.events_reported.get() + 1);
        let event = DamageEvent {
            attacker,
            target: Rc::clone(target),
            damage,
            element,
        };
        debug!("Damage {:?}", event);

        let snapshot: Vec<(ListenerId, Weak<dyn DamageListener>)> =
            self.listeners.borrow().clone();
        for (id, weak) in snapshot {
            if !self.is_subscribed(id) {
                continue;
            }
            let Some(listener) = weak.upgrade() else {
                continue;
            };
            if let Err(e) = listener.on_damage_dealt(&event) {
                warn!("Damage listener {:?} failed: {}", id, e);
            }
        }

        self.listeners
            .borrow_mut()
            .retain(|(_, l)| l.strong_count() > 0);
    }

    /// Broadcasts a plain (non-elemental) damage event.
    pub fn report_physical_damage(&self, attacker: EntityId, target: &CombatantRef, damage: f32) {
        self.report_damage(attacker, target, damage, ElementKind::None);
    }
}

impl fmt::Debug for CombatEventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombatEventBus")
            .field("listeners", &self.listeners.borrow().len())
            .field("events_reported", &self.events_reported.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockCombatant;
    use glam::Vec3;

    type Log = Rc<RefCell<Vec<&'static str>>>;

    fn recorder(log: &Log, name: &'static str) -> Rc<dyn DamageListener> {
        let log = Rc::clone(log);
        Rc::new(move |_: &DamageEvent| -> Result<(), EffectError> {
            log.borrow_mut().push(name);
            Ok(())
        })
    }

    fn target() -> CombatantRef {
        MockCombatant::enemy(Vec3::ZERO, 10.0)
    }

    #[test]
    fn test_fan_out_in_subscription_order() {
        let bus = CombatEventBus::new();
        let log: Log = Rc::default();
        let a = recorder(&log, "a");
        let b = recorder(&log, "b");
        let c = recorder(&log, "c");
        bus.subscribe(Rc::downgrade(&a));
        bus.subscribe(Rc::downgrade(&b));
        bus.subscribe(Rc::downgrade(&c));

        bus.report_physical_damage(EntityId::new(), &target(), 1.0);
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
        assert_eq!(bus.events_reported(), 1);
    }

    #[test]
    fn test_self_unsubscribe_mid_broadcast() {
        let bus = Rc::new(CombatEventBus::new());
        let log: Log = Rc::default();
        let a = recorder(&log, "a");
        bus.subscribe(Rc::downgrade(&a));

        let own_id: Rc<Cell<Option<ListenerId>>> = Rc::default();
        let b: Rc<dyn DamageListener> = {
            let log = Rc::clone(&log);
            let bus = Rc::clone(&bus);
            let own_id = Rc::clone(&own_id);
            Rc::new(move |_: &DamageEvent| -> Result<(), EffectError> {
                log.borrow_mut().push("b");
                if let Some(id) = own_id.get() {
                    bus.unsubscribe(id);
                }
                Ok(())
            })
        };
        own_id.set(Some(bus.subscribe(Rc::downgrade(&b))));

        let c = recorder(&log, "c");
        bus.subscribe(Rc::downgrade(&c));

        bus.report_physical_damage(EntityId::new(), &target(), 1.0);
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);

        bus.report_physical_damage(EntityId::new(), &target(), 1.0);
        assert_eq!(*log.borrow(), vec!["a", "b", "c", "a", "c"]);
        assert_eq!(bus.listener_count(), 2);
    }

    #[test]
    fn test_listener_removed_before_its_turn_is_skipped() {
        let bus = Rc::new(CombatEventBus::new());
        let log: Log = Rc::default();
        let c = recorder(&log, "c");
        let c_id: Rc<Cell<Option<ListenerId>>> = Rc::default();

        let a: Rc<dyn DamageListener> = {
            let log = Rc::clone(&log);
            let bus = Rc::clone(&bus);
            let c_id = Rc::clone(&c_id);
            Rc::new(move |_: &DamageEvent| -> Result<(), EffectError> {
                log.borrow_mut().push("a");
                if let Some(id) = c_id.get() {
                    bus.unsubscribe(id);
                }
                Ok(())
            })
        };
        bus.subscribe(Rc::downgrade(&a));
        c_id.set(Some(bus.subscribe(Rc::downgrade(&c))));

        bus.report_physical_damage(EntityId::new(), &target(), 1.0);
        assert_eq!(*log.borrow(), vec!["a"]);
    }

    #[test]
    fn test_listener_added_mid_broadcast_waits() {
        let bus = Rc::new(CombatEventBus::new());
        let log: Log = Rc::default();
        let late = recorder(&log, "late");

        let adder: Rc<dyn DamageListener> = {
            let log = Rc::clone(&log);
            let bus = Rc::clone(&bus);
            let late = Rc::downgrade(&late);
            let added = Cell::new(false);
            Rc::new(move |_: &DamageEvent| -> Result<(), EffectError> {
                log.borrow_mut().push("adder");
                if !added.replace(true) {
                    bus.subscribe(late.clone());
                }
                Ok(())
            })
        };
        bus.subscribe(Rc::downgrade(&adder));

        bus.report_physical_damage(EntityId::new(), &target(), 1.0);
        assert_eq!(*log.borrow(), vec!["adder"]);
        bus.report_physical_damage(EntityId::new(), &target(), 1.0);
        assert_eq!(*log.borrow(), vec!["adder", "adder", "late"]);
    }

    #[test]
    fn test_failing_listener_is_isolated() {
        let bus = CombatEventBus::new();
        let log: Log = Rc::default();
        let failing: Rc<dyn DamageListener> = Rc::new(|_: &DamageEvent| -> Result<(), EffectError> {
            Err(EffectError::ListenerFailed("boom".to_string()))
        });
        let after = recorder(&log, "after");
        bus.subscribe(Rc::downgrade(&failing));
        bus.subscribe(Rc::downgrade(&after));

        bus.report_physical_damage(EntityId::new(), &target(), 1.0);
        assert_eq!(*log.borrow(), vec!["after"]);
    }

    #[test]
    fn test_dropped_listener_never_fires() {
        let bus = CombatEventBus::new();
        let log: Log = Rc::default();
        let a = recorder(&log, "a");
        bus.subscribe(Rc::downgrade(&a));
        assert_eq!(bus.listener_count(), 1);

        drop(a);
        assert_eq!(bus.listener_count(), 0);
        bus.report_physical_damage(EntityId::new(), &target(), 1.0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_event_fields_pass_through() {
        let bus = CombatEventBus::new();
        let seen: Rc<RefCell<Option<(EntityId, EntityId, f32, ElementKind)>>> = Rc::default();
        let listener: Rc<dyn DamageListener> = {
            let seen = Rc::clone(&seen);
            Rc::new(move |e: &DamageEvent| -> Result<(), EffectError> {
                *seen.borrow_mut() = Some((e.attacker, e.target.id(), e.damage, e.element));
                Ok(())
            })
        };
        bus.subscribe(Rc::downgrade(&listener));

        let attacker = EntityId::new();
        let target = target();
        bus.report_damage(attacker, &target, 7.5, ElementKind::Fire);
        assert_eq!(
            *seen.borrow(),
            Some((attacker, target.id(), 7.5, ElementKind::Fire))
        );
    }
}
