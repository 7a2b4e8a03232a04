//! Message bus delivery contract.

use cityhud_core::{
    bus::{MessageBus, MessageHandler},
    error::SimError,
    event::{EventKind, SimEvent, Tier},
    ledger::{CityLedger, TierCounts},
};
use std::{cell::RefCell, rc::Rc};

type Log = Rc<RefCell<Vec<String>>>;

fn recorder(log: &Log, tag: &'static str) -> impl Fn(&SimEvent, &MessageBus) + 'static {
    let log = Rc::clone(log);
    move |event, _bus| log.borrow_mut().push(format!("{tag}:{}", event.kind()))
}

#[test]
fn handlers_run_in_registration_order() {
    let bus = MessageBus::new();
    let log: Log = Rc::default();
    bus.subscribe(EventKind::OfficerAdded, recorder(&log, "h1"));
    bus.subscribe(EventKind::OfficerAdded, recorder(&log, "h2"));

    assert_eq!(bus.publish(SimEvent::OfficerAdded).unwrap(), 2);
    assert_eq!(*log.borrow(), ["h1:officer_added", "h2:officer_added"]);
}

#[test]
fn publish_without_subscribers_is_a_no_op() {
    let bus = MessageBus::new();
    assert_eq!(bus.publish(SimEvent::MoneyUpdated { amount: 5 }).unwrap(), 0);
}

#[test]
fn only_handlers_of_the_published_kind_run() {
    let bus = MessageBus::new();
    let log: Log = Rc::default();
    bus.subscribe(EventKind::MoneyUpdated, recorder(&log, "money"));
    bus.subscribe(EventKind::OfficerAdded, recorder(&log, "officer"));

    bus.publish(SimEvent::OfficerAdded).unwrap();
    assert_eq!(*log.borrow(), ["officer:officer_added"]);
}

#[test]
fn duplicate_registration_means_duplicate_delivery() {
    let bus = MessageBus::new();
    let ledger = CityLedger::new().attach(&bus);
    bus.attach(EventKind::CityTransition, &ledger);

    bus.publish(SimEvent::CityTransition { old: Tier::New, new: Tier::Town }).unwrap();
    assert_eq!(ledger.borrow().counts().towns, 2);
}

#[test]
fn nested_publish_completes_before_outer_continues() {
    let bus = MessageBus::new();
    let log: Log = Rc::default();

    let inner_log = Rc::clone(&log);
    bus.subscribe(EventKind::OfficerAdded, move |_event, bus| {
        inner_log.borrow_mut().push("h1:start".into());
        bus.publish(SimEvent::MoneyUpdated { amount: 1 }).unwrap();
        inner_log.borrow_mut().push("h1:end".into());
    });
    bus.subscribe(EventKind::OfficerAdded, recorder(&log, "h2"));
    bus.subscribe(EventKind::MoneyUpdated, recorder(&log, "nested"));

    bus.publish(SimEvent::OfficerAdded).unwrap();
    assert_eq!(
        *log.borrow(),
        ["h1:start", "nested:money_updated", "h1:end", "h2:officer_added"]
    );
}

#[test]
fn unsubscribe_removes_exactly_one_registration() {
    let bus = MessageBus::new();
    let log: Log = Rc::default();
    let first = bus.subscribe(EventKind::OfficerAdded, recorder(&log, "a"));
    bus.subscribe(EventKind::OfficerAdded, recorder(&log, "b"));

    assert!(bus.unsubscribe(first));
    assert!(!bus.unsubscribe(first));
    assert_eq!(bus.subscriber_count(EventKind::OfficerAdded), 1);

    bus.publish(SimEvent::OfficerAdded).unwrap();
    assert_eq!(*log.borrow(), ["b:officer_added"]);
}

#[test]
fn handler_may_subscribe_during_dispatch_without_seeing_current_message() {
    let bus = MessageBus::new();
    let log: Log = Rc::default();
    let late_log = Rc::clone(&log);
    bus.subscribe(EventKind::OfficerAdded, move |_event, bus| {
        bus.subscribe(EventKind::OfficerAdded, recorder(&late_log, "late"));
    });

    assert_eq!(bus.publish(SimEvent::OfficerAdded).unwrap(), 1);
    assert!(log.borrow().is_empty());
    assert_eq!(bus.publish(SimEvent::OfficerAdded).unwrap(), 2);
    assert_eq!(*log.borrow(), ["late:officer_added"]);
}

#[test]
fn publish_cycle_fails_fast_at_depth_limit() {
    let bus = MessageBus::with_max_depth(4);
    let calls = Rc::new(RefCell::new(0u32));
    let counter = Rc::clone(&calls);
    bus.subscribe(EventKind::OfficerAdded, move |event, bus| {
        *counter.borrow_mut() += 1;
        let _ = bus.publish(event.clone());
    });

    let err = bus.publish(SimEvent::OfficerAdded).unwrap_err();
    assert!(matches!(
        err,
        SimError::DispatchDepthExceeded { kind: EventKind::OfficerAdded, depth: 5 }
    ));
    assert_eq!(*calls.borrow(), 4);

    // The guard resets once the outermost publish returns.
    bus.subscribe(EventKind::MoneyUpdated, |_, _| {});
    assert_eq!(bus.publish(SimEvent::MoneyUpdated { amount: 0 }).unwrap(), 1);
}

#[test]
fn dropped_consumer_stops_receiving() {
    let bus = MessageBus::new();
    let ledger = CityLedger::new().attach(&bus);
    let weak = Rc::downgrade(&ledger);
    drop(ledger);

    assert!(weak.upgrade().is_none());
    assert_eq!(
        bus.publish(SimEvent::CityTransition { old: Tier::New, new: Tier::Town }).unwrap(),
        1
    );
}

// ── String-keyed ingress ───────────────────────────────────────────

#[test]
fn raw_publish_decodes_known_kinds() {
    let bus = MessageBus::new();
    let ledger = CityLedger::new().attach(&bus);

    let delivered = bus
        .publish_raw(
            "city_transition",
            serde_json::json!({ "old": "new", "new": "city" }),
        )
        .unwrap();

    assert_eq!(delivered, 1);
    assert_eq!(ledger.borrow().counts(), TierCounts { towns: 0, cities: 1, metros: 0 });
}

#[test]
fn raw_publish_of_unknown_kind_is_a_no_op() {
    let bus = MessageBus::new();
    let log: Log = Rc::default();
    for kind in EventKind::ALL {
        bus.subscribe(kind, recorder(&log, "any"));
    }
    assert_eq!(bus.publish_raw("tile_generated", serde_json::json!({})).unwrap(), 0);
    assert!(log.borrow().is_empty());
}

#[test]
fn malformed_payload_is_dropped_silently() {
    let bus = MessageBus::new();
    let ledger = CityLedger::new().attach(&bus);

    let bad_payloads = [
        serde_json::json!({ "old": "new" }),
        serde_json::json!({ "old": "hamlet", "new": "town" }),
        serde_json::json!({ "old": 1, "new": 2 }),
        serde_json::json!("town"),
    ];
    for payload in bad_payloads {
        assert_eq!(bus.publish_raw("city_transition", payload).unwrap(), 0);
    }
    assert_eq!(*ledger.borrow(), CityLedger::new());
}

#[test]
fn consumer_registered_for_foreign_kind_ignores_it() {
    struct Strict(u32);
    impl MessageHandler for Strict {
        fn on_message(&mut self, event: &SimEvent) {
            match event {
                SimEvent::CityTransition { .. } => self.0 += 1,
                _ => {}
            }
        }
    }

    let bus = MessageBus::new();
    let strict = Rc::new(RefCell::new(Strict(0)));
    bus.attach(EventKind::MoneyUpdated, &strict);

    assert_eq!(bus.publish(SimEvent::MoneyUpdated { amount: 640 }).unwrap(), 1);
    assert_eq!(strict.borrow().0, 0);
}
