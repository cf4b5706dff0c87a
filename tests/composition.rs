use std::sync::{Arc, Mutex};

use dispatchkit::{
    Config, Dispatch, EventBus, FailureKind, Fired, HandlerChain, Outcome, StateMachine, SubscriberError,
};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Order {
    kind: u8,
    paid: bool,
    stock: u32,
}

fn coupons() -> HandlerChain<Order, u32> {
    let mut chain = HandlerChain::new();
    chain
        .append_fn("deposit-500", |o: &Order, _| {
            if o.paid && o.kind == 1 { Outcome::Result(100) } else { Outcome::Continue }
        })
        .unwrap();
    chain
        .append_fn("deposit-200", |o: &Order, _| {
            if o.paid && o.kind == 2 { Outcome::Result(50) } else { Outcome::Continue }
        })
        .unwrap();
    chain
        .append_fn("normal", |o: &Order, _| {
            if o.stock > 0 { Outcome::Result(0) } else { Outcome::Continue }
        })
        .unwrap();
    chain
}

#[test]
fn test_coupon_chain_matches_reference_orders() {
    let chain = coupons();
    let cases = [
        (Order { kind: 1, paid: true, stock: 500 }, Dispatch::Handled(100)),
        (Order { kind: 2, paid: true, stock: 500 }, Dispatch::Handled(50)),
        (Order { kind: 3, paid: true, stock: 500 }, Dispatch::Handled(0)),
        (Order { kind: 1, paid: false, stock: 0 }, Dispatch::Unhandled),
    ];
    for (order, expected) in cases {
        assert_eq!(chain.dispatch(order, ()).unwrap(), expected, "{order:?}");
    }
}

#[test]
fn test_chain_results_are_published_on_the_bus() {
    let bus: Arc<EventBus<u32>> = Arc::new(EventBus::new());
    let granted = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&granted);
    bus.subscribe_fn("coupon.granted", "ledger", move |amount| {
        sink.lock().unwrap().push(*amount);
        Ok(())
    });

    let chain = coupons();
    for kind in [1, 2, 3] {
        let order = Order { kind, paid: true, stock: 1 };
        if let Dispatch::Handled(amount) = chain.dispatch(order, ()).unwrap() {
            let report = bus.publish("coupon.granted", &amount);
            assert!(report.is_clean());
        }
    }
    assert_eq!(*granted.lock().unwrap(), vec![100, 50, 0]);
}

#[test]
fn test_machine_effects_publish_and_dispatch() {
    let bus: Arc<EventBus<String>> = Arc::new(EventBus::new());
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    bus.subscribe_fn("lamp", "recorder", move |msg: &String| {
        sink.lock().unwrap().push(msg.clone());
        Ok(())
    });

    let chain = Arc::new(coupons());
    let on_bus = Arc::clone(&bus);
    let on_chain = Arc::clone(&chain);
    let mut m: StateMachine<Order> = StateMachine::builder("off")
        .state("off", |s| {
            s.on_with("press", "on", move |t, _| {
                let _ = on_bus.publish("lamp", &t.to_string());
            })
        })
        .state("on", |s| {
            s.on_with("price", "on", move |_, order| {
                let coupon = on_chain.dispatch(*order, ()).ok().and_then(Dispatch::into_value);
                assert_eq!(coupon, Some(50));
            })
            .on("press", "off")
        })
        .build()
        .unwrap();

    assert!(m.fire("press", &Order { kind: 0, paid: false, stock: 0 }).is_moved());
    assert!(m.fire("price", &Order { kind: 2, paid: true, stock: 0 }).is_moved());
    assert_eq!(m.state(), "on");
    assert_eq!(*log.lock().unwrap(), vec!["off --press--> on".to_string()]);
}

#[test]
fn test_subscriber_reentering_bus_and_failing() {
    let bus: Arc<EventBus<u32>> = Arc::new(EventBus::with_config(Config::default()));
    let inner = Arc::clone(&bus);
    bus.subscribe_fn("outer", "relay", move |n| {
        let report = inner.publish("inner", n);
        report
            .into_result()
            .map(|_| ())
            .map_err(|e| SubscriberError::fail(e.to_string()))
    });
    bus.subscribe_fn("inner", "picky", |n| {
        if *n % 2 == 0 {
            Ok(())
        } else {
            Err(SubscriberError::Rejected { reason: format!("{n} is odd") })
        }
    });

    assert!(bus.publish("outer", &2).is_clean());

    let report = bus.publish("outer", &3);
    assert_eq!(report.delivered(), 0);
    assert_eq!(report.failures().len(), 1);
    assert!(matches!(
        report.failures()[0].kind,
        FailureKind::Error(SubscriberError::Fail { .. })
    ));
}

#[test]
fn test_machine_ignores_unknown_event_and_keeps_state() {
    let mut m: StateMachine = StateMachine::builder("A")
        .state("A", |s| s.on("go", "B"))
        .terminal("B")
        .build()
        .unwrap();

    assert!(m.fire("go", &()).is_moved());
    assert_eq!(m.fire("go", &()), Fired::Ignored);
    assert_eq!(m.state(), "B");
}
