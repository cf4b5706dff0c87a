//! # Example: order_events
//!
//! Order lifecycle driven by a [`StateMachine`] whose transitions publish on
//! an [`EventBus`], observed by the built-in [`LogWriter`] and a custom
//! subscriber.
//!
//! Demonstrates how to:
//! - Attach [`LogWriter`] (requires the `logging` feature).
//! - Publish from transition effects.
//! - Use a one-shot topic and read [`PublishReport`] failures.
//!
//! ## Flow
//! ```text
//! fire("pay") ──► effect ──► bus.publish("order.paid")   ──► LogWriter, Fulfilment
//! fire("ship") ─► effect ──► bus.publish("order.shipped") ─► LogWriter (one-shot)
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example order_events --features logging
//! ```

use std::sync::Arc;

use dispatchkit::{EventBus, LogWriter, PublishReport, StateMachine, Subscribe, SubscriberError};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Debug, Clone)]
struct Order {
    id: u32,
    items: u32,
}

/// Refuses orders without items.
struct Fulfilment;

impl Subscribe<Order> for Fulfilment {
    fn on_event(&self, _topic: &str, order: &Order) -> Result<(), SubscriberError> {
        if order.items == 0 {
            return Err(SubscriberError::Rejected {
                reason: format!("order {} has no items", order.id),
            });
        }
        println!("[fulfilment] packing order {} ({} items)", order.id, order.items);
        Ok(())
    }

    fn name(&self) -> &str {
        "fulfilment"
    }
}

fn report(r: PublishReport) {
    match r.into_result() {
        Ok(n) => println!("[bus] delivered to {n} subscriber(s)"),
        Err(e) => println!("[bus] {e}"),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let bus: Arc<EventBus<Order>> = Arc::new(EventBus::new());
    bus.subscribe("order.paid", Arc::new(LogWriter::new()));
    bus.subscribe("order.paid", Arc::new(Fulfilment));
    bus.subscribe("order.shipped", Arc::new(LogWriter::new()));
    bus.set_one_shot("order.shipped", true);

    let paid = Arc::clone(&bus);
    let shipped = Arc::clone(&bus);
    let mut order: StateMachine<Order> = StateMachine::builder("created")
        .state("created", |s| {
            s.on_with("pay", "paid", move |_, o| report(paid.publish("order.paid", o)))
                .on("cancel", "cancelled")
        })
        .state("paid", |s| {
            s.on_with("ship", "shipped", move |_, o| report(shipped.publish("order.shipped", o)))
        })
        .terminal("shipped")
        .terminal("cancelled")
        .build()?;

    let _ = order.fire("pay", &Order { id: 7, items: 0 });
    let _ = order.fire("ship", &Order { id: 7, items: 0 });

    // one-shot: nobody listens any more
    report(bus.publish("order.shipped", &Order { id: 8, items: 1 }));
    println!("final state: {}, topics: {:?}", order.state(), bus.topics());
    Ok(())
}
