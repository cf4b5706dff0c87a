//! # Example: order_coupons
//!
//! Coupon dispatch for pre-ordered phones through a [`HandlerChain`].
//!
//! Demonstrates how to:
//! - Build a chain with a fallback handler at the tail.
//! - Enter the chain at a later node with `dispatch_from`.
//! - Defer a step, finish it on a tokio task and `resume` the dispatch.
//!
//! ## Flow
//! ```text
//! (kind, paid, stock) ──► deposit-500 ──► deposit-200 ──► normal
//!                          │ Result        │ Result        │ Result (always)
//!                          ▼               ▼               ▼
//!                       100 coupon       50 coupon     no coupon / out of stock
//!
//! async:  stock-check ──Deferred──► tokio::spawn(sleep; resume(Continue)) ──► normal
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example order_coupons
//! ```

use std::sync::Arc;
use std::time::Duration;

use dispatchkit::{Dispatch, HandlerChain, Outcome};

#[derive(Debug, Clone, Copy)]
struct Order {
    kind: u8,
    paid: bool,
    stock: u32,
}

fn coupon_chain() -> Result<HandlerChain<Order, &'static str>, dispatchkit::ChainError> {
    let mut chain = HandlerChain::new();
    chain.append_fn("deposit-500", |o: &Order, _| {
        if o.paid && o.kind == 1 {
            Outcome::Result("500 deposit: 100 coupon")
        } else {
            Outcome::Continue
        }
    })?;
    chain.append_fn("deposit-200", |o: &Order, _| {
        if o.paid && o.kind == 2 {
            Outcome::Result("200 deposit: 50 coupon")
        } else {
            Outcome::Continue
        }
    })?;
    chain.append_fn("normal", |o: &Order, _| {
        if o.stock > 0 {
            Outcome::Result("normal purchase: no coupon")
        } else {
            Outcome::Result("out of stock")
        }
    })?;
    Ok(chain)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Synchronous chain
    let chain = coupon_chain()?;
    for order in [
        Order { kind: 1, paid: true, stock: 500 },
        Order { kind: 2, paid: true, stock: 500 },
        Order { kind: 3, paid: true, stock: 500 },
        Order { kind: 1, paid: false, stock: 0 },
    ] {
        println!("{order:?} -> {:?}", chain.dispatch(order, ())?);
    }

    // 2. Skip ahead: start at the 200 deposit node
    if let Some(node) = chain.node(1) {
        let out = chain.dispatch_from(node, Order { kind: 1, paid: true, stock: 1 }, ())?;
        println!("from {} -> {out:?}", node.name());
    }

    // 3. Asynchronous step completed on a tokio task
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut chain: HandlerChain<Order, &'static str> = HandlerChain::new();
    chain.append_fn("stock-check", move |_, cx| match cx.defer() {
        Ok(token) => {
            println!("[stock-check] checking warehouse ...");
            let _ = tx.send(token.clone());
            Outcome::Deferred(token)
        }
        Err(_) => Outcome::Result("stock check unavailable"),
    })?;
    chain.append_fn("normal", |o, _| {
        Outcome::Result(if o.stock > 0 { "in stock: shipped" } else { "out of stock" })
    })?;
    let chain = Arc::new(chain);

    let first = chain.dispatch(Order { kind: 3, paid: true, stock: 7 }, ())?;
    println!("dispatch -> {first:?}");

    let worker = {
        let chain = Arc::clone(&chain);
        tokio::spawn(async move {
            let token = rx.recv().await?;
            tokio::time::sleep(Duration::from_millis(200)).await;
            println!("[worker] warehouse answered, resuming");
            chain.resume(token, Outcome::Continue).ok()
        })
    };

    match worker.await? {
        Some(Dispatch::Handled(msg)) => println!("resume -> {msg}"),
        other => println!("resume -> {other:?}"),
    }
    Ok(())
}
