//! # Example: light_switch
//!
//! A lamp with four brightness levels driven by one button.
//!
//! Demonstrates how to:
//! - Declare states and transitions with [`StateMachine::builder`].
//! - Attach side effects that receive the transition and call arguments.
//! - Inspect the current state, accepted events and history.
//!
//! ## Flow
//! ```text
//!   off ──press──► weak ──press──► strong ──press──► super-strong
//!    ▲                                                    │
//!    └────────────────────────press───────────────────────┘
//!   any ──unplug──► unplugged (terminal)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example light_switch
//! ```

use dispatchkit::{Config, StateMachine, Transit};

/// Who pressed the button.
#[derive(Debug)]
struct Press {
    by: &'static str,
}

fn announce(t: &Transit<'_>, p: &Press) {
    println!("[{}] {t}", p.by);
}

fn main() -> Result<(), dispatchkit::MachineError> {
    let mut lamp: StateMachine<Press> = StateMachine::builder("off")
        .state("off", |s| s.on_with("press", "weak", announce).on("unplug", "unplugged"))
        .state("weak", |s| s.on_with("press", "strong", announce).on("unplug", "unplugged"))
        .state("strong", |s| {
            s.on_with("press", "super-strong", announce)
                .on("unplug", "unplugged")
        })
        .state("super-strong", |s| {
            s.on_with("press", "off", |t, p| println!("[{}] {t} (cooling down)", p.by))
                .on("unplug", "unplugged")
        })
        .terminal("unplugged")
        .with_config(Config {
            history_capacity: 8,
            ..Config::default()
        })
        .build()?;

    for by in ["alice", "bob", "alice", "bob", "carol"] {
        let _ = lamp.fire("press", &Press { by });
    }
    println!("state: {} (accepts: {:?})", lamp.state(), lamp.events().collect::<Vec<_>>());

    let _ = lamp.fire("unplug", &Press { by: "dave" });
    let ignored = lamp.fire("press", &Press { by: "erin" });
    println!("after unplug: {ignored:?}, terminal: {}", lamp.is_terminal());

    for r in lamp.history() {
        println!("#{} {} --{}--> {}", r.seq, r.from, r.event, r.to);
    }
    Ok(())
}
