//! Alert Watch Example
//!
//! Watches two lines with alert subscriptions: every transition is
//! reported, plus watchdog timeouts. Shows the loop draining and exiting
//! on its own once the handlers are gone.
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 02_alert_watch
//! ```

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use pulsebridge_core::{Bridge, BridgeError, EdgeKind, EventClass, Level, LineId, SimulatedGpio};

fn main() -> Result<(), BridgeError> {
    let gpio = SimulatedGpio::new();
    let bridge = Bridge::with_defaults();
    let mut event_loop = bridge.event_loop()?;
    let timeouts = Rc::new(Cell::new(0u32));

    for raw in [5, 6] {
        let timeouts = Rc::clone(&timeouts);
        event_loop.subscribe(
            &gpio,
            EventClass::Alert,
            raw,
            EdgeKind::Either,
            Box::new(move |line, level, tick| match level {
                Level::Timeout => {
                    timeouts.set(timeouts.get() + 1);
                    println!("{line}: watchdog at {tick}");
                }
                level => println!("{line}: {level:?} at {tick}"),
            }),
        )?;
    }

    let max_line = bridge.config().max_line;
    let (five, six) = (LineId::new(5, max_line)?, LineId::new(6, max_line)?);
    for level in [Level::Low, Level::High, Level::Low] {
        gpio.inject(five, level)?;
    }
    gpio.watchdog_timeout(six)?;

    event_loop.run_for(Duration::from_millis(100))?;
    println!("timeouts seen: {}", timeouts.get());

    for raw in [5, 6] {
        event_loop.unsubscribe(&gpio, EventClass::Alert, raw)?;
    }
    // Nothing holds the loop open any more.
    event_loop.run()?;
    println!("loop idle: {}", !event_loop.is_alive());
    Ok(())
}
