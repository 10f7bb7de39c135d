//! Edge Events Example
//!
//! Subscribes to rising edges on one line and feeds them from a producer
//! thread that toggles the simulated line, then prints what the consumer
//! saw.
//!
//! ## What You'll Learn
//!
//! - Attaching the single consumer to a bridge
//! - Subscribing a non-`Send` handler through a GPIO client
//! - Driving the loop until enough events have arrived
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 01_edge_events
//! ```

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use pulsebridge_core::{
    tick_diff, Bridge, BridgeError, EdgeKind, EventClass, GpioError, Level, LineId, SimulatedGpio,
};

const LINE: u32 = 17;
const PULSES: usize = 10;

fn main() -> Result<(), BridgeError> {
    let gpio = Arc::new(SimulatedGpio::new());
    let bridge = Bridge::with_defaults();
    let mut event_loop = bridge.event_loop()?;

    let ticks = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&ticks);
    event_loop.subscribe(
        &*gpio,
        EventClass::Isr,
        LINE,
        EdgeKind::Rising,
        Box::new(move |line, level, tick| {
            println!("{line} went {level:?} at tick {tick}");
            sink.borrow_mut().push(tick);
        }),
    )?;

    let line = LineId::new(LINE, bridge.config().max_line)?;
    let driver = Arc::clone(&gpio);
    let producer = thread::spawn(move || -> Result<(), GpioError> {
        for _ in 0..PULSES {
            driver.inject(line, Level::Low)?;
            thread::sleep(Duration::from_millis(2));
            driver.inject(line, Level::High)?;
            thread::sleep(Duration::from_millis(3));
        }
        Ok(())
    });

    while ticks.borrow().len() < PULSES && !producer.is_finished() {
        event_loop.run_once(Some(Duration::from_millis(100)))?;
    }
    // Edges queued just before the producer finished.
    event_loop.run_for(Duration::from_millis(50))?;
    producer.join().expect("producer thread panicked")?;
    event_loop.unsubscribe(&*gpio, EventClass::Isr, LINE)?;

    let ticks = ticks.borrow();
    let periods: Vec<u32> = ticks.windows(2).map(|w| tick_diff(w[1], w[0])).collect();
    println!("periods (us): {periods:?}");
    Ok(())
}
