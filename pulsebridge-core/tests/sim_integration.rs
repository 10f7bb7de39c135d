//! End-to-end tests through the simulated GPIO client
//!
//! Raw callbacks run on the simulator's delivery thread and reach handlers
//! on the test thread through the bridge.

#![cfg(all(test, feature = "sim"))]

mod common;

use std::time::Duration;

use pulsebridge_core::{
    time::FixedTicks, Bridge, BridgeError, EdgeKind, EventClass, GpioError, Level, SimulatedGpio,
};

use common::{line, pump_until, Recorder};

#[test]
fn isr_subscription_sees_matching_edges_only() {
    let gpio = SimulatedGpio::with_tick_source(31, FixedTicks::new(500));
    let bridge = Bridge::with_defaults();
    let mut event_loop = bridge.event_loop().unwrap();
    let recorder = Recorder::new();

    event_loop
        .subscribe(&gpio, EventClass::Isr, 18, EdgeKind::Rising, recorder.handler())
        .unwrap();

    gpio.inject_at(line(18), Level::Low, 600).unwrap();
    gpio.inject_at(line(18), Level::High, 700).unwrap();
    gpio.inject_at(line(18), Level::Low, 800).unwrap();
    gpio.inject_at(line(18), Level::High, 900).unwrap();

    assert!(pump_until(&mut event_loop, || recorder.len() == 2));
    assert_eq!(recorder.seen(), [(18, Level::High, 700), (18, Level::High, 900)]);
}

#[test]
fn alert_subscription_sees_every_transition_and_timeouts() {
    let gpio = SimulatedGpio::with_tick_source(31, FixedTicks::new(42));
    let bridge = Bridge::with_defaults();
    let mut event_loop = bridge.event_loop().unwrap();
    let recorder = Recorder::new();

    // The edge kind is ignored for alerts.
    event_loop
        .subscribe(&gpio, EventClass::Alert, 5, EdgeKind::Rising, recorder.handler())
        .unwrap();

    gpio.inject_at(line(5), Level::Low, 100).unwrap();
    gpio.inject_at(line(5), Level::High, 200).unwrap();
    gpio.watchdog_timeout(line(5)).unwrap();

    assert!(pump_until(&mut event_loop, || recorder.len() == 3));
    assert_eq!(
        recorder.seen(),
        [(5, Level::Low, 100), (5, Level::High, 200), (5, Level::Timeout, 42)]
    );
}

#[test]
fn unsubscribe_stops_delivery_and_drops_keepalive() {
    let gpio = SimulatedGpio::new();
    let bridge = Bridge::with_defaults();
    let mut event_loop = bridge.event_loop().unwrap();
    let recorder = Recorder::new();

    event_loop
        .subscribe(&gpio, EventClass::Isr, 22, EdgeKind::Either, recorder.handler())
        .unwrap();
    assert_eq!(event_loop.keepalive_count(), 1);
    assert_eq!(gpio.callback_count(), 1);

    gpio.inject(line(22), Level::Low).unwrap();
    assert!(pump_until(&mut event_loop, || recorder.len() == 1));

    let removed = event_loop.unsubscribe(&gpio, EventClass::Isr, 22).unwrap();
    assert!(removed.is_some());
    assert_eq!(event_loop.keepalive_count(), 0);
    assert_eq!(gpio.callback_count(), 0);
    assert!(!event_loop.registry(EventClass::Isr).channel(22).unwrap().has_handler());

    gpio.inject(line(22), Level::High).unwrap();
    event_loop.run_for(Duration::from_millis(50)).unwrap();
    assert_eq!(recorder.len(), 1);
}

#[test]
fn resubscribe_cancels_previous_raw_callback() {
    let gpio = SimulatedGpio::new();
    let bridge = Bridge::with_defaults();
    let mut event_loop = bridge.event_loop().unwrap();
    let first = Recorder::new();
    let second = Recorder::new();

    let old = event_loop
        .subscribe(&gpio, EventClass::Isr, 12, EdgeKind::Rising, first.handler())
        .unwrap();
    let new = event_loop
        .subscribe(&gpio, EventClass::Isr, 12, EdgeKind::Rising, second.handler())
        .unwrap();
    assert_ne!(old, new);
    assert_eq!(gpio.callback_count(), 1);

    gpio.inject(line(12), Level::Low).unwrap();
    gpio.inject(line(12), Level::High).unwrap();
    assert!(pump_until(&mut event_loop, || second.len() == 1));
    assert_eq!(first.len(), 0);
}

#[test]
fn rejected_subscription_restores_previous_handler() {
    let gpio = SimulatedGpio::with_tick_source(7, FixedTicks::new(0));
    let bridge = Bridge::with_defaults();
    let mut event_loop = bridge.event_loop().unwrap();
    let original = Recorder::new();
    let rejected = Recorder::new();
    event_loop.register_isr(20, Some(original.handler())).unwrap();

    // Line 20 is valid for the bridge but not for this client.
    let result = event_loop.subscribe(&gpio, EventClass::Isr, 20, EdgeKind::Rising, rejected.handler());
    assert!(matches!(result, Err(BridgeError::Gpio(GpioError { code: -2, .. }))));
    assert_eq!(event_loop.keepalive_count(), 1);

    bridge.publisher().publish_raw(EventClass::Isr, 20, 1, 3).unwrap();
    assert!(pump_until(&mut event_loop, || original.len() == 1));
    assert_eq!(rejected.len(), 0);
}

#[test]
fn subscribe_rejects_out_of_range_line() {
    let gpio = SimulatedGpio::new();
    let bridge = Bridge::with_defaults();
    let mut event_loop = bridge.event_loop().unwrap();

    let result = event_loop.subscribe(&gpio, EventClass::Isr, 32, EdgeKind::Rising, Box::new(|_, _, _| {}));
    assert_eq!(result, Err(BridgeError::InvalidLine { line: 32, max: 31 }));
    assert_eq!(gpio.callback_count(), 0);
}

#[test]
fn run_drains_pending_then_returns() {
    let bridge = Bridge::with_defaults();
    let mut event_loop = bridge.event_loop().unwrap();

    // No handler: the loop has no keepalive, only the pending wake.
    bridge.publisher().publish_raw(EventClass::Alert, 3, 1, 99).unwrap();
    assert!(event_loop.is_alive());
    assert_eq!(event_loop.run().unwrap(), 1);
    assert!(!event_loop.is_alive());
}
