//! DHT22 Read Example
//!
//! Reads a simulated DHT22 a few times on one event loop: a healthy sensor,
//! then one with a corrupted checksum, then one that never answers. Each
//! reading is printed as text and as JSON.
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run -p pulsebridge-dht --example 01_read_dht22
//! ```

use std::error::Error;

use pulsebridge_core::{Bridge, LineId, SimulatedGpio};
use pulsebridge_dht::{Dht22Device, Fault, SensorConfig, SensorReadSequencer};

const DHT_LINE: u32 = 4;

fn main() -> Result<(), Box<dyn Error>> {
    // Three polls are plenty for a simulated sensor.
    let config = SensorConfig::from_json_str(r#"{ "poll_attempts": 3 }"#)?;
    let bridge = Bridge::with_defaults();
    let mut event_loop = bridge.event_loop()?;
    let line = LineId::new(DHT_LINE, bridge.config().max_line)?;

    let devices = [
        ("healthy", Dht22Device::new(60.5, 20.1)),
        ("noisy", Dht22Device::new(48.2, -3.4).with_fault(Fault::FlipChecksumBit)),
        ("unplugged", Dht22Device::new(0.0, 0.0).with_fault(Fault::Silent)),
    ];

    let gpio = SimulatedGpio::new();
    let sequencer = SensorReadSequencer::new(&gpio, config);
    for (name, device) in devices {
        gpio.attach(line, device)?;
        let reading = sequencer.read_sensor(&mut event_loop, DHT_LINE)?;
        println!("{name:>9}: {reading}");
        println!("{:>9}  {}", "", serde_json::to_string(&reading)?);
    }
    Ok(())
}
