//! Gesture polling demo
//!
//! Enables the gesture engine and prints every resolved motion.
//! Run with `RUST_LOG=debug` to see the driver's session logs.
//!
//! Usage: `gesture [/dev/i2c-N]`

use apds9960::{Apds9960, Error, Motion};

#[cfg(target_os = "linux")]
use linux_embedded_hal::{Delay, I2cdev};

#[cfg(target_os = "linux")]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/dev/i2c-1".to_string());
    let i2c = I2cdev::new(&path)?;
    let mut sensor = Apds9960::new_with_delay(i2c, Delay);

    println!("APDS-9960 Gesture Demo on {}", path);
    println!("=============================");

    if let Err(e) = sensor.init() {
        return Err(describe(e).into());
    }
    sensor.enable_gesture(false).map_err(describe)?;
    println!("Swipe a hand over the sensor (Ctrl+C to exit)");

    loop {
        if sensor.is_gesture_available().map_err(describe)? {
            match sensor.read_gesture() {
                Ok(Motion::None) => {}
                Ok(motion) => println!("{}", arrow(motion)),
                Err(e) => eprintln!("gesture read failed: {}", describe(e)),
            }
        }
        std::thread::sleep(std::time::Duration::from_millis(10));
    }
}

#[cfg(target_os = "linux")]
fn describe<E: std::fmt::Debug>(error: Error<E>) -> String {
    match error {
        Error::InvalidDeviceId { expected, found } => format!(
            "not an APDS-9960 (id 0x{:02X}, expected 0x{:02X})",
            found, expected
        ),
        other => format!("{:?}", other),
    }
}

fn arrow(motion: Motion) -> &'static str {
    match motion {
        Motion::Left => "<- LEFT",
        Motion::Right => "-> RIGHT",
        Motion::Up => "^ UP",
        Motion::Down => "v DOWN",
        Motion::Near => "NEAR",
        Motion::Far => "FAR",
        Motion::None => "NONE",
    }
}

#[cfg(not(target_os = "linux"))]
fn main() {
    println!("This demo requires Linux with I2C support.");
    let _ = arrow(Motion::None);
}
