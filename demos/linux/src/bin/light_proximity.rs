//! Ambient light and proximity demo
//!
//! Prints RGBC counts, estimated lux, color temperature and proximity.
//!
//! Usage: `light_proximity [/dev/i2c-N]`

#[cfg(target_os = "linux")]
use apds9960::{AlsGain, Apds9960, Error};
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

    let check = |e: Error<_>| format!("{:?}", e);
    sensor.init().map_err(check)?;
    sensor.enable_als(false).map_err(check)?;
    sensor.set_als_gain(AlsGain::Gain16x).map_err(check)?;
    sensor.enable_proximity(false).map_err(check)?;

    println!("APDS-9960 Light and Proximity Demo on {}", path);
    println!("   Clear     Red   Green    Blue       Lux   CCT(K)  Prox");

    loop {
        std::thread::sleep(std::time::Duration::from_millis(250));

        let rgbc = match sensor.read_rgbc_data() {
            Ok(rgbc) => rgbc,
            Err(Error::NotReady) => continue,
            Err(e) => {
                eprintln!("read failed: {:?}", e);
                continue;
            }
        };
        let proximity = sensor.read_proximity().map_err(check)?;
        let cct = rgbc
            .color_temperature()
            .map_or_else(|| "----".to_string(), |color| color.cct.to_string());

        println!(
            "{:8} {:7} {:7} {:7} {:9.2} {:>8} {:5}",
            rgbc.clear,
            rgbc.red,
            rgbc.green,
            rgbc.blue,
            rgbc.lux(),
            cct,
            proximity
        );
    }
}

#[cfg(not(target_os = "linux"))]
fn main() {
    println!("This demo requires Linux with I2C support.");
}
