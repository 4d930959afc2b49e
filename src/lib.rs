//! # APDS-9960 Digital Proximity, Ambient Light, RGB and Gesture Sensor Driver
//!
//! This is a platform-agnostic Rust driver for the APDS-9960 proximity, ambient light,
//! RGB and gesture sensor, built using the [`embedded-hal`] traits for I2C communication.
//!
//! The APDS-9960 provides:
//! - Clear, Red, Green and Blue light channels
//! - Proximity detection with a programmable IR LED
//! - Gesture sensing through four directional photodiodes and a 32-dataset FIFO
//! - Interrupt support
//! - I2C interface (address 0x39)
//!
//! ## Features
//!
//! - **Gesture decoding** into up/down/left/right/near/far motions
//! - **Async/await support** with feature gating (optional)
//! - **RGBC and proximity** readings
//! - **Lux and color temperature** estimation
//! - **Logging** through `defmt` (`defmt-03` feature) or `log` (`log` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use apds9960::{Apds9960, Motion};
//!
//! # fn main() {
//! # let i2c = embedded_hal_mock::eh1::i2c::Mock::new(&[]);
//! # let delay = embedded_hal_mock::eh1::delay::NoopDelay::new();
//! let mut sensor = Apds9960::new_with_delay(i2c, delay);
//!
//! // Check the device id and load the power-up configuration
//! sensor.init().unwrap();
//!
//! // Start the gesture engine without interrupts
//! sensor.enable_gesture(false).unwrap();
//!
//! loop {
//!     if sensor.is_gesture_available().unwrap() {
//!         // Drains the FIFO until the hand has left, then decodes
//!         match sensor.read_gesture().unwrap() {
//!             Motion::None => {}
//!             motion => { /* handle the gesture */ }
//!         }
//!     }
//! }
//! # }
//! ```
//!
//! ## Async Usage
//!
//! Enable the `async` feature to use async/await patterns:
//!
//! ```toml
//! [dependencies]
//! apds9960 = { version = "0.1", features = ["async"] }
//! ```
//!
//! ```rust,ignore
//! use apds9960::Apds9960;
//!
//! let mut sensor = Apds9960::new_async_with_delay(i2c, delay);
//! sensor.init_async().await.unwrap();
//! sensor.enable_gesture_async(false).await.unwrap();
//!
//! // Yields to the executor between FIFO polls
//! let motion = sensor.read_gesture_async().await.unwrap();
//! ```
//!
//! [`embedded-hal`]: https://crates.io/crates/embedded-hal

#![no_std]
#![deny(missing_docs)]

mod fmt; // must be first module

pub mod gesture;
pub mod ll;

use embedded_hal::i2c::I2c;

#[cfg(feature = "async")]
use embedded_hal_async::i2c::I2c as AsyncI2c;

pub use gesture::{
    GestureCounters, GestureDelta, GestureSession, GestureState, Motion, Sample, SampleBatch,
    FIFO_CAPACITY,
};
pub use ll::{
    AlsGain, Config2, Control, Enable, Gconf2, Gconf4, GestureGain, GestureWaitTime, Gstatus,
    LedBoost, LedDrive, ProximityGain, Status, DEVICE_ID, I2C_ADDRESS,
};

use ll::*;

/// Pause between gesture FIFO polls, lets the device integrate more datasets
pub const FIFO_PAUSE_MS: u32 = 30;

/// Clear, red, green and blue channel counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct RgbcData {
    /// Clear channel
    pub clear: u16,
    /// Red channel
    pub red: u16,
    /// Green channel
    pub green: u16,
    /// Blue channel
    pub blue: u16,
}

/// Color temperature and chromaticity data
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorData {
    /// Correlated Color Temperature in Kelvin
    pub cct: u16,
    /// CIE 1931 x chromaticity coordinate
    pub x: f32,
    /// CIE 1931 y chromaticity coordinate
    pub y: f32,
}

impl RgbcData {
    /// Approximate illuminance in lux
    pub fn lux(&self) -> f32 {
        let r = self.red as f32;
        let g = self.green as f32;
        let b = self.blue as f32;

        (-0.32466 * r + 1.57837 * g - 0.73191 * b).max(0.0)
    }

    /// Color temperature and chromaticity, `None` when a channel is dark
    pub fn color_temperature(&self) -> Option<ColorData> {
        if self.red == 0 || self.green == 0 || self.blue == 0 {
            return None;
        }

        let r = self.red as f32;
        let g = self.green as f32;
        let b = self.blue as f32;

        // RGB to CIE 1931 XYZ, coefficients for the APDS-9960 filter response
        let x = -0.14282 * r + 1.54924 * g - 0.95641 * b;
        let y = -0.32466 * r + 1.57837 * g - 0.73191 * b;
        let z = -0.68202 * r + 0.77073 * g + 0.56332 * b;

        let sum = x + y + z;
        if sum == 0.0 {
            return None;
        }

        let x_chrom = x / sum;
        let y_chrom = y / sum;

        // McCamy's approximation for CCT
        let n = (x_chrom - 0.3320) / (0.1858 - y_chrom);
        let cct = 449.0 * libm::powf(n, 3.0) + 3525.0 * libm::powf(n, 2.0) + 6823.3 * n + 5520.33;

        Some(ColorData {
            cct: cct.clamp(1000.0, 25000.0) as u16,
            x: x_chrom,
            y: y_chrom,
        })
    }
}

/// Outcome of one gesture FIFO drain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum FifoDrain {
    /// The device holds no more gesture data, the interaction is over
    Complete,
    /// Gesture data is pending but the FIFO is still empty, poll again
    Empty,
    /// Datasets were appended; holds the number of datasets now in the batch
    Filled(usize),
}

/// All possible errors in this crate
#[derive(Debug)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Error<E> {
    /// I2C communication error
    I2c(E),
    /// Invalid device ID detected
    InvalidDeviceId {
        /// Expected device ID
        expected: u8,
        /// Found device ID
        found: u8,
    },
    /// Sensor data not ready
    NotReady,
    /// Gesture operation attempted while gesture mode is disabled
    GestureDisabled,
}

/// High-level APDS-9960 driver
pub struct Apds9960<I2C, Delay = ()> {
    i2c: I2C,
    delay: Delay,
    // Present while gesture mode is enabled
    session: Option<GestureSession>,
}

impl<I2C, E> Apds9960<I2C, ()>
where
    I2C: I2c<Error = E>,
{
    /// Create a new APDS-9960 driver instance without delay support
    ///
    /// Gesture reads need a delay provider, see [`Apds9960::new_with_delay`].
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            delay: (),
            session: None,
        }
    }
}

impl<I2C, E, Delay> Apds9960<I2C, Delay>
where
    I2C: I2c<Error = E>,
    Delay: embedded_hal::delay::DelayNs,
{
    /// Create a new APDS-9960 driver instance with delay support
    pub fn new_with_delay(i2c: I2C, delay: Delay) -> Self {
        Self {
            i2c,
            delay,
            session: None,
        }
    }
}

impl<I2C, Delay> Apds9960<I2C, Delay> {
    /// Gesture session, present while gesture mode is enabled
    pub fn gesture_session(&self) -> Option<&GestureSession> {
        self.session.as_ref()
    }

    /// Destroy the driver and return the I2C interface
    pub fn destroy(self) -> I2C {
        self.i2c
    }

    fn batch_remaining(&self) -> usize {
        self.session
            .as_ref()
            .map_or(0, |session| session.batch().remaining())
    }

    fn store_fifo_bytes(&mut self, bytes: &[u8]) -> usize {
        match self.session.as_mut() {
            Some(session) => {
                session.batch_mut().extend_from_fifo(bytes);
                session.batch().len()
            }
            None => 0,
        }
    }

    fn process_batch(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if session.process() {
                let motion = session.decode();
                trace!("gesture batch processed, motion {:?}", motion);
            }
            session.batch_mut().clear();
        }
    }

    /// Final decode, then return the session to rest
    fn finish_session(&mut self) -> Motion {
        let Some(session) = self.session.as_mut() else {
            return Motion::None;
        };
        session.decode();
        let motion = session.motion();
        session.reset();
        debug!("gesture resolved: {:?}", motion);
        motion
    }

    fn cancel_session(&mut self) -> Motion {
        if let Some(session) = self.session.as_mut() {
            session.reset();
        }
        debug!("gesture read cancelled");
        Motion::None
    }

    fn abort_session<E>(&mut self, error: Error<E>) -> Error<E> {
        if let Some(session) = self.session.as_mut() {
            session.reset();
        }
        warn!("gesture read aborted on bus error");
        error
    }
}

impl<I2C, E, Delay> Apds9960<I2C, Delay>
where
    I2C: I2c<Error = E>,
{
    /// Initialize the sensor with the default power-up configuration
    ///
    /// All engines are left disabled.
    pub fn init(&mut self) -> Result<(), Error<E>> {
        // Verify device ID
        let id = self.read_register(ID)?;
        if id != DEVICE_ID {
            return Err(Error::InvalidDeviceId {
                expected: DEVICE_ID,
                found: id,
            });
        }

        for (address, value) in DEFAULT_CONFIGURATION {
            self.write_register(address, value)?;
        }
        self.modify::<Control>(|reg| {
            reg.ldrive = LedDrive::Ma100;
            reg.pgain = ProximityGain::Gain4x;
            reg.again = AlsGain::Gain4x;
        })?;
        self.modify::<Gconf2>(|reg| {
            reg.ggain = GestureGain::Gain4x;
            reg.gldrive = LedDrive::Ma100;
            reg.gwtime = GestureWaitTime::Ms2_8;
        })?;
        self.modify::<Gconf4>(|reg| reg.gien = false)?;

        self.session = None;
        info!("APDS-9960 initialized");
        Ok(())
    }

    /// Get the device ID
    pub fn get_device_id(&mut self) -> Result<u8, Error<E>> {
        self.read_register(ID)
    }

    /// Read the STATUS register
    pub fn read_status(&mut self) -> Result<Status, Error<E>> {
        self.read_reg()
    }

    /// Clear all non-gesture interrupts
    pub fn clear_interrupts(&mut self) -> Result<(), Error<E>> {
        // address-only write
        self.i2c
            .write(I2C_ADDRESS, &[AICLEAR])
            .map_err(Error::I2c)
    }

    /// Disable every engine and power the device down
    pub fn power_off(&mut self) -> Result<(), Error<E>> {
        self.session = None;
        self.write_reg(Enable::default())
    }

    /// Enable the ambient light and color engine
    pub fn enable_als(&mut self, interrupts: bool) -> Result<(), Error<E>> {
        self.modify::<Control>(|reg| reg.again = AlsGain::Gain4x)?;
        self.modify::<Enable>(|reg| {
            reg.pon = true;
            reg.aen = true;
            reg.aien = interrupts;
        })
    }

    /// Disable the ambient light and color engine
    pub fn disable_als(&mut self) -> Result<(), Error<E>> {
        self.modify::<Enable>(|reg| {
            reg.aen = false;
            reg.aien = false;
        })
    }

    /// Set the ambient light and color gain
    pub fn set_als_gain(&mut self, gain: AlsGain) -> Result<(), Error<E>> {
        self.modify::<Control>(|reg| reg.again = gain)
    }

    /// Check if new color data is available
    pub fn is_als_data_ready(&mut self) -> Result<bool, Error<E>> {
        Ok(self.read_status()?.avalid)
    }

    /// Read clear, red, green and blue channels using block read for data coherency
    pub fn read_rgbc_data(&mut self) -> Result<RgbcData, Error<E>> {
        if !self.is_als_data_ready()? {
            return Err(Error::NotReady);
        }

        let mut data_buffer = [0u8; 8]; // 4 channels × 2 bytes each
        self.i2c
            .write_read(I2C_ADDRESS, &[CDATAL], &mut data_buffer)
            .map_err(Error::I2c)?;

        Ok(rgbc_from_bytes(&data_buffer))
    }

    /// Enable the proximity engine
    pub fn enable_proximity(&mut self, interrupts: bool) -> Result<(), Error<E>> {
        self.modify::<Control>(|reg| {
            reg.pgain = ProximityGain::Gain4x;
            reg.ldrive = LedDrive::Ma100;
        })?;
        self.modify::<Enable>(|reg| {
            reg.pon = true;
            reg.pen = true;
            reg.pien = interrupts;
        })
    }

    /// Disable the proximity engine
    pub fn disable_proximity(&mut self) -> Result<(), Error<E>> {
        self.modify::<Enable>(|reg| {
            reg.pen = false;
            reg.pien = false;
        })
    }

    /// Set the proximity gain
    pub fn set_proximity_gain(&mut self, gain: ProximityGain) -> Result<(), Error<E>> {
        self.modify::<Control>(|reg| reg.pgain = gain)
    }

    /// Read the proximity value, higher is closer
    pub fn read_proximity(&mut self) -> Result<u8, Error<E>> {
        self.read_register(PDATA)
    }

    /// Enable the gesture engine and start a fresh gesture session
    pub fn enable_gesture(&mut self, interrupts: bool) -> Result<(), Error<E>> {
        self.write_register(WTIME, GESTURE_WTIME)?;
        self.write_register(PPULSE, GESTURE_PPULSE)?;
        self.modify::<Config2>(|reg| reg.led_boost = LedBoost::Percent300)?;
        self.modify::<Gconf4>(|reg| {
            reg.gmode = true;
            reg.gien = interrupts;
        })?;
        self.modify::<Enable>(|reg| {
            reg.pon = true;
            reg.wen = true;
            reg.pen = true;
            reg.gen = true;
        })?;

        self.session = Some(GestureSession::new());
        debug!("gesture mode enabled, interrupts {}", interrupts);
        Ok(())
    }

    /// Disable the gesture engine and drop the gesture session
    pub fn disable_gesture(&mut self) -> Result<(), Error<E>> {
        self.session = None;
        self.modify::<Gconf4>(|reg| {
            reg.gmode = false;
            reg.gien = false;
        })?;
        self.modify::<Enable>(|reg| reg.gen = false)?;
        debug!("gesture mode disabled");
        Ok(())
    }

    /// Check if the gesture FIFO holds valid data
    pub fn is_gesture_available(&mut self) -> Result<bool, Error<E>> {
        Ok(self.read_reg::<Gstatus>()?.gvalid)
    }

    /// Drain the gesture FIFO into the session batch
    ///
    /// Datasets past the free room of the batch stay in the device FIFO for
    /// the next drain. A bus error resets the session.
    pub fn drain_fifo(&mut self) -> Result<FifoDrain, Error<E>> {
        if self.session.is_none() {
            return Err(Error::GestureDisabled);
        }

        self.read_fifo().map_err(|e| self.abort_session(e))
    }

    fn read_fifo(&mut self) -> Result<FifoDrain, Error<E>> {
        let gstatus = self.read_reg::<Gstatus>()?;
        if gstatus.gfov {
            warn!("gesture FIFO overflow, datasets lost");
        }
        if !gstatus.gvalid {
            return Ok(FifoDrain::Complete);
        }

        let level = self.read_register(GFLVL)?;
        trace!("gesture FIFO level {}", level);
        if level == 0 {
            return Ok(FifoDrain::Empty);
        }

        let datasets = usize::from(level).min(self.batch_remaining());
        if datasets > 0 {
            let mut fifo_buffer = [0u8; 4 * FIFO_CAPACITY];
            let bytes = &mut fifo_buffer[..4 * datasets];
            self.i2c
                .write_read(I2C_ADDRESS, &[GFIFO_U], bytes)
                .map_err(Error::I2c)?;
            return Ok(FifoDrain::Filled(self.store_fifo_bytes(bytes)));
        }

        // batch already full
        Ok(FifoDrain::Filled(FIFO_CAPACITY))
    }

    // Helper methods for register access
    fn read_register(&mut self, address: u8) -> Result<u8, Error<E>> {
        let mut buffer = [0u8; 1];
        self.i2c
            .write_read(I2C_ADDRESS, &[address], &mut buffer)
            .map_err(Error::I2c)?;
        Ok(buffer[0])
    }

    fn write_register(&mut self, address: u8, value: u8) -> Result<(), Error<E>> {
        self.i2c
            .write(I2C_ADDRESS, &[address, value])
            .map_err(Error::I2c)
    }

    fn read_reg<R: Register>(&mut self) -> Result<R, Error<E>> {
        Ok(R::from(self.read_register(R::ADDRESS)?))
    }

    fn write_reg<R: Register>(&mut self, reg: R) -> Result<(), Error<E>> {
        self.write_register(R::ADDRESS, reg.into())
    }

    fn modify<R: Register>(&mut self, f: impl FnOnce(&mut R)) -> Result<(), Error<E>> {
        let mut reg = self.read_reg::<R>()?;
        f(&mut reg);
        self.write_reg(reg)
    }
}

impl<I2C, E, Delay> Apds9960<I2C, Delay>
where
    I2C: I2c<Error = E>,
    Delay: embedded_hal::delay::DelayNs,
{
    /// Read one complete gesture
    ///
    /// Polls the FIFO every [`FIFO_PAUSE_MS`] until the device reports no
    /// more gesture data, then returns the decoded motion. Returns
    /// [`Motion::None`] straight away when no gesture data is pending. On a
    /// bus error the session is reset and the error returned.
    pub fn read_gesture(&mut self) -> Result<Motion, Error<E>> {
        self.read_gesture_until(|| false)
    }

    /// Read one complete gesture, giving up when `cancelled` returns true
    ///
    /// `cancelled` is checked once per FIFO poll. A cancelled read resets the
    /// session and returns [`Motion::None`].
    pub fn read_gesture_until<F>(&mut self, mut cancelled: F) -> Result<Motion, Error<E>>
    where
        F: FnMut() -> bool,
    {
        if self.session.is_none() {
            return Err(Error::GestureDisabled);
        }

        match self.is_gesture_available() {
            Ok(true) => {}
            Ok(false) => return Ok(self.finish_session()),
            Err(e) => return Err(self.abort_session(e)),
        }

        loop {
            if cancelled() {
                return Ok(self.cancel_session());
            }

            self.delay.delay_ms(FIFO_PAUSE_MS);

            match self.drain_fifo() {
                Ok(FifoDrain::Filled(_)) => self.process_batch(),
                Ok(FifoDrain::Empty) => {}
                Ok(FifoDrain::Complete) => return Ok(self.finish_session()),
                Err(e) => return Err(e),
            }
        }
    }
}

fn rgbc_from_bytes(data: &[u8; 8]) -> RgbcData {
    RgbcData {
        clear: u16::from_le_bytes([data[0], data[1]]),
        red: u16::from_le_bytes([data[2], data[3]]),
        green: u16::from_le_bytes([data[4], data[5]]),
        blue: u16::from_le_bytes([data[6], data[7]]),
    }
}

#[cfg(feature = "async")]
impl<I2C, E> Apds9960<I2C, ()>
where
    I2C: AsyncI2c<Error = E>,
{
    /// Create a new APDS-9960 driver instance without delay support (async version)
    pub fn new_async(i2c: I2C) -> Self {
        Self {
            i2c,
            delay: (),
            session: None,
        }
    }
}

#[cfg(feature = "async")]
impl<I2C, E, Delay> Apds9960<I2C, Delay>
where
    I2C: AsyncI2c<Error = E>,
    Delay: embedded_hal_async::delay::DelayNs,
{
    /// Create a new APDS-9960 driver instance with delay support (async version)
    pub fn new_async_with_delay(i2c: I2C, delay: Delay) -> Self {
        Self {
            i2c,
            delay,
            session: None,
        }
    }

    /// Read one complete gesture (async version)
    ///
    /// Same poll, drain and decode order as [`Apds9960::read_gesture`],
    /// yielding to the executor between FIFO polls.
    pub async fn read_gesture_async(&mut self) -> Result<Motion, Error<E>> {
        if self.session.is_none() {
            return Err(Error::GestureDisabled);
        }

        match self.is_gesture_available_async().await {
            Ok(true) => {}
            Ok(false) => return Ok(self.finish_session()),
            Err(e) => return Err(self.abort_session(e)),
        }

        loop {
            self.delay.delay_ms(FIFO_PAUSE_MS).await;

            match self.drain_fifo_async().await {
                Ok(FifoDrain::Filled(_)) => self.process_batch(),
                Ok(FifoDrain::Empty) => {}
                Ok(FifoDrain::Complete) => return Ok(self.finish_session()),
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(feature = "async")]
impl<I2C, E, Delay> Apds9960<I2C, Delay>
where
    I2C: AsyncI2c<Error = E>,
{
    /// Initialize the sensor with the default power-up configuration (async version)
    pub async fn init_async(&mut self) -> Result<(), Error<E>> {
        // Verify device ID
        let id = self.read_register_async(ID).await?;
        if id != DEVICE_ID {
            return Err(Error::InvalidDeviceId {
                expected: DEVICE_ID,
                found: id,
            });
        }

        for (address, value) in DEFAULT_CONFIGURATION {
            self.write_register_async(address, value).await?;
        }
        self.modify_async::<Control>(|reg| {
            reg.ldrive = LedDrive::Ma100;
            reg.pgain = ProximityGain::Gain4x;
            reg.again = AlsGain::Gain4x;
        })
        .await?;
        self.modify_async::<Gconf2>(|reg| {
            reg.ggain = GestureGain::Gain4x;
            reg.gldrive = LedDrive::Ma100;
            reg.gwtime = GestureWaitTime::Ms2_8;
        })
        .await?;
        self.modify_async::<Gconf4>(|reg| reg.gien = false).await?;

        self.session = None;
        info!("APDS-9960 initialized");
        Ok(())
    }

    /// Get the device ID (async version)
    pub async fn get_device_id_async(&mut self) -> Result<u8, Error<E>> {
        self.read_register_async(ID).await
    }

    /// Read the STATUS register (async version)
    pub async fn read_status_async(&mut self) -> Result<Status, Error<E>> {
        self.read_reg_async().await
    }

    /// Clear all non-gesture interrupts (async version)
    pub async fn clear_interrupts_async(&mut self) -> Result<(), Error<E>> {
        self.i2c
            .write(I2C_ADDRESS, &[AICLEAR])
            .await
            .map_err(Error::I2c)
    }

    /// Disable every engine and power the device down (async version)
    pub async fn power_off_async(&mut self) -> Result<(), Error<E>> {
        self.session = None;
        self.write_reg_async(Enable::default()).await
    }

    /// Enable the ambient light and color engine (async version)
    pub async fn enable_als_async(&mut self, interrupts: bool) -> Result<(), Error<E>> {
        self.modify_async::<Control>(|reg| reg.again = AlsGain::Gain4x)
            .await?;
        self.modify_async::<Enable>(|reg| {
            reg.pon = true;
            reg.aen = true;
            reg.aien = interrupts;
        })
        .await
    }

    /// Disable the ambient light and color engine (async version)
    pub async fn disable_als_async(&mut self) -> Result<(), Error<E>> {
        self.modify_async::<Enable>(|reg| {
            reg.aen = false;
            reg.aien = false;
        })
        .await
    }

    /// Set the ambient light and color gain (async version)
    pub async fn set_als_gain_async(&mut self, gain: AlsGain) -> Result<(), Error<E>> {
        self.modify_async::<Control>(|reg| reg.again = gain).await
    }

    /// Check if new color data is available (async version)
    pub async fn is_als_data_ready_async(&mut self) -> Result<bool, Error<E>> {
        Ok(self.read_status_async().await?.avalid)
    }

    /// Read clear, red, green and blue channels (async version)
    pub async fn read_rgbc_data_async(&mut self) -> Result<RgbcData, Error<E>> {
        if !self.is_als_data_ready_async().await? {
            return Err(Error::NotReady);
        }

        let mut data_buffer = [0u8; 8];
        self.i2c
            .write_read(I2C_ADDRESS, &[CDATAL], &mut data_buffer)
            .await
            .map_err(Error::I2c)?;

        Ok(rgbc_from_bytes(&data_buffer))
    }

    /// Enable the proximity engine (async version)
    pub async fn enable_proximity_async(&mut self, interrupts: bool) -> Result<(), Error<E>> {
        self.modify_async::<Control>(|reg| {
            reg.pgain = ProximityGain::Gain4x;
            reg.ldrive = LedDrive::Ma100;
        })
        .await?;
        self.modify_async::<Enable>(|reg| {
            reg.pon = true;
            reg.pen = true;
            reg.pien = interrupts;
        })
        .await
    }

    /// Disable the proximity engine (async version)
    pub async fn disable_proximity_async(&mut self) -> Result<(), Error<E>> {
        self.modify_async::<Enable>(|reg| {
            reg.pen = false;
            reg.pien = false;
        })
        .await
    }

    /// Set the proximity gain (async version)
    pub async fn set_proximity_gain_async(&mut self, gain: ProximityGain) -> Result<(), Error<E>> {
        self.modify_async::<Control>(|reg| reg.pgain = gain).await
    }

    /// Read the proximity value (async version)
    pub async fn read_proximity_async(&mut self) -> Result<u8, Error<E>> {
        self.read_register_async(PDATA).await
    }

    /// Enable the gesture engine and start a fresh gesture session (async version)
    pub async fn enable_gesture_async(&mut self, interrupts: bool) -> Result<(), Error<E>> {
        self.write_register_async(WTIME, GESTURE_WTIME).await?;
        self.write_register_async(PPULSE, GESTURE_PPULSE).await?;
        self.modify_async::<Config2>(|reg| reg.led_boost = LedBoost::Percent300)
            .await?;
        self.modify_async::<Gconf4>(|reg| {
            reg.gmode = true;
            reg.gien = interrupts;
        })
        .await?;
        self.modify_async::<Enable>(|reg| {
            reg.pon = true;
            reg.wen = true;
            reg.pen = true;
            reg.gen = true;
        })
        .await?;

        self.session = Some(GestureSession::new());
        debug!("gesture mode enabled, interrupts {}", interrupts);
        Ok(())
    }

    /// Disable the gesture engine and drop the gesture session (async version)
    pub async fn disable_gesture_async(&mut self) -> Result<(), Error<E>> {
        self.session = None;
        self.modify_async::<Gconf4>(|reg| {
            reg.gmode = false;
            reg.gien = false;
        })
        .await?;
        self.modify_async::<Enable>(|reg| reg.gen = false).await?;
        debug!("gesture mode disabled");
        Ok(())
    }

    /// Check if the gesture FIFO holds valid data (async version)
    pub async fn is_gesture_available_async(&mut self) -> Result<bool, Error<E>> {
        Ok(self.read_reg_async::<Gstatus>().await?.gvalid)
    }

    /// Drain the gesture FIFO into the session batch (async version)
    pub async fn drain_fifo_async(&mut self) -> Result<FifoDrain, Error<E>> {
        if self.session.is_none() {
            return Err(Error::GestureDisabled);
        }

        match self.read_fifo_async().await {
            Ok(drain) => Ok(drain),
            Err(e) => Err(self.abort_session(e)),
        }
    }

    async fn read_fifo_async(&mut self) -> Result<FifoDrain, Error<E>> {
        let gstatus = self.read_reg_async::<Gstatus>().await?;
        if gstatus.gfov {
            warn!("gesture FIFO overflow, datasets lost");
        }
        if !gstatus.gvalid {
            return Ok(FifoDrain::Complete);
        }

        let level = self.read_register_async(GFLVL).await?;
        trace!("gesture FIFO level {}", level);
        if level == 0 {
            return Ok(FifoDrain::Empty);
        }

        let datasets = usize::from(level).min(self.batch_remaining());
        if datasets > 0 {
            let mut fifo_buffer = [0u8; 4 * FIFO_CAPACITY];
            let bytes = &mut fifo_buffer[..4 * datasets];
            self.i2c
                .write_read(I2C_ADDRESS, &[GFIFO_U], bytes)
                .await
                .map_err(Error::I2c)?;
            return Ok(FifoDrain::Filled(self.store_fifo_bytes(bytes)));
        }

        // batch already full
        Ok(FifoDrain::Filled(FIFO_CAPACITY))
    }

    // Helper methods for async register access
    async fn read_register_async(&mut self, address: u8) -> Result<u8, Error<E>> {
        let mut buffer = [0u8; 1];
        self.i2c
            .write_read(I2C_ADDRESS, &[address], &mut buffer)
            .await
            .map_err(Error::I2c)?;
        Ok(buffer[0])
    }

    async fn write_register_async(&mut self, address: u8, value: u8) -> Result<(), Error<E>> {
        self.i2c
            .write(I2C_ADDRESS, &[address, value])
            .await
            .map_err(Error::I2c)
    }

    async fn read_reg_async<R: Register>(&mut self) -> Result<R, Error<E>> {
        Ok(R::from(self.read_register_async(R::ADDRESS).await?))
    }

    async fn write_reg_async<R: Register>(&mut self, reg: R) -> Result<(), Error<E>> {
        self.write_register_async(R::ADDRESS, reg.into()).await
    }

    async fn modify_async<R: Register>(
        &mut self,
        f: impl FnOnce(&mut R),
    ) -> Result<(), Error<E>> {
        let mut reg = self.read_reg_async::<R>().await?;
        f(&mut reg);
        self.write_reg_async(reg).await
    }
}
