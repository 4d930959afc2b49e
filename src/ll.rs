//! Low-level register definitions for APDS-9960
//!
//! Bitfield registers are plain structs with explicit byte packing. Bit
//! positions follow the datasheet, least significant bit first; reserved bits
//! are written as the datasheet requires.

/// I2C address of the APDS-9960
pub const I2C_ADDRESS: u8 = 0x39;

/// Value of the ID register for a genuine APDS-9960
pub const DEVICE_ID: u8 = 0xAB;

// Register addresses
pub(crate) const ENABLE: u8 = 0x80;
pub(crate) const ATIME: u8 = 0x81;
pub(crate) const WTIME: u8 = 0x83;
pub(crate) const AILTL: u8 = 0x84;
pub(crate) const AILTH: u8 = 0x85;
pub(crate) const AIHTL: u8 = 0x86;
pub(crate) const AIHTH: u8 = 0x87;
pub(crate) const PILT: u8 = 0x89;
pub(crate) const PIHT: u8 = 0x8B;
pub(crate) const PERS: u8 = 0x8C;
pub(crate) const CONFIG1: u8 = 0x8D;
pub(crate) const PPULSE: u8 = 0x8E;
pub(crate) const CONTROL: u8 = 0x8F;
pub(crate) const CONFIG2: u8 = 0x90;
pub(crate) const ID: u8 = 0x92;
pub(crate) const STATUS: u8 = 0x93;
pub(crate) const CDATAL: u8 = 0x94;
pub(crate) const PDATA: u8 = 0x9C;
pub(crate) const POFFSET_UR: u8 = 0x9D;
pub(crate) const POFFSET_DL: u8 = 0x9E;
pub(crate) const CONFIG3: u8 = 0x9F;
pub(crate) const GPENTH: u8 = 0xA0;
pub(crate) const GEXTH: u8 = 0xA1;
pub(crate) const GCONF1: u8 = 0xA2;
pub(crate) const GCONF2: u8 = 0xA3;
pub(crate) const GOFFSET_U: u8 = 0xA4;
pub(crate) const GOFFSET_D: u8 = 0xA5;
pub(crate) const GPULSE: u8 = 0xA6;
pub(crate) const GOFFSET_L: u8 = 0xA7;
pub(crate) const GOFFSET_R: u8 = 0xA9;
pub(crate) const GCONF3: u8 = 0xAA;
pub(crate) const GCONF4: u8 = 0xAB;
pub(crate) const GFLVL: u8 = 0xAE;
pub(crate) const GSTATUS: u8 = 0xAF;
pub(crate) const AICLEAR: u8 = 0xE7;
pub(crate) const GFIFO_U: u8 = 0xFC;

/// Power-up configuration written by `init`, in order.
///
/// CONTROL, GCONF2 and GCONF4 are not listed: they carry typed fields and are
/// written through their register views afterwards.
pub(crate) const DEFAULT_CONFIGURATION: [(u8, u8); 25] = [
    (ENABLE, 0x00),     // all engines off, power off
    (ATIME, 219),       // 103 ms ALS integration
    (WTIME, 246),       // 27 ms wait
    (PPULSE, 0x87),     // 16 us, 8 pulses
    (POFFSET_UR, 0),
    (POFFSET_DL, 0),
    (CONFIG1, 0x60),    // no 12x wait factor
    (PILT, 0),
    (PIHT, 50),
    (AILTL, 0xFF),      // AILT = 0xFFFF forces an ALS interrupt for calibration
    (AILTH, 0xFF),
    (AIHTL, 0),
    (AIHTH, 0),
    (PERS, 0x11),       // 2 consecutive prox or ALS for interrupt
    (CONFIG2, 0x01),    // no saturation interrupts, no LED boost
    (CONFIG3, 0),       // all photodiodes, no sleep after interrupt
    (GPENTH, 40),
    (GEXTH, 30),
    (GCONF1, 0x40),     // 4 datasets for interrupt, 1 for exit
    (GOFFSET_U, 0),
    (GOFFSET_D, 0),
    (GOFFSET_L, 0),
    (GOFFSET_R, 0),
    (GPULSE, 0xC9),     // 32 us, 10 pulses
    (GCONF3, 0),        // all photodiodes active during gestures
];

/// WTIME value used while the gesture engine runs
pub(crate) const GESTURE_WTIME: u8 = 0xFF;
/// PPULSE value used while the gesture engine runs (16 us, 10 pulses)
pub(crate) const GESTURE_PPULSE: u8 = 0x89;

/// A single-byte register with a typed view.
pub(crate) trait Register: Copy + From<u8> + Into<u8> {
    const ADDRESS: u8;
}

const fn bit(byte: u8, n: u8) -> bool {
    byte & (1 << n) != 0
}

const fn flag(value: bool, n: u8) -> u8 {
    (value as u8) << n
}

/// LED drive strength
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum LedDrive {
    /// 100 mA
    Ma100 = 0b00,
    /// 50 mA
    Ma50 = 0b01,
    /// 25 mA
    Ma25 = 0b10,
    /// 12.5 mA
    Ma12_5 = 0b11,
}

impl From<u8> for LedDrive {
    fn from(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Self::Ma100,
            0b01 => Self::Ma50,
            0b10 => Self::Ma25,
            _ => Self::Ma12_5,
        }
    }
}

/// Proximity gain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum ProximityGain {
    /// 1x gain
    Gain1x = 0b00,
    /// 2x gain
    Gain2x = 0b01,
    /// 4x gain
    Gain4x = 0b10,
    /// 8x gain
    Gain8x = 0b11,
}

impl From<u8> for ProximityGain {
    fn from(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Self::Gain1x,
            0b01 => Self::Gain2x,
            0b10 => Self::Gain4x,
            _ => Self::Gain8x,
        }
    }
}

/// ALS and colour gain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum AlsGain {
    /// 1x gain
    Gain1x = 0b00,
    /// 4x gain
    Gain4x = 0b01,
    /// 16x gain
    Gain16x = 0b10,
    /// 64x gain
    Gain64x = 0b11,
}

impl From<u8> for AlsGain {
    fn from(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Self::Gain1x,
            0b01 => Self::Gain4x,
            0b10 => Self::Gain16x,
            _ => Self::Gain64x,
        }
    }
}

/// Gesture front-end gain, same encoding as [`ProximityGain`]
pub type GestureGain = ProximityGain;

/// Extra LED current applied during proximity and gesture pulses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum LedBoost {
    /// 100% (no boost)
    Percent100 = 0b00,
    /// 150%
    Percent150 = 0b01,
    /// 200%
    Percent200 = 0b10,
    /// 300%
    Percent300 = 0b11,
}

impl From<u8> for LedBoost {
    fn from(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Self::Percent100,
            0b01 => Self::Percent150,
            0b10 => Self::Percent200,
            _ => Self::Percent300,
        }
    }
}

/// Wait time between gesture cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum GestureWaitTime {
    /// 0 ms
    Ms0 = 0b000,
    /// 2.8 ms
    Ms2_8 = 0b001,
    /// 5.6 ms
    Ms5_6 = 0b010,
    /// 8.4 ms
    Ms8_4 = 0b011,
    /// 14 ms
    Ms14 = 0b100,
    /// 22.4 ms
    Ms22_4 = 0b101,
    /// 30.8 ms
    Ms30_8 = 0b110,
    /// 39.2 ms
    Ms39_2 = 0b111,
}

impl From<u8> for GestureWaitTime {
    fn from(bits: u8) -> Self {
        match bits & 0b111 {
            0b000 => Self::Ms0,
            0b001 => Self::Ms2_8,
            0b010 => Self::Ms5_6,
            0b011 => Self::Ms8_4,
            0b100 => Self::Ms14,
            0b101 => Self::Ms22_4,
            0b110 => Self::Ms30_8,
            _ => Self::Ms39_2,
        }
    }
}

/// ENABLE register (0x80)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Enable {
    /// Power on
    pub pon: bool,
    /// ALS enable
    pub aen: bool,
    /// Proximity detect enable
    pub pen: bool,
    /// Wait enable
    pub wen: bool,
    /// ALS interrupt enable
    pub aien: bool,
    /// Proximity interrupt enable
    pub pien: bool,
    /// Gesture enable
    pub gen: bool,
}

impl From<u8> for Enable {
    fn from(byte: u8) -> Self {
        Self {
            pon: bit(byte, 0),
            aen: bit(byte, 1),
            pen: bit(byte, 2),
            wen: bit(byte, 3),
            aien: bit(byte, 4),
            pien: bit(byte, 5),
            gen: bit(byte, 6),
        }
    }
}

impl From<Enable> for u8 {
    fn from(reg: Enable) -> Self {
        flag(reg.pon, 0)
            | flag(reg.aen, 1)
            | flag(reg.pen, 2)
            | flag(reg.wen, 3)
            | flag(reg.aien, 4)
            | flag(reg.pien, 5)
            | flag(reg.gen, 6)
    }
}

impl Register for Enable {
    const ADDRESS: u8 = ENABLE;
}

/// CONTROL register (0x8F)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Control {
    /// ALS and colour gain, bits 1:0
    pub again: AlsGain,
    /// Proximity gain, bits 3:2
    pub pgain: ProximityGain,
    /// LED drive strength, bits 7:6
    pub ldrive: LedDrive,
}

impl From<u8> for Control {
    fn from(byte: u8) -> Self {
        Self {
            again: AlsGain::from(byte),
            pgain: ProximityGain::from(byte >> 2),
            ldrive: LedDrive::from(byte >> 6),
        }
    }
}

impl From<Control> for u8 {
    fn from(reg: Control) -> Self {
        (reg.again as u8) | ((reg.pgain as u8) << 2) | ((reg.ldrive as u8) << 6)
    }
}

impl Register for Control {
    const ADDRESS: u8 = CONTROL;
}

/// CONFIG2 register (0x90)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Config2 {
    /// LED boost, bits 5:4
    pub led_boost: LedBoost,
    /// Clear photodiode saturation interrupt enable
    pub cpsien: bool,
    /// Proximity saturation interrupt enable
    pub psien: bool,
}

impl From<u8> for Config2 {
    fn from(byte: u8) -> Self {
        Self {
            led_boost: LedBoost::from(byte >> 4),
            cpsien: bit(byte, 6),
            psien: bit(byte, 7),
        }
    }
}

impl From<Config2> for u8 {
    fn from(reg: Config2) -> Self {
        // bit 0 is reserved and must be written as 1
        0x01 | ((reg.led_boost as u8) << 4) | flag(reg.cpsien, 6) | flag(reg.psien, 7)
    }
}

impl Register for Config2 {
    const ADDRESS: u8 = CONFIG2;
}

/// GCONF2 register (0xA3)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Gconf2 {
    /// Gesture wait time, bits 2:0
    pub gwtime: GestureWaitTime,
    /// Gesture LED drive strength, bits 4:3
    pub gldrive: LedDrive,
    /// Gesture gain, bits 6:5
    pub ggain: GestureGain,
}

impl From<u8> for Gconf2 {
    fn from(byte: u8) -> Self {
        Self {
            gwtime: GestureWaitTime::from(byte),
            gldrive: LedDrive::from(byte >> 3),
            ggain: GestureGain::from(byte >> 5),
        }
    }
}

impl From<Gconf2> for u8 {
    fn from(reg: Gconf2) -> Self {
        (reg.gwtime as u8) | ((reg.gldrive as u8) << 3) | ((reg.ggain as u8) << 5)
    }
}

impl Register for Gconf2 {
    const ADDRESS: u8 = GCONF2;
}

/// GCONF4 register (0xAB)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Gconf4 {
    /// Gesture mode, set to start the gesture state machine
    pub gmode: bool,
    /// Gesture interrupt enable
    pub gien: bool,
    /// Clear the gesture FIFO, self-clearing
    pub gfifo_clr: bool,
}

impl From<u8> for Gconf4 {
    fn from(byte: u8) -> Self {
        Self {
            gmode: bit(byte, 0),
            gien: bit(byte, 1),
            gfifo_clr: bit(byte, 2),
        }
    }
}

impl From<Gconf4> for u8 {
    fn from(reg: Gconf4) -> Self {
        flag(reg.gmode, 0) | flag(reg.gien, 1) | flag(reg.gfifo_clr, 2)
    }
}

impl Register for Gconf4 {
    const ADDRESS: u8 = GCONF4;
}

/// GSTATUS register (0xAF), read only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Gstatus {
    /// Gesture FIFO holds valid data
    pub gvalid: bool,
    /// Gesture FIFO overflowed and data was lost
    pub gfov: bool,
}

impl From<u8> for Gstatus {
    fn from(byte: u8) -> Self {
        Self {
            gvalid: bit(byte, 0),
            gfov: bit(byte, 1),
        }
    }
}

impl From<Gstatus> for u8 {
    fn from(reg: Gstatus) -> Self {
        flag(reg.gvalid, 0) | flag(reg.gfov, 1)
    }
}

impl Register for Gstatus {
    const ADDRESS: u8 = GSTATUS;
}

/// STATUS register (0x93), read only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Status {
    /// ALS cycle completed, colour data valid
    pub avalid: bool,
    /// Proximity cycle completed, PDATA valid
    pub pvalid: bool,
    /// Gesture interrupt asserted
    pub gint: bool,
    /// ALS interrupt asserted
    pub aint: bool,
    /// Proximity interrupt asserted
    pub pint: bool,
    /// Proximity or gesture analog saturation
    pub pgsat: bool,
    /// Clear photodiode saturation
    pub cpsat: bool,
}

impl From<u8> for Status {
    fn from(byte: u8) -> Self {
        Self {
            avalid: bit(byte, 0),
            pvalid: bit(byte, 1),
            gint: bit(byte, 2),
            aint: bit(byte, 4),
            pint: bit(byte, 5),
            pgsat: bit(byte, 6),
            cpsat: bit(byte, 7),
        }
    }
}

impl From<Status> for u8 {
    fn from(reg: Status) -> Self {
        flag(reg.avalid, 0)
            | flag(reg.pvalid, 1)
            | flag(reg.gint, 2)
            | flag(reg.aint, 4)
            | flag(reg.pint, 5)
            | flag(reg.pgsat, 6)
            | flag(reg.cpsat, 7)
    }
}

impl Register for Status {
    const ADDRESS: u8 = STATUS;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enable_packs_lsb_first() {
        let reg = Enable {
            pon: true,
            pen: true,
            wen: true,
            gen: true,
            ..Enable::default()
        };
        assert_eq!(u8::from(reg), 0b0100_1101);
        assert_eq!(Enable::from(0b0100_1101), reg);
        assert_eq!(u8::from(Enable::from(0xFF)), 0x7F);
    }

    #[test]
    fn control_matches_power_up_defaults() {
        let reg = Control {
            again: AlsGain::Gain4x,
            pgain: ProximityGain::Gain4x,
            ldrive: LedDrive::Ma100,
        };
        assert_eq!(u8::from(reg), 0b0000_1001);

        let reg = Control::from(0b1100_0111);
        assert_eq!(reg.ldrive, LedDrive::Ma12_5);
        assert_eq!(reg.pgain, ProximityGain::Gain2x);
        assert_eq!(reg.again, AlsGain::Gain64x);
    }

    #[test]
    fn gconf2_fields() {
        let reg = Gconf2 {
            gwtime: GestureWaitTime::Ms2_8,
            gldrive: LedDrive::Ma100,
            ggain: GestureGain::Gain4x,
        };
        assert_eq!(u8::from(reg), 0b0100_0001);
        assert_eq!(Gconf2::from(0b0100_0001), reg);
    }

    #[test]
    fn config2_keeps_reserved_bit_set() {
        let reg = Config2::from(0x00);
        assert_eq!(reg.led_boost, LedBoost::Percent100);
        assert_eq!(u8::from(reg), 0x01);

        let boosted = Config2 {
            led_boost: LedBoost::Percent300,
            ..reg
        };
        assert_eq!(u8::from(boosted), 0x31);
    }

    #[test]
    fn status_flags() {
        let status = Status::from(0b0010_0011);
        assert!(status.avalid);
        assert!(status.pvalid);
        assert!(status.pint);
        assert!(!status.gint);
        assert!(!status.cpsat);

        let gstatus = Gstatus::from(0x03);
        assert!(gstatus.gvalid);
        assert!(gstatus.gfov);
    }
}
