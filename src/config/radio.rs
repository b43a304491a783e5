/// Crystal oscillator frequency of the SX127x in Hz
pub const FXOSC_HZ: u64 = 32_000_000;

/// LoRa signal bandwidth (`ModemConfig1` bits 7..4)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Bandwidth {
    /// 7.8 kHz
    Khz7_8 = 0,
    /// 10.4 kHz
    Khz10_4 = 1,
    /// 15.6 kHz
    Khz15_6 = 2,
    /// 20.8 kHz
    Khz20_8 = 3,
    /// 31.25 kHz
    Khz31_25 = 4,
    /// 41.7 kHz
    Khz41_7 = 5,
    /// 62.5 kHz
    Khz62_5 = 6,
    /// 125 kHz
    Khz125 = 7,
    /// 250 kHz
    Khz250 = 8,
    /// 500 kHz
    Khz500 = 9,
}

impl Bandwidth {
    /// Smallest bandwidth that is at least `hz` wide
    pub fn from_hz(hz: u32) -> Self {
        match hz {
            b if b <= 7_800 => Bandwidth::Khz7_8,
            b if b <= 10_400 => Bandwidth::Khz10_4,
            b if b <= 15_600 => Bandwidth::Khz15_6,
            b if b <= 20_800 => Bandwidth::Khz20_8,
            b if b <= 31_250 => Bandwidth::Khz31_25,
            b if b <= 41_700 => Bandwidth::Khz41_7,
            b if b <= 62_500 => Bandwidth::Khz62_5,
            b if b <= 125_000 => Bandwidth::Khz125,
            b if b <= 250_000 => Bandwidth::Khz250,
            _ => Bandwidth::Khz500,
        }
    }

    /// Register code
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// LoRa forward error correction rate (`ModemConfig1` bits 3..1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum CodingRate {
    /// 4/5
    Cr4_5 = 1,
    /// 4/6
    Cr4_6 = 2,
    /// 4/7
    Cr4_7 = 3,
    /// 4/8
    Cr4_8 = 4,
}

impl CodingRate {
    /// Register code
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// LoRa spreading factor (`ModemConfig2` bits 7..4)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SpreadingFactor {
    /// 64 chips per symbol
    Sf6 = 6,
    /// 128 chips per symbol
    Sf7 = 7,
    /// 256 chips per symbol
    Sf8 = 8,
    /// 512 chips per symbol
    Sf9 = 9,
    /// 1024 chips per symbol
    Sf10 = 10,
    /// 2048 chips per symbol
    Sf11 = 11,
    /// 4096 chips per symbol
    Sf12 = 12,
}

impl SpreadingFactor {
    /// Register code
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Power amplifier setup (`PaConfig` register)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutputPower {
    /// Route output through the PA_BOOST pin instead of RFO
    pub pa_boost: bool,
    /// Maximum power selection, 0..=7
    pub max_power: u8,
    /// Output power nibble, 0..=15
    pub output_power: u8,
}

impl OutputPower {
    /// PA_BOOST output at `dbm`, clamped to the 2..=17 dBm range of that pin
    pub fn pa_boost_dbm(dbm: i8) -> Self {
        let dbm = dbm.clamp(2, 17) as u8;
        Self {
            pa_boost: true,
            max_power: 7,
            output_power: dbm - 2,
        }
    }

    /// Raw `PaConfig` value
    pub fn register_value(&self) -> u8 {
        let boost = if self.pa_boost { 0x80 } else { 0x00 };
        boost | ((self.max_power & 0x07) << 4) | (self.output_power & 0x0F)
    }
}

impl Default for OutputPower {
    fn default() -> Self {
        Self {
            pa_boost: true,
            max_power: 7,
            output_power: 15,
        }
    }
}

/// Modem configuration applied by the driver at initialization
///
/// Written once by `Sx127x::initialize` and re-applied on recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RadioConfig {
    /// Carrier frequency in Hz
    pub frequency: u32,
    /// Signal bandwidth
    pub bandwidth: Bandwidth,
    /// Coding rate
    pub coding_rate: CodingRate,
    /// Spreading factor
    pub spreading_factor: SpreadingFactor,
    /// Append and check a payload CRC
    pub crc: bool,
    /// Preamble length in symbols
    pub preamble_length: u16,
    /// Power amplifier setup
    pub output_power: OutputPower,
}

impl RadioConfig {
    /// Configuration with every modem parameter at its default and `frequency` as carrier
    pub fn new(frequency: u32) -> Self {
        Self {
            frequency,
            ..Self::default()
        }
    }

    /// 24-bit `Frf` value, `floor(frequency * 2^19 / FXOSC)`
    pub fn frf(&self) -> u32 {
        frf_from_hz(self.frequency)
    }

    /// `ModemConfig1`: bandwidth, coding rate, explicit header mode
    pub fn modem_config1(&self) -> u8 {
        (self.bandwidth.code() << 4) | (self.coding_rate.code() << 1)
    }

    /// `ModemConfig2`: spreading factor and CRC enable
    pub fn modem_config2(&self) -> u8 {
        let crc = if self.crc { 0x04 } else { 0x00 };
        (self.spreading_factor.code() << 4) | crc
    }

    /// `PreambleMsb`, `PreambleLsb`
    pub fn preamble_bytes(&self) -> [u8; 2] {
        self.preamble_length.to_be_bytes()
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            frequency: 915_000_000,
            bandwidth: Bandwidth::Khz125,
            coding_rate: CodingRate::Cr4_5,
            spreading_factor: SpreadingFactor::Sf7,
            crc: true,
            preamble_length: 8,
            output_power: OutputPower::default(),
        }
    }
}

/// Frequency synthesizer value for a carrier of `hz`, truncated to 24 bits
pub fn frf_from_hz(hz: u32) -> u32 {
    (((hz as u64) << 19) / FXOSC_HZ) as u32 & 0x00FF_FFFF
}

/// Split a 24-bit `Frf` value into `FrfMsb`, `FrfMid`, `FrfLsb`
pub fn frf_bytes(frf: u32) -> [u8; 3] {
    [(frf >> 16) as u8, (frf >> 8) as u8, frf as u8]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_fixed_modem_setup() {
        let config = RadioConfig::default();

        assert_eq!(config.modem_config1(), 0x72);
        assert_eq!(config.modem_config2(), 0x74);
        assert_eq!(config.output_power.register_value(), 0xFF);
        assert_eq!(config.preamble_bytes(), [0x00, 0x08]);
    }

    #[test]
    fn test_frf_derivation() {
        // 915 MHz * 2^19 / 32 MHz = 14_991_360 exactly
        assert_eq!(frf_from_hz(915_000_000), 0xE4C000);
        assert_eq!(frf_bytes(0xE4C000), [0xE4, 0xC0, 0x00]);

        // 868.1 MHz does not divide evenly and must floor
        let expected = ((868_100_000u64 << 19) / 32_000_000) as u32;
        assert_eq!(frf_from_hz(868_100_000), expected);
        assert_eq!(frf_from_hz(868_100_000), 0xD9_0666);

        assert_eq!(frf_from_hz(433_000_000), 0x6C_4000);
    }

    #[test]
    fn test_bandwidth_lookup() {
        assert_eq!(Bandwidth::from_hz(125_000), Bandwidth::Khz125);
        assert_eq!(Bandwidth::from_hz(100_000), Bandwidth::Khz125);
        assert_eq!(Bandwidth::from_hz(500_000), Bandwidth::Khz500);
        assert_eq!(Bandwidth::from_hz(1), Bandwidth::Khz7_8);
    }

    #[test]
    fn test_pa_boost_power_clamps() {
        assert_eq!(OutputPower::pa_boost_dbm(17).register_value(), 0xFF);
        assert_eq!(OutputPower::pa_boost_dbm(30).register_value(), 0xFF);
        assert_eq!(OutputPower::pa_boost_dbm(-5).register_value(), 0xF0);
    }

    #[test]
    fn test_modem_config_encoding() {
        let config = RadioConfig {
            bandwidth: Bandwidth::Khz250,
            coding_rate: CodingRate::Cr4_8,
            spreading_factor: SpreadingFactor::Sf12,
            crc: false,
            preamble_length: 0x0102,
            ..RadioConfig::default()
        };

        assert_eq!(config.modem_config1(), 0x88);
        assert_eq!(config.modem_config2(), 0xC0);
        assert_eq!(config.preamble_bytes(), [0x01, 0x02]);
    }
}
