use num_enum::{FromPrimitive, IntoPrimitive};

pub const CMI_PREFIX: &str = "CMI_C";

/// GOES ABI channels as published in the Cloud and Moisture Imagery product
#[derive(Debug, PartialEq, Eq, Clone, Copy, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum AbiChannel {
    Blue = 1,
    Red = 2,
    Veggie = 3,
    Cirrus = 4,
    SnowIce = 5,
    CloudParticleSize = 6,
    ShortwaveWindow = 7,
    UpperWaterVapor = 8,
    MidWaterVapor = 9,
    LowerWaterVapor = 10,
    CloudTopPhase = 11,
    Ozone = 12,
    CleanLongwaveWindow = 13,
    LongwaveWindow = 14,
    DirtyLongwaveWindow = 15,
    CarbonDioxide = 16,

    #[num_enum(default)]
    Unknown = 0xFF,
}

impl AbiChannel {
    /// `CMI_Cnn` band name. `Unknown` maps to a name no product carries.
    pub fn cmi_band(&self) -> String {
        format!("{CMI_PREFIX}{:02}", u8::from(*self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_names() {
        assert_eq!(AbiChannel::Veggie.cmi_band(), "CMI_C03");
        assert_eq!(AbiChannel::CarbonDioxide.cmi_band(), "CMI_C16");
        assert_eq!(AbiChannel::Unknown.cmi_band(), "CMI_C255");
    }

    #[test]
    fn channel_numbers() {
        assert_eq!(AbiChannel::from(2), AbiChannel::Red);
        assert_eq!(AbiChannel::from(17), AbiChannel::Unknown);
        assert_eq!(u8::from(AbiChannel::Blue), 1);
    }
}
