/// Supply voltage treated as an empty cell (mV).
pub const EMPTY_MV: u32 = 3600;
/// Supply voltage treated as a full cell (mV).
pub const FULL_MV: u32 = 4200;

/// Linear LiPo estimate between 3.6 V and 4.2 V.
pub fn percent_from_millivolts(mv: u32) -> u8 {
    if mv <= EMPTY_MV {
        0
    } else if mv >= FULL_MV {
        100
    } else {
        ((mv - EMPTY_MV) * 100 / (FULL_MV - EMPTY_MV)) as u8
    }
}

/// Convert a 12-bit SAADC sample of VDDH/5 into the VDDH voltage (mV).
///
/// Default SAADC setup: gain 1/6, 0.6 V reference, so full scale is 3.6 V.
/// Negative samples (noise around 0 V) read as 0.
pub fn millivolts_from_vddh_div5(raw: i16) -> u32 {
    let raw = raw.max(0) as u32;
    raw * 3600 * 5 / 4096
}
