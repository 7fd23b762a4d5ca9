//! Output data rate (ODR) codes and sample timer periods.
//!
//! ACCEL_CONFIG0[3:0] selects the rate. Rates are kept in millihertz so the
//! fractional low rates (12.5 Hz, 6.25 Hz, ...) stay exact integers.

/// Nanoseconds times millihertz in one second squared (1e9 ns * 1e3 mHz).
const NS_MILLIHZ: u64 = 1_000_000_000_000;

/// Output rate in millihertz for an ODR code, `None` for code 0 and
/// anything outside the 4-bit range.
pub fn millihertz(code: u8) -> Option<u32> {
    let mhz = match code {
        1 => 32_000_000,
        2 => 16_000_000,
        3 => 8_000_000,
        4 => 4_000_000,
        5 => 2_000_000,
        6 => 1_000_000,
        7 => 200_000,
        8 => 100_000,
        9 => 50_000,
        10 => 25_000,
        11 => 12_500,
        12 => 6_250,
        13 => 3_125,
        14 => 1_563,
        15 => 500_000,
        _ => return None,
    };
    Some(mhz)
}

/// Sample timer period in nanoseconds for an ODR code.
pub fn period_ns(code: u8) -> Option<u64> {
    millihertz(code).map(|mhz| NS_MILLIHZ / mhz as u64)
}
