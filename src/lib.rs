//! icm426xx-sim library
//!
//! Behavioral model of an ICM-426xx 6-axis IMU on its SPI register
//! interface, for exercising firmware without hardware.

pub mod config;
pub mod device;
pub mod emu;
pub mod ffi;
pub mod host;
