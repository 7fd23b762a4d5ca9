//! Simulation host for the ICM-426xx model.
//!
//! This module provides a concrete host that drives a [`crate::device::Chip`]:
//! - Simulated nanosecond clock
//! - Periodic sample timer with restart on ODR change
//! - Chip-select pin and byte-wide SPI master
//! - Seeded pseudo-random source for sample noise
//!
//! # Architecture
//!
//! Both event sources (bus transactions and timer expiries) are delivered
//! from one thread, in order. Time only moves inside [`Simulator::advance_ns`],
//! so a bus transaction is always atomic with respect to sampling.
//!
//! # Example
//!
//! ```
//! use icm426xx_sim::emu::Simulator;
//! use icm426xx_sim::device::registers::GYRO_CONFIG0;
//!
//! let mut sim = Simulator::default();
//! sim.write_registers(GYRO_CONFIG0, &[0x26]);
//! assert_eq!(sim.read_registers(GYRO_CONFIG0, 1), vec![0x26]);
//! ```

pub mod engine;

pub use engine::{SimBus, Simulator, TimerState, MISO_IDLE};
