//! ICM-426xx device model as seen over SPI.
//!
//! This module provides:
//! - Bank 0 register map and per-address behavior table
//! - Register file with bank selection
//! - Sample FIFO with overflow and watermark flags
//! - Synthetic sample generator driven by the ODR timer
//! - SPI transaction framing
//!
//! # Architecture Overview
//!
//! ```text
//!              CS / SCK / MOSI / MISO              sample timer
//!                       |                               |
//!              +--------v---------+           +---------v--------+
//!              |  SpiTransaction  |           |  SampleGenerator |
//!              +--------+---------+           +---------+--------+
//!                       |  read / commit                | push
//!              +--------v---------+  count,   +---------v--------+
//!              |   RegisterFile   |<----------|       Fifo       |
//!              +------------------+  flags    +------------------+
//! ```
//!
//! # Example
//!
//! ```
//! use icm426xx_sim::device::{registers, Chip};
//!
//! let mut chip = Chip::default();
//! chip.regs.poke(registers::PWR_MGMT0, 0x02);
//! assert!(chip.regs.sampling_enabled());
//!
//! chip.load_fifo(&[0x68; 16]);
//! assert_eq!(chip.regs.fifo_count(), 1);
//! assert_eq!(chip.read_register(registers::FIFO_DATA), 0x68);
//! ```

pub mod registers;
pub mod register_file;
pub mod fifo;
pub mod sample;
pub mod odr;
pub mod generator;
pub mod spi;
pub mod chip;

pub use registers::{RegisterInfo, RegisterPolicy};
pub use register_file::{ReadOutcome, RegisterFile, WriteOutcome};
pub use fifo::{Fifo, PushOutcome, DEFAULT_FIFO_CAPACITY, FIFO_EMPTY};
pub use sample::{SampleRecord, RECORD_SIZE};
pub use generator::SampleGenerator;
pub use spi::{BeatAction, Direction, ProtocolAnomaly, SpiTransaction, TransactionPhase, WriteBatch};
pub use chip::{BusStats, Chip, ChipOptions};
