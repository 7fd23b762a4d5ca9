//! SPI transaction framing.
//!
//! A transaction runs from chip-select low to chip-select high. The first
//! beat carries the address byte, every later beat is one data byte:
//!
//! ```text
//!        CS low                                          CS high
//!          |                                                |
//!   Idle --+--> AddressByte --> DataBytes --> DataBytes ... +--> Idle
//!                 [d:1|a:7]     addr          addr+1            (write: commit)
//! ```
//!
//! Reads are answered beat by beat. Writes are staged and only reach the
//! register file when chip-select is released.

use smallvec::SmallVec;
use thiserror::Error;

use super::registers::{ADDRESS_MASK, FIFO_DATA, READ_FLAG};

/// Bytes retained from a write transaction: the address byte plus two data
/// bytes.
pub const STAGING_CAPACITY: usize = 3;

/// Filler byte driven on MISO when there is nothing to answer.
pub const FILLER: u8 = 0x00;

/// Transaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionPhase {
    /// Chip not selected.
    Idle,
    /// Waiting for the address byte.
    AddressByte,
    /// Exchanging data bytes.
    DataBytes,
}

/// Transfer direction latched from the address byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

impl Direction {
    /// Decode bit 7 of the address byte: set means read.
    #[inline]
    pub fn from_address_byte(byte: u8) -> Self {
        if byte & READ_FLAG == 0 {
            Direction::Write
        } else {
            Direction::Read
        }
    }
}

/// Bus conditions that are reported but never fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolAnomaly {
    /// An exchange completed with other than one byte.
    #[error("unexpected exchange of {0} bytes")]
    UnexpectedWidth(usize),

    /// A write carried more bytes than the staging buffer holds.
    #[error("write byte {index} exceeds staging capacity of {capacity}")]
    StagingOverflow {
        /// Beat index of the dropped byte.
        index: usize,
        /// Staging capacity including the address byte.
        capacity: usize,
    },

    /// A byte arrived with chip-select released.
    #[error("byte exchanged while not selected")]
    NotSelected,
}

/// What the chip must do for one beat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeatAction {
    /// Address byte latched; answer with filler.
    Address { addr: u8, direction: Direction },
    /// Read `addr` and answer with the result.
    Read(u8),
    /// Write data byte staged; answer with filler.
    Staged,
    /// Report and answer with filler.
    Anomaly(ProtocolAnomaly),
}

/// Staged write to commit at chip-select release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteBatch {
    /// Address latched from the first beat.
    pub start: u8,
    /// Data bytes in bus order.
    pub data: SmallVec<[u8; STAGING_CAPACITY]>,
}

impl WriteBatch {
    /// `(address, value)` pairs, incrementing from `start`.
    pub fn writes(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.data
            .iter()
            .enumerate()
            .map(move |(i, &value)| (self.start.wrapping_add(i as u8) & ADDRESS_MASK, value))
    }
}

/// Per-transaction scratch state.
#[derive(Debug, Clone)]
pub struct SpiTransaction {
    phase: TransactionPhase,
    direction: Option<Direction>,
    start_addr: u8,
    reg_addr: u8,
    byte_index: usize,
    staged: SmallVec<[u8; STAGING_CAPACITY]>,
}

impl Default for SpiTransaction {
    fn default() -> Self {
        Self::new()
    }
}

impl SpiTransaction {
    pub fn new() -> Self {
        Self {
            phase: TransactionPhase::Idle,
            direction: None,
            start_addr: 0,
            reg_addr: 0,
            byte_index: 0,
            staged: SmallVec::new(),
        }
    }

    #[inline]
    pub fn phase(&self) -> TransactionPhase {
        self.phase
    }

    #[inline]
    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    /// Current (possibly incremented) register address.
    #[inline]
    pub fn reg_addr(&self) -> u8 {
        self.reg_addr
    }

    /// Beats exchanged so far in this transaction.
    #[inline]
    pub fn byte_index(&self) -> usize {
        self.byte_index
    }

    #[inline]
    pub fn is_selected(&self) -> bool {
        self.phase != TransactionPhase::Idle
    }

    /// Chip-select asserted: start a fresh transaction.
    pub fn begin(&mut self) {
        self.phase = TransactionPhase::AddressByte;
        self.direction = None;
        self.start_addr = 0;
        self.reg_addr = 0;
        self.byte_index = 0;
        self.staged.clear();
    }

    /// Decode one incoming byte.
    pub fn beat(&mut self, mosi: u8) -> BeatAction {
        let action = match self.phase {
            TransactionPhase::Idle => return BeatAction::Anomaly(ProtocolAnomaly::NotSelected),
            TransactionPhase::AddressByte => {
                self.staged.push(mosi);
                let addr = mosi & ADDRESS_MASK;
                let direction = Direction::from_address_byte(mosi);
                self.start_addr = addr;
                self.reg_addr = addr;
                self.direction = Some(direction);
                self.phase = TransactionPhase::DataBytes;
                BeatAction::Address { addr, direction }
            }
            TransactionPhase::DataBytes => {
                // FIFO_DATA is a stream port: the address stays pinned.
                if self.byte_index > 1 && self.reg_addr != FIFO_DATA {
                    self.reg_addr = (self.reg_addr + 1) & ADDRESS_MASK;
                }
                match self.direction {
                    Some(Direction::Read) => BeatAction::Read(self.reg_addr),
                    _ => {
                        if self.staged.len() < STAGING_CAPACITY {
                            self.staged.push(mosi);
                            BeatAction::Staged
                        } else {
                            BeatAction::Anomaly(ProtocolAnomaly::StagingOverflow {
                                index: self.byte_index,
                                capacity: STAGING_CAPACITY,
                            })
                        }
                    }
                }
            }
        };
        self.byte_index += 1;
        action
    }

    /// Chip-select released. Returns the staged data of a write
    /// transaction; reads and empty transactions return `None`.
    pub fn end(&mut self) -> Option<WriteBatch> {
        let was_selected = self.is_selected();
        self.phase = TransactionPhase::Idle;
        if !was_selected || self.direction != Some(Direction::Write) {
            return None;
        }
        Some(WriteBatch {
            start: self.start_addr,
            data: self.staged.iter().skip(1).copied().collect(),
        })
    }
}
