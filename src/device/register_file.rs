//! Bank 0 register storage with bank selection.
//!
//! The register file never performs FIFO or timer work itself. Reads and
//! writes report what the caller must do through [`ReadOutcome`] and
//! [`WriteOutcome`], so every side effect is dispatched from the policy
//! table in [`super::registers`].

use super::registers::{
    RegisterPolicy, ACCEL_CONFIG2, ACCEL_CONFIG3, ADDRESS_MASK, FIFO_COUNTH, INT_STATUS,
    PWR_MGMT0, PWR_SAMPLING_ENABLE, REGISTER_COUNT,
};

/// Result of a bus read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Value to put on the bus.
    Value(u8),
    /// The address is the FIFO port; the caller pops one byte.
    FifoPop,
}

/// Result of a bus write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Value stored.
    Stored,
    /// Non-zero bank active; write dropped.
    Ignored,
    /// Active bank changed.
    BankSelected(u8),
    /// ACCEL_CONFIG0 stored; the low nibble is the new ODR code.
    OdrChanged(u8),
    /// Write to the FIFO port; never stored.
    Rejected,
}

/// Register storage for bank 0 plus the bank selector.
#[derive(Debug, Clone)]
pub struct RegisterFile {
    regs: [u8; REGISTER_COUNT],
    selected_bank: u8,
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterFile {
    /// Create a register file with every register at reset value 0.
    pub fn new() -> Self {
        Self {
            regs: [0; REGISTER_COUNT],
            selected_bank: 0,
        }
    }

    /// Currently selected bank.
    #[inline]
    pub fn selected_bank(&self) -> u8 {
        self.selected_bank
    }

    /// Bus read with bank gating and read side effects.
    ///
    /// INT_STATUS returns its pre-clear value and is zeroed in the same step.
    pub fn read(&mut self, addr: u8) -> ReadOutcome {
        if self.selected_bank != 0 {
            return ReadOutcome::Value(0);
        }
        let addr = addr & ADDRESS_MASK;
        match RegisterPolicy::for_address(addr) {
            RegisterPolicy::FifoStream => ReadOutcome::FifoPop,
            RegisterPolicy::ReadToClear => {
                let value = std::mem::take(&mut self.regs[addr as usize]);
                ReadOutcome::Value(value)
            }
            _ => ReadOutcome::Value(self.regs[addr as usize]),
        }
    }

    /// Bus write with bank gating and write side effects.
    ///
    /// REG_BANK_SEL is honored from any bank; everything else is dropped
    /// while a non-zero bank is selected.
    pub fn write(&mut self, addr: u8, value: u8) -> WriteOutcome {
        let addr = addr & ADDRESS_MASK;
        let policy = RegisterPolicy::for_address(addr);

        if policy == RegisterPolicy::BankSelect {
            self.selected_bank = value;
            return WriteOutcome::BankSelected(value);
        }
        if self.selected_bank != 0 {
            return WriteOutcome::Ignored;
        }

        match policy {
            RegisterPolicy::FifoStream => WriteOutcome::Rejected,
            RegisterPolicy::OdrConfig => {
                self.regs[addr as usize] = value;
                WriteOutcome::OdrChanged(value & 0x0F)
            }
            _ => {
                self.regs[addr as usize] = value;
                WriteOutcome::Stored
            }
        }
    }

    /// Raw bank 0 value, no side effects.
    #[inline]
    pub fn peek(&self, addr: u8) -> u8 {
        self.regs[(addr & ADDRESS_MASK) as usize]
    }

    /// Raw bank 0 store, no side effects.
    #[inline]
    pub fn poke(&mut self, addr: u8, value: u8) {
        self.regs[(addr & ADDRESS_MASK) as usize] = value;
    }

    /// OR `bits` into INT_STATUS.
    #[inline]
    pub fn raise_interrupt(&mut self, bits: u8) {
        self.regs[INT_STATUS as usize] |= bits;
    }

    /// Publish the FIFO record count as a little-endian pair.
    pub fn set_fifo_count(&mut self, records: u16) {
        let [lo, hi] = records.to_le_bytes();
        self.regs[FIFO_COUNTH as usize] = lo;
        self.regs[FIFO_COUNTH as usize + 1] = hi;
    }

    /// FIFO record count as last published.
    pub fn fifo_count(&self) -> u16 {
        u16::from_le_bytes([
            self.regs[FIFO_COUNTH as usize],
            self.regs[FIFO_COUNTH as usize + 1],
        ])
    }

    /// FIFO watermark threshold in records.
    pub fn fifo_watermark(&self) -> u16 {
        u16::from_le_bytes([
            self.regs[ACCEL_CONFIG2 as usize],
            self.regs[ACCEL_CONFIG3 as usize],
        ])
    }

    /// Whether PWR_MGMT0 enables sample generation.
    #[inline]
    pub fn sampling_enabled(&self) -> bool {
        self.regs[PWR_MGMT0 as usize] & PWR_SAMPLING_ENABLE != 0
    }

    /// Bank 0 storage snapshot.
    pub fn as_slice(&self) -> &[u8] {
        &self.regs
    }
}
