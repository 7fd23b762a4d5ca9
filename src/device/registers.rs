//! ICM-426xx bank 0 register definitions and per-address behavior table.
//!
//! Register addresses follow the ICM-42688 datasheet (DS-000347, section 14).
//! Only the registers the model gives meaning to are listed; every other
//! address in `0x00..=0x7F` is plain storage.
//!
//! # Address Byte
//!
//! ```text
//! SPI address byte: [dir:1][addr:7]
//!
//!   dir = 1 -> read
//!   dir = 0 -> write
//! ```

use std::fmt;

/// Number of addressable registers per bank (7-bit address space).
pub const REGISTER_COUNT: usize = 0x80;

/// Mask for the 7-bit register address carried in the address byte.
pub const ADDRESS_MASK: u8 = 0x7F;

/// Direction bit of the address byte (set = read).
pub const READ_FLAG: u8 = 0x80;

/// Interrupt status (read-to-clear).
pub const INT_STATUS: u8 = 0x2D;
/// FIFO record count, low byte. High byte follows at `FIFO_COUNTH + 1`.
pub const FIFO_COUNTH: u8 = 0x2E;
/// FIFO record count, high byte.
pub const FIFO_COUNTL: u8 = 0x2F;
/// FIFO data port.
pub const FIFO_DATA: u8 = 0x30;
/// Power management (bit 1 enables sample generation).
pub const PWR_MGMT0: u8 = 0x4E;
/// Gyroscope configuration (stored only).
pub const GYRO_CONFIG0: u8 = 0x4F;
/// Accelerometer configuration, low nibble is the ODR code.
pub const ACCEL_CONFIG0: u8 = 0x50;
/// FIFO watermark, low byte.
pub const ACCEL_CONFIG2: u8 = 0x60;
/// FIFO watermark, high byte.
pub const ACCEL_CONFIG3: u8 = 0x61;
/// Register bank select.
pub const REG_BANK_SEL: u8 = 0x76;

/// INT_STATUS bit raised when a push overflows the FIFO.
pub const INT_FIFO_FULL: u8 = 1 << 1;
/// INT_STATUS bit raised when the record count reaches the watermark.
pub const INT_FIFO_WATERMARK: u8 = 1 << 2;

/// PWR_MGMT0 bit that enables the sample generator.
pub const PWR_SAMPLING_ENABLE: u8 = 1 << 1;

/// How a register reacts to bus reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterPolicy {
    /// Ordinary storage.
    Plain,
    /// Read returns the stored value and clears it.
    ReadToClear,
    /// Reads pop the FIFO; writes are rejected.
    FifoStream,
    /// Writes select the active bank instead of being stored.
    BankSelect,
    /// Writes are stored and reprogram the sample timer.
    OdrConfig,
}

impl RegisterPolicy {
    /// Policy for a bank 0 address.
    pub fn for_address(addr: u8) -> Self {
        RegisterInfo::lookup(addr)
            .map(|info| info.policy)
            .unwrap_or(RegisterPolicy::Plain)
    }
}

impl fmt::Display for RegisterPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterPolicy::Plain => write!(f, "plain"),
            RegisterPolicy::ReadToClear => write!(f, "read-clear"),
            RegisterPolicy::FifoStream => write!(f, "fifo"),
            RegisterPolicy::BankSelect => write!(f, "bank-sel"),
            RegisterPolicy::OdrConfig => write!(f, "odr"),
        }
    }
}

/// Information about a modeled register.
#[derive(Debug, Clone, Copy)]
pub struct RegisterInfo {
    /// Datasheet name
    pub name: &'static str,
    /// Bank 0 address
    pub address: u8,
    /// Brief description
    pub description: &'static str,
    /// Bus behavior
    pub policy: RegisterPolicy,
}

impl RegisterInfo {
    /// Look up a modeled register by address.
    pub fn lookup(addr: u8) -> Option<&'static RegisterInfo> {
        BANK0_REGISTERS.iter().find(|r| r.address == addr & ADDRESS_MASK)
    }

    /// All modeled registers, in address order.
    pub fn all() -> &'static [RegisterInfo] {
        BANK0_REGISTERS
    }
}

impl fmt::Display for RegisterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ 0x{:02X} ({})", self.name, self.address, self.description)
    }
}

/// Printable name for any address, falling back to the hex offset.
pub fn register_name(addr: u8) -> String {
    match RegisterInfo::lookup(addr) {
        Some(info) => info.name.to_string(),
        None => format!("REG_0x{:02X}", addr & ADDRESS_MASK),
    }
}

static BANK0_REGISTERS: &[RegisterInfo] = &[
    RegisterInfo {
        name: "INT_STATUS",
        address: INT_STATUS,
        description: "Interrupt status, cleared on read",
        policy: RegisterPolicy::ReadToClear,
    },
    RegisterInfo {
        name: "FIFO_COUNTH",
        address: FIFO_COUNTH,
        description: "FIFO record count [7:0]",
        policy: RegisterPolicy::Plain,
    },
    RegisterInfo {
        name: "FIFO_COUNTL",
        address: FIFO_COUNTL,
        description: "FIFO record count [15:8]",
        policy: RegisterPolicy::Plain,
    },
    RegisterInfo {
        name: "FIFO_DATA",
        address: FIFO_DATA,
        description: "FIFO data port",
        policy: RegisterPolicy::FifoStream,
    },
    RegisterInfo {
        name: "PWR_MGMT0",
        address: PWR_MGMT0,
        description: "Power management, bit 1 enables sampling",
        policy: RegisterPolicy::Plain,
    },
    RegisterInfo {
        name: "GYRO_CONFIG0",
        address: GYRO_CONFIG0,
        description: "Gyroscope full scale and ODR",
        policy: RegisterPolicy::Plain,
    },
    RegisterInfo {
        name: "ACCEL_CONFIG0",
        address: ACCEL_CONFIG0,
        description: "Accelerometer full scale and ODR",
        policy: RegisterPolicy::OdrConfig,
    },
    RegisterInfo {
        name: "ACCEL_CONFIG2",
        address: ACCEL_CONFIG2,
        description: "FIFO watermark [7:0]",
        policy: RegisterPolicy::Plain,
    },
    RegisterInfo {
        name: "ACCEL_CONFIG3",
        address: ACCEL_CONFIG3,
        description: "FIFO watermark [15:8]",
        policy: RegisterPolicy::Plain,
    },
    RegisterInfo {
        name: "REG_BANK_SEL",
        address: REG_BANK_SEL,
        description: "Register bank select",
        policy: RegisterPolicy::BankSelect,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_table() {
        assert_eq!(RegisterPolicy::for_address(INT_STATUS), RegisterPolicy::ReadToClear);
        assert_eq!(RegisterPolicy::for_address(FIFO_DATA), RegisterPolicy::FifoStream);
        assert_eq!(RegisterPolicy::for_address(REG_BANK_SEL), RegisterPolicy::BankSelect);
        assert_eq!(RegisterPolicy::for_address(ACCEL_CONFIG0), RegisterPolicy::OdrConfig);
        assert_eq!(RegisterPolicy::for_address(GYRO_CONFIG0), RegisterPolicy::Plain);

        // Unlisted addresses are plain storage
        assert_eq!(RegisterPolicy::for_address(0x11), RegisterPolicy::Plain);
    }

    #[test]
    fn test_table_is_sorted_and_unique() {
        let addrs: Vec<u8> = RegisterInfo::all().iter().map(|r| r.address).collect();
        let mut sorted = addrs.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(addrs, sorted);
    }

    #[test]
    fn test_register_name() {
        assert_eq!(register_name(PWR_MGMT0), "PWR_MGMT0");
        assert_eq!(register_name(0x11), "REG_0x11");
        // Direction bit is ignored
        assert_eq!(register_name(INT_STATUS | READ_FLAG), "INT_STATUS");
    }
}
