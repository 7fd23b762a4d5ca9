//! Single-threaded simulation host.
//!
//! The engine plays the part of the surrounding simulator: it owns the
//! simulated clock, the sample timer, the chip-select pin and an SPI master,
//! and delivers every event to the [`Chip`] one at a time.
//!
//! # Usage
//!
//! ```
//! use icm426xx_sim::emu::Simulator;
//! use icm426xx_sim::device::registers::{ACCEL_CONFIG0, PWR_MGMT0};
//!
//! let mut sim = Simulator::new_seeded(7);
//! sim.write_registers(ACCEL_CONFIG0, &[0x06]);   // 1 kHz
//! sim.write_registers(PWR_MGMT0, &[0x02]);       // sampling on
//! sim.advance_ns(10_000_000);                    // 10 ms
//! assert_eq!(sim.fifo_count(), 10);
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::Config;
use crate::device::registers::{FIFO_COUNTH, FIFO_DATA, INT_STATUS, READ_FLAG};
use crate::device::{Chip, ChipOptions, RegisterInfo, SampleRecord, RECORD_SIZE};
use crate::host::{Host, PinLevel};

/// Byte seen on MISO when the chip is not driving it.
pub const MISO_IDLE: u8 = 0xFF;

/// Armed sample timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerState {
    /// Period in nanoseconds
    pub period_ns: u64,
    /// Absolute time of the next expiry
    pub next_fire_ns: u64,
    /// Re-arm after firing
    pub repeat: bool,
}

/// Host services backed by simulated state.
#[derive(Debug)]
pub struct SimBus {
    now_ns: u64,
    cs: PinLevel,
    spi_armed: Option<usize>,
    timer: Option<TimerState>,
    rng: StdRng,
}

impl SimBus {
    fn new(seed: u64) -> Self {
        Self {
            now_ns: 0,
            cs: PinLevel::High,
            spi_armed: None,
            timer: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Armed sample timer, if any.
    pub fn timer(&self) -> Option<TimerState> {
        self.timer
    }
}

impl Host for SimBus {
    fn spi_start(&mut self, len: usize) {
        self.spi_armed = Some(len);
    }

    fn spi_stop(&mut self) {
        self.spi_armed = None;
    }

    fn cs_level(&self) -> PinLevel {
        self.cs
    }

    fn timer_start_ns(&mut self, period_ns: u64, repeat: bool) {
        let period_ns = period_ns.max(1);
        self.timer = Some(TimerState {
            period_ns,
            next_fire_ns: self.now_ns + period_ns,
            repeat,
        });
    }

    fn timer_stop(&mut self) {
        self.timer = None;
    }

    fn sim_nanos(&self) -> u64 {
        self.now_ns
    }

    fn random(&mut self) -> u32 {
        self.rng.gen_range(0..1u32 << 31)
    }
}

/// Simulation host driving one chip.
pub struct Simulator {
    /// Chip being simulated.
    pub chip: Chip,
    bus: SimBus,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new_seeded(0)
    }
}

impl Simulator {
    /// Create a simulator around an existing chip.
    pub fn new(chip: Chip, seed: u64) -> Self {
        Self {
            chip,
            bus: SimBus::new(seed),
        }
    }

    /// Create a simulator with a default chip and RNG seed.
    pub fn new_seeded(seed: u64) -> Self {
        Self::new(Chip::default(), seed)
    }

    /// Create a simulator from loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(Chip::new(config.chip_options()), config.seed())
    }

    /// Create a simulator with explicit chip options.
    pub fn with_options(options: ChipOptions, seed: u64) -> Self {
        Self::new(Chip::new(options), seed)
    }

    /// Host-side state (clock, timer, pins).
    pub fn bus(&self) -> &SimBus {
        &self.bus
    }

    /// Simulated time in nanoseconds.
    pub fn now_ns(&self) -> u64 {
        self.bus.now_ns
    }

    // ------------------------------------------------------------------
    // Pins and SPI
    // ------------------------------------------------------------------

    /// Drive chip-select. Only edges are delivered to the chip.
    pub fn set_cs(&mut self, level: PinLevel) {
        if self.bus.cs == level {
            return;
        }
        self.bus.cs = level;
        self.chip.on_pin_change(&mut self.bus, level);
    }

    /// Clock one byte through the bus. Returns [`MISO_IDLE`] if the chip has
    /// not armed its SPI peripheral.
    pub fn exchange(&mut self, mosi: u8) -> u8 {
        match self.bus.spi_armed.take() {
            Some(_) => {
                let mut buf = [mosi];
                self.chip.on_spi_done(&mut self.bus, &mut buf);
                buf[0]
            }
            None => {
                log::debug!("SPI byte 0x{:02X} clocked with chip not listening", mosi);
                MISO_IDLE
            }
        }
    }

    /// One complete transaction: select, clock every byte, deselect.
    pub fn transfer(&mut self, mosi: &[u8]) -> Vec<u8> {
        self.set_cs(PinLevel::Low);
        let miso = mosi.iter().map(|&b| self.exchange(b)).collect();
        self.set_cs(PinLevel::High);
        miso
    }

    /// Burst read of `len` bytes starting at `addr`.
    pub fn read_registers(&mut self, addr: u8, len: usize) -> Vec<u8> {
        let mut mosi = vec![0u8; len + 1];
        mosi[0] = READ_FLAG | addr;
        let mut miso = self.transfer(&mosi);
        miso.remove(0);
        miso
    }

    /// Burst write starting at `addr`.
    pub fn write_registers(&mut self, addr: u8, data: &[u8]) {
        let mut mosi = Vec::with_capacity(data.len() + 1);
        mosi.push(addr & !READ_FLAG);
        mosi.extend_from_slice(data);
        self.transfer(&mosi);
    }

    /// FIFO record count as read over the bus.
    pub fn fifo_count(&mut self) -> u16 {
        let bytes = self.read_registers(FIFO_COUNTH, 2);
        u16::from_le_bytes([bytes[0], bytes[1]])
    }

    /// INT_STATUS over the bus (clears it).
    pub fn read_int_status(&mut self) -> u8 {
        self.read_registers(INT_STATUS, 1)[0]
    }

    /// Read `records` whole records through FIFO_DATA in one transaction.
    pub fn drain_records(&mut self, records: usize) -> Vec<SampleRecord> {
        let bytes = self.read_registers(FIFO_DATA, records * RECORD_SIZE);
        bytes.chunks_exact(RECORD_SIZE).filter_map(SampleRecord::parse).collect()
    }

    // ------------------------------------------------------------------
    // Time
    // ------------------------------------------------------------------

    /// Advance simulated time, firing the sample timer at each period
    /// boundary on the way. Returns the number of timer expiries.
    pub fn advance_ns(&mut self, ns: u64) -> u64 {
        let target = self.bus.now_ns.saturating_add(ns);
        let mut fired = 0;

        while let Some(timer) = self.bus.timer {
            if timer.next_fire_ns > target {
                break;
            }
            self.bus.now_ns = timer.next_fire_ns;
            self.bus.timer = if timer.repeat {
                Some(TimerState {
                    next_fire_ns: timer.next_fire_ns + timer.period_ns,
                    ..timer
                })
            } else {
                None
            };
            fired += 1;
            self.chip.on_sample_timer(&mut self.bus);
        }

        self.bus.now_ns = target;
        fired
    }

    // ------------------------------------------------------------------
    // Live attributes
    // ------------------------------------------------------------------

    pub fn set_accel_amplitude(&mut self, amplitude: f32) {
        self.chip.generator.set_accel_amplitude(amplitude);
    }

    pub fn set_gyro_amplitude(&mut self, amplitude: f32) {
        self.chip.generator.set_gyro_amplitude(amplitude);
    }

    /// Print chip and host status.
    pub fn print_status(&self) {
        let stats = self.chip.stats();
        println!("Simulated time: {} us", self.bus.now_ns / 1000);
        match self.bus.timer {
            Some(t) => println!("Sample timer: every {} ns, next at {} ns", t.period_ns, t.next_fire_ns),
            None => println!("Sample timer: stopped"),
        }
        println!(
            "FIFO: {} / {} bytes ({} records)",
            self.chip.fifo.count(),
            self.chip.fifo.capacity(),
            self.chip.fifo.records()
        );
        println!("Bank: {}", self.chip.regs.selected_bank());
        println!();
        println!("Bus Statistics:");
        println!("  Transactions:    {}", stats.transactions);
        println!("  Read beats:      {}", stats.read_beats);
        println!("  Register writes: {}", stats.register_writes);
        println!("  Anomalies:       {}", stats.anomalies);
        println!("  Samples:         {}", stats.samples);
        println!("  FIFO overflows:  {}", stats.fifo_overflows);
        println!("  FIFO underflows: {}", stats.fifo_underflows);
    }

    /// Print every modeled register with its raw value.
    pub fn print_registers(&self) {
        println!("Registers (bank 0):");
        for info in RegisterInfo::all() {
            println!(
                "  0x{:02X} {:14} = 0x{:02X}  [{}]",
                info.address,
                info.name,
                self.chip.regs.peek(info.address),
                info.policy
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::registers::{
        ACCEL_CONFIG0, ACCEL_CONFIG2, GYRO_CONFIG0, INT_FIFO_FULL, INT_FIFO_WATERMARK, PWR_MGMT0,
    };
    use crate::device::{DEFAULT_FIFO_CAPACITY, FIFO_EMPTY};

    fn sampling_sim(odr_code: u8) -> Simulator {
        let mut sim = Simulator::new_seeded(1);
        sim.write_registers(ACCEL_CONFIG0, &[odr_code]);
        sim.write_registers(PWR_MGMT0, &[0x02]);
        sim
    }

    #[test]
    fn test_write_then_read_back() {
        let mut sim = Simulator::default();
        for value in [0x12u8, 0x34, 0x56] {
            sim.write_registers(GYRO_CONFIG0, &[value]);
            assert_eq!(sim.read_registers(GYRO_CONFIG0, 1), vec![value]);
        }
    }

    #[test]
    fn test_burst_write_two_registers() {
        let mut sim = Simulator::default();
        sim.write_registers(ACCEL_CONFIG2, &[0x05, 0x00]);
        assert_eq!(sim.read_registers(ACCEL_CONFIG2, 2), vec![0x05, 0x00]);
        assert_eq!(sim.chip.regs.fifo_watermark(), 5);
    }

    #[test]
    fn test_one_record_per_millisecond() {
        let mut sim = sampling_sim(6);

        for n in 1..=20u16 {
            sim.advance_ns(1_000_000);
            assert_eq!(sim.fifo_count(), n);
        }

        let records = sim.drain_records(20);
        assert_eq!(records.len(), 20);
        for (i, rec) in records.iter().enumerate() {
            assert!(rec.is_packet3());
            assert_eq!(rec.temperature, 44);
            assert_eq!(rec.timestamp as u64, (i as u64 + 1) * 1000);
        }
    }

    #[test]
    fn test_no_records_while_disabled() {
        let mut sim = Simulator::new_seeded(1);
        sim.write_registers(ACCEL_CONFIG0, &[0x06]);
        assert_eq!(sim.advance_ns(10_000_000), 10);
        assert_eq!(sim.fifo_count(), 0);

        // Enable, collect, then disable again
        sim.write_registers(PWR_MGMT0, &[0x02]);
        sim.advance_ns(5_000_000);
        assert_eq!(sim.fifo_count(), 5);
        sim.write_registers(PWR_MGMT0, &[0x00]);
        sim.advance_ns(5_000_000);
        assert_eq!(sim.fifo_count(), 5);
    }

    #[test]
    fn test_odr_change_takes_effect_next_boundary() {
        let mut sim = sampling_sim(6);
        sim.advance_ns(500_000);

        // Switch to 200 Hz halfway through a 1 ms period
        sim.write_registers(ACCEL_CONFIG0, &[0x07]);
        let timer = sim.bus().timer().unwrap();
        assert_eq!(timer.period_ns, 5_000_000);
        assert_eq!(timer.next_fire_ns, 5_500_000);

        sim.advance_ns(4_999_999);
        assert_eq!(sim.fifo_count(), 0);
        sim.advance_ns(1);
        assert_eq!(sim.fifo_count(), 1);
    }

    #[test]
    fn test_watermark_interrupt() {
        let mut sim = Simulator::new_seeded(3);
        sim.write_registers(ACCEL_CONFIG2, &[0x03, 0x00]);
        sim.write_registers(ACCEL_CONFIG0, &[0x06]);
        sim.write_registers(PWR_MGMT0, &[0x02]);

        sim.advance_ns(2_000_000);
        assert_eq!(sim.read_int_status() & INT_FIFO_WATERMARK, 0);
        sim.advance_ns(1_000_000);
        assert_eq!(sim.read_int_status(), INT_FIFO_WATERMARK);
        // Cleared by the read
        assert_eq!(sim.read_int_status(), 0);
    }

    #[test]
    fn test_fifo_saturates_and_flags_full() {
        let mut sim = Simulator::new_seeded(4);
        sim.write_registers(ACCEL_CONFIG2, &[0xFF, 0xFF]);
        sim.write_registers(ACCEL_CONFIG0, &[0x01]); // 32 kHz
        sim.write_registers(PWR_MGMT0, &[0x02]);

        let max_records = (DEFAULT_FIFO_CAPACITY / RECORD_SIZE) as u16;
        sim.advance_ns(max_records as u64 * 31_250);
        assert_eq!(sim.fifo_count(), max_records);
        assert_eq!(sim.read_int_status() & INT_FIFO_FULL, 0);

        sim.advance_ns(10 * 31_250);
        assert_eq!(sim.fifo_count(), max_records);
        assert_eq!(sim.read_int_status() & INT_FIFO_FULL, INT_FIFO_FULL);
        assert_eq!(sim.chip.stats().fifo_overflows, 10);

        // Oldest records were dropped: the first left is sample 11
        let first = sim.drain_records(1)[0];
        assert_eq!(first.timestamp as u64, (11 * 31_250 / 1000) & 0xFFFF);
    }

    #[test]
    fn test_read_empty_fifo_over_bus() {
        let mut sim = Simulator::default();
        let bytes = sim.read_registers(FIFO_DATA, 3);
        assert_eq!(bytes, vec![FIFO_EMPTY; 3]);
        assert_eq!(sim.fifo_count(), 0);
    }

    #[test]
    fn test_fifo_read_is_not_incremented() {
        let mut sim = Simulator::default();
        let payload: Vec<u8> = (0..3 * RECORD_SIZE).map(|i| i as u8).collect();
        sim.chip.load_fifo(&payload);

        let bytes = sim.read_registers(FIFO_DATA, payload.len());
        assert_eq!(bytes, payload);
        assert_eq!(sim.chip.regs.peek(FIFO_DATA + 1), 0);
    }

    #[test]
    fn test_amplitude_zero_yields_silent_axes() {
        let mut sim = sampling_sim(6);
        sim.set_accel_amplitude(0.0);
        sim.set_gyro_amplitude(0.0);
        sim.advance_ns(3_000_000);

        for rec in sim.drain_records(3) {
            assert_eq!(rec.accel, [0, 0, 0]);
            assert_eq!(rec.gyro, [0, 0, 0]);
        }
    }

    #[test]
    fn test_same_seed_same_samples() {
        let mut a = sampling_sim(6);
        let mut b = sampling_sim(6);
        a.advance_ns(5_000_000);
        b.advance_ns(5_000_000);
        assert_eq!(a.drain_records(5), b.drain_records(5));
    }

    #[test]
    fn test_exchange_without_select() {
        let mut sim = Simulator::default();
        assert_eq!(sim.exchange(0x80), MISO_IDLE);
        assert_eq!(sim.chip.stats().transactions, 0);
    }
}
