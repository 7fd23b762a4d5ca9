//! The chip model: register file, FIFO, sample generator and SPI framing
//! composed into one owned state object.
//!
//! The host owns a [`Chip`] and feeds it events on a single execution
//! context:
//!
//! - [`Chip::on_pin_change`] for chip-select edges
//! - [`Chip::on_spi_done`] for each completed byte exchange
//! - [`Chip::on_sample_timer`] for sample timer expiry
//!
//! A timer tick may land between two byte exchanges but never inside one,
//! so every FIFO and register update is a single step relative to the bus.

use super::fifo::{Fifo, FIFO_EMPTY};
use super::generator::SampleGenerator;
use super::odr;
use super::register_file::{ReadOutcome, RegisterFile, WriteOutcome};
use super::registers::register_name;
use super::spi::{BeatAction, ProtocolAnomaly, SpiTransaction, FILLER};
use crate::host::{Host, PinLevel};

/// Bus and FIFO activity counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusStats {
    /// Chip-select assertions
    pub transactions: u64,
    /// Data beats answered for reads
    pub read_beats: u64,
    /// Register writes committed at deselect
    pub register_writes: u64,
    /// Protocol anomalies reported
    pub anomalies: u64,
    /// Pushes that dropped old FIFO data
    pub fifo_overflows: u64,
    /// FIFO_DATA reads with nothing queued
    pub fifo_underflows: u64,
    /// Records produced by the sample generator
    pub samples: u64,
}

/// Chip construction parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChipOptions {
    /// FIFO depth in bytes
    pub fifo_capacity: usize,
    /// Initial accelerometer amplitude
    pub accel_amplitude: f32,
    /// Initial gyroscope amplitude
    pub gyro_amplitude: f32,
    /// Temperature byte stamped into records
    pub temperature: i8,
}

impl Default for ChipOptions {
    fn default() -> Self {
        Self {
            fifo_capacity: super::fifo::DEFAULT_FIFO_CAPACITY,
            accel_amplitude: 1.0,
            gyro_amplitude: 1.0,
            temperature: super::generator::DEFAULT_TEMPERATURE,
        }
    }
}

/// ICM-426xx behavioral model.
#[derive(Debug, Clone)]
pub struct Chip {
    /// Bank 0 registers
    pub regs: RegisterFile,
    /// Sample FIFO
    pub fifo: Fifo,
    /// Sample synthesis settings
    pub generator: SampleGenerator,
    spi: SpiTransaction,
    sample_period_ns: Option<u64>,
    stats: BusStats,
}

impl Default for Chip {
    fn default() -> Self {
        Self::new(ChipOptions::default())
    }
}

impl Chip {
    /// Create a chip at power-on reset.
    pub fn new(options: ChipOptions) -> Self {
        let mut generator = SampleGenerator::new(options.accel_amplitude, options.gyro_amplitude);
        generator.set_temperature(options.temperature);
        Self {
            regs: RegisterFile::new(),
            fifo: Fifo::new(options.fifo_capacity),
            generator,
            spi: SpiTransaction::new(),
            sample_period_ns: None,
            stats: BusStats::default(),
        }
    }

    /// Activity counters.
    pub fn stats(&self) -> &BusStats {
        &self.stats
    }

    /// Current SPI transaction state.
    pub fn transaction(&self) -> &SpiTransaction {
        &self.spi
    }

    /// Period the sample timer was last programmed with.
    pub fn sample_period_ns(&self) -> Option<u64> {
        self.sample_period_ns
    }

    // ------------------------------------------------------------------
    // Host events
    // ------------------------------------------------------------------

    /// Chip-select edge.
    pub fn on_pin_change<H: Host>(&mut self, host: &mut H, level: PinLevel) {
        match level {
            PinLevel::Low => {
                log::trace!("SPI chip selected");
                self.stats.transactions += 1;
                self.spi.begin();
                host.spi_start(1);
            }
            PinLevel::High => {
                log::trace!("SPI chip deselected after {} beats", self.spi.byte_index());
                host.spi_stop();
                if let Some(batch) = self.spi.end() {
                    for (addr, value) in batch.writes() {
                        self.write_register(host, addr, value);
                    }
                }
            }
        }
    }

    /// A byte exchange completed. `buffer` holds MOSI on entry and MISO on
    /// return. An empty buffer means the exchange was cancelled by
    /// `spi_stop`.
    pub fn on_spi_done<H: Host>(&mut self, host: &mut H, buffer: &mut [u8]) {
        if buffer.is_empty() {
            return;
        }

        if buffer.len() != 1 {
            self.report(ProtocolAnomaly::UnexpectedWidth(buffer.len()));
            buffer.fill(FILLER);
        } else {
            let mosi = buffer[0];
            buffer[0] = match self.spi.beat(mosi) {
                BeatAction::Address { addr, direction } => {
                    log::trace!("SPI {:?} {}", direction, register_name(addr));
                    FILLER
                }
                BeatAction::Read(addr) => {
                    self.stats.read_beats += 1;
                    let value = self.read_register(addr);
                    log::trace!("SPI read {} -> 0x{:02X}", register_name(addr), value);
                    value
                }
                BeatAction::Staged => FILLER,
                BeatAction::Anomaly(anomaly) => {
                    self.report(anomaly);
                    FILLER
                }
            };
        }

        if self.spi.is_selected() && host.cs_level().is_low() {
            host.spi_start(1);
        }
    }

    /// Sample timer expired.
    pub fn on_sample_timer<H: Host>(&mut self, host: &mut H) {
        if let Some(outcome) = self.generator.tick(host, &mut self.regs, &mut self.fifo) {
            self.stats.samples += 1;
            if outcome.overflowed {
                self.stats.fifo_overflows += 1;
            }
        }
    }

    // ------------------------------------------------------------------
    // Register access
    // ------------------------------------------------------------------

    /// Bus read of one register, with read side effects.
    pub fn read_register(&mut self, addr: u8) -> u8 {
        match self.regs.read(addr) {
            ReadOutcome::Value(value) => value,
            ReadOutcome::FifoPop => {
                if self.fifo.is_empty() {
                    self.stats.fifo_underflows += 1;
                    return FIFO_EMPTY;
                }
                self.fifo.pop_byte(&mut self.regs)
            }
        }
    }

    /// Bus write of one register, with write side effects.
    pub fn write_register<H: Host>(&mut self, host: &mut H, addr: u8, value: u8) {
        self.stats.register_writes += 1;
        match self.regs.write(addr, value) {
            WriteOutcome::Stored => {
                log::debug!("Write {} = 0x{:02X}", register_name(addr), value);
            }
            WriteOutcome::Ignored => {
                log::debug!(
                    "Write {} = 0x{:02X} ignored in bank {}",
                    register_name(addr),
                    value,
                    self.regs.selected_bank()
                );
            }
            WriteOutcome::BankSelected(bank) => {
                log::info!("Select bank {}", bank);
            }
            WriteOutcome::OdrChanged(code) => self.reprogram_sample_timer(host, code),
            WriteOutcome::Rejected => {
                log::warn!("Write to {} dropped", register_name(addr));
            }
        }
    }

    /// Enqueue raw bytes into the FIFO as the sample path would.
    pub fn load_fifo(&mut self, bytes: &[u8]) {
        let outcome = self.fifo.push(&mut self.regs, bytes);
        if outcome.overflowed {
            self.stats.fifo_overflows += 1;
        }
    }

    fn reprogram_sample_timer<H: Host>(&mut self, host: &mut H, code: u8) {
        match odr::period_ns(code) {
            Some(period) => {
                log::info!(
                    "Accel ODR code {} ({} mHz), sample period {} ns",
                    code,
                    odr::millihertz(code).unwrap_or(0),
                    period
                );
                host.timer_stop();
                host.timer_start_ns(period, true);
                self.sample_period_ns = Some(period);
            }
            None => {
                log::warn!("Accel ODR code {} undefined, sample timer unchanged", code);
            }
        }
    }

    fn report(&mut self, anomaly: ProtocolAnomaly) {
        self.stats.anomalies += 1;
        log::warn!("SPI protocol anomaly: {}", anomaly);
    }
}
