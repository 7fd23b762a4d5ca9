//! Synthetic sample generation.
//!
//! Each timer tick produces one packet 3 record of bounded random noise,
//! scaled per sensor by a live-tunable amplitude in `[0.0, 1.0]`.

use super::fifo::{Fifo, PushOutcome};
use super::register_file::RegisterFile;
use super::sample::SampleRecord;
use crate::host::Host;

/// Temperature byte written into every record.
pub const DEFAULT_TEMPERATURE: i8 = 44;

/// Sample generator settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleGenerator {
    accel_amplitude: f32,
    gyro_amplitude: f32,
    temperature: i8,
}

impl Default for SampleGenerator {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

impl SampleGenerator {
    /// Create a generator with the given amplitudes (clamped to `[0, 1]`).
    pub fn new(accel_amplitude: f32, gyro_amplitude: f32) -> Self {
        Self {
            accel_amplitude: clamp_amplitude(accel_amplitude),
            gyro_amplitude: clamp_amplitude(gyro_amplitude),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn accel_amplitude(&self) -> f32 {
        self.accel_amplitude
    }

    pub fn gyro_amplitude(&self) -> f32 {
        self.gyro_amplitude
    }

    pub fn set_accel_amplitude(&mut self, amplitude: f32) {
        self.accel_amplitude = clamp_amplitude(amplitude);
    }

    pub fn set_gyro_amplitude(&mut self, amplitude: f32) {
        self.gyro_amplitude = clamp_amplitude(amplitude);
    }

    pub fn set_temperature(&mut self, temperature: i8) {
        self.temperature = temperature;
    }

    /// Synthesize one record stamped with the host clock.
    pub fn generate<H: Host>(&self, host: &mut H) -> SampleRecord {
        let accel = [
            random_axis(host, self.accel_amplitude),
            random_axis(host, self.accel_amplitude),
            random_axis(host, self.accel_amplitude),
        ];
        let gyro = [
            random_axis(host, self.gyro_amplitude),
            random_axis(host, self.gyro_amplitude),
            random_axis(host, self.gyro_amplitude),
        ];
        let timestamp = ((host.sim_nanos() / 1000) & 0xFFFF) as u16;
        SampleRecord::new(accel, gyro, self.temperature, timestamp)
    }

    /// Handle one timer tick: generate and enqueue a record if PWR_MGMT0
    /// enables sampling. Returns `None` when disabled.
    pub fn tick<H: Host>(
        &self,
        host: &mut H,
        regs: &mut RegisterFile,
        fifo: &mut Fifo,
    ) -> Option<PushOutcome> {
        if !regs.sampling_enabled() {
            return None;
        }
        let record = self.generate(host);
        log::trace!("Sample @{}us: accel={:?} gyro={:?}", record.timestamp, record.accel, record.gyro);
        Some(fifo.push(regs, &record.to_bytes()))
    }
}

/// Random magnitude scaled by `amplitude`, with an independent sign draw.
fn random_axis<H: Host>(host: &mut H, amplitude: f32) -> i16 {
    let raw = host.random() & 0x7FFF_FFFF;
    let scaled = (raw as f64 * amplitude as f64) as u32;
    let magnitude = (scaled >> 16) as i16;
    if host.random() & 1 != 0 {
        -magnitude
    } else {
        magnitude
    }
}

fn clamp_amplitude(amplitude: f32) -> f32 {
    if amplitude.is_nan() {
        0.0
    } else {
        amplitude.clamp(0.0, 1.0)
    }
}
