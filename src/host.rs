//! Services the chip model consumes from the simulation host.
//!
//! The chip owns no clock, timer or bus of its own. The host delivers three
//! kinds of events to [`crate::device::Chip`] (chip-select edges, completed
//! SPI exchanges, sample timer expiry) on one execution context, and the chip
//! calls back into the host through this trait while handling them.

/// Logic level of an input pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinLevel {
    Low,
    High,
}

impl PinLevel {
    #[inline]
    pub fn is_low(self) -> bool {
        self == PinLevel::Low
    }
}

impl From<bool> for PinLevel {
    fn from(high: bool) -> Self {
        if high {
            PinLevel::High
        } else {
            PinLevel::Low
        }
    }
}

/// Host simulation services.
pub trait Host {
    /// Arm the SPI peripheral for a `len`-byte exchange. Completion is
    /// delivered through `Chip::on_spi_done`.
    fn spi_start(&mut self, len: usize);

    /// Disarm the SPI peripheral. A pending exchange completes empty.
    fn spi_stop(&mut self);

    /// Current chip-select level.
    fn cs_level(&self) -> PinLevel;

    /// (Re)arm the sample timer.
    fn timer_start_ns(&mut self, period_ns: u64, repeat: bool);

    /// Cancel the sample timer.
    fn timer_stop(&mut self);

    /// Simulated time since start.
    fn sim_nanos(&self) -> u64;

    /// Uniform random value in `[0, 2^31)`.
    fn random(&mut self) -> u32;
}

#[cfg(test)]
pub(crate) mod mock {
    use super::{Host, PinLevel};
    use std::collections::VecDeque;

    /// Recorded host calls.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum HostCall {
        SpiStart(usize),
        SpiStop,
        TimerStart { period_ns: u64, repeat: bool },
        TimerStop,
    }

    /// Scripted host for driving the chip by hand in tests.
    #[derive(Debug)]
    pub struct MockHost {
        pub cs: PinLevel,
        pub now_ns: u64,
        pub randoms: VecDeque<u32>,
        pub calls: Vec<HostCall>,
    }

    impl MockHost {
        pub fn new() -> Self {
            Self {
                cs: PinLevel::High,
                now_ns: 0,
                randoms: VecDeque::new(),
                calls: Vec::new(),
            }
        }

        pub fn with_randoms(values: &[u32]) -> Self {
            let mut host = Self::new();
            host.randoms.extend(values.iter().copied());
            host
        }
    }

    impl Host for MockHost {
        fn spi_start(&mut self, len: usize) {
            self.calls.push(HostCall::SpiStart(len));
        }

        fn spi_stop(&mut self) {
            self.calls.push(HostCall::SpiStop);
        }

        fn cs_level(&self) -> PinLevel {
            self.cs
        }

        fn timer_start_ns(&mut self, period_ns: u64, repeat: bool) {
            self.calls.push(HostCall::TimerStart { period_ns, repeat });
        }

        fn timer_stop(&mut self) {
            self.calls.push(HostCall::TimerStop);
        }

        fn sim_nanos(&self) -> u64 {
            self.now_ns
        }

        fn random(&mut self) -> u32 {
            self.randoms.pop_front().unwrap_or(0)
        }
    }
}
