//! Sample FIFO modeled as a byte ring buffer.
//!
//! Records go in whole (one [`RECORD_SIZE`] push per sample) and come out a
//! byte at a time through FIFO_DATA. `count` is the fill level; the overflow
//! path moves the read index without touching `count`, so the index distance
//! is not used for control flow.
//!
//! ```text
//!            read_idx              write_idx
//!               v                     v
//!   [ . . . . | r r r r r r r r r r | . . . . ]
//!               <------ count ------>
//! ```

use super::register_file::RegisterFile;
use super::registers::{INT_FIFO_FULL, INT_FIFO_WATERMARK};
use super::sample::RECORD_SIZE;

/// FIFO depth of the reference part, in bytes.
pub const DEFAULT_FIFO_CAPACITY: usize = 2048;

/// Byte returned by FIFO_DATA when the FIFO is empty.
pub const FIFO_EMPTY: u8 = 0x80;

/// What a push did to the interrupt flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushOutcome {
    /// Oldest bytes were dropped to make room.
    pub overflowed: bool,
    /// Record count is at or above the watermark.
    pub watermark: bool,
}

/// Hardware FIFO ring buffer.
#[derive(Debug, Clone)]
pub struct Fifo {
    data: Box<[u8]>,
    write_idx: usize,
    read_idx: usize,
    count: usize,
}

impl Default for Fifo {
    fn default() -> Self {
        Self::new(DEFAULT_FIFO_CAPACITY)
    }
}

impl Fifo {
    /// Create an empty FIFO. Capacity is at least one record.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(RECORD_SIZE);
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            write_idx: 0,
            read_idx: 0,
            count: 0,
        }
    }

    /// Capacity in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Bytes currently queued.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Whole records currently queued.
    #[inline]
    pub fn records(&self) -> usize {
        self.count / RECORD_SIZE
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Read and write positions, for diagnostics.
    pub fn indices(&self) -> (usize, usize) {
        (self.read_idx, self.write_idx)
    }

    /// Enqueue `bytes`, dropping the oldest data if they don't fit.
    ///
    /// Publishes the record count to FIFO_COUNTH/L and raises FIFO-full and
    /// watermark bits in INT_STATUS as needed.
    pub fn push(&mut self, regs: &mut RegisterFile, bytes: &[u8]) -> PushOutcome {
        let capacity = self.capacity();
        let size = bytes.len();
        let mut outcome = PushOutcome::default();

        if self.count + size > capacity {
            // Newest overwrites oldest: the fill level stays put.
            self.read_idx = (self.read_idx + size) % capacity;
            regs.raise_interrupt(INT_FIFO_FULL);
            outcome.overflowed = true;
            log::warn!("FIFO overflow: dropped {} oldest bytes", size);
        } else {
            self.count += size;
        }

        for &b in bytes {
            self.data[self.write_idx] = b;
            self.write_idx = (self.write_idx + 1) % capacity;
        }

        let records = self.publish_count(regs);
        if records >= regs.fifo_watermark() {
            regs.raise_interrupt(INT_FIFO_WATERMARK);
            outcome.watermark = true;
            log::trace!("FIFO watermark: {} records >= {}", records, regs.fifo_watermark());
        }

        outcome
    }

    /// Dequeue one byte, or [`FIFO_EMPTY`] with no state change when empty.
    pub fn pop_byte(&mut self, regs: &mut RegisterFile) -> u8 {
        if self.count == 0 {
            log::warn!("FIFO empty read");
            return FIFO_EMPTY;
        }
        let b = self.data[self.read_idx];
        self.read_idx = (self.read_idx + 1) % self.capacity();
        self.count -= 1;
        self.publish_count(regs);
        b
    }

    /// Drop all queued data.
    pub fn clear(&mut self, regs: &mut RegisterFile) {
        self.write_idx = 0;
        self.read_idx = 0;
        self.count = 0;
        self.publish_count(regs);
    }

    fn publish_count(&self, regs: &mut RegisterFile) -> u16 {
        let records = u16::try_from(self.records()).unwrap_or(u16::MAX);
        regs.set_fifo_count(records);
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::registers::{ACCEL_CONFIG2, ACCEL_CONFIG3, INT_STATUS};

    fn record(tag: u8) -> [u8; RECORD_SIZE] {
        let mut rec = [0u8; RECORD_SIZE];
        for (i, b) in rec.iter_mut().enumerate() {
            *b = tag.wrapping_add(i as u8);
        }
        rec
    }

    fn regs_with_watermark(wm: u16) -> RegisterFile {
        let mut regs = RegisterFile::new();
        let [lo, hi] = wm.to_le_bytes();
        regs.write(ACCEL_CONFIG2, lo);
        regs.write(ACCEL_CONFIG3, hi);
        regs
    }

    #[test]
    fn test_record_count_tracks_pushes() {
        let mut regs = regs_with_watermark(1000);
        let mut fifo = Fifo::default();
        let max_records = fifo.capacity() / RECORD_SIZE;

        for n in 1..=max_records {
            fifo.push(&mut regs, &record(n as u8));
            assert_eq!(regs.fifo_count() as usize, n);
        }
        assert_eq!(fifo.count(), fifo.capacity());
        assert_eq!(regs.peek(INT_STATUS), 0);
    }

    #[test]
    fn test_watermark_fires_at_threshold() {
        let mut regs = regs_with_watermark(4);
        let mut fifo = Fifo::default();

        for n in 1..=3 {
            let outcome = fifo.push(&mut regs, &record(n));
            assert!(!outcome.watermark);
            assert_eq!(regs.peek(INT_STATUS) & INT_FIFO_WATERMARK, 0);
        }
        let outcome = fifo.push(&mut regs, &record(4));
        assert!(outcome.watermark);
        assert_eq!(regs.peek(INT_STATUS) & INT_FIFO_WATERMARK, INT_FIFO_WATERMARK);
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let mut regs = regs_with_watermark(1000);
        let mut fifo = Fifo::new(4 * RECORD_SIZE);

        for n in 0..4u8 {
            let outcome = fifo.push(&mut regs, &record(n * 0x10));
            assert!(!outcome.overflowed);
        }
        let outcome = fifo.push(&mut regs, &record(0x40));
        assert!(outcome.overflowed);
        assert_eq!(regs.peek(INT_STATUS) & INT_FIFO_FULL, INT_FIFO_FULL);
        assert_eq!(regs.fifo_count(), 4);
        assert_eq!(fifo.count(), fifo.capacity());

        // Record 0x00 is gone; the FIFO now starts at 0x10
        let first: Vec<u8> = (0..RECORD_SIZE).map(|_| fifo.pop_byte(&mut regs)).collect();
        assert_eq!(first, record(0x10));

        // Drain the rest: 0x20, 0x30, then the newest 0x40
        for tag in [0x20u8, 0x30, 0x40] {
            let rec: Vec<u8> = (0..RECORD_SIZE).map(|_| fifo.pop_byte(&mut regs)).collect();
            assert_eq!(rec, record(tag));
        }
        assert!(fifo.is_empty());
    }

    #[test]
    fn test_overflow_after_partial_read() {
        let mut regs = regs_with_watermark(1000);
        let mut fifo = Fifo::new(2 * RECORD_SIZE);

        fifo.push(&mut regs, &record(0x00));
        fifo.push(&mut regs, &record(0x40));
        for _ in 0..8 {
            fifo.pop_byte(&mut regs);
        }
        assert_eq!(fifo.count(), 24);

        // 24 + 16 > 32: overflow keeps count at 24
        let outcome = fifo.push(&mut regs, &record(0x80));
        assert!(outcome.overflowed);
        assert_eq!(fifo.count(), 24);
        assert_eq!(regs.fifo_count(), 1);

        // Last 16 queued bytes are the newest record
        let drained: Vec<u8> = (0..24).map(|_| fifo.pop_byte(&mut regs)).collect();
        assert_eq!(&drained[8..], &record(0x80));
    }

    #[test]
    fn test_pop_empty_returns_sentinel() {
        let mut regs = RegisterFile::new();
        let mut fifo = Fifo::default();
        regs.set_fifo_count(0);

        assert_eq!(fifo.pop_byte(&mut regs), FIFO_EMPTY);
        assert_eq!(fifo.indices(), (0, 0));
        assert_eq!(regs.fifo_count(), 0);
        assert_eq!(regs.peek(INT_STATUS), 0);
    }

    #[test]
    fn test_pop_updates_record_count() {
        let mut regs = regs_with_watermark(1000);
        let mut fifo = Fifo::default();
        fifo.push(&mut regs, &record(0));
        fifo.push(&mut regs, &record(0));
        assert_eq!(regs.fifo_count(), 2);

        fifo.pop_byte(&mut regs);
        assert_eq!(fifo.count(), 31);
        assert_eq!(regs.fifo_count(), 1);
    }

    #[test]
    fn test_clear() {
        let mut regs = regs_with_watermark(1000);
        let mut fifo = Fifo::default();
        fifo.push(&mut regs, &record(0));
        fifo.clear(&mut regs);
        assert!(fifo.is_empty());
        assert_eq!(regs.fifo_count(), 0);
    }
}
