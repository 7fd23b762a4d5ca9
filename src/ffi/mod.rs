//! Foreign Function Interface for icm426xx-sim.
//!
//! This module provides C-callable functions for embedding the chip model
//! in a C/C++ simulation host (board simulators, firmware test benches).
//!
//! # Safety
//! All functions in this module use `unsafe` extern "C" ABI and must be
//! called with valid pointers. Null pointer checks are performed where
//! appropriate.
//!
//! # Memory Management
//! - Handles returned by `icm_sim_create*` must be freed with
//!   `icm_sim_destroy`.
//! - Transfer buffers are borrowed for the duration of the call only.
//!
//! # Threading
//! A handle is a single-threaded actor. Callers that drive one handle from
//! several threads must serialize every call on it.

use std::slice;
use std::sync::Mutex;

use crate::config::Config;
use crate::emu::Simulator;
use crate::host::PinLevel;

/// Opaque handle to a simulated chip and its host.
pub struct IcmSimHandle {
    sim: Simulator,
}

/// Result codes for FFI operations.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcmSimResult {
    Success = 0,
    InvalidHandle = 1,
    NullPointer = 2,
    InvalidArgument = 3,
}

/// Sensor selector for amplitude control.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcmSimSensor {
    Accel = 0,
    Gyro = 1,
}

// Global lock for thread safety during initialization
static INIT_LOCK: Mutex<()> = Mutex::new(());

fn create_handle(sim: Simulator) -> *mut IcmSimHandle {
    let _lock = INIT_LOCK.lock().unwrap_or_else(|e| e.into_inner());

    // Initialize logging if not already done
    let _ = env_logger::try_init();

    Box::into_raw(Box::new(IcmSimHandle { sim }))
}

/// Create a chip configured from the config files and environment.
///
/// # Safety
/// The returned handle must be freed with `icm_sim_destroy`.
#[no_mangle]
pub unsafe extern "C" fn icm_sim_create() -> *mut IcmSimHandle {
    create_handle(Simulator::from_config(Config::get()))
}

/// Create a chip with default options and an explicit noise seed.
///
/// # Safety
/// The returned handle must be freed with `icm_sim_destroy`.
#[no_mangle]
pub unsafe extern "C" fn icm_sim_create_seeded(seed: u64) -> *mut IcmSimHandle {
    create_handle(Simulator::new_seeded(seed))
}

/// Destroy a chip instance.
///
/// # Safety
/// `handle` must be a valid pointer returned by `icm_sim_create*`,
/// or null (in which case this is a no-op).
#[no_mangle]
pub unsafe extern "C" fn icm_sim_destroy(handle: *mut IcmSimHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Run one complete SPI transaction of `len` bytes.
///
/// # Safety
/// - `handle` must be valid
/// - `mosi` must point to `len` readable bytes
/// - `miso` must point to `len` writable bytes, or be null to discard
#[no_mangle]
pub unsafe extern "C" fn icm_sim_transfer(
    handle: *mut IcmSimHandle,
    mosi: *const u8,
    miso: *mut u8,
    len: usize,
) -> IcmSimResult {
    if handle.is_null() {
        return IcmSimResult::InvalidHandle;
    }
    if mosi.is_null() {
        return IcmSimResult::NullPointer;
    }

    let handle = &mut *handle;
    let tx = slice::from_raw_parts(mosi, len);
    let rx = handle.sim.transfer(tx);

    if !miso.is_null() {
        slice::from_raw_parts_mut(miso, len).copy_from_slice(&rx);
    }

    IcmSimResult::Success
}

/// Drive chip-select (0 = low/selected, nonzero = high).
///
/// # Safety
/// `handle` must be valid.
#[no_mangle]
pub unsafe extern "C" fn icm_sim_set_cs(handle: *mut IcmSimHandle, level: u32) -> IcmSimResult {
    if handle.is_null() {
        return IcmSimResult::InvalidHandle;
    }

    let handle = &mut *handle;
    handle.sim.set_cs(PinLevel::from(level != 0));

    IcmSimResult::Success
}

/// Clock one byte while chip-select is held. Returns the MISO byte.
///
/// # Safety
/// `handle` must be valid or null (null returns 0xFF).
#[no_mangle]
pub unsafe extern "C" fn icm_sim_exchange(handle: *mut IcmSimHandle, mosi: u8) -> u8 {
    if handle.is_null() {
        return crate::emu::MISO_IDLE;
    }

    let handle = &mut *handle;
    handle.sim.exchange(mosi)
}

/// Advance simulated time, firing sample ticks on the way.
///
/// # Safety
/// `handle` must be valid.
#[no_mangle]
pub unsafe extern "C" fn icm_sim_advance_ns(handle: *mut IcmSimHandle, ns: u64) -> IcmSimResult {
    if handle.is_null() {
        return IcmSimResult::InvalidHandle;
    }

    let handle = &mut *handle;
    let fired = handle.sim.advance_ns(ns);
    log::trace!("Advanced {} ns, {} sample ticks", ns, fired);

    IcmSimResult::Success
}

/// Set a live noise amplitude (clamped to 0.0 - 1.0).
///
/// # Safety
/// `handle` must be valid.
#[no_mangle]
pub unsafe extern "C" fn icm_sim_set_amplitude(
    handle: *mut IcmSimHandle,
    sensor: IcmSimSensor,
    amplitude: f32,
) -> IcmSimResult {
    if handle.is_null() {
        return IcmSimResult::InvalidHandle;
    }
    if amplitude.is_nan() {
        return IcmSimResult::InvalidArgument;
    }

    let handle = &mut *handle;
    match sensor {
        IcmSimSensor::Accel => handle.sim.set_accel_amplitude(amplitude),
        IcmSimSensor::Gyro => handle.sim.set_gyro_amplitude(amplitude),
    }

    IcmSimResult::Success
}

/// Bytes currently queued in the FIFO (0 for a null handle).
///
/// # Safety
/// `handle` must be valid or null.
#[no_mangle]
pub unsafe extern "C" fn icm_sim_fifo_bytes(handle: *const IcmSimHandle) -> u32 {
    if handle.is_null() {
        return 0;
    }

    let handle = &*handle;
    handle.sim.chip.fifo.count() as u32
}

/// Get version information.
#[no_mangle]
pub extern "C" fn icm_sim_version() -> u32 {
    // Version 0.1.0 = 0x000100
    0x000100
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::registers::{ACCEL_CONFIG0, PWR_MGMT0, READ_FLAG};

    #[test]
    fn test_null_handle() {
        unsafe {
            assert_eq!(icm_sim_advance_ns(std::ptr::null_mut(), 1), IcmSimResult::InvalidHandle);
            assert_eq!(icm_sim_set_cs(std::ptr::null_mut(), 0), IcmSimResult::InvalidHandle);
            assert_eq!(icm_sim_exchange(std::ptr::null_mut(), 0), 0xFF);
            assert_eq!(icm_sim_fifo_bytes(std::ptr::null()), 0);
            icm_sim_destroy(std::ptr::null_mut());
        }
    }

    #[test]
    fn test_transfer_and_sampling() {
        unsafe {
            let handle = icm_sim_create_seeded(5);
            assert!(!handle.is_null());

            let odr = [ACCEL_CONFIG0, 0x06];
            let pwr = [PWR_MGMT0, 0x02];
            assert_eq!(icm_sim_transfer(handle, odr.as_ptr(), std::ptr::null_mut(), 2), IcmSimResult::Success);
            assert_eq!(icm_sim_transfer(handle, pwr.as_ptr(), std::ptr::null_mut(), 2), IcmSimResult::Success);
            assert_eq!(icm_sim_advance_ns(handle, 2_000_000), IcmSimResult::Success);
            assert_eq!(icm_sim_fifo_bytes(handle), 32);

            let read = [READ_FLAG | PWR_MGMT0, 0x00];
            let mut out = [0u8; 2];
            icm_sim_transfer(handle, read.as_ptr(), out.as_mut_ptr(), 2);
            assert_eq!(out, [0x00, 0x02]);

            icm_sim_destroy(handle);
        }
    }

    #[test]
    fn test_byte_level_transaction() {
        unsafe {
            let handle = icm_sim_create_seeded(0);
            icm_sim_set_cs(handle, 0);
            icm_sim_exchange(handle, 0x11);
            icm_sim_exchange(handle, 0x5A);
            icm_sim_set_cs(handle, 1);

            icm_sim_set_cs(handle, 0);
            icm_sim_exchange(handle, READ_FLAG | 0x11);
            assert_eq!(icm_sim_exchange(handle, 0), 0x5A);
            icm_sim_set_cs(handle, 1);

            assert_eq!(
                icm_sim_set_amplitude(handle, IcmSimSensor::Gyro, f32::NAN),
                IcmSimResult::InvalidArgument
            );
            icm_sim_destroy(handle);
        }
    }
}
