//! Retained-state adapter backed by RTC slow memory.
//!
//! Deep sleep powers down the main RAM but keeps the RTC domain alive, so
//! a static placed in `.rtc.data` survives every timer wake.  A full
//! power loss resets the section to its link-time image, which fails the
//! magic check and reads as "no retained state" — exactly the cold-boot
//! semantics the wake path wants.
//!
//! The record is postcard-encoded rather than stored as a raw struct so
//! a firmware update that reshapes [`RetainedState`] decodes as garbage
//! (and falls back to defaults) instead of silently misreading fields.

use log::warn;

use crate::app::ports::RetainedStorePort;
use crate::retained::RetainedState;

#[cfg(not(target_os = "espidf"))]
use std::cell::RefCell;

/// Sized for the postcard encoding of [`RetainedState`] plus slack.
const PAYLOAD_MAX: usize = 32;

const RTC_MAGIC: u32 = 0x464E_5354; // "FNST"

#[cfg(target_os = "espidf")]
#[repr(C)]
#[derive(Clone, Copy)]
struct RtcSlot {
    magic: u32,
    len: u32,
    bytes: [u8; PAYLOAD_MAX],
}

// Lives in the RTC power domain.  Single-threaded access only: the wake
// entry loads it once and the pre-sleep path stores it once.
#[cfg(target_os = "espidf")]
#[unsafe(link_section = ".rtc.data")]
static mut RTC_SLOT: RtcSlot = RtcSlot {
    magic: 0,
    len: 0,
    bytes: [0; PAYLOAD_MAX],
};

pub struct RtcStore {
    #[cfg(not(target_os = "espidf"))]
    sim: RefCell<Option<([u8; PAYLOAD_MAX], usize)>>,
}

impl RtcStore {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            sim: RefCell::new(None),
        }
    }
}

impl Default for RtcStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RetainedStorePort for RtcStore {
    fn load(&self) -> Option<RetainedState> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: sole access from the main task; no concurrent writers.
            let slot: RtcSlot = unsafe { core::ptr::read(&raw const RTC_SLOT) };
            if slot.magic != RTC_MAGIC || slot.len as usize > PAYLOAD_MAX {
                return None;
            }
            postcard::from_bytes(&slot.bytes[..slot.len as usize]).ok()
        }

        #[cfg(not(target_os = "espidf"))]
        {
            let guard = self.sim.borrow();
            let (bytes, len) = guard.as_ref()?;
            postcard::from_bytes(&bytes[..*len]).ok()
        }
    }

    fn store(&mut self, state: &RetainedState) {
        let mut buf = [0u8; PAYLOAD_MAX];
        let len = match postcard::to_slice(state, &mut buf) {
            Ok(used) => used.len(),
            Err(_) => {
                // Unencodable state: drop it and let the next wake start cold.
                warn!("retained state did not fit its slot; discarding");
                return;
            }
        };

        #[cfg(target_os = "espidf")]
        {
            let slot = RtcSlot {
                magic: RTC_MAGIC,
                len: len as u32,
                bytes: buf,
            };
            // SAFETY: sole access from the main task; no concurrent readers.
            unsafe { core::ptr::write(&raw mut RTC_SLOT, slot) };
        }

        #[cfg(not(target_os = "espidf"))]
        {
            *self.sim.borrow_mut() = Some((buf, len));
        }
    }
}
