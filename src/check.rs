//! The debug-check wrapper: parent/child lock discipline and map key/value
//! alternation, enforced at runtime.
//!
//! Rust's borrow checker already prevents the common case of "use a parent
//! container while a child produced from it is still reachable" for free,
//! since a child document borrows its parent's `&mut` stream access. What it
//! *cannot* see is whether an abandoned child was properly drained
//! (`seek_to_end`) before the caller moved on, or whether a map's read_key /
//! read_value calls came in the right order — both of those only show up as
//! a runtime state violation, which is what [`Lock`] and [`MapLock`] track.
//!
//! Selecting the crate's `checked` feature (on by default) makes every field
//! here real; without it the types shrink to zero-sized no-ops and every
//! check call is a constant `Ok(())`; the policy is compiled away rather
//! than selected at runtime.

use crate::error::Result;
#[cfg(feature = "checked")]
use crate::error::Error;

#[cfg(feature = "checked")]
use core::cell::Cell;

/// Tracks whether a container currently has a live, undrained child.
pub(crate) struct Lock {
    #[cfg(feature = "checked")]
    locked: Cell<bool>,
}

impl Lock {
    pub fn new() -> Self {
        Lock {
            #[cfg(feature = "checked")]
            locked: Cell::new(false),
        }
    }

    pub fn check_unlocked(&self) -> Result<()> {
        #[cfg(feature = "checked")]
        if self.locked.get() {
            return Err(Error::BadVariantAccess(
                "parent container was advanced while a child reader was still live; drain it with seek_to_end first",
            ));
        }
        Ok(())
    }

    pub fn lock(&self) {
        #[cfg(feature = "checked")]
        self.locked.set(true);
    }

    pub fn unlock(&self) {
        #[cfg(feature = "checked")]
        self.locked.set(false);
    }
}

/// Like [`Lock`], plus the map-specific key/value alternation flag:
/// `read_value` without a preceding `read_key` that returned
/// `Some`, or two `read_key`s without an intervening `read_value`, are usage
/// errors.
pub(crate) struct MapLock {
    lock: Lock,
    #[cfg(feature = "checked")]
    awaiting_value: Cell<bool>,
}

impl MapLock {
    pub fn new() -> Self {
        MapLock {
            lock: Lock::new(),
            #[cfg(feature = "checked")]
            awaiting_value: Cell::new(false),
        }
    }

    pub fn check_can_read_key(&self) -> Result<()> {
        self.lock.check_unlocked()?;
        #[cfg(feature = "checked")]
        if self.awaiting_value.get() {
            return Err(Error::BadVariantAccess(
                "read_key called again before the previous key's read_value",
            ));
        }
        Ok(())
    }

    pub fn check_can_read_value(&self) -> Result<()> {
        self.lock.check_unlocked()?;
        #[cfg(feature = "checked")]
        if !self.awaiting_value.get() {
            return Err(Error::BadVariantAccess(
                "read_value called without a preceding read_key",
            ));
        }
        Ok(())
    }

    pub fn on_key_produced(&self) {
        #[cfg(feature = "checked")]
        self.awaiting_value.set(true);
    }

    pub fn on_value_produced(&self) {
        #[cfg(feature = "checked")]
        self.awaiting_value.set(false);
    }

    /// The lock a child document produced for the current key or value
    /// locks and unlocks as it is read, same as an array element's.
    pub fn inner(&self) -> &Lock {
        &self.lock
    }
}
