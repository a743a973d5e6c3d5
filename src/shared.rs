//! Lock-protected array handle.
//!
//! The device has a single cursor, so requests from several callers must not
//! interleave. `SharedSmsa` holds the lock for a whole request.

use spin::Mutex;

use crate::addr::VirtualAddress;
use crate::array::Smsa;
use crate::device::DeviceCursor;
use crate::error::Result;

pub struct SharedSmsa<D: DeviceCursor> {
    inner: Mutex<Smsa<D>>,
}

impl<D: DeviceCursor> SharedSmsa<D> {
    pub fn new(smsa: Smsa<D>) -> Self {
        Self {
            inner: Mutex::new(smsa),
        }
    }

    /// Mount `dev` and wrap the handle.
    pub fn mount(dev: D) -> Result<Self> {
        Ok(Self::new(Smsa::mount(dev)?))
    }

    pub fn read(&self, addr: VirtualAddress, buf: &mut [u8]) -> Result<()> {
        self.inner.lock().read(addr, buf)
    }

    pub fn write(&self, addr: VirtualAddress, buf: &[u8]) -> Result<()> {
        self.inner.lock().write(addr, buf)
    }

    /// Run `f` with exclusive access to the array.
    pub fn with<R>(&self, f: impl FnOnce(&mut Smsa<D>) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn into_inner(self) -> Smsa<D> {
        self.inner.into_inner()
    }
}
