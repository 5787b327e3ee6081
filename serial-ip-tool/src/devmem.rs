//! Physical register window mapping through `/dev/mem`.

use std::io;
use std::ptr;

use anyhow::{Context, Result};
use serial_ip_core::regs::Mmio;

/// A page-backed mapping of a physical address range.
pub struct DevMem {
    base: *mut libc::c_void,
    span: usize,
}

impl DevMem {
    /// Map `span` bytes of physical address space starting at `phys`.
    ///
    /// Requires read/write access to `/dev/mem`, so typically root.
    pub fn map(phys: usize, span: usize) -> Result<Self> {
        let fd = unsafe { libc::open(c"/dev/mem".as_ptr(), libc::O_RDWR | libc::O_SYNC) };
        if fd < 0 {
            return Err(io::Error::last_os_error()).context("opening /dev/mem (are you root?)");
        }

        let base = unsafe {
            libc::mmap(
                ptr::null_mut(),
                span,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd,
                phys as libc::off_t,
            )
        };
        let saved = io::Error::last_os_error();
        unsafe { libc::close(fd) };
        if base == libc::MAP_FAILED {
            return Err(saved).with_context(|| format!("mapping {span} bytes at {phys:#x}"));
        }

        Ok(DevMem { base, span })
    }

    /// Register-access capability over the mapped window.
    ///
    /// The returned handle borrows nothing; the caller must keep this
    /// mapping alive for as long as the handle is used.
    pub fn mmio(&self) -> Mmio {
        unsafe { Mmio::new(self.base as *mut u32) }
    }
}

impl Drop for DevMem {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.base, self.span);
        }
    }
}
