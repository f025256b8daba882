/*
 *  Copyright (C) 2025  Markus Elias Gerber
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use core::ptr::null_mut;

use libc::{
    c_void, mmap, munmap, MAP_ANONYMOUS, MAP_FAILED, MAP_SHARED, PROT_READ, PROT_WRITE,
};
use log::error;

use super::SharedRegionModule;
use crate::VmemError;

/// Anonymous shared mapping.
///
/// Used if manager and access side live in the same process (threads or inline dispatch).
/// The mapping is zero-filled by the kernel.
pub struct MMapRegion {
    base_ptr: *mut u8,
    size: usize,
}

// the region is plain memory, synchronization is done by the request/ack protocol
unsafe impl Send for MMapRegion {}
unsafe impl Sync for MMapRegion {}

impl MMapRegion {
    pub fn new(size: usize) -> Result<Self, VmemError> {
        if size == 0 {
            return Err(VmemError::BadRegion("cannot map an empty region"));
        }

        let base_ptr = unsafe {
            mmap(
                null_mut(),
                size,
                PROT_READ | PROT_WRITE,
                MAP_SHARED | MAP_ANONYMOUS,
                -1,
                0,
            )
        };

        if base_ptr == MAP_FAILED {
            return Err(VmemError::last_os_error("mmap"));
        }

        Ok(Self {
            base_ptr: base_ptr as *mut u8,
            size,
        })
    }
}

impl SharedRegionModule for MMapRegion {
    fn as_ptr(&self) -> *mut u8 {
        self.base_ptr
    }

    fn size(&self) -> usize {
        self.size
    }
}

impl Drop for MMapRegion {
    fn drop(&mut self) {
        let code = unsafe { munmap(self.base_ptr as *mut c_void, self.size) };

        if code != 0 {
            error!("Could not unmap shared region: {}", std::io::Error::last_os_error());
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mmap_region_is_zeroed_and_writable() {
        let region = MMapRegion::new(4096).unwrap();
        assert_eq!(region.size(), 4096);

        let ptr = region.as_ptr();
        for i in 0..region.size() {
            assert_eq!(unsafe { ptr.add(i).read() }, 0);
        }

        unsafe { ptr.add(100).write(0xAB) };
        assert_eq!(unsafe { ptr.add(100).read() }, 0xAB);
    }

    #[test]
    fn test_mmap_region_empty() {
        assert!(MMapRegion::new(0).is_err());
    }
}
