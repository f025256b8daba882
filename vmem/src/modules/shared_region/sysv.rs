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

use core::{mem, ptr::null};

use libc::{c_int, c_void, key_t, shmat, shmctl, shmdt, shmget, shmid_ds, IPC_CREAT, IPC_RMID, IPC_STAT};
use log::{error, info, warn};

use super::SharedRegionModule;
use crate::VmemError;

/// System V shared memory segment.
///
/// The manager creates the segment and removes it again once dropped,
/// the access side only attaches to it.
pub struct SysVSharedMemory {
    shm_id: c_int,
    base_ptr: *mut u8,
    size: usize,
    owner: bool,
}

unsafe impl Send for SysVSharedMemory {}
unsafe impl Sync for SysVSharedMemory {}

impl SysVSharedMemory {
    /// Creates (or reuses) the segment for `key` and attaches it.
    ///
    /// A stale segment of a previous run that is too small is removed first.
    pub fn create(key: key_t, size: usize) -> Result<Self, VmemError> {
        let mut shm_id = unsafe { shmget(key, size, 0o664 | IPC_CREAT) };

        if shm_id == -1 && std::io::Error::last_os_error().raw_os_error() == Some(libc::EINVAL) {
            warn!("Removing stale shared memory segment of a previous run");
            let stale_id = unsafe { shmget(key, 0, 0) };
            if stale_id != -1 {
                unsafe { shmctl(stale_id, IPC_RMID, core::ptr::null_mut()) };
            }
            shm_id = unsafe { shmget(key, size, 0o664 | IPC_CREAT) };
        }

        if shm_id == -1 {
            return Err(VmemError::last_os_error("shmget"));
        }

        let region = Self::attach(shm_id, size, true);
        if region.is_err() {
            unsafe { shmctl(shm_id, IPC_RMID, core::ptr::null_mut()) };
        }

        let region = region?;
        info!("Created shared memory segment {} with {} bytes", shm_id, size);
        Ok(region)
    }

    /// Attaches to the segment a manager has already created for `key`.
    pub fn open(key: key_t) -> Result<Self, VmemError> {
        let shm_id = unsafe { shmget(key, 0, 0) };
        if shm_id == -1 {
            return Err(VmemError::last_os_error("shmget"));
        }

        let mut stat: shmid_ds = unsafe { mem::zeroed() };
        if unsafe { shmctl(shm_id, IPC_STAT, &mut stat) } == -1 {
            return Err(VmemError::last_os_error("shmctl(IPC_STAT)"));
        }

        Self::attach(shm_id, stat.shm_segsz as usize, false)
    }

    fn attach(shm_id: c_int, size: usize, owner: bool) -> Result<Self, VmemError> {
        let base_ptr = unsafe { shmat(shm_id, null(), 0) };
        if base_ptr as isize == -1 {
            return Err(VmemError::last_os_error("shmat"));
        }

        Ok(Self {
            shm_id,
            base_ptr: base_ptr as *mut u8,
            size,
            owner,
        })
    }

    pub fn id(&self) -> c_int {
        self.shm_id
    }
}

impl SharedRegionModule for SysVSharedMemory {
    fn as_ptr(&self) -> *mut u8 {
        self.base_ptr
    }

    fn size(&self) -> usize {
        self.size
    }
}

impl Drop for SysVSharedMemory {
    fn drop(&mut self) {
        if self.owner {
            // marked for removal, the kernel frees it once the last process detached
            if unsafe { shmctl(self.shm_id, IPC_RMID, core::ptr::null_mut()) } == -1 {
                error!(
                    "Could not remove shared memory segment {}: {}",
                    self.shm_id,
                    std::io::Error::last_os_error()
                );
            }
        }

        if unsafe { shmdt(self.base_ptr as *const c_void) } == -1 {
            error!(
                "Could not detach shared memory segment {}: {}",
                self.shm_id,
                std::io::Error::last_os_error()
            );
        }
    }
}

#[cfg(test)]
mod test {
    use libc::IPC_PRIVATE;

    use super::*;

    #[test]
    fn test_private_segment_roundtrip() {
        let region = SysVSharedMemory::create(IPC_PRIVATE, 256).unwrap();
        assert_eq!(region.size(), 256);

        let ptr = region.as_ptr();
        unsafe { ptr.add(10).write(42) };
        assert_eq!(unsafe { ptr.add(10).read() }, 42);
        assert!(region.id() >= 0);
    }
}
