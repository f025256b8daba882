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

use static_assertions::const_assert;

use crate::VmemError;

/// Page sizes the simulator can be configured with
pub const SUPPORTED_PAGE_SIZES: [usize; 4] = [8, 16, 32, 64];

pub const DEFAULT_PAGESIZE: usize = 8;
pub const DEFAULT_VIRTMEMSIZE: usize = 1024;
pub const DEFAULT_PHYSMEMSIZE: usize = 128;

/// Access ticks between two aging updates
pub const TIME_WINDOW: u32 = 20;

/// "No such index" on every fixed-layout surface (page table, messages, log lines)
pub const VOID_IDX: i32 = -1;

/// Both processes derive the IPC key from this path and project id
pub const SHM_KEY_PATH: &str = "/tmp";
pub const SHM_PROJECT_ID: u8 = b'C';

pub const PAGEFILE_PATH: &str = "./pagefile.bin";
pub const LOGFILE_PATH: &str = "./logfile.txt";

/// Environment variable that overrides the page size of the manager
pub const PAGESIZE_ENV: &str = "VMEM_PAGESIZE";

const_assert!(TIME_WINDOW > 0);
const_assert!(DEFAULT_VIRTMEMSIZE >= DEFAULT_PHYSMEMSIZE);
const_assert!(DEFAULT_PHYSMEMSIZE % DEFAULT_PAGESIZE == 0);

/// Geometry of the simulated memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmemConfig {
    /// size of a page (and a frame) in bytes
    pub page_size: usize,

    /// number of frames of physical memory
    pub nframes: usize,

    /// number of entries of the page table
    pub npages: usize,
}

impl Default for VmemConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGESIZE,
            nframes: DEFAULT_PHYSMEMSIZE / DEFAULT_PAGESIZE,
            npages: DEFAULT_VIRTMEMSIZE / DEFAULT_PAGESIZE,
        }
    }
}

impl VmemConfig {
    /// Default memory sizes split into pages of `page_size` bytes.
    pub fn with_page_size(page_size: usize) -> Result<Self, VmemError> {
        let config = Self {
            page_size,
            nframes: DEFAULT_PHYSMEMSIZE / page_size.max(1),
            npages: DEFAULT_VIRTMEMSIZE / page_size.max(1),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reads the page size from `VMEM_PAGESIZE`, falls back to the defaults if unset.
    pub fn from_env() -> Result<Self, VmemError> {
        match std::env::var(PAGESIZE_ENV) {
            Ok(value) => {
                let page_size = value.trim().parse::<usize>().map_err(|_| {
                    VmemError::InvalidConfig(format!("{}={} is not a number", PAGESIZE_ENV, value))
                })?;
                Self::with_page_size(page_size)
            }
            Err(std::env::VarError::NotPresent) => Ok(Self::default()),
            Err(err) => Err(VmemError::InvalidConfig(format!("{}: {}", PAGESIZE_ENV, err))),
        }
    }

    pub fn validate(&self) -> Result<(), VmemError> {
        if !SUPPORTED_PAGE_SIZES.contains(&self.page_size) {
            return Err(VmemError::InvalidConfig(format!(
                "page size {} is not one of {:?}",
                self.page_size, SUPPORTED_PAGE_SIZES
            )));
        }
        if self.nframes == 0 {
            return Err(VmemError::InvalidConfig("at least one frame is required".into()));
        }
        if self.npages < self.nframes {
            return Err(VmemError::InvalidConfig(format!(
                "{} pages cannot be fewer than {} frames",
                self.npages, self.nframes
            )));
        }
        if self.virtmem_size() > i32::MAX as usize {
            return Err(VmemError::InvalidConfig("virtual memory too large".into()));
        }
        Ok(())
    }

    #[inline]
    pub fn physmem_size(&self) -> usize {
        self.nframes * self.page_size
    }

    #[inline]
    pub fn virtmem_size(&self) -> usize {
        self.npages * self.page_size
    }
}
