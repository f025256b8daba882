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

mod file_pagefile;
mod memory_pagefile;

pub use file_pagefile::FilePagefileModule;
pub use memory_pagefile::MemoryPagefileModule;

use log::trace;

use crate::{VmemConfig, VmemError};

/// Backing store holding the bytes of pages that are not resident.
pub trait PagefileModule {
    /// Reads the region `[offset, offset + dest.len())` into `dest`.
    ///
    /// If this call fails, it could be that already some data was written to `dest`.
    fn read(&mut self, offset: usize, dest: &mut [u8]) -> Result<(), VmemError>;

    /// Writes `src` back to `[offset, offset + src.len())`
    fn write(&mut self, offset: usize, src: &[u8]) -> Result<(), VmemError>;

    /// Returns the maximum size in bytes of this storage
    ///
    /// **It is illegal to read/write across this border!**
    fn get_max_size(&self) -> usize;
}

/// Page-number addressed access to a [`PagefileModule`]
pub struct Pagefile<S: PagefileModule> {
    storage: S,
    page_size: usize,
    page_count: usize,
    fetches: usize,
    stores: usize,
}

impl<S: PagefileModule> Pagefile<S> {
    /// `storage` has to be big enough for every page of `config`.
    pub fn new(storage: S, config: &VmemConfig) -> Result<Self, VmemError> {
        if storage.get_max_size() < config.virtmem_size() {
            return Err(VmemError::InvalidConfig(format!(
                "pagefile has {} bytes, {} are required",
                storage.get_max_size(),
                config.virtmem_size()
            )));
        }

        Ok(Self {
            storage,
            page_size: config.page_size,
            page_count: config.npages,
            fetches: 0,
            stores: 0,
        })
    }

    /// Copies the stored image of `page` into `dest`.
    pub fn fetch(&mut self, page: usize, dest: &mut [u8]) -> Result<(), VmemError> {
        let offset = self.offset_of(page, dest.len())?;
        trace!("Fetch page {} from pagefile", page);

        self.storage.read(offset, dest)?;
        self.fetches += 1;
        Ok(())
    }

    /// Replaces the stored image of `page` with `src`.
    pub fn store(&mut self, page: usize, src: &[u8]) -> Result<(), VmemError> {
        let offset = self.offset_of(page, src.len())?;
        trace!("Store page {} to pagefile", page);

        self.storage.write(offset, src)?;
        self.stores += 1;
        Ok(())
    }

    fn offset_of(&self, page: usize, len: usize) -> Result<usize, VmemError> {
        if page >= self.page_count {
            return Err(VmemError::InvalidPage(page));
        }
        assert_eq!(len, self.page_size, "pagefile transfers whole pages");

        let offset = page * self.page_size;
        debug_assert!(
            offset + len <= self.storage.get_max_size(),
            "page {} ends behind the storage of {} bytes",
            page,
            self.storage.get_max_size()
        );
        Ok(offset)
    }

    /// Number of successful fetches so far
    pub fn fetch_count(&self) -> usize {
        self.fetches
    }

    /// Number of successful stores so far
    pub fn store_count(&self) -> usize {
        self.stores
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    fn gen_number(i: usize) -> u8 {
        (i * 3 + (i % 3) * 7 + (i % 11) * 51) as u8
    }

    /// test if stores keep all data and fetches restore all of it
    pub(crate) fn test_pagefile_normal<S: PagefileModule>(storage: S, config: VmemConfig) {
        let mut pagefile = Pagefile::new(storage, &config).unwrap();
        let mut page_buf = vec![0u8; config.page_size];

        // never stored pages are zero
        for page in 0..config.npages {
            pagefile.fetch(page, &mut page_buf).unwrap();
            assert!(page_buf.iter().all(|b| *b == 0), "page {} not zeroed", page);
        }

        for page in (0..config.npages).rev() {
            for (i, byte) in page_buf.iter_mut().enumerate() {
                *byte = gen_number(page * config.page_size + i);
            }
            pagefile.store(page, &page_buf).unwrap();
        }

        for page in 0..config.npages {
            pagefile.fetch(page, &mut page_buf).unwrap();
            for (i, byte) in page_buf.iter().enumerate() {
                assert_eq!(*byte, gen_number(page * config.page_size + i));
            }
        }

        assert_eq!(pagefile.store_count(), config.npages);
        assert_eq!(pagefile.fetch_count(), 2 * config.npages);
    }

    #[test]
    fn test_page_out_of_range() {
        let config = VmemConfig {
            page_size: 8,
            nframes: 2,
            npages: 4,
        };
        let mut pagefile = Pagefile::new(MemoryPagefileModule::new(32), &config).unwrap();
        let mut buf = [0u8; 8];
        assert!(matches!(
            pagefile.fetch(4, &mut buf),
            Err(VmemError::InvalidPage(4))
        ));
        assert!(pagefile.store(10, &buf).is_err());
        assert_eq!(pagefile.fetch_count(), 0);
    }

    #[test]
    fn test_storage_too_small() {
        let config = VmemConfig {
            page_size: 8,
            nframes: 2,
            npages: 4,
        };
        assert!(Pagefile::new(MemoryPagefileModule::new(31), &config).is_err());
    }
}
