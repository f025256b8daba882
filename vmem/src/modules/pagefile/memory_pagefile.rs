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

use super::PagefileModule;
use crate::VmemError;

/// Pagefile kept in memory, starts zero-filled
pub struct MemoryPagefileModule {
    data: Vec<u8>,
}

impl MemoryPagefileModule {
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0; size],
        }
    }

    /// Raw contents, useful to check what was written back
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl PagefileModule for MemoryPagefileModule {
    fn read(&mut self, offset: usize, dest: &mut [u8]) -> Result<(), VmemError> {
        debug_assert!(offset + dest.len() <= self.data.len());
        dest.copy_from_slice(&self.data[offset..offset + dest.len()]);
        Ok(())
    }

    fn write(&mut self, offset: usize, src: &[u8]) -> Result<(), VmemError> {
        debug_assert!(offset + src.len() <= self.data.len());
        self.data[offset..offset + src.len()].copy_from_slice(src);
        Ok(())
    }

    fn get_max_size(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod test {
    use super::MemoryPagefileModule;
    use crate::{modules::pagefile::test::test_pagefile_normal, VmemConfig};

    #[test]
    fn test_memory_pagefile_module_normal() {
        let config = VmemConfig::default();
        test_pagefile_normal(MemoryPagefileModule::new(config.virtmem_size()), config);
    }
}
