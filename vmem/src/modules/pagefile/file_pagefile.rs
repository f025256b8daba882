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

use std::{
    fs::{remove_file, File},
    os::unix::fs::FileExt,
    path::{Path, PathBuf},
};

use log::{debug, warn};

use super::PagefileModule;
use crate::VmemError;

/// Pagefile kept in a regular file.
///
/// Page `n` lives at byte `n * page_size`, every transfer is a single
/// positional read or write. The file only exists while the manager runs
/// and is removed on drop.
pub struct FilePagefileModule {
    file: File,
    path: PathBuf,
    len: usize,
}

impl FilePagefileModule {
    /// Creates (or truncates) the file at `path` with `len` zero bytes.
    pub fn create<P: AsRef<Path>>(path: P, len: usize) -> Result<Self, VmemError> {
        let path = path.as_ref().to_path_buf();
        let file = File::options()
            .read(true)
            .write(true)
            .truncate(true)
            .create(true)
            .open(&path)?;

        // sparse, never stored pages read back as zero
        file.set_len(len as u64)?;
        debug!("Created pagefile {} with {} bytes", path.display(), len);

        Ok(Self { file, path, len })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PagefileModule for FilePagefileModule {
    fn read(&mut self, offset: usize, dest: &mut [u8]) -> Result<(), VmemError> {
        self.file.read_exact_at(dest, offset as u64)?;
        Ok(())
    }

    fn write(&mut self, offset: usize, src: &[u8]) -> Result<(), VmemError> {
        self.file.write_all_at(src, offset as u64)?;
        Ok(())
    }

    fn get_max_size(&self) -> usize {
        self.len
    }
}

impl Drop for FilePagefileModule {
    fn drop(&mut self) {
        // unlinking an open file is fine, the descriptor is closed right after
        if let Err(err) = remove_file(&self.path) {
            warn!("Could not remove pagefile {}: {}", self.path.display(), err);
        }
    }
}
