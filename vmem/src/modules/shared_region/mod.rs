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

mod mmap;
mod sysv;

pub use mmap::MMapRegion;
pub use sysv::SysVSharedMemory;

/// A block of memory that both the manager and the access side can see.
///
/// The region is never handed out as a Rust reference. All accesses go through
/// [`ManagerView`](crate::ManagerView) and [`AccessView`](crate::AccessView),
/// which read and write it via raw pointers.
pub trait SharedRegionModule {
    /// Base address of the region. Stays valid until the module is dropped.
    fn as_ptr(&self) -> *mut u8;

    /// Size of the region in bytes
    fn size(&self) -> usize;
}
