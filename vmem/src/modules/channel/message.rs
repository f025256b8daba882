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

use static_assertions::assert_eq_size;

use crate::{PteFlags, VmemError, VOID_IDX};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Command {
    PageFault = 1,
    TimeInterval = 2,
}

impl Command {
    pub fn from_code(code: i32) -> Result<Self, VmemError> {
        match code {
            1 => Ok(Command::PageFault),
            2 => Ok(Command::TimeInterval),
            other => Err(VmemError::UnknownCommand(other)),
        }
    }
}

/// Fixed-layout record sent from the access side to the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct Message {
    pub cmd: i32,
    /// requested page for `PAGEFAULT`, unused otherwise
    pub value: i32,
    pub g_count: i32,
    pub flags: i32,
}

assert_eq_size!(Message, [i32; 4]);

impl Message {
    pub fn page_fault(page: usize, g_count: u32, flags: PteFlags) -> Self {
        Self {
            cmd: Command::PageFault as i32,
            value: page as i32,
            g_count: g_count as i32,
            flags: flags.bits() as i32,
        }
    }

    pub fn time_interval(g_count: u32) -> Self {
        Self {
            cmd: Command::TimeInterval as i32,
            value: VOID_IDX,
            g_count: g_count as i32,
            flags: 0,
        }
    }

    #[inline]
    pub fn command(&self) -> Result<Command, VmemError> {
        Command::from_code(self.cmd)
    }

    /// Access counter, the wire field holds its bit pattern
    #[inline]
    pub fn g_count(&self) -> u32 {
        self.g_count as u32
    }
}
