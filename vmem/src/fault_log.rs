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
    fmt,
    fs::File,
    io::{BufWriter, Write},
};

use crate::{VmemError, VOID_IDX};

/// Record of one handled page fault, written as one line of the fault log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogEvent {
    pub req_pageno: usize,
    /// page that had to leave main memory, `None` if an unused frame was taken
    pub replaced_page: Option<usize>,
    pub alloc_frame: usize,
    pub g_count: u32,
    pub pf_count: u32,
}

#[inline]
fn index_or_void(index: Option<usize>) -> i64 {
    index.map_or(VOID_IDX as i64, |index| index as i64)
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Page fault {:>10}, Global count {:>10}: Removed: {:>10}, Allocated: {:>10}, Frame: {:>10}",
            self.pf_count,
            self.g_count,
            index_or_void(self.replaced_page),
            self.req_pageno,
            self.alloc_frame
        )
    }
}

/// Append-only sink for fault records.
pub trait FaultLogModule {
    fn log(&mut self, event: &LogEvent) -> Result<(), VmemError>;
}

impl FaultLogModule for Vec<LogEvent> {
    fn log(&mut self, event: &LogEvent) -> Result<(), VmemError> {
        self.push(*event);
        Ok(())
    }
}

/// Writes one text line per fault into a log file
pub struct FileFaultLog {
    writer: BufWriter<File>,
}

impl FileFaultLog {
    /// Creates (or truncates) the log file at `path`.
    pub fn create(path: &str) -> Result<Self, VmemError> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl FaultLogModule for FileFaultLog {
    fn log(&mut self, event: &LogEvent) -> Result<(), VmemError> {
        writeln!(self.writer, "{}", event)?;
        // the manager may be torn down by a signal at any time
        self.writer.flush()?;
        Ok(())
    }
}
