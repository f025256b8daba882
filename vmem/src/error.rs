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

use std::{error::Error, fmt, io};

#[derive(Debug)]
pub enum VmemError {
    /// A libc call failed, `source` holds the captured `errno`
    Os {
        call: &'static str,
        source: io::Error,
    },
    /// Reading or writing the pagefile or the log file failed
    Io(io::Error),
    InvalidConfig(String),
    /// Byte address outside of the virtual address space
    InvalidAddress(usize),
    /// Page number outside of the page table
    InvalidPage(usize),
    /// Command code that is neither `PAGEFAULT` nor `TIME_INTERVAL`
    UnknownCommand(i32),
    /// The shared region does not hold a valid vmem layout
    BadRegion(&'static str),
    /// The peer did not follow the request/ack protocol
    Protocol(&'static str),
}

impl VmemError {
    /// Captures `errno` of the libc call that just failed.
    pub(crate) fn last_os_error(call: &'static str) -> Self {
        VmemError::Os {
            call,
            source: io::Error::last_os_error(),
        }
    }
}

impl fmt::Display for VmemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmemError::Os { call, source } => write!(f, "{} failed: {}", call, source),
            VmemError::Io(err) => write!(f, "i/o error: {}", err),
            VmemError::InvalidConfig(reason) => write!(f, "invalid configuration: {}", reason),
            VmemError::InvalidAddress(address) => {
                write!(f, "address {} is outside of virtual memory", address)
            }
            VmemError::InvalidPage(page) => write!(f, "page {} does not exist", page),
            VmemError::UnknownCommand(cmd) => write!(f, "unexpected command {} received", cmd),
            VmemError::BadRegion(reason) => write!(f, "bad shared region: {}", reason),
            VmemError::Protocol(reason) => write!(f, "protocol violation: {}", reason),
        }
    }
}

impl Error for VmemError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            VmemError::Os { source, .. } => Some(source),
            VmemError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for VmemError {
    fn from(err: io::Error) -> Self {
        VmemError::Io(err)
    }
}
