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

mod error;
mod fault_log;
mod frame_table;
mod memory_manager;
mod page_table;
mod shared_state;
mod signals;
mod util;
mod vmem_access;
mod vmem_config;

#[cfg(test)]
mod test;

pub use error::VmemError;
pub use fault_log::{FaultLogModule, FileFaultLog, LogEvent};
pub use frame_table::FrameTable;
pub use memory_manager::MemoryManager;
pub use page_table::{PageTableEntry, PteFlags};
pub use shared_state::{AccessView, ManagerView, VmemLayout};
pub use signals::{install_signal_handlers, PendingSignals};
pub use util::ipc_key;
pub use vmem_access::VmemAccess;
pub use vmem_config::*;
pub mod modules;
