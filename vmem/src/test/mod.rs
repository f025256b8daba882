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

use std::sync::Mutex;

use crate::{
    modules::{
        pagefile::{MemoryPagefileModule, Pagefile},
        replacement::{PolicyKind, ReplacementPolicy},
        shared_region::MMapRegion,
    },
    FrameTable, LogEvent, ManagerView, MemoryManager, PageTableEntry, VmemConfig, VmemLayout,
};

mod invariants;

/// Serializes tests that raise real signals, the handlers share global flags
pub(crate) static SIGNAL_LOCK: Mutex<()> = Mutex::new(());

pub(crate) type TestManager<'a> = MemoryManager<'a, MemoryPagefileModule, Vec<LogEvent>>;

/// 16 pages of 8 bytes, 4 frames
pub(crate) fn test_config() -> VmemConfig {
    VmemConfig {
        page_size: 8,
        nframes: 4,
        npages: 16,
    }
}

pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn get_test_region(config: VmemConfig) -> MMapRegion {
    MMapRegion::new(VmemLayout::new(config).size()).unwrap()
}

pub(crate) fn get_test_manager(region: &MMapRegion, config: VmemConfig, kind: PolicyKind) -> TestManager<'_> {
    init_logging();

    let view = ManagerView::initialize(region, config).unwrap();
    let pagefile = Pagefile::new(MemoryPagefileModule::new(config.virtmem_size()), &config).unwrap();
    MemoryManager::new(view, pagefile, vec![], ReplacementPolicy::new(kind, config.nframes))
}

/// Maps `pages[i]` to frame `i` as the fault handler would do.
pub(crate) fn fill_frames(view: &mut ManagerView<'_>, pages: &[usize]) -> FrameTable {
    let mut frames = FrameTable::new(view.config().nframes);
    for (frame, page) in pages.iter().enumerate() {
        view.set_entry(*page, PageTableEntry::loaded(frame));
        frames.assign(frame, *page);
    }
    frames
}

/// `replaced_page` of every logged fault
pub(crate) fn replaced_pages(log: &[LogEvent]) -> Vec<Option<usize>> {
    log.iter().map(|event| event.replaced_page).collect()
}
