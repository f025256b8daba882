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

use log::debug;

use super::{occupant, Victim};
use crate::FrameTable;

/// First in, first out.
///
/// Unused frames are filled in ascending order, so a cursor running over the
/// frames always points at the page that is resident the longest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FifoPolicy {
    next: usize,
    nframes: usize,
}

impl FifoPolicy {
    pub fn new(nframes: usize) -> Self {
        Self { next: 0, nframes }
    }

    pub(crate) fn select_victim(&mut self, frames: &FrameTable) -> Victim {
        let frame = self.next;
        let page = occupant(frames, frame);
        self.next = (self.next + 1) % self.nframes;

        debug!("FIFO: evict page {} from frame {}", page, frame);
        Victim { page, frame }
    }
}
