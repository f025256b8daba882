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
use crate::{FrameTable, ManagerView};

/// Counter of a freshly loaded page: its reference is already in the top bit
pub const AGE_SEED: u8 = 0x80;

/// Aging with an 8 bit counter per frame.
///
/// Every `TIME_WINDOW` accesses all counters are shifted right and the `REF`
/// bit of the page is loaded into bit 7. The page with the smallest counter
/// was used least in the recent windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgingPolicy {
    ages: Vec<u8>,
}

impl AgingPolicy {
    pub fn new(nframes: usize) -> Self {
        Self {
            ages: vec![0; nframes],
        }
    }

    /// Smallest counter wins, ties go to the lowest frame.
    pub(crate) fn select_victim(&mut self, req_page: usize, frames: &FrameTable) -> Victim {
        let mut frame = 0;
        for candidate in 1..self.ages.len() {
            if self.ages[candidate] < self.ages[frame] {
                frame = candidate;
            }
        }

        let page = occupant(frames, frame);
        debug!(
            "AGING: evict page {} (age 0x{:02X}) from frame {} for page {}",
            page, self.ages[frame], frame, req_page
        );
        Victim { page, frame }
    }

    pub(crate) fn frame_assigned(&mut self, frame: usize) {
        self.ages[frame] = AGE_SEED;
    }

    /// Shifts every counter and loads the `REF` bit of its page, then clears `REF`.
    pub(crate) fn update_age_reset_ref(&mut self, frames: &FrameTable, view: &mut ManagerView<'_>) {
        for (frame, page) in frames.mapped() {
            let referenced = view.entry(page).is_referenced() as u8;
            self.ages[frame] = (self.ages[frame] >> 1) | (referenced << 7);
            view.clear_ref(page);
        }

        debug!("AGING: updated ages {:02X?}", self.ages);
    }

    #[inline]
    pub fn age(&self, frame: usize) -> u8 {
        self.ages[frame]
    }
}
