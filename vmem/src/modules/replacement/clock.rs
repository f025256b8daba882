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

use log::{debug, trace};

use super::{occupant, Victim};
use crate::{FrameTable, ManagerView};

/// Second chance.
///
/// The hand skips (and clears) referenced pages. After one full turn every
/// `REF` bit is cleared, so the loop ends after at most `nframes + 1` steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockPolicy {
    hand: usize,
    nframes: usize,
}

impl ClockPolicy {
    pub fn new(nframes: usize) -> Self {
        Self { hand: 0, nframes }
    }

    pub(crate) fn select_victim(
        &mut self,
        frames: &FrameTable,
        view: &mut ManagerView<'_>,
    ) -> Victim {
        loop {
            let page = occupant(frames, self.hand);

            if view.entry(page).is_referenced() {
                trace!("CLOCK: second chance for page {} in frame {}", page, self.hand);
                view.clear_ref(page);
                self.advance();
                continue;
            }

            let victim = Victim {
                page,
                frame: self.hand,
            };
            self.advance();

            debug!("CLOCK: evict page {} from frame {}", victim.page, victim.frame);
            return victim;
        }
    }

    #[inline]
    fn advance(&mut self) {
        self.hand = (self.hand + 1) % self.nframes;
    }

    /// Frame the hand currently points to
    pub fn hand(&self) -> usize {
        self.hand
    }
}
