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

/// Reverse mapping frame -> page, private to the manager.
///
/// A frame that was used once is never handed back to the unused pool,
/// it only changes its owner when a replacement policy picks it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameTable {
    pages: Vec<Option<usize>>,
}

impl FrameTable {
    pub fn new(nframes: usize) -> Self {
        Self {
            pages: vec![None; nframes],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Page currently held by `frame`
    #[inline]
    pub fn page(&self, frame: usize) -> Option<usize> {
        self.pages[frame]
    }

    #[inline]
    pub(crate) fn assign(&mut self, frame: usize, page: usize) {
        self.pages[frame] = Some(page);
    }

    /// Lowest-indexed frame no page maps to.
    ///
    /// Frames are handed out in ascending order so that log files of two runs can be compared.
    pub fn find_unused_frame(&self) -> Option<usize> {
        self.pages.iter().position(|page| page.is_none())
    }

    pub fn used_frames(&self) -> usize {
        self.pages.iter().filter(|page| page.is_some()).count()
    }

    /// `(frame, page)` for every frame that holds a page
    pub fn mapped(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.pages
            .iter()
            .enumerate()
            .filter_map(|(frame, page)| page.map(|page| (frame, page)))
    }
}

#[cfg(test)]
mod test {
    use super::FrameTable;

    #[test]
    fn test_unused_frames_in_ascending_order() {
        let mut frames = FrameTable::new(3);
        assert_eq!(frames.find_unused_frame(), Some(0));

        frames.assign(0, 10);
        assert_eq!(frames.find_unused_frame(), Some(1));
        frames.assign(1, 4);
        frames.assign(2, 7);
        assert_eq!(frames.find_unused_frame(), None);
        assert_eq!(frames.used_frames(), 3);

        // a new owner does not free the frame
        frames.assign(1, 8);
        assert_eq!(frames.find_unused_frame(), None);
        assert_eq!(frames.page(1), Some(8));
        assert_eq!(frames.mapped().collect::<Vec<_>>(), vec![(0, 10), (1, 8), (2, 7)]);
    }
}
