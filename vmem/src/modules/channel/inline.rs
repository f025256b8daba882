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

use super::{CommandSender, Message};
use crate::{modules::pagefile::PagefileModule, FaultLogModule, MemoryManager, VmemError};

/// Hands every request straight to a [`MemoryManager`] in the same thread.
///
/// The command is completely handled when `request` returns, which is
/// exactly what the ack guarantees for the other channels.
pub struct InlineChannel<'m, 'a, P: PagefileModule, L: FaultLogModule> {
    manager: &'m mut MemoryManager<'a, P, L>,
}

impl<'m, 'a, P: PagefileModule, L: FaultLogModule> InlineChannel<'m, 'a, P, L> {
    pub fn new(manager: &'m mut MemoryManager<'a, P, L>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &MemoryManager<'a, P, L> {
        &*self.manager
    }
}

impl<P: PagefileModule, L: FaultLogModule> CommandSender for InlineChannel<'_, '_, P, L> {
    #[inline]
    fn request(&mut self, message: Message) -> Result<(), VmemError> {
        self.manager.dispatch(&message)
    }
}
