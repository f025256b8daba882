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

use log::trace;

use crate::{
    modules::channel::{CommandSender, Message},
    AccessView, VmemError, TIME_WINDOW,
};

/// Byte addressed access to virtual memory.
///
/// Every access is one tick. Every `TIME_WINDOW` ticks the manager is told
/// to age its pages, and a page that is not present is requested from the
/// manager before it is touched.
pub struct VmemAccess<'a, C: CommandSender> {
    view: AccessView<'a>,
    channel: C,
    g_count: u32,
}

impl<'a, C: CommandSender> VmemAccess<'a, C> {
    pub fn new(view: AccessView<'a>, channel: C) -> Self {
        Self {
            view,
            channel,
            g_count: 0,
        }
    }

    pub fn read(&mut self, address: usize) -> Result<u8, VmemError> {
        let (page, offset) = self.split(address)?;
        let frame = self.enter(page)?;

        let value = self.view.read_byte(frame, offset);
        self.view.mark_referenced(page);
        Ok(value)
    }

    pub fn write(&mut self, address: usize, value: u8) -> Result<(), VmemError> {
        let (page, offset) = self.split(address)?;
        let frame = self.enter(page)?;

        self.view.write_byte(frame, offset, value);
        self.view.mark_referenced(page);
        self.view.mark_dirty(page);
        Ok(())
    }

    /// Reads four bytes in little endian order, each of them is a separate access.
    pub fn read_u32(&mut self, address: usize) -> Result<u32, VmemError> {
        let mut bytes = [0u8; 4];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = self.read(address + i)?;
        }
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn write_u32(&mut self, address: usize, value: u32) -> Result<(), VmemError> {
        for (i, byte) in value.to_le_bytes().into_iter().enumerate() {
            self.write(address + i, byte)?;
        }
        Ok(())
    }

    fn split(&self, address: usize) -> Result<(usize, usize), VmemError> {
        let config = self.view.config();
        if address >= config.virtmem_size() {
            return Err(VmemError::InvalidAddress(address));
        }
        Ok((address / config.page_size, address % config.page_size))
    }

    /// Counts the access and makes sure `page` is present, returns its frame.
    ///
    /// The access counter wraps around after `u32::MAX` accesses and travels
    /// as its two's complement bit pattern in the `i32` message field.
    fn enter(&mut self, page: usize) -> Result<usize, VmemError> {
        self.g_count = self.g_count.wrapping_add(1);

        if self.g_count % TIME_WINDOW == 0 {
            trace!("TIME_INTERVAL at g_count {}", self.g_count);
            self.channel.request(Message::time_interval(self.g_count))?;
        }

        if let Some(frame) = self.view.frame_of(page) {
            return Ok(frame);
        }

        trace!("PAGEFAULT for page {} at g_count {}", page, self.g_count);
        let flags = self.view.flags(page);
        self.channel
            .request(Message::page_fault(page, self.g_count, flags))?;

        self.view
            .frame_of(page)
            .ok_or(VmemError::Protocol("page still not present after page fault"))
    }

    /// Number of accesses so far
    #[inline]
    pub fn g_count(&self) -> u32 {
        self.g_count
    }

    #[inline]
    pub fn view(&self) -> &AccessView<'a> {
        &self.view
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        modules::{channel::InlineChannel, replacement::PolicyKind},
        test::{get_test_manager, get_test_region, test_config},
    };

    #[test]
    fn test_g_count_wraps_around() {
        let config = test_config();
        let region = get_test_region(config);
        let mut manager = get_test_manager(&region, config, PolicyKind::Aging);
        let view = AccessView::attach(&region).unwrap();

        {
            let mut access = VmemAccess {
                view,
                channel: InlineChannel::new(&mut manager),
                g_count: u32::MAX - 1,
            };
            access.write(0, 1).unwrap();
            assert_eq!(access.g_count(), u32::MAX);
            access.write(config.page_size, 2).unwrap();
            assert_eq!(access.g_count(), 0);
            assert_eq!(access.read(0).unwrap(), 1);
            assert_eq!(access.g_count(), 1);
        }

        // both faults carry the counter unchanged through the message
        let g_counts: Vec<u32> = manager.log().iter().map(|event| event.g_count).collect();
        assert_eq!(g_counts, vec![u32::MAX, 0]);
    }
}
