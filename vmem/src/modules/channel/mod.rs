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

mod inline;
mod message;
mod message_queue;
mod rendezvous;

pub use inline::InlineChannel;
pub use message::{Command, Message};
pub use message_queue::MessageQueue;
pub(crate) use message_queue::post_wake;
pub use rendezvous::{rendezvous, RendezvousReceiver, RendezvousSender};

use crate::VmemError;

/// Access side of the command channel.
pub trait CommandSender {
    /// Sends `message` and blocks until the manager acknowledged it.
    ///
    /// Once this returns, all side effects of the command are visible in the shared region.
    fn request(&mut self, message: Message) -> Result<(), VmemError>;
}

/// Outcome of a blocking receive on the manager side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Received {
    Message(Message),
    /// A signal interrupted the wait, nothing was received
    Interrupted,
    /// The access side is gone
    Closed,
}

/// Manager side of the command channel.
pub trait CommandReceiver {
    fn receive(&mut self) -> Result<Received, VmemError>;

    /// Releases the access side that waits for the last received message.
    fn acknowledge(&mut self) -> Result<(), VmemError>;
}
