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

use std::sync::mpsc::{sync_channel, Receiver, SyncSender};

use log::trace;

use super::{CommandReceiver, CommandSender, Message, Received};
use crate::VmemError;

/// Creates a connected pair of channel ends for a manager and an access side
/// that run on two threads of the same process.
///
/// Commands and acks each travel over a channel with capacity 1.
pub fn rendezvous() -> (RendezvousSender, RendezvousReceiver) {
    let (command_tx, command_rx) = sync_channel(1);
    let (ack_tx, ack_rx) = sync_channel(1);

    (
        RendezvousSender {
            commands: command_tx,
            acks: ack_rx,
        },
        RendezvousReceiver {
            commands: command_rx,
            acks: ack_tx,
            pending_ack: false,
        },
    )
}

pub struct RendezvousSender {
    commands: SyncSender<Message>,
    acks: Receiver<()>,
}

impl CommandSender for RendezvousSender {
    fn request(&mut self, message: Message) -> Result<(), VmemError> {
        trace!("Sending {:?}", message);

        self.commands
            .send(message)
            .map_err(|_| VmemError::Protocol("manager hung up"))?;
        self.acks
            .recv()
            .map_err(|_| VmemError::Protocol("manager hung up before acknowledging"))
    }
}

pub struct RendezvousReceiver {
    commands: Receiver<Message>,
    acks: SyncSender<()>,
    pending_ack: bool,
}

impl CommandReceiver for RendezvousReceiver {
    fn receive(&mut self) -> Result<Received, VmemError> {
        if self.pending_ack {
            return Err(VmemError::Protocol("previous message was not acknowledged"));
        }

        match self.commands.recv() {
            Ok(message) => {
                self.pending_ack = true;
                Ok(Received::Message(message))
            }
            Err(_) => Ok(Received::Closed),
        }
    }

    fn acknowledge(&mut self) -> Result<(), VmemError> {
        if !self.pending_ack {
            return Err(VmemError::Protocol("nothing to acknowledge"));
        }

        self.pending_ack = false;
        self.acks
            .send(())
            .map_err(|_| VmemError::Protocol("access side hung up before the ack"))
    }
}

#[cfg(test)]
mod test {
    use std::thread;

    use super::*;
    use crate::PteFlags;

    #[test]
    fn test_request_waits_for_ack() {
        let (mut sender, mut receiver) = rendezvous();

        let manager = thread::spawn(move || {
            let mut received = vec![];
            loop {
                match receiver.receive().unwrap() {
                    Received::Message(message) => {
                        received.push(message);
                        receiver.acknowledge().unwrap();
                    }
                    Received::Closed => break,
                    Received::Interrupted => unreachable!(),
                }
            }
            received
        });

        sender
            .request(Message::page_fault(3, 1, PteFlags::empty()))
            .unwrap();
        sender.request(Message::time_interval(20)).unwrap();
        drop(sender);

        let received = manager.join().unwrap();
        assert_eq!(
            received,
            vec![
                Message::page_fault(3, 1, PteFlags::empty()),
                Message::time_interval(20)
            ]
        );
    }

    #[test]
    fn test_double_receive_is_rejected() {
        let (mut sender, mut receiver) = rendezvous();

        let access = thread::spawn(move || {
            sender.request(Message::time_interval(20))
        });

        assert!(matches!(receiver.receive().unwrap(), Received::Message(_)));
        assert!(receiver.receive().is_err());

        receiver.acknowledge().unwrap();
        assert!(receiver.acknowledge().is_err());
        access.join().unwrap().unwrap();
    }

    #[test]
    fn test_request_without_manager() {
        let (mut sender, receiver) = rendezvous();
        drop(receiver);
        assert!(sender.request(Message::time_interval(20)).is_err());
    }
}
