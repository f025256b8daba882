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

use core::mem::size_of;
use std::io;

use libc::{
    c_int, c_long, c_void, key_t, msgctl, msgget, msgrcv, msgsnd, IPC_CREAT, IPC_NOWAIT, IPC_RMID,
};
use log::{debug, error, trace};
use memoffset::offset_of;

use super::{CommandReceiver, CommandSender, Message, Received};
use crate::{
    signals::{register_wake_queue, unregister_wake_queue},
    VmemError,
};

/// `mtype` of commands sent to the manager
const COMMAND_TYPE: c_long = 1;

/// `mtype` of acks sent back to the access side
const ACK_TYPE: c_long = 2;

/// `cmd` of the command a signal handler posts to wake the manager
const WAKE_CMD: i32 = 0;

/// Buffer layout `msgsnd`/`msgrcv` expect: the type followed by the payload
#[repr(C)]
struct QueueBuffer {
    mtype: c_long,
    body: Message,
}

impl QueueBuffer {
    fn empty() -> Self {
        Self {
            mtype: 0,
            body: Message {
                cmd: 0,
                value: 0,
                g_count: 0,
                flags: 0,
            },
        }
    }
}

/// Size of the payload, `msgsnd` does not count `mtype`
#[inline]
fn body_size() -> usize {
    size_of::<QueueBuffer>() - offset_of!(QueueBuffer, body)
}

/// Posts a wake command to `queue_id` without blocking.
///
/// Only does a single syscall, so it may be called from a signal handler. A
/// full queue is ignored: the manager will not block on it anyway.
pub(crate) fn post_wake(queue_id: c_int) {
    let mut buffer = QueueBuffer::empty();
    buffer.mtype = COMMAND_TYPE;
    buffer.body.cmd = WAKE_CMD;

    unsafe {
        msgsnd(
            queue_id,
            &buffer as *const QueueBuffer as *const c_void,
            body_size(),
            IPC_NOWAIT,
        )
    };
}

/// System V message queue carrying commands (type 1) and acks (type 2).
///
/// The manager creates the queue and removes it on drop.
pub struct MessageQueue {
    queue_id: c_int,
    owner: bool,
    pending_ack: bool,
}

impl MessageQueue {
    pub fn create(key: key_t) -> Result<Self, VmemError> {
        let queue_id = unsafe { msgget(key, 0o664 | IPC_CREAT) };
        if queue_id == -1 {
            return Err(VmemError::last_os_error("msgget"));
        }

        let queue = Self {
            queue_id,
            owner: true,
            pending_ack: false,
        };
        queue.drain_stale_messages();

        debug!("Created message queue {}", queue_id);
        Ok(queue)
    }

    pub fn open(key: key_t) -> Result<Self, VmemError> {
        let queue_id = unsafe { msgget(key, 0) };
        if queue_id == -1 {
            return Err(VmemError::last_os_error("msgget"));
        }

        Ok(Self {
            queue_id,
            owner: false,
            pending_ack: false,
        })
    }

    /// Makes `SIGINT` and `SIGUSR2` wake a manager blocked on this queue,
    /// no matter whether they arrive before or during `msgrcv`.
    pub fn wake_on_signals(&self) {
        register_wake_queue(self.queue_id);
        debug!("Signals wake message queue {}", self.queue_id);
    }

    /// A queue reused from a crashed run may still hold messages
    fn drain_stale_messages(&self) {
        let mut buffer = QueueBuffer::empty();
        let mut drained = 0;
        loop {
            let res = unsafe {
                msgrcv(
                    self.queue_id,
                    &mut buffer as *mut QueueBuffer as *mut c_void,
                    body_size(),
                    0,
                    IPC_NOWAIT,
                )
            };
            if res == -1 {
                break;
            }
            drained += 1;
        }

        if drained > 0 {
            debug!("Dropped {} stale message(s)", drained);
        }
    }

    fn send(&self, mtype: c_long, body: Message, size: usize) -> Result<(), VmemError> {
        let buffer = QueueBuffer { mtype, body };

        loop {
            let res = unsafe {
                msgsnd(
                    self.queue_id,
                    &buffer as *const QueueBuffer as *const c_void,
                    size,
                    0,
                )
            };
            if res == 0 {
                return Ok(());
            }

            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(VmemError::Os {
                    call: "msgsnd",
                    source: err,
                });
            }
        }
    }

    /// Blocks for a message of type `mtype`, `Ok(None)` if a signal interrupted the wait.
    fn receive_type(&self, mtype: c_long) -> Result<Option<Message>, VmemError> {
        let mut buffer = QueueBuffer::empty();
        let res = unsafe {
            msgrcv(
                self.queue_id,
                &mut buffer as *mut QueueBuffer as *mut c_void,
                body_size(),
                mtype,
                0,
            )
        };

        if res == -1 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(None);
            }
            return Err(VmemError::Os {
                call: "msgrcv",
                source: err,
            });
        }

        Ok(Some(buffer.body))
    }
}

impl CommandSender for MessageQueue {
    fn request(&mut self, message: Message) -> Result<(), VmemError> {
        trace!("Sending {:?}", message);
        self.send(COMMAND_TYPE, message, body_size())?;

        // the access side has no handlers installed, an interrupted wait is simply restarted
        while self.receive_type(ACK_TYPE)?.is_none() {}

        Ok(())
    }
}

impl CommandReceiver for MessageQueue {
    fn receive(&mut self) -> Result<Received, VmemError> {
        if self.pending_ack {
            return Err(VmemError::Protocol("previous message was not acknowledged"));
        }

        match self.receive_type(COMMAND_TYPE) {
            Ok(Some(message)) if message.cmd == WAKE_CMD => {
                trace!("Woken up by a signal");
                Ok(Received::Interrupted)
            }
            Ok(Some(message)) => {
                self.pending_ack = true;
                Ok(Received::Message(message))
            }
            Ok(None) => Ok(Received::Interrupted),
            Err(VmemError::Os { source, .. })
                if matches!(source.raw_os_error(), Some(libc::EIDRM) | Some(libc::EINVAL)) =>
            {
                Ok(Received::Closed)
            }
            Err(err) => Err(err),
        }
    }

    fn acknowledge(&mut self) -> Result<(), VmemError> {
        if !self.pending_ack {
            return Err(VmemError::Protocol("nothing to acknowledge"));
        }

        self.pending_ack = false;
        // an ack has no payload
        let empty = QueueBuffer::empty().body;
        self.send(ACK_TYPE, empty, 0)
    }
}

impl Drop for MessageQueue {
    fn drop(&mut self) {
        unregister_wake_queue(self.queue_id);
        if !self.owner {
            return;
        }

        if unsafe { msgctl(self.queue_id, IPC_RMID, core::ptr::null_mut()) } == -1 {
            error!(
                "Could not remove message queue {}: {}",
                self.queue_id,
                io::Error::last_os_error()
            );
        }
    }
}

#[cfg(test)]
mod test {
    use std::{thread, time::Duration};

    use libc::IPC_PRIVATE;

    use super::*;
    use crate::{install_signal_handlers, test::SIGNAL_LOCK, PteFlags};

    #[test]
    fn test_body_size() {
        assert_eq!(body_size(), size_of::<Message>());
    }

    #[test]
    fn test_private_queue_request_and_ack() {
        let mut manager_end = MessageQueue::create(IPC_PRIVATE).unwrap();
        let mut access_end = MessageQueue {
            queue_id: manager_end.queue_id,
            owner: false,
            pending_ack: false,
        };

        let access = thread::spawn(move || {
            access_end
                .request(Message::page_fault(5, 11, PteFlags::empty()))
                .unwrap();
            access_end.request(Message::time_interval(20)).unwrap();
        });

        for expected in [
            Message::page_fault(5, 11, PteFlags::empty()),
            Message::time_interval(20),
        ] {
            let received = loop {
                match manager_end.receive().unwrap() {
                    Received::Message(message) => break message,
                    Received::Interrupted => continue,
                    Received::Closed => panic!("queue closed"),
                }
            };
            assert_eq!(received, expected);
            manager_end.acknowledge().unwrap();
        }

        access.join().unwrap();
        assert!(manager_end.acknowledge().is_err());
    }

    #[test]
    fn test_sigint_interrupts_blocked_receive() {
        let _guard = SIGNAL_LOCK.lock().unwrap_or_else(|err| err.into_inner());
        let signals = install_signal_handlers().unwrap();
        let _ = signals.take_interrupt();

        let mut queue = MessageQueue::create(IPC_PRIVATE).unwrap();
        queue.wake_on_signals();

        let receiving_thread = unsafe { libc::pthread_self() };
        let killer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            assert_eq!(unsafe { libc::pthread_kill(receiving_thread, libc::SIGINT) }, 0);
        });

        // nothing is ever sent, only the signal can end this wait
        assert_eq!(queue.receive().unwrap(), Received::Interrupted);
        killer.join().unwrap();

        assert!(signals.take_interrupt());
        // a wake is not a command, there is nothing to acknowledge
        assert!(queue.acknowledge().is_err());
    }

    #[test]
    fn test_signal_before_receive_is_not_lost() {
        let _guard = SIGNAL_LOCK.lock().unwrap_or_else(|err| err.into_inner());
        let signals = install_signal_handlers().unwrap();
        let _ = signals.take_interrupt();

        let mut queue = MessageQueue::create(IPC_PRIVATE).unwrap();
        queue.wake_on_signals();

        // arrives after the flags were checked, before msgrcv blocks
        assert_eq!(unsafe { libc::raise(libc::SIGINT) }, 0);

        assert_eq!(queue.receive().unwrap(), Received::Interrupted);
        assert!(signals.take_interrupt());
    }

    #[test]
    fn test_wake_is_not_delivered_as_command() {
        let mut queue = MessageQueue::create(IPC_PRIVATE).unwrap();

        post_wake(queue.queue_id);
        queue
            .send(COMMAND_TYPE, Message::time_interval(20), body_size())
            .unwrap();

        assert_eq!(queue.receive().unwrap(), Received::Interrupted);
        assert_eq!(
            queue.receive().unwrap(),
            Received::Message(Message::time_interval(20))
        );
        queue.acknowledge().unwrap();
    }
}
