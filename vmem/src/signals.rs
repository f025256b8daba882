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

use core::{
    mem,
    ptr::null_mut,
    sync::atomic::{AtomicBool, AtomicI32, Ordering},
};

use log::debug;

use crate::{modules::channel::post_wake, VmemError};

/// Signals that arrived but were not handled yet.
///
/// The handlers only store into these flags, the manager loop picks them up
/// between two commands.
#[derive(Debug)]
pub struct PendingSignals {
    dump: AtomicBool,
    interrupt: AtomicBool,
}

impl PendingSignals {
    pub const fn new() -> Self {
        Self {
            dump: AtomicBool::new(false),
            interrupt: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn request_dump(&self) {
        self.dump.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn request_interrupt(&self) {
        self.interrupt.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once for every dump request
    #[inline]
    pub fn take_dump(&self) -> bool {
        self.dump.swap(false, Ordering::SeqCst)
    }

    #[inline]
    pub fn take_interrupt(&self) -> bool {
        self.interrupt.swap(false, Ordering::SeqCst)
    }
}

impl Default for PendingSignals {
    fn default() -> Self {
        Self::new()
    }
}

static PENDING_SIGNALS: PendingSignals = PendingSignals::new();

/// Id of the message queue the manager blocks on, `-1` if none
static WAKE_QUEUE: AtomicI32 = AtomicI32::new(-1);

/// Lets the handlers post a wake message to `queue_id`.
///
/// A signal that arrives after the manager checked its flags but before it
/// blocked in `msgrcv` does not interrupt anything. The wake message makes
/// that receive return anyway.
pub(crate) fn register_wake_queue(queue_id: libc::c_int) {
    WAKE_QUEUE.store(queue_id, Ordering::SeqCst);
}

pub(crate) fn unregister_wake_queue(queue_id: libc::c_int) {
    let _ = WAKE_QUEUE.compare_exchange(queue_id, -1, Ordering::SeqCst, Ordering::SeqCst);
}

extern "C" fn signal_handler(sig: libc::c_int) {
    let saved_errno = unsafe { *libc::__errno_location() };

    match sig {
        libc::SIGUSR2 => PENDING_SIGNALS.request_dump(),
        libc::SIGINT => PENDING_SIGNALS.request_interrupt(),
        _ => return,
    }

    let queue_id = WAKE_QUEUE.load(Ordering::SeqCst);
    if queue_id != -1 {
        post_wake(queue_id);
    }

    unsafe { *libc::__errno_location() = saved_errno };
}

fn setup_handler(sig: libc::c_int, call: &'static str) -> Result<(), VmemError> {
    let mut new: libc::sigaction = unsafe { mem::zeroed() };
    new.sa_sigaction = signal_handler as usize;
    // no SA_RESTART: a blocked msgrcv has to return with EINTR
    new.sa_flags = 0;

    unsafe {
        libc::sigemptyset(&mut new.sa_mask);
        if libc::sigaction(sig, &new, null_mut()) != 0 {
            return Err(VmemError::last_os_error(call));
        }
    }
    Ok(())
}

/// Installs the handlers for `SIGUSR2` (dump) and `SIGINT` (teardown).
pub fn install_signal_handlers() -> Result<&'static PendingSignals, VmemError> {
    setup_handler(libc::SIGUSR2, "sigaction(SIGUSR2)")?;
    setup_handler(libc::SIGINT, "sigaction(SIGINT)")?;

    debug!("Installed handlers for SIGUSR2 and SIGINT");
    Ok(&PENDING_SIGNALS)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::SIGNAL_LOCK;

    #[test]
    fn test_pending_signals_are_taken_once() {
        let signals = PendingSignals::new();
        assert!(!signals.take_dump());
        assert!(!signals.take_interrupt());

        signals.request_dump();
        signals.request_dump();
        assert!(signals.take_dump());
        assert!(!signals.take_dump());
        assert!(!signals.take_interrupt());

        signals.request_interrupt();
        assert!(signals.take_interrupt());
        assert!(!signals.take_interrupt());
    }

    #[test]
    fn test_raised_signal_sets_flag() {
        let _guard = SIGNAL_LOCK.lock().unwrap_or_else(|err| err.into_inner());
        let signals = install_signal_handlers().unwrap();
        let _ = signals.take_dump();

        assert_eq!(unsafe { libc::raise(libc::SIGUSR2) }, 0);
        assert!(signals.take_dump());
        assert!(!signals.take_dump());
    }
}
