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

mod aging;
mod clock;
mod fifo;

pub use aging::{AgingPolicy, AGE_SEED};
pub use clock::ClockPolicy;
pub use fifo::FifoPolicy;

use core::fmt;

use crate::{FrameTable, ManagerView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyKind {
    #[default]
    Fifo,
    Clock,
    Aging,
}

impl PolicyKind {
    /// Parses a command line flag (`-fifo`, `-clock`, `-aging`), ignoring case.
    pub fn from_flag(flag: &str) -> Option<Self> {
        [PolicyKind::Fifo, PolicyKind::Clock, PolicyKind::Aging]
            .into_iter()
            .find(|kind| kind.flag().eq_ignore_ascii_case(flag))
    }

    pub fn flag(&self) -> &'static str {
        match self {
            PolicyKind::Fifo => "-fifo",
            PolicyKind::Clock => "-clock",
            PolicyKind::Aging => "-aging",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PolicyKind::Fifo => "FIFO",
            PolicyKind::Clock => "CLOCK",
            PolicyKind::Aging => "AGING",
        };
        f.write_str(name)
    }
}

/// Page chosen for replacement and the frame it occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Victim {
    pub page: usize,
    pub frame: usize,
}

/// Page replacement policy together with the state it keeps between faults.
pub enum ReplacementPolicy {
    Fifo(FifoPolicy),
    Clock(ClockPolicy),
    Aging(AgingPolicy),
}

impl ReplacementPolicy {
    pub fn new(kind: PolicyKind, nframes: usize) -> Self {
        match kind {
            PolicyKind::Fifo => ReplacementPolicy::Fifo(FifoPolicy::new(nframes)),
            PolicyKind::Clock => ReplacementPolicy::Clock(ClockPolicy::new(nframes)),
            PolicyKind::Aging => ReplacementPolicy::Aging(AgingPolicy::new(nframes)),
        }
    }

    pub fn kind(&self) -> PolicyKind {
        match self {
            ReplacementPolicy::Fifo(_) => PolicyKind::Fifo,
            ReplacementPolicy::Clock(_) => PolicyKind::Clock,
            ReplacementPolicy::Aging(_) => PolicyKind::Aging,
        }
    }

    /// Picks the frame that `req_page` will be loaded into.
    ///
    /// Must only be called if every frame holds a page.
    pub fn select_victim(
        &mut self,
        req_page: usize,
        frames: &FrameTable,
        view: &mut ManagerView<'_>,
    ) -> Victim {
        debug_assert!(frames.find_unused_frame().is_none());

        match self {
            ReplacementPolicy::Fifo(policy) => policy.select_victim(frames),
            ReplacementPolicy::Clock(policy) => policy.select_victim(frames, view),
            ReplacementPolicy::Aging(policy) => policy.select_victim(req_page, frames),
        }
    }

    /// Called whenever `frame` received a new page
    pub(crate) fn frame_assigned(&mut self, frame: usize) {
        if let ReplacementPolicy::Aging(policy) = self {
            policy.frame_assigned(frame);
        }
    }

    /// Handles a `TIME_INTERVAL`. Only aging reacts to it, for the other
    /// policies resetting `REF` would destroy their information.
    ///
    /// Returns `true` if the tick was applied.
    pub(crate) fn time_interval(&mut self, frames: &FrameTable, view: &mut ManagerView<'_>) -> bool {
        match self {
            ReplacementPolicy::Aging(policy) => {
                policy.update_age_reset_ref(frames, view);
                true
            }
            ReplacementPolicy::Fifo(_) | ReplacementPolicy::Clock(_) => false,
        }
    }

    /// Aging counter of `frame`, 0 for policies without counters
    pub fn age(&self, frame: usize) -> u8 {
        match self {
            ReplacementPolicy::Aging(policy) => policy.age(frame),
            ReplacementPolicy::Fifo(_) | ReplacementPolicy::Clock(_) => 0,
        }
    }
}

/// Page held by `frame`, every frame is in use once a policy is asked.
#[inline]
pub(crate) fn occupant(frames: &FrameTable, frame: usize) -> usize {
    match frames.page(frame) {
        Some(page) => page,
        None => panic!("replacement policy picked unused frame {}", frame),
    }
}
