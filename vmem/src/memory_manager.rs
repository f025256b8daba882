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

use std::io::{self, Write};

use log::{debug, info, trace};

use crate::{
    modules::{
        channel::{Command, CommandReceiver, Message, Received},
        pagefile::{Pagefile, PagefileModule},
        replacement::{ReplacementPolicy, Victim},
    },
    FaultLogModule, FrameTable, LogEvent, ManagerView, PageTableEntry, PendingSignals, VmemError,
};

/// State of the manager process.
///
/// Owns everything the fault handler touches: the page table (through
/// its [`ManagerView`]), the pagefile, the fault log, the frame table and
/// the state of the replacement policy.
pub struct MemoryManager<'a, P: PagefileModule, L: FaultLogModule> {
    view: ManagerView<'a>,
    pagefile: Pagefile<P>,
    log: L,
    frames: FrameTable,
    policy: ReplacementPolicy,
    pf_count: u32,
}

impl<'a, P: PagefileModule, L: FaultLogModule> MemoryManager<'a, P, L> {
    pub fn new(
        view: ManagerView<'a>,
        pagefile: Pagefile<P>,
        log: L,
        policy: ReplacementPolicy,
    ) -> Self {
        let frames = FrameTable::new(view.config().nframes);
        Self {
            view,
            pagefile,
            log,
            frames,
            policy,
            pf_count: 0,
        }
    }

    /// Serves commands until the access side goes away or `SIGINT` arrives.
    ///
    /// Every received command is acknowledged only after it was handled
    /// completely. Pending dump requests are served between two commands.
    pub fn run<R: CommandReceiver>(
        &mut self,
        receiver: &mut R,
        signals: &PendingSignals,
    ) -> Result<(), VmemError> {
        self.run_with_output(receiver, signals, &mut io::stderr())
    }

    /// Same as [`Self::run`], but dumps are written to `dump_out`.
    pub fn run_with_output<R: CommandReceiver, W: Write>(
        &mut self,
        receiver: &mut R,
        signals: &PendingSignals,
        dump_out: &mut W,
    ) -> Result<(), VmemError> {
        info!("Memory manager running with {} replacement", self.policy.kind());

        loop {
            if signals.take_interrupt() {
                info!("Interrupted, stopping memory manager");
                return Ok(());
            }

            if signals.take_dump() {
                self.dump(dump_out)?;
            }

            match receiver.receive()? {
                Received::Message(message) => {
                    self.dispatch(&message)?;
                    receiver.acknowledge()?;
                }
                Received::Interrupted => continue,
                Received::Closed => {
                    info!("Command channel closed, stopping memory manager");
                    return Ok(());
                }
            }
        }
    }

    /// Handles a single command.
    ///
    /// Unknown commands and pages outside of virtual memory are protocol
    /// violations and reported as errors.
    pub fn dispatch(&mut self, message: &Message) -> Result<(), VmemError> {
        trace!("Received {:?}", message);

        match message.command()? {
            Command::PageFault => {
                let npages = self.view.config().npages;
                let page = usize::try_from(message.value)
                    .ok()
                    .filter(|page| *page < npages)
                    .ok_or(VmemError::InvalidPage(message.value as usize))?;

                self.allocate_page(page, message.g_count())
            }
            Command::TimeInterval => {
                if self.policy.time_interval(&self.frames, &mut self.view) {
                    debug!("Aging tick at g_count {}", message.g_count());
                }
                Ok(())
            }
        }
    }

    /// Loads `req_page` into main memory, evicting a page if no frame is unused.
    pub fn allocate_page(&mut self, req_page: usize, g_count: u32) -> Result<(), VmemError> {
        debug_assert!(!self.view.entry(req_page).is_present());
        self.pf_count += 1;

        let (frame, replaced_page) = match self.frames.find_unused_frame() {
            Some(frame) => (frame, None),
            None => {
                let Victim { page, frame } =
                    self.policy.select_victim(req_page, &self.frames, &mut self.view);
                self.evict(page, frame)?;
                (frame, Some(page))
            }
        };

        self.pagefile.fetch(req_page, self.view.frame_mut(frame))?;
        self.view.set_entry(req_page, PageTableEntry::loaded(frame));
        self.frames.assign(frame, req_page);
        self.policy.frame_assigned(frame);

        let event = LogEvent {
            req_pageno: req_page,
            replaced_page,
            alloc_frame: frame,
            g_count,
            pf_count: self.pf_count,
        };
        trace!("{}", event);
        self.log.log(&event)
    }

    fn evict(&mut self, page: usize, frame: usize) -> Result<(), VmemError> {
        let entry = self.view.entry(page);
        assert!(
            entry.is_present() && entry.frame() == Some(frame),
            "page table entry of victim page {} does not point to frame {}: {:?}",
            page,
            frame,
            entry
        );

        if entry.is_dirty() {
            self.pagefile.store(page, self.view.frame(frame))?;
        }
        self.view.unmap(page);
        Ok(())
    }

    /// Writes page table, aging counters and main memory to `out`.
    pub fn dump<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let config = self.view.config();
        let ncols = 8;

        writeln!(out, "\n======================================")?;
        writeln!(out, "\tPage Table Dump")?;
        writeln!(out, "VIRT MEM SIZE    = \t {}", config.virtmem_size())?;
        writeln!(out, "PHYS MEM SIZE    = \t {}", config.physmem_size())?;
        writeln!(out, "PAGESIZE         = \t {}", config.page_size)?;
        writeln!(out, "Number of Pages  = \t {}", config.npages)?;
        writeln!(out, "Number of Frames = \t {}", config.nframes)?;
        writeln!(out, "======================================")?;
        writeln!(out, "Policy: \t {}", self.policy.kind())?;
        writeln!(out, "pf_count: \t {}", self.pf_count)?;

        for page in 0..config.npages {
            let entry = self.view.entry(page);
            let age = entry.frame().map_or(0, |frame| self.policy.age(frame));
            writeln!(
                out,
                "Page {:5}, Flags {:x}, Frame {:10}, age 0x{:02X}",
                page,
                entry.flags().bits(),
                entry.raw_frame(),
                age
            )?;
        }

        writeln!(out, "\n\n======================================")?;
        writeln!(out, "\tData Dump")?;
        for (i, byte) in self.view.memory().iter().enumerate() {
            write!(out, "{:10x}", byte)?;
            if i % ncols == ncols - 1 {
                writeln!(out)?;
            } else {
                write!(out, "\t")?;
            }
        }
        out.flush()
    }

    #[inline]
    pub fn pf_count(&self) -> u32 {
        self.pf_count
    }

    #[inline]
    pub fn frames(&self) -> &FrameTable {
        &self.frames
    }

    #[inline]
    pub fn policy(&self) -> &ReplacementPolicy {
        &self.policy
    }

    #[inline]
    pub fn pagefile(&self) -> &Pagefile<P> {
        &self.pagefile
    }

    #[inline]
    pub fn log(&self) -> &L {
        &self.log
    }

    #[inline]
    pub fn view(&self) -> &ManagerView<'a> {
        &self.view
    }
}
