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

use rand::{rngs::SmallRng, RngCore, SeedableRng};

use super::{get_test_manager, get_test_region, test_config, TestManager};
use crate::{
    modules::{channel::InlineChannel, replacement::PolicyKind},
    AccessView, PteFlags, VmemAccess,
};

/// Checks the page table against the frame table of the manager.
fn check_consistency(manager: &TestManager<'_>) {
    let view = manager.view();
    let config = view.config();
    let mut owners = vec![None; config.nframes];

    for page in 0..config.npages {
        let entry = view.entry(page);
        if !entry.is_present() {
            assert_eq!(entry.frame(), None, "page {} not present but mapped", page);
            continue;
        }

        let frame = entry.frame().unwrap();
        assert!(frame < config.nframes);
        assert_eq!(owners[frame], None, "frame {} mapped twice", frame);
        owners[frame] = Some(page);
        assert_eq!(manager.frames().page(frame), Some(page));
    }

    assert_eq!(manager.frames().used_frames(), owners.iter().flatten().count());
    assert_eq!(manager.log().len(), manager.pf_count() as usize);
}

fn run_random_accesses(kind: PolicyKind, seed: u64) {
    const ITERATIONS: usize = 2000;

    let config = test_config();
    let region = get_test_region(config);
    let mut manager = get_test_manager(&region, config, kind);
    let view = AccessView::attach(&region).unwrap();
    let mut access = VmemAccess::new(view, InlineChannel::new(&mut manager));

    let mut rand = SmallRng::seed_from_u64(seed);
    let mut shadow = vec![0u8; config.virtmem_size()];

    for i in 0..ITERATIONS {
        // keep most accesses on a few pages so that the policies matter
        let page = if rand.next_u32() % 4 == 0 {
            rand.next_u32() as usize % config.npages
        } else {
            rand.next_u32() as usize % 6
        };
        let address = page * config.page_size + rand.next_u32() as usize % config.page_size;

        if rand.next_u32() % 3 == 0 {
            let value = rand.next_u32() as u8;
            access.write(address, value).unwrap();
            shadow[address] = value;
            assert!(access.view().flags(page).contains(PteFlags::DIRTY));
        } else {
            assert_eq!(
                access.read(address).unwrap(),
                shadow[address],
                "iteration {}: wrong value at address {}",
                i,
                address
            );
        }

        assert!(access.view().frame_of(page).is_some());
        check_consistency(access.channel().manager());
    }

    assert_eq!(access.g_count(), ITERATIONS as u32);

    // log is ordered and counts every fault once
    let log = access.channel().manager().log();
    for (i, event) in log.iter().enumerate() {
        assert_eq!(event.pf_count, i as u32 + 1);
        assert!(event.g_count >= 1 && event.g_count <= ITERATIONS as u32);
        if i < config.nframes {
            assert_eq!(event.replaced_page, None);
            assert_eq!(event.alloc_frame, i);
        } else {
            assert!(event.replaced_page.is_some());
        }
    }
    assert!(log.windows(2).all(|pair| pair[0].g_count < pair[1].g_count));
}

#[test]
fn test_random_accesses_fifo() {
    run_random_accesses(PolicyKind::Fifo, 0x5EED_0001);
}

#[test]
fn test_random_accesses_clock() {
    run_random_accesses(PolicyKind::Clock, 0x5EED_0002);
}

#[test]
fn test_random_accesses_aging() {
    run_random_accesses(PolicyKind::Aging, 0x5EED_0003);
}

#[test]
fn test_same_trace_same_log() {
    fn trace_log(kind: PolicyKind) -> Vec<String> {
        let config = test_config();
        let region = get_test_region(config);
        let mut manager = get_test_manager(&region, config, kind);
        let view = AccessView::attach(&region).unwrap();
        let mut access = VmemAccess::new(view, InlineChannel::new(&mut manager));

        let mut rand = SmallRng::seed_from_u64(77);
        for _ in 0..500 {
            let address = rand.next_u32() as usize % config.virtmem_size();
            access.read(address).unwrap();
        }
        drop(access);

        manager.log().iter().map(|event| event.to_string()).collect()
    }

    for kind in [PolicyKind::Fifo, PolicyKind::Clock, PolicyKind::Aging] {
        let first = trace_log(kind);
        assert!(!first.is_empty());
        assert_eq!(first, trace_log(kind));
    }
}
