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

use vmem::{modules::channel::CommandSender, VmemAccess, VmemError};

/// Array of `u32` stored at the start of virtual memory
pub struct VirtualArray<'v, 'a, C: CommandSender> {
    access: &'v mut VmemAccess<'a, C>,
    len: usize,
}

impl<'v, 'a, C: CommandSender> VirtualArray<'v, 'a, C> {
    pub fn new(access: &'v mut VmemAccess<'a, C>, len: usize) -> Self {
        debug_assert!(len * 4 <= access.view().config().virtmem_size());
        Self { access, len }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn get(&mut self, index: usize) -> Result<u32, VmemError> {
        self.access.read_u32(index * 4)
    }

    #[inline]
    pub fn set(&mut self, index: usize, value: u32) -> Result<(), VmemError> {
        self.access.write_u32(index * 4, value)
    }

    pub fn swap(&mut self, a: usize, b: usize) -> Result<(), VmemError> {
        let value_a = self.get(a)?;
        let value_b = self.get(b)?;
        self.set(a, value_b)?;
        self.set(b, value_a)
    }

    pub fn to_vec(&mut self) -> Result<Vec<u32>, VmemError> {
        (0..self.len).map(|i| self.get(i)).collect()
    }
}

/// Sorts `array` in place (Lomuto partitioning, last element as pivot)
pub fn quicksort<C: CommandSender>(array: &mut VirtualArray<'_, '_, C>) -> Result<(), VmemError> {
    let len = array.len();
    if len > 1 {
        quicksort_range(array, 0, len - 1)?;
    }
    Ok(())
}

fn quicksort_range<C: CommandSender>(
    array: &mut VirtualArray<'_, '_, C>,
    low: usize,
    high: usize,
) -> Result<(), VmemError> {
    if low >= high {
        return Ok(());
    }

    let pivot = array.get(high)?;
    let mut store = low;
    for i in low..high {
        if array.get(i)? < pivot {
            array.swap(i, store)?;
            store += 1;
        }
    }
    array.swap(store, high)?;

    if store > low {
        quicksort_range(array, low, store - 1)?;
    }
    quicksort_range(array, store + 1, high)
}

pub fn bubble_sort<C: CommandSender>(array: &mut VirtualArray<'_, '_, C>) -> Result<(), VmemError> {
    let len = array.len();
    for pass in 0..len {
        let mut swapped = false;
        for i in 0..len - 1 - pass {
            if array.get(i)? > array.get(i + 1)? {
                array.swap(i, i + 1)?;
                swapped = true;
            }
        }
        if !swapped {
            break;
        }
    }
    Ok(())
}

/// Returns the first index that is smaller than its predecessor
pub fn find_unsorted<C: CommandSender>(
    array: &mut VirtualArray<'_, '_, C>,
) -> Result<Option<usize>, VmemError> {
    let mut previous = match array.len() {
        0 => return Ok(None),
        _ => array.get(0)?,
    };

    for i in 1..array.len() {
        let current = array.get(i)?;
        if current < previous {
            return Ok(Some(i));
        }
        previous = current;
    }
    Ok(None)
}

#[cfg(test)]
mod test {
    use rand::{rngs::SmallRng, RngCore, SeedableRng};
    use vmem::{
        modules::{
            channel::InlineChannel,
            pagefile::{MemoryPagefileModule, Pagefile},
            replacement::{PolicyKind, ReplacementPolicy},
            shared_region::MMapRegion,
        },
        AccessView, LogEvent, ManagerView, MemoryManager, VmemConfig, VmemLayout,
    };

    use super::*;

    fn sort_with(kind: PolicyKind, len: usize, bubble: bool) -> (Vec<u32>, Vec<u32>) {
        let config = VmemConfig::default();
        let region = MMapRegion::new(VmemLayout::new(config).size()).unwrap();
        let view = ManagerView::initialize(&region, config).unwrap();
        let pagefile = Pagefile::new(MemoryPagefileModule::new(config.virtmem_size()), &config).unwrap();
        let mut manager: MemoryManager<'_, _, Vec<LogEvent>> = MemoryManager::new(
            view,
            pagefile,
            vec![],
            ReplacementPolicy::new(kind, config.nframes),
        );

        let mut access = VmemAccess::new(
            AccessView::attach(&region).unwrap(),
            InlineChannel::new(&mut manager),
        );
        let mut array = VirtualArray::new(&mut access, len);

        let mut rand = SmallRng::seed_from_u64(42);
        let mut expected = vec![];
        for i in 0..len {
            let value = rand.next_u32() % 1000;
            array.set(i, value).unwrap();
            expected.push(value);
        }
        expected.sort();

        if bubble {
            bubble_sort(&mut array).unwrap();
        } else {
            quicksort(&mut array).unwrap();
        }
        assert_eq!(find_unsorted(&mut array).unwrap(), None);

        (array.to_vec().unwrap(), expected)
    }

    #[test]
    fn test_quicksort_all_policies() {
        for kind in [PolicyKind::Fifo, PolicyKind::Clock, PolicyKind::Aging] {
            let (sorted, expected) = sort_with(kind, 256, false);
            assert_eq!(sorted, expected, "quicksort failed under {}", kind);
        }
    }

    #[test]
    fn test_bubble_sort() {
        let (sorted, expected) = sort_with(PolicyKind::Clock, 64, true);
        assert_eq!(sorted, expected);
    }

    #[test]
    fn test_short_arrays() {
        for len in [0, 1, 2] {
            let (sorted, expected) = sort_with(PolicyKind::Fifo, len, false);
            assert_eq!(sorted, expected);
        }
    }
}
