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

mod sort;

use std::{env, process::exit};

use env_logger::{Builder, Env};
use log::{error, info};
use rand::{rngs::SmallRng, RngCore, SeedableRng};
use sort::{bubble_sort, find_unsorted, quicksort, VirtualArray};
use vmem::{
    ipc_key,
    modules::{channel::MessageQueue, shared_region::SysVSharedMemory},
    AccessView, VmemAccess, VmemError, SHM_KEY_PATH, SHM_PROJECT_ID,
};

const DEFAULT_SEED: u64 = 2806;

/// Values are kept small so the dump stays readable
const VALUE_RANGE: u32 = 1000;

struct Options {
    seed: u64,
    bubble: bool,
}

fn usage(program: &str, wrong: &str) -> ! {
    eprintln!("Wrong parameter: {}", wrong);
    eprintln!("Usage : {} [OPTIONS]", program);
    eprintln!(" -seed=N   : Seed for the random array.");
    eprintln!(" -bubble   : Use bubble sort instead of quicksort.");
    exit(1);
}

fn parse_args() -> Options {
    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "vmappl".to_string());
    let mut options = Options {
        seed: DEFAULT_SEED,
        bubble: false,
    };

    for arg in args {
        if arg.eq_ignore_ascii_case("-bubble") {
            options.bubble = true;
        } else if let Some(seed) = arg.strip_prefix("-seed=") {
            options.seed = match seed.parse() {
                Ok(seed) => seed,
                Err(_) => usage(&program, &arg),
            };
        } else {
            usage(&program, &arg);
        }
    }
    options
}

fn print_array(values: &[u32]) {
    for row in values.chunks(8) {
        let line: Vec<String> = row.iter().map(|value| format!("{:6}", value)).collect();
        println!("{}", line.join(" "));
    }
}

fn run(options: &Options) -> Result<bool, VmemError> {
    let key = ipc_key(SHM_KEY_PATH, SHM_PROJECT_ID)?;
    let region = SysVSharedMemory::open(key)?;
    let view = AccessView::attach(&region)?;
    let queue = MessageQueue::open(key)?;

    let len = view.config().virtmem_size() / 4;
    let mut access = VmemAccess::new(view, queue);
    let mut array = VirtualArray::new(&mut access, len);

    let mut rand = SmallRng::seed_from_u64(options.seed);
    for i in 0..len {
        array.set(i, rand.next_u32() % VALUE_RANGE)?;
    }

    println!("Unsorted array:");
    print_array(&array.to_vec()?);

    if options.bubble {
        bubble_sort(&mut array)?;
    } else {
        quicksort(&mut array)?;
    }

    println!("Sorted array:");
    print_array(&array.to_vec()?);

    let unsorted = find_unsorted(&mut array)?;
    if let Some(index) = unsorted {
        error!("Array is not sorted at index {}", index);
    }

    info!("{} accesses to virtual memory", access.g_count());
    Ok(unsorted.is_none())
}

fn main() {
    Builder::from_env(Env::default().default_filter_or("warn"))
        .format_module_path(false)
        .init();

    let options = parse_args();

    match run(&options) {
        Ok(true) => println!("Array is sorted"),
        Ok(false) => {
            eprintln!("vmappl: array is not sorted");
            exit(1);
        }
        Err(err) => {
            error!("Access to virtual memory failed: {}", err);
            eprintln!("vmappl: {}", err);
            exit(1);
        }
    }
}
