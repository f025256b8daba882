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

use std::{env, process::exit};

use env_logger::{Builder, Env};
use libc::key_t;
use log::{error, info};
use vmem::{
    install_signal_handlers, ipc_key,
    modules::{
        channel::MessageQueue,
        pagefile::{FilePagefileModule, Pagefile},
        replacement::{PolicyKind, ReplacementPolicy},
        shared_region::SysVSharedMemory,
    },
    FileFaultLog, ManagerView, MemoryManager, PendingSignals, VmemConfig, VmemError, VmemLayout,
    LOGFILE_PATH, PAGEFILE_PATH, PAGESIZE_ENV, SHM_KEY_PATH, SHM_PROJECT_ID,
};

fn usage(program: &str, wrong: &str) -> ! {
    eprintln!("Wrong parameter: {}", wrong);
    eprintln!("Usage : {} [OPTIONS]", program);
    eprintln!(" -fifo     : Fifo page replacement algorithm.");
    eprintln!(" -clock    : Clock page replacement algorithm.");
    eprintln!(" -aging    : Aging page replacement algorithm.");
    eprintln!("Environment:");
    eprintln!(" {}=[8,16,32,64] : Page size.", PAGESIZE_ENV);
    exit(1);
}

fn parse_args() -> PolicyKind {
    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "mmanage".to_string());

    let kind = match args.next() {
        None => PolicyKind::default(),
        Some(arg) => match PolicyKind::from_flag(&arg) {
            Some(kind) => kind,
            None => usage(&program, &arg),
        },
    };

    if let Some(extra) = args.next() {
        usage(&program, &extra);
    }
    kind
}

/// Names of the IPC objects and files the manager creates
struct Resources<'r> {
    key: key_t,
    pagefile_path: &'r str,
    logfile_path: &'r str,
}

fn run(kind: PolicyKind) -> Result<(), VmemError> {
    // first, a signal during setup must still end in an orderly teardown
    let signals = install_signal_handlers()?;
    let config = VmemConfig::from_env()?;

    let resources = Resources {
        key: ipc_key(SHM_KEY_PATH, SHM_PROJECT_ID)?,
        pagefile_path: PAGEFILE_PATH,
        logfile_path: LOGFILE_PATH,
    };
    serve(kind, config, &resources, signals)
}

fn serve(
    kind: PolicyKind,
    config: VmemConfig,
    resources: &Resources<'_>,
    signals: &PendingSignals,
) -> Result<(), VmemError> {
    let layout = VmemLayout::new(config);
    let region = SysVSharedMemory::create(resources.key, layout.size())?;
    let view = ManagerView::initialize(&region, config)?;
    let mut queue = MessageQueue::create(resources.key)?;
    queue.wake_on_signals();

    let storage = FilePagefileModule::create(resources.pagefile_path, config.virtmem_size())?;
    let pagefile = Pagefile::new(storage, &config)?;
    let log = FileFaultLog::create(resources.logfile_path)?;

    info!(
        "Shared memory {} ready: {} pages, {} frames, page size {}",
        region.id(),
        config.npages,
        config.nframes,
        config.page_size
    );
    info!("Send SIGUSR2 to dump the page table, SIGINT to stop");

    let mut manager = MemoryManager::new(
        view,
        pagefile,
        log,
        ReplacementPolicy::new(kind, config.nframes),
    );
    manager.run(&mut queue, signals)?;

    info!("{} page faults handled", manager.pf_count());
    Ok(())
}

fn main() {
    Builder::from_env(Env::default().default_filter_or("warn"))
        .format_module_path(false)
        .init();

    let kind = parse_args();

    // region, queue and pagefile are released before the exit code is set
    if let Err(err) = run(kind) {
        error!("Memory manager failed: {}", err);
        eprintln!("mmanage: {}", err);
        exit(1);
    }
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use super::*;

    #[test]
    fn test_sigint_during_setup_tears_down() {
        let signals = install_signal_handlers().unwrap();
        let _ = signals.take_interrupt();

        // handlers are in place before anything exists, nothing kills the process
        assert_eq!(unsafe { libc::raise(libc::SIGINT) }, 0);

        let resources = Resources {
            key: libc::IPC_PRIVATE,
            pagefile_path: "/tmp/test_sigint_during_setup_tears_down.bin",
            logfile_path: "/tmp/test_sigint_during_setup_tears_down.txt",
        };
        let config = VmemConfig {
            page_size: 8,
            nframes: 4,
            npages: 16,
        };
        serve(PolicyKind::Fifo, config, &resources, signals).unwrap();

        assert!(!signals.take_interrupt());
        assert!(!Path::new(resources.pagefile_path).exists());
        assert!(Path::new(resources.logfile_path).exists());
        let _ = std::fs::remove_file(resources.logfile_path);
    }
}
