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

use std::ffi::CString;

use libc::{c_int, key_t};

use crate::VmemError;

/// Derives the System V IPC key both processes agree on.
///
/// `path` has to exist, otherwise `ftok` fails.
pub fn ipc_key(path: &str, project_id: u8) -> Result<key_t, VmemError> {
    let c_path = CString::new(path)
        .map_err(|_| VmemError::InvalidConfig(format!("key path {:?} contains a nul byte", path)))?;

    let key = unsafe { libc::ftok(c_path.as_ptr(), project_id as c_int) };
    if key == -1 {
        return Err(VmemError::last_os_error("ftok"));
    }

    Ok(key)
}

#[cfg(test)]
mod test {
    use super::ipc_key;

    #[test]
    fn test_ipc_key_is_stable() {
        let first = ipc_key("/tmp", b'C').unwrap();
        let second = ipc_key("/tmp", b'C').unwrap();
        assert_eq!(first, second);

        assert_ne!(ipc_key("/tmp", b'D').unwrap(), first);
    }

    #[test]
    fn test_ipc_key_missing_path() {
        assert!(ipc_key("/this/path/does/not/exist", b'C').is_err());
    }
}
