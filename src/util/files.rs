use serde::{de::DeserializeOwned, Serialize};

use std::{fs, path};

use crate::{err_at, Result};

/// Open a file in read-write mode, creating it if it does not exist.
/// A single open call, no reopen dance.
pub fn open_file_rw(loc: &path::Path) -> Result<fs::File> {
    let mut opts = fs::OpenOptions::new();
    err_at!(
        IOError,
        opts.read(true).write(true).create(true).open(loc),
        "open-rw {:?}",
        loc
    )
}

/// Load toml file and parse it into type `T`.
pub fn load_toml<P, T>(loc: P) -> Result<T>
where
    P: AsRef<path::Path>,
    T: DeserializeOwned,
{
    let ploc: &path::Path = loc.as_ref();
    let data = err_at!(IOError, fs::read(ploc))?;
    let s = err_at!(FailConvert, std::str::from_utf8(&data), "file:{:?}", ploc)?;
    err_at!(FailConvert, toml::from_str(s), "file:{:?}", ploc)
}

/// Serialize value `T` into toml format and save it to file `loc`.
pub fn save_toml<P, T>(loc: P, value: &T) -> Result<()>
where
    P: AsRef<path::Path>,
    T: Serialize,
{
    let ploc: &path::Path = loc.as_ref();
    let s = err_at!(FailConvert, toml::to_string(value), "file:{:?}", ploc)?;
    err_at!(IOError, fs::write(ploc, s.as_bytes()), "file:{:?}", ploc)?;
    Ok(())
}

#[cfg(test)]
#[path = "files_test.rs"]
mod files_test;
