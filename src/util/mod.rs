//! Module `util` implement helper functions and macros.

mod files;

pub use files::{load_toml, open_file_rw, save_toml};
