//! Package implement a disk-backed teaching relational database.
//!
//! The engine is block oriented. A database lives in a single directory,
//! each table, index and log is a file of fixed size blocks, and every
//! byte moves through the same four subsystems:
//!
//! * [file], block addressed I/O over named files, [file::Page] gives
//!   typed access into a single block sized buffer.
//! * [wal], append-only log with LSN ordering, records are packed
//!   right-to-left within log blocks.
//! * [buffer], a fixed pool of page frames with pinning, dirty tracking
//!   and write-ahead flushing.
//! * [tx], transactions tie the above together with strict two phase
//!   locking and undo-only recovery.
//!
//! Above the storage core, [record] implements slotted record pages and
//! table scans, [query] the relational operators, [index] static-hash
//! and btree indexes, [meta] the catalog tables, and [parse]/[plan] a
//! minimal SQL surface. The [SimpleDB] handle wires the whole stack
//! together for a database directory.
//!
//! Transactions are the sole recovery point. Operations that can block,
//! pinning a buffer, acquiring a block lock, fail with [Error::LockAbort]
//! or [Error::BufferAbort] after a bounded wait and the caller is
//! expected to roll back.

pub mod buffer;
mod db;
mod error;
pub mod file;
pub mod index;
pub mod meta;
pub mod parse;
pub mod plan;
pub mod query;
pub mod record;
pub mod tx;
mod util;
pub mod wal;

pub use crate::db::{Config, SimpleDB};
pub use crate::error::Error;

/// Type alias for Result returns from all methods in this package.
pub type Result<T> = std::result::Result<T, Error>;
