//! Module `file` implement block addressed I/O over named files.
//!
//! A database occupies a single directory. Every file in it, tables,
//! indexes, the log, is a sequence of fixed size blocks addressed by
//! [BlockId]. [FileManager] reads and writes whole blocks between disk
//! and [Page] buffers, and is the only type in the package touching
//! the file system.

use fs2::FileExt;
use log::debug;

use std::{
    collections::HashMap,
    convert::TryFrom,
    fmt, fs,
    io::{self, Read, Seek, Write},
    path, result,
    sync::Mutex,
};

mod page;

pub use page::Page;

use crate::{err_at, util, Result};

/// Advisory lock file, guards the database directory against a second
/// process.
const LOCK_FILE: &str = "simpledb.lck";

/// Reference to a disk block: a file name and a block number within
/// that file. Block numbers count from zero; number -1 names the
/// synthetic end-of-file block, used only as a lock target by
/// transactions serializing file growth.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BlockId {
    file_name: String,
    blknum: i32,
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        write!(f, "[file {}, block {}]", self.file_name, self.blknum)
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        write!(f, "{}", self)
    }
}

impl BlockId {
    pub fn new(file_name: &str, blknum: i32) -> BlockId {
        BlockId {
            file_name: file_name.to_string(),
            blknum,
        }
    }

    /// The end-of-file pseudo block for `file_name`.
    pub fn eof(file_name: &str) -> BlockId {
        BlockId::new(file_name, -1)
    }

    pub fn as_file_name(&self) -> &str {
        &self.file_name
    }

    #[inline]
    pub fn to_number(&self) -> i32 {
        self.blknum
    }
}

/// Block level file I/O for one database directory.
///
/// All four operations, read, write, append and length, are mutually
/// exclusive under one coarse mutex. File handles are opened on first
/// use and cached for the life of the manager.
pub struct FileManager {
    db_dir: path::PathBuf,
    block_size: usize,
    is_new: bool,
    files: Mutex<HashMap<String, fs::File>>,
    // advisory lock held for the life of this manager.
    _lock_file: fs::File,
}

impl FileManager {
    /// Open the database directory `db_dir`, creating it if absent.
    /// Any leftover temporary tables (file names starting with `temp`)
    /// are removed.
    pub fn new(db_dir: &path::Path, block_size: usize) -> Result<FileManager> {
        if block_size < 16 {
            return err_at!(InvalidInput, msg: "block_size {} too small", block_size);
        }

        let is_new = !db_dir.exists();
        if is_new {
            err_at!(IOError, fs::create_dir_all(db_dir))?;
        }

        for item in err_at!(IOError, fs::read_dir(db_dir))? {
            let entry = err_at!(IOError, item)?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with("temp") {
                fs::remove_file(entry.path()).ok();
            }
        }

        let lock_file = util::open_file_rw(&db_dir.join(LOCK_FILE))?;
        err_at!(
            InvalidFile,
            lock_file.try_lock_exclusive(),
            "database directory {:?} is in use",
            db_dir
        )?;

        debug!(
            target: "file  ",
            "open database at {:?}, block_size {}, is_new {}",
            db_dir, block_size, is_new
        );

        let val = FileManager {
            db_dir: db_dir.to_path_buf(),
            block_size,
            is_new,
            files: Mutex::new(HashMap::new()),
            _lock_file: lock_file,
        };

        Ok(val)
    }

    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Whether this directory was created by this manager.
    #[inline]
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Read `block` into `page`. Reading past the end of the file
    /// yields a zero filled page, callers pin blocks before the block
    /// is necessarily written.
    pub fn read(&self, block: &BlockId, page: &mut Page) -> Result<()> {
        let mut files = err_at!(Fatal, self.files.lock())?;
        let file = self.to_file(&mut files, block.as_file_name())?;

        err_at!(IOError, file.seek(io::SeekFrom::Start(self.fpos(block)?)))?;

        let buf = page.as_mut_bytes();
        let mut m = 0;
        while m < buf.len() {
            match err_at!(IOError, file.read(&mut buf[m..]))? {
                0 => break, // past end-of-file
                n => m += n,
            }
        }
        buf[m..].iter_mut().for_each(|b| *b = 0);

        Ok(())
    }

    /// Write `page` out as `block`.
    pub fn write(&self, block: &BlockId, page: &Page) -> Result<()> {
        let mut files = err_at!(Fatal, self.files.lock())?;
        let file = self.to_file(&mut files, block.as_file_name())?;

        err_at!(IOError, file.seek(io::SeekFrom::Start(self.fpos(block)?)))?;
        let n = err_at!(IOError, file.write(page.as_bytes()))?;
        if n != page.len() {
            return err_at!(IOError, msg: "partial block write {}/{}", n, page.len());
        }
        err_at!(IOError, file.flush())?;

        Ok(())
    }

    /// Extend `file_name` by one zero filled block, return its id.
    pub fn append(&self, file_name: &str) -> Result<BlockId> {
        let mut files = err_at!(Fatal, self.files.lock())?;

        let blknum = self.do_length(&mut files, file_name)?;
        let block = BlockId::new(file_name, blknum);

        let file = self.to_file(&mut files, file_name)?;
        err_at!(IOError, file.seek(io::SeekFrom::Start(self.fpos(&block)?)))?;
        let zeros = vec![0; self.block_size];
        let n = err_at!(IOError, file.write(&zeros))?;
        if n != self.block_size {
            return err_at!(IOError, msg: "partial append {}/{}", n, self.block_size);
        }
        err_at!(IOError, file.flush())?;

        Ok(block)
    }

    /// Number of blocks in `file_name`.
    pub fn length(&self, file_name: &str) -> Result<i32> {
        let mut files = err_at!(Fatal, self.files.lock())?;
        self.do_length(&mut files, file_name)
    }

    fn do_length(
        &self,
        files: &mut HashMap<String, fs::File>,
        file_name: &str,
    ) -> Result<i32> {
        let file = self.to_file(files, file_name)?;
        let n = err_at!(IOError, file.metadata())?.len();
        err_at!(FailConvert, i32::try_from(n / (self.block_size as u64)))
    }

    fn to_file<'a>(
        &self,
        files: &'a mut HashMap<String, fs::File>,
        file_name: &str,
    ) -> Result<&'a mut fs::File> {
        if !files.contains_key(file_name) {
            let file = util::open_file_rw(&self.db_dir.join(file_name))?;
            files.insert(file_name.to_string(), file);
        }
        match files.get_mut(file_name) {
            Some(file) => Ok(file),
            None => err_at!(Fatal, msg: "file cache miss {}", file_name),
        }
    }

    fn fpos(&self, block: &BlockId) -> Result<u64> {
        // the end-of-file pseudo block never reaches the file layer.
        let blknum = err_at!(FailConvert, u64::try_from(block.to_number()), "{}", block)?;
        Ok(blknum * (self.block_size as u64))
    }
}
