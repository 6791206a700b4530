use std::convert::TryFrom;

use crate::{err_at, Result};

/// In-memory byte buffer holding the contents of one disk block.
///
/// All accessors read and write at caller supplied byte offsets.
/// Integers are 4 bytes big-endian. A blob is stored as a 4 byte
/// length followed by the bytes, and a string is stored as the blob
/// of its bytes.
pub struct Page {
    data: Vec<u8>,
}

impl From<Vec<u8>> for Page {
    fn from(data: Vec<u8>) -> Page {
        Page { data }
    }
}

impl Page {
    /// Create a zeroed page of `block_size` bytes.
    pub fn new(block_size: usize) -> Page {
        Page {
            data: vec![0; block_size],
        }
    }

    /// On-disk footprint of string `s`, the length prefix plus its bytes.
    #[inline]
    pub fn str_len(s: &str) -> usize {
        4 + s.len()
    }

    /// Number of bytes in this page.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn get_int(&self, offset: usize) -> Result<i32> {
        let buf = self.fetch(offset, 4)?;
        Ok(i32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]))
    }

    pub fn set_int(&mut self, offset: usize, val: i32) -> Result<()> {
        self.store(offset, &val.to_be_bytes())
    }

    pub fn get_bytes(&self, offset: usize) -> Result<&[u8]> {
        let n = err_at!(FailConvert, usize::try_from(self.get_int(offset)?))?;
        self.fetch(offset + 4, n)
    }

    pub fn set_bytes(&mut self, offset: usize, val: &[u8]) -> Result<()> {
        let n = err_at!(FailConvert, i32::try_from(val.len()))?;
        self.set_int(offset, n)?;
        self.store(offset + 4, val)
    }

    pub fn get_string(&self, offset: usize) -> Result<String> {
        let buf = self.get_bytes(offset)?;
        let s = err_at!(FailConvert, std::str::from_utf8(buf))?;
        Ok(s.to_string())
    }

    pub fn set_string(&mut self, offset: usize, val: &str) -> Result<()> {
        self.set_bytes(offset, val.as_bytes())
    }

    fn fetch(&self, offset: usize, n: usize) -> Result<&[u8]> {
        match self.data.get(offset..(offset + n)) {
            Some(buf) => Ok(buf),
            None => err_at!(
                Fatal, msg: "page read past {}+{}/{}", offset, n, self.data.len()
            ),
        }
    }

    fn store(&mut self, offset: usize, val: &[u8]) -> Result<()> {
        let n = self.data.len();
        match self.data.get_mut(offset..(offset + val.len())) {
            Some(buf) => {
                buf.copy_from_slice(val);
                Ok(())
            }
            None => err_at!(
                Fatal, msg: "page write past {}+{}/{}", offset, val.len(), n
            ),
        }
    }
}

#[cfg(test)]
#[path = "page_test.rs"]
mod page_test;
