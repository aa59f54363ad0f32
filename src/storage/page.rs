use std::fmt::{Debug, Formatter};

use crate::error::{Error, Result};

/// Page number within a single page store.
pub type PageNo = u32;

/// Size of a data page in byte.
pub const PAGE_SIZE: usize = 8192;

/// Page numbers start from 1, zero is never handed out by a store.
pub const INVALID_PAGE_NO: PageNo = 0;

/// Raw bytes of one page. Always exactly PAGE_SIZE long.
#[derive(Clone, PartialEq, Eq)]
pub struct Page {
    data: Box<[u8]>,
}

impl Page {
    /// Allocate a zero-filled page in memory.
    pub fn new() -> Self {
        Page { data: vec![0u8; PAGE_SIZE].into_boxed_slice() }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PAGE_SIZE {
            return Err(Error::Value(format!(
                "page must be {} bytes, got {}",
                PAGE_SIZE,
                bytes.len()
            )));
        }
        Ok(Page { data: bytes.to_vec().into_boxed_slice() })
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new()
    }
}

impl Debug for Page {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Page({:02x?}..)", &self.data[..8])
    }
}

impl AsRef<[u8]> for Page {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl AsMut<[u8]> for Page {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}
