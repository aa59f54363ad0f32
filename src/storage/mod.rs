use std::fmt::Debug;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Result;

use self::page::{Page, PageNo};

pub mod disk;
pub mod memory;
pub mod page;

/// Identity of a page store registered with the buffer pool.
pub type FileId = u32;

/// A durable file of fixed-size pages addressed by page number. The buffer
/// pool reads pages through it on a miss and writes dirty pages back to it
/// before their frames are reused.
///
/// The PageStore trait is designed as `trait object` compatible so that one
/// buffer pool can cache pages of stores of different kinds at the same time.
pub trait PageStore: Debug + Send {
    /// Human readable name, used for diagnostics only.
    fn name(&self) -> &str;

    /// Reads the page with the given page number.
    fn read_page(&mut self, page_no: PageNo) -> Result<Page>;

    /// Overwrites an allocated page.
    fn write_page(&mut self, page_no: PageNo, page: &Page) -> Result<()>;

    /// Allocates a new zero-filled page, returning its page number.
    fn allocate_page(&mut self) -> Result<PageNo>;

    /// Deletes an allocated page.
    fn delete_page(&mut self, page_no: PageNo) -> Result<()>;

    /// Flushes any buffered data to underlying storage medium.
    fn flush(&mut self) -> Result<()>;
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    Memory,
    Disk,
}

/// Build a page store of the given type. `path` is ignored by the memory store.
pub fn new_store(typ: StorageType, path: &str) -> Result<Box<dyn PageStore>> {
    match typ {
        StorageType::Memory => Ok(Box::new(memory::Memory::new())),
        StorageType::Disk => Ok(Box::new(disk::DiskFile::open_or_create(path)?)),
    }
}
