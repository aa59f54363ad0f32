use std::sync::{Arc, Mutex};

use super::{BufStats, BufferPool, PageHandle, PoolState};
use crate::error::Result;
use crate::storage::page::{Page, PageNo};
use crate::storage::{FileId, PageStore};

/// SharedBufferPool wraps the buffer pool with a mutex so that it can be
/// handed to several owners, basically all the heavy lifting happens in the
/// buffer pool. The latch is held for the whole of every operation, callers
/// are serialized and never observe the pool halfway through a replacement.
#[derive(Clone)]
pub struct SharedBufferPool {
    inner: Arc<Mutex<BufferPool>>,
}

impl SharedBufferPool {
    pub fn new(pool: BufferPool) -> Self {
        SharedBufferPool { inner: Arc::new(Mutex::new(pool)) }
    }

    pub fn open_file(&self, store: Box<dyn PageStore>) -> Result<FileId> {
        let mut inner = self.inner.lock()?;
        Ok(inner.open_file(store))
    }

    pub fn close_file(&self, file: FileId) -> Result<Box<dyn PageStore>> {
        let mut inner = self.inner.lock()?;
        inner.close_file(file)
    }

    pub fn read_page(&self, file: FileId, page_no: PageNo) -> Result<PageHandle> {
        let mut inner = self.inner.lock()?;
        inner.read_page(file, page_no)
    }

    pub fn unpin_page(&self, file: FileId, page_no: PageNo, dirty: bool) -> Result<()> {
        let mut inner = self.inner.lock()?;
        inner.unpin_page(file, page_no, dirty)
    }

    pub fn alloc_page(&self, file: FileId) -> Result<(PageNo, PageHandle)> {
        let mut inner = self.inner.lock()?;
        inner.alloc_page(file)
    }

    pub fn dispose_page(&self, file: FileId, page_no: PageNo) -> Result<()> {
        let mut inner = self.inner.lock()?;
        inner.dispose_page(file, page_no)
    }

    pub fn flush_file(&self, file: FileId) -> Result<()> {
        let mut inner = self.inner.lock()?;
        inner.flush_file(file)
    }

    pub fn flush_all(&self) -> Result<()> {
        let mut inner = self.inner.lock()?;
        inner.flush_all()
    }

    /// Run `f` over the bytes of a pinned page while holding the latch.
    pub fn with_page<R>(&self, handle: &PageHandle, f: impl FnOnce(&Page) -> R) -> Result<R> {
        let inner = self.inner.lock()?;
        Ok(f(inner.page(handle)?))
    }

    /// Run `f` over the mutable bytes of a pinned page while holding the latch.
    pub fn with_page_mut<R>(
        &self,
        handle: &PageHandle,
        f: impl FnOnce(&mut Page) -> R,
    ) -> Result<R> {
        let mut inner = self.inner.lock()?;
        Ok(f(inner.page_mut(handle)?))
    }

    pub fn stats(&self) -> Result<BufStats> {
        let inner = self.inner.lock()?;
        Ok(inner.stats())
    }

    pub fn describe_state(&self) -> Result<PoolState> {
        let inner = self.inner.lock()?;
        Ok(inner.describe_state())
    }
}
