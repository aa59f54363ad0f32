use std::collections::HashMap;

use log::{debug, error, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::storage::page::{Page, PageNo};
use crate::storage::{FileId, PageStore};

use self::frame::FrameDesc;
use self::index::PageIndex;
use self::replacer::{ClockReplacer, Replacer, Victim};

pub mod frame;
pub mod index;
pub mod replacer;
mod shared;
mod state;

pub use self::frame::FrameId;
pub use self::shared::SharedBufferPool;
pub use self::state::PoolState;

/// Reference to a page pinned in the buffer pool. The bytes are reached
/// through [`BufferPool::page`] and [`BufferPool::page_mut`], which refuse the
/// handle once the page is unpinned or its frame has been reused.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PageHandle {
    frame_id: FrameId,
    file: FileId,
    page_no: PageNo,
}

impl PageHandle {
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    pub fn file(&self) -> FileId {
        self.file
    }

    pub fn page_no(&self) -> PageNo {
        self.page_no
    }
}

/// Buffer pool usage counters.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct BufStats {
    /// read_page and alloc_page calls.
    pub accesses: u64,
    /// pages read from a store.
    pub disk_reads: u64,
    /// pages written back to a store.
    pub disk_writes: u64,
}

/// The buffer pool is responsible for moving physical pages back and forth
/// from main memory to disk. It allows a DBMS to support databases that are
/// larger than the amount of memory available to the system.
///
/// Pages are cached in a fixed number of frames. The frame descriptor table,
/// the page array and the page index are owned by the pool and kept in step:
/// every valid frame has exactly one page index entry and every entry points
/// to a valid frame caching that very page. When all frames are in use the
/// clock replacer picks the frame to reuse, pinned frames are never picked.
///
/// Every operation takes `&mut self` and runs to completion, so the pool
/// expects a single caller at a time. Use [`SharedBufferPool`] to share one
/// pool behind a lock.
#[derive(Debug)]
pub struct BufferPool {
    pool_size: usize,
    /// frame descriptors, `frames[i]` describes `pages[i]`.
    frames: Vec<FrameDesc>,
    /// page data of every frame.
    pages: Vec<Page>,
    /// page table for keeping track of buffer pool pages.
    index: PageIndex,
    /// Replacer to find unpinned pages for replacement.
    replacer: Box<dyn Replacer>,
    /// registered page stores.
    files: HashMap<FileId, Box<dyn PageStore>>,
    next_file_id: FileId,
    stats: BufStats,
}

fn store_of(
    files: &mut HashMap<FileId, Box<dyn PageStore>>,
    file: FileId,
) -> Result<&mut Box<dyn PageStore>> {
    files.get_mut(&file).ok_or_else(|| Error::Value(format!("unknown file {}", file)))
}

impl BufferPool {
    pub fn new(pool_size: usize) -> Result<Self> {
        if pool_size == 0 {
            return Err(Error::Value("buffer pool size must be positive".to_string()));
        }
        let frames = (0..pool_size).map(FrameDesc::new).collect();
        let pages = (0..pool_size).map(|_| Page::new()).collect();
        Ok(BufferPool {
            pool_size,
            frames,
            pages,
            index: PageIndex::with_capacity(pool_size),
            replacer: Box::new(ClockReplacer::new(pool_size)),
            files: HashMap::new(),
            next_file_id: 1,
            stats: BufStats::default(),
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        BufferPool::new(cfg.pool_size)
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Register a page store with the pool, the returned id names the file
    /// in every other operation.
    pub fn open_file(&mut self, store: Box<dyn PageStore>) -> FileId {
        let file = self.next_file_id;
        self.next_file_id += 1;
        info!("opened {} as file {}", store.name(), file);
        self.files.insert(file, store);
        file
    }

    /// Flush every page of the file and hand the store back to the caller.
    pub fn close_file(&mut self, file: FileId) -> Result<Box<dyn PageStore>> {
        self.flush_file(file)?;
        let store = self
            .files
            .remove(&file)
            .ok_or_else(|| Error::Value(format!("unknown file {}", file)))?;
        info!("closed file {}", file);
        Ok(store)
    }

    /// Pick a frame for a new page with the replacer and make it free.
    ///
    /// If the replacer picks a frame holding a dirty page, the page is written
    /// back to its store first. The evicted page is unlinked from the page
    /// table and the frame descriptor is reset.
    fn alloc_frame(&mut self) -> Result<FrameId> {
        let victim = self.replacer.victim(&mut self.frames)?;
        let frame_id = victim.frame_id();
        if let Victim::Free(_) = victim {
            return Ok(frame_id);
        }

        let desc = &self.frames[frame_id];
        let page_no = desc.page_no;
        let file = desc.file.ok_or_else(|| {
            Error::InternalInconsistency(format!("valid frame {} has no file", frame_id))
        })?;
        if self.index.lookup(file, page_no) != Some(frame_id) {
            return Err(Error::InternalInconsistency(format!(
                "page {} of file {} in frame {} is missing from the page table",
                page_no, file, frame_id
            )));
        }

        // flush the in-memory page as the storage page if it is dirty.
        if let Victim::Dirty(_) = victim {
            debug!("writing back page {} of file {} from frame {}", page_no, file, frame_id);
            store_of(&mut self.files, file)?.write_page(page_no, &self.pages[frame_id])?;
            self.stats.disk_writes += 1;
        }

        // unlink the old page from page table
        self.index.remove(file, page_no);
        self.frames[frame_id].clear();
        debug!("evicted page {} of file {} from frame {}", page_no, file, frame_id);
        Ok(frame_id)
    }

    /// Fetch the requested page from the buffer pool, pinning it.
    ///
    /// If the page is cached already, it gets its reference bit set and its
    /// pin count increased without any I/O. Otherwise a frame is picked with
    /// the replacer, the page is read from the store into that frame and
    /// linked into the page table.
    ///
    /// Return `Error::BufferExhausted` if the page has to be read but all the
    /// frames are pinned.
    pub fn read_page(&mut self, file: FileId, page_no: PageNo) -> Result<PageHandle> {
        self.stats.accesses += 1;
        // check if page table has the page
        if let Some(frame_id) = self.index.lookup(file, page_no) {
            let desc = &mut self.frames[frame_id];
            desc.ref_bit = true;
            desc.pin_count += 1;
            return Ok(PageHandle { frame_id, file, page_no });
        }

        // unknown files must not cost an eviction
        store_of(&mut self.files, file)?;
        let frame_id = self.alloc_frame()?;
        let page = store_of(&mut self.files, file)?.read_page(page_no)?;
        self.stats.disk_reads += 1;

        self.pages[frame_id] = page;
        self.frames[frame_id].set(file, page_no);
        self.index.insert(file, page_no, frame_id)?;
        debug!("loaded page {} of file {} into frame {}", page_no, file, frame_id);
        Ok(PageHandle { frame_id, file, page_no })
    }

    /// Release one pin on the page, marking it dirty if it was modified. The
    /// dirty flag stays set until the page is written back.
    ///
    /// Unpinning a page that is not cached does nothing. Return
    /// `Error::PageNotPinned` if the page pin count is already zero.
    pub fn unpin_page(&mut self, file: FileId, page_no: PageNo, dirty: bool) -> Result<()> {
        let Some(frame_id) = self.index.lookup(file, page_no) else {
            return Ok(());
        };
        let desc = &mut self.frames[frame_id];
        if desc.pin_count == 0 {
            return Err(Error::PageNotPinned { file, page_no, frame_id });
        }
        desc.pin_count -= 1;
        if dirty {
            desc.dirty = true;
        }
        Ok(())
    }

    /// Allocate a new page in the file and cache it in a pinned frame.
    ///
    /// The frame is picked before the store allocates the page, so a full
    /// pool leaves the file untouched. The new page is zero-filled and clean.
    pub fn alloc_page(&mut self, file: FileId) -> Result<(PageNo, PageHandle)> {
        self.stats.accesses += 1;
        store_of(&mut self.files, file)?;
        let frame_id = self.alloc_frame()?;
        let page_no = store_of(&mut self.files, file)?.allocate_page()?;

        self.pages[frame_id].clear();
        self.frames[frame_id].set(file, page_no);
        self.index.insert(file, page_no, frame_id)?;
        debug!("allocated page {} of file {} in frame {}", page_no, file, frame_id);
        Ok((page_no, PageHandle { frame_id, file, page_no }))
    }

    /// Delete a page from the file and from the buffer pool if it is cached.
    ///
    /// The cached copy is dropped without being written back, whatever its
    /// dirty flag and pin count, since the page is gone anyway. Handles still
    /// pointing at it are refused from then on.
    pub fn dispose_page(&mut self, file: FileId, page_no: PageNo) -> Result<()> {
        store_of(&mut self.files, file)?;
        if let Some(frame_id) = self.index.remove(file, page_no) {
            self.frames[frame_id].clear();
            self.pages[frame_id].clear();
            debug!("dropped page {} of file {} from frame {}", page_no, file, frame_id);
        }
        store_of(&mut self.files, file)?.delete_page(page_no)
    }

    /// Write every cached page of the file back if dirty and remove them from
    /// the buffer pool, then flush the store.
    ///
    /// All frames of the file are checked before anything is written: return
    /// `Error::PageStillPinned` if one of them is pinned, or
    /// `Error::InternalInconsistency` if a frame and the page table disagree.
    pub fn flush_file(&mut self, file: FileId) -> Result<()> {
        store_of(&mut self.files, file)?;

        let mut targets = vec![];
        for desc in self.frames.iter().filter(|d| d.file == Some(file)) {
            if !desc.valid {
                return Err(Error::InternalInconsistency(format!(
                    "frame {} belongs to file {} but is not valid",
                    desc.frame_id, file
                )));
            }
            if self.index.lookup(file, desc.page_no) != Some(desc.frame_id) {
                return Err(Error::InternalInconsistency(format!(
                    "page {} of file {} in frame {} is missing from the page table",
                    desc.page_no, file, desc.frame_id
                )));
            }
            if desc.pin_count > 0 {
                return Err(Error::PageStillPinned {
                    file,
                    page_no: desc.page_no,
                    frame_id: desc.frame_id,
                });
            }
            targets.push(desc.frame_id);
        }
        for (f, page_no, frame_id) in self.index.iter().filter(|(f, _, _)| *f == file) {
            if !self.frames[frame_id].holds(f, page_no) {
                return Err(Error::InternalInconsistency(format!(
                    "page table maps page {} of file {} to frame {} holding another page",
                    page_no, f, frame_id
                )));
            }
        }

        let store = store_of(&mut self.files, file)?;
        for &frame_id in &targets {
            let desc = &mut self.frames[frame_id];
            if desc.dirty {
                store.write_page(desc.page_no, &self.pages[frame_id])?;
                self.stats.disk_writes += 1;
                desc.dirty = false;
            }
            self.index.remove(file, desc.page_no);
            desc.clear();
        }
        store.flush()?;
        debug!("flushed {} pages of file {}", targets.len(), file);
        Ok(())
    }

    /// Write the cached page back regardless of the dirty flag and unset the
    /// flag. The page stays cached with its pins.
    ///
    /// Return false if the page is not cached.
    pub fn flush_page(&mut self, file: FileId, page_no: PageNo) -> Result<bool> {
        let Some(frame_id) = self.index.lookup(file, page_no) else {
            return Ok(false);
        };
        store_of(&mut self.files, file)?.write_page(page_no, &self.pages[frame_id])?;
        self.stats.disk_writes += 1;
        self.frames[frame_id].dirty = false;
        Ok(true)
    }

    /// Write back every dirty page in the buffer pool and flush all the
    /// stores. Pages stay cached.
    pub fn flush_all(&mut self) -> Result<()> {
        for desc in self.frames.iter_mut().filter(|d| d.valid && d.dirty) {
            let Some(file) = desc.file else {
                continue;
            };
            store_of(&mut self.files, file)?.write_page(desc.page_no, &self.pages[desc.frame_id])?;
            self.stats.disk_writes += 1;
            desc.dirty = false;
        }
        for store in self.files.values_mut() {
            store.flush()?;
        }
        Ok(())
    }

    fn check_handle(&self, handle: &PageHandle) -> Result<()> {
        let pinned = self
            .frames
            .get(handle.frame_id)
            .map(|d| d.holds(handle.file, handle.page_no) && d.pin_count > 0)
            .unwrap_or(false);
        if !pinned {
            return Err(Error::PageNotPinned {
                file: handle.file,
                page_no: handle.page_no,
                frame_id: handle.frame_id,
            });
        }
        Ok(())
    }

    /// Page bytes behind a handle.
    pub fn page(&self, handle: &PageHandle) -> Result<&Page> {
        self.check_handle(handle)?;
        Ok(&self.pages[handle.frame_id])
    }

    /// Mutable page bytes behind a handle. Changes only reach the store if
    /// the page is unpinned as dirty or flushed explicitly.
    pub fn page_mut(&mut self, handle: &PageHandle) -> Result<&mut Page> {
        self.check_handle(handle)?;
        Ok(&mut self.pages[handle.frame_id])
    }

    pub fn stats(&self) -> BufStats {
        self.stats
    }

    pub fn clear_stats(&mut self) {
        self.stats = BufStats::default();
    }
}

impl Drop for BufferPool {
    fn drop(&mut self) {
        for desc in self.frames.iter().filter(|d| d.valid && d.dirty) {
            let Some(store) = desc.file.and_then(|f| self.files.get_mut(&f)) else {
                continue;
            };
            if let Err(err) = store.write_page(desc.page_no, &self.pages[desc.frame_id]) {
                error!("failed to write back page {} on drop: {}", desc.page_no, err);
            }
        }
        for store in self.files.values_mut() {
            if let Err(err) = store.flush() {
                error!("failed to flush {} on drop: {}", store.name(), err);
            }
        }
    }
}
