use std::collections::HashMap;

use super::frame::FrameId;
use crate::error::{Error, Result};
use crate::storage::page::PageNo;
use crate::storage::FileId;

/// Page table mapping a resident `(file, page_no)` to the frame caching it.
#[derive(Debug, Default)]
pub struct PageIndex {
    table: HashMap<(FileId, PageNo), FrameId>,
}

impl PageIndex {
    pub fn with_capacity(capacity: usize) -> Self {
        PageIndex { table: HashMap::with_capacity(capacity) }
    }

    /// Link a page with its frame. A page is cached by at most one frame, so
    /// inserting a key that is already present fails and keeps the existing
    /// entry.
    pub fn insert(&mut self, file: FileId, page_no: PageNo, frame_id: FrameId) -> Result<()> {
        if let Some(existing) = self.table.get(&(file, page_no)) {
            return Err(Error::InternalInconsistency(format!(
                "page {} of file {} already mapped to frame {}",
                page_no, file, existing
            )));
        }
        self.table.insert((file, page_no), frame_id);
        Ok(())
    }

    /// Unlink a page, returning the frame it was mapped to.
    pub fn remove(&mut self, file: FileId, page_no: PageNo) -> Option<FrameId> {
        self.table.remove(&(file, page_no))
    }

    pub fn lookup(&self, file: FileId, page_no: PageNo) -> Option<FrameId> {
        self.table.get(&(file, page_no)).copied()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FileId, PageNo, FrameId)> + '_ {
        self.table.iter().map(|(&(file, page_no), &frame_id)| (file, page_no, frame_id))
    }
}
