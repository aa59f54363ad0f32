use crate::storage::page::{PageNo, INVALID_PAGE_NO};
use crate::storage::FileId;

/// Index of a frame in the buffer pool, i.e., the FrameId is in
/// range: [0, pool_size).
pub type FrameId = usize;

/// Per-frame metadata. The buffer pool keeps one descriptor per frame in
/// a table aligned with the page array, so `frames[i]` describes `pages[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameDesc {
    pub frame_id: FrameId,
    /// Owning file, `None` while the frame is unused.
    pub file: Option<FileId>,
    /// Only meaningful while `valid`.
    pub page_no: PageNo,
    pub valid: bool,
    /// Second chance bit for the clock.
    pub ref_bit: bool,
    pub pin_count: u32,
    pub dirty: bool,
}

impl FrameDesc {
    pub fn new(frame_id: FrameId) -> Self {
        FrameDesc {
            frame_id,
            file: None,
            page_no: INVALID_PAGE_NO,
            valid: false,
            ref_bit: false,
            pin_count: 0,
            dirty: false,
        }
    }

    /// Mark the frame as holding a freshly loaded page, pinned once.
    pub fn set(&mut self, file: FileId, page_no: PageNo) {
        self.file = Some(file);
        self.page_no = page_no;
        self.valid = true;
        self.ref_bit = true;
        self.pin_count = 1;
        self.dirty = false;
    }

    /// Return the frame to the unused state.
    pub fn clear(&mut self) {
        self.file = None;
        self.page_no = INVALID_PAGE_NO;
        self.valid = false;
        self.ref_bit = false;
        self.pin_count = 0;
        self.dirty = false;
    }

    pub fn holds(&self, file: FileId, page_no: PageNo) -> bool {
        self.valid && self.file == Some(file) && self.page_no == page_no
    }
}
