use std::fmt::{Display, Formatter};

use super::frame::{FrameDesc, FrameId};
use super::BufferPool;
use crate::error::{Error, Result};

/// Snapshot of the buffer pool for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolState {
    pub hand: FrameId,
    pub frames: Vec<FrameDesc>,
    pub valid_frames: usize,
    pub indexed_pages: usize,
}

impl Display for PoolState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for desc in &self.frames {
            write!(f, "frame {}: ", desc.frame_id)?;
            match desc.file {
                Some(file) if desc.valid => write!(f, "file {} page {}", file, desc.page_no)?,
                _ => write!(f, "empty")?,
            }
            writeln!(
                f,
                " valid={} pin={} dirty={} ref={}",
                desc.valid, desc.pin_count, desc.dirty, desc.ref_bit
            )?;
        }
        writeln!(f, "clock hand: {}", self.hand)?;
        write!(f, "valid frames: {}", self.valid_frames)
    }
}

impl BufferPool {
    pub fn describe_state(&self) -> PoolState {
        PoolState {
            hand: self.replacer.hand(),
            frames: self.frames.clone(),
            valid_frames: self.frames.iter().filter(|d| d.valid).count(),
            indexed_pages: self.index.len(),
        }
    }

    /// Verify that the frame table and the page table describe each other.
    pub fn check_consistency(&self) -> Result<()> {
        for desc in &self.frames {
            let consistent = match desc.file {
                Some(file) if desc.valid => {
                    self.index.lookup(file, desc.page_no) == Some(desc.frame_id)
                }
                None => !desc.valid,
                Some(_) => false,
            };
            if !consistent {
                return Err(Error::InternalInconsistency(format!(
                    "frame {} disagrees with the page table: {:?}",
                    desc.frame_id, desc
                )));
            }
        }
        for (file, page_no, frame_id) in self.index.iter() {
            let holds = self.frames.get(frame_id).map(|d| d.holds(file, page_no)).unwrap_or(false);
            if !holds {
                return Err(Error::InternalInconsistency(format!(
                    "page {} of file {} mapped to frame {} holding another page",
                    page_no, file, frame_id
                )));
            }
        }
        Ok(())
    }
}
