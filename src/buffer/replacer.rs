use std::fmt::Debug;

use super::frame::{FrameDesc, FrameId};
use crate::error::{Error, Result};

/// Frame chosen by the replacer, tagged with the work the buffer pool still
/// has to do before the frame can be reused.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Victim {
    /// The frame holds no page.
    Free(FrameId),
    /// The frame holds an unpinned page identical to its on-disk copy.
    Clean(FrameId),
    /// The frame holds an unpinned page that must be written back first.
    Dirty(FrameId),
}

impl Victim {
    pub fn frame_id(&self) -> FrameId {
        match *self {
            Victim::Free(id) | Victim::Clean(id) | Victim::Dirty(id) => id,
        }
    }
}

///  Replacer tracks page usage for replacement in case of buffer pool is full.
pub trait Replacer: Debug + Send {
    /// Find a frame to reuse. The replacer may update the usage state of the
    /// descriptors it walks over, so they are passed in mutably and must be the
    /// pool's own table, never a copy.
    ///
    /// Return `Error::BufferExhausted` if no frame can be evicted because all of
    /// them are pinned.
    fn victim(&mut self, frames: &mut [FrameDesc]) -> Result<Victim>;

    /// Current position of the replacer over the frame table.
    fn hand(&self) -> FrameId;
}

/// ClockReplacer implements the clock (second chance) replacement policy.
///
/// The frames are arranged in a circle with a hand pointing at the last
/// inspected one. To find a victim the hand moves forward one frame at a time:
/// an unused frame is taken right away, a frame with its reference bit set has
/// the bit cleared and is skipped, a pinned frame is skipped, and the first
/// unreferenced unpinned frame is chosen. The hand stays where it stopped, so
/// the next search resumes from there instead of from frame 0.
///
/// Frames are considered in positional order only, the reference bit gives an
/// approximation of LRU rather than an exact recency order.
#[derive(Debug)]
pub struct ClockReplacer {
    num_frames: usize,
    hand: FrameId,
}

impl ClockReplacer {
    /// The hand starts at the last frame, so the first advance visits frame 0.
    pub fn new(num_frames: usize) -> Self {
        assert!(num_frames > 0, "clock replacer needs at least one frame");
        ClockReplacer { num_frames, hand: num_frames - 1 }
    }

    fn advance(&mut self) {
        self.hand = (self.hand + 1) % self.num_frames;
    }
}

impl Replacer for ClockReplacer {
    /// The search gives up once it has seen `num_frames` pinned frames in a
    /// row. Passing an unpinned frame, even one spared for its reference bit,
    /// starts the count over.
    fn victim(&mut self, frames: &mut [FrameDesc]) -> Result<Victim> {
        debug_assert_eq!(self.num_frames, frames.len());
        let mut pinned = 0;
        loop {
            if pinned == self.num_frames {
                return Err(Error::BufferExhausted);
            }
            self.advance();
            let desc = &mut frames[self.hand];

            if !desc.valid {
                return Ok(Victim::Free(self.hand));
            }
            if desc.ref_bit {
                desc.ref_bit = false;
                if desc.pin_count == 0 {
                    pinned = 0;
                }
                continue;
            }
            if desc.pin_count > 0 {
                pinned += 1;
                continue;
            }
            if desc.dirty {
                return Ok(Victim::Dirty(self.hand));
            }
            return Ok(Victim::Clean(self.hand));
        }
    }

    fn hand(&self) -> FrameId {
        self.hand
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(n: usize) -> Vec<FrameDesc> {
        (0..n).map(FrameDesc::new).collect()
    }

    #[test]
    fn test_free_frames_in_order() -> Result<()> {
        let mut frames = frames(3);
        let mut clock = ClockReplacer::new(3);
        assert_eq!(2, clock.hand());

        for i in 0..3 {
            assert_eq!(Victim::Free(i), clock.victim(&mut frames)?);
            frames[i].set(1, i as u32 + 1);
        }
        assert_eq!(2, clock.hand());
        Ok(())
    }

    #[test]
    fn test_second_chance() -> Result<()> {
        let mut frames = frames(3);
        for (i, desc) in frames.iter_mut().enumerate() {
            desc.set(1, i as u32 + 1);
            desc.pin_count = 0;
        }
        frames[1].dirty = true;

        let mut clock = ClockReplacer::new(3);
        // first sweep clears every reference bit in place, then frame 0 wins
        assert_eq!(Victim::Clean(0), clock.victim(&mut frames)?);
        assert!(frames.iter().all(|d| !d.ref_bit));
        assert_eq!(0, clock.hand());

        // the hand resumes after frame 0
        assert_eq!(Victim::Dirty(1), clock.victim(&mut frames)?);
        assert_eq!(1, clock.hand());

        // a touched frame is skipped once
        frames[2].ref_bit = true;
        assert_eq!(Victim::Clean(0), clock.victim(&mut frames)?);
        assert!(!frames[2].ref_bit);
        Ok(())
    }

    #[test]
    fn test_skip_pinned() -> Result<()> {
        let mut frames = frames(4);
        for (i, desc) in frames.iter_mut().enumerate() {
            desc.set(1, i as u32 + 1);
            desc.ref_bit = false;
        }
        frames[2].pin_count = 0;

        let mut clock = ClockReplacer::new(4);
        let victim = clock.victim(&mut frames)?;
        assert_eq!(Victim::Clean(2), victim);
        assert_eq!(2, victim.frame_id());
        Ok(())
    }

    #[test]
    fn test_exhausted() -> Result<()> {
        let mut frames = frames(3);
        for (i, desc) in frames.iter_mut().enumerate() {
            desc.set(1, i as u32 + 1);
        }
        let mut clock = ClockReplacer::new(3);
        assert_eq!(Err(Error::BufferExhausted), clock.victim(&mut frames));
        // reference bits were consumed on the way
        assert!(frames.iter().all(|d| !d.ref_bit));

        // releasing any frame makes it the next victim
        frames[1].pin_count = 0;
        assert_eq!(Victim::Clean(1), clock.victim(&mut frames)?);
        Ok(())
    }

    #[test]
    fn test_unpinned_resets_pinned_count() -> Result<()> {
        // [pinned, unpinned+referenced, pinned]: the referenced frame breaks the
        // run of pinned frames and is taken on the second pass.
        let mut frames = frames(3);
        for (i, desc) in frames.iter_mut().enumerate() {
            desc.set(1, i as u32 + 1);
            desc.ref_bit = false;
        }
        frames[1].pin_count = 0;
        frames[1].ref_bit = true;

        let mut clock = ClockReplacer::new(3);
        assert_eq!(Victim::Clean(1), clock.victim(&mut frames)?);
        Ok(())
    }
}
