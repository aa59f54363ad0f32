use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sboxbuf::buffer::{BufferPool, PageHandle};
use sboxbuf::error::{Error, Result};
use sboxbuf::storage::memory::Memory;
use sboxbuf::storage::page::PageNo;
use sboxbuf::storage::{FileId, PageStore};

const POOL_SIZE: usize = 5;

/// What the test expects the buffer pool to hold.
#[derive(Default)]
struct Model {
    /// live pages with the version last written into them.
    versions: HashMap<PageNo, u64>,
    /// pins held by the test.
    pins: HashMap<PageNo, (u32, PageHandle)>,
}

impl Model {
    fn random_page(&self, rng: &mut StdRng) -> Option<PageNo> {
        let mut pages: Vec<_> = self.versions.keys().copied().collect();
        pages.sort();
        if pages.is_empty() {
            return None;
        }
        Some(pages[rng.gen_range(0..pages.len())])
    }

    fn random_pinned(&self, rng: &mut StdRng) -> Option<PageNo> {
        let mut pages: Vec<_> = self.pins.keys().copied().collect();
        pages.sort();
        if pages.is_empty() {
            return None;
        }
        Some(pages[rng.gen_range(0..pages.len())])
    }

    fn pin(&mut self, page_no: PageNo, handle: PageHandle) {
        self.pins.entry(page_no).or_insert((0, handle)).0 += 1;
    }

    fn all_frames_pinned(&self) -> bool {
        self.pins.len() == POOL_SIZE
    }
}

fn version_of(bpm: &BufferPool, handle: &PageHandle) -> Result<u64> {
    let bytes: [u8; 8] = bpm.page(handle)?.as_ref()[..8].try_into().unwrap();
    Ok(u64::from_le_bytes(bytes))
}

fn verify(bpm: &BufferPool, model: &Model) -> Result<()> {
    bpm.check_consistency()?;
    let state = bpm.describe_state();
    assert_eq!(state.valid_frames, state.indexed_pages);
    for (page_no, (count, handle)) in &model.pins {
        let desc = &state.frames[handle.frame_id()];
        assert_eq!(Some(handle.file()), desc.file);
        assert_eq!(*page_no, desc.page_no);
        assert_eq!(*count, desc.pin_count);
    }
    let pinned = state.frames.iter().filter(|d| d.pin_count > 0).count();
    assert_eq!(model.pins.len(), pinned);
    Ok(())
}

fn step(bpm: &mut BufferPool, file: FileId, model: &mut Model, rng: &mut StdRng) -> Result<()> {
    match rng.gen_range(0..10) {
        0..=3 => {
            let Some(page_no) = model.random_page(rng) else {
                return Ok(());
            };
            match bpm.read_page(file, page_no) {
                Ok(h) => {
                    assert_eq!(model.versions[&page_no], version_of(bpm, &h)?);
                    model.pin(page_no, h);
                }
                Err(Error::BufferExhausted) => {
                    assert!(model.all_frames_pinned());
                    assert!(!model.pins.contains_key(&page_no));
                }
                Err(err) => return Err(err),
            }
        }
        4..=6 => {
            let Some(page_no) = model.random_pinned(rng) else {
                return Ok(());
            };
            let (count, h) = model.pins[&page_no];
            let dirty = rng.gen_bool(0.5);
            if dirty {
                let version = model.versions[&page_no] + 1;
                bpm.page_mut(&h)?.as_mut()[..8].copy_from_slice(&version.to_le_bytes());
                model.versions.insert(page_no, version);
            }
            bpm.unpin_page(file, page_no, dirty)?;
            if count == 1 {
                model.pins.remove(&page_no);
            } else {
                model.pins.insert(page_no, (count - 1, h));
            }
        }
        7 => match bpm.alloc_page(file) {
            Ok((page_no, h)) => {
                assert_eq!(0, version_of(bpm, &h)?);
                model.versions.insert(page_no, 0);
                model.pin(page_no, h);
            }
            Err(Error::BufferExhausted) => assert!(model.all_frames_pinned()),
            Err(err) => return Err(err),
        },
        8 => {
            let Some(page_no) = model.random_page(rng) else {
                return Ok(());
            };
            bpm.dispose_page(file, page_no)?;
            model.versions.remove(&page_no);
            // pins on a disposed page are gone along with its frame
            if let Some((_, h)) = model.pins.remove(&page_no) {
                assert!(matches!(bpm.page(&h), Err(Error::PageNotPinned { .. })));
            }
        }
        _ => match bpm.flush_file(file) {
            Ok(()) => {
                assert!(model.pins.is_empty());
                assert_eq!(0, bpm.describe_state().valid_frames);
            }
            Err(Error::PageStillPinned { .. }) => assert!(!model.pins.is_empty()),
            Err(err) => return Err(err),
        },
    }
    Ok(())
}

#[test]
fn test_random_workload_keeps_invariants() -> Result<()> {
    setup!(bpm, POOL_SIZE);
    let mut store = Memory::new();
    let mut model = Model::default();
    for _ in 0..12 {
        model.versions.insert(store.allocate_page()?, 0);
    }
    let file = bpm.open_file(Box::new(store));

    let mut rng = StdRng::seed_from_u64(20240517);
    for _ in 0..2000 {
        step(&mut bpm, file, &mut model, &mut rng)?;
        verify(&bpm, &model)?;
    }

    // release everything and make sure every written version made it to the store
    let pinned: Vec<_> = model.pins.iter().map(|(&p, &(c, _))| (p, c)).collect();
    for (page_no, count) in pinned {
        for _ in 0..count {
            bpm.unpin_page(file, page_no, false)?;
        }
    }
    model.pins.clear();
    bpm.flush_file(file)?;
    for (&page_no, &version) in &model.versions {
        let h = bpm.read_page(file, page_no)?;
        assert_eq!(version, version_of(&bpm, &h)?);
        bpm.unpin_page(file, page_no, false)?;
    }
    verify(&bpm, &model)?;
    Ok(())
}
