use std::path::PathBuf;

use sboxbuf::error::{Error, Result};
use sboxbuf::storage::disk::DiskFile;
use sboxbuf::storage::page::PageNo;

fn temp_path() -> PathBuf {
    std::env::temp_dir().join(format!("sboxbuf-it-{}.db", uuid::Uuid::new_v4()))
}

fn stamp(page_no: PageNo) -> Vec<u8> {
    format!("stamp-{:04}", page_no).into_bytes()
}

#[test]
fn test_pages_survive_reopen() -> Result<()> {
    let path = temp_path();

    let mut pages = vec![];
    {
        setup!(bpm, 4);
        let file = bpm.open_file(Box::new(DiskFile::create(&path)?));

        // Scenario: allocate more pages than frames, most of them get evicted
        // and written back while the workload runs.
        for _ in 0..10 {
            let (page_no, h) = bpm.alloc_page(file)?;
            let data = stamp(page_no);
            bpm.page_mut(&h)?.as_mut()[..data.len()].copy_from_slice(&data);
            bpm.unpin_page(file, page_no, true)?;
            pages.push(page_no);
        }
        assert!(bpm.stats().disk_writes >= 6);

        bpm.dispose_page(file, pages[3])?;
        // the file is closed with every dirty page flushed
        bpm.close_file(file)?;
    }

    setup!(bpm, 2);
    let file = bpm.open_file(Box::new(DiskFile::open(&path)?));
    for &page_no in &pages {
        if page_no == pages[3] {
            assert!(matches!(bpm.read_page(file, page_no), Err(Error::Storage(_))));
            continue;
        }
        let h = bpm.read_page(file, page_no)?;
        let data = stamp(page_no);
        assert_eq!(&data[..], &bpm.page(&h)?.as_ref()[..data.len()]);
        bpm.unpin_page(file, page_no, false)?;
    }

    // the disposed page number is handed out again, zero-filled
    let (page_no, h) = bpm.alloc_page(file)?;
    assert_eq!(pages[3], page_no);
    assert!(bpm.page(&h)?.as_ref().iter().all(|&b| b == 0));
    bpm.unpin_page(file, page_no, false)?;

    bpm.close_file(file)?;
    std::fs::remove_file(&path)?;
    Ok(())
}
