//! Single-file page store.
//!
//! The file is an array of PAGE_SIZE slots. Slot 0 holds the header, a
//! bincode encoded [`Header`], and page `n` lives in slot `n`, so page numbers
//! start from 1. Deleted page numbers go to the free list in the header and
//! are handed out again by `allocate_page`. The header is rewritten on every
//! allocation and deletion, `flush` additionally syncs the file to disk.
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use bincode::{DefaultOptions, Options};
use log::debug;
use serde::{Deserialize, Serialize};

use super::page::{Page, PageNo, INVALID_PAGE_NO, PAGE_SIZE};
use super::PageStore;
use crate::error::{Error, Result};

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
struct Header {
    /// highest page number ever allocated.
    num_pages: PageNo,
    /// deleted page numbers, reused before growing the file.
    free: Vec<PageNo>,
}

impl Header {
    fn encode(&self) -> Result<Vec<u8>> {
        let bytes = DefaultOptions::new().with_big_endian().with_varint_encoding().serialize(self)?;
        if bytes.len() > PAGE_SIZE {
            return Err(Error::Storage(format!(
                "header of {} bytes exceeds page size, too many free pages",
                bytes.len()
            )));
        }
        Ok(bytes)
    }

    fn decode(bytes: &[u8]) -> Result<Header> {
        let header = DefaultOptions::new()
            .with_big_endian()
            .with_varint_encoding()
            .allow_trailing_bytes()
            .deserialize(bytes)?;
        Ok(header)
    }
}

#[derive(Debug)]
pub struct DiskFile {
    path: PathBuf,
    name: String,
    file: File,
    header: Header,
}

impl DiskFile {
    /// Create a new empty page file, truncating any existing file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<DiskFile> {
        let path = path.as_ref().to_path_buf();
        let file =
            OpenOptions::new().read(true).write(true).create(true).truncate(true).open(&path)?;
        let name = path.display().to_string();
        let mut df = DiskFile { path, name, file, header: Header::default() };
        df.write_header()?;
        Ok(df)
    }

    /// Open an existing page file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<DiskFile> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new().read(true).write(true).open(&path)?;
        let mut buf = vec![0u8; PAGE_SIZE];
        file.seek(SeekFrom::Start(0))?;
        file.read_exact(&mut buf)?;
        let header = Header::decode(&buf)?;
        let name = path.display().to_string();
        debug!("opened {} with {} pages, {} free", name, header.num_pages, header.free.len());
        Ok(DiskFile { path, name, file, header })
    }

    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<DiskFile> {
        if path.as_ref().exists() {
            DiskFile::open(path)
        } else {
            DiskFile::create(path)
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of pages currently allocated.
    pub fn num_pages(&self) -> usize {
        self.header.num_pages as usize - self.header.free.len()
    }

    fn check(&self, page_no: PageNo) -> Result<()> {
        if page_no == INVALID_PAGE_NO
            || page_no > self.header.num_pages
            || self.header.free.contains(&page_no)
        {
            return Err(Error::Storage(format!(
                "page {} is not allocated in {}",
                page_no, self.name
            )));
        }
        Ok(())
    }

    fn offset(page_no: PageNo) -> u64 {
        page_no as u64 * PAGE_SIZE as u64
    }

    fn write_slot(&mut self, page_no: PageNo, bytes: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(Self::offset(page_no)))?;
        self.file.write_all(bytes)?;
        Ok(())
    }

    fn write_header(&mut self) -> Result<()> {
        let mut buf = self.header.encode()?;
        buf.resize(PAGE_SIZE, 0);
        self.write_slot(0, &buf)
    }
}

impl PageStore for DiskFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_page(&mut self, page_no: PageNo) -> Result<Page> {
        self.check(page_no)?;
        let mut page = Page::new();
        self.file.seek(SeekFrom::Start(Self::offset(page_no)))?;
        self.file.read_exact(page.as_mut())?;
        Ok(page)
    }

    fn write_page(&mut self, page_no: PageNo, page: &Page) -> Result<()> {
        self.check(page_no)?;
        self.write_slot(page_no, page.as_ref())
    }

    fn allocate_page(&mut self) -> Result<PageNo> {
        let page_no = match self.header.free.pop() {
            Some(page_no) => page_no,
            None => {
                self.header.num_pages += 1;
                self.header.num_pages
            }
        };
        self.write_slot(page_no, Page::new().as_ref())?;
        self.write_header()?;
        Ok(page_no)
    }

    fn delete_page(&mut self, page_no: PageNo) -> Result<()> {
        self.check(page_no)?;
        self.header.free.push(page_no);
        if let Err(err) = self.write_header() {
            self.header.free.pop();
            return Err(err);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.write_header()?;
        self.file.sync_all()?;
        Ok(())
    }
}
