use std::collections::BTreeMap;

use super::page::{Page, PageNo, INVALID_PAGE_NO};
use super::PageStore;
use crate::error::{Error, Result};

/// Page store kept entirely in memory. Page numbers are handed out
/// monotonically and never reused.
#[derive(Debug)]
pub struct Memory {
    name: String,
    pages: BTreeMap<PageNo, Page>,
    next_page_no: PageNo,
}

impl Memory {
    pub fn new() -> Memory {
        Memory::with_name("memory")
    }

    pub fn with_name(name: &str) -> Memory {
        Memory { name: name.to_string(), pages: BTreeMap::new(), next_page_no: INVALID_PAGE_NO + 1 }
    }

    /// Number of live pages.
    pub fn num_pages(&self) -> usize {
        self.pages.len()
    }

    fn missing(&self, page_no: PageNo) -> Error {
        Error::Storage(format!("page {} not found in {}", page_no, self.name))
    }
}

impl Default for Memory {
    fn default() -> Self {
        Memory::new()
    }
}

impl PageStore for Memory {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_page(&mut self, page_no: PageNo) -> Result<Page> {
        self.pages.get(&page_no).cloned().ok_or_else(|| self.missing(page_no))
    }

    fn write_page(&mut self, page_no: PageNo, page: &Page) -> Result<()> {
        match self.pages.get_mut(&page_no) {
            Some(stored) => {
                stored.clone_from(page);
                Ok(())
            }
            None => Err(self.missing(page_no)),
        }
    }

    fn allocate_page(&mut self) -> Result<PageNo> {
        let page_no = self.next_page_no;
        self.next_page_no += 1;
        self.pages.insert(page_no, Page::new());
        Ok(page_no)
    }

    fn delete_page(&mut self, page_no: PageNo) -> Result<()> {
        match self.pages.remove(&page_no) {
            Some(_) => Ok(()),
            None => Err(self.missing(page_no)),
        }
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
