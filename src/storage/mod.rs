//! Storage Module
//!
//! The page store recovery repairs: a map from page id to the page image
//! and the LSN of the last update applied to it.
//!
//! ## Responsibilities
//! - Load the page store snapshot before recovery, save it afterwards
//! - Stage a phase's page writes so a failed phase leaves the store untouched
//!
//! ## File Format
//! ```text
//! {
//!   "P1": { "value": 100, "pageLSN": 10 },
//!   "P2": { "value": 0,   "pageLSN": 42 }
//! }
//! ```

mod page_store;
mod staged;

use serde::{Deserialize, Serialize};

use crate::wal::{Lsn, PageValue};

pub use page_store::PageStore;
pub use staged::StagedPages;

/// On-disk image of one page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub value: PageValue,

    /// LSN of the last logged change applied to this image
    #[serde(rename = "pageLSN")]
    pub page_lsn: Lsn,
}

impl Page {
    pub fn new(value: PageValue, page_lsn: Lsn) -> Self {
        Self { value, page_lsn }
    }
}
