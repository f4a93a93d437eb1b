//! Memory page binning.
//!
//! The snapshot only reports page totals, so the map assumes every free page
//! precedes every used page. That is an approximation of real page state, not
//! per-page tracking. Binning keeps the map at `MAX_BLOCKS` entries no matter
//! how many pages the host has.

use serde::Serialize;

pub const MAX_BLOCKS: u64 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockState {
    Free,
    Used,
    Fragmented,
}

impl BlockState {
    pub fn label(self) -> &'static str {
        match self {
            BlockState::Free => "free",
            BlockState::Used => "used",
            BlockState::Fragmented => "fragmented",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MemoryBlock {
    /// First page covered, inclusive.
    pub start_page: u64,
    /// Last page covered, exclusive.
    pub end_page: u64,
    pub free_pages: u64,
    pub used_pages: u64,
    pub state: BlockState,
}

impl MemoryBlock {
    /// Hover text in the dashboard's 1-based page numbering.
    pub fn describe(&self) -> String {
        match self.state {
            BlockState::Fragmented => format!(
                "Pages {}-{}: {} used, {} free",
                self.start_page + 1,
                self.end_page,
                self.used_pages,
                self.free_pages
            ),
            BlockState::Used => format!("Pages {}-{}: Used", self.start_page + 1, self.end_page),
            BlockState::Free => format!("Pages {}-{}: Free", self.start_page + 1, self.end_page),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MemoryMap {
    pub total_pages: u64,
    pub free_pages: u64,
    pub scale: u64,
    pub blocks: Vec<MemoryBlock>,
}

impl MemoryMap {
    pub fn count(&self, state: BlockState) -> usize {
        self.blocks.iter().filter(|block| block.state == state).count()
    }
}

pub fn bin_pages(total_pages: u64, free_pages: u64) -> MemoryMap {
    let free_pages = free_pages.min(total_pages);
    let scale = total_pages.div_ceil(MAX_BLOCKS).max(1);
    let block_count = total_pages.min(MAX_BLOCKS);

    let blocks = (0..block_count)
        .map(|idx| {
            let start_page = idx.saturating_mul(scale).min(total_pages);
            let end_page = start_page.saturating_add(scale).min(total_pages);
            let free = free_pages.clamp(start_page, end_page) - start_page;
            let used = (end_page - start_page) - free;
            MemoryBlock {
                start_page,
                end_page,
                free_pages: free,
                used_pages: used,
                state: classify(free, used),
            }
        })
        .collect();

    MemoryMap {
        total_pages,
        free_pages,
        scale,
        blocks,
    }
}

// Blocks past the last page hold nothing and read as free.
fn classify(free: u64, used: u64) -> BlockState {
    match (free, used) {
        (0, 0) => BlockState::Free,
        (0, _) => BlockState::Used,
        (_, 0) => BlockState::Free,
        _ => BlockState::Fragmented,
    }
}
