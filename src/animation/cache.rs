//! Bounded LRU cache of decoded absolute frames.

use std::collections::VecDeque;

use super::frame::Frame;

/// Most recently used frames, keyed by frame number.
///
/// Capacities are small (tens of frames), so a linear scan beats hashing.
#[derive(Debug, Clone)]
pub(crate) struct FrameCache {
    capacity: usize,
    /// Least recently used at the front.
    entries: VecDeque<Frame>,
}

impl FrameCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::new(),
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Look up a frame and mark it most recently used.
    pub fn get(&mut self, index: u64) -> Option<&Frame> {
        let pos = self.entries.iter().position(|f| f.index() == index)?;
        let frame = self.entries.remove(pos)?;
        self.entries.push_back(frame);
        self.entries.back()
    }

    /// Latest cached frame with index in `lo..=hi`, marked most recently used.
    pub fn latest_in(&mut self, lo: u64, hi: u64) -> Option<&Frame> {
        let best = self
            .entries
            .iter()
            .map(Frame::index)
            .filter(|i| (lo..=hi).contains(i))
            .max()?;
        self.get(best)
    }

    pub fn insert(&mut self, frame: Frame) {
        if self.capacity == 0 {
            return;
        }
        if let Some(pos) = self.entries.iter().position(|f| f.index() == frame.index()) {
            self.entries.remove(pos);
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(frame);
    }

    pub fn indices(&self) -> Vec<u64> {
        self.entries.iter().map(Frame::index).collect()
    }
}
