use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Inclusive range of copper layers an item spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerRange {
    start: i32,
    end: i32,
}

impl LayerRange {
    /// Range of an item whose layers have not been resolved yet.
    pub const UNDEFINED: LayerRange = LayerRange { start: -1, end: -1 };

    pub fn new(a: i32, b: i32) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn single(layer: i32) -> Self {
        Self {
            start: layer,
            end: layer,
        }
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }

    pub fn is_resolved(&self) -> bool {
        self.start >= 0 && self.end >= 0
    }

    pub fn contains(&self, layer: i32) -> bool {
        self.start <= layer && layer <= self.end
    }

    pub fn overlaps(&self, other: &LayerRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn merge(&self, other: &LayerRange) -> LayerRange {
        LayerRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn iter(&self) -> RangeInclusive<i32> {
        self.start..=self.end
    }
}

impl IntoIterator for LayerRange {
    type Item = i32;
    type IntoIter = RangeInclusive<i32>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
