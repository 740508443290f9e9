use serde::{Deserialize, Serialize};

/// A target value with a tolerance window around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinOptMax<T> {
    pub min: T,
    pub opt: T,
    pub max: T,
}

impl<T: Copy + PartialOrd> MinOptMax<T> {
    pub fn new(min: T, opt: T, max: T) -> Self {
        Self { min, opt, max }
    }

    pub fn contains(&self, value: T) -> bool {
        self.min <= value && value <= self.max
    }

    pub fn clamp(&self, value: T) -> T {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }
}

impl MinOptMax<i64> {
    /// The window shifted by `offset`.
    pub fn offset(&self, offset: i64) -> Self {
        Self {
            min: self.min + offset,
            opt: self.opt + offset,
            max: self.max + offset,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeanderCorner {
    Square,
    Chamfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeanderSide {
    Left,
    Right,
}

impl MeanderSide {
    pub fn opposite(self) -> Self {
        match self {
            MeanderSide::Left => MeanderSide::Right,
            MeanderSide::Right => MeanderSide::Left,
        }
    }

    /// Sign of the offset from the line, left being positive.
    pub fn sign(self) -> i64 {
        match self {
            MeanderSide::Left => 1,
            MeanderSide::Right => -1,
        }
    }
}

/// Meander shape and tuning target. All distances are in nanometres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeanderSettings {
    pub min_amplitude: i64,
    pub max_amplitude: i64,
    /// Amplitude decrement tried when a meander collides.
    pub step: i64,
    /// Distance between the legs of a meander, and between meanders.
    pub spacing: i64,
    pub corner: MeanderCorner,
    /// Fraction of the spacing cut off a chamfered corner.
    pub corner_radius_percentage: i64,
    pub single_sided: bool,
    pub initial_side: MeanderSide,
    pub target_length: MinOptMax<i64>,
    pub target_skew: MinOptMax<i64>,
    /// Never place meanders on the first or last piece of the tuned line.
    pub keep_endpoints: bool,
}

impl Default for MeanderSettings {
    fn default() -> Self {
        Self {
            min_amplitude: 100_000,
            max_amplitude: 1_000_000,
            step: 50_000,
            spacing: 600_000,
            corner: MeanderCorner::Square,
            corner_radius_percentage: 80,
            single_sided: false,
            initial_side: MeanderSide::Left,
            target_length: MinOptMax::new(99_900_000, 100_000_000, 100_100_000),
            target_skew: MinOptMax::new(-50_000, 0, 50_000),
            keep_endpoints: false,
        }
    }
}
