use geo::Point;
use serde::{Deserialize, Serialize};

use crate::{
    geometry::primitive::{DotShape, PrimitiveShape, RectShape},
    item::{
        graph::{GetAnchors, GetLayers, MakeShape},
        layers::LayerRange,
    },
    math::Circle,
};

/// Outline of a pad, relative to its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolidShape {
    Circle { r: i64 },
    Rect { half_width: i64, half_height: i64 },
}

/// A pad. `pad_to_die` is the length of the package trace behind the pad,
/// counted as part of any tuned length ending here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolidWeight {
    pub pos: Point<i64>,
    pub shape: SolidShape,
    pub layers: LayerRange,
    pub maybe_net: Option<usize>,
    #[serde(default)]
    pub pad_to_die: i64,
}

impl_weight!(SolidWeight, Solid, SolidIndex);

impl GetLayers for SolidWeight {
    fn layers(&self) -> LayerRange {
        self.layers
    }
}

impl MakeShape for SolidWeight {
    fn shape(&self, _layer: i32) -> PrimitiveShape {
        match self.shape {
            SolidShape::Circle { r } => PrimitiveShape::Dot(DotShape {
                circle: Circle { pos: self.pos, r },
            }),
            SolidShape::Rect {
                half_width,
                half_height,
            } => PrimitiveShape::Rect(RectShape {
                center: self.pos,
                half_width,
                half_height,
            }),
        }
    }
}

impl GetAnchors for SolidWeight {
    fn anchors(&self) -> Vec<Point<i64>> {
        vec![self.pos]
    }
}
