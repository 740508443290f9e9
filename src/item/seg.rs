use geo::Point;
use serde::{Deserialize, Serialize};

use crate::{
    geometry::primitive::{PrimitiveShape, SegShape},
    item::{
        graph::{GetAnchors, GetLayers, MakeShape},
        layers::LayerRange,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegWeight {
    pub from: Point<i64>,
    pub to: Point<i64>,
    pub width: i64,
    pub layer: i32,
    pub maybe_net: Option<usize>,
}

impl_weight!(SegWeight, Seg, SegIndex);

impl GetLayers for SegWeight {
    fn layers(&self) -> LayerRange {
        LayerRange::single(self.layer)
    }
}

impl MakeShape for SegWeight {
    fn shape(&self, _layer: i32) -> PrimitiveShape {
        PrimitiveShape::Seg(SegShape {
            from: self.from,
            to: self.to,
            width: self.width,
        })
    }
}

impl GetAnchors for SegWeight {
    fn anchors(&self) -> Vec<Point<i64>> {
        vec![self.from, self.to]
    }
}
