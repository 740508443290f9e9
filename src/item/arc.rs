use geo::Point;
use serde::{Deserialize, Serialize};

use crate::{
    geometry::primitive::{ArcShape, PrimitiveShape},
    item::{
        graph::{GetAnchors, GetLayers, MakeShape},
        layers::LayerRange,
    },
};

/// Track arc, running counterclockwise from `from` to `to` around `center`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcWeight {
    pub from: Point<i64>,
    pub to: Point<i64>,
    pub center: Point<i64>,
    pub width: i64,
    pub layer: i32,
    pub maybe_net: Option<usize>,
}

impl_weight!(ArcWeight, Arc, ArcIndex);

impl GetLayers for ArcWeight {
    fn layers(&self) -> LayerRange {
        LayerRange::single(self.layer)
    }
}

impl MakeShape for ArcWeight {
    fn shape(&self, _layer: i32) -> PrimitiveShape {
        PrimitiveShape::Arc(ArcShape {
            from: self.from,
            to: self.to,
            center: self.center,
            width: self.width,
        })
    }
}

impl GetAnchors for ArcWeight {
    fn anchors(&self) -> Vec<Point<i64>> {
        vec![self.from, self.to]
    }
}
