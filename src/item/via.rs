use geo::Point;
use serde::{Deserialize, Serialize};

use crate::{
    geometry::primitive::{DotShape, PrimitiveShape},
    item::{
        graph::{GetAnchors, GetLayers, MakeShape},
        layers::LayerRange,
    },
    math::Circle,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViaWeight {
    pub pos: Point<i64>,
    pub diameter: i64,
    pub drill: i64,
    pub layers: LayerRange,
    pub maybe_net: Option<usize>,
}

impl_weight!(ViaWeight, Via, ViaIndex);

impl GetLayers for ViaWeight {
    fn layers(&self) -> LayerRange {
        self.layers
    }
}

impl MakeShape for ViaWeight {
    fn shape(&self, _layer: i32) -> PrimitiveShape {
        PrimitiveShape::Dot(DotShape {
            circle: Circle {
                pos: self.pos,
                r: self.diameter / 2,
            },
        })
    }
}

impl GetAnchors for ViaWeight {
    fn anchors(&self) -> Vec<Point<i64>> {
        vec![self.pos]
    }
}
