use enum_dispatch::enum_dispatch;
use geo::Point;
use petgraph::stable_graph::NodeIndex;
use serde::{Deserialize, Serialize};

use crate::{
    geometry::primitive::PrimitiveShape,
    graph::GetPetgraphIndex,
    item::{
        arc::{ArcIndex, ArcWeight},
        layers::LayerRange,
        seg::{SegIndex, SegWeight},
        solid::{SolidIndex, SolidWeight},
        via::{ViaIndex, ViaWeight},
    },
};

#[enum_dispatch]
pub trait Retag {
    fn retag(&self, index: NodeIndex<usize>) -> ItemIndex;
}

#[enum_dispatch]
pub trait GetLayers {
    fn layers(&self) -> LayerRange;
}

#[enum_dispatch]
pub trait GetMaybeNet {
    fn maybe_net(&self) -> Option<usize>;
}

#[enum_dispatch]
pub trait MakeShape {
    fn shape(&self, layer: i32) -> PrimitiveShape;
}

/// Points at which an item connects to other items.
#[enum_dispatch]
pub trait GetAnchors {
    fn anchors(&self) -> Vec<Point<i64>>;
}

/// Everything the spatial index needs to know about an item.
pub trait AccessItem: GetLayers + GetMaybeNet + MakeShape {}

impl<T: GetLayers + GetMaybeNet + MakeShape> AccessItem for T {}

macro_rules! impl_weight {
    ($weight_struct:ident, $weight_variant:ident, $index_struct:ident) => {
        impl $crate::item::graph::Retag for $weight_struct {
            fn retag(
                &self,
                index: petgraph::stable_graph::NodeIndex<usize>,
            ) -> $crate::item::graph::ItemIndex {
                $crate::item::graph::ItemIndex::$weight_variant($index_struct::new(index))
            }
        }

        impl $crate::item::graph::GetMaybeNet for $weight_struct {
            fn maybe_net(&self) -> Option<usize> {
                self.maybe_net
            }
        }

        pub type $index_struct = $crate::graph::GenericIndex<$weight_struct>;
    };
}

#[enum_dispatch(GetPetgraphIndex)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemIndex {
    Seg(SegIndex),
    Arc(ArcIndex),
    Via(ViaIndex),
    Solid(SolidIndex),
}

impl ItemIndex {
    /// Whether the item is a piece of a line, i.e. a segment or an arc.
    pub fn is_line_piece(&self) -> bool {
        matches!(self, ItemIndex::Seg(..) | ItemIndex::Arc(..))
    }
}

#[enum_dispatch(GetLayers, GetMaybeNet, MakeShape, GetAnchors, Retag)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ItemWeight {
    Seg(SegWeight),
    Arc(ArcWeight),
    Via(ViaWeight),
    Solid(SolidWeight),
}

impl ItemWeight {
    pub fn is_line_piece(&self) -> bool {
        matches!(self, ItemWeight::Seg(..) | ItemWeight::Arc(..))
    }
}
