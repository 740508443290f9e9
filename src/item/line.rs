use crate::{
    geometry::chain::{ChainPiece, LineChain},
    item::{
        arc::ArcWeight,
        graph::{GetLayers, GetMaybeNet, ItemIndex, ItemWeight},
        layers::LayerRange,
        seg::SegWeight,
    },
};

/// A run of segments and arcs on one layer, joined end to end at corners.
///
/// `links` holds the board items the line was assembled from, in chain
/// order. A line built from fresh geometry (a meander, a detour) has no
/// links until its pieces are added to a board.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub links: Vec<ItemIndex>,
    pub chain: LineChain,
    pub width: i64,
    pub layer: i32,
    pub maybe_net: Option<usize>,
}

impl Line {
    pub fn unlinked(chain: LineChain, width: i64, layer: i32, maybe_net: Option<usize>) -> Self {
        Self {
            links: vec![],
            chain,
            width,
            layer,
            maybe_net,
        }
    }

    pub fn length(&self) -> i64 {
        self.chain.length()
    }

    /// Board items the line's geometry is made of.
    pub fn weights(&self) -> Vec<ItemWeight> {
        self.chain
            .pieces()
            .iter()
            .map(|piece| piece_weight(piece, self.width, self.layer, self.maybe_net))
            .collect()
    }
}

pub fn piece_weight(
    piece: &ChainPiece,
    width: i64,
    layer: i32,
    maybe_net: Option<usize>,
) -> ItemWeight {
    match *piece {
        ChainPiece::Seg { from, to } => ItemWeight::Seg(SegWeight {
            from,
            to,
            width,
            layer,
            maybe_net,
        }),
        ChainPiece::Arc {
            from,
            to,
            center,
            ccw,
        } => {
            let (from, to) = if ccw { (from, to) } else { (to, from) };
            ItemWeight::Arc(ArcWeight {
                from,
                to,
                center,
                width,
                layer,
                maybe_net,
            })
        }
    }
}

impl GetLayers for Line {
    fn layers(&self) -> LayerRange {
        LayerRange::single(self.layer)
    }
}

impl GetMaybeNet for Line {
    fn maybe_net(&self) -> Option<usize> {
        self.maybe_net
    }
}
