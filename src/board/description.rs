use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::{
    board::{
        mesadata::{AccessMesadata, BoardMesadata},
        Board,
    },
    item::graph::{ItemIndex, ItemWeight},
    node::Node,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetDescription {
    pub name: String,
    /// Overrides the board's default clearance for this net.
    pub clearance: Option<i64>,
}

/// A board as plain data: layer and net names, clearances, stackup and
/// items. Nets are referred to by their position in `nets`, layers by their
/// position in `layers`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardDescription {
    pub default_clearance: i64,
    pub layers: Vec<String>,
    /// Dielectric thickness between each layer and the next.
    pub layer_gaps: Vec<i64>,
    pub nets: Vec<NetDescription>,
    pub items: Vec<ItemWeight>,
}

impl BoardDescription {
    pub fn load(reader: impl Read) -> Result<Self, serde_json::Error> {
        serde_json::from_reader(reader)
    }

    pub fn make_board(&self) -> Board<BoardMesadata> {
        self.make_board_with_handles().0
    }

    /// Builds the board, also returning the handle of each of `items`, in
    /// the same order.
    pub fn make_board_with_handles(&self) -> (Board<BoardMesadata>, Vec<ItemIndex>) {
        let mut mesadata = BoardMesadata::new(self.default_clearance);

        for (layer, name) in self.layers.iter().enumerate() {
            mesadata.bename_layer(layer as i32, name.clone());
        }

        for (layer, &thickness) in self.layer_gaps.iter().enumerate() {
            mesadata.set_layer_gap(layer as i32, thickness);
        }

        for (net, description) in self.nets.iter().enumerate() {
            mesadata.bename_net(net, description.name.clone());

            if let Some(clearance) = description.clearance {
                mesadata.set_net_clearance(net, clearance);
            }
        }

        let mut board = Board::new(mesadata);
        let handles = self.items.iter().map(|&weight| board.add(weight)).collect();

        (board, handles)
    }

    /// This description with its items replaced by those of `node`.
    pub fn with_items_of(&self, node: &Node) -> Self {
        Self {
            items: node
                .items()
                .into_iter()
                .map(|item| node.item_weight(item))
                .collect(),
            ..self.clone()
        }
    }
}
