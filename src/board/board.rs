use derive_getters::Getters;

use crate::{
    board::mesadata::AccessMesadata,
    item::graph::{ItemIndex, ItemWeight},
    node::{Changeset, Node},
};

/// A routable node and its metadata. All committed edits go through here.
#[derive(Debug, Getters)]
pub struct Board<M: AccessMesadata> {
    node: Node,
    mesadata: M,
}

impl<M: AccessMesadata> Board<M> {
    pub fn new(mesadata: M) -> Self {
        Self {
            node: Node::new(),
            mesadata,
        }
    }

    pub fn add(&mut self, weight: ItemWeight) -> ItemIndex {
        self.node.add(weight)
    }

    pub fn remove(&mut self, item: ItemIndex) -> bool {
        self.node.remove(item)
    }

    pub fn replace(&mut self, item: ItemIndex, weight: ItemWeight) -> ItemIndex {
        self.node.replace(item, weight)
    }

    /// Commits a changeset produced by a tuning or shove interaction.
    pub fn apply(&mut self, changeset: &Changeset) -> Vec<ItemIndex> {
        self.node.apply(changeset)
    }

    pub fn net_by_name(&self, netname: &str) -> Option<usize> {
        self.mesadata.netname_net(netname)
    }
}
