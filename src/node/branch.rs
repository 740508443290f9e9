use std::collections::HashSet;

use log::debug;

use crate::{
    geometry::primitive::PrimitiveShape,
    graph::GetPetgraphIndex,
    item::{
        graph::{ItemIndex, ItemWeight},
        layers::LayerRange,
        line::Line,
    },
    node::{Changeset, Node},
    rules::AccessRules,
};

/// An item seen through a branch: either one of the parent's items that
/// the branch has not hidden, or one of the branch's own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchItem {
    Parent(ItemIndex),
    Local(ItemIndex),
}

/// Private overlay of a node. Edits go to the overlay only; the parent
/// stays untouched until the resulting changeset is applied to it.
/// Dropping a branch discards its edits.
#[derive(Debug, Clone)]
pub struct Branch<'a> {
    parent: &'a Node,
    overrides: HashSet<ItemIndex>,
    local: Node,
}

impl<'a> Branch<'a> {
    pub fn new(parent: &'a Node) -> Self {
        Self {
            parent,
            overrides: HashSet::new(),
            local: Node::new(),
        }
    }

    pub fn parent(&self) -> &'a Node {
        self.parent
    }

    pub fn local(&self) -> &Node {
        &self.local
    }

    pub fn is_hidden(&self, item: ItemIndex) -> bool {
        self.overrides.contains(&item)
    }

    /// Whether `item` is visible through the branch.
    pub fn contains(&self, item: BranchItem) -> bool {
        match item {
            BranchItem::Parent(item) => self.parent.contains(item) && !self.is_hidden(item),
            BranchItem::Local(item) => self.local.contains(item),
        }
    }

    pub fn add(&mut self, weight: ItemWeight) -> BranchItem {
        BranchItem::Local(self.local.add(weight))
    }

    pub fn remove(&mut self, item: BranchItem) {
        match item {
            BranchItem::Parent(item) => {
                if self.parent.contains(item) {
                    self.overrides.insert(item);
                }
            }
            BranchItem::Local(item) => {
                self.local.remove(item);
            }
        }
    }

    /// Hides every parent item `line` was assembled from.
    pub fn remove_line(&mut self, line: &Line) {
        for &link in &line.links {
            self.remove(BranchItem::Parent(link));
        }
    }

    /// Drops all items added to the branch, keeping hidden items hidden.
    pub fn clear_local(&mut self) {
        self.local = Node::new();
    }

    pub fn item_weight(&self, item: BranchItem) -> ItemWeight {
        match item {
            BranchItem::Parent(item) => self.parent.item_weight(item),
            BranchItem::Local(item) => self.local.item_weight(item),
        }
    }

    /// Collisions with the visible parent items and the branch's own items.
    pub fn collisions(
        &self,
        shape: &PrimitiveShape,
        layers: LayerRange,
        maybe_net: Option<usize>,
        rules: &impl AccessRules,
    ) -> Vec<BranchItem> {
        let mut collisions: Vec<BranchItem> = self
            .parent
            .collisions(shape, layers, maybe_net, rules)
            .into_iter()
            .filter(|item| !self.is_hidden(*item))
            .map(BranchItem::Parent)
            .collect();

        collisions.extend(
            self.local
                .collisions(shape, layers, maybe_net, rules)
                .into_iter()
                .map(BranchItem::Local),
        );

        collisions
    }

    pub fn first_collision(
        &self,
        shape: &PrimitiveShape,
        layers: LayerRange,
        maybe_net: Option<usize>,
        rules: &impl AccessRules,
    ) -> Option<BranchItem> {
        let mut found = None;

        self.parent
            .visit_collisions(shape, layers, maybe_net, rules, |item| {
                if self.is_hidden(item) {
                    return true;
                }

                found = Some(BranchItem::Parent(item));
                false
            });

        found.or_else(|| {
            self.local
                .first_collision(shape, layers, maybe_net, rules)
                .map(BranchItem::Local)
        })
    }

    /// The edits made so far, as a changeset against the parent.
    pub fn changeset(&self) -> Changeset {
        let mut removed: Vec<ItemIndex> = self.overrides.iter().copied().collect();
        removed.sort_by_key(|item| item.petgraph_index());

        let added = self
            .local
            .items()
            .into_iter()
            .map(|item| self.local.item_weight(item))
            .collect();

        Changeset { removed, added }
    }

    pub fn into_changeset(self) -> Changeset {
        let changeset = self.changeset();
        debug!(
            "branch yields {} removals and {} additions",
            changeset.removed.len(),
            changeset.added.len()
        );
        changeset
    }
}
