use crate::{item::graph::ItemIndex, node::JointIndex};

/// Ordered sequence of items forming one path. An item is kept only at the
/// first place it was added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemSet {
    items: Vec<ItemIndex>,
}

impl ItemSet {
    pub fn prepend(&mut self, items: impl IntoIterator<Item = ItemIndex>) {
        let mut prepended = ItemSet::default();
        prepended.extend(items);
        prepended.extend(self.items.drain(..));
        *self = prepended;
    }

    pub fn items(&self) -> &[ItemIndex] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = ItemIndex> + '_ {
        self.items.iter().copied()
    }

    pub fn contains(&self, item: ItemIndex) -> bool {
        self.items.contains(&item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of segments and arcs in the set.
    pub fn line_piece_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_line_piece()).count()
    }
}

impl From<Vec<ItemIndex>> for ItemSet {
    fn from(items: Vec<ItemIndex>) -> Self {
        let mut set = ItemSet::default();
        set.extend(items);
        set
    }
}

impl Extend<ItemIndex> for ItemSet {
    fn extend<T: IntoIterator<Item = ItemIndex>>(&mut self, iter: T) {
        for item in iter {
            if !self.items.contains(&item) {
                self.items.push(item);
            }
        }
    }
}

/// A trivial path and the joints it ends at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrivialPath {
    pub items: ItemSet,
    pub start_joint: Option<JointIndex>,
    pub end_joint: Option<JointIndex>,
}

/// A path to be length-tuned, with the pads found at its ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TuningPath {
    pub items: ItemSet,
    pub start_joint: Option<JointIndex>,
    pub end_joint: Option<JointIndex>,
    pub start_pad: Option<ItemIndex>,
    pub end_pad: Option<ItemIndex>,
}

impl TuningPath {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
