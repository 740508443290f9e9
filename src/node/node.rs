use std::collections::{HashMap, HashSet};

use contracts::debug_ensures;
use geo::Point;
use log::{debug, trace};
use petgraph::{
    stable_graph::{NodeIndex, StableDiGraph},
    visit::EdgeRef,
    Direction::{Incoming, Outgoing},
};

use crate::{
    geometry::{
        chain::{ChainPiece, LineChain},
        primitive::{AccessPrimitiveShape, PrimitiveShape},
    },
    graph::{GenericIndex, GetPetgraphIndex},
    index::SpatialIndex,
    item::{
        graph::{GetAnchors, GetLayers, GetMaybeNet, ItemIndex, ItemWeight, MakeShape, Retag},
        layers::LayerRange,
        line::Line,
    },
    rules::{AccessRules, Conditions},
};

/// Point where items of one net meet, spanning the union of their layers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointWeight {
    pub pos: Point<i64>,
    pub layers: LayerRange,
    pub maybe_net: Option<usize>,
}

pub type JointIndex = GenericIndex<JointWeight>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JointKey {
    pub pos: Point<i64>,
    pub maybe_net: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeWeight {
    Item(ItemWeight),
    Joint(JointWeight),
}

/// Edges always go from an item to a joint it is anchored at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeLabel {
    Link,
}

/// A set of board changes: items to remove, then items to add.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changeset {
    pub removed: Vec<ItemIndex>,
    pub added: Vec<ItemWeight>,
}

impl Changeset {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

/// The routable contents of a board: items, the joints connecting them and
/// a spatial index over their shapes.
#[derive(Debug, Clone, Default)]
pub struct Node {
    graph: StableDiGraph<NodeWeight, NodeLabel, usize>,
    index: SpatialIndex<ItemIndex>,
    joints: HashMap<JointKey, Vec<JointIndex>>,
}

impl Node {
    pub fn new() -> Self {
        Self::default()
    }

    #[debug_ensures(self.contains(ret))]
    #[debug_ensures(self.item_count() == old(self.item_count() + 1))]
    pub fn add(&mut self, weight: ItemWeight) -> ItemIndex {
        let item = weight.retag(self.graph.add_node(NodeWeight::Item(weight)));
        self.index.add(item, &weight);
        self.link_anchors(item, &weight);
        item
    }

    /// Removes `item` and splits joints that only it held together.
    /// Returns `false` if the item is not on this node.
    #[debug_ensures(!self.contains(item))]
    pub fn remove(&mut self, item: ItemIndex) -> bool {
        if !self.contains(item) {
            trace!("ignoring removal of {:?}, not on this node", item);
            return false;
        }

        let joints = self.item_joints(item);
        self.index.remove(item);
        self.graph.remove_node(item.petgraph_index());

        for joint in joints {
            self.rebuild_joint(joint);
        }

        true
    }

    /// Changes the weight of `item` in place, re-indexing and re-linking it.
    #[debug_ensures(self.contains(ret))]
    pub fn replace(&mut self, item: ItemIndex, weight: ItemWeight) -> ItemIndex {
        if !self.contains(item) {
            return self.add(weight);
        }

        let joints = self.item_joints(item);
        let node = item.petgraph_index();

        let edges: Vec<_> = self
            .graph
            .edges_directed(node, Outgoing)
            .map(|edge| edge.id())
            .collect();

        for edge in edges {
            self.graph.remove_edge(edge);
        }

        self.graph[node] = NodeWeight::Item(weight);
        let new_item = weight.retag(node);
        self.index.replace(item, new_item, &weight);

        for joint in joints {
            self.rebuild_joint(joint);
        }

        self.link_anchors(new_item, &weight);
        new_item
    }

    /// Removes `changeset.removed`, then adds `changeset.added`. Returns the
    /// handles of the added items.
    pub fn apply(&mut self, changeset: &Changeset) -> Vec<ItemIndex> {
        for &item in &changeset.removed {
            self.remove(item);
        }

        changeset
            .added
            .iter()
            .map(|&weight| self.add(weight))
            .collect()
    }

    pub fn contains(&self, item: ItemIndex) -> bool {
        matches!(
            self.graph.node_weight(item.petgraph_index()),
            Some(NodeWeight::Item(weight)) if weight.retag(item.petgraph_index()) == item
        )
    }

    /// Weight of `item`. Panics if the item is not on this node.
    pub fn item_weight(&self, item: ItemIndex) -> ItemWeight {
        match self.graph.node_weight(item.petgraph_index()) {
            Some(NodeWeight::Item(weight)) => *weight,
            _ => panic!("{:?} is not an item of this node", item),
        }
    }

    pub fn joint_weight(&self, joint: JointIndex) -> JointWeight {
        match self.graph.node_weight(joint.petgraph_index()) {
            Some(NodeWeight::Joint(weight)) => *weight,
            _ => panic!("{:?} is not a joint of this node", joint),
        }
    }

    /// All items, ordered by handle.
    pub fn items(&self) -> Vec<ItemIndex> {
        let mut items: Vec<ItemIndex> = self
            .graph
            .node_indices()
            .filter_map(|node| match self.graph[node] {
                NodeWeight::Item(weight) => Some(weight.retag(node)),
                NodeWeight::Joint(..) => None,
            })
            .collect();
        items.sort_by_key(|item| item.petgraph_index());
        items
    }

    pub fn item_count(&self) -> usize {
        self.index.len()
    }

    pub fn index(&self) -> &SpatialIndex<ItemIndex> {
        &self.index
    }

    /// Items anchored at `joint`, ordered by handle.
    pub fn joint_links(&self, joint: JointIndex) -> Vec<ItemIndex> {
        let mut links: Vec<ItemIndex> = self
            .graph
            .neighbors_directed(joint.petgraph_index(), Incoming)
            .map(|node| self.retag_item(node))
            .collect();
        links.sort_by_key(|item| item.petgraph_index());
        links.dedup();
        links
    }

    /// Joints `item` is anchored at.
    pub fn item_joints(&self, item: ItemIndex) -> Vec<JointIndex> {
        let mut joints: Vec<JointIndex> = self
            .graph
            .neighbors_directed(item.petgraph_index(), Outgoing)
            .map(JointIndex::new)
            .collect();
        joints.sort();
        joints.dedup();
        joints
    }

    /// The joint of `item` located at `pos`, if any.
    pub fn item_joint_at(&self, item: ItemIndex, pos: Point<i64>) -> Option<JointIndex> {
        self.item_joints(item)
            .into_iter()
            .find(|&joint| self.joint_weight(joint).pos == pos)
    }

    /// Whether `joint` is a corner between exactly two line pieces of the
    /// same width.
    pub fn is_line_corner(&self, joint: JointIndex) -> bool {
        let links = self.joint_links(joint);

        if links.len() != 2 || !links.iter().all(|link| link.is_line_piece()) {
            return false;
        }

        line_piece_width(&self.item_weight(links[0])) == line_piece_width(&self.item_weight(links[1]))
    }

    /// Assembles the line that `seed` is part of by following line corners
    /// in both directions. Returns `None` if `seed` is not a segment or arc.
    pub fn assemble_line(&self, seed: ItemIndex) -> Option<Line> {
        let weight = self.item_weight(seed);
        let (layer, width) = match weight {
            ItemWeight::Seg(seg) => (seg.layer, seg.width),
            ItemWeight::Arc(arc) => (arc.layer, arc.width),
            _ => return None,
        };

        let seed_piece = oriented_piece(&weight, weight.anchors()[0])?;
        let mut visited = HashSet::from([seed]);

        let forward = self.walk_line(seed, seed_piece.to(), &mut visited);
        let backward = self.walk_line(seed, seed_piece.from(), &mut visited);

        let mut links = vec![];
        let mut pieces = vec![];

        for (item, piece) in backward.into_iter().rev() {
            links.push(item);
            pieces.push(piece.reversed());
        }

        links.push(seed);
        pieces.push(seed_piece);

        for (item, piece) in forward {
            links.push(item);
            pieces.push(piece);
        }

        Some(Line {
            links,
            chain: LineChain::from_pieces(pieces),
            width,
            layer,
            maybe_net: weight.maybe_net(),
        })
    }

    fn walk_line(
        &self,
        start: ItemIndex,
        from: Point<i64>,
        visited: &mut HashSet<ItemIndex>,
    ) -> Vec<(ItemIndex, ChainPiece)> {
        let mut walked = vec![];
        let mut current = start;
        let mut at = from;

        while let Some(joint) = self.item_joint_at(current, at) {
            if !self.is_line_corner(joint) {
                break;
            }

            let Some(next) = self
                .joint_links(joint)
                .into_iter()
                .find(|&link| link != current)
            else {
                break;
            };

            if !visited.insert(next) {
                break;
            }

            let Some(piece) = oriented_piece(&self.item_weight(next), at) else {
                break;
            };

            at = piece.to();
            walked.push((next, piece));
            current = next;
        }

        walked
    }

    /// Items whose outlines come closer to `shape` than the clearance
    /// between them allows. Items of `maybe_net` itself are never obstacles.
    pub fn collisions(
        &self,
        shape: &PrimitiveShape,
        layers: LayerRange,
        maybe_net: Option<usize>,
        rules: &impl AccessRules,
    ) -> Vec<ItemIndex> {
        let mut collisions = vec![];
        self.visit_collisions(shape, layers, maybe_net, rules, |item| {
            collisions.push(item);
            true
        });
        collisions.sort_by_key(|item| item.petgraph_index());
        collisions.dedup();
        collisions
    }

    pub fn first_collision(
        &self,
        shape: &PrimitiveShape,
        layers: LayerRange,
        maybe_net: Option<usize>,
        rules: &impl AccessRules,
    ) -> Option<ItemIndex> {
        self.collisions(shape, layers, maybe_net, rules)
            .into_iter()
            .next()
    }

    pub(super) fn visit_collisions(
        &self,
        shape: &PrimitiveShape,
        layers: LayerRange,
        maybe_net: Option<usize>,
        rules: &impl AccessRules,
        mut visitor: impl FnMut(ItemIndex) -> bool,
    ) {
        let margin = rules.largest_clearance(maybe_net);

        self.index
            .query_shape(shape, Some(layers), margin, |item, layer| {
                let other_net = self.item_weight(item).maybe_net();

                if maybe_net.is_some() && other_net == maybe_net {
                    return true;
                }

                let clearance = rules.clearance(
                    &Conditions {
                        maybe_net,
                        maybe_layer: Some(layer),
                    },
                    &Conditions {
                        maybe_net: other_net,
                        maybe_layer: Some(layer),
                    },
                );

                match self.index.shape(item, layer) {
                    Some(other) if shape.collides(other, clearance) => visitor(item),
                    _ => true,
                }
            });
    }

    fn retag_item(&self, node: NodeIndex<usize>) -> ItemIndex {
        match self.graph[node] {
            NodeWeight::Item(weight) => weight.retag(node),
            NodeWeight::Joint(..) => panic!("joints are never linked to joints"),
        }
    }

    fn link_anchors(&mut self, item: ItemIndex, weight: &ItemWeight) {
        let mut anchors = weight.anchors();
        anchors.dedup();

        for anchor in anchors {
            self.link(item, anchor, weight.layers(), weight.maybe_net());
        }
    }

    /// Links `item` to the joint at `pos`, creating it or merging every joint
    /// at the same place whose layers touch the item's.
    fn link(&mut self, item: ItemIndex, pos: Point<i64>, layers: LayerRange, maybe_net: Option<usize>) {
        let key = JointKey { pos, maybe_net };
        let mut merged_layers = layers;
        let mut target: Option<JointIndex> = None;

        loop {
            let touching: Vec<JointIndex> = self
                .joints
                .get(&key)
                .map(|joints| {
                    joints
                        .iter()
                        .copied()
                        .filter(|&joint| Some(joint) != target)
                        .filter(|&joint| self.joint_weight(joint).layers.overlaps(&merged_layers))
                        .collect()
                })
                .unwrap_or_default();

            if touching.is_empty() {
                break;
            }

            for joint in touching {
                merged_layers = merged_layers.merge(&self.joint_weight(joint).layers);

                match target {
                    None => target = Some(joint),
                    Some(target) => self.merge_joint(joint, target, &key),
                }
            }
        }

        let target = match target {
            Some(target) => target,
            None => {
                let joint = JointIndex::new(self.graph.add_node(NodeWeight::Joint(JointWeight {
                    pos,
                    layers,
                    maybe_net,
                })));
                self.joints.entry(key).or_default().push(joint);
                joint
            }
        };

        if let NodeWeight::Joint(ref mut joint_weight) = self.graph[target.petgraph_index()] {
            joint_weight.layers = merged_layers;
        }

        self.graph
            .add_edge(item.petgraph_index(), target.petgraph_index(), NodeLabel::Link);
    }

    fn merge_joint(&mut self, from: JointIndex, into: JointIndex, key: &JointKey) {
        let links: Vec<NodeIndex<usize>> = self
            .graph
            .neighbors_directed(from.petgraph_index(), Incoming)
            .collect();

        for link in links {
            self.graph
                .add_edge(link, into.petgraph_index(), NodeLabel::Link);
        }

        self.graph.remove_node(from.petgraph_index());
        self.forget_joint(from, key);
    }

    fn forget_joint(&mut self, joint: JointIndex, key: &JointKey) {
        if let Some(joints) = self.joints.get_mut(key) {
            joints.retain(|&j| j != joint);

            if joints.is_empty() {
                self.joints.remove(key);
            }
        }
    }

    /// Dissolves `joint` and links its remaining items again, which splits it
    /// if nothing bridges their layers anymore.
    fn rebuild_joint(&mut self, joint: JointIndex) {
        let Some(NodeWeight::Joint(weight)) = self.graph.node_weight(joint.petgraph_index()).copied()
        else {
            return;
        };

        let links = self.joint_links(joint);
        let key = JointKey {
            pos: weight.pos,
            maybe_net: weight.maybe_net,
        };

        self.graph.remove_node(joint.petgraph_index());
        self.forget_joint(joint, &key);

        for link in links {
            let link_weight = self.item_weight(link);
            self.link(link, weight.pos, link_weight.layers(), weight.maybe_net);
        }

        debug!("rebuilt joint at {:?}", weight.pos);
    }
}

fn line_piece_width(weight: &ItemWeight) -> Option<i64> {
    match weight {
        ItemWeight::Seg(seg) => Some(seg.width),
        ItemWeight::Arc(arc) => Some(arc.width),
        _ => None,
    }
}

/// The chain piece of a segment or arc, oriented to start at `entry`.
pub fn oriented_piece(weight: &ItemWeight, entry: Point<i64>) -> Option<ChainPiece> {
    match *weight {
        ItemWeight::Seg(seg) => Some(if seg.from == entry {
            ChainPiece::Seg {
                from: seg.from,
                to: seg.to,
            }
        } else {
            ChainPiece::Seg {
                from: seg.to,
                to: seg.from,
            }
        }),
        ItemWeight::Arc(arc) => Some(if arc.from == entry {
            ChainPiece::Arc {
                from: arc.from,
                to: arc.to,
                center: arc.center,
                ccw: true,
            }
        } else {
            ChainPiece::Arc {
                from: arc.to,
                to: arc.from,
                center: arc.center,
                ccw: false,
            }
        }),
        _ => None,
    }
}

/// Shape of an item on its first layer.
pub fn item_shape(weight: &ItemWeight) -> PrimitiveShape {
    weight.shape(weight.layers().start())
}
