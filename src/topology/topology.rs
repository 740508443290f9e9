use std::collections::HashSet;

use geo::Point;
use log::trace;

use crate::{
    board::mesadata::AccessMesadata,
    geometry::{
        chain::ChainPiece,
        primitive::PrimitiveShape,
        shape::AccessShape,
    },
    item::graph::{GetLayers, ItemIndex, ItemWeight},
    math,
    node::{item_shape, oriented_piece, JointIndex, Node},
    topology::itemset::{ItemSet, TrivialPath, TuningPath},
};

/// Assembles the path `start` is part of: its line, continued through vias
/// and trace width changes until a branch, a dangling end or a pad.
///
/// With `stop_at_pads` unset, a pad with exactly one continuation on its
/// other side is passed through like a via. A via or pad seed starts from
/// the first segment or arc linked to it; one with none gives a path of
/// itself alone.
pub fn assemble_trivial_path(node: &Node, start: ItemIndex, stop_at_pads: bool) -> TrivialPath {
    let seed = if start.is_line_piece() {
        Some(start)
    } else {
        node.item_joints(start)
            .into_iter()
            .flat_map(|joint| node.joint_links(joint))
            .find(|link| link.is_line_piece())
    };

    let Some(seed) = seed else {
        return TrivialPath {
            items: ItemSet::from(vec![start]),
            start_joint: node.item_joints(start).first().copied(),
            end_joint: node.item_joints(start).first().copied(),
        };
    };

    let Some(line) = node.assemble_line(seed) else {
        return TrivialPath::default();
    };

    let mut visited: HashSet<ItemIndex> = line.links.iter().copied().collect();
    let (Some(first_point), Some(last_point)) = (line.chain.start(), line.chain.end()) else {
        return TrivialPath::default();
    };
    let first_link = line.links[0];
    let last_link = line.links[line.links.len() - 1];

    let mut items = ItemSet::from(line.links);

    let (backward, start_joint) =
        follow_trivial_path(node, first_link, first_point, stop_at_pads, &mut visited);
    let (forward, end_joint) =
        follow_trivial_path(node, last_link, last_point, stop_at_pads, &mut visited);

    items.prepend(backward.into_iter().rev());
    items.extend(forward);

    TrivialPath {
        items,
        start_joint,
        end_joint,
    }
}

/// Walks away from `last` at `anchor`, returning the items passed, nearest
/// first, and the joint the walk stopped at.
fn follow_trivial_path(
    node: &Node,
    mut last: ItemIndex,
    mut anchor: Point<i64>,
    stop_at_pads: bool,
    visited: &mut HashSet<ItemIndex>,
) -> (Vec<ItemIndex>, Option<JointIndex>) {
    let mut walked = vec![];

    loop {
        let Some(joint) = node.item_joint_at(last, anchor) else {
            return (walked, None);
        };

        let links = node.joint_links(joint);
        let mut vias = vec![];
        let mut pads = vec![];
        let mut pieces = vec![];

        for link in links.into_iter().filter(|link| !visited.contains(link)) {
            match link {
                ItemIndex::Via(..) => vias.push(link),
                ItemIndex::Solid(..) => pads.push(link),
                ItemIndex::Seg(..) | ItemIndex::Arc(..) => pieces.push(link),
            }
        }

        let has_pad = node
            .joint_links(joint)
            .iter()
            .any(|link| matches!(link, ItemIndex::Solid(..)));

        if has_pad && stop_at_pads {
            // Vias here lead to the pad on another layer.
            for via in vias {
                visited.insert(via);
                walked.push(via);
            }

            return (walked, Some(joint));
        }

        if pieces.len() != 1 || vias.len() + pads.len() > 1 {
            trace!("trivial path ends at a joint with {} continuations", pieces.len());
            return (walked, Some(joint));
        }

        let Some(line) = node.assemble_line(pieces[0]) else {
            return (walked, Some(joint));
        };

        let mut line_links = line.links;

        if line.chain.start() != Some(anchor) {
            line_links.reverse();
        }

        if line_links.iter().any(|link| visited.contains(link)) {
            return (walked, Some(joint));
        }

        for &crossing in vias.iter().chain(pads.iter()) {
            visited.insert(crossing);
            walked.push(crossing);
        }

        visited.extend(line_links.iter().copied());

        let (Some(start), Some(end)) = (line.chain.start(), line.chain.end()) else {
            return (walked, Some(joint));
        };
        anchor = if start == anchor { end } else { start };
        last = line_links[line_links.len() - 1];
        walked.extend(line_links);
    }
}

/// Assembles the path to be tuned from `start`, stopping at pads, and finds
/// the pads at its ends. The path is empty if there is nothing to tune.
pub fn assemble_tuning_path(node: &Node, start: ItemIndex) -> TuningPath {
    let trivial = assemble_trivial_path(node, start, true);

    if trivial.items.line_piece_count() == 0 {
        return TuningPath::default();
    }

    let pad_at = |maybe_joint: Option<JointIndex>| {
        maybe_joint.and_then(|joint| {
            node.joint_links(joint)
                .into_iter()
                .find(|link| matches!(link, ItemIndex::Solid(..)))
        })
    };

    TuningPath {
        start_pad: pad_at(trivial.start_joint),
        end_pad: pad_at(trivial.end_joint),
        items: trivial.items,
        start_joint: trivial.start_joint,
        end_joint: trivial.end_joint,
    }
}

#[derive(Debug, Clone, Copy)]
enum PathStep {
    Piece { piece: ChainPiece, layer: i32 },
    Via,
}

/// Pieces and vias of `path` in path order, each piece oriented along it.
fn path_steps(node: &Node, path: &TuningPath) -> Vec<PathStep> {
    let mut cursor = path
        .start_joint
        .map(|joint| node.joint_weight(joint).pos)
        .or_else(|| path.items.iter().next().map(|item| point_of(node, item)));

    let mut steps = vec![];

    for item in path.items.iter() {
        let weight = node.item_weight(item);

        match weight {
            ItemWeight::Seg(..) | ItemWeight::Arc(..) => {
                let entry = cursor.unwrap_or_else(|| point_of(node, item));
                let Some(piece) = oriented_piece(&weight, entry) else {
                    continue;
                };
                cursor = Some(piece.to());
                steps.push(PathStep::Piece {
                    piece,
                    layer: weight.layers().start(),
                });
            }
            ItemWeight::Via(..) => steps.push(PathStep::Via),
            ItemWeight::Solid(..) => (),
        }
    }

    steps
}

fn point_of(node: &Node, item: ItemIndex) -> Point<i64> {
    match node.item_weight(item) {
        ItemWeight::Seg(seg) => seg.from,
        ItemWeight::Arc(arc) => arc.from,
        ItemWeight::Via(via) => via.pos,
        ItemWeight::Solid(solid) => solid.pos,
    }
}

/// Routed length of a tuning path: its segments and arcs, the stackup
/// height crossed at each layer-changing via, and, at each terminal pad,
/// a straight run from the pad's centre to where the route leaves it in
/// place of the route inside the pad.
pub fn tuning_path_length(node: &Node, mesadata: &impl AccessMesadata, path: &TuningPath) -> i64 {
    let steps = path_steps(node, path);

    let mut lengths: Vec<i64> = steps
        .iter()
        .map(|step| match step {
            PathStep::Piece { piece, .. } => piece.length(),
            PathStep::Via => 0,
        })
        .collect();

    let pad_layer = |maybe_pad: Option<ItemIndex>, layer: i32| {
        maybe_pad.map(|pad| {
            let layers = node.item_weight(pad).layers();
            layer.clamp(layers.start(), layers.end())
        })
    };

    for (i, step) in steps.iter().enumerate() {
        if let PathStep::Via = step {
            let maybe_before = steps[..i].iter().rev().find_map(piece_layer);
            let maybe_after = steps[i + 1..].iter().find_map(piece_layer);

            // A via at either end of the path leads to the pad there.
            let before = maybe_before.or_else(|| {
                maybe_after.and_then(|after| pad_layer(path.start_pad, after))
            });
            let after = maybe_after.or_else(|| {
                maybe_before.and_then(|before| pad_layer(path.end_pad, before))
            });

            if let (Some(before), Some(after)) = (before, after) {
                lengths[i] = mesadata.stackup_height(before, after);
            }
        }
    }

    if let Some(pad) = path.start_pad {
        clip_to_pad(node, pad, &steps, &mut lengths, false);
    }

    if let Some(pad) = path.end_pad {
        clip_to_pad(node, pad, &steps, &mut lengths, true);
    }

    lengths.iter().sum()
}

fn piece_layer(step: &PathStep) -> Option<i32> {
    match step {
        PathStep::Piece { layer, .. } => Some(*layer),
        PathStep::Via => None,
    }
}

/// Replaces the lengths of the pieces inside `pad`, from the start of the
/// path or from its end, with the straight distance from the pad centre to
/// the point where the route exits the pad.
fn clip_to_pad(
    node: &Node,
    pad: ItemIndex,
    steps: &[PathStep],
    lengths: &mut [i64],
    from_end: bool,
) {
    let pad_weight = node.item_weight(pad);
    let pad_layers = pad_weight.layers();
    let shape = item_shape(&pad_weight);
    let center = shape.center();

    let order: Vec<usize> = if from_end {
        (0..steps.len()).rev().collect()
    } else {
        (0..steps.len()).collect()
    };

    for i in order {
        let PathStep::Piece { piece, layer } = steps[i] else {
            break;
        };

        if !pad_layers.contains(layer) {
            break;
        }

        let piece = if from_end { piece.reversed() } else { piece };

        let inside_from = shape.encloses(piece.from());
        let inside_to = shape.encloses(piece.to());

        if inside_from && inside_to {
            lengths[i] = 0;
            continue;
        }

        lengths[i] = match piece {
            ChainPiece::Seg { from, to } if inside_from => {
                let exit = boundary_point(&shape, from, to);
                lengths[i] - math::distance(from, exit) + math::distance(center, exit)
            }
            _ => math::distance(center, piece.from()) + lengths[i],
        };
        break;
    }
}

/// Point where the segment from `inside` to `outside` crosses the boundary
/// of `shape`, to integer precision.
fn boundary_point(shape: &PrimitiveShape, inside: Point<i64>, outside: Point<i64>) -> Point<i64> {
    let (mut lo, mut hi) = (inside, outside);

    while math::distance(lo, hi) > 1 {
        let mid = math::round_point((math::to_f64(lo) + math::to_f64(hi)) / 2.0);

        if mid == lo || mid == hi {
            break;
        }

        if shape.encloses(mid) {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    lo
}

/// Sum of the pad-to-die lengths of the pads terminating `path`.
pub fn pad_to_die_length(node: &Node, path: &TuningPath) -> i64 {
    [path.start_pad, path.end_pad]
        .into_iter()
        .flatten()
        .map(|pad| match node.item_weight(pad) {
            ItemWeight::Solid(solid) => solid.pad_to_die,
            _ => 0,
        })
        .sum()
}
