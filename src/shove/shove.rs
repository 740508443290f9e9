use std::collections::{HashSet, VecDeque};

use geo::{point, Point};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    board::{mesadata::AccessMesadata, Board},
    geometry::{
        chain::LineChain,
        primitive::PrimitiveShape,
        shape::AccessShape,
    },
    item::{
        graph::{GetLayers, GetMaybeNet, ItemWeight},
        line::Line,
    },
    math,
    node::{
        branch::{Branch, BranchItem},
        item_shape, Changeset,
    },
    rules::Conditions,
};

/// What to do when something in the way cannot be pushed aside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShovePolicy {
    /// Fail the whole drag.
    RejectDrag,
    /// Leave the conflict in place and record it as a violation.
    MarkViolation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShoveSettings {
    pub policy: ShovePolicy,
    /// Most obstacles handled by one drag, cascades included.
    pub max_iterations: usize,
}

impl Default for ShoveSettings {
    fn default() -> Self {
        Self {
            policy: ShovePolicy::RejectDrag,
            max_iterations: 64,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShoveError {
    #[error("{obstacle:?} is in the way of {pusher:?} and cannot be moved")]
    Blocked {
        obstacle: BranchItem,
        pusher: BranchItem,
    },
    #[error("shoving did not settle within {0} iterations")]
    IterationLimit(usize),
}

/// A conflict left in place under [`ShovePolicy::MarkViolation`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Violation {
    pub obstacle: BranchItem,
    pub pusher: BranchItem,
    pub pos: Point<i64>,
}

#[derive(Debug, Clone)]
struct Obstruction {
    obstacle: BranchItem,
    /// First piece found running into the obstacle.
    pusher: BranchItem,
    pusher_net: Option<usize>,
    shapes: Vec<PrimitiveShape>,
}

/// One shove interaction on a private branch of the board.
#[derive(Debug)]
pub struct Shove<'a, M: AccessMesadata> {
    board: &'a Board<M>,
    branch: Branch<'a>,
    settings: ShoveSettings,
    fixed: HashSet<BranchItem>,
    violations: Vec<Violation>,
}

impl<'a, M: AccessMesadata> Shove<'a, M> {
    pub fn new(board: &'a Board<M>, settings: ShoveSettings) -> Self {
        Self {
            board,
            branch: Branch::new(board.node()),
            settings,
            fixed: HashSet::new(),
            violations: vec![],
        }
    }

    /// Places `head` and pushes every segment of another net it runs into,
    /// and every segment those detours run into in turn, out of the way.
    /// Returns how many segments were moved.
    ///
    /// On error the branch is left as it was before the call.
    pub fn shove_line(&mut self, head: &Line) -> Result<usize, ShoveError> {
        let branch = self.branch.clone();
        let fixed = self.fixed.clone();
        let violation_count = self.violations.len();

        self.shove_line_inner(head).map_err(|err| {
            debug!("shove rejected: {}", err);
            self.branch = branch;
            self.fixed = fixed;
            self.violations.truncate(violation_count);
            err
        })
    }

    fn shove_line_inner(&mut self, head: &Line) -> Result<usize, ShoveError> {
        self.branch.remove_line(head);

        let head_items: Vec<BranchItem> = head
            .weights()
            .into_iter()
            .map(|weight| self.branch.add(weight))
            .collect();
        self.fixed.extend(head_items.iter().copied());

        let mut queue = VecDeque::from([head_items]);
        let mut iterations = 0;
        let mut shoved = 0;

        while let Some(pushers) = queue.pop_front() {
            for obstruction in self.obstructions(&pushers) {
                if !self.branch.contains(obstruction.obstacle) {
                    continue;
                }

                iterations += 1;

                if iterations > self.settings.max_iterations {
                    return Err(ShoveError::IterationLimit(self.settings.max_iterations));
                }

                let obstacle_weight = self.branch.item_weight(obstruction.obstacle);

                let maybe_detour = match obstacle_weight {
                    ItemWeight::Seg(seg) if !self.fixed.contains(&obstruction.obstacle) => {
                        let clearance = self.board.mesadata().clearance(
                            &Conditions {
                                maybe_net: obstruction.pusher_net,
                                maybe_layer: Some(seg.layer),
                            },
                            &Conditions {
                                maybe_net: seg.maybe_net,
                                maybe_layer: Some(seg.layer),
                            },
                        );

                        detour(seg.from, seg.to, seg.width, &obstruction.shapes, clearance)
                            .map(|chain| Line::unlinked(chain, seg.width, seg.layer, seg.maybe_net))
                    }
                    _ => None,
                };

                let Some(detour) = maybe_detour else {
                    self.conflict(obstruction.obstacle, obstruction.pusher, &obstacle_weight)?;
                    continue;
                };

                debug!(
                    "{:?} pushed aside by {:?} with a detour of {} segments",
                    obstruction.obstacle,
                    obstruction.pusher,
                    detour.chain.len()
                );

                self.branch.remove(obstruction.obstacle);
                queue.push_back(
                    detour
                        .weights()
                        .into_iter()
                        .map(|weight| self.branch.add(weight))
                        .collect(),
                );

                shoved += 1;
            }
        }

        Ok(shoved)
    }

    /// Everything the still present `pushers`, pieces of one line, run
    /// into, each with the shapes of the pieces that hit it.
    fn obstructions(&self, pushers: &[BranchItem]) -> Vec<Obstruction> {
        let mut obstructions: Vec<Obstruction> = vec![];

        for &pusher in pushers {
            if !self.branch.contains(pusher) {
                continue;
            }

            let weight = self.branch.item_weight(pusher);
            let shape = item_shape(&weight);

            for obstacle in self.branch.collisions(
                &shape,
                weight.layers(),
                weight.maybe_net(),
                self.board.mesadata(),
            ) {
                if let Some(obstruction) = obstructions
                    .iter_mut()
                    .find(|obstruction| obstruction.obstacle == obstacle)
                {
                    obstruction.shapes.push(shape);
                } else {
                    obstructions.push(Obstruction {
                        obstacle,
                        pusher,
                        pusher_net: weight.maybe_net(),
                        shapes: vec![shape],
                    });
                }
            }
        }

        obstructions
    }

    fn conflict(
        &mut self,
        obstacle: BranchItem,
        pusher: BranchItem,
        obstacle_weight: &ItemWeight,
    ) -> Result<(), ShoveError> {
        match self.settings.policy {
            ShovePolicy::RejectDrag => Err(ShoveError::Blocked { obstacle, pusher }),
            ShovePolicy::MarkViolation => {
                let pos = item_shape(obstacle_weight).center();
                warn!("{:?} cannot be moved out of the way of {:?}", obstacle, pusher);
                self.violations.push(Violation {
                    obstacle,
                    pusher,
                    pos,
                });
                Ok(())
            }
        }
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn branch(&self) -> &Branch<'a> {
        &self.branch
    }

    pub fn commit(self) -> Changeset {
        self.branch.into_changeset()
    }
}

/// Replaces the segment from `from` to `to` with a five-segment detour
/// keeping both ends, which steps around all of `pushers` on the closer
/// side with `clearance` to spare. `None` if the pushers reach past either
/// end.
pub fn detour(
    from: Point<i64>,
    to: Point<i64>,
    width: i64,
    pushers: &[PrimitiveShape],
    clearance: i64,
) -> Option<LineChain> {
    let u = math::unit_vector(from, to)?;
    let n = math::normal(u);
    let origin = math::to_f64(from);
    let length = math::to_f64(to - from).x().hypot(math::to_f64(to - from).y());

    let mut t_min = f64::INFINITY;
    let mut t_max = f64::NEG_INFINITY;
    let mut s_min = f64::INFINITY;
    let mut s_max = f64::NEG_INFINITY;

    for pusher in pushers {
        let (vertices, half_width) = outline(pusher);

        for vertex in vertices {
            let d = vertex - origin;
            let t = math::dot_product(d, u);
            let s = math::dot_product(d, n);
            t_min = t_min.min(t - half_width);
            t_max = t_max.max(t + half_width);
            s_min = s_min.min(s - half_width);
            s_max = s_max.max(s + half_width);
        }
    }

    if t_min > t_max {
        return None;
    }

    // One unit on top of the clearance absorbs rounding to integer points.
    let margin = width as f64 / 2.0 + clearance as f64 + 1.0;
    let t0 = t_min - margin;
    let t1 = t_max + margin;

    if t0 <= 0.0 || t1 >= length {
        return None;
    }

    let left = s_max + margin;
    let right = s_min - margin;
    let offset = if left.abs() <= right.abs() { left } else { right };

    let at = |t: f64, s: f64| math::round_point(origin + u * t + n * s);

    Some(LineChain::from_points(&[
        from,
        at(t0, 0.0),
        at(t0, offset),
        at(t1, offset),
        at(t1, 0.0),
        to,
    ]))
}

/// Centerline vertices of `shape` and how far its edge lies from them.
fn outline(shape: &PrimitiveShape) -> (Vec<Point<f64>>, f64) {
    match shape {
        PrimitiveShape::Dot(dot) => (vec![math::to_f64(dot.circle.pos)], dot.circle.r as f64),
        PrimitiveShape::Seg(seg) => (
            vec![math::to_f64(seg.from), math::to_f64(seg.to)],
            seg.width as f64 / 2.0,
        ),
        PrimitiveShape::Arc(arc) => (
            arc.polyline().points().collect(),
            arc.width as f64 / 2.0,
        ),
        PrimitiveShape::Rect(rect) => {
            let c = math::to_f64(rect.center);
            let (w, h) = (rect.half_width as f64, rect.half_height as f64);
            (
                vec![
                    c + point! {x: -w, y: -h},
                    c + point! {x: w, y: -h},
                    c + point! {x: w, y: h},
                    c + point! {x: -w, y: h},
                ],
                0.0,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::primitive::SegShape;

    #[test]
    fn detour_steps_around_a_crossing_stub() {
        let pusher = PrimitiveShape::Seg(SegShape {
            from: point! {x: 5000, y: -300},
            to: point! {x: 5000, y: 1000},
            width: 200,
        });

        let chain = detour(
            point! {x: 0, y: 0},
            point! {x: 10000, y: 0},
            200,
            &[pusher],
            100,
        )
        .unwrap();

        assert_eq!(chain.len(), 5);
        assert_eq!(chain.start(), Some(point! {x: 0, y: 0}));
        assert_eq!(chain.end(), Some(point! {x: 10000, y: 0}));

        // The stub reaches further up than down, so the track dips below it.
        let points = chain.points();
        assert_eq!(points[1], point! {x: 4699, y: 0});
        assert_eq!(points[2], point! {x: 4699, y: -601});
        assert_eq!(points[3], point! {x: 5301, y: -601});
        assert_eq!(points[4], point! {x: 5301, y: 0});
    }

    #[test]
    fn no_detour_past_the_ends() {
        let pusher = PrimitiveShape::Seg(SegShape {
            from: point! {x: 100, y: -300},
            to: point! {x: 100, y: 300},
            width: 200,
        });

        assert!(detour(
            point! {x: 0, y: 0},
            point! {x: 10000, y: 0},
            200,
            &[pusher],
            100
        )
        .is_none());
    }
}
