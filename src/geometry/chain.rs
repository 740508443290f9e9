use geo::Point;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    geometry::{
        primitive::{ArcShape, PrimitiveShape, SegShape},
        shape::MeasureLength,
    },
    math,
};

/// One piece of a line chain. Arcs store their turning direction so that a
/// chain can be walked (and reversed) in either direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainPiece {
    Seg {
        from: Point<i64>,
        to: Point<i64>,
    },
    Arc {
        from: Point<i64>,
        to: Point<i64>,
        center: Point<i64>,
        ccw: bool,
    },
}

impl ChainPiece {
    pub fn from(&self) -> Point<i64> {
        match self {
            ChainPiece::Seg { from, .. } | ChainPiece::Arc { from, .. } => *from,
        }
    }

    pub fn to(&self) -> Point<i64> {
        match self {
            ChainPiece::Seg { to, .. } | ChainPiece::Arc { to, .. } => *to,
        }
    }

    pub fn is_arc(&self) -> bool {
        matches!(self, ChainPiece::Arc { .. })
    }

    pub fn reversed(&self) -> Self {
        match *self {
            ChainPiece::Seg { from, to } => ChainPiece::Seg { from: to, to: from },
            ChainPiece::Arc {
                from,
                to,
                center,
                ccw,
            } => ChainPiece::Arc {
                from: to,
                to: from,
                center,
                ccw: !ccw,
            },
        }
    }

    pub fn shape(&self, width: i64) -> PrimitiveShape {
        match *self {
            ChainPiece::Seg { from, to } => PrimitiveShape::Seg(SegShape { from, to, width }),
            ChainPiece::Arc {
                from,
                to,
                center,
                ccw,
            } => PrimitiveShape::Arc(ccw_arc(from, to, center, ccw, width)),
        }
    }

    pub fn length(&self) -> i64 {
        self.shape(0).length()
    }

    /// Point of the piece closest to `p`.
    pub fn nearest_point(&self, p: Point<i64>) -> Point<i64> {
        match *self {
            ChainPiece::Seg { from, to } => math::project_point_on_segment(p, from, to),
            ChainPiece::Arc {
                from,
                to,
                center,
                ccw,
            } => {
                let arc = ccw_arc(from, to, center, ccw, 0);

                if p != center && arc.between_ends(p) {
                    let v = math::to_f64(p - center);
                    let len = v.x().hypot(v.y());
                    math::round_point(math::to_f64(center) + v * (arc.radius() / len))
                } else if math::distance(p, from) <= math::distance(p, to) {
                    from
                } else {
                    to
                }
            }
        }
    }

    /// Cuts the piece at `p` (which must lie on it). Arcs are never cut: the
    /// whole arc goes to whichever side its nearer end falls on.
    fn cut(&self, p: Point<i64>) -> (Option<ChainPiece>, Option<ChainPiece>) {
        match *self {
            ChainPiece::Seg { from, to } => {
                let head = (p != from).then_some(ChainPiece::Seg { from, to: p });
                let tail = (p != to).then_some(ChainPiece::Seg { from: p, to });
                (head, tail)
            }
            ChainPiece::Arc { from, .. } => {
                if p == from {
                    (None, Some(*self))
                } else {
                    (Some(*self), None)
                }
            }
        }
    }
}

fn ccw_arc(from: Point<i64>, to: Point<i64>, center: Point<i64>, ccw: bool, width: i64) -> ArcShape {
    let (from, to) = if ccw { (from, to) } else { (to, from) };
    ArcShape {
        from,
        to,
        center,
        width,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChainPos {
    piece: usize,
    point: Point<i64>,
    offset: i64,
}

/// Ordered polyline of straight and arc pieces, each piece starting where
/// the previous one ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineChain {
    pieces: Vec<ChainPiece>,
}

impl LineChain {
    pub fn new() -> Self {
        Self { pieces: vec![] }
    }

    pub fn from_points(points: &[Point<i64>]) -> Self {
        Self {
            pieces: points
                .iter()
                .copied()
                .tuple_windows()
                .map(|(from, to)| ChainPiece::Seg { from, to })
                .collect(),
        }
    }

    pub fn from_pieces(pieces: Vec<ChainPiece>) -> Self {
        Self { pieces }
    }

    pub fn pieces(&self) -> &[ChainPiece] {
        &self.pieces
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn push(&mut self, piece: ChainPiece) {
        self.pieces.push(piece);
    }

    pub fn start(&self) -> Option<Point<i64>> {
        self.pieces.first().map(|piece| piece.from())
    }

    pub fn end(&self) -> Option<Point<i64>> {
        self.pieces.last().map(|piece| piece.to())
    }

    /// Vertices of the chain, arcs contributing only their endpoints.
    pub fn points(&self) -> Vec<Point<i64>> {
        let mut points: Vec<Point<i64>> = self.start().into_iter().collect();
        points.extend(self.pieces.iter().map(|piece| piece.to()));
        points
    }

    pub fn length(&self) -> i64 {
        self.pieces.iter().map(|piece| piece.length()).sum()
    }

    pub fn reversed(&self) -> Self {
        Self {
            pieces: self.pieces.iter().rev().map(|piece| piece.reversed()).collect(),
        }
    }

    pub fn append(&mut self, other: &LineChain) {
        self.pieces.extend_from_slice(&other.pieces);
    }

    /// Drops zero-length segments and merges consecutive collinear segments
    /// running the same way.
    pub fn simplify(&mut self) {
        let mut simplified: Vec<ChainPiece> = Vec::with_capacity(self.pieces.len());

        for piece in self.pieces.drain(..) {
            if let ChainPiece::Seg { from, to } = piece {
                if from == to {
                    continue;
                }

                if let Some(ChainPiece::Seg {
                    from: prev_from,
                    to: prev_to,
                }) = simplified.last().copied()
                {
                    let v1 = prev_to - prev_from;
                    let v2 = to - from;

                    if math::int_cross_product(v1, v2) == 0
                        && v1.x() as i128 * v2.x() as i128 + v1.y() as i128 * v2.y() as i128 > 0
                    {
                        simplified.pop();
                        simplified.push(ChainPiece::Seg {
                            from: prev_from,
                            to,
                        });
                        continue;
                    }
                }
            }

            simplified.push(piece);
        }

        self.pieces = simplified;
    }

    /// Point of the chain closest to `p`, with the index of its piece.
    pub fn nearest_point(&self, p: Point<i64>) -> Option<(usize, Point<i64>)> {
        self.pieces
            .iter()
            .enumerate()
            .map(|(i, piece)| (i, piece.nearest_point(p)))
            .min_by_key(|(i, nearest)| (math::distance(p, *nearest), *i))
    }

    fn locate(&self, p: Point<i64>) -> Option<ChainPos> {
        let (i, nearest) = self.nearest_point(p)?;
        let piece = self.pieces[i];

        let (point, offset) = match piece {
            ChainPiece::Seg { from, .. } => (nearest, math::distance(from, nearest)),
            ChainPiece::Arc { from, to, .. } => {
                if math::distance(nearest, from) <= math::distance(nearest, to) {
                    (from, 0)
                } else {
                    (to, piece.length())
                }
            }
        };

        Some(ChainPos {
            piece: i,
            point,
            offset,
        })
    }

    /// Splits the chain at the points nearest to `a` and `b` into the parts
    /// before, between and after them, in chain order.
    pub fn split(&self, a: Point<i64>, b: Point<i64>) -> (LineChain, LineChain, LineChain) {
        let (Some(la), Some(lb)) = (self.locate(a), self.locate(b)) else {
            return (LineChain::new(), LineChain::new(), LineChain::new());
        };

        let (la, lb) = if (la.piece, la.offset) <= (lb.piece, lb.offset) {
            (la, lb)
        } else {
            (lb, la)
        };

        let mut pre = LineChain::from_pieces(self.pieces[..la.piece].to_vec());
        let mut mid = LineChain::new();
        let mut post = LineChain::new();

        let (head, rest) = self.pieces[la.piece].cut(la.point);
        pre.pieces.extend(head);

        if la.piece == lb.piece {
            if let Some(rest) = rest {
                let (between, tail) = rest.cut(lb.point);
                mid.pieces.extend(between);
                post.pieces.extend(tail);
            }
        } else {
            mid.pieces.extend(rest);
            mid.pieces
                .extend_from_slice(&self.pieces[la.piece + 1..lb.piece]);

            let (between, tail) = self.pieces[lb.piece].cut(lb.point);
            mid.pieces.extend(between);
            post.pieces.extend(tail);
        }

        post.pieces.extend_from_slice(&self.pieces[lb.piece + 1..]);
        (pre, mid, post)
    }
}

#[cfg(test)]
mod tests {
    use geo::point;

    use super::*;

    #[test]
    fn split_straight_chain() {
        let chain = LineChain::from_points(&[
            point! {x: 0, y: 0},
            point! {x: 1000, y: 0},
            point! {x: 1000, y: 1000},
        ]);

        let (pre, mid, post) = chain.split(point! {x: 1200, y: 500}, point! {x: 200, y: 10});

        assert_eq!(pre.points(), vec![point! {x: 0, y: 0}, point! {x: 200, y: 0}]);
        assert_eq!(
            mid.points(),
            vec![
                point! {x: 200, y: 0},
                point! {x: 1000, y: 0},
                point! {x: 1000, y: 500}
            ]
        );
        assert_eq!(post.points(), vec![point! {x: 1000, y: 500}, point! {x: 1000, y: 1000}]);
        assert_eq!(pre.length() + mid.length() + post.length(), chain.length());
    }

    #[test]
    fn arcs_are_not_cut() {
        let chain = LineChain::from_pieces(vec![
            ChainPiece::Seg {
                from: point! {x: 0, y: 0},
                to: point! {x: 1000, y: 0},
            },
            ChainPiece::Arc {
                from: point! {x: 1000, y: 0},
                to: point! {x: 2000, y: 1000},
                center: point! {x: 1000, y: 1000},
                ccw: true,
            },
        ]);

        let (pre, mid, post) = chain.split(point! {x: 500, y: 0}, point! {x: 1900, y: 900});

        assert_eq!(pre.len(), 1);
        assert_eq!(mid.len(), 2);
        assert!(mid.pieces()[1].is_arc());
        assert!(post.is_empty());
    }

    #[test]
    fn simplify_merges_collinear_segments() {
        let mut chain = LineChain::from_points(&[
            point! {x: 0, y: 0},
            point! {x: 100, y: 0},
            point! {x: 100, y: 0},
            point! {x: 300, y: 0},
            point! {x: 300, y: 200},
        ]);
        chain.simplify();

        assert_eq!(
            chain.points(),
            vec![point! {x: 0, y: 0}, point! {x: 300, y: 0}, point! {x: 300, y: 200}]
        );
    }

    #[test]
    fn reversal_keeps_arc_geometry() {
        let arc = ChainPiece::Arc {
            from: point! {x: 1000, y: 0},
            to: point! {x: 0, y: 1000},
            center: point! {x: 0, y: 0},
            ccw: true,
        };

        assert_eq!(arc.length(), arc.reversed().length());
        assert_eq!(arc.shape(10), arc.reversed().shape(10));
        assert_eq!(arc.length(), 1571);
    }
}
