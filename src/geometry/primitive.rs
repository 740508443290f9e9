use std::f64::consts::PI;

use enum_dispatch::enum_dispatch;
use geo::{point, polygon, Contains, EuclideanDistance, LineString, Point, Polygon};
use rstar::{RTreeObject, AABB};
use serde::{Deserialize, Serialize};

use crate::{
    geometry::shape::{AccessShape, MeasureLength},
    math::{self, Circle},
};

/// Geometry an outline is built around: the outline is everything within
/// half the shape's width of its skeleton.
#[derive(Debug, Clone, PartialEq)]
pub enum Skeleton {
    Point(Point<f64>),
    Path(LineString<f64>),
    Area(Polygon<f64>),
}

impl Skeleton {
    pub fn distance(&self, other: &Skeleton) -> f64 {
        match (self, other) {
            (Skeleton::Point(a), Skeleton::Point(b)) => a.euclidean_distance(b),
            (Skeleton::Point(a), Skeleton::Path(b)) | (Skeleton::Path(b), Skeleton::Point(a)) => {
                a.euclidean_distance(b)
            }
            (Skeleton::Point(a), Skeleton::Area(b)) | (Skeleton::Area(b), Skeleton::Point(a)) => {
                a.euclidean_distance(b)
            }
            (Skeleton::Path(a), Skeleton::Path(b)) => a.euclidean_distance(b),
            (Skeleton::Path(a), Skeleton::Area(b)) | (Skeleton::Area(b), Skeleton::Path(a)) => {
                a.euclidean_distance(b)
            }
            (Skeleton::Area(a), Skeleton::Area(b)) => a.euclidean_distance(b),
        }
    }
}

#[enum_dispatch]
pub trait AccessPrimitiveShape: AccessShape {
    fn bbox(&self, margin: i64) -> AABB<[f64; 2]>;
    fn width(&self) -> i64;
    fn skeleton(&self) -> Skeleton;

    /// Edge-to-edge distance, zero when the outlines touch or overlap.
    fn distance(&self, other: &PrimitiveShape) -> f64 {
        let skeleton_distance = self.skeleton().distance(&other.skeleton());
        (skeleton_distance - self.width() as f64 / 2.0 - other.width() as f64 / 2.0).max(0.0)
    }

    fn collides(&self, other: &PrimitiveShape, clearance: i64) -> bool {
        self.distance(other) < clearance as f64
    }
}

#[enum_dispatch(MeasureLength, AccessShape, AccessPrimitiveShape)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrimitiveShape {
    Dot(DotShape),
    Seg(SegShape),
    Arc(ArcShape),
    Rect(RectShape),
}

fn bbox_from_corners(lower: [i64; 2], upper: [i64; 2], margin: i64) -> AABB<[f64; 2]> {
    AABB::from_corners(
        [(lower[0] - margin) as f64, (lower[1] - margin) as f64],
        [(upper[0] + margin) as f64, (upper[1] + margin) as f64],
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DotShape {
    pub circle: Circle,
}

impl MeasureLength for DotShape {
    fn length(&self) -> i64 {
        0
    }
}

impl AccessShape for DotShape {
    fn center(&self) -> Point<i64> {
        self.circle.pos
    }

    fn contains_point(&self, p: Point<i64>) -> bool {
        math::distance(p, self.circle.pos) <= self.circle.r
    }
}

impl AccessPrimitiveShape for DotShape {
    fn bbox(&self, margin: i64) -> AABB<[f64; 2]> {
        let pos = self.circle.pos;
        let r = self.circle.r;
        bbox_from_corners([pos.x() - r, pos.y() - r], [pos.x() + r, pos.y() + r], margin)
    }

    fn width(&self) -> i64 {
        self.circle.r * 2
    }

    fn skeleton(&self) -> Skeleton {
        Skeleton::Point(math::to_f64(self.circle.pos))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegShape {
    pub from: Point<i64>,
    pub to: Point<i64>,
    pub width: i64,
}

impl MeasureLength for SegShape {
    fn length(&self) -> i64 {
        math::distance(self.from, self.to)
    }
}

impl AccessShape for SegShape {
    fn center(&self) -> Point<i64> {
        (self.from + self.to) / 2
    }

    fn contains_point(&self, p: Point<i64>) -> bool {
        let nearest = math::project_point_on_segment(p, self.from, self.to);
        2 * math::distance(p, nearest) <= self.width
    }
}

impl AccessPrimitiveShape for SegShape {
    fn bbox(&self, margin: i64) -> AABB<[f64; 2]> {
        let halfwidth = self.width / 2 + 1;
        bbox_from_corners(
            [
                self.from.x().min(self.to.x()) - halfwidth,
                self.from.y().min(self.to.y()) - halfwidth,
            ],
            [
                self.from.x().max(self.to.x()) + halfwidth,
                self.from.y().max(self.to.y()) + halfwidth,
            ],
            margin,
        )
    }

    fn width(&self) -> i64 {
        self.width
    }

    fn skeleton(&self) -> Skeleton {
        Skeleton::Path(LineString::from(vec![
            math::to_f64(self.from).0,
            math::to_f64(self.to).0,
        ]))
    }
}

/// Arc of a track. Arcs always go counterclockwise from `from` to `to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcShape {
    pub from: Point<i64>,
    pub to: Point<i64>,
    pub center: Point<i64>,
    pub width: i64,
}

impl ArcShape {
    pub fn radius(&self) -> f64 {
        math::to_f64(self.from - self.center)
            .x()
            .hypot(math::to_f64(self.from - self.center).y())
    }

    pub fn start_angle(&self) -> f64 {
        math::vector_angle(math::to_f64(self.from - self.center))
    }

    pub fn spanned_angle(&self) -> f64 {
        math::ccw_angle(
            math::to_f64(self.from - self.center),
            math::to_f64(self.to - self.center),
        )
    }

    pub fn between_ends(&self, p: Point<i64>) -> bool {
        math::between_vectors(
            math::to_f64(p - self.center),
            math::to_f64(self.from - self.center),
            math::to_f64(self.to - self.center),
        )
    }

    /// Polyline approximation of the arc's centerline, at most 10 degrees per chord.
    pub fn polyline(&self) -> LineString<f64> {
        let angle = self.spanned_angle();
        let steps = ((angle / (PI / 18.0)).ceil() as usize).max(1);
        let center = math::to_f64(self.center);
        let r = self.radius();
        let start = self.start_angle();

        let mut coords = vec![math::to_f64(self.from).0];

        for i in 1..steps {
            let a = start + angle * i as f64 / steps as f64;
            coords.push((center + point! {x: r * a.cos(), y: r * a.sin()}).0);
        }

        coords.push(math::to_f64(self.to).0);
        LineString::from(coords)
    }
}

impl MeasureLength for ArcShape {
    fn length(&self) -> i64 {
        (self.spanned_angle() * self.radius()).round() as i64
    }
}

impl AccessShape for ArcShape {
    fn center(&self) -> Point<i64> {
        let mid_angle = self.start_angle() + self.spanned_angle() / 2.0;
        let r = self.radius();
        math::round_point(
            math::to_f64(self.center) + point! {x: r * mid_angle.cos(), y: r * mid_angle.sin()},
        )
    }

    fn contains_point(&self, p: Point<i64>) -> bool {
        let d = math::to_f64(p - self.center);
        let d = d.x().hypot(d.y());
        self.between_ends(p) && (d - self.radius()).abs() <= self.width as f64 / 2.0
    }
}

impl AccessPrimitiveShape for ArcShape {
    fn bbox(&self, margin: i64) -> AABB<[f64; 2]> {
        // Covers the whole circle the arc lies on.
        let halfwidth = self.radius().ceil() as i64 + self.width / 2 + 1;
        bbox_from_corners(
            [self.center.x() - halfwidth, self.center.y() - halfwidth],
            [self.center.x() + halfwidth, self.center.y() + halfwidth],
            margin,
        )
    }

    fn width(&self) -> i64 {
        self.width
    }

    fn skeleton(&self) -> Skeleton {
        Skeleton::Path(self.polyline())
    }
}

/// Axis-aligned rectangle, used for pads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectShape {
    pub center: Point<i64>,
    pub half_width: i64,
    pub half_height: i64,
}

impl RectShape {
    pub fn polygon(&self) -> Polygon<f64> {
        let c = math::to_f64(self.center);
        let hw = self.half_width as f64;
        let hh = self.half_height as f64;

        polygon![
            (x: c.x() - hw, y: c.y() - hh),
            (x: c.x() + hw, y: c.y() - hh),
            (x: c.x() + hw, y: c.y() + hh),
            (x: c.x() - hw, y: c.y() + hh),
        ]
    }
}

impl MeasureLength for RectShape {
    fn length(&self) -> i64 {
        0
    }
}

impl AccessShape for RectShape {
    fn center(&self) -> Point<i64> {
        self.center
    }

    fn contains_point(&self, p: Point<i64>) -> bool {
        (p.x() - self.center.x()).abs() <= self.half_width
            && (p.y() - self.center.y()).abs() <= self.half_height
    }
}

impl AccessPrimitiveShape for RectShape {
    fn bbox(&self, margin: i64) -> AABB<[f64; 2]> {
        bbox_from_corners(
            [
                self.center.x() - self.half_width,
                self.center.y() - self.half_height,
            ],
            [
                self.center.x() + self.half_width,
                self.center.y() + self.half_height,
            ],
            margin,
        )
    }

    fn width(&self) -> i64 {
        0
    }

    fn skeleton(&self) -> Skeleton {
        Skeleton::Area(self.polygon())
    }
}

impl PrimitiveShape {
    /// Whether `p` lies inside the shape's area, as opposed to near its skeleton.
    pub fn encloses(&self, p: Point<i64>) -> bool {
        match self {
            PrimitiveShape::Rect(rect) => rect.polygon().contains(&math::to_f64(p)),
            _ => self.contains_point(p),
        }
    }
}

impl RTreeObject for PrimitiveShape {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AccessPrimitiveShape::bbox(self, 0)
    }
}
