use std::f64::consts::TAU;

use geo::{point, Point};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Circle {
    pub pos: Point<i64>,
    pub r: i64,
}

pub fn to_f64(p: Point<i64>) -> Point<f64> {
    point! {x: p.x() as f64, y: p.y() as f64}
}

pub fn round_point(p: Point<f64>) -> Point<i64> {
    point! {x: p.x().round() as i64, y: p.y().round() as i64}
}

/// Euclidean norm of an integer vector, rounded to the nearest integer unit.
pub fn norm(v: Point<i64>) -> i64 {
    (v.x() as f64).hypot(v.y() as f64).round() as i64
}

pub fn distance(a: Point<i64>, b: Point<i64>) -> i64 {
    norm(b - a)
}

pub fn unit_vector(from: Point<i64>, to: Point<i64>) -> Option<Point<f64>> {
    let v = to_f64(to - from);
    let len = v.x().hypot(v.y());

    if len == 0.0 {
        return None;
    }

    Some(v / len)
}

/// Left-hand normal of a unit vector.
pub fn normal(v: Point<f64>) -> Point<f64> {
    point! {x: -v.y(), y: v.x()}
}

pub fn dot_product(v1: Point<f64>, v2: Point<f64>) -> f64 {
    v1.x() * v2.x() + v1.y() * v2.y()
}

pub fn cross_product(v1: Point<f64>, v2: Point<f64>) -> f64 {
    v1.x() * v2.y() - v1.y() * v2.x()
}

/// Exact cross product of integer vectors.
pub fn int_cross_product(v1: Point<i64>, v2: Point<i64>) -> i128 {
    v1.x() as i128 * v2.y() as i128 - v1.y() as i128 * v2.x() as i128
}

pub fn vector_angle(vector: Point<f64>) -> f64 {
    vector.y().atan2(vector.x())
}

pub fn angle_between(v1: Point<f64>, v2: Point<f64>) -> f64 {
    cross_product(v1, v2).atan2(dot_product(v1, v2))
}

/// Counterclockwise angle swept from `from` to `to`, in `[0, TAU)`.
pub fn ccw_angle(from: Point<f64>, to: Point<f64>) -> f64 {
    let angle = angle_between(from, to);

    if angle < 0.0 {
        angle + TAU
    } else {
        angle
    }
}

/// Point of the segment `a`-`b` nearest to `p`, rounded to integer units.
pub fn project_point_on_segment(p: Point<i64>, a: Point<i64>, b: Point<i64>) -> Point<i64> {
    let ab = to_f64(b - a);
    let len2 = dot_product(ab, ab);

    if len2 == 0.0 {
        return a;
    }

    let t = (dot_product(to_f64(p - a), ab) / len2).clamp(0.0, 1.0);
    round_point(to_f64(a) + ab * t)
}

/// Whether two directions are parallel within `threshold` radians, ignoring orientation.
pub fn approx_parallel(v1: Point<f64>, v2: Point<f64>, threshold: f64) -> bool {
    let angle = angle_between(v1, v2).abs();
    angle <= threshold || (std::f64::consts::PI - angle) <= threshold
}

/// Whether the projection of segment `c`-`d` onto the line of `a`-`b` overlaps `a`-`b`.
pub fn projections_overlap(a: Point<i64>, b: Point<i64>, c: Point<i64>, d: Point<i64>) -> bool {
    let Some(dir) = unit_vector(a, b) else {
        return false;
    };
    let len = dot_product(to_f64(b - a), dir);
    let tc = dot_product(to_f64(c - a), dir);
    let td = dot_product(to_f64(d - a), dir);

    tc.min(td) < len && tc.max(td) > 0.0
}

pub fn between_vectors(v: Point<f64>, from: Point<f64>, to: Point<f64>) -> bool {
    let cross = cross_product(from, to);

    if cross >= 0. {
        cross_product(from, v) >= 0. && cross_product(v, to) >= 0.
    } else {
        cross_product(from, v) >= 0. || cross_product(v, to) >= 0.
    }
}
