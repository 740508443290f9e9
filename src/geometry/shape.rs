use enum_dispatch::enum_dispatch;
use geo::Point;

use crate::geometry::primitive::PrimitiveShape;

#[enum_dispatch]
pub trait MeasureLength {
    fn length(&self) -> i64;
}

#[enum_dispatch]
pub trait AccessShape: MeasureLength {
    fn center(&self) -> Point<i64>;
    fn contains_point(&self, p: Point<i64>) -> bool;
}
