use std::{collections::HashMap, hash::Hash};

use rstar::{primitives::GeomWithData, RTree, RTreeObject, AABB};

use crate::geometry::primitive::{AccessPrimitiveShape, PrimitiveShape};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bbox {
    pub aabb: AABB<[f64; 2]>,
}

impl Bbox {
    pub fn new(aabb: AABB<[f64; 2]>) -> Bbox {
        Self { aabb }
    }
}

impl RTreeObject for Bbox {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

pub type BboxedIndex<I> = GeomWithData<Bbox, I>;

/// Shapes of the items present on one layer.
#[derive(Debug, Clone)]
pub struct ShapeIndex<I> {
    layer: i32,
    rtree: RTree<BboxedIndex<I>>,
    shapes: HashMap<I, (Bbox, PrimitiveShape)>,
}

impl<I: Copy + Eq + Hash> ShapeIndex<I> {
    pub fn new(layer: i32) -> Self {
        Self {
            layer,
            rtree: RTree::new(),
            shapes: HashMap::new(),
        }
    }

    pub fn layer(&self) -> i32 {
        self.layer
    }

    pub fn add(&mut self, handle: I, shape: PrimitiveShape) {
        let bbox = Bbox::new(shape.bbox(0));
        self.rtree.insert(BboxedIndex::new(bbox, handle));
        self.shapes.insert(handle, (bbox, shape));
    }

    pub fn remove(&mut self, handle: I) -> bool {
        let Some((bbox, _)) = self.shapes.remove(&handle) else {
            return false;
        };

        self.rtree.remove(&BboxedIndex::new(bbox, handle)).is_some()
    }

    pub fn contains(&self, handle: I) -> bool {
        self.shapes.contains_key(&handle)
    }

    pub fn shape(&self, handle: I) -> Option<&PrimitiveShape> {
        self.shapes.get(&handle).map(|(_, shape)| shape)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Items whose bounding boxes intersect `aabb`.
    pub fn overlapping(&self, aabb: AABB<[f64; 2]>) -> impl Iterator<Item = I> + '_ {
        self.rtree
            .locate_in_envelope_intersecting(&aabb)
            .map(|bboxed| bboxed.data)
    }

    /// Calls `visitor` for every item within `min_distance` of `shape`.
    /// Returns the number of hits and whether the visitor asked to stop.
    pub fn query(
        &self,
        shape: &PrimitiveShape,
        min_distance: i64,
        visitor: &mut impl FnMut(I, i32) -> bool,
    ) -> (usize, bool) {
        let mut hits = 0;

        for bboxed in self
            .rtree
            .locate_in_envelope_intersecting(&shape.bbox(min_distance))
        {
            let Some((_, candidate)) = self.shapes.get(&bboxed.data) else {
                continue;
            };

            if shape.distance(candidate) > min_distance as f64 {
                continue;
            }

            hits += 1;

            if !visitor(bboxed.data, self.layer) {
                return (hits, true);
            }
        }

        (hits, false)
    }

    /// Whether the R-tree and the shape map describe the same items.
    pub fn test_envelopes(&self) -> bool {
        self.rtree.size() == self.shapes.len()
            && self.shapes.iter().all(|(handle, (bbox, shape))| {
                bbox.aabb == shape.bbox(0)
                    && self
                        .rtree
                        .locate_in_envelope_intersecting(&bbox.aabb)
                        .any(|bboxed| bboxed.data == *handle)
            })
    }
}
