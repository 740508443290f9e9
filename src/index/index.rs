use std::{collections::HashMap, hash::Hash};

use contracts::debug_ensures;
use log::trace;
use rstar::AABB;

use crate::{
    geometry::primitive::PrimitiveShape,
    index::shape_index::ShapeIndex,
    item::{graph::AccessItem, layers::LayerRange},
};

/// What the index remembers about an item when it is added, so that it can
/// be removed later by handle alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub layers: LayerRange,
    pub maybe_net: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct SpatialIndex<I> {
    subindices: Vec<ShapeIndex<I>>,
    items: HashMap<I, IndexEntry>,
    net_map: HashMap<usize, Vec<I>>,
}

impl<I: Copy + Eq + Hash> Default for SpatialIndex<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Copy + Eq + Hash> SpatialIndex<I> {
    pub fn new() -> Self {
        Self {
            subindices: vec![],
            items: HashMap::new(),
            net_map: HashMap::new(),
        }
    }

    /// Indexes `item` under `handle` on every layer it spans.
    ///
    /// Panics if the item's layers are unresolved.
    #[debug_ensures(self.contains(handle))]
    #[debug_ensures(self.subindices.len() as i32 > item.layers().end())]
    pub fn add(&mut self, handle: I, item: &impl AccessItem) {
        let layers = item.layers();
        assert!(
            layers.is_resolved(),
            "cannot index an item with unresolved layers {:?}",
            layers
        );

        if self.items.contains_key(&handle) {
            self.remove(handle);
        }

        self.grow(layers.end());

        for layer in layers {
            self.subindices[layer as usize].add(handle, item.shape(layer));
        }

        let maybe_net = item.maybe_net();
        self.items.insert(handle, IndexEntry { layers, maybe_net });

        if let Some(net) = maybe_net {
            self.net_map.entry(net).or_default().push(handle);
        }
    }

    fn grow(&mut self, top_layer: i32) {
        while self.subindices.len() as i32 <= top_layer {
            let layer = self.subindices.len() as i32;
            self.subindices.push(ShapeIndex::new(layer));
        }
    }

    /// Removes `handle` from the index. Removing an item that is not indexed
    /// does nothing and returns `false`.
    #[debug_ensures(!self.contains(handle))]
    pub fn remove(&mut self, handle: I) -> bool {
        let Some(entry) = self.items.get(&handle).copied() else {
            trace!("ignoring removal of an item that is not indexed");
            return false;
        };

        for layer in entry.layers {
            if let Some(subindex) = self.subindices.get_mut(layer as usize) {
                subindex.remove(handle);
            }
        }

        self.items.remove(&handle);

        if let Some(net) = entry.maybe_net {
            if let Some(bucket) = self.net_map.get_mut(&net) {
                bucket.retain(|&h| h != handle);

                if bucket.is_empty() {
                    self.net_map.remove(&net);
                }
            }
        }

        true
    }

    /// Removes `old`, then adds `item` under `new`. The two handles may be
    /// the same.
    #[debug_ensures(self.contains(new))]
    pub fn replace(&mut self, old: I, new: I, item: &impl AccessItem) {
        self.remove(old);
        self.add(new, item);
    }

    /// Visits every item within `min_distance` of `item`'s shape on the
    /// layers `item` spans. The visitor gets the hit and the layer it was
    /// found on, and stops the whole query by returning `false`. Returns the
    /// number of hits.
    pub fn query(
        &self,
        item: &impl AccessItem,
        min_distance: i64,
        mut visitor: impl FnMut(I, i32) -> bool,
    ) -> usize {
        let mut hits = 0;

        for layer in item.layers() {
            let Some(subindex) = self.subindices.get(layer.max(0) as usize) else {
                break;
            };

            let (layer_hits, stopped) =
                subindex.query(&item.shape(layer), min_distance, &mut visitor);
            hits += layer_hits;

            if stopped {
                break;
            }
        }

        hits
    }

    /// Like [`SpatialIndex::query`], but with a raw shape searched on the
    /// given layers, or on every allocated layer if none are given.
    pub fn query_shape(
        &self,
        shape: &PrimitiveShape,
        maybe_layers: Option<LayerRange>,
        min_distance: i64,
        mut visitor: impl FnMut(I, i32) -> bool,
    ) -> usize {
        let mut hits = 0;

        for subindex in self.subindices.iter().filter(|subindex| {
            maybe_layers.map_or(true, |layers| layers.contains(subindex.layer()))
        }) {
            let (layer_hits, stopped) = subindex.query(shape, min_distance, &mut visitor);
            hits += layer_hits;

            if stopped {
                break;
            }
        }

        hits
    }

    /// Items on `layer` whose bounding boxes intersect `aabb`.
    pub fn overlapping(&self, layer: i32, aabb: AABB<[f64; 2]>) -> Vec<I> {
        self.subindices
            .get(layer.max(0) as usize)
            .filter(|_| layer >= 0)
            .map(|subindex| subindex.overlapping(aabb).collect())
            .unwrap_or_default()
    }

    /// Items on `net` in insertion order, or `None` if there are none.
    pub fn items_for_net(&self, net: usize) -> Option<&[I]> {
        self.net_map.get(&net).map(|bucket| bucket.as_slice())
    }

    pub fn contains(&self, handle: I) -> bool {
        self.items.contains_key(&handle)
    }

    pub fn entry(&self, handle: I) -> Option<&IndexEntry> {
        self.items.get(&handle)
    }

    pub fn shape(&self, handle: I, layer: i32) -> Option<&PrimitiveShape> {
        self.subindices.get(layer.max(0) as usize)?.shape(handle)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All indexed items, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = I> + '_ {
        self.items.keys().copied()
    }

    pub fn layer_count(&self) -> usize {
        self.subindices.len()
    }

    /// Whether every item is present on exactly the layers of its range and
    /// in exactly one net bucket if it has a net.
    pub fn check_consistency(&self) -> bool {
        let layers_ok = self.items.iter().all(|(&handle, entry)| {
            self.subindices
                .iter()
                .all(|subindex| subindex.contains(handle) == entry.layers.contains(subindex.layer()))
        });

        let subindices_ok = self.subindices.iter().all(|subindex| {
            subindex.test_envelopes()
                && subindex.len()
                    == self
                        .items
                        .values()
                        .filter(|entry| entry.layers.contains(subindex.layer()))
                        .count()
        });

        let nets_ok = self.items.iter().all(|(&handle, entry)| {
            let occurrences = self
                .net_map
                .values()
                .flatten()
                .filter(|&&h| h == handle)
                .count();

            match entry.maybe_net {
                Some(net) => {
                    occurrences == 1
                        && self
                            .net_map
                            .get(&net)
                            .is_some_and(|bucket| bucket.contains(&handle))
                }
                None => occurrences == 0,
            }
        });

        let buckets_ok = self
            .net_map
            .values()
            .all(|bucket| !bucket.is_empty() && bucket.iter().all(|&h| self.contains(h)));

        layers_ok && subindices_ok && nets_ok && buckets_ok
    }
}
