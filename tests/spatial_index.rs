use rstar::AABB;
use routecore::{
    geometry::primitive::{DotShape, PrimitiveShape},
    index::SpatialIndex,
    item::{graph::ItemWeight, layers::LayerRange},
    math::Circle,
};

mod common;

use common::{pt, seg, via};

fn point_via(x: i64, y: i64, layers: LayerRange, net: usize) -> ItemWeight {
    let ItemWeight::Via(mut weight) = via(pt(x, y), layers, net) else {
        unreachable!();
    };
    weight.diameter = 10;
    ItemWeight::Via(weight)
}

fn probe(x: i64, y: i64) -> PrimitiveShape {
    PrimitiveShape::Dot(DotShape {
        circle: Circle { pos: pt(x, y), r: 1 },
    })
}

#[test]
fn test_overlapping_along_diagonal() {
    let mut index = SpatialIndex::new();

    for i in 0..100 {
        index.add(i, &point_via(i * 100, i * 100, LayerRange::single(0), 0));
    }

    let small = AABB::from_corners([-10.0, -10.0], [10.0, 10.0]);
    assert_eq!(index.overlapping(0, small).len(), 1);

    let medium = AABB::from_corners([-10.0, -10.0], [110.0, 110.0]);
    assert_eq!(index.overlapping(0, medium).len(), 2);

    let half = AABB::from_corners([-10.0, -10.0], [4910.0, 4910.0]);
    let mut found = index.overlapping(0, half);
    found.sort();
    assert_eq!(found, (0..50).collect::<Vec<_>>());

    assert!(index.overlapping(1, half).is_empty());
    assert!(index.check_consistency());
}

#[test]
fn test_empty_index() {
    let index: SpatialIndex<usize> = SpatialIndex::new();

    assert!(index.is_empty());
    assert_eq!(index.layer_count(), 0);
    assert_eq!(index.query_shape(&probe(0, 0), None, 1_000_000, |_, _| true), 0);
    assert_eq!(index.items_for_net(0), None);
    assert!(index
        .overlapping(0, AABB::from_corners([-1e9, -1e9], [1e9, 1e9]))
        .is_empty());
}

#[test]
fn test_self_hit_on_every_layer() {
    let mut index = SpatialIndex::new();
    let through = via(pt(0, 0), LayerRange::new(0, 2), 0);
    index.add(7usize, &through);

    let mut layers = vec![];
    let hits = index.query(&through, 0, |handle, layer| {
        assert_eq!(handle, 7);
        layers.push(layer);
        true
    });

    assert_eq!(hits, 3);
    assert_eq!(layers, vec![0, 1, 2]);
}

#[test]
fn test_query_respects_min_distance() {
    let mut index = SpatialIndex::new();
    index.add(1usize, &seg(pt(0, 0), pt(1_000_000, 0), 0, 0));

    // The track's edge is 400_000 away from the probe's.
    let near = probe(500_000, 500_001);
    assert_eq!(index.query_shape(&near, None, 400_010, |_, _| true), 1);
    assert_eq!(index.query_shape(&near, None, 399_990, |_, _| true), 0);
}

#[test]
fn test_visitor_stops_the_whole_query() {
    let mut index = SpatialIndex::new();

    for i in 0..5 {
        index.add(i, &via(pt(0, 0), LayerRange::new(0, 1), 0));
    }

    let mut visits = 0;
    let hits = index.query_shape(&probe(0, 0), None, 0, |_, _| {
        visits += 1;
        false
    });

    assert_eq!(hits, 1);
    assert_eq!(visits, 1);

    assert_eq!(index.query_shape(&probe(0, 0), None, 0, |_, _| true), 10);
}

#[test]
fn test_replace_moves_item_between_layers() {
    let mut index = SpatialIndex::new();
    index.add(3usize, &via(pt(0, 0), LayerRange::new(0, 1), 0));
    index.replace(3, 3, &via(pt(0, 0), LayerRange::new(2, 3), 0));

    let on_layer = |layer| {
        index.query_shape(&probe(0, 0), Some(LayerRange::single(layer)), 0, |_, _| true)
    };

    assert_eq!(on_layer(0), 0);
    assert_eq!(on_layer(1), 0);
    assert_eq!(on_layer(2), 1);
    assert_eq!(on_layer(3), 1);
    assert_eq!(index.len(), 1);
    assert!(index.check_consistency());
}

#[test]
fn test_add_remove_round_trip() {
    let mut index = SpatialIndex::new();
    let track = seg(pt(0, 0), pt(100, 0), 0, 4);

    index.add(1usize, &track);
    assert!(index.remove(1));
    assert!(!index.contains(1));
    assert_eq!(index.items_for_net(4), None);

    index.add(1, &track);
    assert!(index.contains(1));
    assert_eq!(index.items_for_net(4), Some(&[1][..]));
}

#[test]
fn test_remove_unknown_is_noop() {
    let mut index = SpatialIndex::new();
    index.add(1usize, &seg(pt(0, 0), pt(100, 0), 0, 0));

    assert!(!index.remove(2));
    assert!(!index.remove(2));
    assert_eq!(index.len(), 1);
    assert!(index.check_consistency());
}

#[test]
#[should_panic(expected = "unresolved layers")]
fn test_add_unresolved_panics() {
    let mut index = SpatialIndex::new();
    index.add(1usize, &via(pt(0, 0), LayerRange::UNDEFINED, 0));
}

#[test]
fn test_net_buckets_keep_insertion_order() {
    let mut index = SpatialIndex::new();

    for i in 0..6usize {
        index.add(i, &seg(pt(0, i as i64 * 1000), pt(500, i as i64 * 1000), 0, i % 2));
    }

    index.remove(2);

    assert_eq!(index.items_for_net(0), Some(&[0, 4][..]));
    assert_eq!(index.items_for_net(1), Some(&[1, 3, 5][..]));
}

#[test]
fn test_consistency_through_operation_sequence() {
    let mut index = SpatialIndex::new();
    let mut state: u64 = 12345;

    let mut next = move |bound: u64| {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (state >> 33) % bound
    };

    for _ in 0..500 {
        let handle = next(20) as usize;
        let net = next(4) as usize;
        let x = next(10_000) as i64;
        let y = next(10_000) as i64;

        let item = match next(3) {
            0 => seg(pt(x, y), pt(x + 500, y + 200), next(4) as i32, net),
            1 => {
                let start = next(4) as i32;
                via(pt(x, y), LayerRange::new(start, start + next(3) as i32), net)
            }
            _ => via(pt(x, y), LayerRange::single(next(6) as i32), net),
        };

        match next(3) {
            0 => index.add(handle, &item),
            1 => {
                index.remove(handle);
            }
            _ => index.replace(handle, (handle + 1) % 20, &item),
        }

        assert!(index.check_consistency());

        for handle in index.iter().collect::<Vec<_>>() {
            let entry = *index.entry(handle).unwrap();

            let hits = index.query_shape(
                index.shape(handle, entry.layers.start()).unwrap(),
                Some(entry.layers),
                0,
                |_, _| true,
            );
            assert!(hits >= entry.layers.iter().count());

            if let Some(net) = entry.maybe_net {
                assert!(index.items_for_net(net).unwrap().contains(&handle));
            }
        }
    }
}
