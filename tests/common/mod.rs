#![allow(dead_code)]

use std::{fs::File, io::BufReader};

use geo::{point, Point};
use routecore::{
    board::{
        description::BoardDescription,
        mesadata::{AccessMesadata, BoardMesadata},
        Board,
    },
    item::{
        graph::{GetLayers, GetMaybeNet, ItemIndex, ItemWeight},
        layers::LayerRange,
        seg::SegWeight,
        solid::{SolidShape, SolidWeight},
        via::ViaWeight,
    },
    node::item_shape,
};

pub const TRACK_WIDTH: i64 = 200_000;
pub const CLEARANCE: i64 = 100_000;
pub const BOARD_THICKNESS: i64 = 1_600_000;

pub fn pt(x: i64, y: i64) -> Point<i64> {
    point! {x: x, y: y}
}

/// A two-layer board with the given nets, numbered in order.
pub fn board_with_nets(netnames: &[&str]) -> Board<BoardMesadata> {
    let mut mesadata = BoardMesadata::new(CLEARANCE);
    mesadata.bename_layer(0, "F.Cu".to_string());
    mesadata.bename_layer(1, "B.Cu".to_string());
    mesadata.set_layer_gap(0, BOARD_THICKNESS);

    for (net, netname) in netnames.iter().enumerate() {
        mesadata.bename_net(net, netname.to_string());
    }

    Board::new(mesadata)
}

pub fn seg(from: Point<i64>, to: Point<i64>, layer: i32, net: usize) -> ItemWeight {
    ItemWeight::Seg(SegWeight {
        from,
        to,
        width: TRACK_WIDTH,
        layer,
        maybe_net: Some(net),
    })
}

pub fn via(pos: Point<i64>, layers: LayerRange, net: usize) -> ItemWeight {
    ItemWeight::Via(ViaWeight {
        pos,
        diameter: 600_000,
        drill: 300_000,
        layers,
        maybe_net: Some(net),
    })
}

pub fn pad(pos: Point<i64>, layer: i32, net: usize, pad_to_die: i64) -> ItemWeight {
    ItemWeight::Solid(SolidWeight {
        pos,
        shape: SolidShape::Rect {
            half_width: 500_000,
            half_height: 500_000,
        },
        layers: LayerRange::single(layer),
        maybe_net: Some(net),
        pad_to_die,
    })
}

/// Adds a track through `points` and returns its segments in order.
pub fn add_track(
    board: &mut Board<BoardMesadata>,
    points: &[Point<i64>],
    layer: i32,
    net: usize,
) -> Vec<ItemIndex> {
    points
        .windows(2)
        .map(|w| board.add(seg(w[0], w[1], layer, net)))
        .collect()
}

/// Asserts that no item on the board violates clearance with an item of
/// another net.
pub fn assert_no_collisions(board: &Board<BoardMesadata>) {
    for item in board.node().items() {
        let weight = board.node().item_weight(item);
        let collisions = board.node().collisions(
            &item_shape(&weight),
            weight.layers(),
            weight.maybe_net(),
            board.mesadata(),
        );

        assert!(
            collisions.is_empty(),
            "{:?} collides with {:?}",
            item,
            collisions
        );
    }
}

/// Segments on `net`, in no particular order.
pub fn net_items(board: &Board<BoardMesadata>, net: usize) -> Vec<ItemIndex> {
    board
        .node()
        .index()
        .items_for_net(net)
        .map(|items| items.to_vec())
        .unwrap_or_default()
}

pub fn load_description(filename: &str) -> BoardDescription {
    let file = File::open(filename).unwrap();
    BoardDescription::load(BufReader::new(file)).unwrap()
}
