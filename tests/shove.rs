use routecore::{
    geometry::chain::LineChain,
    item::{graph::ItemWeight, layers::LayerRange, line::Line},
    node::branch::BranchItem,
    shove::{Shove, ShoveError, ShovePolicy, ShoveSettings},
};

mod common;

use common::{assert_no_collisions, board_with_nets, net_items, pt, seg, via, TRACK_WIDTH};

fn head_stub(top: i64) -> Line {
    Line::unlinked(
        LineChain::from_points(&[pt(10_000_000, -2_000_000), pt(10_000_000, top)]),
        TRACK_WIDTH,
        0,
        Some(0),
    )
}

#[test]
fn test_segment_is_pushed_aside() {
    let mut board = board_with_nets(&["HEAD", "A"]);
    let track = board.add(seg(pt(0, 0), pt(20_000_000, 0), 0, 1));

    let changeset = {
        let mut shove = Shove::new(&board, ShoveSettings::default());
        assert_eq!(shove.shove_line(&head_stub(300_000)), Ok(1));
        assert!(shove.violations().is_empty());
        shove.commit()
    };

    assert_eq!(changeset.removed, vec![track]);
    assert_eq!(changeset.added.len(), 6);

    // The stub reaches further down than up, so the track goes over it.
    assert!(changeset.added.contains(&seg(
        pt(9_699_999, 600_001),
        pt(10_300_001, 600_001),
        0,
        1
    )));

    board.apply(&changeset);
    assert_no_collisions(&board);

    let detour = board.node().assemble_line(net_items(&board, 1)[0]).unwrap();
    assert_eq!(detour.links.len(), 5);

    let mut ends = [detour.chain.start().unwrap(), detour.chain.end().unwrap()];
    ends.sort_by_key(|p| p.x());
    assert_eq!(ends, [pt(0, 0), pt(20_000_000, 0)]);
}

#[test]
fn test_shove_cascades() {
    let mut board = board_with_nets(&["HEAD", "A", "B"]);
    board.add(seg(pt(0, 0), pt(20_000_000, 0), 0, 1));
    board.add(seg(pt(0, 700_000), pt(20_000_000, 700_000), 0, 2));

    let changeset = {
        let mut shove = Shove::new(&board, ShoveSettings::default());
        assert_eq!(shove.shove_line(&head_stub(300_000)), Ok(2));
        shove.commit()
    };

    assert_eq!(changeset.removed.len(), 2);
    assert_eq!(changeset.added.len(), 11);

    board.apply(&changeset);
    assert_no_collisions(&board);
    assert_eq!(net_items(&board, 1).len(), 5);
    assert_eq!(net_items(&board, 2).len(), 5);
}

#[test]
fn test_other_layers_are_left_alone() {
    let mut board = board_with_nets(&["HEAD", "A"]);
    board.add(seg(pt(0, 0), pt(20_000_000, 0), 1, 1));

    let mut shove = Shove::new(&board, ShoveSettings::default());
    assert_eq!(shove.shove_line(&head_stub(300_000)), Ok(0));
    assert_eq!(shove.commit().added.len(), 1);
}

#[test]
fn test_blocked_by_via_rejects_drag() {
    let mut board = board_with_nets(&["HEAD", "A"]);
    let obstacle = board.add(via(pt(10_000_000, 0), LayerRange::new(0, 1), 1));

    let mut shove = Shove::new(&board, ShoveSettings::default());
    let err = shove.shove_line(&head_stub(-400_000)).unwrap_err();

    assert!(matches!(
        err,
        ShoveError::Blocked {
            obstacle: BranchItem::Parent(item),
            ..
        } if item == obstacle
    ));
    assert!(shove.branch().changeset().is_empty());
}

#[test]
fn test_blocked_by_via_marks_violation() {
    let mut board = board_with_nets(&["HEAD", "A"]);
    let obstacle = board.add(via(pt(10_000_000, 0), LayerRange::new(0, 1), 1));

    let settings = ShoveSettings {
        policy: ShovePolicy::MarkViolation,
        ..Default::default()
    };
    let mut shove = Shove::new(&board, settings);

    assert_eq!(shove.shove_line(&head_stub(-400_000)), Ok(0));
    assert_eq!(shove.violations().len(), 1);
    assert_eq!(shove.violations()[0].obstacle, BranchItem::Parent(obstacle));
    assert_eq!(shove.violations()[0].pos, pt(10_000_000, 0));

    let changeset = shove.commit();
    assert!(changeset.removed.is_empty());
    assert!(matches!(changeset.added[..], [ItemWeight::Seg(..)]));
}

#[test]
fn test_segment_end_in_the_way_cannot_be_pushed() {
    let mut board = board_with_nets(&["HEAD", "A"]);
    board.add(seg(pt(9_900_000, 0), pt(20_000_000, 0), 0, 1));

    let mut shove = Shove::new(&board, ShoveSettings::default());

    assert!(matches!(
        shove.shove_line(&head_stub(300_000)),
        Err(ShoveError::Blocked { .. })
    ));
}

#[test]
fn test_iteration_limit() {
    let mut board = board_with_nets(&["HEAD", "A", "B"]);
    board.add(seg(pt(0, 0), pt(20_000_000, 0), 0, 1));
    board.add(seg(pt(0, 700_000), pt(20_000_000, 700_000), 0, 2));

    let settings = ShoveSettings {
        max_iterations: 1,
        ..Default::default()
    };
    let mut shove = Shove::new(&board, settings);

    assert_eq!(
        shove.shove_line(&head_stub(300_000)),
        Err(ShoveError::IterationLimit(1))
    );
    assert!(shove.branch().changeset().is_empty());
}

#[test]
fn test_settings_from_json() {
    let settings: ShoveSettings = serde_json::from_str(r#"{"policy": "MarkViolation"}"#).unwrap();

    assert_eq!(settings.policy, ShovePolicy::MarkViolation);
    assert_eq!(settings.max_iterations, ShoveSettings::default().max_iterations);
}
