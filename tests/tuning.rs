use routecore::{
    board::{mesadata::BoardMesadata, Board},
    item::{graph::ItemIndex, layers::LayerRange},
    topology::{assemble_tuning_path, diff_pair::TopologyError, tuning_path_length},
    tuning::{
        placer::{MeanderPlacer, PlacerError, TuningStatus},
        settings::{MeanderCorner, MeanderSettings, MeanderSide, MinOptMax},
        skew::SkewPlacer,
    },
};

mod common;

use common::{assert_no_collisions, board_with_nets, net_items, pad, pt, seg, via};

fn length_settings(opt: i64) -> MeanderSettings {
    MeanderSettings {
        target_length: MinOptMax::new(opt - 100_000, opt, opt + 100_000),
        ..Default::default()
    }
}

fn straight_board() -> (Board<BoardMesadata>, ItemIndex) {
    let mut board = board_with_nets(&["SIG", "GND"]);
    let track = board.add(seg(pt(0, 0), pt(20_000_000, 0), 0, 0));
    (board, track)
}

#[test]
fn test_reaches_target_length() {
    let (board, track) = straight_board();

    let mut placer = MeanderPlacer::start(&board, pt(0, 0), track, length_settings(30_000_000)).unwrap();
    assert_eq!(placer.current_length(), 20_000_000);
    assert_eq!(placer.tuning_result(), TuningStatus::TooShort);

    assert_eq!(placer.move_to(pt(20_000_000, 0)), TuningStatus::Tuned);
    assert_eq!(placer.current_length(), 30_000_000);
    assert_eq!(placer.tuning_info().meander_count, 5);
    assert_eq!(placer.tuning_info().deviation(), 0);
    assert!(!placer.tuning_result().is_at_limit());
}

#[test]
fn test_fine_tunes_between_steps() {
    let (board, track) = straight_board();
    let settings = MeanderSettings {
        target_length: MinOptMax::new(25_490_000, 25_500_000, 25_510_000),
        ..Default::default()
    };

    let mut placer = MeanderPlacer::start(&board, pt(0, 0), track, settings).unwrap();

    assert_eq!(placer.move_to(pt(20_000_000, 0)), TuningStatus::Tuned);
    assert!((placer.current_length() - 25_500_000).abs() <= 10);
    assert_eq!(placer.tuning_info().meander_count, 3);
}

#[test]
fn test_chamfered_meanders() {
    let (board, track) = straight_board();
    let settings = MeanderSettings {
        corner: MeanderCorner::Chamfer,
        ..length_settings(30_000_000)
    };

    let mut placer = MeanderPlacer::start(&board, pt(0, 0), track, settings).unwrap();

    assert_eq!(placer.move_to(pt(20_000_000, 0)), TuningStatus::Tuned);
    assert!((placer.current_length() - 30_000_000).abs() <= 100_000);
}

#[test]
fn test_unreachable_target_is_at_limit() {
    let (board, track) = straight_board();

    let mut placer = MeanderPlacer::start(&board, pt(0, 0), track, length_settings(100_000_000)).unwrap();
    let status = placer.move_to(pt(20_000_000, 0));

    // Sixteen meanders fit, each adding twice the maximum amplitude.
    assert_eq!(status, TuningStatus::TooShort);
    assert!(status.is_at_limit());
    assert_eq!(placer.current_length(), 52_000_000);
    assert_eq!(placer.tuning_info().deviation(), 52_000_000 - 99_900_000);
    assert!(placer
        .tuning_info()
        .to_string()
        .ends_with(", -47900000 nm off the window"));
}

#[test]
fn test_too_long_line_stays_straight() {
    let (board, track) = straight_board();

    let mut placer = MeanderPlacer::start(&board, pt(0, 0), track, length_settings(10_000_000)).unwrap();

    assert_eq!(placer.move_to(pt(20_000_000, 0)), TuningStatus::TooLong);
    assert_eq!(placer.current_length(), 20_000_000);
    assert_eq!(placer.tuning_info().meander_count, 0);
}

#[test]
fn test_keep_endpoints_spares_single_segment() {
    let (board, track) = straight_board();
    let settings = MeanderSettings {
        keep_endpoints: true,
        ..length_settings(30_000_000)
    };

    let mut placer = MeanderPlacer::start(&board, pt(0, 0), track, settings).unwrap();

    assert_eq!(placer.move_to(pt(20_000_000, 0)), TuningStatus::TooShort);
    assert_eq!(placer.current_length(), 20_000_000);
}

#[test]
fn test_partial_drag_meanders_only_dragged_part() {
    let (board, track) = straight_board();

    let mut placer = MeanderPlacer::start(&board, pt(0, 0), track, length_settings(30_000_000)).unwrap();

    // Only half the line is available, which can add at most 14_000_000.
    assert_eq!(placer.move_to(pt(10_000_000, 3_000_000)), TuningStatus::Tuned);
    assert_eq!(placer.current_length(), 30_000_000);
}

#[test]
fn test_commit_applies_meanders() {
    let (mut board, track) = straight_board();

    let changeset = {
        let mut placer =
            MeanderPlacer::start(&board, pt(0, 0), track, length_settings(30_000_000)).unwrap();
        placer.move_to(pt(20_000_000, 0));
        placer.commit()
    };

    assert_eq!(changeset.removed, vec![track]);
    // Five meanders of three segments each, and six stretches in between.
    assert_eq!(changeset.added.len(), 21);

    board.apply(&changeset);
    assert!(!board.node().contains(track));
    assert_eq!(board.node().item_count(), 21);

    let path = assemble_tuning_path(board.node(), net_items(&board, 0)[0]);
    assert_eq!(path.items.len(), 21);
    assert_eq!(
        tuning_path_length(board.node(), board.mesadata(), &path),
        30_000_000
    );
}

#[test]
fn test_commit_without_move_changes_nothing_geometric() {
    let (mut board, track) = straight_board();
    let before = board.node().item_weight(track);

    let changeset = MeanderPlacer::start(&board, pt(0, 0), track, length_settings(30_000_000))
        .unwrap()
        .commit();
    board.apply(&changeset);

    let items = net_items(&board, 0);
    assert_eq!(items.len(), 1);
    assert_eq!(board.node().item_weight(items[0]), before);
}

#[test]
fn test_cancel_leaves_board_untouched() {
    let (board, track) = straight_board();
    let before = board.node().item_weight(track);

    let mut placer = MeanderPlacer::start(&board, pt(0, 0), track, length_settings(30_000_000)).unwrap();
    placer.move_to(pt(20_000_000, 0));
    assert!(placer.branch().is_hidden(track));
    placer.cancel();

    assert!(board.node().contains(track));
    assert_eq!(board.node().item_count(), 1);
    assert_eq!(board.node().item_weight(track), before);
}

#[test]
fn test_meanders_avoid_obstacles() {
    let (mut board, track) = straight_board();
    board.add(via(pt(10_000_000, 800_000), LayerRange::new(0, 1), 1));

    let changeset = {
        let mut placer =
            MeanderPlacer::start(&board, pt(0, 0), track, length_settings(50_000_000)).unwrap();
        assert_eq!(placer.move_to(pt(20_000_000, 0)), TuningStatus::Tuned);
        placer.commit()
    };

    board.apply(&changeset);
    assert_no_collisions(&board);
}

#[test]
fn test_pads_and_pad_to_die_count() {
    let mut board = board_with_nets(&["SIG"]);
    board.add(pad(pt(0, 0), 0, 0, 1_000_000));
    let track = board.add(seg(pt(0, 0), pt(20_000_000, 0), 0, 0));
    board.add(pad(pt(20_000_000, 0), 0, 0, 1_000_000));

    let mut placer = MeanderPlacer::start(&board, pt(0, 0), track, length_settings(30_000_000)).unwrap();
    assert_eq!(placer.current_length(), 22_000_000);

    assert_eq!(placer.move_to(pt(20_000_000, 0)), TuningStatus::Tuned);
    assert_eq!(placer.current_length(), 30_000_000);
    assert_eq!(placer.tuning_info().meander_count, 4);
}

#[test]
fn test_nothing_to_tune() {
    let (mut board, track) = straight_board();
    board.remove(track);

    assert_eq!(
        MeanderPlacer::start(&board, pt(0, 0), track, MeanderSettings::default()).unwrap_err(),
        PlacerError::NothingToTune
    );
}

#[test]
fn test_lone_pad_and_via_are_not_tunable() {
    let mut board = board_with_nets(&["JUMPER"]);
    let lone_pad = board.add(pad(pt(0, 0), 0, 0, 0));
    let lone_via = board.add(via(pt(5_000_000, 0), LayerRange::new(0, 1), 0));

    assert_eq!(
        MeanderPlacer::start(&board, pt(0, 0), lone_pad, MeanderSettings::default())
            .unwrap_err(),
        PlacerError::NotTunable(lone_pad)
    );
    assert_eq!(
        MeanderPlacer::start(&board, pt(5_000_000, 0), lone_via, MeanderSettings::default())
            .unwrap_err(),
        PlacerError::NotTunable(lone_via)
    );
}

#[test]
fn test_via_is_not_tunable() {
    let mut board = board_with_nets(&["SIG"]);
    board.add(seg(pt(0, 0), pt(5_000_000, 0), 0, 0));
    let through = board.add(via(pt(5_000_000, 0), LayerRange::new(0, 1), 0));
    board.add(seg(pt(5_000_000, 0), pt(5_000_000, 5_000_000), 1, 0));

    assert_eq!(
        MeanderPlacer::start(&board, pt(5_000_000, 0), through, MeanderSettings::default())
            .unwrap_err(),
        PlacerError::NotTunable(through)
    );
}

fn clk_board(n_length: i64) -> (Board<BoardMesadata>, ItemIndex) {
    let mut board = board_with_nets(&["CLK_P", "CLK_N", "VCC"]);
    let p = board.add(seg(pt(0, 0), pt(20_000_000, 0), 0, 0));
    board.add(seg(pt(0, 600_000), pt(n_length, 600_000), 0, 1));
    (board, p)
}

fn skew_settings() -> MeanderSettings {
    MeanderSettings {
        single_sided: true,
        initial_side: MeanderSide::Right,
        ..Default::default()
    }
}

#[test]
fn test_skew_settles_in_window() {
    let (board, p) = clk_board(26_000_000);

    let mut placer = SkewPlacer::start(&board, pt(0, 0), p, skew_settings()).unwrap();
    assert_eq!(placer.coupled_length(), 26_000_000);
    assert_eq!(placer.current_skew(), -6_000_000);
    assert_eq!(placer.target(), MinOptMax::new(25_950_000, 26_000_000, 26_050_000));

    assert_eq!(placer.move_to(pt(20_000_000, 0)), TuningStatus::Tuned);
    assert!(placer.current_skew().abs() <= 50_000);
    assert_eq!(placer.diff_pair().gap, 400_000);
}

#[test]
fn test_skew_window_is_respected_for_any_coupled_length() {
    for n_length in [21_000_000, 23_300_000, 27_777_777, 40_000_000] {
        let (board, p) = clk_board(n_length);

        let mut placer = SkewPlacer::start(&board, pt(0, 0), p, skew_settings()).unwrap();
        let status = placer.move_to(pt(20_000_000, 0));

        assert_eq!(status, TuningStatus::Tuned, "coupled length {}", n_length);
        assert!(placer.current_skew().abs() <= 50_000);
    }
}

#[test]
fn test_infeasible_skew_is_at_limit() {
    let (board, p) = clk_board(60_000_000);

    let mut placer = SkewPlacer::start(&board, pt(0, 0), p, skew_settings()).unwrap();
    let status = placer.move_to(pt(20_000_000, 0));

    assert_eq!(status, TuningStatus::TooShort);
    assert_eq!(placer.current_skew(), 52_000_000 - 60_000_000);
}

#[test]
fn test_skew_needs_a_diff_pair() {
    let (mut board, _) = clk_board(26_000_000);
    let vcc = board.add(seg(pt(0, 5_000_000), pt(20_000_000, 5_000_000), 0, 2));

    assert_eq!(
        SkewPlacer::start(&board, pt(0, 5_000_000), vcc, skew_settings()).unwrap_err(),
        PlacerError::Topology(TopologyError::NoComplementaryNet("VCC".to_string()))
    );
}
