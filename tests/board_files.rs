use routecore::{
    board::description::BoardDescription,
    topology::{assemble_tuning_path, tuning_path_length},
    tuning::{
        placer::TuningStatus,
        settings::{MeanderSettings, MeanderSide},
        skew::SkewPlacer,
    },
};

mod common;

use common::{assert_no_collisions, load_description, net_items, pt};

#[test]
fn test_clk_pair_file() {
    let description = load_description("tests/data/clk_pair.json");
    let (board, handles) = description.make_board_with_handles();

    assert_eq!(handles.len(), 3);
    assert_eq!(board.net_by_name("GND"), Some(2));
    assert_no_collisions(&board);
}

#[test]
fn test_deskewed_board_survives_saving() {
    let description = load_description("tests/data/clk_pair.json");
    let (mut board, handles) = description.make_board_with_handles();

    let settings = MeanderSettings {
        single_sided: true,
        initial_side: MeanderSide::Right,
        ..Default::default()
    };

    let changeset = {
        let mut placer = SkewPlacer::start(&board, pt(0, 0), handles[0], settings).unwrap();
        assert_eq!(placer.move_to(pt(20_000_000, 0)), TuningStatus::Tuned);
        placer.commit()
    };

    board.apply(&changeset);
    assert_no_collisions(&board);

    let saved = serde_json::to_string(&description.with_items_of(board.node())).unwrap();
    let reloaded = BoardDescription::load(saved.as_bytes()).unwrap().make_board();

    assert_eq!(reloaded.node().item_count(), board.node().item_count());

    let path = assemble_tuning_path(reloaded.node(), net_items(&reloaded, 0)[0]);
    let length = tuning_path_length(reloaded.node(), reloaded.mesadata(), &path);
    assert!((length - 26_000_000).abs() <= 50_000);
}
