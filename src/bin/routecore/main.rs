use std::fs::File;
use std::io::{BufReader, BufWriter};

use anyhow::{bail, Context};
use clap::Parser;
use geo::{point, Point};
use routecore::board::description::BoardDescription;
use routecore::item::graph::GetAnchors;
use routecore::tuning::placer::MeanderPlacer;
use routecore::tuning::settings::MeanderSettings;
use routecore::tuning::skew::SkewPlacer;

mod cli;

use cli::Cli;

fn main() -> anyhow::Result<()> {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).
    let args = Cli::parse();

    let board_file = File::open(&args.input)
        .with_context(|| format!("cannot open {}", args.input.display()))?;
    let description = BoardDescription::load(BufReader::new(board_file))?;

    let settings: MeanderSettings = if let Some(settings_filename) = &args.settings {
        let settings_file = File::open(settings_filename)
            .with_context(|| format!("cannot open {}", settings_filename.display()))?;
        serde_json::from_reader(BufReader::new(settings_file))?
    } else {
        MeanderSettings::default()
    };

    let (mut board, handles) = description.make_board_with_handles();

    let Some(&item) = handles.get(args.item) else {
        bail!("the board has {} items, there is no item {}", handles.len(), args.item);
    };

    let start = board
        .node()
        .item_weight(item)
        .anchors()
        .first()
        .copied()
        .context("the item has no position")?;
    let cursor = args.to.map(|(x, y)| point! {x: x, y: y});

    let changeset = if args.skew {
        let mut placer = SkewPlacer::start(&board, start, item, settings)?;
        placer.move_to(cursor_or_end(cursor, placer.origin().chain.end(), start));

        println!("{}", placer.tuning_info());
        println!(
            "skew {} nm against a coupled length of {} nm",
            placer.current_skew(),
            placer.coupled_length()
        );
        placer.commit()
    } else {
        let mut placer = MeanderPlacer::start(&board, start, item, settings)?;
        placer.move_to(cursor_or_end(cursor, placer.origin().chain.end(), start));

        println!("{}", placer.tuning_info());
        placer.commit()
    };

    if let Some(output_filename) = args.output {
        board.apply(&changeset);

        let output_file = File::create(&output_filename)
            .with_context(|| format!("cannot create {}", output_filename.display()))?;
        serde_json::to_writer_pretty(
            BufWriter::new(output_file),
            &description.with_items_of(board.node()),
        )?;
    }

    Ok(())
}

fn cursor_or_end(
    cursor: Option<Point<i64>>,
    line_end: Option<Point<i64>>,
    start: Point<i64>,
) -> Point<i64> {
    cursor.or(line_end).unwrap_or(start)
}
