use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(about, version)]
pub struct Cli {
    #[arg(value_name = "BOARD FILE",
	  help = "Specify the JSON board description (layers, nets and items) holding the track to tune")]
    pub input: PathBuf,
    #[arg(short, long, value_name = "SETTINGS FILE",
	  help = "JSON file with meander settings. Missing fields take their default values")]
    pub settings: Option<PathBuf>,
    #[arg(short, long, value_name = "ITEM",
	  help = "Position, in the board description's item list, of the segment or arc to tune")]
    pub item: usize,
    #[arg(long, help = "Match the skew against the coupled line of a differential pair instead of tuning the length")]
    pub skew: bool,
    #[arg(long, value_name = "X,Y", value_parser = parse_point,
	  help = "Point to drag the meanders to. The far end of the tuned line is used by default")]
    pub to: Option<(i64, i64)>,
    #[arg(short, long, value_name = "OUTPUT FILE",
	  help = "Write the board with the tuning committed to this JSON file")]
    pub output: Option<PathBuf>,
}

fn parse_point(s: &str) -> Result<(i64, i64), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got '{}'", s))?;

    Ok((
        x.trim().parse().map_err(|err| format!("bad X: {}", err))?,
        y.trim().parse().map_err(|err| format!("bad Y: {}", err))?,
    ))
}
