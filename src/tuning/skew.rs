use geo::Point;
use log::debug;

use crate::{
    board::{mesadata::AccessMesadata, Board},
    item::{graph::ItemIndex, line::Line},
    node::{branch::Branch, Changeset},
    topology::{
        diff_pair::{assemble_diff_pair, DiffPair},
        pad_to_die_length, tuning_path_length,
    },
    tuning::{
        placer::{tuning_path_for, MeanderPlacer, PlacerError, TuningInfo, TuningStatus},
        settings::{MeanderSettings, MinOptMax},
    },
};

/// Skew tuning of one line of a differential pair against the other,
/// coupled line, whose length is held fixed.
#[derive(Debug)]
pub struct SkewPlacer<'a, M: AccessMesadata> {
    placer: MeanderPlacer<'a, M>,
    pair: DiffPair,
    coupled_length: i64,
}

impl<'a, M: AccessMesadata> SkewPlacer<'a, M> {
    /// Starts tuning the line `item` belongs to so that its length minus the
    /// coupled line's falls within the target skew in `settings`.
    pub fn start(
        board: &'a Board<M>,
        point: Point<i64>,
        item: ItemIndex,
        settings: MeanderSettings,
    ) -> Result<Self, PlacerError> {
        let path = tuning_path_for(board, item)?;
        let pair = assemble_diff_pair(board.node(), board.mesadata(), item)?;

        let coupled_path = pair.path(pair.seed_polarity.opposite());
        let coupled_length = tuning_path_length(board.node(), board.mesadata(), coupled_path)
            + pad_to_die_length(board.node(), coupled_path);

        let target = settings.target_skew.offset(coupled_length);
        debug!(
            "skew tuning against a coupled length of {} nm, gap {} nm",
            coupled_length, pair.gap
        );

        let placer = MeanderPlacer::start_with_path(board, point, item, path, settings, target)?;

        Ok(Self {
            placer,
            pair,
            coupled_length,
        })
    }

    pub fn move_to(&mut self, cursor: Point<i64>) -> TuningStatus {
        self.placer.move_to(cursor)
    }

    /// Length of the tuned line minus that of the coupled line.
    pub fn current_skew(&self) -> i64 {
        self.placer.current_length() - self.coupled_length
    }

    pub fn tuning_result(&self) -> TuningStatus {
        self.placer.tuning_result()
    }

    pub fn current_length(&self) -> i64 {
        self.placer.current_length()
    }

    pub fn coupled_length(&self) -> i64 {
        self.coupled_length
    }

    /// Window the tuned line's length must fall in.
    pub fn target(&self) -> MinOptMax<i64> {
        self.placer.target()
    }

    pub fn tuning_info(&self) -> TuningInfo {
        self.placer.tuning_info()
    }

    pub fn origin(&self) -> &Line {
        self.placer.origin()
    }

    pub fn diff_pair(&self) -> &DiffPair {
        &self.pair
    }

    pub fn branch(&self) -> &Branch<'a> {
        self.placer.branch()
    }

    pub fn commit(self) -> Changeset {
        self.placer.commit()
    }

    pub fn cancel(self) {
        self.placer.cancel()
    }
}
