use std::fmt;

use geo::Point;
use log::debug;
use thiserror::Error;

use crate::{
    board::{mesadata::AccessMesadata, Board},
    item::{graph::ItemIndex, line::Line},
    node::{branch::Branch, Changeset},
    topology::{
        assemble_tuning_path, diff_pair::TopologyError, itemset::TuningPath, pad_to_die_length,
        tuning_path_length,
    },
    tuning::{
        meander::{build_chain, distribute, fit_meanders, layout_meanders},
        settings::{MeanderSettings, MinOptMax},
    },
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlacerError {
    #[error("nothing to tune")]
    NothingToTune,
    #[error("{0:?} cannot be tuned, only segments and arcs can")]
    NotTunable(ItemIndex),
    #[error(transparent)]
    Topology(#[from] TopologyError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuningStatus {
    Tuned,
    TooShort,
    TooLong,
}

impl TuningStatus {
    pub fn classify(length: i64, target: &MinOptMax<i64>) -> Self {
        if length < target.min {
            TuningStatus::TooShort
        } else if length > target.max {
            TuningStatus::TooLong
        } else {
            TuningStatus::Tuned
        }
    }

    /// Whether the target could not be reached and the result was clamped
    /// to the closest achievable one.
    pub fn is_at_limit(&self) -> bool {
        *self != TuningStatus::Tuned
    }
}

/// Live feedback for the user while dragging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TuningInfo {
    pub status: TuningStatus,
    pub length: i64,
    pub target: MinOptMax<i64>,
    pub meander_count: usize,
}

impl TuningInfo {
    /// How far the length lies outside the target window, negative when
    /// short and zero when tuned.
    pub fn deviation(&self) -> i64 {
        self.length - self.target.clamp(self.length)
    }
}

impl fmt::Display for TuningInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self.status {
            TuningStatus::Tuned => "tuned",
            TuningStatus::TooShort => "too short",
            TuningStatus::TooLong => "too long",
        };

        write!(
            f,
            "{}: length {} nm, target {} nm ({}..{}), {} meanders",
            status,
            self.length,
            self.target.opt,
            self.target.min,
            self.target.max,
            self.meander_count
        )?;

        match self.deviation() {
            0 => Ok(()),
            deviation => write!(f, ", {:+} nm off the window", deviation),
        }
    }
}

/// Checks that `item` can seed a tuning interaction and returns its tuning
/// path.
pub(super) fn tuning_path_for<M: AccessMesadata>(
    board: &Board<M>,
    item: ItemIndex,
) -> Result<TuningPath, PlacerError> {
    if !board.node().contains(item) {
        return Err(PlacerError::NothingToTune);
    }

    if !item.is_line_piece() {
        return Err(PlacerError::NotTunable(item));
    }

    let path = assemble_tuning_path(board.node(), item);

    if path.is_empty() {
        return Err(PlacerError::NothingToTune);
    }

    Ok(path)
}

/// Length tuning of one line with meanders, on a private branch of the
/// board. Nothing reaches the board until the changeset from
/// [`MeanderPlacer::commit`] is applied to it.
#[derive(Debug)]
pub struct MeanderPlacer<'a, M: AccessMesadata> {
    board: &'a Board<M>,
    branch: Branch<'a>,
    settings: MeanderSettings,
    origin: Line,
    origin_length: i64,
    start_point: Point<i64>,
    base_length: i64,
    target: MinOptMax<i64>,
    last_length: i64,
    last_status: TuningStatus,
    meander_count: usize,
}

impl<'a, M: AccessMesadata> MeanderPlacer<'a, M> {
    /// Starts tuning the line `item` belongs to, clicked at `point`, towards
    /// the target length in `settings`.
    pub fn start(
        board: &'a Board<M>,
        point: Point<i64>,
        item: ItemIndex,
        settings: MeanderSettings,
    ) -> Result<Self, PlacerError> {
        let path = tuning_path_for(board, item)?;
        Self::start_with_path(board, point, item, path, settings, settings.target_length)
    }

    pub(super) fn start_with_path(
        board: &'a Board<M>,
        point: Point<i64>,
        item: ItemIndex,
        path: TuningPath,
        settings: MeanderSettings,
        target: MinOptMax<i64>,
    ) -> Result<Self, PlacerError> {
        let origin = board
            .node()
            .assemble_line(item)
            .ok_or(PlacerError::NotTunable(item))?;

        let (_, start_point) = origin
            .chain
            .nearest_point(point)
            .ok_or(PlacerError::NothingToTune)?;

        let base_length = tuning_path_length(board.node(), board.mesadata(), &path)
            + pad_to_die_length(board.node(), &path);

        let mut branch = Branch::new(board.node());
        branch.remove_line(&origin);

        for weight in origin.weights() {
            branch.add(weight);
        }

        debug!(
            "tuning started on a line of {} pieces, length {} nm, target {:?}",
            origin.links.len(),
            base_length,
            target
        );

        Ok(Self {
            board,
            branch,
            settings,
            origin_length: origin.length(),
            origin,
            start_point,
            base_length,
            target,
            last_length: base_length,
            last_status: TuningStatus::classify(base_length, &target),
            meander_count: 0,
        })
    }

    /// Rebuilds the meanders between the start point and `cursor`.
    pub fn move_to(&mut self, cursor: Point<i64>) -> TuningStatus {
        self.branch.clear_local();

        let (pre, mid, post) = self.origin.chain.split(self.start_point, cursor);

        let mut meanders = layout_meanders(
            &mid,
            &self.settings,
            self.settings.keep_endpoints && pre.is_empty(),
            self.settings.keep_endpoints && post.is_empty(),
        );

        fit_meanders(
            &mut meanders,
            &self.branch,
            self.board.mesadata(),
            self.origin.width,
            self.origin.layer,
            self.origin.maybe_net,
            &self.settings,
        );

        distribute(
            &mut meanders,
            self.target.opt - self.base_length,
            &self.settings,
        );

        let mut chain = pre;
        chain.append(&build_chain(&mid, &meanders, &self.settings));
        chain.append(&post);
        chain.simplify();

        let line = Line::unlinked(
            chain,
            self.origin.width,
            self.origin.layer,
            self.origin.maybe_net,
        );

        self.last_length = self.base_length - self.origin_length + line.length();
        self.last_status = TuningStatus::classify(self.last_length, &self.target);
        self.meander_count = meanders.iter().filter(|m| m.amplitude > 0).count();

        for weight in line.weights() {
            self.branch.add(weight);
        }

        debug!(
            "{} meanders, length {} nm, {:?}",
            self.meander_count, self.last_length, self.last_status
        );

        self.last_status
    }

    pub fn tuning_result(&self) -> TuningStatus {
        self.last_status
    }

    pub fn current_length(&self) -> i64 {
        self.last_length
    }

    pub fn target(&self) -> MinOptMax<i64> {
        self.target
    }

    pub fn tuning_info(&self) -> TuningInfo {
        TuningInfo {
            status: self.last_status,
            length: self.last_length,
            target: self.target,
            meander_count: self.meander_count,
        }
    }

    pub fn origin(&self) -> &Line {
        &self.origin
    }

    pub fn branch(&self) -> &Branch<'a> {
        &self.branch
    }

    /// Ends the interaction, returning the changes to apply to the board.
    pub fn commit(self) -> Changeset {
        self.branch.into_changeset()
    }

    /// Ends the interaction, discarding every change.
    pub fn cancel(self) {
        debug!("tuning cancelled");
    }
}
