use geo::Point;
use itertools::Itertools;

use crate::{
    geometry::{
        chain::{ChainPiece, LineChain},
        primitive::{PrimitiveShape, SegShape},
    },
    item::layers::LayerRange,
    math,
    node::branch::Branch,
    rules::AccessRules,
    tuning::settings::{MeanderCorner, MeanderSettings, MeanderSide},
};

/// A single meander: a bump raised off a straight piece of the tuned line,
/// `width` long along the piece. Meanders are independent of each other.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Meander {
    /// Index of the piece the meander sits on.
    pub piece: usize,
    /// Distance of the meander's start from the start of its piece.
    pub offset: i64,
    pub start: Point<i64>,
    pub dir: Point<f64>,
    pub width: i64,
    pub side: MeanderSide,
    /// Largest amplitude that stays clear of obstacles, 0 if none does.
    pub max_amplitude: i64,
    /// Current amplitude, 0 for a flat (inactive) meander.
    pub amplitude: i64,
}

impl Meander {
    pub fn end(&self) -> Point<i64> {
        math::round_point(math::to_f64(self.start) + self.dir * self.width as f64)
    }

    /// Vertices of the meander at `amplitude`, from its start to its end on
    /// the baseline.
    pub fn points(&self, amplitude: i64, settings: &MeanderSettings) -> Vec<Point<i64>> {
        let start = math::to_f64(self.start);
        let d = self.dir;
        let n = math::normal(self.dir) * self.side.sign() as f64;
        let w = self.width as f64;
        let a = amplitude as f64;

        let raised = match settings.corner {
            MeanderCorner::Square => vec![start + n * a, start + d * w + n * a],
            MeanderCorner::Chamfer => {
                let c = ((self.width * settings.corner_radius_percentage / 200) as f64)
                    .min(a)
                    .min(w / 2.0);
                vec![
                    start + n * (a - c),
                    start + d * c + n * a,
                    start + d * (w - c) + n * a,
                    start + d * w + n * (a - c),
                ]
            }
        };

        let mut points = vec![self.start];
        points.extend(raised.into_iter().map(math::round_point));
        points.push(self.end());
        points.dedup();
        points
    }

    /// Length the meander adds to its piece at `amplitude`.
    pub fn extra_length(&self, amplitude: i64, settings: &MeanderSettings) -> i64 {
        if amplitude <= 0 {
            return 0;
        }

        LineChain::from_points(&self.points(amplitude, settings)).length()
            - math::distance(self.start, self.end())
    }

    /// Shapes of the meander's legs and top.
    fn raised_shapes(
        &self,
        amplitude: i64,
        track_width: i64,
        settings: &MeanderSettings,
    ) -> Vec<PrimitiveShape> {
        self.points(amplitude, settings)
            .into_iter()
            .tuple_windows()
            .map(|(from, to)| {
                PrimitiveShape::Seg(SegShape {
                    from,
                    to,
                    width: track_width,
                })
            })
            .collect()
    }
}

/// Where meanders can go on `chain`: evenly spaced slots on every segment
/// long enough, centred on it, alternating sides unless single-sided.
pub fn layout_meanders(
    chain: &LineChain,
    settings: &MeanderSettings,
    skip_first: bool,
    skip_last: bool,
) -> Vec<Meander> {
    let w = settings.spacing.max(1);
    let mut meanders = vec![];
    let piece_count = chain.len();

    for (i, piece) in chain.pieces().iter().enumerate() {
        if (skip_first && i == 0) || (skip_last && i + 1 == piece_count) {
            continue;
        }

        let ChainPiece::Seg { from, to } = *piece else {
            continue;
        };

        let Some(dir) = math::unit_vector(from, to) else {
            continue;
        };

        let length = math::distance(from, to);

        if length <= w {
            continue;
        }

        let count = (length - w) / (2 * w);
        let margin = (length - (2 * count - 1) * w) / 2;

        for k in 0..count {
            let offset = margin + 2 * w * k;
            let side = if settings.single_sided || meanders.len() % 2 == 0 {
                settings.initial_side
            } else {
                settings.initial_side.opposite()
            };

            meanders.push(Meander {
                piece: i,
                offset,
                start: math::round_point(math::to_f64(from) + dir * offset as f64),
                dir,
                width: w,
                side,
                max_amplitude: 0,
                amplitude: 0,
            });
        }
    }

    meanders
}

/// Finds, for every meander, the largest amplitude between the minimum and
/// maximum that clears the obstacles visible in `branch`, trying the other
/// side too when meanders are double-sided.
pub fn fit_meanders(
    meanders: &mut [Meander],
    branch: &Branch,
    rules: &impl AccessRules,
    track_width: i64,
    layer: i32,
    maybe_net: Option<usize>,
    settings: &MeanderSettings,
) {
    let step = settings.step.max(1);

    for meander in meanders.iter_mut() {
        let sides = if settings.single_sided {
            vec![meander.side]
        } else {
            vec![meander.side, meander.side.opposite()]
        };

        meander.max_amplitude = 0;

        'sides: for side in sides {
            let candidate = Meander { side, ..*meander };
            let mut amplitude = settings.max_amplitude;

            while amplitude >= settings.min_amplitude && amplitude > 0 {
                let clear = candidate
                    .raised_shapes(amplitude, track_width, settings)
                    .iter()
                    .all(|shape| {
                        branch
                            .first_collision(shape, LayerRange::single(layer), maybe_net, rules)
                            .is_none()
                    });

                if clear {
                    meander.side = side;
                    meander.max_amplitude = amplitude;
                    break 'sides;
                }

                amplitude -= step;
            }
        }
    }
}

/// Sets meander amplitudes so that together they add as close to `needed`
/// as possible: meanders are switched on in order at full amplitude until
/// they suffice, then shrunk to a common amplitude, and the last one is
/// fine-tuned.
pub fn distribute(meanders: &mut [Meander], needed: i64, settings: &MeanderSettings) {
    for meander in meanders.iter_mut() {
        meander.amplitude = 0;
    }

    if needed <= 0 {
        return;
    }

    let available: Vec<usize> = (0..meanders.len())
        .filter(|&i| meanders[i].max_amplitude > 0)
        .collect();

    let mut active = 0;
    let mut accumulated = 0;

    for &i in &available {
        if accumulated >= needed {
            break;
        }

        accumulated += meanders[i].extra_length(meanders[i].max_amplitude, settings);
        active += 1;
    }

    let active = &available[..active];

    let Some(&last) = active.last() else {
        return;
    };

    if accumulated <= needed {
        for &i in active {
            meanders[i].amplitude = meanders[i].max_amplitude;
        }
        return;
    }

    let total = |meanders: &[Meander], amplitude: i64| -> i64 {
        active
            .iter()
            .map(|&i| meanders[i].extra_length(amplitude.min(meanders[i].max_amplitude), settings))
            .sum()
    };

    let mut lo = settings.min_amplitude.max(1);
    let mut hi = settings.max_amplitude.max(lo);

    let common = if total(meanders, lo) >= needed {
        lo
    } else {
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;

            if total(meanders, mid) >= needed {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        hi
    };

    for &i in active {
        meanders[i].amplitude = common.min(meanders[i].max_amplitude);
    }

    let others: i64 = active
        .iter()
        .filter(|&&i| i != last)
        .map(|&i| meanders[i].extra_length(meanders[i].amplitude, settings))
        .sum();
    let wanted = needed - others;
    meanders[last].amplitude = fine_tune(&meanders[last], wanted, settings);
}

/// Amplitude of `meander`, flat or between the minimum and its current
/// amplitude, whose extra length is closest to `wanted`.
fn fine_tune(meander: &Meander, wanted: i64, settings: &MeanderSettings) -> i64 {
    let min = settings.min_amplitude.max(1);
    let max = meander.amplitude;

    let mut candidates = vec![0];

    if max >= min {
        let (mut lo, mut hi) = (min, max);

        while lo < hi {
            let mid = lo + (hi - lo) / 2;

            if meander.extra_length(mid, settings) >= wanted {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }

        candidates.push(lo);

        if lo > min {
            candidates.push(lo - 1);
        }
    }

    candidates
        .into_iter()
        .min_by_key(|&amplitude| ((meander.extra_length(amplitude, settings) - wanted).abs(), amplitude))
        .unwrap_or(0)
}

/// `chain` with the active meanders built into it.
pub fn build_chain(chain: &LineChain, meanders: &[Meander], settings: &MeanderSettings) -> LineChain {
    let mut built = LineChain::new();

    for (i, piece) in chain.pieces().iter().enumerate() {
        let on_piece: Vec<&Meander> = meanders
            .iter()
            .filter(|meander| meander.piece == i && meander.amplitude > 0)
            .collect();

        if on_piece.is_empty() {
            built.push(*piece);
            continue;
        }

        let mut points = vec![piece.from()];

        for meander in on_piece {
            points.extend(meander.points(meander.amplitude, settings));
        }

        points.push(piece.to());
        points.dedup();
        built.append(&LineChain::from_points(&points));
    }

    built.simplify();
    built
}
