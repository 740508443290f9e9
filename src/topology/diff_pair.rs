use thiserror::Error;

use crate::{
    board::mesadata::AccessMesadata,
    geometry::primitive::AccessPrimitiveShape,
    item::{
        graph::{GetLayers, GetMaybeNet, ItemIndex, ItemWeight},
        line::Line,
    },
    math,
    node::{item_shape, Node},
    topology::{assemble_tuning_path, itemset::TuningPath},
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    #[error("{0:?} is not a segment or an arc")]
    NotALinePiece(ItemIndex),
    #[error("net '{0}' does not follow a differential pair naming convention")]
    NoComplementaryNet(String),
    #[error("complementary net '{0}' has no items")]
    EmptyComplementaryNet(String),
    #[error("no coupled line found on net '{0}'")]
    NoCoupledLine(String),
    #[error("net '{0}' has no segments")]
    NoSegments(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    pub fn opposite(self) -> Self {
        match self {
            Polarity::Positive => Polarity::Negative,
            Polarity::Negative => Polarity::Positive,
        }
    }
}

/// Result of matching a net name against the differential pair naming
/// conventions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DpSuffix {
    pub polarity: Polarity,
    pub base_name: String,
    pub complement: String,
}

/// Matches `_P`/`_N`, `P`/`N` and `+`/`-` suffixes, optionally followed by
/// digits and underscores, so that `LVDS_P3` pairs with `LVDS_N3`.
pub fn match_dp_suffix(netname: &str) -> Option<DpSuffix> {
    for (i, ch) in netname.char_indices().rev() {
        let (polarity, opposite) = match ch {
            '0'..='9' | '_' => continue,
            '+' => (Polarity::Positive, '-'),
            '-' => (Polarity::Negative, '+'),
            'P' => (Polarity::Positive, 'N'),
            'N' => (Polarity::Negative, 'P'),
            _ => return None,
        };

        let base_name = &netname[..i];
        let trailing = &netname[i + ch.len_utf8()..];

        return Some(DpSuffix {
            polarity,
            base_name: base_name.to_string(),
            complement: format!("{}{}{}", base_name, opposite, trailing),
        });
    }

    None
}

/// The two lines of a differential pair with their tuning paths, the
/// positive side first.
#[derive(Debug, Clone)]
pub struct DiffPair {
    pub p_net: usize,
    pub n_net: usize,
    pub p_line: Line,
    pub n_line: Line,
    pub p_path: TuningPath,
    pub n_path: TuningPath,
    /// Polarity of the side the pair was assembled from.
    pub seed_polarity: Polarity,
    /// Edge-to-edge distance between the coupled segments.
    pub gap: i64,
}

impl DiffPair {
    pub fn line(&self, polarity: Polarity) -> &Line {
        match polarity {
            Polarity::Positive => &self.p_line,
            Polarity::Negative => &self.n_line,
        }
    }

    pub fn path(&self, polarity: Polarity) -> &TuningPath {
        match polarity {
            Polarity::Positive => &self.p_path,
            Polarity::Negative => &self.n_path,
        }
    }

    pub fn net(&self, polarity: Polarity) -> usize {
        match polarity {
            Polarity::Positive => self.p_net,
            Polarity::Negative => self.n_net,
        }
    }
}

// Directions within this many radians of each other count as parallel.
const PARALLEL_THRESHOLD: f64 = 0.01;

/// Assembles the differential pair `seed` belongs to.
pub fn assemble_diff_pair(
    node: &Node,
    mesadata: &impl AccessMesadata,
    seed: ItemIndex,
) -> Result<DiffPair, TopologyError> {
    let seed_weight = node.item_weight(seed);

    if !seed_weight.is_line_piece() {
        return Err(TopologyError::NotALinePiece(seed));
    }

    let seed_net = seed_weight
        .maybe_net()
        .ok_or_else(|| TopologyError::NoComplementaryNet(String::new()))?;
    let netname = mesadata
        .net_netname(seed_net)
        .ok_or_else(|| TopologyError::NoComplementaryNet(format!("#{}", seed_net)))?;
    let suffix = match_dp_suffix(netname)
        .ok_or_else(|| TopologyError::NoComplementaryNet(netname.to_string()))?;
    let coupled_net = mesadata
        .netname_net(&suffix.complement)
        .ok_or_else(|| TopologyError::NoComplementaryNet(netname.to_string()))?;

    let coupled_items = node
        .index()
        .items_for_net(coupled_net)
        .filter(|items| !items.is_empty())
        .ok_or_else(|| TopologyError::EmptyComplementaryNet(suffix.complement.clone()))?;

    let coupled = find_coupled_piece(node, &seed_weight, coupled_items)
        .ok_or_else(|| TopologyError::NoCoupledLine(suffix.complement.clone()))?;

    let seed_line = node
        .assemble_line(seed)
        .ok_or(TopologyError::NotALinePiece(seed))?;
    let coupled_line = node
        .assemble_line(coupled)
        .ok_or(TopologyError::NotALinePiece(coupled))?;

    let seed_path = assemble_tuning_path(node, seed);
    let coupled_path = assemble_tuning_path(node, coupled);

    if seed_path.items.line_piece_count() == 0 {
        return Err(TopologyError::NoSegments(netname.to_string()));
    }

    if coupled_path.items.line_piece_count() == 0 {
        return Err(TopologyError::NoSegments(suffix.complement.clone()));
    }

    let gap = item_shape(&seed_weight)
        .distance(&item_shape(&node.item_weight(coupled)))
        .round() as i64;

    let pair = match suffix.polarity {
        Polarity::Positive => DiffPair {
            p_net: seed_net,
            n_net: coupled_net,
            p_line: seed_line,
            n_line: coupled_line,
            p_path: seed_path,
            n_path: coupled_path,
            seed_polarity: Polarity::Positive,
            gap,
        },
        Polarity::Negative => DiffPair {
            p_net: coupled_net,
            n_net: seed_net,
            p_line: coupled_line,
            n_line: seed_line,
            p_path: coupled_path,
            n_path: seed_path,
            seed_polarity: Polarity::Negative,
            gap,
        },
    };

    Ok(pair)
}

/// Nearest segment or arc among `candidates` that runs alongside `seed` on
/// the same layer. A segment seed only couples with parallel segments
/// whose projections overlap it.
fn find_coupled_piece(
    node: &Node,
    seed: &ItemWeight,
    candidates: &[ItemIndex],
) -> Option<ItemIndex> {
    let seed_shape = item_shape(seed);
    let layers = seed.layers();

    candidates
        .iter()
        .copied()
        .filter(|candidate| candidate.is_line_piece())
        .filter_map(|candidate| {
            let weight = node.item_weight(candidate);

            if !weight.layers().overlaps(&layers) {
                return None;
            }

            if let (ItemWeight::Seg(a), ItemWeight::Seg(b)) = (seed, &weight) {
                let (Some(va), Some(vb)) = (
                    math::unit_vector(a.from, a.to),
                    math::unit_vector(b.from, b.to),
                ) else {
                    return None;
                };

                if !math::approx_parallel(va, vb, PARALLEL_THRESHOLD)
                    || !math::projections_overlap(a.from, a.to, b.from, b.to)
                {
                    return None;
                }
            }

            Some((seed_shape.distance(&item_shape(&weight)), candidate))
        })
        .min_by(|(d1, c1), (d2, c2)| d1.total_cmp(d2).then(c1.cmp(c2)))
        .map(|(_, candidate)| candidate)
}
