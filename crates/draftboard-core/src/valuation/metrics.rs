// Replacement value, tier cliffs, and the composite draft score.
//
// Pipeline:
// 1. Group players by position (trimmed, uppercased) and sort each group by
//    points.
// 2. Replacement points per group = points of the player at the position's
//    replacement rank.
// 3. vorp = points - replacement points; cliff = points - next player's points.
// 4. Min-max normalize adp (inverted), points, vorp, cliff across the pool.
// 5. compositeScore = weighted sum of the four normalized metrics.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::draft::player::Player;

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Per-position replacement ranks (1-based) used when the policy does not
/// override them.
pub const DEFAULT_REPLACEMENT_RANKS: &[(&str, usize)] = &[
    ("QB", 12),
    ("RB", 24),
    ("WR", 30),
    ("TE", 12),
    ("K", 12),
    ("DST", 12),
    ("IDP", 12),
];

/// Replacement rank for positions missing from the table.
pub const DEFAULT_REPLACEMENT_RANK: usize = 12;

/// Weights of the normalized metrics in the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeWeights {
    pub adp: f64,
    pub points: f64,
    pub vorp: f64,
    pub cliff: f64,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        CompositeWeights {
            adp: 0.45,
            points: 0.15,
            vorp: 0.20,
            cliff: 0.10,
        }
    }
}

impl CompositeWeights {
    pub fn total(&self) -> f64 {
        self.adp + self.points + self.vorp + self.cliff
    }
}

/// Replacement points for a position group smaller than its replacement
/// rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementFallback {
    /// No replacement-level player exists, so the baseline is 0 and vorp
    /// equals raw points.
    #[default]
    Zero,
    /// Use the worst player in the group as the baseline.
    LastInGroup,
}

/// Everything the metrics engine needs besides the players themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsPolicy {
    pub weights: CompositeWeights,
    /// Uppercased position code -> 1-based replacement rank.
    pub replacement_ranks: BTreeMap<String, usize>,
    pub default_replacement_rank: usize,
    pub fallback: ReplacementFallback,
}

impl Default for MetricsPolicy {
    fn default() -> Self {
        MetricsPolicy {
            weights: CompositeWeights::default(),
            replacement_ranks: DEFAULT_REPLACEMENT_RANKS
                .iter()
                .map(|&(pos, rank)| (pos.to_string(), rank))
                .collect(),
            default_replacement_rank: DEFAULT_REPLACEMENT_RANK,
            fallback: ReplacementFallback::default(),
        }
    }
}

impl MetricsPolicy {
    /// Replacement rank for an uppercased position code.
    pub fn replacement_rank(&self, position: &str) -> usize {
        self.replacement_ranks
            .get(position)
            .copied()
            .unwrap_or(self.default_replacement_rank)
    }

    /// Baseline points for a group sorted descending by points.
    fn replacement_points(&self, position: &str, group: &[&Player]) -> f64 {
        let idx = self.replacement_rank(position).saturating_sub(1);
        match group.get(idx) {
            Some(p) => points_or_zero(p),
            None => match self.fallback {
                ReplacementFallback::Zero => 0.0,
                ReplacementFallback::LastInGroup => group.last().map_or(0.0, |p| points_or_zero(p)),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Normalization helpers
// ---------------------------------------------------------------------------

/// Observed min and max of one metric across the pool.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Range {
    min: f64,
    max: f64,
}

impl Range {
    /// Range over the finite values; `None` when there are none.
    fn of(values: impl Iterator<Item = Option<f64>>) -> Option<Range> {
        values
            .flatten()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<Range>, v| match acc {
                None => Some(Range { min: v, max: v }),
                Some(r) => Some(Range {
                    min: r.min.min(v),
                    max: r.max.max(v),
                }),
            })
    }

    /// Min-max scale `value` into [0, 1]. Missing values and degenerate
    /// ranges scale to 0.
    fn scale(range: Option<Range>, value: Option<f64>, invert: bool) -> f64 {
        let (Some(r), Some(v)) = (range, value) else {
            return 0.0;
        };
        if !v.is_finite() || r.max == r.min {
            return 0.0;
        }
        let t = (v - r.min) / (r.max - r.min);
        if invert {
            1.0 - t
        } else {
            t
        }
    }
}

fn points_or_zero(p: &Player) -> f64 {
    p.points.unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Pipeline entry point
// ---------------------------------------------------------------------------

/// Attach `vorp`, `cliff` and `composite_score` to every player.
///
/// Pure: the output has the same players in the same order, and identical
/// input always produces identical scores.
pub fn score_players(players: &[Player], policy: &MetricsPolicy) -> Vec<Player> {
    if players.is_empty() {
        return Vec::new();
    }

    // Group indices by position, best first. The sort is stable so equal
    // point totals keep feed order.
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, p) in players.iter().enumerate() {
        groups.entry(p.position_key()).or_default().push(i);
    }

    let mut vorp = vec![0.0; players.len()];
    let mut cliff = vec![0.0; players.len()];

    for (position, indices) in &mut groups {
        indices.sort_by(|&a, &b| {
            points_or_zero(&players[b]).total_cmp(&points_or_zero(&players[a]))
        });
        let group: Vec<&Player> = indices.iter().map(|&i| &players[i]).collect();
        let replacement = policy.replacement_points(position, &group);

        for (rank_in_group, &i) in indices.iter().enumerate() {
            let player = &players[i];
            let own = points_or_zero(player);
            let next = group
                .get(rank_in_group + 1)
                .and_then(|n| n.points)
                .or(player.points)
                .unwrap_or(0.0);
            cliff[i] = own - next;
            vorp[i] = own - replacement;
        }
    }

    let adp_range = Range::of(players.iter().map(|p| p.adp));
    let points_range = Range::of(players.iter().map(|p| p.points));
    let vorp_range = Range::of(vorp.iter().map(|&v| Some(v)));
    let cliff_range = Range::of(cliff.iter().map(|&v| Some(v)));
    let w = policy.weights;

    players
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let adp_norm = Range::scale(adp_range, p.adp, true);
            let points_norm = Range::scale(points_range, p.points, false);
            let vorp_norm = Range::scale(vorp_range, Some(vorp[i]), false);
            let cliff_norm = Range::scale(cliff_range, Some(cliff[i]), false);

            Player {
                vorp: vorp[i],
                cliff: cliff[i],
                composite_score: adp_norm * w.adp
                    + points_norm * w.points
                    + vorp_norm * w.vorp
                    + cliff_norm * w.cliff,
                ..p.clone()
            }
        })
        .collect()
}
