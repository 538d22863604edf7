// Draft suggestions: best composite scores overall, and a need-weighted
// prediction of the next pick for a given team.

use std::collections::HashMap;

use crate::draft::player::{Player, PositionFamily};
use crate::draft::roster::TeamRoster;

/// Number of suggestions the board shows by default.
pub const DEFAULT_SUGGESTION_COUNT: usize = 5;

/// Name of the slot any RB, WR or TE can fill.
pub const FLEX_SLOT: &str = "FLEX";

/// Starters a team is expected to fill, by position family.
pub const STARTER_NEEDS: &[(PositionFamily, usize)] = &[
    (PositionFamily::QB, 1),
    (PositionFamily::RB, 2),
    (PositionFamily::WR, 2),
    (PositionFamily::TE, 1),
    (PositionFamily::DST, 1),
    (PositionFamily::K, 1),
];

/// Open FLEX spots a team is expected to fill.
pub const FLEX_NEEDS: usize = 1;

/// Weight applied to a player whose position the team has already filled.
const FILLED_WEIGHT: f64 = 0.5;

/// The `n` players with the highest composite score, best first. Ties keep
/// input order.
pub fn top_suggestions(players: &[Player], n: usize) -> Vec<&Player> {
    let mut sorted: Vec<&Player> = players.iter().collect();
    sorted.sort_by(|a, b| b.composite_score.total_cmp(&a.composite_score));
    sorted.truncate(n);
    sorted
}

/// How many starters a team has, per family, plus its filled FLEX spots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilledCounts {
    pub by_family: HashMap<PositionFamily, usize>,
    pub flex: usize,
}

impl FilledCounts {
    /// Count a team's occupied slots. A player in the FLEX slot counts
    /// toward FLEX only; every other occupant counts toward its family.
    pub fn of(team: &TeamRoster) -> Self {
        let mut counts = FilledCounts::default();
        for slot in &team.slots {
            let Some(player) = &slot.player else {
                continue;
            };
            if slot.name == FLEX_SLOT {
                counts.flex += 1;
            } else if let Some(family) = player.family() {
                *counts.by_family.entry(family).or_default() += 1;
            }
        }
        counts
    }

    fn filled(&self, family: PositionFamily) -> usize {
        self.by_family.get(&family).copied().unwrap_or(0)
    }

    /// Whether a player of `family` would fill a starter need: an unfilled
    /// starter at that family, or an open FLEX for RB/WR/TE.
    pub fn needs(&self, family: PositionFamily) -> bool {
        let unfilled = STARTER_NEEDS
            .iter()
            .any(|&(f, need)| f == family && self.filled(family) < need);
        let flex_open = family.is_flex_eligible() && self.flex < FLEX_NEEDS;
        unfilled || flex_open
    }
}

/// Need weight for `player` given a team's filled counts: 1.0 if the
/// player fills a need, 0.5 otherwise.
pub fn need_weight(player: &Player, counts: &FilledCounts) -> f64 {
    match player.family() {
        Some(family) if counts.needs(family) => 1.0,
        _ => FILLED_WEIGHT,
    }
}

/// The available player `team` is most likely to take next, scored as
/// composite score times need weight. Returns `None` for an empty pool.
///
/// An unknown team is treated as having an empty roster.
pub fn predict_next_pick<'a>(available: &'a [Player], team: Option<&TeamRoster>) -> Option<&'a Player> {
    let counts = team.map(FilledCounts::of).unwrap_or_default();

    let mut best: Option<(&Player, f64)> = None;
    for player in available {
        let score = player.composite_score * need_weight(player, &counts);
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((player, score));
        }
    }
    best.map(|(player, _)| player)
}
