// Canonical player record and position classification.

use serde::{Deserialize, Serialize};

/// A player in the draft pool, after normalization and scoring.
///
/// `player_id` is the identity: it is unique across the available pool and
/// every roster slot. The derived metrics (`vorp`, `cliff`,
/// `composite_score`) are filled in by the metrics engine and default to 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub player_id: String,
    #[serde(default = "unknown_name")]
    pub name: String,
    /// NFL team abbreviation. Empty if the feed did not provide one.
    #[serde(default)]
    pub team: String,
    /// Free-text position code as supplied by the feed (e.g. "RB", "DEF").
    #[serde(default)]
    pub position: String,
    /// Projected fantasy points for the season.
    #[serde(default)]
    pub points: Option<f64>,
    /// Pool rank, 1-based. Players without a rank sort last.
    #[serde(default)]
    pub rank: Option<u32>,
    /// Average draft position from the external data provider.
    #[serde(default)]
    pub adp: Option<f64>,
    #[serde(default)]
    pub vorp: f64,
    #[serde(default)]
    pub cliff: f64,
    #[serde(default)]
    pub composite_score: f64,
}

fn unknown_name() -> String {
    "Unknown".to_string()
}

impl Player {
    /// Create an unscored player with the given identity and position.
    pub fn new(player_id: impl Into<String>, name: impl Into<String>, position: impl Into<String>) -> Self {
        Player {
            player_id: player_id.into(),
            name: name.into(),
            team: String::new(),
            position: position.into(),
            points: None,
            rank: None,
            adp: None,
            vorp: 0.0,
            cliff: 0.0,
            composite_score: 0.0,
        }
    }

    /// Sort key for the available pool: ascending rank, missing ranks last.
    pub fn rank_key(&self) -> u64 {
        self.rank.map_or(u64::MAX, u64::from)
    }

    /// Position code used for metric grouping (uppercased, trimmed).
    pub fn position_key(&self) -> String {
        self.position.trim().to_uppercase()
    }

    pub fn family(&self) -> Option<PositionFamily> {
        PositionFamily::classify(&self.position)
    }
}

/// Broad position family for a free-text position code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PositionFamily {
    QB,
    RB,
    WR,
    TE,
    K,
    DST,
    IDP,
}

/// Individual defensive player codes that collapse into `PositionFamily::IDP`.
const IDP_CODES: &[&str] = &[
    "idp", "lb", "ilb", "olb", "edge", "de", "dt", "dl", "cb", "s", "ss", "fs", "db",
];

const DST_CODES: &[&str] = &["dst", "def", "defense", "d"];

impl PositionFamily {
    /// Classify a position code from any of the providers' spellings.
    ///
    /// Separators (`/`, `.`, `-`, whitespace) are ignored and matching is
    /// case-insensitive, so "RB/WR" counts as a running back and "D/ST" as a
    /// team defense. Returns `None` for codes that fit no family.
    pub fn classify(raw: &str) -> Option<Self> {
        let code: String = raw
            .chars()
            .filter(|c| !matches!(c, '/' | '.' | '-') && !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();

        if code.starts_with("rb") {
            return Some(PositionFamily::RB);
        }
        if code.starts_with("wr") {
            return Some(PositionFamily::WR);
        }
        match code.as_str() {
            "qb" => Some(PositionFamily::QB),
            "te" => Some(PositionFamily::TE),
            "k" | "pk" => Some(PositionFamily::K),
            c if DST_CODES.contains(&c) => Some(PositionFamily::DST),
            c if IDP_CODES.contains(&c) => Some(PositionFamily::IDP),
            _ => None,
        }
    }

    /// Whether a player of this family can fill a FLEX slot.
    pub fn is_flex_eligible(self) -> bool {
        matches!(self, PositionFamily::RB | PositionFamily::WR | PositionFamily::TE)
    }

    pub fn label(self) -> &'static str {
        match self {
            PositionFamily::QB => "QB",
            PositionFamily::RB => "RB",
            PositionFamily::WR => "WR",
            PositionFamily::TE => "TE",
            PositionFamily::K => "K",
            PositionFamily::DST => "DST",
            PositionFamily::IDP => "IDP",
        }
    }
}
