// Ranked-player feed normalization.
//
// Providers disagree on field names (`playerId` vs `PlayerID`, `points` vs
// `FantasyPointsPPR`, ...). Each canonical field has an ordered alias list;
// the first alias holding a usable value wins.

use serde_json::{Map, Value};
use tracing::debug;

use crate::draft::player::Player;

/// One raw feed row, schema unknown.
pub type RawRecord = Map<String, Value>;

/// Canonical player fields that are resolved from raw records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalField {
    PlayerId,
    Name,
    Team,
    Position,
    Points,
    Rank,
    Adp,
}

/// Alias resolution rule for one canonical field. Aliases are tried in
/// order, highest priority first.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: CanonicalField,
    pub aliases: &'static [&'static str],
}

/// Every field the normalizer resolves, with its alias priority list.
pub const FIELD_RULES: &[FieldRule] = &[
    FieldRule {
        field: CanonicalField::PlayerId,
        aliases: &["playerId", "PlayerID", "player_id"],
    },
    FieldRule {
        field: CanonicalField::Name,
        aliases: &["name", "Name_stats", "Name"],
    },
    FieldRule {
        field: CanonicalField::Team,
        aliases: &["team", "Team_stats", "Team"],
    },
    FieldRule {
        field: CanonicalField::Position,
        aliases: &["position", "Position_stats", "Position"],
    },
    FieldRule {
        field: CanonicalField::Points,
        aliases: &["points", "FantasyPointsPPR", "FantasyPoints"],
    },
    FieldRule {
        field: CanonicalField::Rank,
        aliases: &["rank"],
    },
    FieldRule {
        field: CanonicalField::Adp,
        aliases: &["adp", "AverageDraftPositionPPR", "AverageDraftPosition", "ADP"],
    },
];

impl CanonicalField {
    pub fn aliases(self) -> &'static [&'static str] {
        FIELD_RULES
            .iter()
            .find(|rule| rule.field == self)
            .map(|rule| rule.aliases)
            .unwrap_or(&[])
    }
}

/// Values present under the field's aliases, in priority order. Nulls count
/// as absent.
fn candidates<'a>(raw: &'a RawRecord, field: CanonicalField) -> impl Iterator<Item = &'a Value> {
    field
        .aliases()
        .iter()
        .filter_map(move |key| raw.get(*key))
        .filter(|v| !v.is_null())
}

/// First present value rendered as text. Strings are used as is, numbers
/// and booleans are stringified, arrays and objects are skipped.
fn resolve_text(raw: &RawRecord, field: CanonicalField) -> Option<String> {
    candidates(raw, field).find_map(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// First value that reads as a finite number, including numeric strings.
fn resolve_number(raw: &RawRecord, field: CanonicalField) -> Option<f64> {
    candidates(raw, field).find_map(as_finite)
}

fn as_finite(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// A positive whole-number rank, if the record carries one.
fn resolve_rank(raw: &RawRecord) -> Option<u32> {
    candidates(raw, CanonicalField::Rank).find_map(|v| {
        let n = v.as_f64()?;
        (n >= 1.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX)).then_some(n as u32)
    })
}

/// Map one raw record to a canonical `Player`.
///
/// `source_index` is the record's zero-based position in the feed; it
/// supplies the rank when the record has none. Never fails: missing fields
/// fall back to defaults, and a record without any id gets a random one.
pub fn normalize_player(raw: &RawRecord, source_index: usize) -> Player {
    let player_id = resolve_text(raw, CanonicalField::PlayerId)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let fallback_rank = u32::try_from(source_index + 1).unwrap_or(u32::MAX);

    Player {
        player_id,
        name: resolve_text(raw, CanonicalField::Name).unwrap_or_else(|| "Unknown".to_string()),
        team: resolve_text(raw, CanonicalField::Team).unwrap_or_default(),
        position: resolve_text(raw, CanonicalField::Position).unwrap_or_default(),
        points: resolve_number(raw, CanonicalField::Points),
        rank: Some(resolve_rank(raw).unwrap_or(fallback_rank)),
        adp: resolve_number(raw, CanonicalField::Adp),
        vorp: 0.0,
        cliff: 0.0,
        composite_score: 0.0,
    }
}

/// Normalize an entire feed payload.
///
/// Anything other than a JSON array yields an empty pool. Array entries
/// that are not objects are skipped but still consume their index, so the
/// fallback ranks of later rows match their feed position.
pub fn normalize_feed(payload: &Value) -> Vec<Player> {
    let Some(rows) = payload.as_array() else {
        debug!("feed payload is not an array; treating as empty");
        return Vec::new();
    };

    rows.iter()
        .enumerate()
        .filter_map(|(i, row)| match row.as_object() {
            Some(raw) => Some(normalize_player(raw, i)),
            None => {
                debug!("skipping non-object feed row at index {}", i);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> RawRecord {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn canonical_fields_pass_through() {
        let raw = record(json!({
            "playerId": "19790",
            "name": "Bijan Robinson",
            "team": "ATL",
            "position": "RB",
            "points": 301.5,
            "rank": 2,
            "adp": 1.8
        }));
        let p = normalize_player(&raw, 10);
        assert_eq!(p.player_id, "19790");
        assert_eq!(p.name, "Bijan Robinson");
        assert_eq!(p.team, "ATL");
        assert_eq!(p.position, "RB");
        assert_eq!(p.points, Some(301.5));
        assert_eq!(p.rank, Some(2));
        assert_eq!(p.adp, Some(1.8));
    }

    #[test]
    fn legacy_aliases_resolve() {
        let raw = record(json!({
            "PlayerID": 18877,
            "Name_stats": "CeeDee Lamb",
            "Team_stats": "DAL",
            "Position_stats": "WR",
            "FantasyPointsPPR": "288.4",
            "AverageDraftPositionPPR": 4.2
        }));
        let p = normalize_player(&raw, 0);
        assert_eq!(p.player_id, "18877");
        assert_eq!(p.name, "CeeDee Lamb");
        assert_eq!(p.team, "DAL");
        assert_eq!(p.position, "WR");
        assert_eq!(p.points, Some(288.4));
        assert_eq!(p.adp, Some(4.2));
    }

    #[test]
    fn higher_priority_alias_wins() {
        let raw = record(json!({ "name": "Short", "Name": "Long Name", "Name_stats": "Stats" }));
        assert_eq!(normalize_player(&raw, 0).name, "Short");
    }

    #[test]
    fn null_alias_falls_through() {
        let raw = record(json!({ "playerId": null, "player_id": "abc", "adp": null, "ADP": 12.0 }));
        let p = normalize_player(&raw, 0);
        assert_eq!(p.player_id, "abc");
        assert_eq!(p.adp, Some(12.0));
    }

    #[test]
    fn defaults_for_missing_fields() {
        let p = normalize_player(&RawRecord::new(), 4);
        assert_eq!(p.name, "Unknown");
        assert_eq!(p.team, "");
        assert_eq!(p.position, "");
        assert!(p.points.is_none());
        assert!(p.adp.is_none());
        assert_eq!(p.rank, Some(5));
        assert!(!p.player_id.is_empty());
    }

    #[test]
    fn generated_ids_differ() {
        let a = normalize_player(&RawRecord::new(), 0);
        let b = normalize_player(&RawRecord::new(), 0);
        assert_ne!(a.player_id, b.player_id);
    }

    #[test]
    fn non_numeric_points_skip_to_next_alias() {
        let raw = record(json!({ "points": "n/a", "FantasyPoints": 150 }));
        assert_eq!(normalize_player(&raw, 0).points, Some(150.0));

        let raw = record(json!({ "points": "n/a" }));
        assert_eq!(normalize_player(&raw, 0).points, None);
    }

    #[test]
    fn invalid_rank_uses_source_index() {
        for bad in [json!(0), json!(-3), json!(2.5), json!("7")] {
            let raw = record(json!({ "rank": bad }));
            assert_eq!(normalize_player(&raw, 8).rank, Some(9));
        }
    }

    #[test]
    fn feed_must_be_array() {
        assert!(normalize_feed(&json!({"players": []})).is_empty());
        assert!(normalize_feed(&json!("oops")).is_empty());
    }

    #[test]
    fn feed_rows_keep_their_index() {
        let payload = json!([{ "playerId": "a" }, 42, { "playerId": "c" }]);
        let players = normalize_feed(&payload);
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].rank, Some(1));
        assert_eq!(players[1].player_id, "c");
        assert_eq!(players[1].rank, Some(3));
    }

    #[test]
    fn every_field_has_aliases() {
        for rule in FIELD_RULES {
            assert!(!rule.aliases.is_empty());
            assert_eq!(rule.field.aliases(), rule.aliases);
        }
    }
}
