// Persisted form of a draft state.
//
// A snapshot is the JSON blob `{ "players": [...], "teams": {...} }`.
// Restoring never trusts the stored metrics (players are re-scored) and
// carries the stored rosters onto the current league layout.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::draft::player::Player;
use crate::draft::roster::{RosterSchema, RosterStore};
use crate::draft::state::DraftState;
use crate::valuation::metrics::{score_players, MetricsPolicy};

/// Storage key the snapshot blob lives under.
pub const STORAGE_KEY: &str = "draft-board.snapshot";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("snapshot root must be a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// Borrowed view of a draft state, ready to serialize.
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub players: &'a [Player],
    pub teams: &'a RosterStore,
}

impl<'a> Snapshot<'a> {
    pub fn capture(state: &'a DraftState) -> Self {
        Snapshot {
            players: state.available(),
            teams: state.rosters(),
        }
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Serialize `state` to its snapshot text.
pub fn encode(state: &DraftState) -> Result<String, SnapshotError> {
    Snapshot::capture(state).to_json()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Rebuild a draft state from snapshot text.
///
/// Unparseable text is an error; the caller should drop the stored blob
/// and start fresh. Inside a well-formed object everything degrades
/// gracefully: a missing `players` list restores an empty pool, player
/// entries that do not decode are skipped, and a missing or malformed
/// `teams` map restores empty rosters.
pub fn restore(
    text: &str,
    schema: &RosterSchema,
    policy: &MetricsPolicy,
) -> Result<DraftState, SnapshotError> {
    let mut root = match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => map,
        other => return Err(SnapshotError::NotAnObject(kind_of(&other))),
    };

    let players = decode_players(root.remove("players"));
    let teams = match root.remove("teams") {
        Some(value) => match serde_json::from_value::<RosterStore>(value) {
            Ok(store) => RosterStore::migrate(&store, schema),
            Err(e) => {
                warn!("snapshot rosters unreadable, starting empty: {}", e);
                RosterStore::build_empty(schema)
            }
        },
        None => RosterStore::build_empty(schema),
    };

    let scored = score_players(&players, policy);
    let state = DraftState::new(scored, teams);
    info!(
        "restored snapshot: {} available, {} assigned",
        state.available().len(),
        state.rosters().assigned_count()
    );
    Ok(state)
}

fn decode_players(value: Option<Value>) -> Vec<Player> {
    let rows = match value {
        Some(Value::Array(rows)) => rows,
        Some(other) => {
            warn!("snapshot players is {}, expected an array", kind_of(&other));
            return Vec::new();
        }
        None => return Vec::new(),
    };

    rows.into_iter()
        .enumerate()
        .filter_map(|(i, row)| match serde_json::from_value::<Player>(row) {
            Ok(player) => Some(player),
            Err(e) => {
                debug!("skipping snapshot player {}: {}", i, e);
                None
            }
        })
        .collect()
}
