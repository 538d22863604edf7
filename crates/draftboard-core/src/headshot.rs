// Player headshot lookup.
//
// Two provider listings feed the index: a headshot listing (id, name, team,
// image url) and a general player listing whose rows may carry a photo url.
// Resolution order for a player: headshot by id, photo by id, headshot by
// name and team, then a CDN url derived from the id.

use std::collections::HashMap;

use serde_json::Value;

use crate::draft::player::Player;

/// CDN pattern used when no listing knows the player.
pub const CDN_URL_PREFIX: &str = "https://cdn.sportsdata.io/headshots/nfl/low/";

/// Headshot row keys that may hold an image url, highest priority first.
pub const URL_ALIASES: &[&str] = &[
    "Url",
    "UrlHiRes",
    "HighResImageUrl",
    "ImageUrl",
    "PhotoUrl",
    "HeadshotUrl",
];

/// Lookup tables built from provider listings.
#[derive(Debug, Clone, Default)]
pub struct HeadshotIndex {
    by_id: HashMap<String, String>,
    photo_by_id: HashMap<String, String>,
    by_name_team: HashMap<String, String>,
}

fn name_team_key(name: &str, team: &str) -> String {
    format!("{}|{}", name.trim().to_lowercase(), team.trim().to_lowercase())
}

/// Non-empty string value, or a number rendered as text.
fn text(row: &Value, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn pick_url(row: &Value) -> Option<String> {
    URL_ALIASES.iter().find_map(|key| text(row, key))
}

impl HeadshotIndex {
    /// Build the index from the two provider listings. Either may be any
    /// JSON value; non-array listings and rows without a url contribute
    /// nothing.
    pub fn build(headshots: &Value, players: &Value) -> Self {
        let mut index = HeadshotIndex::default();

        for row in headshots.as_array().into_iter().flatten() {
            let Some(url) = pick_url(row) else {
                continue;
            };
            if let Some(pid) = text(row, "PlayerID") {
                index.by_id.insert(pid, url.clone());
            }
            let name = text(row, "Name").unwrap_or_default();
            let team = text(row, "Team").unwrap_or_default();
            index.by_name_team.insert(name_team_key(&name, &team), url);
        }

        for row in players.as_array().into_iter().flatten() {
            if let (Some(pid), Some(photo)) = (text(row, "PlayerID"), text(row, "PhotoUrl")) {
                index.photo_by_id.insert(pid, photo);
            }
        }

        index
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty() && self.photo_by_id.is_empty() && self.by_name_team.is_empty()
    }

    /// Resolve an image url for `player`. `None` only when the player has
    /// no id and no name/team match.
    pub fn resolve(&self, player: &Player) -> Option<String> {
        let pid = (!player.player_id.is_empty()).then_some(player.player_id.as_str());

        pid.and_then(|id| self.by_id.get(id))
            .or_else(|| pid.and_then(|id| self.photo_by_id.get(id)))
            .or_else(|| self.by_name_team.get(&name_team_key(&player.name, &player.team)))
            .cloned()
            .or_else(|| pid.map(cdn_url))
    }
}

/// CDN headshot url for a provider player id.
pub fn cdn_url(player_id: &str) -> String {
    format!("{CDN_URL_PREFIX}{player_id}.png")
}
