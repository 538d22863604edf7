// Roster store: every team's slots and who occupies them.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::player::Player;

/// The twelve league teams in board order.
pub const DEFAULT_TEAM_NAMES: [&str; 12] = [
    "JRay🏆🏆🏆",
    "Gridiron Gurus",
    "Blitz Brigade",
    "End Zone Elite",
    "Hail Marys",
    "Pigskin Pirates",
    "Red Zone Rebels",
    "Touchdown Titans",
    "Sunday Scaries",
    "Fourth & Long",
    "Waiver Wire Warriors",
    "Bye Week Blues",
];

/// Roster slots for every team, starters first then bench.
pub const DEFAULT_SLOT_NAMES: &[&str] = &[
    "QB", "RB1", "RB2", "WR1", "WR2", "TE", "FLEX", "DST", "K", "Bench-1", "Bench-2",
    "Bench-3", "Bench-4", "Bench-5", "Bench-6",
];

/// The team/slot layout a roster store is built against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSchema {
    pub teams: Vec<String>,
    pub slots: Vec<String>,
}

impl RosterSchema {
    pub fn new<T, S>(teams: T, slots: S) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        RosterSchema {
            teams: teams.into_iter().map(Into::into).collect(),
            slots: slots.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for RosterSchema {
    fn default() -> Self {
        RosterSchema::new(DEFAULT_TEAM_NAMES, DEFAULT_SLOT_NAMES.iter().copied())
    }
}

/// A single named slot on a team's roster.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterSlot {
    pub name: String,
    /// The player occupying this slot, if any.
    pub player: Option<Player>,
}

/// One team's complete set of slots, in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamRoster {
    pub name: String,
    pub slots: Vec<RosterSlot>,
}

impl TeamRoster {
    fn empty(name: &str, slot_names: &[String]) -> Self {
        TeamRoster {
            name: name.to_string(),
            slots: slot_names
                .iter()
                .map(|s| RosterSlot {
                    name: s.clone(),
                    player: None,
                })
                .collect(),
        }
    }

    pub fn slot(&self, slot_name: &str) -> Option<&RosterSlot> {
        self.slots.iter().find(|s| s.name == slot_name)
    }

    fn slot_mut(&mut self, slot_name: &str) -> Option<&mut RosterSlot> {
        self.slots.iter_mut().find(|s| s.name == slot_name)
    }

    /// Players currently on this team, in slot order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.slots.iter().filter_map(|s| s.player.as_ref())
    }

    pub fn filled_count(&self) -> usize {
        self.slots.iter().filter(|s| s.player.is_some()).count()
    }
}

/// Mapping team -> slot -> occupant for the whole league.
///
/// Built against a `RosterSchema`, so every team carries every slot of the
/// schema. Serialized as a JSON object `{team: {slot: player | null}}` in
/// schema order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RosterStore {
    teams: Vec<TeamRoster>,
}

impl RosterStore {
    /// A store with every team of the schema present and every slot empty.
    pub fn build_empty(schema: &RosterSchema) -> Self {
        RosterStore {
            teams: schema
                .teams
                .iter()
                .map(|t| TeamRoster::empty(t, &schema.slots))
                .collect(),
        }
    }

    /// Carry assignments from a store built against an older schema onto a
    /// fresh store for `schema`.
    ///
    /// Teams are matched by `normalize_team_name`. Slots the new schema does
    /// not define are dropped; slots the old team lacked stay empty; old
    /// teams with no match are discarded. When several old teams map to the
    /// same new team, later ones overwrite earlier ones slot by slot.
    pub fn migrate(old: &RosterStore, schema: &RosterSchema) -> Self {
        let mut store = RosterStore::build_empty(schema);

        for old_team in &old.teams {
            let key = normalize_team_name(&old_team.name);
            let Some(target) = store
                .teams
                .iter_mut()
                .find(|t| normalize_team_name(&t.name) == key)
            else {
                tracing::debug!("dropping roster for unmatched team '{}'", old_team.name);
                continue;
            };

            for old_slot in &old_team.slots {
                if let Some(slot) = target.slot_mut(&old_slot.name) {
                    slot.player = old_slot.player.clone();
                }
            }
        }

        store
    }

    pub fn teams(&self) -> &[TeamRoster] {
        &self.teams
    }

    pub fn team(&self, team_name: &str) -> Option<&TeamRoster> {
        self.teams.iter().find(|t| t.name == team_name)
    }

    /// Whether `(team, slot)` exists in this store.
    pub fn has_slot(&self, team_name: &str, slot_name: &str) -> bool {
        self.team(team_name)
            .is_some_and(|t| t.slot(slot_name).is_some())
    }

    /// The player in `(team, slot)`, or `None` if empty or nonexistent.
    pub fn occupant(&self, team_name: &str, slot_name: &str) -> Option<&Player> {
        self.team(team_name)
            .and_then(|t| t.slot(slot_name))
            .and_then(|s| s.player.as_ref())
    }

    /// Write `player` into `(team, slot)` and return what was there.
    ///
    /// Returns `Err(player)` untouched when the slot does not exist, so the
    /// store never grows slots outside its schema.
    pub(crate) fn put(
        &mut self,
        team_name: &str,
        slot_name: &str,
        player: Option<Player>,
    ) -> Result<Option<Player>, Option<Player>> {
        let slot = self
            .teams
            .iter_mut()
            .find(|t| t.name == team_name)
            .and_then(|t| t.slot_mut(slot_name));
        match slot {
            Some(slot) => Ok(std::mem::replace(&mut slot.player, player)),
            None => Err(player),
        }
    }

    /// Every assigned player, team by team in slot order.
    pub fn assigned_players(&self) -> impl Iterator<Item = &Player> {
        self.teams.iter().flat_map(|t| t.players())
    }

    pub fn assigned_count(&self) -> usize {
        self.teams.iter().map(TeamRoster::filled_count).sum()
    }

    /// Locate a player by id: `(team, slot)`.
    pub fn locate(&self, player_id: &str) -> Option<(&str, &str)> {
        self.teams.iter().find_map(|t| {
            t.slots
                .iter()
                .find(|s| s.player.as_ref().is_some_and(|p| p.player_id == player_id))
                .map(|s| (t.name.as_str(), s.name.as_str()))
        })
    }

    pub fn contains_player(&self, player_id: &str) -> bool {
        self.locate(player_id).is_some()
    }

    /// Empty every slot after the first that holds an already-seen player.
    /// Returns the number of slots cleared.
    pub(crate) fn clear_duplicates(&mut self) -> usize {
        let mut seen = std::collections::HashSet::new();
        let mut cleared = 0;
        for slot in self.teams.iter_mut().flat_map(|t| t.slots.iter_mut()) {
            let duplicate = slot
                .player
                .as_ref()
                .is_some_and(|p| !seen.insert(p.player_id.clone()));
            if duplicate {
                slot.player = None;
                cleared += 1;
            }
        }
        cleared
    }
}

/// Normalize a team name for fuzzy matching across schema changes.
///
/// Keeps only alphanumeric characters, lowercased: case, whitespace,
/// punctuation and symbols (including emoji) are all ignored, so
/// `"J Ray"` and `"JRay🏆🏆🏆"` compare equal.
pub fn normalize_team_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

// ---------------------------------------------------------------------------
// Serde: ordered JSON objects
// ---------------------------------------------------------------------------

impl Serialize for TeamRoster {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.slots.len()))?;
        for slot in &self.slots {
            map.serialize_entry(&slot.name, &slot.player)?;
        }
        map.end()
    }
}

impl Serialize for RosterStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.teams.len()))?;
        for team in &self.teams {
            map.serialize_entry(&team.name, team)?;
        }
        map.end()
    }
}

/// Slot map of a single team, decoded in document order.
struct SlotList(Vec<RosterSlot>);

impl<'de> Deserialize<'de> for SlotList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SlotVisitor;

        impl<'de> Visitor<'de> for SlotVisitor {
            type Value = SlotList;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of slot name to player or null")
            }

            /// A slot whose occupant does not decode is kept as an empty slot.
            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<SlotList, A::Error> {
                let mut slots = Vec::new();
                while let Some((name, raw)) = access.next_entry::<String, serde_json::Value>()? {
                    let player = match raw {
                        serde_json::Value::Null => None,
                        raw => match serde_json::from_value::<Player>(raw) {
                            Ok(player) => Some(player),
                            Err(e) => {
                                tracing::debug!("emptying unreadable slot '{}': {}", name, e);
                                None
                            }
                        },
                    };
                    slots.push(RosterSlot { name, player });
                }
                Ok(SlotList(slots))
            }
        }

        deserializer.deserialize_map(SlotVisitor)
    }
}

impl<'de> Deserialize<'de> for RosterStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StoreVisitor;

        impl<'de> Visitor<'de> for StoreVisitor {
            type Value = RosterStore;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of team name to slot map")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RosterStore, A::Error> {
                let mut teams = Vec::new();
                while let Some((name, SlotList(slots))) = access.next_entry::<String, SlotList>()? {
                    teams.push(TeamRoster { name, slots });
                }
                Ok(RosterStore { teams })
            }
        }

        deserializer.deserialize_map(StoreVisitor)
    }
}
