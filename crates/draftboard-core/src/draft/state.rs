// Draft state: the available pool plus the roster store, and the pure
// transitions between states.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::player::Player;
use super::roster::{RosterSchema, RosterStore};

/// The unit of undo/redo: who is still available and who sits where.
///
/// A `DraftState` is a value. Every transition returns a new state and
/// leaves `self` untouched. A player id appears either in the available
/// pool or in exactly one roster slot, never both.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DraftState {
    available: Vec<Player>,
    rosters: RosterStore,
}

impl DraftState {
    /// Assemble a state from a pool and a roster store.
    ///
    /// The pool is sorted by rank. Players that already sit in a slot are
    /// removed from the pool, and a player found in more than one slot keeps
    /// only the first one, so the result always satisfies the
    /// one-place-per-player invariant.
    pub fn new(mut available: Vec<Player>, mut rosters: RosterStore) -> Self {
        let cleared = rosters.clear_duplicates();
        if cleared > 0 {
            warn!("cleared {} roster slots holding duplicate players", cleared);
        }

        let assigned: HashSet<&str> = rosters
            .assigned_players()
            .map(|p| p.player_id.as_str())
            .collect();
        let mut seen = HashSet::new();
        let before = available.len();
        available.retain(|p| {
            !assigned.contains(p.player_id.as_str()) && seen.insert(p.player_id.clone())
        });
        if available.len() != before {
            debug!(
                "dropped {} pool entries already assigned or duplicated",
                before - available.len()
            );
        }

        sort_by_rank(&mut available);
        DraftState { available, rosters }
    }

    /// A fresh board: the whole pool available, every slot empty.
    pub fn fresh(available: Vec<Player>, schema: &RosterSchema) -> Self {
        DraftState::new(available, RosterStore::build_empty(schema))
    }

    /// Players not yet assigned, ascending by rank (missing ranks last).
    pub fn available(&self) -> &[Player] {
        &self.available
    }

    pub fn rosters(&self) -> &RosterStore {
        &self.rosters
    }

    pub fn available_player(&self, player_id: &str) -> Option<&Player> {
        self.available.iter().find(|p| p.player_id == player_id)
    }

    /// The pick currently on the clock, 1-based: one past the number of
    /// filled slots.
    pub fn pick_number(&self) -> usize {
        self.rosters.assigned_count() + 1
    }

    /// Every player id on the board, pool first, then rosters.
    pub fn player_ids(&self) -> Vec<&str> {
        self.available
            .iter()
            .chain(self.rosters.assigned_players())
            .map(|p| p.player_id.as_str())
            .collect()
    }

    /// Move an available player into `(team, slot)`.
    ///
    /// Whoever occupied the slot goes back into the pool at their rank
    /// position. Returns an unchanged copy when the player is not in the pool
    /// or the slot does not exist.
    pub fn assign(&self, player_id: &str, team_name: &str, slot_name: &str) -> DraftState {
        let Some(idx) = self.available.iter().position(|p| p.player_id == player_id) else {
            debug!("assign: player {} is not available", player_id);
            return self.clone();
        };
        if !self.rosters.has_slot(team_name, slot_name) {
            debug!("assign: no slot {}/{}", team_name, slot_name);
            return self.clone();
        }

        let mut next = self.clone();
        let player = next.available.remove(idx);
        // has_slot was checked above, so put cannot miss.
        if let Ok(Some(displaced)) = next.rosters.put(team_name, slot_name, Some(player)) {
            insert_by_rank(&mut next.available, displaced);
        }
        next
    }

    /// Empty `(team, slot)` and return its player to the pool at their rank
    /// position. Unchanged if the slot is empty or does not exist.
    pub fn unassign(&self, team_name: &str, slot_name: &str) -> DraftState {
        if self.rosters.occupant(team_name, slot_name).is_none() {
            debug!("unassign: {}/{} is empty", team_name, slot_name);
            return self.clone();
        }

        let mut next = self.clone();
        if let Ok(Some(player)) = next.rosters.put(team_name, slot_name, None) {
            insert_by_rank(&mut next.available, player);
        }
        next
    }

    /// Replace the available pool with a freshly loaded one, keeping the
    /// roster store as is.
    ///
    /// Incoming players who are already on a roster are skipped, so a
    /// refresh never duplicates an assigned player.
    pub fn replace_available(&self, players: Vec<Player>) -> DraftState {
        DraftState::new(players, self.rosters.clone())
    }
}

/// A named, replayable transition on `DraftState`.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Assign {
        player_id: String,
        team: String,
        slot: String,
    },
    Unassign {
        team: String,
        slot: String,
    },
    ReplaceAvailable(Vec<Player>),
}

impl Transition {
    pub fn apply(&self, state: &DraftState) -> DraftState {
        match self {
            Transition::Assign {
                player_id,
                team,
                slot,
            } => state.assign(player_id, team, slot),
            Transition::Unassign { team, slot } => state.unassign(team, slot),
            Transition::ReplaceAvailable(players) => state.replace_available(players.clone()),
        }
    }
}

/// Stable sort ascending by rank, missing ranks last.
pub fn sort_by_rank(players: &mut [Player]) {
    players.sort_by_key(Player::rank_key);
}

/// Insert `player` before the first element whose rank exceeds theirs
/// (append if none). `players` must already be rank-ordered.
pub fn insert_by_rank(players: &mut Vec<Player>, player: Player) {
    let key = player.rank_key();
    let at = players.partition_point(|p| p.rank_key() <= key);
    players.insert(at, player);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(id: &str, rank: Option<u32>) -> Player {
        let mut p = Player::new(id, format!("Player {id}"), "RB");
        p.rank = rank;
        p
    }

    fn schema() -> RosterSchema {
        RosterSchema::new(["TeamA", "TeamB"], ["QB", "RB1", "RB2"])
    }

    fn three_player_state() -> DraftState {
        DraftState::fresh(
            vec![ranked("3", Some(3)), ranked("1", Some(1)), ranked("2", Some(2))],
            &schema(),
        )
    }

    fn ids(players: &[Player]) -> Vec<&str> {
        players.iter().map(|p| p.player_id.as_str()).collect()
    }

    #[test]
    fn fresh_state_is_rank_ordered() {
        let state = three_player_state();
        assert_eq!(ids(state.available()), vec!["1", "2", "3"]);
        assert_eq!(state.pick_number(), 1);
    }

    #[test]
    fn assign_moves_player_into_slot() {
        let state = three_player_state();
        let next = state.assign("2", "TeamA", "RB1");
        assert_eq!(ids(next.available()), vec!["1", "3"]);
        assert_eq!(next.rosters().occupant("TeamA", "RB1").unwrap().player_id, "2");
        assert_eq!(next.pick_number(), 2);
        // input untouched
        assert_eq!(state.available().len(), 3);
    }

    #[test]
    fn assign_displaces_occupant_back_to_pool() {
        let state = three_player_state().assign("1", "TeamA", "RB1");
        let next = state.assign("3", "TeamA", "RB1");
        assert_eq!(ids(next.available()), vec!["1", "2"]);
        assert_eq!(next.rosters().occupant("TeamA", "RB1").unwrap().player_id, "3");
    }

    #[test]
    fn assign_unknown_player_is_noop() {
        let state = three_player_state();
        assert_eq!(state.assign("99", "TeamA", "RB1"), state);
    }

    #[test]
    fn assign_unknown_slot_is_noop() {
        let state = three_player_state();
        assert_eq!(state.assign("1", "TeamA", "WR1"), state);
        assert_eq!(state.assign("1", "TeamZ", "RB1"), state);
    }

    #[test]
    fn assign_already_assigned_player_is_noop() {
        let state = three_player_state().assign("1", "TeamA", "RB1");
        assert_eq!(state.assign("1", "TeamB", "RB1"), state);
    }

    #[test]
    fn unassign_restores_rank_order() {
        let state = three_player_state().assign("2", "TeamB", "QB");
        let next = state.unassign("TeamB", "QB");
        assert_eq!(ids(next.available()), vec!["1", "2", "3"]);
        assert!(next.rosters().occupant("TeamB", "QB").is_none());
    }

    #[test]
    fn unassign_empty_slot_is_noop() {
        let state = three_player_state();
        assert_eq!(state.unassign("TeamA", "QB"), state);
        assert_eq!(state.unassign("Nobody", "QB"), state);
    }

    #[test]
    fn assign_then_unassign_round_trips() {
        let state = three_player_state();
        let back = state.assign("1", "TeamA", "RB1").unassign("TeamA", "RB1");
        assert_eq!(back, state);
    }

    #[test]
    fn unranked_player_returns_to_end() {
        let state = DraftState::fresh(
            vec![ranked("a", Some(1)), ranked("b", None), ranked("c", Some(2))],
            &schema(),
        );
        assert_eq!(ids(state.available()), vec!["a", "c", "b"]);
        let back = state.assign("b", "TeamA", "QB").unassign("TeamA", "QB");
        assert_eq!(ids(back.available()), vec!["a", "c", "b"]);
    }

    #[test]
    fn insert_by_rank_goes_after_equal_ranks() {
        let mut pool = vec![ranked("a", Some(1)), ranked("b", Some(2)), ranked("c", Some(4))];
        insert_by_rank(&mut pool, ranked("x", Some(2)));
        assert_eq!(ids(&pool), vec!["a", "b", "x", "c"]);
        insert_by_rank(&mut pool, ranked("y", Some(9)));
        assert_eq!(ids(&pool), vec!["a", "b", "x", "c", "y"]);
    }

    #[test]
    fn replace_available_skips_assigned_players() {
        let state = three_player_state().assign("1", "TeamA", "RB1");
        let refreshed = state.replace_available(vec![
            ranked("1", Some(1)),
            ranked("2", Some(2)),
            ranked("4", Some(3)),
        ]);
        assert_eq!(ids(refreshed.available()), vec!["2", "4"]);
        assert_eq!(refreshed.rosters(), state.rosters());
    }

    #[test]
    fn new_drops_duplicate_pool_entries() {
        let state = DraftState::fresh(
            vec![ranked("1", Some(1)), ranked("1", Some(1)), ranked("2", Some(2))],
            &schema(),
        );
        assert_eq!(ids(state.available()), vec!["1", "2"]);
    }

    #[test]
    fn transition_apply_matches_methods() {
        let state = three_player_state();
        let assign = Transition::Assign {
            player_id: "3".into(),
            team: "TeamB".into(),
            slot: "RB2".into(),
        };
        assert_eq!(assign.apply(&state), state.assign("3", "TeamB", "RB2"));

        let unassign = Transition::Unassign {
            team: "TeamB".into(),
            slot: "RB2".into(),
        };
        assert_eq!(unassign.apply(&assign.apply(&state)), state);
    }
}
