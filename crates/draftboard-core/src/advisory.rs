// Payloads exchanged with the pick advisory service.
//
// The request is a read-only view of the board at the moment a pick is
// considered. The opinion that comes back is for display only.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::draft::player::Player;
use crate::draft::roster::{RosterStore, TeamRoster};
use crate::draft::state::DraftState;

/// Where the draft stands, derived from the overall pick number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickMeta {
    pub round: usize,
    pub pick_number: usize,
    pub pick_in_round: usize,
    pub teams: usize,
}

impl PickMeta {
    /// Round and in-round position for a 1-based overall pick in a league of
    /// `teams` teams.
    pub fn from_pick(pick_number: usize, teams: usize) -> Self {
        let pick_number = pick_number.max(1);
        let per_round = teams.max(1);
        PickMeta {
            round: pick_number.div_ceil(per_round),
            pick_number,
            pick_in_round: (pick_number - 1) % per_round + 1,
            teams,
        }
    }
}

/// Body posted to the advisory service.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryRequest<'a> {
    pub player: &'a Player,
    pub my_team_name: &'a str,
    /// `None` serializes as null when the configured team is not on the
    /// board.
    pub my_roster: Option<&'a TeamRoster>,
    pub board: &'a RosterStore,
    pub meta: PickMeta,
}

impl<'a> AdvisoryRequest<'a> {
    /// Snapshot the board for an opinion on `player_id`. Returns `None` if
    /// the player is not in the available pool.
    pub fn build(state: &'a DraftState, player_id: &str, my_team_name: &'a str) -> Option<Self> {
        let player = state.available_player(player_id)?;
        let board = state.rosters();
        Some(AdvisoryRequest {
            player,
            my_team_name,
            my_roster: board.team(my_team_name),
            board,
            meta: PickMeta::from_pick(state.pick_number(), board.teams().len()),
        })
    }
}

/// The service's assessment of a pick. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdvisoryOpinion {
    pub verdict: String,
    pub fit_score: Option<f64>,
    pub rationale: String,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
}

/// Envelope the service replies with.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdvisoryResponse {
    pub opinion: AdvisoryOpinion,
    /// Opaque league-tendency data the service chose to consider.
    pub used_tendencies: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::roster::RosterSchema;
    use serde_json::json;

    #[test]
    fn pick_meta_first_round() {
        let meta = PickMeta::from_pick(1, 12);
        assert_eq!((meta.round, meta.pick_in_round), (1, 1));
        let meta = PickMeta::from_pick(12, 12);
        assert_eq!((meta.round, meta.pick_in_round), (1, 12));
    }

    #[test]
    fn pick_meta_wraps_rounds() {
        let meta = PickMeta::from_pick(13, 12);
        assert_eq!((meta.round, meta.pick_in_round), (2, 1));
        let meta = PickMeta::from_pick(30, 12);
        assert_eq!((meta.round, meta.pick_in_round), (3, 6));
    }

    #[test]
    fn pick_meta_zero_teams_does_not_panic() {
        let meta = PickMeta::from_pick(3, 0);
        assert_eq!((meta.round, meta.pick_in_round, meta.teams), (3, 1, 0));
    }

    fn state() -> DraftState {
        let schema = RosterSchema::new(["Mine", "Theirs"], ["QB", "RB1"]);
        let mut a = Player::new("a", "Alpha", "QB");
        a.rank = Some(1);
        let mut b = Player::new("b", "Bravo", "RB");
        b.rank = Some(2);
        DraftState::fresh(vec![a, b], &schema).assign("a", "Theirs", "QB")
    }

    #[test]
    fn request_carries_board_and_meta() {
        let state = state();
        let req = AdvisoryRequest::build(&state, "b", "Mine").unwrap();
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["player"]["playerId"], "b");
        assert_eq!(value["myTeamName"], "Mine");
        assert_eq!(value["myRoster"], json!({"QB": null, "RB1": null}));
        assert_eq!(value["board"]["Theirs"]["QB"]["playerId"], "a");
        assert_eq!(
            value["meta"],
            json!({"round": 1, "pickNumber": 2, "pickInRound": 2, "teams": 2})
        );
    }

    #[test]
    fn request_for_unavailable_player() {
        assert!(AdvisoryRequest::build(&state(), "a", "Mine").is_none());
    }

    #[test]
    fn unknown_team_sends_null_roster() {
        let state = state();
        let req = AdvisoryRequest::build(&state, "b", "Nobody").unwrap();
        assert!(serde_json::to_value(&req).unwrap()["myRoster"].is_null());
    }

    #[test]
    fn opinion_decodes_leniently() {
        let resp: AdvisoryResponse = serde_json::from_value(json!({
            "opinion": {"verdict": "Take", "fitScore": 0.8, "pros": ["volume"]}
        }))
        .unwrap();
        assert_eq!(resp.opinion.verdict, "Take");
        assert_eq!(resp.opinion.fit_score, Some(0.8));
        assert_eq!(resp.opinion.pros, vec!["volume"]);
        assert!(resp.opinion.cons.is_empty());
        assert!(resp.used_tendencies.is_none());

        let empty: AdvisoryResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty, AdvisoryResponse::default());
    }
}
