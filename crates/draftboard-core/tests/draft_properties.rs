// Property tests for the draft state machine: every reachable state keeps
// each player in exactly one place, the pool stays rank-ordered, and undo
// exactly reverses apply.

use std::collections::BTreeSet;

use draftboard_core::draft::history::History;
use draftboard_core::draft::player::Player;
use draftboard_core::draft::roster::RosterSchema;
use draftboard_core::draft::state::{DraftState, Transition};
use proptest::prelude::*;

const TEAMS: [&str; 3] = ["Alpha", "Bravo", "Charlie"];
const SLOTS: [&str; 4] = ["QB", "RB1", "FLEX", "Bench-1"];

#[derive(Debug, Clone)]
enum Op {
    Assign { player: usize, team: usize, slot: usize },
    Unassign { team: usize, slot: usize },
    Refresh,
    Undo,
    Redo,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0usize..32, 0usize..TEAMS.len(), 0usize..SLOTS.len())
            .prop_map(|(player, team, slot)| Op::Assign { player, team, slot }),
        2 => (0usize..TEAMS.len(), 0usize..SLOTS.len())
            .prop_map(|(team, slot)| Op::Unassign { team, slot }),
        1 => Just(Op::Refresh),
        2 => Just(Op::Undo),
        1 => Just(Op::Redo),
    ]
}

fn pool_strategy() -> impl Strategy<Value = Vec<Player>> {
    prop::collection::vec(prop::option::weighted(0.8, 1u32..200), 1..24).prop_map(|ranks| {
        ranks
            .into_iter()
            .enumerate()
            .map(|(i, rank)| {
                let mut p = Player::new(format!("p{i}"), format!("Player {i}"), "RB");
                p.rank = rank;
                p
            })
            .collect()
    })
}

fn schema() -> RosterSchema {
    RosterSchema::new(TEAMS, SLOTS)
}

fn transition_for(op: &Op, pool: &[Player]) -> Option<Transition> {
    match *op {
        Op::Assign { player, team, slot } => Some(Transition::Assign {
            // out-of-range indices exercise the unknown-player path
            player_id: format!("p{player}"),
            team: TEAMS[team].to_string(),
            slot: SLOTS[slot].to_string(),
        }),
        Op::Unassign { team, slot } => Some(Transition::Unassign {
            team: TEAMS[team].to_string(),
            slot: SLOTS[slot].to_string(),
        }),
        Op::Refresh => Some(Transition::ReplaceAvailable(pool.to_vec())),
        Op::Undo | Op::Redo => None,
    }
}

fn run(pool: &[Player], ops: &[Op]) -> History<DraftState> {
    let mut history = History::new();
    history.init(DraftState::fresh(pool.to_vec(), &schema()));
    for op in ops {
        match op {
            Op::Undo => {
                history.undo();
            }
            Op::Redo => {
                history.redo();
            }
            other => {
                if let Some(t) = transition_for(other, pool) {
                    history.apply(|s| t.apply(s));
                }
            }
        }
    }
    history
}

fn is_rank_ordered(state: &DraftState) -> bool {
    state
        .available()
        .windows(2)
        .all(|w| w[0].rank_key() <= w[1].rank_key())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    #[test]
    fn every_retained_state_conserves_players(pool in pool_strategy(), ops in prop::collection::vec(op_strategy(), 0..40)) {
        let expected: BTreeSet<String> = pool.iter().map(|p| p.player_id.clone()).collect();
        let history = run(&pool, &ops);

        for state in history.states() {
            let ids = state.player_ids();
            let unique: BTreeSet<String> = ids.iter().map(|s| s.to_string()).collect();
            prop_assert_eq!(ids.len(), unique.len(), "duplicate player on the board");
            prop_assert_eq!(&unique, &expected);
        }
    }

    #[test]
    fn pool_stays_rank_ordered(pool in pool_strategy(), ops in prop::collection::vec(op_strategy(), 0..40)) {
        let history = run(&pool, &ops);
        for state in history.states() {
            prop_assert!(is_rank_ordered(state));
        }
    }

    #[test]
    fn undo_reverses_and_redo_replays(
        pool in pool_strategy(),
        ops in prop::collection::vec(op_strategy(), 0..30),
        last in op_strategy(),
    ) {
        let Some(t) = transition_for(&last, &pool) else {
            return Ok(());
        };
        let mut history = run(&pool, &ops);
        let before = history.present().cloned();

        history.apply(|s| t.apply(s));
        let after = history.present().cloned();

        prop_assert!(history.undo());
        prop_assert_eq!(history.present().cloned(), before);
        prop_assert!(history.redo());
        prop_assert_eq!(history.present().cloned(), after);
    }

    #[test]
    fn apply_after_undo_discards_redo_branch(
        pool in pool_strategy(),
        ops in prop::collection::vec(op_strategy(), 1..30),
    ) {
        let mut history = run(&pool, &ops);
        history.undo();
        history.apply(|s| s.unassign(TEAMS[0], SLOTS[0]));
        prop_assert!(!history.can_redo());
        prop_assert!(!history.redo());
    }

    #[test]
    fn unassign_after_assign_restores_state(pool in pool_strategy(), player in 0usize..24, slot in 0usize..SLOTS.len()) {
        // Ranks here are unique so the reinsertion point is unambiguous.
        let pool: Vec<Player> = pool
            .into_iter()
            .enumerate()
            .map(|(i, mut p)| {
                p.rank = Some(i as u32 + 1);
                p
            })
            .collect();
        let state = DraftState::fresh(pool, &schema());
        let id = format!("p{player}");
        let round_trip = state.assign(&id, TEAMS[1], SLOTS[slot]).unassign(TEAMS[1], SLOTS[slot]);
        prop_assert_eq!(round_trip, state);
    }
}
