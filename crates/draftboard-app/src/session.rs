// Board session: owns the undo/redo history and runs the event loop.
//
// Every state change happens on the loop task, one at a time. Feed fetches
// and advisory calls run as spawned tasks; a finished fetch comes back
// through an internal channel and is applied like any other transition, in
// completion order. A refresh only ever replaces the available pool, so an
// assignment made while it was in flight survives.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use draftboard_core::advisory::{AdvisoryOpinion, AdvisoryRequest};
use draftboard_core::draft::history::History;
use draftboard_core::draft::player::Player;
use draftboard_core::draft::roster::RosterSchema;
use draftboard_core::draft::state::{DraftState, Transition};
use draftboard_core::snapshot;
use draftboard_core::valuation::metrics::MetricsPolicy;
use draftboard_core::valuation::suggest::{predict_next_pick, top_suggestions, DEFAULT_SUGGESTION_COUNT};

use crate::advisory::{AdvisoryClient, AdvisoryError};
use crate::config::Config;
use crate::db::Database;
use crate::feed::{load_pool, FeedError, PlayerFeed};

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Commands from the host UI.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardCommand {
    Assign {
        player_id: String,
        team: String,
        slot: String,
    },
    Unassign {
        team: String,
        slot: String,
    },
    Undo,
    Redo,
    /// Re-fetch the feed and replace the available pool.
    Refresh,
    /// Re-fetch the feed and start a new board, discarding all history.
    Reset,
    /// Ask the advisory service about an available player.
    AskAdvisory {
        player_id: String,
    },
    Quit,
}

/// What the host needs to redraw after a change.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardView {
    pub state: DraftState,
    pub past_len: usize,
    pub future_len: usize,
    /// Best composite scores in the available pool.
    pub suggestions: Vec<Player>,
    /// Likely next pick for the configured team.
    pub next_pick: Option<Player>,
}

impl BoardView {
    pub fn can_undo(&self) -> bool {
        self.past_len > 0
    }

    pub fn can_redo(&self) -> bool {
        self.future_len > 0
    }
}

/// Updates published to the host UI.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardUpdate {
    Board(Box<BoardView>),
    /// Transient message, e.g. a failed refresh.
    Notice(String),
    Advice {
        player_id: String,
        opinion: Result<AdvisoryOpinion, String>,
    },
}

/// How the initial board was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupSource {
    /// Restored from the persisted snapshot.
    Restored,
    /// Fetched fresh from the feed.
    Fetched,
    /// Nothing stored and the feed failed: empty pool, empty rosters.
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadKind {
    Refresh,
    Reset,
}

/// A finished feed fetch, delivered back to the loop.
struct PoolLoad {
    kind: LoadKind,
    result: Result<Vec<Player>, FeedError>,
}

// ---------------------------------------------------------------------------
// BoardSession
// ---------------------------------------------------------------------------

/// The single owner of the draft history. Persists after every committed
/// change.
pub struct BoardSession {
    config: Config,
    schema: RosterSchema,
    history: History<DraftState>,
    db: Database,
    advisory: Arc<AdvisoryClient>,
}

impl BoardSession {
    pub fn new(config: Config, db: Database, advisory: AdvisoryClient) -> Self {
        let schema = config.schema();
        let history = History::with_policy(config.noop_policy());
        Self {
            config,
            schema,
            history,
            db,
            advisory: Arc::new(advisory),
        }
    }

    /// Build a session and its initial board: the persisted snapshot if one
    /// is readable, otherwise a fresh fetch, otherwise an empty board.
    pub async fn startup(config: Config, db: Database, feed: &dyn PlayerFeed) -> (Self, StartupSource) {
        let advisory = AdvisoryClient::from_config(&config.advisory);
        let mut session = BoardSession::new(config, db, advisory);

        let restored = match session.db.load_snapshot() {
            Ok(Some(text)) => match snapshot::restore(&text, &session.schema, session.policy()) {
                Ok(state) => {
                    match session.db.snapshot_updated_at() {
                        Ok(Some(saved)) => {
                            let age = chrono::Utc::now().signed_duration_since(saved);
                            info!("restoring snapshot saved {} minutes ago ({})", age.num_minutes(), saved);
                        }
                        Ok(None) => {}
                        Err(e) => debug!("snapshot timestamp unavailable: {:#}", e),
                    }
                    Some(state)
                }
                Err(e) => {
                    warn!("discarding unreadable snapshot: {}", e);
                    if let Err(e) = session.db.remove_snapshot() {
                        warn!("failed to remove snapshot: {:#}", e);
                    }
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("failed to read snapshot: {:#}", e);
                None
            }
        };

        let (state, source) = match restored {
            Some(state) => (state, StartupSource::Restored),
            None => match load_pool(feed, session.policy()).await {
                Ok(pool) => (DraftState::fresh(pool, &session.schema), StartupSource::Fetched),
                Err(e) => {
                    warn!("initial feed fetch failed, starting empty: {}", e);
                    (DraftState::fresh(Vec::new(), &session.schema), StartupSource::Empty)
                }
            },
        };

        info!("board ready ({:?})", source);
        session.init(state);
        (session, source)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn policy(&self) -> &MetricsPolicy {
        &self.config.metrics
    }

    pub fn schema(&self) -> &RosterSchema {
        &self.schema
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn history(&self) -> &History<DraftState> {
        &self.history
    }

    pub fn present(&self) -> Option<&DraftState> {
        self.history.present()
    }

    /// Start over from `state`, discarding all history.
    pub fn init(&mut self, state: DraftState) {
        self.history.init(state);
        self.persist();
    }

    /// Apply a transition through the history. Returns `true` if it was
    /// recorded.
    pub fn apply(&mut self, transition: &Transition) -> bool {
        let recorded = self.history.apply(|s| transition.apply(s));
        if recorded {
            debug!("applied {}", transition_name(transition));
            self.persist();
        }
        recorded
    }

    pub fn undo(&mut self) -> bool {
        let moved = self.history.undo();
        if moved {
            self.persist();
        }
        moved
    }

    pub fn redo(&mut self) -> bool {
        let moved = self.history.redo();
        if moved {
            self.persist();
        }
        moved
    }

    /// Snapshot of the present board for the host. `None` before `init`.
    pub fn view(&self) -> Option<BoardView> {
        let state = self.history.present()?;
        let suggestions = top_suggestions(state.available(), DEFAULT_SUGGESTION_COUNT)
            .into_iter()
            .cloned()
            .collect();
        let my_team = state.rosters().team(&self.config.league.my_team);
        let next_pick = predict_next_pick(state.available(), my_team).cloned();

        Some(BoardView {
            state: state.clone(),
            past_len: self.history.past_len(),
            future_len: self.history.future_len(),
            suggestions,
            next_pick,
        })
    }

    /// Save the present state. Failures are logged, never propagated.
    fn persist(&self) {
        let Some(state) = self.history.present() else {
            return;
        };
        if let Err(e) = self.db.save_snapshot(state) {
            warn!("failed to persist snapshot: {:#}", e);
        }
    }
}

fn transition_name(t: &Transition) -> &'static str {
    match t {
        Transition::Assign { .. } => "assign",
        Transition::Unassign { .. } => "unassign",
        Transition::ReplaceAvailable(_) => "replace_available",
    }
}

// ---------------------------------------------------------------------------
// Event loop
// ---------------------------------------------------------------------------

/// Process commands until `Quit` or until the command channel closes.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<BoardCommand>,
    update_tx: mpsc::Sender<BoardUpdate>,
    mut session: BoardSession,
    feed: Arc<dyn PlayerFeed>,
) -> anyhow::Result<()> {
    info!("board event loop started");

    // The loop holds a sender, so this channel never closes while running.
    let (load_tx, mut load_rx) = mpsc::channel::<PoolLoad>(16);

    publish(&session, &update_tx).await;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(BoardCommand::Quit) => {
                        info!("quit received, shutting down");
                        break;
                    }
                    Some(cmd) => {
                        handle_command(&mut session, cmd, &update_tx, &load_tx, &feed).await;
                    }
                    None => {
                        info!("command channel closed, shutting down");
                        break;
                    }
                }
            }

            Some(load) = load_rx.recv() => {
                handle_pool_load(&mut session, load, &update_tx).await;
            }
        }
    }

    info!("board event loop exiting");
    Ok(())
}

async fn publish(session: &BoardSession, update_tx: &mpsc::Sender<BoardUpdate>) {
    if let Some(view) = session.view() {
        let _ = update_tx.send(BoardUpdate::Board(Box::new(view))).await;
    }
}

async fn handle_command(
    session: &mut BoardSession,
    cmd: BoardCommand,
    update_tx: &mpsc::Sender<BoardUpdate>,
    load_tx: &mpsc::Sender<PoolLoad>,
    feed: &Arc<dyn PlayerFeed>,
) {
    let changed = match cmd {
        BoardCommand::Assign {
            player_id,
            team,
            slot,
        } => session.apply(&Transition::Assign {
            player_id,
            team,
            slot,
        }),
        BoardCommand::Unassign { team, slot } => {
            session.apply(&Transition::Unassign { team, slot })
        }
        BoardCommand::Undo => session.undo(),
        BoardCommand::Redo => session.redo(),
        BoardCommand::Refresh => {
            spawn_pool_load(LoadKind::Refresh, session, load_tx, feed);
            false
        }
        BoardCommand::Reset => {
            spawn_pool_load(LoadKind::Reset, session, load_tx, feed);
            false
        }
        BoardCommand::AskAdvisory { player_id } => {
            spawn_advisory(session, player_id, update_tx);
            false
        }
        BoardCommand::Quit => false,
    };

    if changed {
        publish(session, update_tx).await;
    }
}

fn spawn_pool_load(
    kind: LoadKind,
    session: &BoardSession,
    load_tx: &mpsc::Sender<PoolLoad>,
    feed: &Arc<dyn PlayerFeed>,
) {
    let feed = Arc::clone(feed);
    let policy = session.policy().clone();
    let load_tx = load_tx.clone();
    tokio::spawn(async move {
        let result = load_pool(feed.as_ref(), &policy).await;
        let _ = load_tx.send(PoolLoad { kind, result }).await;
    });
}

fn spawn_advisory(session: &BoardSession, player_id: String, update_tx: &mpsc::Sender<BoardUpdate>) {
    let state = session.present().cloned();
    let client = Arc::clone(&session.advisory);
    let my_team = session.config.league.my_team.clone();
    let update_tx = update_tx.clone();

    tokio::spawn(async move {
        let request = state
            .as_ref()
            .and_then(|s| AdvisoryRequest::build(s, &player_id, &my_team));
        let result = match request {
            Some(request) => client.ask(&request).await,
            None => Err(AdvisoryError::PlayerUnavailable),
        };
        if let Err(e) = &result {
            warn!("advisory for {} failed: {}", player_id, e);
        }
        let _ = update_tx
            .send(BoardUpdate::Advice {
                player_id,
                opinion: result.map_err(|e| e.to_string()),
            })
            .await;
    });
}

async fn handle_pool_load(
    session: &mut BoardSession,
    load: PoolLoad,
    update_tx: &mpsc::Sender<BoardUpdate>,
) {
    let pool = match load.result {
        Ok(pool) => pool,
        Err(e) => {
            warn!("{:?} fetch failed, board unchanged: {}", load.kind, e);
            let _ = update_tx
                .send(BoardUpdate::Notice(format!("Could not load players: {e}")))
                .await;
            return;
        }
    };

    match load.kind {
        LoadKind::Refresh => {
            info!("refresh delivered {} players", pool.len());
            session.apply(&Transition::ReplaceAvailable(pool));
        }
        LoadKind::Reset => {
            info!("reset delivered {} players, starting a new board", pool.len());
            let fresh = DraftState::fresh(pool, &session.schema);
            session.init(fresh);
        }
    }
    publish(session, update_tx).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AdvisoryConfig, FeedConfig, HistoryConfig, LeagueConfig};

    fn test_config(record_noops: bool) -> Config {
        Config {
            league: LeagueConfig {
                teams: vec!["Mine".into(), "Theirs".into()],
                slots: vec!["QB".into(), "RB1".into(), "FLEX".into()],
                my_team: "Mine".into(),
            },
            metrics: MetricsPolicy::default(),
            history: HistoryConfig {
                record_noop_transitions: record_noops,
            },
            feed: FeedConfig {
                url: None,
                csv_path: Some("unused.csv".into()),
                timeout_secs: 5,
            },
            db_path: ":memory:".into(),
            advisory: AdvisoryConfig::default(),
        }
    }

    fn pool() -> Vec<Player> {
        (1..=4)
            .map(|i| {
                let mut p = Player::new(i.to_string(), format!("P{i}"), if i % 2 == 0 { "RB" } else { "QB" });
                p.rank = Some(i);
                p.composite_score = 1.0 / f64::from(i);
                p
            })
            .collect()
    }

    fn session(record_noops: bool) -> BoardSession {
        let config = test_config(record_noops);
        let db = Database::open(":memory:").unwrap();
        let mut session = BoardSession::new(config, db, AdvisoryClient::Disabled);
        let fresh = DraftState::fresh(pool(), session.schema());
        session.init(fresh);
        session
    }

    fn assign(id: &str, team: &str, slot: &str) -> Transition {
        Transition::Assign {
            player_id: id.into(),
            team: team.into(),
            slot: slot.into(),
        }
    }

    #[test]
    fn apply_persists_snapshot() {
        let mut s = session(true);
        assert!(s.apply(&assign("2", "Mine", "RB1")));

        let text = s.db.load_snapshot().unwrap().unwrap();
        let restored = snapshot::restore(&text, s.schema(), s.policy()).unwrap();
        assert_eq!(restored.rosters(), s.present().unwrap().rosters());
    }

    #[test]
    fn undo_redo_persist_present() {
        let mut s = session(true);
        s.apply(&assign("2", "Mine", "RB1"));
        assert!(s.undo());
        let text = s.db.load_snapshot().unwrap().unwrap();
        let restored = snapshot::restore(&text, s.schema(), s.policy()).unwrap();
        assert_eq!(restored.rosters().assigned_count(), 0);

        assert!(s.redo());
        assert!(!s.redo());
    }

    #[test]
    fn noop_policy_comes_from_config() {
        let mut recording = session(true);
        assert!(recording.apply(&assign("99", "Mine", "QB")));
        assert_eq!(recording.history().past_len(), 1);

        let mut skipping = session(false);
        assert!(!skipping.apply(&assign("99", "Mine", "QB")));
        assert_eq!(skipping.history().past_len(), 0);
    }

    #[test]
    fn view_reports_suggestions_and_next_pick() {
        let mut s = session(true);
        s.apply(&assign("1", "Mine", "QB"));
        let view = s.view().unwrap();
        assert!(view.can_undo());
        assert!(!view.can_redo());
        assert_eq!(view.suggestions[0].player_id, "2");
        // QB filled: "3" (QB, 0.33 x 0.5) loses to "2" (RB, 0.5 x 1.0)
        assert_eq!(view.next_pick.unwrap().player_id, "2");
    }

    #[test]
    fn view_before_init_is_none() {
        let s = BoardSession::new(
            test_config(true),
            Database::open(":memory:").unwrap(),
            AdvisoryClient::Disabled,
        );
        assert!(s.view().is_none());
    }
}
