// Configuration loading and parsing (board.toml).

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use draftboard_core::draft::history::NoopPolicy;
use draftboard_core::draft::roster::{normalize_team_name, RosterSchema};
use draftboard_core::valuation::metrics::{
    CompositeWeights, MetricsPolicy, ReplacementFallback, DEFAULT_REPLACEMENT_RANK,
};
use serde::Deserialize;
use thiserror::Error;

/// File name of the board configuration under `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "board.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub metrics: MetricsPolicy,
    pub history: HistoryConfig,
    pub feed: FeedConfig,
    pub db_path: String,
    pub advisory: AdvisoryConfig,
}

impl Config {
    /// Team and slot layout every roster store is built against.
    pub fn schema(&self) -> RosterSchema {
        RosterSchema::new(self.league.teams.iter().cloned(), self.league.slots.iter().cloned())
    }

    pub fn noop_policy(&self) -> NoopPolicy {
        if self.history.record_noop_transitions {
            NoopPolicy::Record
        } else {
            NoopPolicy::Skip
        }
    }
}

// ---------------------------------------------------------------------------
// board.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire board.toml file.
#[derive(Debug, Clone, Deserialize)]
struct BoardFile {
    league: LeagueConfig,
    #[serde(default)]
    metrics: MetricsSection,
    #[serde(default)]
    history: HistoryConfig,
    feed: FeedConfig,
    storage: StorageSection,
    #[serde(default)]
    advisory: AdvisoryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    /// Team names in board order.
    pub teams: Vec<String>,
    /// Roster slot names, starters first.
    pub slots: Vec<String>,
    /// The user's own team; must be one of `teams`.
    pub my_team: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct MetricsSection {
    weights: CompositeWeights,
    replacement_ranks: BTreeMap<String, usize>,
    default_replacement_rank: usize,
    replacement_fallback: ReplacementFallback,
}

impl Default for MetricsSection {
    fn default() -> Self {
        let policy = MetricsPolicy::default();
        MetricsSection {
            weights: policy.weights,
            replacement_ranks: policy.replacement_ranks,
            default_replacement_rank: DEFAULT_REPLACEMENT_RANK,
            replacement_fallback: policy.fallback,
        }
    }
}

impl MetricsSection {
    /// Position keys are uppercased to match the engine's grouping. Entries
    /// override the built-in table; positions not listed keep their default.
    fn into_policy(self) -> MetricsPolicy {
        let mut replacement_ranks = MetricsPolicy::default().replacement_ranks;
        replacement_ranks.extend(
            self.replacement_ranks
                .into_iter()
                .map(|(pos, rank)| (pos.trim().to_uppercase(), rank)),
        );
        MetricsPolicy {
            weights: self.weights,
            replacement_ranks,
            default_replacement_rank: self.default_replacement_rank,
            fallback: self.replacement_fallback,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub record_noop_transitions: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            record_noop_transitions: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// HTTP endpoint returning the ranked-player JSON array.
    #[serde(default)]
    pub url: Option<String>,
    /// Local CSV file with one player per row. Used when `url` is unset.
    #[serde(default)]
    pub csv_path: Option<String>,
    #[serde(default = "default_feed_timeout")]
    pub timeout_secs: u64,
}

fn default_feed_timeout() -> u64 {
    15
}

#[derive(Debug, Clone, Deserialize)]
struct StorageSection {
    db_path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdvisoryConfig {
    /// Advisory endpoint. Asking for an opinion is disabled when unset.
    pub url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        AdvisoryConfig {
            url: None,
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/board.toml` relative to
/// `base_dir`.
///
/// Does not copy defaults; `load_config_in()` does both.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let file: BoardFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    let config = Config {
        league: file.league,
        metrics: file.metrics.into_policy(),
        history: file.history,
        feed: file.feed,
        db_path: file.storage.db_path,
        advisory: file.advisory,
    };

    validate(&config)?;

    Ok(config)
}

/// Seed `config/board.toml` from `defaults/board.toml` if it is missing.
///
/// Returns the path written, or `None` when a config file already exists.
/// An existing file is never overwritten.
pub fn ensure_config_files(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let source = base_dir.join("defaults").join(CONFIG_FILE);
    let config_dir = base_dir.join("config");
    let target = config_dir.join(CONFIG_FILE);

    if target.exists() {
        return Ok(None);
    }
    if !source.exists() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "no {CONFIG_FILE} under defaults/ or config/ in {}",
                base_dir.display()
            ),
        });
    }

    let copy_err = |what: &str, e: std::io::Error| ConfigError::DefaultsCopyError {
        message: format!("failed to {what}: {e}"),
    };
    std::fs::create_dir_all(&config_dir).map_err(|e| copy_err("create config directory", e))?;

    // Never overwrite, even a file written after the check above.
    let mut dest = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)
    {
        Ok(dest) => dest,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(None),
        Err(e) => return Err(copy_err("create config file", e)),
    };
    let content = std::fs::read(&source).map_err(|e| copy_err("read defaults", e))?;
    std::io::Write::write_all(&mut dest, &content).map_err(|e| copy_err("write config file", e))?;

    Ok(Some(target))
}

/// Seed missing config files from defaults, then load.
pub fn load_config_in(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_files(base_dir)?;
    load_config_from(base_dir)
}

/// Convenience wrapper: loads config relative to the current working directory.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    load_config_in(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let league = &config.league;

    if league.teams.is_empty() {
        return Err(invalid("league.teams", "must list at least one team"));
    }
    // Snapshots are migrated by normalized name, so two teams that
    // normalize the same would be indistinguishable.
    let mut seen = HashSet::new();
    for team in &league.teams {
        let key = normalize_team_name(team);
        if key.is_empty() {
            return Err(invalid(
                "league.teams",
                format!("team name {team:?} has no letters or digits"),
            ));
        }
        if !seen.insert(key) {
            return Err(invalid(
                "league.teams",
                format!("team name {team:?} duplicates another team"),
            ));
        }
    }

    if league.slots.is_empty() {
        return Err(invalid("league.slots", "must list at least one slot"));
    }
    let mut seen = HashSet::new();
    for slot in &league.slots {
        if slot.trim().is_empty() || !seen.insert(slot.as_str()) {
            return Err(invalid(
                "league.slots",
                format!("slot name {slot:?} is empty or duplicated"),
            ));
        }
    }

    if !league.teams.contains(&league.my_team) {
        return Err(invalid(
            "league.my_team",
            format!("{:?} is not one of league.teams", league.my_team),
        ));
    }

    let w = &config.metrics.weights;
    let weight_fields: &[(&str, f64)] = &[
        ("metrics.weights.adp", w.adp),
        ("metrics.weights.points", w.points),
        ("metrics.weights.vorp", w.vorp),
        ("metrics.weights.cliff", w.cliff),
    ];
    for (name, val) in weight_fields {
        if !val.is_finite() || *val < 0.0 {
            return Err(invalid(*name, format!("must be finite and >= 0, got {val}")));
        }
    }
    if w.total() <= 0.0 {
        return Err(invalid("metrics.weights", "at least one weight must be > 0"));
    }

    for (pos, rank) in &config.metrics.replacement_ranks {
        if *rank == 0 {
            return Err(invalid(
                format!("metrics.replacement_ranks.{pos}"),
                "must be >= 1",
            ));
        }
    }
    if config.metrics.default_replacement_rank == 0 {
        return Err(invalid("metrics.default_replacement_rank", "must be >= 1"));
    }

    if config.feed.url.is_none() && config.feed.csv_path.is_none() {
        return Err(invalid("feed", "set at least one of `url` or `csv_path`"));
    }
    if config.feed.timeout_secs == 0 {
        return Err(invalid("feed.timeout_secs", "must be > 0"));
    }

    if config.db_path.trim().is_empty() {
        return Err(invalid("storage.db_path", "must not be empty"));
    }

    if config.advisory.timeout_secs == 0 {
        return Err(invalid("advisory.timeout_secs", "must be > 0"));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
