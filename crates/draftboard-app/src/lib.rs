// Library root: configuration, persistence, feeds, the advisory client, and
// the session event loop built on draftboard-core.

pub mod advisory;
pub mod config;
pub mod db;
pub mod feed;
pub mod logging;
pub mod session;
