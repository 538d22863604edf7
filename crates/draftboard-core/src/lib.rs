// Library root: the draft state machine, the player pipeline, and the
// payload types the app layer exchanges with its collaborators.

pub mod advisory;
pub mod draft;
pub mod headshot;
pub mod snapshot;
pub mod valuation;
