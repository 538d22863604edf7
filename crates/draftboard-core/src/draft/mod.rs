// Draft board state: players, rosters, transitions, and undo/redo history.

pub mod history;
pub mod player;
pub mod roster;
pub mod state;
