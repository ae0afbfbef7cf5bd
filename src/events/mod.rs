//! Events - structured per-turn changes and their text rendering

pub mod log;
pub mod render;

pub use log::{applications_from_events, Event, TurnLog, DEGRADATION_SOURCE};
pub use render::render_turn;
