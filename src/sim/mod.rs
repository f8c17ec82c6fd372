/// Elapsed-seconds timeline clock.
pub mod clock;
pub mod dispatch;
/// Log line events and parsing.
pub mod event;
pub mod log;
pub mod render;
/// Cooperative playback scheduling.
pub mod scheduler;
pub mod session;
/// Device and link state.
pub mod state;
pub mod timeline;
