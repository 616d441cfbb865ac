/// CSV export of schedules and iteration traces.
pub mod export;
/// CSV loading of fixed-load profiles and vehicle sessions.
pub mod load;
