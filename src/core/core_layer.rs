// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "drive_logs/mod.rs"]
pub mod drive_logs;
