//! Command implementations for the CLI.

mod config;
mod locate;
mod routes;
mod track;
mod upload;

pub use config::cmd_config;
pub use locate::cmd_locate;
pub use routes::{cmd_delete, cmd_fetch, cmd_history};
pub use track::{TrackArgs, cmd_track};
pub use upload::cmd_upload;
