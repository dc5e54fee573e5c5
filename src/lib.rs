//! `/stuck` (alias `/escape`): move a trapped player to a nearby safe spot
//! after a short delay, at most once per cooldown window.

pub mod commands;
pub mod config;

pub use commands::{
    parse_command, Alias, CommandError, CommandHost, CommandSender, Dispatch, StuckHandler,
    PERMISSION_NODE,
};
pub use config::StuckConfig;
