pub mod chain;
pub mod config;
pub mod follow;
pub mod utils;

pub use config::{handle_config_command, ConfigCommands};
pub use follow::{follow, FollowOutput};
