/// Configuration management commands
pub mod config_cmd;
/// Issue scoring and permit generation commands
pub mod score;
