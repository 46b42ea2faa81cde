//! Environment helpers shared by the config loaders.

pub mod env;

pub use env::{get_env_with_prefix, parse_bool, split_list};
