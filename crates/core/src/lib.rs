pub mod config;
pub mod error;
pub mod output;
pub mod types;

pub use config::{parse_snapshot_toml, parse_snapshot_toml_str};
pub use error::{Error, Result};
pub use output::{BatchReport, RouteFailure, write_artifact};
pub use types::*;
