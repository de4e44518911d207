//! UCI protocol front-end for sable.

mod command;
mod engine;
mod error;

pub use command::{Command, GoParams, parse_command};
pub use engine::UciEngine;
pub use error::UciError;
