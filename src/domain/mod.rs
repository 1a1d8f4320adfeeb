mod config;
mod release;

pub use config::*;
pub use release::*;
