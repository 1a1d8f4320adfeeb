mod config;
mod launch;
mod layout;
mod logging;
mod paper;

pub use config::*;
pub use launch::*;
pub use layout::*;
pub use logging::*;
pub use paper::*;
