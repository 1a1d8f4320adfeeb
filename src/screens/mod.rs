mod halt;
mod help;
mod installed;
mod launch;
mod releases;
mod root;
mod settings;

pub use halt::Halt;
pub use help::Help;
pub use installed::InstalledPicker;
pub use launch::{ServerLaunch, ShellLaunch};
pub use releases::GroupPicker;
pub use root::RootMenu;
pub use settings::Settings;
