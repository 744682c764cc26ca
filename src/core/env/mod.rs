pub mod paths;
pub mod platform;

pub use paths::{LauncherPaths, APP_DIR_NAME};
pub use platform::{client_executable, system_arch};
