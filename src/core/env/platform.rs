use std::path::{Path, PathBuf};

/// Architecture name used in release asset names (`x64`, `aarch64`, ...).
pub fn system_arch() -> &'static str {
    normalize_arch(std::env::consts::ARCH)
}

fn normalize_arch(arch: &'static str) -> &'static str {
    match arch {
        "x86_64" => "x64",
        other => other,
    }
}

/// Path of the game client binary inside an installed game directory.
pub fn client_executable(game_dir: &Path) -> PathBuf {
    let client = game_dir.join("Client");
    if cfg!(target_os = "macos") {
        client
            .join("Hytale.app")
            .join("Contents")
            .join("MacOS")
            .join("HytaleClient")
    } else if cfg!(target_os = "windows") {
        client.join("HytaleClient.exe")
    } else {
        client.join("HytaleClient")
    }
}
