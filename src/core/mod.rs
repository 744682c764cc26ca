// ─── HyPrism Core ───
// Headless backend for the HyPrism game launcher.
//
// Architecture:
//   core/
//     downloader/ — Resumable transfers: retry, TLS fallback, progress
//     news/       — Blog feed fetch + TTL cache
//     env/        — Launcher directory layout + platform helpers
//     instance/   — `{branch}-v{version}` instance folders
//     updater/    — Release manifest + verified launcher downloads
//     state/      — Settings and shared services

pub mod downloader;
pub mod env;
pub mod error;
pub mod http;
pub mod instance;
pub mod news;
pub mod state;
pub mod updater;
