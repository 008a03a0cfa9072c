// Crate root library declaration and module exports.
pub mod config;
pub mod context;
pub mod events;
pub mod explorer;
pub mod lifecycle;
pub mod model;
pub mod router;
pub mod session;
pub mod storage;
pub mod writer;

// --- ANDROID SUPPORT ---
#[cfg(feature = "mobile")]
pub mod mobile;

#[cfg(feature = "mobile")]
uniffi::setup_scaffolding!();
