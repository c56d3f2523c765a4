pub mod api;
pub mod auth;
pub mod flows;
pub mod risk;
pub mod settings;
pub mod text;
pub mod view;

pub use api::{ApiClient, ApiResponse};
pub use auth::AuthTokenStore;
pub use risk::{classify, needle_angle, RiskLevel};
pub use settings::ClientSettings;

/// Initialize `env_logger`, defaulting to `info` when `RUST_LOG` is unset.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init()
        .ok();
}
