//! Configuration and session resolution

mod loader;

pub use loader::{
    apply_overrides, load_config, load_session, resolve_session, SessionOverrides, ENV_API_URL,
    ENV_TIMEOUT_MS, ENV_TOKEN,
};
