//! Environment-driven configuration.

use starboard_core::DEFAULT_ENDORSEMENT_REACTION;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Read `name` from the environment and parse it, falling back to `default`
/// when unset or malformed.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring malformed {}={:?}, using default", name, raw);
                default
            }
        },
        Err(_) => default,
    }
}

/// Engine behaviour knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Reaction token that counts as an endorsement
    pub reaction: String,

    /// Minimum time an endorser must have been in the scope.
    /// Zero disables the rule.
    pub min_member_age: Duration,

    /// Window during which an identical rejection notice is not repeated
    pub notice_window: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reaction: DEFAULT_ENDORSEMENT_REACTION.to_string(),
            min_member_age: Duration::ZERO,
            notice_window: Duration::from_secs(10),
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let reaction = std::env::var("STARBOARD_EMOJI")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.reaction);

        let min_member_age = Duration::from_secs(env_or(
            "STARBOARD_MIN_MEMBER_AGE_SECS",
            defaults.min_member_age.as_secs(),
        ));

        let notice_window = Duration::from_secs(env_or(
            "STARBOARD_NOTICE_WINDOW_SECS",
            defaults.notice_window.as_secs(),
        ));

        Self {
            reaction,
            min_member_age,
            notice_window,
        }
    }

    /// Set the endorsement reaction token.
    #[must_use]
    pub fn with_reaction(mut self, reaction: impl Into<String>) -> Self {
        self.reaction = reaction.into();
        self
    }

    /// Set the minimum member age.
    #[must_use]
    pub fn with_min_member_age(mut self, age: Duration) -> Self {
        self.min_member_age = age;
        self
    }

    /// Set the notice throttling window.
    #[must_use]
    pub fn with_notice_window(mut self, window: Duration) -> Self {
        self.notice_window = window;
        self
    }
}

/// Configuration for a starboard node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Data directory for storage
    pub data_dir: PathBuf,

    /// HTTP API listen address
    pub api_addr: SocketAddr,

    /// Admin socket path (for starboard-admin CLI)
    pub admin_socket: PathBuf,

    pub engine: EngineConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Data directory from `STARBOARD_DATA_DIR`.
pub fn data_dir_from_env() -> PathBuf {
    PathBuf::from(
        std::env::var("STARBOARD_DATA_DIR").unwrap_or_else(|_| "./starboard-data".to_string()),
    )
}

/// Admin socket from `STARBOARD_ADMIN_SOCKET`, else `admin.sock` in `data_dir`.
/// The node and starboard-admin both resolve the socket through this.
pub fn admin_socket_from_env(data_dir: &Path) -> PathBuf {
    std::env::var("STARBOARD_ADMIN_SOCKET")
        .map(PathBuf::from)
        .unwrap_or_else(|_| data_dir.join("admin.sock"))
}

impl NodeConfig {
    /// Create config from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        let data_dir = data_dir_from_env();

        let api_addr = env_or(
            "STARBOARD_API_ADDR",
            SocketAddr::from(([0, 0, 0, 0], 8080)),
        );

        let admin_socket = admin_socket_from_env(&data_dir);

        Self {
            data_dir,
            api_addr,
            admin_socket,
            engine: EngineConfig::from_env(),
        }
    }
}
