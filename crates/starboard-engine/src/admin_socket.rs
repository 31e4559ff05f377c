//! Unix socket server for admin commands.
//!
//! Provides a local IPC interface for the global blacklist and per-scope
//! board destinations.

use crate::config;
use crate::error::Result;
use crate::storage::Storage;
use serde::{Deserialize, Serialize};
use starboard_core::{ChannelId, ScopeId, UserId};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

/// Admin command sent over the socket.
#[derive(Debug, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum AdminCommand {
    /// Stop counting a user's endorsements
    Blacklist { user_id: String },
    /// Lift a blacklist entry
    Unblacklist { user_id: String },
    /// List blacklisted users
    ListBlacklist,
    /// Check if a user is blacklisted
    IsBlacklisted { user_id: String },
    /// Set the board channel of a scope
    SetDestination { scope_id: String, channel_id: String },
    /// Remove the board channel of a scope
    ClearDestination { scope_id: String },
    /// List scopes with a board record
    ListScopes,
    /// Ping (health check)
    Ping,
}

/// Response from admin command.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AdminResponse {
    Ok { message: String },
    Error { error: String },
    List { items: Vec<String> },
    Bool { value: bool },
    Pong,
}

/// Admin socket server.
pub struct AdminSocket {
    storage: Arc<Storage>,
    socket_path: PathBuf,
}

impl AdminSocket {
    /// Create a new admin socket server.
    pub fn new(storage: Arc<Storage>, socket_path: &Path) -> Self {
        Self {
            storage,
            socket_path: socket_path.to_path_buf(),
        }
    }

    /// Run the admin socket server.
    pub async fn run(&self) -> Result<()> {
        // Remove existing socket file if present
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;
        tracing::info!("Admin socket listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let storage = Arc::clone(&self.storage);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, storage).await {
                            tracing::error!("Admin connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Failed to accept admin connection: {}", e);
                }
            }
        }
    }

    /// Get the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

async fn handle_connection(stream: UnixStream, storage: Arc<Storage>) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    while reader.read_line(&mut line).await? > 0 {
        let response = match serde_json::from_str::<AdminCommand>(&line) {
            Ok(cmd) => execute_command(cmd, &storage),
            Err(e) => AdminResponse::Error {
                error: format!("Invalid command: {}", e),
            },
        };

        let response_json = serde_json::to_string(&response)? + "\n";
        writer.write_all(response_json.as_bytes()).await?;
        line.clear();
    }

    Ok(())
}

fn respond(result: Result<String>) -> AdminResponse {
    match result {
        Ok(message) => {
            tracing::info!("{}", message);
            AdminResponse::Ok { message }
        }
        Err(e) => AdminResponse::Error {
            error: e.to_string(),
        },
    }
}

fn execute_command(cmd: AdminCommand, storage: &Storage) -> AdminResponse {
    match cmd {
        AdminCommand::Blacklist { user_id } => respond(
            storage
                .set_blacklisted(&UserId::from(user_id.as_str()), true)
                .map(|()| format!("Blacklisted: {}", user_id)),
        ),

        AdminCommand::Unblacklist { user_id } => respond(
            storage
                .set_blacklisted(&UserId::from(user_id.as_str()), false)
                .map(|()| format!("Removed from blacklist: {}", user_id)),
        ),

        AdminCommand::ListBlacklist => match storage.list_blacklist() {
            Ok(users) => AdminResponse::List {
                items: users.into_iter().map(|u| u.to_string()).collect(),
            },
            Err(e) => AdminResponse::Error {
                error: e.to_string(),
            },
        },

        AdminCommand::IsBlacklisted { user_id } => {
            match storage.is_blacklisted(&UserId::from(user_id)) {
                Ok(value) => AdminResponse::Bool { value },
                Err(e) => AdminResponse::Error {
                    error: e.to_string(),
                },
            }
        }

        AdminCommand::SetDestination {
            scope_id,
            channel_id,
        } => respond(
            storage
                .set_destination(
                    &ScopeId::from(scope_id.as_str()),
                    Some(&ChannelId::from(channel_id.as_str())),
                )
                .map(|()| format!("Board for {} is now {}", scope_id, channel_id)),
        ),

        AdminCommand::ClearDestination { scope_id } => respond(
            storage
                .set_destination(&ScopeId::from(scope_id.as_str()), None)
                .map(|()| format!("Cleared board for {}", scope_id)),
        ),

        AdminCommand::ListScopes => match storage.list_scopes() {
            Ok(scopes) => AdminResponse::List {
                items: scopes.into_iter().map(|s| s.to_string()).collect(),
            },
            Err(e) => AdminResponse::Error {
                error: e.to_string(),
            },
        },

        AdminCommand::Ping => AdminResponse::Pong,
    }
}

/// Socket path the node binds, resolved from the same environment.
pub fn default_socket_path() -> PathBuf {
    config::admin_socket_from_env(&config::data_dir_from_env())
}
