//! starboard-admin CLI tool
//!
//! Manages the blacklist and board destinations of a running node.
//!
//! Usage:
//!   starboard-admin blacklist <user_id>
//!   starboard-admin unblacklist <user_id>
//!   starboard-admin list-blacklist
//!   starboard-admin is-blacklisted <user_id>
//!   starboard-admin set-board <scope_id> <channel_id>
//!   starboard-admin clear-board <scope_id>
//!   starboard-admin list-scopes
//!   starboard-admin ping

use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

/// Admin command sent over the socket.
#[derive(Debug, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
enum AdminCommand {
    Blacklist { user_id: String },
    Unblacklist { user_id: String },
    ListBlacklist,
    IsBlacklisted { user_id: String },
    SetDestination { scope_id: String, channel_id: String },
    ClearDestination { scope_id: String },
    ListScopes,
    Ping,
}

/// Response from admin command.
#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum AdminResponse {
    Ok { message: String },
    Error { error: String },
    List { items: Vec<String> },
    Bool { value: bool },
    Pong,
}

fn print_usage() {
    eprintln!("starboard-admin - Manage a starboard node");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  starboard-admin blacklist <user_id>             Ignore a user's endorsements");
    eprintln!("  starboard-admin unblacklist <user_id>           Lift a blacklist entry");
    eprintln!("  starboard-admin list-blacklist                  List blacklisted users");
    eprintln!("  starboard-admin is-blacklisted <user_id>        Check a user");
    eprintln!("  starboard-admin set-board <scope_id> <channel>  Set a scope's board channel");
    eprintln!("  starboard-admin clear-board <scope_id>          Remove a scope's board channel");
    eprintln!("  starboard-admin list-scopes                     List scopes with a board");
    eprintln!("  starboard-admin ping                            Check if daemon is running");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  STARBOARD_ADMIN_SOCKET  Path to admin socket (default: $STARBOARD_DATA_DIR/admin.sock)");
}

fn get_socket_path() -> PathBuf {
    starboard_engine::admin_socket::default_socket_path()
}

fn send_command(cmd: AdminCommand) -> Result<AdminResponse, String> {
    let socket_path = get_socket_path();

    let mut stream = UnixStream::connect(&socket_path).map_err(|e| {
        format!(
            "Failed to connect to starboard-node at {:?}: {}\n\
             Is the starboard-node running?",
            socket_path, e
        )
    })?;

    // Send command
    let cmd_json = serde_json::to_string(&cmd).map_err(|e| e.to_string())?;
    writeln!(stream, "{}", cmd_json).map_err(|e| e.to_string())?;

    // Read response
    let mut reader = BufReader::new(&stream);
    let mut response_line = String::new();
    reader
        .read_line(&mut response_line)
        .map_err(|e| e.to_string())?;

    serde_json::from_str(&response_line).map_err(|e| format!("Invalid response: {}", e))
}

/// Fetch positional argument `index` or exit with a usage error.
fn arg(args: &[String], index: usize, command: &str, name: &str) -> String {
    match args.get(index) {
        Some(value) => value.clone(),
        None => {
            eprintln!("Error: {} requires a {} argument", command, name);
            std::process::exit(1);
        }
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let command = args[1].as_str();
    let cmd = match command {
        "blacklist" => AdminCommand::Blacklist {
            user_id: arg(&args, 2, command, "user_id"),
        },
        "unblacklist" => AdminCommand::Unblacklist {
            user_id: arg(&args, 2, command, "user_id"),
        },
        "list-blacklist" => AdminCommand::ListBlacklist,
        "is-blacklisted" => AdminCommand::IsBlacklisted {
            user_id: arg(&args, 2, command, "user_id"),
        },
        "set-board" => AdminCommand::SetDestination {
            scope_id: arg(&args, 2, command, "scope_id"),
            channel_id: arg(&args, 3, command, "channel_id"),
        },
        "clear-board" => AdminCommand::ClearDestination {
            scope_id: arg(&args, 2, command, "scope_id"),
        },
        "list-scopes" => AdminCommand::ListScopes,
        "ping" => AdminCommand::Ping,
        "-h" | "--help" | "help" => {
            print_usage();
            std::process::exit(0);
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            std::process::exit(1);
        }
    };

    match send_command(cmd) {
        Ok(response) => match response {
            AdminResponse::Ok { message } => {
                println!("{}", message);
            }
            AdminResponse::Error { error } => {
                eprintln!("Error: {}", error);
                std::process::exit(1);
            }
            AdminResponse::List { items } => {
                if items.is_empty() {
                    println!("(none)");
                } else {
                    for item in items {
                        println!("{}", item);
                    }
                }
            }
            AdminResponse::Bool { value } => {
                println!("{}", value);
                if !value {
                    std::process::exit(1);
                }
            }
            AdminResponse::Pong => {
                println!("pong - starboard-node is running");
            }
        },
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
