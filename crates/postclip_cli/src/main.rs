//! Command-line probe for a local PostClip database.
//!
//! # Responsibility
//! - Drive the request boundary against a database file from the shell.
//! - Print the status and JSON body of every reply.
//! - Exit non-zero for any non-2xx status.

use clap::{Parser, Subcommand};
use log::info;
use postclip_api::{ApiConfig, ApiResponse, BookmarkApi};
use postclip_core::db::{close_db, open_db};
use postclip_core::{BookmarkRepository, ServiceProfile, SqliteBookmarkRepository};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "postclip", version, about = "Capture and browse social post bookmarks")]
struct Cli {
    /// Database file (overrides POSTCLIP_DB_PATH).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Service profile, `capture` or `strict` (overrides POSTCLIP_PROFILE).
    #[arg(long, global = true, value_parser = parse_profile)]
    profile: Option<ServiceProfile>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Capture one post URL.
    Add {
        url: String,
        #[arg(long)]
        platform: Option<String>,
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        caption: Option<String>,
        /// Repeat for each media URL, in display order.
        #[arg(long = "media-url")]
        media_urls: Vec<String>,
        #[arg(long)]
        media_type: Option<String>,
        #[arg(long)]
        post_id: Option<String>,
    },
    /// List one owner's bookmarks, newest first.
    List {
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
    },
    Get {
        id: String,
    },
    Delete {
        id: String,
    },
    Health,
    /// Remove every bookmark for every owner.
    Clear,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match ApiConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::from(2);
        }
    };
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(profile) = cli.profile {
        config.profile = profile;
    }
    if let Err(err) = config.start_logging() {
        eprintln!("logging disabled: {err}");
    }

    let api = BookmarkApi::from_config(&config);
    let response = match cli.command {
        Command::Add {
            url,
            platform,
            owner,
            caption,
            media_urls,
            media_type,
            post_id,
        } => {
            let mut candidate = Map::new();
            candidate.insert("url".to_string(), json!(url));
            let optional = [
                ("platform", platform),
                ("owner", owner),
                ("caption", caption),
                ("mediaType", media_type),
                ("postId", post_id),
            ];
            for (key, value) in optional {
                if let Some(value) = value {
                    candidate.insert(key.to_string(), json!(value));
                }
            }
            if !media_urls.is_empty() {
                candidate.insert("mediaUrls".to_string(), json!(media_urls));
            }
            api.create_bookmark(&Value::Object(candidate).to_string())
        }
        Command::List {
            owner,
            limit,
            offset,
        } => {
            let limit = limit.map(|value| value.to_string());
            let offset = offset.map(|value| value.to_string());
            api.list_bookmarks(owner.as_deref(), limit.as_deref(), offset.as_deref())
        }
        Command::Get { id } => api.get_bookmark(&id),
        Command::Delete { id } => api.delete_bookmark(&id),
        Command::Health => api.health(),
        Command::Clear => clear_all(config.db_path.as_path()),
    };

    println!("{}", response.status);
    println!("{:#}", response.body);
    if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn clear_all(db_path: &Path) -> ApiResponse {
    let cleared = open_db(db_path)
        .map_err(|err| err.to_string())
        .and_then(|conn| {
            let removed = SqliteBookmarkRepository::try_new(&conn)
                .and_then(|repo| repo.clear())
                .map_err(|err| err.to_string());
            close_db(conn).map_err(|err| err.to_string())?;
            removed
        });

    match cleared {
        Ok(removed) => {
            info!(
                "event=bookmark_clear module=cli status=ok removed={}",
                removed
            );
            ApiResponse {
                status: 200,
                body: json!({ "ok": true, "removed": removed }),
            }
        }
        Err(message) => ApiResponse {
            status: 500,
            body: json!({ "error": message }),
        },
    }
}

fn parse_profile(value: &str) -> Result<ServiceProfile, String> {
    ServiceProfile::parse(value).ok_or_else(|| format!("unknown profile `{value}`"))
}
