//! CLI smoke entry point.
//!
//! # Responsibility
//! - Exercise `acrobot_core` against a real database file from a shell.
//! - Keep output deterministic: JSON on stdout, errors on stderr.
//!
//! Usage:
//!   acrobot_cli version
//!   acrobot_cli explain <ACRONYM>
//!   acrobot_cli add <ACRONYM> <AUTHOR_ID> <TEXT...>
//!
//! `ACROBOT_DB` selects the database file (default `acrobot.db`).
//! `ACROBOT_LOG_DIR` enables file logging when set to an absolute path.

use acrobot_core::db::open_db;
use acrobot_core::{default_log_level, init_logging, AcronymService, SqliteAcronymRepository};
use std::process::ExitCode;

const DEFAULT_DB_PATH: &str = "acrobot.db";

fn main() -> ExitCode {
    if let Ok(log_dir) = std::env::var("ACROBOT_LOG_DIR") {
        if let Err(err) = init_logging(default_log_level(), &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<String, String> {
    let Some((command, rest)) = args.split_first() else {
        return Err(usage());
    };

    if command == "version" {
        return Ok(format!("acrobot_core version={}", acrobot_core::core_version()));
    }

    let db_path = std::env::var("ACROBOT_DB").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());
    let conn = open_db(&db_path).map_err(|err| format!("failed to open `{db_path}`: {err}"))?;
    let service = AcronymService::new(SqliteAcronymRepository::new(&conn));

    match (command.as_str(), rest) {
        ("explain", [acronym]) => match service.explain(acronym).map_err(|err| err.to_string())? {
            Some(explanations) => {
                serde_json::to_string_pretty(&explanations).map_err(|err| err.to_string())
            }
            None => Err(format!("no explanations for `{acronym}`")),
        },
        ("add", [acronym, author_id, words @ ..]) if !words.is_empty() => {
            let mut stored = service
                .find_or_create(acronym)
                .map_err(|err| err.to_string())?;
            let created = service
                .add_explanation(&mut stored, author_id, &words.join(" "))
                .map_err(|err| err.to_string())?;
            serde_json::to_string_pretty(&created).map_err(|err| err.to_string())
        }
        _ => Err(usage()),
    }
}

fn usage() -> String {
    "usage: acrobot_cli version | explain <ACRONYM> | add <ACRONYM> <AUTHOR_ID> <TEXT...>"
        .to_string()
}
