//! ContainEye CLI
//!
//! Runs commands on configured hosts and serves terminal autocomplete
//! backed by the remote path index, command history and saved snippets.

use clap::{Parser, Subcommand};
use containeye_core::{suggest::path::shell_quote, CommandSuggestionContext};
use containeye_database::{models::CreateSnippet, queries};
use tracing::{debug, info, warn};

mod config;
mod ssh;
mod state;

use config::Config;
use state::AppState;

/// ContainEye - remote server terminal with command suggestions
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "CONTAINEYE_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List configured hosts
    Hosts,

    /// Suggest completions for a partially typed command
    Suggest {
        /// Command line typed so far
        input: String,

        /// Host name from the configuration
        #[arg(long)]
        host: String,

        /// Remote working directory
        #[arg(long, default_value = "/")]
        cwd: String,

        /// Print suggestions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a command on a host and record it in history
    Run {
        /// Command to execute
        command: String,

        /// Host name from the configuration
        #[arg(long)]
        host: String,

        /// Remote working directory
        #[arg(long)]
        cwd: Option<String>,
    },

    /// Show command history for a host
    History {
        /// Host name from the configuration
        #[arg(long)]
        host: String,

        /// Number of entries to show
        #[arg(short, long, default_value_t = 20)]
        limit: i64,
    },

    /// Saved snippet commands
    Snippet {
        #[command(subcommand)]
        command: SnippetCommands,
    },

    /// Show cached children of a remote directory
    Index {
        /// Remote directory
        dir: String,

        /// Host name from the configuration
        #[arg(long)]
        host: String,

        /// Only names starting with this prefix
        #[arg(long, default_value = "")]
        prefix: String,

        /// Maximum entries to show
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },
}

#[derive(Subcommand, Debug)]
enum SnippetCommands {
    /// Save a snippet
    Add {
        /// Command text
        command: String,

        /// Display name (defaults to the command)
        #[arg(long)]
        name: Option<String>,

        /// Only offer this snippet on the given host
        #[arg(long)]
        host: Option<String>,
    },

    /// List snippets
    List {
        /// Only snippets offered on this host
        #[arg(long)]
        host: Option<String>,
    },

    /// Delete a snippet
    Delete {
        /// Snippet ID
        id: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays scriptable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,containeye=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    let state = AppState::new(config).await?;

    let result = run(&state, cli.command).await;

    if let Err(e) = state.shutdown().await {
        warn!(error = %e, "Shutdown did not complete cleanly");
    }

    result
}

async fn run(state: &AppState, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Hosts => {
            for host in &state.config.hosts {
                let credential = host.to_credential()?;
                println!("{:<16} {}", credential.name, credential.key());
            }
        }

        Commands::Suggest {
            input,
            host,
            cwd,
            json,
        } => {
            let host = state.host(&host)?;
            let history = queries::recent_commands(
                state.database.pool(),
                host.key().as_str(),
                state.config.history_limit,
            )
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Could not load history");
                Vec::new()
            });

            let context = CommandSuggestionContext::new(host, cwd).with_history(history);
            let suggestions = state.engine().suggest(&input, &context).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&suggestions)?);
            } else {
                for s in &suggestions {
                    println!("{:>8.2}  {:<13} {}", s.score, s.source, s.text);
                }
            }
        }

        Commands::Run { command, host, cwd } => {
            let host = state.host(&host)?;
            let remote_command = match &cwd {
                Some(dir) => format!("cd {} && {}", shell_quote(dir), command),
                None => command.clone(),
            };

            info!(host = %host.key(), command = %command, "Running command");
            let output = state.runner.execute(&host, &remote_command).await;

            let pool = state.database.pool();
            let key = host.key();
            queries::record_command(pool, key.as_str(), &command).await?;
            let pruned = queries::prune_history(pool, key.as_str(), state.config.history_limit).await?;
            debug!(pruned, "History pruned");

            print!("{}", output?);
        }

        Commands::History { host, limit } => {
            let host = state.host(&host)?;
            let entries =
                queries::list_history(state.database.pool(), host.key().as_str(), limit).await?;
            for entry in entries.iter().rev() {
                println!(
                    "{}  {}",
                    entry.executed_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.command
                );
            }
        }

        Commands::Snippet { command } => run_snippet(state, command).await?,

        Commands::Index {
            dir,
            host,
            prefix,
            limit,
        } => {
            let key = state.host(&host)?.key();
            // Inspection only reads; `dir` must not be recorded as observed
            state.index.load(&key).await?;
            for child in state
                .index
                .suggest_children(&key, &dir, &prefix, limit)
                .await?
            {
                println!("{}", child);
            }
        }
    }

    Ok(())
}

async fn run_snippet(state: &AppState, command: SnippetCommands) -> anyhow::Result<()> {
    let pool = state.database.pool();

    match command {
        SnippetCommands::Add {
            command,
            name,
            host,
        } => {
            let host_key = match host {
                Some(name) => Some(state.host(&name)?.key().to_string()),
                None => None,
            };
            let input = CreateSnippet {
                name: name.unwrap_or_else(|| command.clone()),
                command,
                host_key,
            };
            let id = queries::create_snippet(pool, &input).await?;
            println!("Saved snippet {}", id);
        }

        SnippetCommands::List { host } => {
            let snippets = match host {
                Some(name) => {
                    let key = state.host(&name)?.key();
                    queries::list_snippets_for_host(pool, key.as_str()).await?
                }
                None => queries::list_snippets(pool).await?,
            };
            for snippet in snippets {
                let scope = if snippet.is_global() {
                    "(global)"
                } else {
                    snippet.host_key.as_deref().unwrap_or_default()
                };
                println!(
                    "{:>4}  {:<20} {:<24} {}",
                    snippet.id, snippet.name, scope, snippet.command
                );
            }
        }

        SnippetCommands::Delete { id } => {
            queries::delete_snippet(pool, id).await?;
            println!("Deleted snippet {}", id);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_suggest() {
        let cli = Cli::try_parse_from([
            "containeye",
            "suggest",
            "cd src/f",
            "--host",
            "nas",
            "--cwd",
            "/home/user",
        ])
        .unwrap();

        match cli.command {
            Commands::Suggest {
                input, host, cwd, json,
            } => {
                assert_eq!(input, "cd src/f");
                assert_eq!(host, "nas");
                assert_eq!(cwd, "/home/user");
                assert!(!json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
