//! Command-line interface for mongo-console
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and CLI overrides
//! - The `exec`, `test`, `list`, `shell` and `config` subcommands
//! - JSON output with optional colors

use clap::{Parser, Subcommand};
use colored_json::prelude::*;
use serde_json::{Value as JsonValue, json};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{Config, LogLevel};
use crate::connection::{ConnectionPool, build_connection_uri, sanitize_uri};
use crate::error::{ConfigError, Result};
use crate::executor::{CommandInterpreter, ExecutionResult};
use crate::parser::{ParsedCommand, Parser as CommandParser, ShellDirective};
use crate::store::{ConnectionStore, FileConnectionStore};

/// Database used when none is given
const DEFAULT_DATABASE: &str = "test";

/// Pooled MongoDB console driven by saved connections
#[derive(Parser, Debug)]
#[command(
    name = "mongo-console",
    version,
    about = "Run shell-style MongoDB commands against saved connections",
    long_about = "Runs a practical subset of mongo shell commands against connections
saved in a JSON store, reusing one pooled client per connection."
)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Saved connections file, overriding the configuration
    #[arg(long, value_name = "FILE")]
    pub connections: Option<PathBuf>,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Quiet mode (errors only)
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Very verbose mode (trace logging)
    #[arg(long = "vv")]
    pub very_verbose: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands for mongo-console
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute one command against a saved connection
    Exec {
        /// Saved connection id
        #[arg(short = 'C', long = "connection", value_name = "ID")]
        connection: String,

        /// Database to run against
        #[arg(short = 'd', long, value_name = "NAME", default_value = DEFAULT_DATABASE)]
        database: String,

        /// Command text, e.g. 'db.users.find({"age": 30})'
        #[arg(value_name = "COMMAND")]
        command: String,
    },

    /// Test a saved connection with a one-off client
    Test {
        /// Saved connection id
        #[arg(value_name = "ID")]
        connection: String,
    },

    /// List saved connections
    List,

    /// Read commands from standard input, one per line
    Shell {
        /// Saved connection id
        #[arg(short = 'C', long = "connection", value_name = "ID")]
        connection: String,

        /// Initial database
        #[arg(short = 'd', long, value_name = "NAME", default_value = DEFAULT_DATABASE)]
        database: String,
    },

    /// Show configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Validate configuration file
        #[arg(long)]
        validate: bool,
    },
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration
    config: Config,
}

impl CliInterface {
    /// Create a new CLI interface from the process arguments
    ///
    /// # Returns
    /// * `Result<Self>` - New CLI interface or error
    pub fn new() -> Result<Self> {
        Self::from_args(CliArgs::parse())
    }

    /// Create a CLI interface from already parsed arguments
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let mut config = Config::load(args.config_file.as_deref())?;
        Self::apply_args_to_config(&mut config, &args);
        Ok(Self { args, config })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the CLI arguments
    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    /// Apply CLI arguments to configuration
    ///
    /// # Arguments
    /// * `config` - Configuration to modify
    /// * `args` - Command-line arguments
    fn apply_args_to_config(config: &mut Config, args: &CliArgs) {
        if let Some(path) = &args.connections {
            config.store.connections_file = path.clone();
        }

        config.logging.level = if args.very_verbose {
            LogLevel::Trace
        } else if args.verbose {
            LogLevel::Debug
        } else if args.quiet {
            LogLevel::Error
        } else {
            config.logging.level
        };
    }

    /// Build the connection store named by the configuration
    pub fn store(&self) -> Arc<dyn ConnectionStore> {
        Arc::new(FileConnectionStore::new(
            self.config.store.connections_file.clone(),
        ))
    }

    /// Run the selected subcommand
    ///
    /// # Arguments
    /// * `pool` - Shared connection pool
    /// * `shutdown` - Cancelled when the process is asked to stop
    ///
    /// # Returns
    /// * `Result<bool>` - Whether every executed command succeeded
    pub async fn run(&self, pool: Arc<ConnectionPool>, shutdown: CancellationToken) -> Result<bool> {
        match &self.args.command {
            Commands::Exec {
                connection,
                database,
                command,
            } => self.exec(pool, connection, database, command).await,
            Commands::Test { connection } => self.test(&pool, connection).await,
            Commands::List => self.list(&pool).await,
            Commands::Shell {
                connection,
                database,
            } => self.shell(pool, connection, database, shutdown).await,
            Commands::Config { show, validate } => self.handle_config_command(*show, *validate),
        }
    }

    /// Execute a single command
    async fn exec(
        &self,
        pool: Arc<ConnectionPool>,
        connection: &str,
        database: &str,
        command: &str,
    ) -> Result<bool> {
        let interpreter = CommandInterpreter::new(pool);
        let result = interpreter
            .interpret_and_execute(connection, database, command)
            .await?;
        self.print_result(&result);
        Ok(result.success)
    }

    /// Test a saved connection
    async fn test(&self, pool: &ConnectionPool, connection: &str) -> Result<bool> {
        let record = pool
            .store()
            .find(connection)
            .await?
            .ok_or_else(|| ConfigError::NotFound(connection.to_string()))?;

        info!("Testing connection '{}'", record.display_name());
        let outcome = pool.test_connection(&record).await;
        let body = serde_json::to_value(&outcome).unwrap_or(JsonValue::Null);
        self.print_json(&body);
        Ok(outcome.success)
    }

    /// List saved connections with sanitized targets
    async fn list(&self, pool: &ConnectionPool) -> Result<bool> {
        let records = pool.store().load_connections().await?;
        let listing: Vec<JsonValue> = records
            .iter()
            .map(|record| {
                json!({
                    "id": record.id,
                    "name": record.display_name(),
                    "target": sanitize_uri(&build_connection_uri(record)),
                    "autoConnect": record.auto_connect,
                })
            })
            .collect();
        self.print_json(&JsonValue::Array(listing));
        Ok(true)
    }

    /// Line loop over standard input
    ///
    /// The loop owns the current database: a successful `use <name>` switches
    /// it for the following lines. Blank lines are skipped and `exit` or
    /// `quit` ends the loop.
    async fn shell(
        &self,
        pool: Arc<ConnectionPool>,
        connection: &str,
        database: &str,
        shutdown: CancellationToken,
    ) -> Result<bool> {
        let interpreter = CommandInterpreter::new(pool);
        let parser = CommandParser::new();
        let mut current_db = database.to_string();
        let mut all_ok = true;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        loop {
            stdout.write_all(format!("{current_db}> ").as_bytes()).await?;
            stdout.flush().await?;

            let line = tokio::select! {
                _ = shutdown.cancelled() => break,
                line = lines.next_line() => line?,
            };
            let Some(line) = line else { break };
            let input = line.trim();

            if input.is_empty() {
                continue;
            }
            if matches!(input, "exit" | "quit") {
                break;
            }

            match interpreter
                .interpret_and_execute(connection, &current_db, input)
                .await
            {
                Ok(result) => {
                    if result.success {
                        if let ParsedCommand::ShellDirective(ShellDirective::Use(name)) =
                            parser.parse(input)
                        {
                            debug!("Switching current database to '{}'", name);
                            current_db = name;
                        }
                    } else {
                        all_ok = false;
                    }
                    self.print_result(&result);
                }
                Err(e) => {
                    all_ok = false;
                    eprintln!("{e}");
                    if e.is_not_found() {
                        break;
                    }
                }
            }
        }

        Ok(all_ok)
    }

    /// Handle config subcommand
    ///
    /// # Arguments
    /// * `show` - Whether to show configuration
    /// * `validate` - Whether to validate configuration
    fn handle_config_command(&self, show: bool, validate: bool) -> Result<bool> {
        let mut valid = true;

        if validate {
            let path = self.get_config_path();
            println!("Validating configuration file: {}", path.display());
            match Config::load_from_file(Some(&path)).and_then(|c| c.validate()) {
                Ok(()) => println!("Configuration is valid"),
                Err(e) => {
                    println!("Configuration is invalid: {e}");
                    valid = false;
                }
            }
        }

        if show || !validate {
            println!("# Configuration file: {}", self.get_config_path().display());
            println!("{}", self.config.to_toml()?);
        }

        Ok(valid)
    }

    /// Get configuration file path (from args or default)
    fn get_config_path(&self) -> PathBuf {
        self.args
            .config_file
            .clone()
            .unwrap_or_else(Config::default_config_path)
    }

    /// Print an execution result as JSON
    fn print_result(&self, result: &ExecutionResult) {
        self.print_json(&result.to_json());
    }

    /// Print JSON, colored when enabled and writing to a terminal
    fn print_json(&self, value: &JsonValue) {
        let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        if self.args.no_color {
            println!("{text}");
        } else {
            println!("{}", text.to_colored_json_auto().unwrap_or(text));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_args_parsing() {
        let args = CliArgs::try_parse_from([
            "mongo-console",
            "exec",
            "-C",
            "local",
            "db.users.find({})",
        ])
        .unwrap();
        match args.command {
            Commands::Exec {
                connection,
                database,
                command,
            } => {
                assert_eq!(connection, "local");
                assert_eq!(database, "test");
                assert_eq!(command, "db.users.find({})");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_shell_requires_connection() {
        assert!(CliArgs::try_parse_from(["mongo-console", "shell"]).is_err());
    }

    #[test]
    fn test_args_override_config() {
        let args = CliArgs::try_parse_from([
            "mongo-console",
            "--connections",
            "/tmp/conns.json",
            "-v",
            "list",
        ])
        .unwrap();
        let mut config = Config::default();
        CliInterface::apply_args_to_config(&mut config, &args);
        assert_eq!(
            config.store.connections_file,
            PathBuf::from("/tmp/conns.json")
        );
        assert_eq!(config.logging.level, LogLevel::Debug);
    }
}
