//! Shell directive parser
//!
//! This module handles the directives that are not method calls:
//! - show dbs, show databases
//! - show collections, show tables
//! - use <database>
//!
//! These commands don't use call syntax, so they're parsed with simple string matching.

use crate::parser::command::ShellDirective;

/// Parser for shell-specific commands
pub struct ShellCommandParser;

impl ShellCommandParser {
    /// Parse a `show ...` directive
    pub fn parse_show(input: &str) -> Option<ShellDirective> {
        let rest = input.strip_prefix("show")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }

        match rest.trim() {
            "dbs" | "databases" => Some(ShellDirective::ShowDatabases),
            "collections" | "tables" => Some(ShellDirective::ShowCollections),
            _ => None,
        }
    }

    /// Parse a `use <name>` directive
    ///
    /// The name is returned as typed; validation happens at execution so an
    /// invalid name is reported as data.
    pub fn parse_use(input: &str) -> Option<ShellDirective> {
        let rest = input.strip_prefix("use")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }

        let name = rest.trim();
        if name.is_empty() || name.contains(char::is_whitespace) {
            return None;
        }

        Some(ShellDirective::Use(name.to_string()))
    }

    /// Validate database name
    pub fn is_valid_db_name(name: &str) -> bool {
        // MongoDB database name restrictions:
        // - Cannot be empty
        // - Cannot contain /\. "$*<>:|?
        // - Cannot be longer than 64 characters
        if name.is_empty() || name.len() > 64 {
            return false;
        }

        !name.chars().any(|ch| {
            matches!(
                ch,
                '/' | '\\' | '.' | ' ' | '"' | '$' | '*' | '<' | '>' | ':' | '|' | '?' | '\0'
            )
        })
    }
}
