//! Helpful error types for CLI commands
//!
//! Every error says what went wrong, what was happening, and what to try.

use std::fmt;
use std::path::Path;

use serde::Serialize;

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Fixture or flow file does not exist
    pub fn file_not_found(path: &Path) -> Self {
        Self::new(format!("File not found: {}", path.display()))
            .with_context("The specified file does not exist")
            .with_suggestion(format!("TRY: Check if the file exists: ls -la {}", path.display()))
    }

    /// Fixture JSON did not decode into tabs and a tree
    pub fn invalid_fixture(path: &Path, details: &str) -> Self {
        Self::new(format!("Invalid fixture: {}", path.display()))
            .with_context(details.to_string())
            .with_suggestion("TRY: A fixture looks like {\"tabs\": [...], \"tree\": {\"id\": \"0\", \"children\": []}}")
    }

    pub fn invalid_config(path: &Path, details: &str) -> Self {
        Self::new(format!("Invalid config: {}", path.display()))
            .with_context(details.to_string())
            .with_suggestion("TRY: Known keys are self_surface_pattern and [tab_query]")
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

#[derive(Serialize)]
struct JsonError<'a> {
    message: String,
    context: Option<&'a str>,
    suggestions: &'a [String],
}

fn json_error(err: &anyhow::Error) -> serde_json::Value {
    let body = match err.downcast_ref::<HelpfulError>() {
        Some(helpful) => JsonError {
            message: helpful.message.clone(),
            context: helpful.context.as_deref(),
            suggestions: &helpful.suggestions,
        },
        None => JsonError {
            message: format!("{:#}", err),
            context: None,
            suggestions: &[],
        },
    };
    serde_json::json!({ "error": body })
}

/// Print an error as a single JSON object on stdout.
pub fn print_json_error(err: &anyhow::Error) {
    println!("{}", json_error(err));
}
