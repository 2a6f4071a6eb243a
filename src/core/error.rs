//! Error handling for scriptplan
//!
//! The error system follows two rules:
//! 1. **Strongly-typed errors** ([`PlanError`]) for precise handling in code
//! 2. **User-friendly messages** ([`ErrorContext`]) with suggestions for CLI users
//!
//! Library functions return [`PlanError`] wrapped in [`anyhow::Error`] so callers
//! can attach context with `.context(...)` while still being able to downcast
//! to the concrete variant. [`user_friendly_error`] performs that downcast and
//! picks a suggestion for the CLI.
//!
//! # Examples
//!
//! ```rust,no_run
//! use scriptplan::core::{PlanError, user_friendly_error};
//!
//! let err = anyhow::Error::from(PlanError::UnregisteredDependency {
//!     name: "jquery".to_string(),
//!     required_by: Some("site".to_string()),
//! });
//! let ctx = user_friendly_error(err);
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for scriptplan operations.
///
/// # Error Categories
///
/// ## Resolution
/// - [`UnregisteredDependency`] - a name that no catalog entry defines
/// - [`CircularDependency`] - the dependency closure loops back on itself
/// - [`StructuralMergeConflict`] - two trees disagree on the order of shared resources
///
/// ## Catalog
/// - [`DuplicateDeclaration`] - a name registered twice
/// - [`CatalogNotFound`] - no `scriptplan.toml` could be located
/// - [`CatalogParseError`] - the catalog file is not valid TOML or has the wrong shape
/// - [`InvalidResource`] - an entry is missing required fields
///
/// [`UnregisteredDependency`]: PlanError::UnregisteredDependency
/// [`CircularDependency`]: PlanError::CircularDependency
/// [`StructuralMergeConflict`]: PlanError::StructuralMergeConflict
/// [`DuplicateDeclaration`]: PlanError::DuplicateDeclaration
/// [`CatalogNotFound`]: PlanError::CatalogNotFound
/// [`CatalogParseError`]: PlanError::CatalogParseError
/// [`InvalidResource`]: PlanError::InvalidResource
#[derive(Error, Debug)]
pub enum PlanError {
    /// A dependency name was not found in the catalog.
    ///
    /// Fatal for the current resolution pass. `required_by` is `None` when the
    /// name was requested directly by a page rather than through a dependency.
    #[error("{}", unregistered_message(.name, .required_by.as_deref()))]
    UnregisteredDependency {
        /// The name that could not be resolved
        name: String,
        /// The resource whose dependency list named it, if any
        required_by: Option<String>,
    },

    /// The same resource name was registered twice.
    #[error("Resource '{name}' is already defined")]
    DuplicateDeclaration {
        /// The repeated name
        name: String,
    },

    /// Dependency cycle detected.
    ///
    /// `chain` lists the resources along the cycle, ending with the resource
    /// that closes it.
    #[error("Circular dependency detected: {}", .chain.join(" → "))]
    CircularDependency {
        /// Resources along the cycle
        chain: Vec<String>,
    },

    /// Two trees imply contradictory relative ordering for shared resources.
    ///
    /// Depths are counted from the requested root (depth 0) downward.
    #[error(
        "Cannot merge load trees: '{first}' and '{second}' are ordered differently \
         (depths {first_depths:?} vs {second_depths:?})"
    )]
    StructuralMergeConflict {
        /// The shallower of the two resources in the first tree
        first: String,
        /// The resource that follows it in the first tree
        second: String,
        /// Depths of `first` and `second` in the first tree
        first_depths: (usize, usize),
        /// Depths of `first` and `second` in the second tree
        second_depths: (usize, usize),
    },

    /// No catalog file could be located.
    #[error("No scriptplan.toml found in current directory or any parent directory")]
    CatalogNotFound,

    /// The catalog file could not be parsed.
    #[error("Invalid catalog file syntax in {file}")]
    CatalogParseError {
        /// Path of the offending file
        file: String,
        /// Parser message
        reason: String,
    },

    /// A catalog or page entry is malformed.
    #[error("Invalid resource '{name}': {reason}")]
    InvalidResource {
        /// Name of the entry
        name: String,
        /// What is wrong with it
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

fn unregistered_message(name: &str, required_by: Option<&str>) -> String {
    match required_by {
        Some(parent) => {
            format!("Resource '{name}' is not registered (required by '{parent}')")
        }
        None => format!("Resource '{name}' is not registered"),
    }
}

/// Error wrapper with a suggestion and optional details for terminal display.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: PlanError,
    /// What the user can do about it
    pub suggestion: Option<String>,
    /// Additional explanation
    pub details: Option<String>,
}

impl ErrorContext {
    /// Wrap an error without any suggestion or details.
    #[must_use]
    pub const fn new(error: PlanError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Attach a suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with a fitting suggestion.
///
/// Known [`PlanError`] variants anywhere in the error chain get tailored
/// suggestions. Anything else is reported with its full context chain as the
/// details.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let chain = format!("{error:#}");
    match error.downcast::<PlanError>() {
        Ok(plan_error) => create_error_context(plan_error),
        Err(error) => {
            if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
                if io_error.kind() == std::io::ErrorKind::NotFound {
                    return ErrorContext::new(PlanError::ConfigError {
                        message: chain,
                    })
                    .with_suggestion("Check that the file exists and the path is correct");
                }
            }

            ErrorContext::new(PlanError::ConfigError {
                message: error.to_string(),
            })
            .with_details(chain)
        }
    }
}

fn create_error_context(error: PlanError) -> ErrorContext {
    match &error {
        PlanError::UnregisteredDependency { name, .. } => {
            let suggestion = format!(
                "Declare '{name}' in the [scripts] table of scriptplan.toml or fix the spelling of the dependency"
            );
            ErrorContext::new(error).with_suggestion(suggestion)
        }
        PlanError::DuplicateDeclaration { .. } => ErrorContext::new(error)
            .with_suggestion("Each resource name may be declared only once; rename or remove the duplicate"),
        PlanError::CircularDependency { .. } => ErrorContext::new(error)
            .with_suggestion("Break the cycle by removing one of the dependency declarations")
            .with_details("Load plans require an acyclic dependency graph"),
        PlanError::StructuralMergeConflict { .. } => ErrorContext::new(error)
            .with_suggestion(
                "Set conflict-policy = \"relayer\" in [settings] to rebuild conflicting trees from scratch",
            )
            .with_details(
                "Two requested resources place shared dependencies in an incompatible order, so their trees cannot be aligned",
            ),
        PlanError::CatalogNotFound => ErrorContext::new(error)
            .with_suggestion("Create a scriptplan.toml or pass --catalog <PATH>"),
        PlanError::CatalogParseError { reason, .. } => {
            let details = reason.clone();
            ErrorContext::new(error)
                .with_suggestion("Check the TOML syntax: quotes, brackets and table headers")
                .with_details(details)
        }
        PlanError::InvalidResource { .. } => ErrorContext::new(error).with_suggestion(
            "Script entries need either a `debug` path or an `inline` body",
        ),
        _ => ErrorContext::new(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unregistered_message_with_parent() {
        let err = PlanError::UnregisteredDependency {
            name: "jquery".to_string(),
            required_by: Some("site".to_string()),
        };
        assert_eq!(err.to_string(), "Resource 'jquery' is not registered (required by 'site')");
    }

    #[test]
    fn test_unregistered_message_without_parent() {
        let err = PlanError::UnregisteredDependency {
            name: "jquery".to_string(),
            required_by: None,
        };
        assert_eq!(err.to_string(), "Resource 'jquery' is not registered");
    }

    #[test]
    fn test_circular_dependency_message() {
        let err = PlanError::CircularDependency {
            chain: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "Circular dependency detected: a → b → a");
    }

    #[test]
    fn test_user_friendly_error_downcasts_through_context() {
        use anyhow::Context;

        let result: anyhow::Result<()> = Err(PlanError::DuplicateDeclaration {
            name: "site".to_string(),
        })
        .context("loading catalog");
        let ctx = user_friendly_error(result.unwrap_err());
        assert!(matches!(ctx.error, PlanError::DuplicateDeclaration { .. }));
        assert!(ctx.suggestion.is_some());
    }

    #[test]
    fn test_user_friendly_error_for_unknown_error() {
        let ctx = user_friendly_error(anyhow::anyhow!("something odd"));
        assert!(matches!(ctx.error, PlanError::ConfigError { .. }));
        assert!(ctx.to_string().contains("something odd"));
    }

    #[test]
    fn test_error_context_display() {
        let ctx = ErrorContext::new(PlanError::CatalogNotFound)
            .with_suggestion("create one")
            .with_details("searched upward");
        let text = ctx.to_string();
        assert!(text.contains("No scriptplan.toml found"));
        assert!(text.contains("Details: searched upward"));
        assert!(text.contains("Suggestion: create one"));
    }
}
