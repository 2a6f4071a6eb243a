//! Core types for scriptplan
//!
//! This module holds the vocabulary shared by every other part of the crate:
//!
//! - [`error`] - [`PlanError`], [`ErrorContext`] and [`user_friendly_error`]
//! - [`resource`] - [`Resource`], [`ResourceKind`] and the [`ResourceLookup`] seam
//!
//! # Example
//!
//! ```rust
//! use scriptplan::core::{PlanError, Resource, ResourceLookup};
//! use scriptplan::catalog::Catalog;
//!
//! let mut catalog = Catalog::new();
//! catalog.add(Resource::file("jquery", "jquery.js", "jquery.min.js", Vec::<String>::new())).unwrap();
//! assert!(catalog.contains("jquery"));
//!
//! let err = catalog
//!     .add(Resource::file("jquery", "other.js", "other.js", Vec::<String>::new()))
//!     .unwrap_err();
//! assert!(matches!(err.downcast_ref::<PlanError>(), Some(PlanError::DuplicateDeclaration { .. })));
//! ```

pub mod error;
pub mod resource;

pub use error::{ErrorContext, PlanError, user_friendly_error};
pub use resource::{Resource, ResourceKind, ResourceLookup, split_dependency_list};
