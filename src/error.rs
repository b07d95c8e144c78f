//! Errors surfaced to the user by the route and note controller

use thiserror::Error;

/// Validation and lookup failures for user actions
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AppError {
    /// A required field was left blank
    #[error("{0} is required")]
    MissingField(&'static str),

    /// A date field is not in `YYYY-MM-DD` form
    #[error("Invalid {field}: '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { field: &'static str, value: String },

    /// The end date precedes the start date
    #[error("End date must not be before start date")]
    DateOrder,

    #[error("Route not found: {0}")]
    RouteNotFound(String),

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    /// Weather was requested without a city
    #[error("Enter a city name")]
    EmptyCity,
}
