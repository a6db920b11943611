//! # agora-shared
//!
//! Types shared between the Agora store and server: strongly typed
//! identifiers, request validation, and application constants.

pub mod constants;
pub mod error;
pub mod types;
pub mod validation;

pub use error::IdError;
pub use types::{CommentId, LikeId, PostId, UserId};
pub use validation::{FieldError, RegistrationInput, TextInput};
