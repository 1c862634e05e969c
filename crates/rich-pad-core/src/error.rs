/// Errors surfaced to the user by editing commands.
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditorError {
    /// A link was requested without a target URL. Blocks the edit.
    #[error("Please enter a valid URL.")]
    MissingLinkTarget,

    #[error("Node is not an image")]
    NotAnImage,

    #[error("Node is not part of the document")]
    Detached,
}
