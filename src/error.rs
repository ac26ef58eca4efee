use std::path::PathBuf;

use thiserror::Error;

/// Library error type for slot and storage operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The capture slot holds no image (cleared, or never written).
    #[error("capture slot is empty")]
    EmptySlot,

    /// A stored image could not be decoded.
    #[error("failed to decode image at {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A bitmap could not be encoded for storage.
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    // Exhaustive: a new variant has to be listed here.
    fn label(err: &Error) -> &'static str {
        match err {
            Error::EmptySlot => "empty",
            Error::Decode { .. } => "decode",
            Error::Encode(_) => "encode",
            Error::Io(_) => "io",
        }
    }

    #[test]
    fn io_errors_convert_and_keep_their_message() {
        let err: Error = io::Error::new(io::ErrorKind::PermissionDenied, "read-only").into();
        assert_eq!(label(&err), "io");
        assert_eq!(err.to_string(), "read-only");
    }

    #[test]
    fn empty_slot_has_a_plain_message() {
        assert_eq!(label(&Error::EmptySlot), "empty");
        assert_eq!(Error::EmptySlot.to_string(), "capture slot is empty");
    }
}
