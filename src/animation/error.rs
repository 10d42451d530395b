//! Error types for decoding Flow Lenia Animation containers.

use std::io;

use crate::schema::ConfigError;

/// Errors raised while opening a container or decoding one of its frames.
///
/// Header and index failures (`BadMagic`, `UnsupportedVersion`,
/// `TruncatedHeader`, `TruncatedIndex`) abort [`open`](super::AnimationReader::open).
/// Frame failures are scoped to the requested frame and leave the reader usable.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("Invalid FLWA magic bytes: {found:?}")]
    BadMagic { found: [u8; 4] },

    #[error("Unsupported FLWA version: {found} (expected {expected})")]
    UnsupportedVersion { found: u16, expected: u16 },

    #[error("File ends inside the {expected}-byte header")]
    TruncatedHeader { expected: usize },

    #[error(
        "Index table for {frame_count} frames does not fit in a {file_len}-byte file"
    )]
    TruncatedIndex { frame_count: u64, file_len: u64 },

    #[error("Frame {frame} payload truncated: wanted {expected} bytes at offset {offset}")]
    TruncatedFrame {
        frame: u64,
        offset: u64,
        expected: u64,
    },

    #[error("Frame {frame} payload is {actual} bytes, grid requires {expected}")]
    SizeMismatch {
        frame: u64,
        expected: usize,
        actual: usize,
    },

    #[error("No decompressor registered for codec id {0}")]
    UnsupportedCodec(u8),

    #[error("Frame index {index} out of range (frame count {frame_count})")]
    FrameIndexOutOfRange { index: u64, frame_count: u64 },

    #[error("Codec {codec} failed to decompress frame payload: {message}")]
    Codec { codec: u8, message: String },

    #[error("Invalid reader configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result alias for container operations.
pub type Result<T> = std::result::Result<T, FormatError>;

impl FormatError {
    /// True for errors that make the whole container unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FormatError::BadMagic { .. }
                | FormatError::UnsupportedVersion { .. }
                | FormatError::TruncatedHeader { .. }
                | FormatError::TruncatedIndex { .. }
                | FormatError::InvalidConfig(_)
        )
    }

    /// Copy of this error for reporting the same failure on another frame.
    ///
    /// I/O errors keep their kind and message only.
    pub(crate) fn duplicate(&self) -> FormatError {
        match self {
            FormatError::BadMagic { found } => FormatError::BadMagic { found: *found },
            FormatError::UnsupportedVersion { found, expected } => {
                FormatError::UnsupportedVersion {
                    found: *found,
                    expected: *expected,
                }
            }
            FormatError::TruncatedHeader { expected } => FormatError::TruncatedHeader {
                expected: *expected,
            },
            FormatError::TruncatedIndex {
                frame_count,
                file_len,
            } => FormatError::TruncatedIndex {
                frame_count: *frame_count,
                file_len: *file_len,
            },
            FormatError::TruncatedFrame {
                frame,
                offset,
                expected,
            } => FormatError::TruncatedFrame {
                frame: *frame,
                offset: *offset,
                expected: *expected,
            },
            FormatError::SizeMismatch {
                frame,
                expected,
                actual,
            } => FormatError::SizeMismatch {
                frame: *frame,
                expected: *expected,
                actual: *actual,
            },
            FormatError::UnsupportedCodec(id) => FormatError::UnsupportedCodec(*id),
            FormatError::FrameIndexOutOfRange { index, frame_count } => {
                FormatError::FrameIndexOutOfRange {
                    index: *index,
                    frame_count: *frame_count,
                }
            }
            FormatError::Codec { codec, message } => FormatError::Codec {
                codec: *codec,
                message: message.clone(),
            },
            FormatError::InvalidConfig(e) => FormatError::InvalidConfig(e.clone()),
            FormatError::Io(e) => FormatError::Io(io::Error::new(e.kind(), e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(FormatError::BadMagic { found: *b"NOPE" }.is_fatal());
        assert!(
            FormatError::TruncatedIndex {
                frame_count: 4,
                file_len: 10
            }
            .is_fatal()
        );
        assert!(!FormatError::UnsupportedCodec(7).is_fatal());
        assert!(
            !FormatError::FrameIndexOutOfRange {
                index: 3,
                frame_count: 3
            }
            .is_fatal()
        );
    }

    #[test]
    fn test_duplicate_keeps_variant() {
        let err = FormatError::InvalidConfig(ConfigError::InvalidKeyframeInterval);
        assert!(matches!(
            err.duplicate(),
            FormatError::InvalidConfig(ConfigError::InvalidKeyframeInterval)
        ));

        let err = FormatError::Io(io::Error::new(io::ErrorKind::UnexpectedEof, "short"));
        match err.duplicate() {
            FormatError::Io(e) => {
                assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof);
                assert_eq!(e.to_string(), "short");
            }
            other => panic!("expected Io, got {:?}", other),
        }

        assert!(matches!(
            FormatError::UnsupportedCodec(7).duplicate(),
            FormatError::UnsupportedCodec(7)
        ));
    }

    #[test]
    fn test_display_names_codec() {
        let msg = FormatError::UnsupportedCodec(7).to_string();
        assert!(msg.contains('7'));
    }
}
