use crate::models::Platform;

/// Fatal failures while turning an uploaded file into bill records.
///
/// Row-level problems are not represented here: a malformed row is logged
/// and dropped, it never aborts the file.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// No parser's filename predicate matched the upload.
    #[error("unsupported bill format: {filename}")]
    UnsupportedFormat { filename: String },

    /// The decoded text contains no recognizable header row.
    #[error("invalid {platform} bill: header row not found")]
    HeaderNotFound { platform: Platform },

    /// The header row was found but a required column was not.
    #[error("invalid {platform} bill: missing column {column}")]
    MissingColumn { platform: Platform, column: String },
}
