use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BillError {
    #[error("Config directory not found at {0}. Run 'billpdf init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Bill file not found: {0}")]
    BillFileNotFound(PathBuf),

    #[error("Failed to parse bill file {path}: {source}")]
    BillParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Template file not found: {0}")]
    TemplateNotFound(PathBuf),

    /// Any failure between substitution and the finished document.
    /// The cause is logged, not carried.
    #[error("PDF generation failed")]
    GenerationFailed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BillError>;

/// Failures inside the render pipeline. Never returned to callers of
/// `BillRenderer`; they are logged and collapsed into `GenerationFailed`.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("rendering surface produced no drawable content")]
    EmptySurface,

    #[error("margins leave no valid content area on a {0:.1}pt surface")]
    NoContentWidth(f32),

    #[error("surface failed: {0}")]
    Surface(String),

    #[error("failed to encode PDF: {0}")]
    Encode(#[from] lopdf::Error),

    #[error("failed to serialize PDF: {0}")]
    Write(String),
}
