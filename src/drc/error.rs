//! Recoverable DRC errors
//!
//! Contract violations (unregistered points, empty polygons) are not here;
//! they panic at the call site.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DrcError {
    /// Settings failed validation
    #[error("Invalid DRC settings: {reason}")]
    InvalidSettings { reason: String },

    /// Settings or board snapshot JSON could not be parsed
    #[error("Failed to parse {what}: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A feature or net refers to a net the snapshot does not define
    #[error("Unknown net '{net}' referenced by '{referrer}'")]
    UnknownNet { net: String, referrer: String },

    /// A connection refers to an anchor its net does not define
    #[error("Unknown anchor '{anchor}' in net '{net}'")]
    UnknownAnchor { net: String, anchor: String },

    /// A feature's layer span is empty or outside the board's copper layers
    #[error("Feature '{feature}' spans layers {start}..={end} but the board has {layer_count}")]
    InvalidLayerSpan {
        feature: String,
        start: usize,
        end: usize,
        layer_count: usize,
    },

    /// An anchor or feature has coordinates beyond the supported range
    #[error("Coordinates of '{referrer}' exceed the supported range")]
    CoordinateOutOfRange { referrer: String },

    /// Two features or anchors share one identity
    #[error("Duplicate identifier '{0}'")]
    DuplicateId(String),

    /// The worker pool for a run could not be created
    #[error("Failed to build worker pool: {reason}")]
    ThreadPool { reason: String },

    #[error("Verification run was cancelled")]
    Cancelled,

    #[error("Verification worker thread panicked")]
    WorkerPanicked,
}

pub type Result<T> = std::result::Result<T, DrcError>;
