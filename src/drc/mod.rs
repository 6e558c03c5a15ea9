//! Design Rule Check (DRC) orchestration
//!
//! Runs a catalog of independent checks over one immutable board snapshot
//! and reports content-addressed messages. Checks run in parallel on a
//! rayon pool; the set of messages is the same for any thread count.
//!
//! # Submodules
//! - `error` - Recoverable errors
//! - `settings` - Clearances, tolerances and check toggles
//! - `board` - Board snapshot input model (nets, anchors, copper features)
//! - `messages` - Messages, severities and approvals
//! - `approvals` - Suppression of reviewed messages
//! - `checks` - Missing connection and copper clearance checks
//! - `runners` - Inline and background runs with progress and cancellation

mod error;
mod settings;
mod board;
mod messages;
mod approvals;
mod checks;
mod runners;

pub use error::{DrcError, Result};
pub use settings::DrcSettings;
pub use board::{Anchor, AnchorKind, BoardSnapshot, CopperFeature, FeatureKind, LayerSpan, Net};
pub use messages::{
    summarize, Approval, ApprovalNode, RuleCheckMessage, Severity, RULE_COPPER_CLEARANCE,
    RULE_MISSING_CONNECTION,
};
pub use approvals::ApprovalSet;
pub use checks::{default_checks, Check, CopperClearanceCheck, MissingConnectionCheck};
pub use runners::{DesignRuleCheck, DrcReport, RunEvent, RunHandle};
