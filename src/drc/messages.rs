//! Rule check messages and their content-addressed approvals
//!
//! An [`Approval`] is a small tree of named nodes built only from the rule
//! id and the stable identities of the offending entities. Entity nodes are
//! sorted before they are attached, so the same violation found in a
//! different order yields the same approval.

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::{self, Write as _};

use super::board::{Anchor, AnchorKind, CopperFeature, FeatureKind};
use super::settings::DrcSettings;
use crate::geometry::{BoundingBox, Coord, Rect, Segment, Shape};

pub const RULE_MISSING_CONNECTION: &str = "missing_connection";
pub const RULE_COPPER_CLEARANCE: &str = "copper_clearance_violation";

/// Width of the obround marking a missing connection, in millimeters
const AIRWIRE_MARKER_WIDTH_MM: f64 = 0.05;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Hint,
    Warning,
    Error,
}

/// One node of an approval tree
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApprovalNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ApprovalNode>,
}

impl ApprovalNode {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), value: None, children: Vec::new() }
    }

    pub fn leaf(name: &str, value: &str) -> Self {
        Self { name: name.to_string(), value: Some(value.to_string()), children: Vec::new() }
    }

    pub fn with_child(mut self, child: ApprovalNode) -> Self {
        self.children.push(child);
        self
    }

    fn write_canonical(&self, out: &mut String) {
        out.push('(');
        out.push_str(&self.name);
        if let Some(value) = &self.value {
            out.push(' ');
            write_quoted(out, value);
        }
        for child in &self.children {
            out.push(' ');
            child.write_canonical(out);
        }
        out.push(')');
    }
}

fn write_quoted(out: &mut String, value: &str) {
    out.push('"');
    for c in value.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('"');
}

/// Content-derived identity of one violation
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Approval(ApprovalNode);

impl Approval {
    pub fn new(rule_id: &str) -> Self {
        Self(ApprovalNode::leaf("approved", rule_id))
    }

    pub fn with_child(self, child: ApprovalNode) -> Self {
        Self(self.0.with_child(child))
    }

    /// Attach two entity nodes in canonical order. The nodes are renamed
    /// after sorting, so the names follow the order, not the input.
    pub fn with_sorted_pair(self, first: ApprovalNode, second: ApprovalNode, names: [&str; 2]) -> Self {
        let (mut lo, mut hi) = if second < first { (second, first) } else { (first, second) };
        lo.name = names[0].to_string();
        hi.name = names[1].to_string();
        self.with_child(lo).with_child(hi)
    }

    pub fn rule_id(&self) -> &str {
        self.0.value.as_deref().unwrap_or_default()
    }

    pub fn root(&self) -> &ApprovalNode {
        &self.0
    }

    /// Canonical text, e.g. `(approved "missing_connection" (from ...) (to ...))`
    pub fn key(&self) -> String {
        let mut out = String::new();
        self.0.write_canonical(&mut out);
        out
    }

    /// Short fixed-length form of [`Approval::key`]: URL-safe base64 of its SHA-256
    pub fn digest(&self) -> String {
        let hash = Sha256::digest(self.key().as_bytes());
        general_purpose::URL_SAFE_NO_PAD.encode(hash)
    }
}

impl fmt::Display for Approval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// One finding of a rule check
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleCheckMessage {
    pub severity: Severity,
    pub rule_id: String,
    pub message: String,
    pub description: String,
    /// Where to highlight the finding on the board
    pub locations: Vec<Shape>,
    pub approval: Approval,
    #[serde(default)]
    pub approved: bool,
}

fn anchor_node(anchor: &Anchor) -> ApprovalNode {
    match &anchor.kind {
        // Pad names repeat within a footprint, the id does not
        AnchorKind::Pad { device, pad } => ApprovalNode::new("anchor")
            .with_child(ApprovalNode::leaf("device", device))
            .with_child(ApprovalNode::leaf("pad", pad))
            .with_child(ApprovalNode::leaf("id", &anchor.id)),
        AnchorKind::Via => ApprovalNode::new("anchor").with_child(ApprovalNode::leaf("via", &anchor.id)),
        AnchorKind::Junction => {
            ApprovalNode::new("anchor").with_child(ApprovalNode::leaf("junction", &anchor.id))
        }
    }
}

fn feature_node(feature: &CopperFeature) -> ApprovalNode {
    let node = ApprovalNode::new("object");
    match &feature.kind {
        FeatureKind::Pad { device, pad } => node
            .with_child(ApprovalNode::leaf("device", device))
            .with_child(ApprovalNode::leaf("pad", pad))
            .with_child(ApprovalNode::leaf("id", &feature.id)),
        FeatureKind::Via => node.with_child(ApprovalNode::leaf("via", &feature.id)),
        FeatureKind::Trace => node.with_child(ApprovalNode::leaf("trace", &feature.id)),
        FeatureKind::Plane => node.with_child(ApprovalNode::leaf("plane", &feature.id)),
        FeatureKind::Polygon => node.with_child(ApprovalNode::leaf("polygon", &feature.id)),
    }
}

impl RuleCheckMessage {
    /// Airwire between two anchors of `net`
    pub fn missing_connection(settings: &DrcSettings, net: &str, from: &Anchor, to: &Anchor) -> Self {
        let marker_width = (AIRWIRE_MARKER_WIDTH_MM * settings.units_per_mm as f64).round() as Coord;
        let approval = Approval::new(RULE_MISSING_CONNECTION)
            .with_child(ApprovalNode::leaf("net", net))
            .with_sorted_pair(anchor_node(from), anchor_node(to), ["from", "to"]);
        Self {
            severity: Severity::Error,
            rule_id: RULE_MISSING_CONNECTION.to_string(),
            message: format!(
                "Missing connection in '{}': {} ↔ {}",
                net,
                from.display_name(),
                to.display_name()
            ),
            description: "There is a missing connection in the net, i.e. not all net items are \
                          connected together.\n\nAdd traces and/or planes to create the missing \
                          connections."
                .to_string(),
            locations: vec![Segment::new(from.position, to.position, marker_width).into()],
            approval,
            approved: false,
        }
    }

    /// Two copper features closer than `clearance` on the given layers
    pub fn copper_clearance(
        settings: &DrcSettings,
        a: &CopperFeature,
        b: &CopperFeature,
        layer_names: &[&str],
        clearance: Coord,
        location: BoundingBox,
    ) -> Self {
        let on = match layer_names {
            [single] => format!("'{}'", single),
            _ => format!("{} layers", layer_names.len()),
        };
        let approval = Approval::new(RULE_COPPER_CLEARANCE).with_sorted_pair(
            feature_node(a),
            feature_node(b),
            ["object", "object"],
        );
        Self {
            severity: Severity::Error,
            rule_id: RULE_COPPER_CLEARANCE.to_string(),
            message: format!(
                "Clearance on {}: {} ↔ {} < {} mm",
                on,
                a.display_name(),
                b.display_name(),
                settings.to_mm_string(clearance)
            ),
            description: "The clearance between two copper objects of different nets is smaller \
                          than the minimum copper clearance configured in the DRC settings.\n\n\
                          Check the DRC settings and move the objects to increase their clearance \
                          if needed."
                .to_string(),
            locations: vec![Rect::new(location.min, location.max - location.min).into()],
            approval,
            approved: false,
        }
    }
}

/// Render messages as one line each, for logs and debugging
pub fn summarize(messages: &[RuleCheckMessage]) -> String {
    let mut out = String::new();
    for m in messages {
        let mark = if m.approved { "approved" } else { "open" };
        let _ = writeln!(out, "[{:?}] {} ({})", m.severity, m.message, mark);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drc::board::LayerSpan;
    use crate::geometry::{Circle, Point};

    fn pad(device: &str, pad: &str) -> Anchor {
        Anchor::pad(&format!("{}-{}", device, pad), device, pad, Point::new(0, 0))
    }

    fn via_feature(id: &str, net: &str) -> CopperFeature {
        CopperFeature::new(id, FeatureKind::Via, LayerSpan::single(0), Circle::new(Point::new(0, 0), 10).into())
            .with_net(net)
    }

    #[test]
    fn test_missing_connection_is_order_independent() {
        let settings = DrcSettings::default();
        let a = pad("R1", "1");
        let b = Anchor::via("v7", Point::new(1_000_000, 0));
        let ab = RuleCheckMessage::missing_connection(&settings, "GND", &a, &b);
        let ba = RuleCheckMessage::missing_connection(&settings, "GND", &b, &a);
        assert_eq!(ab.approval, ba.approval);
        assert_eq!(ab.approval.key(), ba.approval.key());
        assert_eq!(ab.message, "Missing connection in 'GND': 'R1:1' ↔ Via");
        assert_eq!(ab.approval.rule_id(), RULE_MISSING_CONNECTION);
    }

    #[test]
    fn test_distinct_violations_have_distinct_keys() {
        let settings = DrcSettings::default();
        let a = pad("R1", "1");
        let b = pad("R1", "2");
        let c = pad("R2", "1");
        let keys = [
            RuleCheckMessage::missing_connection(&settings, "GND", &a, &b).approval.key(),
            RuleCheckMessage::missing_connection(&settings, "GND", &a, &c).approval.key(),
            RuleCheckMessage::missing_connection(&settings, "VCC", &a, &b).approval.key(),
        ];
        assert_ne!(keys[0], keys[1]);
        assert_ne!(keys[0], keys[2]);
        assert_ne!(keys[1], keys[2]);
    }

    #[test]
    fn test_repeated_pad_names_have_distinct_keys() {
        let settings = DrcSettings::default();
        let tab = Anchor::pad("U1-tab", "U1", "2", Point::new(0, 0));
        let pin = Anchor::pad("U1-pin2", "U1", "2", Point::new(10_000_000, 0));
        let via = Anchor::via("v1", Point::new(5_000_000, 0));
        let a = RuleCheckMessage::missing_connection(&settings, "GND", &tab, &via);
        let b = RuleCheckMessage::missing_connection(&settings, "GND", &pin, &via);
        assert_ne!(a.approval, b.approval);
        assert_eq!(a.message, b.message);

        let pad_feature = |id: &str| {
            CopperFeature::new(
                id,
                FeatureKind::Pad { device: "U1".to_string(), pad: "2".to_string() },
                LayerSpan::single(0),
                Circle::new(Point::new(0, 0), 10).into(),
            )
            .with_net("GND")
        };
        let trace = via_feature("t1", "VCC");
        let bbox = BoundingBox::new(Point::new(0, 0), Point::new(10, 10));
        let c = RuleCheckMessage::copper_clearance(&settings, &pad_feature("p1"), &trace, &["Top"], 200_000, bbox);
        let d = RuleCheckMessage::copper_clearance(&settings, &pad_feature("p2"), &trace, &["Top"], 200_000, bbox);
        assert_ne!(c.approval.key(), d.approval.key());
    }

    #[test]
    fn test_key_escapes_quotes() {
        let approval = Approval::new("x").with_child(ApprovalNode::leaf("device", "a\"b"));
        assert_eq!(approval.key(), r#"(approved "x" (device "a\"b"))"#);
    }

    #[test]
    fn test_digest_is_stable_and_url_safe() {
        let approval = Approval::new(RULE_COPPER_CLEARANCE);
        let digest = approval.digest();
        assert_eq!(digest, approval.clone().digest());
        assert_eq!(digest.len(), 43);
        assert!(digest.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_clearance_message_text() {
        let settings = DrcSettings::default();
        let a = via_feature("v1", "GND");
        let b = via_feature("v2", "VCC");
        let bbox = BoundingBox::new(Point::new(0, 0), Point::new(10, 10));
        let single = RuleCheckMessage::copper_clearance(&settings, &a, &b, &["Top"], 200_000, bbox);
        assert_eq!(single.message, "Clearance on 'Top': 'GND' via ↔ 'VCC' via < 0.2 mm");
        let multi = RuleCheckMessage::copper_clearance(&settings, &b, &a, &["Top", "Bottom"], 200_000, bbox);
        assert_eq!(multi.message, "Clearance on 2 layers: 'VCC' via ↔ 'GND' via < 0.2 mm");
        assert_eq!(single.approval, multi.approval);
    }

    #[test]
    fn test_approval_json_roundtrip_preserves_key() {
        let settings = DrcSettings::default();
        let msg = RuleCheckMessage::missing_connection(&settings, "N1", &pad("U1", "3"), &pad("U2", "4"));
        let json = serde_json::to_string(&msg.approval).unwrap();
        let back: Approval = serde_json::from_str(&json).unwrap();
        assert_eq!(back.key(), msg.approval.key());
    }
}
