//! Board snapshot: the read-only input of one verification run
//!
//! Nets carry the connectivity anchors (pads, vias, trace junctions) and the
//! connections already routed between them. Copper features carry the
//! shapes checked for clearance, each on an inclusive range of copper
//! layers.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::error::{DrcError, Result};
use crate::geometry::{Coord, Point, Shape};

/// Inclusive range of copper layer indices, top layer first
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerSpan {
    pub start: usize,
    pub end: usize,
}

impl LayerSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(layer: usize) -> Self {
        Self::new(layer, layer)
    }

    pub fn contains(&self, layer: usize) -> bool {
        layer >= self.start && layer <= self.end
    }

    pub fn layers(&self) -> impl Iterator<Item = usize> {
        self.start..=self.end
    }
}

/// What a connectivity anchor is
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnchorKind {
    Pad { device: String, pad: String },
    Via,
    Junction,
}

/// A point of a net that must end up connected to the rest of the net
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub id: String,
    pub position: Point,
    #[serde(flatten)]
    pub kind: AnchorKind,
}

impl Anchor {
    pub fn pad(id: &str, device: &str, pad: &str, position: Point) -> Self {
        let kind = AnchorKind::Pad { device: device.to_string(), pad: pad.to_string() };
        Self { id: id.to_string(), position, kind }
    }

    pub fn via(id: &str, position: Point) -> Self {
        Self { id: id.to_string(), position, kind: AnchorKind::Via }
    }

    pub fn junction(id: &str, position: Point) -> Self {
        Self { id: id.to_string(), position, kind: AnchorKind::Junction }
    }

    /// Display name, e.g. `'R1:1'`, `Via` or `Trace`
    pub fn display_name(&self) -> String {
        match &self.kind {
            AnchorKind::Pad { device, pad } => format!("'{}:{}'", device, pad),
            AnchorKind::Via => "Via".to_string(),
            AnchorKind::Junction => "Trace".to_string(),
        }
    }
}

/// One electrical net
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Net {
    #[serde(default)]
    pub anchors: Vec<Anchor>,
    /// Already-routed connections, as pairs of anchor ids
    #[serde(default)]
    pub connections: Vec<(String, String)>,
}

impl Net {
    pub fn add_anchor(&mut self, anchor: Anchor) -> &mut Self {
        self.anchors.push(anchor);
        self
    }

    pub fn connect(&mut self, a: &str, b: &str) -> &mut Self {
        self.connections.push((a.to_string(), b.to_string()));
        self
    }
}

/// What a copper feature is, for naming and approvals
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureKind {
    Pad { device: String, pad: String },
    Via,
    Trace,
    Plane,
    Polygon,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CopperFeature {
    pub id: String,
    #[serde(flatten)]
    pub kind: FeatureKind,
    #[serde(default)]
    pub net: Option<String>,
    pub layers: LayerSpan,
    /// Feature-specific clearance, if stricter than the board minimum
    #[serde(default)]
    pub clearance: Option<Coord>,
    pub shape: Shape,
}

impl CopperFeature {
    pub fn new(id: &str, kind: FeatureKind, layers: LayerSpan, shape: Shape) -> Self {
        Self { id: id.to_string(), kind, net: None, layers, clearance: None, shape }
    }

    pub fn with_net(mut self, net: &str) -> Self {
        self.net = Some(net.to_string());
        self
    }

    pub fn with_clearance(mut self, clearance: Coord) -> Self {
        self.clearance = Some(clearance);
        self
    }

    /// Display name, e.g. `'GND' trace` or `'R1:1'`
    pub fn display_name(&self) -> String {
        let what = match &self.kind {
            FeatureKind::Pad { device, pad } => return format!("'{}:{}'", device, pad),
            FeatureKind::Via => "via",
            FeatureKind::Trace => "trace",
            FeatureKind::Plane => "plane",
            FeatureKind::Polygon => "polygon",
        };
        match &self.net {
            Some(net) => format!("'{}' {}", net, what),
            None => what.to_string(),
        }
    }

    /// Whether two features must keep clearance from each other
    pub fn needs_clearance_to(&self, other: &CopperFeature) -> bool {
        match (&self.net, &other.net) {
            (Some(a), Some(b)) => a != b,
            _ => true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    /// Copper layer names, top to bottom
    pub copper_layers: Vec<String>,
    #[serde(default)]
    pub nets: IndexMap<String, Net>,
    #[serde(default)]
    pub features: Vec<CopperFeature>,
}

impl BoardSnapshot {
    pub fn new(copper_layers: &[&str]) -> Self {
        Self {
            copper_layers: copper_layers.iter().map(|l| l.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Parse and validate a snapshot from JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        let board: Self = serde_json::from_str(json)
            .map_err(|source| DrcError::Parse { what: "board snapshot", source })?;
        board.validate()?;
        Ok(board)
    }

    /// Net by name, created empty if missing
    pub fn net_mut(&mut self, name: &str) -> &mut Net {
        self.nets.entry(name.to_string()).or_default()
    }

    pub fn add_feature(&mut self, feature: CopperFeature) -> &mut Self {
        self.features.push(feature);
        self
    }

    pub fn layer_name(&self, layer: usize) -> &str {
        self.copper_layers.get(layer).map(String::as_str).unwrap_or("?")
    }

    /// Check every cross reference the checks rely on
    pub fn validate(&self) -> Result<()> {
        for (net_name, net) in &self.nets {
            let mut ids = HashSet::new();
            for anchor in &net.anchors {
                if !ids.insert(anchor.id.as_str()) {
                    return Err(DrcError::DuplicateId(anchor.id.clone()));
                }
                if !anchor.position.in_range() {
                    return Err(DrcError::CoordinateOutOfRange { referrer: anchor.id.clone() });
                }
            }
            for (a, b) in &net.connections {
                for id in [a, b] {
                    if !ids.contains(id.as_str()) {
                        return Err(DrcError::UnknownAnchor {
                            net: net_name.clone(),
                            anchor: id.clone(),
                        });
                    }
                }
            }
        }

        let mut ids = HashSet::new();
        for feature in &self.features {
            if !ids.insert(feature.id.as_str()) {
                return Err(DrcError::DuplicateId(feature.id.clone()));
            }
            if !feature.shape.in_range() {
                return Err(DrcError::CoordinateOutOfRange { referrer: feature.id.clone() });
            }
            if let Some(net) = &feature.net {
                if !self.nets.contains_key(net) {
                    return Err(DrcError::UnknownNet {
                        net: net.clone(),
                        referrer: feature.id.clone(),
                    });
                }
            }
            let span = feature.layers;
            if span.start > span.end || span.end >= self.copper_layers.len() {
                return Err(DrcError::InvalidLayerSpan {
                    feature: feature.id.clone(),
                    start: span.start,
                    end: span.end,
                    layer_count: self.copper_layers.len(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Circle, Segment, MAX_COORD};

    fn via(id: &str, net: &str, layers: LayerSpan) -> CopperFeature {
        CopperFeature::new(id, FeatureKind::Via, layers, Circle::new(Point::new(0, 0), 300_000).into())
            .with_net(net)
    }

    #[test]
    fn test_display_names() {
        let pad = Anchor::pad("a1", "R1", "1", Point::new(0, 0));
        assert_eq!(pad.display_name(), "'R1:1'");
        assert_eq!(Anchor::via("v1", Point::new(0, 0)).display_name(), "Via");
        assert_eq!(Anchor::junction("j1", Point::new(0, 0)).display_name(), "Trace");

        let trace = CopperFeature::new(
            "t1",
            FeatureKind::Trace,
            LayerSpan::single(0),
            Segment::new(Point::new(0, 0), Point::new(10, 0), 5).into(),
        );
        assert_eq!(trace.display_name(), "trace");
        assert_eq!(trace.with_net("GND").display_name(), "'GND' trace");
    }

    #[test]
    fn test_validate_rejects_bad_references() {
        let mut board = BoardSnapshot::new(&["Top", "Bottom"]);
        board.net_mut("GND").add_anchor(Anchor::via("v1", Point::new(0, 0)));
        assert!(board.validate().is_ok());

        board.net_mut("GND").connect("v1", "missing");
        assert!(matches!(board.validate(), Err(DrcError::UnknownAnchor { .. })));
        board.net_mut("GND").connections.clear();

        board.add_feature(via("via1", "VCC", LayerSpan::new(0, 1)));
        assert!(matches!(board.validate(), Err(DrcError::UnknownNet { .. })));
        board.features[0].net = Some("GND".to_string());
        assert!(board.validate().is_ok());

        board.add_feature(via("via2", "GND", LayerSpan::new(0, 2)));
        assert!(matches!(board.validate(), Err(DrcError::InvalidLayerSpan { layer_count: 2, .. })));
        board.features[1].layers = LayerSpan::single(1);
        board.features[1].id = "via1".to_string();
        assert!(matches!(board.validate(), Err(DrcError::DuplicateId(_))));
    }

    #[test]
    fn test_validate_rejects_out_of_range_coordinates() {
        let mut board = BoardSnapshot::new(&["Top"]);
        board.net_mut("GND").add_anchor(Anchor::via("v1", Point::new(i64::MAX, 0)));
        assert!(matches!(
            board.validate(),
            Err(DrcError::CoordinateOutOfRange { referrer }) if referrer == "v1"
        ));

        let mut board = BoardSnapshot::new(&["Top"]);
        board.net_mut("GND");
        board.add_feature(
            CopperFeature::new(
                "t1",
                FeatureKind::Trace,
                LayerSpan::single(0),
                Segment::new(Point::new(0, 0), Point::new(i64::MIN, 0), 100).into(),
            )
            .with_net("GND"),
        );
        assert!(matches!(board.validate(), Err(DrcError::CoordinateOutOfRange { .. })));

        board.features[0].shape = Segment::new(Point::new(0, 0), Point::new(-MAX_COORD, 0), 100).into();
        assert!(board.validate().is_ok());
    }

    #[test]
    fn test_parse_snapshot_json() {
        let json = r#"{
            "copper_layers": ["Top", "Bottom"],
            "nets": {
                "GND": {
                    "anchors": [
                        {"id": "p1", "position": {"x": 0, "y": 0}, "kind": "pad", "device": "R1", "pad": "2"},
                        {"id": "v1", "position": {"x": 1000, "y": 0}, "kind": "via"}
                    ],
                    "connections": [["p1", "v1"]]
                }
            },
            "features": [
                {
                    "id": "t1", "kind": "trace", "net": "GND",
                    "layers": {"start": 0, "end": 0},
                    "shape": {"type": "segment", "a": {"x": 0, "y": 0}, "b": {"x": 1000, "y": 0}, "width": 200}
                }
            ]
        }"#;
        let board = BoardSnapshot::from_json_str(json).unwrap();
        assert_eq!(board.nets["GND"].anchors[0].display_name(), "'R1:2'");
        assert_eq!(board.features[0].display_name(), "'GND' trace");
        assert!(board.features[0].layers.contains(0));
    }
}
