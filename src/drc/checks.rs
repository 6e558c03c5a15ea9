//! Rule checks
//!
//! Each check reads one immutable [`BoardSnapshot`] and produces messages.
//! Checks share no state, so a run may execute them in any order and on
//! any thread.

use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;
use tracing::debug;

use super::board::{BoardSnapshot, CopperFeature, Net};
use super::messages::RuleCheckMessage;
use super::settings::DrcSettings;
use crate::connectivity::{AirWireBuilder, PointId};
use crate::geometry::{BoundingBox, Coord, ShapeArena, ShapeEntry, ShapeIndex};

pub trait Check: Send + Sync {
    /// Short name used in status events and logs
    fn name(&self) -> &'static str;

    fn run(&self, board: &BoardSnapshot, settings: &DrcSettings) -> Vec<RuleCheckMessage>;
}

/// One message per airwire of every net
pub struct MissingConnectionCheck;

impl MissingConnectionCheck {
    fn check_net(net_name: &str, net: &Net, settings: &DrcSettings) -> Vec<RuleCheckMessage> {
        let mut builder = AirWireBuilder::new();
        let mut ids: HashMap<&str, PointId> = HashMap::with_capacity(net.anchors.len());
        for anchor in &net.anchors {
            ids.insert(anchor.id.as_str(), builder.add_point(anchor.position));
        }
        for (a, b) in &net.connections {
            if let (Some(&a), Some(&b)) = (ids.get(a.as_str()), ids.get(b.as_str())) {
                builder.add_edge(a, b);
            }
        }

        let airwires = builder.build_air_wires();
        debug!(net = net_name, anchors = net.anchors.len(), airwires = airwires.len(), "checked net");
        airwires
            .into_iter()
            .map(|(a, b)| {
                RuleCheckMessage::missing_connection(settings, net_name, &net.anchors[a.0], &net.anchors[b.0])
            })
            .collect()
    }
}

impl Check for MissingConnectionCheck {
    fn name(&self) -> &'static str {
        "missing connections"
    }

    fn run(&self, board: &BoardSnapshot, settings: &DrcSettings) -> Vec<RuleCheckMessage> {
        board
            .nets
            .par_iter()
            .flat_map_iter(|(name, net)| Self::check_net(name, net, settings))
            .collect()
    }
}

/// A pair of features violating clearance on one layer
struct LayerViolation {
    a: usize,
    b: usize,
    layer: usize,
    clearance: Coord,
    location: BoundingBox,
}

/// Copper to copper clearance between features of different nets, per layer
pub struct CopperClearanceCheck;

impl CopperClearanceCheck {
    /// Clearance required between two features
    fn required_clearance(a: &CopperFeature, b: &CopperFeature, settings: &DrcSettings) -> Coord {
        settings
            .min_copper_clearance
            .max(a.clearance.unwrap_or(0))
            .max(b.clearance.unwrap_or(0))
    }

    fn check_layer(board: &BoardSnapshot, layer: usize, settings: &DrcSettings) -> Vec<LayerViolation> {
        let mut arena = ShapeArena::new();
        let mut max_clearance = settings.min_copper_clearance;
        for (i, feature) in board.features.iter().enumerate() {
            if feature.layers.contains(layer) {
                arena.push(ShapeEntry::new(feature.shape.clone(), i));
                max_clearance = max_clearance.max(feature.clearance.unwrap_or(0));
            }
        }
        let index = ShapeIndex::with_all(&arena);
        let search = settings.effective_clearance(max_clearance);

        let mut violations = Vec::new();
        for (_, entry) in arena.iter() {
            let a = &board.features[entry.owner];
            for m in index.query(&entry.shape, search, true) {
                // Each unordered pair once
                if m.entry.owner <= entry.owner {
                    continue;
                }
                let b = &board.features[m.entry.owner];
                if !a.needs_clearance_to(b) {
                    continue;
                }
                let clearance = Self::required_clearance(a, b, settings);
                let effective = settings.effective_clearance(clearance);
                let Some(distance) = m.distance else { continue };
                if distance >= effective as f64 {
                    continue;
                }
                let reach_a = entry.shape.bounding_box(effective);
                let location = reach_a
                    .intersection(m.entry.bbox())
                    .unwrap_or_else(|| reach_a.merge(m.entry.bbox()));
                violations.push(LayerViolation {
                    a: entry.owner,
                    b: m.entry.owner,
                    layer,
                    clearance,
                    location,
                });
            }
        }
        debug!(
            layer = board.layer_name(layer),
            features = arena.len(),
            violations = violations.len(),
            "checked copper layer"
        );
        violations
    }
}

impl Check for CopperClearanceCheck {
    fn name(&self) -> &'static str {
        "copper clearance"
    }

    fn run(&self, board: &BoardSnapshot, settings: &DrcSettings) -> Vec<RuleCheckMessage> {
        let start = Instant::now();
        let per_layer: Vec<Vec<LayerViolation>> = (0..board.copper_layers.len())
            .into_par_iter()
            .map(|layer| Self::check_layer(board, layer, settings))
            .collect();

        // One message per pair, listing every layer it violates on
        let mut pairs: BTreeMap<(usize, usize), (Vec<usize>, Coord, BoundingBox)> = BTreeMap::new();
        for v in per_layer.into_iter().flatten() {
            pairs
                .entry((v.a, v.b))
                .and_modify(|(layers, _, location)| {
                    layers.push(v.layer);
                    *location = location.merge(&v.location);
                })
                .or_insert((vec![v.layer], v.clearance, v.location));
        }

        let messages: Vec<RuleCheckMessage> = pairs
            .into_iter()
            .map(|((a, b), (layers, clearance, location))| {
                let names: Vec<&str> = layers.iter().map(|&l| board.layer_name(l)).collect();
                RuleCheckMessage::copper_clearance(
                    settings,
                    &board.features[a],
                    &board.features[b],
                    &names,
                    clearance,
                    location,
                )
            })
            .collect();
        debug!(
            features = board.features.len(),
            violations = messages.len(),
            elapsed = ?start.elapsed(),
            "copper clearance done"
        );
        messages
    }
}

/// Checks enabled by the settings, in a fixed order
pub fn default_checks(settings: &DrcSettings) -> Vec<Box<dyn Check>> {
    let mut checks: Vec<Box<dyn Check>> = Vec::new();
    if settings.check_missing_connections {
        checks.push(Box::new(MissingConnectionCheck));
    }
    if settings.check_copper_clearance {
        checks.push(Box::new(CopperClearanceCheck));
    }
    checks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drc::board::{Anchor, FeatureKind, LayerSpan};
    use crate::geometry::{Circle, Point, Segment};

    fn trace(id: &str, net: &str, layer: usize, y: i64) -> CopperFeature {
        CopperFeature::new(
            id,
            FeatureKind::Trace,
            LayerSpan::single(layer),
            Segment::new(Point::new(0, y), Point::new(1_000_000, y), 200_000).into(),
        )
        .with_net(net)
    }

    fn board_with_nets(nets: &[&str]) -> BoardSnapshot {
        let mut board = BoardSnapshot::new(&["Top", "Bottom"]);
        for net in nets {
            board.net_mut(net);
        }
        board
    }

    #[test]
    fn test_missing_connection_messages() {
        let mut board = board_with_nets(&["GND"]);
        board
            .net_mut("GND")
            .add_anchor(Anchor::pad("p1", "R1", "1", Point::new(0, 0)))
            .add_anchor(Anchor::pad("p2", "R2", "1", Point::new(1_000_000, 0)))
            .add_anchor(Anchor::junction("j1", Point::new(5_000_000, 0)))
            .connect("p2", "j1");

        let messages = MissingConnectionCheck.run(&board, &DrcSettings::default());
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message, "Missing connection in 'GND': 'R1:1' ↔ 'R2:1'");
    }

    #[test]
    fn test_clearance_between_different_nets() {
        let mut board = board_with_nets(&["A", "B"]);
        // 150um gap between copper edges, below the 200um default
        board.add_feature(trace("t1", "A", 0, 0));
        board.add_feature(trace("t2", "B", 0, 350_000));
        // Same distance but same net: ignored
        board.add_feature(trace("t3", "A", 0, -350_000));

        let messages = CopperClearanceCheck.run(&board, &DrcSettings::default());
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message, "Clearance on 'Top': 'A' trace ↔ 'B' trace < 0.2 mm");
    }

    #[test]
    fn test_exact_clearance_is_not_a_violation() {
        let mut board = board_with_nets(&["A", "B"]);
        board.add_feature(trace("t1", "A", 0, 0));
        board.add_feature(trace("t2", "B", 0, 400_000));
        assert!(CopperClearanceCheck.run(&board, &DrcSettings::default()).is_empty());
    }

    #[test]
    fn test_feature_clearance_overrides_minimum() {
        let mut board = board_with_nets(&["A", "B"]);
        board.add_feature(trace("t1", "A", 0, 0));
        board.add_feature(trace("t2", "B", 0, 600_000).with_clearance(500_000));
        let messages = CopperClearanceCheck.run(&board, &DrcSettings::default());
        assert_eq!(messages.len(), 1);
        assert!(messages[0].message.ends_with("< 0.5 mm"));
    }

    #[test]
    fn test_via_on_both_layers_yields_one_message() {
        let mut board = board_with_nets(&["A", "B"]);
        board.add_feature(
            CopperFeature::new(
                "v1",
                FeatureKind::Via,
                LayerSpan::new(0, 1),
                Circle::new(Point::new(0, 0), 300_000).into(),
            )
            .with_net("A"),
        );
        board.add_feature(
            CopperFeature::new(
                "v2",
                FeatureKind::Via,
                LayerSpan::new(0, 1),
                Circle::new(Point::new(700_000, 0), 300_000).into(),
            )
            .with_net("B"),
        );
        let messages = CopperClearanceCheck.run(&board, &DrcSettings::default());
        assert_eq!(messages.len(), 1);
        assert!(messages[0].message.starts_with("Clearance on 2 layers"));
    }

    #[test]
    fn test_default_checks_follow_toggles() {
        let mut settings = DrcSettings::default();
        assert_eq!(default_checks(&settings).len(), 2);
        settings.check_copper_clearance = false;
        let checks = default_checks(&settings);
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].name(), "missing connections");
    }
}
