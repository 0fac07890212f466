//! Tests for connectivity pattern matching over a realistic schematic

use designlint::diagnostics::{DiagnosticCollector, Severity};
use designlint::document::{Net, Part};
use designlint::pattern::{NetLink, PartLink, Pattern, PatternError, PatternMatcher, PinLink};
use designlint::Schematic;

/// A small non-inverting amplifier: an opamp, a feedback divider, a
/// decoupling cap, and supply symbols.
fn amplifier() -> Schematic {
    let mut schematic = Schematic::new("amplifier");
    schematic.add_part(Part::new("U1").with_deviceset("OPAMP").with_device("-SO8"));
    schematic.add_part(
        Part::new("R1")
            .with_deviceset("R-EU")
            .with_device("-0805")
            .with_value("10k"),
    );
    schematic.add_part(
        Part::new("R2")
            .with_deviceset("R-EU")
            .with_device("-0805")
            .with_value("1k"),
    );
    schematic.add_part(Part::new("C1").with_deviceset("C-EU").with_value("100n"));
    schematic.add_part(Part::new("SUPPLY1").with_deviceset("GND"));
    schematic.add_part(Part::new("SUPPLY2").with_deviceset("VCC"));

    schematic.add_net(Net::new("IN").with_pinref("U1", "+IN").with_pinref("R1", "1"));
    schematic.add_net(Net::new("OUT").with_pinref("U1", "OUT").with_pinref("R2", "2"));
    schematic.add_net(
        Net::new("FB")
            .with_pinref("U1", "-IN")
            .with_pinref("R1", "2")
            .with_pinref("R2", "1"),
    );
    schematic.add_net(
        Net::new("VCC").with_pinref("SUPPLY2", "VCC").with_pinref("U1", "V+"),
    );
    schematic.add_net(
        Net::new("GND")
            .with_pinref("SUPPLY1", "GND")
            .with_pinref("U1", "V-")
            .with_pinref("C1", "2"),
    );
    schematic
}

fn path_names<'a>(path: &'a [designlint::pattern::PathNode<'a>]) -> Vec<&'a str> {
    path.iter().map(|n| n.name()).collect()
}

#[test]
fn test_every_pinref_of_a_part_is_a_solution() {
    let schematic = amplifier();
    let matcher = PatternMatcher::new(&schematic);
    let pattern = Pattern::new()
        .part(PartLink::named(["U1"]))
        .pin(PinLink::any())
        .net(NetLink::any());
    let found = matcher.find(&pattern).expect("pattern should be well formed");
    // U1 connects through five pins: +IN, OUT, -IN, V+, V-.
    assert_eq!(found.len(), 5);
    let nets: Vec<&str> = found.iter().map(|p| p[1].name()).collect();
    assert_eq!(nets, vec!["IN", "OUT", "FB", "VCC", "GND"]);
}

#[test]
fn test_pin_names_restrict_the_first_hop() {
    let schematic = amplifier();
    let matcher = PatternMatcher::new(&schematic);
    let pattern = Pattern::new()
        .part(PartLink::named(["U1"]))
        .pin(PinLink::named(["+IN", "-IN"]))
        .net(NetLink::any());
    let found = matcher.find(&pattern).expect("pattern should be well formed");
    let nets: Vec<&str> = found.iter().map(|p| p[1].name()).collect();
    assert_eq!(nets, vec!["IN", "FB"]);
}

#[test]
fn test_two_hop_walk_excludes_the_arrival_part() {
    let schematic = amplifier();
    let matcher = PatternMatcher::new(&schematic);
    let pattern = Pattern::new()
        .part(PartLink::named(["R1"]))
        .pin(PinLink::any())
        .net(NetLink::any())
        .pin(PinLink::any())
        .part(PartLink::any());
    let found = matcher.find(&pattern).expect("pattern should be well formed");
    let endpoints: Vec<Vec<&str>> = found.iter().map(|p| path_names(p)).collect();
    // R1 reaches U1 through IN, and both U1 and R2 through FB. R1 itself is
    // never an endpoint.
    assert_eq!(
        endpoints,
        vec![
            vec!["R1", "IN", "U1"],
            vec!["R1", "FB", "U1"],
            vec!["R1", "FB", "R2"],
        ]
    );
}

#[test]
fn test_continuing_hop_visits_each_net_once() {
    let mut schematic = amplifier();
    // A snubber cap with both pins on GND.
    schematic.add_part(Part::new("C2").with_deviceset("C-EU"));
    if let Some(net) = schematic.nets.iter_mut().find(|n| n.name == "GND") {
        net.segments[0].pinrefs.push(designlint::document::PinRef {
            part: "C2".to_string(),
            pin: "1".to_string(),
        });
        net.segments[0].pinrefs.push(designlint::document::PinRef {
            part: "C2".to_string(),
            pin: "2".to_string(),
        });
    }
    let matcher = PatternMatcher::new(&schematic);
    let pattern = Pattern::new()
        .part(PartLink::named(["C2"]))
        .pin(PinLink::any())
        .net(NetLink::any())
        .pin(PinLink::any())
        .part(PartLink::any());
    let found = matcher.find(&pattern).expect("pattern should be well formed");
    // GND is entered once even though C2 touches it twice, and C2 is
    // excluded from the partners.
    let endpoints: Vec<&str> = found.iter().map(|p| p[2].name()).collect();
    assert_eq!(endpoints, vec!["SUPPLY1", "U1", "C1"]);
}

#[test]
fn test_value_filter_is_case_insensitive() {
    let schematic = amplifier();
    let matcher = PatternMatcher::new(&schematic);
    let found = matcher
        .find(&Pattern::new().part(PartLink::any().with_values(["10K"])))
        .expect("pattern should be well formed");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0][0].name(), "R1");
}

#[test]
fn test_net_seeded_pattern_counts_attached_pins() {
    let schematic = amplifier();
    let matcher = PatternMatcher::new(&schematic);
    let pattern = Pattern::new()
        .net(NetLink::named("GND"))
        .pin(PinLink::any())
        .part(PartLink::any());
    let found = matcher.find(&pattern).expect("pattern should be well formed");
    let parts: Vec<&str> = found.iter().map(|p| p[1].name()).collect();
    assert_eq!(parts, vec!["SUPPLY1", "U1", "C1"]);
}

#[test]
fn test_find_one_reports_all_candidates() {
    let schematic = amplifier();
    let matcher = PatternMatcher::new(&schematic);
    let err = matcher
        .find_one(&Pattern::new().part(PartLink::any().with_devicesets(["R-EU"])))
        .unwrap_err();
    match err {
        PatternError::AmbiguousMatch { found, ref paths, .. } => {
            assert_eq!(found, 2);
            assert!(paths.contains("R1"));
            assert!(paths.contains("R2"));
        }
        other => panic!("expected AmbiguousMatch, got {other}"),
    }
}

#[test]
fn test_expect_one_returns_anchors_on_success() {
    let schematic = amplifier();
    let matcher = PatternMatcher::new(&schematic);
    let mut collector = DiagnosticCollector::new();
    let pattern = Pattern::new()
        .part(PartLink::named(["R1"]))
        .pin(PinLink::any())
        .net(NetLink::named("IN"));
    let anchors = matcher
        .expect_one(&pattern, &mut collector, Severity::Error, "R1 must drive IN")
        .expect("pattern should be well formed");
    assert!(collector.is_empty());
    assert_eq!(anchors.len(), 2);
    assert_eq!(anchors[0].unwrap().name(), "R1");
    assert_eq!(anchors[1].unwrap().name(), "IN");
}

#[test]
fn test_expect_one_records_and_yields_placeholders_on_failure() {
    let schematic = amplifier();
    let matcher = PatternMatcher::new(&schematic);
    let mut collector = DiagnosticCollector::new();
    let pattern = Pattern::new()
        .part(PartLink::named(["C1"]))
        .pin(PinLink::any())
        .net(NetLink::named("VCC"));
    let anchors = matcher
        .expect_one(&pattern, &mut collector, Severity::Warning, "C1 should decouple VCC")
        .expect("pattern should be well formed");
    assert_eq!(anchors.len(), 2);
    assert!(anchors.iter().all(|a| a.is_none()));
    assert_eq!(collector.len(), 1);
    let diagnostic = &collector.diagnostics()[0];
    assert_eq!(diagnostic.level, Severity::Warning);
    assert!(diagnostic.message.starts_with("C1 should decouple VCC"));
    assert!(diagnostic.message.contains("Found 0 matching paths, but should have found 1."));
}

#[test]
fn test_expect_none_names_the_offending_path() {
    let schematic = amplifier();
    let matcher = PatternMatcher::new(&schematic);
    let mut collector = DiagnosticCollector::new();
    let pattern = Pattern::new()
        .part(PartLink::named(["U1"]))
        .pin(PinLink::named(["OUT"]))
        .net(NetLink::named("OUT"));
    matcher
        .expect_none(&pattern, &mut collector, Severity::Error, "Output must not be driven:")
        .expect("pattern should be well formed");
    assert_eq!(collector.len(), 1);
    assert!(collector.diagnostics()[0].message.contains("found U1:OUT"));
}

#[test]
fn test_pin_cannot_lead_a_pattern() {
    let schematic = amplifier();
    let matcher = PatternMatcher::new(&schematic);
    let err = matcher
        .find(&Pattern::new().pin(PinLink::any()).net(NetLink::any()))
        .unwrap_err();
    assert!(matches!(err, PatternError::BadLeadingLink(_)));
}

#[test]
fn test_chain_ending_mid_hop_is_rejected_up_front() {
    let schematic = amplifier();
    let matcher = PatternMatcher::new(&schematic);
    // The net spec matches nothing in this schematic; the dangling pin
    // link must still be diagnosed rather than yielding zero solutions.
    let pattern = Pattern::new()
        .part(PartLink::any())
        .pin(PinLink::any())
        .net(NetLink::named("ABSENT"))
        .pin(PinLink::any());
    let err = matcher.find(&pattern).unwrap_err();
    assert!(matches!(err, PatternError::Malformed(_)));
}

#[test]
fn test_dangling_links_past_a_dead_hop_are_rejected() {
    let schematic = amplifier();
    let matcher = PatternMatcher::new(&schematic);
    // The first full hop is well formed but walks nowhere, so only an
    // up-front grammar check can see the trailing pin link.
    let pattern = Pattern::new()
        .part(PartLink::named(["R1"]))
        .pin(PinLink::any())
        .net(NetLink::named("ABSENT"))
        .pin(PinLink::any())
        .part(PartLink::any())
        .pin(PinLink::any());
    let err = matcher.find(&pattern).unwrap_err();
    assert!(matches!(err, PatternError::Malformed(_)));
}

#[test]
fn test_consecutive_anchors_of_one_kind_are_rejected() {
    let schematic = amplifier();
    let matcher = PatternMatcher::new(&schematic);
    let pattern = Pattern::new()
        .part(PartLink::any())
        .pin(PinLink::any())
        .part(PartLink::any());
    let err = matcher.find(&pattern).unwrap_err();
    assert!(matches!(err, PatternError::Malformed(_)));
}

#[test]
fn test_pattern_rendering_for_messages() {
    let pattern = Pattern::new()
        .part(PartLink::named(["U1"]))
        .pin(PinLink::any())
        .net(NetLink::named("VCC"));
    assert_eq!(pattern.to_string(), "Part(U1) Pin(??) Net(VCC)");
}
