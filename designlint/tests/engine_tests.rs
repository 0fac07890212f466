//! Engine-level behavior: registering project-specific modules, document
//! gating, file round trips, and run reports built from real check output.

use std::sync::Arc;

use designlint::document::{Net, Package, Part, Schematic, Signal, Symbol, SymbolPin, Text, Wire};
use designlint::engine::CheckContext;
use designlint::prelude::*;
use designlint::{Board, Library, RunReport};

/// House-style module used by the tests: net names must be all caps.
struct NetCaseRules;

impl CheckModule for NetCaseRules {
    fn id(&self) -> &str {
        "net_case"
    }

    fn name(&self) -> &str {
        "Net names must be uppercase"
    }

    fn run(&self, ctx: &mut CheckContext<'_>) -> Result<(), CheckError> {
        let Some(schematic) = ctx.schematic.as_deref() else {
            return Ok(());
        };
        let mut scope = ctx.collector.nest(schematic.name.clone());
        for net in &schematic.nets {
            if net.name.chars().any(|c| c.is_ascii_lowercase()) {
                scope.record_warning(
                    None,
                    format!("Net {} should be named in capital letters.", net.name),
                    false,
                );
            }
        }
        Ok(())
    }
}

struct ExplodingRules;

impl CheckModule for ExplodingRules {
    fn id(&self) -> &str {
        "exploding"
    }

    fn name(&self) -> &str {
        "Always fails"
    }

    fn run(&self, _ctx: &mut CheckContext<'_>) -> Result<(), CheckError> {
        Err(CheckError::Module("exploding: nothing to check".to_string()))
    }
}

fn lowercase_net_schematic() -> Schematic {
    let mut schematic = Schematic::new("amp.sch");
    schematic.add_net(Net::new("data"));
    schematic.add_net(Net::new("CLK"));
    schematic
}

/// A small design with one deterministic defect per document kind.
fn sample_design() -> DesignSet {
    let mut library = Library::new("parts");
    library.add_symbol(
        Symbol::new("HDR")
            .with_pin(SymbolPin::new("P$1", 0.0, 0.0))
            .with_text(Text::new(">NAME").with_layer("Names")),
    );

    let mut schematic = Schematic::new("amp.sch");
    schematic.add_part(Part::new("R1").with_library("parts").with_position(0.3, 0.0));

    let mut board = Board::new("amp.brd");
    board.add_signal(
        Signal::new("OUT")
            .with_wire(Wire::new(0.0, 0.0, 4.0, 0.0).with_width(0.0).with_layer("Unrouted")),
    );

    let mut design = DesignSet::new().with_schematic(schematic).with_board(board);
    design.add_library(library);
    design
}

fn has_message(collector: &DiagnosticCollector, needle: &str) -> bool {
    collector.diagnostics().iter().any(|d| d.message.contains(needle))
}

#[test]
fn test_custom_module_sees_the_shared_context() {
    let mut engine = CheckEngine::new();
    engine.add_module(Arc::new(NetCaseRules));

    let mut design = DesignSet::new().with_schematic(lowercase_net_schematic());
    let mut collector = DiagnosticCollector::new();
    engine
        .check(&mut design, &mut collector, false, &CheckOptions::default())
        .expect("check");

    assert_eq!(collector.len(), 1);
    let d = &collector.diagnostics()[0];
    assert_eq!(d.message, "Net data should be named in capital letters.");
    assert_eq!(d.path, "amp.sch");

    // Without a schematic the module has nothing to say.
    let mut design = DesignSet::new();
    let mut collector = DiagnosticCollector::new();
    engine
        .check(&mut design, &mut collector, false, &CheckOptions::default())
        .expect("check");
    assert!(collector.is_empty());
}

#[test]
fn test_added_module_runs_after_the_stock_set() {
    let mut engine = CheckEngine::with_default_modules();
    engine.add_module(Arc::new(NetCaseRules));
    let ids: Vec<&str> = engine.modules().iter().map(|m| m.id()).collect();
    assert_eq!(
        ids,
        vec!["library_style", "board_style", "schematic_style", "net_case"]
    );

    let mut design = DesignSet::new().with_schematic(lowercase_net_schematic());
    let mut collector = DiagnosticCollector::new();
    engine
        .check(&mut design, &mut collector, false, &CheckOptions::default())
        .expect("check");
    let last = collector.diagnostics().last().expect("diagnostics");
    assert_eq!(last.message, "Net data should be named in capital letters.");
}

#[test]
fn test_check_design_convenience_runs_default_modules() {
    let mut library = Library::new("parts");
    library.add_package(
        Package::new("BARE")
            .with_wire(Wire::new(0.0, 0.0, 2.0, 0.0).with_layer("tKeepout").with_width(0.2)),
    );
    let mut design = DesignSet::new();
    design.add_library(library);

    let collector =
        designlint::check_design(&mut design, &CheckOptions::default()).expect("check");
    assert!(has_message(&collector, "Examined parts"));
    assert!(has_message(&collector, "Package is missing '>NAME'"));
    assert!(has_message(&collector, "Nothing in tPlace"));
    assert_eq!(collector.count_at(Severity::Error), 1);
}

#[test]
fn test_failing_module_keeps_earlier_diagnostics() {
    let mut engine = CheckEngine::with_default_modules();
    engine.add_module(Arc::new(ExplodingRules));

    let mut design = sample_design();
    let mut collector = DiagnosticCollector::new();
    let err = engine
        .check(&mut design, &mut collector, false, &CheckOptions::default())
        .unwrap_err();
    assert!(matches!(err, CheckError::Module(_)));
    assert_eq!(err.to_string(), "exploding: nothing to check");
    // Everything the stock modules recorded before the failure survives.
    assert!(has_message(&collector, "Examined parts"));
    assert!(has_message(&collector, "unrouted"));
}

#[test]
fn test_design_set_round_trips_through_a_file() {
    let design = sample_design();
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("amp.design.json");
    std::fs::write(&path, serde_json::to_string_pretty(&design).expect("serialize"))
        .expect("write design");

    let text = std::fs::read_to_string(&path).expect("read design");
    let reloaded: DesignSet = serde_json::from_str(&text).expect("deserialize");
    assert_eq!(reloaded, design);

    // The reloaded design checks identically to the in-memory one.
    let mut original = design;
    let mut reloaded = reloaded;
    let first = designlint::check_design(&mut original, &CheckOptions::default()).expect("check");
    let second =
        designlint::check_design(&mut reloaded, &CheckOptions::default()).expect("check");
    let first_messages: Vec<&str> =
        first.diagnostics().iter().map(|d| d.message.as_str()).collect();
    let second_messages: Vec<&str> =
        second.diagnostics().iter().map(|d| d.message.as_str()).collect();
    assert_eq!(first_messages, second_messages);
}

#[test]
fn test_run_report_from_engine_output() {
    let mut design = sample_design();
    let collector =
        designlint::check_design(&mut design, &CheckOptions::default()).expect("check");
    let errors = collector.count_at(Severity::Error);
    let warnings = collector.count_at(Severity::Warning);
    let infos = collector.count_at(Severity::Info);

    let report = RunReport::new(collector.into_diagnostics());
    assert_eq!(report.stats.errors, errors);
    assert_eq!(report.stats.warnings, warnings);
    assert_eq!(report.stats.infos, infos);
    assert!(report.has_errors());

    let json = serde_json::to_string_pretty(&report).expect("serialize");
    let back: RunReport = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, report);
}
