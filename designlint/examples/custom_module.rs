//! Example: extending the engine with a project-specific check module.
//!
//! Run with: cargo run --example custom_module
//!
//! The module below uses the pattern matcher to demand a 100n decoupling
//! capacitor on each configured supply rail. Register it on
//! `CheckEngine::with_default_modules()` instead of `CheckEngine::new()` to
//! run it alongside the stock checks.

use std::sync::Arc;

use designlint::document::{Net, Part, Schematic};
use designlint::engine::CheckContext;
use designlint::pattern::{NetLink, PartLink, Pattern, PatternMatcher, PinLink};
use designlint::prelude::*;

struct DecouplingRules {
    rails: Vec<String>,
}

impl DecouplingRules {
    fn new<I, S>(rails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rails: rails.into_iter().map(Into::into).collect(),
        }
    }
}

impl CheckModule for DecouplingRules {
    fn id(&self) -> &str {
        "decoupling"
    }

    fn name(&self) -> &str {
        "Supply rails need a decoupling capacitor"
    }

    fn run(&self, ctx: &mut CheckContext<'_>) -> Result<(), CheckError> {
        let Some(schematic) = ctx.schematic.as_deref() else {
            return Ok(());
        };
        let mut scope = ctx.collector.nest(schematic.name.clone());
        let matcher = PatternMatcher::new(schematic);
        for rail in &self.rails {
            let pattern = Pattern::new()
                .net(NetLink::named(rail.clone()))
                .pin(PinLink::any())
                .part(PartLink::any().with_devicesets(["C-EU"]).with_values(["100n"]));
            if matcher.find(&pattern)?.is_empty() {
                scope.record_warning(
                    None,
                    format!("Supply net {} has no 100n decoupling capacitor.", rail),
                    false,
                );
            }
        }
        Ok(())
    }
}

fn demo_schematic() -> Schematic {
    let mut schematic = Schematic::new("sensor.sch");
    schematic.add_part(Part::new("U1").with_deviceset("MCU"));
    schematic.add_part(Part::new("C1").with_deviceset("C-EU").with_value("100n"));
    schematic.add_net(Net::new("VCC").with_pinref("U1", "VCC").with_pinref("C1", "1"));
    schematic.add_net(Net::new("AVCC").with_pinref("U1", "AVCC"));
    schematic
}

fn main() -> Result<(), CheckError> {
    let mut engine = CheckEngine::new();
    engine.add_module(Arc::new(DecouplingRules::new(["VCC", "AVCC"])));

    let mut design = DesignSet::new().with_schematic(demo_schematic());
    let mut collector = DiagnosticCollector::new();
    engine.check(&mut design, &mut collector, false, &CheckOptions::default())?;

    println!("Findings from the {} module:", engine.modules()[0].id());
    for diagnostic in collector.diagnostics() {
        println!("  {}", diagnostic);
    }
    Ok(())
}
