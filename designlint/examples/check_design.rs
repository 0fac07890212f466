//! Check a design set and print every finding.
//!
//! Run with: cargo run --example check_design [path/to/design.json]
//! Without an argument a small built-in demonstration design is checked.

use designlint::document::{Element, Part, Schematic, Signal, Symbol, SymbolPin, Text, Wire};
use designlint::prelude::*;
use designlint::{Board, Library};

fn demo_design() -> DesignSet {
    let mut library = Library::new("connectors");
    library.add_symbol(
        Symbol::new("HDR-2")
            .with_pin(SymbolPin::new("P$1", 0.0, 0.0))
            .with_pin(SymbolPin::new("P$2", 0.0, -2.54))
            .with_text(Text::new(">NAME").with_layer("Names")),
    );

    let mut schematic = Schematic::new("demo.sch");
    schematic.add_part(Part::new("J1").with_library("connectors").with_position(0.3, 0.0));

    let mut board = Board::new("demo.brd");
    board.add_element(Element::new("J1").with_library("connectors"));
    board.add_signal(
        Signal::new("D+")
            .with_wire(Wire::new(0.0, 0.0, 6.0, 0.0).with_width(0.0).with_layer("Unrouted")),
    );

    let mut design = DesignSet::new().with_schematic(schematic).with_board(board);
    design.add_library(library);
    design
}

fn main() -> Result<(), CheckError> {
    let mut design = match std::env::args().nth(1) {
        Some(path) => {
            let text = match std::fs::read_to_string(&path) {
                Ok(text) => text,
                Err(err) => {
                    eprintln!("Can't read {}: {}", path, err);
                    eprintln!("Usage: cargo run --example check_design [path/to/design.json]");
                    std::process::exit(1);
                }
            };
            match serde_json::from_str(&text) {
                Ok(design) => design,
                Err(err) => {
                    eprintln!("Can't parse {}: {}", path, err);
                    std::process::exit(1);
                }
            }
        }
        None => demo_design(),
    };

    let collector = designlint::check_design(&mut design, &CheckOptions::default())?;

    for diagnostic in collector.diagnostics() {
        println!("{}", diagnostic);
    }
    println!();
    println!(
        "{} errors, {} warnings, {} infos",
        collector.count_at(Severity::Error),
        collector.count_at(Severity::Warning),
        collector.count_at(Severity::Info)
    );

    if collector.count_at(Severity::Error) > 0 {
        std::process::exit(1);
    }
    Ok(())
}
