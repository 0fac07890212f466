//! DesignLint - EDA schematic, board, and library style checking
//!
//! This library is the rule-checking core for electronic design documents:
//! style and consistency checks over schematics, board layouts, and parts
//! libraries, built from a connectivity pattern matcher, grid alignment
//! analysis, and a diagnostic collector whose stable fingerprints let known
//! issues be excused without suppressing new ones.
//!
//! # Quick Start
//!
//! ```
//! use designlint::{CheckEngine, CheckOptions, DesignSet, DiagnosticCollector, Schematic};
//!
//! let mut design = DesignSet::new().with_schematic(Schematic::new("blinky"));
//! let mut collector = DiagnosticCollector::new();
//! let engine = CheckEngine::with_default_modules();
//! engine
//!     .check(&mut design, &mut collector, false, &CheckOptions::default())
//!     .unwrap();
//!
//! for diagnostic in collector.diagnostics() {
//!     println!("{}", diagnostic);
//! }
//! ```
//!
//! # Features
//!
//! - **Schematic checks**: supply symbol orientation, naming, net routing
//!   and alignment, library drift
//! - **Board checks**: routing, placement grids, outline, silkscreen labels
//! - **Library checks**: symbol, package, and deviceset style
//! - **Pattern matching**: declarative part-pin-net connectivity queries
//! - **Fix mode**: mechanical problems are repaired in place instead of
//!   reported

pub mod connectivity;
pub mod diagnostics;
pub mod document;
pub mod engine;
pub mod geometry;
pub mod grid;
pub mod options;
pub mod pattern;
pub mod report;
pub mod rules;

// Re-export main types
pub use diagnostics::{Diagnostic, DiagnosticCollector, Severity};
pub use document::{Board, DesignSet, Library, Schematic};
pub use engine::{CheckContext, CheckEngine, CheckError, CheckModule};
pub use options::CheckOptions;
pub use pattern::{NetLink, PartLink, Pattern, PatternError, PatternMatcher, PinLink};
pub use report::{RunReport, RunStats};

/// Run the default check modules over a design set (convenience wrapper).
pub fn check_design(
    design: &mut DesignSet,
    options: &CheckOptions,
) -> Result<DiagnosticCollector, CheckError> {
    let mut collector = DiagnosticCollector::new();
    CheckEngine::with_default_modules().check(design, &mut collector, false, options)?;
    Ok(collector)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        CheckEngine, CheckError, CheckModule, CheckOptions, DesignSet, Diagnostic,
        DiagnosticCollector, Severity,
    };
}
