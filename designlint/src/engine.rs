//! Check orchestration: modules, shared context, and the engine that runs
//! them in order.

use std::sync::Arc;

use thiserror::Error;

use crate::diagnostics::DiagnosticCollector;
use crate::document::{Board, DesignSet, Library, Schematic};
use crate::options::CheckOptions;
use crate::pattern::PatternError;
use crate::rules::{BoardRules, LibraryRules, SchematicRules};

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Pattern matching failed: {0}")]
    Pattern(#[from] PatternError),
    #[error("{0}")]
    Module(String),
}

/// Everything a check module gets to work with.
///
/// `libraries` is the authoritative set loaded from library files; the
/// schematic and board carry their own embedded copies for the consistency
/// checks to compare against. Modules that need a document the context does
/// not hold skip themselves.
pub struct CheckContext<'a> {
    pub schematic: Option<&'a mut Schematic>,
    pub board: Option<&'a mut Board>,
    pub libraries: &'a mut [Library],
    pub collector: &'a mut DiagnosticCollector,
    /// Apply automatic corrections instead of reporting the fixable
    /// findings.
    pub fix: bool,
    pub options: &'a CheckOptions,
}

/// One family of checks. Implementations must be stateless; everything a
/// run needs arrives through the context.
pub trait CheckModule: Send + Sync {
    /// Stable machine-readable identifier.
    fn id(&self) -> &str;

    /// Human-readable one-liner.
    fn name(&self) -> &str;

    fn run(&self, ctx: &mut CheckContext<'_>) -> Result<(), CheckError>;
}

/// Runs check modules in registration order against one shared context.
pub struct CheckEngine {
    modules: Vec<Arc<dyn CheckModule>>,
}

impl CheckEngine {
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Engine with the stock module set: libraries first, then the board,
    /// then the schematic.
    pub fn with_default_modules() -> Self {
        let mut engine = Self::new();
        engine.add_module(Arc::new(LibraryRules));
        engine.add_module(Arc::new(BoardRules));
        engine.add_module(Arc::new(SchematicRules));
        engine
    }

    pub fn add_module(&mut self, module: Arc<dyn CheckModule>) {
        self.modules.push(module);
    }

    pub fn modules(&self) -> &[Arc<dyn CheckModule>] {
        &self.modules
    }

    pub fn run(&self, ctx: &mut CheckContext<'_>) -> Result<(), CheckError> {
        for module in &self.modules {
            tracing::debug!("Running check module '{}'", module.id());
            module.run(ctx)?;
        }
        Ok(())
    }

    /// Run every module against a design set, collecting into `collector`.
    pub fn check(
        &self,
        design: &mut DesignSet,
        collector: &mut DiagnosticCollector,
        fix: bool,
        options: &CheckOptions,
    ) -> Result<(), CheckError> {
        let mut ctx = CheckContext {
            schematic: design.schematic.as_mut(),
            board: design.board.as_mut(),
            libraries: &mut design.libraries,
            collector,
            fix,
            options,
        };
        self.run(&mut ctx)
    }
}

impl Default for CheckEngine {
    fn default() -> Self {
        Self::with_default_modules()
    }
}
