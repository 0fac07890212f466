//! Diagnostic collection with nested path context and stable fingerprints.
//!
//! Rules report findings through a shared [`DiagnosticCollector`]. The
//! collector keeps an ordered log and a stack of context names (document,
//! part, symbol, ...) that it joins into a path for every finding. Each
//! diagnostic can compute a short fingerprint that stays stable across runs
//! on an unchanged document, which is what makes suppression lists work.

use std::collections::HashSet;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::panic::Location;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Severity of a finding. Orders from least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "Info"),
            Severity::Warning => write!(f, "Warning"),
            Severity::Error => write!(f, "Error"),
        }
    }
}

/// One recorded finding. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Context names joined with `:`, ending with the subject if one was given.
    pub path: String,
    pub message: String,
    pub level: Severity,
    /// Position in the collector's log at the time of recording.
    pub index: usize,
    pub excused: bool,
    /// Source note (`file.rs:line` of the recording call site).
    pub context: String,
    /// Findings that a suppression list must not be allowed to silence.
    pub inexcusable: bool,
}

fn path_prefix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Trims an embedded filesystem path down to its last component so the
    // same finding fingerprints identically across machines and checkouts.
    RE.get_or_init(|| Regex::new("[^:].*/").expect("hardcoded regex"))
}

impl Diagnostic {
    /// The canonical one-line rendering used for fingerprinting.
    pub fn render_message(&self) -> String {
        format!("{}: {} -- {}", self.level, self.path, self.message)
    }

    /// Stable 32-bit fingerprint as an 8-hex-digit uppercase string.
    ///
    /// CRC-32 of the rendered message with embedded filesystem paths
    /// trimmed. 32 bits is a deliberate compatibility choice: previously
    /// approved findings hash with this exact function, and collisions
    /// between unrelated findings are an accepted risk.
    pub fn fingerprint(&self) -> String {
        let rendered = self.render_message();
        let message = path_prefix_regex().replace_all(&rendered, "");
        let crc = crc32fast::hash(message.as_bytes());
        format!("{:08X}", (crc as i32).unsigned_abs())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}:{})",
            self.render_message(),
            self.context,
            self.fingerprint()
        )
    }
}

/// Ordered log of diagnostics plus the current context-path stack.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    path: Vec<String>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_path(&mut self, name: impl Into<String>) {
        self.path.push(name.into());
    }

    pub fn pop_path(&mut self) {
        self.path.pop();
    }

    /// Push a context name and get a guard that pops it again on drop.
    ///
    /// The guard derefs to the collector, so nested rule code records
    /// through it directly. Balancing is guaranteed on every exit path,
    /// including early returns and `?`.
    pub fn nest(&mut self, name: impl Into<String>) -> PathScope<'_> {
        self.push_path(name);
        PathScope { collector: self }
    }

    /// Append a diagnostic under the current path.
    ///
    /// `subject` is joined onto the path when given; `context` is a free-form
    /// source note carried along for display but excluded from fingerprints.
    pub fn record(
        &mut self,
        subject: Option<&str>,
        message: impl Into<String>,
        level: Severity,
        context: impl Into<String>,
        inexcusable: bool,
    ) {
        let joined = self.path.join(":");
        let path = match subject {
            Some(name) => format!("{}:{}", joined, name),
            None => joined,
        };
        let index = self.diagnostics.len();
        self.diagnostics.push(Diagnostic {
            path,
            message: message.into(),
            level,
            index,
            excused: false,
            context: context.into(),
            inexcusable,
        });
    }

    #[track_caller]
    pub fn record_error(
        &mut self,
        subject: Option<&str>,
        message: impl Into<String>,
        inexcusable: bool,
    ) {
        let note = source_note(Location::caller());
        self.record(subject, message, Severity::Error, note, inexcusable);
    }

    #[track_caller]
    pub fn record_warning(
        &mut self,
        subject: Option<&str>,
        message: impl Into<String>,
        inexcusable: bool,
    ) {
        let note = source_note(Location::caller());
        self.record(subject, message, Severity::Warning, note, inexcusable);
    }

    #[track_caller]
    pub fn record_info(&mut self, subject: Option<&str>, message: impl Into<String>) {
        let note = source_note(Location::caller());
        self.record(subject, message, Severity::Info, note, false);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Count of diagnostics at exactly `level`.
    pub fn count_at(&self, level: Severity) -> usize {
        self.diagnostics.iter().filter(|d| d.level == level).count()
    }

    /// Remove every diagnostic whose fingerprint is in the approved set.
    ///
    /// The survivors keep their original order and recorded indices. This
    /// removes approved findings unconditionally; shielding `inexcusable`
    /// findings from suppression is the caller's policy, applied by pruning
    /// the approved set first.
    pub fn filter_by_fingerprint(&mut self, approved: &HashSet<String>) {
        self.diagnostics
            .retain(|d| !approved.contains(&d.fingerprint()));
    }
}

fn source_note(location: &Location<'_>) -> String {
    let file = location.file();
    let file = file.rsplit('/').next().unwrap_or(file);
    format!("{}:{}", file, location.line())
}

/// Scope guard returned by [`DiagnosticCollector::nest`].
pub struct PathScope<'a> {
    collector: &'a mut DiagnosticCollector,
}

impl Deref for PathScope<'_> {
    type Target = DiagnosticCollector;

    fn deref(&self) -> &Self::Target {
        self.collector
    }
}

impl DerefMut for PathScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.collector
    }
}

impl Drop for PathScope<'_> {
    fn drop(&mut self) {
        self.collector.pop_path();
    }
}
