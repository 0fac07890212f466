//! Backtracking pattern matching over part/pin/net connectivity.
//!
//! A [`Pattern`] is an alternating chain of link specs describing a walk
//! through the schematic: `Part Pin Net Pin Part ...`. The matcher seeds on
//! every part or net accepted by the first link and extends each partial
//! path hop by hop, backtracking on dead ends. A solution records the
//! anchors only (the parts and nets), not the pins traversed between them.
//!
//! Rules mostly use the convenience drivers: [`PatternMatcher::find_one`]
//! and [`PatternMatcher::find_none`] turn a wrong match count into an error,
//! while [`PatternMatcher::expect_one`] and [`PatternMatcher::expect_none`]
//! record a diagnostic instead and let the rule continue with placeholder
//! results.

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

use crate::connectivity::ConnectivityGraph;
use crate::diagnostics::{DiagnosticCollector, Severity};
use crate::document::{Net, Part, Schematic};

/// Failures of the matching machinery itself, as opposed to findings about
/// the design, which go through the diagnostic collector.
#[derive(Debug, Error)]
pub enum PatternError {
    /// The first link must describe a part or a net; pins cannot seed a walk.
    #[error("patterns must start with a part or net spec: {0}")]
    BadLeadingLink(String),

    /// The chain does not alternate part/pin/net or ends mid-hop.
    #[error("could not process pattern {0}")]
    Malformed(String),

    /// `find_one` found a match count other than one.
    #[error("wanted one match, got {found}: {pattern} {paths}")]
    AmbiguousMatch {
        found: usize,
        pattern: String,
        paths: String,
    },

    /// `find_none` found at least one match.
    #[error("too many matches: {pattern} {paths}")]
    UnexpectedMatch { pattern: String, paths: String },
}

/// Spec for one pin hop. All populated constraints must hold at once.
pub struct PinLink {
    names: Option<Vec<String>>,
    select: Option<Box<dyn Fn(&str) -> bool>>,
    description: Option<String>,
}

impl PinLink {
    /// Matches any pin.
    pub fn any() -> Self {
        Self {
            names: None,
            select: None,
            description: None,
        }
    }

    /// Matches pins whose name is in the set, case-sensitively.
    pub fn named<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: Some(names.into_iter().map(Into::into).collect()),
            select: None,
            description: None,
        }
    }

    pub fn with_select(mut self, select: impl Fn(&str) -> bool + 'static) -> Self {
        self.select = Some(Box::new(select));
        self
    }

    /// Label shown for a predicate when the link is rendered.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn matches(&self, pin: &str) -> bool {
        self.names
            .as_ref()
            .map_or(true, |names| names.iter().any(|n| n == pin))
            && self.select.as_ref().map_or(true, |f| f(pin))
    }

    fn spec_string(&self) -> String {
        if let Some(names) = &self.names {
            names.join("|")
        } else if self.select.is_some() {
            self.description.clone().unwrap_or_else(|| "custom".to_string())
        } else {
            "??".to_string()
        }
    }
}

impl fmt::Display for PinLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pin({})", self.spec_string())
    }
}

impl fmt::Debug for PinLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// Spec for a part anchor. All populated constraints must hold at once;
/// within one name list, any entry may match.
pub struct PartLink {
    names: Option<Vec<String>>,
    devicesets: Option<Vec<String>>,
    devices: Option<Vec<String>>,
    longnames: Option<Vec<String>>,
    values: Option<Vec<String>>,
    select: Option<Box<dyn Fn(&Part) -> bool>>,
    description: Option<String>,
}

impl PartLink {
    /// Matches any part.
    pub fn any() -> Self {
        Self {
            names: None,
            devicesets: None,
            devices: None,
            longnames: None,
            values: None,
            select: None,
            description: None,
        }
    }

    /// Matches parts whose name is in the set.
    pub fn named<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: Some(names.into_iter().map(Into::into).collect()),
            ..Self::any()
        }
    }

    /// Matches exactly this part, by name.
    pub fn exactly(part: &Part) -> Self {
        Self::named([part.name.clone()])
    }

    pub fn with_devicesets<I, S>(mut self, devicesets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.devicesets = Some(devicesets.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_devices<I, S>(mut self, devices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.devices = Some(devices.into_iter().map(Into::into).collect());
        self
    }

    /// Deviceset and device names run together, e.g. `RESISTOR-0805`.
    pub fn with_longnames<I, S>(mut self, longnames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.longnames = Some(longnames.into_iter().map(Into::into).collect());
        self
    }

    /// Matches against the part value, case-insensitively. Parts with no
    /// value set never match a value constraint.
    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_select(mut self, select: impl Fn(&Part) -> bool + 'static) -> Self {
        self.select = Some(Box::new(select));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn matches(&self, part: &Part) -> bool {
        let name_ok = self
            .names
            .as_ref()
            .map_or(true, |names| names.iter().any(|n| *n == part.name));
        let deviceset_ok = self
            .devicesets
            .as_ref()
            .map_or(true, |sets| sets.iter().any(|d| *d == part.deviceset));
        let device_ok = self
            .devices
            .as_ref()
            .map_or(true, |devs| devs.iter().any(|d| *d == part.device));
        let longname_ok = self.longnames.as_ref().map_or(true, |longs| {
            let long = part.long_name();
            longs.iter().any(|l| *l == long)
        });
        let value_ok = self.values.as_ref().map_or(true, |values| {
            match part.value.as_deref() {
                Some(v) if !v.is_empty() => values.iter().any(|x| x.eq_ignore_ascii_case(v)),
                _ => false,
            }
        });
        let select_ok = self.select.as_ref().map_or(true, |f| f(part));
        name_ok && deviceset_ok && device_ok && longname_ok && value_ok && select_ok
    }

    fn spec_string(&self) -> String {
        if let Some(names) = &self.names {
            names.join("|")
        } else if let Some(devicesets) = &self.devicesets {
            devicesets.join("|")
        } else if let Some(devices) = &self.devices {
            devices.join("|")
        } else if let Some(longnames) = &self.longnames {
            longnames.join("|")
        } else if self.select.is_some() || self.values.is_some() {
            self.description.clone().unwrap_or_else(|| "custom".to_string())
        } else {
            "??".to_string()
        }
    }
}

impl fmt::Display for PartLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Part({})", self.spec_string())
    }
}

impl fmt::Debug for PartLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// Spec for a net anchor.
pub struct NetLink {
    name: Option<String>,
    select: Option<Box<dyn Fn(&Net) -> bool>>,
    description: Option<String>,
}

impl NetLink {
    /// Matches any net.
    pub fn any() -> Self {
        Self {
            name: None,
            select: None,
            description: None,
        }
    }

    /// Matches the net with exactly this name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            select: None,
            description: None,
        }
    }

    /// Matches exactly this net, by name.
    pub fn exactly(net: &Net) -> Self {
        Self::named(net.name.clone())
    }

    pub fn with_select(mut self, select: impl Fn(&Net) -> bool + 'static) -> Self {
        self.select = Some(Box::new(select));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn matches(&self, net: &Net) -> bool {
        self.name.as_ref().map_or(true, |n| *n == net.name)
            && self.select.as_ref().map_or(true, |f| f(net))
    }

    fn spec_string(&self) -> String {
        if let Some(name) = &self.name {
            name.clone()
        } else if self.select.is_some() {
            self.description.clone().unwrap_or_else(|| "custom".to_string())
        } else {
            "??".to_string()
        }
    }
}

impl fmt::Display for NetLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Net({})", self.spec_string())
    }
}

impl fmt::Debug for NetLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// One link of a pattern chain.
#[derive(Debug)]
pub enum Link {
    Part(PartLink),
    Pin(PinLink),
    Net(NetLink),
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Link::Part(link) => link.fmt(f),
            Link::Pin(link) => link.fmt(f),
            Link::Net(link) => link.fmt(f),
        }
    }
}

impl From<PartLink> for Link {
    fn from(link: PartLink) -> Self {
        Link::Part(link)
    }
}

impl From<PinLink> for Link {
    fn from(link: PinLink) -> Self {
        Link::Pin(link)
    }
}

impl From<NetLink> for Link {
    fn from(link: NetLink) -> Self {
        Link::Net(link)
    }
}

/// An alternating chain of link specs. Build with the chaining methods:
///
/// ```
/// use designlint::pattern::{NetLink, Pattern, PartLink, PinLink};
///
/// let pattern = Pattern::new()
///     .part(PartLink::named(["U1"]))
///     .pin(PinLink::any())
///     .net(NetLink::named("VCC"));
/// assert_eq!(pattern.to_string(), "Part(U1) Pin(??) Net(VCC)");
/// ```
#[derive(Debug, Default)]
pub struct Pattern {
    links: Vec<Link>,
}

impl Pattern {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn part(mut self, link: PartLink) -> Self {
        self.links.push(Link::Part(link));
        self
    }

    pub fn pin(mut self, link: PinLink) -> Self {
        self.links.push(Link::Pin(link));
        self
    }

    pub fn net(mut self, link: NetLink) -> Self {
        self.links.push(Link::Net(link));
        self
    }

    pub fn push(&mut self, link: impl Into<Link>) {
        self.links.push(link.into());
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Number of anchors (part and net links) a solution path will carry.
    pub fn anchor_count(&self) -> usize {
        self.links
            .iter()
            .filter(|l| matches!(l, Link::Part(_) | Link::Net(_)))
            .count()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.links.iter().map(|l| l.to_string()).collect();
        write!(f, "{}", rendered.join(" "))
    }
}

impl FromIterator<Link> for Pattern {
    fn from_iter<T: IntoIterator<Item = Link>>(iter: T) -> Self {
        Self {
            links: iter.into_iter().collect(),
        }
    }
}

/// One anchor of a solution path.
#[derive(Debug, Clone, Copy)]
pub enum PathNode<'a> {
    Part(&'a Part),
    Net(&'a Net),
}

impl<'a> PathNode<'a> {
    pub fn name(&self) -> &'a str {
        match *self {
            PathNode::Part(part) => &part.name,
            PathNode::Net(net) => &net.name,
        }
    }

    pub fn as_part(&self) -> Option<&'a Part> {
        match *self {
            PathNode::Part(part) => Some(part),
            PathNode::Net(_) => None,
        }
    }

    pub fn as_net(&self) -> Option<&'a Net> {
        match *self {
            PathNode::Net(net) => Some(net),
            PathNode::Part(_) => None,
        }
    }
}

/// A solution: the anchors the walk visited, in order.
pub type MatchPath<'a> = Vec<PathNode<'a>>;

/// Render a path as its anchor names joined with `:`.
pub fn render_path(path: &[PathNode<'_>]) -> String {
    let names: Vec<&str> = path.iter().map(|n| n.name()).collect();
    names.join(":")
}

fn render_site(path: &[PathNode<'_>], remaining: &[Link]) -> String {
    let rendered: Vec<String> = remaining.iter().map(|l| l.to_string()).collect();
    let pattern = rendered.join(" ");
    if path.is_empty() {
        pattern
    } else {
        format!("{}: {}", render_path(path), pattern)
    }
}

/// The alternation rule: a part or net seed, then whole `Pin Net` /
/// `Pin Part` hops with the anchor kind flipping each time. Checked before
/// any seeds are walked, so a malformed chain fails the same way on every
/// design, including one where no candidate would ever match.
fn check_grammar(pattern: &Pattern) -> Result<(), PatternError> {
    let links = pattern.links();
    let mut at_part = match links.first() {
        Some(Link::Part(_)) => true,
        Some(Link::Net(_)) => false,
        Some(Link::Pin(_)) => return Err(PatternError::BadLeadingLink(pattern.to_string())),
        None => return Err(PatternError::Malformed(pattern.to_string())),
    };
    let mut rest = &links[1..];
    loop {
        match (rest, at_part) {
            ([], _) => return Ok(()),
            ([Link::Pin(_), Link::Net(_), tail @ ..], true) => {
                at_part = false;
                rest = tail;
            }
            ([Link::Pin(_), Link::Part(_), tail @ ..], false) => {
                at_part = true;
                rest = tail;
            }
            _ => return Err(PatternError::Malformed(pattern.to_string())),
        }
    }
}

/// Backtracking matcher over one schematic.
pub struct PatternMatcher<'a> {
    schematic: &'a Schematic,
    graph: ConnectivityGraph<'a>,
}

impl<'a> PatternMatcher<'a> {
    pub fn new(schematic: &'a Schematic) -> Self {
        Self {
            schematic,
            graph: ConnectivityGraph::from_schematic(schematic),
        }
    }

    pub fn schematic(&self) -> &'a Schematic {
        self.schematic
    }

    /// All solution paths, in document order of the choices made at each
    /// hop. Two pins of one part on the same matching net yield two
    /// solutions. A chain that does not alternate is rejected up front,
    /// before any candidate is examined.
    pub fn find(&self, pattern: &Pattern) -> Result<Vec<MatchPath<'a>>, PatternError> {
        check_grammar(pattern)?;
        let Some(first) = pattern.links().first() else {
            return Err(PatternError::Malformed(pattern.to_string()));
        };

        let mut solutions = Vec::new();
        let mut path = Vec::new();
        match first {
            Link::Part(link) => {
                for part in &self.schematic.parts {
                    if link.matches(part) {
                        path.push(PathNode::Part(part));
                        self.descend(&mut path, &pattern.links()[1..], &mut solutions)?;
                        path.pop();
                    }
                }
            }
            Link::Net(link) => {
                for net in &self.schematic.nets {
                    if link.matches(net) {
                        path.push(PathNode::Net(net));
                        self.descend(&mut path, &pattern.links()[1..], &mut solutions)?;
                        path.pop();
                    }
                }
            }
            Link::Pin(_) => {
                return Err(PatternError::BadLeadingLink(pattern.to_string()));
            }
        }

        tracing::trace!("Pattern '{}' matched {} paths", pattern, solutions.len());
        Ok(solutions)
    }

    fn descend(
        &self,
        path: &mut MatchPath<'a>,
        remaining: &[Link],
        solutions: &mut Vec<MatchPath<'a>>,
    ) -> Result<(), PatternError> {
        if remaining.is_empty() {
            solutions.push(path.clone());
            return Ok(());
        }

        let Some(&tail) = path.last() else {
            return Err(PatternError::Malformed(render_site(path, remaining)));
        };

        match tail {
            PathNode::Part(part) => {
                let (pin_link, net_link) = match remaining {
                    [Link::Pin(pin), Link::Net(net), ..] => (pin, net),
                    _ => return Err(PatternError::Malformed(render_site(path, remaining))),
                };

                let attached = self.graph.nets_attached(&part.name);
                if remaining.len() == 2 {
                    // Terminal hop: one solution per accepted pin reference.
                    for &(pin, net) in &attached {
                        if pin_link.matches(pin) && net_link.matches(net) {
                            path.push(PathNode::Net(net));
                            self.descend(path, &remaining[2..], solutions)?;
                            path.pop();
                        }
                    }
                } else {
                    // Continuing hop: each candidate net explored once, and
                    // it must reach this part through an accepted pin.
                    let mut seen = HashSet::new();
                    for &(_, net) in &attached {
                        if !seen.insert(net.name.as_str()) {
                            continue;
                        }
                        if !net_link.matches(net) {
                            continue;
                        }
                        let reachable = attached
                            .iter()
                            .any(|&(pin, n)| n.name == net.name && pin_link.matches(pin));
                        if reachable {
                            path.push(PathNode::Net(net));
                            self.descend(path, &remaining[2..], solutions)?;
                            path.pop();
                        }
                    }
                }
            }
            PathNode::Net(net) => {
                let (pin_link, part_link) = match remaining {
                    [Link::Pin(pin), Link::Part(part), ..] => (pin, part),
                    _ => return Err(PatternError::Malformed(render_site(path, remaining))),
                };

                // The part the walk arrived from must not be revisited.
                let previous = path
                    .len()
                    .checked_sub(2)
                    .and_then(|i| path[i].as_part())
                    .map(|p| p.name.as_str());

                for (pin, part) in self.graph.pinrefs_on(&net.name) {
                    if !pin_link.matches(pin) || !part_link.matches(part) {
                        continue;
                    }
                    if previous == Some(part.name.as_str()) {
                        continue;
                    }
                    path.push(PathNode::Part(part));
                    self.descend(path, &remaining[2..], solutions)?;
                    path.pop();
                }
            }
        }

        Ok(())
    }

    /// Exactly one solution, or an error carrying the rendered candidates.
    pub fn find_one(&self, pattern: &Pattern) -> Result<MatchPath<'a>, PatternError> {
        let mut found = self.find(pattern)?;
        if found.len() == 1 {
            Ok(found.remove(0))
        } else {
            Err(PatternError::AmbiguousMatch {
                found: found.len(),
                pattern: pattern.to_string(),
                paths: render_paths(&found, "\n"),
            })
        }
    }

    /// No solutions, or an error carrying the rendered matches.
    pub fn find_none(&self, pattern: &Pattern) -> Result<(), PatternError> {
        let found = self.find(pattern)?;
        if found.is_empty() {
            Ok(())
        } else {
            Err(PatternError::UnexpectedMatch {
                pattern: pattern.to_string(),
                paths: render_paths(&found, "\n"),
            })
        }
    }

    /// Like [`find_one`](Self::find_one), but a wrong match count records a
    /// diagnostic at `level` and returns one placeholder per anchor so the
    /// calling rule can continue.
    #[track_caller]
    pub fn expect_one(
        &self,
        pattern: &Pattern,
        collector: &mut DiagnosticCollector,
        level: Severity,
        message: &str,
    ) -> Result<Vec<Option<PathNode<'a>>>, PatternError> {
        let mut found = self.find(pattern)?;
        if found.len() == 1 {
            return Ok(found.remove(0).into_iter().map(Some).collect());
        }

        let full = format!(
            "{}\n\tSearching for {}\n\tFound {} matching paths, but should have found 1.  \
             Here are the matches (if any):\n\t {}",
            message,
            pattern,
            found.len(),
            render_paths(&found, "\n\t")
        );
        record_at(collector, level, full);
        Ok(vec![None; pattern.anchor_count()])
    }

    /// Like [`find_none`](Self::find_none), but a match records a diagnostic
    /// at `level` and returns one placeholder per anchor.
    #[track_caller]
    pub fn expect_none(
        &self,
        pattern: &Pattern,
        collector: &mut DiagnosticCollector,
        level: Severity,
        message: &str,
    ) -> Result<Vec<Option<PathNode<'a>>>, PatternError> {
        let found = self.find(pattern)?;
        if found.is_empty() {
            return Ok(Vec::new());
        }

        let full = format!("{} {} found {}", message, pattern, render_path(&found[0]));
        record_at(collector, level, full);
        Ok(vec![None; pattern.anchor_count()])
    }
}

fn render_paths(paths: &[MatchPath<'_>], separator: &str) -> String {
    let rendered: Vec<String> = paths.iter().map(|p| render_path(p)).collect();
    rendered.join(separator)
}

#[track_caller]
fn record_at(collector: &mut DiagnosticCollector, level: Severity, message: String) {
    match level {
        Severity::Error => collector.record_error(None, message, false),
        Severity::Warning => collector.record_warning(None, message, false),
        Severity::Info => collector.record_info(None, message),
    }
}
