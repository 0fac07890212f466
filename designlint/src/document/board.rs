//! Board document: placed elements, routed signals, and board-level drawing.

use serde::{Deserialize, Serialize};

use super::library::Library;
use super::{DisplayAttribute, Wire};

/// A board layout with its elements, signals, and embedded libraries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Board {
    pub name: String,
    pub elements: Vec<Element>,
    pub signals: Vec<Signal>,
    /// Free drawing items on the board, such as the outline in 'Dimension'.
    pub plain: Vec<Wire>,
    pub libraries: Vec<Library>,
}

impl Board {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_element(&mut self, element: Element) {
        self.elements.push(element);
    }

    pub fn add_signal(&mut self, signal: Signal) {
        self.signals.push(signal);
    }

    pub fn add_library(&mut self, library: Library) {
        self.libraries.push(library);
    }

    pub fn element(&self, name: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.name == name)
    }

    pub fn signal(&self, name: &str) -> Option<&Signal> {
        self.signals.iter().find(|s| s.name == name)
    }

    pub fn library(&self, name: &str) -> Option<&Library> {
        self.libraries.iter().find(|l| l.name == name)
    }
}

/// A placed package instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Element {
    pub name: String,
    pub library: String,
    pub package: String,
    pub x: f64,
    pub y: f64,
    /// Rotation in degrees counterclockwise.
    pub rotation: f64,
    pub attributes: Vec<DisplayAttribute>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.library = library.into();
        self
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_attribute(mut self, attribute: DisplayAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }
}

/// A net on the board. Width-zero wires are airwires that still need
/// routing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Signal {
    pub name: String,
    pub wires: Vec<Wire>,
}

impl Signal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            wires: Vec::new(),
        }
    }

    pub fn with_wire(mut self, wire: Wire) -> Self {
        self.wires.push(wire);
        self
    }

    /// Wires that have been routed with a real width.
    pub fn routed_wires(&self) -> impl Iterator<Item = &Wire> {
        self.wires.iter().filter(|w| w.width != 0.0)
    }

    /// Airwires left at width zero by the autorouter or ratsnest.
    pub fn unrouted_wires(&self) -> impl Iterator<Item = &Wire> {
        self.wires.iter().filter(|w| w.width == 0.0)
    }
}
