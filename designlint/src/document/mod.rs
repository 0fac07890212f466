//! Design document model.
//!
//! These types are the JSON-facing schema for the three document kinds the
//! checks operate on: schematics, boards, and libraries. They are designed
//! to be:
//! - Strictly typed: full Rust type safety with serde support
//! - Tool-agnostic: captures the subset of an EDA design that style and
//!   consistency checks need, not any one vendor's file format
//! - Comparable: `PartialEq` across the whole tree, so a definition embedded
//!   in a schematic or board can be checked against the library it came from

mod board;
mod library;
mod schematic;

pub use board::{Board, Element, Signal};
pub use library::{
    Attribute, Device, Deviceset, Gate, Library, Package, Pad, Smd, Symbol, SymbolPin, Technology,
};
pub use schematic::{Junction, Label, Net, Part, PinRef, Schematic, Segment};

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// One checking run's worth of documents: at most one schematic, at most one
/// board, and any number of authoritative libraries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schematic: Option<Schematic>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<Board>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub libraries: Vec<Library>,
}

impl DesignSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schematic(mut self, schematic: Schematic) -> Self {
        self.schematic = Some(schematic);
        self
    }

    pub fn with_board(mut self, board: Board) -> Self {
        self.board = Some(board);
        self
    }

    pub fn add_library(&mut self, library: Library) {
        self.libraries.push(library);
    }
}

/// A straight drawing or routing segment on a named layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Wire {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub width: f64,
    pub layer: String,
}

impl Default for Wire {
    fn default() -> Self {
        Self {
            x1: 0.0,
            y1: 0.0,
            x2: 0.0,
            y2: 0.0,
            width: 0.0,
            layer: String::new(),
        }
    }
}

impl Wire {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            ..Self::default()
        }
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = layer.into();
        self
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    /// First endpoint.
    pub fn p1(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    /// Second endpoint.
    pub fn p2(&self) -> Point {
        Point::new(self.x2, self.y2)
    }

    pub fn length(&self) -> f64 {
        let dx = self.x2 - self.x1;
        let dy = self.y2 - self.y1;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A text item on a named layer (drawing text, `>NAME`, `>VALUE`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Text {
    pub value: String,
    pub x: f64,
    pub y: f64,
    pub layer: String,
    /// Character height in mm.
    pub size: f64,
    /// Stroke width as a percentage of the size.
    pub ratio: u32,
    pub font: String,
}

impl Default for Text {
    fn default() -> Self {
        Self {
            value: String::new(),
            x: 0.0,
            y: 0.0,
            layer: String::new(),
            size: 1.778,
            ratio: 8,
            font: "proportional".to_string(),
        }
    }
}

impl Text {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = layer.into();
        self
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_ratio(mut self, ratio: u32) -> Self {
        self.ratio = ratio;
        self
    }

    pub fn with_font(mut self, font: impl Into<String>) -> Self {
        self.font = font.into();
        self
    }

    /// Whether this text is the given placeholder, compared case-insensitively
    /// the way the drawing tools treat `>name` and `>NAME` as the same thing.
    pub fn is_placeholder(&self, placeholder: &str) -> bool {
        self.value.eq_ignore_ascii_case(placeholder)
    }
}

/// A placed attribute label of a part or element, such as `>NAME` on
/// silkscreen after smashing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayAttribute {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub x: f64,
    pub y: f64,
    pub layer: String,
    pub size: f64,
    pub ratio: u32,
    pub font: String,
    /// Whether the label is shown in the document.
    pub display: bool,
}

impl Default for DisplayAttribute {
    fn default() -> Self {
        Self {
            name: String::new(),
            value: None,
            x: 0.0,
            y: 0.0,
            layer: String::new(),
            size: 1.778,
            ratio: 8,
            font: "vector".to_string(),
            display: true,
        }
    }
}

impl DisplayAttribute {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = layer.into();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.display = false;
        self
    }
}
