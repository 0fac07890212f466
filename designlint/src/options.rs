//! Tunable policy knobs shared by all check modules.

use serde::{Deserialize, Serialize};

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// Options a project can override to match its own conventions. The
/// defaults encode the house style the checks were written for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckOptions {
    /// Grid for schematic wires, junctions, labels, and part origins, in mm
    /// (a quarter of the 0.1 inch pin grid).
    pub schematic_grid: f64,

    /// Slack when deciding whether a schematic wire is axis-parallel.
    pub schematic_angle_tolerance: f64,

    /// Grid for element origins on the board, in mm.
    pub board_element_grid: f64,

    /// Grid for displayed attribute labels on the board, in mm.
    pub board_attribute_grid: f64,

    /// Slack when classifying board routing as horizontal, vertical, or
    /// diagonal.
    pub board_angle_tolerance: f64,

    /// Board wires shorter than this skip the odd-angle check.
    pub board_min_angle_check_length: f64,

    /// Grid for symbol pins, in mm (0.1 inch).
    pub symbol_pin_grid: f64,

    /// Minimum legible text size on silkscreen layers, in mm.
    pub silkscreen_min_size: f64,

    /// Required stroke ratio for `>NAME` and `>VALUE` texts, in percent.
    pub silkscreen_ratio: u32,

    /// Fonts that render reliably during manufacturing.
    pub silkscreen_fonts: Vec<String>,

    /// Symbol names for supply rails; these skip the `>NAME` requirement.
    pub power_and_ground_names: Vec<String>,

    /// Symbols that never need a visible name (frames, doc fields).
    pub symbols_that_need_no_name: Vec<String>,

    /// Devicesets that draw a ground symbol (must point down, net must
    /// match the pin).
    pub ground_deviceset_names: Vec<String>,

    /// Devicesets that draw a power symbol (must point up).
    pub power_deviceset_names: Vec<String>,

    /// Attributes every default technology must carry with a constant value.
    pub required_technology_attributes: Vec<String>,

    /// Packages whose names contain one of these markers may legitimately
    /// draw on copper layers.
    pub copper_exempt_package_markers: Vec<String>,

    /// Deviceset that provides the schematic frame.
    pub frame_deviceset: String,

    /// Minimum count of plain items in layer 'Info' before the schematic
    /// counts as documented.
    pub min_documentation_items: usize,

    /// Packages with at least this many drawing items skip the tKeepout,
    /// tPlace, and tDocu checks; imported graphics carry thousands of items.
    pub package_keepout_element_limit: usize,

    /// Packages with at least this many drawing items skip the `>NAME`
    /// check.
    pub package_name_element_limit: usize,

    /// Library names to skip entirely.
    pub skipped_libraries: Vec<String>,

    /// Library names parts may reference without a missing-library warning.
    pub ignored_missing_libraries: Vec<String>,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            schematic_grid: 25.4 / 10.0 / 4.0,
            schematic_angle_tolerance: 0.001,
            board_element_grid: 1.0,
            board_attribute_grid: 0.1,
            board_angle_tolerance: 0.1,
            board_min_angle_check_length: 2.0,
            symbol_pin_grid: 2.54,
            silkscreen_min_size: 0.9,
            silkscreen_ratio: 8,
            silkscreen_fonts: strings(&["vector"]),
            power_and_ground_names: strings(&[
                "VCC", "VDD", "3V3", "+3V3", "GND", "BAT_GND", "3V", "VBAT", "5V",
            ]),
            symbols_that_need_no_name: strings(&["FRAME_B_L", "DOCFIELD"]),
            ground_deviceset_names: strings(&["GND", "BAT_GND"]),
            power_deviceset_names: strings(&["3V", "VCC", "V3", "VBAT", "+3V3"]),
            required_technology_attributes: strings(&["CREATOR", "DIST", "DISTPN"]),
            copper_exempt_package_markers: strings(&["ANT", "HOLE", "BRIDGE", "LAYER_LABELS"]),
            frame_deviceset: "FRAME_B_L".to_string(),
            min_documentation_items: 5,
            package_keepout_element_limit: 50,
            package_name_element_limit: 200,
            skipped_libraries: Vec::new(),
            ignored_missing_libraries: Vec::new(),
        }
    }
}

impl CheckOptions {
    /// Symbol names exempt from the `>NAME` requirement: supply rails plus
    /// the explicit no-name list.
    pub fn unnamed_symbol_exempt(&self, symbol: &str) -> bool {
        self.power_and_ground_names.iter().any(|n| n == symbol)
            || self.symbols_that_need_no_name.iter().any(|n| n == symbol)
    }

    /// Whether a package name marks it as allowed to draw on copper.
    pub fn copper_exempt(&self, package: &str) -> bool {
        self.copper_exempt_package_markers
            .iter()
            .any(|marker| package.contains(marker.as_str()))
    }
}
