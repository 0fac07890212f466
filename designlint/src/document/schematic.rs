//! Schematic document: parts, nets, and the library definitions the
//! schematic carries embedded copies of.

use serde::{Deserialize, Serialize};

use super::library::{Device, Deviceset, Library, Technology};
use super::{DisplayAttribute, Text, Wire};

/// A schematic sheet with its parts, nets, and embedded libraries.
///
/// The `libraries` here are the copies stored inside the schematic document,
/// which can drift from the authoritative library files. Consistency checks
/// compare the two.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schematic {
    pub name: String,
    pub parts: Vec<Part>,
    pub nets: Vec<Net>,
    pub libraries: Vec<Library>,
    /// Free drawing items on the sheet (frames, notes, documentation).
    pub plain: Vec<Text>,
}

impl Schematic {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_part(&mut self, part: Part) {
        self.parts.push(part);
    }

    pub fn add_net(&mut self, net: Net) {
        self.nets.push(net);
    }

    pub fn add_library(&mut self, library: Library) {
        self.libraries.push(library);
    }

    pub fn part(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.name == name)
    }

    pub fn net(&self, name: &str) -> Option<&Net> {
        self.nets.iter().find(|n| n.name == name)
    }

    pub fn library(&self, name: &str) -> Option<&Library> {
        self.libraries.iter().find(|l| l.name == name)
    }

    /// The embedded deviceset definition a part refers to.
    pub fn deviceset_of(&self, part: &Part) -> Option<&Deviceset> {
        self.library(&part.library)?.deviceset(&part.deviceset)
    }

    /// The embedded device variant a part refers to.
    pub fn device_of(&self, part: &Part) -> Option<&Device> {
        self.deviceset_of(part)?.device(&part.device)
    }

    /// The embedded technology a part refers to (often the unnamed default).
    pub fn technology_of(&self, part: &Part) -> Option<&Technology> {
        self.device_of(part)?.technology(&part.technology)
    }

    /// Total pin count across the gates of a part's deviceset, resolved
    /// against the schematic's own embedded library.
    pub fn pin_count_of(&self, part: &Part) -> usize {
        let Some(library) = self.library(&part.library) else {
            return 0;
        };
        let Some(deviceset) = library.deviceset(&part.deviceset) else {
            return 0;
        };
        deviceset
            .gates
            .iter()
            .filter_map(|g| library.symbol(&g.symbol))
            .map(|s| s.pins.len())
            .sum()
    }
}

/// A placed part instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Part {
    pub name: String,
    pub library: String,
    pub deviceset: String,
    pub device: String,
    /// Technology name; the empty string is the unnamed default.
    pub technology: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub x: f64,
    pub y: f64,
    /// Rotation in degrees counterclockwise; 0 is the unrotated orientation.
    pub rotation: f64,
    /// Attribute labels smashed off the symbol and placed individually.
    pub attributes: Vec<DisplayAttribute>,
}

impl Part {
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

    pub fn with_deviceset(mut self, deviceset: impl Into<String>) -> Self {
        self.deviceset = deviceset.into();
        self
    }

    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = device.into();
        self
    }

    pub fn with_technology(mut self, technology: impl Into<String>) -> Self {
        self.technology = technology.into();
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_attribute(mut self, attribute: DisplayAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Deviceset and device name run together, e.g. `RESISTOR-0805`.
    pub fn long_name(&self) -> String {
        format!("{}{}", self.deviceset, self.device)
    }
}

/// An electrical net, drawn as one or more segments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Net {
    pub name: String,
    pub segments: Vec<Segment>,
}

impl Net {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            segments: Vec::new(),
        }
    }

    fn first_segment(&mut self) -> &mut Segment {
        if self.segments.is_empty() {
            self.segments.push(Segment::default());
        }
        &mut self.segments[0]
    }

    pub fn with_pinref(mut self, part: impl Into<String>, pin: impl Into<String>) -> Self {
        self.first_segment().pinrefs.push(PinRef {
            part: part.into(),
            pin: pin.into(),
        });
        self
    }

    pub fn with_wire(mut self, wire: Wire) -> Self {
        self.first_segment().wires.push(wire);
        self
    }

    pub fn with_junction(mut self, x: f64, y: f64) -> Self {
        self.first_segment().junctions.push(Junction { x, y });
        self
    }

    pub fn with_label(mut self, x: f64, y: f64) -> Self {
        self.first_segment().labels.push(Label { x, y });
        self
    }

    pub fn pinrefs(&self) -> impl Iterator<Item = &PinRef> {
        self.segments.iter().flat_map(|s| s.pinrefs.iter())
    }

    pub fn wires(&self) -> impl Iterator<Item = &Wire> {
        self.segments.iter().flat_map(|s| s.wires.iter())
    }

    pub fn junctions(&self) -> impl Iterator<Item = &Junction> {
        self.segments.iter().flat_map(|s| s.junctions.iter())
    }

    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.segments.iter().flat_map(|s| s.labels.iter())
    }

    /// Wires of this net on the given layer.
    pub fn wires_on_layer<'a>(&'a self, layer: &'a str) -> impl Iterator<Item = &'a Wire> {
        self.wires().filter(move |w| w.layer == layer)
    }
}

/// One drawn stretch of a net.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Segment {
    pub wires: Vec<Wire>,
    pub junctions: Vec<Junction>,
    pub labels: Vec<Label>,
    pub pinrefs: Vec<PinRef>,
}

/// Connection from a net segment to a named pin of a named part.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinRef {
    pub part: String,
    pub pin: String,
}

/// Explicit connection dot where net wires meet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Junction {
    pub x: f64,
    pub y: f64,
}

/// Visible net-name label placed on a segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub x: f64,
    pub y: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Gate, Symbol, SymbolPin};

    fn schematic_with_library() -> Schematic {
        let mut sch = Schematic::new("amp.sch");
        let mut lib = Library::new("opamps");
        lib.add_symbol(
            Symbol::new("OPAMP")
                .with_pin(SymbolPin::new("IN+", 0.0, 2.54))
                .with_pin(SymbolPin::new("IN-", 0.0, -2.54))
                .with_pin(SymbolPin::new("OUT", 7.62, 0.0)),
        );
        lib.add_deviceset(
            Deviceset::new("LM358")
                .with_gate(Gate::new("G$1", "OPAMP"))
                .with_device(Device::new("-D").with_package_name("SO08")),
        );
        sch.add_library(lib);
        sch.add_part(
            Part::new("U1")
                .with_library("opamps")
                .with_deviceset("LM358")
                .with_device("-D"),
        );
        sch
    }

    #[test]
    fn test_part_and_net_lookup() {
        let mut sch = Schematic::new("x.sch");
        sch.add_part(Part::new("R1"));
        sch.add_net(Net::new("VCC"));
        assert!(sch.part("R1").is_some());
        assert!(sch.part("R2").is_none());
        assert!(sch.net("VCC").is_some());
        assert!(sch.net("GND").is_none());
    }

    #[test]
    fn test_embedded_resolution_chain() {
        let sch = schematic_with_library();
        let part = sch.part("U1").expect("part");
        assert_eq!(sch.deviceset_of(part).expect("deviceset").name, "LM358");
        assert_eq!(sch.device_of(part).expect("device").name, "-D");
        assert_eq!(sch.pin_count_of(part), 3);
    }

    #[test]
    fn test_pin_count_is_zero_when_library_missing() {
        let mut sch = Schematic::new("x.sch");
        sch.add_part(Part::new("U9").with_library("nowhere").with_deviceset("GHOST"));
        let part = sch.part("U9").expect("part");
        assert_eq!(sch.pin_count_of(part), 0);
        assert!(sch.deviceset_of(part).is_none());
    }

    #[test]
    fn test_net_builder_collects_into_one_segment() {
        let net = Net::new("SIG")
            .with_pinref("U1", "OUT")
            .with_wire(Wire::new(0.0, 0.0, 2.54, 0.0).with_layer("Nets"))
            .with_label(1.27, 0.0);
        assert_eq!(net.segments.len(), 1);
        assert_eq!(net.pinrefs().count(), 1);
        assert_eq!(net.wires_on_layer("Nets").count(), 1);
        assert_eq!(net.wires_on_layer("Info").count(), 0);
        assert_eq!(net.labels().count(), 1);
    }

    #[test]
    fn test_long_name_concatenates_deviceset_and_device() {
        let part = Part::new("R1").with_deviceset("RESISTOR").with_device("-0805");
        assert_eq!(part.long_name(), "RESISTOR-0805");
    }
}
