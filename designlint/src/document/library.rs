//! Library document: symbols, packages, and devicesets.
//!
//! The same types describe both an authoritative library file and the copy a
//! schematic or board keeps embedded, which is what makes the drift checks a
//! plain `PartialEq` comparison.

use serde::{Deserialize, Serialize};

use super::{Text, Wire};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Library {
    pub name: String,
    pub symbols: Vec<Symbol>,
    pub packages: Vec<Package>,
    pub devicesets: Vec<Deviceset>,
}

impl Library {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_symbol(&mut self, symbol: Symbol) {
        self.symbols.push(symbol);
    }

    pub fn add_package(&mut self, package: Package) {
        self.packages.push(package);
    }

    pub fn add_deviceset(&mut self, deviceset: Deviceset) {
        self.devicesets.push(deviceset);
    }

    pub fn symbol(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.name == name)
    }

    pub fn package(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.name == name)
    }

    pub fn deviceset(&self, name: &str) -> Option<&Deviceset> {
        self.devicesets.iter().find(|d| d.name == name)
    }
}

/// A schematic symbol definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Symbol {
    pub name: String,
    pub pins: Vec<SymbolPin>,
    pub texts: Vec<Text>,
    pub wires: Vec<Wire>,
}

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_pin(mut self, pin: SymbolPin) -> Self {
        self.pins.push(pin);
        self
    }

    pub fn with_text(mut self, text: Text) -> Self {
        self.texts.push(text);
        self
    }

    pub fn with_wire(mut self, wire: Wire) -> Self {
        self.wires.push(wire);
        self
    }
}

/// A pin of a symbol, at symbol-local coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolPin {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

impl SymbolPin {
    pub fn new(name: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            name: name.into(),
            x,
            y,
        }
    }
}

/// A board footprint definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Package {
    pub name: String,
    pub texts: Vec<Text>,
    pub wires: Vec<Wire>,
    pub pads: Vec<Pad>,
    pub smds: Vec<Smd>,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: Text) -> Self {
        self.texts.push(text);
        self
    }

    pub fn with_wire(mut self, wire: Wire) -> Self {
        self.wires.push(wire);
        self
    }

    pub fn with_pad(mut self, pad: Pad) -> Self {
        self.pads.push(pad);
        self
    }

    pub fn with_smd(mut self, smd: Smd) -> Self {
        self.smds.push(smd);
        self
    }

    /// Number of drawing items (wires and texts; pads and SMDs are not
    /// drawing items). Several checks skip packages above a size threshold
    /// because imported graphics carry thousands of them.
    pub fn drawing_count(&self) -> usize {
        self.wires.len() + self.texts.len()
    }

    /// Drawing wires on the given layer.
    pub fn wires_on_layer<'a>(&'a self, layer: &'a str) -> impl Iterator<Item = &'a Wire> {
        self.wires.iter().filter(move |w| w.layer == layer)
    }
}

/// A through-hole pad.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pad {
    pub name: String,
}

impl Pad {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A surface-mount pad on a copper layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Smd {
    pub name: String,
    pub layer: String,
}

impl Smd {
    pub fn new(name: impl Into<String>, layer: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layer: layer.into(),
        }
    }
}

/// A family of devices sharing gates, e.g. a resistor with many footprints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Deviceset {
    pub name: String,
    /// Whether parts of this deviceset take a user-entered value.
    pub uservalue: bool,
    pub gates: Vec<Gate>,
    pub devices: Vec<Device>,
}

impl Deviceset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_uservalue(mut self, uservalue: bool) -> Self {
        self.uservalue = uservalue;
        self
    }

    pub fn with_gate(mut self, gate: Gate) -> Self {
        self.gates.push(gate);
        self
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.devices.push(device);
        self
    }

    pub fn device(&self, name: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.name == name)
    }
}

/// A gate places one symbol into a deviceset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gate {
    pub name: String,
    pub symbol: String,
    pub x: f64,
    pub y: f64,
}

impl Gate {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            x: 0.0,
            y: 0.0,
        }
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }
}

/// One variant of a deviceset, usually tied to a package.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Device {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    pub technologies: Vec<Technology>,
}

impl Device {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_package_name(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn with_technology(mut self, technology: Technology) -> Self {
        self.technologies.push(technology);
        self
    }

    pub fn technology(&self, name: &str) -> Option<&Technology> {
        self.technologies.iter().find(|t| t.name == name)
    }

    pub fn technology_mut(&mut self, name: &str) -> Option<&mut Technology> {
        self.technologies.iter_mut().find(|t| t.name == name)
    }
}

/// A named (or default, empty-named) set of ordering attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Technology {
    /// The empty string names the default technology.
    pub name: String,
    pub attributes: Vec<Attribute>,
}

impl Technology {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.attributes.iter_mut().find(|a| a.name == name)
    }
}

/// A name/value pair on a technology, e.g. `DIST` or `DISTPN`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attribute {
    pub name: String,
    /// The empty string counts as unset.
    pub value: String,
    /// Constant attributes cannot be edited on placed parts.
    pub constant: bool,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            constant: false,
        }
    }

    pub fn with_constant(mut self, constant: bool) -> Self {
        self.constant = constant;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_library() -> Library {
        let mut lib = Library::new("passives");
        lib.add_symbol(
            Symbol::new("RESISTOR")
                .with_pin(SymbolPin::new("1", -5.08, 0.0))
                .with_pin(SymbolPin::new("2", 5.08, 0.0))
                .with_text(Text::new(">NAME").with_layer("Names")),
        );
        lib.add_package(
            Package::new("R0805")
                .with_smd(Smd::new("1", "Top"))
                .with_smd(Smd::new("2", "Top"))
                .with_text(Text::new(">NAME").with_layer("tNames")),
        );
        lib.add_deviceset(
            Deviceset::new("RESISTOR")
                .with_uservalue(true)
                .with_gate(Gate::new("G$1", "RESISTOR"))
                .with_device(
                    Device::new("-0805").with_package_name("R0805").with_technology(
                        Technology::new("").with_attribute(
                            Attribute::new("DIST", "Digikey").with_constant(true),
                        ),
                    ),
                ),
        );
        lib
    }

    #[test]
    fn test_lookup_chain() {
        let lib = sample_library();
        let ds = lib.deviceset("RESISTOR").expect("deviceset");
        let dev = ds.device("-0805").expect("device");
        let tech = dev.technology("").expect("default technology");
        assert_eq!(tech.attribute("DIST").expect("attribute").value, "Digikey");
        assert!(tech.attribute("MPN").is_none());
        assert!(dev.technology("OBSOLETE").is_none());
    }

    #[test]
    fn test_drawing_count_excludes_pads_and_smds() {
        let lib = sample_library();
        let pkg = lib.package("R0805").expect("package");
        assert_eq!(pkg.drawing_count(), 1);
    }

    #[test]
    fn test_structural_equality_detects_drift() {
        let a = sample_library();
        let mut b = sample_library();
        assert_eq!(a, b);

        b.packages[0].texts[0].layer = "tPlace".to_string();
        assert_ne!(a, b);
        assert_ne!(a.package("R0805"), b.package("R0805"));
        assert_eq!(a.symbol("RESISTOR"), b.symbol("RESISTOR"));
    }

    #[test]
    fn test_library_round_trip() {
        let lib = sample_library();
        let json = serde_json::to_string_pretty(&lib).expect("serialize");
        let back: Library = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, lib);
    }
}
