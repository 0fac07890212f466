//! Checks for library symbols, packages, and devicesets.

use crate::diagnostics::DiagnosticCollector;
use crate::document::{Attribute, Deviceset, Library, Package, Symbol, Wire};
use crate::engine::{CheckContext, CheckError, CheckModule};
use crate::grid;
use crate::options::CheckOptions;

/// Layers that end up on the silkscreen during manufacturing.
const SILKSCREEN_LAYERS: [&str; 4] = ["tNames", "bNames", "tPlace", "bPlace"];

/// Style checks for every authoritative library in the run.
///
/// The same per-library pass is reused by [`super::SchematicRules`] and
/// [`super::BoardRules`] on the library copies embedded in their documents.
pub struct LibraryRules;

impl CheckModule for LibraryRules {
    fn id(&self) -> &str {
        "library_style"
    }

    fn name(&self) -> &str {
        "Library symbol, package, and deviceset style"
    }

    fn run(&self, ctx: &mut CheckContext<'_>) -> Result<(), CheckError> {
        let fix = ctx.fix;
        for library in ctx.libraries.iter_mut() {
            check_library(library, ctx.collector, fix, ctx.options);
        }
        Ok(())
    }
}

/// Run the full per-library pass: fixes first when enabled, then symbol,
/// package, and deviceset checks, all nested under the library's name.
///
/// Libraries listed in `skipped_libraries` are passed over entirely.
pub(crate) fn check_library(
    library: &mut Library,
    collector: &mut DiagnosticCollector,
    fix: bool,
    options: &CheckOptions,
) {
    if options.skipped_libraries.iter().any(|n| n == &library.name) {
        tracing::debug!("Skipping checks for library '{}'", library.name);
        return;
    }

    let mut scope = collector.nest(library.name.clone());
    scope.record_info(None, format!("Examined {}", library.name));

    if fix {
        fix_missing_required_attributes(library, options);
        fix_missing_keepouts(library);
    }

    for symbol in &mut library.symbols {
        check_symbol(symbol, &mut scope, fix, options);
    }
    for package in &mut library.packages {
        check_package(package, &mut scope, fix, options);
    }
    for deviceset in &library.devicesets {
        check_deviceset(deviceset, library, &mut scope, options);
    }
}

/// Fill in missing or empty required attributes with the value `Unknown` on
/// every technology, so the checks that follow pass and the placeholder is
/// easy to search for later.
fn fix_missing_required_attributes(library: &mut Library, options: &CheckOptions) {
    for deviceset in &mut library.devicesets {
        for device in &mut deviceset.devices {
            for technology in &mut device.technologies {
                for required in &options.required_technology_attributes {
                    match technology.attributes.iter().position(|a| a.name == *required) {
                        Some(i) => {
                            if technology.attributes[i].value.is_empty() {
                                technology.attributes[i].value = "Unknown".to_string();
                            }
                        }
                        // Added as constant so the fixed library passes the
                        // constancy check too.
                        None => technology
                            .attributes
                            .push(Attribute::new(required.clone(), "Unknown").with_constant(true)),
                    }
                }
            }
        }
    }
}

/// Give every package without tKeepout content a zero-size keepout wire at
/// the origin. The area still has to be drawn by hand, but the fixed file
/// passes the check and the stub marks where the keepout belongs.
fn fix_missing_keepouts(library: &mut Library) {
    for package in &mut library.packages {
        if package.wires_on_layer("tKeepout").next().is_none() {
            package.wires.push(
                Wire::new(0.0, 0.0, 0.0, 0.0)
                    .with_width(1.0)
                    .with_layer("tKeepout"),
            );
        }
    }
}

fn check_symbol(
    symbol: &mut Symbol,
    collector: &mut DiagnosticCollector,
    fix: bool,
    options: &CheckOptions,
) {
    let mut scope = collector.nest(symbol.name.clone());

    for pin in &symbol.pins {
        if pin.name.contains('$') {
            scope.record_warning(
                None,
                format!(
                    "Pin '{}' has '$' in name.  Give your pins nice names.",
                    pin.name
                ),
                true,
            );
        }
        let mut pin_scope = scope.nest(pin.name.clone());
        if !grid::is_aligned(pin.x, options.symbol_pin_grid)
            || !grid::is_aligned(pin.y, options.symbol_pin_grid)
        {
            pin_scope.record_error(
                None,
                format!(
                    "Pin {} is not aligned to the 0.1\" grid. ({}, {})",
                    pin.name, pin.x, pin.y
                ),
                true,
            );
        }
    }

    let name_texts: Vec<usize> = symbol
        .texts
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_placeholder(">NAME"))
        .map(|(i, _)| i)
        .collect();

    if name_texts.is_empty() && !options.unnamed_symbol_exempt(&symbol.name) {
        scope.record_warning(
            None,
            "Symbol is missing '>NAME'. Every schematic symbol needs a '>NAME' in layer \
             'Names' so the name of the part is visible in schematic.",
            false,
        );
    }

    let misplaced_names: Vec<usize> = name_texts
        .iter()
        .copied()
        .filter(|&i| symbol.texts[i].layer != "Names")
        .collect();
    if !misplaced_names.is_empty() {
        if fix {
            for &i in &misplaced_names {
                symbol.texts[i].layer = "Names".to_string();
            }
        } else {
            let layers: Vec<&str> = misplaced_names
                .iter()
                .map(|&i| symbol.texts[i].layer.as_str())
                .collect();
            scope.record_warning(
                None,
                format!(
                    "'>NAME' is in the wrong layer ('{}').  Should be in 'Names'.",
                    layers.join(", ")
                ),
                true,
            );
        }
    }

    let misplaced_values: Vec<usize> = symbol
        .texts
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_placeholder(">VALUE") && t.layer != "Values")
        .map(|(i, _)| i)
        .collect();
    if !misplaced_values.is_empty() {
        if fix {
            for &i in &misplaced_values {
                symbol.texts[i].layer = "Values".to_string();
            }
        } else {
            let layers: Vec<&str> = misplaced_values
                .iter()
                .map(|&i| symbol.texts[i].layer.as_str())
                .collect();
            scope.record_warning(
                None,
                format!(
                    "'>VALUE' is in the wrong layer ('{}').  Should be in 'Values'.",
                    layers.join(", ")
                ),
                true,
            );
        }
    }

    if symbol.wires.iter().any(|w| w.layer == "Info") {
        scope.record_warning(
            None,
            "You have some drawing in layer 'Info'. Usually drawings in symbols should go \
             in layer 'Symbols'",
            false,
        );
    }
}

fn check_package(
    package: &mut Package,
    collector: &mut DiagnosticCollector,
    fix: bool,
    options: &CheckOptions,
) {
    let mut scope = collector.nest(package.name.clone());

    if package.wires_on_layer("Dimension").any(|w| w.width < 0.1) {
        scope.record_error(
            None,
            "Lines in layer 'Dimension' must be thicker than 0.1mm",
            true,
        );
    }

    let has_name_text = package.texts.iter().any(|t| t.is_placeholder(">NAME"));
    if !has_name_text && package.drawing_count() < options.package_name_element_limit {
        scope.record_warning(
            None,
            "Package is missing '>NAME'.  Every package needs a '>NAME' so the part's \
             name will be visible on the board.",
            false,
        );
    }

    for pad in &package.pads {
        if pad.name.contains('$') {
            scope.record_warning(
                None,
                format!(
                    "Pad/SMD '{}' has '$' in name.  Give your pads and SMDs nice names.",
                    pad.name
                ),
                true,
            );
        }
    }
    for smd in &package.smds {
        if smd.name.contains('$') {
            scope.record_warning(
                None,
                format!(
                    "Pad/SMD '{}' has '$' in name.  Give your pads and SMDs nice names.",
                    smd.name
                ),
                true,
            );
        }
    }

    let name_layers = ["tNames", "bNames"];
    let value_layers = ["tValues", "bValues"];
    for i in 0..package.texts.len() {
        let is_name = package.texts[i].is_placeholder(">NAME");
        let is_value = package.texts[i].is_placeholder(">VALUE");

        if is_name && !name_layers.contains(&package.texts[i].layer.as_str()) {
            if fix {
                package.texts[i].layer = "tNames".to_string();
            } else {
                scope.record_warning(
                    None,
                    format!(
                        "'>NAME' in text object in layer {} instead of tNames or bNames",
                        package.texts[i].layer
                    ),
                    false,
                );
            }
        }
        if is_value && !value_layers.contains(&package.texts[i].layer.as_str()) {
            if fix {
                package.texts[i].layer = "tValues".to_string();
            } else {
                scope.record_warning(
                    None,
                    format!(
                        "'>VALUE' in text object in layer {} instead of tValues or bValues",
                        package.texts[i].layer
                    ),
                    false,
                );
            }
        }

        if is_name || is_value {
            let text = &package.texts[i];
            let bad_geometry = text.size < options.silkscreen_min_size
                || text.ratio != options.silkscreen_ratio
                || !options.silkscreen_fonts.iter().any(|f| f == &text.font);
            if bad_geometry {
                if fix {
                    package.texts[i].size = options.silkscreen_min_size;
                    package.texts[i].ratio = options.silkscreen_ratio;
                    if let Some(font) = options.silkscreen_fonts.first() {
                        package.texts[i].font = font.clone();
                    }
                } else {
                    scope.record_warning(
                        None,
                        format!(
                            "'{}' in text object has wrong geometry (size={}mm, ratio={}%, \
                             font={}).  Should be {}mm, {}%, and one of these fonts that \
                             will render properly on the board during manufacturing: {}.",
                            text.value,
                            text.size,
                            text.ratio,
                            text.font,
                            options.silkscreen_min_size,
                            options.silkscreen_ratio,
                            options.silkscreen_fonts.join(", ")
                        ),
                        true,
                    );
                }
            }
        }

        let text = &package.texts[i];
        if name_layers.contains(&text.layer.as_str()) && !is_name {
            scope.record_warning(
                None,
                format!(
                    "Layer {} should only contain text items with the '>NAME', found '{}'",
                    text.layer, text.value
                ),
                true,
            );
        }
        if value_layers.contains(&text.layer.as_str()) && !is_value {
            scope.record_warning(
                None,
                format!(
                    "Layer {} should only contain text items with '>VALUE', found '{}'",
                    text.layer, text.value
                ),
                true,
            );
        }
        if SILKSCREEN_LAYERS.contains(&text.layer.as_str()) {
            if text.size < options.silkscreen_min_size {
                scope.record_warning(
                    None,
                    format!(
                        "Text '{}' in layer {} is too small ({}mm).  To be legible on the \
                         board it should be at least {}mm.",
                        text.value, text.layer, text.size, options.silkscreen_min_size
                    ),
                    true,
                );
            }
            if text.font != "vector" {
                scope.record_warning(
                    None,
                    format!(
                        "Text '{}' in layer {} is not in the vector font.  The other fonts \
                         don't render properly on the board.",
                        text.value, text.layer
                    ),
                    true,
                );
            }
        }
    }

    if package.wires_on_layer("tKeepout").next().is_none()
        && package.drawing_count() < options.package_keepout_element_limit
    {
        scope.record_error(
            None,
            "Nothing in tKeepout.  All packages should include a keepout area to prevent \
             parts from overlapping.",
            false,
        );
    }
    if package.wires_on_layer("tPlace").next().is_none()
        && package.drawing_count() < options.package_keepout_element_limit
    {
        scope.record_error(
            None,
            "Nothing in tPlace.  Packages should include lines or shapes showing how the \
             part should be placed on the board.  For ICs this should precisely show the \
             location of four corners of the part.  For polarized parts, it should \
             illustrate the polarity.  For other parts a full or partial outline of the \
             part is sufficient.",
            false,
        );
    }

    if !options.copper_exempt(&package.name) {
        if package.wires_on_layer("Top").next().is_some() {
            scope.record_error(
                None,
                "Wires found in Top layer.  You probably want an SMD instead.",
                false,
            );
        }
        if package.wires_on_layer("Bottom").next().is_some() {
            scope.record_error(
                None,
                "Wires found in Bottom layer.  You probably want an SMD instead.",
                false,
            );
        }
    }

    if package.smds.iter().any(|s| s.layer == "Bottom") {
        scope.record_warning(
            None,
            "SMD found on bottom layer.  They should almost always be on 'Top'",
            false,
        );
    }

    // A box outline takes at least four wires.
    let tdocu_items = package.wires_on_layer("tDocu").count()
        + package.texts.iter().filter(|t| t.layer == "tDocu").count();
    if tdocu_items < 4 && package.drawing_count() < options.package_keepout_element_limit {
        scope.record_warning(
            None,
            "You should have a box or circle in tDocu that matches the size of the package",
            false,
        );
    }
}

fn check_deviceset(
    deviceset: &Deviceset,
    library: &Library,
    collector: &mut DiagnosticCollector,
    options: &CheckOptions,
) {
    let mut scope = collector.nest(deviceset.name.clone());

    if let [gate] = deviceset.gates.as_slice() {
        if gate.x != 0.0 || gate.y != 0.0 {
            scope.record_warning(
                None,
                format!(
                    "In the left pane of the device window, the schematic symbol for \
                     device should be at origin (0,0) instead of ({}, {}).",
                    gate.x, gate.y
                ),
                true,
            );
        }
    }

    // Supply symbols carry the net name instead of a value, so the
    // uservalue bookkeeping does not apply to them.
    let is_supply = options
        .power_and_ground_names
        .iter()
        .any(|n| n == &deviceset.name);
    if !is_supply && deviceset.uservalue {
        let symbol_has_value = deviceset
            .gates
            .iter()
            .filter_map(|g| library.symbol(&g.symbol))
            .flat_map(|s| s.texts.iter())
            .any(|t| t.is_placeholder(">VALUE"));
        if !symbol_has_value {
            scope.record_warning(
                None,
                "Device has user value (look for a check box at the bottom of the device \
                 editor window), but symbol does not include '>VALUE'.  This means the \
                 value will not be visible in the schematic.",
                false,
            );
        }
    }

    for device in &deviceset.devices {
        let package_value_texts = device
            .package
            .as_deref()
            .and_then(|p| library.package(p))
            .map_or(0, |p| {
                p.texts.iter().filter(|t| t.is_placeholder(">VALUE")).count()
            });
        if deviceset.uservalue && package_value_texts == 0 {
            scope.record_warning(
                None,
                format!(
                    "Device has user value (look for a check box at the bottom of the \
                     device editor window), but package for variant '{}' does not include \
                     '>VALUE'.  This means the value will not be visible in the board.",
                    device.name
                ),
                false,
            );
        }
        if !deviceset.uservalue && package_value_texts > 0 {
            scope.record_warning(
                None,
                format!(
                    "Device does not have user value (look for a check box at the bottom \
                     of the device editor window), but package for variant '{}' includes \
                     '>VALUE'.  This means the package name will appear on the board, \
                     which is probably not what you want.",
                    device.name
                ),
                false,
            );
        }
    }

    for device in &deviceset.devices {
        if device.package.is_none() {
            continue;
        }
        let mut device_scope = scope.nest(device.name.clone());
        let Some(technology) = device.technology("") else {
            device_scope.record_warning(
                None,
                format!("{} does not have a default technology", device.name),
                false,
            );
            continue;
        };
        for required in &options.required_technology_attributes {
            match technology.attribute(required) {
                None => device_scope.record_warning(
                    None,
                    format!("Missing required attribute '{}'", required),
                    true,
                ),
                Some(attribute) if attribute.value.is_empty() => device_scope.record_warning(
                    None,
                    format!("Missing required attribute '{}'", required),
                    true,
                ),
                Some(attribute) if !attribute.constant => device_scope.record_warning(
                    None,
                    format!("Attribute '{}' should be constant.", required),
                    true,
                ),
                Some(_) => {}
            }
        }
    }
}
