//! Checks for schematic documents.

use std::collections::HashSet;

use crate::diagnostics::DiagnosticCollector;
use crate::document::{Library, Schematic, Wire};
use crate::engine::{CheckContext, CheckError, CheckModule};
use crate::grid;
use crate::options::CheckOptions;
use crate::pattern::{NetLink, PartLink, Pattern, PatternMatcher, PinLink};

/// The schematic wiring layer.
const NET_LAYER: &str = "Nets";

/// Style and connectivity checks for the schematic, plus a nested run of the
/// library checks over the library copies embedded in it.
pub struct SchematicRules;

impl CheckModule for SchematicRules {
    fn id(&self) -> &str {
        "schematic_style"
    }

    fn name(&self) -> &str {
        "Schematic style and connectivity"
    }

    fn run(&self, ctx: &mut CheckContext<'_>) -> Result<(), CheckError> {
        let fix = ctx.fix;
        let options = ctx.options;
        let Some(schematic) = ctx.schematic.as_deref_mut() else {
            tracing::debug!("No schematic in this run; skipping schematic checks");
            return Ok(());
        };

        let mut scope = ctx.collector.nest(schematic.name.clone());
        check_supply_symbols(schematic, &mut scope, fix, options);
        check_names(schematic, &mut scope);
        check_libraries(schematic, &*ctx.libraries, &mut scope, options);
        check_nets(schematic, &mut scope, fix, options)?;
        check_frame(schematic, &mut scope, options)?;
        check_parts(schematic, &mut scope, fix, options)?;

        for library in &mut schematic.libraries {
            super::library::check_library(library, &mut scope, fix, options);
        }
        Ok(())
    }
}

/// Ground symbols hang below the net, power symbols sit above it, and both
/// kinds label the net they are attached to.
fn check_supply_symbols(
    schematic: &mut Schematic,
    collector: &mut DiagnosticCollector,
    fix: bool,
    options: &CheckOptions,
) {
    let mut rotated_grounds = Vec::new();
    let mut rotated_powers = Vec::new();
    for part in &mut schematic.parts {
        let is_ground = options.ground_deviceset_names.iter().any(|n| n == &part.deviceset);
        let is_power = options.power_deviceset_names.iter().any(|n| n == &part.deviceset);
        if !is_ground && !is_power {
            continue;
        }
        if part.rotation != 0.0 {
            if fix {
                part.rotation = 0.0;
            } else if is_ground {
                rotated_grounds.push(part.name.clone());
            } else {
                rotated_powers.push(part.name.clone());
            }
        }
    }
    if !rotated_grounds.is_empty() {
        collector.record_warning(
            None,
            format!(
                "These ground symbols are oriented incorrectly. Grounds should point down: {}",
                rotated_grounds.join(" ")
            ),
            false,
        );
    }
    if !rotated_powers.is_empty() {
        collector.record_warning(
            None,
            format!(
                "These power symbols are oriented incorrectly. Power symbols should point up: {}",
                rotated_powers.join(" ")
            ),
            false,
        );
    }

    let schematic = &*schematic;
    for net in &schematic.nets {
        for pinref in net.pinrefs() {
            let Some(part) = schematic.part(&pinref.part) else {
                continue;
            };
            let is_ground = options.ground_deviceset_names.iter().any(|n| n == &part.deviceset);
            let is_power = options.power_deviceset_names.iter().any(|n| n == &part.deviceset);
            if is_ground && pinref.pin != net.name {
                collector.record_warning(
                    None,
                    format!(
                        "You have a {} ground symbol ({}) attached to {} instead of {}.",
                        part.deviceset, part.name, net.name, pinref.pin
                    ),
                    false,
                );
            }
            if is_power && pinref.pin != net.name {
                collector.record_warning(
                    None,
                    format!(
                        "You have a {} power symbol ({}) attached to {} instead of {}.",
                        part.deviceset, part.name, net.name, pinref.pin
                    ),
                    false,
                );
            }
        }
    }
}

fn check_names(schematic: &Schematic, collector: &mut DiagnosticCollector) {
    let mut dollar_parts: Vec<&str> = schematic
        .parts
        .iter()
        .filter(|p| p.name.contains('$'))
        .map(|p| p.name.as_str())
        .collect();
    dollar_parts.sort_unstable();
    if !dollar_parts.is_empty() {
        collector.record_warning(
            None,
            format!(
                "These parts have '$' in their names.  Parts should all have nice, pretty \
                 names.  Either set the prefix on the device or name it yourself: {}",
                dollar_parts.join(" ")
            ),
            true,
        );
    }

    let mut labeled: Vec<&str> = schematic
        .nets
        .iter()
        .filter(|n| n.labels().next().is_some() && n.name.contains('$'))
        .map(|n| n.name.as_str())
        .collect();
    labeled.sort_unstable();
    labeled.dedup();
    if !labeled.is_empty() {
        collector.record_warning(
            None,
            format!(
                "These nets have labels on them and have '$' in their names.  Labeled nets \
                 should have meaningful names: {}",
                labeled.join(" ")
            ),
            true,
        );
    }

    let net_names: HashSet<&str> = schematic.nets.iter().map(|n| n.name.as_str()).collect();
    let part_names: HashSet<&str> = schematic.parts.iter().map(|p| p.name.as_str()).collect();
    let mut shared: Vec<&str> = net_names.intersection(&part_names).copied().collect();
    shared.sort_unstable();
    if !shared.is_empty() {
        let quoted: Vec<String> = shared.iter().map(|n| format!("'{}'", n)).collect();
        collector.record_warning(
            None,
            format!(
                "The following are names of both a net and part.  That's confusing: {}",
                quoted.join(", ")
            ),
            true,
        );
    }
}

/// Compare every part's embedded library data against the authoritative
/// libraries. Stale copies are the main source of subtle board/schematic
/// divergence, so anything structural that drifted is an error.
fn check_libraries(
    schematic: &Schematic,
    authoritative: &[Library],
    collector: &mut DiagnosticCollector,
    options: &CheckOptions,
) {
    for part in &schematic.parts {
        let Some(lib) = authoritative.iter().find(|l| l.name == part.library) else {
            if !options.ignored_missing_libraries.iter().any(|n| n == &part.library) {
                let mut part_scope = collector.nest(part.name.clone());
                part_scope.record_warning(
                    None,
                    format!("Can't find library '{}' for part '{}'", part.library, part.name),
                    false,
                );
            }
            continue;
        };
        let Some(embedded_deviceset) = schematic.deviceset_of(part) else {
            continue;
        };
        let embedded = schematic.library(&part.library);
        let mut ds_scope = collector.nest(embedded_deviceset.name.clone());

        let mut seen_symbols = HashSet::new();
        for gate in &embedded_deviceset.gates {
            if !seen_symbols.insert(gate.symbol.as_str()) {
                continue;
            }
            let Some(embedded_symbol) = embedded.and_then(|l| l.symbol(&gate.symbol)) else {
                continue;
            };
            let mut sym_scope = ds_scope.nest(embedded_symbol.name.clone());
            match lib.symbol(&embedded_symbol.name) {
                None => sym_scope.record_warning(
                    None,
                    format!("Symbol is not in library {}", part.library),
                    false,
                ),
                Some(lib_symbol) if embedded_symbol != lib_symbol => sym_scope.record_warning(
                    None,
                    format!(
                        "Symbol doesn't match symbol in library '{}'.  You need to update \
                         the libraries in your schematic: 'Library->Update...' or \
                         'Library->Update All'",
                        part.library
                    ),
                    false,
                ),
                Some(_) => {}
            }
        }

        let mut seen_packages = HashSet::new();
        for device in &embedded_deviceset.devices {
            let Some(package_name) = device.package.as_deref() else {
                continue;
            };
            if !seen_packages.insert(package_name) {
                continue;
            }
            let Some(embedded_package) = embedded.and_then(|l| l.package(package_name)) else {
                continue;
            };
            let mut pkg_scope = ds_scope.nest(embedded_package.name.clone());
            match lib.package(&embedded_package.name) {
                None => pkg_scope.record_warning(
                    None,
                    format!("Package is not in library {}", part.library),
                    false,
                ),
                Some(lib_package) if embedded_package != lib_package => pkg_scope.record_warning(
                    None,
                    format!(
                        "Package doesn't match package in library '{}'.  You need to update \
                         the libraries in your schematic: 'Library->Update...' or \
                         'Library->Update All'",
                        part.library
                    ),
                    false,
                ),
                Some(_) => {}
            }
        }

        let Some(lib_deviceset) = lib.deviceset(&embedded_deviceset.name) else {
            ds_scope.record_error(
                None,
                format!(
                    "Device '{}' is not in library '{}'",
                    embedded_deviceset.name, part.library
                ),
                false,
            );
            continue;
        };
        let Some(embedded_device) = embedded_deviceset.device(&part.device) else {
            continue;
        };
        let mut dev_scope = ds_scope.nest(embedded_device.name.clone());
        let Some(lib_device) = lib_deviceset.device(&embedded_device.name) else {
            dev_scope.record_error(
                Some(&embedded_device.name),
                format!(
                    "Variant '{}' is not in library '{}'",
                    embedded_device.name, part.library
                ),
                false,
            );
            continue;
        };
        if embedded_device != lib_device {
            dev_scope.record_error(
                None,
                format!(
                    "Variant '{}' is different in library '{}'.  You need to update the \
                     libraries in your schematic: 'Library->Update...' or 'Library->Update All'",
                    embedded_device.name, part.library
                ),
                false,
            );
        }
        let Some(embedded_technology) = embedded_device.technology(&part.technology) else {
            continue;
        };
        let mut tech_scope = dev_scope.nest(embedded_technology.name.clone());
        match lib_device.technology(&embedded_technology.name) {
            None => tech_scope.record_error(
                None,
                format!(
                    "Technology '{}' is not in library '{}'.  You need to update the \
                     libraries in your schematic: 'Library->Update...' or 'Library->Update All'",
                    embedded_technology.name, part.library
                ),
                false,
            ),
            Some(lib_technology) if embedded_technology != lib_technology => tech_scope
                .record_error(
                    None,
                    format!(
                        "Attributes for variant '{}' are different in library '{}'. You need \
                         to update the libraries in your schematic: 'Library->Update...' or \
                         'Library->Update All'",
                        embedded_device.name, part.library
                    ),
                    false,
                ),
            Some(_) => {}
        }
    }
}

fn check_nets(
    schematic: &mut Schematic,
    collector: &mut DiagnosticCollector,
    fix: bool,
    options: &CheckOptions,
) -> Result<(), CheckError> {
    let grid_size = options.schematic_grid;
    let grid_inches = grid_size / 25.4;

    {
        let wires: Vec<(&str, &Wire)> = schematic
            .nets
            .iter()
            .flat_map(|n| n.wires_on_layer(NET_LAYER).map(move |w| (n.name.as_str(), w)))
            .collect();
        super::check_crossings(&wires, collector);
    }

    for net in &mut schematic.nets {
        let net_name = net.name.clone();
        for segment in &mut net.segments {
            for wire in &mut segment.wires {
                if wire.layer != NET_LAYER {
                    continue;
                }
                let (x1, y1, x2, y2) = (wire.x1, wire.y1, wire.x2, wire.y2);
                if (x1 - x2).abs() >= options.schematic_angle_tolerance
                    && (y1 - y2).abs() >= options.schematic_angle_tolerance
                {
                    collector.record_warning(
                        None,
                        format!(
                            "Net routed at odd angle: {} centered at ({}, {}) in layer {}",
                            net_name,
                            (x1 + x2) / 2.0,
                            (y1 + y2) / 2.0,
                            wire.layer
                        ),
                        true,
                    );
                }
                if !grid::is_aligned(x1, grid_size) || !grid::is_aligned(y1, grid_size) {
                    if fix {
                        wire.x1 = grid::snap(x1, grid_size);
                        wire.y1 = grid::snap(y1, grid_size);
                    } else {
                        collector.record_warning(
                            None,
                            format!(
                                "Segment of {} at ({}, {}) is not aligned {}\" grid",
                                net_name, x1, y1, grid_inches
                            ),
                            true,
                        );
                    }
                }
                if !grid::is_aligned(x2, grid_size) || !grid::is_aligned(y2, grid_size) {
                    if fix {
                        wire.x2 = grid::snap(x2, grid_size);
                        wire.y2 = grid::snap(y2, grid_size);
                    } else {
                        collector.record_warning(
                            None,
                            format!(
                                "Segment of {} at ({}, {}) is not aligned {}\" grid",
                                net_name, x2, y2, grid_inches
                            ),
                            true,
                        );
                    }
                }
            }
        }
    }

    for net in &mut schematic.nets {
        for segment in &mut net.segments {
            for junction in &mut segment.junctions {
                if !grid::is_aligned(junction.x, grid_size) || !grid::is_aligned(junction.y, grid_size) {
                    if fix {
                        junction.x = grid::snap(junction.x, grid_size);
                        junction.y = grid::snap(junction.y, grid_size);
                    } else {
                        collector.record_warning(
                            None,
                            format!(
                                "Junction or label at ({}, {}) is not aligned {}\" grid",
                                junction.x, junction.y, grid_inches
                            ),
                            true,
                        );
                    }
                }
            }
        }
    }
    for net in &mut schematic.nets {
        for segment in &mut net.segments {
            for label in &mut segment.labels {
                if !grid::is_aligned(label.x, grid_size) || !grid::is_aligned(label.y, grid_size) {
                    if fix {
                        label.x = grid::snap(label.x, grid_size);
                        label.y = grid::snap(label.y, grid_size);
                    } else {
                        collector.record_warning(
                            None,
                            format!(
                                "Junction or label at ({}, {}) is not aligned {}\" grid",
                                label.x, label.y, grid_inches
                            ),
                            true,
                        );
                    }
                }
            }
        }
    }

    let schematic = &*schematic;

    // Distinct nets touching at a wire endpoint look connected on screen but
    // are electrically separate.
    let net_points: Vec<(&str, Vec<(f64, f64)>)> = schematic
        .nets
        .iter()
        .map(|net| {
            let mut points: Vec<(f64, f64)> = Vec::new();
            for wire in net.wires_on_layer(NET_LAYER) {
                for point in [(wire.x1, wire.y1), (wire.x2, wire.y2)] {
                    if !points.contains(&point) {
                        points.push(point);
                    }
                }
            }
            (net.name.as_str(), points)
        })
        .collect();
    for i in 0..net_points.len() {
        for j in (i + 1)..net_points.len() {
            let mut common: Vec<(f64, f64)> = net_points[i]
                .1
                .iter()
                .filter(|p| net_points[j].1.contains(p))
                .copied()
                .collect();
            if common.is_empty() {
                continue;
            }
            common.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
            let locations: Vec<String> = common
                .iter()
                .map(|(x, y)| format!("({}, {})", x, y))
                .collect();
            collector.record_warning(
                None,
                format!(
                    "Nets {} and {} have point in common but are not connected.  If you \
                     move them apart and back together they will probably connect.  \
                     Locations: {}",
                    net_points[i].0,
                    net_points[j].0,
                    locations.join(", ")
                ),
                true,
            );
        }
    }

    for net in &schematic.nets {
        let wires: Vec<&Wire> = net.wires_on_layer(NET_LAYER).collect();
        for label in net.labels() {
            let on_net = wires.iter().any(|w| {
                if w.x1 == w.x2 {
                    label.x == w.x1
                        && label.y <= w.y1.max(w.y2)
                        && label.y >= w.y1.min(w.y2)
                } else if w.y1 == w.y2 {
                    label.y == w.y1
                        && label.x <= w.x1.max(w.x2)
                        && label.x >= w.x1.min(w.x2)
                } else {
                    // Label placement on angled wires is not checked.
                    false
                }
            });
            if !on_net {
                collector.record_warning(
                    None,
                    format!(
                        "Label of {} at ({}, {}) is not on the net it labels.",
                        net.name, label.x, label.y
                    ),
                    true,
                );
            }
        }
    }

    let matcher = PatternMatcher::new(schematic);
    for net in &schematic.nets {
        let pattern = Pattern::new()
            .net(NetLink::exactly(net))
            .pin(PinLink::any())
            .part(PartLink::any());
        if matcher.find(&pattern)?.len() <= 1 {
            collector.record_warning(
                None,
                format!("Net {} has zero or 1 pins.  You should probably delete it.", net.name),
                false,
            );
        }
    }
    Ok(())
}

fn check_frame(
    schematic: &Schematic,
    collector: &mut DiagnosticCollector,
    options: &CheckOptions,
) -> Result<(), CheckError> {
    let matcher = PatternMatcher::new(schematic);
    let frames = matcher.find(
        &Pattern::new().part(PartLink::any().with_devicesets([options.frame_deviceset.clone()])),
    )?;
    if frames.is_empty() {
        collector.record_warning(None, "You don't have a frame around your schematic.", false);
    }

    let documentation = schematic.plain.iter().filter(|t| t.layer == "Info").count();
    if documentation < options.min_documentation_items {
        collector.record_warning(
            None,
            "You don't have enough documentation (items in layer 'Info') on your \
             schematic.  If your schematic is very simple, you can provide that as an \
             explanation for why no documentation is needed.",
            false,
        );
    }
    Ok(())
}

fn check_parts(
    schematic: &mut Schematic,
    collector: &mut DiagnosticCollector,
    fix: bool,
    options: &CheckOptions,
) -> Result<(), CheckError> {
    let grid_size = options.schematic_grid;
    let grid_inches = grid_size / 25.4;
    for part in &mut schematic.parts {
        if !grid::is_aligned(part.x, grid_size) || !grid::is_aligned(part.y, grid_size) {
            if fix {
                part.x = grid::snap(part.x, grid_size);
                part.y = grid::snap(part.y, grid_size);
            } else {
                collector.record_warning(
                    None,
                    format!("{} not aligned to {}\" grid", part.name, grid_inches),
                    true,
                );
            }
        }
    }

    let schematic = &*schematic;
    for part in &schematic.parts {
        let Some(technology) = schematic.technology_of(part) else {
            continue;
        };
        let Some(attribute) = technology.attribute("VALUE") else {
            continue;
        };
        let part_value = part.value.as_deref().unwrap_or("");
        if attribute.value != part_value {
            collector.record_warning(
                None,
                format!(
                    "Part {} has a pre-set value ({}) but you have set a different value \
                     ({}).  This is probably an error, since the value won't match the \
                     part the device's attributes describe.",
                    part.name, attribute.value, part_value
                ),
                false,
            );
        }
    }

    let matcher = PatternMatcher::new(schematic);
    for part in &schematic.parts {
        // Single-pin parts (supply symbols, mounting holes) legitimately
        // connect to at most one net.
        if schematic.pin_count_of(part) <= 1 {
            continue;
        }
        let pattern = Pattern::new()
            .part(PartLink::exactly(part))
            .pin(PinLink::any())
            .net(NetLink::any());
        if matcher.find(&pattern)?.len() <= 1 {
            collector.record_warning(
                None,
                format!("Part {} has 1 or zero nets attached.", part.name),
                false,
            );
        }
    }
    Ok(())
}
