//! Checks for board documents.

use std::sync::OnceLock;

use regex::Regex;

use crate::diagnostics::DiagnosticCollector;
use crate::document::{Board, Library, Schematic, Wire};
use crate::engine::{CheckContext, CheckError, CheckModule};
use crate::grid;
use crate::options::CheckOptions;

/// Element names follow the schematic reference style: one or two capital
/// letters, then a number.
fn element_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z][A-Z]?\d+").expect("hardcoded regex"))
}

/// Routing, placement, naming, and outline checks for the board, plus a
/// nested run of the library checks over the library copies embedded in it.
pub struct BoardRules;

impl CheckModule for BoardRules {
    fn id(&self) -> &str {
        "board_style"
    }

    fn name(&self) -> &str {
        "Board routing, placement, and outline"
    }

    fn run(&self, ctx: &mut CheckContext<'_>) -> Result<(), CheckError> {
        let fix = ctx.fix;
        let options = ctx.options;
        let Some(board) = ctx.board.as_deref_mut() else {
            tracing::debug!("No board in this run; skipping board checks");
            return Ok(());
        };
        let schematic = ctx.schematic.as_deref();

        check_routing(board, ctx.collector, options);
        check_libraries(board, &*ctx.libraries, ctx.collector);
        check_outline(board, ctx.collector);
        check_names(board, schematic, ctx.collector);
        check_placement(board, ctx.collector, fix, options);

        for library in &mut board.libraries {
            super::library::check_library(library, ctx.collector, fix, options);
        }
        Ok(())
    }
}

fn check_routing(board: &Board, collector: &mut DiagnosticCollector, options: &CheckOptions) {
    let mut scope = collector.nest(board.name.clone());

    let mut unrouted: Vec<&str> = board
        .signals
        .iter()
        .filter(|s| s.unrouted_wires().next().is_some())
        .map(|s| s.name.as_str())
        .collect();
    unrouted.sort_unstable();
    unrouted.dedup();
    if !unrouted.is_empty() {
        scope.record_error(
            None,
            format!("You have unrouted nets: {}", unrouted.join(" ")),
            true,
        );
    }

    let routed: Vec<(&str, &Wire)> = board
        .signals
        .iter()
        .flat_map(|s| s.routed_wires().map(move |w| (s.name.as_str(), w)))
        .collect();
    super::check_crossings(&routed, &mut scope);

    for (signal, wire) in &routed {
        let dx = (wire.x1 - wire.x2).abs();
        let dy = (wire.y1 - wire.y2).abs();
        // Vertical, horizontal, and 45 degree runs are fine, and very short
        // jogs are not worth flagging.
        if dx < options.board_angle_tolerance
            || dy < options.board_angle_tolerance
            || (dx - dy).abs() < options.board_angle_tolerance
            || wire.length() < options.board_min_angle_check_length
        {
            continue;
        }
        scope.record_warning(
            None,
            format!(
                "Net routed at odd angle: {} centered at ({}, {}) in layer {}.  Net \
                 should only be vertical, horizontal, or diagonal (i.e., 45 degrees).",
                signal,
                (wire.x1 + wire.x2) / 2.0,
                (wire.y1 + wire.y2) / 2.0,
                wire.layer
            ),
            false,
        );
    }
}

/// Compare each element's package against the authoritative library it
/// claims to come from.
fn check_libraries(board: &Board, authoritative: &[Library], collector: &mut DiagnosticCollector) {
    let mut scope = collector.nest(board.name.clone());
    for element in &board.elements {
        let Some(lib) = authoritative.iter().find(|l| l.name == element.library) else {
            scope.record_warning(
                Some(&element.name),
                format!(
                    "Can't find library '{}' for part '{}'",
                    element.library, element.name
                ),
                false,
            );
            continue;
        };
        let mut elem_scope = scope.nest(element.name.clone());
        let Some(lib_package) = lib.package(&element.package) else {
            elem_scope.record_warning(
                None,
                format!(
                    "Can't find package {} in library {}",
                    element.package, lib.name
                ),
                false,
            );
            continue;
        };
        let embedded_package = board
            .library(&element.library)
            .and_then(|l| l.package(&element.package));
        if let Some(embedded_package) = embedded_package {
            if embedded_package != lib_package {
                elem_scope.record_warning(
                    None,
                    format!(
                        "Package {} doesn't match package in library '{}'.  You need to \
                         update the libraries in your board: 'Library->Update...' or \
                         'Library->Update All'",
                        lib_package.name, element.library
                    ),
                    true,
                );
            }
        }
    }
}

fn check_outline(board: &Board, collector: &mut DiagnosticCollector) {
    let mut scope = collector.nest(board.name.clone());
    let dims: Vec<&Wire> = board.plain.iter().filter(|w| w.layer == "Dimension").collect();
    scope.record_info(None, format!("Found {} lines in layer 'Dimension'", dims.len()));
    if dims.iter().any(|w| w.width == 0.0) {
        scope.record_error(None, "Lines in 'Dimension' should have non-zero width.", true);
    }
}

/// Flag parts whose board name does not follow the reference style. Only
/// names that exist in the schematic count; the check needs the schematic to
/// tell parts from mechanical-only elements.
fn check_names(board: &Board, schematic: Option<&Schematic>, collector: &mut DiagnosticCollector) {
    let Some(schematic) = schematic else {
        tracing::debug!("No schematic available; skipping board name checks");
        return;
    };
    let mut scope = collector.nest(board.name.clone());
    let re = element_name_regex();
    for element in &board.elements {
        if !re.is_match(&element.name) && schematic.part(&element.name).is_some() {
            scope.record_warning(
                None,
                format!(
                    "The name of part '{}' is too long.  It should be at most two capital \
                     letters followed by numbers.",
                    element.name
                ),
                false,
            );
        }
    }
}

fn check_placement(
    board: &mut Board,
    collector: &mut DiagnosticCollector,
    fix: bool,
    options: &CheckOptions,
) {
    let mut scope = collector.nest(board.name.clone());
    for element in &mut board.elements {
        if !grid::is_aligned(element.x, options.board_element_grid)
            || !grid::is_aligned(element.y, options.board_element_grid)
        {
            scope.record_warning(
                None,
                format!(
                    "Part {} at ({}, {}) is not aligned to {}mm grid.",
                    element.name, element.x, element.y, options.board_element_grid
                ),
                false,
            );
        }

        let element_name = element.name.clone();
        for attribute in &mut element.attributes {
            if !attribute.display {
                continue;
            }
            if !grid::is_aligned(attribute.x, options.board_attribute_grid)
                || !grid::is_aligned(attribute.y, options.board_attribute_grid)
            {
                if fix {
                    attribute.x = grid::snap(attribute.x, options.board_attribute_grid);
                    attribute.y = grid::snap(attribute.y, options.board_attribute_grid);
                } else {
                    scope.record_warning(
                        None,
                        format!(
                            "Label '>{}' of {} at ({}, {}) in layer {} is not aligned to \
                             {}mm grid.",
                            attribute.name,
                            element_name,
                            attribute.x,
                            attribute.y,
                            attribute.layer,
                            options.board_attribute_grid
                        ),
                        false,
                    );
                }
            }
        }
    }
}
