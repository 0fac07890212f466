//! Stock check modules.
//!
//! Three module families cover the three document kinds: [`LibraryRules`]
//! for authoritative library files, [`BoardRules`] for layouts, and
//! [`SchematicRules`] for schematics. The board and schematic modules also
//! re-run the library checks against the copies embedded in their
//! documents, so drift shows up wherever it lives.

mod board;
mod library;
mod schematic;

pub use board::BoardRules;
pub use library::LibraryRules;
pub use schematic::SchematicRules;

use crate::diagnostics::DiagnosticCollector;
use crate::document::Wire;
use crate::geometry;

/// Report every pair of wires on the same layer that touch or cross while
/// belonging to different nets.
///
/// Wires are ordered by coordinates first so the pair enumeration, and with
/// it the report order, does not depend on document order. Touching
/// endpoints count as intersecting; connected copper between two nets is a
/// short or a miss-assigned net either way.
pub(crate) fn check_crossings(wires: &[(&str, &Wire)], collector: &mut DiagnosticCollector) {
    let mut ordered: Vec<(&str, &Wire)> = wires.to_vec();
    ordered.sort_by(|a, b| {
        a.1.x1
            .total_cmp(&b.1.x1)
            .then(a.1.y1.total_cmp(&b.1.y1))
            .then(a.1.x2.total_cmp(&b.1.x2))
            .then(a.1.y2.total_cmp(&b.1.y2))
            .then(a.1.layer.cmp(&b.1.layer))
            .then(a.0.cmp(b.0))
    });

    for (i, (net1, w1)) in ordered.iter().enumerate() {
        for (net2, w2) in ordered.iter().skip(i + 1) {
            if net1 == net2 || w1.layer != w2.layer {
                continue;
            }
            if geometry::segments_intersect(w1.p1(), w1.p2(), w2.p1(), w2.p2()) {
                collector.record_error(
                    None,
                    format!(
                        "The segment of {} from ({}, {}) to ({}, {}) intersects with the \
                         segment of {} from ({}, {}) to ({}, {}).",
                        net1, w1.x1, w1.y1, w1.x2, w1.y2, net2, w2.x1, w2.y1, w2.x2, w2.y2
                    ),
                    false,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crossing_different_nets_same_layer_reported() {
        let a = Wire::new(0.0, 0.0, 10.0, 10.0).with_layer("Nets");
        let b = Wire::new(10.0, 0.0, 0.0, 10.0).with_layer("Nets");
        let wires = vec![("A", &a), ("B", &b)];
        let mut collector = DiagnosticCollector::new();
        check_crossings(&wires, &mut collector);
        assert_eq!(collector.len(), 1);
        let message = &collector.diagnostics()[0].message;
        assert!(message.contains("The segment of A"));
        assert!(message.contains("intersects with the segment of B"));
    }

    #[test]
    fn test_same_net_and_other_layer_crossings_ignored() {
        let a = Wire::new(0.0, 0.0, 10.0, 10.0).with_layer("Top");
        let b = Wire::new(10.0, 0.0, 0.0, 10.0).with_layer("Top");
        let c = Wire::new(10.0, 0.0, 0.0, 10.0).with_layer("Bottom");
        let mut collector = DiagnosticCollector::new();
        // Same net crossing itself.
        check_crossings(&[("A", &a), ("A", &b)], &mut collector);
        // Different nets on different layers.
        check_crossings(&[("A", &a), ("B", &c)], &mut collector);
        assert!(collector.is_empty());
    }

    #[test]
    fn test_report_order_is_coordinate_sorted_not_input_order() {
        let left = Wire::new(0.0, 0.0, 4.0, 4.0).with_layer("Nets");
        let crossing_left = Wire::new(4.0, 0.0, 0.0, 4.0).with_layer("Nets");
        let right = Wire::new(20.0, 0.0, 24.0, 4.0).with_layer("Nets");
        let crossing_right = Wire::new(24.0, 0.0, 20.0, 4.0).with_layer("Nets");

        let forward = vec![
            ("A", &left),
            ("B", &crossing_left),
            ("C", &right),
            ("D", &crossing_right),
        ];
        let reversed: Vec<_> = forward.iter().rev().copied().collect();

        let mut first = DiagnosticCollector::new();
        check_crossings(&forward, &mut first);
        let mut second = DiagnosticCollector::new();
        check_crossings(&reversed, &mut second);

        let messages = |c: &DiagnosticCollector| -> Vec<String> {
            c.diagnostics().iter().map(|d| d.message.clone()).collect()
        };
        assert_eq!(messages(&first), messages(&second));
        assert_eq!(first.len(), 2);
    }
}
