//! Parses the CIF-like layout format.
//!
//! Only two statement kinds matter here:
//! - `L <name>;` — subsequent polygons belong to layer `<name>`.
//! - `P <x1> <y1> <x2> <y2> … ;` — a polygon with three or more vertices.
//!
//! Statements end at `;`, so a polygon may continue across lines. Anything
//! else (cell definitions, labels, comments) is ignored.

use lvs_geometry::{point::Pt, polygon::Polygon};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Parses a CIF-like text stream into `(layer_name, polygon)` records, in
/// input order. Degenerate polygons (fewer than three vertices, an odd
/// coordinate count, or a self-intersecting ring) are dropped.
pub fn parse_cif(input: &str) -> Vec<(String, Polygon)> {
    let mut records: Vec<(String, Polygon)> = vec![];
    let mut current_layer: Option<String> = None;
    let mut stats = HashMap::<String, usize>::new();

    for statement in input.split(';') {
        let mut tokens = statement.split_whitespace();
        match tokens.next() {
            Some("L") => match tokens.next() {
                Some(name) => current_layer = Some(name.to_string()),
                None => warn!("Layer statement without a name; ignoring."),
            },
            Some("P") => {
                let Some(layer) = current_layer.clone() else {
                    warn!("Polygon before any layer statement; dropping.");
                    continue;
                };
                if let Some(polygon) = parse_polygon(tokens) {
                    *stats.entry(layer.clone()).or_default() += 1;
                    records.push((layer, polygon));
                }
            }
            Some(other) => debug!("Ignoring statement {:?}.", other),
            None => {}
        }
    }

    info!(
        "Parsed {} polygons across {} layers.",
        records.len(),
        stats.len()
    );
    records
}

fn parse_polygon<'a>(tokens: impl Iterator<Item = &'a str>) -> Option<Polygon> {
    let mut coords: Vec<i64> = vec![];
    for token in tokens {
        match token.parse::<i64>() {
            Ok(v) => coords.push(v),
            Err(_) => {
                warn!("Non-integer coordinate {:?} in polygon; dropping.", token);
                return None;
            }
        }
    }

    if coords.len() < 6 || coords.len() % 2 != 0 {
        warn!(
            "Polygon with {} coordinates is degenerate; dropping.",
            coords.len()
        );
        return None;
    }

    let pts = coords.chunks(2).map(|c| Pt { x: c[0], y: c[1] });
    let polygon = match Polygon(pts) {
        Ok(polygon) => polygon,
        Err(err) => {
            warn!("Degenerate polygon ({}); dropping.", err);
            return None;
        }
    };
    if !polygon.is_simple() {
        warn!("Self-intersecting polygon; dropping.");
        return None;
    }
    Some(polygon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lvs_geometry::polygon::Rect;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_layers_and_polygons() {
        let input = "L M1;\nP 0 0 10 0 10 10 0 10;\nL M2;\nP 5 5 8 5 8 8 5 8;\n";
        let records = parse_cif(input);
        assert_eq!(
            records,
            vec![
                ("M1".to_string(), Rect(Pt { x: 0, y: 0 }, (10, 10)).unwrap()),
                ("M2".to_string(), Rect(Pt { x: 5, y: 5 }, (3, 3)).unwrap()),
            ]
        );
    }

    #[test]
    fn test_line_continuation() {
        let input = "L NA;\nP 0 0 100 0\n  100 40\n  0 40;\n";
        let records = parse_cif(input);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].1, Rect(Pt { x: 0, y: 0 }, (100, 40)).unwrap());
    }

    #[test]
    fn test_negative_coordinates() {
        let records = parse_cif("L SN;\nP 40 -10 60 -10 60 50 40 50;\n");
        assert_eq!(records[0].1, Rect(Pt { x: 40, y: -10 }, (20, 60)).unwrap());
    }

    #[test]
    fn test_degenerate_records_are_dropped() {
        // Two vertices; odd coordinate count; zero-area; bowtie.
        let input = "L M1;\n\
                     P 0 0 1 1;\n\
                     P 0 0 1 1 2;\n\
                     P 0 0 5 0 9 0;\n\
                     P 0 0 2 2 2 0 0 2;\n\
                     P 0 0 4 0 4 4 0 4;\n";
        let records = parse_cif(input);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].1, Rect(Pt { x: 0, y: 0 }, (4, 4)).unwrap());
    }

    #[test]
    fn test_polygon_before_layer_is_dropped() {
        assert_eq!(parse_cif("P 0 0 1 0 1 1 0 1;\n"), vec![]);
    }

    #[test]
    fn test_unknown_statements_are_ignored() {
        let input = "DS 1 1 1;\nL M1;\n4N foo 1 2;\nP 0 0 4 0 4 4 0 4;\nDF;\nE";
        assert_eq!(parse_cif(input).len(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse_cif(""), vec![]);
    }
}
