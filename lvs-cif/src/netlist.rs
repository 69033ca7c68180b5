//! Parses the transistor netlist format: one device per line,
//! `<instance_id> <kind> <gate> <drain> <source>`, with `<kind>` one of
//! `N` or `P` and net names opaque strings.

use std::fmt;
use tracing::{info, warn};

/// The channel kind of a transistor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    /// An n-channel device.
    N,
    /// A p-channel device.
    P,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::N => write!(f, "N"),
            Kind::P => write!(f, "P"),
        }
    }
}

impl Kind {
    /// Parses a kind token.
    pub fn from_token(token: &str) -> Option<Kind> {
        match token {
            "N" => Some(Kind::N),
            "P" => Some(Kind::P),
            _ => None,
        }
    }
}

/// One netlist line: a named transistor and its three terminals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetlistRecord {
    /// The instance name, e.g. `T1`.
    pub name: String,
    /// The channel kind.
    pub kind: Kind,
    /// The gate net name.
    pub gate: String,
    /// The drain net name.
    pub drain: String,
    /// The source net name.
    pub source: String,
}

/// Parses a netlist text stream. Malformed lines are dropped with a log
/// line; blank lines are skipped silently.
pub fn parse_netlist(input: &str) -> Vec<NetlistRecord> {
    let mut records = vec![];
    for (lineno, line) in input.lines().enumerate() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        let &[name, kind, gate, drain, source] = tokens.as_slice() else {
            warn!(
                "Line {}: expected 5 tokens, got {}; dropping.",
                lineno + 1,
                tokens.len()
            );
            continue;
        };
        let Some(kind) = Kind::from_token(kind) else {
            warn!("Line {}: unknown kind {:?}; dropping.", lineno + 1, kind);
            continue;
        };
        records.push(NetlistRecord {
            name: name.to_string(),
            kind,
            gate: gate.to_string(),
            drain: drain.to_string(),
            source: source.to_string(),
        });
    }
    info!("Parsed {} netlist records.", records.len());
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_netlist() {
        let records = parse_netlist("T1 N g d s\nT2 P in vdd out\n");
        assert_eq!(
            records,
            vec![
                NetlistRecord {
                    name: "T1".to_string(),
                    kind: Kind::N,
                    gate: "g".to_string(),
                    drain: "d".to_string(),
                    source: "s".to_string(),
                },
                NetlistRecord {
                    name: "T2".to_string(),
                    kind: Kind::P,
                    gate: "in".to_string(),
                    drain: "vdd".to_string(),
                    source: "out".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_malformed_lines_are_dropped() {
        let records = parse_netlist("T1 N g d\nT2 X g d s\n\nT3 P a b c\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "T3");
    }
}
