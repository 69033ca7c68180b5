//! Boolean operations on polygons: intersection, difference, and the
//! cut-split used to carve a device region out of an active area.
//!
//! Both boundaries are split at their mutual intersection points; each
//! fragment is classified by an exact midpoint test against the other
//! polygon; the kept fragments are loaded into a directed graph and the
//! result regions are traced out of it as cycles.

use crate::{
    point::Pt,
    polygon::{Loc, PointLoc, Polygon},
    segment::{IsxnOutcome, Segment},
};
use itertools::Itertools;
use petgraph::{
    prelude::DiGraphMap,
    Direction::{Incoming, Outgoing},
};
use thiserror::Error;

/// A general error arising from trying to split a polygon along a cut.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SplitError {
    /// The cut was expected to bisect the polygon into exactly two pieces.
    #[error("The cut was expected to bisect the polygon into exactly two pieces; got {found}.")]
    DegenerateSplit {
        /// How many pieces the difference actually produced.
        found: usize,
    },
}

// The boundary of |subject|, split at every point where it meets the
// boundary of |clip|. Colinear overlaps contribute both overlap endpoints,
// so fragments never straddle a classification change.
fn fragments(subject: &Polygon, clip: &Polygon) -> Vec<Segment> {
    let clip_segments = clip.to_segments();
    let mut out = vec![];
    for sg in subject.to_segments() {
        let dir = sg.dir();
        let mut cuts: Vec<Pt> = vec![sg.i, sg.f];
        for cs in &clip_segments {
            match sg.intersects(cs) {
                Some(IsxnOutcome::Yes(p)) => cuts.push(p),
                Some(IsxnOutcome::ColinearOverlap(p, q)) => {
                    cuts.push(p);
                    cuts.push(q);
                }
                Some(_) | None => {}
            }
        }
        cuts.sort_by_key(|p| (*p - sg.i).dot(&dir));
        cuts.dedup();
        for (p, q) in cuts.iter().tuple_windows() {
            out.push(Segment(*p, *q));
        }
    }
    out
}

fn classify(frag: &Segment, other: &Polygon) -> Loc {
    let (mx, my) = frag.midpoint_doubled();
    other.locate_doubled(mx, my)
}

// For a fragment lying along |other|'s boundary: true if |other| traverses
// that stretch in the same direction, false if in the opposite direction.
fn boundary_codirected(frag: &Segment, other: &Polygon) -> Option<bool> {
    let (mx, my) = frag.midpoint_doubled();
    let fdir = frag.dir();
    for sg in other.to_segments() {
        let sdir = sg.dir();
        if fdir.cross(&sdir) != 0 {
            continue;
        }
        let (ax, ay) = (sg.i.x * 2, sg.i.y * 2);
        let (bx, by) = (sg.f.x * 2, sg.f.y * 2);
        let colinear = ((bx - ax) as i128) * ((my - ay) as i128)
            == ((by - ay) as i128) * ((mx - ax) as i128);
        if colinear
            && (ax.min(bx)..=ax.max(bx)).contains(&mx)
            && (ay.min(by)..=ay.max(by)).contains(&my)
        {
            return Some(fdir.dot(&sdir) > 0);
        }
    }
    None
}

// Turn preference at a junction: left turns first (sharpest first), then
// straight ahead, then right turns (gentlest first), then a full U-turn.
fn turn_group(din: Pt, d: Pt) -> u8 {
    let c = din.cross(&d);
    let k = din.dot(&d);
    match (c, k) {
        (c, _) if c > 0 => 0,
        (0, k) if k > 0 => 1,
        (c, _) if c < 0 => 2,
        _ => 3,
    }
}

fn sharper_left(din: Pt, a: Pt, b: Pt) -> bool {
    let (ga, gb) = (turn_group(din, a), turn_group(din, b));
    if ga != gb {
        return ga < gb;
    }
    a.cross(&b) < 0
}

fn leftmost_neighbor(graph: &DiGraphMap<Pt, ()>, cur: Pt, din: Pt) -> Option<Pt> {
    let mut best: Option<Pt> = None;
    for nb in graph.neighbors_directed(cur, Outgoing) {
        let dout = nb - cur;
        match best {
            None => best = Some(nb),
            Some(b) if sharper_left(din, dout, b - cur) => best = Some(nb),
            Some(_) => {}
        }
    }
    best
}

fn raw_area2(path: &[Pt]) -> i128 {
    path.iter()
        .zip(path.iter().cycle().skip(1))
        .map(|(a, b)| a.cross(b))
        .sum()
}

// Assembles directed boundary fragments into result polygons by tracing
// leftmost-turn faces. Every kept fragment bounds a result region with its
// interior on the left, so each bounded face comes out exactly once,
// counterclockwise. Negatively-oriented rings (hole boundaries) are dropped.
fn assemble(frags: Vec<Segment>) -> Vec<Polygon> {
    let mut graph: DiGraphMap<Pt, ()> = DiGraphMap::new();
    for sg in frags {
        if sg.i != sg.f {
            graph.add_edge(sg.i, sg.f, ());
        }
    }

    // Fragments that never closed into a boundary cannot be part of a face.
    loop {
        let dead: Vec<Pt> = graph
            .nodes()
            .filter(|n| {
                graph.neighbors_directed(*n, Incoming).count() == 0
                    || graph.neighbors_directed(*n, Outgoing).count() == 0
            })
            .collect();
        if dead.is_empty() {
            break;
        }
        for n in dead {
            graph.remove_node(n);
        }
    }

    let mut resultant = vec![];
    while graph.edge_count() > 0 {
        let (u0, v0) = graph
            .all_edges()
            .map(|(a, b, _)| (a, b))
            .min()
            .expect("graph has edges");

        let mut path = vec![u0, v0];
        let mut used = vec![(u0, v0)];
        let (mut prev, mut cur) = (u0, v0);
        let edge_limit = graph.edge_count();
        let closed = loop {
            match leftmost_neighbor(&graph, cur, cur - prev) {
                None => break false,
                Some(next) if (cur, next) == (u0, v0) => break true,
                Some(next) => {
                    used.push((cur, next));
                    path.push(next);
                    prev = cur;
                    cur = next;
                }
            }
            if used.len() > edge_limit {
                break false;
            }
        };

        for (a, b) in used {
            graph.remove_edge(a, b);
        }
        if closed && raw_area2(&path) > 0 {
            if let Ok(polygon) = Polygon(path) {
                resultant.push(polygon);
            }
        }
    }
    resultant
}

/// Computes the intersection of two polygons. Returns the clipped
/// region(s); empty if the polygons are disjoint or merely touching.
pub fn intersection(a: &Polygon, b: &Polygon) -> Vec<Polygon> {
    if a == b {
        return vec![a.clone()];
    }
    let mut kept = vec![];
    for frag in fragments(a, b) {
        match classify(&frag, b) {
            Loc::Inside => kept.push(frag),
            Loc::Boundary => {
                if boundary_codirected(&frag, b) == Some(true) {
                    kept.push(frag);
                }
            }
            Loc::Outside => {}
        }
    }
    for frag in fragments(b, a) {
        if classify(&frag, a) == Loc::Inside {
            kept.push(frag);
        }
    }
    assemble(kept)
}

/// Computes the difference `a \ b`. When `b` bisects `a`, the result has
/// exactly two pieces.
pub fn subtract(a: &Polygon, b: &Polygon) -> Vec<Polygon> {
    if a == b {
        return vec![];
    }
    let mut kept = vec![];
    for frag in fragments(a, b) {
        match classify(&frag, b) {
            Loc::Outside => kept.push(frag),
            Loc::Boundary => {
                if boundary_codirected(&frag, b) == Some(false) {
                    kept.push(frag);
                }
            }
            Loc::Inside => {}
        }
    }
    for frag in fragments(b, a) {
        if classify(&frag, a) == Loc::Inside {
            kept.push(frag.reversed());
        }
    }
    assemble(kept)
}

/// Splits `a` along a fully-crossing `cut` into exactly two pieces, such
/// that `cut ∪ left ∪ right = a`.
///
/// The piece containing the lexicographically smallest vertex of `a` is
/// `left`; this makes the labeling stable across runs regardless of input
/// ordering.
pub fn split_by_cut(a: &Polygon, cut: &Polygon) -> Result<(Polygon, Polygon), SplitError> {
    let mut pieces = subtract(a, cut);
    if pieces.len() != 2 {
        return Err(SplitError::DegenerateSplit {
            found: pieces.len(),
        });
    }

    let mut swap = None;
    for v in a.pts.iter().sorted() {
        let in0 = !matches!(pieces[0].contains_pt(v), PointLoc::Outside);
        let in1 = !matches!(pieces[1].contains_pt(v), PointLoc::Outside);
        match (in0, in1) {
            (true, false) => {
                swap = Some(false);
                break;
            }
            (false, true) => {
                swap = Some(true);
                break;
            }
            _ => {}
        }
    }
    if swap.unwrap_or_else(|| pieces[1].min_vertex() < pieces[0].min_vertex()) {
        pieces.swap(0, 1);
    }

    let right = pieces.pop().expect("two pieces");
    let left = pieces.pop().expect("two pieces");
    Ok((left, right))
}
