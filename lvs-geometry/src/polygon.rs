//! A closed simple polygon on the integer grid.

use crate::{
    boolean,
    point::{orient, Pt},
    segment::{Contains, Segment},
};
use itertools::Itertools;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// A general error arising from trying to construct a Polygon.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolygonConstructorError {
    /// It is not possible to construct a polygon from two or fewer distinct points.
    #[error("It is not possible to construct a polygon from two or fewer distinct points.")]
    TooFewPoints,
    /// It is not possible to construct a polygon with no interior area.
    #[error("It is not possible to construct a polygon with no interior area.")]
    ZeroArea,
}

/// Whether a point lies outside, inside, or on a vertex or edge of a polygon.
#[derive(Debug, PartialEq, Eq)]
pub enum PointLoc {
    /// A point lies outside a polygon.
    Outside,
    /// A point lies inside a polygon.
    Inside,
    /// A point lies on the nth point of a polygon.
    OnPoint(usize),
    /// A point lies on the nth segment of a polygon.
    OnSegment(usize),
}

// Coarse location in doubled coordinates, for classifying segment midpoints.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) enum Loc {
    Outside,
    Boundary,
    Inside,
}

/// A closed polygon: an ordered ring of grid vertices, the last implicitly
/// connected back to the first.
///
/// Construction sanitizes the ring (duplicate and colinear vertices removed)
/// and orients it positively (counterclockwise), so area is always > 0.
#[derive(Debug, Clone, Eq)]
pub struct Polygon {
    /// The points which describe the polygon.
    pub pts: Vec<Pt>,
}

/// Constructor for polygons. Polygons must have interior area, so they must
/// keep three or more vertices after duplicate and colinear vertices are
/// dropped.
#[allow(non_snake_case)]
pub fn Polygon(a: impl IntoIterator<Item = Pt>) -> Result<Polygon, PolygonConstructorError> {
    let mut pts: Vec<Pt> = a.into_iter().collect();
    if pts.len() > 1 && pts.first() == pts.last() {
        let _ = pts.pop();
    }

    let pts = sanitize(pts);
    if pts.len() < 3 {
        return Err(PolygonConstructorError::TooFewPoints);
    }

    let mut p = Polygon { pts };
    match p.area2() {
        0 => Err(PolygonConstructorError::ZeroArea),
        a if a < 0 => {
            p.pts.reverse();
            Ok(p)
        }
        _ => Ok(p),
    }
}

/// Convenience constructor for axis-aligned rectangles, from the bottom-left
/// corner and a (width, height) pair.
#[allow(non_snake_case)]
pub fn Rect(bl: Pt, (w, h): (i64, i64)) -> Result<Polygon, PolygonConstructorError> {
    Polygon([bl, bl + Pt(w, 0), bl + Pt(w, h), bl + Pt(0, h)])
}

// Drops duplicate vertices, colinear middle vertices, and doubled-back
// spikes, repeating until the ring is stable. This is what keeps sliver
// artifacts from boolean outputs out of downstream touching tests.
fn sanitize(mut pts: Vec<Pt>) -> Vec<Pt> {
    loop {
        let n = pts.len();
        if n < 3 {
            return pts;
        }
        let mut out: Vec<Pt> = Vec::with_capacity(n);
        for i in 0..n {
            let prev = pts[(i + n - 1) % n];
            let cur = pts[i];
            let next = pts[(i + 1) % n];
            if cur == next {
                continue;
            }
            if orient(prev, cur, next) == 0 {
                continue;
            }
            out.push(cur);
        }
        if out.len() == n {
            return out;
        }
        pts = out;
    }
}

impl PartialEq for Polygon {
    // Vertex rings are compared as unordered cyclic sequences: any rotation
    // in either direction is the same polygon.
    fn eq(&self, other: &Self) -> bool {
        if self.pts.len() != other.pts.len() {
            return false;
        }
        canonical(&self.pts) == canonical(&other.pts)
    }
}

impl Hash for Polygon {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Hashes the sorted vertex multiset, which is invariant under
        // rotation and reversal, keeping Hash consistent with PartialEq.
        for pt in self.pts.iter().sorted() {
            pt.hash(state);
        }
    }
}

fn rotate_to_min(pts: &[Pt]) -> Vec<Pt> {
    let idx = pts
        .iter()
        .enumerate()
        .min_by_key(|(_, p)| **p)
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    pts.iter().cycle().skip(idx).take(pts.len()).copied().collect()
}

fn canonical(pts: &[Pt]) -> Vec<Pt> {
    let fwd = rotate_to_min(pts);
    let rev: Vec<Pt> = pts.iter().rev().copied().collect();
    let rev = rotate_to_min(&rev);
    fwd.min(rev)
}

impl Polygon {
    /// Returns the segments of the polygon, including the final closure.
    pub fn to_segments(&self) -> Vec<Segment> {
        self.pts
            .iter()
            .zip(self.pts.iter().cycle().skip(1))
            .map(|(x, y)| Segment(*x, *y))
            .collect()
    }

    /// Twice the signed area (shoelace). Positive after construction, since
    /// construction orients positively.
    pub fn area2(&self) -> i128 {
        self.pts
            .iter()
            .zip(self.pts.iter().cycle().skip(1))
            .map(|(a, b)| a.cross(b))
            .sum()
    }

    /// The bounding box of the polygon, as (min corner, max corner).
    pub fn bounds(&self) -> (Pt, Pt) {
        let min_x = self.pts.iter().map(|p| p.x).min().expect("not empty");
        let min_y = self.pts.iter().map(|p| p.y).min().expect("not empty");
        let max_x = self.pts.iter().map(|p| p.x).max().expect("not empty");
        let max_y = self.pts.iter().map(|p| p.y).max().expect("not empty");
        (Pt { x: min_x, y: min_y }, Pt { x: max_x, y: max_y })
    }

    /// The lexicographically smallest vertex.
    pub fn min_vertex(&self) -> Pt {
        *self.pts.iter().min().expect("not empty")
    }

    /// Calculates whether a point is within, without, or along the polygon.
    /// Exact: boundary cases never depend on an epsilon.
    pub fn contains_pt(&self, other: &Pt) -> PointLoc {
        for (idx, pt) in self.pts.iter().enumerate() {
            if other == pt {
                return PointLoc::OnPoint(idx);
            }
        }
        for (idx, sg) in self.to_segments().iter().enumerate() {
            if matches!(sg.contains_pt(other), Some(Contains::Within)) {
                return PointLoc::OnSegment(idx);
            }
        }

        if self.interior_crossing_number(other.x, other.y, 1) {
            PointLoc::Inside
        } else {
            PointLoc::Outside
        }
    }

    // Even-odd ray cast to +x with the half-open vertex rule. The point is
    // known to be off the boundary. |scale| multiplies the polygon's own
    // coordinates, so (px, py) may live on a finer grid.
    fn interior_crossing_number(&self, px: i64, py: i64, scale: i64) -> bool {
        let mut inside = false;
        let n = self.pts.len();
        for i in 0..n {
            let a = self.pts[i];
            let b = self.pts[(i + 1) % n];
            let (ax, ay) = (a.x * scale, a.y * scale);
            let (bx, by) = (b.x * scale, b.y * scale);
            if (ay > py) == (by > py) {
                continue;
            }
            // The edge straddles the ray's y; compare px against the exact
            // x of the edge at that y, cross-multiplied to stay integer.
            let dy = (by - ay) as i128;
            let lhs = ((px - ax) as i128) * dy;
            let rhs = ((py - ay) as i128) * ((bx - ax) as i128);
            let crossed = if dy > 0 { lhs < rhs } else { lhs > rhs };
            if crossed {
                inside = !inside;
            }
        }
        inside
    }

    // Locates a point given in doubled coordinates (e.g. a segment
    // midpoint) against this polygon, exactly.
    pub(crate) fn locate_doubled(&self, dx: i64, dy: i64) -> Loc {
        let n = self.pts.len();
        for i in 0..n {
            let a = self.pts[i];
            let b = self.pts[(i + 1) % n];
            let (ax, ay) = (a.x * 2, a.y * 2);
            let (bx, by) = (b.x * 2, b.y * 2);
            let cross = ((bx - ax) as i128) * ((dy - ay) as i128)
                - ((by - ay) as i128) * ((dx - ax) as i128);
            if cross == 0
                && (ax.min(bx)..=ax.max(bx)).contains(&dx)
                && (ay.min(by)..=ay.max(by)).contains(&dy)
            {
                return Loc::Boundary;
            }
        }
        if self.interior_crossing_number(dx, dy, 2) {
            Loc::Inside
        } else {
            Loc::Outside
        }
    }

    /// Returns true iff the closed regions of the two polygons share area.
    /// A shared edge or a shared vertex alone does not count.
    pub fn intersects(&self, other: &Polygon) -> bool {
        let (amin, amax) = self.bounds();
        let (bmin, bmax) = other.bounds();
        if amax.x <= bmin.x || bmax.x <= amin.x || amax.y <= bmin.y || bmax.y <= amin.y {
            return false;
        }
        if self == other {
            return true;
        }
        if self
            .pts
            .iter()
            .any(|p| matches!(other.contains_pt(p), PointLoc::Inside))
            || other
                .pts
                .iter()
                .any(|p| matches!(self.contains_pt(p), PointLoc::Inside))
        {
            return true;
        }
        if self
            .to_segments()
            .iter()
            .map(|sg| sg.midpoint_doubled())
            .any(|(mx, my)| other.locate_doubled(mx, my) == Loc::Inside)
            || other
                .to_segments()
                .iter()
                .map(|sg| sg.midpoint_doubled())
                .any(|(mx, my)| self.locate_doubled(mx, my) == Loc::Inside)
        {
            return true;
        }
        // Slow path: the overlap region (if any) is too small for the
        // sampling tests above to see.
        !boolean::intersection(self, other).is_empty()
    }

    /// Returns true iff the closed regions share at least one point. Unlike
    /// [`Polygon::intersects`], a shared edge stretch or a single shared
    /// vertex counts.
    pub fn touches(&self, other: &Polygon) -> bool {
        let (amin, amax) = self.bounds();
        let (bmin, bmax) = other.bounds();
        if amax.x < bmin.x || bmax.x < amin.x || amax.y < bmin.y || bmax.y < amin.y {
            return false;
        }
        if self
            .pts
            .iter()
            .any(|p| !matches!(other.contains_pt(p), PointLoc::Outside))
            || other
                .pts
                .iter()
                .any(|p| !matches!(self.contains_pt(p), PointLoc::Outside))
        {
            return true;
        }
        // No vertex of either lies in or on the other; any remaining contact
        // must show up as a boundary crossing.
        itertools::iproduct!(self.to_segments(), other.to_segments())
            .any(|(a, b)| a.intersects(&b).is_some())
    }

    /// Returns true iff no two non-adjacent edges touch and no two adjacent
    /// edges share more than their common endpoint.
    pub fn is_simple(&self) -> bool {
        let segments = self.to_segments();
        let n = segments.len();
        for (i, j) in itertools::iproduct!(0..n, 0..n) {
            if i >= j {
                continue;
            }
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            match segments[i].intersects(&segments[j]) {
                None => {}
                Some(crate::segment::IsxnOutcome::Yes(pt)) => {
                    if !adjacent {
                        return false;
                    }
                    let shared = if j == i + 1 { segments[i].f } else { segments[i].i };
                    if pt != shared {
                        return false;
                    }
                }
                Some(_) => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_too_few_points() {
        assert_eq!(
            Polygon([Pt(0, 0), Pt(0, 1)]).unwrap_err(),
            PolygonConstructorError::TooFewPoints,
        );
        // Three points, but only two distinct.
        assert_eq!(
            Polygon([Pt(0, 0), Pt(0, 1), Pt(0, 0)]).unwrap_err(),
            PolygonConstructorError::TooFewPoints,
        );
    }

    #[test]
    fn test_zero_area() {
        // A bowtie whose two lobes cancel exactly.
        assert_eq!(
            Polygon([Pt(0, 0), Pt(2, 2), Pt(2, 0), Pt(0, 2)]).unwrap_err(),
            PolygonConstructorError::ZeroArea,
        );
    }

    #[test]
    fn test_sanitize_drops_colinear_middles() {
        assert_eq!(
            Polygon([Pt(0, 0), Pt(1, 0), Pt(2, 0), Pt(2, 2), Pt(0, 2)]).unwrap(),
            Rect(Pt(0, 0), (2, 2)).unwrap(),
        );
    }

    #[test]
    fn test_construction_orients_positively() {
        let cw = Polygon([Pt(0, 0), Pt(0, 2), Pt(2, 2), Pt(2, 0)]).unwrap();
        assert!(cw.area2() > 0);
    }

    #[test]
    fn test_cyclic_equality() {
        let a = Polygon([Pt(0, 0), Pt(2, 0), Pt(2, 2), Pt(0, 2)]).unwrap();
        let b = Polygon([Pt(2, 2), Pt(0, 2), Pt(0, 0), Pt(2, 0)]).unwrap();
        let c = Polygon([Pt(0, 0), Pt(2, 0), Pt(2, 2), Pt(0, 3)]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_area2() {
        assert_eq!(Rect(Pt(0, 0), (4, 2)).unwrap().area2(), 16);
    }

    #[test]
    fn test_contains_pt() {
        //   ^
        //   |
        //   A  B  C
        //   |
        //   D  E  F
        //   |
        // --G--H--I->
        //   |
        let a = Pt(0, 2);
        let b = Pt(1, 2);
        let c = Pt(2, 2);
        let d = Pt(0, 1);
        let e = Pt(1, 1);
        let f = Pt(2, 1);
        let g = Pt(0, 0);
        let h = Pt(1, 0);
        let i = Pt(2, 0);

        let frame = Polygon([g, i, c, a]).unwrap();
        assert_eq!(frame.contains_pt(&e), PointLoc::Inside);
        assert_eq!(frame.contains_pt(&g), PointLoc::OnPoint(0));
        assert!(matches!(frame.contains_pt(&h), PointLoc::OnSegment(_)));
        assert!(matches!(frame.contains_pt(&b), PointLoc::OnSegment(_)));
        assert_eq!(frame.contains_pt(&Pt(3, 1)), PointLoc::Outside);
        assert_eq!(frame.contains_pt(&Pt(-1, 1)), PointLoc::Outside);

        let diamond = Polygon([h, f, b, d]).unwrap();
        assert_eq!(diamond.contains_pt(&e), PointLoc::Inside);
        for p in [a, c, g, i] {
            assert_eq!(diamond.contains_pt(&p), PointLoc::Outside);
        }
    }

    #[test]
    fn test_intersects_area_only() {
        //   ^
        //   |
        //   A  B  C
        //   |
        //   D  E  F
        //   |
        // --G--H--I->
        //   |
        let a = Pt(0, 2);
        let b = Pt(1, 2);
        let c = Pt(2, 2);
        let d = Pt(0, 1);
        let e = Pt(1, 1);
        let f = Pt(2, 1);
        let g = Pt(0, 0);
        let h = Pt(1, 0);
        let i = Pt(2, 0);

        // Positive-area overlaps.
        let frame = Polygon([a, c, i, g]).unwrap();
        assert!(frame.intersects(&Polygon([b, f, h, d]).unwrap()));
        assert!(frame.intersects(&Polygon([a, b, e, d]).unwrap()));
        assert!(frame.intersects(&frame.clone()));

        // Sharing only a corner is not an intersection.
        assert!(!Polygon([a, b, e, d])
            .unwrap()
            .intersects(&Polygon([e, f, i, h]).unwrap()));
        // Sharing only an edge is not an intersection.
        assert!(!Polygon([a, b, e, d])
            .unwrap()
            .intersects(&Polygon([b, c, f, e]).unwrap()));
        // Disjoint.
        assert!(!Polygon([a, b, d])
            .unwrap()
            .intersects(&Polygon([f, h, i]).unwrap()));
    }

    #[test]
    fn test_intersects_contained() {
        let outer = Rect(Pt(0, 0), (10, 10)).unwrap();
        let inner = Rect(Pt(2, 2), (2, 2)).unwrap();
        assert!(outer.intersects(&inner));
        assert!(inner.intersects(&outer));
    }

    #[test]
    fn test_intersects_inscribed_diamond() {
        // Every diamond vertex lies on the square's boundary, yet the two
        // share all of the diamond's area.
        let square = Rect(Pt(0, 0), (4, 4)).unwrap();
        let diamond = Polygon([Pt(2, 0), Pt(4, 2), Pt(2, 4), Pt(0, 2)]).unwrap();
        assert!(square.intersects(&diamond));
    }

    #[test]
    fn test_touches() {
        let a = Rect(Pt(0, 0), (2, 2)).unwrap();
        // Edge-sharing and corner-sharing both count as touching.
        assert!(a.touches(&Rect(Pt(2, 0), (2, 2)).unwrap()));
        assert!(a.touches(&Rect(Pt(2, 2), (2, 2)).unwrap()));
        // So do overlap and containment.
        assert!(a.touches(&Rect(Pt(1, 1), (2, 2)).unwrap()));
        assert!(Rect(Pt(-1, -1), (4, 4)).unwrap().touches(&a));
        assert!(a.touches(&Rect(Pt(-1, -1), (4, 4)).unwrap()));
        // Disjoint does not.
        assert!(!a.touches(&Rect(Pt(3, 0), (2, 2)).unwrap()));
    }

    #[test]
    fn test_is_simple() {
        assert!(Rect(Pt(0, 0), (2, 2)).unwrap().is_simple());
        let bowtie = Polygon {
            pts: vec![Pt(0, 0), Pt(2, 2), Pt(2, 0), Pt(0, 2)],
        };
        assert!(!bowtie.is_simple());
    }

    #[test]
    fn test_min_vertex() {
        assert_eq!(Rect(Pt(3, 1), (2, 2)).unwrap().min_vertex(), Pt(3, 1));
    }
}
