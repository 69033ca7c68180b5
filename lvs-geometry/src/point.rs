//! A 2D point on the fabrication grid.

use std::{
    fmt::Debug,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

/// A point in 2D space, with integer grid coordinates.
///
/// Ordering is lexicographic: by x, then by y.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pt {
    /// The x-coordinate of the point.
    pub x: i64,
    /// The y-coordinate of the point.
    pub y: i64,
}

impl Debug for Pt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Pt { x, y } = self;
        write!(f, "Pt({},{})", x, y)
    }
}

/// An alternate constructor for points.
#[allow(non_snake_case)]
pub fn Pt<T>(x: T, y: T) -> Pt
where
    i64: From<T>,
{
    Pt {
        x: x.into(),
        y: y.into(),
    }
}

impl From<(i64, i64)> for Pt {
    fn from((x, y): (i64, i64)) -> Pt {
        Pt { x, y }
    }
}

impl Add<Pt> for Pt {
    type Output = Self;
    fn add(self, rhs: Pt) -> Self::Output {
        Pt(self.x + rhs.x, self.y + rhs.y)
    }
}
impl AddAssign<Pt> for Pt {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}
impl Sub<Pt> for Pt {
    type Output = Self;
    fn sub(self, rhs: Pt) -> Self::Output {
        Pt(self.x - rhs.x, self.y - rhs.y)
    }
}
impl SubAssign<Pt> for Pt {
    fn sub_assign(&mut self, other: Self) {
        self.x -= other.x;
        self.y -= other.y;
    }
}
impl Neg for Pt {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Pt(-self.x, -self.y)
    }
}

impl Pt {
    /// Cross product of (origin, self) × (origin, other), widened to i128.
    pub fn cross(&self, other: &Pt) -> i128 {
        (self.x as i128) * (other.y as i128) - (self.y as i128) * (other.x as i128)
    }

    /// Dot product of (origin, self) • (origin, other), widened to i128.
    pub fn dot(&self, other: &Pt) -> i128 {
        (self.x as i128) * (other.x as i128) + (self.y as i128) * (other.y as i128)
    }
}

/// Orientation of the triangle (o, a, b): positive if counterclockwise,
/// negative if clockwise, zero if colinear.
pub fn orient(o: Pt, a: Pt, b: Pt) -> i128 {
    (a - o).cross(&(b - o))
}
