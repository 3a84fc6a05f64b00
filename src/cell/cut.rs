//! Boundary cuts: convex polygons as sets of 2D half-planes.
//!
//! A face polygon is never stored as a vertex loop. It is the intersection of a set
//! of [`BoundaryCut`]s living in the face plane's 2D basis, each remembering the
//! interval of its own line that currently forms a polygon edge. Splitting a
//! polygon by a line is then pure interval arithmetic on those cuts.

use crate::cell::plane::Plane;
use crate::pool::CutPool;
use crate::float_types::{Real, UNBOUNDED_DISTANCE, angular_epsilon, distance_epsilon};
use nalgebra::{Point2, Point3, Vector2};

/// A half-plane `dot(normal, p) <= distance` in a face's 2D basis.
///
/// The edge line is parameterized as `normal * distance + direction * t` where
/// `direction` is `normal` rotated a quarter turn counter-clockwise; `[min, max]` is
/// the range of `t` that is part of the polygon boundary. Walking every cut from
/// `min` to `max` in order of [`angle`](Self::angle) traces the polygon
/// counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryCut {
    pub normal: Vector2<Real>,
    pub distance: Real,
    pub min: Real,
    pub max: Real,
    angle: Real,
}

/// The intersection of one plane with another, seen from the first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cut {
    /// The other plane keeps the whole first plane.
    ExcludesNone,
    /// The other plane keeps nothing of the first plane.
    ExcludesAll,
    /// A real line crossing the first plane.
    Bounded(BoundaryCut),
}

/// Outcome of splitting a polygon by a cut.
#[derive(Debug, Clone, PartialEq)]
pub enum CutSplit {
    /// The whole polygon lies on the kept (positive) side.
    Unchanged,
    /// The whole polygon lies on the excluded (negative) side.
    Excluded,
    /// A genuine two-way split, each side a valid polygon.
    Split {
        positive: Vec<BoundaryCut>,
        negative: Vec<BoundaryCut>,
    },
}

impl BoundaryCut {
    /// An unbounded cut; `normal` must be unit length.
    pub fn new(normal: Vector2<Real>, distance: Real) -> Self {
        Self {
            normal,
            distance,
            min: Real::NEG_INFINITY,
            max: Real::INFINITY,
            angle: normal.y.atan2(normal.x),
        }
    }

    /// Build the cut supporting segment `a -> b`, oriented so that `interior` is kept.
    ///
    /// Returns `None` when the segment is shorter than the distance epsilon.
    pub fn from_segment(a: Point2<Real>, b: Point2<Real>, interior: &Point2<Real>) -> Option<Self> {
        let delta = b - a;
        let len = delta.norm();
        if !(len >= distance_epsilon()) {
            return None;
        }
        let dir = delta / len;
        let mut normal = Vector2::new(dir.y, -dir.x);
        if normal.dot(&(interior - a)) > 0.0 {
            normal = -normal;
        }
        let cut = Self::new(normal, normal.dot(&a.coords));
        let (ta, tb) = (cut.param_of(&a), cut.param_of(&b));
        Some(cut.with_interval(ta.min(tb), ta.max(tb)))
    }

    pub const fn with_interval(mut self, min: Real, max: Real) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Polar angle of the normal, used to order cuts around a polygon.
    pub const fn angle(&self) -> Real {
        self.angle
    }

    /// Unit direction of travel along the edge.
    pub fn direction(&self) -> Vector2<Real> {
        Vector2::new(-self.normal.y, self.normal.x)
    }

    /// Edge parameter of the projection of `point` onto the cut line.
    pub fn param_of(&self, point: &Point2<Real>) -> Real {
        self.direction().dot(&point.coords)
    }

    /// Point on the cut line at parameter `t`; infinite parameters are replaced by
    /// the placeholder [`UNBOUNDED_DISTANCE`].
    pub fn get_point(&self, t: Real) -> Point2<Real> {
        let t = if t.is_finite() {
            t
        } else {
            UNBOUNDED_DISTANCE.copysign(t)
        };
        Point2::from(self.normal * self.distance + self.direction() * t)
    }

    /// Where the edge starts (counter-clockwise).
    pub fn start(&self) -> Point2<Real> {
        self.get_point(self.min)
    }

    /// Where the edge ends; the "outer bound" point used for triangulation.
    pub fn end(&self) -> Point2<Real> {
        self.get_point(self.max)
    }

    pub fn is_bounded(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    pub fn length(&self) -> Real {
        self.max - self.min
    }

    /// Positive outside the kept half-plane.
    pub fn signed_distance(&self, point: &Point2<Real>) -> Real {
        self.normal.dot(&point.coords) - self.distance
    }

    /// The complementary half-plane, with the same edge traversed backwards.
    pub fn flipped(&self) -> Self {
        Self::new(-self.normal, -self.distance).with_interval(-self.max, -self.min)
    }
}

/// `true` when the polygon is closed: every cut has a finite interval.
pub fn is_closed(cuts: &[BoundaryCut]) -> bool {
    !cuts.is_empty() && cuts.iter().all(BoundaryCut::is_bounded)
}

/// Polygon corners in counter-clockwise order, one per cut.
///
/// For a closed polygon each corner is where a cut line meets the line of the next
/// cut, so an edge shorter than the distance epsilon that was dropped during a split
/// does not leave a gap. Open polygons fall back to each cut's outer bound.
pub fn vertices(cuts: &[BoundaryCut]) -> Vec<Point2<Real>> {
    if cuts.len() < 3 || !is_closed(cuts) {
        return cuts.iter().map(BoundaryCut::end).collect();
    }
    let n = cuts.len();
    (0..n).map(|i| corner(&cuts[i], &cuts[(i + 1) % n])).collect()
}

/// Intersection of the lines of two consecutive cuts, or the outer bound of `a` when
/// the lines are parallel or meet far from it.
fn corner(a: &BoundaryCut, b: &BoundaryCut) -> Point2<Real> {
    let end = a.end();
    let det = a.normal.perp(&b.normal);
    if det.abs() <= angular_epsilon() {
        return end;
    }
    let p = Point2::new(
        (a.distance * b.normal.y - b.distance * a.normal.y) / det,
        (a.normal.x * b.distance - b.normal.x * a.distance) / det,
    );
    if (p - end).norm() <= 4.0 * distance_epsilon() {
        p
    } else {
        end
    }
}

/// Signed area of the polygon (positive for a well-formed polygon).
pub fn area(cuts: &[BoundaryCut]) -> Real {
    let pts = vertices(cuts);
    if pts.len() < 3 {
        return 0.0;
    }
    let twice: Real = pts
        .iter()
        .zip(pts.iter().cycle().skip(1))
        .map(|(a, b)| a.coords.perp(&b.coords))
        .sum();
    twice * 0.5
}

/// Area centroid of the polygon; falls back to the vertex average for slivers.
pub fn centroid(cuts: &[BoundaryCut]) -> Point2<Real> {
    let pts = vertices(cuts);
    if pts.is_empty() {
        return Point2::origin();
    }
    let mean = pts.iter().fold(Vector2::zeros(), |acc, p| acc + p.coords) / pts.len() as Real;

    let mut twice_area = 0.0;
    let mut acc = Vector2::zeros();
    for (a, b) in pts.iter().zip(pts.iter().cycle().skip(1)) {
        let (a, b) = (a.coords - mean, b.coords - mean);
        let w = a.perp(&b);
        twice_area += w;
        acc += (a + b) * w;
    }
    if twice_area.abs() <= Real::EPSILON {
        return Point2::from(mean);
    }
    Point2::from(mean + acc / (3.0 * twice_area))
}

/// Half-plane test against every cut, with the distance epsilon as slack.
pub fn contains_point(cuts: &[BoundaryCut], point: &Point2<Real>) -> bool {
    let eps = distance_epsilon();
    cuts.iter().all(|c| c.signed_distance(point) <= eps)
}

pub fn sort_by_angle(cuts: &mut [BoundaryCut]) {
    cuts.sort_by(|a, b| a.angle.total_cmp(&b.angle));
}

/// Split a polygon by a plane-derived [`Cut`], resolving the sentinels first.
pub fn split_polygon(cuts: &[BoundaryCut], cut: &Cut) -> CutSplit {
    split_polygon_in(cuts, cut, &mut CutPool::default())
}

/// [`split_polygon`] drawing the output buffers from `pool`.
pub fn split_polygon_in(cuts: &[BoundaryCut], cut: &Cut, pool: &mut CutPool) -> CutSplit {
    match cut {
        Cut::ExcludesNone => CutSplit::Unchanged,
        Cut::ExcludesAll => CutSplit::Excluded,
        Cut::Bounded(cut) => split_cuts_in(cuts, cut, pool),
    }
}

/// Split the polygon `cuts` by the line of `cut`; see [`split_cuts_in`].
pub fn split_cuts(cuts: &[BoundaryCut], cut: &BoundaryCut) -> CutSplit {
    split_cuts_in(cuts, cut, &mut CutPool::default())
}

/// Split the polygon `cuts` by the line of `cut` into the part satisfying `cut`
/// (positive) and the rest (negative).
///
/// A polygon that merely touches the line (every vertex within the distance
/// epsilon on one side, or exactly on it) goes wholly to the side that holds its
/// interior; a zero-area polygon with no interior to decide by stays `Unchanged`.
/// For closed polygons the result is never a partial split: a side that would be
/// left with fewer than three bounded cuts collapses the result to `Unchanged` or
/// `Excluded`.
///
/// Both sides of a [`CutSplit::Split`] are buffers acquired from `pool`; the caller
/// either releases them or detaches the ones it keeps.
pub fn split_cuts_in(cuts: &[BoundaryCut], cut: &BoundaryCut, pool: &mut CutPool) -> CutSplit {
    let eps = distance_epsilon();
    let closed = is_closed(cuts);

    if closed {
        let (lo, hi) = vertices(cuts)
            .iter()
            .map(|p| cut.signed_distance(p))
            .fold((Real::INFINITY, Real::NEG_INFINITY), |(lo, hi), s| (lo.min(s), hi.max(s)));
        if hi <= eps {
            return CutSplit::Unchanged;
        }
        if lo >= -eps {
            return CutSplit::Excluded;
        }
    }

    let (tmin, tmax) = clip_line(cuts, cut);
    if !(tmax - tmin >= eps) {
        return side_of(cuts, cut);
    }

    let mut positive = pool.acquire();
    let mut negative = pool.acquire();
    let ang = angular_epsilon();

    for edge in cuts {
        let dot = cut.normal.dot(&edge.normal);
        let cross = cut.normal.perp(&edge.normal);
        // Signed distance to `cut` at the edge foot point (t = 0); along the edge it
        // changes as `s0 - cross * t`.
        let s0 = edge.distance * dot - cut.distance;

        if cross.abs() <= ang {
            if s0 <= 0.0 {
                positive.push(*edge);
            } else {
                negative.push(*edge);
            }
            continue;
        }

        let t = s0 / cross;
        let (pos, neg) = if cross > 0.0 {
            ((edge.min.max(t), edge.max), (edge.min, edge.max.min(t)))
        } else {
            ((edge.min, edge.max.min(t)), (edge.min.max(t), edge.max))
        };
        if pos.1 - pos.0 >= eps {
            positive.push(edge.with_interval(pos.0, pos.1));
        }
        if neg.1 - neg.0 >= eps {
            negative.push(edge.with_interval(neg.0, neg.1));
        }
    }

    let closing = cut.with_interval(tmin, tmax);
    positive.push(closing);
    negative.push(closing.flipped());
    sort_by_angle(&mut positive);
    sort_by_angle(&mut negative);

    if closed {
        let valid = |side: &[BoundaryCut]| side.len() >= 3 && is_closed(side);
        let fallback = match (valid(&positive), valid(&negative)) {
            (true, true) => None,
            (true, false) => Some(CutSplit::Unchanged),
            (false, true) => Some(CutSplit::Excluded),
            (false, false) => Some(side_of(cuts, cut)),
        };
        if let Some(result) = fallback {
            pool.release(positive);
            pool.release(negative);
            return result;
        }
    }

    CutSplit::Split { positive, negative }
}

/// Parameter range of `cut`'s line that lies inside every cut of the polygon.
fn clip_line(cuts: &[BoundaryCut], cut: &BoundaryCut) -> (Real, Real) {
    let eps = distance_epsilon();
    let ang = angular_epsilon();
    let mut tmin = Real::NEG_INFINITY;
    let mut tmax = Real::INFINITY;

    for edge in cuts {
        let dot = edge.normal.dot(&cut.normal);
        let cross = cut.normal.perp(&edge.normal);
        // Along `cut`'s line the edge constraint reads `cross * t <= room`.
        let room = edge.distance - dot * cut.distance;
        if cross.abs() <= ang {
            if room <= eps {
                return (Real::INFINITY, Real::NEG_INFINITY);
            }
            continue;
        }
        let t = room / cross;
        if cross > 0.0 {
            tmax = tmax.min(t);
        } else {
            tmin = tmin.max(t);
        }
    }
    (tmin, tmax)
}

/// Which side holds the polygon when the cut line does not cross it: the sample
/// point farthest from the line decides.
fn side_of(cuts: &[BoundaryCut], cut: &BoundaryCut) -> CutSplit {
    let mut extreme: Real = 0.0;
    for edge in cuts {
        let mid = if edge.is_bounded() {
            0.5 * (edge.min + edge.max)
        } else if edge.min.is_finite() {
            edge.min + UNBOUNDED_DISTANCE
        } else if edge.max.is_finite() {
            edge.max - UNBOUNDED_DISTANCE
        } else {
            0.0
        };
        for t in [edge.min, mid, edge.max] {
            let s = cut.signed_distance(&edge.get_point(t));
            if s.abs() > extreme.abs() {
                extreme = s;
            }
        }
    }
    if extreme > 0.0 {
        CutSplit::Excluded
    } else {
        CutSplit::Unchanged
    }
}

/// Re-express a closed polygon of `from` in the basis of `to`, passing every corner
/// through `map` on the way (identity for a change of basis, an affine transform for
/// [`Transformable`](crate::traits::Transformable) implementations).
///
/// Edges are rebuilt from their mapped endpoints and re-oriented against the mapped
/// centroid, so mirroring maps keep every cut facing outwards. Returns `None` when
/// fewer than three edges survive.
pub fn remap_cuts<F>(
    cuts: &[BoundaryCut],
    from: &Plane,
    to: &Plane,
    map: F,
) -> Option<Vec<BoundaryCut>>
where
    F: Fn(Point3<Real>) -> Point3<Real>,
{
    if !is_closed(cuts) {
        return None;
    }
    let project = |p: &Point2<Real>| to.to_local(&map(from.to_world(p)));
    let interior = project(&centroid(cuts));
    if !interior.coords.iter().all(|c| c.is_finite()) {
        return None;
    }

    let corners: Vec<Point2<Real>> = vertices(cuts).iter().map(project).collect();
    let n = corners.len();
    let mut out: Vec<BoundaryCut> = (0..n)
        .filter_map(|i| BoundaryCut::from_segment(corners[(i + n - 1) % n], corners[i], &interior))
        .collect();
    if out.len() < 3 {
        return None;
    }
    sort_by_angle(&mut out);
    Some(out)
}
