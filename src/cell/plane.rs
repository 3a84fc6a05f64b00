//! Oriented planes and their deterministic 2D parameterization.

use crate::cell::cut::{BoundaryCut, Cut};
use crate::float_types::{Real, angular_epsilon, distance_epsilon};
use nalgebra::{Matrix4, Point2, Point3, Vector2, Vector3};

/// An oriented plane `dot(normal, p) = offset`.
///
/// Points with `dot(normal, p) <= offset` are on the *inside*; for the faces of a
/// convex cell the normal therefore points out of the cell.
///
/// Every plane carries a local basis `(u, v)` derived only from its normal, so the
/// same plane always produces the same 2D coordinates for the same point. The basis
/// is right-handed (`u x v = normal`), which makes counter-clockwise order in the
/// 2D parameter space counter-clockwise as seen from outside the face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    normal: Vector3<Real>,
    offset: Real,
    u: Vector3<Real>,
    v: Vector3<Real>,
}

impl Plane {
    /// Create a plane from a normal (normalized here) and its offset from the origin.
    ///
    /// Returns `None` when the normal is zero or not finite.
    pub fn from_normal(normal: Vector3<Real>, offset: Real) -> Option<Self> {
        let len = normal.norm();
        if !len.is_finite() || len < Real::EPSILON || !offset.is_finite() {
            return None;
        }
        let normal = normal / len;
        let (u, v) = Self::basis_for(&normal);
        Some(Self {
            normal,
            offset: offset / len,
            u,
            v,
        })
    }

    /// Create a plane through `point` facing along `normal`.
    pub fn from_normal_and_point(normal: Vector3<Real>, point: &Point3<Real>) -> Option<Self> {
        let len = normal.norm();
        if !len.is_finite() || len < Real::EPSILON {
            return None;
        }
        let unit = normal / len;
        Self::from_normal(unit, unit.dot(&point.coords))
    }

    /// Pick the coordinate axis least aligned with `normal`, cross to build the first
    /// tangent and cross again for the second.
    fn basis_for(normal: &Vector3<Real>) -> (Vector3<Real>, Vector3<Real>) {
        let abs = normal.abs();
        let axis = if abs.x <= abs.y && abs.x <= abs.z {
            Vector3::x()
        } else if abs.y <= abs.z {
            Vector3::y()
        } else {
            Vector3::z()
        };
        let u = axis.cross(normal).normalize();
        let v = normal.cross(&u);
        (u, v)
    }

    pub const fn normal(&self) -> Vector3<Real> {
        self.normal
    }

    pub const fn offset(&self) -> Real {
        self.offset
    }

    /// First tangent of the local basis.
    pub const fn u(&self) -> Vector3<Real> {
        self.u
    }

    /// Second tangent of the local basis.
    pub const fn v(&self) -> Vector3<Real> {
        self.v
    }

    /// Origin of the local basis: the point of the plane closest to the world origin.
    pub fn origin(&self) -> Point3<Real> {
        Point3::from(self.normal * self.offset)
    }

    /// Positive outside, negative inside.
    pub fn signed_distance(&self, point: &Point3<Real>) -> Real {
        self.normal.dot(&point.coords) - self.offset
    }

    /// Return a flipped copy of this plane.
    pub fn flipped(&self) -> Self {
        let normal = -self.normal;
        let (u, v) = Self::basis_for(&normal);
        Self {
            normal,
            offset: -self.offset,
            u,
            v,
        }
    }

    /// Project a world point into this plane's 2D parameter space.
    pub fn to_local(&self, point: &Point3<Real>) -> Point2<Real> {
        let rel = point - self.origin();
        Point2::new(rel.dot(&self.u), rel.dot(&self.v))
    }

    /// Lift a 2D parameter-space point back onto the plane.
    pub fn to_world(&self, point: &Point2<Real>) -> Point3<Real> {
        self.origin() + self.u * point.x + self.v * point.y
    }

    /// Same orientation and position within the crate tolerances.
    pub fn is_coplanar(&self, other: &Plane) -> bool {
        1.0 - self.normal.dot(&other.normal) <= angular_epsilon()
            && (self.offset - other.offset).abs() <= distance_epsilon()
    }

    /// `other` is this plane seen from the other side: the plane shared by two cells
    /// that touch face to face.
    pub fn is_opposite(&self, other: &Plane) -> bool {
        1.0 + self.normal.dot(&other.normal) <= angular_epsilon()
            && (self.offset + other.offset).abs() <= distance_epsilon()
    }

    /// The boundary cut describing where `other` intersects this plane, expressed in
    /// this plane's basis. The kept side of the cut is the inside of `other`.
    ///
    /// Nearly parallel planes cannot intersect; the result is then
    /// [`Cut::ExcludesNone`] when this plane lies inside `other` by more than the
    /// distance epsilon and [`Cut::ExcludesAll`] otherwise, so a coplanar `other`
    /// excludes everything.
    pub fn get_cut(&self, other: &Plane) -> Cut {
        let origin = self.origin();
        let clearance = other.offset - other.normal.dot(&origin.coords);

        let dot = self.normal.dot(&other.normal);
        if 1.0 - dot.abs() <= angular_epsilon() {
            return if clearance > distance_epsilon() {
                Cut::ExcludesNone
            } else {
                Cut::ExcludesAll
            };
        }

        // In-plane component of `other`'s normal, expressed in (u, v).
        let raw = Vector2::new(other.normal.dot(&self.u), other.normal.dot(&self.v));
        let len = raw.norm();
        Cut::Bounded(BoundaryCut::new(raw / len, clearance / len))
    }

    /// Transform the plane by an affine matrix.
    ///
    /// The plane is rebuilt from three transformed basis points instead of an
    /// inverse-transpose normal, so non-uniform scale is handled. A mirroring
    /// transform (negative determinant) would turn the rebuilt normal inward; it is
    /// flipped back so the inside stays inside.
    ///
    /// Returns `None` when the transformed plane is degenerate.
    pub fn transform(&self, matrix: &Matrix4<Real>) -> Option<Plane> {
        let origin = self.origin();
        let o = matrix.transform_point(&origin);
        let a = matrix.transform_point(&(origin + self.u));
        let b = matrix.transform_point(&(origin + self.v));

        let mut normal = (a - o).cross(&(b - o));
        if matrix.fixed_view::<3, 3>(0, 0).determinant() < 0.0 {
            normal = -normal;
        }
        Plane::from_normal_and_point(normal, &o)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basis_is_orthonormal_and_right_handed() {
        for n in [
            Vector3::new(0.3, -0.2, 0.9),
            Vector3::x(),
            -Vector3::z(),
            Vector3::new(1.0, 1.0, 1.0),
        ] {
            let plane = Plane::from_normal(n, 2.0).unwrap();
            assert!((plane.u().norm() - 1.0).abs() < 1e-12);
            assert!((plane.v().norm() - 1.0).abs() < 1e-12);
            assert!(plane.u().dot(&plane.v()).abs() < 1e-12);
            assert!((plane.u().cross(&plane.v()) - plane.normal()).norm() < 1e-12);
        }
    }

    #[test]
    fn local_round_trip_stays_on_plane() {
        let plane = Plane::from_normal(Vector3::new(1.0, 2.0, -0.5), 1.5).unwrap();
        let local = Point2::new(0.7, -3.0);
        let world = plane.to_world(&local);
        assert!(plane.signed_distance(&world).abs() < 1e-12);
        assert!((plane.to_local(&world) - local).norm() < 1e-12);
    }

    #[test]
    fn parallel_planes_produce_sentinels() {
        let floor = Plane::from_normal(Vector3::z(), 0.0).unwrap();
        let ceiling = Plane::from_normal(Vector3::z(), 2.0).unwrap();
        assert!(matches!(floor.get_cut(&ceiling), Cut::ExcludesNone));
        assert!(matches!(ceiling.get_cut(&floor), Cut::ExcludesAll));
        assert!(matches!(floor.get_cut(&floor), Cut::ExcludesAll));
    }
}
