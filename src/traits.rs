use crate::cell::plane::Plane;
use crate::errors::CsgError;
use crate::float_types::Real;
use nalgebra::{Matrix3, Matrix4, Point3, Rotation3, Translation3, Vector3};

/// Reject matrices that would produce non-finite or collapsed geometry.
pub fn check_transform(matrix: &Matrix4<Real>) -> Result<(), CsgError> {
    if !matrix.iter().all(|v| v.is_finite()) {
        let origin = matrix.transform_point(&Point3::origin());
        return Err(CsgError::NonFiniteTransform(origin));
    }
    if matrix.fixed_view::<3, 3>(0, 0).determinant().abs() <= Real::EPSILON {
        return Err(CsgError::NonInvertibleTransform);
    }
    Ok(())
}

/// In-place affine transformations of cells and composites.
pub trait Transformable {
    fn transform(&mut self, matrix: &Matrix4<Real>) -> Result<(), CsgError>;

    /// Translate by x, y, and z.
    fn translate(&mut self, x: Real, y: Real, z: Real) -> Result<(), CsgError> {
        self.transform(&Translation3::new(x, y, z).to_homogeneous())
    }

    /// Rotate by x_deg, y_deg, z_deg (applied in that order).
    fn rotate(&mut self, x_deg: Real, y_deg: Real, z_deg: Real) -> Result<(), CsgError> {
        let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), x_deg.to_radians());
        let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), y_deg.to_radians());
        let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), z_deg.to_radians());
        self.transform(&(rz * ry * rx).to_homogeneous())
    }

    /// Scale by sx, sy, sz. Non-uniform factors are fine; a zero factor is rejected.
    fn scale(&mut self, sx: Real, sy: Real, sz: Real) -> Result<(), CsgError> {
        self.transform(&Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz)))
    }

    /// Reflect about `plane`.
    fn mirror(&mut self, plane: &Plane) -> Result<(), CsgError> {
        let n = plane.normal();
        let offset = n * plane.offset();

        let mut reflect = Matrix4::identity();
        let reflect_3 = Matrix3::identity() - 2.0 * n * n.transpose();
        reflect.fixed_view_mut::<3, 3>(0, 0).copy_from(&reflect_3);

        let to_origin = Translation3::from(-offset).to_homogeneous();
        let back = Translation3::from(offset).to_homogeneous();
        self.transform(&(back * reflect * to_origin))
    }
}
