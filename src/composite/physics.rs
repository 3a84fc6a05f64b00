//! Mass and rigid-body boundary for physics consumers.

use super::CompositeSolid;
use crate::cell::ConvexCell;
use crate::errors::CsgError;
use crate::float_types::{
    Real,
    parry3d::mass_properties::MassProperties,
    rapier3d::prelude::{
        ColliderBuilder, ColliderSet, RigidBodyBuilder, RigidBodyHandle, RigidBodySet, SharedShape,
    },
};
use nalgebra::{Isometry3, Point3, UnitQuaternion, Vector3};

impl CompositeSolid {
    /// Total mass: each cell's volume times the density of its material.
    pub fn mass<D>(&self, density: D) -> Real
    where
        D: Fn(u32) -> Real,
    {
        self.cells
            .values()
            .map(|c| c.volume() * density(c.material()))
            .sum()
    }

    /// Mass, center of mass and principal inertia frame, from the convex hull of
    /// every cell.
    ///
    /// ## Errors
    /// [`CsgError::DegenerateShape`] if the solid is empty or a cell has no volume.
    pub fn mass_properties<D>(
        &self,
        density: D,
    ) -> Result<(Real, Point3<Real>, UnitQuaternion<Real>), CsgError>
    where
        D: Fn(u32) -> Real,
    {
        if self.cells.is_empty() {
            return Err(CsgError::DegenerateShape("solid has no cells".into()));
        }
        let mut total = MassProperties::default();
        for cell in self.cells.values() {
            let shape = cell.to_convex_shape()?;
            total += shape.mass_properties(density(cell.material()));
        }
        Ok((
            total.mass(),
            total.local_com,
            total.principal_inertia_local_frame,
        ))
    }

    /// One compound shape made of the convex hull of every cell.
    pub fn to_compound_shape(&self) -> Result<SharedShape, CsgError> {
        let parts = self
            .cells
            .values()
            .map(|c| Ok((Isometry3::identity(), c.to_convex_shape()?)))
            .collect::<Result<Vec<_>, CsgError>>()?;
        if parts.is_empty() {
            return Err(CsgError::DegenerateShape("solid has no cells".into()));
        }
        Ok(SharedShape::compound(parts))
    }

    /// Create a Rapier rigid body with one convex collider per cell, using
    /// an axis-angle `rotation` in 3D (the vector's length is the
    /// rotation in radians, and its direction is the axis).
    pub fn to_rigid_body<D>(
        &self,
        rb_set: &mut RigidBodySet,
        co_set: &mut ColliderSet,
        translation: Vector3<Real>,
        rotation: Vector3<Real>,
        density: D,
    ) -> Result<RigidBodyHandle, CsgError>
    where
        D: Fn(u32) -> Real,
    {
        let colliders = self
            .cells
            .values()
            .map(|c| {
                let shape = c.to_convex_shape()?;
                Ok(ColliderBuilder::new(shape).density(density(c.material())).build())
            })
            .collect::<Result<Vec<_>, CsgError>>()?;
        if colliders.is_empty() {
            return Err(CsgError::DegenerateShape("solid has no cells".into()));
        }

        let rb = RigidBodyBuilder::dynamic()
            .translation(translation)
            .rotation(rotation)
            .build();
        let rb_handle = rb_set.insert(rb);
        for collider in colliders {
            co_set.insert_with_parent(collider, rb_handle, rb_set);
        }
        Ok(rb_handle)
    }
}

impl ConvexCell {
    /// Mass of this cell alone.
    pub fn mass(&self, density: Real) -> Real {
        self.volume() * density
    }
}
