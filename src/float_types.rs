// Re-export parry and rapier for the appropriate float size
#[cfg(feature = "f64")]
pub use parry3d_f64 as parry3d;
#[cfg(feature = "f64")]
pub use rapier3d_f64 as rapier3d;

#[cfg(feature = "f32")]
pub use parry3d;
#[cfg(feature = "f32")]
pub use rapier3d;

// Our Real scalar type:
#[cfg(feature = "f32")]
pub type Real = f32;
#[cfg(feature = "f64")]
pub type Real = f64;

use core::str::FromStr;
use std::sync::OnceLock;

/// Distance substituted for an unconstrained (infinite) boundary-cut end whenever a
/// concrete point is needed, e.g. for bounds of a polygon that is not closed yet.
pub const UNBOUNDED_DISTANCE: Real = 1024.0;

/// Lazily-initialized tolerances used across the crate.
/// Both can be overridden:
///  1) **Build-time**: set `CONVEX_CSG_DISTANCE_EPSILON` / `CONVEX_CSG_ANGULAR_EPSILON`
///  2) **Runtime**: call [`set_distance_epsilon`] / [`set_angular_epsilon`] once before
///     any geometry is built
static DISTANCE_EPSILON_CELL: OnceLock<Real> = OnceLock::new();
static ANGULAR_EPSILON_CELL: OnceLock<Real> = OnceLock::new();

#[inline]
const fn default_distance_epsilon() -> Real {
    1e-3
}

#[inline]
fn default_angular_epsilon() -> Real {
    #[cfg(feature = "f32")]
    {
        1e-5
    }
    #[cfg(feature = "f64")]
    {
        1e-6
    }
}

fn parse_override(value: Option<&'static str>) -> Option<Real> {
    value
        .and_then(|v| Real::from_str(v).ok())
        .map(|v| v.max(Real::EPSILON))
}

/// Distance below which two planes, points or cut bounds are considered coincident.
pub fn distance_epsilon() -> Real {
    *DISTANCE_EPSILON_CELL.get_or_init(|| {
        parse_override(option_env!("CONVEX_CSG_DISTANCE_EPSILON"))
            .unwrap_or_else(default_distance_epsilon)
    })
}

/// Threshold on `1 - |cos|` (or `|sin|`) below which two directions count as parallel.
pub fn angular_epsilon() -> Real {
    *ANGULAR_EPSILON_CELL.get_or_init(|| {
        parse_override(option_env!("CONVEX_CSG_ANGULAR_EPSILON"))
            .unwrap_or_else(default_angular_epsilon)
    })
}

/// Set the distance epsilon programmatically once (subsequent calls are ignored).
pub fn set_distance_epsilon(value: Real) {
    let _ = DISTANCE_EPSILON_CELL.set(value.max(Real::EPSILON));
}

/// Set the angular epsilon programmatically once (subsequent calls are ignored).
pub fn set_angular_epsilon(value: Real) {
    let _ = ANGULAR_EPSILON_CELL.set(value.max(Real::EPSILON));
}

// Tau
/// The full circle constant (τ)
#[cfg(feature = "f32")]
pub const TAU: Real = core::f32::consts::TAU;
/// The full circle constant (τ)
#[cfg(feature = "f64")]
pub const TAU: Real = core::f64::consts::TAU;
