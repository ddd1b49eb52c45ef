/*!
Core collision types and math aliases shared by the collision submodules.

This module intentionally contains no algorithms. It defines the data types
exchanged between:
- broad (static world acceleration structure and candidate queries)
- narrow_phase (parry3d time-of-impact and contact queries)
- world (the shared collision world: statics + sensor proxies)
- the kinematic character controller
*/

use nalgebra as na;
use serde::{Deserialize, Serialize};

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type UnitVec3 = na::Unit<na::Vector3<f32>>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;

/// A rigid transform (isometry) in world space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Transform {
    #[inline]
    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    #[inline]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::identity(),
        }
    }

    #[inline]
    pub fn identity() -> Self {
        Self::from_translation(Vec3::zeros())
    }

    /// Convert to nalgebra `Isometry3` for use with parry3d queries.
    #[inline]
    pub fn iso(&self) -> Iso {
        Iso::from_parts(
            na::Translation3::new(self.translation.x, self.translation.y, self.translation.z),
            self.rotation,
        )
    }
}

/// A single contact result returned by a time-of-impact (TOI) query
/// used during sweep-and-slide, ground probing, or step resolution.
#[derive(Clone, Copy, Debug)]
pub struct SweepHit {
    /// Fraction (0..1) of the tested translation where the hit occurred.
    pub fraction: f32,
    /// World-space contact normal on the moving shape, opposing the motion.
    pub normal: Vec3,
    /// Penetration depth at the start of the cast (meters). Zero for clean
    /// hits; positive when the cast began already overlapping the obstacle.
    pub depth: f32,
}

/// A single overlap reported by the contact query, from the perspective of
/// the queried (moving) shape.
#[derive(Clone, Copy, Debug)]
pub struct OverlapContact {
    /// World-space separating direction: pushing the queried shape along this
    /// unit vector reduces the overlap.
    pub normal: Vec3,
    /// Penetration depth in meters. Positive values mean actual overlap;
    /// values in `(-prediction, 0]` describe a near-contact gap.
    pub depth: f32,
    /// World-space contact point on the queried shape.
    pub point: Vec3,
}
