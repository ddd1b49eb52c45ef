/*!
Collision shape definitions and the convex handle used by characters.

`ShapeDef` is the serializable, schema-agnostic description of a collider.
Static world geometry accepts every variant; kinematic characters are
restricted to single convex primitives, enforced at construction time by
[`ShapeDescriptor`] rather than at step time.
*/

use nalgebra as na;
use parry3d::shape::{self as pshape, SharedShape};
use serde::{Deserialize, Serialize};

use crate::error::CharacterError;

use super::types::{Transform, Vec3};

/// Supported collider shapes.
///
/// Conventions
/// - Units are meters.
/// - Capsules, cylinders, and cones are aligned with the local +Y axis;
///   `half_height` is half the cylinder-section length.
/// - `Plane` is an infinite half-space whose world normal is derived from the
///   owning pose as `rotation * +Y`, offset along that normal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ShapeDef {
    /// Infinite plane (half-space). World statics only.
    Plane {
        /// Offset along the pose-derived plane normal (meters).
        offset_along_normal: f32,
    },
    /// Oriented box with local half-extents.
    Cuboid { half_extents: Vec3 },
    /// Sphere/ball.
    Sphere { radius: f32 },
    /// Y-aligned capsule.
    CapsuleY { radius: f32, half_height: f32 },
    /// Y-aligned cylinder.
    CylinderY { radius: f32, half_height: f32 },
    /// Y-aligned cone.
    ConeY { radius: f32, half_height: f32 },
    /// Several sub-shapes welded together. World statics only.
    Compound { parts: Vec<(Transform, ShapeDef)> },
}

impl ShapeDef {
    /// Whether this definition is a single convex primitive.
    ///
    /// Planes are half-spaces (unbounded) and compounds are potentially
    /// concave, so neither qualifies for use as a character shape.
    pub fn is_convex(&self) -> bool {
        !matches!(self, Self::Plane { .. } | Self::Compound { .. })
    }

    /// Whether every parameter of this definition is a finite number and no
    /// extent is negative.
    pub fn is_well_formed(&self) -> bool {
        fn ok(v: f32) -> bool {
            v.is_finite() && v >= 0.0
        }
        match self {
            Self::Plane {
                offset_along_normal,
            } => offset_along_normal.is_finite(),
            Self::Cuboid { half_extents } => {
                ok(half_extents.x) && ok(half_extents.y) && ok(half_extents.z)
            }
            Self::Sphere { radius } => ok(*radius),
            Self::CapsuleY {
                radius,
                half_height,
            }
            | Self::CylinderY {
                radius,
                half_height,
            }
            | Self::ConeY {
                radius,
                half_height,
            } => ok(*radius) && ok(*half_height),
            Self::Compound { parts } => {
                !parts.is_empty()
                    && parts.iter().all(|(t, d)| {
                        t.translation.iter().all(|v| v.is_finite()) && d.is_well_formed()
                    })
            }
        }
    }

    /// Whether this definition has no spatial extent at all.
    ///
    /// Degenerate shapes are legal: the controller treats queries with them
    /// as trivial successes instead of erroring.
    pub fn is_degenerate(&self) -> bool {
        const EPS: f32 = 1.0e-9;
        match self {
            Self::Plane { .. } => false,
            Self::Cuboid { half_extents } => half_extents.norm_squared() <= EPS,
            Self::Sphere { radius } => *radius <= EPS,
            Self::CapsuleY {
                radius,
                half_height,
            }
            | Self::CylinderY {
                radius,
                half_height,
            }
            | Self::ConeY {
                radius,
                half_height,
            } => *radius <= EPS && *half_height <= EPS,
            Self::Compound { parts } => parts.iter().all(|(_, d)| d.is_degenerate()),
        }
    }

    /// Build the parry3d shape for this definition.
    ///
    /// Planes are rejected here: a half-space has no self-contained world
    /// shape (its normal comes from the owning pose), so the world builds
    /// them directly from the static's transform.
    pub(crate) fn build(&self) -> Result<SharedShape, CharacterError> {
        match self {
            Self::Plane { .. } => Err(CharacterError::UnsupportedShape {
                reason: "planes exist only as posed world statics".into(),
            }),
            Self::Cuboid { half_extents } => {
                Ok(SharedShape::new(pshape::Cuboid::new(*half_extents)))
            }
            Self::Sphere { radius } => Ok(SharedShape::new(pshape::Ball::new(*radius))),
            Self::CapsuleY {
                radius,
                half_height,
            } => Ok(SharedShape::new(pshape::Capsule::new_y(
                *half_height,
                *radius,
            ))),
            Self::CylinderY {
                radius,
                half_height,
            } => Ok(SharedShape::new(pshape::Cylinder::new(
                *half_height,
                *radius,
            ))),
            Self::ConeY {
                radius,
                half_height,
            } => Ok(SharedShape::new(pshape::Cone::new(*half_height, *radius))),
            Self::Compound { parts } => {
                if parts.is_empty() {
                    return Err(CharacterError::UnsupportedShape {
                        reason: "empty compound".into(),
                    });
                }
                let built = parts
                    .iter()
                    .map(|(t, d)| Ok((t.iso(), d.build()?)))
                    .collect::<Result<Vec<_>, CharacterError>>()?;
                Ok(SharedShape::compound(built))
            }
        }
    }
}

/// An immutable convex collision shape handle for a kinematic character.
///
/// The parry3d shape is built once at construction; clones share it. A
/// non-convex or malformed definition fails construction with
/// [`CharacterError::UnsupportedShape`]; this is the only place convexity is
/// checked, so everything downstream can assume it holds.
#[derive(Clone)]
pub struct ShapeDescriptor {
    def: ShapeDef,
    built: SharedShape,
}

impl ShapeDescriptor {
    pub fn new(def: ShapeDef) -> Result<Self, CharacterError> {
        if !def.is_convex() {
            return Err(CharacterError::UnsupportedShape {
                reason: format!("{def:?} is not a convex primitive"),
            });
        }
        if !def.is_well_formed() {
            return Err(CharacterError::UnsupportedShape {
                reason: format!("{def:?} has non-finite or negative extents"),
            });
        }
        let built = def.build()?;
        Ok(Self { def, built })
    }

    /// Convenience: the usual character capsule.
    pub fn capsule(radius: f32, half_height: f32) -> Result<Self, CharacterError> {
        Self::new(ShapeDef::CapsuleY {
            radius,
            half_height,
        })
    }

    pub fn def(&self) -> &ShapeDef {
        &self.def
    }

    pub fn is_degenerate(&self) -> bool {
        self.def.is_degenerate()
    }

    /// Distance from the shape's center to its lowest point along local -Y.
    ///
    /// Used to express probe lengths relative to the character's base.
    pub fn half_extent_y(&self) -> f32 {
        match self.def {
            ShapeDef::Cuboid { half_extents } => half_extents.y,
            ShapeDef::Sphere { radius } => radius,
            ShapeDef::CapsuleY {
                radius,
                half_height,
            } => radius + half_height,
            ShapeDef::CylinderY { half_height, .. } | ShapeDef::ConeY { half_height, .. } => {
                half_height
            }
            // Unreachable for descriptors; kept total.
            ShapeDef::Plane { .. } | ShapeDef::Compound { .. } => 0.0,
        }
    }

    pub(crate) fn as_shape(&self) -> &dyn pshape::Shape {
        &*self.built
    }
}

impl std::fmt::Debug for ShapeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ShapeDescriptor").field(&self.def).finish()
    }
}

/// Plane normal/offset derivation shared by the world builder.
///
/// - normal = rotation * +Y
/// - dist = dot(normal, translation) + offset, so the plane satisfies
///   `normal ⋅ x = dist` in world space.
pub(crate) fn plane_from_pose(
    transform: &Transform,
    offset_along_normal: f32,
) -> (na::Unit<Vec3>, f32) {
    let normal = transform.rotation * Vec3::new(0.0, 1.0, 0.0);
    let unit_n = na::Unit::new_normalize(normal);
    let dist = unit_n.dot(&transform.translation) + offset_along_normal;
    (unit_n, dist)
}
