/*!
Collision root module.

This module implements the query layer the kinematic character controller
runs against, using parry3d for narrow-phase queries and a BVH broad phase
for static world acceleration. The code is split for clarity:

- types:        shared data types (Transform, SweepHit, OverlapContact, etc.)
- shape:        collider definitions and the convex character handle
- settings:     controller and tolerance constants
- broad:        broad-phase helpers (swept AABBs, candidate queries)
- narrow_phase: thin wrappers over parry3d queries (TOI, contacts)
- world:        the shared collision world (statics + sensor proxies)
*/

pub mod broad;
pub mod narrow_phase;
pub mod settings;
pub mod shape;
pub mod types;
pub mod world;

// Re-export commonly used types.
pub use shape::{ShapeDef, ShapeDescriptor};
pub use types::{Iso, OverlapContact, Quat, SweepHit, Transform, UnitVec3, Vec3};
pub use world::{CollisionWorld, ProxyKey, SensorProxy, StaticCollider, WorldStaticDef};
