/*!
Kinematic character movement for worlds where "down" is wherever the planet
is.

This crate turns a desired walk direction and a jump request into a
physically plausible position update: it sweeps a convex shape through a
collision world, rejects penetration, steps over small obstacles, slides
along surfaces, and integrates fall/jump motion along a gravity axis that
can change direction every tick. The intended use case is a planetoid world
where gravity always points toward a center of mass, but fixed-axis worlds
fall out as the degenerate case.

Pieces:
- [`collision`]: the query layer (parry3d sweeps/contacts over immutable
  statics, plus sensor proxies for characters).
- [`gravity`]: per-tick up-axis computation (fixed or radial).
- [`controller`]: the kinematic character controller itself.
- [`character`]: the owning facade plus the persisted record bridge.

# Example

```
use planetoid_character::{
    CollisionWorld, GravityField, PhysicsCharacter, ShapeDef, ShapeDescriptor, Transform, Vec3,
    WorldStaticDef,
};

// A 30 m planetoid at the origin.
let mut world = CollisionWorld::new(vec![WorldStaticDef {
    id: 0,
    transform: Transform::identity(),
    shape: ShapeDef::Sphere { radius: 30.0 },
}])?;

let shape = ShapeDescriptor::capsule(1.5, 3.0)?;
let mut player = PhysicsCharacter::new(&mut world, shape, 0.05)?;
player.set_jump_speed(20.0);
player.set_fall_speed(30.0);
player.set_gravity(30.0);
player.warp(&mut world, Vec3::new(-10.0, 0.0, -90.0))?;

// Each tick: ask the field which way is up, then step.
let gravity = GravityField::radial(Vec3::zeros());
for _ in 0..600 {
    let up = gravity.up_axis(&player.physics_location(&world));
    player.set_gravity_direction(up);
    player.step(&mut world, 1.0 / 60.0);
}
# Ok::<(), planetoid_character::CharacterError>(())
```
*/

pub mod character;
pub mod collision;
pub mod controller;
pub mod error;
pub mod gravity;
pub mod record;

pub use character::PhysicsCharacter;
pub use collision::{
    CollisionWorld, Iso, OverlapContact, ProxyKey, Quat, SensorProxy, ShapeDef, ShapeDescriptor,
    SweepHit, Transform, UnitVec3, Vec3, WorldStaticDef,
};
pub use controller::{KinematicCharacterController, MotionState};
pub use error::CharacterError;
pub use gravity::{GravityField, UpAxis, radial_up_axis};
pub use record::CharacterRecord;
