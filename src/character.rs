/*!
Character facade: owns the collision shape, the sensor proxy, and the
movement configuration; delegates per-tick motion to the
[`KinematicCharacterController`]; bridges to the persisted record format.

Committed positions are always read back from the proxy's transform (the
value the rest of the simulation sees), not from the last requested
position.
*/

use crate::collision::{
    CollisionWorld, Iso, ProxyKey, ShapeDef, ShapeDescriptor, UnitVec3, Vec3,
};
use crate::controller::{KinematicCharacterController, MotionState};
use crate::error::CharacterError;
use crate::gravity::UpAxis;
use crate::record::CharacterRecord;

/// A kinematic character registered in a collision world.
#[derive(Debug)]
pub struct PhysicsCharacter {
    shape: ShapeDescriptor,
    proxy: ProxyKey,
    controller: KinematicCharacterController,
    up_axis: UpAxis,
}

impl PhysicsCharacter {
    /// Register a new character.
    ///
    /// `shape` must be convex (enforced by [`ShapeDescriptor`]);
    /// `step_height` is the quantization size for vertical step detection
    /// and must be non-negative.
    pub fn new(
        world: &mut CollisionWorld,
        shape: ShapeDescriptor,
        step_height: f32,
    ) -> Result<Self, CharacterError> {
        let proxy = world.insert_proxy(shape.clone(), Iso::identity());
        let controller = match KinematicCharacterController::new(shape.clone(), proxy, step_height)
        {
            Ok(c) => c,
            Err(e) => {
                world.remove_proxy(proxy);
                return Err(e);
            }
        };
        Ok(Self {
            shape,
            proxy,
            controller,
            up_axis: UpAxis::Y,
        })
    }

    /// Rebuild a character from a persisted record.
    ///
    /// The shape is re-validated first (a record carrying a non-convex shape
    /// fails with [`CharacterError::PersistenceMismatch`]); the controller is
    /// built with the recorded step height and every other field is applied
    /// through its setter. Velocity and grounded state re-derive on the next
    /// step.
    pub fn from_record(
        world: &mut CollisionWorld,
        record: &CharacterRecord,
    ) -> Result<Self, CharacterError> {
        let shape = ShapeDescriptor::new(record.collision_shape.clone()).map_err(|e| {
            CharacterError::PersistenceMismatch {
                reason: e.to_string(),
            }
        })?;

        let mut character = Self::new(world, shape, record.step_height)?;
        character.set_gravity(record.gravity);
        character.set_max_slope(record.max_slope)?;
        character.set_fall_speed(record.fall_speed);
        character.set_jump_speed(record.jump_speed);
        character.set_up_axis(UpAxis::from_index(record.up_axis)?);
        character.set_ccd_motion_threshold(world, record.ccd_motion_threshold);
        character.set_ccd_swept_sphere_radius(world, record.ccd_swept_sphere_radius);
        character.warp(world, record.physics_location)?;
        Ok(character)
    }

    /// Snapshot the current configuration and committed position.
    pub fn to_record(&self, world: &CollisionWorld) -> CharacterRecord {
        CharacterRecord {
            collision_shape: self.shape.def().clone(),
            step_height: self.controller.step_height(),
            gravity: self.controller.gravity(),
            max_slope: self.controller.max_slope(),
            fall_speed: self.controller.fall_speed(),
            jump_speed: self.controller.jump_speed(),
            up_axis: self.up_axis.index(),
            ccd_motion_threshold: self.ccd_motion_threshold(world),
            ccd_swept_sphere_radius: self.ccd_swept_sphere_radius(world),
            physics_location: self.physics_location(world),
        }
    }

    /// Advance the character by one simulation tick.
    ///
    /// Call order per tick: feed the gravity field's up vector through
    /// [`set_gravity_direction`](Self::set_gravity_direction) (radial worlds)
    /// first, then step, before the surrounding rigid-body pass commits its
    /// own updates.
    pub fn step(&mut self, world: &mut CollisionWorld, dt: f32) {
        self.controller.step(world, dt);
    }

    /// Teleport the character.
    pub fn warp(&mut self, world: &mut CollisionWorld, location: Vec3) -> Result<(), CharacterError> {
        self.controller.warp(world, location)
    }

    /// Same as [`warp`](Self::warp).
    pub fn set_physics_location(
        &mut self,
        world: &mut CollisionWorld,
        location: Vec3,
    ) -> Result<(), CharacterError> {
        self.warp(world, location)
    }

    /// The committed position, read from the proxy's transform.
    pub fn physics_location(&self, world: &CollisionWorld) -> Vec3 {
        world
            .proxy(self.proxy)
            .map(|p| p.position())
            .unwrap_or_else(|| self.controller.position())
    }

    /// Set the per-tick displacement. Works continuously: the controller
    /// applies it every step until replaced. Vector length = speed in m/s
    /// times the tick duration.
    pub fn set_walk_direction(&mut self, direction: Vec3) -> Result<(), CharacterError> {
        self.controller.set_walk_direction(direction)
    }

    pub fn walk_direction(&self) -> Vec3 {
        self.controller.walk_direction()
    }

    /// Select a fixed world up axis.
    pub fn set_up_axis(&mut self, axis: UpAxis) {
        self.up_axis = axis;
        self.controller.set_up_direction(axis.unit());
    }

    pub fn up_axis(&self) -> UpAxis {
        self.up_axis
    }

    /// Feed an explicit up direction for the next step, e.g. from a radial
    /// gravity field orbiting the character around a planetoid. The
    /// persisted axis selector is left untouched.
    pub fn set_gravity_direction(&mut self, up: UnitVec3) {
        self.controller.set_up_direction(up);
    }

    pub fn set_fall_speed(&mut self, speed: f32) {
        self.controller.set_fall_speed(speed);
    }

    pub fn fall_speed(&self) -> f32 {
        self.controller.fall_speed()
    }

    pub fn set_jump_speed(&mut self, speed: f32) {
        self.controller.set_jump_speed(speed);
    }

    pub fn jump_speed(&self) -> f32 {
        self.controller.jump_speed()
    }

    pub fn set_gravity(&mut self, magnitude: f32) {
        self.controller.set_gravity(magnitude);
    }

    pub fn gravity(&self) -> f32 {
        self.controller.gravity()
    }

    pub fn set_max_slope(&mut self, radians: f32) -> Result<(), CharacterError> {
        self.controller.set_max_slope(radians)
    }

    pub fn max_slope(&self) -> f32 {
        self.controller.max_slope()
    }

    pub fn step_height(&self) -> f32 {
        self.controller.step_height()
    }

    pub fn on_ground(&self) -> bool {
        self.controller.on_ground()
    }

    pub fn motion_state(&self) -> MotionState {
        self.controller.motion_state()
    }

    pub fn jump(&mut self) {
        self.controller.jump();
    }

    pub fn set_ccd_swept_sphere_radius(&mut self, world: &mut CollisionWorld, radius: f32) {
        world.set_proxy_ccd_swept_sphere_radius(self.proxy, radius);
    }

    pub fn ccd_swept_sphere_radius(&self, world: &CollisionWorld) -> f32 {
        world
            .proxy(self.proxy)
            .map(|p| p.ccd_swept_sphere_radius())
            .unwrap_or(0.0)
    }

    pub fn set_ccd_motion_threshold(&mut self, world: &mut CollisionWorld, threshold: f32) {
        world.set_proxy_ccd_motion_threshold(self.proxy, threshold);
    }

    pub fn ccd_motion_threshold(&self, world: &CollisionWorld) -> f32 {
        world
            .proxy(self.proxy)
            .map(|p| p.ccd_motion_threshold())
            .unwrap_or(0.0)
    }

    pub fn ccd_square_motion_threshold(&self, world: &CollisionWorld) -> f32 {
        let t = self.ccd_motion_threshold(world);
        t * t
    }

    /// Replace the collision shape.
    ///
    /// Fails when the new shape is not convex; on success the proxy and
    /// controller are rebuilt in place, preserving position, motion state,
    /// and configuration.
    pub fn set_collision_shape(
        &mut self,
        world: &mut CollisionWorld,
        shape: ShapeDef,
    ) -> Result<(), CharacterError> {
        let descriptor = ShapeDescriptor::new(shape)?;
        world.set_proxy_shape(self.proxy, descriptor.clone());
        self.controller.set_shape(descriptor.clone());
        self.shape = descriptor;
        Ok(())
    }

    pub fn collision_shape(&self) -> &ShapeDescriptor {
        &self.shape
    }

    /// The controller, for callers that need lower-level access.
    pub fn controller(&self) -> &KinematicCharacterController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut KinematicCharacterController {
        &mut self.controller
    }

    /// The proxy key other systems can use to observe this character.
    pub fn proxy_key(&self) -> ProxyKey {
        self.proxy
    }

    /// Unregister the character's proxy from the world.
    pub fn remove_from(self, world: &mut CollisionWorld) {
        world.remove_proxy(self.proxy);
    }
}
