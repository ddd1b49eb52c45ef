/*!
Kinematic character controller: sweep-and-slide movement with step
resolution, slope limits, jump/fall integration, and bounded penetration
recovery, all relative to an up axis that may change every tick.

The controller owns the per-character motion state exclusively. It reads the
shared [`CollisionWorld`](crate::collision::CollisionWorld) through sweep and
contact queries and writes back exactly one committed pose per tick.

Vertical motion is a signed scalar velocity along the current up axis, so
re-orienting up (the planetoid case) instantly re-orients gravity, jumping,
and the slope test with it.
*/

use log::{debug, warn};
use nalgebra as na;

use crate::collision::{
    CollisionWorld, Iso, ProxyKey, Quat, ShapeDescriptor, SweepHit, UnitVec3, Vec3,
    settings::{
        DEFAULT_FALL_SPEED, DEFAULT_GRAVITY, DEFAULT_JUMP_SPEED, DEFAULT_MAX_SLOPE, DIST_EPS,
        GROUND_LATCH_DISTANCE, MAX_PENETRATION_ITERATIONS, MAX_SLIDE_ITERATIONS,
        MAX_VERTICAL_ITERATIONS, MIN_MOVE_SQ, PENETRATION_RECOVERY_FRACTION, PENETRATION_SLOP,
        SKIN, SNAP_DEADBAND, STEP_ACCEPT_RATIO, STEP_MIN_WIDTH,
    },
};
use crate::error::CharacterError;

/// The controller's coarse motion state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionState {
    /// Standing on walkable support.
    Grounded,
    /// Airborne without a preceding jump (walked off an edge, spawned in
    /// the air, or knocked loose).
    Falling,
    /// Airborne because of a jump that has not landed yet.
    Jumping,
}

/// Kinematic character controller.
///
/// Construction requires a convex [`ShapeDescriptor`] (validated by the
/// descriptor itself) and a registered sensor proxy to commit poses into.
/// A freshly built or warped controller starts `Falling`; the first `step`
/// resolves it to `Grounded` or keeps it falling.
#[derive(Debug)]
pub struct KinematicCharacterController {
    shape: ShapeDescriptor,
    proxy: ProxyKey,

    position: Vec3,
    up: UnitVec3,
    walk_direction: Vec3,
    vertical_velocity: f32,
    on_ground: bool,
    was_jumping: bool,
    last_contact: Option<SweepHit>,

    step_height: f32,
    gravity: f32,
    fall_speed: f32,
    jump_speed: f32,
    max_slope: f32,
    max_slope_cos: f32,
}

impl KinematicCharacterController {
    pub fn new(
        shape: ShapeDescriptor,
        proxy: ProxyKey,
        step_height: f32,
    ) -> Result<Self, CharacterError> {
        if !step_height.is_finite() || step_height < 0.0 {
            return Err(CharacterError::invalid("stepHeight", step_height));
        }
        Ok(Self {
            shape,
            proxy,
            position: Vec3::zeros(),
            up: Vec3::y_axis(),
            walk_direction: Vec3::zeros(),
            vertical_velocity: 0.0,
            on_ground: false,
            was_jumping: false,
            last_contact: None,
            step_height,
            gravity: DEFAULT_GRAVITY,
            fall_speed: DEFAULT_FALL_SPEED,
            jump_speed: DEFAULT_JUMP_SPEED,
            max_slope: DEFAULT_MAX_SLOPE,
            max_slope_cos: DEFAULT_MAX_SLOPE.cos(),
        })
    }

    /// Teleport to `position`, dropping all motion state.
    ///
    /// No sweep is performed; the proxy pose is committed immediately.
    pub fn warp(&mut self, world: &mut CollisionWorld, position: Vec3) -> Result<(), CharacterError> {
        if !position.iter().all(|v| v.is_finite()) {
            return Err(CharacterError::invalid("warp position", f32::NAN));
        }
        debug!(
            "warp to ({:.3}, {:.3}, {:.3})",
            position.x, position.y, position.z
        );
        self.position = position;
        self.vertical_velocity = 0.0;
        self.on_ground = false;
        self.was_jumping = false;
        self.last_contact = None;
        self.commit(world);
        Ok(())
    }

    /// Store the displacement applied on each tick.
    ///
    /// This is neither a direction nor a velocity: it is the position
    /// increment per simulation step, so callers pre-scale it by their
    /// desired speed and tick rate.
    pub fn set_walk_direction(&mut self, direction: Vec3) -> Result<(), CharacterError> {
        if !direction.iter().all(|v| v.is_finite()) {
            return Err(CharacterError::invalid("walkDirection", f32::NAN));
        }
        self.walk_direction = direction;
        Ok(())
    }

    pub fn walk_direction(&self) -> Vec3 {
        self.walk_direction
    }

    /// Set the up direction for subsequent steps.
    ///
    /// The owning simulation loop calls this once per tick (from a
    /// [`GravityField`](crate::gravity::GravityField) in radial worlds)
    /// before `step`. The controller never caches a stale axis: everything in
    /// the next step uses the value set here.
    pub fn set_up_direction(&mut self, up: UnitVec3) {
        self.up = up;
    }

    pub fn up_direction(&self) -> UnitVec3 {
        self.up
    }

    /// Start a jump if currently grounded; otherwise a no-op.
    pub fn jump(&mut self) {
        if self.on_ground {
            self.vertical_velocity = self.jump_speed;
            self.on_ground = false;
            self.was_jumping = true;
        }
    }

    pub fn on_ground(&self) -> bool {
        self.on_ground
    }

    pub fn motion_state(&self) -> MotionState {
        if self.on_ground {
            MotionState::Grounded
        } else if self.was_jumping {
            MotionState::Jumping
        } else {
            MotionState::Falling
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Signed velocity along the up axis (positive = rising).
    pub fn vertical_velocity(&self) -> f32 {
        self.vertical_velocity
    }

    /// The most recent contact from the last sweep or probe, if any.
    pub fn last_contact(&self) -> Option<SweepHit> {
        self.last_contact
    }

    pub fn set_gravity(&mut self, magnitude: f32) {
        self.gravity = magnitude;
    }

    pub fn gravity(&self) -> f32 {
        self.gravity
    }

    pub fn set_fall_speed(&mut self, speed: f32) {
        self.fall_speed = speed;
    }

    pub fn fall_speed(&self) -> f32 {
        self.fall_speed
    }

    pub fn set_jump_speed(&mut self, speed: f32) {
        self.jump_speed = speed;
    }

    pub fn jump_speed(&self) -> f32 {
        self.jump_speed
    }

    /// Set the maximum climbable slope angle, in radians within [0, π/2].
    ///
    /// Out-of-range values are rejected rather than clamped so caller bugs
    /// are not masked.
    pub fn set_max_slope(&mut self, radians: f32) -> Result<(), CharacterError> {
        if !radians.is_finite() || !(0.0..=std::f32::consts::FRAC_PI_2).contains(&radians) {
            return Err(CharacterError::invalid("maxSlope", radians));
        }
        self.max_slope = radians;
        self.max_slope_cos = radians.cos();
        Ok(())
    }

    pub fn max_slope(&self) -> f32 {
        self.max_slope
    }

    pub fn step_height(&self) -> f32 {
        self.step_height
    }

    pub fn shape(&self) -> &ShapeDescriptor {
        &self.shape
    }

    /// Swap the collision shape. The caller (facade) has already validated
    /// convexity and updated the proxy.
    pub(crate) fn set_shape(&mut self, shape: ShapeDescriptor) {
        self.shape = shape;
    }

    /// Advance the character by exactly one tick.
    ///
    /// Order of operations: vertical integration, ground probe/snap,
    /// horizontal sweep-and-slide with optional step-up, penetration
    /// recovery, pose commit. Never fails; iteration caps accept a
    /// best-effort position on exhaustion.
    pub fn step(&mut self, world: &mut CollisionWorld, dt: f32) {
        if !(dt > 0.0) || !dt.is_finite() {
            return;
        }

        // A zero-extent shape cannot collide with anything: integrate motion
        // freely and skip every query.
        if self.shape.is_degenerate() {
            self.step_degenerate(world, dt);
            return;
        }

        let up = self.up.into_inner();
        let rot = self.orientation();
        let mut pos = self.position;

        // 1) Vertical integration: gravity while airborne or mid-jump,
        //    clamped to the terminal fall speed, then swept along up.
        if !self.on_ground || self.was_jumping {
            self.vertical_velocity -= self.gravity * dt;
            let limit = self.fall_speed.abs();
            self.vertical_velocity = self.vertical_velocity.clamp(-limit, limit);
        }
        let vertical = up * (self.vertical_velocity * dt);
        if vertical.norm_squared() > MIN_MOVE_SQ {
            let (new_pos, hit) = self.sweep_and_slide(world, pos, vertical, rot, MAX_VERTICAL_ITERATIONS);
            pos = new_pos;
            if let Some(h) = hit {
                if self.vertical_velocity > 0.0 && h.normal.dot(&up) < 0.0 {
                    // Head bump: stop rising, start falling next tick.
                    self.vertical_velocity = 0.0;
                }
                self.last_contact = Some(h);
            }
        }

        // 2) Ground probe. While grounded the probe reaches a full step
        //    height so the character walks down steps instead of falling off
        //    them; while airborne it only latches from a short distance so a
        //    jump arc is never cut short. Probing mid-ascent would re-ground
        //    the character the tick after takeoff, so it is skipped.
        let mut ground_normal: Option<Vec3> = None;
        if self.vertical_velocity <= 0.0 {
            let probe_len = if self.on_ground {
                self.step_height.max(GROUND_LATCH_DISTANCE)
            } else {
                GROUND_LATCH_DISTANCE
            };
            match world.sweep(self.shape.as_shape(), &pose(pos, rot), &(-up * probe_len)) {
                Some(hit) if hit.normal.dot(&up) >= self.max_slope_cos => {
                    let gap = probe_len * hit.fraction;
                    let correction = SKIN - gap;
                    if correction.abs() > SNAP_DEADBAND {
                        pos += up * correction;
                    }
                    self.on_ground = true;
                    self.was_jumping = false;
                    self.vertical_velocity = 0.0;
                    ground_normal = Some(hit.normal);
                    self.last_contact = Some(hit);
                }
                Some(hit) => {
                    // Support exists but is too steep to stand on.
                    self.on_ground = false;
                    self.last_contact = Some(hit);
                }
                None => {
                    self.on_ground = false;
                }
            }
        } else {
            self.on_ground = false;
        }

        // 3) Horizontal sweep-and-slide, with a step-up attempt when mostly
        //    blocked, and a clamp that forbids height gain without walkable
        //    support.
        let walk = self.walk_direction;
        if walk.norm_squared() > MIN_MOVE_SQ {
            let start = pos;
            let (moved, hit) = self.sweep_and_slide(world, pos, walk, rot, MAX_SLIDE_ITERATIONS);
            if let Some(h) = hit {
                self.last_contact = Some(h);
            }
            let mut end = moved;
            let mut used_step = false;

            let desired_planar = planar(walk, &up);
            let achieved_planar = planar(end - start, &up);
            let blocked = achieved_planar.norm() < desired_planar.norm() * STEP_ACCEPT_RATIO;
            // Only obstacles too steep to walk on are step candidates; a
            // walkable slope shortens planar progress too, but climbing it is
            // the slide's job.
            let against_wall = hit
                .map(|h| h.normal.dot(&up) < self.max_slope_cos)
                .unwrap_or(false);

            if blocked && against_wall && self.on_ground && self.step_height > DIST_EPS {
                if let Some((stepped, landing)) = self.try_step_up(world, start, walk, rot) {
                    let stepped_planar = planar(stepped - start, &up);
                    if stepped_planar.norm() > achieved_planar.norm() + 1.0e-4 {
                        debug!("step-up accepted, rise {:.3}", (stepped - start).dot(&up));
                        end = stepped;
                        used_step = true;
                        self.last_contact = Some(landing);
                    }
                }
            }

            if !used_step {
                let up_gain = (end - start).dot(&up);
                if up_gain > DIST_EPS {
                    let supported = self.on_ground && ground_normal.is_some();
                    if !supported {
                        end -= up * up_gain;
                    }
                }
            }
            pos = end;
        }

        // 4) Bounded penetration recovery from the overlap query.
        pos = self.recover_from_penetration(world, pos, rot);

        // 5) Commit.
        self.position = pos;
        self.commit(world);
    }

    /// Free integration for zero-extent shapes: moves, never collides,
    /// never grounds.
    fn step_degenerate(&mut self, world: &mut CollisionWorld, dt: f32) {
        self.vertical_velocity -= self.gravity * dt;
        let limit = self.fall_speed.abs();
        self.vertical_velocity = self.vertical_velocity.clamp(-limit, limit);
        self.on_ground = false;
        self.position += self.up.into_inner() * (self.vertical_velocity * dt) + self.walk_direction;
        self.commit(world);
    }

    /// Rotation aligning the shape's local +Y with the current up axis.
    fn orientation(&self) -> Quat {
        let up = self.up.into_inner();
        Quat::rotation_between(&Vec3::y(), &up).unwrap_or_else(|| {
            // Up is exactly opposite +Y; any half-turn through a horizontal
            // axis works.
            Quat::from_axis_angle(&Vec3::x_axis(), std::f32::consts::PI)
        })
    }

    fn commit(&self, world: &mut CollisionWorld) {
        world.set_proxy_pose(self.proxy, pose(self.position, self.orientation()));
    }

    /// Sweep-and-slide: cast the shape along `translation`, stop at contact
    /// minus skin, slide the leftover along the surface, and iterate for
    /// corners.
    ///
    /// Surfaces steeper than the slope limit are treated as walls: the
    /// horizontal part of the leftover loses its into-wall component (no
    /// climbing), while the vertical part deflects along the surface so a
    /// falling character slides down steep faces instead of sticking to
    /// them.
    fn sweep_and_slide(
        &self,
        world: &CollisionWorld,
        start: Vec3,
        translation: Vec3,
        rot: Quat,
        max_iterations: u32,
    ) -> (Vec3, Option<SweepHit>) {
        let up = self.up.into_inner();
        let mut pos = start;
        let mut remaining = translation;
        let mut last_hit = None;

        for _ in 0..max_iterations {
            if remaining.norm_squared() <= MIN_MOVE_SQ {
                break;
            }
            let len = remaining.norm();
            let dir = remaining / len;

            match world.sweep(self.shape.as_shape(), &pose(pos, rot), &remaining) {
                None => {
                    pos += remaining;
                    break;
                }
                Some(hit) => {
                    let travel = (len * hit.fraction).max(0.0);
                    pos += dir * (travel - SKIN).max(0.0);

                    let n = {
                        let n_len_sq = hit.normal.norm_squared();
                        if n_len_sq > 1.0e-12 {
                            hit.normal / n_len_sq.sqrt()
                        } else {
                            break;
                        }
                    };

                    let leftover = dir * (len - travel);
                    let slide = if n.dot(&up) >= self.max_slope_cos {
                        leftover - n * leftover.dot(&n)
                    } else {
                        let lv = up * leftover.dot(&up);
                        let lh = leftover - lv;
                        let wall_n = n - up * n.dot(&up);
                        let slide_h = if wall_n.norm_squared() > DIST_EPS * DIST_EPS {
                            let wall_n = wall_n.normalize();
                            lh - wall_n * lh.dot(&wall_n)
                        } else {
                            lh - n * lh.dot(&n)
                        };
                        let slide_v = lv - n * lv.dot(&n);
                        slide_h + slide_v
                    };

                    last_hit = Some(hit);
                    remaining = slide;
                }
            }
        }

        (pos, last_hit)
    }

    /// Attempt to climb a step: rise by the step height, move forward with
    /// at least a minimum clearance, then settle back down.
    ///
    /// Returns the settled position and the landing contact, or `None` when
    /// there is nothing to land on within reach. The caller accepts the
    /// result only if it improves planar progress.
    fn try_step_up(
        &self,
        world: &CollisionWorld,
        start: Vec3,
        walk: Vec3,
        rot: Quat,
    ) -> Option<(Vec3, SweepHit)> {
        let up = self.up.into_inner();

        // Rise.
        let rise = up * self.step_height;
        let up_pos = match world.sweep(self.shape.as_shape(), &pose(start, rot), &rise) {
            Some(hit) => start + up * (self.step_height * hit.fraction - SKIN).max(0.0),
            None => start + rise,
        };

        // Forward, extended to the minimum step width so the landing probe
        // clears the obstacle's near edge instead of balancing on it.
        let walk_planar = planar(walk, &up);
        let planar_len = walk_planar.norm();
        if planar_len <= DIST_EPS {
            return None;
        }
        let forward = walk_planar * (planar_len.max(STEP_MIN_WIDTH) / planar_len);
        let (fwd_pos, _) = self.sweep_and_slide(world, up_pos, forward, rot, MAX_SLIDE_ITERATIONS);

        // Settle.
        let drop_len = self.step_height + GROUND_LATCH_DISTANCE;
        let drop = -up * drop_len;
        let landing = world.sweep(self.shape.as_shape(), &pose(fwd_pos, rot), &drop)?;
        if landing.normal.dot(&up) < self.max_slope_cos {
            return None;
        }
        let settled = fwd_pos + drop * landing.fraction + up * SKIN;
        Some((settled, landing))
    }

    /// Push out of any residual overlap, a bounded fraction per pass.
    ///
    /// The loop accepts a best-effort position when the cap is exhausted;
    /// one-shot full-depth corrections would pop the character visibly.
    fn recover_from_penetration(&self, world: &CollisionWorld, start: Vec3, rot: Quat) -> Vec3 {
        let mut pos = start;
        let mut exhausted = true;

        for _ in 0..MAX_PENETRATION_ITERATIONS {
            let contacts = world.contacts(self.shape.as_shape(), &pose(pos, rot), 0.0);
            let mut correction = Vec3::zeros();
            for c in &contacts {
                if c.depth > PENETRATION_SLOP {
                    correction += c.normal * ((c.depth - PENETRATION_SLOP) * PENETRATION_RECOVERY_FRACTION);
                }
            }
            if correction.norm_squared() <= MIN_MOVE_SQ {
                exhausted = false;
                break;
            }
            pos += correction;
        }

        if exhausted {
            warn!(
                "penetration recovery exhausted after {} passes; accepting best-effort position",
                MAX_PENETRATION_ITERATIONS
            );
        }
        pos
    }
}

#[inline]
fn pose(position: Vec3, rotation: Quat) -> Iso {
    Iso::from_parts(na::Translation3::from(position), rotation)
}

/// Component of `v` perpendicular to `up`.
#[inline]
fn planar(v: Vec3, up: &Vec3) -> Vec3 {
    v - up * v.dot(up)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{ShapeDef, Transform, WorldStaticDef};
    use approx::assert_relative_eq;

    const DT: f32 = 1.0 / 60.0;
    // Capsule radius 0.5, cylinder half-height 0.5: base is 1.0 below the
    // center, so the rest height over a floor at y = 0 is 1.0 + skin.
    const REST_HEIGHT: f32 = 1.0 + SKIN;

    fn floor_plane(id: u32) -> WorldStaticDef {
        WorldStaticDef {
            id,
            transform: Transform::identity(),
            shape: ShapeDef::Plane {
                offset_along_normal: 0.0,
            },
        }
    }

    fn tilted_plane(id: u32, angle: f32, through_x: f32) -> WorldStaticDef {
        WorldStaticDef {
            id,
            transform: Transform::new(
                Vec3::new(through_x, 0.0, 0.0),
                Quat::from_axis_angle(&Vec3::z_axis(), angle),
            ),
            shape: ShapeDef::Plane {
                offset_along_normal: 0.0,
            },
        }
    }

    fn box_at(id: u32, center: Vec3, half: Vec3) -> WorldStaticDef {
        WorldStaticDef {
            id,
            transform: Transform::from_translation(center),
            shape: ShapeDef::Cuboid { half_extents: half },
        }
    }

    fn spawn(world: &mut CollisionWorld) -> (KinematicCharacterController, ProxyKey) {
        let shape = ShapeDescriptor::capsule(0.5, 0.5).unwrap();
        let proxy = world.insert_proxy(shape.clone(), Iso::identity());
        let controller = KinematicCharacterController::new(shape, proxy, 1.0).unwrap();
        (controller, proxy)
    }

    fn settle(c: &mut KinematicCharacterController, world: &mut CollisionWorld) {
        for _ in 0..3 {
            c.step(world, DT);
        }
        assert!(c.on_ground());
    }

    #[test]
    fn ground_stability_over_a_thousand_ticks() {
        let mut world = CollisionWorld::new(vec![floor_plane(0)]).unwrap();
        let (mut c, _) = spawn(&mut world);
        c.warp(&mut world, Vec3::new(0.0, REST_HEIGHT, 0.0)).unwrap();

        for tick in 0..1000 {
            c.step(&mut world, DT);
            if tick >= 1 {
                assert!(c.on_ground(), "lost ground contact at tick {tick}");
            }
            assert!(
                (c.position().y - REST_HEIGHT).abs() <= 1.0e-4,
                "height drifted to {} at tick {tick}",
                c.position().y
            );
        }
        assert_eq!(c.motion_state(), MotionState::Grounded);
    }

    #[test]
    fn first_step_resolves_initial_falling_state() {
        let mut world = CollisionWorld::new(vec![floor_plane(0)]).unwrap();
        let (mut c, _) = spawn(&mut world);
        c.warp(&mut world, Vec3::new(0.0, REST_HEIGHT, 0.0)).unwrap();

        assert_eq!(c.motion_state(), MotionState::Falling);
        c.step(&mut world, DT);
        assert_eq!(c.motion_state(), MotionState::Grounded);
    }

    #[test]
    fn low_obstacle_is_stepped_over() {
        let h = 0.4;
        let mut world = CollisionWorld::new(vec![
            floor_plane(0),
            box_at(1, Vec3::new(2.0, h / 2.0, 0.0), Vec3::new(0.5, h / 2.0, 2.0)),
        ])
        .unwrap();
        let (mut c, _) = spawn(&mut world);
        c.warp(&mut world, Vec3::new(0.0, REST_HEIGHT, 0.0)).unwrap();
        settle(&mut c, &mut world);
        c.set_walk_direction(Vec3::new(0.05, 0.0, 0.0)).unwrap();

        let mut prev_y = c.position().y;
        let mut max_jump = 0.0f32;
        for _ in 0..200 {
            c.step(&mut world, DT);
            max_jump = max_jump.max((c.position().y - prev_y).abs());
            prev_y = c.position().y;
        }

        assert!(
            c.position().x > 3.5,
            "failed to cross the obstacle, stuck at x = {}",
            c.position().x
        );
        assert!(
            max_jump <= h + 5.0e-3,
            "vertical discontinuity {max_jump} exceeded the obstacle height"
        );
    }

    #[test]
    fn tall_obstacle_blocks_horizontal_motion() {
        let mut world = CollisionWorld::new(vec![
            floor_plane(0),
            box_at(1, Vec3::new(2.0, 1.5, 0.0), Vec3::new(0.5, 1.5, 2.0)),
        ])
        .unwrap();
        let (mut c, _) = spawn(&mut world);
        c.warp(&mut world, Vec3::new(0.0, REST_HEIGHT, 0.0)).unwrap();
        settle(&mut c, &mut world);
        c.set_walk_direction(Vec3::new(0.05, 0.0, 0.0)).unwrap();

        for _ in 0..80 {
            c.step(&mut world, DT);
        }
        let resting_x = c.position().x;
        assert!(resting_x < 1.05, "walked into the wall: x = {resting_x}");

        // Pressing into the wall moves the character no further.
        for _ in 0..20 {
            c.step(&mut world, DT);
            assert_relative_eq!(c.position().x, resting_x, epsilon = 1.0e-3);
        }
        assert_relative_eq!(c.position().y, REST_HEIGHT, epsilon = 1.0e-3);
    }

    #[test]
    fn steep_slope_behaves_like_a_wall() {
        // Surface normal 1.2 rad from up, past the 1.0 rad slope limit.
        let mut world =
            CollisionWorld::new(vec![floor_plane(0), tilted_plane(1, 1.2, 3.0)]).unwrap();
        let (mut c, _) = spawn(&mut world);
        c.warp(&mut world, Vec3::new(0.0, REST_HEIGHT, 0.0)).unwrap();
        settle(&mut c, &mut world);
        c.set_walk_direction(Vec3::new(0.05, 0.0, 0.0)).unwrap();

        let y0 = c.position().y;
        for _ in 0..100 {
            c.step(&mut world, DT);
            assert!(
                c.position().y <= y0 + 1.0e-2,
                "gained height on a too-steep slope: y = {}",
                c.position().y
            );
        }
        assert!((c.position().y - y0).abs() <= 1.0e-2);
        assert!(c.position().x < 3.0);
    }

    #[test]
    fn gentle_slope_is_climbed() {
        // Surface normal 0.5 rad from up, inside the slope limit.
        let mut world =
            CollisionWorld::new(vec![floor_plane(0), tilted_plane(1, 0.5, 3.0)]).unwrap();
        let (mut c, _) = spawn(&mut world);
        c.warp(&mut world, Vec3::new(0.0, REST_HEIGHT, 0.0)).unwrap();
        settle(&mut c, &mut world);
        c.set_walk_direction(Vec3::new(0.05, 0.0, 0.0)).unwrap();

        let y0 = c.position().y;
        for _ in 0..300 {
            c.step(&mut world, DT);
        }
        assert!(
            c.position().y > y0 + 0.5,
            "failed to climb a walkable slope: y = {}",
            c.position().y
        );
        assert!(c.on_ground());
    }

    #[test]
    fn jump_arc_timing_matches_ballistics() {
        let mut world = CollisionWorld::new(vec![floor_plane(0)]).unwrap();
        let (mut c, _) = spawn(&mut world);
        c.warp(&mut world, Vec3::new(0.0, REST_HEIGHT, 0.0)).unwrap();
        settle(&mut c, &mut world);
        let y0 = c.position().y;

        c.jump();
        assert!(!c.on_ground());
        assert_eq!(c.motion_state(), MotionState::Jumping);

        let expected = 2.0 * c.jump_speed() / c.gravity() / DT;
        let mut landed_at = None;
        for tick in 1..=60 {
            c.step(&mut world, DT);
            if tick <= 20 {
                // Ascent: jump speed 10, gravity 29.4 => rising for ~20 ticks.
                assert!(!c.on_ground(), "grounded mid-ascent at tick {tick}");
            }
            if c.on_ground() {
                landed_at = Some(tick);
                break;
            }
        }
        let landed_at = landed_at.expect("never landed") as f32;
        assert!(
            (landed_at - expected).abs() <= 2.0,
            "landed at tick {landed_at}, expected ~{expected}"
        );
        assert_relative_eq!(c.position().y, y0, epsilon = 1.0e-3);
        assert_eq!(c.motion_state(), MotionState::Grounded);
    }

    #[test]
    fn no_double_jump_while_airborne() {
        let mut world = CollisionWorld::new(vec![floor_plane(0)]).unwrap();
        let (mut c, _) = spawn(&mut world);
        c.warp(&mut world, Vec3::new(0.0, REST_HEIGHT, 0.0)).unwrap();
        settle(&mut c, &mut world);

        c.jump();
        c.step(&mut world, DT);
        let v = c.vertical_velocity();
        c.jump();
        assert_eq!(c.vertical_velocity(), v);
    }

    #[test]
    fn fall_speed_clamps_terminal_velocity() {
        let mut world = CollisionWorld::empty();
        let (mut c, _) = spawn(&mut world);
        c.warp(&mut world, Vec3::new(0.0, 1000.0, 0.0)).unwrap();
        for _ in 0..400 {
            c.step(&mut world, DT);
        }
        assert_eq!(c.vertical_velocity(), -c.fall_speed());
    }

    #[test]
    fn walking_off_an_edge_starts_a_fall() {
        let mut world = CollisionWorld::new(vec![box_at(
            0,
            Vec3::new(0.0, -0.5, 0.0),
            Vec3::new(2.0, 0.5, 2.0),
        )])
        .unwrap();
        let (mut c, _) = spawn(&mut world);
        c.warp(&mut world, Vec3::new(0.0, REST_HEIGHT, 0.0)).unwrap();
        settle(&mut c, &mut world);
        c.set_walk_direction(Vec3::new(0.05, 0.0, 0.0)).unwrap();

        for _ in 0..120 {
            c.step(&mut world, DT);
        }
        assert!(!c.on_ground());
        assert_eq!(c.motion_state(), MotionState::Falling);
        assert!(c.position().y < 0.0, "never fell: y = {}", c.position().y);
    }

    #[test]
    fn up_axis_change_reorients_the_fall_next_tick() {
        let mut world = CollisionWorld::empty();
        let (mut c, _) = spawn(&mut world);
        c.warp(&mut world, Vec3::new(0.0, 10.0, 0.0)).unwrap();

        c.step(&mut world, DT);
        let after_first = c.position();
        assert!(after_first.y < 10.0);
        assert_relative_eq!(after_first.x, 0.0);

        // Up rotates 90 degrees; the very next step must fall along -X.
        c.set_up_direction(Vec3::x_axis());
        c.step(&mut world, DT);
        let after_second = c.position();
        assert!(after_second.x < after_first.x);
        assert_relative_eq!(after_second.y, after_first.y, epsilon = 1.0e-6);
    }

    #[test]
    fn warp_resets_motion_state_and_commits_the_proxy() {
        let mut world = CollisionWorld::new(vec![floor_plane(0)]).unwrap();
        let (mut c, proxy) = spawn(&mut world);
        c.warp(&mut world, Vec3::new(0.0, REST_HEIGHT, 0.0)).unwrap();
        settle(&mut c, &mut world);
        c.jump();
        c.step(&mut world, DT);

        let target = Vec3::new(5.0, 20.0, -3.0);
        c.warp(&mut world, target).unwrap();
        assert_eq!(c.position(), target);
        assert_eq!(c.vertical_velocity(), 0.0);
        assert!(!c.on_ground());
        assert_eq!(c.motion_state(), MotionState::Falling);
        assert_eq!(world.proxy(proxy).unwrap().position(), target);

        assert!(
            c.warp(&mut world, Vec3::new(f32::NAN, 0.0, 0.0)).is_err(),
            "non-finite warp must be rejected"
        );
    }

    #[test]
    fn penetration_recovery_is_gradual_not_a_pop() {
        // A wall whose near face overlaps the capsule by 0.05 at spawn.
        let mut world = CollisionWorld::new(vec![box_at(
            0,
            Vec3::new(0.95, 0.0, 0.0),
            Vec3::new(0.5, 2.0, 2.0),
        )])
        .unwrap();
        let (mut c, _) = spawn(&mut world);
        c.set_gravity(0.0);
        c.warp(&mut world, Vec3::zeros()).unwrap();

        c.step(&mut world, DT);
        let x1 = c.position().x;
        assert!(x1 < -0.005, "no push-out happened: x = {x1}");
        assert!(x1 > -0.06, "popped out in one tick: x = {x1}");

        for _ in 0..60 {
            c.step(&mut world, DT);
        }
        let resolved = c.position().x;
        assert!(
            (-0.056..=-0.04).contains(&resolved),
            "did not settle just outside the wall: x = {resolved}"
        );
    }

    #[test]
    fn zero_walk_and_zero_dt_are_no_ops() {
        let mut world = CollisionWorld::new(vec![floor_plane(0)]).unwrap();
        let (mut c, _) = spawn(&mut world);
        c.warp(&mut world, Vec3::new(0.0, REST_HEIGHT, 0.0)).unwrap();
        settle(&mut c, &mut world);

        let before = c.position();
        c.step(&mut world, 0.0);
        assert_eq!(c.position(), before);

        c.set_walk_direction(Vec3::zeros()).unwrap();
        c.step(&mut world, DT);
        assert_relative_eq!(c.position().x, before.x);
        assert_relative_eq!(c.position().z, before.z);
    }

    #[test]
    fn degenerate_shape_moves_without_colliding() {
        let mut world = CollisionWorld::new(vec![floor_plane(0)]).unwrap();
        let shape = ShapeDescriptor::new(ShapeDef::Sphere { radius: 0.0 }).unwrap();
        let proxy = world.insert_proxy(shape.clone(), Iso::identity());
        let mut c = KinematicCharacterController::new(shape, proxy, 1.0).unwrap();
        c.warp(&mut world, Vec3::new(0.0, 1.0, 0.0)).unwrap();

        for _ in 0..120 {
            c.step(&mut world, DT);
        }
        // Fell straight through the floor: queries are trivial successes.
        assert!(c.position().y < 0.0);
        assert!(!c.on_ground());
    }
}
