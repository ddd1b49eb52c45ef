/*!
Character controller settings and tolerances.

These constants centralize the parameters used by the kinematic controller,
collision sweep-and-slide, ground snapping, and penetration recovery.
Keeping them together makes tuning easier and helps ensure deterministic
behavior across platforms.

Notes
- Distances are in meters, time in seconds, angles in radians.
- Favor practical world-space tolerances over machine epsilon for robust
  behavior.
- Per-character configuration (step height, speeds, slope limit) lives on the
  controller; the values here are either fixed tolerances or the defaults a
  reconstructed character falls back to.
*/

/// Separation from surfaces kept when landing or sliding (meters).
/// Too large creates visible gaps; too small risks jitter on contact.
pub const SKIN: f32 = 0.02;

/// Maximum number of slide iterations per horizontal sweep.
/// Higher values help with tight corners at the cost of more queries.
pub const MAX_SLIDE_ITERATIONS: u32 = 4;

/// Maximum number of slide iterations for the vertical (gravity/jump) sweep.
/// One deflection is usually enough to shed motion along a steep surface.
pub const MAX_VERTICAL_ITERATIONS: u32 = 2;

/// Maximum passes of overlap-driven penetration recovery per tick.
pub const MAX_PENETRATION_ITERATIONS: u32 = 4;

/// Fraction of the reported penetration depth corrected per recovery pass.
/// Spreading the push-out over several ticks avoids visible popping.
pub const PENETRATION_RECOVERY_FRACTION: f32 = 0.2;

/// Overlap depth below which recovery leaves the character alone (meters).
pub const PENETRATION_SLOP: f32 = 1.0e-3;

/// Minimum squared movement threshold to consider a sweep meaningful (m^2).
/// Movements below this are treated as zero to avoid tiny oscillations.
pub const MIN_MOVE_SQ: f32 = 1.0e-8;

/// Practical small distance for comparisons (meters).
/// Use for dot-product guards, equality checks in world space, etc.
pub const DIST_EPS: f32 = 1.0e-6;

/// Downward probe length used to latch onto ground while airborne (meters).
/// Deliberately short so a jump arc is never cut off early; the grounded
/// probe uses the configured step height instead.
pub const GROUND_LATCH_DISTANCE: f32 = 0.05;

/// Snap corrections smaller than this are skipped entirely (meters).
/// A character at rest stays bit-for-bit stationary instead of jittering
/// around the hover height.
pub const SNAP_DEADBAND: f32 = 1.0e-4;

/// Fraction of the requested planar displacement that must be achieved
/// before the controller skips the step-up attempt.
pub const STEP_ACCEPT_RATIO: f32 = 0.9;

/// Minimum forward clearance validated during a step-up attempt (meters).
/// The landing probe settles at least this far past the obstacle's near
/// edge, so the character stands on the step instead of balancing on its
/// rim.
pub const STEP_MIN_WIDTH: f32 = 0.2;

/// Default quantization size for vertical step detection (meters).
pub const DEFAULT_STEP_HEIGHT: f32 = 1.0;

/// Default gravity magnitude (m/s^2). Three times Earth gravity, preserved
/// from the legacy tuning this controller replaces.
pub const DEFAULT_GRAVITY: f32 = 29.4;

/// Default maximum climbable slope angle (radians).
pub const DEFAULT_MAX_SLOPE: f32 = 1.0;

/// Default terminal fall speed clamp (m/s).
pub const DEFAULT_FALL_SPEED: f32 = 55.0;

/// Default vertical takeoff speed for jumps (m/s).
pub const DEFAULT_JUMP_SPEED: f32 = 10.0;
