use nalgebra as na;
use parry3d::{
    query::{self, ShapeCastOptions},
    shape::Shape,
};

use super::world::StaticCollider;
use crate::collision::types::{Iso, OverlapContact, SweepHit, Vec3};

/// Cast a moving convex shape against a single static collider and return the
/// earliest hit (if any).
///
/// - `moving_iso`: the moving shape's starting isometry in world space.
/// - `moving`: the convex shape being swept.
/// - `vel`: the world-space translation vector for this cast (meters).
/// - `max_toi`: the maximum fraction of `vel` to consider (typically 1.0).
///
/// Returns the impact normal (on the moving shape, flipped to oppose the
/// motion) and the fraction along `vel` where the hit occurs.
pub fn cast_shape_against(
    moving_iso: &Iso,
    moving: &dyn Shape,
    vel: Vec3,
    max_toi: f32,
    target: &StaticCollider,
) -> Option<SweepHit> {
    let mut opts = ShapeCastOptions::with_max_time_of_impact(max_toi);
    opts.stop_at_penetration = true;

    if let Ok(Some(hit)) = query::cast_shapes(
        moving_iso,
        &vel,
        moving,
        &target.iso,
        &na::Vector3::zeros(),
        &*target.shape,
        opts,
    ) {
        // Use the normal on the moving shape; ensure it opposes the motion.
        let mut n = hit.normal1.into_inner();
        if n.dot(&vel) > 0.0 {
            n = -n;
        }
        return Some(SweepHit {
            fraction: hit.time_of_impact,
            normal: n,
            depth: 0.0,
        });
    }
    None
}

/// Closest-point/penetration query between a convex shape and a static
/// collider, reported from the moving shape's perspective.
///
/// Returns `None` when the pair is separated by more than `prediction`.
pub fn contact_with(
    moving_iso: &Iso,
    moving: &dyn Shape,
    target: &StaticCollider,
    prediction: f32,
) -> Option<OverlapContact> {
    match query::contact(moving_iso, moving, &target.iso, &*target.shape, prediction) {
        Ok(Some(c)) => Some(OverlapContact {
            // `normal1` points out of the moving shape toward the static;
            // separating the character means pushing it the other way.
            normal: -c.normal1.into_inner(),
            depth: -c.dist,
            point: Vec3::new(c.point1.x, c.point1.y, c.point1.z),
        }),
        _ => None,
    }
}
