use nalgebra as na;
use parry3d::{
    bounding_volume::Aabb,
    partitioning::{Bvh, BvhBuildStrategy},
    shape::Shape,
};

use super::world::StaticCollider;
use crate::collision::types::{Iso, Vec3};

/// Acceleration structure for broad-phase queries over immutable world
/// statics.
///
/// Notes:
/// - Finite shapes are stored as world-space AABBs in a BVH. Planes are
///   handled separately because they are infinite.
/// - `non_plane_indices` maps each stored AABB back to its index in the
///   original statics slice.
/// - `plane_indices` stores indices of planes in the original statics slice.
pub struct WorldAccel {
    /// BVH over finite static shapes (AABBs).
    pub bvh: Bvh,
    /// Indices into the original statics slice for the AABBs above.
    pub non_plane_indices: Vec<usize>,
    /// Indices into the original statics slice for planes.
    pub plane_indices: Vec<usize>,
}

impl WorldAccel {
    /// Return true if this accelerator has no non-plane entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.non_plane_indices.is_empty()
    }

    /// Number of non-plane entries (AABBs) in this accelerator.
    #[inline]
    pub fn len(&self) -> usize {
        self.non_plane_indices.len()
    }
}

/// Build the broad-phase accelerator over immutable world statics.
///
/// - Finite shapes get a world-space AABB and are indexed in the BVH.
/// - Infinite shapes (planes) are kept in `plane_indices` and must be tested
///   separately during queries.
pub fn build_world_accel(statics: &[StaticCollider]) -> WorldAccel {
    let mut aabbs: Vec<Aabb> = Vec::new();
    let mut non_plane_indices: Vec<usize> = Vec::new();
    let mut plane_indices: Vec<usize> = Vec::new();

    for (i, s) in statics.iter().enumerate() {
        if s.is_plane {
            plane_indices.push(i);
        } else {
            aabbs.push(s.shape.compute_aabb(&s.iso));
            non_plane_indices.push(i);
        }
    }

    WorldAccel {
        bvh: Bvh::from_leaves(BvhBuildStrategy::Binned, &aabbs),
        non_plane_indices,
        plane_indices,
    }
}

/// Compute a swept AABB for a shape moving from `start` to
/// `start * translation`, inflated by `margin` to conservatively include
/// near misses.
pub fn swept_shape_aabb(shape: &dyn Shape, start: &Iso, translation: &Vec3, margin: f32) -> Aabb {
    let end = Iso::from_parts(
        na::Translation3::from(start.translation.vector + translation),
        start.rotation,
    );

    let aabb_start = shape.compute_aabb(start);
    let aabb_end = shape.compute_aabb(&end);

    let mut swept = aabb_union(&aabb_start, &aabb_end);
    if margin > 0.0 {
        swept = aabb_inflate(&swept, margin);
    }
    swept
}

/// Query candidate static indices whose AABB intersects `swept`.
///
/// Returns indices referencing the original statics slice (not the local
/// AABB array).
pub fn query_candidates(accel: &WorldAccel, swept: &Aabb) -> Vec<usize> {
    accel
        .bvh
        .intersect_aabb(swept)
        .map(|leaf_idx| accel.non_plane_indices[leaf_idx as usize])
        .collect()
}

/// Compute the union of two AABBs.
fn aabb_union(a: &Aabb, b: &Aabb) -> Aabb {
    Aabb {
        mins: na::Point3::new(
            a.mins.x.min(b.mins.x),
            a.mins.y.min(b.mins.y),
            a.mins.z.min(b.mins.z),
        ),
        maxs: na::Point3::new(
            a.maxs.x.max(b.maxs.x),
            a.maxs.y.max(b.maxs.y),
            a.maxs.z.max(b.maxs.z),
        ),
    }
}

/// Inflate an AABB by `margin` on all sides.
fn aabb_inflate(a: &Aabb, margin: f32) -> Aabb {
    let delta = na::Vector3::new(margin, margin, margin);
    Aabb {
        mins: a.mins - delta,
        maxs: a.maxs + delta,
    }
}
