/*!
Shared collision world: immutable statics plus character sensor proxies.

Design goals
- Deterministic: statics are sorted by `id` before insertion, so the same
  inputs always build the same query order.
- Query-focused: supports the convex sweep and overlap/contact queries the
  kinematic character controller needs, nothing more.
- Sensor proxies: each character registers a ghost proxy carrying its shape,
  committed pose, and CCD tuning. Proxies report state but are never swept
  against; they generate no contact response, so characters do not push each
  other and ghost-vs-ghost overlap is left unresolved.
*/

use parry3d::shape::{HalfSpace, Shape, SharedShape};
use slotmap::{SlotMap, new_key_type};

use super::{
    broad::{self, WorldAccel},
    narrow_phase,
    settings::{MIN_MOVE_SQ, SKIN},
    shape::{ShapeDef, ShapeDescriptor, plane_from_pose},
    types::{Iso, OverlapContact, SweepHit, Transform, Vec3},
};
use crate::error::CharacterError;

/// Canonical, schema-agnostic definition of an immutable world collider.
///
/// Conventions
/// - Units are meters.
/// - `id` is a stable unique identifier used to ensure deterministic
///   insertion order.
/// - For planes, the world normal is derived from the pose as
///   `rotation * +Y`, with `dist = dot(normal, translation) + offset`.
#[derive(Clone, Debug)]
pub struct WorldStaticDef {
    pub id: u32,
    pub transform: Transform,
    pub shape: ShapeDef,
}

/// A built static collider: the parry3d shape plus its world pose.
pub struct StaticCollider {
    pub id: u32,
    pub shape: SharedShape,
    pub iso: Iso,
    pub is_plane: bool,
}

impl StaticCollider {
    /// Build the parry3d shape for a static definition.
    ///
    /// Planes become half-spaces positioned along their pose-derived normal;
    /// every other shape keeps the definition's pose directly.
    pub fn build(def: &WorldStaticDef) -> Result<Self, CharacterError> {
        if !def.shape.is_well_formed() {
            return Err(CharacterError::UnsupportedShape {
                reason: format!("world static {} has malformed extents", def.id),
            });
        }
        if let ShapeDef::Plane {
            offset_along_normal,
        } = def.shape
        {
            let (normal, dist) = plane_from_pose(&def.transform, offset_along_normal);
            let iso = Iso::new(normal.into_inner() * dist, nalgebra::zero());
            Ok(Self {
                id: def.id,
                shape: SharedShape::new(HalfSpace::new(normal)),
                iso,
                is_plane: true,
            })
        } else {
            Ok(Self {
                id: def.id,
                shape: def.shape.build()?,
                iso: def.transform.iso(),
                is_plane: false,
            })
        }
    }
}

new_key_type! {
    /// Generational key for a registered sensor proxy.
    pub struct ProxyKey;
}

/// Collision-detection-only stand-in for a character.
///
/// Carries the committed pose other systems read back, plus the
/// continuous-collision-detection tuning the proxy's owner configures. The
/// proxy never participates in sweeps or contact queries.
pub struct SensorProxy {
    shape: ShapeDescriptor,
    pose: Iso,
    ccd_motion_threshold: f32,
    ccd_swept_sphere_radius: f32,
}

impl SensorProxy {
    pub fn pose(&self) -> &Iso {
        &self.pose
    }

    pub fn position(&self) -> Vec3 {
        self.pose.translation.vector
    }

    pub fn shape(&self) -> &ShapeDescriptor {
        &self.shape
    }

    pub fn ccd_motion_threshold(&self) -> f32 {
        self.ccd_motion_threshold
    }

    pub fn ccd_swept_sphere_radius(&self) -> f32 {
        self.ccd_swept_sphere_radius
    }
}

/// The collision world shared by every character.
pub struct CollisionWorld {
    statics: Vec<StaticCollider>,
    accel: WorldAccel,
    proxies: SlotMap<ProxyKey, SensorProxy>,
}

impl CollisionWorld {
    /// Build a world from a list of static collider definitions.
    ///
    /// The input is sorted by `id` before insertion so identical inputs build
    /// identical query orders.
    pub fn new(mut defs: Vec<WorldStaticDef>) -> Result<Self, CharacterError> {
        defs.sort_by_key(|d| d.id);
        let statics = defs
            .iter()
            .map(StaticCollider::build)
            .collect::<Result<Vec<_>, _>>()?;
        let accel = broad::build_world_accel(&statics);
        Ok(Self {
            statics,
            accel,
            proxies: SlotMap::with_key(),
        })
    }

    /// A world with no static geometry (characters free-fall forever).
    pub fn empty() -> Self {
        Self {
            statics: Vec::new(),
            accel: broad::build_world_accel(&[]),
            proxies: SlotMap::with_key(),
        }
    }

    /// Append one static collider and rebuild the broad phase.
    pub fn insert_static(&mut self, def: WorldStaticDef) -> Result<(), CharacterError> {
        self.statics.push(StaticCollider::build(&def)?);
        self.accel = broad::build_world_accel(&self.statics);
        Ok(())
    }

    pub fn statics(&self) -> &[StaticCollider] {
        &self.statics
    }

    /// Sweep a convex shape along `translation` and return the earliest hit.
    ///
    /// Planes are always tested; finite statics are pruned through the
    /// broad-phase accelerator first. A zero-length translation is a
    /// degenerate query and reports no hit. The returned normal opposes the
    /// motion; `depth` is non-zero only when the cast started already
    /// penetrating the obstacle.
    pub fn sweep(&self, shape: &dyn Shape, start: &Iso, translation: &Vec3) -> Option<SweepHit> {
        if translation.norm_squared() <= MIN_MOVE_SQ {
            return None;
        }

        let swept = broad::swept_shape_aabb(shape, start, translation, SKIN);
        let mut best: Option<(SweepHit, usize)> = None;

        for &idx in &self.accel.plane_indices {
            if let Some(hit) =
                narrow_phase::cast_shape_against(start, shape, *translation, 1.0, &self.statics[idx])
            {
                if best.map_or(true, |(b, _)| hit.fraction < b.fraction) {
                    best = Some((hit, idx));
                }
            }
        }

        for idx in broad::query_candidates(&self.accel, &swept) {
            if let Some(hit) =
                narrow_phase::cast_shape_against(start, shape, *translation, 1.0, &self.statics[idx])
            {
                if best.map_or(true, |(b, _)| hit.fraction < b.fraction) {
                    best = Some((hit, idx));
                }
            }
        }

        best.map(|(mut hit, idx)| {
            if hit.fraction <= 0.0 {
                // The cast began inside the obstacle; report how deep.
                if let Some(c) = narrow_phase::contact_with(start, shape, &self.statics[idx], 0.0) {
                    hit.depth = c.depth.max(0.0);
                }
            }
            hit
        })
    }

    /// Report every static currently overlapping (or within `prediction` of)
    /// the given shape, with separating vectors and penetration depths.
    pub fn contacts(&self, shape: &dyn Shape, pose: &Iso, prediction: f32) -> Vec<OverlapContact> {
        let aabb = broad::swept_shape_aabb(shape, pose, &Vec3::zeros(), prediction.max(SKIN));
        let mut out = Vec::new();

        for &idx in &self.accel.plane_indices {
            if let Some(c) = narrow_phase::contact_with(pose, shape, &self.statics[idx], prediction)
            {
                out.push(c);
            }
        }
        for idx in broad::query_candidates(&self.accel, &aabb) {
            if let Some(c) = narrow_phase::contact_with(pose, shape, &self.statics[idx], prediction)
            {
                out.push(c);
            }
        }
        out
    }

    /// Register a sensor proxy for a character shape.
    pub fn insert_proxy(&mut self, shape: ShapeDescriptor, pose: Iso) -> ProxyKey {
        self.proxies.insert(SensorProxy {
            shape,
            pose,
            ccd_motion_threshold: 0.0,
            ccd_swept_sphere_radius: 0.0,
        })
    }

    /// Remove a proxy. Returns false when the key was already dead.
    pub fn remove_proxy(&mut self, key: ProxyKey) -> bool {
        self.proxies.remove(key).is_some()
    }

    pub fn proxy(&self, key: ProxyKey) -> Option<&SensorProxy> {
        self.proxies.get(key)
    }

    /// Commit a new pose for a proxy. Returns false when the key is dead.
    pub fn set_proxy_pose(&mut self, key: ProxyKey, pose: Iso) -> bool {
        match self.proxies.get_mut(key) {
            Some(p) => {
                p.pose = pose;
                true
            }
            None => false,
        }
    }

    /// Swap a proxy's shape in place, keeping pose and CCD tuning.
    pub fn set_proxy_shape(&mut self, key: ProxyKey, shape: ShapeDescriptor) -> bool {
        match self.proxies.get_mut(key) {
            Some(p) => {
                p.shape = shape;
                true
            }
            None => false,
        }
    }

    pub fn set_proxy_ccd_motion_threshold(&mut self, key: ProxyKey, threshold: f32) -> bool {
        match self.proxies.get_mut(key) {
            Some(p) => {
                p.ccd_motion_threshold = threshold;
                true
            }
            None => false,
        }
    }

    pub fn set_proxy_ccd_swept_sphere_radius(&mut self, key: ProxyKey, radius: f32) -> bool {
        match self.proxies.get_mut(key) {
            Some(p) => {
                p.ccd_swept_sphere_radius = radius;
                true
            }
            None => false,
        }
    }
}
