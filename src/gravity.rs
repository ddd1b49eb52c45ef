/*!
Gravity field: the per-tick source of the character's "up" direction.

Two kinds of world are supported:
- Fixed-axis worlds, where up is one of the world basis vectors (or any
  caller-supplied unit vector) and never changes.
- Radial worlds, where gravity always points toward an attractor (a planetoid
  center of mass), so up is recomputed from the character's position every
  tick.

The field is a pure function of position. Nothing is cached across ticks; the
owning simulation loop queries it before each controller step and hands the
result to the controller explicitly. That keeps re-orientation instantaneous
as a character orbits the attractor.
*/

use serde::{Deserialize, Serialize};

use crate::collision::settings::DIST_EPS;
use crate::collision::types::{UnitVec3, Vec3};
use crate::error::CharacterError;

/// Selector for a fixed world up axis, persisted as its index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpAxis {
    X,
    Y,
    Z,
}

impl UpAxis {
    pub fn unit(self) -> UnitVec3 {
        match self {
            Self::X => Vec3::x_axis(),
            Self::Y => Vec3::y_axis(),
            Self::Z => Vec3::z_axis(),
        }
    }

    pub fn index(self) -> u32 {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    pub fn from_index(index: u32) -> Result<Self, CharacterError> {
        match index {
            0 => Ok(Self::X),
            1 => Ok(Self::Y),
            2 => Ok(Self::Z),
            other => Err(CharacterError::invalid("upAxis", other as f32)),
        }
    }
}

/// Normalized direction from `attractor` toward `position` ("away from
/// center").
///
/// When the two coincide the direction is undefined; +Y is returned so a
/// character spawned exactly at the attractor still has a usable frame.
pub fn radial_up_axis(position: &Vec3, attractor: &Vec3) -> UnitVec3 {
    UnitVec3::try_new(position - attractor, DIST_EPS).unwrap_or_else(Vec3::y_axis)
}

/// A gravity field a simulation loop evaluates once per character per tick.
#[derive(Clone, Copy, Debug)]
pub enum GravityField {
    /// Up never changes (classic flat world).
    Fixed { up: UnitVec3 },
    /// Up points away from an attractor (planetoid world).
    Radial { attractor: Vec3 },
}

impl GravityField {
    pub fn fixed(axis: UpAxis) -> Self {
        Self::Fixed { up: axis.unit() }
    }

    pub fn fixed_direction(up: UnitVec3) -> Self {
        Self::Fixed { up }
    }

    pub fn radial(attractor: Vec3) -> Self {
        Self::Radial { attractor }
    }

    /// The unit up vector for a character at `position` this tick.
    pub fn up_axis(&self, position: &Vec3) -> UnitVec3 {
        match self {
            Self::Fixed { up } => *up,
            Self::Radial { attractor } => radial_up_axis(position, attractor),
        }
    }
}
