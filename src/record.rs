/*!
Durable snapshot of a character's configuration.

The field names and defaults mirror the save format this controller
replaces, so records written by the old implementation load unchanged.
Velocity and the on-ground flag are deliberately absent: they are transient
state the controller re-derives on its first step after reconstruction.
*/

use serde::{Deserialize, Serialize};

use crate::collision::{
    Vec3,
    settings::{
        DEFAULT_FALL_SPEED, DEFAULT_GRAVITY, DEFAULT_JUMP_SPEED, DEFAULT_MAX_SLOPE,
        DEFAULT_STEP_HEIGHT,
    },
    shape::ShapeDef,
};

/// Everything needed to rebuild a [`PhysicsCharacter`](crate::character::PhysicsCharacter).
///
/// Every field except the shape falls back to its legacy default when absent
/// from a stored record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CharacterRecord {
    #[serde(rename = "collisionShape")]
    pub collision_shape: ShapeDef,

    #[serde(rename = "stepHeight", default = "default_step_height")]
    pub step_height: f32,

    #[serde(rename = "gravity", default = "default_gravity")]
    pub gravity: f32,

    #[serde(rename = "maxSlope", default = "default_max_slope")]
    pub max_slope: f32,

    #[serde(rename = "fallSpeed", default = "default_fall_speed")]
    pub fall_speed: f32,

    #[serde(rename = "jumpSpeed", default = "default_jump_speed")]
    pub jump_speed: f32,

    /// Fixed up-axis selector: 0 = X, 1 = Y, 2 = Z.
    #[serde(rename = "upAxis", default = "default_up_axis")]
    pub up_axis: u32,

    #[serde(rename = "ccdMotionThreshold", default)]
    pub ccd_motion_threshold: f32,

    #[serde(rename = "ccdSweptSphereRadius", default)]
    pub ccd_swept_sphere_radius: f32,

    #[serde(rename = "physicsLocation", default = "default_location")]
    pub physics_location: Vec3,
}

fn default_step_height() -> f32 {
    DEFAULT_STEP_HEIGHT
}

fn default_gravity() -> f32 {
    DEFAULT_GRAVITY
}

fn default_max_slope() -> f32 {
    DEFAULT_MAX_SLOPE
}

fn default_fall_speed() -> f32 {
    DEFAULT_FALL_SPEED
}

fn default_jump_speed() -> f32 {
    DEFAULT_JUMP_SPEED
}

fn default_up_axis() -> u32 {
    1
}

fn default_location() -> Vec3 {
    Vec3::zeros()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CharacterRecord {
        CharacterRecord {
            collision_shape: ShapeDef::CapsuleY {
                radius: 0.4,
                half_height: 0.7,
            },
            step_height: 0.35,
            gravity: 20.0,
            max_slope: 0.8,
            fall_speed: 30.0,
            jump_speed: 15.0,
            up_axis: 2,
            ccd_motion_threshold: 0.5,
            ccd_swept_sphere_radius: 0.25,
            physics_location: Vec3::new(2.0, 3.0, 4.0),
        }
    }

    #[test]
    fn json_round_trip_is_lossless() {
        let record = sample();
        let json = serde_json::to_string(&record).unwrap();
        let back: CharacterRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn serialized_records_use_the_legacy_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        let object = json.as_object().unwrap();
        for key in [
            "collisionShape",
            "stepHeight",
            "gravity",
            "maxSlope",
            "fallSpeed",
            "jumpSpeed",
            "upAxis",
            "ccdMotionThreshold",
            "ccdSweptSphereRadius",
            "physicsLocation",
        ] {
            assert!(object.contains_key(key), "missing field {key}");
        }
    }

    #[test]
    fn missing_fields_take_the_legacy_defaults() {
        let json = r#"{"collisionShape": {"CapsuleY": {"radius": 0.5, "half_height": 0.5}}}"#;
        let record: CharacterRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.step_height, 1.0);
        assert_eq!(record.gravity, 29.4);
        assert_eq!(record.max_slope, 1.0);
        assert_eq!(record.fall_speed, 55.0);
        assert_eq!(record.jump_speed, 10.0);
        assert_eq!(record.up_axis, 1);
        assert_eq!(record.ccd_motion_threshold, 0.0);
        assert_eq!(record.ccd_swept_sphere_radius, 0.0);
        assert_eq!(record.physics_location, Vec3::zeros());
    }
}
