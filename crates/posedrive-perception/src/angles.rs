//! Orientation angles derived from a pose quaternion.
//!
//! Two independent angles are extracted with the two-argument arctangent:
//!
//! ```text
//! yaw   = atan2(2(xy + wz), w² + x² − y² − z²)
//! pitch = atan2(2(yz + wx), w² − x² − y² + z²) − 90°
//! ```
//!
//! The term groupings and the −90° pitch offset encode the tracking source's
//! frame (start-of-service → device) and must not be rearranged. Both angles
//! are in degrees in the half-open range (−180°, 180°] before the offset is
//! applied; nothing unwraps across the ±180° branch cut unless the caller
//! opts into [`AngleWrap::Shortest`].
//!
//! # Example
//!
//! ```rust
//! use posedrive_perception::angles::{yaw_degrees, pitch_degrees, PITCH_OFFSET_DEG};
//! use posedrive_types::Quaternion;
//!
//! let q = Quaternion::from_z_rotation(20f64.to_radians());
//! assert!((yaw_degrees(&q) - 20.0).abs() < 1e-9);
//! // Identity orientation sits a quarter turn below the pitch origin.
//! assert!((pitch_degrees(&Quaternion::identity(), PITCH_OFFSET_DEG) + 90.0).abs() < 1e-9);
//! ```

use posedrive_types::Quaternion;
use serde::{Deserialize, Serialize};

/// Offset added to the raw pitch angle, in degrees.
pub const PITCH_OFFSET_DEG: f64 = -90.0;

/// Yaw and pitch derived from one quaternion, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    pub yaw_deg: f64,
    pub pitch_deg: f64,
}

impl Orientation {
    /// Derive both angles from `q`, applying `pitch_offset` to pitch.
    pub fn from_quaternion(q: &Quaternion, pitch_offset: f64) -> Self {
        Self {
            yaw_deg: yaw_degrees(q),
            pitch_deg: pitch_degrees(q, pitch_offset),
        }
    }
}

/// Heading angle of `q` in degrees.
pub fn yaw_degrees(q: &Quaternion) -> f64 {
    let Quaternion { x, y, z, w } = *q;
    (2.0 * (x * y + w * z))
        .atan2(w * w + x * x - y * y - z * z)
        .to_degrees()
}

/// Elevation angle of `q` in degrees, shifted by `offset`.
pub fn pitch_degrees(q: &Quaternion, offset: f64) -> f64 {
    let Quaternion { x, y, z, w } = *q;
    (2.0 * (y * z + w * x))
        .atan2(w * w - x * x - y * y + z * z)
        .to_degrees()
        + offset
}

/// How an angular channel measures its distance from the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleWrap {
    /// Plain difference `value − baseline`. Crossing the ±180° branch cut
    /// looks like a ~360° jump.
    #[default]
    Raw,
    /// Difference folded into (−180°, 180°], so crossing the branch cut is
    /// treated as the short way round.
    Shortest,
}

impl AngleWrap {
    /// Signed distance from `baseline` to `value` under this policy.
    pub fn delta(self, value: f64, baseline: f64) -> f64 {
        match self {
            AngleWrap::Raw => value - baseline,
            AngleWrap::Shortest => wrap_degrees(value - baseline),
        }
    }
}

impl std::str::FromStr for AngleWrap {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(AngleWrap::Raw),
            "shortest" => Ok(AngleWrap::Shortest),
            other => Err(format!("unknown angle wrap mode '{other}'")),
        }
    }
}

/// Fold `deg` into (−180°, 180°]. NaN stays NaN.
pub fn wrap_degrees(deg: f64) -> f64 {
    let r = deg.rem_euclid(360.0);
    if r > 180.0 { r - 360.0 } else { r }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    /// Device held level: a quarter turn about X brings pitch to zero.
    fn level(yaw_deg: f64) -> Quaternion {
        Quaternion::from_z_rotation(yaw_deg.to_radians())
            * Quaternion::from_x_rotation(90f64.to_radians())
    }

    #[test]
    fn identity_has_zero_yaw_and_offset_pitch() {
        let o = Orientation::from_quaternion(&Quaternion::identity(), PITCH_OFFSET_DEG);
        assert!(close(o.yaw_deg, 0.0));
        assert!(close(o.pitch_deg, -90.0));
    }

    #[test]
    fn yaw_follows_rotation_about_z() {
        for deg in [-170.0, -45.0, 0.0, 20.0, 90.0, 179.0] {
            let q = Quaternion::from_z_rotation(f64::to_radians(deg));
            assert!(close(yaw_degrees(&q), deg), "yaw for {deg}");
        }
    }

    #[test]
    fn level_pose_has_zero_pitch_and_keeps_yaw() {
        let o = Orientation::from_quaternion(&level(20.0), PITCH_OFFSET_DEG);
        assert!(close(o.yaw_deg, 20.0));
        assert!(close(o.pitch_deg, 0.0));
    }

    #[test]
    fn pitch_follows_rotation_about_x() {
        let q = Quaternion::from_x_rotation(110f64.to_radians());
        assert!(close(pitch_degrees(&q, PITCH_OFFSET_DEG), 20.0));
        assert!(close(yaw_degrees(&q), 0.0));
    }

    #[test]
    fn nan_component_yields_nan_angles() {
        let q = Quaternion::new(f64::NAN, 0.0, 0.0, 1.0);
        let o = Orientation::from_quaternion(&q, PITCH_OFFSET_DEG);
        assert!(o.yaw_deg.is_nan());
        assert!(o.pitch_deg.is_nan());
    }

    #[test]
    fn non_unit_quaternion_is_not_renormalized() {
        // Uniform scaling cancels inside atan2, so angles survive unchanged.
        let q = Quaternion::from_z_rotation(30f64.to_radians());
        let scaled = Quaternion::new(q.x * 3.0, q.y * 3.0, q.z * 3.0, q.w * 3.0);
        assert!(close(yaw_degrees(&scaled), 30.0));
    }

    #[test]
    fn wrap_degrees_range() {
        assert!(close(wrap_degrees(190.0), -170.0));
        assert!(close(wrap_degrees(-190.0), 170.0));
        assert!(close(wrap_degrees(180.0), 180.0));
        assert!(close(wrap_degrees(-180.0), 180.0));
        assert!(close(wrap_degrees(360.0), 0.0));
        assert!(wrap_degrees(f64::NAN).is_nan());
    }

    #[test]
    fn shortest_delta_crosses_branch_cut() {
        assert!(close(AngleWrap::Raw.delta(-175.0, 175.0), -350.0));
        assert!(close(AngleWrap::Shortest.delta(-175.0, 175.0), 10.0));
    }

    #[test]
    fn angle_wrap_parses_case_insensitively() {
        assert_eq!("Shortest".parse::<AngleWrap>(), Ok(AngleWrap::Shortest));
        assert_eq!("raw".parse::<AngleWrap>(), Ok(AngleWrap::Raw));
        assert!("unwrap".parse::<AngleWrap>().is_err());
    }
}
