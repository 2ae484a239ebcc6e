use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A 3-D translation vector in the tracking service's frame (arbitrary unit).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl From<Vec3> for [f64; 3] {
    fn from(v: Vec3) -> Self {
        [v.x, v.y, v.z]
    }
}

/// An orientation quaternion in (x, y, z, w) component order.
///
/// Components are stored exactly as delivered by the tracking source.
/// Nothing here normalizes or validates them: a non-unit or NaN quaternion
/// simply produces non-meaningful angles downstream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quaternion {
    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// The identity rotation (no rotation).
    pub fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    /// Rotation of `angle_rad` about the Z axis.
    pub fn from_z_rotation(angle_rad: f64) -> Self {
        let half = angle_rad / 2.0;
        Self::new(0.0, 0.0, half.sin(), half.cos())
    }

    /// Rotation of `angle_rad` about the X axis.
    pub fn from_x_rotation(angle_rad: f64) -> Self {
        let half = angle_rad / 2.0;
        Self::new(half.sin(), 0.0, 0.0, half.cos())
    }

    /// Euclidean norm of the four components.
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }
}

/// Hamilton product: `self * rhs` applies `rhs` first, then `self`.
impl std::ops::Mul for Quaternion {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        )
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<[f64; 4]> for Quaternion {
    fn from([x, y, z, w]: [f64; 4]) -> Self {
        Self::new(x, y, z, w)
    }
}

impl From<Quaternion> for [f64; 4] {
    fn from(q: Quaternion) -> Self {
        [q.x, q.y, q.z, q.w]
    }
}

/// One 6-DoF measurement from the motion-tracking source.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseSample {
    /// Capture time in seconds, as reported by the source.
    #[serde(default)]
    pub timestamp: f64,
    pub translation: Vec3,
    pub rotation: Quaternion,
}

impl PoseSample {
    pub fn new(translation: Vec3, rotation: Quaternion) -> Self {
        Self {
            timestamp: 0.0,
            translation,
            rotation,
        }
    }

    pub fn with_timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Discrete directional command produced by the translator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

impl Command {
    /// Name of the action a sink runs for this command.
    pub fn action_name(&self) -> &'static str {
        match self {
            Command::Forward => "forward",
            Command::Backward => "backward",
            Command::Left => "left",
            Command::Right => "right",
            Command::Up => "up",
            Command::Down => "down",
        }
    }

    /// Script invocation form of the action, e.g. `forward();`.
    pub fn script(&self) -> String {
        format!("{}();", self.action_name())
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.action_name())
    }
}

/// The independently monitored motion dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Translation along the source's Y axis (forward/back).
    TranslationY,
    /// Heading angle (left/right).
    Yaw,
    /// Elevation angle (up/down).
    Pitch,
}

impl Channel {
    /// Command emitted when the value rises past the threshold.
    pub fn positive(&self) -> Command {
        match self {
            Channel::TranslationY => Command::Forward,
            Channel::Yaw => Command::Right,
            Channel::Pitch => Command::Up,
        }
    }

    /// Command emitted when the value falls past the threshold.
    pub fn negative(&self) -> Command {
        match self {
            Channel::TranslationY => Command::Backward,
            Channel::Yaw => Command::Left,
            Channel::Pitch => Command::Down,
        }
    }
}

/// Record of a command whose effect has been executed by a sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// e.g., "posedrive-middleware::sink"
    pub source: String,
    pub command: Command,
}

impl CommandEvent {
    pub fn new(source: impl Into<String>, command: Command) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            command,
        }
    }
}

/// Global error type spanning pose sources, command sinks, and channels.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PoseError {
    #[error("Command sink error: {0}")]
    Sink(String),

    #[error("Pose source error: {0}")]
    Source(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for PoseError {
    fn from(e: std::io::Error) -> Self {
        PoseError::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pose_sample_json_uses_component_arrays() {
        let json = r#"{"timestamp":1.5,"translation":[0.0,1.5,0.0],"rotation":[0.0,0.0,0.0,1.0]}"#;
        let sample: PoseSample = serde_json::from_str(json).unwrap();
        assert_eq!(sample.timestamp, 1.5);
        assert_eq!(sample.translation.y, 1.5);
        assert_eq!(sample.rotation, Quaternion::identity());

        let back = serde_json::to_string(&sample).unwrap();
        assert!(back.contains("\"translation\":[0.0,1.5,0.0]"));
    }

    #[test]
    fn pose_sample_timestamp_defaults_to_zero() {
        let json = r#"{"translation":[1,2,3],"rotation":[0,0,0,1]}"#;
        let sample: PoseSample = serde_json::from_str(json).unwrap();
        assert_eq!(sample.timestamp, 0.0);
        assert_eq!(sample.translation, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn pose_sample_timestamp_round_trips() {
        let sample = PoseSample::new(Vec3::new(0.0, 2.0, 0.0), Quaternion::identity())
            .with_timestamp(42.25);
        let json = serde_json::to_string(&sample).unwrap();
        assert!(json.starts_with("{\"timestamp\":42.25"));
    }

    #[test]
    fn rotation_with_wrong_arity_is_rejected() {
        let json = r#"{"translation":[1,2,3],"rotation":[0,0,1]}"#;
        assert!(serde_json::from_str::<PoseSample>(json).is_err());
    }

    #[test]
    fn channel_command_mapping() {
        assert_eq!(Channel::TranslationY.positive(), Command::Forward);
        assert_eq!(Channel::TranslationY.negative(), Command::Backward);
        assert_eq!(Channel::Yaw.positive(), Command::Right);
        assert_eq!(Channel::Yaw.negative(), Command::Left);
        assert_eq!(Channel::Pitch.positive(), Command::Up);
        assert_eq!(Channel::Pitch.negative(), Command::Down);
    }

    #[test]
    fn command_script_form() {
        assert_eq!(Command::Forward.script(), "forward();");
        assert_eq!(Command::Down.to_string(), "down");
        let json = serde_json::to_string(&Command::Left).unwrap();
        assert_eq!(json, "\"left\"");
    }

    #[test]
    fn z_rotation_quaternion_is_unit() {
        let q = Quaternion::from_z_rotation(0.7);
        assert!((q.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn composing_z_rotations_adds_angles() {
        let q = Quaternion::from_z_rotation(0.3) * Quaternion::from_z_rotation(0.4);
        let expected = Quaternion::from_z_rotation(0.7);
        assert!((q.z - expected.z).abs() < 1e-12);
        assert!((q.w - expected.w).abs() < 1e-12);
        assert_eq!(Quaternion::identity() * expected, expected);
    }

    #[test]
    fn pose_error_display() {
        let err = PoseError::Sink("loop closed".to_string());
        assert!(err.to_string().contains("Command sink error"));
        let io: PoseError = std::io::Error::other("boom").into();
        assert!(matches!(io, PoseError::Io(_)));
    }
}
