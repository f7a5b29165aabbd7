pub mod model;

pub use model::{BezierPath, BezierTangent, Keyframe, Property, Value, Vec2, Vec4};
