//! Keyframe evaluation and shape-tree nodes for Lottie documents.
//!
//! Parse a layer with [`ShapeLayer::construct`], advance it with
//! `update_properties(frame)` and replay it into any [`ShapeRenderer`].

pub mod animatable;
pub mod error;
pub mod expression;
pub mod layer;
pub mod renderer;
pub mod shape;
pub mod version;

pub use animatable::{
    AnimatedProperty, Animatable, Easing, Interpolatable, KeyframeCurve, KeyframeSample,
    PropertySource, SpatialTangents,
};
pub use error::{LottieError, Result};
pub use layer::ShapeLayer;
pub use renderer::*;
pub use shape::{
    EllipseNode, FillNode, GroupNode, PathNode, Position, RectNode, ShapeBase, ShapeElement,
    ShapeKind, ShapeNode, ShapeRegistry, StrokeNode, TransformNode, TrimNode,
};
pub use version::{DocumentVersion, KeyframeLayout};

/// Widths at or below this are treated as zero.
pub const FUZZY_EPSILON: f32 = 1e-5;
