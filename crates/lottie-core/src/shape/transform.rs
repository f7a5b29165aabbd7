use super::{fields, property, property_or, ShapeBase, ShapeElement};
use crate::animatable::AnimatedProperty;
use crate::error::{LottieError, Result};
use crate::renderer::ShapeRenderer;
use crate::version::DocumentVersion;
use glam::{Mat3, Vec2, Vec3};
use serde_json::Value;

/// Position is either one spatial property or independent x/y channels.
#[derive(Debug, Clone)]
pub enum Position {
    Unified(AnimatedProperty<Vec2>),
    Split {
        x: AnimatedProperty<f32>,
        y: AnimatedProperty<f32>,
    },
}

impl Position {
    fn parse(def: &Value, version: &DocumentVersion) -> Result<Self> {
        let p = fields::fragment(def, "p");
        if fields::flag(p, "s") {
            return Ok(Position::Split {
                x: property(p, "x", version)?,
                y: property(p, "y", version)?,
            });
        }
        Ok(Position::Unified(property(def, "p", version)?))
    }

    fn update(&mut self, frame: f32) -> Result<()> {
        match self {
            Position::Unified(p) => p.update(frame),
            Position::Split { x, y } => {
                x.update(frame)?;
                y.update(frame)
            }
        }
    }

    pub fn value(&self) -> Result<Vec2> {
        match self {
            Position::Unified(p) => p.value(),
            Position::Split { x, y } => Ok(Vec2::new(x.value()?, y.value()?)),
        }
    }
}

#[derive(Debug, Clone)]
struct TransformProperties {
    anchor: AnimatedProperty<Vec2>,
    position: Position,
    scale: AnimatedProperty<Vec2>,
    rotation: AnimatedProperty<f32>,
    opacity: AnimatedProperty<f32>,
    skew: AnimatedProperty<f32>,
    skew_axis: AnimatedProperty<f32>,
}

/// Group transform (`"ty": "tr"`), also used for a layer's `ks` block.
#[derive(Debug, Clone)]
pub struct TransformNode {
    base: ShapeBase,
    props: Option<TransformProperties>,
}

impl TransformNode {
    pub fn parse(def: &Value, version: &DocumentVersion) -> Result<Self> {
        Self::from_definition(ShapeBase::parse(def), def, version)
    }

    /// Builds the transform from `def` under an identity supplied by the
    /// caller, e.g. the owning layer.
    pub fn from_definition(base: ShapeBase, def: &Value, version: &DocumentVersion) -> Result<Self> {
        if base.hidden {
            return Ok(Self { base, props: None });
        }

        // 3D layers carry their z rotation in `rz`.
        let rotation_key = if def.get("r").is_some() { "r" } else { "rz" };

        Ok(Self {
            base,
            props: Some(TransformProperties {
                anchor: property(def, "a", version)?,
                position: Position::parse(def, version)?,
                scale: property_or(def, "s", version, Vec2::splat(100.0))?,
                rotation: property(def, rotation_key, version)?,
                opacity: property_or(def, "o", version, 100.0)?,
                skew: property(def, "sk", version)?,
                skew_axis: property(def, "sa", version)?,
            }),
        })
    }

    fn props(&self) -> Result<&TransformProperties> {
        self.props.as_ref().ok_or(LottieError::NotInitialized)
    }

    pub fn position(&self) -> Option<&Position> {
        self.props.as_ref().map(|p| &p.position)
    }

    pub fn opacity(&self) -> Result<f32> {
        self.props()?.opacity.value()
    }

    /// `T(position) · R(rotation) · Skew · S(scale / 100) · T(-anchor)`.
    /// Positive rotation turns clockwise in the y-down document space.
    pub fn matrix(&self) -> Result<Mat3> {
        let props = self.props()?;
        let anchor = props.anchor.value()?;
        let position = props.position.value()?;
        let scale = props.scale.value()? / 100.0;
        let rotation = props.rotation.value()?.to_radians();
        let skew = props.skew.value()?.to_radians();
        let skew_axis = props.skew_axis.value()?.to_radians();

        let mat_t = Mat3::from_translation(position);
        let mat_r = Mat3::from_rotation_z(rotation);

        // Shear along the skew axis: rotate onto it, shear, rotate back.
        let mat_skew = if skew.abs() < f32::EPSILON {
            Mat3::IDENTITY
        } else {
            let shear = Mat3::from_cols(
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(-skew.tan(), 1.0, 0.0),
                Vec3::new(0.0, 0.0, 1.0),
            );
            Mat3::from_rotation_z(skew_axis) * shear * Mat3::from_rotation_z(-skew_axis)
        };

        let mat_s = Mat3::from_scale(scale);
        let mat_a = Mat3::from_translation(-anchor);

        Ok(mat_t * mat_r * mat_skew * mat_s * mat_a)
    }
}

impl ShapeElement for TransformNode {
    fn base(&self) -> &ShapeBase {
        &self.base
    }

    fn update_properties(&mut self, frame: f32) -> Result<()> {
        if let Some(props) = self.props.as_mut() {
            props.anchor.update(frame)?;
            props.position.update(frame)?;
            props.scale.update(frame)?;
            props.rotation.update(frame)?;
            props.opacity.update(frame)?;
            props.skew.update(frame)?;
            props.skew_axis.update(frame)?;
        }
        Ok(())
    }

    fn render(&self, renderer: &mut dyn ShapeRenderer) -> Result<()> {
        if self.base.hidden {
            return Ok(());
        }
        renderer.render_transform(&self.base, self.matrix()?, self.opacity()?);
        Ok(())
    }
}
