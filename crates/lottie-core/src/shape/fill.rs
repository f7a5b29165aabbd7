use super::{fields, property, ShapeBase, ShapeElement};
use crate::animatable::AnimatedProperty;
use crate::error::{LottieError, Result};
use crate::renderer::{Color, FillPaint, FillRule, ShapeRenderer};
use crate::version::DocumentVersion;
use glam::Vec4;
use serde_json::Value;

/// Solid fill paint (`"ty": "fl"`).
#[derive(Debug, Clone)]
pub struct FillNode {
    base: ShapeBase,
    rule: FillRule,
    props: Option<FillProperties>,
}

#[derive(Debug, Clone)]
struct FillProperties {
    color: AnimatedProperty<Vec4>,
    opacity: AnimatedProperty<f32>,
}

impl FillNode {
    pub fn parse(def: &Value, version: &DocumentVersion) -> Result<Self> {
        let base = ShapeBase::parse(def);
        if base.hidden {
            return Ok(Self {
                base,
                rule: FillRule::default(),
                props: None,
            });
        }

        let rule = match fields::integer(def, "r") {
            Some(2) => FillRule::EvenOdd,
            Some(1) | None => FillRule::NonZero,
            Some(code) => {
                let err = LottieError::UnknownEnumerationCode { field: "r", code };
                tracing::debug!("{err}, using non-zero");
                FillRule::NonZero
            }
        };

        Ok(Self {
            base,
            rule,
            props: Some(FillProperties {
                color: property(def, "c", version)?,
                opacity: property(def, "o", version)?,
            }),
        })
    }

    pub fn rule(&self) -> FillRule {
        self.rule
    }

    fn props(&self) -> Result<&FillProperties> {
        self.props.as_ref().ok_or(LottieError::NotInitialized)
    }

    pub fn color(&self) -> Result<Color> {
        Ok(Color::from_vec4(self.props()?.color.value()?))
    }

    /// 0–100, reported apart from the colour's alpha.
    pub fn opacity(&self) -> Result<f32> {
        self.props()?.opacity.value()
    }

    pub fn paint(&self) -> Result<FillPaint> {
        Ok(FillPaint {
            color: self.color()?,
            rule: self.rule,
        })
    }
}

impl ShapeElement for FillNode {
    fn base(&self) -> &ShapeBase {
        &self.base
    }

    fn update_properties(&mut self, frame: f32) -> Result<()> {
        if let Some(props) = self.props.as_mut() {
            props.color.update(frame)?;
            props.opacity.update(frame)?;
        }
        Ok(())
    }

    fn render(&self, renderer: &mut dyn ShapeRenderer) -> Result<()> {
        if self.base.hidden {
            return Ok(());
        }
        renderer.render_fill(&self.base, &self.paint()?, self.opacity()?);
        Ok(())
    }
}
