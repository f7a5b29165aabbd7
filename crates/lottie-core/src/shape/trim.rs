use super::{fields, property, ShapeBase, ShapeElement};
use crate::animatable::AnimatedProperty;
use crate::error::{LottieError, Result};
use crate::renderer::{ShapeRenderer, TrimMode, TrimPaint};
use crate::version::DocumentVersion;
use serde_json::Value;

/// Trim-paths modifier (`"ty": "tm"`).
#[derive(Debug, Clone)]
pub struct TrimNode {
    base: ShapeBase,
    mode: TrimMode,
    props: Option<TrimProperties>,
}

#[derive(Debug, Clone)]
struct TrimProperties {
    start: AnimatedProperty<f32>,
    end: AnimatedProperty<f32>,
    offset: AnimatedProperty<f32>,
}

impl TrimNode {
    pub fn parse(def: &Value, version: &DocumentVersion) -> Result<Self> {
        let base = ShapeBase::parse(def);
        if base.hidden {
            return Ok(Self {
                base,
                mode: TrimMode::default(),
                props: None,
            });
        }

        let mode = match fields::integer(def, "m") {
            Some(2) => TrimMode::Individually,
            _ => TrimMode::Simultaneously,
        };

        Ok(Self {
            base,
            mode,
            props: Some(TrimProperties {
                start: property(def, "s", version)?,
                end: property(def, "e", version)?,
                offset: property(def, "o", version)?,
            }),
        })
    }

    pub fn mode(&self) -> TrimMode {
        self.mode
    }

    /// Start and end as fractions of the path, start never after end.
    pub fn trim(&self) -> Result<TrimPaint> {
        let props = self.props.as_ref().ok_or(LottieError::NotInitialized)?;
        let start = (props.start.value()? / 100.0).clamp(0.0, 1.0);
        let end = (props.end.value()? / 100.0).clamp(0.0, 1.0);
        Ok(TrimPaint {
            start: start.min(end),
            end: start.max(end),
            offset: props.offset.value()?,
            mode: self.mode,
        })
    }
}

impl ShapeElement for TrimNode {
    fn base(&self) -> &ShapeBase {
        &self.base
    }

    fn update_properties(&mut self, frame: f32) -> Result<()> {
        if let Some(props) = self.props.as_mut() {
            props.start.update(frame)?;
            props.end.update(frame)?;
            props.offset.update(frame)?;
        }
        Ok(())
    }

    fn render(&self, renderer: &mut dyn ShapeRenderer) -> Result<()> {
        if self.base.hidden {
            return Ok(());
        }
        renderer.render_trim(&self.base, &self.trim()?);
        Ok(())
    }
}
