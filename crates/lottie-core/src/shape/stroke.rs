use super::{fields, property, ShapeBase, ShapeElement};
use crate::animatable::AnimatedProperty;
use crate::error::{LottieError, Result};
use crate::renderer::{Color, DashPattern, LineCap, LineJoin, Pen, ShapeRenderer, StrokePaint};
use crate::version::DocumentVersion;
use crate::FUZZY_EPSILON;
use glam::Vec4;
use serde_json::Value;

const DEFAULT_MITER_LIMIT: f32 = 4.0;

/// Solid stroke paint (`"ty": "st"`).
#[derive(Debug, Clone)]
pub struct StrokeNode {
    base: ShapeBase,
    cap: LineCap,
    join: LineJoin,
    miter_limit: f32,
    // None when the definition was hidden at load time.
    props: Option<StrokeProperties>,
}

#[derive(Debug, Clone)]
struct StrokeProperties {
    opacity: AnimatedProperty<f32>,
    width: AnimatedProperty<f32>,
    color: AnimatedProperty<Vec4>,
    dash: Option<DashProperties>,
}

#[derive(Debug, Clone)]
struct DashProperties {
    offset: AnimatedProperty<f32>,
    length: AnimatedProperty<f32>,
    gap: AnimatedProperty<f32>,
}

impl StrokeNode {
    pub fn parse(def: &Value, version: &DocumentVersion) -> Result<Self> {
        let base = ShapeBase::parse(def);
        let mut node = Self {
            base,
            cap: LineCap::default(),
            join: LineJoin::default(),
            miter_limit: DEFAULT_MITER_LIMIT,
            props: None,
        };
        if node.base.hidden {
            return Ok(node);
        }

        tracing::debug!(name = %node.base.name, "parsing stroke");

        match fields::integer(def, "lc") {
            Some(code) => match LineCap::from_code(code) {
                Some(cap) => node.cap = cap,
                None => log_unknown_code("lc", code),
            },
            None => tracing::debug!("stroke without line cap"),
        }

        match fields::integer(def, "lj") {
            Some(code) => match LineJoin::from_code(code) {
                Some(join) => {
                    node.join = join;
                    if join == LineJoin::Miter {
                        node.miter_limit = fields::number(def, "ml").unwrap_or(DEFAULT_MITER_LIMIT);
                    }
                }
                None => log_unknown_code("lj", code),
            },
            None => tracing::debug!("stroke without line join"),
        }

        let opacity = property(def, "o", version)?;
        let width = property(def, "w", version)?;
        let color = property(def, "c", version)?;
        let dash = parse_dashes(fields::array(def, "d"), version)?;

        node.props = Some(StrokeProperties {
            opacity,
            width,
            color,
            dash,
        });
        Ok(node)
    }

    pub fn base(&self) -> &ShapeBase {
        &self.base
    }

    pub fn name(&self) -> &str {
        &self.base.name
    }

    pub fn hidden(&self) -> bool {
        self.base.hidden
    }

    pub fn cap(&self) -> LineCap {
        self.cap
    }

    pub fn join(&self) -> LineJoin {
        self.join
    }

    pub fn miter_limit(&self) -> f32 {
        self.miter_limit
    }

    pub fn is_dashed(&self) -> bool {
        self.props.as_ref().is_some_and(|p| p.dash.is_some())
    }

    fn props(&self) -> Result<&StrokeProperties> {
        self.props.as_ref().ok_or(LottieError::NotInitialized)
    }

    /// Opacity on the document's 0–100 scale, not folded into the colour.
    pub fn opacity(&self) -> Result<f32> {
        self.props()?.opacity.value()
    }

    pub fn width(&self) -> Result<f32> {
        self.props()?.width.value()
    }

    pub fn color(&self) -> Result<Color> {
        Ok(Color::from_vec4(self.props()?.color.value()?))
    }

    pub fn opacity_property(&self) -> Option<&AnimatedProperty<f32>> {
        self.props.as_ref().map(|p| &p.opacity)
    }

    pub fn width_property(&self) -> Option<&AnimatedProperty<f32>> {
        self.props.as_ref().map(|p| &p.width)
    }

    pub fn color_property(&self) -> Option<&AnimatedProperty<Vec4>> {
        self.props.as_ref().map(|p| &p.color)
    }

    pub fn dash_offset(&self) -> Option<&AnimatedProperty<f32>> {
        self.dash().map(|d| &d.offset)
    }

    pub fn dash_length(&self) -> Option<&AnimatedProperty<f32>> {
        self.dash().map(|d| &d.length)
    }

    pub fn dash_gap(&self) -> Option<&AnimatedProperty<f32>> {
        self.dash().map(|d| &d.gap)
    }

    fn dash(&self) -> Option<&DashProperties> {
        self.props.as_ref().and_then(|p| p.dash.as_ref())
    }

    /// Pen for the current frame. A zero or non-finite width yields
    /// [`StrokePaint::None`]; dash values are expressed in multiples of the
    /// current width.
    pub fn paint(&self) -> Result<StrokePaint> {
        let props = self.props()?;
        let width = props.width.value()?;
        if !width.is_finite() || width.abs() <= FUZZY_EPSILON {
            return Ok(StrokePaint::None);
        }

        let dash = match &props.dash {
            Some(d) => Some(DashPattern {
                offset: d.offset.value()? / width,
                pattern: [d.length.value()? / width, d.gap.value()? / width],
            }),
            None => None,
        };

        Ok(StrokePaint::Pen(Pen {
            color: Color::from_vec4(props.color.value()?),
            width,
            cap: self.cap,
            join: self.join,
            miter_limit: self.miter_limit,
            dash,
        }))
    }
}

impl ShapeElement for StrokeNode {
    fn base(&self) -> &ShapeBase {
        &self.base
    }

    fn update_properties(&mut self, frame: f32) -> Result<()> {
        let Some(props) = self.props.as_mut() else {
            return Ok(());
        };

        props.opacity.update(frame)?;
        props.width.update(frame)?;
        props.color.update(frame)?;
        if let Some(dash) = props.dash.as_mut() {
            dash.offset.update(frame)?;
            dash.length.update(frame)?;
            dash.gap.update(frame)?;
        }
        Ok(())
    }

    fn render(&self, renderer: &mut dyn ShapeRenderer) -> Result<()> {
        if self.base.hidden {
            return Ok(());
        }
        let paint = self.paint()?;
        renderer.render_stroke(&self.base, &paint, self.opacity()?);
        Ok(())
    }
}

fn log_unknown_code(field: &'static str, code: i64) {
    let err = LottieError::UnknownEnumerationCode { field, code };
    tracing::debug!("{err}, keeping default");
}

/// Entries are matched by their `"n"` tag. When a tag repeats, the first entry
/// in document order is used and the rest are ignored.
fn parse_dashes(entries: &[Value], version: &DocumentVersion) -> Result<Option<DashProperties>> {
    if entries.is_empty() {
        return Ok(None);
    }

    let mut offset: Option<AnimatedProperty<f32>> = None;
    let mut length: Option<AnimatedProperty<f32>> = None;
    let mut gap: Option<AnimatedProperty<f32>> = None;

    for entry in entries {
        let slot = match fields::string(entry, "n").as_deref() {
            Some("o") => &mut offset,
            Some("d") => &mut length,
            Some("g") => &mut gap,
            other => {
                tracing::debug!(tag = ?other, "ignoring dash entry");
                continue;
            }
        };
        if slot.is_some() {
            tracing::debug!("duplicate dash entry ignored");
            continue;
        }
        *slot = Some(property(entry, "v", version)?);
    }

    let zero = || AnimatedProperty::from_static(0.0_f32);
    Ok(Some(DashProperties {
        offset: offset.unwrap_or_else(zero),
        length: length.unwrap_or_else(zero),
        gap: gap.unwrap_or_else(zero),
    }))
}
