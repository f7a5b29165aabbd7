use super::{fields, property, ShapeBase, ShapeElement};
use crate::animatable::AnimatedProperty;
use crate::error::{LottieError, Result};
use crate::renderer::ShapeRenderer;
use crate::version::DocumentVersion;
use glam::Vec2;
use kurbo::{BezPath, Point, Shape as _};
use lottie_data::BezierPath;
use serde_json::Value;

const TOLERANCE: f64 = 0.1;

/// Direction code for paths drawn counter-clockwise.
const DIRECTION_REVERSED: i64 = 3;

fn reversed(direction: Option<i64>) -> bool {
    direction == Some(DIRECTION_REVERSED)
}

/// Converts vertex/tangent data into an absolute kurbo path. Tangents are
/// relative to their vertex; `reversed` walks the vertices backwards.
pub fn bezier_to_path(data: &BezierPath, reversed: bool) -> BezPath {
    let mut bp = BezPath::new();
    let n = data.v.len();
    if n == 0 {
        return bp;
    }

    let at = |list: &[[f32; 2]], idx: usize| list.get(idx).copied().unwrap_or([0.0, 0.0]);
    // Vertex order, with in/out tangents swapped when walking backwards.
    // Closed paths keep their first vertex when reversed, open ones start at the end.
    let vertex = |k: usize| {
        let idx = match (reversed, data.c) {
            (false, _) => k,
            (true, true) => (n - k) % n,
            (true, false) => n - 1 - k,
        };
        let (in_, out) = if reversed {
            (at(&data.o[..], idx), at(&data.i[..], idx))
        } else {
            (at(&data.i[..], idx), at(&data.o[..], idx))
        };
        (data.v[idx], in_, out)
    };

    let (start, _, _) = vertex(0);
    bp.move_to(Point::new(start[0] as f64, start[1] as f64));

    for k in 0..n {
        let next = (k + 1) % n;
        if next == 0 && !data.c {
            break;
        }
        let (p0, _, out) = vertex(k);
        let (p1, in_, _) = vertex(next);
        bp.curve_to(
            Point::new((p0[0] + out[0]) as f64, (p0[1] + out[1]) as f64),
            Point::new((p1[0] + in_[0]) as f64, (p1[1] + in_[1]) as f64),
            Point::new(p1[0] as f64, p1[1] as f64),
        );
    }
    if data.c {
        bp.close_path();
    }
    bp
}

/// Reverses an outline generated by one of kurbo's shapes.
fn reverse_outline(path: BezPath) -> BezPath {
    let data = outline_vertices(&path);
    bezier_to_path(&data, true)
}

/// Recovers vertex/tangent data from a path built by kurbo's shapes.
fn outline_vertices(path: &BezPath) -> BezierPath {
    use kurbo::PathEl;

    let mut out = BezierPath::default();
    let pt = |p: Point| [p.x as f32, p.y as f32];
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => {
                out.v.push(pt(p));
                out.i.push([0.0, 0.0]);
                out.o.push([0.0, 0.0]);
            }
            PathEl::LineTo(p) => {
                out.v.push(pt(p));
                out.i.push([0.0, 0.0]);
                out.o.push([0.0, 0.0]);
            }
            PathEl::QuadTo(c, p) => {
                let last = out.v.last().copied().unwrap_or([0.0, 0.0]);
                if let Some(o) = out.o.last_mut() {
                    *o = [
                        (c.x as f32 - last[0]) * 2.0 / 3.0,
                        (c.y as f32 - last[1]) * 2.0 / 3.0,
                    ];
                }
                let end = pt(p);
                out.v.push(end);
                out.i.push([
                    (c.x as f32 - end[0]) * 2.0 / 3.0,
                    (c.y as f32 - end[1]) * 2.0 / 3.0,
                ]);
                out.o.push([0.0, 0.0]);
            }
            PathEl::CurveTo(c1, c2, p) => {
                let last = out.v.last().copied().unwrap_or([0.0, 0.0]);
                if let Some(o) = out.o.last_mut() {
                    *o = [c1.x as f32 - last[0], c1.y as f32 - last[1]];
                }
                let end = pt(p);
                out.v.push(end);
                out.i.push([c2.x as f32 - end[0], c2.y as f32 - end[1]]);
                out.o.push([0.0, 0.0]);
            }
            PathEl::ClosePath => out.c = true,
        }
    }

    // A closing segment that lands on the start vertex duplicates it.
    let lands_on_start = match (out.v.first(), out.v.last()) {
        (Some(a), Some(b)) => (a[0] - b[0]).abs() < 1e-4 && (a[1] - b[1]).abs() < 1e-4,
        _ => false,
    };
    if out.c && out.v.len() > 1 && lands_on_start {
        out.v.pop();
        let in_ = out.i.pop().unwrap_or([0.0, 0.0]);
        out.o.pop();
        if let Some(first) = out.i.first_mut() {
            *first = in_;
        }
    }
    out
}

/// Free-form bezier path (`"ty": "sh"`).
#[derive(Debug, Clone)]
pub struct PathNode {
    base: ShapeBase,
    reversed: bool,
    shape: Option<AnimatedProperty<BezierPath>>,
}

impl PathNode {
    pub fn parse(def: &Value, version: &DocumentVersion) -> Result<Self> {
        let base = ShapeBase::parse(def);
        let reversed = reversed(fields::integer(def, "d"));
        let shape = if base.hidden {
            None
        } else {
            Some(property(def, "ks", version)?)
        };
        Ok(Self {
            base,
            reversed,
            shape,
        })
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn path(&self) -> Result<BezPath> {
        let shape = self.shape.as_ref().ok_or(LottieError::NotInitialized)?;
        Ok(bezier_to_path(shape.value_ref()?, self.reversed))
    }
}

impl ShapeElement for PathNode {
    fn base(&self) -> &ShapeBase {
        &self.base
    }

    fn update_properties(&mut self, frame: f32) -> Result<()> {
        if let Some(shape) = self.shape.as_mut() {
            shape.update(frame)?;
        }
        Ok(())
    }

    fn render(&self, renderer: &mut dyn ShapeRenderer) -> Result<()> {
        if self.base.hidden {
            return Ok(());
        }
        renderer.render_path(&self.base, &self.path()?);
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct RectProperties {
    position: AnimatedProperty<Vec2>,
    size: AnimatedProperty<Vec2>,
    roundness: AnimatedProperty<f32>,
}

/// Axis-aligned rectangle centred on its position (`"ty": "rc"`).
#[derive(Debug, Clone)]
pub struct RectNode {
    base: ShapeBase,
    reversed: bool,
    props: Option<RectProperties>,
}

impl RectNode {
    pub fn parse(def: &Value, version: &DocumentVersion) -> Result<Self> {
        let base = ShapeBase::parse(def);
        let reversed = reversed(fields::integer(def, "d"));
        let props = if base.hidden {
            None
        } else {
            Some(RectProperties {
                position: property(def, "p", version)?,
                size: property(def, "s", version)?,
                roundness: property(def, "r", version)?,
            })
        };
        Ok(Self {
            base,
            reversed,
            props,
        })
    }

    pub fn path(&self) -> Result<BezPath> {
        let props = self.props.as_ref().ok_or(LottieError::NotInitialized)?;
        let pos = props.position.value()?;
        let size = props.size.value()?;
        let rect = kurbo::Rect::from_center_size(
            (pos.x as f64, pos.y as f64),
            (size.x as f64, size.y as f64),
        );

        // Corner radius cannot exceed half the shorter side.
        let max_radius = (size.x.abs().min(size.y.abs()) / 2.0) as f64;
        let radius = (props.roundness.value()? as f64).clamp(0.0, max_radius);
        let path = if radius > 0.0 {
            rect.to_rounded_rect(radius).to_path(TOLERANCE)
        } else {
            rect.to_path(TOLERANCE)
        };

        Ok(if self.reversed {
            reverse_outline(path)
        } else {
            path
        })
    }
}

impl ShapeElement for RectNode {
    fn base(&self) -> &ShapeBase {
        &self.base
    }

    fn update_properties(&mut self, frame: f32) -> Result<()> {
        if let Some(props) = self.props.as_mut() {
            props.position.update(frame)?;
            props.size.update(frame)?;
            props.roundness.update(frame)?;
        }
        Ok(())
    }

    fn render(&self, renderer: &mut dyn ShapeRenderer) -> Result<()> {
        if self.base.hidden {
            return Ok(());
        }
        renderer.render_path(&self.base, &self.path()?);
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct EllipseProperties {
    position: AnimatedProperty<Vec2>,
    size: AnimatedProperty<Vec2>,
}

/// Ellipse inscribed in a box of `size` around its position (`"ty": "el"`).
#[derive(Debug, Clone)]
pub struct EllipseNode {
    base: ShapeBase,
    reversed: bool,
    props: Option<EllipseProperties>,
}

impl EllipseNode {
    pub fn parse(def: &Value, version: &DocumentVersion) -> Result<Self> {
        let base = ShapeBase::parse(def);
        let reversed = reversed(fields::integer(def, "d"));
        let props = if base.hidden {
            None
        } else {
            Some(EllipseProperties {
                position: property(def, "p", version)?,
                size: property(def, "s", version)?,
            })
        };
        Ok(Self {
            base,
            reversed,
            props,
        })
    }

    pub fn path(&self) -> Result<BezPath> {
        let props = self.props.as_ref().ok_or(LottieError::NotInitialized)?;
        let pos = props.position.value()?;
        let half = props.size.value()? / 2.0;
        let ellipse = kurbo::Ellipse::new(
            (pos.x as f64, pos.y as f64),
            (half.x as f64, half.y as f64),
            0.0,
        );
        let path = ellipse.to_path(TOLERANCE);
        Ok(if self.reversed {
            reverse_outline(path)
        } else {
            path
        })
    }
}

impl ShapeElement for EllipseNode {
    fn base(&self) -> &ShapeBase {
        &self.base
    }

    fn update_properties(&mut self, frame: f32) -> Result<()> {
        if let Some(props) = self.props.as_mut() {
            props.position.update(frame)?;
            props.size.update(frame)?;
        }
        Ok(())
    }

    fn render(&self, renderer: &mut dyn ShapeRenderer) -> Result<()> {
        if self.base.hidden {
            return Ok(());
        }
        renderer.render_path(&self.base, &self.path()?);
        Ok(())
    }
}
