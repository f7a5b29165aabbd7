//! Backend-facing side of the shape tree.
//!
//! Nodes push fully evaluated paint descriptions into a [`ShapeRenderer`].
//! Nothing here knows about pixels, colour management or coordinate spaces.

use crate::shape::ShapeBase;
use glam::{Mat3, Vec4};
use kurbo::BezPath;

/// Straight (non-premultiplied) RGBA with channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const BLUE: Color = Color::new(0.0, 0.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Maps x/y/z/w to r/g/b/a, clamping each channel.
    pub fn from_vec4(v: Vec4) -> Self {
        let v = v.clamp(Vec4::ZERO, Vec4::ONE);
        Self::new(v.x, v.y, v.z, v.w)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    Butt,
    #[default]
    Round,
    Square,
}

impl LineCap {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(LineCap::Butt),
            2 => Some(LineCap::Round),
            3 => Some(LineCap::Square),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    Miter,
    #[default]
    Round,
    Bevel,
}

impl LineJoin {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(LineJoin::Miter),
            2 => Some(LineJoin::Round),
            3 => Some(LineJoin::Bevel),
            _ => None,
        }
    }
}

/// Dash pattern in units of the pen width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashPattern {
    pub offset: f32,
    /// `[dash length, gap]`
    pub pattern: [f32; 2],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pen {
    pub color: Color,
    pub width: f32,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
    pub dash: Option<DashPattern>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrokePaint {
    /// Nothing should be drawn for this stroke.
    None,
    Pen(Pen),
}

impl StrokePaint {
    pub fn is_none(&self) -> bool {
        matches!(self, StrokePaint::None)
    }

    pub fn pen(&self) -> Option<&Pen> {
        match self {
            StrokePaint::Pen(pen) => Some(pen),
            StrokePaint::None => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillPaint {
    pub color: Color,
    pub rule: FillRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrimMode {
    #[default]
    Simultaneously,
    Individually,
}

/// Trim window as fractions of the path length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimPaint {
    pub start: f32,
    pub end: f32,
    /// Degrees, 360 is one full path length.
    pub offset: f32,
    pub mode: TrimMode,
}

/// Sink for evaluated shape nodes. Opacities are on the document's 0–100
/// scale and are left for the backend to combine with its ancestors.
pub trait ShapeRenderer {
    fn save_state(&mut self) {}

    fn restore_state(&mut self) {}

    fn render_transform(&mut self, _node: &ShapeBase, _matrix: Mat3, _opacity: f32) {}

    fn render_path(&mut self, _node: &ShapeBase, _path: &BezPath) {}

    fn render_fill(&mut self, _node: &ShapeBase, _paint: &FillPaint, _opacity: f32) {}

    /// `StrokePaint::None` means the stroke must not be drawn at all.
    fn render_stroke(&mut self, _node: &ShapeBase, _paint: &StrokePaint, _opacity: f32) {}

    fn render_trim(&mut self, _node: &ShapeBase, _trim: &TrimPaint) {}
}

#[derive(Debug, Clone)]
pub enum DrawCommand {
    Save,
    Restore,
    Transform {
        node: String,
        matrix: Mat3,
        opacity: f32,
    },
    Path {
        node: String,
        path: BezPath,
    },
    Fill {
        node: String,
        paint: FillPaint,
        opacity: f32,
    },
    Stroke {
        node: String,
        paint: StrokePaint,
        opacity: f32,
    },
    Trim {
        node: String,
        trim: TrimPaint,
    },
}

/// Records render calls in order, for playback into a real backend later.
#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    pub commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn strokes(&self) -> impl Iterator<Item = (&str, &StrokePaint, f32)> {
        self.commands.iter().filter_map(|cmd| match cmd {
            DrawCommand::Stroke {
                node,
                paint,
                opacity,
            } => Some((node.as_str(), paint, *opacity)),
            _ => None,
        })
    }

    pub fn fills(&self) -> impl Iterator<Item = (&str, &FillPaint, f32)> {
        self.commands.iter().filter_map(|cmd| match cmd {
            DrawCommand::Fill {
                node,
                paint,
                opacity,
            } => Some((node.as_str(), paint, *opacity)),
            _ => None,
        })
    }
}

impl ShapeRenderer for DisplayList {
    fn save_state(&mut self) {
        self.commands.push(DrawCommand::Save);
    }

    fn restore_state(&mut self) {
        self.commands.push(DrawCommand::Restore);
    }

    fn render_transform(&mut self, node: &ShapeBase, matrix: Mat3, opacity: f32) {
        self.commands.push(DrawCommand::Transform {
            node: node.name.clone(),
            matrix,
            opacity,
        });
    }

    fn render_path(&mut self, node: &ShapeBase, path: &BezPath) {
        self.commands.push(DrawCommand::Path {
            node: node.name.clone(),
            path: path.clone(),
        });
    }

    fn render_fill(&mut self, node: &ShapeBase, paint: &FillPaint, opacity: f32) {
        self.commands.push(DrawCommand::Fill {
            node: node.name.clone(),
            paint: *paint,
            opacity,
        });
    }

    fn render_stroke(&mut self, node: &ShapeBase, paint: &StrokePaint, opacity: f32) {
        self.commands.push(DrawCommand::Stroke {
            node: node.name.clone(),
            paint: *paint,
            opacity,
        });
    }

    fn render_trim(&mut self, node: &ShapeBase, trim: &TrimPaint) {
        self.commands.push(DrawCommand::Trim {
            node: node.name.clone(),
            trim: *trim,
        });
    }
}
