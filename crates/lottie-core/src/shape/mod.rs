//! Shape tree nodes.
//!
//! A shape definition becomes one [`ShapeNode`] variant. Parsers are looked up
//! by the definition's `"ty"` tag in the [`ShapeRegistry`]; tags without a
//! parser become inert placeholders so the rest of the tree still renders.

pub(crate) mod fields;
mod fill;
mod geometry;
mod group;
mod stroke;
mod transform;
mod trim;

pub use fill::FillNode;
pub use geometry::{bezier_to_path, EllipseNode, PathNode, RectNode};
pub use group::GroupNode;
pub use stroke::StrokeNode;
pub use transform::{Position, TransformNode};
pub use trim::TrimNode;

use crate::animatable::{Animatable, AnimatedProperty};
use crate::error::Result;
use crate::expression::resolve_expression;
use crate::renderer::ShapeRenderer;
use crate::version::DocumentVersion;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, OnceLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Group,
    Fill,
    Stroke,
    Path,
    Rect,
    Ellipse,
    Trim,
    Transform,
    Unsupported,
}

impl ShapeKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "gr" => ShapeKind::Group,
            "fl" => ShapeKind::Fill,
            "st" => ShapeKind::Stroke,
            "sh" => ShapeKind::Path,
            "rc" => ShapeKind::Rect,
            "el" => ShapeKind::Ellipse,
            "tm" => ShapeKind::Trim,
            "tr" => ShapeKind::Transform,
            _ => ShapeKind::Unsupported,
        }
    }

    pub fn tag(&self) -> Option<&'static str> {
        Some(match self {
            ShapeKind::Group => "gr",
            ShapeKind::Fill => "fl",
            ShapeKind::Stroke => "st",
            ShapeKind::Path => "sh",
            ShapeKind::Rect => "rc",
            ShapeKind::Ellipse => "el",
            ShapeKind::Trim => "tm",
            ShapeKind::Transform => "tr",
            ShapeKind::Unsupported => return None,
        })
    }
}

/// Reads `key` as an animated property, reducing any expression first.
pub(crate) fn property<T: Animatable>(
    def: &Value,
    key: &str,
    version: &DocumentVersion,
) -> Result<AnimatedProperty<T>> {
    AnimatedProperty::construct(&resolve_expression(fields::fragment(def, key)), version)
}

/// Like [`property`], but an absent field keeps `default` instead of the
/// type's zero value.
pub(crate) fn property_or<T: Animatable>(
    def: &Value,
    key: &str,
    version: &DocumentVersion,
    default: T,
) -> Result<AnimatedProperty<T>> {
    match def.get(key) {
        None | Some(Value::Null) => Ok(AnimatedProperty::from_static(default)),
        Some(_) => property(def, key, version),
    }
}

/// Fields every shape definition shares.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeBase {
    pub name: String,
    pub match_name: Option<String>,
    pub kind: ShapeKind,
    pub hidden: bool,
    pub in_frame: Option<f32>,
    pub out_frame: Option<f32>,
}

impl ShapeBase {
    pub fn parse(def: &Value) -> Self {
        let kind = fields::string(def, "ty")
            .map(|tag| ShapeKind::from_tag(&tag))
            .unwrap_or(ShapeKind::Unsupported);

        Self {
            name: fields::string(def, "nm").unwrap_or_default(),
            match_name: fields::string(def, "mn"),
            kind,
            hidden: fields::flag(def, "hd"),
            in_frame: fields::number(def, "ip"),
            out_frame: fields::number(def, "op"),
        }
    }

    /// Inert stand-in for a definition that could not be built.
    pub fn placeholder(def: &Value) -> Self {
        Self {
            hidden: true,
            ..Self::parse(def)
        }
    }

    /// Hidden nodes are never active; otherwise the node is active inside its
    /// `[in_frame, out_frame)` window when one is given.
    pub fn active(&self, frame: f32) -> bool {
        if self.hidden {
            return false;
        }
        if self.in_frame.is_some_and(|ip| frame < ip) {
            return false;
        }
        if self.out_frame.is_some_and(|op| frame >= op) {
            return false;
        }
        true
    }
}

/// Per-frame capabilities shared by all node kinds.
pub trait ShapeElement {
    fn base(&self) -> &ShapeBase;

    /// Brings every owned property (and child) to `frame`.
    fn update_properties(&mut self, frame: f32) -> Result<()>;

    /// Pushes the cached state into `renderer`. Never advances properties.
    fn render(&self, renderer: &mut dyn ShapeRenderer) -> Result<()>;

    fn active(&self, frame: f32) -> bool {
        self.base().active(frame)
    }
}

impl ShapeElement for ShapeBase {
    fn base(&self) -> &ShapeBase {
        self
    }

    fn update_properties(&mut self, _frame: f32) -> Result<()> {
        Ok(())
    }

    fn render(&self, _renderer: &mut dyn ShapeRenderer) -> Result<()> {
        Ok(())
    }

    fn active(&self, _frame: f32) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
pub enum ShapeNode {
    Group(GroupNode),
    Fill(FillNode),
    Stroke(StrokeNode),
    Path(PathNode),
    Rect(RectNode),
    Ellipse(EllipseNode),
    Trim(TrimNode),
    Transform(TransformNode),
    Placeholder(ShapeBase),
}

impl ShapeNode {
    /// Builds the node for `def` through the registry. Unknown tags become
    /// placeholders; errors from a known parser are returned.
    pub fn construct(def: &Value, version: &DocumentVersion) -> Result<Self> {
        let base = ShapeBase::parse(def);
        match ShapeRegistry::global().parser(base.kind) {
            Some(parser) => parser(def, version),
            None => {
                let tag = fields::string(def, "ty");
                log_unsupported_shape_once(tag.as_deref().unwrap_or("?"), &base);
                Ok(ShapeNode::Placeholder(ShapeBase {
                    hidden: true,
                    ..base
                }))
            }
        }
    }

    /// Like [`Self::construct`], but a definition that fails to build is
    /// replaced by a hidden placeholder so its siblings still load.
    pub fn construct_or_placeholder(def: &Value, version: &DocumentVersion) -> Self {
        match Self::construct(def, version) {
            Ok(node) => node,
            Err(e) => {
                let base = ShapeBase::placeholder(def);
                tracing::warn!(
                    name = %base.name,
                    match_name = base.match_name.as_deref().unwrap_or(""),
                    kind = ?base.kind,
                    "shape skipped: {e}"
                );
                ShapeNode::Placeholder(base)
            }
        }
    }

    pub fn element(&self) -> &dyn ShapeElement {
        match self {
            ShapeNode::Group(n) => n,
            ShapeNode::Fill(n) => n,
            ShapeNode::Stroke(n) => n,
            ShapeNode::Path(n) => n,
            ShapeNode::Rect(n) => n,
            ShapeNode::Ellipse(n) => n,
            ShapeNode::Trim(n) => n,
            ShapeNode::Transform(n) => n,
            ShapeNode::Placeholder(n) => n,
        }
    }

    pub fn element_mut(&mut self) -> &mut dyn ShapeElement {
        match self {
            ShapeNode::Group(n) => n,
            ShapeNode::Fill(n) => n,
            ShapeNode::Stroke(n) => n,
            ShapeNode::Path(n) => n,
            ShapeNode::Rect(n) => n,
            ShapeNode::Ellipse(n) => n,
            ShapeNode::Trim(n) => n,
            ShapeNode::Transform(n) => n,
            ShapeNode::Placeholder(n) => n,
        }
    }

    pub fn base(&self) -> &ShapeBase {
        self.element().base()
    }

    pub fn name(&self) -> &str {
        &self.base().name
    }

    pub fn kind(&self) -> ShapeKind {
        self.base().kind
    }

    pub fn hidden(&self) -> bool {
        self.base().hidden
    }

    pub fn active(&self, frame: f32) -> bool {
        self.element().active(frame)
    }

    pub fn update_properties(&mut self, frame: f32) -> Result<()> {
        self.element_mut().update_properties(frame)
    }

    pub fn render(&self, renderer: &mut dyn ShapeRenderer) -> Result<()> {
        self.element().render(renderer)
    }

    pub fn as_group(&self) -> Option<&GroupNode> {
        match self {
            ShapeNode::Group(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_fill(&self) -> Option<&FillNode> {
        match self {
            ShapeNode::Fill(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_stroke(&self) -> Option<&StrokeNode> {
        match self {
            ShapeNode::Stroke(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_stroke_mut(&mut self) -> Option<&mut StrokeNode> {
        match self {
            ShapeNode::Stroke(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_transform(&self) -> Option<&TransformNode> {
        match self {
            ShapeNode::Transform(n) => Some(n),
            _ => None,
        }
    }

    /// Depth-first search through this node and its group descendants.
    pub fn find_first(&self, kind: ShapeKind) -> Option<&ShapeNode> {
        if self.kind() == kind {
            return Some(self);
        }
        match self {
            ShapeNode::Group(g) => g.children().iter().find_map(|c| c.find_first(kind)),
            _ => None,
        }
    }
}

pub type ShapeParser = fn(&Value, &DocumentVersion) -> Result<ShapeNode>;

static REGISTRY: OnceLock<ShapeRegistry> = OnceLock::new();

/// Parsers for every supported shape kind.
pub struct ShapeRegistry {
    parsers: HashMap<ShapeKind, ShapeParser>,
}

impl ShapeRegistry {
    pub fn global() -> &'static Self {
        REGISTRY.get_or_init(Self::build)
    }

    fn build() -> Self {
        let mut reg = Self {
            parsers: HashMap::new(),
        };

        reg.register(ShapeKind::Group, |d, v| GroupNode::parse(d, v).map(ShapeNode::Group));
        reg.register(ShapeKind::Fill, |d, v| FillNode::parse(d, v).map(ShapeNode::Fill));
        reg.register(ShapeKind::Stroke, |d, v| StrokeNode::parse(d, v).map(ShapeNode::Stroke));
        reg.register(ShapeKind::Path, |d, v| PathNode::parse(d, v).map(ShapeNode::Path));
        reg.register(ShapeKind::Rect, |d, v| RectNode::parse(d, v).map(ShapeNode::Rect));
        reg.register(ShapeKind::Ellipse, |d, v| EllipseNode::parse(d, v).map(ShapeNode::Ellipse));
        reg.register(ShapeKind::Trim, |d, v| TrimNode::parse(d, v).map(ShapeNode::Trim));
        reg.register(ShapeKind::Transform, |d, v| {
            TransformNode::parse(d, v).map(ShapeNode::Transform)
        });

        reg
    }

    fn register(&mut self, kind: ShapeKind, parser: ShapeParser) {
        self.parsers.insert(kind, parser);
    }

    pub fn parser(&self, kind: ShapeKind) -> Option<ShapeParser> {
        self.parsers.get(&kind).copied()
    }

    pub fn supports(&self, tag: &str) -> bool {
        self.parsers.contains_key(&ShapeKind::from_tag(tag))
    }
}

fn log_unsupported_shape_once(tag: &str, base: &ShapeBase) {
    static UNSUPPORTED_SHAPES: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();
    let store = UNSUPPORTED_SHAPES.get_or_init(|| Mutex::new(HashSet::new()));
    if let Ok(mut seen) = store.lock() {
        if seen.insert(tag.to_string()) {
            tracing::info!(
                name = %base.name,
                match_name = base.match_name.as_deref().unwrap_or(""),
                "shape type {tag:?} is parsed as a no-op"
            );
        }
    }
}
