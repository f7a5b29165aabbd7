//! Shape layers (`"ty": 4`), the container that owns a shape tree.

use crate::error::{LottieError, Result};
use crate::renderer::ShapeRenderer;
use crate::shape::{fields, ShapeBase, ShapeElement, ShapeKind, ShapeNode, TransformNode};
use crate::version::DocumentVersion;
use serde_json::Value;

const SHAPE_LAYER: i64 = 4;

#[derive(Debug, Clone)]
pub struct ShapeLayer {
    pub name: String,
    pub hidden: bool,
    pub in_point: f32,
    pub out_point: f32,
    transform: TransformNode,
    shapes: Vec<ShapeNode>,
    current_frame: Option<f32>,
}

impl ShapeLayer {
    pub fn construct(def: &Value, version: &DocumentVersion) -> Result<Self> {
        let ty = fields::integer(def, "ty");
        if ty != Some(SHAPE_LAYER) {
            return Err(LottieError::schema_mismatch("ty", "shape layer (4)"));
        }

        let name = fields::string(def, "nm").unwrap_or_default();
        let hidden = fields::flag(def, "hd");

        let transform_base = ShapeBase {
            name: name.clone(),
            match_name: None,
            kind: ShapeKind::Transform,
            hidden,
            in_frame: None,
            out_frame: None,
        };
        let transform =
            TransformNode::from_definition(transform_base, fields::fragment(def, "ks"), version)?;

        let shapes = if hidden {
            Vec::new()
        } else {
            fields::array(def, "shapes")
                .iter()
                .map(|shape| ShapeNode::construct_or_placeholder(shape, version))
                .collect()
        };

        Ok(Self {
            name,
            hidden,
            in_point: fields::number(def, "ip").unwrap_or(0.0),
            out_point: fields::number(def, "op").unwrap_or(f32::INFINITY),
            transform,
            shapes,
            current_frame: None,
        })
    }

    /// Reads the document version and builds its first layer.
    pub fn first_in_document(doc: &Value) -> Result<Self> {
        let version = DocumentVersion::from_document(doc);
        let layer = doc
            .get("layers")
            .and_then(Value::as_array)
            .and_then(|layers| layers.first())
            .ok_or_else(|| LottieError::schema_mismatch("layers", "non-empty array"))?;
        Self::construct(layer, &version)
    }

    pub fn shapes(&self) -> &[ShapeNode] {
        &self.shapes
    }

    pub fn shapes_mut(&mut self) -> &mut [ShapeNode] {
        &mut self.shapes
    }

    pub fn transform(&self) -> &TransformNode {
        &self.transform
    }

    pub fn current_frame(&self) -> Option<f32> {
        self.current_frame
    }

    pub fn active(&self, frame: f32) -> bool {
        !self.hidden && frame >= self.in_point && frame < self.out_point
    }

    /// Depth-first search in declaration order.
    pub fn find_first(&self, kind: ShapeKind) -> Option<&ShapeNode> {
        self.shapes.iter().find_map(|s| s.find_first(kind))
    }

    pub fn update_properties(&mut self, frame: f32) -> Result<()> {
        if self.hidden {
            return Ok(());
        }
        self.current_frame = Some(frame);
        self.transform.update_properties(frame)?;
        for shape in &mut self.shapes {
            shape.update_properties(frame)?;
        }
        Ok(())
    }

    pub fn render(&self, renderer: &mut dyn ShapeRenderer) -> Result<()> {
        let Some(frame) = self.current_frame else {
            return Ok(());
        };
        if !self.active(frame) {
            return Ok(());
        }

        renderer.save_state();
        self.transform.render(renderer)?;
        for shape in &self.shapes {
            if shape.active(frame) {
                shape.render(renderer)?;
            }
        }
        renderer.restore_state();
        Ok(())
    }
}
