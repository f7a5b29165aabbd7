use super::{fields, ShapeBase, ShapeElement, ShapeKind, ShapeNode};
use crate::error::Result;
use crate::renderer::ShapeRenderer;
use crate::version::DocumentVersion;
use serde_json::Value;

/// Shape group (`"ty": "gr"`). Owns its children in declaration order.
#[derive(Debug, Clone)]
pub struct GroupNode {
    base: ShapeBase,
    children: Vec<ShapeNode>,
    current_frame: Option<f32>,
}

impl GroupNode {
    pub fn parse(def: &Value, version: &DocumentVersion) -> Result<Self> {
        let base = ShapeBase::parse(def);
        let children = if base.hidden {
            Vec::new()
        } else {
            fields::array(def, "it")
                .iter()
                .map(|child| ShapeNode::construct_or_placeholder(child, version))
                .collect()
        };

        Ok(Self {
            base,
            children,
            current_frame: None,
        })
    }

    pub fn children(&self) -> &[ShapeNode] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [ShapeNode] {
        &mut self.children
    }

    pub fn transform(&self) -> Option<&ShapeNode> {
        self.children
            .iter()
            .find(|c| c.kind() == ShapeKind::Transform)
    }
}

impl ShapeElement for GroupNode {
    fn base(&self) -> &ShapeBase {
        &self.base
    }

    fn update_properties(&mut self, frame: f32) -> Result<()> {
        if self.base.hidden {
            return Ok(());
        }
        self.current_frame = Some(frame);
        for child in &mut self.children {
            child.update_properties(frame)?;
        }
        Ok(())
    }

    fn render(&self, renderer: &mut dyn ShapeRenderer) -> Result<()> {
        if self.base.hidden {
            return Ok(());
        }
        let Some(frame) = self.current_frame else {
            return Ok(());
        };

        renderer.save_state();
        let transform = self.transform();
        if let Some(tr) = transform {
            tr.render(renderer)?;
        }
        for child in &self.children {
            if child.kind() == ShapeKind::Transform || !child.active(frame) {
                continue;
            }
            child.render(renderer)?;
        }
        renderer.restore_state();
        Ok(())
    }
}
