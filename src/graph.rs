use crate::{
    core::Point,
    error::{StagecraftError, StagecraftResult},
};

/// Handle into a [`SceneGraph`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeKind {
    /// Pure grouping node.
    Container,
    /// Textured quad with intrinsic pixel dimensions (resolved by the
    /// external asset loader before mount).
    Sprite {
        natural_width: f64,
        natural_height: f64,
    },
    /// Repeating texture band. `width`/`height` are the on-plane extent,
    /// independent of the texture's intrinsic size.
    TilingBand { width: f64, height: f64 },
}

/// One retained display node. The external retained-mode renderer walks the
/// arena back-to-front (child order is paint order) and draws; this crate
/// only mutates the fields.
#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub x: f64,
    pub y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub pivot_x: f64,
    pub pivot_y: f64,
    pub opacity: f64,
    pub visible: bool,
    /// Whether the node intercepts pointer events. Only overlays toggle this.
    pub interactive: bool,
}

impl Node {
    fn new(kind: NodeKind, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
            x: 0.0,
            y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            pivot_x: 0.0,
            pivot_y: 0.0,
            opacity: 1.0,
            visible: true,
            interactive: false,
        }
    }
}

/// Arena of display nodes rooted at a single stage container.
#[derive(Clone, Debug)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    root: NodeId,
}

impl SceneGraph {
    pub fn new() -> Self {
        let root = Node::new(NodeKind::Container, None);
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn add_container(&mut self, parent: NodeId) -> NodeId {
        self.push(Node::new(NodeKind::Container, Some(parent)))
    }

    pub fn add_sprite(
        &mut self,
        parent: NodeId,
        natural_width: f64,
        natural_height: f64,
    ) -> StagecraftResult<NodeId> {
        if !(natural_width > 0.0 && natural_height > 0.0) {
            return Err(StagecraftError::validation(
                "sprite natural dimensions must be > 0",
            ));
        }
        Ok(self.push(Node::new(
            NodeKind::Sprite {
                natural_width,
                natural_height,
            },
            Some(parent),
        )))
    }

    pub fn add_tiling_band(
        &mut self,
        parent: NodeId,
        width: f64,
        height: f64,
    ) -> StagecraftResult<NodeId> {
        if !(width > 0.0 && height > 0.0) {
            return Err(StagecraftError::validation(
                "tiling band extent must be > 0",
            ));
        }
        Ok(self.push(Node::new(NodeKind::TilingBand { width, height }, Some(parent))))
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        if let Some(parent) = node.parent {
            self.nodes[parent.0].children.push(id);
        }
        self.nodes.push(node);
        id
    }

    pub fn set_position(&mut self, id: NodeId, x: f64, y: f64) {
        let node = self.node_mut(id);
        node.x = x;
        node.y = y;
    }

    pub fn set_uniform_scale(&mut self, id: NodeId, scale: f64) {
        let node = self.node_mut(id);
        node.scale_x = scale;
        node.scale_y = scale;
    }

    pub fn set_opacity(&mut self, id: NodeId, opacity: f64) {
        self.node_mut(id).opacity = opacity.clamp(0.0, 1.0);
    }

    /// Place a sprite by its design-space center, sized to the target width
    /// with height following uniformly. Never stretches.
    pub fn place_centered_by_width(
        &mut self,
        id: NodeId,
        center: Point,
        target_width: f64,
    ) -> StagecraftResult<()> {
        let (nw, nh) = self.sprite_natural(id)?;
        let scale = target_width / nw;
        self.anchor_center(id, nw, nh);
        let node = self.node_mut(id);
        node.x = center.x;
        node.y = center.y;
        node.scale_x = scale;
        node.scale_y = scale;
        Ok(())
    }

    /// Place a sprite by its design-space center, sized to the target height
    /// with width following uniformly. Never stretches.
    pub fn place_centered_by_height(
        &mut self,
        id: NodeId,
        center: Point,
        target_height: f64,
    ) -> StagecraftResult<()> {
        let (nw, nh) = self.sprite_natural(id)?;
        let scale = target_height / nh;
        self.anchor_center(id, nw, nh);
        let node = self.node_mut(id);
        node.x = center.x;
        node.y = center.y;
        node.scale_x = scale;
        node.scale_y = scale;
        Ok(())
    }

    /// Place a tiling band so its extent is centered on `center`.
    pub fn place_band_centered(&mut self, id: NodeId, center: Point) -> StagecraftResult<()> {
        let NodeKind::TilingBand { width, height } = self.node(id).kind else {
            return Err(StagecraftError::validation(
                "place_band_centered target must be a tiling band",
            ));
        };
        self.set_position(id, center.x - width / 2.0, center.y - height / 2.0);
        Ok(())
    }

    fn sprite_natural(&self, id: NodeId) -> StagecraftResult<(f64, f64)> {
        match self.node(id).kind {
            NodeKind::Sprite {
                natural_width,
                natural_height,
            } => Ok((natural_width, natural_height)),
            _ => Err(StagecraftError::validation(
                "centered placement target must be a sprite",
            )),
        }
    }

    fn anchor_center(&mut self, id: NodeId, nw: f64, nh: f64) {
        let node = self.node_mut(id);
        node.pivot_x = nw / 2.0;
        node.pivot_y = nh / 2.0;
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}
