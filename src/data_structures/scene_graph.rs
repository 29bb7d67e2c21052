//! Scene graph and hierarchical scene organization.
//!
//! A scene is a tree of boxed [`SceneNode`]s. [`ContainerNode`]s only group
//! and transform their children, [`ModelNode`]s additionally carry a single
//! [`Drawable`]. [`SceneGraph`] owns the root and remembers whether the
//! canonical presentation has already been applied to it.

use std::fmt::Debug;

use crate::data_structures::{instance::Instance, model::Drawable};

pub trait SceneNode: Send + Sync {
    fn name(&self) -> &str;

    fn get_local_transform(&self) -> Instance;

    fn set_local_transform(&mut self, instance: Instance);

    fn set_local_transform_with(&mut self, mutation: &mut dyn FnMut(&mut Instance));

    fn get_world_transform(&self) -> Instance;

    /**
     * Recomputes this node's world transform from `parents_world_transform` and
     * pushes the result down to every child.
     */
    fn update_world_transforms(&mut self, parents_world_transform: &Instance);

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>>;

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>>;

    fn add_child(&mut self, child: Box<dyn SceneNode>);

    fn drawable(&self) -> Option<&Drawable>;

    fn drawable_mut(&mut self) -> Option<&mut Drawable>;

    /// Deep copy of this node and its whole subtree.
    fn clone_node(&self) -> Box<dyn SceneNode>;
}

impl Debug for dyn SceneNode + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneNode")
            .field("name", &self.name())
            .field("drawable", &self.drawable().is_some())
            .field("children", self.get_children())
            .finish()
    }
}

/// Visits `node` and all of its descendants, parents before children.
pub fn traverse<'a>(node: &'a dyn SceneNode, visit: &mut dyn FnMut(&'a dyn SceneNode)) {
    visit(node);
    for child in node.get_children() {
        traverse(child.as_ref(), visit);
    }
}

/// Mutable counterpart of [`traverse`], same visiting order.
pub fn traverse_mut(node: &mut dyn SceneNode, visit: &mut dyn FnMut(&mut dyn SceneNode)) {
    visit(&mut *node);
    for child in node.get_children_mut() {
        traverse_mut(child.as_mut(), visit);
    }
}

fn clone_children(children: &[Box<dyn SceneNode>]) -> Vec<Box<dyn SceneNode>> {
    children.iter().map(|child| child.clone_node()).collect()
}

pub struct ContainerNode {
    name: String,
    pub children: Vec<Box<dyn SceneNode>>,
    local: Instance,
    world: Instance,
}

impl ContainerNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            local: Instance::default(),
            world: Instance::default(),
        }
    }
}

impl SceneNode for ContainerNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_local_transform(&self) -> Instance {
        self.local
    }

    fn set_local_transform(&mut self, instance: Instance) {
        self.local = instance;
    }

    fn set_local_transform_with(&mut self, mutation: &mut dyn FnMut(&mut Instance)) {
        mutation(&mut self.local);
    }

    fn get_world_transform(&self) -> Instance {
        self.world
    }

    fn update_world_transforms(&mut self, parents_world_transform: &Instance) {
        self.world = parents_world_transform * &self.local;
        let world = self.world;
        for child in self.children.iter_mut() {
            child.update_world_transforms(&world);
        }
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn drawable(&self) -> Option<&Drawable> {
        None
    }

    fn drawable_mut(&mut self) -> Option<&mut Drawable> {
        None
    }

    fn clone_node(&self) -> Box<dyn SceneNode> {
        Box::new(Self {
            name: self.name.clone(),
            children: clone_children(&self.children),
            local: self.local,
            world: self.world,
        })
    }
}

pub struct ModelNode {
    name: String,
    children: Vec<Box<dyn SceneNode>>,
    local: Instance,
    world: Instance,
    drawable: Drawable,
}

impl ModelNode {
    pub fn new(name: impl Into<String>, drawable: Drawable) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            local: Instance::default(),
            world: Instance::default(),
            drawable,
        }
    }
}

impl SceneNode for ModelNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_local_transform(&self) -> Instance {
        self.local
    }

    fn set_local_transform(&mut self, instance: Instance) {
        self.local = instance;
    }

    fn set_local_transform_with(&mut self, mutation: &mut dyn FnMut(&mut Instance)) {
        mutation(&mut self.local);
    }

    fn get_world_transform(&self) -> Instance {
        self.world
    }

    fn update_world_transforms(&mut self, parents_world_transform: &Instance) {
        self.world = parents_world_transform * &self.local;
        let world = self.world;
        for child in self.children.iter_mut() {
            child.update_world_transforms(&world);
        }
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn drawable(&self) -> Option<&Drawable> {
        Some(&self.drawable)
    }

    fn drawable_mut(&mut self) -> Option<&mut Drawable> {
        Some(&mut self.drawable)
    }

    fn clone_node(&self) -> Box<dyn SceneNode> {
        Box::new(Self {
            name: self.name.clone(),
            children: clone_children(&self.children),
            local: self.local,
            world: self.world,
            drawable: self.drawable.clone(),
        })
    }
}

/// The root of a loaded asset.
///
/// `normalized` is set once the canonical material and orientation have been
/// applied, so the correction can never be applied twice.
pub struct SceneGraph {
    root: Box<dyn SceneNode>,
    normalized: bool,
}

impl SceneGraph {
    pub fn new(root: Box<dyn SceneNode>) -> Self {
        Self {
            root,
            normalized: false,
        }
    }

    pub fn root(&self) -> &dyn SceneNode {
        self.root.as_ref()
    }

    pub fn root_mut(&mut self) -> &mut dyn SceneNode {
        self.root.as_mut()
    }

    /// Hands the root over to a render surface.
    pub fn into_root(self) -> Box<dyn SceneNode> {
        self.root
    }

    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    pub(crate) fn mark_normalized(&mut self) {
        self.normalized = true;
    }

    pub fn update_world_transforms(&mut self) {
        self.root.update_world_transforms(&Instance::default());
    }

    /// All nodes carrying a drawable, parents before children.
    pub fn drawable_nodes(&self) -> Vec<&dyn SceneNode> {
        let mut nodes = Vec::new();
        traverse(self.root(), &mut |node| {
            if node.drawable().is_some() {
                nodes.push(node);
            }
        });
        nodes
    }

    pub fn node_count(&self) -> usize {
        let mut count = 0;
        traverse(self.root(), &mut |_| count += 1);
        count
    }
}

impl Clone for SceneGraph {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone_node(),
            normalized: self.normalized,
        }
    }
}

impl Debug for SceneGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneGraph")
            .field("normalized", &self.normalized)
            .field("root", &self.root)
            .finish()
    }
}
