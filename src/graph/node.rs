// Bone graph nodes: identity, index-linked relations, pose application
// and the hierarchical scale walk.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::rc::Rc;

use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};

use crate::edit::{BoneEdit, FreezeSignals, SCALING_TOLERANCE};
use crate::error::TopologyError;
use crate::math;
use crate::provider::{PoseFrame, PoseProvider};
use crate::template::{EditTemplate, SharedBoneEdit};
use crate::transform::PoseTransform;

use super::BoneGraph;

/// Stable bone identity: skeleton part plus bone slot within that part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoneKey {
    pub part: u32,
    pub index: u32,
}

impl BoneKey {
    pub fn new(part: u32, index: u32) -> Self {
        Self { part, index }
    }
}

impl fmt::Display for BoneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.part, self.index)
    }
}

/// One node per skeleton bone. Relations are stored as keys and resolved
/// through the owning [`BoneGraph`] on every access, never as direct
/// references; the graph is a tree with extra twin cross-links, and key
/// indirection keeps it free of ownership cycles.
#[derive(Debug, Clone)]
pub struct BoneNode {
    key: BoneKey,
    name: String,
    parent: Option<BoneKey>,
    children: Vec<BoneKey>,
    twin: Option<BoneKey>,
    edit: Option<SharedBoneEdit>,
}

impl BoneNode {
    pub(crate) fn new(key: BoneKey, name: String) -> Self {
        Self {
            key,
            name,
            parent: None,
            children: Vec::new(),
            twin: None,
            edit: None,
        }
    }

    pub fn key(&self) -> BoneKey {
        self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent_key(&self) -> Option<BoneKey> {
        self.parent
    }

    pub fn child_keys(&self) -> &[BoneKey] {
        &self.children
    }

    pub fn twin_key(&self) -> Option<BoneKey> {
        self.twin
    }

    /// A second parent assignment means the topology build is corrupt.
    pub(crate) fn set_parent(&mut self, parent: BoneKey) -> Result<(), TopologyError> {
        if let Some(current) = self.parent {
            return Err(TopologyError::ParentReassigned {
                child: self.key,
                current,
                requested: parent,
            });
        }
        self.parent = Some(parent);
        Ok(())
    }

    pub(crate) fn add_child(&mut self, child: BoneKey) -> Result<(), TopologyError> {
        if self.children.contains(&child) {
            return Err(TopologyError::DuplicateChild {
                parent: self.key,
                child,
            });
        }
        self.children.push(child);
        Ok(())
    }

    pub(crate) fn set_twin(&mut self, twin: BoneKey) {
        self.twin = Some(twin);
    }

    pub fn parent<'a>(&self, graph: &'a BoneGraph) -> Option<&'a BoneNode> {
        self.parent.and_then(|key| graph.bone(key))
    }

    pub fn children<'a>(&'a self, graph: &'a BoneGraph) -> impl Iterator<Item = &'a BoneNode> {
        self.children.iter().filter_map(|key| graph.bone(*key))
    }

    pub fn twin<'a>(&self, graph: &'a BoneGraph) -> Option<&'a BoneNode> {
        self.twin.and_then(|key| graph.bone(key))
    }

    /// Attach the template's edit for this bone, or detach with `None`.
    /// Detaching always succeeds; attaching fails without a state change
    /// when the template has no entry for this bone's name. Returns
    /// whether the link state changed.
    pub fn link(&mut self, template: Option<&dyn EditTemplate>) -> bool {
        let Some(template) = template else {
            return self.edit.take().is_some();
        };
        let Some(edit) = template.edit_for(&self.name) else {
            log::debug!(
                "template '{}' has no entry for bone '{}'",
                template.display_name(),
                self.name
            );
            return false;
        };
        let changed = match &self.edit {
            Some(current) => !Rc::ptr_eq(current, &edit),
            None => true,
        };
        self.edit = Some(edit);
        changed
    }

    /// True iff an edit is linked.
    pub fn is_active(&self) -> bool {
        self.edit.is_some()
    }

    pub fn edit(&self) -> Option<&SharedBoneEdit> {
        self.edit.as_ref()
    }

    pub fn read_pose(
        &self,
        provider: &dyn PoseProvider,
        frame: PoseFrame,
    ) -> Option<PoseTransform> {
        provider.read_transform(self.key, frame)
    }

    pub fn write_pose(
        &self,
        provider: &mut dyn PoseProvider,
        frame: PoseFrame,
        transform: &PoseTransform,
    ) {
        provider.write_transform(self.key, frame, transform);
    }

    fn apply_with(
        &self,
        provider: &mut dyn PoseProvider,
        compose: impl Fn(&BoneEdit, &PoseTransform) -> PoseTransform,
    ) {
        let Some(edit) = &self.edit else {
            return;
        };
        let edit = edit.borrow();
        if !edit.is_edited() {
            return;
        }
        let Some(current) = self.read_pose(provider, PoseFrame::Model) else {
            log::trace!("bone {} has no model pose, apply skipped", self.key);
            return;
        };
        if !current.is_valid() {
            log::trace!("bone {} model pose is invalid, apply skipped", self.key);
            return;
        }
        let composed = compose(&edit, &current);
        if composed.is_valid() && composed != current {
            self.write_pose(provider, PoseFrame::Model, &composed);
        }
    }

    pub fn apply_full(&self, provider: &mut dyn PoseProvider, freeze: &FreezeSignals) {
        self.apply_with(provider, |edit, pose| edit.compose_full(pose, freeze));
    }

    pub fn apply_scale(&self, provider: &mut dyn PoseProvider, freeze: &FreezeSignals) {
        self.apply_with(provider, |edit, pose| edit.compose_scale(pose, freeze));
    }

    pub fn apply_rotation(&self, provider: &mut dyn PoseProvider, freeze: &FreezeSignals) {
        self.apply_with(provider, |edit, pose| edit.compose_rotation(pose, freeze));
    }

    pub fn apply_translation_with_rotation(
        &self,
        provider: &mut dyn PoseProvider,
        freeze: &FreezeSignals,
    ) {
        self.apply_with(provider, |edit, pose| {
            edit.compose_translation_with_rotation(pose, freeze)
        });
    }

    pub fn apply_translation_only(&self, provider: &mut dyn PoseProvider) {
        self.apply_with(provider, |edit, pose| edit.compose_translation_only(pose));
    }

    /// Walk from this node towards the root. Each call starts a fresh
    /// walk over the current parent links.
    pub fn ancestors<'a>(&self, graph: &'a BoneGraph, include_self: bool) -> Ancestors<'a> {
        Ancestors {
            graph,
            next: if include_self {
                Some(self.key)
            } else {
                self.parent
            },
        }
    }

    /// The node's descendant set in parent-before-child order, gathered
    /// breadth-first with an explicit queue; no duplicates even on
    /// malformed child lists.
    pub fn descendants<'a>(
        &'a self,
        graph: &'a BoneGraph,
        include_self: bool,
    ) -> Vec<&'a BoneNode> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        seen.insert(self.key);
        queue.push_back(self.key);
        while let Some(key) = queue.pop_front() {
            let Some(node) = graph.bone(key) else {
                continue;
            };
            if include_self || key != self.key {
                out.push(node);
            }
            for &child in node.child_keys() {
                if seen.insert(child) {
                    queue.push_back(child);
                }
            }
        }
        out
    }

    /// Scale this node's whole sub-hierarchy by the linked edit's
    /// hierarchical scaling, keeping parent-relative offsets, local
    /// poses and twin subtrees consistent.
    ///
    /// The scale root keeps its position and only changes scale; every
    /// descendant is re-seated at its parent's already-updated position
    /// plus its original offset rescaled componentwise. Twins receive the
    /// identical, unmirrored scaling right after their mirror source so
    /// the mirror hierarchy updates in the same parent-before-child
    /// order. Nodes without a valid pose are skipped, the walk never
    /// aborts mid-way.
    pub fn apply_hierarchical_scale(&self, graph: &BoneGraph, provider: &mut dyn PoseProvider) {
        let Some(edit) = &self.edit else {
            return;
        };
        let scale = edit.borrow().hierarchical_scaling();
        if !math::deviates(&scale, 1.0, SCALING_TOLERANCE) {
            return;
        }

        let subtree = self.descendants(graph, true);
        let mut order: Vec<&BoneNode> = Vec::with_capacity(subtree.len() * 2);
        for &node in &subtree {
            order.push(node);
            if let Some(twin) = node.twin(graph) {
                order.push(twin);
            }
        }

        // Positions before any mutation; all offsets are taken against
        // these, not against partially updated state.
        let mut snapshot: HashMap<BoneKey, glm::Vec3> = HashMap::new();
        for node in &order {
            if let Some(pose) = node.read_pose(provider, PoseFrame::Model) {
                if pose.is_valid() {
                    snapshot.insert(node.key, pose.translation);
                }
            }
        }

        let mut updated: HashMap<BoneKey, glm::Vec3> = HashMap::new();
        let mut visited: HashSet<BoneKey> = HashSet::new();
        let mut touched_parts: HashSet<u32> = HashSet::new();

        for node in &order {
            if !visited.insert(node.key) {
                continue;
            }
            let Some(mut pose) = node.read_pose(provider, PoseFrame::Model) else {
                log::trace!("bone {} pose unavailable, hierarchical scale skips it", node.key);
                continue;
            };
            if !pose.is_valid() {
                continue;
            }

            pose.scale = math::scale_components(&pose.scale, &scale);

            if node.key != self.key {
                if let Some(new_translation) = node.parent.and_then(|parent| {
                    let parent_new = updated.get(&parent)?;
                    let parent_old = snapshot.get(&parent)?;
                    let old = snapshot.get(&node.key)?;
                    let offset = math::scale_components(&(old - parent_old), &scale);
                    Some(parent_new + offset)
                }) {
                    pose.translation = new_translation;
                }
            }

            node.write_pose(provider, PoseFrame::Model, &pose);
            updated.insert(node.key, pose.translation);
            touched_parts.insert(node.key.part);

            // Keep the local pose consistent with the model pose just
            // written; the offset is taken between the two updated
            // model-space positions on purpose.
            if let Some(parent_new) = node.parent.and_then(|parent| updated.get(&parent)) {
                if let Some(mut local) = node.read_pose(provider, PoseFrame::Local) {
                    if local.is_valid() {
                        local.translation = pose.translation - parent_new;
                        node.write_pose(provider, PoseFrame::Local, &local);
                    }
                }
            }
        }

        for part in touched_parts {
            provider.mark_out_of_sync(part);
        }
    }
}

/// Iterator over a node's chain of parents; see [`BoneNode::ancestors`].
pub struct Ancestors<'a> {
    graph: &'a BoneGraph,
    next: Option<BoneKey>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a BoneNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.graph.bone(self.next.take()?)?;
        self.next = node.parent_key();
        Some(node)
    }
}
