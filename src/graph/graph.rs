// Bone graph: node ownership, key and name indexes, topology build and
// the full-skeleton update passes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::edit::FreezeSignals;
use crate::error::TopologyError;
use crate::provider::PoseProvider;
use crate::template::EditTemplate;

use super::node::{BoneKey, BoneNode};

/// One bone entry of a caller-supplied skeleton topology.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoneTopologyEntry {
    pub key: BoneKey,
    pub name: String,
    pub parent: Option<BoneKey>,
}

/// Skeleton topology as handed over by the host. The core never
/// discovers bone structure on its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoneTopology {
    pub entries: Vec<BoneTopologyEntry>,
}

impl BoneTopology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: BoneKey, name: impl Into<String>, parent: Option<BoneKey>) {
        self.entries.push(BoneTopologyEntry {
            key,
            name: name.into(),
            parent,
        });
    }
}

/// How a full-skeleton update pass composes each active edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    Full,
    ScaleOnly,
    RotationOnly,
    TranslationWithRotation,
    /// Straight translation, no orientation-relative offset.
    TranslationOnly,
}

/// Owns every [`BoneNode`] of one skeleton instance. Primary index is
/// the (part, index) key; the name index is a convenience and may be
/// ambiguous when several bones share a name.
#[derive(Debug, Default)]
pub struct BoneGraph {
    nodes: Vec<BoneNode>,
    by_key: HashMap<BoneKey, usize>,
    by_name: HashMap<String, Vec<usize>>,
}

impl BoneGraph {
    /// Build the graph for one skeleton. `twin_rule` maps a bone name to
    /// the name of its mirror counterpart, or `None` for unpaired bones;
    /// which naming convention encodes twins is the host's topology
    /// knowledge, not the graph's. Any wiring inconsistency aborts the
    /// build.
    pub fn build<F>(topology: &BoneTopology, twin_rule: F) -> Result<Self, TopologyError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut graph = BoneGraph {
            nodes: Vec::with_capacity(topology.entries.len()),
            by_key: HashMap::with_capacity(topology.entries.len()),
            by_name: HashMap::new(),
        };

        for entry in &topology.entries {
            if graph.by_key.contains_key(&entry.key) {
                return Err(TopologyError::DuplicateBone { key: entry.key });
            }
            let index = graph.nodes.len();
            graph.nodes.push(BoneNode::new(entry.key, entry.name.clone()));
            graph.by_key.insert(entry.key, index);
            graph
                .by_name
                .entry(entry.name.clone())
                .or_default()
                .push(index);
        }

        for entry in &topology.entries {
            let Some(parent_key) = entry.parent else {
                continue;
            };
            if parent_key == entry.key {
                return Err(TopologyError::SelfParent { key: entry.key });
            }
            if !graph.by_key.contains_key(&parent_key) {
                return Err(TopologyError::UnknownParent {
                    child: entry.key,
                    parent: parent_key,
                });
            }
            let child_index = graph.by_key[&entry.key];
            graph.nodes[child_index].set_parent(parent_key)?;
            let parent_index = graph.by_key[&parent_key];
            graph.nodes[parent_index].add_child(entry.key)?;
        }

        graph.check_acyclic()?;

        let mut twin_pairs = 0usize;
        for index in 0..graph.nodes.len() {
            if graph.nodes[index].twin_key().is_some() {
                continue;
            }
            let Some(mirror_name) = twin_rule(graph.nodes[index].name()) else {
                continue;
            };
            let Some(&mirror) = graph.by_name.get(&mirror_name).and_then(|hits| hits.first())
            else {
                continue;
            };
            if mirror == index {
                continue;
            }
            let (a, b) = (graph.nodes[index].key(), graph.nodes[mirror].key());
            graph.nodes[index].set_twin(b);
            graph.nodes[mirror].set_twin(a);
            twin_pairs += 1;
        }

        log::debug!(
            "bone graph built: {} bones, {} twin pairs",
            graph.nodes.len(),
            twin_pairs
        );
        Ok(graph)
    }

    fn check_acyclic(&self) -> Result<(), TopologyError> {
        for node in &self.nodes {
            let mut steps = 0usize;
            let mut cursor = node.parent_key();
            while let Some(key) = cursor {
                steps += 1;
                if steps > self.nodes.len() {
                    return Err(TopologyError::ParentCycle { key: node.key() });
                }
                cursor = self.bone(key).and_then(BoneNode::parent_key);
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn bone(&self, key: BoneKey) -> Option<&BoneNode> {
        self.by_key.get(&key).map(|&index| &self.nodes[index])
    }

    pub fn bone_mut(&mut self, key: BoneKey) -> Option<&mut BoneNode> {
        let index = self.by_key.get(&key).copied()?;
        Some(&mut self.nodes[index])
    }

    /// Any one of possibly several bones sharing `name`; callers needing
    /// a specific bone disambiguate through the key index.
    pub fn bone_by_name(&self, name: &str) -> Option<&BoneNode> {
        self.by_name
            .get(name)
            .and_then(|hits| hits.first())
            .map(|&index| &self.nodes[index])
    }

    pub fn bone_by_name_mut(&mut self, name: &str) -> Option<&mut BoneNode> {
        let index = self.by_name.get(name).and_then(|hits| hits.first()).copied()?;
        Some(&mut self.nodes[index])
    }

    pub fn bones(&self) -> impl Iterator<Item = &BoneNode> {
        self.nodes.iter()
    }

    /// Bones that currently carry a linked edit.
    pub fn active_bones(&self) -> impl Iterator<Item = &BoneNode> {
        self.nodes.iter().filter(|node| node.is_active())
    }

    /// Try to link every bone against the template; returns how many
    /// link states changed. Bones missing from the template are left
    /// untouched.
    pub fn link_template(&mut self, template: &dyn EditTemplate) -> usize {
        self.nodes
            .iter_mut()
            .map(|node| node.link(Some(template)))
            .filter(|&changed| changed)
            .count()
    }

    /// Detach every linked edit; returns how many bones deactivated.
    pub fn unlink_all(&mut self) -> usize {
        self.nodes
            .iter_mut()
            .map(|node| node.link(None))
            .filter(|&changed| changed)
            .count()
    }

    /// Per-update pass over active bones with the configured mode.
    /// Hierarchical scaling is not part of this pass; see
    /// [`BoneGraph::apply_hierarchical`].
    pub fn apply(&self, provider: &mut dyn PoseProvider, freeze: &FreezeSignals, mode: ApplyMode) {
        for node in self.active_bones() {
            match mode {
                ApplyMode::Full => node.apply_full(provider, freeze),
                ApplyMode::ScaleOnly => node.apply_scale(provider, freeze),
                ApplyMode::RotationOnly => node.apply_rotation(provider, freeze),
                ApplyMode::TranslationWithRotation => {
                    node.apply_translation_with_rotation(provider, freeze)
                }
                ApplyMode::TranslationOnly => node.apply_translation_only(provider),
            }
        }
    }

    /// Separate pass for hierarchical scaling: each invocation touches a
    /// whole subtree plus its twins, so it runs independently of the
    /// plain per-node pass.
    pub fn apply_hierarchical(&self, provider: &mut dyn PoseProvider) {
        for node in self.active_bones() {
            let wants = node
                .edit()
                .is_some_and(|edit| edit.borrow().has_hierarchical_scaling());
            if wants {
                node.apply_hierarchical_scale(self, provider);
            }
        }
    }

    /// One full host tick: the plain pass, then the hierarchical pass.
    pub fn update(&self, provider: &mut dyn PoseProvider, freeze: &FreezeSignals, mode: ApplyMode) {
        self.apply(provider, freeze, mode);
        self.apply_hierarchical(provider);
    }
}
