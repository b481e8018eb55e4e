// Boundary to the host's skeleton and pose storage.

use std::collections::{HashMap, HashSet};

use crate::graph::BoneKey;
use crate::transform::PoseTransform;

/// Reference frame a pose transform is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoseFrame {
    /// Relative to the bone's immediate parent.
    Local,
    /// Relative to the character root, all ancestors composed.
    Model,
}

/// The host's pose storage. The core never owns pose data; it reads the
/// current transform, composes an edit onto it and writes the result back
/// through this trait, once per update tick.
pub trait PoseProvider {
    /// Current transform for a bone, or `None` when the host has no valid
    /// data for it (pose not computed yet, bone culled, ...).
    fn read_transform(&self, key: BoneKey, frame: PoseFrame) -> Option<PoseTransform>;

    /// Store a transform. Rejected without effect while the part's pose
    /// cache is flagged out of sync.
    fn write_transform(&mut self, key: BoneKey, frame: PoseFrame, transform: &PoseTransform);

    /// Flag a skeleton part so downstream consumers recompute their pose
    /// cache before the next read.
    fn mark_out_of_sync(&mut self, part: u32);
}

/// In-memory provider backing the test suites; also serves as the
/// reference for what a host-side adapter has to honor.
#[derive(Debug, Default)]
pub struct MemoryPoseProvider {
    transforms: HashMap<(BoneKey, PoseFrame), PoseTransform>,
    out_of_sync: HashSet<u32>,
    writes: usize,
}

impl MemoryPoseProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a transform directly, bypassing the out-of-sync gate.
    pub fn seed(&mut self, key: BoneKey, frame: PoseFrame, transform: PoseTransform) {
        self.transforms.insert((key, frame), transform);
    }

    pub fn is_out_of_sync(&self, part: u32) -> bool {
        self.out_of_sync.contains(&part)
    }

    /// Clear the out-of-sync flag, re-admitting writes for the part.
    pub fn resync(&mut self, part: u32) {
        self.out_of_sync.remove(&part);
    }

    /// Number of accepted writes since construction.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl PoseProvider for MemoryPoseProvider {
    fn read_transform(&self, key: BoneKey, frame: PoseFrame) -> Option<PoseTransform> {
        self.transforms.get(&(key, frame)).copied()
    }

    fn write_transform(&mut self, key: BoneKey, frame: PoseFrame, transform: &PoseTransform) {
        if self.out_of_sync.contains(&key.part) {
            log::trace!("rejecting write to {key}: part {} out of sync", key.part);
            return;
        }
        self.transforms.insert((key, frame), *transform);
        self.writes += 1;
    }

    fn mark_out_of_sync(&mut self, part: u32) {
        self.out_of_sync.insert(part);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra_glm as glm;

    #[test]
    fn write_is_rejected_while_out_of_sync() {
        let key = BoneKey::new(0, 1);
        let mut provider = MemoryPoseProvider::new();
        provider.seed(key, PoseFrame::Model, PoseTransform::identity());

        provider.mark_out_of_sync(0);
        let moved = PoseTransform::at(glm::vec3(1.0, 2.0, 3.0));
        provider.write_transform(key, PoseFrame::Model, &moved);
        assert_eq!(
            provider.read_transform(key, PoseFrame::Model),
            Some(PoseTransform::identity())
        );
        assert_eq!(provider.write_count(), 0);

        provider.resync(0);
        provider.write_transform(key, PoseFrame::Model, &moved);
        assert_eq!(provider.read_transform(key, PoseFrame::Model), Some(moved));
        assert_eq!(provider.write_count(), 1);
    }

    #[test]
    fn unseeded_bone_reads_none() {
        let provider = MemoryPoseProvider::new();
        assert!(
            provider
                .read_transform(BoneKey::new(0, 0), PoseFrame::Local)
                .is_none()
        );
    }
}
