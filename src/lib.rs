//! Per-bone transform edits for skeletal pose graphs.
//!
//! A host engine hands over its skeleton topology once; the resulting
//! [`BoneGraph`] applies authored [`BoneEdit`] values (translation,
//! rotation, scale and hierarchical scale) onto the live pose every
//! update tick, reading and writing through the host's [`PoseProvider`].
//! Mirrored twin bones and whole-subtree rescaling are handled by the
//! graph; pose storage, template persistence and editing UI stay on the
//! host's side of the trait boundaries.

pub mod edit;
pub mod error;
pub mod graph;
pub mod math;
pub mod provider;
pub mod template;
pub mod transform;

pub use edit::{BoneAttribute, BoneEdit, FreezeSignals};
pub use error::TopologyError;
pub use graph::{ApplyMode, BoneGraph, BoneKey, BoneNode, BoneTopology, BoneTopologyEntry};
pub use provider::{MemoryPoseProvider, PoseFrame, PoseProvider};
pub use template::{EditTemplate, PoseTemplate, PoseTemplateData, SharedBoneEdit};
pub use transform::PoseTransform;
