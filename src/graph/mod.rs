// Bone graph module: per-bone nodes, graph ownership and the per-update
// apply passes.

pub mod graph;
pub mod node;

pub use graph::{ApplyMode, BoneGraph, BoneTopology, BoneTopologyEntry};
pub use node::{Ancestors, BoneKey, BoneNode};
