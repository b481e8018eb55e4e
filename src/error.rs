// Fatal graph-construction failures.

use thiserror::Error;

use crate::graph::BoneKey;

/// A corrupt topology build. Construction aborts on the first of these;
/// none of them is recoverable by the caller short of rebuilding the
/// skeleton description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("bone {key} is defined twice")]
    DuplicateBone { key: BoneKey },

    #[error("bone {child} already has parent {current}, refusing {requested}")]
    ParentReassigned {
        child: BoneKey,
        current: BoneKey,
        requested: BoneKey,
    },

    #[error("bone {child} references unknown parent {parent}")]
    UnknownParent { child: BoneKey, parent: BoneKey },

    #[error("bone {key} cannot be its own parent")]
    SelfParent { key: BoneKey },

    #[error("bone {child} is already a child of {parent}")]
    DuplicateChild { parent: BoneKey, child: BoneKey },

    #[error("parent links of bone {key} form a cycle")]
    ParentCycle { key: BoneKey },
}
