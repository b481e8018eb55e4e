// Bone edit module: the authored per-bone values and their composition
// onto live pose transforms.

pub mod attribute;
pub mod bone_edit;

pub use attribute::BoneAttribute;
pub use bone_edit::{
    BoneEdit, FreezeSignals, ROTATION_TOLERANCE, SCALING_TOLERANCE, TRANSLATION_TOLERANCE,
};
