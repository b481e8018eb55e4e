// Per-bone edit values and their composition onto live pose transforms.

use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};

use crate::math;
use crate::transform::PoseTransform;

use super::BoneAttribute;

/// Translation components closer than this to zero count as untouched.
pub const TRANSLATION_TOLERANCE: f32 = 1e-5;
/// Rotation components closer than this to zero count as untouched, degrees.
pub const ROTATION_TOLERANCE: f32 = 0.1;
/// Scaling components closer than this to one count as untouched.
pub const SCALING_TOLERANCE: f32 = 1e-5;

/// Externally owned pause switches for the three edit channels. Read at
/// composition time only; the host toggles them between frames, never
/// mid-pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FreezeSignals {
    pub position: bool,
    pub rotation: bool,
    pub scale: bool,
}

/// One bone's authored transform edit.
///
/// Components are sanitized on every write and on deserialization:
/// translation and the two scalings are clamped into the
/// [`math::MIN_LIMIT`]..[`math::MAX_LIMIT`] range, rotation angles are
/// wrapped into (-180, 180] degrees. Out-of-range input saturates
/// silently, it is never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawBoneEdit", into = "RawBoneEdit")]
pub struct BoneEdit {
    translation: glm::Vec3,
    rotation: glm::Vec3,
    scaling: glm::Vec3,
    hierarchical_scaling: glm::Vec3,
}

impl Default for BoneEdit {
    fn default() -> Self {
        Self {
            translation: glm::vec3(0.0, 0.0, 0.0),
            rotation: glm::vec3(0.0, 0.0, 0.0),
            scaling: glm::vec3(1.0, 1.0, 1.0),
            hierarchical_scaling: glm::vec3(1.0, 1.0, 1.0),
        }
    }
}

impl BoneEdit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn translation(&self) -> glm::Vec3 {
        self.translation
    }

    /// Euler angles in degrees, each in (-180, 180].
    pub fn rotation(&self) -> glm::Vec3 {
        self.rotation
    }

    pub fn scaling(&self) -> glm::Vec3 {
        self.scaling
    }

    pub fn hierarchical_scaling(&self) -> glm::Vec3 {
        self.hierarchical_scaling
    }

    pub fn set_translation(&mut self, value: glm::Vec3) {
        self.translation = math::clamp_components(&value);
    }

    pub fn set_rotation(&mut self, value: glm::Vec3) {
        self.rotation = math::wrap_components(&value);
    }

    pub fn set_scaling(&mut self, value: glm::Vec3) {
        self.scaling = math::clamp_components(&value);
    }

    pub fn set_hierarchical_scaling(&mut self, value: glm::Vec3) {
        self.hierarchical_scaling = math::clamp_components(&value);
    }

    /// Write one channel, applying that channel's clamp or wrap rule.
    pub fn set(&mut self, attribute: BoneAttribute, value: glm::Vec3) {
        match attribute {
            BoneAttribute::Position => self.set_translation(value),
            BoneAttribute::Rotation => self.set_rotation(value),
            BoneAttribute::Scale => self.set_scaling(value),
            BoneAttribute::HierarchicalScale => self.set_hierarchical_scaling(value),
        }
    }

    /// Full-value copy from another edit; no sub-objects are shared.
    pub fn copy_from(&mut self, other: &BoneEdit) {
        *self = other.clone();
    }

    /// True once any channel deviates from its rest value beyond that
    /// channel's tolerance, on any axis.
    pub fn is_edited(&self) -> bool {
        math::deviates(&self.translation, 0.0, TRANSLATION_TOLERANCE)
            || math::deviates(&self.rotation, 0.0, ROTATION_TOLERANCE)
            || math::deviates(&self.scaling, 1.0, SCALING_TOLERANCE)
            || math::deviates(&self.hierarchical_scaling, 1.0, SCALING_TOLERANCE)
    }

    /// True when the hierarchical scaling deviates from one on any axis.
    pub fn has_hierarchical_scaling(&self) -> bool {
        math::deviates(&self.hierarchical_scaling, 1.0, SCALING_TOLERANCE)
    }

    /// Mirror for twin pairs whose mirror plane crosses Z: negates
    /// translation.z and rotation.x/.y. Scalings carry over unchanged.
    pub fn standard_reflection(&self) -> BoneEdit {
        BoneEdit {
            translation: glm::vec3(self.translation.x, self.translation.y, -self.translation.z),
            rotation: glm::vec3(-self.rotation.x, -self.rotation.y, self.rotation.z),
            scaling: self.scaling,
            hierarchical_scaling: self.hierarchical_scaling,
        }
    }

    /// Mirror variant for the skeleton-part family mirrored across Y:
    /// negates translation.y and rotation.y/.z. Which convention a twin
    /// pair uses is a topology fact the caller knows.
    pub fn special_reflection(&self) -> BoneEdit {
        BoneEdit {
            translation: glm::vec3(self.translation.x, -self.translation.y, self.translation.z),
            rotation: glm::vec3(self.rotation.x, -self.rotation.y, -self.rotation.z),
            scaling: self.scaling,
            hierarchical_scaling: self.hierarchical_scaling,
        }
    }

    /// The edit rotation as a quaternion.
    pub fn rotation_quat(&self) -> glm::Quat {
        math::quat_from_euler_degrees(&self.rotation)
    }

    /// Multiply the pose scale componentwise by this edit's scaling.
    pub fn compose_scale(&self, pose: &PoseTransform, freeze: &FreezeSignals) -> PoseTransform {
        if freeze.scale {
            return *pose;
        }
        let mut out = *pose;
        out.scale = math::scale_components(&pose.scale, &self.scaling);
        out
    }

    /// Apply the edit rotation in the bone's local frame: the pose
    /// rotation is post-multiplied by the edit quaternion.
    pub fn compose_rotation(&self, pose: &PoseTransform, freeze: &FreezeSignals) -> PoseTransform {
        if freeze.rotation {
            return *pose;
        }
        let mut out = *pose;
        out.rotation = pose.rotation * self.rotation_quat();
        out
    }

    /// Add the edit translation, first rotated by the pose's current
    /// rotation. The offset is authored in the bone's own orientation,
    /// not in model space, so it has to follow the pose rotation.
    pub fn compose_translation_with_rotation(
        &self,
        pose: &PoseTransform,
        freeze: &FreezeSignals,
    ) -> PoseTransform {
        if freeze.position {
            return *pose;
        }
        let mut out = *pose;
        out.translation = pose.translation + glm::quat_rotate_vec3(&pose.rotation, &self.translation);
        out
    }

    /// Add the edit translation as-is, no rotation pre-transform. The
    /// straight application mode bypasses the position freeze as well.
    pub fn compose_translation_only(&self, pose: &PoseTransform) -> PoseTransform {
        let mut out = *pose;
        out.translation = pose.translation + self.translation;
        out
    }

    /// Scale, then rotation, then rotated translation.
    pub fn compose_full(&self, pose: &PoseTransform, freeze: &FreezeSignals) -> PoseTransform {
        let scaled = self.compose_scale(pose, freeze);
        let rotated = self.compose_rotation(&scaled, freeze);
        self.compose_translation_with_rotation(&rotated, freeze)
    }
}

/// Serialized shape of an edit; conversion back into [`BoneEdit`] runs
/// every component through the write-path sanitizers, so persisted
/// out-of-range data lands clamped and wrapped.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawBoneEdit {
    #[serde(default = "zero3")]
    translation: [f32; 3],
    #[serde(default = "zero3")]
    rotation: [f32; 3],
    #[serde(default = "one3")]
    scaling: [f32; 3],
    #[serde(default = "one3")]
    hierarchical_scaling: [f32; 3],
}

fn zero3() -> [f32; 3] {
    [0.0, 0.0, 0.0]
}

fn one3() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

impl From<RawBoneEdit> for BoneEdit {
    fn from(raw: RawBoneEdit) -> Self {
        let mut edit = BoneEdit::default();
        edit.set_translation(glm::make_vec3(&raw.translation));
        edit.set_rotation(glm::make_vec3(&raw.rotation));
        edit.set_scaling(glm::make_vec3(&raw.scaling));
        edit.set_hierarchical_scaling(glm::make_vec3(&raw.hierarchical_scaling));
        edit
    }
}

impl From<BoneEdit> for RawBoneEdit {
    fn from(edit: BoneEdit) -> Self {
        let v = |v: glm::Vec3| [v.x, v.y, v.z];
        Self {
            translation: v(edit.translation),
            rotation: v(edit.rotation),
            scaling: v(edit.scaling),
            hierarchical_scaling: v(edit.hierarchical_scaling),
        }
    }
}
