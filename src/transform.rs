// Per-bone pose transform value.

use nalgebra_glm as glm;

/// One bone's pose: scale, rotation and translation in a single frame of
/// reference (local or model, depending on where it was read from).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseTransform {
    pub translation: glm::Vec3,
    pub rotation: glm::Quat,
    pub scale: glm::Vec3,
}

impl PoseTransform {
    pub fn new(translation: glm::Vec3, rotation: glm::Quat, scale: glm::Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Zero translation, identity rotation, unit scale.
    pub fn identity() -> Self {
        Self {
            translation: glm::vec3(0.0, 0.0, 0.0),
            rotation: glm::quat_identity(),
            scale: glm::vec3(1.0, 1.0, 1.0),
        }
    }

    /// Identity rotation and unit scale at the given position.
    pub fn at(translation: glm::Vec3) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    /// False when any component is NaN or infinite. Hosts hand out such
    /// transforms for poses that have not been computed yet.
    pub fn is_valid(&self) -> bool {
        self.translation.iter().all(|c| c.is_finite())
            && self.scale.iter().all(|c| c.is_finite())
            && self.rotation.coords.iter().all(|c| c.is_finite())
    }
}

impl Default for PoseTransform {
    fn default() -> Self {
        Self::identity()
    }
}
