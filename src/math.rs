// Scalar and vector helpers shared by edit composition and the
// hierarchical scale walk.

use nalgebra_glm as glm;

/// Lower bound for translation and scaling components, in model units.
pub const MIN_LIMIT: f32 = -100.0;
/// Upper bound for translation and scaling components, in model units.
pub const MAX_LIMIT: f32 = 100.0;

/// Clamp every component into [MIN_LIMIT, MAX_LIMIT].
pub fn clamp_components(v: &glm::Vec3) -> glm::Vec3 {
    glm::vec3(
        v.x.clamp(MIN_LIMIT, MAX_LIMIT),
        v.y.clamp(MIN_LIMIT, MAX_LIMIT),
        v.z.clamp(MIN_LIMIT, MAX_LIMIT),
    )
}

/// Wrap a degree angle into (-180, 180].
pub fn wrap_degrees(mut deg: f32) -> f32 {
    if !deg.is_finite() {
        return deg;
    }
    while deg > 180.0 {
        deg -= 360.0;
    }
    while deg <= -180.0 {
        deg += 360.0;
    }
    deg
}

/// Wrap every component of a degree angle vector into (-180, 180].
pub fn wrap_components(v: &glm::Vec3) -> glm::Vec3 {
    glm::vec3(wrap_degrees(v.x), wrap_degrees(v.y), wrap_degrees(v.z))
}

/// Componentwise product of two vectors.
pub fn scale_components(v: &glm::Vec3, s: &glm::Vec3) -> glm::Vec3 {
    glm::vec3(v.x * s.x, v.y * s.y, v.z * s.z)
}

/// True if any component is farther than `tolerance` from `reference`.
pub fn deviates(v: &glm::Vec3, reference: f32, tolerance: f32) -> bool {
    (v.x - reference).abs() > tolerance
        || (v.y - reference).abs() > tolerance
        || (v.z - reference).abs() > tolerance
}

/// Quaternion for intrinsic Z*Y*X Euler angles given in degrees.
pub fn quat_from_euler_degrees(angles: &glm::Vec3) -> glm::Quat {
    let qx = glm::quat_angle_axis(angles.x.to_radians(), &glm::vec3(1.0, 0.0, 0.0));
    let qy = glm::quat_angle_axis(angles.y.to_radians(), &glm::vec3(0.0, 1.0, 0.0));
    let qz = glm::quat_angle_axis(angles.z.to_radians(), &glm::vec3(0.0, 0.0, 1.0));
    qz * qy * qx
}
