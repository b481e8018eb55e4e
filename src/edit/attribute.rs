// Attribute kinds a bone edit carries.

use serde::{Deserialize, Serialize};

/// Which of the four edit channels an operation addresses. Discriminants
/// are stable; stored data depends on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum BoneAttribute {
    Position = 0,
    Rotation = 1,
    Scale = 2,
    HierarchicalScale = 3,
}

impl From<BoneAttribute> for u32 {
    fn from(attribute: BoneAttribute) -> u32 {
        attribute as u32
    }
}

impl TryFrom<u32> for BoneAttribute {
    type Error = String;

    fn try_from(ordinal: u32) -> Result<Self, Self::Error> {
        match ordinal {
            0 => Ok(BoneAttribute::Position),
            1 => Ok(BoneAttribute::Rotation),
            2 => Ok(BoneAttribute::Scale),
            3 => Ok(BoneAttribute::HierarchicalScale),
            other => Err(format!("unknown bone attribute ordinal {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_are_stable() {
        assert_eq!(u32::from(BoneAttribute::Position), 0);
        assert_eq!(u32::from(BoneAttribute::Rotation), 1);
        assert_eq!(u32::from(BoneAttribute::Scale), 2);
        assert_eq!(u32::from(BoneAttribute::HierarchicalScale), 3);
    }

    #[test]
    fn serializes_as_bare_integer() {
        let json = serde_json::to_string(&BoneAttribute::Scale).unwrap();
        assert_eq!(json, "2");
        let back: BoneAttribute = serde_json::from_str("3").unwrap();
        assert_eq!(back, BoneAttribute::HierarchicalScale);
        assert!(serde_json::from_str::<BoneAttribute>("7").is_err());
    }
}
