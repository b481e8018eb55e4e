// Edit templates: the named bone-name -> edit maps the editing surface
// owns. Nodes link the shared edit values, never copies of them.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::edit::BoneEdit;

/// Shared handle to one edit value. The owning template keeps it alive;
/// any number of nodes (across graphs) may hold the same handle, so a
/// mutation through the template is visible to all of them immediately.
/// Single-writer discipline between edits and apply passes is the
/// caller's contract, not enforced here.
pub type SharedBoneEdit = Rc<RefCell<BoneEdit>>;

/// A named collection of per-bone edits, keyed by bone name (unique
/// within one template). Queried when a node links a template.
pub trait EditTemplate {
    fn display_name(&self) -> &str;

    /// The shared edit for a bone name, or `None` when the template has
    /// no entry for it.
    fn edit_for(&self, bone_name: &str) -> Option<SharedBoneEdit>;
}

/// In-memory template. Persistence lives outside the core; this type
/// converts to and from [`PoseTemplateData`] for whatever storage the
/// host uses.
#[derive(Debug, Default)]
pub struct PoseTemplate {
    name: String,
    edits: HashMap<String, SharedBoneEdit>,
}

impl PoseTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            edits: HashMap::new(),
        }
    }

    /// Insert or replace the edit for a bone name, returning the shared
    /// handle the editing surface keeps mutating.
    pub fn insert(&mut self, bone_name: impl Into<String>, edit: BoneEdit) -> SharedBoneEdit {
        let shared = Rc::new(RefCell::new(edit));
        self.edits.insert(bone_name.into(), Rc::clone(&shared));
        shared
    }

    /// Drop an entry. Nodes still holding the handle keep it until they
    /// unlink; the template simply stops handing it out.
    pub fn remove(&mut self, bone_name: &str) -> bool {
        self.edits.remove(bone_name).is_some()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn bone_names(&self) -> impl Iterator<Item = &str> {
        self.edits.keys().map(String::as_str)
    }
}

impl EditTemplate for PoseTemplate {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn edit_for(&self, bone_name: &str) -> Option<SharedBoneEdit> {
        self.edits.get(bone_name).map(Rc::clone)
    }
}

/// Plain-value form of a template for host-side persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoseTemplateData {
    pub name: String,
    pub edits: HashMap<String, BoneEdit>,
}

impl From<&PoseTemplate> for PoseTemplateData {
    fn from(template: &PoseTemplate) -> Self {
        Self {
            name: template.name.clone(),
            edits: template
                .edits
                .iter()
                .map(|(name, edit)| (name.clone(), edit.borrow().clone()))
                .collect(),
        }
    }
}

impl From<PoseTemplateData> for PoseTemplate {
    fn from(data: PoseTemplateData) -> Self {
        let mut template = PoseTemplate::new(data.name);
        for (name, edit) in data.edits {
            template.insert(name, edit);
        }
        template
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra_glm as glm;

    #[test]
    fn edits_are_shared_not_copied() {
        let mut template = PoseTemplate::new("slim");
        let handle = template.insert("Spine", BoneEdit::default());

        handle
            .borrow_mut()
            .set_translation(glm::vec3(0.0, 1.0, 0.0));

        let seen = template.edit_for("Spine").unwrap();
        assert_eq!(seen.borrow().translation(), glm::vec3(0.0, 1.0, 0.0));
        assert!(Rc::ptr_eq(&handle, &seen));
    }

    #[test]
    fn missing_entry_is_none() {
        let template = PoseTemplate::new("empty");
        assert!(template.edit_for("Spine").is_none());
    }

    #[test]
    fn data_round_trip_preserves_values() {
        let mut template = PoseTemplate::new("slim");
        let mut edit = BoneEdit::default();
        edit.set_scaling(glm::vec3(0.9, 0.9, 0.9));
        template.insert("Spine", edit.clone());

        let data = PoseTemplateData::from(&template);
        let json = serde_json::to_string(&data).unwrap();
        let back: PoseTemplateData = serde_json::from_str(&json).unwrap();
        let restored = PoseTemplate::from(back);

        assert_eq!(restored.display_name(), "slim");
        assert_eq!(*restored.edit_for("Spine").unwrap().borrow(), edit);
    }
}
