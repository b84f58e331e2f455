use crate::document::{ElementId, PageDocument};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Serializable page description, loaded by the CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageSnapshot {
    #[serde(default)]
    pub elements: Vec<ElementSnapshot>,

    /// Markup hidden from structured queries (template/shadow content).
    #[serde(default)]
    pub inert_markup: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementSnapshot {
    #[serde(default = "default_tag")]
    pub tag: String,

    /// Optional stable name used by scripted interactions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub attributes: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default)]
    pub children: Vec<ElementSnapshot>,
}

fn default_tag() -> String {
    "div".to_string()
}

impl PageDocument {
    pub fn from_json(raw: &str) -> Result<Self> {
        let snapshot: PageSnapshot = serde_json::from_str(raw)?;
        Self::from_snapshot(&snapshot)
    }

    pub fn from_snapshot(snapshot: &PageSnapshot) -> Result<Self> {
        let mut doc = Self::new();
        let root = doc.root();
        for element in &snapshot.elements {
            doc.insert_snapshot(root, element)?;
        }
        for fragment in &snapshot.inert_markup {
            doc.add_inert_markup(fragment.clone());
        }
        Ok(doc)
    }

    /// Look up an element by its `id` attribute.
    pub fn element_by_id(&self, name: &str) -> Option<ElementId> {
        use crate::Document;
        self.attached_elements()
            .into_iter()
            .find(|id| self.attribute(*id, "id") == Some(name))
    }

    fn insert_snapshot(&mut self, parent: ElementId, snapshot: &ElementSnapshot) -> Result<()> {
        let id = self.create_element(snapshot.tag.clone());
        if let Some(name) = &snapshot.id {
            self.set_attribute(id, "id", name)?;
        }
        for (name, value) in &snapshot.attributes {
            self.set_attribute(id, name, value)?;
        }
        if let Some(text) = &snapshot.text {
            self.set_text(id, text.clone())?;
        }
        self.append_child(parent, id)?;
        for child in &snapshot.children {
            self.insert_snapshot(id, child)?;
        }
        Ok(())
    }
}
