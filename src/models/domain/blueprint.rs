use serde::{Deserialize, Serialize};

/// One timed phase of a tryout.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct BlueprintSection {
    pub subtest_id: String,
    pub name: String,
    pub question_count: u32,
    pub duration_seconds: i64,
}

/// Tryout template: an ordered list of sections.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Blueprint {
    pub id: String,
    pub name: String,
    pub is_active: bool,
    pub sections: Vec<BlueprintSection>,
}

impl Blueprint {
    pub fn section(&self, index: u32) -> Option<&BlueprintSection> {
        self.sections.get(index as usize)
    }

    pub fn section_count(&self) -> u32 {
        self.sections.len() as u32
    }
}
