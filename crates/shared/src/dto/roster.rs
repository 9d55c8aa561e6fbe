use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HireCandidateData {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub rarity: u8,
    #[serde(default)]
    pub level: u32,
    #[serde(default, rename = "class")]
    pub class_id: Option<i64>,
    #[serde(default)]
    pub slot: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RosterData {
    #[serde(default)]
    pub waifus: Vec<HireCandidateData>,
    #[serde(default)]
    pub count: usize,
}
