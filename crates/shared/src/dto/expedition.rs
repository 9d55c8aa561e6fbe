use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpeditionSlotData {
    pub id: i64,
    pub slot: u32,
    pub name: String,
    #[serde(default)]
    pub base_level: u32,
    #[serde(default)]
    pub base_difficulty: u32,
    #[serde(default)]
    pub base_gold: i64,
    #[serde(default)]
    pub base_experience: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveExpeditionData {
    pub id: i64,
    pub slot_id: i64,
    #[serde(default)]
    pub duration_minutes: u32,
    #[serde(default)]
    pub remaining_seconds: i64,
    #[serde(default)]
    pub chance: Option<f64>,
    #[serde(default)]
    pub reward_gold: i64,
    #[serde(default)]
    pub reward_experience: i64,
    #[serde(default)]
    pub squad_waifu_ids: Vec<i64>,
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default)]
    pub claimed: bool,
}

impl ActiveExpeditionData {
    pub fn is_claimable(&self) -> bool {
        self.remaining_seconds == 0 && !self.cancelled && !self.claimed
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExpeditionSlotsData {
    #[serde(default)]
    pub slots: Vec<ExpeditionSlotData>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActiveExpeditionsData {
    #[serde(default)]
    pub active: Vec<ActiveExpeditionData>,
}

/// Slots and running expeditions, cached together.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExpeditionsData {
    pub slots: Vec<ExpeditionSlotData>,
    pub active: Vec<ActiveExpeditionData>,
}

/// Reward summary returned by claim (and by cancel, with zero rewards).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpeditionRewardData {
    pub id: i64,
    #[serde(default)]
    pub claimed: bool,
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default)]
    pub reward_gold: i64,
    #[serde(default)]
    pub reward_experience: i64,
}
