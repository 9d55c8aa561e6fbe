//! Push-channel messages
//!
//! Every frame is `{"type": "...", "payload": {...}}`. Frames are classified
//! once, here, into the closed `Notification` set. Any type that is neither a
//! heartbeat nor an encounter message is an advisory for the activity log.
//!
//! The authority still publishes combat results under the legacy `battle`
//! type, with completion and spam blocking folded into the payload. Those are
//! split out into the dedicated variants below.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use delver_domain::CompletionRewards;

/// Payload error codes that put the encounter into the sticky blocked state.
const BLOCKING_ERRORS: &[&str] = &["spam_detected", "no_energy", "message_too_short"];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationError {
    #[error("malformed notification: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Encounter progressed; re-fetch after the coalescing window
    EncounterTick,
    EncounterBlocked { reason: String },
    EncounterCompleted { rewards: CompletionRewards },
    /// Any other message type; logged, never acted on
    Advisory { kind: String, text: String },
    Ping,
}

impl Notification {
    /// Parse a raw `data:` frame.
    pub fn parse(raw: &str) -> Result<Self, NotificationError> {
        let envelope: Envelope = serde_json::from_str(raw)
            .map_err(|e| NotificationError::Malformed(e.to_string()))?;
        Ok(Self::from_envelope(envelope))
    }

    pub fn from_envelope(envelope: Envelope) -> Self {
        let Envelope { kind, payload } = envelope;
        match kind.as_str() {
            "ping" => Self::Ping,
            "battle" | "encounter" | "encounter_tick" => Self::from_encounter_payload(payload),
            "encounter_blocked" => Self::EncounterBlocked {
                reason: first_text(&payload, &["reason", "error", "message"])
                    .unwrap_or_else(|| "blocked".to_string()),
            },
            "encounter_completed" => Self::EncounterCompleted {
                rewards: rewards_from(payload),
            },
            _ => Self::Advisory {
                text: first_text(&payload, &["message", "text"])
                    .unwrap_or_else(|| payload.to_string()),
                kind,
            },
        }
    }

    fn from_encounter_payload(payload: Value) -> Self {
        if let Some(error) = payload.get("error").and_then(Value::as_str) {
            if BLOCKING_ERRORS.contains(&error) {
                return Self::EncounterBlocked {
                    reason: error.to_string(),
                };
            }
        }
        let completed = payload
            .get("dungeon_completed")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if completed {
            Self::EncounterCompleted {
                rewards: rewards_from(payload),
            }
        } else {
            Self::EncounterTick
        }
    }

    /// Whether this message concerns the encounter domain.
    pub fn is_encounter(&self) -> bool {
        matches!(
            self,
            Self::EncounterTick | Self::EncounterBlocked { .. } | Self::EncounterCompleted { .. }
        )
    }
}

fn first_text(payload: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| payload.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn rewards_from(payload: Value) -> CompletionRewards {
    match serde_json::from_value(payload) {
        Ok(rewards) => rewards,
        Err(e) => {
            tracing::warn!(error = %e, "Completion payload did not match reward shape");
            CompletionRewards::default()
        }
    }
}
