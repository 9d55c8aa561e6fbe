//! Classification of authority refusals
//!
//! The authority reports game-rule refusals as short snake_case codes
//! (`dungeon_already_active`, `no_waifu`, ...). Matching is by substring so
//! prefixed variants of a code land in the same bucket.

use std::fmt;

/// A known refusal, or `Other` with the raw detail kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorityFailure {
    AlreadyActive,
    AlreadyCompleted,
    LevelLocked,
    LadderLocked,
    LevelTooLow,
    NoEligibleCharacter,
    Other { detail: String },
}

impl AuthorityFailure {
    pub fn classify(detail: &str) -> Self {
        let normalized = detail.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        let has = |needle: &str| normalized.contains(needle);

        if has("already_active") {
            Self::AlreadyActive
        } else if has("already_completed") {
            Self::AlreadyCompleted
        } else if has("level_locked") {
            Self::LevelLocked
        } else if has("plus_locked") || has("ladder_locked") || has("plus_not_unlocked") {
            Self::LadderLocked
        } else if has("level_too_low") || has("level_requirement") {
            Self::LevelTooLow
        } else if has("no_waifu") || has("no_eligible") || has("no_character") {
            Self::NoEligibleCharacter
        } else {
            Self::Other {
                detail: detail.to_string(),
            }
        }
    }

    /// User-facing advisory for this refusal.
    pub fn advisory(&self) -> String {
        match self {
            Self::AlreadyActive => "A dungeon run is already in progress.".to_string(),
            Self::AlreadyCompleted => "This dungeon has already been completed.".to_string(),
            Self::LevelLocked => {
                "That difficulty level is not unlocked for this dungeon yet.".to_string()
            }
            Self::LadderLocked => "The difficulty ladder is not unlocked yet.".to_string(),
            Self::LevelTooLow => "Your character's level is too low for this.".to_string(),
            Self::NoEligibleCharacter => "You need a main character to do this.".to_string(),
            Self::Other { detail } => format!("The request was refused ({}).", detail),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other { .. })
    }
}

impl fmt::Display for AuthorityFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.advisory())
    }
}
