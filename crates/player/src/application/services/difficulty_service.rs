//! Difficulty Service - plus-level unlock status for the dungeon picker

use delver_domain::{DifficultyUnlocks, DungeonId, EntryRejection, ProgressionGate};
use delver_shared::dto::DifficultyStatusData;

use crate::application::fetcher::DomainFetcher;
use crate::application::store::StateDomain;
use crate::application::ServiceError;

#[derive(Clone)]
pub struct DifficultyService {
    fetcher: DomainFetcher,
}

impl DifficultyService {
    pub fn new(fetcher: DomainFetcher) -> Self {
        Self { fetcher }
    }

    pub async fn status(&self) -> Result<DifficultyStatusData, ServiceError> {
        let payload = self.fetcher.ensure(StateDomain::Difficulty).await?;
        payload.as_difficulty().cloned().ok_or_else(|| {
            ServiceError::ParseError("difficulty snapshot holds another domain".into())
        })
    }

    pub async fn unlocks(&self) -> Result<DifficultyUnlocks, ServiceError> {
        Ok(self.status().await?.to_unlocks())
    }

    /// Levels the picker should offer, ascending from 0.
    pub async fn selectable_levels(&self) -> Result<Vec<u32>, ServiceError> {
        let unlocks = self.unlocks().await?;
        Ok(ProgressionGate::new(&unlocks).selectable_levels())
    }

    /// Check entry against the current snapshot without contacting the authority
    /// beyond the status fetch.
    pub async fn check_entry(
        &self,
        dungeon_id: DungeonId,
        level: u32,
    ) -> Result<Result<(), EntryRejection>, ServiceError> {
        let unlocks = self.unlocks().await?;
        Ok(ProgressionGate::new(&unlocks).can_enter(dungeon_id, level))
    }
}
