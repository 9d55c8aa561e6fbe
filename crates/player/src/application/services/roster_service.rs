//! Roster Service - tavern hires

use std::sync::Arc;

use delver_shared::dto::RosterData;
use delver_shared::RosterRequest;

use crate::application::fetcher::DomainFetcher;
use crate::application::store::StateDomain;
use crate::application::{ParseResponse, ServiceError};
use crate::ports::outbound::AuthorityPort;

#[derive(Clone)]
pub struct RosterService {
    connection: Arc<dyn AuthorityPort>,
    fetcher: DomainFetcher,
}

impl RosterService {
    pub fn new(connection: Arc<dyn AuthorityPort>, fetcher: DomainFetcher) -> Self {
        Self {
            connection,
            fetcher,
        }
    }

    pub async fn available(&self) -> Result<RosterData, ServiceError> {
        let payload = self.fetcher.ensure(StateDomain::Roster).await?;
        payload
            .as_roster()
            .cloned()
            .ok_or_else(|| ServiceError::ParseError("roster snapshot holds another domain".into()))
    }

    /// Hire the candidate offered in `slot`.
    pub async fn hire(&self, slot: u32) -> Result<(), ServiceError> {
        self.connection
            .request_with_timeout(
                RosterRequest::Hire { slot }.into(),
                self.fetcher.timeout_ms(),
            )
            .await?
            .parse_empty()?;

        tracing::info!(slot, "Hired from tavern");
        self.fetcher
            .store()
            .invalidate_all(&[StateDomain::Roster, StateDomain::Profile])
            .await;
        Ok(())
    }
}
