//! Profile Service - player profile and character summary

use std::sync::Arc;

use delver_shared::dto::ProfileData;

use crate::application::fetcher::DomainFetcher;
use crate::application::store::{DomainPayload, StateDomain};
use crate::application::ServiceError;

#[derive(Clone)]
pub struct ProfileService {
    fetcher: DomainFetcher,
}

impl ProfileService {
    pub fn new(fetcher: DomainFetcher) -> Self {
        Self { fetcher }
    }

    pub async fn profile(&self) -> Result<ProfileData, ServiceError> {
        let payload = self.fetcher.ensure(StateDomain::Profile).await?;
        profile_of(payload)
    }

    /// Re-fetch profile and inventory regardless of freshness.
    pub async fn refresh_profile(&self) -> Result<ProfileData, ServiceError> {
        self.fetcher
            .fetch_all(&[StateDomain::Profile, StateDomain::Inventory])
            .await?;
        let payload = self.fetcher.ensure(StateDomain::Profile).await?;
        let profile = profile_of(payload)?;
        tracing::debug!(gold = profile.gold, act = profile.act, "Profile refreshed");
        Ok(profile)
    }
}

fn profile_of(payload: Arc<DomainPayload>) -> Result<ProfileData, ServiceError> {
    payload
        .as_profile()
        .cloned()
        .ok_or_else(|| ServiceError::ParseError("profile snapshot holds another domain".into()))
}
