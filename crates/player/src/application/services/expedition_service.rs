//! Expedition Service - squads sent out on timed runs
//!
//! Slots and active runs are cached together as one domain. Every mutation
//! leaves that domain stale; claims also touch gold and experience.

use std::sync::Arc;

use delver_domain::{DomainError, ExpeditionId};
use delver_shared::dto::{ExpeditionRewardData, ExpeditionsData};
use delver_shared::ExpeditionRequest;

use crate::application::fetcher::DomainFetcher;
use crate::application::store::StateDomain;
use crate::application::{ParseResponse, ServiceError};
use crate::ports::outbound::AuthorityPort;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpeditionPlan {
    pub slot_id: i64,
    pub duration_minutes: u32,
    pub squad_ids: Vec<i64>,
}

#[derive(Clone)]
pub struct ExpeditionService {
    connection: Arc<dyn AuthorityPort>,
    fetcher: DomainFetcher,
}

impl ExpeditionService {
    pub fn new(connection: Arc<dyn AuthorityPort>, fetcher: DomainFetcher) -> Self {
        Self {
            connection,
            fetcher,
        }
    }

    pub async fn overview(&self) -> Result<ExpeditionsData, ServiceError> {
        let payload = self.fetcher.ensure(StateDomain::Expeditions).await?;
        payload.as_expeditions().cloned().ok_or_else(|| {
            ServiceError::ParseError("expeditions snapshot holds another domain".into())
        })
    }

    pub async fn start(&self, plan: ExpeditionPlan) -> Result<ExpeditionRewardData, ServiceError> {
        if plan.squad_ids.is_empty() {
            return Err(DomainError::validation("an expedition needs at least one squad member").into());
        }
        if plan.duration_minutes == 0 {
            return Err(DomainError::validation("expedition duration must be positive").into());
        }

        let started: ExpeditionRewardData = self
            .connection
            .request_with_timeout(
                ExpeditionRequest::Start {
                    slot_id: plan.slot_id,
                    duration_minutes: plan.duration_minutes,
                    squad_ids: plan.squad_ids.clone(),
                }
                .into(),
                self.fetcher.timeout_ms(),
            )
            .await?
            .parse()?;

        tracing::info!(
            expedition_id = started.id,
            slot_id = plan.slot_id,
            squad = plan.squad_ids.len(),
            "Expedition started"
        );
        self.fetcher.store().invalidate(StateDomain::Expeditions).await;
        Ok(started)
    }

    pub async fn cancel(&self, id: ExpeditionId) -> Result<ExpeditionRewardData, ServiceError> {
        let cancelled: ExpeditionRewardData = self
            .connection
            .request_with_timeout(
                ExpeditionRequest::Cancel {
                    expedition_id: id.get(),
                }
                .into(),
                self.fetcher.timeout_ms(),
            )
            .await?
            .parse()?;

        tracing::info!(expedition_id = %id, "Expedition cancelled");
        self.fetcher.store().invalidate(StateDomain::Expeditions).await;
        Ok(cancelled)
    }

    /// Collect a finished run; the authority answers `not_ready` while it is still out.
    pub async fn claim(&self, id: ExpeditionId) -> Result<ExpeditionRewardData, ServiceError> {
        let reward: ExpeditionRewardData = self
            .connection
            .request_with_timeout(
                ExpeditionRequest::Claim {
                    expedition_id: id.get(),
                }
                .into(),
                self.fetcher.timeout_ms(),
            )
            .await?
            .parse()?;

        tracing::info!(
            expedition_id = %id,
            gold = reward.reward_gold,
            experience = reward.reward_experience,
            "Expedition claimed"
        );
        self.fetcher
            .store()
            .invalidate_all(&[StateDomain::Expeditions, StateDomain::Profile, StateDomain::Roster])
            .await;
        Ok(reward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::store::SessionStateStore;
    use crate::infrastructure::clock::SystemClock;
    use crate::infrastructure::testing::RecordingAuthority;
    use crate::ports::outbound::MockAuthorityPort;
    use delver_shared::{AuthorityRequest, ErrorCode, ResponseResult};
    use serde_json::json;

    fn fetcher(authority: Arc<dyn AuthorityPort>) -> DomainFetcher {
        let store = Arc::new(SessionStateStore::new(Arc::new(SystemClock::new())));
        DomainFetcher::new(authority, store, 1)
    }

    mod start {
        use super::*;

        #[tokio::test]
        async fn sends_squad_and_duration() {
            let mut mock = MockAuthorityPort::new();
            mock.expect_request_with_timeout()
                .withf(|request, _| {
                    *request
                        == AuthorityRequest::from(ExpeditionRequest::Start {
                            slot_id: 2,
                            duration_minutes: 60,
                            squad_ids: vec![11, 12],
                        })
                })
                .times(1)
                .returning(|_, _| {
                    Ok(ResponseResult::success(json!({
                        "id": 40, "chance": 0.8, "success": true,
                        "reward_gold": 90, "reward_experience": 30,
                        "ends_at": "2026-01-01T12:00:00Z"
                    })))
                });
            let connection: Arc<dyn AuthorityPort> = Arc::new(mock);
            let service = ExpeditionService::new(connection.clone(), fetcher(connection));

            let started = service
                .start(ExpeditionPlan {
                    slot_id: 2,
                    duration_minutes: 60,
                    squad_ids: vec![11, 12],
                })
                .await
                .unwrap();
            assert_eq!(started.id, 40);
            assert_eq!(started.reward_gold, 90);
        }

        #[tokio::test]
        async fn empty_squad_is_rejected_locally() {
            let authority = Arc::new(RecordingAuthority::new());
            let service = ExpeditionService::new(authority.clone(), fetcher(authority.clone()));

            let err = service
                .start(ExpeditionPlan {
                    slot_id: 1,
                    duration_minutes: 30,
                    squad_ids: vec![],
                })
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::Domain(_)));
            assert!(authority.calls().is_empty());
        }
    }

    mod claim {
        use super::*;

        #[tokio::test]
        async fn surfaces_rewards_and_invalidates() {
            let authority = Arc::new(RecordingAuthority::new());
            authority
                .respond(
                    "/expeditions/slots",
                    ResponseResult::success(json!({ "slots": [] })),
                )
                .respond(
                    "/expeditions/active",
                    ResponseResult::success(json!({ "active": [] })),
                )
                .respond(
                    "/expeditions/claim",
                    ResponseResult::success(json!({
                        "id": 9, "claimed": true, "reward_gold": 150,
                        "reward_experience": 60, "finished_at": "2026-01-01T12:00:00Z"
                    })),
                );
            let fetcher = fetcher(authority.clone());
            let service = ExpeditionService::new(authority.clone(), fetcher.clone());

            service.overview().await.unwrap();
            let reward = service.claim(ExpeditionId::new(9)).await.unwrap();

            assert!(reward.claimed);
            assert_eq!(reward.reward_gold, 150);
            assert!(fetcher.store().get(StateDomain::Expeditions).await.needs_fetch());
        }

        #[tokio::test]
        async fn not_ready_is_a_server_error() {
            let authority = Arc::new(RecordingAuthority::new());
            authority.respond(
                "/expeditions/claim",
                ResponseResult::error(ErrorCode::BadRequest, "not_ready"),
            );
            let service = ExpeditionService::new(authority.clone(), fetcher(authority));

            let err = service.claim(ExpeditionId::new(3)).await.unwrap_err();
            assert!(matches!(
                err,
                ServiceError::ServerError { ref message, .. } if message == "not_ready"
            ));
        }
    }

    #[tokio::test]
    async fn cancel_reports_zero_rewards() {
        let authority = Arc::new(RecordingAuthority::new());
        authority.respond(
            "/expeditions/cancel",
            ResponseResult::success(json!({
                "id": 5, "cancelled": true, "reward_gold": 0, "reward_experience": 0
            })),
        );
        let service = ExpeditionService::new(authority.clone(), fetcher(authority));

        let cancelled = service.cancel(ExpeditionId::new(5)).await.unwrap();
        assert!(cancelled.cancelled);
        assert_eq!(cancelled.reward_gold, 0);
    }
}
