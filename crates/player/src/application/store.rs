//! Session state store
//!
//! One cached snapshot per state domain. Snapshots are replaced wholesale and
//! never patched; invalidation only flips freshness and keeps the last-known
//! value for display.
//!
//! Every fetch takes a per-domain sequence number before it goes out. When the
//! response comes back it is applied only if no later fetch (or direct update)
//! of the same domain has been applied in the meantime, so a slow response can
//! never overwrite a newer one. A response to a fetch issued before the last
//! invalidation is kept, but stays stale.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;

use delver_shared::dto::{
    DifficultyStatusData, EncounterData, ExpeditionsData, InventoryData, ProfileData, RosterData,
    ShopData,
};

use crate::ports::outbound::ClockPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StateDomain {
    Profile,
    Inventory,
    Shop,
    Roster,
    Expeditions,
    Difficulty,
    Encounter,
}

impl StateDomain {
    pub const ALL: [StateDomain; 7] = [
        StateDomain::Profile,
        StateDomain::Inventory,
        StateDomain::Shop,
        StateDomain::Roster,
        StateDomain::Expeditions,
        StateDomain::Difficulty,
        StateDomain::Encounter,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Cached payload of one domain.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainPayload {
    Profile(ProfileData),
    Inventory(InventoryData),
    Shop(ShopData),
    Roster(RosterData),
    Expeditions(ExpeditionsData),
    Difficulty(DifficultyStatusData),
    /// `None` while no encounter is running
    Encounter(Option<EncounterData>),
}

impl DomainPayload {
    pub fn domain(&self) -> StateDomain {
        match self {
            DomainPayload::Profile(_) => StateDomain::Profile,
            DomainPayload::Inventory(_) => StateDomain::Inventory,
            DomainPayload::Shop(_) => StateDomain::Shop,
            DomainPayload::Roster(_) => StateDomain::Roster,
            DomainPayload::Expeditions(_) => StateDomain::Expeditions,
            DomainPayload::Difficulty(_) => StateDomain::Difficulty,
            DomainPayload::Encounter(_) => StateDomain::Encounter,
        }
    }

    pub fn as_profile(&self) -> Option<&ProfileData> {
        match self {
            DomainPayload::Profile(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_inventory(&self) -> Option<&InventoryData> {
        match self {
            DomainPayload::Inventory(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_shop(&self) -> Option<&ShopData> {
        match self {
            DomainPayload::Shop(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_roster(&self) -> Option<&RosterData> {
        match self {
            DomainPayload::Roster(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_expeditions(&self) -> Option<&ExpeditionsData> {
        match self {
            DomainPayload::Expeditions(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_difficulty(&self) -> Option<&DifficultyStatusData> {
        match self {
            DomainPayload::Difficulty(d) => Some(d),
            _ => None,
        }
    }

    /// Outer `None`: not an encounter payload. Inner `None`: no encounter running.
    pub fn as_encounter(&self) -> Option<Option<&EncounterData>> {
        match self {
            DomainPayload::Encounter(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    payload: Arc<DomainPayload>,
    freshness: Freshness,
    fetched_at: DateTime<Utc>,
    sequence: u64,
}

impl Snapshot {
    pub fn payload(&self) -> &Arc<DomainPayload> {
        &self.payload
    }

    pub fn freshness(&self) -> Freshness {
        self.freshness
    }

    pub fn is_fresh(&self) -> bool {
        self.freshness == Freshness::Fresh
    }

    /// Time of the fetch that produced this payload
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Result of `SessionStateStore::get`.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Fresh(Snapshot),
    /// Last-known value; the caller must fetch
    Stale(Snapshot),
    Missing,
}

impl Lookup {
    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            Lookup::Fresh(s) | Lookup::Stale(s) => Some(s),
            Lookup::Missing => None,
        }
    }

    pub fn needs_fetch(&self) -> bool {
        !matches!(self, Lookup::Fresh(_))
    }
}

/// Sequence stamp taken before a fetch goes out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    domain: StateDomain,
    sequence: u64,
}

impl FetchTicket {
    pub fn domain(&self) -> StateDomain {
        self.domain
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    Applied(Snapshot),
    /// A later fetch of the same domain was applied first; the payload was dropped
    Superseded { latest: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("payload for {found:?} applied to a {expected:?} ticket")]
    DomainMismatch {
        expected: StateDomain,
        found: StateDomain,
    },
}

#[derive(Debug, Default)]
struct DomainSlot {
    snapshot: Option<Snapshot>,
    issued: u64,
    applied: u64,
    /// Tickets at or below this sequence went out before the last invalidation
    invalidated: u64,
}

impl DomainSlot {
    fn next_sequence(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    fn store(&mut self, payload: DomainPayload, sequence: u64, now: DateTime<Utc>) -> Snapshot {
        let freshness = if sequence > self.invalidated {
            Freshness::Fresh
        } else {
            Freshness::Stale
        };
        let snapshot = Snapshot {
            payload: Arc::new(payload),
            freshness,
            fetched_at: now,
            sequence,
        };
        self.applied = sequence;
        self.snapshot = Some(snapshot.clone());
        snapshot
    }
}

/// Sole owner of cached domain snapshots, shared as `Arc<SessionStateStore>`.
pub struct SessionStateStore {
    slots: [RwLock<DomainSlot>; 7],
    clock: Arc<dyn ClockPort>,
}

impl SessionStateStore {
    pub fn new(clock: Arc<dyn ClockPort>) -> Self {
        Self {
            slots: std::array::from_fn(|_| RwLock::new(DomainSlot::default())),
            clock,
        }
    }

    fn slot(&self, domain: StateDomain) -> &RwLock<DomainSlot> {
        &self.slots[domain.index()]
    }

    pub async fn get(&self, domain: StateDomain) -> Lookup {
        let slot = self.slot(domain).read().await;
        match &slot.snapshot {
            Some(s) if s.is_fresh() => Lookup::Fresh(s.clone()),
            Some(s) => Lookup::Stale(s.clone()),
            None => Lookup::Missing,
        }
    }

    /// Replace a domain snapshot outside the ticketed fetch path.
    ///
    /// Takes its own sequence number, so any fetch still in flight for the
    /// domain is superseded.
    pub async fn update(&self, payload: DomainPayload) -> Snapshot {
        let domain = payload.domain();
        let mut slot = self.slot(domain).write().await;
        let sequence = slot.next_sequence();
        tracing::debug!(domain = ?domain, sequence, "Snapshot replaced");
        slot.store(payload, sequence, self.clock.now())
    }

    /// Mark a domain stale, keeping the last-known value.
    ///
    /// Fetches already in flight still land, but their payload stays stale so
    /// the next `ensure` goes back to the authority.
    pub async fn invalidate(&self, domain: StateDomain) {
        let mut slot = self.slot(domain).write().await;
        if let Some(snapshot) = slot.snapshot.as_mut() {
            snapshot.freshness = Freshness::Stale;
        }
        slot.invalidated = slot.issued;
        tracing::debug!(domain = ?domain, floor = slot.invalidated, "Snapshot invalidated");
    }

    pub async fn invalidate_all(&self, domains: &[StateDomain]) {
        for domain in domains {
            self.invalidate(*domain).await;
        }
    }

    pub async fn begin_fetch(&self, domain: StateDomain) -> FetchTicket {
        let mut slot = self.slot(domain).write().await;
        FetchTicket {
            domain,
            sequence: slot.next_sequence(),
        }
    }

    /// Apply a fetched payload unless a later one for the same domain won.
    pub async fn apply_fetched(
        &self,
        ticket: FetchTicket,
        payload: DomainPayload,
    ) -> Result<ApplyOutcome, StoreError> {
        if payload.domain() != ticket.domain {
            return Err(StoreError::DomainMismatch {
                expected: ticket.domain,
                found: payload.domain(),
            });
        }

        let mut slot = self.slot(ticket.domain).write().await;
        if ticket.sequence < slot.applied {
            tracing::debug!(
                domain = ?ticket.domain,
                sequence = ticket.sequence,
                latest = slot.applied,
                "Discarding superseded response"
            );
            return Ok(ApplyOutcome::Superseded {
                latest: slot.applied,
            });
        }
        Ok(ApplyOutcome::Applied(slot.store(
            payload,
            ticket.sequence,
            self.clock.now(),
        )))
    }
}
