//! Contact tracing queries: overlapping visits, room occupancy, visit groups

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::{
    clock::Clock,
    config::{ContactsConfig, ReportingConfig},
    error::{AppError, AppResult},
    models::{ContactVisit, PlacedSeat, Visit, VisitSearch, VisitSearchResult, Visitor},
    repository::Repository,
};

#[derive(Clone)]
pub struct ContactService {
    repository: Repository,
    clock: Arc<dyn Clock>,
    min_overlap: Duration,
    visitgroup_limit: usize,
}

impl ContactService {
    pub fn new(
        repository: Repository,
        clock: Arc<dyn Clock>,
        contacts: ContactsConfig,
        reporting: ReportingConfig,
    ) -> Self {
        Self {
            repository,
            clock,
            min_overlap: Duration::minutes(contacts.min_overlap_minutes.max(0)),
            visitgroup_limit: reporting.visitgroup_limit,
        }
    }

    /// Visits in the same room whose presence overlaps `visit`'s, `visit` included.
    ///
    /// Touching intervals do not overlap, and the shared time must last at least
    /// the configured minimum overlap.
    pub async fn overlapping_visits(&self, visit: &Visit) -> AppResult<HashSet<Visit>> {
        if visit.present_from_dt >= visit.present_to_dt {
            return Err(AppError::PreconditionViolation(format!(
                "visit {} ends before it starts",
                visit.id
            )));
        }
        let seat = self.repository.placed_seat(visit.seat_id).await?;
        let candidates = self
            .repository
            .visits_in_room_between(seat.room.id, visit.present_from_dt, visit.present_to_dt)
            .await?;
        Ok(candidates
            .into_iter()
            .filter(|other| visit.overlaps(other, self.min_overlap))
            .collect())
    }

    pub async fn overlapping_visits_of(&self, visit_id: i64) -> AppResult<HashSet<Visit>> {
        let visit = self.repository.visit(visit_id).await?;
        self.overlapping_visits(&visit).await
    }

    /// Visit rows of everybody present in the room at `at`
    pub async fn occupant_visits_at(&self, room_id: i64, at: DateTime<Utc>) -> AppResult<Vec<Visit>> {
        let visits = self.repository.visits_in_room_at(room_id, at).await?;
        Ok(visits.into_iter().filter(|v| v.is_present_at(at)).collect())
    }

    /// Distinct people present in the room at `at`, by email, sorted by email.
    ///
    /// A person with several visit rows (e.g. after changing seats) appears once,
    /// with the seat of the most recently started row.
    pub async fn occupants_at(&self, room_id: i64, at: DateTime<Utc>) -> AppResult<Vec<Visitor>> {
        let mut latest: BTreeMap<String, Visit> = BTreeMap::new();
        for visit in self.occupant_visits_at(room_id, at).await? {
            let identity = visit.email.trim().to_lowercase();
            match latest.get(&identity) {
                Some(seen) if seen.present_from_dt >= visit.present_from_dt => {}
                _ => {
                    latest.insert(identity, visit);
                }
            }
        }
        Ok(latest.values().map(Visit::visitor).collect())
    }

    pub async fn occupant_count_at(&self, room_id: i64, at: DateTime<Utc>) -> AppResult<usize> {
        Ok(self.occupants_at(room_id, at).await?.len())
    }

    pub async fn current_occupants(&self, room_id: i64) -> AppResult<Vec<Visitor>> {
        self.occupants_at(room_id, self.clock.now()).await
    }

    pub async fn current_occupant_count(&self, room_id: i64) -> AppResult<usize> {
        self.occupant_count_at(room_id, self.clock.now()).await
    }

    /// For every visit, the visits overlapping it with their distance to its seat.
    ///
    /// Groups keep the order of `visits`; within a group contacts are sorted by
    /// distance, then arrival. Repeated visits form one group only.
    pub async fn collect_visitgroups(&self, visits: &[Visit]) -> AppResult<Vec<ContactVisit>> {
        let mut seats: HashMap<i64, PlacedSeat> = HashMap::new();
        let mut done: HashSet<i64> = HashSet::new();
        let mut result = Vec::new();
        for target in visits {
            if !done.insert(target.id) {
                continue;
            }
            let target_seat = self.cached_seat(&mut seats, target.seat_id).await?;
            let mut group = Vec::new();
            for contact in self.overlapping_visits(target).await? {
                let contact_seat = self.cached_seat(&mut seats, contact.seat_id).await?;
                group.push(ContactVisit {
                    target_id: target.id,
                    distance_m: target_seat.distance_in_m(&contact_seat)?,
                    room_descriptor: contact_seat.room.descriptor(),
                    seatname: contact_seat.seat.seatname(),
                    visit: contact,
                });
            }
            group.sort_by(|a, b| {
                a.distance_m
                    .total_cmp(&b.distance_m)
                    .then(a.visit.present_from_dt.cmp(&b.visit.present_from_dt))
                    .then(a.visit.id.cmp(&b.visit.id))
            });
            result.extend(group);
        }
        Ok(result)
    }

    /// Search visits and expand each hit into its visit group
    pub async fn search_visitgroups(
        &self,
        filter: &VisitSearch,
    ) -> AppResult<VisitSearchResult<ContactVisit>> {
        let visits = self.repository.search_visits(filter).await?;
        let groups = self.collect_visitgroups(&visits).await?;
        Ok(VisitSearchResult::truncated(groups, self.visitgroup_limit))
    }

    async fn cached_seat(
        &self,
        seats: &mut HashMap<i64, PlacedSeat>,
        seat_id: i64,
    ) -> AppResult<PlacedSeat> {
        if let Some(seat) = seats.get(&seat_id) {
            return Ok(seat.clone());
        }
        let seat = self.repository.placed_seat(seat_id).await?;
        seats.insert(seat_id, seat.clone());
        Ok(seat)
    }
}
