//! PgStore tests against a live database
//!
//! Run with: DATABASE_URL=postgres://... cargo test -- --ignored
//! Every test works on its own organization, so they can share a database.

use std::sync::Arc;

use anwesende_core::{
    clock::{Clock, FixedClock},
    config::{AppConfig, DatabaseConfig},
    models::{Seat, VisitSearch},
    repository::{PgStore, Store},
    services::Services,
    AppState,
};
use chrono::{DateTime, Duration, Utc};

use crate::common::{sheet_row, visit_form};

struct PgHarness {
    store: PgStore,
    clock: Arc<FixedClock>,
    services: Services,
    org: String,
}

impl PgHarness {
    async fn new(tag: &str) -> Self {
        let database = DatabaseConfig {
            url: std::env::var("DATABASE_URL").unwrap_or_else(|_| DatabaseConfig::default().url),
            ..DatabaseConfig::default()
        };
        let store = PgStore::connect(&database).await.expect("Failed to connect to database");
        store.migrate().await.expect("Failed to run migrations");
        let now = Utc::now();
        let clock = Arc::new(FixedClock::new(now));
        let services = Services::new(
            Arc::new(store.clone()),
            clock.clone() as Arc<dyn Clock>,
            &AppConfig::default(),
        );
        let org = format!("{}-{}", tag, now.timestamp_nanos_opt().unwrap_or_default());
        Self {
            store,
            clock,
            services,
            org,
        }
    }

    fn at(&self, minutes: i64) -> DateTime<Utc> {
        self.clock.now() + Duration::minutes(minutes)
    }

    async fn seats(&self, room: &str, seat_last: &str) -> Vec<Seat> {
        let row = sheet_row(&self.org, "dep", room, "1.3", "0.8", seat_last);
        let step = self.services.imports.import(&[row], "user1").await.unwrap();
        self.store.seats_of_importstep(step.id).await.unwrap()
    }
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_pg_import_counts_and_importsteps() {
    let h = PgHarness::new("import").await;
    let rows = vec![
        sheet_row(&h.org, "mi", "K40", "1.1", "0.9", "r2s3"),
        sheet_row(&h.org, "mi", "K46", "1.4", "0.8", "r2s7"),
    ];
    let step1 = h.services.imports.import(&rows, "user1").await.unwrap();
    assert_eq!((step1.num_new_rooms, step1.num_new_seats), (2, 20));

    let rows2 = vec![sheet_row(&h.org, "mi", "K40", "1.2", "0.9", "r2s4")];
    let step2 = h.services.imports.import(&rows2, "user2").await.unwrap();
    assert_eq!((step2.num_existing_rooms, step2.num_existing_seats), (1, 6));
    assert_eq!(step2.num_new_seats, 2);

    let steps = h.store.importsteps_since(h.at(-1)).await.unwrap();
    let mine: Vec<_> = steps
        .iter()
        .filter(|s| s.id == step1.id || s.id == step2.id)
        .collect();
    assert_eq!(mine.len(), 2);
    assert_eq!(mine[1].user, "user2");
    assert_eq!(h.store.count_seats_of_importstep(step1.id).await.unwrap(), 14);
    assert_eq!(h.store.count_seats_of_importstep(step2.id).await.unwrap(), 8);

    let seats = h.store.seats_of_importstep(step2.id).await.unwrap();
    let placed = h.store.placed_seat(seats[0].id).await.unwrap();
    assert_eq!(placed.room.created_importstep_id, step1.id);
    assert_eq!(placed.room.importstep_id, step2.id);
    assert_eq!(placed.seat.seatname(), "r1s1");
}

#[tokio::test]
#[ignore]
async fn test_pg_visits_search_and_usage() {
    let h = PgHarness::new("visits").await;
    let seats = h.seats("K40", "r1s3").await;
    let room = seats[0].room_id;
    let contacts = &h.services.contacts;
    let visits = &h.services.visits;

    let form = |person: &str, from: i64, to: i64| visit_form(person, h.at(from), h.at(to));
    let target = visits.submit_visit(&seats[0].hash, &form("anna", 0, 60)).await.unwrap();
    let near = visits.submit_visit(&seats[1].hash, &form("anton", 20, 80)).await.unwrap();
    visits.submit_visit(&seats[2].hash, &form("bert", 60, 120)).await.unwrap();

    let found = contacts.overlapping_visits(&target).await.unwrap();
    let mut ids: Vec<i64> = found.iter().map(|v| v.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![target.id, near.id]);
    assert_eq!(contacts.occupant_count_at(room, h.at(30)).await.unwrap(), 2);
    assert_eq!(contacts.occupant_count_at(room, h.at(60)).await.unwrap(), 2);

    let filter = VisitSearch {
        organization: h.org.to_uppercase(),
        givenname: "an%".into(),
        ..VisitSearch::window(h.at(-10), h.at(200))
    };
    let result = visits.search_visits(&filter).await.unwrap();
    let ids: Vec<i64> = result.items.iter().map(|v| v.id).collect();
    assert_eq!(ids, vec![target.id, near.id]);

    let usage = h.services.stats.usage_statistics().await.unwrap();
    let mine: Vec<_> = usage.iter().filter(|u| u.organization == h.org).collect();
    assert_eq!(mine.len(), 1);
    assert_eq!((mine[0].rooms, mine[0].seats, mine[0].visits), (1, 3, 3));
    assert!(usage.iter().all(|u| u.organization != "---"));
}

#[tokio::test]
#[ignore]
async fn test_pg_reversed_sheets_import_concurrently() {
    let h = PgHarness::new("locks").await;
    let x = sheet_row(&h.org, "dep", "X", "1.1", "0.8", "r3s3");
    let y = sheet_row(&h.org, "dep", "Y", "1.1", "0.8", "r3s3");
    let forward = [x.clone(), y.clone()];
    let backward = [y, x];
    for _ in 0..10 {
        let (a, b) = tokio::join!(
            h.services.imports.import(&forward, "user1"),
            h.services.imports.import(&backward, "user2"),
        );
        a.unwrap();
        b.unwrap();
    }
}

#[tokio::test]
#[ignore]
async fn test_pg_dummy_seat_survives_restart() {
    let h = PgHarness::new("dummy").await;
    let init = || {
        AppState::init(
            AppConfig::default(),
            Arc::new(h.store.clone()),
            h.clock.clone() as Arc<dyn Clock>,
        )
    };
    let first = init().await.unwrap();
    let second = init().await.unwrap();
    assert_eq!(first.dummy_seat.seat(), second.dummy_seat.seat());
    assert_eq!(second.dummy_seat.room().organization, "---");
}
