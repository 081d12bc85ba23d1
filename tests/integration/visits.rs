//! Visit registration and search tests

use std::sync::Arc;

use anwesende_core::{
    clock::Clock,
    config::{AppConfig, ReportingConfig},
    models::{RoomKey, VisitSearch},
    repository::Store,
    AppError, AppState,
};

use crate::common::{visit_form, Harness};

#[tokio::test]
async fn test_submit_visit_records_submission_time() {
    let h = Harness::new();
    let seat = &h.make_seats("room1", 1).await[0];
    let visit = h.make_visit(seat, "p1", "03:00", "04:00").await;
    assert_eq!(visit.seat_id, seat.id);
    assert_eq!(visit.submission_dt, h.clock.now());
    assert_eq!(h.store.visit(visit.id).await.unwrap(), visit);
}

#[tokio::test]
async fn test_submit_visit_rejects_bad_input() {
    let h = Harness::new();
    let seat = &h.make_seats("room1", 1).await[0];
    let visits = &h.services.visits;

    let form = visit_form("p1", h.at("03:00"), h.at("04:00"));
    let err = visits.submit_visit("nosuchhash", &form).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let reversed = visit_form("p1", h.at("04:00"), h.at("03:00"));
    let err = visits.submit_visit(&seat.hash, &reversed).await.unwrap_err();
    assert!(matches!(err, AppError::PreconditionViolation(_)));

    let empty = visit_form("p1", h.at("03:00"), h.at("03:00"));
    let err = visits.submit_visit(&seat.hash, &empty).await.unwrap_err();
    assert!(matches!(err, AppError::PreconditionViolation(_)));

    let mut bad_email = form.clone();
    bad_email.email = "not-an-address".into();
    let err = visits.submit_visit(&seat.hash, &bad_email).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let since = h.at("00:00");
    let found = visits
        .search_visits(&VisitSearch::window(since, h.at("23:59")))
        .await
        .unwrap();
    assert!(found.items.is_empty());
}

#[tokio::test]
async fn test_walk_in_visit_uses_dummy_seat() {
    let h = Harness::new();
    let state = AppState::init(
        AppConfig::default(),
        Arc::new(h.store.clone()),
        h.clock.clone() as Arc<dyn Clock>,
    )
    .await
    .unwrap();
    assert_eq!(state.dummy_seat.room().key(), RoomKey::dummy());
    assert_eq!(state.dummy_seat.seat().seatname(), "r1s1");

    let form = visit_form("p1", h.at("03:00"), h.at("04:00"));
    let visit = state
        .services
        .visits
        .submit_walk_in(&state.dummy_seat, &form)
        .await
        .unwrap();
    assert_eq!(visit.seat_id, state.dummy_seat.seat().id);

    // a second startup finds the same seat
    let again = AppState::init(
        AppConfig::default(),
        Arc::new(h.store.clone()),
        h.clock.clone() as Arc<dyn Clock>,
    )
    .await
    .unwrap();
    assert_eq!(again.dummy_seat.seat(), state.dummy_seat.seat());
}

#[tokio::test]
async fn test_search_visits_by_pattern() {
    let h = Harness::new();
    let k40 = h.make_seats_in("fu", "mi", "K40", 2).await;
    let k46 = h.make_seats_in("fu", "mi", "K46", 1).await;
    let early = h.make_visit(&k40[0], "anna", "03:00", "04:00").await;
    let late = h.make_visit(&k40[1], "anton", "05:00", "06:00").await;
    let other = h.make_visit(&k46[0], "bert", "03:00", "04:00").await;
    let visits = &h.services.visits;

    let mut filter = VisitSearch::window(h.at("00:00"), h.at("23:59"));
    filter.givenname = "AN%".into();
    let found = visits.search_visits(&filter).await.unwrap();
    let ids: Vec<i64> = found.items.iter().map(|v| v.id).collect();
    assert_eq!(ids, vec![early.id, late.id]);

    filter.givenname = "%".into();
    filter.room = "k46".into();
    let found = visits.search_visits(&filter).await.unwrap();
    assert_eq!(found.items, vec![other]);

    // (04:00, 05:00) touches both K40 visits but overlaps neither
    let filter = VisitSearch {
        room: "K4_".into(),
        ..VisitSearch::window(h.at("04:00"), h.at("05:00"))
    };
    assert!(visits.search_visits(&filter).await.unwrap().items.is_empty());
}

#[tokio::test]
async fn test_search_visits_truncates_at_limit() {
    let config = AppConfig {
        reporting: ReportingConfig {
            visit_limit: 2,
            ..ReportingConfig::default()
        },
        ..AppConfig::default()
    };
    let h = Harness::with_config(config);
    let seat = &h.make_seats("room1", 1).await[0];
    for person in ["p1", "p2", "p3"] {
        h.make_visit(seat, person, "03:00", "04:00").await;
    }
    let found = h
        .services
        .visits
        .search_visits(&VisitSearch::window(h.at("00:00"), h.at("23:59")))
        .await
        .unwrap();
    assert_eq!(found.items.len(), 2);
    assert_eq!(found.num_results, 3);
    assert!(found.too_many_results());
}
