//! Room import tests

use anwesende_core::{
    clock::Clock,
    models::Seat,
    repository::{Store, StoreTx},
    AppError,
};
use chrono::Duration;
use tokio_test::assert_err;

use crate::common::{rooms1, rooms2, sheet_row, Harness};

#[tokio::test]
async fn test_import_counts_new_then_existing() {
    let h = Harness::new();
    let step1 = h.services.imports.import(&rooms1(), "user1").await.unwrap();
    assert_eq!(step1.num_existing_rooms, 0);
    assert_eq!(step1.num_existing_seats, 0);
    assert_eq!(step1.num_new_rooms, 2);
    assert_eq!(step1.num_new_seats, 20);

    h.clock.advance(Duration::minutes(10));
    let step2 = h.services.imports.import(&rooms2(), "user1").await.unwrap();
    assert_eq!(step2.num_existing_rooms, 1);
    assert_eq!(step2.num_existing_seats, 6);
    assert_eq!(step2.num_new_rooms, 0);
    assert_eq!(step2.num_new_seats, 2);

    let seats = h.store.seats_of_importstep(step2.id).await.unwrap();
    assert_eq!(seats.len(), 8);
    let updated = h.store.placed_seat(seats[0].id).await.unwrap();
    assert_eq!(updated.room.room, "K40");
    assert_eq!(updated.seat.seatname(), "r1s1");
    assert!((updated.room.row_dist - 1.2).abs() < 0.0001); // no longer 1.1
    assert_eq!(updated.room.seat_last, "r2s4");
    assert_eq!(updated.room.created_importstep_id, step1.id);
    assert_eq!(updated.room.importstep_id, step2.id);
}

#[tokio::test]
async fn test_reimport_unchanged_sheet_only_counts_existing() {
    let h = Harness::new();
    let step1 = h.services.imports.import(&rooms1(), "user1").await.unwrap();
    let hashes1: Vec<String> = h
        .store
        .seats_of_importstep(step1.id)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.hash)
        .collect();

    let step2 = h.services.imports.import(&rooms1(), "user2").await.unwrap();
    assert_eq!(step2.num_new_rooms, 0);
    assert_eq!(step2.num_new_seats, 0);
    assert_eq!(step2.num_existing_rooms, 2);
    assert_eq!(step2.num_existing_seats, 20);

    let hashes2: Vec<String> = h
        .store
        .seats_of_importstep(step2.id)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.hash)
        .collect();
    assert_eq!(hashes1, hashes2);
}

#[tokio::test]
async fn test_seat_hashes_are_unique_and_resolvable() {
    let h = Harness::new();
    let step = h.services.imports.import(&rooms1(), "user1").await.unwrap();
    let seats = h.store.seats_of_importstep(step.id).await.unwrap();
    let mut hashes: Vec<&str> = seats.iter().map(|s| s.hash.as_str()).collect();
    hashes.sort_unstable();
    hashes.dedup();
    assert_eq!(hashes.len(), 20);
    for seat in &seats {
        assert_eq!(h.store.seat_by_hash(&seat.hash).await.unwrap().as_ref(), Some(seat));
    }
}

#[tokio::test]
async fn test_bad_row_aborts_whole_import() {
    let h = Harness::new();
    let mut rows = rooms1();
    rows.push(sheet_row("fu", "mi", "K48", "1.1", "0.8", "r2x3"));
    let err = h.services.imports.import(&rows, "user1").await.unwrap_err();
    match err {
        AppError::ImportFormat(msg) => assert!(msg.starts_with("row 4:"), "{}", msg),
        other => panic!("unexpected error {:?}", other),
    }

    let mut rows = rooms1();
    rows.insert(1, sheet_row("fu", "mi", "K48", "one", "0.8", "r2s3"));
    assert_err!(h.services.imports.import(&rows, "user1").await);

    let since = h.clock.now() - Duration::days(365);
    assert!(h.store.importsteps_since(since).await.unwrap().is_empty());
    assert!(h.store.usage_statistics().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failure_inside_transaction_leaves_nothing() {
    let h = Harness::new();
    h.services.imports.import(&rooms1(), "user1").await.unwrap();

    // Occupy the hash K40/r2s4 will need, so the second import fails midway
    let key = rooms2()[0].parse(2).unwrap().0;
    let clash = Seat::seathash(&key, "r2s4", 10);
    {
        let mut tx = h.store.begin().await.unwrap();
        let k46 = tx
            .room_by_key(&rooms1()[1].parse(3).unwrap().0)
            .await
            .unwrap()
            .unwrap();
        let victim = tx.seat_at(k46.id, 1, 1).await.unwrap().unwrap();
        tx.rehash_seat(victim.id, &clash).await.unwrap();
        tx.commit().await.unwrap();
    }

    let err = h.services.imports.import(&rooms2(), "user1").await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let since = h.clock.now() - Duration::days(1);
    let steps = h.store.importsteps_since(since).await.unwrap();
    assert_eq!(steps.len(), 1);
    let k40 = h.store.placed_seat(h.store.seats_of_importstep(steps[0].id).await.unwrap()[0].id)
        .await
        .unwrap();
    assert_eq!(k40.room.room, "K40");
    assert!((k40.room.row_dist - 1.1).abs() < 0.0001);
    assert_eq!(k40.room.seat_last, "r2s3");
}

#[tokio::test]
async fn test_seats_of_importstep_ordered_by_position() {
    let h = Harness::new();
    let seats = h.make_seats("room1", 3).await;
    let names: Vec<String> = seats.iter().map(Seat::seatname).collect();
    assert_eq!(names, vec!["r1s1", "r1s2", "r1s3"]);
}
