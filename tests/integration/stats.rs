//! Import history and usage statistics tests

use std::sync::Arc;

use anwesende_core::{clock::Clock, config::AppConfig, models::UsageStatistic, AppState};
use chrono::Duration;

use crate::common::{rooms1, rooms2, sheet_row, Harness};

fn qrcodes(steps: &[anwesende_core::models::ImportstepWithStats]) -> Vec<(i64, i64)> {
    steps
        .iter()
        .map(|s| (s.num_qrcodes, s.num_qrcodes_moved))
        .collect()
}

#[tokio::test]
async fn test_displayable_importsteps() {
    let h = Harness::new();
    let stats = &h.services.stats;
    let step1 = h.services.imports.import(&rooms1(), "user1").await.unwrap();
    let steps = stats.displayable_importsteps(Duration::days(1)).await.unwrap();
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].step.id, step1.id);
    assert_eq!(qrcodes(&steps), vec![(20, 0)]);

    h.clock.advance(Duration::minutes(1));
    let step2 = h.services.imports.import(&rooms2(), "user1").await.unwrap();
    let steps = stats.displayable_importsteps(Duration::days(1)).await.unwrap();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0].step.id, step1.id);
    assert_eq!(steps[1].step.id, step2.id);
    assert_eq!(qrcodes(&steps), vec![(14, 6), (8, 0)]);
}

#[tokio::test]
async fn test_moved_qrcodes_follow_rooms_to_latest_import() {
    let h = Harness::new();
    h.services.imports.import(&rooms1(), "user1").await.unwrap();
    h.clock.advance(Duration::minutes(1));
    h.services.imports.import(&rooms2(), "user1").await.unwrap();
    h.clock.advance(Duration::minutes(1));
    h.services.imports.import(&rooms2(), "user2").await.unwrap();

    let steps = h.services.stats.recent_importsteps().await.unwrap();
    assert_eq!(qrcodes(&steps), vec![(14, 6), (0, 8), (8, 0)]);
    assert_eq!(steps[2].step.user, "user2");
    assert_eq!(steps[2].step.num_existing_seats, 8);
}

#[tokio::test]
async fn test_room_named_twice_in_one_sheet_is_not_moved() {
    let h = Harness::new();
    let sheet = vec![
        sheet_row("fu", "mi", "K40", "1.1", "0.9", "r1s2"),
        sheet_row("fu", "mi", "K40", "1.1", "0.9", "r1s3"),
    ];
    let step = h.services.imports.import(&sheet, "user1").await.unwrap();
    assert_eq!((step.num_new_seats, step.num_existing_seats), (3, 0));

    let steps = h.services.stats.displayable_importsteps(Duration::days(1)).await.unwrap();
    assert_eq!(qrcodes(&steps), vec![(3, 0)]);
}

#[tokio::test]
async fn test_lookback_excludes_old_importsteps() {
    let h = Harness::new();
    h.services.imports.import(&rooms1(), "user1").await.unwrap();
    h.clock.advance(Duration::days(2));
    let recent = h.services.imports.import(&rooms2(), "user1").await.unwrap();

    let steps = h.services.stats.displayable_importsteps(Duration::days(1)).await.unwrap();
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].step.id, recent.id);
    assert_eq!(steps[0].step.when, h.clock.now());

    let steps = h.services.stats.recent_importsteps().await.unwrap();
    assert_eq!(steps.len(), 2);
}

#[tokio::test]
async fn test_usage_statistics() {
    let h = Harness::new();
    let layout = [
        ("org1", "dep1", "room1", 1, 1),
        ("org1", "dep1", "room2", 2, 2),
        ("org1", "dep2", "room3", 3, 4),
        ("org2", "dep3", "room4", 4, 9),
        ("org2", "dep3", "room5", 5, 16),
    ];
    let mut person = 0;
    for (org, dep, room, numseats, numvisits) in layout {
        let seats = h.make_seats_in(org, dep, room, numseats).await;
        for i in 0..numvisits {
            person += 1;
            let seat = &seats[i % seats.len()];
            h.make_visit(seat, &format!("p{}", person), "03:00", "04:00").await;
        }
    }

    let stats = h.services.stats.usage_statistics().await.unwrap();
    let rows: Vec<(&str, &str, i64, i64, i64)> = stats
        .iter()
        .map(|s: &UsageStatistic| {
            (
                s.organization.as_str(),
                s.department.as_str(),
                s.rooms,
                s.seats,
                s.visits,
            )
        })
        .collect();
    assert_eq!(
        rows,
        vec![
            ("org1", "dep1", 2, 3, 3),
            ("org1", "dep2", 1, 3, 4),
            ("org2", "dep3", 2, 9, 25),
        ]
    );
}

#[tokio::test]
async fn test_usage_statistics_leave_out_dummy_seat() {
    let h = Harness::new();
    let state = AppState::init(
        AppConfig::default(),
        Arc::new(h.store.clone()),
        h.clock.clone() as Arc<dyn Clock>,
    )
    .await
    .unwrap();
    h.make_seats("room1", 2).await;

    let stats = state.services.stats.usage_statistics().await.unwrap();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].organization, "org");
    assert_eq!(stats[0].seats, 2);
}
