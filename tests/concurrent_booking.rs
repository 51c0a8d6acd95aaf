use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::Barrier;

use innkeep::config::Config;
use innkeep::engine::{BookingError, Ledger};
use innkeep::model::{BookingDraft, BookingFilter, Event};

// ── Test infrastructure ──────────────────────────────────────

fn date(s: &str) -> NaiveDate {
    innkeep::engine::parse_date(s).unwrap()
}

fn draft(room: &str, check_in: &str, check_out: &str, guest: &str) -> BookingDraft {
    BookingDraft {
        room_id: room.into(),
        check_in: date(check_in),
        check_out: date(check_out),
        guest_name: guest.into(),
        guests: 2,
        amount: 2500.0,
        advance: 500.0,
    }
}

fn ledger() -> Arc<Ledger> {
    let config = Config {
        admin_id: Some("admin".into()),
        ..Config::default()
    };
    Arc::new(Ledger::new(config))
}

// ── Tests ────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_identical_bookings_admit_exactly_one() {
    let ledger = ledger();
    let writers = 16;
    let barrier = Arc::new(Barrier::new(writers));

    let mut handles = Vec::new();
    for i in 0..writers {
        let ledger = ledger.clone();
        let barrier = barrier.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            ledger
                .create_booking(draft("101", "2025-06-05", "2025-06-07", &format!("guest {i}")))
                .await
        }));
    }

    let mut admitted = Vec::new();
    let mut conflicts = 0;
    for h in handles {
        match h.await.unwrap() {
            Ok(b) => admitted.push(b),
            Err(BookingError::Conflict(_)) => conflicts += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(admitted.len(), 1);
    assert_eq!(conflicts, writers - 1);
    assert_eq!(ledger.room_bookings("101").await, admitted);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_overlapping_stays_never_double_book() {
    let ledger = ledger();
    let barrier = Arc::new(Barrier::new(10));

    // Ten two-night stays starting on consecutive days: neighbours overlap.
    let mut handles = Vec::new();
    for day in 0..10u32 {
        let ledger = ledger.clone();
        let barrier = barrier.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            let check_in = format!("2025-06-{:02}", day + 1);
            let check_out = format!("2025-06-{:02}", day + 3);
            ledger
                .create_booking(draft("102", &check_in, &check_out, "walk-in"))
                .await
        }));
    }
    for h in handles {
        let _ = h.await.unwrap();
    }

    let stored = ledger.room_bookings("102").await;
    assert!(!stored.is_empty());
    for pair in stored.windows(2) {
        assert!(pair[0].check_out <= pair[1].check_in, "{pair:?}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn different_rooms_book_in_parallel() {
    let ledger = ledger();
    let rooms = ["101", "102", "103", "104", "105", "conference"];

    let mut handles = Vec::new();
    for room in rooms {
        let ledger = ledger.clone();
        handles.push(tokio::spawn(async move {
            ledger
                .create_booking(draft(room, "2025-06-05", "2025-06-07", "group"))
                .await
        }));
    }
    for h in handles {
        h.await.unwrap().unwrap();
    }
    let all = ledger.list_bookings(&BookingFilter::default()).await;
    assert_eq!(all.len(), rooms.len());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn opposite_moves_between_rooms_do_not_deadlock() {
    let ledger = ledger();
    let rooms = ["101", "102"];
    let x = ledger
        .create_booking(draft(rooms[0], "2025-06-01", "2025-06-03", "x"))
        .await
        .unwrap();
    let y = ledger
        .create_booking(draft(rooms[1], "2025-06-10", "2025-06-12", "y"))
        .await
        .unwrap();

    for round in 0..50usize {
        let (x_to, y_to) = (rooms[(round + 1) % 2], rooms[round % 2]);
        let barrier = Arc::new(Barrier::new(2));

        let (l1, b1) = (ledger.clone(), barrier.clone());
        let move_x = tokio::spawn(async move {
            b1.wait().await;
            l1.update_booking(x.id, draft(x_to, "2025-06-01", "2025-06-03", "x")).await
        });
        let (l2, b2) = (ledger.clone(), barrier.clone());
        let move_y = tokio::spawn(async move {
            b2.wait().await;
            l2.update_booking(y.id, draft(y_to, "2025-06-10", "2025-06-12", "y")).await
        });

        let both = tokio::time::timeout(Duration::from_secs(5), async {
            (move_x.await.unwrap(), move_y.await.unwrap())
        })
        .await
        .expect("opposite moves deadlocked");
        both.0.unwrap();
        both.1.unwrap();

        assert_eq!(ledger.get_room_for_booking(&x.id).as_deref(), Some(x_to));
        assert_eq!(ledger.get_room_for_booking(&y.id).as_deref(), Some(y_to));
    }
    assert_eq!(ledger.booking_count(), 2);
    assert_eq!(ledger.room_bookings("101").await.len(), 1);
    assert_eq!(ledger.room_bookings("102").await.len(), 1);
}

#[tokio::test]
async fn edit_then_delete_flow() {
    let ledger = ledger();
    let mut feed = ledger.subscribe();

    let b = ledger
        .create_booking(draft("104", "2025-07-01", "2025-07-03", "Meera"))
        .await
        .unwrap();
    let edited = ledger
        .update_booking(b.id, draft("104", "2025-07-01", "2025-07-04", "Meera"))
        .await
        .unwrap();
    ledger.delete_booking("admin", b.id).await.unwrap();

    assert!(matches!(feed.recv().await.unwrap(), Event::BookingCreated(_)));
    assert!(matches!(feed.recv().await.unwrap(), Event::BookingUpdated { booking, .. } if booking == edited));
    assert!(matches!(feed.recv().await.unwrap(), Event::BookingDeleted { id, .. } if id == b.id));
    assert_eq!(ledger.booking_count(), 0);
}
