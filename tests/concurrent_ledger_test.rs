// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Concurrent ledger operations against one shoe.
//!
//! Every counter change is a relative UPDATE inside an immediate
//! transaction, so no increment may be lost when many requests race.

use mileage_tracker::db::shoes::find_mileage_drift;
use mileage_tracker::models::{Km, RunChanges};

mod common;

const NUM_CONCURRENT_RUNS: i64 = 12;
const RUN_DISTANCE: i64 = 525;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_links_to_same_shoe() {
    let (_app, state, _dir) = common::create_test_app();
    let user = common::seed_user(&state, "race@example.com").await;
    let shoe = common::seed_shoe(&state, &user, "Mach 6").await;

    let mut run_ids = Vec::new();
    for i in 0..NUM_CONCURRENT_RUNS {
        let local = format!("2025-07-{:02} 06:00", i + 1);
        run_ids.push(common::seed_run(&state, &user, &local, RUN_DISTANCE).await.id);
    }

    let mut handles = vec![];
    for run_id in run_ids.clone() {
        let state = state.clone();
        let (user, shoe_id) = (user.clone(), shoe.id.clone());
        handles.push(tokio::spawn(async move {
            state.ledger.link(&user, &shoe_id, &run_id).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().expect("link should succeed");
    }

    let shoes = state.shoes.list(&user).await.unwrap();
    assert_eq!(
        shoes[0].total_mileage,
        Km::from_hundredths(NUM_CONCURRENT_RUNS * RUN_DISTANCE)
    );

    // Concurrent distance edits on runs sharing the shoe
    let mut handles = vec![];
    for run_id in run_ids {
        let state = state.clone();
        let user = user.clone();
        handles.push(tokio::spawn(async move {
            state
                .runs
                .update(
                    &user,
                    &run_id,
                    RunChanges {
                        distance: Some(Km::from_hundredths(RUN_DISTANCE + 100)),
                        ..Default::default()
                    },
                )
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().expect("update should succeed");
    }

    let shoes = state.shoes.list(&user).await.unwrap();
    assert_eq!(
        shoes[0].total_mileage,
        Km::from_hundredths(NUM_CONCURRENT_RUNS * (RUN_DISTANCE + 100))
    );

    let drift = state
        .db
        .read(move |conn| find_mileage_drift(conn, &user))
        .await
        .unwrap();
    assert!(drift.is_empty(), "mileage drift: {drift:?}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_moves_between_two_shoes() {
    let (_app, state, _dir) = common::create_test_app();
    let user = common::seed_user(&state, "shuffle@example.com").await;
    let shoe_a = common::seed_shoe(&state, &user, "Kinvara").await;
    let shoe_b = common::seed_shoe(&state, &user, "Triumph").await;
    let run = common::seed_run(&state, &user, "2025-07-14 06:00", 1000).await;

    let mut handles = vec![];
    for i in 0..10 {
        let state = state.clone();
        let user = user.clone();
        let run_id = run.id.clone();
        let target = if i % 2 == 0 { shoe_a.id.clone() } else { shoe_b.id.clone() };
        handles.push(tokio::spawn(async move {
            state.ledger.link(&user, &target, &run_id).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().expect("link should succeed");
    }

    // The run ends up on exactly one shoe, whichever won last.
    let shoes = state.shoes.list(&user).await.unwrap();
    let total: Km = shoes.iter().map(|s| s.total_mileage).sum();
    assert_eq!(total, Km::from_hundredths(1000));
    assert!(shoes.iter().any(|s| s.total_mileage.is_zero()));
}
