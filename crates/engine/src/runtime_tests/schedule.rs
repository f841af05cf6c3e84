// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::schedule::{CategoryPreset, FireOutcome};

fn nightly() -> CategoryPreset {
    CategoryPreset { name: "nightly".to_string(), categories: kitchen_and_garden() }
}

#[tokio::test]
async fn fire_runs_the_preset_end_to_end() {
    let ctx = setup(stocked_catalog(), stocked_search());

    let fired = ctx.runtime.schedule_trigger().fire(&org("org-a"), &nightly()).await.unwrap();

    let FireOutcome::Executed { run_id, outcome } = fired else {
        panic!("expected an executed run");
    };
    assert_eq!(outcome, RunOutcome::Completed { progress: expected_stocked_progress() });
    let run = ctx.runtime.get_run(&run_id).await.unwrap();
    assert_eq!(run.actor, "schedule:nightly");
    assert_eq!(run.categories, kitchen_and_garden());
}

#[yare::parameterized(
    pending = { false },
    paused  = { true },
)]
fn fire_skips_orgs_with_an_active_run(pause: bool) {
    tokio::runtime::Runtime::new().unwrap().block_on(async {
        let ctx = setup(stocked_catalog(), stocked_search());
        let active = ctx
            .runtime
            .create_run(&org("org-a"), "alice", kitchen_and_garden(), None)
            .await
            .unwrap();
        if pause {
            ctx.runtime.start_run(&active.id).await.unwrap();
            ctx.runtime.pause_run(&active.id).await.unwrap();
        }

        let fired = ctx.runtime.schedule_trigger().fire(&org("org-a"), &nightly()).await.unwrap();

        assert_eq!(fired, FireOutcome::Skipped { active_run: active.id.clone() });
        assert_eq!(ctx.runtime.list_runs(&org("org-a")).await.unwrap().len(), 1);
        assert!(ctx.catalog.calls().is_empty());
    });
}

#[tokio::test]
async fn other_orgs_do_not_block_a_fire() {
    let ctx = setup(stocked_catalog(), stocked_search());
    ctx.runtime.create_run(&org("org-b"), "bob", kitchen_and_garden(), None).await.unwrap();

    let fired = ctx.runtime.schedule_trigger().fire(&org("org-a"), &nightly()).await.unwrap();

    assert!(matches!(fired, FireOutcome::Executed { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn racing_fires_never_surface_a_rejection() {
    for _ in 0..20 {
        let ctx = setup(stocked_catalog(), stocked_search());
        let first = tokio::spawn({
            let trigger = ctx.runtime.schedule_trigger();
            async move { trigger.fire(&org("org-a"), &nightly()).await }
        });
        let second = tokio::spawn({
            let trigger = ctx.runtime.schedule_trigger();
            async move { trigger.fire(&org("org-a"), &nightly()).await }
        });

        let outcomes = [first.await.unwrap().unwrap(), second.await.unwrap().unwrap()];

        let executed: Vec<&RunId> = outcomes
            .iter()
            .filter_map(|o| match o {
                FireOutcome::Executed { run_id, .. } => Some(run_id),
                FireOutcome::Skipped { .. } => None,
            })
            .collect();
        assert!(!executed.is_empty());
        for outcome in &outcomes {
            if let FireOutcome::Skipped { active_run } = outcome {
                assert!(executed.contains(&active_run));
            }
        }
    }
}

#[test]
fn presets_load_from_toml() {
    let preset: CategoryPreset = toml::from_str(
        r#"
        name = "weekly"

        [[categories]]
        id = "c1"
        name = "Kettles"
        department = "kitchen"
        "#,
    )
    .unwrap();
    assert_eq!(preset.name, "weekly");
    assert_eq!(preset.categories[0].department, "kitchen");
}
