use cadence_core::db::establish_connection;
use cadence_core::models::{NewTaskData, RepeatUnit};
use cadence_core::recurrence::{MaterializationManager, RecurrenceRule};
use cadence_core::repository::{OccurrenceRepository, SqliteRepository, TaskRepository};
use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use uuid::Uuid;

fn anchor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2100, 1, 1, 9, 0, 0).unwrap()
}

fn bench_schedule_iteration(c: &mut Criterion) {
    let mut group = c.benchmark_group("schedule_iteration");
    for (label, unit, days) in [
        ("daily_1y", RepeatUnit::Day, 365),
        ("weekly_5y", RepeatUnit::Week, 5 * 365),
        ("monthly_20y", RepeatUnit::Month, 20 * 365),
    ] {
        let rule = RecurrenceRule::new(1, unit).unwrap();
        let horizon = anchor() + Duration::days(days);
        group.bench_with_input(BenchmarkId::from_parameter(label), &rule, |b, rule| {
            b.iter(|| rule.schedule(black_box(anchor()), black_box(horizon)).count())
        });
    }
    group.finish();
}

fn bench_first_after(c: &mut Criterion) {
    let rule = RecurrenceRule::new(1, RepeatUnit::Day).unwrap();
    let latest = anchor() + Duration::days(3 * 365);
    c.bench_function("first_after_three_years_daily", |b| {
        b.iter(|| rule.first_after(black_box(anchor()), black_box(latest)))
    });
}

fn bench_ensure_occurrences(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("ensure_occurrences");
    group.sample_size(10);

    for days in [30i64, 180, 365] {
        group.bench_with_input(BenchmarkId::new("daily_fresh", days), &days, |b, &days| {
            b.iter_batched(
                || {
                    runtime.block_on(async {
                        let pool = establish_connection("sqlite::memory:").await.unwrap();
                        let repo =
                            SqliteRepository::new(pool, MaterializationManager::with_defaults());
                        let user = Uuid::now_v7();
                        let task = repo
                            .add_task(
                                user,
                                NewTaskData {
                                    title: "Bench".to_string(),
                                    due_at: Some(anchor()),
                                    repeat_every: Some(1),
                                    repeat_unit: Some("day".to_string()),
                                    ..Default::default()
                                },
                            )
                            .await
                            .unwrap();
                        (repo, user, task.id)
                    })
                },
                |(repo, user, task_id)| {
                    runtime.block_on(async {
                        repo.ensure_occurrences_up_to(user, task_id, anchor() + Duration::days(days))
                            .await
                            .unwrap()
                    })
                },
                criterion::BatchSize::PerIteration,
            )
        });
    }

    group.bench_function("daily_already_materialized", |b| {
        let (repo, user, task_id) = runtime.block_on(async {
            let pool = establish_connection("sqlite::memory:").await.unwrap();
            let repo = SqliteRepository::new(pool, MaterializationManager::with_defaults());
            let user = Uuid::now_v7();
            let task = repo
                .add_task(
                    user,
                    NewTaskData {
                        title: "Bench".to_string(),
                        due_at: Some(anchor()),
                        repeat_every: Some(1),
                        repeat_unit: Some("day".to_string()),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
            repo.ensure_occurrences_up_to(user, task.id, anchor() + Duration::days(365))
                .await
                .unwrap();
            (repo, user, task.id)
        });

        b.iter(|| {
            runtime.block_on(async {
                repo.ensure_occurrences_up_to(user, task_id, anchor() + Duration::days(365))
                    .await
                    .unwrap()
            })
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_schedule_iteration,
    bench_first_after,
    bench_ensure_occurrences
);
criterion_main!(benches);
