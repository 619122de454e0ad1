use std::time::Duration;

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::pipeline::{self, RunReport};
use crate::profiles::Schedule;
use crate::state::JobContext;

const SECS_PER_HOUR: i64 = 3600;

/// Run the profile's pipeline now and then forever on its schedule.
pub async fn run(ctx: JobContext) {
    let ctx = &ctx;
    run_schedule(&ctx.profile.name, ctx.profile.schedule, move || async move {
        run_tick(ctx).await;
    })
    .await;
}

/// Call `tick` immediately and then forever on `schedule`.
/// Ticks never overlap: each one is awaited before the next wait starts.
pub async fn run_schedule<F, Fut>(name: &str, schedule: Schedule, mut tick: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    match schedule {
        Schedule::FixedDelay(period) => {
            info!(
                profile = %name,
                interval_secs = period.as_secs(),
                "progress job started"
            );
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                tick().await;
            }
        }
        Schedule::Hourly { offset } => {
            info!(profile = %name, utc_offset = %offset, "progress job started (hourly)");
            tick().await;

            let mut next = next_hour_boundary(Utc::now(), offset);
            loop {
                let wait = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);
                debug!(profile = %name, next_run = %next, "waiting for next hour");
                tokio::time::sleep(wait).await;
                tick().await;
                next = next_hour_boundary(Utc::now().max(next), offset);
            }
        }
    }
}

/// One scheduled invocation. Failures are logged; the schedule keeps going.
pub async fn run_tick(ctx: &JobContext) -> Option<RunReport> {
    match pipeline::run_once(ctx).await {
        Ok(report) => {
            info!(
                profile = %ctx.profile.name,
                percentage = report.percentage,
                total_pixels = report.counts.total,
                label = %report.label,
                label_width = report.image.width(),
                publish = ?report.publish,
                "progress run finished"
            );
            Some(report)
        }
        Err(e) => {
            error!(profile = %ctx.profile.name, error = %e, "progress run failed");
            None
        }
    }
}

/// First instant strictly after `now` where the wall clock at `offset` reads `HH:00:00`.
pub fn next_hour_boundary(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let shift = i64::from(offset.local_minus_utc());
    let local_secs = now.timestamp() + shift;
    let next_local = (local_secs.div_euclid(SECS_PER_HOUR) + 1) * SECS_PER_HOUR;
    DateTime::from_timestamp(next_local - shift, 0).unwrap_or(now + TimeDelta::hours(1))
}
