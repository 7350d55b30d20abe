//! Background job closing attestation rounds that outlived their TTL.

use std::sync::Arc;
use std::time::Duration;

use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{info, warn};

use crate::services::RegistryService;

/// Run one expiry pass; returns how many rounds were closed. The records
/// reach WebSocket clients through the registry's event sink.
pub async fn sweep_expired_rounds(registry_service: &RegistryService) -> usize {
    let expired = registry_service.expire_rounds().await;
    for record in &expired {
        info!(sequence = record.sequence, "round expired by sweep");
    }
    expired.len()
}

/// Schedule the sweep every `interval_seconds` and start the scheduler.
pub async fn start_expiry_job(
    registry_service: Arc<RegistryService>,
    interval_seconds: u64,
) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_repeated_async(
        Duration::from_secs(interval_seconds),
        move |job_id: uuid::Uuid, _scheduler| {
            let registry_service = registry_service.clone();
            Box::pin(async move {
                let closed = sweep_expired_rounds(&registry_service).await;
                if closed > 0 {
                    warn!(%job_id, closed, "expiry sweep closed rounds without quorum");
                }
            })
        },
    )?;

    let job_id = scheduler.add(job).await?;
    scheduler.start().await?;
    info!(%job_id, interval_seconds, "round expiry job started");
    Ok(scheduler)
}
