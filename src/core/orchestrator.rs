use crate::core::collage::CollageComposer;
use crate::core::counter::GenerationCounter;
use crate::domain::model::{PhotoBytes, RequestContext, RequestOutcome, RequestState};
use crate::domain::ports::{ImageGenerator, ReplySink, StatusSink};
use crate::utils::error::{BotError, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub const STATUS_PROCESSING: &str = "⏳ Processing your photo…";
pub const STATUS_DONE: &str = "✅ Done!";

pub fn failure_status(err: &BotError) -> String {
    format!("❌ Could not make the collage: {}", err.user_friendly_message())
}

struct Inner {
    generator: Arc<dyn ImageGenerator>,
    composer: Arc<CollageComposer>,
    compose_slots: Arc<Semaphore>,
    counter: GenerationCounter,
    next_id: AtomicU64,
    tasks: Mutex<JoinSet<RequestOutcome>>,
}

/// Turns inbound photos into collages in the background.
///
/// Each photo becomes one tracked task: generate the aged image, compose on
/// the blocking pool, then report. The caller only waits for the initial
/// status message.
#[derive(Clone)]
pub struct RequestOrchestrator {
    inner: Arc<Inner>,
}

impl RequestOrchestrator {
    pub fn new(
        generator: Arc<dyn ImageGenerator>,
        composer: CollageComposer,
        compose_workers: usize,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                generator,
                composer: Arc::new(composer),
                compose_slots: Arc::new(Semaphore::new(compose_workers.max(1))),
                counter: GenerationCounter::new(),
                next_id: AtomicU64::new(1),
                tasks: Mutex::new(JoinSet::new()),
            }),
        }
    }

    pub fn total_generated(&self) -> u64 {
        self.inner.counter.get()
    }

    /// Tasks spawned and not yet collected.
    pub fn in_flight_requests(&self) -> usize {
        self.inner.lock_tasks().len()
    }

    /// Posts the "processing" status and schedules the rest of the work.
    /// Returns the request id once the task is spawned.
    pub async fn handle_incoming_photo(
        &self,
        photo: PhotoBytes,
        status: Arc<dyn StatusSink>,
        reply: Arc<dyn ReplySink>,
    ) -> Result<u64> {
        let request_id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let handle = status.send(STATUS_PROCESSING).await?;
        tracing::info!(
            "📥 Request #{} accepted ({} bytes)",
            request_id,
            photo.len()
        );

        let ctx = RequestContext::new(request_id, photo, handle);
        let inner = Arc::clone(&self.inner);
        let mut tasks = self.inner.lock_tasks();
        while let Some(done) = tasks.try_join_next() {
            log_collected(done);
        }
        tasks.spawn(async move { inner.run_request(ctx, status, reply).await });
        Ok(request_id)
    }

    /// Waits for every spawned request, including ones started while draining.
    pub async fn drain(&self) -> Vec<RequestOutcome> {
        let mut outcomes = Vec::new();
        loop {
            let mut set = std::mem::take(&mut *self.inner.lock_tasks());
            if set.is_empty() {
                break;
            }
            while let Some(done) = set.join_next().await {
                match done {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(e) => tracing::error!("Request task ended abnormally: {}", e),
                }
            }
        }
        outcomes
    }

    /// Drains with a deadline; whatever is still running afterwards is aborted.
    pub async fn shutdown(&self, grace: Duration) -> Vec<RequestOutcome> {
        tracing::info!(
            "🛑 Shutting down, waiting up to {:?} for {} request(s)",
            grace,
            self.in_flight_requests()
        );
        match tokio::time::timeout(grace, self.drain()).await {
            Ok(outcomes) => outcomes,
            Err(_) => {
                // 逾時: drain 持有的 JoinSet 已被丟棄並中止
                let mut tasks = self.inner.lock_tasks();
                tracing::warn!(
                    "⚠️ Grace period elapsed, aborting {} request(s)",
                    tasks.len()
                );
                tasks.abort_all();
                tasks.detach_all();
                Vec::new()
            }
        }
    }
}

impl Inner {
    fn lock_tasks(&self) -> MutexGuard<'_, JoinSet<RequestOutcome>> {
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn produce_collage(&self, photo: &PhotoBytes) -> Result<Vec<u8>> {
        let after = self.generator.generate_aged(photo).await?;

        let _worker = Arc::clone(&self.compose_slots)
            .acquire_owned()
            .await
            .map_err(|_| BotError::compose("compose pool is closed"))?;
        let composer = Arc::clone(&self.composer);
        let before = photo.clone();
        tokio::task::spawn_blocking(move || composer.compose(&before, &after))
            .await
            .map_err(|e| BotError::compose(format!("compose worker failed: {}", e)))?
    }

    async fn run_request(
        self: Arc<Self>,
        mut ctx: RequestContext,
        status: Arc<dyn StatusSink>,
        reply: Arc<dyn ReplySink>,
    ) -> RequestOutcome {
        match self.deliver(&ctx, status.as_ref(), reply.as_ref()).await {
            Ok(()) => {
                ctx.finish(RequestState::Succeeded);
                ctx.outcome(None)
            }
            Err(e) => {
                tracing::error!(
                    "❌ Request #{} failed (Category: {:?}, Severity: {:?}): {:?}",
                    ctx.request_id,
                    e.category(),
                    e.severity(),
                    e
                );
                ctx.finish(RequestState::Failed);
                if let Err(edit_err) = status.edit(&ctx.status, &failure_status(&e)).await {
                    tracing::warn!(
                        "Could not update status of request #{}: {}",
                        ctx.request_id,
                        edit_err
                    );
                }
                ctx.outcome(Some(e.to_string()))
            }
        }
    }

    /// Counts the collage as generated once composed, even if the reply is lost.
    async fn deliver(
        &self,
        ctx: &RequestContext,
        status: &dyn StatusSink,
        reply: &dyn ReplySink,
    ) -> Result<()> {
        let collage = self.produce_collage(&ctx.photo).await?;
        let total = self.counter.increment();
        tracing::info!(
            "✅ Request #{} done, total collages generated: {}",
            ctx.request_id,
            total
        );
        if let Err(e) = status.edit(&ctx.status, STATUS_DONE).await {
            tracing::warn!("Could not update status of request #{}: {}", ctx.request_id, e);
        }
        reply.send_image(collage).await
    }
}

fn log_collected(done: std::result::Result<RequestOutcome, tokio::task::JoinError>) {
    match done {
        Ok(outcome) => tracing::debug!(
            "Collected request #{} ({:?})",
            outcome.request_id,
            outcome.state
        ),
        Err(e) => tracing::error!("Request task ended abnormally: {}", e),
    }
}
