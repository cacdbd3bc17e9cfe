//! Priority task queue over the pipeline operations.
//!
//! Long-running acquisitions (browser renders, OCR) can be submitted
//! as tasks and awaited instead of called inline. Tasks live in an
//! arena keyed by id; a priority heap orders dispatch; a fixed pool
//! of workers executes them. Completion is delivered over a `oneshot`
//! channel per task. A waiter that gave up (dropped its receiver)
//! never crashes a worker; the result is simply discarded and the
//! terminal status stays queryable in the arena.

use async_trait::async_trait;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{oneshot, Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{QueueError, QueueResult};
use crate::fetch::{
    BrowserFetcher, FetchOutcome, ImageOcrFetcher, ImageScanOutcome, PdfFetcher, StaticFetcher,
};
use crate::locate::{LocateOutcome, MenuLocator};
use crate::search::{CheckVerdict, DishChecker};
use crate::types::Place;

/// Identifier of a submitted task.
pub type TaskId = Uuid;

/// Dispatch priority; higher runs first, FIFO within a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TaskPriority {
    Low,
    Normal,
    High,
}

/// What a task does. Mirrors the pipeline operations one to one.
#[derive(Debug, Clone)]
pub enum TaskKind {
    /// Static fetch of one page.
    FetchPage { url: String },
    /// Download and extract one PDF.
    FetchPdf { url: String },
    /// Browser-render one page.
    RenderPage { url: String },
    /// OCR menu-like images on one page.
    ScanImages { url: String },
    /// Run the full locate chain for a site.
    LocateMenu { site_url: String, dish_name: String },
    /// Full per-place check: website, menu, dish.
    CheckPlace { place: Place, dish_name: String },
}

impl TaskKind {
    fn describe(&self) -> String {
        match self {
            TaskKind::FetchPage { url } => format!("fetch_page {url}"),
            TaskKind::FetchPdf { url } => format!("fetch_pdf {url}"),
            TaskKind::RenderPage { url } => format!("render_page {url}"),
            TaskKind::ScanImages { url } => format!("scan_images {url}"),
            TaskKind::LocateMenu { site_url, dish_name } => {
                format!("locate_menu {site_url} for {dish_name}")
            }
            TaskKind::CheckPlace { place, dish_name } => {
                format!("check_place {} for {dish_name}", place.name)
            }
        }
    }
}

/// Output of a finished task, by kind.
#[derive(Debug, Clone)]
pub enum TaskOutput {
    Page(FetchOutcome),
    Pdf(FetchOutcome),
    Images(ImageScanOutcome),
    Menu(LocateOutcome),
    Dish(CheckVerdict),
}

/// Terminal report delivered to the waiter.
#[derive(Debug, Clone)]
pub struct TaskResult {
    pub id: TaskId,
    pub status: TaskStatus,
    pub output: Option<TaskOutput>,
    pub error: Option<String>,
}

/// Task lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

/// Counts per status at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

/// Executes one task kind. The production runner dispatches to the
/// real pipeline; tests script their own.
#[async_trait]
pub trait TaskRunner: Send + Sync {
    /// Run the task. `Err` marks the task failed with that message.
    async fn run(&self, kind: &TaskKind) -> std::result::Result<TaskOutput, String>;
}

struct TaskEntry {
    kind: TaskKind,
    priority: TaskPriority,
    status: TaskStatus,
    finished_at: Option<Instant>,
    error: Option<String>,
}

#[derive(PartialEq, Eq)]
struct HeapEntry {
    priority: TaskPriority,
    seq: Reverse<u64>,
    id: TaskId,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.priority, self.seq).cmp(&(other.priority, other.seq))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Default)]
struct QueueState {
    tasks: HashMap<TaskId, TaskEntry>,
    heap: BinaryHeap<HeapEntry>,
    senders: HashMap<TaskId, oneshot::Sender<TaskResult>>,
    receivers: HashMap<TaskId, oneshot::Receiver<TaskResult>>,
    next_seq: u64,
    stopped: bool,
}

struct QueueInner {
    state: Mutex<QueueState>,
    notify: Notify,
    runner: Arc<dyn TaskRunner>,
}

/// The queue itself. Cheap to clone; workers run until
/// [`shutdown`](Self::shutdown).
#[derive(Clone)]
pub struct TaskQueue {
    inner: Arc<QueueInner>,
    workers: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl TaskQueue {
    /// Start a queue with `worker_count` workers over `runner`.
    pub fn start(runner: Arc<dyn TaskRunner>, worker_count: usize) -> Self {
        let inner = Arc::new(QueueInner {
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
            runner,
        });
        let mut handles = Vec::new();
        for worker in 0..worker_count.max(1) {
            let inner = inner.clone();
            handles.push(tokio::spawn(async move {
                worker_loop(worker, inner).await;
            }));
        }
        info!(workers = worker_count.max(1), "task queue started");
        Self {
            inner,
            workers: Arc::new(Mutex::new(handles)),
        }
    }

    /// Enqueue a task.
    pub async fn submit(&self, kind: TaskKind, priority: TaskPriority) -> QueueResult<TaskId> {
        let mut state = self.inner.state.lock().await;
        if state.stopped {
            return Err(QueueError::Stopped);
        }
        let id = Uuid::new_v4();
        let seq = state.next_seq;
        state.next_seq += 1;
        let (tx, rx) = oneshot::channel();
        debug!(id = %id, task = %kind.describe(), "task submitted");
        state.tasks.insert(
            id,
            TaskEntry {
                kind,
                priority,
                status: TaskStatus::Pending,
                finished_at: None,
                error: None,
            },
        );
        state.heap.push(HeapEntry {
            priority,
            seq: Reverse(seq),
            id,
        });
        state.senders.insert(id, tx);
        state.receivers.insert(id, rx);
        drop(state);
        self.inner.notify.notify_one();
        Ok(id)
    }

    /// Wait for a task's terminal result. Each task has exactly one
    /// waiter; a second call for the same id is an error.
    pub async fn await_result(&self, id: TaskId, timeout: Duration) -> QueueResult<TaskResult> {
        let rx = {
            let mut state = self.inner.state.lock().await;
            state
                .receivers
                .remove(&id)
                .ok_or(QueueError::UnknownTask { id: id.to_string() })?
        };
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(_)) => Err(QueueError::Stopped),
            Err(_) => Err(QueueError::Timeout { id: id.to_string() }),
        }
    }

    /// Submit and wait in one call.
    pub async fn submit_and_wait(
        &self,
        kind: TaskKind,
        priority: TaskPriority,
        timeout: Duration,
    ) -> QueueResult<TaskResult> {
        let id = self.submit(kind, priority).await?;
        self.await_result(id, timeout).await
    }

    /// Cancel a pending task. Running tasks are not interrupted.
    /// Returns whether the task was actually cancelled.
    pub async fn cancel(&self, id: TaskId) -> QueueResult<bool> {
        let mut state = self.inner.state.lock().await;
        let entry = state
            .tasks
            .get_mut(&id)
            .ok_or(QueueError::UnknownTask { id: id.to_string() })?;
        if entry.status != TaskStatus::Pending {
            return Ok(false);
        }
        entry.status = TaskStatus::Cancelled;
        entry.finished_at = Some(Instant::now());
        if let Some(tx) = state.senders.remove(&id) {
            let _ = tx.send(TaskResult {
                id,
                status: TaskStatus::Cancelled,
                output: None,
                error: None,
            });
        }
        Ok(true)
    }

    /// Current status of a task, if it is still in the arena.
    pub async fn status(&self, id: TaskId) -> Option<TaskStatus> {
        self.inner
            .state
            .lock()
            .await
            .tasks
            .get(&id)
            .map(|t| t.status)
    }

    /// Counts per status.
    pub async fn stats(&self) -> QueueStats {
        let state = self.inner.state.lock().await;
        let mut stats = QueueStats::default();
        for task in state.tasks.values() {
            match task.status {
                TaskStatus::Pending => stats.pending += 1,
                TaskStatus::Running => stats.running += 1,
                TaskStatus::Completed => stats.completed += 1,
                TaskStatus::Failed => stats.failed += 1,
                TaskStatus::Cancelled => stats.cancelled += 1,
            }
        }
        stats
    }

    /// Drop terminal tasks older than `max_age` from the arena.
    /// Returns how many were removed.
    pub async fn cleanup(&self, max_age: Duration) -> usize {
        let mut state = self.inner.state.lock().await;
        let cutoff = Instant::now();
        let old: Vec<TaskId> = state
            .tasks
            .iter()
            .filter(|(_, t)| {
                t.status.is_terminal()
                    && t.finished_at
                        .is_some_and(|at| cutoff.duration_since(at) >= max_age)
            })
            .map(|(id, _)| *id)
            .collect();
        for id in &old {
            state.tasks.remove(id);
            state.receivers.remove(id);
        }
        if !old.is_empty() {
            debug!(removed = old.len(), "cleaned up terminal tasks");
        }
        old.len()
    }

    /// Stop accepting tasks and wind the workers down. Pending tasks
    /// are abandoned; their waiters see [`QueueError::Stopped`].
    pub async fn shutdown(&self) {
        {
            let mut state = self.inner.state.lock().await;
            state.stopped = true;
            state.senders.clear();
        }
        self.inner.notify.notify_waiters();
        let mut workers = self.workers.lock().await;
        for handle in workers.drain(..) {
            let _ = handle.await;
        }
        info!("task queue stopped");
    }
}

async fn worker_loop(worker: usize, inner: Arc<QueueInner>) {
    loop {
        let next = {
            let mut state = inner.state.lock().await;
            if state.stopped {
                return;
            }
            let picked = loop {
                match state.heap.pop() {
                    // Cancelled entries stay in the heap until popped.
                    Some(entry)
                        if state
                            .tasks
                            .get(&entry.id)
                            .is_some_and(|t| t.status == TaskStatus::Pending) =>
                    {
                        break Some(entry.id)
                    }
                    Some(_) => continue,
                    None => break None,
                }
            };
            match picked {
                Some(id) => {
                    let sender = state.senders.remove(&id);
                    match state.tasks.get_mut(&id) {
                        Some(entry) => {
                            entry.status = TaskStatus::Running;
                            Some((id, entry.kind.clone(), sender))
                        }
                        None => None,
                    }
                }
                None => None,
            }
        };

        let Some((id, kind, sender)) = next else {
            let notified = inner.notify.notified();
            if inner.state.lock().await.stopped {
                return;
            }
            notified.await;
            continue;
        };

        debug!(worker, id = %id, task = %kind.describe(), "task running");
        let run = inner.runner.run(&kind).await;

        let result = {
            let mut state = inner.state.lock().await;
            let (status, output, error) = match run {
                Ok(output) => (TaskStatus::Completed, Some(output), None),
                Err(message) => {
                    warn!(worker, id = %id, error = %message, "task failed");
                    (TaskStatus::Failed, None, Some(message))
                }
            };
            if let Some(entry) = state.tasks.get_mut(&id) {
                entry.status = status;
                entry.finished_at = Some(Instant::now());
                entry.error = error.clone();
            }
            TaskResult {
                id,
                status,
                output,
                error,
            }
        };
        if let Some(tx) = sender {
            if tx.send(result).is_err() {
                debug!(id = %id, "waiter gone, result discarded");
            }
        }
    }
}

/// Production [`TaskRunner`] dispatching to the real pipeline.
pub struct PipelineRunner {
    static_fetcher: Arc<StaticFetcher>,
    pdf_fetcher: Arc<PdfFetcher>,
    browser_fetcher: Arc<BrowserFetcher>,
    image_fetcher: Arc<ImageOcrFetcher>,
    locator: Arc<MenuLocator>,
    checker: Arc<dyn DishChecker>,
}

impl PipelineRunner {
    pub fn new(
        static_fetcher: Arc<StaticFetcher>,
        pdf_fetcher: Arc<PdfFetcher>,
        browser_fetcher: Arc<BrowserFetcher>,
        image_fetcher: Arc<ImageOcrFetcher>,
        locator: Arc<MenuLocator>,
        checker: Arc<dyn DishChecker>,
    ) -> Self {
        Self {
            static_fetcher,
            pdf_fetcher,
            browser_fetcher,
            image_fetcher,
            locator,
            checker,
        }
    }
}

#[async_trait]
impl TaskRunner for PipelineRunner {
    async fn run(&self, kind: &TaskKind) -> std::result::Result<TaskOutput, String> {
        Ok(match kind {
            TaskKind::FetchPage { url } => {
                TaskOutput::Page(self.static_fetcher.fetch_page(url).await)
            }
            TaskKind::FetchPdf { url } => TaskOutput::Pdf(self.pdf_fetcher.fetch_pdf(url).await),
            TaskKind::RenderPage { url } => {
                TaskOutput::Page(self.browser_fetcher.fetch_rendered(url).await)
            }
            TaskKind::ScanImages { url } => TaskOutput::Images(self.image_fetcher.scan(url).await),
            TaskKind::LocateMenu { site_url, dish_name } => {
                TaskOutput::Menu(self.locator.locate(site_url, dish_name).await)
            }
            TaskKind::CheckPlace { place, dish_name } => {
                TaskOutput::Dish(self.checker.check(place, dish_name).await)
            }
        })
    }
}
