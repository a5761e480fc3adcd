//! Fixed-size worker pool for tile requests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐                          ┌──────────┐
//! │ HTTP task A │──┐                    ┌──│ worker 0 │──┐
//! └─────────────┘  │   ┌────────────┐   │  └──────────┘  │
//!                  ├──►│ job queue  │───┤       ...      ├──► TileHandler
//! ┌─────────────┐  │   │  (mpsc)    │   │  ┌──────────┐  │
//! │ HTTP task B │──┘   └────────────┘   └──│ worker N │──┘
//! └─────────────┘                          └──────────┘
//!        ▲                                      │
//!        └────────── oneshot reply ─────────────┘
//! ```
//!
//! At most N requests are processed at once regardless of how many clients
//! are waiting. A worker always finishes the job it picked up, even when the
//! requester has gone away, so the result still lands in the tile cache.

use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::TileError;
use crate::floor::ImageSource;

use super::service::{TileRequest, TileResponse, TileService};

/// Default number of tile workers.
pub const DEFAULT_TILE_WORKERS: usize = 4;

/// Something that turns tile requests into tiles.
#[async_trait]
pub trait TileHandler: Send + Sync + 'static {
    async fn handle(&self, request: TileRequest) -> Result<TileResponse, TileError>;
}

#[async_trait]
impl<S> TileHandler for TileService<S>
where
    S: ImageSource + ?Sized + 'static,
{
    async fn handle(&self, request: TileRequest) -> Result<TileResponse, TileError> {
        self.get_tile(request).await
    }
}

struct TileJob {
    request: TileRequest,
    reply: oneshot::Sender<Result<TileResponse, TileError>>,
}

type JobQueue = Arc<Mutex<mpsc::UnboundedReceiver<TileJob>>>;

/// Pool of workers draining a shared tile request queue.
///
/// Dropping the dispatcher closes the queue; workers finish what is already
/// queued and then exit.
pub struct TileDispatcher {
    sender: StdMutex<Option<mpsc::UnboundedSender<TileJob>>>,
    workers: StdMutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
}

impl TileDispatcher {
    /// Start `workers` worker tasks serving requests with `handler`.
    ///
    /// Must be called from within a tokio runtime. A worker count of zero is
    /// treated as one.
    pub fn spawn<H>(handler: Arc<H>, workers: usize) -> Self
    where
        H: TileHandler + ?Sized,
    {
        let worker_count = workers.max(1);
        let (sender, receiver) = mpsc::unbounded_channel();
        let queue: JobQueue = Arc::new(Mutex::new(receiver));

        let handles = (0..worker_count)
            .map(|id| {
                let handler = Arc::clone(&handler);
                let queue = Arc::clone(&queue);
                tokio::spawn(run_worker(id, handler, queue))
            })
            .collect();

        info!(workers = worker_count, "Started tile workers");

        Self {
            sender: StdMutex::new(Some(sender)),
            workers: StdMutex::new(handles),
            worker_count,
        }
    }

    /// Queue a request and wait for its tile.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::Unavailable`] if the dispatcher has been shut
    /// down, otherwise whatever the handler returned.
    pub async fn submit(&self, request: TileRequest) -> Result<TileResponse, TileError> {
        let sender = self
            .sender
            .lock()
            .ok()
            .and_then(|sender| sender.clone())
            .ok_or(TileError::Unavailable)?;

        let (reply, response) = oneshot::channel();
        sender
            .send(TileJob { request, reply })
            .map_err(|_| TileError::Unavailable)?;

        response.await.map_err(|_| TileError::Unavailable)?
    }

    /// Stop accepting requests and wait for the workers to drain the queue.
    pub async fn shutdown(&self) {
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }

        let handles = match self.workers.lock() {
            Ok(mut workers) => std::mem::take(&mut *workers),
            Err(_) => Vec::new(),
        };
        for handle in handles {
            let _ = handle.await;
        }

        info!("Tile workers stopped");
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Whether the dispatcher still accepts requests.
    pub fn is_running(&self) -> bool {
        self.sender
            .lock()
            .map(|sender| sender.is_some())
            .unwrap_or(false)
    }
}

async fn run_worker<H>(id: usize, handler: Arc<H>, queue: JobQueue)
where
    H: TileHandler + ?Sized,
{
    loop {
        // Only one idle worker waits on the receiver at a time
        let job = queue.lock().await.recv().await;
        let Some(job) = job else {
            break;
        };

        let result = handler.handle(job.request).await;
        if job.reply.send(result).is_err() {
            debug!(worker = id, "Tile requester went away before the reply");
        }
    }

    debug!(worker = id, "Tile worker exiting");
}
