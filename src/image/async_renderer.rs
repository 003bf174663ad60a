//! Bounded worker pool fronting [`Renderer::render`] so callers never block
//! on a render in progress

use std::sync::{Arc, Mutex};

use image::RgbaImage;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::error::ImageError;
use super::renderer::Renderer;

type RenderResult = Result<String, ImageError>;

struct Job {
    img: RgbaImage,
    cells_w: u16,
    cells_h: u16,
    reply: oneshot::Sender<RenderResult>,
}

/// Non-blocking front end to [`Renderer`]. Submitted jobs queue on a bounded
/// channel serviced by a small fixed worker pool; a caller that submits
/// while the queue is full gets a detached one-shot worker instead of being
/// blocked or rejected.
pub struct AsyncRenderer {
    renderer: Arc<Renderer>,
    jobs_tx: Mutex<Option<mpsc::Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl AsyncRenderer {
    /// `workers` spawns that many blocking workers; the internal queue holds
    /// `4 * workers` jobs before overflowing to a detached one-shot task.
    pub fn new(renderer: Arc<Renderer>, workers: usize) -> Arc<Self> {
        let workers = workers.max(1);
        let capacity = workers * 4;
        let (jobs_tx, jobs_rx) = mpsc::channel(capacity);
        let jobs_rx = Arc::new(tokio::sync::Mutex::new(jobs_rx));

        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let renderer = Arc::clone(&renderer);
            let jobs_rx = Arc::clone(&jobs_rx);
            handles.push(tokio::spawn(Self::worker_loop(id, renderer, jobs_rx)));
        }

        Arc::new(Self {
            renderer,
            jobs_tx: Mutex::new(Some(jobs_tx)),
            workers: Mutex::new(handles),
        })
    }

    /// Queue a render job. Returns the rendered escape sequence, or the
    /// [`ImageError`] the pipeline produced. A panic inside the render call
    /// surfaces as [`ImageError::RenderFailed`] rather than killing the
    /// worker.
    pub async fn render(&self, img: RgbaImage, cells_w: u16, cells_h: u16) -> RenderResult {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job = Job {
            img,
            cells_w,
            cells_h,
            reply: reply_tx,
        };

        let sender = self
            .jobs_tx
            .lock()
            .expect("async renderer sender lock poisoned")
            .clone();
        let Some(sender) = sender else {
            return Err(ImageError::RenderFailed("async renderer is closed".to_string()));
        };

        match sender.try_send(job) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(job)) => {
                debug!("render: queue full, spawning overflow worker");
                return Self::render_blocking(Arc::clone(&self.renderer), job.img, job.cells_w, job.cells_h).await;
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                debug!("render: queue closed, spawning overflow worker");
                return Self::render_blocking(Arc::clone(&self.renderer), job.img, job.cells_w, job.cells_h).await;
            }
        }

        reply_rx
            .await
            .unwrap_or_else(|_| Err(ImageError::RenderFailed("worker dropped reply channel".to_string())))
    }

    /// Stop accepting new jobs and wait for in-flight and already-queued
    /// jobs to finish. Idempotent.
    pub async fn close(&self) {
        let sender = self
            .jobs_tx
            .lock()
            .expect("async renderer sender lock poisoned")
            .take();
        if sender.is_none() {
            return;
        }
        // Dropping the last sender lets every worker's recv loop drain the
        // remaining queue and then exit on its own.
        drop(sender);

        let handles = std::mem::take(&mut *self.workers.lock().expect("async renderer workers lock poisoned"));
        for handle in handles {
            let _ = handle.await;
        }
    }

    async fn worker_loop(id: usize, renderer: Arc<Renderer>, jobs_rx: Arc<tokio::sync::Mutex<mpsc::Receiver<Job>>>) {
        loop {
            let job = {
                let mut rx = jobs_rx.lock().await;
                rx.recv().await
            };
            let Some(job) = job else {
                debug!(worker = id, "worker_loop: channel closed, exiting");
                return;
            };

            let result = Self::render_blocking(Arc::clone(&renderer), job.img, job.cells_w, job.cells_h).await;
            if job.reply.send(result).is_err() {
                warn!(worker = id, "worker_loop: caller dropped reply receiver");
            }
        }
    }

    async fn render_blocking(renderer: Arc<Renderer>, img: RgbaImage, cells_w: u16, cells_h: u16) -> RenderResult {
        tokio::task::spawn_blocking(move || renderer.render(&img, cells_w, cells_h))
            .await
            .unwrap_or_else(|join_err| Err(ImageError::RenderFailed(format!("render panicked: {join_err}"))))
    }
}
