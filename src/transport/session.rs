// src/transport/session.rs
// =============================================================================
// In-process binding: run a crawl on its own task and read its events.
//
// The engine publishes into a bounded mpsc channel; the session owns the
// receiving end. Dropping the session (or calling cancel) fires the job's
// CancellationToken, and the engine stops at its next await point.
//
// Rust concepts:
// - tokio::spawn: Runs the engine concurrently with the caller
// - DropGuard: Cancels the token automatically when the session is dropped
// - futures::stream::unfold: Turns a "next item" method into a Stream
// =============================================================================

use futures::stream::{self, Stream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::crawl::{CrawlEvent, CrawlResult, Crawler};
use crate::error::CrawlError;

pub struct CrawlSession {
    events: mpsc::Receiver<CrawlEvent>,
    cancel: CancellationToken,
    task: JoinHandle<Result<CrawlResult, CrawlError>>,
    // Set once a terminal event has been handed out
    terminated: bool,
    _guard: DropGuard,
}

impl CrawlSession {
    // Starts a crawl of `url` in the background
    //
    // Must be called from inside a tokio runtime.
    pub fn start(crawler: Crawler, url: impl Into<String>) -> Self {
        let (mut tx, rx) = mpsc::channel(crawler.config().channel_capacity.max(1));
        let cancel = CancellationToken::new();
        let job_cancel = cancel.clone();
        let seed = url.into();

        let task = tokio::spawn(async move { crawler.run(&seed, &mut tx, &job_cancel).await });

        Self {
            events: rx,
            _guard: cancel.clone().drop_guard(),
            cancel,
            task,
            terminated: false,
        }
    }

    // Waits for the next event
    //
    // Returns None once the job has finished and every event was read.
    // If the engine stopped without a terminal event (a panic, for instance)
    // and nobody cancelled it, one Error event is produced instead.
    pub async fn next_event(&mut self) -> Option<CrawlEvent> {
        match self.events.recv().await {
            Some(event) => {
                if event.is_terminal() {
                    self.terminated = true;
                }
                Some(event)
            }
            None if !self.terminated && !self.cancel.is_cancelled() => {
                self.terminated = true;
                Some(CrawlEvent::error("crawl ended before completing"))
            }
            None => None,
        }
    }

    /// Asks the engine to stop; remaining events can still be drained
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    // Consumes the session as a Stream of events
    //
    // Dropping the stream cancels the crawl.
    pub fn into_stream(self) -> impl Stream<Item = CrawlEvent> + Send + 'static {
        stream::unfold(self, |mut session| async move {
            session.next_event().await.map(|event| (event, session))
        })
    }

    // Drains all events and returns the engine's typed result
    pub async fn wait(mut self) -> Result<CrawlResult, CrawlError> {
        while self.events.recv().await.is_some() {}
        (&mut self.task).await?
    }

    // Drives `on_event` for every event and returns the final URL list
    //
    // Mirrors how a UI consumes a crawl: the last Urls snapshot wins, an
    // Error event becomes CrawlError::Failed.
    pub async fn collect_with<F>(mut self, mut on_event: F) -> Result<Vec<String>, CrawlError>
    where
        F: FnMut(&CrawlEvent),
    {
        let mut final_urls = Vec::new();
        let mut failure = None;

        while let Some(event) = self.next_event().await {
            on_event(&event);
            match &event {
                CrawlEvent::Urls { urls, .. } => final_urls = urls.clone(),
                CrawlEvent::Error { message } => failure = Some(message.clone()),
                _ => {}
            }
        }

        if let Some(message) = failure {
            return Err(CrawlError::Failed(message));
        }
        if !self.terminated {
            return Err(CrawlError::Cancelled);
        }
        Ok(final_urls)
    }
}
