// src/crawl/events.rs
// =============================================================================
// The events a crawl streams to its caller, and the sink they are sent to.
//
// JSON shape (one object per event):
//   {"type":"log","message":"Crawling /about"}
//   {"type":"urls","urls":["https://example.com/"],"complete":false}
//   {"type":"progress","discovered":12,"visited":4,"queued":8,"eta":3}
//   {"type":"error","message":"Invalid URL provided"}
//
// Rust concepts:
// - #[serde(tag = "type")]: Internally tagged enum, the variant name becomes
//   the "type" field
// - Traits: EventSink lets one engine feed a channel, a Vec, or anything else
// =============================================================================

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CrawlEvent {
    /// Human-readable progress line
    Log { message: String },
    /// Snapshot of every URL discovered so far
    Urls { urls: Vec<String>, complete: bool },
    /// Counters plus an ETA in whole seconds
    Progress {
        discovered: usize,
        visited: usize,
        queued: usize,
        eta: u64,
    },
    /// Fatal failure; nothing follows it
    Error { message: String },
}

impl CrawlEvent {
    pub fn log(message: impl Into<String>) -> Self {
        CrawlEvent::Log { message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        CrawlEvent::Error { message: message.into() }
    }

    /// Final URL list or an error: the caller gets exactly one of these
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CrawlEvent::Urls { complete: true, .. } | CrawlEvent::Error { .. }
        )
    }

    pub fn as_json(&self) -> String {
        // Serializing plain strings and integers cannot fail
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"event serialization failed: {}"}}"#, e)
        })
    }
}

/// Returned by a sink whose consumer has gone away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("event sink closed")]
pub struct SinkClosed;

// Anything the engine can publish events to
//
// The returned future must be Send so the engine can run on a spawned task.
pub trait EventSink: Send {
    fn emit(&mut self, event: CrawlEvent) -> impl Future<Output = Result<(), SinkClosed>> + Send;
}

// Bounded channel: waits when the consumer falls behind, fails once the
// receiver is dropped
impl EventSink for mpsc::Sender<CrawlEvent> {
    async fn emit(&mut self, event: CrawlEvent) -> Result<(), SinkClosed> {
        self.send(event).await.map_err(|_| SinkClosed)
    }
}

// Collects everything in memory
impl EventSink for Vec<CrawlEvent> {
    async fn emit(&mut self, event: CrawlEvent) -> Result<(), SinkClosed> {
        self.push(event);
        Ok(())
    }
}
