// src/transport/mod.rs
// =============================================================================
// Ways to run a crawl and consume its events.
//
// Submodules:
// - session: In-process streaming over a tokio channel
// - sse: HTTP endpoint streaming server-sent events
//
// Both drive the same Crawler; only the event delivery differs.
// =============================================================================

mod session;
pub mod sse;

pub use session::CrawlSession;
