//! Legacy source extractors
//!
//! Both extractors produce the same shape of output: a finite, single-pass
//! sequence of [`SourceRecord`]s for one entity. An absent or unreadable
//! source yields an empty sequence, never a run failure; the orchestrator
//! logs the gap and moves on.

pub mod flat_export;
pub mod remote_api;

pub use flat_export::FlatExportExtractor;
pub use remote_api::RemoteApiExtractor;
