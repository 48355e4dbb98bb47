//! Mirror-aware release resolution
//!
//! Finds a reachable mirror, loads its release catalog, resolves requested
//! versions to artifacts and downloads them with checksum verification.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │    Probe    │────▶│  Selector   │────▶│    State    │
//! │   (race)    │     │ (priority)  │     │ (snapshot)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                                       │
//!        ▼                                       ▼
//! ┌─────────────┐                         ┌─────────────┐     ┌─────────────┐
//! │   Catalog   │                         │  Resolver   │────▶│  Download   │
//! │ (manifest)  │                         │ (versions)  │     │  (verify)   │
//! └─────────────┘                         └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`version`]: Release entries, version grammar and artifact filenames
//! - [`compare`]: Version ordering and partial version completion
//! - [`catalog`]: Checksum manifest parsing and fetching
//! - [`origin`]: Mirror origins and inferred regions
//! - [`probe`]: Endpoint probing and the deadline-bound race
//! - [`selector`]: Origin and region decision from probe outcomes
//! - [`state`]: Shared network state snapshot with a single writer
//! - [`resolver`]: Requested version to release entry
//! - [`download`]: Streaming download with checksum verification
//! - [`progress`]: Download progress reporting
//! - [`service`]: Facade used by the command line
//! - [`error`]: Error types

pub mod catalog;
pub mod compare;
pub mod download;
pub mod error;
pub mod origin;
pub mod probe;
pub mod progress;
pub mod resolver;
pub mod selector;
pub mod service;
pub mod state;
pub mod version;
