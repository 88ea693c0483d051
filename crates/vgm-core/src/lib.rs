//! Shared core of vgm-radio: the metadata wire contract, the self-rescheduling
//! poll loop, and the playback controls the front-ends drive.

pub mod adapter;
pub mod config;
pub mod controls;
pub mod error;
pub mod platform;
pub mod poller;
pub mod schedule;
pub mod snapshot;
pub mod source;
pub mod state;

pub use adapter::{NowPlaying, PresentationAdapter};
pub use controls::{AudioElement, Controls};
pub use error::PlaybackError;
pub use poller::{CycleOutcome, CycleReport, Poller, PollerHandle};
pub use schedule::{BufferDelay, FixedDelay, Schedule};
pub use snapshot::PlaybackSnapshot;
pub use source::{HttpSource, MetadataSource};
pub use state::ClientPlaybackState;
