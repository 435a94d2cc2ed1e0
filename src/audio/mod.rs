//! # Audio Module
//!
//! Per-guild music session coordination for Guild Jukebox.
//!
//! ## Architecture
//!
//! ### [`coordinator`] - Playback Coordinator
//! - Serializes `/play`, `/stop`, `/skip` and end-of-track signals per guild
//! - Decides "start now vs. enqueue" atomically after resolution
//! - Skips tracks that fail to start, bounded by the queue length
//!
//! ### [`store`] - Guild Queue Store
//! - One lazily created slot per guild, no global lock
//! - Remembers the last text channel used for `/play`
//!
//! ### [`transport`] / [`resolver`] - External contracts
//! - Voice connection and single-stream playback with a once-only completion
//! - Query to playable track resolution
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use guild_jukebox::audio::coordinator::{Coordinator, CoordinatorSettings, PlayRequest};
//! # async fn example(
//! #     resolver: guild_jukebox::voice::ytdl::YtDlpResolver,
//! #     transport: guild_jukebox::voice::songbird_transport::SongbirdTransport,
//! #     announcer: std::sync::Arc<dyn guild_jukebox::audio::coordinator::Announcer>,
//! #     request: PlayRequest,
//! # ) -> anyhow::Result<()> {
//! let jukebox = Coordinator::start(resolver, transport, announcer, CoordinatorSettings::default());
//! let outcome = jukebox.play(request).await?;
//! # Ok(())
//! # }
//! ```

pub mod coordinator;
pub mod queue;
pub mod resolver;
pub mod store;
pub mod track;
pub mod transport;
