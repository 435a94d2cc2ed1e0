//! Production adapters for the coordinator's external collaborators:
//! songbird for the voice transport and yt-dlp for query resolution.

pub mod songbird_transport;
pub mod ytdl;

use crate::audio::coordinator::Coordinator;

pub use songbird_transport::SongbirdTransport;
pub use ytdl::YtDlpResolver;

/// Coordinador tal como lo usa el bot en producción
pub type Jukebox = Coordinator<YtDlpResolver, SongbirdTransport>;
