use async_trait::async_trait;
use songbird::input::{AudioStreamError, AuxMetadata, Compose, Input, YoutubeDl};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::audio::{
    resolver::{is_url, ResolveError, Resolver},
    track::Track,
};

/// Resolver sobre yt-dlp (vía `YoutubeDl` de songbird).
///
/// Las URLs se resuelven tal cual; cualquier otra consulta es una búsqueda de
/// la que se toma el primer resultado.
pub struct YtDlpResolver {
    client: reqwest::Client,
    timeout: Duration,
}

impl YtDlpResolver {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl Resolver for YtDlpResolver {
    type Stream = Input;

    async fn resolve(&self, query: &str) -> Result<Track<Input>, ResolveError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ResolveError::NotFound(String::new()));
        }

        let mut source = if is_url(query) {
            debug!("🔗 Resolviendo URL: {}", query);
            YoutubeDl::new(self.client.clone(), query.to_string())
        } else {
            debug!("🔍 Buscando: {}", query);
            YoutubeDl::new_search(self.client.clone(), query.to_string())
        };

        let metadata = timeout(self.timeout, source.aux_metadata())
            .await
            .map_err(|_| ResolveError::TimedOut(self.timeout.as_secs()))?
            .map_err(|e| classify(query, e))?;

        let track = build_track(query, metadata, Input::from(source));
        info!("✅ Resuelto `{}` → {}", query, track.title());
        Ok(track)
    }
}

fn build_track<S>(query: &str, metadata: AuxMetadata, stream: S) -> Track<S> {
    let title = metadata
        .title
        .or(metadata.track)
        .unwrap_or_else(|| query.to_string());

    let mut track = Track::new(title, stream);
    if let Some(url) = metadata.source_url {
        track = track.with_url(url);
    }
    if let Some(duration) = metadata.duration {
        track = track.with_duration(duration);
    }
    track
}

fn classify(query: &str, error: AudioStreamError) -> ResolveError {
    match error {
        AudioStreamError::Unsupported => ResolveError::UnsupportedSource(query.to_string()),
        AudioStreamError::RetryIn(wait) => {
            ResolveError::Network(format!("reintentar en {}s", wait.as_secs()))
        }
        AudioStreamError::Fail(e) => classify_failure(query, &e.to_string()),
        other => ResolveError::Network(other.to_string()),
    }
}

/// yt-dlp sólo devuelve texto: distingue "no existe" de fallos de red
fn classify_failure(query: &str, message: &str) -> ResolveError {
    let lowered = message.to_lowercase();

    if ["unsupported url", "no suitable extractor"]
        .iter()
        .any(|needle| lowered.contains(needle))
    {
        return ResolveError::UnsupportedSource(query.to_string());
    }

    if [
        "no results",
        "video unavailable",
        "not found",
        "private video",
        "has been removed",
        "no video",
    ]
    .iter()
    .any(|needle| lowered.contains(needle))
    {
        return ResolveError::NotFound(query.to_string());
    }

    ResolveError::Network(message.to_string())
}
