use serenity::model::id::UserId;
use std::{fmt, time::Duration};

/// Pista resuelta: título para mostrar más el stream que entrega el resolver.
///
/// El stream se consume una sola vez, al pasarla al transporte. Si la pista se
/// descarta antes (cola limpiada, fallo al iniciar) el recurso se libera con el
/// `Drop` del stream.
pub struct Track<S> {
    summary: TrackSummary,
    stream: S,
}

/// Metadatos de una pista sin el stream, clonables para embeds y logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSummary {
    pub title: String,
    pub url: Option<String>,
    pub duration: Option<Duration>,
    pub requested_by: Option<UserId>,
}

impl<S> Track<S> {
    pub fn new(title: impl Into<String>, stream: S) -> Self {
        Self {
            summary: TrackSummary {
                title: title.into(),
                url: None,
                duration: None,
                requested_by: None,
            },
            stream,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.summary.url = Some(url.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.summary.duration = Some(duration);
        self
    }

    pub fn with_requested_by(mut self, user_id: UserId) -> Self {
        self.summary.requested_by = Some(user_id);
        self
    }

    pub fn title(&self) -> &str {
        &self.summary.title
    }

    pub fn summary(&self) -> &TrackSummary {
        &self.summary
    }

    /// Separa los metadatos del stream para entregarlo al transporte
    pub fn into_parts(self) -> (TrackSummary, S) {
        (self.summary, self.stream)
    }
}

impl<S> fmt::Debug for Track<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Track")
            .field("title", &self.summary.title)
            .field("url", &self.summary.url)
            .finish_non_exhaustive()
    }
}
