use async_trait::async_trait;
use thiserror::Error;

use super::track::Track;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no se encontraron resultados para `{0}`")]
    NotFound(String),
    #[error("error de red al resolver la canción: {0}")]
    Network(String),
    #[error("fuente no soportada: {0}")]
    UnsupportedSource(String),
    #[error("la búsqueda tardó más de {0}s")]
    TimedOut(u64),
}

/// Convierte una consulta del usuario en una pista reproducible.
///
/// Puede tardar varios segundos; el coordinador la llama siempre sin tener
/// tomado ningún lock de guild. Los timeouts son cosa del resolver.
#[async_trait]
pub trait Resolver: Send + Sync + 'static {
    type Stream: Send + 'static;

    async fn resolve(&self, query: &str) -> Result<Track<Self::Stream>, ResolveError>;
}

/// `true` si la consulta es una URL http(s) y no una búsqueda
pub fn is_url(query: &str) -> bool {
    url::Url::parse(query.trim())
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}
