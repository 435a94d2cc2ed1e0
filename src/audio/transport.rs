//! Contract towards the external voice transport.
//!
//! A [`VoiceTransport`] opens one [`TransportSession`] per guild. A session
//! plays a single stream at a time and reports the end of every stream it
//! started through the [`CompletionNotifier`] it was handed. The notifier is
//! the only way completion reaches the coordinator: it posts a
//! [`CompletionEvent`] on a channel instead of touching guild state from the
//! transport's own task.

use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use super::track::Track;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("no se pudo conectar al canal de voz: {0}")]
    Connect(String),
    #[error("no se pudo iniciar la reproducción: {0}")]
    Playback(String),
    #[error("no se pudo desconectar: {0}")]
    Disconnect(String),
}

/// Fin de un stream, en cualquiera de sus formas (terminó, se detuvo, falló).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionEvent {
    pub guild_id: GuildId,
    pub token: u64,
    pub error: Option<String>,
}

/// Entrega el fin de un stream al coordinador. Dispara como mucho una vez,
/// aunque el transporte lo invoque desde varios eventos.
#[derive(Clone)]
pub struct CompletionNotifier {
    inner: Arc<NotifierInner>,
}

struct NotifierInner {
    guild_id: GuildId,
    token: u64,
    sender: UnboundedSender<CompletionEvent>,
    fired: AtomicBool,
}

impl CompletionNotifier {
    pub fn new(guild_id: GuildId, token: u64, sender: UnboundedSender<CompletionEvent>) -> Self {
        Self {
            inner: Arc::new(NotifierInner {
                guild_id,
                token,
                sender,
                fired: AtomicBool::new(false),
            }),
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.inner.guild_id
    }

    /// Devuelve `true` sólo para el primer aviso que llega al coordinador.
    pub fn notify(&self, error: Option<String>) -> bool {
        if self.inner.fired.swap(true, Ordering::AcqRel) {
            return false;
        }

        let event = CompletionEvent {
            guild_id: self.inner.guild_id,
            token: self.inner.token,
            error,
        };

        match self.inner.sender.send(event) {
            Ok(()) => true,
            Err(_) => {
                debug!("Coordinador cerrado, se descarta fin de pista");
                false
            }
        }
    }
}

/// Conexión de voz viva de una guild.
#[async_trait]
pub trait TransportSession: Send + Sync + 'static {
    type Stream: Send + 'static;

    async fn move_to(&self, channel_id: ChannelId) -> Result<(), TransportError>;

    /// Empieza a reproducir `track`.
    ///
    /// Con `Ok`, `on_complete` se dispara exactamente una vez cuando el stream
    /// termine, posiblemente desde otra tarea. Nunca se llama con otro stream
    /// activo en la misma sesión.
    async fn play(
        &self,
        track: Track<Self::Stream>,
        on_complete: CompletionNotifier,
    ) -> Result<(), TransportError>;

    /// Corta el stream actual sin cerrar la conexión.
    async fn stop_current(&self);

    async fn disconnect(&self) -> Result<(), TransportError>;

    /// `false` cuando la conexión de voz ya no existe del lado del transporte.
    async fn is_connected(&self) -> bool;
}

/// Abre sesiones de voz.
#[async_trait]
pub trait VoiceTransport: Send + Sync + 'static {
    type Session: TransportSession;

    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Self::Session, TransportError>;
}
