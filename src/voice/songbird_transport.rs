use async_trait::async_trait;
use parking_lot::Mutex as SyncMutex;
use serenity::model::id::{ChannelId, GuildId};
use songbird::{
    input::Input,
    tracks::{PlayMode, TrackHandle},
    Call, Event, EventContext, EventHandler as VoiceEventHandler, Songbird, TrackEvent,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::audio::{
    track::Track,
    transport::{CompletionNotifier, TransportError, TransportSession, VoiceTransport},
};

/// Transporte de voz sobre songbird.
pub struct SongbirdTransport {
    manager: Arc<Songbird>,
    volume: f32,
}

impl SongbirdTransport {
    pub fn new(manager: Arc<Songbird>, volume: f32) -> Self {
        Self { manager, volume }
    }
}

#[async_trait]
impl VoiceTransport for SongbirdTransport {
    type Session = SongbirdSession;

    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<SongbirdSession, TransportError> {
        let call = self
            .manager
            .join(guild_id, channel_id)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        info!("🔊 Conectado al canal de voz en guild {}", guild_id);

        Ok(SongbirdSession {
            guild_id,
            manager: self.manager.clone(),
            call,
            current: SyncMutex::new(None),
            volume: self.volume,
        })
    }
}

/// Conexión de voz de una guild y su único stream activo.
pub struct SongbirdSession {
    guild_id: GuildId,
    manager: Arc<Songbird>,
    call: Arc<Mutex<Call>>,
    current: SyncMutex<Option<TrackHandle>>,
    volume: f32,
}

#[async_trait]
impl TransportSession for SongbirdSession {
    type Stream = Input;

    async fn move_to(&self, channel_id: ChannelId) -> Result<(), TransportError> {
        // join sobre una llamada existente la mueve de canal
        self.manager
            .join(self.guild_id, channel_id)
            .await
            .map(|_| ())
            .map_err(|e| TransportError::Connect(e.to_string()))
    }

    async fn play(
        &self,
        track: Track<Input>,
        on_complete: CompletionNotifier,
    ) -> Result<(), TransportError> {
        let (summary, input) = track.into_parts();

        let handle = {
            let mut call = self.call.lock().await;
            call.play_input(input)
        };
        let _ = handle.set_volume(self.volume);

        let relay = CompletionRelay {
            notifier: on_complete,
        };
        for event in [TrackEvent::End, TrackEvent::Error] {
            if let Err(e) = handle.add_event(Event::Track(event), relay.clone()) {
                let _ = handle.stop();
                return Err(TransportError::Playback(format!(
                    "{}: {}",
                    summary.title, e
                )));
            }
        }

        *self.current.lock() = Some(handle);
        Ok(())
    }

    async fn stop_current(&self) {
        let handle = self.current.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.stop() {
                debug!("El track ya había terminado en guild {}: {}", self.guild_id, e);
            }
        }
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.current.lock().take();
        self.manager
            .remove(self.guild_id)
            .await
            .map_err(|e| TransportError::Disconnect(e.to_string()))?;

        info!("👋 Desconectado del canal de voz en guild {}", self.guild_id);
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        // songbird procesa el estado de voz antes que nuestro handler
        match self.manager.get(self.guild_id) {
            Some(call) if Arc::ptr_eq(&call, &self.call) => {
                call.lock().await.current_channel().is_some()
            }
            _ => false,
        }
    }
}

/// Traduce los eventos de fin y error de songbird a un único aviso.
#[derive(Clone)]
struct CompletionRelay {
    notifier: CompletionNotifier,
}

#[async_trait]
impl VoiceEventHandler for CompletionRelay {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        let error = match ctx {
            EventContext::Track(tracks) => tracks.iter().find_map(|(state, _)| match &state.playing {
                PlayMode::Errored(e) => Some(e.to_string()),
                _ => None,
            }),
            _ => None,
        };

        if let Some(e) = &error {
            warn!(
                "❌ Error en track para guild {}: {}",
                self.notifier.guild_id(),
                e
            );
        }

        self.notifier.notify(error);

        // Un solo disparo por track
        Some(Event::Cancel)
    }
}
