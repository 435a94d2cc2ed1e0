//! Per-guild playback coordinator.
//!
//! Turns concurrent `/play`, `/stop` and `/skip` requests plus end-of-stream
//! signals from the voice transport into a strictly ordered, one-track-at-a-time
//! stream per guild.
//!
//! ## Serialization
//!
//! Every transition runs under the guild's own `Mutex` (see
//! [`GuildQueueStore`]). The resolver call is the exception: it happens with
//! no lock held, and only the "start now or enqueue" decision is taken under
//! the lock once the track is resolved. A per-guild epoch, bumped by `stop`,
//! lets that decision notice it has been superseded.
//!
//! ## Completion hand-off
//!
//! Transports report the end of a stream from their own task through a
//! [`CompletionNotifier`]. The notifier only posts a [`CompletionEvent`] on a
//! channel; a dispatcher task spawned by [`Coordinator::start`] hands each
//! event to its own task running [`Coordinator::on_completion`], which takes
//! the guild lock like any other transition. A slow guild never holds up the
//! completions of another. Events carry the token of the `play` call they
//! belong to, so the end of a track that was already replaced or stopped is
//! ignored.

use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId, UserId};
use std::sync::{Arc, Weak};
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

use super::{
    queue::{QueueFull, QueueListing},
    resolver::{ResolveError, Resolver},
    store::{GuildChannels, GuildQueueStore, GuildState, NowPlaying, Phase},
    track::{Track, TrackSummary},
    transport::{
        CompletionEvent, CompletionNotifier, TransportError, TransportSession, VoiceTransport,
    },
};
use crate::config::Config;

type State<R, V> = GuildState<<R as Resolver>::Stream, <V as VoiceTransport>::Session>;

/// Pedido de reproducción tal como llega del comando `/play`.
#[derive(Debug, Clone)]
pub struct PlayRequest {
    pub guild_id: GuildId,
    pub voice_channel: ChannelId,
    pub text_channel: ChannelId,
    pub requested_by: UserId,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    StartedNowPlaying(String),
    Enqueued { title: String, position: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NothingPlaying,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipOutcome {
    Skipped,
    NothingPlaying,
}

#[derive(Debug, Error)]
pub enum PlayError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Connect(TransportError),
    #[error(transparent)]
    Playback(TransportError),
    #[error(transparent)]
    QueueFull(#[from] QueueFull),
    #[error("la reproducción se detuvo mientras se buscaba la canción")]
    Superseded,
}

/// Salida de avisos "now playing". Best effort: los errores sólo se loguean.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Announcer: Send + Sync + 'static {
    /// Canales de texto de la guild, para elegir dónde anunciar
    fn guild_channels(&self, guild_id: GuildId) -> GuildChannels;

    async fn now_playing(&self, channel_id: ChannelId, track: &TrackSummary) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy)]
pub struct CoordinatorSettings {
    pub max_queue_size: usize,
    /// Cuántos títulos muestra `/queue` antes de resumir el resto
    pub display_limit: usize,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            max_queue_size: 1000,
            display_limit: 10,
        }
    }
}

impl From<&Config> for CoordinatorSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_queue_size: config.max_queue_size,
            display_limit: config.queue_display_limit,
        }
    }
}

pub struct Coordinator<R, V>
where
    R: Resolver,
    V: VoiceTransport,
{
    resolver: R,
    transport: V,
    announcer: Arc<dyn Announcer>,
    store: GuildQueueStore<R::Stream, V::Session>,
    completions: UnboundedSender<CompletionEvent>,
    display_limit: usize,
}

impl<R, V> Coordinator<R, V>
where
    R: Resolver,
    V: VoiceTransport,
    V::Session: TransportSession<Stream = R::Stream>,
{
    /// Crea el coordinador y lanza la tarea que procesa los fines de pista.
    ///
    /// Debe llamarse dentro de un runtime de tokio. La tarea termina sola
    /// cuando se suelta el último `Arc` del coordinador.
    pub fn start(
        resolver: R,
        transport: V,
        announcer: Arc<dyn Announcer>,
        settings: CoordinatorSettings,
    ) -> Arc<Self> {
        let (completions, receiver) = mpsc::unbounded_channel();

        let coordinator = Arc::new(Self {
            resolver,
            transport,
            announcer,
            store: GuildQueueStore::new(settings.max_queue_size),
            completions,
            display_limit: settings.display_limit,
        });

        tokio::spawn(Self::dispatch_completions(
            Arc::downgrade(&coordinator),
            receiver,
        ));

        coordinator
    }

    async fn dispatch_completions(
        coordinator: Weak<Self>,
        mut receiver: UnboundedReceiver<CompletionEvent>,
    ) {
        while let Some(event) = receiver.recv().await {
            let Some(coordinator) = coordinator.upgrade() else {
                break;
            };
            debug!(
                "Fin de pista recibido en guild {} (token {})",
                event.guild_id, event.token
            );
            tokio::spawn(async move { coordinator.on_completion(event).await });
        }

        debug!("Despachador de fines de pista terminado");
    }

    /// Resuelve la consulta y la reproduce ya o la encola.
    pub async fn play(&self, request: PlayRequest) -> Result<PlayOutcome, PlayError> {
        let PlayRequest {
            guild_id,
            voice_channel,
            text_channel,
            requested_by,
            query,
        } = request;

        self.store.set_last_channel(guild_id, text_channel);

        let slot = self.store.get(guild_id);
        let epoch = slot.lock().await.epoch;

        // Sin lock: puede tardar segundos
        let track = match self.resolver.resolve(&query).await {
            Ok(track) => track.with_requested_by(requested_by),
            Err(e) => {
                warn!("❌ No se pudo resolver `{}` en guild {}: {}", query, guild_id, e);
                return Err(e.into());
            }
        };

        let mut state = slot.lock().await;
        if state.epoch != epoch {
            info!(
                "⏹️ Se descarta `{}`: la guild {} se detuvo durante la búsqueda",
                track.title(),
                guild_id
            );
            return Err(PlayError::Superseded);
        }

        let title = track.title().to_owned();

        if matches!(state.phase, Phase::Connecting | Phase::Playing) {
            self.follow_requester(&mut state, guild_id, voice_channel)
                .await;
            let position = state.queue.push(track)?;
            return Ok(PlayOutcome::Enqueued { title, position });
        }

        if let Some(session) = state.transport.clone() {
            // Conectado pero ocioso: arranca directamente
            self.follow_requester(&mut state, guild_id, voice_channel)
                .await;
            self.start_locked(&mut state, guild_id, &session, track)
                .await
                .map_err(PlayError::Playback)?;
            return Ok(PlayOutcome::StartedNowPlaying(title));
        }

        state.phase = Phase::Connecting;
        let epoch = state.epoch;
        let gate = state.connect_gate.clone();
        drop(state);

        // Espera a que un connect descartado termine de soltar la llamada
        let _connect_guard = gate.lock().await;
        if slot.lock().await.epoch != epoch {
            return Err(PlayError::Superseded);
        }

        info!(
            "🔊 Conectando al canal de voz {} en guild {}",
            voice_channel, guild_id
        );
        let connected = self.transport.connect(guild_id, voice_channel).await;

        let mut state = slot.lock().await;
        if state.epoch != epoch {
            drop(state);
            if let Ok(session) = connected {
                if let Err(e) = session.disconnect().await {
                    warn!("No se pudo soltar la conexión descartada en guild {}: {}", guild_id, e);
                }
            }
            return Err(PlayError::Superseded);
        }

        let session = match connected {
            Ok(session) => Arc::new(session),
            Err(e) => {
                error!("❌ No se pudo conectar en guild {}: {}", guild_id, e);
                state.phase = Phase::Idle;
                let discarded = state.queue.clear();
                if discarded > 0 {
                    warn!(
                        "Se descartan {} canciones encoladas durante la conexión en guild {}",
                        discarded, guild_id
                    );
                }
                return Err(PlayError::Connect(e));
            }
        };

        state.transport = Some(session.clone());
        state.voice_channel = Some(voice_channel);

        match self.start_locked(&mut state, guild_id, &session, track).await {
            Ok(_) => Ok(PlayOutcome::StartedNowPlaying(title)),
            Err(e) => {
                warn!("❌ No se pudo iniciar `{}` en guild {}: {}", title, guild_id, e);
                // Lo encolado mientras conectábamos sigue su curso
                let next = self.advance_locked(&mut state, guild_id).await;
                drop(state);
                if let Some(summary) = next {
                    self.announce(guild_id, &summary).await;
                }
                Err(PlayError::Playback(e))
            }
        }
    }

    /// Avanza la cola tras el fin de la pista actual.
    pub async fn on_completion(&self, event: CompletionEvent) {
        let guild_id = event.guild_id;
        let Some(slot) = self.store.existing(guild_id) else {
            return;
        };

        let mut state = slot.lock().await;
        let is_current = state
            .current
            .as_ref()
            .is_some_and(|playing| playing.token == event.token);
        if !is_current {
            debug!(
                "Fin obsoleto ignorado en guild {} (token {})",
                guild_id, event.token
            );
            return;
        }

        match &event.error {
            Some(e) => warn!("⚠️ La pista terminó con error en guild {}: {}", guild_id, e),
            None => debug!("Pista terminada en guild {}", guild_id),
        }

        let next = self.advance_locked(&mut state, guild_id).await;
        drop(state);

        if let Some(summary) = next {
            self.announce(guild_id, &summary).await;
        }
    }

    /// Vacía la cola, corta la pista y desconecta. Sin nada activo no hace nada.
    pub async fn stop(&self, guild_id: GuildId) -> StopOutcome {
        let Some(slot) = self.store.existing(guild_id) else {
            return StopOutcome::NothingPlaying;
        };

        let mut state = slot.lock().await;
        // Invalida también las búsquedas en vuelo
        state.epoch += 1;

        let active = state.transport.is_some()
            || state.current.is_some()
            || state.phase == Phase::Connecting
            || !state.queue.is_empty();
        if !active {
            return StopOutcome::NothingPlaying;
        }

        self.teardown_locked(&mut state, guild_id).await;
        info!("⏹️ Reproducción detenida en guild {}", guild_id);
        StopOutcome::Stopped
    }

    /// El bot fue desconectado desde fuera (kick, canal borrado). Deja la
    /// guild como tras un `stop`. Devuelve `false` si no había conexión.
    pub async fn on_voice_lost(&self, guild_id: GuildId) -> bool {
        let Some(slot) = self.store.existing(guild_id) else {
            return false;
        };

        let mut state = slot.lock().await;
        let Some(session) = state.transport.clone() else {
            return false;
        };
        if session.is_connected().await {
            debug!("Aviso de desconexión obsoleto en guild {}, la sesión sigue viva", guild_id);
            return false;
        }

        state.epoch += 1;
        self.teardown_locked(&mut state, guild_id).await;
        warn!("🔌 Conexión de voz perdida en guild {}, cola descartada", guild_id);
        true
    }

    async fn teardown_locked(&self, state: &mut State<R, V>, guild_id: GuildId) {
        state.phase = Phase::Draining;
        state.queue.clear();
        state.current = None;
        state.voice_channel = None;

        if let Some(session) = state.transport.take() {
            session.stop_current().await;
            if let Err(e) = session.disconnect().await {
                warn!("No se pudo desconectar en guild {}: {}", guild_id, e);
            }
        }

        state.phase = Phase::Idle;
    }

    /// Corta la pista actual; el fin de pista normal avanza la cola.
    pub async fn skip(&self, guild_id: GuildId) -> SkipOutcome {
        let Some(slot) = self.store.existing(guild_id) else {
            return SkipOutcome::NothingPlaying;
        };

        let state = slot.lock().await;
        let (Some(current), Some(session)) = (&state.current, &state.transport) else {
            return SkipOutcome::NothingPlaying;
        };

        info!("⏭️ Saltando {} en guild {}", current.summary.title, guild_id);
        session.stop_current().await;
        SkipOutcome::Skipped
    }

    pub async fn list_queue(&self, guild_id: GuildId) -> QueueListing {
        match self.store.existing(guild_id) {
            Some(slot) => slot.lock().await.queue.listing(self.display_limit),
            None => QueueListing::default(),
        }
    }

    pub async fn now_playing(&self, guild_id: GuildId) -> Option<TrackSummary> {
        let slot = self.store.existing(guild_id)?;
        let state = slot.lock().await;
        state.current.as_ref().map(|playing| playing.summary.clone())
    }

    #[cfg(test)]
    pub async fn phase(&self, guild_id: GuildId) -> Phase {
        match self.store.existing(guild_id) {
            Some(slot) => slot.lock().await.phase,
            None => Phase::Idle,
        }
    }

    async fn start_locked(
        &self,
        state: &mut State<R, V>,
        guild_id: GuildId,
        session: &V::Session,
        track: Track<R::Stream>,
    ) -> Result<TrackSummary, TransportError> {
        let token = state.issue_token();
        let summary = track.summary().clone();
        let notifier = CompletionNotifier::new(guild_id, token, self.completions.clone());

        session.play(track, notifier).await?;

        info!("🎵 Reproduciendo: {} en guild {}", summary.title, guild_id);
        state.current = Some(NowPlaying {
            summary: summary.clone(),
            token,
        });
        state.phase = Phase::Playing;
        Ok(summary)
    }

    /// Arranca la siguiente pista que funcione. Cada intento consume una pista
    /// de la cola, así que hay como mucho `len` intentos.
    async fn advance_locked(
        &self,
        state: &mut State<R, V>,
        guild_id: GuildId,
    ) -> Option<TrackSummary> {
        state.current = None;

        let Some(session) = state.transport.clone() else {
            state.queue.clear();
            state.phase = Phase::Idle;
            return None;
        };

        let attempts = state.queue.len();
        for _ in 0..attempts {
            let Some(track) = state.queue.pop_front() else {
                break;
            };
            let title = track.title().to_owned();

            match self.start_locked(state, guild_id, &session, track).await {
                Ok(summary) => return Some(summary),
                Err(e) => warn!("⏭️ Saltando `{}` en guild {}: {}", title, guild_id, e),
            }
        }

        info!("📭 Cola terminada en guild {}, conexión en espera", guild_id);
        state.phase = Phase::Idle;
        None
    }

    async fn follow_requester(
        &self,
        state: &mut State<R, V>,
        guild_id: GuildId,
        voice_channel: ChannelId,
    ) {
        let Some(session) = state.transport.clone() else {
            return;
        };
        if state.voice_channel == Some(voice_channel) {
            return;
        }

        match session.move_to(voice_channel).await {
            Ok(()) => {
                info!("🔀 Movido al canal de voz {} en guild {}", voice_channel, guild_id);
                state.voice_channel = Some(voice_channel);
            }
            Err(e) => warn!("No se pudo mover al canal {} en guild {}: {}", voice_channel, guild_id, e),
        }
    }

    async fn announce(&self, guild_id: GuildId, track: &TrackSummary) {
        let channels = self.announcer.guild_channels(guild_id);
        let Some(channel_id) = self.store.last_channel(guild_id, &channels) else {
            debug!("Sin canal para anunciar en guild {}", guild_id);
            return;
        };

        if let Err(e) = self.announcer.now_playing(channel_id, track).await {
            warn!("No se pudo anunciar la canción en guild {}: {:?}", guild_id, e);
        }
    }
}
