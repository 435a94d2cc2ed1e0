use dashmap::DashMap;
use serenity::model::id::{ChannelId, GuildId};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use super::{queue::TrackQueue, track::TrackSummary};

/// Fase de la máquina de estados de una guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Sin pista activa. El transporte puede seguir conectado y ocioso.
    Idle,
    /// Estableciendo la conexión de voz para la primera pista.
    Connecting,
    /// Transporte conectado con exactamente una pista activa.
    Playing,
    /// `stop` en curso: cola vaciada, transporte desmontándose.
    Draining,
}

/// Pista que el transporte está reproduciendo ahora.
#[derive(Debug, Clone)]
pub struct NowPlaying {
    pub summary: TrackSummary,
    /// Identifica la llamada a `play`; los fines con otro token son obsoletos.
    pub token: u64,
}

/// Estado mutable de una guild. Sólo se toca con el lock de su slot.
#[derive(Debug)]
pub struct GuildState<S, T> {
    pub phase: Phase,
    pub queue: TrackQueue<S>,
    pub transport: Option<Arc<T>>,
    pub voice_channel: Option<ChannelId>,
    pub current: Option<NowPlaying>,
    /// Se incrementa con cada `stop`; invalida resoluciones y conexiones en vuelo.
    pub epoch: u64,
    pub(crate) next_token: u64,
    /// Un solo `connect` en vuelo por guild, incluido el desmontaje de uno descartado.
    pub(crate) connect_gate: Arc<Mutex<()>>,
}

impl<S, T> GuildState<S, T> {
    fn new(max_queue_size: usize) -> Self {
        Self {
            phase: Phase::Idle,
            queue: TrackQueue::new(max_queue_size),
            transport: None,
            voice_channel: None,
            current: None,
            epoch: 0,
            next_token: 0,
            connect_gate: Arc::new(Mutex::new(())),
        }
    }

    pub(crate) fn issue_token(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }
}

pub type GuildSlot<S, T> = Arc<Mutex<GuildState<S, T>>>;

/// Canal de texto de una guild tal como lo ve el bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChannelInfo {
    pub id: ChannelId,
    pub can_send: bool,
}

/// Foto de los canales de texto de una guild, en el orden en que aparecen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuildChannels {
    channels: Vec<TextChannelInfo>,
}

impl GuildChannels {
    pub fn new(channels: Vec<TextChannelInfo>) -> Self {
        Self { channels }
    }

    fn is_usable(&self, channel_id: ChannelId) -> bool {
        self.channels
            .iter()
            .any(|c| c.id == channel_id && c.can_send)
    }

    fn first_usable(&self) -> Option<ChannelId> {
        self.channels.iter().find(|c| c.can_send).map(|c| c.id)
    }
}

/// Estado de música por guild, particionado por id de guild.
///
/// Las entradas se crean con el primer uso y viven lo que dure el proceso.
/// No hay lock global: cada guild tiene su propio `Mutex`, y el canal de texto
/// recordado vive aparte para poder leerlo sin tocar ese lock.
pub struct GuildQueueStore<S, T> {
    slots: DashMap<GuildId, GuildSlot<S, T>>,
    last_channels: DashMap<GuildId, ChannelId>,
    max_queue_size: usize,
}

impl<S, T> GuildQueueStore<S, T> {
    pub fn new(max_queue_size: usize) -> Self {
        Self {
            slots: DashMap::new(),
            last_channels: DashMap::new(),
            max_queue_size,
        }
    }

    /// Slot de la guild, creándolo vacío si es la primera vez
    pub fn get(&self, guild_id: GuildId) -> GuildSlot<S, T> {
        self.slots
            .entry(guild_id)
            .or_insert_with(|| Arc::new(Mutex::new(GuildState::new(self.max_queue_size))))
            .clone()
    }

    /// Slot de la guild sólo si ya existe
    pub fn existing(&self, guild_id: GuildId) -> Option<GuildSlot<S, T>> {
        self.slots.get(&guild_id).map(|slot| slot.clone())
    }

    #[cfg(test)]
    pub async fn clear(&self, guild_id: GuildId) -> usize {
        match self.existing(guild_id) {
            Some(slot) => slot.lock().await.queue.clear(),
            None => 0,
        }
    }

    pub fn set_last_channel(&self, guild_id: GuildId, channel_id: ChannelId) {
        self.last_channels.insert(guild_id, channel_id);
    }

    /// Canal donde anunciar "now playing".
    ///
    /// Usa el último canal donde se pidió `/play` si sigue existiendo y el bot
    /// puede escribir ahí; si no, el primer canal con permiso de envío.
    pub fn last_channel(&self, guild_id: GuildId, guild: &GuildChannels) -> Option<ChannelId> {
        let remembered = self.last_channels.get(&guild_id).map(|c| *c);

        match remembered {
            Some(channel_id) if guild.is_usable(channel_id) => Some(channel_id),
            Some(channel_id) => {
                debug!(
                    "Canal recordado {} ya no es usable en guild {}, buscando otro",
                    channel_id, guild_id
                );
                guild.first_usable()
            }
            None => guild.first_usable(),
        }
    }
}
