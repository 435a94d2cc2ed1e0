//! # Bot Module
//!
//! Discord glue for Guild Jukebox.
//!
//! [`JukeboxBot`] implements Serenity's [`EventHandler`]: it registers the
//! slash commands on `ready`, routes interactions to [`handlers`], and tells the
//! coordinator when the bot's own voice connection is dropped from outside.
//!
//! The coordinator itself lives in the client's `TypeMap` under [`JukeboxKey`],
//! and talks back to Discord through [`SerenityAnnouncer`].

use anyhow::Result;
use serenity::{
    all::{
        Cache, ChannelId, ChannelType, Context, CreateMessage, EventHandler, GuildId, Http,
        Interaction, Ready, VoiceState,
    },
    async_trait,
    prelude::TypeMapKey,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub mod commands;
pub mod handlers;

use crate::{
    audio::{
        coordinator::Announcer,
        store::{GuildChannels, TextChannelInfo},
        track::TrackSummary,
    },
    config::Config,
    ui::embeds,
    voice::Jukebox,
};

/// Clave del coordinador en `client.data`
pub struct JukeboxKey;

impl TypeMapKey for JukeboxKey {
    type Value = Arc<Jukebox>;
}

pub struct JukeboxBot {
    config: Arc<Config>,
}

impl JukeboxBot {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Obtiene el coordinador registrado en el contexto
    pub async fn jukebox(ctx: &Context) -> Result<Arc<Jukebox>> {
        let data = ctx.data.read().await;
        data.get::<JukeboxKey>()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Coordinador de música no inicializado"))
    }

    /// Registers slash commands with Discord.
    ///
    /// With `GUILD_ID` set the commands go to that guild only (instant
    /// propagation, meant for development); otherwise they are global.
    async fn register_commands(&self, ctx: &Context) -> Result<()> {
        info!("📝 Registrando comandos slash...");
        info!("🔧 Application ID: {}", self.config.application_id);

        match self.config.guild_id {
            Some(guild_id) => {
                let guild_id = GuildId::new(guild_id);

                if !ctx.cache.guilds().contains(&guild_id) {
                    warn!("⚠️ El bot no está en la guild especificada: {}", guild_id);
                    return Ok(());
                }

                commands::register_guild_commands(ctx, guild_id)
                    .await
                    .map_err(|e| {
                        error!("❌ Error registrando comandos de guild: {:?}", e);
                        anyhow::anyhow!("No se pudieron registrar comandos de guild. Verifica que el bot tenga permisos de 'applications.commands' en la guild.")
                    })?;
                info!("✅ Comandos de guild registrados para: {}", guild_id);
            }
            None => {
                commands::register_global_commands(ctx).await.map_err(|e| {
                    error!("❌ Error registrando comandos globales: {:?}", e);
                    anyhow::anyhow!("No se pudieron registrar comandos globales. Verifica que el bot tenga permisos de 'applications.commands'.")
                })?;
                info!("✅ Comandos globales registrados");
            }
        }

        Ok(())
    }
}

#[async_trait]
impl EventHandler for JukeboxBot {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("✅ {} está conectado!", ready.user.name);

        if let Err(e) = self.register_commands(&ctx).await {
            error!("Error al registrar comandos: {:?}", e);
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command) = interaction {
            let name = command.data.name.clone();
            if let Err(e) = handlers::handle_command(&ctx, command).await {
                error!("Error al manejar comando /{}: {:?}", name, e);
            }
        }
    }

    async fn voice_state_update(&self, ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        let bot_id = ctx.cache.current_user().id;
        if new.user_id != bot_id || new.channel_id.is_some() {
            return;
        }
        let Some(guild_id) = new.guild_id else {
            return;
        };

        debug!(
            "Bot fuera de voz en guild {} (antes en {:?})",
            guild_id,
            old.and_then(|state| state.channel_id)
        );

        match Self::jukebox(&ctx).await {
            Ok(jukebox) => {
                jukebox.on_voice_lost(guild_id).await;
            }
            Err(e) => error!("{:?}", e),
        }
    }
}

/// Publica los avisos "now playing" usando el cliente de Serenity.
pub struct SerenityAnnouncer {
    cache: Arc<Cache>,
    http: Arc<Http>,
}

impl SerenityAnnouncer {
    pub fn new(cache: Arc<Cache>, http: Arc<Http>) -> Self {
        Self { cache, http }
    }
}

#[async_trait]
impl Announcer for SerenityAnnouncer {
    fn guild_channels(&self, guild_id: GuildId) -> GuildChannels {
        let bot_id = self.cache.current_user().id;
        let Some(guild) = self.cache.guild(guild_id) else {
            return GuildChannels::default();
        };
        let member = guild.members.get(&bot_id);

        let mut channels: Vec<_> = guild
            .channels
            .values()
            .filter(|channel| channel.kind == ChannelType::Text)
            .collect();
        channels.sort_by_key(|channel| (channel.position, channel.id));

        GuildChannels::new(
            channels
                .into_iter()
                .map(|channel| TextChannelInfo {
                    id: channel.id,
                    can_send: member.is_some_and(|member| {
                        guild
                            .user_permissions_in(channel, member)
                            .send_messages()
                    }),
                })
                .collect(),
        )
    }

    async fn now_playing(&self, channel_id: ChannelId, track: &TrackSummary) -> Result<()> {
        channel_id
            .send_message(
                &self.http,
                CreateMessage::new().embed(embeds::now_playing_embed(track)),
            )
            .await?;

        Ok(())
    }
}
