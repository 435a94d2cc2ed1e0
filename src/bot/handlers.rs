use anyhow::Result;
use serenity::{
    builder::{
        CreateInteractionResponse, CreateInteractionResponseMessage, EditInteractionResponse,
    },
    model::{
        application::CommandInteraction,
        id::{ChannelId, GuildId, UserId},
    },
    prelude::Context,
};
use tracing::{info, warn};

use crate::{
    audio::coordinator::{PlayOutcome, PlayRequest, SkipOutcome, StopOutcome},
    bot::JukeboxBot,
    ui::embeds,
    voice::Jukebox,
};

const HELP_TEXT: &str = "• `/play <canción>` - Reproduce o agrega a la cola\n\
    • `/stop` - Detiene la música y limpia la cola\n\
    • `/skip` - Salta la canción actual\n\
    • `/queue` - Muestra la cola";

/// Maneja comandos slash
pub async fn handle_command(ctx: &Context, command: CommandInteraction) -> Result<()> {
    let Some(guild_id) = command.guild_id else {
        return respond(
            ctx,
            &command,
            CreateInteractionResponseMessage::new()
                .content("❌ Este comando sólo funciona en un servidor")
                .ephemeral(true),
        )
        .await;
    };

    info!(
        "📝 Comando /{} usado por {} en guild {}",
        command.data.name, command.user.name, guild_id
    );

    let jukebox = JukeboxBot::jukebox(ctx).await?;

    match command.data.name.as_str() {
        "play" => handle_play(ctx, &command, guild_id, &jukebox).await,
        "stop" => handle_stop(ctx, &command, guild_id, &jukebox).await,
        "skip" => handle_skip(ctx, &command, guild_id, &jukebox).await,
        "queue" => handle_queue(ctx, &command, guild_id, &jukebox).await,
        "help" => {
            respond(
                ctx,
                &command,
                CreateInteractionResponseMessage::new()
                    .embed(embeds::info_embed("🎵 Comandos de Música", HELP_TEXT)),
            )
            .await
        }
        _ => {
            respond(
                ctx,
                &command,
                CreateInteractionResponseMessage::new()
                    .content("❌ Comando no reconocido")
                    .ephemeral(true),
            )
            .await
        }
    }
}

async fn handle_play(
    ctx: &Context,
    command: &CommandInteraction,
    guild_id: GuildId,
    jukebox: &Jukebox,
) -> Result<()> {
    let query = command
        .data
        .options
        .iter()
        .find(|opt| opt.name == "query")
        .and_then(|opt| opt.value.as_str())
        .ok_or_else(|| anyhow::anyhow!("Query no proporcionado"))?
        .to_string();

    let voice_channel = match user_voice_channel(ctx, guild_id, command.user.id) {
        Ok(channel_id) => channel_id,
        Err(e) => {
            return respond(
                ctx,
                command,
                CreateInteractionResponseMessage::new()
                    .embed(embeds::error_embed("Sin canal de voz", &e.to_string()))
                    .ephemeral(true),
            )
            .await;
        }
    };

    // Defer la respuesta ya que puede tomar tiempo
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new()),
        )
        .await?;

    let request = PlayRequest {
        guild_id,
        voice_channel,
        text_channel: command.channel_id,
        requested_by: command.user.id,
        query,
    };

    let embed = match jukebox.play(request).await {
        Ok(PlayOutcome::StartedNowPlaying(title)) => embeds::started_embed(&title),
        Ok(PlayOutcome::Enqueued { title, position }) => embeds::enqueued_embed(&title, position),
        Err(e) => {
            warn!("❌ /play falló en guild {}: {}", guild_id, e);
            embeds::error_embed("No se pudo reproducir", &e.to_string())
        }
    };

    command
        .edit_response(&ctx.http, EditInteractionResponse::new().embed(embed))
        .await?;

    Ok(())
}

async fn handle_stop(
    ctx: &Context,
    command: &CommandInteraction,
    guild_id: GuildId,
    jukebox: &Jukebox,
) -> Result<()> {
    let content = match jukebox.stop(guild_id).await {
        StopOutcome::Stopped => "⏹️ Música detenida",
        StopOutcome::NothingPlaying => "❌ No hay música sonando",
    };

    respond(
        ctx,
        command,
        CreateInteractionResponseMessage::new().content(content),
    )
    .await
}

async fn handle_skip(
    ctx: &Context,
    command: &CommandInteraction,
    guild_id: GuildId,
    jukebox: &Jukebox,
) -> Result<()> {
    let content = match jukebox.skip(guild_id).await {
        SkipOutcome::Skipped => "⏭️ Canción saltada",
        SkipOutcome::NothingPlaying => "❌ No hay música sonando",
    };

    respond(
        ctx,
        command,
        CreateInteractionResponseMessage::new().content(content),
    )
    .await
}

async fn handle_queue(
    ctx: &Context,
    command: &CommandInteraction,
    guild_id: GuildId,
    jukebox: &Jukebox,
) -> Result<()> {
    let current = jukebox.now_playing(guild_id).await;
    let listing = jukebox.list_queue(guild_id).await;

    respond(
        ctx,
        command,
        CreateInteractionResponseMessage::new()
            .embed(embeds::queue_embed(current.as_ref(), &listing)),
    )
    .await
}

async fn respond(
    ctx: &Context,
    command: &CommandInteraction,
    message: CreateInteractionResponseMessage,
) -> Result<()> {
    command
        .create_response(&ctx.http, CreateInteractionResponse::Message(message))
        .await?;

    Ok(())
}

fn user_voice_channel(ctx: &Context, guild_id: GuildId, user_id: UserId) -> Result<ChannelId> {
    let guild = guild_id
        .to_guild_cached(&ctx.cache)
        .ok_or_else(|| anyhow::anyhow!("Guild no encontrada en caché"))?;

    let channel_id = guild
        .voice_states
        .get(&user_id)
        .and_then(|voice_state| voice_state.channel_id)
        .ok_or_else(|| anyhow::anyhow!("Debes estar en un canal de voz"))?;

    Ok(channel_id)
}
