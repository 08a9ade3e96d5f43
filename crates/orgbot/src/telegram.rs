//! Telegram transport: dispatch schema and message handlers
//!
//! All conversation decisions live in [`IntakeFlow`]; this module only
//! maps inbound updates to flow calls and flow output back to Bot API
//! requests.

use std::sync::Arc;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{InputFile, KeyboardButton, KeyboardMarkup, ParseMode, ReplyMarkup};
use teloxide::utils::command::BotCommands;

use orgbot_core::{IntakeFlow, Keyboard, Outbound, Turn, texts};
use orgbot_storage::{RecordSink, SinkHandle};

use crate::config::Config;
use crate::export;

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "начать анкету")]
    Start,
    #[command(description = "показать это сообщение")]
    Help,
    #[command(description = "отменить анкету")]
    Cancel,
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
pub enum AdminCommand {
    #[command(description = "выгрузить список организаторов")]
    OrgList,
}

pub fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    use dptree::case;

    let commands = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Start].endpoint(start))
        .branch(case![Command::Help].endpoint(help))
        .branch(case![Command::Cancel].endpoint(cancel));

    let admin_commands = teloxide::filter_command::<AdminCommand, _>()
        .filter(|msg: Message, config: Arc<Config>| config.is_admin(msg.chat.id.0))
        .branch(case![AdminCommand::OrgList].endpoint(orglist));

    Update::filter_message()
        .branch(admin_commands)
        .branch(commands)
        .endpoint(on_message)
}

async fn start(
    bot: Bot,
    msg: Message,
    flow: Arc<IntakeFlow>,
    handle: SinkHandle,
) -> HandlerResult {
    let turn = flow.start(msg.chat.id.0);
    deliver(&bot, &msg, turn, &handle).await
}

async fn help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

async fn cancel(bot: Bot, msg: Message, flow: Arc<IntakeFlow>) -> HandlerResult {
    let reply = if flow.cancel(msg.chat.id.0) {
        texts::CANCELLED
    } else {
        texts::NOTHING_TO_CANCEL
    };
    bot.send_message(msg.chat.id, reply)
        .reply_markup(ReplyMarkup::kb_remove())
        .await?;
    Ok(())
}

async fn orglist(bot: Bot, msg: Message, sink: Arc<dyn RecordSink>) -> HandlerResult {
    let records = sink.list().await?;
    bot.send_message(
        msg.chat.id,
        format!("Найдено организаторов: {}", records.len()),
    )
    .await?;

    let data = export::to_csv(&records)?;
    bot.send_document(msg.chat.id, InputFile::memory(data).file_name("orglist.csv"))
        .await?;
    Ok(())
}

async fn on_message(
    bot: Bot,
    msg: Message,
    flow: Arc<IntakeFlow>,
    handle: SinkHandle,
) -> HandlerResult {
    match msg.text() {
        Some(text) => {
            let turn = flow.handle_text(msg.chat.id.0, msg.chat.username(), text);
            deliver(&bot, &msg, turn, &handle).await
        }
        // Stickers and the like: nudge only mid-conversation, otherwise
        // stay silent.
        None if flow.is_active(msg.chat.id.0) => {
            bot.send_message(msg.chat.id, texts::SEND_TEXT).await?;
            Ok(())
        }
        None => Ok(()),
    }
}

/// Sends the turn's replies in order, then hands a finalized record to
/// the background writer. The append never blocks this handler.
async fn deliver(bot: &Bot, msg: &Message, turn: Turn, handle: &SinkHandle) -> HandlerResult {
    for outbound in &turn.replies {
        send_outbound(bot, msg, outbound).await?;
    }
    if let Some(record) = turn.record {
        handle.submit(record);
    }
    Ok(())
}

async fn send_outbound(bot: &Bot, msg: &Message, outbound: &Outbound) -> HandlerResult {
    let mut request = bot.send_message(msg.chat.id, &outbound.text);
    if outbound.html {
        request = request.parse_mode(ParseMode::Html);
    }
    match outbound.keyboard {
        Keyboard::Courses => request = request.reply_markup(course_keyboard()),
        Keyboard::Remove => request = request.reply_markup(ReplyMarkup::kb_remove()),
        Keyboard::Inherit => {}
    }
    request.await?;
    Ok(())
}

fn course_keyboard() -> ReplyMarkup {
    let rows = texts::COURSE_CHOICES
        .iter()
        .map(|row| row.iter().map(|label| KeyboardButton::new(*label)).collect::<Vec<_>>());
    ReplyMarkup::Keyboard(KeyboardMarkup::new(rows).one_time_keyboard())
}
