//! Telegram front end
//!
//! Long-polls the Bot API. Messages from one user are handled in arrival
//! order; different users are served concurrently.
//! Allow-listed users (and admins) run the `/start` -> link -> PDF
//! conversation; admins additionally manage the allow-list.

pub mod admin;
pub mod commands;
pub mod conversation;
pub mod telegram;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use linkpdf_core::Generator;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::store::{AllowList, StoreError};
use commands::{parse_command, Command};
use conversation::{transition, Action, ChatState, Input};
use telegram::{
    ChatTransport, Message, OutgoingDocument, TelegramClient, TelegramError, MAX_MESSAGE_LEN,
    POLL_TIMEOUT_SECS,
};

const RETRY_DELAY: Duration = Duration::from_secs(5);

const ACCESS_DENIED: &str = "❌ Access denied.\n\n\
    You are not on the list of allowed users. \
    Ask an administrator for access.";

const GREETING: &str = "📄 Clickable PDF generator\n\n\
    Send me a verification link (http/https).\n\
    I will put it behind the button in the PDF and send the file back.";

const HELP: &str = "📄 Clickable PDF generator help\n\n\
    📋 Commands:\n\
    /start - Generate a PDF\n\
    /help - Show this help\n\
    /cancel - Cancel the current operation\n\n\
    🛠️ Admin commands:\n\
    /add_user <id> - Allow a user\n\
    /remove_user <id> - Revoke a user\n\
    /list_users - List allowed users\n\
    /stats - Bot statistics\n\n\
    💡 Send /start, then paste your link.";

const BAD_LINK: &str = "❌ The link must start with http:// or https://";
const IDLE_HINT: &str = "Send /start to generate a PDF.";
const CANCELLED: &str = "❌ Cancelled.";
const GENERATING: &str = "⏳ Generating the PDF with your link...";
const DONE_CAPTION: &str = "✅ Done! The button in the PDF is clickable.";
const STORE_UNAVAILABLE: &str = "❌ The user database is unavailable, try again later.";

#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Telegram(#[from] TelegramError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Everything a message handler needs
pub struct BotContext {
    transport: Arc<dyn ChatTransport>,
    generator: Arc<Generator>,
    store: AllowList,
    admins: HashSet<i64>,
    output_filename: String,
    conversations: Mutex<HashMap<i64, ChatState>>,
}

impl BotContext {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        generator: Arc<Generator>,
        store: AllowList,
        admins: HashSet<i64>,
        output_filename: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            generator,
            store,
            admins,
            output_filename: output_filename.into(),
            conversations: Mutex::new(HashMap::new()),
        }
    }

    async fn reply(&self, chat_id: i64, text: &str) -> Result<(), BotError> {
        self.transport.send_message(chat_id, text).await?;
        Ok(())
    }

    async fn has_access(&self, user_id: i64) -> Result<bool, StoreError> {
        if admin::is_admin(&self.admins, user_id) {
            return Ok(true);
        }
        self.store.is_allowed(user_id).await
    }

    async fn advance(&self, user_id: i64, input: Input<'_>) -> Action {
        let mut conversations = self.conversations.lock().await;
        let state = conversations.get(&user_id).copied().unwrap_or_default();
        let (next, action) = transition(state, input);
        debug!("User {} conversation {:?} -> {:?}", user_id, state, next);
        if next == ChatState::Idle {
            conversations.remove(&user_id);
        } else {
            conversations.insert(user_id, next);
        }
        action
    }

    async fn reset(&self, user_id: i64) {
        self.conversations.lock().await.remove(&user_id);
    }

    /// Handle one incoming message
    pub async fn handle_message(&self, message: &Message) -> Result<(), BotError> {
        let (Some(user), Some(text)) = (message.from.as_ref(), message.text.as_deref()) else {
            return Ok(());
        };
        let chat_id = message.chat.id;
        info!(
            "Message from user {} (@{})",
            user.id,
            user.username.as_deref().unwrap_or("-")
        );

        let command = parse_command(text);

        if let Some(command) = command.as_ref().filter(|c| c.is_admin_only()) {
            if !admin::is_admin(&self.admins, user.id) {
                warn!("User {} tried admin command {:?}", user.id, command);
                return self.reply(chat_id, admin::NOT_ADMIN).await;
            }
            return self.run_admin(chat_id, user.id, command).await;
        }

        let allowed = match self.has_access(user.id).await {
            Ok(allowed) => allowed,
            Err(e) => {
                error!("Allow-list lookup for user {} failed: {}", user.id, e);
                return self.reply(chat_id, STORE_UNAVAILABLE).await;
            }
        };
        if !allowed {
            warn!("Denied access to user {}", user.id);
            self.reset(user.id).await;
            return self.reply(chat_id, ACCESS_DENIED).await;
        }

        let action = match command {
            Some(Command::Help) => return self.reply(chat_id, HELP).await,
            Some(Command::Unknown(name)) => {
                debug!("Unknown command /{}", name);
                return self.reply(chat_id, HELP).await;
            }
            Some(Command::Start) => self.advance(user.id, Input::Start).await,
            Some(Command::Cancel) => self.advance(user.id, Input::Cancel).await,
            // Admin commands were dispatched above
            Some(_) => return Ok(()),
            None => self.advance(user.id, Input::Text(text)).await,
        };

        match action {
            Action::PromptForLink => self.reply(chat_id, GREETING).await,
            Action::Cancelled => self.reply(chat_id, CANCELLED).await,
            Action::RejectLink => self.reply(chat_id, BAD_LINK).await,
            Action::IdleHint => self.reply(chat_id, IDLE_HINT).await,
            Action::Generate(url) => self.deliver(chat_id, &url).await,
        }
    }

    async fn deliver(&self, chat_id: i64, url: &str) -> Result<(), BotError> {
        self.reply(chat_id, GENERATING).await?;

        match self.generator.generate(url).await {
            Ok(document) => {
                let upload = OutgoingDocument {
                    filename: self.output_filename.clone(),
                    media_type: document.media_type,
                    bytes: document.bytes,
                    caption: Some(DONE_CAPTION.to_string()),
                };
                self.transport.send_document(chat_id, upload).await?;
                info!("Sent PDF to chat {}", chat_id);
                Ok(())
            }
            Err(e) => {
                error!("PDF generation for chat {} failed: {}", chat_id, e);
                self.reply(chat_id, &format!("❌ Error: {}", e.user_message()))
                    .await
            }
        }
    }

    async fn run_admin(&self, chat_id: i64, caller: i64, command: &Command) -> Result<(), BotError> {
        let replies = match command {
            Command::AddUser(arg) => {
                vec![admin::add_user(&self.store, caller, arg.as_deref()).await?]
            }
            Command::RemoveUser(arg) => vec![admin::remove_user(&self.store, arg.as_deref()).await?],
            Command::ListUsers => admin::list_users(&self.store, MAX_MESSAGE_LEN).await?,
            Command::Stats => vec![admin::stats(&self.store, &self.admins, caller).await?],
            _ => Vec::new(),
        };

        for reply in replies {
            self.reply(chat_id, &reply).await?;
        }
        Ok(())
    }
}

/// Per-user chains of handler tasks.
///
/// Each user's messages run one after another in arrival order; different
/// users run concurrently.
#[derive(Default)]
struct UserQueues {
    tails: HashMap<i64, JoinHandle<()>>,
}

impl UserQueues {
    fn dispatch(&mut self, context: &Arc<BotContext>, message: Message) {
        let user_id = message.from.as_ref().map_or(message.chat.id, |user| user.id);
        let previous = self.tails.remove(&user_id);
        let context = context.clone();

        let handle = tokio::spawn(async move {
            if let Some(previous) = previous {
                // A failed predecessor must not block the rest of the queue
                let _ = previous.await;
            }
            if let Err(e) = context.handle_message(&message).await {
                error!("Failed to handle message in chat {}: {}", message.chat.id, e);
            }
        });
        self.tails.insert(user_id, handle);
    }

    fn prune(&mut self) {
        self.tails.retain(|_, handle| !handle.is_finished());
    }
}

/// Poll for updates until the process exits
pub async fn run(client: TelegramClient, context: Arc<BotContext>) {
    info!("Telegram bot polling started");
    let mut offset: Option<i64> = None;
    let mut queues = UserQueues::default();

    loop {
        let updates = match client.get_updates(offset, POLL_TIMEOUT_SECS).await {
            Ok(updates) => updates,
            Err(e) => {
                warn!("getUpdates failed: {}; retrying in {:?}", e, RETRY_DELAY);
                tokio::time::sleep(RETRY_DELAY).await;
                continue;
            }
        };

        queues.prune();
        for update in updates {
            offset = Some(update.update_id + 1);
            if let Some(message) = update.message {
                queues.dispatch(&context, message);
            }
        }
    }
}
