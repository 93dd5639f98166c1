use teloxide::prelude::*;
use teloxide::types::InputFile;
use tracing::{error, info};

use common::config::TelegramSettings;

use super::{split_message, Attachment};

/// Telegram caps message text at this many characters.
const MAX_MESSAGE_LENGTH: usize = 4096;

pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramNotifier {
    pub fn new(settings: &TelegramSettings) -> Self {
        Self {
            bot: Bot::new(settings.bot_token.clone()),
            chat_id: ChatId(settings.chat_id),
        }
    }

    /// Best-effort delivery: each failed send is logged and the rest of the
    /// message still goes out.
    pub async fn send(&self, text: &str, attachments: &[Attachment]) {
        for chunk in split_message(text, MAX_MESSAGE_LENGTH) {
            if let Err(e) = self.bot.send_message(self.chat_id, chunk).await {
                error!(error = %e, "failed to send Telegram message");
            }
        }
        for attachment in attachments {
            let photo = InputFile::memory(attachment.bytes.clone())
                .file_name(attachment.file_name.clone());
            if let Err(e) = self.bot.send_photo(self.chat_id, photo).await {
                error!(
                    error = %e,
                    file = %attachment.file_name,
                    "failed to send Telegram photo"
                );
            }
        }
        info!(attachments = attachments.len(), "Telegram notification delivered");
    }
}
