//! Telegram update handlers.
//!
//! Each handler validates the sender, then either answers a command or echoes
//! plain text back.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use cqb_core::domain::UserId;
use cqb_core::security::is_authorized;

use crate::router::AppState;

mod commands;
mod text;

const UNAUTHORIZED_REPLY: &str = "No autorizado. Contactá al dueño del bot para pedir acceso.";

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let user_id = msg.from().map(|u| UserId(u.id.0 as i64));

    if !is_authorized(user_id, &state.cfg.telegram_allowed_users) {
        tracing::warn!(user = ?user_id, "unauthorized message ignored");
        let _ = bot
            .send_message(msg.chat.id, UNAUTHORIZED_REPLY)
            .await;
        return Ok(());
    }

    let Some(text) = msg.text() else {
        return Ok(());
    };

    if text.starts_with('/') {
        return commands::handle_command(msg.chat.id.0, text, state).await;
    }

    text::handle_text(msg.chat.id.0, text, state).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_reply_is_localized() {
        assert!(UNAUTHORIZED_REPLY.starts_with("No autorizado"));
        assert!(!UNAUTHORIZED_REPLY.contains("Unauthorized"));
    }
}
