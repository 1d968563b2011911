use std::sync::Arc;

use teloxide::prelude::*;

use cqb_core::{domain::ChatId, formatting::escape_html};

use crate::router::AppState;

pub(crate) fn echo_reply(text: &str) -> String {
    format!("Buenas, soy el bot. Tu mensaje es: {}", escape_html(text))
}

pub async fn handle_text(chat_id: i64, text: &str, state: Arc<AppState>) -> ResponseResult<()> {
    if text.trim().is_empty() {
        return Ok(());
    }

    if let Err(e) = state
        .messenger
        .send_html(ChatId(chat_id), &echo_reply(text))
        .await
    {
        tracing::warn!(chat_id, "echo reply failed: {e}");
    }
    Ok(())
}
