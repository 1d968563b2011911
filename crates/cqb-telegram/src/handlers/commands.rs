use std::sync::Arc;

use teloxide::prelude::*;

use cqb_core::{
    domain::ChatId,
    formatting::{escape_html, format_cauciones},
    messaging::types::ChatAction,
    ports::QuoteSource,
};

use crate::router::AppState;

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

fn help_text(market: &str) -> String {
    format!(
        "🤖 <b>Bot de cauciones</b>\n\n\
<b>📋 Comandos:</b>\n\
/cauciones - Cotización de cauciones en {}\n\
/help - Muestra esta ayuda\n\n\
Cualquier otro mensaje se devuelve como eco.",
        escape_html(market)
    )
}

/// Look up cauciones and render the reply, keeping the first `limit` rows.
/// Failures become a user-facing message instead of an error.
pub(crate) async fn cauciones_reply(source: &dyn QuoteSource, market: &str, limit: usize) -> String {
    match source.cauciones().await {
        Ok(records) => {
            let shown = &records[..records.len().min(limit)];
            format_cauciones(shown, market)
        }
        Err(e) => {
            tracing::warn!("cauciones lookup failed: {e}");
            format!(
                "⚠️ Error al obtener cauciones: {}",
                escape_html(&e.to_string())
            )
        }
    }
}

pub async fn handle_command(chat_id: i64, text: &str, state: Arc<AppState>) -> ResponseResult<()> {
    let (cmd, _arg) = parse_command(text);
    tracing::info!(chat_id, command = %cmd, "command received");

    let body = match cmd.as_str() {
        "start" | "help" => help_text(&state.cfg.broker.market),

        "cauciones" => {
            let _ = state
                .messenger
                .send_chat_action(ChatId(chat_id), ChatAction::Typing)
                .await;
            cauciones_reply(
                state.quotes.as_ref(),
                &state.cfg.broker.market,
                state.cfg.cauciones_limit,
            )
            .await
        }

        _ => format!(
            "Comando desconocido: <code>/{}</code>. Probá /help.",
            escape_html(&cmd)
        ),
    };

    if let Err(e) = state.messenger.send_html(ChatId(chat_id), &body).await {
        tracing::warn!(chat_id, command = %cmd, "reply failed: {e}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use cqb_core::{domain::QuoteRecord, errors::Error, Result};
    use serde_json::json;

    struct FakeSource {
        result: fn() -> Result<Vec<QuoteRecord>>,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn new(result: fn() -> Result<Vec<QuoteRecord>>) -> Self {
            Self {
                result,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl QuoteSource for FakeSource {
        async fn cauciones(&self) -> Result<Vec<QuoteRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)()
        }
    }

    fn rows(n: usize) -> Result<Vec<QuoteRecord>> {
        Ok((1..=n)
            .map(|i| QuoteRecord(json!({"plazo": i, "tasa": 30.0 + i as f64, "ultimoPrecio": 100})))
            .collect())
    }

    #[test]
    fn parses_plain_and_addressed_commands() {
        assert_eq!(parse_command("/cauciones"), ("cauciones".to_string(), String::new()));
        assert_eq!(
            parse_command("/Cauciones@cqb_bot  7 dias"),
            ("cauciones".to_string(), "7 dias".to_string())
        );
    }

    #[test]
    fn help_lists_commands() {
        let help = help_text("BCBA");
        assert!(help.contains("/cauciones"));
        assert!(help.contains("/help"));
    }

    #[tokio::test]
    async fn reply_shows_only_the_first_rows() {
        let source = FakeSource::new(|| rows(8));
        let reply = cauciones_reply(&source, "BCBA", 5).await;

        assert_eq!(reply.lines().filter(|l| l.starts_with('•')).count(), 5);
        assert!(reply.contains("• Plazo: 1 días | Tasa: 31.0% | Último: 100"));
        assert!(!reply.contains("Plazo: 6 días"));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reply_with_fewer_rows_than_limit() {
        let source = FakeSource::new(|| rows(2));
        let reply = cauciones_reply(&source, "BCBA", 5).await;
        assert_eq!(reply.lines().filter(|l| l.starts_with('•')).count(), 2);
    }

    #[tokio::test]
    async fn reply_reports_errors_to_the_user() {
        let source = FakeSource::new(|| {
            Err(Error::QuoteRetrieval(
                "/api/v2/cotizaciones/cauciones/BCBA: 404 Not Found".to_string(),
            ))
        });
        let reply = cauciones_reply(&source, "BCBA", 5).await;
        assert_eq!(
            reply,
            "⚠️ Error al obtener cauciones: quote retrieval failed: /api/v2/cotizaciones/cauciones/BCBA: 404 Not Found"
        );
    }

    #[tokio::test]
    async fn error_text_is_escaped() {
        let source = FakeSource::new(|| Err(Error::Auth("login rejected: <html>".to_string())));
        let reply = cauciones_reply(&source, "BCBA", 5).await;
        assert!(reply.contains("&lt;html&gt;"));
    }
}
