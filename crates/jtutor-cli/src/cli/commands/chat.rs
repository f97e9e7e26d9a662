//! Chat command handler: a line-based REPL over `ChatSession`.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use jtutor_core::core::{Applied, ChatSession, SendRejected};
use jtutor_core::providers::GenerativeModel;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

use crate::cli::Tutor;
use crate::cli::output::{Printer, StreamPrinter};

const PROMPT: &str = "you> ";
const BOT_NAME: &str = "JavaBot";

pub async fn run(tutor: &Tutor) -> Result<()> {
    let system = tutor
        .prompts
        .chat_system()
        .context("render chat system prompt")?;
    let mut chat = ChatSession::new(Arc::clone(&tutor.model), system);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    converse(&mut chat, &mut lines, &mut io::stdout(), Printer::stdout()).await
}

/// Runs the REPL until `/quit` or end of input.
pub async fn converse<M, R>(
    chat: &mut ChatSession<M>,
    lines: &mut Lines<R>,
    out: &mut impl Write,
    printer: Printer,
) -> Result<()>
where
    M: GenerativeModel,
    R: AsyncBufRead + Unpin,
{
    if let Some(welcome) = chat.messages().first() {
        printer.write_text(out, &welcome.text)?;
    }

    loop {
        write!(out, "\n{PROMPT}")?;
        out.flush()?;
        let Some(line) = lines.next_line().await.context("read input")? else {
            writeln!(out)?;
            break;
        };

        match line.trim() {
            "/quit" | "/exit" => break,
            "/clear" => {
                chat.clear();
                if let Some(notice) = chat.messages().first() {
                    printer.write_text(out, &notice.text)?;
                }
                continue;
            }
            _ => {}
        }

        match chat.send(&line) {
            Ok(_) => {}
            Err(SendRejected::Blank) => continue,
            Err(rejected @ SendRejected::Busy) => {
                writeln!(out, "{}", printer.error(&rejected.to_string()))?;
                continue;
            }
        }
        let Some(reply_id) = chat.messages().last().map(|message| message.id.clone()) else {
            continue;
        };

        writeln!(out, "{}", printer.bold(BOT_NAME))?;
        let mut stream = StreamPrinter::new(printer);
        while chat.is_streaming() {
            if let Applied::Fragment = chat.next_update().await {
                stream.update(out, reply_text(chat, &reply_id))?;
            }
        }
        stream.finish(out, reply_text(chat, &reply_id))?;

        // A failed reply is followed by its own error message.
        if let Some(last) = chat.messages().last().filter(|last| last.id != reply_id) {
            printer.write_text(out, &last.text)?;
        }
    }
    Ok(())
}

fn reply_text<'a, M: GenerativeModel>(chat: &'a ChatSession<M>, id: &str) -> &'a str {
    chat.messages()
        .iter()
        .find(|message| message.id == id)
        .map_or("", |message| message.text.as_str())
}

#[cfg(test)]
mod tests {
    use futures_util::{StreamExt, stream};
    use jtutor_core::core::chat::{CLEARED_MESSAGE, WELCOME_MESSAGE};
    use jtutor_core::providers::{FragmentStream, GenerateRequest, ProviderError, ProviderResult};

    use super::*;

    /// Replies "You said: **<last user turn>**", or fails on "fail".
    struct Echo;

    impl GenerativeModel for Echo {
        async fn generate(&self, _request: GenerateRequest) -> ProviderResult<String> {
            Ok(String::new())
        }

        async fn stream(&self, request: GenerateRequest) -> ProviderResult<FragmentStream> {
            let last = request
                .turns
                .last()
                .map(|turn| turn.text.clone())
                .unwrap_or_default();
            if last == "fail" {
                return Err(ProviderError::timeout("connection reset"));
            }
            let fragments = vec![Ok("You said: ".to_string()), Ok(format!("**{last}**"))];
            Ok(stream::iter(fragments).boxed())
        }
    }

    async fn session(input: &str) -> (ChatSession<Echo>, String) {
        let mut chat = ChatSession::new(Arc::new(Echo), "You are JavaBot");
        let mut lines = input.as_bytes().lines();
        let mut out = Vec::new();
        converse(&mut chat, &mut lines, &mut out, Printer::plain())
            .await
            .unwrap();
        (chat, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_reply_is_printed_and_kept() {
        let (chat, out) = session("what is a class?\n/quit\n").await;
        assert!(out.contains("You said: what is a class?"));
        assert_eq!(chat.messages().len(), 3);
        assert!(!chat.is_streaming());
    }

    #[tokio::test]
    async fn test_blank_lines_are_skipped_and_eof_ends() {
        let (chat, out) = session("\n   \n").await;
        assert_eq!(chat.messages().len(), 1);
        assert_eq!(out.matches(PROMPT).count(), 3);
        assert!(out.contains("I can help you with:"));
        assert!(WELCOME_MESSAGE.contains("I can help you with:"));
    }

    #[tokio::test]
    async fn test_clear_resets_messages() {
        let (chat, out) = session("hello\n/clear\n").await;
        assert_eq!(chat.messages().len(), 1);
        assert_eq!(chat.messages()[0].text, CLEARED_MESSAGE);
        assert!(out.contains(CLEARED_MESSAGE));
    }

    #[tokio::test]
    async fn test_failed_reply_prints_error_message() {
        let (chat, out) = session("fail\n").await;
        assert!(out.contains("I couldn't connect to the server. Please try again."));
        assert_eq!(chat.messages().len(), 4);
    }
}
