//! Line-oriented console adapter.
//!
//! Each input line becomes one inbound event for a fixed actor:
//! - `/name args...` is a command
//! - `!token` is a menu selection
//! - anything else is free text
//!
//! A multi-line answer (device id, then days) is typed on one line with a
//! literal `\n` between the parts.

use async_trait::async_trait;
use oto_dispatch::{deliver, Dispatcher, Inbound, Outbound, PresentError, Presenter};
use oto_types::ActorId;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Turns one console line into an inbound event. Blank lines give `None`.
pub fn parse_line(actor: ActorId, display_name: &str, line: &str) -> Option<Inbound> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if let Some(command) = line.strip_prefix('/') {
        let mut parts = command.split_whitespace();
        let name = parts.next()?.to_string();
        return Some(Inbound::Command {
            actor,
            display_name: display_name.to_string(),
            name,
            args: parts.map(str::to_string).collect(),
        });
    }
    if let Some(token) = line.strip_prefix('!') {
        return Some(Inbound::selection(actor, token.trim()));
    }
    Some(Inbound::text(actor, line.replace("\\n", "\n")))
}

/// Writes replies as plain text, menus followed by their tokens.
pub struct ConsolePresenter<W> {
    out: Mutex<W>,
}

impl<W: AsyncWrite + Unpin + Send> ConsolePresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> Presenter for ConsolePresenter<W> {
    async fn render(&self, outbound: &Outbound) -> Result<(), PresentError> {
        let mut block = format!("{}\n", outbound.text());
        for choice in outbound.choices() {
            block.push_str(&format!("  !{:<18} {}\n", choice.token, choice.label));
        }
        block.push('\n');

        let mut out = self.out.lock().await;
        out.write_all(block.as_bytes()).await?;
        out.flush().await?;
        Ok(())
    }
}

/// Reads lines until EOF, dispatching each and rendering the replies.
///
/// Each event is handled on the blocking pool, since registry writes may
/// hit the disk. Returns the number of events dispatched.
pub async fn run_console<R>(
    dispatcher: &Arc<Dispatcher>,
    actor: ActorId,
    display_name: &str,
    input: R,
    presenter: &dyn Presenter,
) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut handled = 0;
    while let Some(line) = lines.next_line().await? {
        let Some(inbound) = parse_line(actor, display_name, &line) else {
            continue;
        };
        debug!("Console event: {:?}", inbound);
        let handler = Arc::clone(dispatcher);
        let replies = tokio::task::spawn_blocking(move || handler.handle(inbound))
            .await
            .map_err(std::io::Error::other)?;
        deliver(presenter, &replies).await;
        handled += 1;
    }
    Ok(handled)
}
