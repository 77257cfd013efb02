//! Console abstraction used by the connection loop for send triggers.

use async_trait::async_trait;
use std::io;
use tokio::sync::mpsc;

/// Source of console lines plus prompt output.
#[async_trait]
pub trait Console: Send {
    /// Next line, without its newline. `Ok(None)` at end of input.
    ///
    /// Must be cancel safe: the loop polls it inside `select!`.
    async fn next_line(&mut self) -> io::Result<Option<String>>;

    /// Show a prompt before the next line.
    async fn show_prompt(&mut self, prompt: &str) -> io::Result<()>;

    /// Called after a continuation line was accepted, so the console can
    /// redraw it without the marker.
    async fn redraw_continued(&mut self, _prompt: &str, _echoed: &str, _cleaned: &str) -> io::Result<()> {
        Ok(())
    }
}

/// Console fed from a channel. Prompts are discarded.
pub struct ChannelConsole {
    rx: mpsc::Receiver<String>,
}

impl ChannelConsole {
    /// Create a console and the sender that feeds it lines.
    pub fn new(buffer: usize) -> (Self, mpsc::Sender<String>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { rx }, tx)
    }
}

#[async_trait]
impl Console for ChannelConsole {
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.rx.recv().await)
    }

    async fn show_prompt(&mut self, _prompt: &str) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_console_ends_when_sender_dropped() {
        let (mut console, tx) = ChannelConsole::new(4);
        tx.send("one".to_string()).await.unwrap();
        drop(tx);
        assert_eq!(console.next_line().await.unwrap().as_deref(), Some("one"));
        assert!(console.next_line().await.unwrap().is_none());
    }
}
