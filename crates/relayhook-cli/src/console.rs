//! Terminal console: lines from stdin, prompts and redraws on stdout.

use async_trait::async_trait;
use relayhook_runtime::console::Console;
use std::io;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};
use tracing::warn;
use unicode_width::UnicodeWidthChar;

const DEFAULT_COLUMNS: usize = 80;
const TAB_STOP: usize = 8;

/// Terminal width from `COLUMNS`, or 80.
pub fn terminal_columns() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&c| c > 0)
        .unwrap_or(DEFAULT_COLUMNS)
}

/// Screen rows taken by `prompt` followed by `text` on a terminal `columns`
/// wide.
pub fn rows_used(prompt: &str, text: &str, columns: usize) -> usize {
    let columns = columns.max(1);
    let mut rows = 1;
    let mut col = 0;
    for c in prompt.chars().chain(text.chars()) {
        let width = if c == '\t' {
            TAB_STOP - col % TAB_STOP
        } else {
            c.width().unwrap_or(0)
        };
        if width == 0 {
            continue;
        }
        if col + width > columns {
            rows += 1;
            col = 0;
            if c == '\t' {
                continue;
            }
        }
        col += width;
    }
    rows
}

/// Console over a line reader and a terminal writer.
pub struct TerminalConsole<R, W> {
    input: BufReader<R>,
    pending: Vec<u8>,
    out: W,
    columns: usize,
}

impl TerminalConsole<Stdin, Stdout> {
    /// Console on the process stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout(), terminal_columns())
    }
}

impl<R, W> TerminalConsole<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Console reading lines from `input` and drawing on `out`, `columns` wide.
    pub fn new(input: R, out: W, columns: usize) -> Self {
        Self {
            input: BufReader::new(input),
            pending: Vec::new(),
            out,
            columns,
        }
    }

    #[cfg(test)]
    fn output(&self) -> &W {
        &self.out
    }
}

#[async_trait]
impl<R, W> Console for TerminalConsole<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        // Partial reads stay in `pending`, so a cancelled call loses nothing.
        let read = self.input.read_until(b'\n', &mut self.pending).await?;
        if read == 0 && self.pending.is_empty() {
            return Ok(None);
        }
        let mut bytes = std::mem::take(&mut self.pending);
        if bytes.last() == Some(&b'\n') {
            bytes.pop();
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
        }
        Ok(Some(match String::from_utf8(bytes) {
            Ok(line) => line,
            Err(e) => {
                warn!(len = e.as_bytes().len(), "Console input is not valid UTF-8, replacing invalid bytes");
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        }))
    }

    async fn show_prompt(&mut self, prompt: &str) -> io::Result<()> {
        self.out.write_all(prompt.as_bytes()).await?;
        self.out.flush().await
    }

    async fn redraw_continued(&mut self, prompt: &str, echoed: &str, cleaned: &str) -> io::Result<()> {
        // The terminal already echoed `prompt + echoed` and a newline.
        let rows = rows_used(prompt, echoed, self.columns);
        let redraw = format!("\x1b[{rows}A\r\x1b[J{prompt}{cleaned}\n");
        self.out.write_all(redraw.as_bytes()).await?;
        self.out.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_used_single_row() {
        assert_eq!(rows_used("> ", "Hello\\", 80), 1);
        assert_eq!(rows_used("> ", "", 80), 1);
    }

    #[test]
    fn test_rows_used_wraps() {
        // 2 + 78 fills one row exactly; one more column wraps.
        assert_eq!(rows_used("> ", &"a".repeat(78), 80), 1);
        assert_eq!(rows_used("> ", &"a".repeat(79), 80), 2);
    }

    #[test]
    fn test_rows_used_wide_chars() {
        // Each CJK char is two columns wide: 2 + 5 * 2 = 12 > 10.
        assert_eq!(rows_used("> ", "漢字漢字漢", 10), 2);
    }

    #[test]
    fn test_rows_used_tab_stops() {
        // Prompt to col 2, tab to col 8, then 3 chars: 11 > 10.
        assert_eq!(rows_used("> ", "\tabc", 10), 2);
        assert_eq!(rows_used("> ", "\tab", 10), 1);
    }

    #[tokio::test]
    async fn test_terminal_console_tolerates_invalid_utf8() {
        let input: &[u8] = b"caf\xe9\nok\r\nlast";
        let mut console = TerminalConsole::new(input, Vec::new(), 80);

        assert_eq!(console.next_line().await.unwrap().as_deref(), Some("caf\u{FFFD}"));
        assert_eq!(console.next_line().await.unwrap().as_deref(), Some("ok"));
        assert_eq!(console.next_line().await.unwrap().as_deref(), Some("last"));
        assert!(console.next_line().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_terminal_console_reads_lines_and_prompts() {
        let input: &[u8] = b"first\nsecond\\\n";
        let mut console = TerminalConsole::new(input, Vec::new(), 80);

        console.show_prompt("> ").await.unwrap();
        assert_eq!(console.next_line().await.unwrap().as_deref(), Some("first"));
        assert_eq!(console.next_line().await.unwrap().as_deref(), Some("second\\"));
        console.redraw_continued("> ", "second\\", "second").await.unwrap();
        assert!(console.next_line().await.unwrap().is_none());

        let written = String::from_utf8(console.output().clone()).unwrap();
        assert_eq!(written, "> \x1b[1A\r\x1b[J> second\n");
    }
}
