//! Input composer: turns console lines into one logical message body.
//!
//! States: `Idle → Collecting → Complete`. In multi-line mode a line ending
//! in the continuation marker keeps the composer collecting; the first line
//! without it completes the message. Single-line mode completes on every line.

/// Primary prompt.
pub const PRIMARY_PROMPT: &str = "> ";

/// Prompt shown while collecting continuation lines.
pub const CONTINUATION_PROMPT: &str = "~ ";

/// Trailing character that continues a multi-line message.
pub const CONTINUATION_MARKER: char = '\\';

/// How console input is composed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Every line is a complete message.
    SingleLine,
    /// Lines ending in `\` continue onto the next line.
    MultiLine,
}

impl InputMode {
    /// Mode for the `--multiline` flag value.
    pub fn from_flag(multiline: bool) -> Self {
        if multiline {
            Self::MultiLine
        } else {
            Self::SingleLine
        }
    }
}

/// Composer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerState {
    Idle,
    Collecting,
    Complete,
}

/// Result of feeding one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeStep {
    /// More lines are needed.
    Continue {
        /// The line as typed, marker included.
        echoed: String,
        /// The line as stored, marker stripped.
        cleaned: String,
    },
    /// A complete message body.
    Complete(String),
}

/// Console input state machine.
#[derive(Debug, Clone)]
pub struct InputComposer {
    mode: InputMode,
    state: ComposerState,
    lines: Vec<String>,
}

impl InputComposer {
    /// Create an idle composer.
    pub fn new(mode: InputMode) -> Self {
        Self {
            mode,
            state: ComposerState::Idle,
            lines: Vec::new(),
        }
    }

    /// Current mode.
    pub fn mode(&self) -> InputMode {
        self.mode
    }

    /// Current state.
    pub fn state(&self) -> ComposerState {
        self.state
    }

    /// Prompt to show before the next line.
    pub fn prompt(&self) -> &'static str {
        match self.state {
            ComposerState::Collecting => CONTINUATION_PROMPT,
            ComposerState::Idle | ComposerState::Complete => PRIMARY_PROMPT,
        }
    }

    /// Feed one console line. A trailing newline is ignored.
    pub fn feed(&mut self, line: &str) -> ComposeStep {
        if self.state == ComposerState::Complete {
            self.state = ComposerState::Idle;
        }
        let line = line.strip_suffix('\n').unwrap_or(line);
        let line = line.strip_suffix('\r').unwrap_or(line);

        if self.mode == InputMode::MultiLine {
            if let Some(cleaned) = line.strip_suffix(CONTINUATION_MARKER) {
                self.lines.push(cleaned.to_string());
                self.state = ComposerState::Collecting;
                return ComposeStep::Continue {
                    echoed: line.to_string(),
                    cleaned: cleaned.to_string(),
                };
            }
        }

        self.lines.push(line.to_string());
        let body = self.lines.join("\n");
        self.lines.clear();
        self.state = ComposerState::Complete;
        ComposeStep::Complete(body)
    }

    /// Discard any partial message. Returns whether anything was discarded.
    pub fn cancel(&mut self) -> bool {
        let discarded = self.state == ComposerState::Collecting;
        self.lines.clear();
        self.state = ComposerState::Idle;
        discarded
    }
}
