//! Command extractor and validator (component D).
//!
//! Drives a [`CifDfa`] byte by byte, using its return-to-idle transitions
//! (state [`cif::START`](crate::dfa::START)) as command boundaries, and
//! accumulates the raw (un-canonicalized) command strings that lie between
//! them. Also the home of [`LoadStatus`] and [`LoadMode`], and of the one
//! piece of error recovery the format calls for: resynchronizing at the next
//! command boundary after a syntax error under [`LoadMode::ContinueOnError`].

use std::fs;
use std::path::Path;

use log::{debug, trace, warn};

use crate::cif::CifDfa;
use crate::dfa::{REJECT, START};

/// Outcome of [`Extractor::validate_syntax`] (and its `load_*` convenience
/// wrappers). A result classification, not an [`std::error::Error`] impl —
/// callers that want a `Result`-shaped API should match on this value
/// themselves, or use one of the `load_*` helpers that already do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// The whole stream was consumed and every command was well-formed.
    AllOk,
    /// The backing file or path could not be opened at all.
    CantOpenInputFile,
    /// The stream ended mid-command: the DFA was neither idle nor in one of
    /// the `End`-command accepting states when input ran out.
    IncompleteInputFile,
    /// At least one byte was rejected by the DFA. Under
    /// [`LoadMode::ContinueOnError`] this is still returned even though
    /// extraction continued past the error and produced a partial command
    /// list.
    IncorrectInputFile,
}

/// How the extractor behaves on the first syntax error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Stop at the first rejected byte; [`Extractor::raw_commands`] holds
    /// only the commands extracted before the error.
    StopOnError,
    /// Record a diagnostic, synthesize a placeholder command, reset the DFA
    /// to idle, and keep going from the byte that was rejected.
    ContinueOnError,
}

/// Drives the CIF grammar over a byte stream, splitting it into raw command
/// strings and classifying the overall result.
#[derive(Debug, Clone)]
pub struct Extractor {
    fsm: CifDfa,
    mode: LoadMode,
    command_buffer: String,
    raw_commands: Vec<String>,
    messages: Vec<String>,
    errors_omitted: bool,
}

impl Extractor {
    #[must_use]
    pub fn new(mode: LoadMode) -> Self {
        Self {
            fsm: CifDfa::new(),
            mode,
            command_buffer: String::new(),
            raw_commands: Vec::new(),
            messages: Vec::new(),
            errors_omitted: false,
        }
    }

    /// Validates `input` as CIF, splitting it into raw commands as a side
    /// effect. Resets all extractor state first, so an `Extractor` can be
    /// reused across calls.
    pub fn validate_syntax(&mut self, input: &[u8]) -> LoadStatus {
        self.fsm.reset();
        self.command_buffer.clear();
        self.raw_commands.clear();
        self.messages.clear();
        self.errors_omitted = false;

        let mut i = 0;
        while i < input.len() {
            let byte = input[i];
            let mut before = self.fsm.current();
            let mut state = self.fsm.step(byte);

            if state == REJECT {
                self.errors_omitted = true;
                warn!("rejected byte {:?} in state {before}", byte as char);
                self.messages
                    .push(format!("incorrect command near state {before} (byte {:?})", byte as char));

                if self.mode == LoadMode::StopOnError {
                    return LoadStatus::IncorrectInputFile;
                }

                // ContinueOnError: synthesize a placeholder for the broken
                // command, reset to idle, and retry the same byte against a
                // fresh start state (the "putback" in the original). The
                // retry is evaluated from START, not from the pre-reject
                // state, so the idle-skip guard below must see START as the
                // "before" state too -- otherwise a blank byte that rejected
                // (itself a self-loop at START) would be misread as a
                // genuine advance-then-return-to-idle and flushed as a
                // spurious one-byte command.
                self.raw_commands
                    .push("(cif-reader: Incorrect command here) ;".to_owned());
                self.command_buffer.clear();
                self.fsm.reset();
                before = START;
                state = self.fsm.step(byte);

                if state == REJECT {
                    // The byte can't even start a command. Retrying it
                    // forever would hang; drop it and move on.
                    warn!("byte {:?} cannot start a command either, skipping", byte as char);
                    i += 1;
                    continue;
                }
            }

            if before == START && state as usize == START {
                i += 1;
                continue;
            }

            self.command_buffer.push(byte as char);
            if state as usize == START {
                self.flush_command();
            }
            i += 1;
        }

        // The decision is keyed purely on the final DFA state, not on
        // whether anything is left in `command_buffer`: a well-formed
        // non-End command also leaves the buffer empty (its trailing ';'
        // already flushed it), but EOF without ever reaching the End
        // command's accepting states is still an incomplete file.
        if !self.fsm.at_end_command() {
            return LoadStatus::IncompleteInputFile;
        }
        if !self.command_buffer.is_empty() {
            self.flush_command();
        }

        if self.errors_omitted {
            LoadStatus::IncorrectInputFile
        } else {
            LoadStatus::AllOk
        }
    }

    fn flush_command(&mut self) {
        let command = std::mem::take(&mut self.command_buffer);
        trace!("extracted raw command: {command:?}");
        self.raw_commands.push(command);
    }

    /// The raw (un-canonicalized) commands extracted by the most recent
    /// [`validate_syntax`](Extractor::validate_syntax) call.
    #[must_use]
    pub fn raw_commands(&self) -> &[String] {
        &self.raw_commands
    }

    /// Human-readable diagnostics accumulated during validation, one per
    /// rejected byte.
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

/// Reads `path` and validates it as CIF, returning both the status and the
/// extractor (so callers can still inspect `raw_commands`/`messages` even
/// when the status isn't `AllOk`).
pub fn load_path(path: impl AsRef<Path>, mode: LoadMode) -> (LoadStatus, Extractor) {
    let path = path.as_ref();
    match fs::read(path) {
        Ok(bytes) => {
            debug!("loaded {} bytes from {}", bytes.len(), path.display());
            let mut extractor = Extractor::new(mode);
            let status = extractor.validate_syntax(&bytes);
            (status, extractor)
        }
        Err(err) => {
            warn!("failed to open {}: {err}", path.display());
            (LoadStatus::CantOpenInputFile, Extractor::new(mode))
        }
    }
}
