//! Reader, validator and decoder for the Caltech Intermediate Form (CIF)
//! layout language (CalTech TR 2686, 1980).
//!
//! The pipeline is bytes -> [`extract::Extractor`] (driving [`cif::CifDfa`])
//! -> raw command strings -> [`command::canonicalize`] -> canonical command
//! strings -> [`command::parse_canonical`] -> [`command::Command`] values.
//! [`load`] and [`load_path`] wire the whole pipeline together for the
//! common case of "give me the typed commands in this file".

/// Character-class classifier (component A): byte -> CIF lexical class.
pub mod class;
/// Generic table-driven DFA engine (component B), neutral to CIF.
pub mod dfa;
/// CIF grammar DFA (component C): the concrete 92-state machine.
pub mod cif;
/// Command extractor and validator (component D).
pub mod extract;
/// Canonicalizer and typed decoder (component E).
pub mod command;

use std::path::Path;

pub use command::{Command, Error as CommandError, Fraction, Point, Size, Transformation};
pub use extract::{load_path as load_path_raw, Extractor, LoadMode, LoadStatus};

/// A fully decoded CIF document: the typed command list, the canonical raw
/// commands it was decoded from, and the status the validator returned.
#[derive(Debug, Clone)]
pub struct Document {
    pub status: LoadStatus,
    pub commands: Vec<Command>,
    pub canonical_commands: Vec<String>,
    pub messages: Vec<String>,
}

/// Runs the full pipeline — validate, canonicalize, decode — over `input`.
///
/// Matches the four independent phases of spec.md §4.4 (`Open` is implicit
/// here since `input` is already an in-memory byte slice; see [`load_path`]
/// for the file-backed `Open` phase): `ValidateSyntax` via
/// [`Extractor::validate_syntax`], `CleanCommands` via
/// [`command::canonicalize`], `ConvertCommands` via
/// [`command::parse_canonical`].
///
/// A canonical command that fails to decode is a bug in the core (spec.md
/// §7: the typed decoder assumes its input is already canonicalized), so
/// this panics rather than returning a `Result` for that case — it should
/// never trigger on output the canonicalizer itself produced.
#[must_use]
pub fn load(input: &[u8], mode: LoadMode) -> Document {
    let mut extractor = Extractor::new(mode);
    let status = extractor.validate_syntax(input);

    let canonical_commands: Vec<String> = extractor
        .raw_commands()
        .iter()
        .map(|raw| command::canonicalize(raw))
        .collect();

    let commands = canonical_commands
        .iter()
        .map(|c| {
            command::parse_canonical(c)
                .unwrap_or_else(|err| panic!("malformed canonical command {c:?}: {err}"))
        })
        .collect();

    Document {
        status,
        commands,
        canonical_commands,
        messages: extractor.messages().to_vec(),
    }
}

/// [`load`], reading `path` first. Mirrors [`extract::load_path`] but
/// additionally canonicalizes and decodes.
#[must_use]
pub fn load_path(path: impl AsRef<Path>, mode: LoadMode) -> Document {
    let path = path.as_ref();
    match std::fs::read(path) {
        Ok(bytes) => load(&bytes, mode),
        Err(_) => Document {
            status: LoadStatus::CantOpenInputFile,
            commands: Vec::new(),
            canonical_commands: Vec::new(),
            messages: vec![format!("could not open {}", path.display())],
        },
    }
}
