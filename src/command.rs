//! Canonicalizer and typed decoder (component E).
//!
//! Two independent operations live here: [`canonicalize`] rewrites a raw
//! command (as cut out by [`crate::extract::Extractor`]) into the
//! whitespace-separated canonical form spec.md describes, and
//! [`parse_canonical`] tokenizes that canonical form into a typed [`Command`].
//! The reverse direction, [`write_canonical`], exists for round-tripping and
//! for hosts that want to re-serialize a command list.
//!
//! Decoding assumes its input already went through [`canonicalize`] — a
//! canonical string that doesn't match its kind's expected token shape is a
//! bug in the core (the DFA already rejected anything that could produce
//! such a string), not a user-facing parse error, so [`Error`] is small and
//! callers are not expected to recover from it field-by-field.

use std::{error, fmt};

/// A point in CIF's coordinate space, in hundredths of a micron.
pub type Point = (i64, i64);
/// A box's width and height. Both components are meant to be `>= 1`; the
/// decoder does not re-check this, since the DFA grammar already admits `0`
/// and rejecting it would be a semantic check outside this crate's scope.
pub type Size = (u64, u64);
/// A definition's `A`/`B` scale fraction; denominator conventionally `>= 1`.
pub type Fraction = (u64, u64);

/// One element of a [`Command::Call`]'s transform list, applied in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transformation {
    Translate(Point),
    Rotate(Point),
    MirrorX,
    MirrorY,
}

/// A single typed CIF command. One variant per command kind in spec.md §3;
/// the source's `Command -> Primitive/Control/RawContent -> ...` inheritance
/// chain collapses here since pattern matching already gives us the
/// classification those abstract layers existed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Polygon {
        points: Vec<Point>,
    },
    Wire {
        width: u64,
        points: Vec<Point>,
    },
    Box {
        size: Size,
        position: Point,
        rotation: Point,
    },
    RoundFlash {
        diameter: u64,
        position: Point,
    },
    Layer {
        name: String,
    },
    DefinitionStart {
        id: u64,
        ab: Option<Fraction>,
    },
    DefinitionDelete {
        id: u64,
    },
    DefinitionEnd,
    Call {
        id: u64,
        transforms: Vec<Transformation>,
    },
    End,
    /// `content` includes the outer parentheses.
    Comment {
        content: String,
    },
    /// `content` includes the leading digit that identifies the extension,
    /// but not the trailing `;`.
    UserExtension {
        content: String,
    },
}

/// Failure decoding an already-canonicalized command string. Per spec.md
/// §7 this represents a malformed canonical form, which only a bug in
/// [`canonicalize`] or a hand-built string could produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The string was empty; there was no kind byte to dispatch on.
    Empty,
    /// The leading byte didn't match any known command kind.
    UnknownKind(u8),
    /// Well-formed enough to dispatch, but the token count or shape for
    /// this kind didn't match (`reason` names what was expected).
    Malformed(&'static str),
    /// A token that should have parsed as a number didn't.
    InvalidNumber(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty canonical command"),
            Self::UnknownKind(b) => write!(f, "unknown command kind byte {:?}", *b as char),
            Self::Malformed(reason) => write!(f, "malformed canonical command: {reason}"),
            Self::InvalidNumber(tok) => write!(f, "not a valid number: {tok:?}"),
        }
    }
}

impl error::Error for Error {}

/// Rewrites a raw command (byte-exact slice between two idle-state
/// transitions) into canonical, whitespace-separated form, per spec.md §4.5.
/// Dispatches on the raw command's leading byte.
#[must_use]
pub fn canonicalize(raw: &str) -> String {
    match raw.as_bytes().first() {
        Some(b'P') | Some(b'B') | Some(b'W') | Some(b'R') => canonicalize_numeric(raw),
        Some(b'L') => canonicalize_layer(raw),
        Some(b'C') => canonicalize_tagged(raw, true),
        Some(b'D') => canonicalize_tagged(raw, false),
        Some(b'E') => "E ;".to_owned(),
        _ => canonicalize_verbatim(raw),
    }
}

/// `P`/`B`/`W`/`R`: keep the kind byte, blank out everything but digits and
/// `-`, collapse runs of blanks via token re-splitting.
fn canonicalize_numeric(raw: &str) -> String {
    let kind = raw.chars().next().unwrap_or(' ');
    let body: String = raw
        .chars()
        .skip(1)
        .map(|c| if c.is_ascii_digit() || c == '-' { c } else { ' ' })
        .collect();
    reassemble(kind, body.split_whitespace())
}

/// `L`: keep the kind byte, blank out everything but upper-alpha, digit and
/// `_` (the `LayerName` class), collapse.
fn canonicalize_layer(raw: &str) -> String {
    let kind = raw.chars().next().unwrap_or(' ');
    let body: String = raw
        .chars()
        .skip(1)
        .map(|c| {
            if c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' {
                c
            } else {
                ' '
            }
        })
        .collect();
    reassemble(kind, body.split_whitespace())
}

/// `C` and `D`: blank out everything but digit/upper-alpha (and `-` for `C`
/// only — definition numerics are unsigned), then insert a space after
/// every upper-alpha byte so that multi-letter tags like `MX` split into
/// their own tokens (`M`, `X`), matching `T <x> <y>` / `R <x> <y>` / `M X` /
/// `M Y` and `D S`/`D F`/`D D`.
fn canonicalize_tagged(raw: &str, allow_sign: bool) -> String {
    let kind = raw.chars().next().unwrap_or(' ');
    let mut spaced = String::with_capacity(raw.len() * 2);
    for c in raw.chars().skip(1) {
        let keep = c.is_ascii_digit() || c.is_ascii_uppercase() || (allow_sign && c == '-');
        if keep {
            spaced.push(c);
            if c.is_ascii_uppercase() {
                spaced.push(' ');
            }
        } else {
            spaced.push(' ');
        }
    }
    reassemble(kind, spaced.split_whitespace())
}

/// Digit (user extension) or `(` (comment): preserve the body verbatim,
/// normalizing only the `;`/`" ;"` tail.
fn canonicalize_verbatim(raw: &str) -> String {
    let trimmed = raw
        .strip_suffix(" ;")
        .or_else(|| raw.strip_suffix(';'))
        .unwrap_or(raw);
    format!("{trimmed} ;")
}

fn reassemble<'a>(kind: char, tokens: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    out.push(kind);
    for tok in tokens {
        out.push(' ');
        out.push_str(tok);
    }
    out.push_str(" ;");
    out
}

/// Whether `bytes` is a single syntactically valid CIF command: the DFA
/// accepts it with no reject *and* it advances past the idle state at least
/// once (an all-blank input is not a command).
#[must_use]
pub fn is_command_valid(bytes: &[u8]) -> bool {
    use crate::cif::CifDfa;
    use crate::dfa::{REJECT, START};

    let mut fsm = CifDfa::new();
    let mut moved = false;
    for &b in bytes {
        let next = fsm.step(b);
        if next == REJECT {
            return false;
        }
        if next as usize != START {
            moved = true;
        }
    }
    moved
}

/// Decodes an already-canonicalized command string into a typed [`Command`].
pub fn parse_canonical(s: &str) -> Result<Command, Error> {
    match s.as_bytes().first() {
        None => Err(Error::Empty),
        Some(b'P') => decode_polygon(s),
        Some(b'B') => decode_box(s),
        Some(b'W') => decode_wire(s),
        Some(b'R') => decode_round_flash(s),
        Some(b'L') => decode_layer(s),
        Some(b'D') => decode_definition(s),
        Some(b'C') => decode_call(s),
        Some(b'E') => Ok(Command::End),
        Some(b'(') => Ok(Command::Comment {
            content: strip_tail(s),
        }),
        Some(&b) if b.is_ascii_digit() => Ok(Command::UserExtension {
            content: strip_tail(s),
        }),
        Some(&b) => Err(Error::UnknownKind(b)),
    }
}

/// Strips the canonical `" ;"` tail, leaving the verbatim body (comment
/// parens, or the user-extension digit-and-body) untouched.
fn strip_tail(s: &str) -> String {
    s.strip_suffix(" ;").unwrap_or(s).to_owned()
}

/// Splits a canonical string into its operand tokens, checking that it
/// opens with `expected_kind` and closes with the `;` terminator.
fn fields<'a>(s: &'a str, expected_kind: &str) -> Result<Vec<&'a str>, Error> {
    let mut toks: Vec<&str> = s.split_whitespace().collect();
    if toks.last() != Some(&";") {
        return Err(Error::Malformed("missing trailing ';' token"));
    }
    toks.pop();
    if toks.first() != Some(&expected_kind) {
        return Err(Error::Malformed("kind token mismatch"));
    }
    toks.remove(0);
    Ok(toks)
}

fn parse_i64(tok: &str) -> Result<i64, Error> {
    tok.parse().map_err(|_| Error::InvalidNumber(tok.to_owned()))
}

fn parse_u64(tok: &str) -> Result<u64, Error> {
    tok.parse().map_err(|_| Error::InvalidNumber(tok.to_owned()))
}

fn decode_polygon(s: &str) -> Result<Command, Error> {
    let toks = fields(s, "P")?;
    if toks.is_empty() || toks.len() % 2 != 0 {
        return Err(Error::Malformed(
            "polygon needs a nonzero, even number of coordinate tokens",
        ));
    }
    let mut points = Vec::with_capacity(toks.len() / 2);
    for pair in toks.chunks_exact(2) {
        points.push((parse_i64(pair[0])?, parse_i64(pair[1])?));
    }
    Ok(Command::Polygon { points })
}

fn decode_box(s: &str) -> Result<Command, Error> {
    let toks = fields(s, "B")?;
    if toks.len() != 4 && toks.len() != 6 {
        return Err(Error::Malformed("box needs 4 or 6 numeric tokens"));
    }
    let size = (parse_u64(toks[0])?, parse_u64(toks[1])?);
    let position = (parse_i64(toks[2])?, parse_i64(toks[3])?);
    let rotation = if toks.len() == 6 {
        (parse_i64(toks[4])?, parse_i64(toks[5])?)
    } else {
        (1, 0)
    };
    Ok(Command::Box {
        size,
        position,
        rotation,
    })
}

fn decode_wire(s: &str) -> Result<Command, Error> {
    let toks = fields(s, "W")?;
    if toks.len() < 3 || (toks.len() - 1) % 2 != 0 {
        return Err(Error::Malformed(
            "wire needs a width and a nonzero, even number of coordinate tokens",
        ));
    }
    let width = parse_u64(toks[0])?;
    let mut points = Vec::with_capacity((toks.len() - 1) / 2);
    for pair in toks[1..].chunks_exact(2) {
        points.push((parse_i64(pair[0])?, parse_i64(pair[1])?));
    }
    Ok(Command::Wire { width, points })
}

fn decode_round_flash(s: &str) -> Result<Command, Error> {
    let toks = fields(s, "R")?;
    if toks.len() != 3 {
        return Err(Error::Malformed("round flash needs diameter, x and y"));
    }
    Ok(Command::RoundFlash {
        diameter: parse_u64(toks[0])?,
        position: (parse_i64(toks[1])?, parse_i64(toks[2])?),
    })
}

fn decode_layer(s: &str) -> Result<Command, Error> {
    let toks = fields(s, "L")?;
    if toks.len() != 1 {
        return Err(Error::Malformed("layer needs exactly one name token"));
    }
    Ok(Command::Layer {
        name: toks[0].to_owned(),
    })
}

fn decode_definition(s: &str) -> Result<Command, Error> {
    let toks = fields(s, "D")?;
    let (tag, rest) = toks
        .split_first()
        .ok_or(Error::Malformed("definition command needs S/F/D tag"))?;
    match *tag {
        "S" => {
            if rest.is_empty() {
                return Err(Error::Malformed("definition start needs an id"));
            }
            let id = parse_u64(rest[0])?;
            let ab = match rest.len() {
                1 => None,
                3 => Some((parse_u64(rest[1])?, parse_u64(rest[2])?)),
                _ => return Err(Error::Malformed("definition start takes an id and an optional A B pair")),
            };
            Ok(Command::DefinitionStart { id, ab })
        }
        "F" => {
            if !rest.is_empty() {
                return Err(Error::Malformed("definition end takes no operands"));
            }
            Ok(Command::DefinitionEnd)
        }
        "D" => {
            if rest.len() != 1 {
                return Err(Error::Malformed("definition delete needs exactly one id"));
            }
            Ok(Command::DefinitionDelete {
                id: parse_u64(rest[0])?,
            })
        }
        _ => Err(Error::Malformed("unknown definition subcommand tag")),
    }
}

fn decode_call(s: &str) -> Result<Command, Error> {
    let toks = fields(s, "C")?;
    if toks.is_empty() {
        return Err(Error::Malformed("call needs an id"));
    }
    let id = parse_u64(toks[0])?;

    let mut transforms = Vec::new();
    let mut i = 1;
    while i < toks.len() {
        match toks[i] {
            "T" => {
                if i + 2 >= toks.len() {
                    return Err(Error::Malformed("translate needs x and y"));
                }
                transforms.push(Transformation::Translate((
                    parse_i64(toks[i + 1])?,
                    parse_i64(toks[i + 2])?,
                )));
                i += 3;
            }
            "R" => {
                if i + 2 >= toks.len() {
                    return Err(Error::Malformed("rotate needs x and y"));
                }
                transforms.push(Transformation::Rotate((
                    parse_i64(toks[i + 1])?,
                    parse_i64(toks[i + 2])?,
                )));
                i += 3;
            }
            "M" => {
                if i + 1 >= toks.len() {
                    return Err(Error::Malformed("mirror needs an axis"));
                }
                transforms.push(match toks[i + 1] {
                    "X" => Transformation::MirrorX,
                    "Y" => Transformation::MirrorY,
                    _ => return Err(Error::Malformed("mirror axis must be X or Y")),
                });
                i += 2;
            }
            _ => return Err(Error::Malformed("unknown transformation tag")),
        }
    }
    Ok(Command::Call { id, transforms })
}

/// Re-serializes a typed command into the same canonical form
/// [`parse_canonical`] accepts. Used for round-trip testing and by hosts
/// that want to re-emit a command list as text.
#[must_use]
pub fn write_canonical(cmd: &Command) -> String {
    match cmd {
        Command::Polygon { points } => {
            let mut s = String::from("P");
            for (x, y) in points {
                s.push_str(&format!(" {x} {y}"));
            }
            s.push_str(" ;");
            s
        }
        Command::Wire { width, points } => {
            let mut s = format!("W {width}");
            for (x, y) in points {
                s.push_str(&format!(" {x} {y}"));
            }
            s.push_str(" ;");
            s
        }
        Command::Box {
            size,
            position,
            rotation,
        } => format!(
            "B {} {} {} {} {} {} ;",
            size.0, size.1, position.0, position.1, rotation.0, rotation.1
        ),
        Command::RoundFlash { diameter, position } => {
            format!("R {diameter} {} {} ;", position.0, position.1)
        }
        Command::Layer { name } => format!("L {name} ;"),
        Command::DefinitionStart { id, ab } => match ab {
            Some((a, b)) => format!("D S {id} {a} {b} ;"),
            None => format!("D S {id} ;"),
        },
        Command::DefinitionDelete { id } => format!("D D {id} ;"),
        Command::DefinitionEnd => "D F ;".to_owned(),
        Command::Call { id, transforms } => {
            let mut s = format!("C {id}");
            for t in transforms {
                match t {
                    Transformation::Translate((x, y)) => s.push_str(&format!(" T {x} {y}")),
                    Transformation::Rotate((x, y)) => s.push_str(&format!(" R {x} {y}")),
                    Transformation::MirrorX => s.push_str(" M X"),
                    Transformation::MirrorY => s.push_str(" M Y"),
                }
            }
            s.push_str(" ;");
            s
        }
        Command::End => "E ;".to_owned(),
        Command::Comment { content } => format!("{content} ;"),
        Command::UserExtension { content } => format!("{content} ;"),
    }
}
