//! End-to-end scenarios and invariants/laws for the CIF pipeline, covering
//! spec.md §8(a)-(h) plus the five invariants/laws that section requires.

use cif_reader::command::{canonicalize, is_command_valid, parse_canonical, write_canonical};
use cif_reader::{load, Command, LoadMode, LoadStatus, Transformation};

// (a)
#[test]
fn box_then_end() {
    let doc = load(b"B 10 20 30 40 ;E ;", LoadMode::StopOnError);
    assert_eq!(doc.status, LoadStatus::AllOk);
    assert_eq!(
        doc.commands,
        vec![
            Command::Box {
                size: (10, 20),
                position: (30, 40),
                rotation: (1, 0),
            },
            Command::End,
        ]
    );
}

// (b)
#[test]
fn box_with_commas_and_no_whitespace() {
    let doc = load(b"B1000,2000,500,-500,1,0;E;", LoadMode::StopOnError);
    assert_eq!(doc.status, LoadStatus::AllOk);
    assert_eq!(
        doc.canonical_commands,
        vec!["B 1000 2000 500 -500 1 0 ;".to_owned(), "E ;".to_owned()]
    );
    assert_eq!(
        doc.commands,
        vec![
            Command::Box {
                size: (1000, 2000),
                position: (500, -500),
                rotation: (1, 0),
            },
            Command::End,
        ]
    );
}

// (c)
#[test]
fn polygon_with_four_points() {
    let doc = load(
        b"P 100 200 -100 200 -100 -200 100 -200 ;E ;",
        LoadMode::StopOnError,
    );
    assert_eq!(doc.status, LoadStatus::AllOk);
    assert_eq!(
        doc.commands[0],
        Command::Polygon {
            points: vec![(100, 200), (-100, 200), (-100, -200), (100, -200)],
        }
    );
    assert_eq!(doc.commands[1], Command::End);
}

// (d)
#[test]
fn call_with_translate_rotate_and_mirrors() {
    let doc = load(b"C 1 T 10 20 R 0 -100 MX MY ;E ;", LoadMode::StopOnError);
    assert_eq!(doc.status, LoadStatus::AllOk);
    assert_eq!(
        doc.commands[0],
        Command::Call {
            id: 1,
            transforms: vec![
                Transformation::Translate((10, 20)),
                Transformation::Rotate((0, -100)),
                Transformation::MirrorX,
                Transformation::MirrorY,
            ],
        }
    );
}

// (e)
#[test]
fn balanced_nested_comment() {
    let doc = load(b"(nested (balanced (parens)) ok);E ;", LoadMode::StopOnError);
    assert_eq!(doc.status, LoadStatus::AllOk);
    assert_eq!(
        doc.commands[0],
        Command::Comment {
            content: "(nested (balanced (parens)) ok)".to_owned(),
        }
    );
    assert_eq!(doc.commands[1], Command::End);
}

// (f)
#[test]
fn truncated_box_is_incorrect_under_stop_on_error() {
    let doc = load(b"B 10 20 30 ;", LoadMode::StopOnError);
    assert_eq!(doc.status, LoadStatus::IncorrectInputFile);
}

#[test]
fn truncated_box_yields_one_placeholder_under_continue_on_error() {
    let doc = load(b"B 10 20 30 ;E ;", LoadMode::ContinueOnError);
    assert_eq!(doc.status, LoadStatus::IncorrectInputFile);
    assert!(matches!(doc.commands[0], Command::Comment { .. }));
}

// (g)
#[test]
fn layer_command() {
    let doc = load(b"L LAP ;E ;", LoadMode::StopOnError);
    assert_eq!(doc.status, LoadStatus::AllOk);
    assert_eq!(
        doc.commands[0],
        Command::Layer {
            name: "LAP".to_owned(),
        }
    );
}

// (h)
#[test]
fn definition_block_wraps_a_polygon() {
    let doc = load(
        b"D S 7 2 3 ;P 0 0 10 0 10 10 ;D F ;E ;",
        LoadMode::StopOnError,
    );
    assert_eq!(doc.status, LoadStatus::AllOk);
    assert_eq!(
        doc.commands,
        vec![
            Command::DefinitionStart {
                id: 7,
                ab: Some((2, 3)),
            },
            Command::Polygon {
                points: vec![(0, 0), (10, 0), (10, 10)],
            },
            Command::DefinitionEnd,
            Command::End,
        ]
    );
}

// --- invariants and laws (spec.md §8) ---

// 1. EOF classification keys purely on the final DFA state (spec.md §6:
//    IncompleteInputFile is "EOF reached in a valid non-terminal state
//    (missing End command)"), not on whether anything is left buffered. A
//    single canonical command, even followed by trailing whitespace (which
//    just self-loops at the idle state), never reaches the End command's
//    accepting states, so it revalidates as IncompleteInputFile, not
//    AllOk; a command cut short before its terminating ';' is also
//    IncompleteInputFile.
#[test]
fn canonical_command_plus_whitespace_revalidates_as_incomplete_without_end() {
    for raw in [
        "B 10 20 30 40 ;",
        "P 0 0 1 1 ;",
        "L ML ;",
        "(a comment) ;",
    ] {
        let canon = canonicalize(raw);
        let padded = format!("{canon}   \n");
        let doc = load(padded.as_bytes(), LoadMode::StopOnError);
        assert_eq!(doc.status, LoadStatus::IncompleteInputFile, "input: {padded:?}");
    }
}

#[test]
fn command_cut_short_before_terminating_semicolon_is_incomplete() {
    for raw in ["B 10 20 30 40 ;", "P 0 0 1 1 ;", "L ML ;"] {
        let canon = canonicalize(raw);
        let truncated = canon.trim_end_matches(" ;");
        let doc = load(truncated.as_bytes(), LoadMode::StopOnError);
        assert_eq!(
            doc.status,
            LoadStatus::IncompleteInputFile,
            "input: {truncated:?}"
        );
    }
}

// `E` alone (no trailing blanks or ';') is still accepted at EOF: spec.md
// §4.4 treats both DFA states 91 and 92 (before and after the terminating
// ';') as a completed End command when input runs out there.
#[test]
fn bare_e_at_eof_is_accepted_as_end() {
    let doc = load(b"E", LoadMode::StopOnError);
    assert_eq!(doc.status, LoadStatus::AllOk);
    assert_eq!(doc.commands, vec![Command::End]);
}

// 2. round trip: write_canonical then parse_canonical reproduces the value.
#[test]
fn typed_commands_round_trip_through_canonical_form() {
    let samples = vec![
        Command::Polygon {
            points: vec![(0, 0), (5, 0), (5, 5)],
        },
        Command::Wire {
            width: 3,
            points: vec![(0, 0), (10, 10), (20, 0)],
        },
        Command::Box {
            size: (10, 20),
            position: (30, 40),
            rotation: (0, -1),
        },
        Command::RoundFlash {
            diameter: 9,
            position: (1, 1),
        },
        Command::Layer {
            name: "MET1".to_owned(),
        },
        Command::Call {
            id: 42,
            transforms: vec![Transformation::Rotate((1, 0)), Transformation::MirrorY],
        },
        Command::End,
    ];
    for cmd in samples {
        let text = write_canonical(&cmd);
        assert_eq!(parse_canonical(&text).unwrap(), cmd);
    }
}

// 3. canonicalization is idempotent.
#[test]
fn canonicalization_is_idempotent() {
    for raw in [
        "B1000,2000,500,-500,1,0;",
        "P 100 200 -100 200 ;",
        "C1T10 20R0-100MXMY;",
        "DS7-2-3;",
        "L  L_AP ;",
        "E    ;",
        "(nested (balanced (parens)) ok);",
        "4 some vendor data;",
    ] {
        let once = canonicalize(raw);
        assert_eq!(canonicalize(&once), once, "not idempotent for {raw:?}");
    }
}

// 4. raw and typed command counts match for any valid input.
#[test]
fn raw_and_typed_command_counts_match() {
    let doc = load(
        b"L LAP ;C 1 T 10 20 R 0 -100 MX MY ;B 1 1 0 0 ;E ;",
        LoadMode::StopOnError,
    );
    assert_eq!(doc.status, LoadStatus::AllOk);
    assert_eq!(doc.commands.len(), doc.canonical_commands.len());
    assert_eq!(doc.commands.len(), 4);
}

// 5. a ';' inside an unbalanced comment never closes the comment, so the
// DFA never returns to idle (the command is incomplete, not silently
// accepted) even though the whole rest of the file gets swallowed as
// comment body.
#[test]
fn unbalanced_comment_with_semicolon_inside_is_not_accepted() {
    let doc = load(b"(abc;E ;", LoadMode::StopOnError);
    assert_eq!(doc.status, LoadStatus::IncompleteInputFile);
}

#[test]
fn is_command_valid_rejects_a_bad_byte_but_not_an_unterminated_comment() {
    // an invalid byte inside a numeric field is a genuine DFA reject.
    assert!(!is_command_valid(b"B 10 20 30 X 40 ;"));
    // only-blanks input never advances past the idle state.
    assert!(!is_command_valid(b"   "));
    // a syntactically well-formed command is valid.
    assert!(is_command_valid(b"E ;"));
}
