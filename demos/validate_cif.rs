//! Validates a CIF file without decoding it, printing the canonical raw
//! commands and exiting non-zero on anything but `AllOk`.
//!
//! ```text
//! cargo run --example validate_cif path/to/layout.cif
//! ```

use cif_reader::{LoadMode, LoadStatus};

fn main() {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .expect("Provide file path to a .cif file");

    let (status, extractor) = cif_reader::load_path_raw(&path, LoadMode::StopOnError);

    for raw in extractor.raw_commands() {
        println!("{}", cif_reader::command::canonicalize(raw));
    }
    for message in extractor.messages() {
        eprintln!("{message}");
    }

    println!("status: {status:?}");
    if status != LoadStatus::AllOk {
        std::process::exit(1);
    }
}
