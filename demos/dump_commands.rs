//! Loads a CIF file and prints its typed command list, one per line.
//!
//! ```text
//! cargo run --example dump_commands path/to/layout.cif
//! ```

fn main() {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .expect("Provide file path to a .cif file");

    let doc = cif_reader::load_path(&path, cif_reader::LoadMode::ContinueOnError);

    println!("status: {:?}", doc.status);
    for (i, command) in doc.commands.iter().enumerate() {
        println!("{i}: {command:?}");
    }
    if !doc.messages.is_empty() {
        eprintln!("--- diagnostics ---");
        for message in &doc.messages {
            eprintln!("{message}");
        }
    }
}
