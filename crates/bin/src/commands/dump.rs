//! Print a snapshot's contents as JSON.

use quilt::{Document, ROOT};

use crate::cli::DumpArgs;
use crate::output::{OutputFormat, print_json};

/// Run the dump command
pub fn run(args: &DumpArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let doc = Document::load_from_file(&args.file)?;
    let value = if args.at.is_empty() {
        doc.to_json(&ROOT)
    } else {
        doc.at(&args.at)?.to_json(&ROOT)
    };
    print_json(&value, format)
}
