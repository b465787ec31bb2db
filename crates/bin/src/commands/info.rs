//! Snapshot summary: heads, change count and the actors that wrote it.

use std::collections::BTreeMap;

use quilt::Document;

use crate::cli::FileArgs;
use crate::output::{OutputFormat, print_table, short};

/// Run the info command
pub fn run(args: &FileArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let doc = Document::load_from_file(&args.file)?;
    let heads: Vec<String> = doc.heads().iter().map(ToString::to_string).collect();

    let mut actors: BTreeMap<String, u64> = BTreeMap::new();
    for change in doc.get_changes(&[]) {
        let seq = actors.entry(change.actor().to_string()).or_default();
        *seq = (*seq).max(change.seq());
    }

    match format {
        OutputFormat::Human => {
            println!("File:     {}", args.file.display());
            println!("Changes:  {}", doc.change_count());
            println!("Keys:     {}", doc.length(&quilt::ROOT));
            println!("Heads:");
            for head in &heads {
                println!("  {head}");
            }
            println!();
            let rows: Vec<Vec<String>> = actors
                .iter()
                .map(|(actor, seq)| vec![short(actor).to_string(), seq.to_string()])
                .collect();
            print_table(&["ACTOR", "CHANGES"], &rows);
        }
        OutputFormat::Json => {
            let info = serde_json::json!({
                "file": args.file.display().to_string(),
                "changes": doc.change_count(),
                "heads": heads,
                "actors": actors,
            });
            println!("{}", serde_json::to_string(&info)?);
        }
    }
    Ok(())
}
