//! Print the change log of a snapshot.

use quilt::Document;

use crate::cli::FileArgs;
use crate::output::{OutputFormat, format_time, print_table, short};

/// Run the log command
pub fn run(args: &FileArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let doc = Document::load_from_file(&args.file)?;
    let changes = doc.get_changes(&[]);

    match format {
        OutputFormat::Human => {
            if changes.is_empty() {
                println!("No changes.");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = changes
                .iter()
                .map(|change| {
                    let hash = change.hash().to_string();
                    let actor = change.actor().to_string();
                    vec![
                        short(&hash).to_string(),
                        short(&actor).to_string(),
                        change.seq().to_string(),
                        change.len().to_string(),
                        format_time(change.time()),
                        change.message().unwrap_or_default().to_string(),
                    ]
                })
                .collect();
            print_table(&["HASH", "ACTOR", "SEQ", "OPS", "TIME", "MESSAGE"], &rows);
        }
        OutputFormat::Json => {
            let entries: Vec<serde_json::Value> = changes
                .iter()
                .map(|change| {
                    serde_json::json!({
                        "hash": change.hash().to_string(),
                        "actor": change.actor().to_string(),
                        "seq": change.seq(),
                        "start_op": change.start_op(),
                        "ops": change.len(),
                        "time": change.time(),
                        "message": change.message(),
                        "deps": change.deps().iter().map(ToString::to_string).collect::<Vec<_>>(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string(&entries)?);
        }
    }
    Ok(())
}
