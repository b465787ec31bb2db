//! Merge one snapshot into another.

use quilt::Document;

use crate::cli::MergeArgs;
use crate::output::OutputFormat;

/// Run the merge command
pub fn run(args: &MergeArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let mut target = Document::load_from_file(&args.target)?;
    let mut source = Document::load_from_file(&args.source)?;
    let before = target.change_count();

    let heads = target.merge(&mut source)?;
    let output = args.output.as_ref().unwrap_or(&args.target);
    target.save_to_file(output)?;

    let imported = target.change_count() - before;
    match format {
        OutputFormat::Human => {
            if heads.is_empty() {
                println!("Already up to date.");
            } else {
                println!(
                    "Imported {imported} change(s) into {}; {} head(s)",
                    output.display(),
                    heads.len()
                );
            }
        }
        OutputFormat::Json => {
            let out = serde_json::json!({
                "imported": imported,
                "heads": target.heads().iter().map(ToString::to_string).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string(&out)?);
        }
    }
    Ok(())
}
