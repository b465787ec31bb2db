//! Set a root key and commit.

use quilt::{Document, ROOT, ScalarValue};
use tracing::info;

use crate::cli::PutArgs;
use crate::output::OutputFormat;

/// Run the put command
pub fn run(args: &PutArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = if args.file.exists() {
        Document::load_from_file(&args.file)?
    } else {
        info!(file = %args.file.display(), "Creating new document");
        Document::new()
    };
    if let Some(actor) = &args.actor {
        doc.set_actor(actor.clone())?;
    }

    doc.put(&ROOT, args.key.as_str(), parse_scalar(&args.value))?;
    let hash = doc.commit_with(args.message.clone(), None)?;
    doc.save_to_file(&args.file)?;

    match format {
        OutputFormat::Human => {
            if let Some(hash) = hash {
                println!("Committed {hash}");
            }
        }
        OutputFormat::Json => {
            let out = serde_json::json!({ "hash": hash.map(|h| h.to_string()) });
            println!("{}", serde_json::to_string(&out)?);
        }
    }
    Ok(())
}

/// Interpret a command-line value as a JSON scalar, falling back to a plain string.
fn parse_scalar(raw: &str) -> ScalarValue {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Null) => ScalarValue::Null,
        Ok(serde_json::Value::Bool(b)) => ScalarValue::from(b),
        Ok(serde_json::Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                ScalarValue::Int(i)
            } else if let Some(u) = n.as_u64() {
                ScalarValue::Uint(u)
            } else {
                ScalarValue::F64(n.as_f64().unwrap_or_default())
            }
        }
        Ok(serde_json::Value::String(s)) => ScalarValue::from(s),
        _ => ScalarValue::from(raw),
    }
}
