//! In-process sync between two snapshots.
//!
//! Every message goes through its wire encoding, so this doubles as a check that two snapshots
//! converge over the real protocol.

use quilt::{Document, SyncMessage, SyncState};
use tracing::debug;

use crate::cli::SyncArgs;
use crate::output::OutputFormat;

/// Run the sync command
pub fn run(args: &SyncArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let mut left = Document::load_from_file(&args.left)?;
    let mut right = Document::load_from_file(&args.right)?;
    let (mut left_state, mut right_state) = (SyncState::new(), SyncState::new());

    let mut rounds = 0;
    let mut bytes = 0;
    loop {
        if rounds == args.max_rounds {
            return Err(format!("no convergence after {rounds} rounds").into());
        }
        rounds += 1;

        let to_right = exchange(&left, &mut left_state, &mut right, &mut right_state)?;
        let to_left = exchange(&right, &mut right_state, &mut left, &mut left_state)?;
        bytes += to_right.unwrap_or(0) + to_left.unwrap_or(0);
        debug!(rounds, ?to_right, ?to_left, "Sync round");
        if to_right.is_none() && to_left.is_none() {
            break;
        }
    }

    left.save_to_file(&args.left)?;
    right.save_to_file(&args.right)?;

    let converged = left.heads() == right.heads();
    match format {
        OutputFormat::Human => {
            println!("Rounds:    {rounds}");
            println!("Bytes:     {bytes}");
            println!("Changes:   {} / {}", left.change_count(), right.change_count());
            println!("Converged: {converged}");
        }
        OutputFormat::Json => {
            let out = serde_json::json!({
                "rounds": rounds,
                "bytes": bytes,
                "converged": converged,
                "heads": left.heads().iter().map(ToString::to_string).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string(&out)?);
        }
    }
    Ok(())
}

/// Send one message from `from` to `to`, returning its encoded size if one was sent.
fn exchange(
    from: &Document,
    from_state: &mut SyncState,
    to: &mut Document,
    to_state: &mut SyncState,
) -> quilt::Result<Option<usize>> {
    let Some(message) = from.generate_sync_message(from_state) else {
        return Ok(None);
    };
    let encoded = message.encode()?;
    to.receive_sync_message(to_state, SyncMessage::decode(&encoded)?)?;
    Ok(Some(encoded.len()))
}
