/*! Integration tests for Quilt.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - document: Tests for the Document handle, its transaction lifecycle and history queries
 * - crdt: Tests for maps, lists, text and counters, including concurrent edits
 * - merge: Tests for merging and forking replicas
 * - codec: Tests for saving and loading snapshots and incremental changes
 * - cursor: Tests for stable positions in lists and text
 * - marks: Tests for rich-text marks and their expand policies
 * - sync: Tests for the two-party sync protocol
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quilt=info")),
        )
        .with_test_writer()
        .try_init();
}

mod codec;
mod document;
mod marks;
mod merge;
mod sync;
