//! Reduce command - folds a file of JSON actions into a fresh state.

use firetree::state::{initial_state, reduce_message};
use tracing::warn;

use crate::cli::ReduceArgs;
use crate::output::{OutputFormat, print_json};

/// Run the reduce command
pub fn run(args: &ReduceArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(&args.actions)?;

    let mut state = initial_state();
    for (line_no, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(message) => state = reduce_message(&state, &message),
            Err(e) => warn!(line = line_no + 1, "skipping malformed action: {e}"),
        }
    }

    print_json(&state.to_json(), format)?;
    Ok(())
}
