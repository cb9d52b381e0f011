//! Mode handlers and report printing.

mod check;
mod compute;

pub use check::run_check_files;
pub use compute::run_compute_files;

use anyhow::Result;
use srisum_core::report::{Line, Stream};
use std::io::{self, Write};

/// Write rendered lines to their streams, in order.
fn print_lines(lines: &[Line]) -> Result<()> {
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    for line in lines {
        match line.stream {
            Stream::Stdout => writeln!(stdout, "{}", line.text)?,
            Stream::Stderr => {
                // Keep interleaving with stdout faithful when both go to a terminal.
                stdout.flush()?;
                writeln!(stderr, "{}", line.text)?;
            }
        }
    }
    stdout.flush()?;
    Ok(())
}
