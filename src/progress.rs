//! Progress reporting for deploy runs.

use std::time::Duration;

use crate::store::{Batch, CommitReport};

/// Milestones of a deploy run, in the order they occur.
#[derive(Debug)]
pub enum DeployEvent<'a> {
    /// The target folder exists
    RootFound { path: &'a str },
    /// The target folder is missing and its creation was queued
    RootMissing { path: &'a str },
    /// The local tree has been walked
    Walked {
        folders: usize,
        files: usize,
        bytes: u64,
    },
    /// The batch is about to be sent
    Committing { operations: usize },
    /// The batch was applied
    Committed(&'a CommitReport),
    /// Dry run: the batch that would have been sent
    Planned(&'a Batch),
}

/// Type alias for progress callback function.
pub type ProgressCallback = Box<dyn FnMut(&DeployEvent<'_>) + Send>;

/// Create a callback that prints run milestones to stdout.
///
/// # Example
/// ```
/// use sitedeploy::progress::make_console_reporter;
///
/// let callback = make_console_reporter();
/// ```
pub fn make_console_reporter() -> ProgressCallback {
    Box::new(|event: &DeployEvent<'_>| {
        if let Some(line) = console_line(event) {
            println!("{}", line);
        }
    })
}

/// Final line of a successful run, timed from process start.
pub fn completion_line(elapsed: Duration) -> String {
    format!("Operation completed after {}s", elapsed.as_secs_f64())
}

fn console_line(event: &DeployEvent<'_>) -> Option<String> {
    match event {
        DeployEvent::RootFound { .. } => None,
        DeployEvent::RootMissing { .. } => {
            Some("Could not find application folder, creating it...".to_string())
        }
        DeployEvent::Walked {
            folders,
            files,
            bytes,
        } => Some(format!(
            "Found {} folders and {} files ({} bytes)",
            folders, files, bytes
        )),
        DeployEvent::Committing { .. } => Some("Sending the files to the site...".to_string()),
        DeployEvent::Committed(_) => None,
        DeployEvent::Planned(batch) => {
            let mut lines = vec![format!("Dry run, {} operations not sent:", batch.len())];
            lines.extend(batch.operations().iter().map(|op| format!("  {}", op)));
            Some(lines.join("\n"))
        }
    }
}
