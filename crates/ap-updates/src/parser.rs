//! Reading search-space update files.
//!
//! Each non-blank line is `stage hyperparameter <range> <default> [log]`.
//! Range and default are decoded as literals, so a range may span several
//! whitespace-separated tokens (`(10, 2000)`, `('poly', 'rbf', 'sigmoid')`).

use ap_types::{ApResult, Literal, UpdateError, ValueRange};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::collection::SearchSpaceUpdates;
use crate::update::SearchSpaceUpdate;

/// File name that stands for "no updates".
pub const DISABLED_PATH_SENTINEL: &str = "None";

const LOG_TOKEN: &str = "log";

/// Load updates from `path`.
///
/// Returns `Ok(None)` when no path is given or the path's final component
/// is `None`; the file is not touched in that case. Any malformed line
/// aborts the whole load.
pub fn parse_search_space_updates<P: AsRef<Path>>(path: Option<P>) -> ApResult<Option<SearchSpaceUpdates>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let path = path.as_ref();
    if path.file_name().is_some_and(|name| name == DISABLED_PATH_SENTINEL) {
        debug!("Search space updates disabled by path {}", path.display());
        return Ok(None);
    }

    info!("Loading search space updates from: {}", path.display());
    let reader = BufReader::new(File::open(path)?);
    let mut updates = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if let Some(update) = parse_line(&line, idx + 1)? {
            updates.push(update);
        }
    }

    info!("Loaded {} search space updates from {}", updates.len(), path.display());
    Ok(Some(SearchSpaceUpdates::from(updates)))
}

pub(crate) fn parse_updates_str(text: &str) -> Result<SearchSpaceUpdates, UpdateError> {
    let mut updates = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if let Some(update) = parse_line(line, idx + 1)? {
            updates.push(update);
        }
    }
    Ok(SearchSpaceUpdates::from(updates))
}

/// Decode one line; blank lines yield `None`. `line_number` is 1-based and
/// only used for error reporting.
pub(crate) fn parse_line(line: &str, line_number: usize) -> Result<Option<SearchSpaceUpdate>, UpdateError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let malformed = |message: String| UpdateError::MalformedLine {
        line: line_number,
        message,
    };

    let (stage_name, rest) = next_token(line).ok_or_else(|| malformed("missing stage name".to_string()))?;
    let (hyperparameter, rest) =
        next_token(rest).ok_or_else(|| malformed("missing hyperparameter name".to_string()))?;

    let (range, rest) =
        Literal::parse_prefix(rest).map_err(|e| malformed(format!("invalid value range: {e}")))?;
    expect_separator(rest, "value range").map_err(malformed)?;
    let value_range = ValueRange::try_from(range).map_err(|found| UpdateError::RangeNotSequence {
        line: line_number,
        found: format!("{found} ({})", found.type_name()),
    })?;

    let (default_value, rest) =
        Literal::parse_prefix(rest).map_err(|e| malformed(format!("invalid default value: {e}")))?;
    expect_separator(rest, "default value").map_err(malformed)?;

    let trailing: Vec<&str> = rest.split_whitespace().collect();
    let log = trailing.as_slice() == [LOG_TOKEN];
    if !trailing.is_empty() && !log {
        warn!(
            "Ignoring trailing tokens {:?} of search space update at line {}",
            trailing, line_number
        );
    }

    Ok(Some(SearchSpaceUpdate::new(
        stage_name,
        hyperparameter,
        value_range,
        default_value,
        log,
    )))
}

/// Split off the next whitespace-delimited token.
fn next_token(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }
    Some(match input.find(char::is_whitespace) {
        Some(end) => (&input[..end], &input[end..]),
        None => (input, ""),
    })
}

fn expect_separator(rest: &str, what: &str) -> Result<(), String> {
    match rest.chars().next() {
        Some(c) if !c.is_whitespace() => Err(format!("expected whitespace after {what}, found '{c}'")),
        _ => Ok(()),
    }
}
