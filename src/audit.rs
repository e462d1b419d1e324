//! Walking the repository index and checking each image.
//!
//! Every (reference, tag) entry of the [`RepositoryIndex`] triggers one call
//! to the [`ImageCheck`], with the reference as its argument. References
//! starting with one of the excluded prefixes are skipped entirely. A
//! non-zero check result marks the entry as corrupt; checking always
//! continues with the remaining entries.

use std::{
    fmt,
    time::{Duration, Instant},
};

use log::{debug, info};

use crate::{
    error::{AuditError, Result},
    repository::RepositoryIndex,
};

/// Probe used to decide whether an image is readable.
///
/// Returns the exit code of the probe: zero means the image could be read.
/// An `Err` means the probe itself could not be run.
pub trait ImageCheck {
    fn check(&mut self, reference: &str) -> std::io::Result<i32>;
}

impl<F> ImageCheck for F
where
    F: FnMut(&str) -> std::io::Result<i32>,
{
    fn check(&mut self, reference: &str) -> std::io::Result<i32> {
        self(reference)
    }
}

/// An entry whose check returned non-zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorruptImage {
    pub reference: String,
    pub tag: String,
    pub hash: String,
}

impl fmt::Display for CorruptImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "*** Found corrupted image! image: {}, tag: {}, hash: {}",
            self.reference, self.tag, self.hash
        )
    }
}

/// Outcome of one audit run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditResult {
    /// Number of check invocations, whatever their outcome.
    pub images_checked: usize,
    /// References excluded by prefix.
    pub skipped: usize,
    pub corrupt: Vec<CorruptImage>,
    pub elapsed: Duration,
}

impl fmt::Display for AuditResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Image checking complete.  Images checked: {}, Image check elapsed time: {}",
            self.images_checked,
            format_elapsed(self.elapsed)
        )
    }
}

/// Formats a duration as `HH:MM:SS.mmm`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60,
        elapsed.subsec_millis()
    )
}

fn is_excluded<'a>(reference: &str, exclude_prefixes: &'a [String]) -> Option<&'a str> {
    exclude_prefixes
        .iter()
        .map(String::as_str)
        .find(|prefix| reference.starts_with(prefix))
}

/// Check every non-excluded entry of `index`.
///
/// Entries are visited one at a time; each check completes before the next
/// one starts. A reference listed under several tags is checked once per tag.
/// A corrupt entry is printed as soon as its check fails.
///
/// # Errors
///
/// Returns [`AuditError::Check`] if the checker cannot be run at all. A check
/// that runs and fails is recorded in [`AuditResult::corrupt`] instead.
pub fn audit(
    index: &RepositoryIndex,
    exclude_prefixes: &[String],
    checker: &mut impl ImageCheck,
) -> Result<AuditResult> {
    let start = Instant::now();
    let mut result = AuditResult::default();

    for (reference, tags) in &index.repositories {
        if let Some(prefix) = is_excluded(reference, exclude_prefixes) {
            debug!("skipping {reference}: matches excluded prefix {prefix:?}");
            result.skipped += 1;
            continue;
        }

        for (tag, hash) in tags {
            result.images_checked += 1;
            let status = checker
                .check(reference)
                .map_err(|source| AuditError::Check {
                    reference: reference.clone(),
                    source,
                })?;
            if status != 0 {
                debug!("{reference} ({tag}) failed its check with status {status}");
                let corrupt = CorruptImage {
                    reference: reference.clone(),
                    tag: tag.clone(),
                    hash: hash.clone(),
                };
                println!("{corrupt}");
                result.corrupt.push(corrupt);
            }
        }
    }

    result.elapsed = start.elapsed();
    info!(
        "checked {} images, skipped {} mirrored references, {} corrupt",
        result.images_checked,
        result.skipped,
        result.corrupt.len()
    );
    Ok(result)
}
