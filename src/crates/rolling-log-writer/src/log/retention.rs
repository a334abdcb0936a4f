use super::config::RetentionPolicy;
use super::list_file_names;
use crate::hooks::FileLifecycleHooks;
use chrono::{NaiveDateTime, TimeDelta};
use log_roller::{FileMatch, PathRoller};
use std::path::Path;

#[allow(unused_imports)]
use tracing::{debug, error, info, warn};

/// Deletes the files that fall outside the retention policy.
///
/// `current_path` is the file just opened (or, with a kept file name, the
/// name the previous file was renamed to). It counts toward the limit even
/// if nothing has been written to it yet. Failures are logged and never
/// stop the sweep.
#[tracing::instrument(skip_all, fields(current = %current_path.display()))]
pub(super) fn apply_retention(
    roller: &PathRoller,
    policy: &RetentionPolicy,
    current_path: &Path,
    keep_file_name: bool,
    now: NaiveDateTime,
    hooks: Option<&dyn FileLifecycleHooks>,
) {
    if policy.is_unbounded() {
        return;
    }

    let Some(current_name) = current_path.file_name().and_then(|n| n.to_str()) else {
        return;
    };

    let mut file_names = match list_file_names(roller.directory()) {
        Ok(file_names) => file_names,
        Err(e) => {
            error!(
                "failed to list {} for retention: {}",
                roller.directory().display(),
                e
            );
            return;
        }
    };

    if !file_names.iter().any(|name| name == current_name) {
        file_names.push(current_name.to_string());
    }

    let candidates = roller.select_matches(&file_names).collect();

    for file_name in obsolete_files(candidates, current_name, keep_file_name, policy, now) {
        let path = roller.directory().join(&file_name);
        info!("deleting {}", path.display());

        let result = match hooks {
            Some(hooks) => hooks.on_file_deleting(&path),
            None => Ok(()),
        }
        .and_then(|()| std::fs::remove_file(&path));

        if let Err(e) = result {
            // keep going, the next roll will retry
            error!("failed to remove log file {}: {}", path.display(), e);
        }
    }
}

/// Names of the candidates to delete, newest first.
fn obsolete_files(
    mut candidates: Vec<FileMatch>,
    current_name: &str,
    keep_file_name: bool,
    policy: &RetentionPolicy,
    now: NaiveDateTime,
) -> Vec<String> {
    candidates.sort_by(|lhs, rhs| rhs.cmp(lhs));

    let cutoff = policy
        .age_of_files
        .and_then(|age| TimeDelta::from_std(age).ok())
        .and_then(|age| now.checked_sub_signed(age));

    let should_retain = |index: usize, candidate: &FileMatch| {
        // the current file occupies one slot
        if policy
            .number_of_files
            .is_some_and(|max_files| index + 1 >= max_files)
        {
            return false;
        }

        match (cutoff, candidate.checkpoint) {
            (Some(cutoff), Some(checkpoint)) => checkpoint.as_datetime() >= cutoff,
            _ => true,
        }
    };

    candidates
        .into_iter()
        .filter(|candidate| keep_file_name || candidate.file_name != current_name)
        .enumerate()
        .skip_while(|(index, candidate)| should_retain(*index, candidate))
        .map(|(_, candidate)| candidate.file_name)
        .collect()
}
