use crate::system::actions::ProcessControl;
use crate::system::process::ProcessRecord;
use crate::system::snapshot::{FullSnapshot, MemorySnapshot};

/// Accounts treated as belonging to the OS, compared after lower-casing and
/// stripping any `DOMAIN\` qualifier.
const SYSTEM_ACCOUNTS: [&str; 7] = [
    "root",
    "system",
    "local system",
    "localservice",
    "local service",
    "networkservice",
    "network service",
];

const SYSTEM_PIDS: [u32; 3] = [0, 1, 2];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub hide_system: bool,
    pub hide_inaccessible: bool,
    pub search: String,
}

impl FilterCriteria {
    pub fn search_needle(&self) -> String {
        self.search.trim().to_lowercase()
    }

    pub fn is_active(&self) -> bool {
        self.hide_system || self.hide_inaccessible || !self.search_needle().is_empty()
    }
}

/// Rows of one snapshot that pass the active filters, plus the pre-filter
/// process count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredView {
    pub memory: MemorySnapshot,
    pub rows: Vec<ProcessRecord>,
    pub total: usize,
    pub filtered: bool,
}

pub fn is_system_process(record: &ProcessRecord) -> bool {
    if SYSTEM_PIDS.contains(&record.pid) {
        return true;
    }
    let user = record.normalized_user();
    SYSTEM_ACCOUNTS.contains(&user.as_str())
}

/// Re-resolves the executable every call since access can change between
/// samples. A vanished process counts as inaccessible.
pub fn is_inaccessible(pid: u32, control: &mut dyn ProcessControl) -> bool {
    let Ok(path) = control.executable_path(pid) else {
        return true;
    };
    if path.as_os_str().is_empty() || !control.path_exists(&path) {
        return true;
    }
    match path.parent() {
        Some(dir) => !control.directory_readable(dir),
        None => true,
    }
}

pub fn matches_search(record: &ProcessRecord, needle: &str) -> bool {
    needle.is_empty() || record.name.to_lowercase().contains(needle)
}

/// Apply system, inaccessible and search filters, in that order, to a cached
/// snapshot. Only the inaccessible filter touches the OS.
pub fn apply_filters(
    snapshot: &FullSnapshot,
    criteria: &FilterCriteria,
    control: &mut dyn ProcessControl,
) -> FilteredView {
    let needle = criteria.search_needle();
    let rows = snapshot
        .processes
        .iter()
        .filter(|p| !criteria.hide_system || !is_system_process(p))
        .filter(|p| !criteria.hide_inaccessible || !is_inaccessible(p.pid, control))
        .filter(|p| matches_search(p, &needle))
        .cloned()
        .collect();

    FilteredView {
        memory: snapshot.memory,
        rows,
        total: snapshot.len(),
        filtered: criteria.is_active(),
    }
}
