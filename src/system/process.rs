/// One row of the process table as captured by a sampling cycle.
///
/// `pid` is only unique at a point in time; the OS may hand it to a new
/// process once this one exits.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    pub user: String,
    pub cpu_percent: f32,
    pub memory_mb: f64,
    pub memory_percent: f64,
    pub disk_io_mb: f64,
}

impl ProcessRecord {
    /// Lower-cased user with any `DOMAIN\` qualifier removed.
    pub fn normalized_user(&self) -> String {
        strip_domain(&self.user).to_lowercase()
    }
}

/// Drop a Windows-style `DOMAIN\` prefix from an account name.
pub fn strip_domain(user: &str) -> &str {
    match user.rsplit_once('\\') {
        Some((_, account)) => account,
        None => user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_domain_keeps_last_segment() {
        assert_eq!(strip_domain("NT AUTHORITY\\SYSTEM"), "SYSTEM");
        assert_eq!(strip_domain("alice"), "alice");
        assert_eq!(strip_domain("a\\b\\c"), "c");
    }

    #[test]
    fn normalized_user_is_lowercase() {
        let record = ProcessRecord {
            pid: 4,
            name: "svc".into(),
            user: "NT AUTHORITY\\LocalService".into(),
            cpu_percent: 0.0,
            memory_mb: 1.0,
            memory_percent: 0.1,
            disk_io_mb: 0.0,
        };
        assert_eq!(record.normalized_user(), "localservice");
    }
}
