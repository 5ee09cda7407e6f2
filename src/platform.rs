//! Detection of the hosting environment from platform-provided environment variables.

use std::fmt;

const SITE_NAME_VAR: &str = "WEBSITE_SITE_NAME";
const HOSTNAME_VAR: &str = "WEBSITE_HOSTNAME";
const INSTANCE_ID_VAR: &str = "WEBSITE_INSTANCE_ID";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    /// Managed app-hosting platform (App Service style `WEBSITE_*` variables present).
    AppService { site_name: Option<String>, hostname: Option<String> },
    Local,
}

impl Platform {
    #[must_use]
    pub const fn is_managed(&self) -> bool {
        matches!(self, Self::AppService { .. })
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AppService { site_name, hostname } => write!(
                f,
                "app-service (site={}, host={})",
                site_name.as_deref().unwrap_or("unknown"),
                hostname.as_deref().unwrap_or("unknown")
            ),
            Self::Local => f.write_str("local"),
        }
    }
}

/// Detects the platform from the process environment.
#[must_use]
pub fn detect() -> Platform {
    detect_from(|name| std::env::var(name).ok())
}

/// Detects the platform using `lookup` to read variables.
pub fn detect_from<F>(lookup: F) -> Platform
where
    F: Fn(&str) -> Option<String>,
{
    let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

    let site_name = read(SITE_NAME_VAR);
    let hostname = read(HOSTNAME_VAR);
    let instance_id = read(INSTANCE_ID_VAR);

    if site_name.is_none() && hostname.is_none() && instance_id.is_none() {
        return Platform::Local;
    }

    Platform::AppService { site_name, hostname }
}
