use std::path::PathBuf;

/// Outcome of looking up one `appList` entry on the system path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppCheck {
    pub app: String,
    pub found: Option<PathBuf>,
}

impl AppCheck {
    pub fn warning(&self) -> Option<String> {
        match self.found {
            Some(_) => None,
            None => Some(format!("Error:  {} not found!", self.app)),
        }
    }
}

pub fn verify_apps<S: AsRef<str>>(apps: &[S]) -> Vec<AppCheck> {
    apps.iter()
        .map(|app| {
            let app = app.as_ref();
            let found = which::which(app).ok();
            if found.is_none() {
                tracing::warn!(%app, "app not found on PATH");
            }
            AppCheck {
                app: app.to_string(),
                found,
            }
        })
        .collect()
}

/// Warnings for every entry that could not be resolved.
pub fn missing_warnings<S: AsRef<str>>(apps: &[S]) -> Vec<String> {
    verify_apps(apps)
        .iter()
        .filter_map(AppCheck::warning)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn finds_sh() {
        let checks = verify_apps(&["sh"]);
        assert!(checks[0].found.is_some());
        assert_eq!(checks[0].warning(), None);
    }

    #[test]
    fn missing_app_warns_once_per_entry() {
        let warnings = missing_warnings(&["surely-not-a-real-binary-1f3a", "nor-this-one-9c2d"]);
        assert_eq!(
            warnings,
            [
                "Error:  surely-not-a-real-binary-1f3a not found!",
                "Error:  nor-this-one-9c2d not found!"
            ]
        );
    }
}
