use std::{
    env, fs,
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{anyhow, bail, Context, Result};

use crate::tray::startup::StartupManager;

const AGENT_LABEL: &str = "com.scripttray.scripttray";

/// `~/Library/LaunchAgents` entry that opens the tray at login.
pub struct LaunchAgent {
    agents_dir: PathBuf,
    exe: PathBuf,
}

impl LaunchAgent {
    pub fn new(agents_dir: impl Into<PathBuf>, exe: impl Into<PathBuf>) -> Self {
        Self {
            agents_dir: agents_dir.into(),
            exe: exe.into(),
        }
    }

    pub fn for_current_user() -> Result<Self> {
        let home = env::var_os("HOME").ok_or_else(|| anyhow!("HOME is not set"))?;
        let exe = env::current_exe().context("locating scripttray executable")?;
        Ok(Self::new(
            Path::new(&home).join("Library").join("LaunchAgents"),
            exe,
        ))
    }

    fn plist_path(&self) -> PathBuf {
        self.agents_dir.join(format!("{AGENT_LABEL}.plist"))
    }

    fn register(&self) -> Result<()> {
        fs::create_dir_all(&self.agents_dir)
            .with_context(|| format!("creating {}", self.agents_dir.display()))?;
        let path = self.plist_path();
        fs::write(&path, render_plist(&self.exe))
            .with_context(|| format!("writing {}", path.display()))?;

        let domain = gui_domain();
        let target = path.to_string_lossy();
        launchctl_quiet(&["bootout", &domain, &target]);
        launchctl(&["bootstrap", &domain, &target])?;
        launchctl_quiet(&["enable", &format!("{domain}/{AGENT_LABEL}")]);
        tracing::info!(plist = %path.display(), "start at login enabled");
        Ok(())
    }

    fn unregister(&self) -> Result<()> {
        let path = self.plist_path();
        if !path.exists() {
            return Ok(());
        }
        let domain = gui_domain();
        launchctl_quiet(&["disable", &format!("{domain}/{AGENT_LABEL}")]);
        launchctl_quiet(&["bootout", &domain, &path.to_string_lossy()]);
        fs::remove_file(&path).with_context(|| format!("removing {}", path.display()))?;
        tracing::info!("start at login disabled");
        Ok(())
    }
}

impl StartupManager for LaunchAgent {
    fn is_enabled(&self) -> Result<bool> {
        Ok(self.plist_path().is_file())
    }

    fn set_enabled(&self, enabled: bool) -> Result<()> {
        match enabled {
            true => self.register(),
            false => self.unregister(),
        }
    }
}

/// `gui/<uid>`; the uid comes from `id -u` since agents may start without `$UID`.
fn gui_domain() -> String {
    let uid = Command::new("id")
        .arg("-u")
        .output()
        .ok()
        .filter(|out| out.status.success())
        .and_then(|out| String::from_utf8(out.stdout).ok())
        .and_then(|s| s.trim().parse::<u32>().ok())
        .unwrap_or(0);
    format!("gui/{uid}")
}

fn render_plist(exe: &Path) -> String {
    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" ",
            "\"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n",
            "<plist version=\"1.0\">\n<dict>\n",
            "  <key>Label</key><string>{label}</string>\n",
            "  <key>ProgramArguments</key>\n  <array>\n    <string>{exe}</string>\n  </array>\n",
            "  <key>RunAtLoad</key><true/>\n",
            "  <key>KeepAlive</key><false/>\n",
            "</dict>\n</plist>\n",
        ),
        label = AGENT_LABEL,
        exe = exe.display(),
    )
}

fn launchctl(args: &[&str]) -> Result<()> {
    let out = Command::new("launchctl")
        .args(args)
        .output()
        .with_context(|| format!("launchctl {}", args.join(" ")))?;
    if !out.status.success() {
        bail!(
            "launchctl {} exited with {}: {}",
            args[0],
            out.status,
            String::from_utf8_lossy(&out.stderr).trim()
        );
    }
    Ok(())
}

fn launchctl_quiet(args: &[&str]) {
    if let Err(e) = launchctl(args) {
        tracing::debug!(error = %e, "ignored launchctl failure");
    }
}
