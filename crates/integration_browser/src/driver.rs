//! Driver discovery and launch

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::BrowserConfig;
use crate::error::BrowserError;
use crate::webdriver::WebDriverClient;

const DRIVER_CANDIDATES: &[&str] = &["chromedriver", "chromium.chromedriver"];

const BROWSER_CANDIDATES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
];

/// How long a freshly spawned driver gets to answer `/status`
const LAUNCH_TIMEOUT: Duration = Duration::from_secs(10);

const LAUNCH_POLL: Duration = Duration::from_millis(100);

/// Where sessions are created, and the driver process if we own it
#[derive(Debug)]
pub(crate) struct DriverEndpoint {
    pub(crate) url: String,
    pub(crate) browser_binary: Option<PathBuf>,
    process: Option<Mutex<Child>>,
}

impl DriverEndpoint {
    /// An endpoint someone else runs
    pub(crate) fn remote(url: &str, browser_binary: Option<PathBuf>) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            browser_binary,
            process: None,
        }
    }

    /// Locate the driver and browser, start the driver and wait until it is ready
    pub(crate) async fn launch(config: &BrowserConfig) -> Result<Self, BrowserError> {
        let search_path = std::env::var_os("PATH");
        let (driver, browser) = locate(config, search_path.as_deref())?;

        let mut child = Command::new(&driver)
            .arg(format!("--port={}", config.driver_port))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BrowserError::LaunchFailed(format!("{}: {e}", driver.display())))?;

        let url = format!("http://127.0.0.1:{}", config.driver_port);
        let client = WebDriverClient::new(&url, LAUNCH_POLL * 10)?;
        let deadline = tokio::time::Instant::now() + LAUNCH_TIMEOUT;

        loop {
            if client.is_ready().await {
                break;
            }
            if let Ok(Some(status)) = child.try_wait() {
                return Err(BrowserError::LaunchFailed(format!(
                    "{} exited with {status}",
                    driver.display()
                )));
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(BrowserError::LaunchFailed(format!(
                    "{} not ready after {}s",
                    driver.display(),
                    LAUNCH_TIMEOUT.as_secs()
                )));
            }
            tokio::time::sleep(LAUNCH_POLL).await;
        }

        info!(driver = %driver.display(), browser = %browser.display(), %url, "WebDriver launched");
        Ok(Self {
            url,
            browser_binary: Some(browser),
            process: Some(Mutex::new(child)),
        })
    }

    /// Whether this endpoint owns a local driver process
    pub(crate) const fn is_local(&self) -> bool {
        self.process.is_some()
    }
}

/// Resolve the driver and browser executables
pub(crate) fn locate(
    config: &BrowserConfig,
    search_path: Option<&OsStr>,
) -> Result<(PathBuf, PathBuf), BrowserError> {
    let driver = find_executable(config.driver_binary.as_deref(), DRIVER_CANDIDATES, search_path)
        .ok_or_else(|| {
            BrowserError::DriverNotFound(describe(config.driver_binary.as_deref(), DRIVER_CANDIDATES))
        })?;
    let browser =
        find_executable(config.browser_binary.as_deref(), BROWSER_CANDIDATES, search_path)
            .ok_or_else(|| {
                BrowserError::BrowserNotFound(describe(
                    config.browser_binary.as_deref(),
                    BROWSER_CANDIDATES,
                ))
            })?;
    debug!(driver = %driver.display(), browser = %browser.display(), "Executables located");
    Ok((driver, browser))
}

/// A configured path must exist; otherwise the first candidate on the search path wins
fn find_executable(
    configured: Option<&Path>,
    candidates: &[&str],
    search_path: Option<&OsStr>,
) -> Option<PathBuf> {
    if let Some(path) = configured {
        return path.is_file().then(|| path.to_path_buf());
    }

    let dirs: Vec<PathBuf> = search_path.map(|p| std::env::split_paths(p).collect())?;
    candidates.iter().find_map(|name| {
        dirs.iter()
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file())
    })
}

fn describe(configured: Option<&Path>, candidates: &[&str]) -> String {
    configured.map_or_else(
        || format!("none of {} on PATH", candidates.join(", ")),
        |path| format!("{} does not exist", path.display()),
    )
}

#[cfg(test)]
mod tests {
    use std::fs::File;

    use tempfile::TempDir;

    use super::*;

    fn bin_dir(names: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in names {
            File::create(dir.path().join(name)).unwrap();
        }
        dir
    }

    #[test]
    fn finds_candidates_on_search_path() {
        let dir = bin_dir(&["chromium.chromedriver", "chromium"]);
        let (driver, browser) =
            locate(&BrowserConfig::default(), Some(dir.path().as_os_str())).unwrap();
        assert!(driver.ends_with("chromium.chromedriver"));
        assert!(browser.ends_with("chromium"));
    }

    #[test]
    fn earlier_candidate_wins() {
        let dir = bin_dir(&["chromedriver", "chromium.chromedriver"]);
        let found = find_executable(None, DRIVER_CANDIDATES, Some(dir.path().as_os_str()));
        assert!(found.unwrap().ends_with("chromedriver"));
    }

    #[test]
    fn missing_driver_is_reported() {
        let dir = bin_dir(&["chromium"]);
        let err = locate(&BrowserConfig::default(), Some(dir.path().as_os_str())).unwrap_err();
        assert!(matches!(err, BrowserError::DriverNotFound(_)));
        assert!(err.is_unavailable());
    }

    #[test]
    fn missing_browser_is_reported() {
        let dir = bin_dir(&["chromedriver"]);
        let err = locate(&BrowserConfig::default(), Some(dir.path().as_os_str())).unwrap_err();
        assert!(matches!(err, BrowserError::BrowserNotFound(_)));
    }

    #[test]
    fn configured_path_must_exist() {
        let dir = bin_dir(&["chromedriver", "chromium"]);
        let config = BrowserConfig {
            driver_binary: Some(dir.path().join("missing-driver")),
            ..BrowserConfig::default()
        };
        let err = locate(&config, Some(dir.path().as_os_str())).unwrap_err();
        assert!(err.to_string().contains("missing-driver"));
    }

    #[test]
    fn no_search_path() {
        assert!(find_executable(None, DRIVER_CANDIDATES, None).is_none());
    }

    #[test]
    fn remote_endpoint_owns_no_process() {
        let endpoint = DriverEndpoint::remote("http://selenium:4444/", None);
        assert_eq!(endpoint.url, "http://selenium:4444");
        assert!(!endpoint.is_local());
    }
}
