//! Chrome を起動してログイン済みクッキーを取り出す

use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::LoginConfig;
use crate::error::ReportError;
use crate::traits::SessionBootstrapper;

use super::types::{BrowserCookie, ProfileMode};

/// navigator.webdriver を隠す（新しいドキュメントごとに実行）
const HIDE_WEBDRIVER_SCRIPT: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined})";

const TEMP_PROFILE_PREFIX: &str = "chrome_login_profile_";

/// 普段使いのChromeのユーザーデータディレクトリ
pub fn real_chrome_user_data_dir() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        dirs::data_local_dir().map(|d| d.join("Google").join("Chrome").join("User Data"))
    } else if cfg!(target_os = "macos") {
        dirs::home_dir().map(|h| h.join("Library/Application Support/Google/Chrome"))
    } else {
        dirs::config_dir().map(|d| d.join("google-chrome"))
    }
}

/// chromiumoxide の既定引数は使わない（--enable-automation を渡さないため）
fn launch_args(config: &LoginConfig) -> Vec<String> {
    let mut args = vec![
        "--disable-dev-shm-usage".to_string(),
        "--disable-blink-features=AutomationControlled".to_string(),
        format!("--profile-directory={}", config.profile.profile_directory()),
    ];

    if !config.headless {
        args.push("--start-maximized".to_string());
    }

    if config.debug {
        args.push("--enable-logging=stderr".to_string());
        args.push("--v=1".to_string());
    }

    args
}

fn chrome_executable(config: &LoginConfig) -> Option<PathBuf> {
    config.chrome_executable.clone().or_else(|| {
        std::env::var("CHROME_PATH")
            .or_else(|_| std::env::var("CHROMIUM_PATH"))
            .ok()
            .map(PathBuf::from)
    })
}

/// ENTER が押されるまで待機（EOFでも続行）
async fn wait_for_enter() -> Result<(), ReportError> {
    print!("When you are fully logged in, press ENTER here to continue... ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(())
}

/// デバッグ用スクリーンショットをログに出す
async fn log_debug_screenshot(page: &Page) {
    if let Ok(screenshot) = page
        .screenshot(ScreenshotParams::builder().full_page(true).build())
        .await
    {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&screenshot);
        debug!("Login screenshot: data:image/png;base64,{}", encoded);
    }
}

/// 対話ログイン用ブラウザ
pub struct ChromeBootstrapper {
    config: LoginConfig,
    browser: Option<Browser>,
    page: Option<Page>,
    handler: Option<JoinHandle<()>>,
    temp_profile: Option<TempDir>,
}

impl ChromeBootstrapper {
    pub fn new(config: LoginConfig) -> Self {
        Self {
            config,
            browser: None,
            page: None,
            handler: None,
            temp_profile: None,
        }
    }

    fn get_page(&self) -> Result<&Page, ReportError> {
        self.page
            .as_ref()
            .ok_or_else(|| ReportError::BrowserSession("Browser not launched".to_string()))
    }

    /// プロファイルモードに応じたユーザーデータディレクトリを用意
    fn prepare_user_data_dir(&mut self) -> Result<PathBuf, ReportError> {
        match &self.config.profile {
            ProfileMode::RealProfile { profile_name } => {
                let dir = real_chrome_user_data_dir().ok_or_else(|| {
                    ReportError::BrowserLaunch(
                        "Chrome user data directory could not be determined".to_string(),
                    )
                })?;
                info!("Attaching to real Chrome profile '{}' in {:?}", profile_name, dir);
                Ok(dir)
            }
            ProfileMode::Persistent { dir } => {
                std::fs::create_dir_all(dir)?;
                info!("Using persistent profile directory {:?}", dir);
                Ok(dir.clone())
            }
            ProfileMode::Ephemeral => {
                let temp = tempfile::Builder::new()
                    .prefix(TEMP_PROFILE_PREFIX)
                    .tempdir()?;
                let dir = temp.path().to_path_buf();
                info!("Using temporary profile directory {:?}", dir);
                self.temp_profile = Some(temp);
                Ok(dir)
            }
        }
    }
}

#[async_trait]
impl SessionBootstrapper for ChromeBootstrapper {
    async fn launch(&mut self) -> Result<(), ReportError> {
        info!("Launching Chrome for interactive login...");

        let user_data_dir = self.prepare_user_data_dir()?;

        let mut builder = BrowserConfig::builder()
            .disable_default_args()
            .no_sandbox()
            .user_data_dir(&user_data_dir)
            .args(launch_args(&self.config));

        if !self.config.headless {
            builder = builder.with_head();
        }

        if let Some(path) = chrome_executable(&self.config) {
            debug!("Chrome executable: {:?}", path);
            builder = builder.chrome_executable(path);
        }

        let browser_config = builder.build().map_err(ReportError::BrowserLaunch)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ReportError::BrowserLaunch(e.to_string()))?;

        // ハンドラータスクを起動
        self.handler = Some(tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser event error: {:?}", e);
                }
            }
        }));

        // 以降で失敗しても close で終了できるよう先に保持する
        let browser = self.browser.insert(browser);

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ReportError::BrowserLaunch(e.to_string()))?;

        if let Err(e) = page
            .evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(
                HIDE_WEBDRIVER_SCRIPT,
            ))
            .await
        {
            debug!("Failed to register webdriver script: {}", e);
        }

        self.page = Some(page);

        info!("Chrome launched");
        Ok(())
    }

    async fn authenticate(&mut self) -> Result<(), ReportError> {
        let page = self.get_page()?.clone();
        let login_url = self.config.login_url.clone();

        page.goto(login_url.as_str())
            .await
            .map_err(|e| ReportError::BrowserSession(format!("{}: {}", login_url, e)))?;

        if self.config.headless {
            info!("Running headless - cookies must already exist in the profile");
            sleep(self.config.settle_delay).await;
        } else {
            println!();
            println!("Chrome opened. Please log in at {} in that window.", login_url);
            wait_for_enter().await?;
        }

        if self.config.debug {
            log_debug_screenshot(&page).await;
        }

        Ok(())
    }

    async fn collect_cookies(&mut self) -> Result<Vec<BrowserCookie>, ReportError> {
        let page = self.get_page()?.clone();

        let cookies: Vec<BrowserCookie> = page
            .get_cookies()
            .await
            .map_err(|e| ReportError::BrowserSession(format!("cookie read failed: {}", e)))?
            .into_iter()
            .map(BrowserCookie::from)
            .collect();

        debug!("Browser returned {} cookies", cookies.len());
        Ok(cookies)
    }

    async fn close(&mut self) -> Result<(), ReportError> {
        self.page = None;

        if let Some(mut browser) = self.browser.take() {
            info!("Closing Chrome...");
            if let Err(e) = browser.close().await {
                debug!("Browser close failed: {}", e);
            }
            if let Err(e) = browser.wait().await {
                debug!("Browser wait failed: {}", e);
            }
        }

        if let Some(handler) = self.handler.take() {
            handler.abort();
        }

        if let Some(temp) = self.temp_profile.take() {
            let dir = temp.path().to_path_buf();
            if let Err(e) = temp.close() {
                warn!("Failed to remove temporary profile {:?}: {}", dir, e);
            } else {
                debug!("Removed temporary profile {:?}", dir);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_args_headed() {
        let config = LoginConfig::default();
        let args = launch_args(&config);

        assert!(args.contains(&"--disable-blink-features=AutomationControlled".to_string()));
        assert!(args.contains(&"--start-maximized".to_string()));
        assert!(args.contains(&"--profile-directory=Default".to_string()));
        assert!(!args.iter().any(|a| a == "--enable-automation"));
        assert!(!args.iter().any(|a| a.starts_with("--enable-logging")));
    }

    #[test]
    fn test_launch_args_headless_real_profile_debug() {
        let config = LoginConfig::default()
            .with_headless(true)
            .with_debug(true)
            .with_profile(ProfileMode::RealProfile {
                profile_name: "Profile 1".into(),
            });
        let args = launch_args(&config);

        assert!(!args.contains(&"--start-maximized".to_string()));
        assert!(args.contains(&"--profile-directory=Profile 1".to_string()));
        assert!(args.contains(&"--enable-logging=stderr".to_string()));
    }

    #[test]
    fn test_chrome_executable_override_wins() {
        let config =
            LoginConfig::default().with_chrome_executable(Some(PathBuf::from("/opt/chrome")));
        assert_eq!(chrome_executable(&config), Some(PathBuf::from("/opt/chrome")));
    }

    #[tokio::test]
    async fn test_ephemeral_profile_removed_on_close() {
        let mut bootstrapper = ChromeBootstrapper::new(LoginConfig::default());
        let dir = bootstrapper.prepare_user_data_dir().unwrap();
        assert!(dir.exists());
        assert!(dir
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(TEMP_PROFILE_PREFIX));

        bootstrapper.close().await.unwrap();
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_persistent_profile_kept_on_close() {
        let parent = tempfile::tempdir().unwrap();
        let dir = parent.path().join("automation-profile");
        let mut bootstrapper = ChromeBootstrapper::new(
            LoginConfig::default().with_profile(ProfileMode::Persistent { dir: dir.clone() }),
        );

        let prepared = bootstrapper.prepare_user_data_dir().unwrap();
        assert_eq!(prepared, dir);
        bootstrapper.close().await.unwrap();
        assert!(dir.exists());
    }

    #[tokio::test]
    async fn test_collect_cookies_before_launch_fails() {
        let mut bootstrapper = ChromeBootstrapper::new(LoginConfig::default());
        let result = bootstrapper.collect_cookies().await;
        assert!(matches!(result, Err(ReportError::BrowserSession(_))));
    }

    #[tokio::test]
    #[ignore] // 実環境テスト用: cargo test test_headless_bootstrap -- --ignored --nocapture
    async fn test_headless_bootstrap() {
        let config = LoginConfig::new("https://www.wareconn.com/").with_headless(true);
        let mut bootstrapper = ChromeBootstrapper::new(config);

        let cookies = bootstrapper.bootstrap().await.expect("bootstrap failed");
        println!("cookies: {}", cookies.len());
    }
}
