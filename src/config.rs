use std::path::PathBuf;
use std::time::Duration;

use crate::browser::ProfileMode;

pub const WARECONN_ORIGIN: &str = "https://www.wareconn.com/";
pub const REPORT_ENDPOINT: &str = "https://www.wareconn.com/r/Summary/downBaseInfo";
pub const COOKIE_DOMAIN_FILTER: &str = "wareconn.com";
pub const LOGIN_MARKER: &str = "login";

pub const DEFAULT_CUS_ID: u32 = 316;
pub const DEFAULT_PRO_ID: u32 = 492;
pub const DEFAULT_SVC_IDS: &str =
    "879,898,1145,1203,1297,1310,1360,1397,1418,1420,1455,1488,1489,1494,1495,1514,1527,1541";

/// Chrome 120 相当のヘッダー
///
/// Accept-Encoding は reqwest が展開可能な形式を自動で付けるので含めない
fn browser_like_headers(origin: &str) -> Vec<(String, String)> {
    let origin_no_slash = origin.trim_end_matches('/');
    [
        (
            "User-Agent",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        ),
        (
            "Accept",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet,\
             application/vnd.ms-excel,\
             text/html,application/xhtml+xml,application/xml;q=0.9,\
             image/webp,*/*;q=0.8",
        ),
        ("Accept-Language", "en-US,en;q=0.9"),
        ("Upgrade-Insecure-Requests", "1"),
        ("Sec-Fetch-Dest", "document"),
        ("Sec-Fetch-Mode", "navigate"),
        ("Sec-Fetch-Site", "none"),
        ("Sec-Fetch-User", "?1"),
        (
            "Sec-Ch-Ua",
            r#""Not_A Brand";v="8", "Chromium";v="120", "Google Chrome";v="120""#,
        ),
        ("Sec-Ch-Ua-Mobile", "?0"),
        ("Sec-Ch-Ua-Platform", r#""Windows""#),
        ("Origin", origin_no_slash),
        ("Referer", origin),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// HTTPセッション設定
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// ウォームアップ・疎通確認に使うオリジン
    pub origin: String,
    /// クッキー取り込み対象のドメイン（部分一致）
    pub cookie_domain_filter: String,
    /// 全リクエストに付与するヘッダー
    pub headers: Vec<(String, String)>,
    pub warmup_timeout: Duration,
    pub probe_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            origin: WARECONN_ORIGIN.to_string(),
            cookie_domain_filter: COOKIE_DOMAIN_FILTER.to_string(),
            headers: browser_like_headers(WARECONN_ORIGIN),
            warmup_timeout: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(10),
        }
    }
}

impl SessionConfig {
    /// オリジンを差し替える（Origin / Referer ヘッダーも追従）
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self.headers = browser_like_headers(&self.origin);
        self
    }

    pub fn with_cookie_domain_filter(mut self, filter: impl Into<String>) -> Self {
        self.cookie_domain_filter = filter.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }
}

/// ブラウザログイン設定
#[derive(Debug, Clone)]
pub struct LoginConfig {
    pub login_url: String,
    pub profile: ProfileMode,
    pub headless: bool,
    /// Chrome 実行ファイル（未指定なら CHROME_PATH / CHROMIUM_PATH / 自動検出）
    pub chrome_executable: Option<PathBuf>,
    pub debug: bool,
    /// ヘッドレス時にページ読み込みを待つ時間
    pub settle_delay: Duration,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            login_url: WARECONN_ORIGIN.to_string(),
            profile: ProfileMode::Ephemeral,
            headless: false,
            chrome_executable: None,
            debug: false,
            settle_delay: Duration::from_secs(2),
        }
    }
}

impl LoginConfig {
    pub fn new(login_url: impl Into<String>) -> Self {
        Self {
            login_url: login_url.into(),
            ..Default::default()
        }
    }

    pub fn with_profile(mut self, profile: ProfileMode) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_chrome_executable(mut self, path: Option<PathBuf>) -> Self {
        self.chrome_executable = path;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// レポートダウンロード設定
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub endpoint: String,
    /// 最終URLにこの文字列が含まれていたらログイン画面へのリダイレクトとみなす
    pub login_marker: String,
    pub default_svc_ids: String,
    pub default_cus_id: u32,
    pub default_pro_id: u32,
    /// 応答ヘッダーまでの待ち時間、およびボディ受信中の無通信許容時間
    pub timeout: Duration,
    /// リクエスト前の待機（リトライではない）
    pub courtesy_delay: Duration,
    pub output_dir: PathBuf,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            endpoint: REPORT_ENDPOINT.to_string(),
            login_marker: LOGIN_MARKER.to_string(),
            default_svc_ids: DEFAULT_SVC_IDS.to_string(),
            default_cus_id: DEFAULT_CUS_ID,
            default_pro_id: DEFAULT_PRO_ID,
            timeout: Duration::from_secs(60),
            courtesy_delay: Duration::from_millis(400),
            output_dir: PathBuf::from("."),
        }
    }
}

impl FetchConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_courtesy_delay(mut self, delay: Duration) -> Self {
        self.courtesy_delay = delay;
        self
    }

    pub fn with_default_svc_ids(mut self, ids: impl Into<String>) -> Self {
        self.default_svc_ids = ids.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_builder() {
        let config = FetchConfig::default()
            .with_endpoint("http://localhost/r/Summary/downBaseInfo")
            .with_output_dir("/tmp/reports")
            .with_timeout(Duration::from_secs(5))
            .with_courtesy_delay(Duration::ZERO);

        assert_eq!(config.endpoint, "http://localhost/r/Summary/downBaseInfo");
        assert_eq!(config.output_dir, PathBuf::from("/tmp/reports"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.courtesy_delay, Duration::ZERO);
        assert_eq!(config.default_cus_id, 316);
        assert_eq!(config.default_pro_id, 492);
    }

    #[test]
    fn test_session_config_origin_updates_headers() {
        let config = SessionConfig::default().with_origin("http://127.0.0.1:8080/");
        let origin = config
            .headers
            .iter()
            .find(|(k, _)| k == "Origin")
            .map(|(_, v)| v.as_str());
        assert_eq!(origin, Some("http://127.0.0.1:8080"));
    }

    #[test]
    fn test_session_config_with_header_replaces() {
        let config = SessionConfig::default().with_header("user-agent", "test-agent");
        let agents: Vec<_> = config
            .headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("user-agent"))
            .collect();
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].1, "test-agent");
    }

    #[test]
    fn test_login_config_builder() {
        let config = LoginConfig::new("https://example.com/login")
            .with_profile(ProfileMode::Persistent {
                dir: PathBuf::from("/tmp/profile"),
            })
            .with_headless(true)
            .with_debug(true);

        assert_eq!(config.login_url, "https://example.com/login");
        assert!(config.headless);
        assert!(config.debug);
        assert!(matches!(config.profile, ProfileMode::Persistent { .. }));
    }
}
