//! クッキージャー付きHTTPセッション

use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use tracing::{debug, info, warn};
use url::Url;

use crate::browser::BrowserCookie;
use crate::config::SessionConfig;
use crate::error::ReportError;

/// 疎通確認の結果
#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub status: StatusCode,
    pub server: Option<String>,
    pub content_type: Option<String>,
}

/// ドメインに filter を含むクッキーだけを残す
pub fn filter_cookies<'a>(
    cookies: &'a [BrowserCookie],
    domain_filter: &'a str,
) -> impl Iterator<Item = &'a BrowserCookie> + 'a {
    cookies
        .iter()
        .filter(move |c| c.domain.contains(domain_filter))
}

/// クッキーを登録する際の基準URL（Domain属性の先頭ドットは除く）
fn cookie_url(cookie: &BrowserCookie) -> Option<Url> {
    let host = cookie.domain.trim_start_matches('.');
    if host.is_empty() {
        return None;
    }
    let path = if cookie.path.starts_with('/') {
        cookie.path.as_str()
    } else {
        "/"
    };
    Url::parse(&format!("https://{}{}", host, path)).ok()
}

fn build_headers(pairs: &[(String, String)]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!("Skipping invalid header: {}", name),
        }
    }
    headers
}

/// ブラウザ風ヘッダーとクッキージャーを持つHTTPクライアント
#[derive(Clone)]
pub struct Session {
    client: reqwest::Client,
    jar: Arc<Jar>,
    config: SessionConfig,
}

impl Session {
    pub fn new(config: SessionConfig) -> Result<Self, ReportError> {
        let jar = Arc::new(Jar::default());
        let client = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .default_headers(build_headers(&config.headers))
            .build()?;

        Ok(Self {
            client,
            jar,
            config,
        })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// ブラウザのクッキーを取り込み、取り込んだ件数を返す
    pub fn import_cookies(&self, cookies: &[BrowserCookie]) -> usize {
        let mut imported = 0;

        for cookie in filter_cookies(cookies, &self.config.cookie_domain_filter) {
            let Some(url) = cookie_url(cookie) else {
                warn!("Skipping cookie {} with unusable domain {:?}", cookie.name, cookie.domain);
                continue;
            };

            let header = format!(
                "{}={}; Domain={}; Path={}",
                cookie.name, cookie.value, cookie.domain, cookie.path
            );
            self.jar.add_cookie_str(&header, &url);
            debug!("Imported cookie {} for {}", cookie.name, cookie.domain);
            imported += 1;
        }

        info!(
            "Imported {} of {} cookies from the browser session",
            imported,
            cookies.len()
        );
        imported
    }

    /// url 宛てのリクエストに付く Cookie ヘッダー
    pub fn cookie_header(&self, url: &Url) -> Option<String> {
        self.jar
            .cookies(url)
            .and_then(|v| v.to_str().ok().map(str::to_string))
    }

    /// オリジンに一度アクセスしてサーバー側のクッキー追加を受ける
    ///
    /// 失敗してもエラーにはしない。
    pub async fn warm_up(&self) -> bool {
        match self
            .client
            .get(&self.config.origin)
            .timeout(self.config.warmup_timeout)
            .send()
            .await
        {
            Ok(resp) => {
                debug!("Warm-up request: {} {}", resp.status(), resp.url());
                true
            }
            Err(e) => {
                warn!(
                    "Could not make initial request to {}: {}",
                    self.config.origin, e
                );
                false
            }
        }
    }

    /// オリジンへの疎通確認
    pub async fn probe(&self) -> Result<ProbeReport, ReportError> {
        let resp = self
            .client
            .get(&self.config.origin)
            .timeout(self.config.probe_timeout)
            .send()
            .await?;

        let header = |name: &str| {
            resp.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        Ok(ProbeReport {
            status: resp.status(),
            server: header("server"),
            content_type: header("content-type"),
        })
    }
}
