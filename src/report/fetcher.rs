//! レポートのダウンロードと結果判定

use std::path::Path;
use std::time::Duration;

use chrono::Local;
use futures::StreamExt;
use reqwest::header::{HeaderName, CONTENT_DISPOSITION, CONTENT_TYPE};
use tokio::io::AsyncWriteExt;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::config::FetchConfig;
use crate::error::ReportError;
use crate::session::Session;

use super::query::build_report_url;
use super::response::{
    debug_sibling, is_html, is_login_redirect, login_debug_path, read_signature,
    resolve_output_name,
};
use super::types::{FetchOutcome, ReportQuery, UnavailableReason};

/// レポート取得
#[derive(Clone)]
pub struct ReportFetcher {
    session: Session,
    config: FetchConfig,
}

impl ReportFetcher {
    pub fn new(session: Session, config: FetchConfig) -> Self {
        Self { session, config }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// 1回だけ取得を試みる（リトライなし）
    ///
    /// HTML・ログインリダイレクト・シグネチャ不一致は `FetchOutcome::Unavailable`。
    /// ネットワークエラーとHTTPエラーステータスは `Err`。
    pub async fn fetch(
        &self,
        query: &ReportQuery,
        output_name: Option<&str>,
    ) -> Result<FetchOutcome, ReportError> {
        let url = build_report_url(&self.config.endpoint, query)?;

        info!(
            "Downloading report for {} to {} (svc_id={})",
            query.start_date, query.end_date, query.svc_ids
        );
        debug!("URL: {}", url);

        if !self.config.courtesy_delay.is_zero() {
            sleep(self.config.courtesy_delay).await;
        }

        // 全体の締め切りではなく、ヘッダー受信までとチャンク間の無通信時間で打ち切る
        let request = self.session.client().get(&url).send();
        let resp = timeout(self.config.timeout, request)
            .await
            .map_err(|_| ReportError::Timeout {
                after: self.config.timeout,
                url: url.clone(),
            })??;

        let status = resp.status();
        let final_url = resp.url().to_string();
        if !status.is_success() {
            return Err(ReportError::HttpStatus {
                status,
                url: final_url,
            });
        }

        tokio::fs::create_dir_all(&self.config.output_dir).await?;

        if is_login_redirect(&final_url, &self.config.login_marker) {
            let debug_path = login_debug_path(&self.config.output_dir, output_name);
            save_body(resp, &debug_path, self.config.timeout).await?;
            warn!("Redirected to login: {}", final_url);
            warn!("Saved HTML to: {:?}", debug_path);
            return Ok(FetchOutcome::Unavailable(UnavailableReason::LoginRedirect {
                final_url,
                debug_path,
            }));
        }

        let (content_type, disposition) = {
            let header = |name: HeaderName| {
                resp.headers()
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            };
            (header(CONTENT_TYPE), header(CONTENT_DISPOSITION))
        };

        let output_name =
            resolve_output_name(output_name, disposition.as_deref(), Local::now());
        let output_path = self.config.output_dir.join(output_name);

        if content_type.as_deref().is_some_and(is_html) {
            let debug_path = debug_sibling(&output_path);
            save_body(resp, &debug_path, self.config.timeout).await?;
            warn!("Server returned HTML (likely login or error page)");
            warn!("Saved HTML to: {:?}", debug_path);
            return Ok(FetchOutcome::Unavailable(UnavailableReason::HtmlBody {
                debug_path,
            }));
        }

        info!("Saving to file: {:?}", output_path);
        let bytes = save_body(resp, &output_path, self.config.timeout).await?;
        info!(
            "Download completed. Total size: {} bytes, content type: {}",
            bytes,
            content_type.as_deref().unwrap_or("Unknown")
        );

        match read_signature(&output_path).await {
            Ok(Some(signature)) => {
                info!("Excel file ({:?}) downloaded to {:?}", signature, output_path);
                Ok(FetchOutcome::Downloaded {
                    path: output_path,
                    bytes,
                    content_type,
                })
            }
            // 不正なファイルは削除せずに残す
            Ok(None) => {
                warn!(
                    "File does not look like an Excel file (signature check failed): {:?}",
                    output_path
                );
                Ok(FetchOutcome::Unavailable(
                    UnavailableReason::InvalidSignature { path: output_path },
                ))
            }
            Err(e) => {
                warn!(
                    "Could not read back {:?} for signature check: {}",
                    output_path, e
                );
                Ok(FetchOutcome::Unavailable(UnavailableReason::Unreadable {
                    path: output_path,
                }))
            }
        }
    }
}

/// レスポンスボディをチャンク単位で書き込み、バイト数を返す
///
/// 途中で失敗した場合は書きかけのファイルを削除する。
async fn save_body(
    resp: reqwest::Response,
    path: &Path,
    idle: Duration,
) -> Result<u64, ReportError> {
    let url = resp.url().to_string();
    let mut file = tokio::fs::File::create(path).await?;

    let result = copy_body(resp, &mut file, idle, &url).await;
    if result.is_err() {
        drop(file);
        if let Err(e) = tokio::fs::remove_file(path).await {
            debug!("Failed to remove partial file {:?}: {}", path, e);
        }
    }
    result
}

async fn copy_body(
    resp: reqwest::Response,
    file: &mut tokio::fs::File,
    idle: Duration,
    url: &str,
) -> Result<u64, ReportError> {
    let mut stream = resp.bytes_stream();
    let mut total: u64 = 0;

    loop {
        let next = timeout(idle, stream.next())
            .await
            .map_err(|_| ReportError::Timeout {
                after: idle,
                url: url.to_string(),
            })?;
        let Some(chunk) = next else {
            break;
        };
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        total += chunk.len() as u64;
    }

    file.flush().await?;
    Ok(total)
}
