use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use chrono::Local;
use tower::Service;
use tracing::info;

use crate::config::FetchConfig;
use crate::error::ReportError;
use crate::report::{FetchOutcome, ReportFetcher, ReportQuery, ServiceIds};
use crate::session::Session;

/// レポート取得リクエスト（未解決の入力値）
#[derive(Debug, Clone, Default)]
pub struct ReportRequest {
    /// `YYYY-MM-DD`（省略時は終了日の6日前）
    pub start_date: Option<String>,
    /// `YYYY-MM-DD`（省略時は今日）
    pub end_date: Option<String>,
    pub svc_ids: ServiceIds,
    /// 省略時は設定の既定値
    pub cus_id: Option<u32>,
    pub pro_id: Option<u32>,
    /// 保存ファイル名（省略時はサーバー提案名かタイムスタンプ）
    pub output: Option<String>,
}

impl ReportRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dates(mut self, start: Option<String>, end: Option<String>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn with_svc_ids(mut self, svc_ids: impl Into<ServiceIds>) -> Self {
        self.svc_ids = svc_ids.into();
        self
    }

    pub fn with_customer(mut self, cus_id: u32, pro_id: u32) -> Self {
        self.cus_id = Some(cus_id);
        self.pro_id = Some(pro_id);
        self
    }

    pub fn with_output(mut self, output: Option<String>) -> Self {
        self.output = output;
        self
    }

    /// 日付・IDを検証して `ReportQuery` にする
    pub fn resolve(&self, config: &FetchConfig) -> Result<ReportQuery, ReportError> {
        ReportQuery::resolve(
            self.start_date.as_deref(),
            self.end_date.as_deref(),
            &self.svc_ids,
            self.cus_id.unwrap_or(config.default_cus_id),
            self.pro_id.unwrap_or(config.default_pro_id),
            &config.default_svc_ids,
            Local::now().date_naive(),
        )
    }
}

/// tower::Serviceを実装したレポート取得サービス
#[derive(Clone)]
pub struct ReportService {
    fetcher: ReportFetcher,
}

impl ReportService {
    pub fn new(session: Session, config: FetchConfig) -> Self {
        Self {
            fetcher: ReportFetcher::new(session, config),
        }
    }
}

impl Service<ReportRequest> for ReportService {
    type Response = FetchOutcome;
    type Error = ReportError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ReportRequest) -> Self::Future {
        let fetcher = self.fetcher.clone();

        Box::pin(async move {
            // 入力値エラーはネットワークアクセス前に返す
            let query = req.resolve(fetcher.config())?;
            info!(
                "Report request: cusId={}, proId={}, {}..{}",
                query.cus_id, query.pro_id, query.start_date, query.end_date
            );

            fetcher.fetch(&query, req.output.as_deref()).await
        })
    }
}
