//! wareconn レポートダウンローダー
//!
//! - Chrome を開いてログインしてもらい、クッキーをHTTPクライアントへ移す
//! - 日付範囲とサービスIDを指定して Excel レポートをダウンロード
//! - HTML・ログインリダイレクト・不正ファイルは調査用ファイルを残して「取得不可」
//!
//! # 使用例
//!
//! ```rust,ignore
//! use wareconn_report::{
//!     ChromeBootstrapper, FetchConfig, LoginConfig, ReportRequest, ReportService, Session,
//!     SessionBootstrapper, SessionConfig,
//! };
//! use tower::Service;
//!
//! #[tokio::main]
//! async fn main() {
//!     let session = Session::new(SessionConfig::default()).unwrap();
//!
//!     let mut browser = ChromeBootstrapper::new(LoginConfig::default());
//!     let cookies = browser.bootstrap().await.unwrap();
//!     session.import_cookies(&cookies);
//!     session.warm_up().await;
//!
//!     let mut service = ReportService::new(session, FetchConfig::default());
//!     let request = ReportRequest::new()
//!         .with_dates(Some("2024-03-01".into()), Some("2024-03-07".into()));
//!
//!     let outcome = service.call(request).await.unwrap();
//!     println!("Report: {:?}", outcome.path());
//! }
//! ```

pub mod browser;
pub mod config;
pub mod error;
pub mod report;
pub mod service;
pub mod session;
pub mod traits;

// 主要な型をリエクスポート
pub use browser::{BrowserCookie, ChromeBootstrapper, ProfileMode};
pub use config::{FetchConfig, LoginConfig, SessionConfig};
pub use error::ReportError;
pub use report::{FetchOutcome, ReportFetcher, ReportQuery, ServiceIds, UnavailableReason};
pub use service::{ReportRequest, ReportService};
pub use session::{ProbeReport, Session};
pub use traits::SessionBootstrapper;
