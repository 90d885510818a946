//! 対話ログイン → レポート取得の動作確認
//!
//! 実行方法:
//! ```
//! cargo run --example fetch_report
//! ```

use tower::Service;
use tracing_subscriber::EnvFilter;
use wareconn_report::{
    ChromeBootstrapper, FetchConfig, FetchOutcome, LoginConfig, ProfileMode, ReportRequest,
    ReportService, Session, SessionBootstrapper, SessionConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ログ設定
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    // プロファイルを残したい場合は WARECONN_PROFILE_DIR を指定
    let profile = ProfileMode::from_flags(
        false,
        "Default",
        std::env::var("WARECONN_PROFILE_DIR").ok().map(Into::into),
    );

    println!("=== wareconn Report Test ===");
    println!("Profile: {:?}", profile);

    let session = Session::new(SessionConfig::default())?;

    let mut browser = ChromeBootstrapper::new(
        LoginConfig::default()
            .with_profile(profile)
            .with_headless(false) // デバッグ用に表示モード
            .with_debug(true),
    );
    let cookies = browser.bootstrap().await?;
    println!("Cookies from browser: {}", cookies.len());
    println!("Imported: {}", session.import_cookies(&cookies));
    session.warm_up().await;

    let mut service = ReportService::new(
        session,
        FetchConfig::default().with_output_dir("./downloads"),
    );
    let request = ReportRequest::new().with_svc_ids(std::env::var("WARECONN_SVC_IDS").ok().as_deref());

    match service.call(request).await? {
        FetchOutcome::Downloaded { path, bytes, .. } => {
            println!("成功! 保存先: {:?} ({} bytes)", path, bytes);
        }
        FetchOutcome::Unavailable(reason) => {
            eprintln!("取得できませんでした: {}", reason);
        }
    }

    Ok(())
}
