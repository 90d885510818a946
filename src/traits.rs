use async_trait::async_trait;
use tracing::warn;

use crate::browser::BrowserCookie;
use crate::error::ReportError;

#[async_trait]
pub trait SessionBootstrapper: Send {
    /// ブラウザ起動
    async fn launch(&mut self) -> Result<(), ReportError>;

    /// ログインページを開いてログイン完了を待つ
    async fn authenticate(&mut self) -> Result<(), ReportError>;

    /// ブラウザのクッキーを取得
    async fn collect_cookies(&mut self) -> Result<Vec<BrowserCookie>, ReportError>;

    /// リソース解放（未起動でも呼べること）
    async fn close(&mut self) -> Result<(), ReportError>;

    /// 一括実行（launch → authenticate → collect_cookies → close）
    ///
    /// 途中で失敗しても close は必ず実行する。
    async fn bootstrap(&mut self) -> Result<Vec<BrowserCookie>, ReportError> {
        let result = async {
            self.launch().await?;
            self.authenticate().await?;
            self.collect_cookies().await
        }
        .await;

        if let Err(e) = self.close().await {
            warn!("Failed to release browser resources: {}", e);
        }

        result
    }
}
