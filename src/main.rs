use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tower::Service;
use tracing_subscriber::EnvFilter;

use wareconn_report::{
    ChromeBootstrapper, FetchConfig, FetchOutcome, LoginConfig, ProfileMode, ReportRequest,
    ReportService, ServiceIds, Session, SessionBootstrapper, SessionConfig,
};

#[derive(Parser, Debug)]
#[command(
    name = "wareconn-report",
    version,
    about = "Download report data from wareconn.com using a Chrome login session"
)]
struct Cli {
    /// Start date (YYYY-MM-DD). Default: end date - 6 days
    #[arg(short = 's', long)]
    start_date: Option<String>,

    /// End date (YYYY-MM-DD). Default: today
    #[arg(short = 'e', long)]
    end_date: Option<String>,

    /// Service IDs (comma-separated). Default: common set used in the app
    #[arg(short = 'i', long)]
    svc_ids: Option<String>,

    /// Customer ID
    #[arg(short = 'c', long, default_value_t = wareconn_report::config::DEFAULT_CUS_ID)]
    cus_id: u32,

    /// Project ID
    #[arg(short = 'p', long, default_value_t = wareconn_report::config::DEFAULT_PRO_ID)]
    pro_id: u32,

    /// Output filename. Default: server-suggested name or auto-generated .xlsx
    #[arg(short = 'o', long)]
    output: Option<String>,

    /// Directory for the report and debug files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Open Chrome for interactive login and use those cookies
    #[arg(long)]
    interactive_login: bool,

    /// Attach to your real Chrome profile (avoids logging in each run)
    #[arg(long, conflicts_with = "persist_profile_dir")]
    use_real_chrome_profile: bool,

    /// Chrome profile name ("Default", "Profile 1", ...)
    #[arg(long, default_value = "Default")]
    chrome_profile: String,

    /// Directory for a dedicated automation Chrome profile (login persists across runs)
    #[arg(long)]
    persist_profile_dir: Option<PathBuf>,

    /// Run Chrome headless (only useful with an already logged-in profile)
    #[arg(long)]
    headless: bool,

    /// Path to the Chrome executable
    #[arg(long, env = "CHROME_PATH")]
    chrome_path: Option<PathBuf>,

    /// Test network connectivity to wareconn.com and exit
    #[arg(long)]
    test_network: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help / --version は正常終了、それ以外の引数エラーは 1
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let result = if cli.test_network {
        test_network().await
    } else {
        run(cli).await
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn test_network() -> Result<bool> {
    let session = Session::new(SessionConfig::default())?;
    let origin = session.config().origin.clone();
    println!("Testing network connectivity to {}...", origin);

    match session.probe().await {
        Ok(report) => {
            println!(
                "✓ Successfully connected to {} (status: {})",
                origin, report.status
            );
            println!("  Server: {}", report.server.as_deref().unwrap_or("Unknown"));
            println!(
                "  Content-Type: {}",
                report.content_type.as_deref().unwrap_or("Unknown")
            );
            Ok(true)
        }
        Err(e) => {
            println!("✗ Failed to connect to {}: {}", origin, e);
            println!();
            println!("Troubleshooting steps:");
            println!("1. Check your internet connection");
            println!("2. Try opening {} in your browser", origin);
            println!("3. Check if you're behind a corporate firewall");
            println!("4. Try a different network (mobile hotspot, etc.)");
            Ok(false)
        }
    }
}

async fn run(cli: Cli) -> Result<bool> {
    let session = Session::new(SessionConfig::default())?;

    if cli.interactive_login {
        let profile = ProfileMode::from_flags(
            cli.use_real_chrome_profile,
            cli.chrome_profile.clone(),
            cli.persist_profile_dir.clone(),
        );
        let login_config = LoginConfig::new(session.config().origin.clone())
            .with_profile(profile)
            .with_headless(cli.headless)
            .with_chrome_executable(cli.chrome_path.clone())
            .with_debug(cli.debug);

        let mut bootstrapper = ChromeBootstrapper::new(login_config);
        let cookies = bootstrapper
            .bootstrap()
            .await
            .context("interactive login failed")?;

        let imported = session.import_cookies(&cookies);
        println!("Imported {} cookies from the Chrome session.", imported);
        session.warm_up().await;
    }

    let config = FetchConfig::default().with_output_dir(cli.output_dir);
    let mut service = ReportService::new(session, config);

    let request = ReportRequest::new()
        .with_dates(cli.start_date, cli.end_date)
        .with_svc_ids(ServiceIds::from_csv(cli.svc_ids.as_deref()))
        .with_customer(cli.cus_id, cli.pro_id)
        .with_output(cli.output);

    let outcome = service
        .call(request)
        .await
        .context("error during download")?;

    match outcome {
        FetchOutcome::Downloaded { path, bytes, .. } => {
            println!(
                "Excel file successfully downloaded to: {} ({} bytes)",
                path.display(),
                bytes
            );
            Ok(true)
        }
        FetchOutcome::Unavailable(reason) => {
            eprintln!("Download failed: {}", reason);
            eprintln!("Inspect: {}", reason.artifact().display());
            Ok(false)
        }
    }
}
