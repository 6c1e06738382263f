use std::io::{self, Write};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use riskchat::api::HttpApi;
use riskchat::api::types::{ReportKind, TERMINAL_STATE, UserProfile};
use riskchat::config::{ClientConfig, ReportPolling};
use riskchat::dashboard::Dashboard;
use riskchat::error::{ApiError, ConfigError};
use riskchat::session::{Phase, ReportOutcome, SessionClient, SubmitOutcome};
use riskchat::survey::{self, SurveyClient, SurveyError};
use riskchat::view::{SessionView, TerminalView};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not build HTTP client: {0}")]
    Http(#[from] ApiError),
    #[error("{0}")]
    Profile(SurveyError),
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "riskchat", about = "Conversational store security risk assessment")]
struct Cli {
    #[arg(long, env = "RISKCHAT_API_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "RISKCHAT_REQUEST_TIMEOUT_SECS")]
    request_timeout_secs: Option<String>,

    #[arg(long, env = "RISKCHAT_CONNECT_TIMEOUT_SECS")]
    connect_timeout_secs: Option<String>,

    #[arg(long, env = "RISKCHAT_REPORT_POLL_ATTEMPTS")]
    poll_attempts: Option<String>,

    #[arg(long, env = "RISKCHAT_REPORT_POLL_INTERVAL_MS")]
    poll_interval_ms: Option<String>,

    #[arg(long, env = "RISKCHAT_REPORT_POLL_MAX_INTERVAL_MS")]
    poll_max_interval_ms: Option<String>,

    #[arg(long, env = "RISKCHAT_DOWNLOAD_DIR")]
    download_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    /// Flags (already merged with their env fallbacks by clap) fed through
    /// the same parser the library uses for the environment.
    fn config(&self) -> Result<ClientConfig, ConfigError> {
        ClientConfig::from_lookup(|key| {
            let value = match key {
                "RISKCHAT_API_BASE_URL" => &self.base_url,
                "RISKCHAT_REQUEST_TIMEOUT_SECS" => &self.request_timeout_secs,
                "RISKCHAT_CONNECT_TIMEOUT_SECS" => &self.connect_timeout_secs,
                "RISKCHAT_REPORT_POLL_ATTEMPTS" => &self.poll_attempts,
                "RISKCHAT_REPORT_POLL_INTERVAL_MS" => &self.poll_interval_ms,
                "RISKCHAT_REPORT_POLL_MAX_INTERVAL_MS" => &self.poll_max_interval_ms,
                "RISKCHAT_DOWNLOAD_DIR" => &self.download_dir,
                _ => return None,
            };
            value.clone()
        })
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the assessment conversation interactively.
    Chat(ChatArgs),
    /// Register a store profile and answer the security survey.
    Survey(SurveyArgs),
    /// Fetch and show the report dashboard for an existing session.
    Report {
        #[arg(long)]
        session_id: String,
    },
    /// Download a report PDF for an existing session.
    Download {
        #[arg(long)]
        session_id: String,
        #[arg(long)]
        kind: ReportKind,
    },
}

#[derive(Args, Debug)]
struct ChatArgs {
    #[arg(long, help = "Report kind to save once the assessment finishes (quick or detailed)")]
    download: Vec<ReportKind>,
}

#[derive(Args, Debug)]
struct SurveyArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    store_address: String,
    #[arg(long)]
    post_code: String,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let config = cli.config()?;
    let api = Arc::new(HttpApi::from_config(&config)?);
    debug!(base_url = %api.base_url(), "client configured");

    match cli.command {
        Command::Chat(args) => run_chat(&config, api, &args.download).await,
        Command::Survey(args) => run_survey(api, args).await,
        Command::Report { session_id } => run_report(&config, api, session_id).await,
        Command::Download { session_id, kind } => run_download(&config, api, session_id, kind).await,
    }
}

// =============================================================================
// SESSION FLOW
// =============================================================================

async fn run_chat(config: &ClientConfig, api: Arc<HttpApi>, downloads: &[ReportKind]) -> Result<(), CliError> {
    let client = SessionClient::new(api, config.polling);
    let mut view = TerminalView::new(io::stdout());
    let mut input = stdin_lines();

    client.start_session().await;
    let mut seen = render_new(&client, &mut view, 0)?;

    while client.snapshot().accepts_input() {
        prompt()?;
        let Some(line) = input.next_line().await? else {
            break;
        };
        let outcome = client.submit_answer(&line).await;
        seen = render_new(&client, &mut view, seen)?;
        if outcome == SubmitOutcome::Rejected {
            if let Some(notice) = client.notice() {
                view.render_notice(&notice)?;
            }
        }
    }

    // The terminal transition already ran the one automatic fetch.
    let snapshot = client.snapshot();
    if let Some(hint) = report_hint(snapshot.phase, snapshot.session.as_ref().map(|s| s.id.as_str())) {
        println!("{hint}");
    }
    seen = render_new(&client, &mut view, seen)?;
    render_reports(&client, &mut view)?;

    if client.reports().is_some() {
        for &kind in downloads {
            client.download_report(kind, &config.download_dir).await;
        }
        render_new(&client, &mut view, seen)?;
    }
    Ok(())
}

async fn run_report(config: &ClientConfig, api: Arc<HttpApi>, session_id: String) -> Result<(), CliError> {
    let client = SessionClient::resume(api, config.polling, session_id, TERMINAL_STATE.to_owned());
    let mut view = TerminalView::new(io::stdout());

    if client.fetch_report().await == ReportOutcome::Pending {
        println!("The report is not ready yet.");
    }
    render_new(&client, &mut view, 0)?;
    render_reports(&client, &mut view)
}

async fn run_download(
    config: &ClientConfig,
    api: Arc<HttpApi>,
    session_id: String,
    kind: ReportKind,
) -> Result<(), CliError> {
    let client = SessionClient::resume(api, ReportPolling::single_shot(), session_id, TERMINAL_STATE.to_owned());
    let mut view = TerminalView::new(io::stdout());

    client.download_report(kind, &config.download_dir).await;
    render_new(&client, &mut view, 0)?;
    Ok(())
}

/// What to tell the user when the conversation ended without a report.
fn report_hint(phase: Phase, session_id: Option<&str>) -> Option<String> {
    match (phase, session_id) {
        (Phase::ReportPending, Some(id)) => {
            Some(format!("The report is not available yet. Try `riskchat report --session-id {id}` later."))
        }
        _ => None,
    }
}

fn render_new<W: Write>(client: &SessionClient, view: &mut TerminalView<W>, seen: usize) -> io::Result<usize> {
    let fresh = client.messages_since(seen);
    view.render_messages(&fresh)?;
    Ok(seen + fresh.len())
}

fn render_reports<W: Write>(client: &SessionClient, view: &mut TerminalView<W>) -> Result<(), CliError> {
    if let Some(reports) = client.reports() {
        view.render_dashboard(&Dashboard::build(&reports.quick, &reports.detailed))?;
    }
    Ok(())
}

// =============================================================================
// SURVEY FLOW
// =============================================================================

async fn run_survey(api: Arc<HttpApi>, args: SurveyArgs) -> Result<(), CliError> {
    let store = UserProfile {
        name: args.name,
        store_address: args.store_address,
        post_code: args.post_code,
    };
    let profile = match survey::create_profile(&*api, &store).await {
        Ok(profile) => profile,
        Err(error @ SurveyError::IncompleteProfile(_)) => return Err(CliError::Profile(error)),
        Err(error) => {
            println!("Could not register the store: {error}");
            return Ok(());
        }
    };

    let mut client = SurveyClient::new(api, profile);
    let mut view = TerminalView::new(io::stdout());
    let mut input = stdin_lines();

    client.next_question().await;
    let mut seen = client.messages().len();
    view.render_messages(client.messages())?;

    while !client.is_complete() {
        prompt()?;
        let Some(line) = input.next_line().await? else {
            break;
        };
        client.submit_answer(&line).await;
        let fresh = client.messages_since(seen);
        view.render_messages(fresh)?;
        seen += fresh.len();
    }
    Ok(())
}

// =============================================================================
// TERMINAL
// =============================================================================

fn stdin_lines() -> Lines<BufReader<Stdin>> {
    BufReader::new(tokio::io::stdin()).lines()
}

fn prompt() -> io::Result<()> {
    let mut out = io::stdout();
    write!(out, "> ")?;
    out.flush()
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
