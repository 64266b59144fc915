use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use explog_client::{ClientConfig, DEFAULT_BASE_URL, HttpLogsApi};
use explog_core::model::{
    AuthToken, Credentials, DEFAULT_LIMIT, ExperimentId, LogLevel, LogQuery, RunId,
};
use explog_core::{
    Aggregator, ElapsedMode, ExperimentListing, ListView, LogFeed, LogsApi, RunDetails,
    RunListing, Session, session,
};
use explog_observe::{LoggerConfig, LoggerFormat, LoggerLevel, init_logger};

mod render;

#[derive(Debug, Parser)]
#[command(
    name = "explog-viewer",
    version,
    about = "Browse experiments, runs and logs stored on a remote log server"
)]
struct Cli {
    /// API root of the log server.
    #[arg(long, env = "EXPLOG_URL", default_value = DEFAULT_BASE_URL, global = true)]
    url: String,

    /// API token (see `login`).
    #[arg(long, env = "EXPLOG_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    #[arg(long, env = "EXPLOG_TIMEOUT_MS", default_value_t = 15_000, global = true)]
    timeout_ms: u64,

    /// How finished configurations' run time is decomposed.
    #[arg(long, value_enum, default_value_t = ElapsedArg::Duration, global = true)]
    elapsed: ElapsedArg,

    #[arg(long, value_enum, env = "EXPLOG_LOG_FORMAT", default_value_t = LoggerFormat::Text, global = true)]
    log_format: LoggerFormat,

    /// Log filter directives, e.g. `warn,explog_client=debug`; overrides `-v`.
    #[arg(long, env = "EXPLOG_LOG", global = true)]
    log_level: Option<LoggerLevel>,

    /// More log output; repeat for more.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ElapsedArg {
    /// Plain days/hours/minutes/seconds.
    Duration,
    /// Same numbers as the legacy web viewer, in the local time zone.
    Calendar,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the server version.
    Version,
    /// Exchange credentials for a token and print it.
    Login {
        #[arg(long, env = "EXPLOG_USER")]
        username: String,
        #[arg(long, env = "EXPLOG_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Invalidate the token on the server.
    Logout,
    /// Show the account the token belongs to.
    Whoami,
    /// List experiments with their last run.
    Experiments,
    /// Show one experiment and its last run.
    Experiment { id: ExperimentId },
    /// List runs of an experiment, newest first.
    Runs { experiment: String },
    /// Show a run's configurations grouped by state.
    Run {
        id: RunId,
        /// Refresh every N seconds until Ctrl-C.
        #[arg(long, value_name = "SECS")]
        watch: Option<u64>,
    },
    /// Show a run's log entries, newest first.
    Logs {
        run_id: RunId,
        /// Minimum level: debug, info, warn, error.
        #[arg(long)]
        level: Option<LogLevel>,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        /// Follow pagination to the oldest entry.
        #[arg(long, conflicts_with = "offset")]
        all: bool,
    },
    /// Delete a run and its logs.
    RmRun { id: RunId },
    /// Delete an experiment and all of its runs.
    RmExperiment { id: ExperimentId },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Local offset lookups only work before other threads exist.
    let mode = match cli.elapsed {
        ElapsedArg::Duration => ElapsedMode::Duration,
        ElapsedArg::Calendar => ElapsedMode::calendar_local(),
    };

    let log_cfg = LoggerConfig {
        format: cli.log_format,
        level: cli
            .log_level
            .clone()
            .unwrap_or_else(|| LoggerLevel::from_verbosity(cli.verbose)),
        with_targets: cli.verbose >= 2,
        ..Default::default()
    };
    init_logger(&log_cfg)?;
    debug!("logger initialized");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli, mode))
}

async fn run(cli: Cli, mode: ElapsedMode) -> anyhow::Result<()> {
    let session = match cli.token {
        Some(token) => Session::with_token(AuthToken::new(token)),
        None => Session::new(),
    };
    let config = ClientConfig {
        base_url: cli.url,
        timeout_ms: cli.timeout_ms,
        ..Default::default()
    };
    let api: Arc<dyn LogsApi> = Arc::new(HttpLogsApi::new(&config, session.clone())?);
    info!("using log server at {}", config.base_url);

    match cli.command {
        Command::Version => {
            println!("{}", api.version().await?);
        }
        Command::Login { username, password } => {
            let creds = Credentials::new(username, password);
            let user = session::login(api.as_ref(), &session, &creds).await?;
            let token = session.token().context("server returned no token")?;
            eprintln!("logged in as {}", user.username);
            println!("{}", token.as_str());
        }
        Command::Logout => {
            require_token(&session)?;
            session::logout(api.as_ref(), &session).await?;
            eprintln!("logged out");
        }
        Command::Whoami => {
            require_token(&session)?;
            if !session::check(api.as_ref(), &session).await? {
                bail!("token was rejected by the server");
            }
            if let Some(user) = session.user() {
                render::user(&user);
            }
        }
        Command::Experiments => {
            require_token(&session)?;
            let mut view = ListView::new(api, session, ExperimentListing);
            view.refresh().await?;
            render::experiments(view.items().unwrap_or_default());
        }
        Command::Experiment { id } => {
            require_token(&session)?;
            let experiment = api.get_experiment(id).await.inspect_err(|e| {
                session.observe_error(e);
            })?;
            render::experiment(&experiment);
        }
        Command::Runs { experiment } => {
            require_token(&session)?;
            let listing = RunListing {
                experiment_name: experiment,
            };
            let mut view = ListView::new(api, session, listing);
            view.refresh().await?;
            render::runs(view.items().unwrap_or_default());
        }
        Command::Run { id, watch } => {
            require_token(&session)?;
            let view = RunDetails::new(api, session, id).with_aggregator(Aggregator::new(mode));
            match watch {
                Some(secs) => watch_run(view, Duration::from_secs(secs.max(1))).await?,
                None => show_run(view).await?,
            }
        }
        Command::Logs {
            run_id,
            level,
            limit,
            offset,
            all,
        } => {
            require_token(&session)?;
            if all {
                let mut feed = LogFeed::new(api, session, run_id)
                    .with_page_size(limit)
                    .with_level(level);
                feed.load_first().await?;
                while feed.has_more() {
                    feed.load_more().await?;
                }
                render::logs(feed.entries());
            } else {
                let mut query = LogQuery::new().with_limit(limit).with_offset(offset);
                query.level = level;
                let page = api.get_logs(run_id, &query).await?;
                render::logs(&page.results);
                if page.has_next() {
                    let next = query.advanced(page.results.len());
                    eprintln!(
                        "{} of {} entries shown; next page: --offset {}",
                        next.offset.min(page.count),
                        page.count,
                        next.offset
                    );
                }
            }
        }
        Command::RmRun { id } => {
            require_token(&session)?;
            RunDetails::new(api, session, id).remove().await?;
            eprintln!("run {id} removed");
        }
        Command::RmExperiment { id } => {
            require_token(&session)?;
            let mut view = ListView::new(api, session, ExperimentListing);
            view.remove(id).await?;
            eprintln!("experiment {id} removed");
            render::experiments(view.items().unwrap_or_default());
        }
    }
    Ok(())
}

fn require_token(session: &Session) -> anyhow::Result<()> {
    if !session.is_logged_in() {
        bail!("no token: run `explog-viewer login` and export EXPLOG_TOKEN, or pass --token");
    }
    Ok(())
}

async fn show_run(mut view: RunDetails) -> anyhow::Result<()> {
    view.refresh().await?;
    if let (Some(run), Some(breakdown)) = (view.run(), view.breakdown()) {
        render::run(run, breakdown);
    }
    Ok(())
}

async fn watch_run(mut view: RunDetails, every: Duration) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    info!("watching run {} every {:?}; press Ctrl+C to stop", view.run_id(), every);
    loop {
        match view.refresh().await {
            Ok(()) => {
                if let (Some(run), Some(breakdown)) = (view.run(), view.breakdown()) {
                    render::clear_screen();
                    render::run(run, breakdown);
                    render::refreshed(view.refreshed_at(), every);
                    if run.status().is_terminal() && !breakdown.status().is_active() {
                        info!("run {} is no longer active", run.id);
                        break;
                    }
                }
            }
            Err(e) if e.is_unauthorized() => return Err(e.into()),
            // Keep showing the last good state and try again on the next tick.
            Err(e) => warn!("refresh failed: {}", e),
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(every) => {}
        }
    }
    Ok(())
}
