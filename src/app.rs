use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::cli::args::{CliArgs, CliCommand, FetchArgs, ImportArgs, KeyArgs, RenderArgs, ServeArgs};
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::keystore::KeyStore;
use crate::output::{self, OutputFormat};
use crate::relay::{self, RelayConfig};
use crate::request::{ApiTarget, QueryInput, DEFAULT_API_BASE};
use crate::runner::{self, Options, Runner};
use crate::session::Session;
use crate::status::Status;
use crate::view::{ViewMode, ViewState};

const DEFAULT_COMMAND: &str = "profile";

/// How the session is shown and exported after a fetch or import.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct RenderPlan {
    view: ViewMode,
    expand_all: bool,
    output: Option<String>,
    output_format: Option<OutputFormat>,
    export_json: Option<String>,
    export_csv: Option<String>,
    quiet: bool,
}

#[derive(Clone, Debug)]
struct FetchRun {
    input: QueryInput,
    options: Options,
    render: RenderPlan,
}

#[derive(Clone, Debug)]
struct ImportRun {
    path: PathBuf,
    render: RenderPlan,
}

#[derive(Clone, Debug)]
enum Action {
    Fetch(FetchRun),
    Import(ImportRun),
    Serve(RelayConfig),
    ForgetKey(PathBuf),
}

#[derive(Clone, Debug)]
struct RunConfig {
    color: Option<bool>,
    action: Action,
}

fn init_tracing(verbose: u8, serving: bool) {
    let level = match (verbose, serving) {
        (0, false) => "warn",
        (0, true) | (1, _) => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("omarlens={level},tower_http={level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_user_config(path: Option<&str>) -> Result<ConfigFile, String> {
    if let Some(path) = path {
        return config::load_config(&config::expand_tilde(path), false);
    }
    let Some(path) = config::default_config_path() else {
        return Ok(ConfigFile::default());
    };
    if let Err(e) = config::ensure_default_config_file(&path) {
        debug!(error = %e, "could not create default config");
    }
    config::load_config(&path, true)
}

fn resolve_credentials(args: &KeyArgs, cfg: &ConfigFile) -> Option<PathBuf> {
    args.credentials
        .clone()
        .or_else(|| cfg.credentials.clone())
        .map(|p| config::expand_tilde(&p))
        .or_else(config::default_credentials_path)
}

fn parse_setting<T>(
    raw: Option<String>,
    parse: impl Fn(&str) -> Option<T>,
    what: &str,
) -> Result<Option<T>, String> {
    match raw {
        Some(raw) => parse(&raw)
            .map(Some)
            .ok_or_else(|| format!("invalid {what} '{raw}'")),
        None => Ok(None),
    }
}

fn build_render(args: RenderArgs, cfg: &ConfigFile) -> Result<RenderPlan, String> {
    validation::validate_render(&args)?;
    let view = parse_setting(args.view.or_else(|| cfg.view.clone()), ViewMode::parse, "view")?
        .unwrap_or_default();
    let output_format = parse_setting(
        args.output_format.or_else(|| cfg.output_format.clone()),
        OutputFormat::parse,
        "output format",
    )?;
    let expand = |p: String| config::expand_tilde_string(&p);

    Ok(RenderPlan {
        view,
        expand_all: args.expand_all || cfg.expand_all.unwrap_or(false),
        output: args.output.or_else(|| cfg.output.clone()).map(expand),
        output_format,
        export_json: args.export_json.map(expand),
        export_csv: args.export_csv.map(expand),
        quiet: args.quiet,
    })
}

fn build_fetch(args: FetchArgs, cfg: &ConfigFile) -> Result<FetchRun, String> {
    validation::validate_fetch(&args)?;
    let credentials = resolve_credentials(&args.keys, cfg);
    let render = build_render(args.render, cfg)?;

    let relay = args
        .relay
        .or_else(|| cfg.relay_url.clone())
        .filter(|origin| !origin.trim().is_empty());
    let target = match relay {
        Some(origin) => ApiTarget::Relay { origin },
        None => ApiTarget::Direct {
            base: args
                .api_base
                .or_else(|| cfg.api_base.clone())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        },
    };
    let timeout = args
        .timeout
        .or(cfg.timeout)
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs);

    let input = QueryInput {
        username: args
            .username
            .or_else(|| cfg.username.clone())
            .unwrap_or_default(),
        api_key: args.key.unwrap_or_default(),
        command: args
            .command
            .or_else(|| cfg.command.clone())
            .unwrap_or_else(|| DEFAULT_COMMAND.to_string()),
        extra_value: args.extra.unwrap_or_default(),
    };

    Ok(FetchRun {
        input,
        options: Options {
            target,
            timeout,
            credentials,
        },
        render,
    })
}

fn build_import(args: ImportArgs, cfg: &ConfigFile) -> Result<ImportRun, String> {
    Ok(ImportRun {
        path: config::expand_tilde(&args.file),
        render: build_render(args.render, cfg)?,
    })
}

fn build_serve(args: ServeArgs, cfg: &ConfigFile) -> Result<RelayConfig, String> {
    validation::validate_serve(&args)?;
    let defaults = RelayConfig::default();
    let bind = match args.bind.or_else(|| cfg.bind.clone()) {
        Some(raw) => raw
            .parse::<SocketAddr>()
            .map_err(|e| format!("invalid bind address '{raw}': {e}"))?,
        None => defaults.bind,
    };
    let upstream = args
        .upstream
        .or_else(|| cfg.upstream.clone())
        .unwrap_or(defaults.upstream);
    reqwest::Url::parse(&upstream).map_err(|e| format!("invalid upstream '{upstream}': {e}"))?;

    Ok(RelayConfig {
        bind,
        upstream,
        assets_dir: args
            .assets_dir
            .or_else(|| cfg.assets_dir.clone())
            .map(|p| config::expand_tilde(&p)),
    })
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    let color = if args.color {
        Some(true)
    } else if args.no_color || cfg.no_color.unwrap_or(false) {
        Some(false)
    } else {
        None
    };

    let action = match args.action {
        CliCommand::Fetch(fetch) => Action::Fetch(build_fetch(fetch, &cfg)?),
        CliCommand::Import(import) => Action::Import(build_import(import, &cfg)?),
        CliCommand::Serve(serve) => Action::Serve(build_serve(serve, &cfg)?),
        CliCommand::ForgetKey(keys) => Action::ForgetKey(
            resolve_credentials(&keys, &cfg)
                .ok_or("could not locate the home directory, pass --credentials")?,
        ),
    };

    Ok(RunConfig { color, action })
}

fn spinner(message: &'static str) -> Result<ProgressBar, String> {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .map_err(|e| format!("failed to build spinner style: {e}"))?,
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(200));
    Ok(pb)
}

async fn write_file(path: &str, contents: &str) -> Result<(), String> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .await
        .map_err(|e| format!("failed to open '{path}': {e}"))?;
    file.write_all(contents.as_bytes())
        .await
        .map_err(|e| format!("failed to write '{path}': {e}"))?;
    file.flush()
        .await
        .map_err(|e| format!("failed to write '{path}': {e}"))
}

/// Picks the file format: explicit flag, then extension, then the active view.
fn output_format_for(plan: &RenderPlan, path: &str, view: &ViewState) -> OutputFormat {
    plan.output_format
        .or_else(|| output::infer_format_from_path(path))
        .unwrap_or(match view.mode() {
            ViewMode::List => OutputFormat::Html,
            ViewMode::Json => OutputFormat::Json,
        })
}

fn apply_plan(session: &Session, view: &mut ViewState, plan: &RenderPlan) {
    if plan.view == ViewMode::List && view.mode() != ViewMode::List {
        if let Err(status) = view.toggle_view(session) {
            eprintln!("{status}");
        }
    }
    if plan.expand_all && !view.details_expanded() {
        view.toggle_details();
    }
}

async fn present(session: &Session, view: &mut ViewState, plan: &RenderPlan) -> Result<(), String> {
    apply_plan(session, view, plan);

    eprintln!("{}", Status::neutral(view.record_count_label(session)));
    let updated = session.last_updated_label();
    if !updated.is_empty() {
        eprintln!("{}", Status::neutral(updated));
    }
    if view.list_available() && view.mode() == ViewMode::Json {
        eprintln!(
            "{}",
            Status::neutral("Following list available, use --view list to browse it.")
        );
    }

    if let Some(path) = plan.output.as_deref() {
        let format = output_format_for(plan, path, view);
        let rendered = output::render(format, session, view).map_err(|e| e.to_string())?;
        write_file(path, &rendered).await?;
        eprintln!("{}", Status::success(format!("Output written to {path}")));
    }

    if let Some(path) = plan.export_json.as_deref() {
        match output::render_json(session) {
            Ok(text) => {
                write_file(path, &text).await?;
                eprintln!("{}", Status::success("Export ready."));
            }
            Err(e) => eprintln!("{}", Status::error(e.to_string())),
        }
    }

    if let Some(path) = plan.export_csv.as_deref() {
        match output::render_csv(session) {
            Ok(text) => {
                write_file(path, &text).await?;
                eprintln!("{}", Status::success("CSV export ready."));
            }
            Err(e) => eprintln!("{}", Status::error(e.to_string())),
        }
    }

    if !plan.quiet {
        let text = output::render_text(session, view).map_err(|e| e.to_string())?;
        if text.ends_with('\n') {
            print!("{text}");
        } else {
            println!("{text}");
        }
    }
    Ok(())
}

async fn run_fetch(run: FetchRun) -> Result<(), String> {
    let runner = Runner::new(run.options).map_err(|e| e.to_string())?;
    let mut input = run.input;
    runner.resolve_api_key(&mut input);

    let mut session = Session::new();
    let mut view = ViewState::default();

    let pb = spinner("Fetching data…")?;
    let status = runner.fetch(&input, &mut session, &mut view).await;
    pb.finish_and_clear();

    if status.is_error() {
        return Err(status.message);
    }
    eprintln!("{status}");
    present(&session, &mut view, &run.render).await
}

async fn run_import(run: ImportRun) -> Result<(), String> {
    let mut session = Session::new();
    let mut view = ViewState::default();
    let status = runner::import_file(&run.path, &mut session, &mut view);
    if status.is_error() {
        return Err(status.message);
    }
    eprintln!("{status}");
    present(&session, &mut view, &run.render).await
}

async fn run_serve(config: RelayConfig) -> Result<(), String> {
    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown requested");
    };
    relay::serve(config, shutdown).await.map_err(|e| e.to_string())
}

fn forget_key(path: PathBuf) -> Result<(), String> {
    let removed = KeyStore::new(path).clear().map_err(|e| e.to_string())?;
    if removed {
        eprintln!("{}", Status::success("Stored API key removed."));
    } else {
        eprintln!("{}", Status::neutral("No stored API key."));
    }
    Ok(())
}

async fn run_async(action: Action) -> Result<(), String> {
    match action {
        Action::Fetch(run) => run_fetch(run).await,
        Action::Import(run) => run_import(run).await,
        Action::Serve(config) => run_serve(config).await,
        Action::ForgetKey(path) => forget_key(path),
    }
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{e}");
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    init_tracing(args.verbose, matches!(args.action, CliCommand::Serve(_)));
    let cfg = load_user_config(args.config.as_deref())?;
    let run = build_run_config(args, cfg)?;

    if let Some(enabled) = run.color {
        colored::control::set_override(enabled);
    }

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run.action))
}
