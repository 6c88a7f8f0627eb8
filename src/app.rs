use std::future::Future;
use std::time::Duration;

use chrono::{Local, Utc};
use clap::{error::ErrorKind, CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::cancel::{CancellationSource, CancellationToken, RequestSlot};
use crate::cli::args::{CliArgs, Command, DirectoryArgs};
use crate::cli::commands::{self, ReplCommand, REPL_HELP};
use crate::cli::validation;
use crate::client::{ApiClient, ClientError, Fetched};
use crate::config::{self, ConfigFile, DEFAULT_API_URL, DEFAULT_TIMEOUT};
use crate::directory::{Directory, ViewError};
use crate::model::{Student, Teacher};
use crate::output::dashboard::{self, CatsReport, ClassesReport, Dashboard};
use crate::output::{render_directory, CardView, OutputFormat};
use crate::schedule;
use crate::session::{fetch_session, Session};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    View(#[from] ViewError),

    #[error("no tenant slug; pass --slug, set CAMPUSDIR_SLUG or add `slug:` to the config file")]
    MissingSlug,

    #[error("no user id; pass --user-id or sign in with --cookie")]
    MissingUserId,

    #[error("failed to read stdin: {source}")]
    Stdin {
        #[source]
        source: std::io::Error,
    },
}

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

#[derive(Clone, Debug)]
struct RunConfig {
    api_url: String,
    slug: Option<String>,
    timeout: u64,
    format: OutputFormat,
    no_color: bool,
    verbose: u8,
    cookie: Option<String>,
    user_id: Option<i64>,
    command: Command,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let command = args
        .command
        .ok_or_else(|| "a subcommand is required (see --help)".to_string())?;

    let api_url = args
        .api_url
        .or(cfg.api_url)
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    validation::validate_api_url(&api_url)?;

    let slug = args.slug.or(cfg.slug);
    if let Some(slug) = slug.as_deref() {
        validation::validate_slug(slug)?;
    }

    let timeout = args.timeout.or(cfg.timeout).unwrap_or(DEFAULT_TIMEOUT);
    validation::validate_timeout(timeout)?;

    let format_raw = args
        .format
        .or(cfg.output_format)
        .unwrap_or_else(|| "text".to_string());
    let format = OutputFormat::parse(&format_raw)
        .ok_or_else(|| format!("invalid output format '{format_raw}', expected text or json"))?;

    let no_color = args.no_color || cfg.no_color.unwrap_or(false);
    let user_id = args.user_id.or(cfg.user_id);
    let cookie = args.cookie.or(cfg.cookie);

    Ok(RunConfig {
        api_url,
        slug,
        timeout,
        format,
        no_color,
        verbose: args.verbose,
        cookie,
        user_id,
        command,
    })
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("campusdir={level}")));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Runs `fut` behind a stderr spinner when `enabled`.
async fn with_spinner<F: Future>(enabled: bool, message: String, fut: F) -> F::Output {
    if !enabled {
        return fut.await;
    }
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::with_template(":: {spinner} {msg} [{elapsed_precise}]") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    let out = fut.await;
    pb.finish_and_clear();
    out
}

fn emit(rendered: &str) {
    print!("{rendered}");
}

async fn load_directory<R>(
    client: &ApiClient,
    run: &RunConfig,
    args: &DirectoryArgs,
) -> Result<(), RunError>
where
    R: CardView + DeserializeOwned + Serialize + Send + 'static,
{
    let slug = run.slug.clone().ok_or(RunError::MissingSlug)?;
    let mut dir: Directory<R> = Directory::new();
    for action in commands::initial_actions(args) {
        dir.apply(action)?;
    }

    let mut slot = RequestSlot::default();
    let token = slot.begin();
    let fetched = with_spinner(
        run.format == OutputFormat::Text,
        R::KIND.loading_message(),
        client.fetch_directory::<R>(&slug, &token),
    )
    .await;
    dir.commit(&token, fetched);
    emit(&render_directory(&dir, run.format));

    if args.interactive {
        interactive(client, run, slug, dir, slot).await?;
    }
    Ok(())
}

/// Reads navigation commands until `quit` or EOF. Reloads run in the
/// background; a newer reload cancels the one before it.
async fn interactive<R>(
    client: &ApiClient,
    run: &RunConfig,
    slug: String,
    mut dir: Directory<R>,
    mut slot: RequestSlot,
) -> Result<(), RunError>
where
    R: CardView + DeserializeOwned + Serialize + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<(CancellationToken, Fetched<R>)>(4);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprintln!("{REPL_HELP}");

    loop {
        tokio::select! {
            Some((token, fetched)) = rx.recv() => {
                if dir.commit(&token, fetched) {
                    emit(&render_directory(&dir, run.format));
                }
            }
            line = lines.next_line() => {
                let Some(line) = line.map_err(|e| RunError::Stdin { source: e })? else {
                    break;
                };
                match commands::parse_repl_line(&line) {
                    Ok(None) => {}
                    Ok(Some(ReplCommand::Quit)) => break,
                    Ok(Some(ReplCommand::Help)) => eprintln!("{REPL_HELP}"),
                    Ok(Some(ReplCommand::Reload)) => {
                        let token = slot.begin();
                        debug!(request = slot.issued(), "reloading directory");
                        dir.begin_load();
                        emit(&render_directory(&dir, run.format));
                        let client = client.clone();
                        let slug = slug.clone();
                        let tx = tx.clone();
                        tokio::spawn(async move {
                            let fetched = client.fetch_directory::<R>(&slug, &token).await;
                            let _ = tx.send((token, fetched)).await;
                        });
                    }
                    Ok(Some(ReplCommand::Navigate(action))) => match dir.apply(action) {
                        Ok(()) => emit(&render_directory(&dir, run.format)),
                        Err(e) => eprintln!(":: {e}"),
                    },
                    Err(msg) => eprintln!(":: {msg}"),
                }
            }
        }
    }
    slot.cancel();
    Ok(())
}

async fn resolve_user(client: &ApiClient, run: &RunConfig) -> Result<(i64, Session), RunError> {
    if let Some(id) = run.user_id {
        return Ok((id, Session::NotLoaded));
    }
    let session = fetch_session(client).await;
    let id = session.user().map(|user| user.id).ok_or(RunError::MissingUserId)?;
    Ok((id, session))
}

async fn run_classes(client: &ApiClient, run: &RunConfig) -> Result<(), RunError> {
    let (id, _) = resolve_user(client, run).await?;
    let token = CancellationSource::new().token();
    let classes = with_spinner(
        run.format == OutputFormat::Text,
        "Loading classes...".to_string(),
        client.student_classes(id, &token),
    )
    .await
    .into_records();
    let report = ClassesReport::build(&classes, Local::now().naive_local());
    emit(&dashboard::render_classes(&report, run.format));
    Ok(())
}

async fn run_cats(client: &ApiClient, run: &RunConfig, teacher: bool) -> Result<(), RunError> {
    let (id, _) = resolve_user(client, run).await?;
    let token = CancellationSource::new().token();
    let fetch = async {
        if teacher {
            client.teacher_cats(id, &token).await
        } else {
            client.student_cats(id, &token).await
        }
    };
    let cats = with_spinner(
        run.format == OutputFormat::Text,
        "Loading CATs...".to_string(),
        fetch,
    )
    .await
    .into_records();
    let report = CatsReport::build(&cats, Utc::now());
    emit(&dashboard::render_cats(&report, run.format));
    Ok(())
}

async fn run_schedule(client: &ApiClient, run: &RunConfig) -> Result<(), RunError> {
    let (id, _) = resolve_user(client, run).await?;
    let token = CancellationSource::new().token();
    let mut classes = with_spinner(
        run.format == OutputFormat::Text,
        "Loading schedule...".to_string(),
        client.teacher_schedule(id, &token),
    )
    .await
    .into_records();
    schedule::sort_schedule(&mut classes);
    emit(&dashboard::render_schedule(&classes, run.format));
    Ok(())
}

async fn run_courses(client: &ApiClient, run: &RunConfig, department: &str) -> Result<(), RunError> {
    let token = CancellationSource::new().token();
    let courses = client
        .department_courses(department, &token)
        .await
        .into_records();
    emit(&dashboard::render_courses(department, &courses, run.format));
    Ok(())
}

async fn run_dashboard(client: &ApiClient, run: &RunConfig, teacher: bool) -> Result<(), RunError> {
    let (id, session) = resolve_user(client, run).await?;
    let user = session.user();
    let is_teacher = match user {
        Some(user) => user.role.eq_ignore_ascii_case("teacher"),
        None => teacher,
    };
    info!(id, is_teacher, "building dashboard");
    let token = CancellationSource::new().token();
    let text = run.format == OutputFormat::Text;

    if is_teacher {
        let roster_fetch = async {
            match run.slug.as_deref() {
                Some(slug) => Some(client.teacher_students(slug, id, &token).await),
                None => {
                    debug!("no slug; skipping the student roster");
                    None
                }
            }
        };
        let (courses_fetch, roster_fetch, schedule_fetch, cats_fetch) = with_spinner(
            text,
            "Loading dashboard...".to_string(),
            async {
                futures::join!(
                    client.teacher_courses(id, &token),
                    roster_fetch,
                    client.teacher_schedule(id, &token),
                    client.teacher_cats(id, &token)
                )
            },
        )
        .await;
        let courses = courses_fetch.into_records();
        let roster = roster_fetch.map(Fetched::into_records);
        let mut classes = schedule_fetch.into_records();
        schedule::sort_schedule(&mut classes);
        let cats = cats_fetch.into_records();
        let view = Dashboard::Teacher {
            user,
            courses: &courses,
            students: roster.as_deref().map(dashboard::group_roster),
            schedule: &classes,
            cats: CatsReport::build(&cats, Utc::now()),
        };
        emit(&dashboard::render_dashboard(&view, run.format));
    } else {
        let (classes_fetch, cats_fetch, enrolled_fetch, department_fetch) = with_spinner(
            text,
            "Loading dashboard...".to_string(),
            async {
                futures::join!(
                    client.student_classes(id, &token),
                    client.student_cats(id, &token),
                    client.student_courses(id, &token),
                    client.student_department_courses(id, &token)
                )
            },
        )
        .await;
        let classes = classes_fetch.into_records();
        let cats = cats_fetch.into_records();
        let enrolled = enrolled_fetch.into_records();
        let department_courses = department_fetch.into_records();
        let view = Dashboard::Student {
            user,
            classes: ClassesReport::build(&classes, Local::now().naive_local()),
            cats: CatsReport::build(&cats, Utc::now()),
            enrolled: &enrolled,
            department_courses: &department_courses,
        };
        emit(&dashboard::render_dashboard(&view, run.format));
    }
    Ok(())
}

async fn dispatch(client: &ApiClient, run: &RunConfig) -> Result<(), RunError> {
    match &run.command {
        Command::Students(args) => load_directory::<Student>(client, run, args).await,
        Command::Teachers(args) => load_directory::<Teacher>(client, run, args).await,
        Command::Classes => run_classes(client, run).await,
        Command::Cats { teacher } => run_cats(client, run, *teacher).await,
        Command::Schedule => run_schedule(client, run).await,
        Command::Dashboard { teacher } => run_dashboard(client, run, *teacher).await,
        Command::Courses { department } => run_courses(client, run, department).await,
        Command::Whoami => {
            let session = fetch_session(client).await;
            emit(&dashboard::render_session(&session, run.format));
            Ok(())
        }
    }
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }
    init_tracing(run.verbose);

    let client = ApiClient::new(&run.api_url, run.timeout, run.cookie.as_deref())
        .map_err(|e| e.to_string())?;

    if run.format == OutputFormat::Text && run.verbose > 0 {
        format_kv_line("API", client.base_url().as_str());
        format_kv_line("Tenant", run.slug.as_deref().unwrap_or("-"));
        format_kv_line("Timeout", &format!("{}s", run.timeout));
        println!();
    }
    dispatch(&client, &run).await.map_err(|e| e.to_string())
}

fn resolve_config_path(args: &CliArgs) -> Option<std::path::PathBuf> {
    args.config
        .as_deref()
        .map(config::expand_tilde)
        .or_else(config::default_config_path)
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

    let config_path = resolve_config_path(&args);

    if args.init_config {
        let path = config_path.ok_or_else(|| "cannot locate a home directory".to_string())?;
        if config::ensure_default_config_file(&path)? {
            println!(":: wrote {}", path.display());
        } else {
            println!(":: {} already exists", path.display());
        }
        return Ok(());
    }

    if args.command.is_none() {
        print!("{}", CliArgs::command().render_long_help());
        return Ok(());
    }

    let cfg = match config_path.as_ref() {
        Some(path) => config::load_config(path, args.config.is_none())?,
        None => ConfigFile::default(),
    };
    let cfg = cfg.with_env(|key| std::env::var(key).ok());

    let run = build_run_config(args, cfg)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}
