use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior, Sleep};
use tracing_subscriber::EnvFilter;

use crate::backend::{LeadSource, NullBackend, RestBackend, RestOptions};
use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile, Credentials};
use crate::dashboard::{self, Command, Dashboard, Features};
use crate::fetcher::{FetchError, LeadFetcher, RequestToken, Resources};
use crate::model::{CaseType, LeadStatus, Selector, Severity};
use crate::output::{self, OutputFormat, PageReport};
use crate::query::{FetchResult, LeadQuery};
use crate::refine::{SortDirection, SortKey};

#[derive(Clone, Debug)]
struct RunConfig {
    credentials: Option<Credentials>,
    resources: Resources,
    timeout: u64,
    query: LeadQuery,
    search: String,
    sort_key: SortKey,
    sort_direction: SortDirection,
    expand: Option<String>,
    features: Features,
    output_format: OutputFormat,
    watch: bool,
    auto_refresh: bool,
    refresh_interval: Duration,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn build_run_config(
    args: CliArgs,
    cfg: ConfigFile,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let credentials =
        config::resolve_credentials(args.url.clone(), args.anon_key.clone(), &cfg, lookup);

    let resources = Resources {
        view: non_empty(args.view.or(cfg.view)).unwrap_or_else(|| Resources::default().view),
        table: non_empty(args.table.or(cfg.table)).unwrap_or_else(|| Resources::default().table),
    };
    let timeout = args.timeout.or(cfg.timeout).unwrap_or(10).max(1);

    let min_score = args.min_score.or(cfg.min_score).unwrap_or(0.0);
    if !min_score.is_finite() || min_score < 0.0 {
        return Err(format!("invalid min_score '{min_score}', expected a non-negative number"));
    }

    let severity_raw = args
        .severity
        .or(cfg.severity)
        .unwrap_or_else(|| "all".to_string());
    let severity = Selector::<Severity>::parse(&severity_raw)
        .ok_or_else(|| format!("invalid severity '{severity_raw}'"))?;

    let case_type_raw = args
        .case_type
        .or(cfg.case_type)
        .unwrap_or_else(|| "all".to_string());
    let case_type = Selector::<CaseType>::parse(&case_type_raw)
        .ok_or_else(|| format!("invalid case_type '{case_type_raw}'"))?;

    let status_raw = args
        .status
        .or(cfg.status)
        .unwrap_or_else(|| "all".to_string());
    let status = Selector::<LeadStatus>::parse(&status_raw)
        .ok_or_else(|| format!("invalid status '{status_raw}'"))?;

    let sort_raw = args
        .sort
        .or(cfg.sort)
        .unwrap_or_else(|| "triaged_at".to_string());
    let sort_key =
        SortKey::parse(&sort_raw).ok_or_else(|| format!("invalid sort '{sort_raw}'"))?;
    let sort_dir_raw = args
        .sort_dir
        .or(cfg.sort_dir)
        .unwrap_or_else(|| "desc".to_string());
    let sort_direction = SortDirection::parse(&sort_dir_raw)
        .ok_or_else(|| format!("invalid sort_dir '{sort_dir_raw}'"))?;

    let features = Features {
        status_filter: !args.no_status_filter && cfg.status_filter.unwrap_or(true),
        row_expansion: !args.no_row_expansion && cfg.row_expansion.unwrap_or(true),
        search_debounce: args
            .search_debounce_ms
            .or(cfg.search_debounce_ms)
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis),
    };

    let output_format = match args.output_format.as_deref() {
        Some(raw) => OutputFormat::parse(raw)
            .ok_or_else(|| format!("invalid output format '{raw}'"))?,
        None => OutputFormat::Text,
    };

    let refresh_secs = args
        .refresh_interval
        .or(cfg.refresh_interval)
        .unwrap_or(dashboard::DEFAULT_REFRESH_INTERVAL.as_secs());
    if refresh_secs == 0 {
        return Err("invalid refresh_interval, expected positive seconds".to_string());
    }

    if args.no_color || cfg.no_color.unwrap_or(false) {
        colored::control::set_override(false);
    }

    Ok(RunConfig {
        credentials,
        resources,
        timeout,
        query: LeadQuery {
            min_score,
            severity,
            case_type,
            status,
            page: args.page.unwrap_or(1).max(1),
        },
        search: args.search.unwrap_or_default(),
        sort_key,
        sort_direction,
        expand: non_empty(args.expand),
        features,
        output_format,
        watch: args.watch,
        auto_refresh: args.auto_refresh || cfg.auto_refresh.unwrap_or(false),
        refresh_interval: Duration::from_secs(refresh_secs),
    })
}

fn build_fetcher(run: &RunConfig) -> Result<LeadFetcher, String> {
    let source: Arc<dyn LeadSource> = match run.credentials.as_ref() {
        Some(creds) => Arc::new(
            RestBackend::new(RestOptions {
                url: creds.url.clone(),
                anon_key: creds.anon_key.clone(),
                timeout_seconds: run.timeout,
            })
            .map_err(|e| e.to_string())?,
        ),
        None => {
            tracing::info!("no service URL or anon key configured, serving empty results");
            Arc::new(NullBackend)
        }
    };
    Ok(LeadFetcher::new(source, run.resources.clone()))
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pi_lead_monitor={level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn new_dashboard(run: &RunConfig) -> Dashboard {
    let mut d = Dashboard::new(run.features, run.query.clone());
    d.set_search(&run.search);
    d.set_sort(run.sort_key, run.sort_direction);
    d.set_auto_refresh(run.auto_refresh);
    d
}

fn format_kv_line(label: &str, value: &str) -> String {
    format!(":: {:<10}: {}\n", label, value)
}

fn render_text(d: &Dashboard, refresh_interval: Duration) -> String {
    let q = d.query();
    let mut out = String::new();
    out.push('\n');
    out.push_str(&format_kv_line(
        "Leads",
        &format!(
            "{} :: page {}/{}",
            d.total_count().to_string().bold(),
            q.page,
            d.total_pages()
        ),
    ));
    let source = match d.source() {
        Some(s) => s.as_str().cyan().to_string(),
        None => "-".dimmed().to_string(),
    };
    out.push_str(&format_kv_line("Source", &source));

    let mut filters = format!(
        "score>={} severity={} case={}",
        q.min_score, q.severity, q.case_type
    );
    if d.features().status_filter {
        filters.push_str(&format!(" status={}", q.status));
    }
    out.push_str(&format_kv_line("Filters", &filters));
    let (key, dir) = d.sort();
    out.push_str(&format_kv_line(
        "Sort",
        &format!("{} {}", key.label(), dir.label()),
    ));
    if d.auto_refresh() {
        out.push_str(&format_kv_line(
            "Refresh",
            &format!("every {}s", refresh_interval.as_secs()),
        ));
    }
    if let Some(err) = d.error() {
        out.push_str(&format!(
            "{}{}{} {}\n",
            "[".bold().white(),
            "ERR".bold().red(),
            "]".bold().white(),
            err
        ));
    }

    let rows = d.visible_rows();
    if !d.search().trim().is_empty() {
        out.push_str(&format_kv_line(
            "Search",
            &format!(
                "'{}' :: {} of {} rows on this page",
                d.search().trim(),
                rows.len(),
                d.rows().len()
            ),
        ));
    }
    out.push('\n');
    out.push_str(&output::render_table(&rows, d.expanded()));
    out
}

fn render(d: &Dashboard, format: OutputFormat, refresh_interval: Duration) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(d, refresh_interval).into_bytes(),
        OutputFormat::Json => {
            let rows = d.visible_rows();
            output::render_json(&PageReport {
                page: d.query().page,
                total_pages: d.total_pages(),
                total_count: d.total_count(),
                source: d.source(),
                error: d.error(),
                rows: &rows,
            })
        }
    }
}

fn print_rendered(bytes: &[u8]) {
    print!("{}", String::from_utf8_lossy(bytes));
}

fn print_warning(message: &str) {
    eprintln!(
        "{}{}{} {}",
        "[".bold().white(),
        "WRN".bold().yellow(),
        "]".bold().white(),
        message
    );
}

async fn run_once(run: RunConfig, fetcher: LeadFetcher) -> Result<(), String> {
    let mut dashboard = new_dashboard(&run);
    let (token, query) = dashboard.begin_fetch();
    let result = fetcher.fetch(&query).await;
    dashboard.apply(token, result);

    if let Some(id) = run.expand.as_deref() {
        if let Err(e) = dashboard.toggle_expanded(id) {
            print_warning(&e.to_string());
        }
    }
    print_rendered(&render(&dashboard, run.output_format, run.refresh_interval));

    match dashboard.error() {
        Some(_) => Err("lead query failed".to_string()),
        None => Ok(()),
    }
}

struct FetchOutcome {
    token: RequestToken,
    result: Result<FetchResult, FetchError>,
}

struct PendingSearch {
    term: String,
    sleep: Pin<Box<Sleep>>,
}

fn refresh_timer(enabled: bool, period: Duration) -> Option<Interval> {
    if !enabled {
        return None;
    }
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Some(interval)
}

async fn wait_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

async fn wait_search(pending: &mut Option<PendingSearch>) -> String {
    if let Some(p) = pending.as_mut() {
        p.sleep.as_mut().await;
        return pending.take().map(|p| p.term).unwrap_or_default();
    }
    std::future::pending::<String>().await
}

/// State of an interactive watch session around one dashboard.
struct Session {
    dashboard: Dashboard,
    fetcher: LeadFetcher,
    outcomes: mpsc::Sender<FetchOutcome>,
    timer: Option<Interval>,
    pending_search: Option<PendingSearch>,
    format: OutputFormat,
    refresh_interval: Duration,
}

impl Session {
    fn fetch(&mut self) {
        let (token, query) = self.dashboard.begin_fetch();
        tracing::debug!(token = token.value(), page = query.page, "fetch issued");
        let fetcher = self.fetcher.clone();
        let tx = self.outcomes.clone();
        tokio::spawn(async move {
            let result = fetcher.fetch(&query).await;
            let _ = tx.send(FetchOutcome { token, result }).await;
        });
    }

    fn render(&self) {
        print_rendered(&render(&self.dashboard, self.format, self.refresh_interval));
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Filter(change) => match self.dashboard.set_filter(change) {
                Ok(()) => self.fetch(),
                Err(e) => print_warning(&e.to_string()),
            },
            Command::NextPage => {
                if self.dashboard.next_page() {
                    self.fetch();
                } else {
                    print_warning("already on the last page");
                }
            }
            Command::PrevPage => {
                if self.dashboard.prev_page() {
                    self.fetch();
                } else {
                    print_warning("already on the first page");
                }
            }
            Command::Page(n) => {
                self.dashboard.set_page(n);
                self.fetch();
            }
            Command::Search(term) => match self.dashboard.features().search_debounce {
                Some(delay) => {
                    self.pending_search = Some(PendingSearch {
                        term,
                        sleep: Box::pin(tokio::time::sleep(delay)),
                    });
                }
                None => {
                    self.dashboard.set_search(&term);
                    self.render();
                }
            },
            Command::Sort(key, direction) => {
                self.dashboard.set_sort(key, direction);
                self.render();
            }
            Command::Expand(id) => match self.dashboard.toggle_expanded(&id) {
                Ok(_) => self.render(),
                Err(e) => print_warning(&e.to_string()),
            },
            Command::Refresh => self.fetch(),
            Command::AutoRefresh(enabled) => {
                self.dashboard.set_auto_refresh(enabled);
                self.timer = refresh_timer(enabled, self.refresh_interval);
                println!(
                    ":: auto-refresh {}",
                    if enabled { "on".green() } else { "off".yellow() }
                );
            }
            Command::Help => println!("{}", dashboard::command::HELP),
            Command::Quit => {}
        }
    }

    fn idle(&self) -> bool {
        !self.dashboard.is_loading() && self.pending_search.is_none()
    }
}

async fn run_watch(run: RunConfig, fetcher: LeadFetcher) -> Result<(), String> {
    let (tx, mut rx) = mpsc::channel::<FetchOutcome>(16);
    let mut session = Session {
        dashboard: new_dashboard(&run),
        fetcher,
        outcomes: tx,
        timer: refresh_timer(run.auto_refresh, run.refresh_interval),
        pending_search: None,
        format: run.output_format,
        refresh_interval: run.refresh_interval,
    };
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    if let Some(id) = run.expand.as_deref() {
        print_warning(&format!("--expand {id} applies to one-shot mode, use 'expand {id}'"));
    }
    eprintln!("{}", "type 'help' for commands, 'quit' to exit".dimmed());
    session.fetch();

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match Command::parse(&line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => session.handle(command),
                    Err(e) => print_warning(&e),
                },
                Ok(None) => stdin_open = false,
                Err(e) => {
                    tracing::warn!(error = %e, "stdin closed");
                    stdin_open = false;
                }
            },
            Some(outcome) = rx.recv() => {
                if session.dashboard.apply(outcome.token, outcome.result) {
                    session.render();
                }
            }
            _ = wait_tick(&mut session.timer) => {
                tracing::debug!("auto-refresh tick");
                session.fetch();
            }
            term = wait_search(&mut session.pending_search) => {
                session.dashboard.set_search(&term);
                session.render();
            }
            _ = tokio::signal::ctrl_c() => break,
        }

        // With input exhausted and nothing periodic left, finish once in-flight work lands.
        if !stdin_open && !session.dashboard.auto_refresh() && session.idle() {
            break;
        }
    }

    session.timer = None;
    Ok(())
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.credentials.is_none() {
        print_warning("no service URL or anon key configured, showing no data");
    }
    let fetcher = build_fetcher(&run)?;
    if run.watch {
        run_watch(run, fetcher).await
    } else {
        run_once(run, fetcher).await
    }
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = e.print();
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    init_tracing(args.verbose);

    let explicit_config = args.config.is_some();
    let config_path = args
        .config
        .as_deref()
        .map(config::expand_tilde)
        .or_else(config::default_config_path);

    if args.init_config {
        let path = config_path.ok_or_else(|| "could not determine config path".to_string())?;
        config::ensure_default_config_file(&path)?;
        println!(":: config written to {}", path.display());
        return Ok(());
    }

    let cfg = match config_path.as_ref() {
        Some(path) => config::load_config(path, !explicit_config)?,
        None => ConfigFile::default(),
    };

    let run = build_run_config(args, cfg, config::process_env)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}
