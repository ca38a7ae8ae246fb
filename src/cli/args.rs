use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "pi-lead-monitor",
    version,
    about = "monitor triaged PI leads from the hosted lead database",
    long_about = "PI Lead Monitor lists triaged news leads from the hosted lead database, with score, severity, case type and status filters.\n\nExamples:\n  pi-lead-monitor --min-score 70 --severity fatal\n  pi-lead-monitor --page 2 --search truck --sort score\n  pi-lead-monitor --watch --auto-refresh\n\nThe service URL and anon key come from --url/--anon-key, the config file, or PI_LEAD_MONITOR_URL / PI_LEAD_MONITOR_ANON_KEY (SUPABASE_URL / SUPABASE_ANON_KEY also work). Without them the monitor runs but shows no data."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'o',
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format: text or json."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Config",
        help = "Path to config file (defaults to ~/.pi-lead-monitor/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "init-config",
        help_heading = "Config",
        help = "Write a commented default config file and exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 'u',
        long = "url",
        value_name = "URL",
        help_heading = "Service",
        help = "Base URL of the hosted service."
    )]
    pub url: Option<String>,

    #[arg(
        short = 'k',
        long = "key",
        visible_alias = "anon-key",
        value_name = "KEY",
        help_heading = "Service",
        help = "Public anon key for the hosted service."
    )]
    pub anon_key: Option<String>,

    #[arg(
        long = "view",
        value_name = "NAME",
        help_heading = "Service",
        help = "Precomputed view of triaged leads (default leads_triaged)."
    )]
    pub view: Option<String>,

    #[arg(
        long = "table",
        value_name = "NAME",
        help_heading = "Service",
        help = "Base lead table used when the view query fails (default leads)."
    )]
    pub table: Option<String>,

    #[arg(
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        help_heading = "Service",
        help = "HTTP timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 's',
        long = "ms",
        visible_alias = "min-score",
        value_name = "SCORE",
        help_heading = "Filters",
        help = "Minimum lead score, inclusive (0 = any)."
    )]
    pub min_score: Option<f64>,

    #[arg(
        long = "sev",
        visible_alias = "severity",
        value_name = "SEVERITY",
        help_heading = "Filters",
        help = "all, fatal, serious_injury, injury or unknown."
    )]
    pub severity: Option<String>,

    #[arg(
        long = "ct",
        visible_alias = "case-type",
        value_name = "CASE",
        help_heading = "Filters",
        help = "all, truck, pedestrian, auto, motorcycle or unknown."
    )]
    pub case_type: Option<String>,

    #[arg(
        long = "st",
        visible_alias = "status",
        value_name = "STATUS",
        help_heading = "Filters",
        help = "all, new, reviewing, contacted, done, closed or ignore."
    )]
    pub status: Option<String>,

    #[arg(
        short = 'p',
        long = "pg",
        visible_alias = "page",
        value_name = "N",
        help_heading = "Filters",
        help = "Page to show, 50 leads per page."
    )]
    pub page: Option<u64>,

    #[arg(
        short = 'q',
        long = "sq",
        visible_alias = "search",
        value_name = "TEXT",
        help_heading = "Display",
        help = "Only show rows of the page containing TEXT."
    )]
    pub search: Option<String>,

    #[arg(
        long = "srt",
        visible_alias = "sort",
        value_name = "KEY",
        help_heading = "Display",
        help = "Sort the page by score or time."
    )]
    pub sort: Option<String>,

    #[arg(
        long = "sd",
        visible_alias = "sort-dir",
        value_name = "DIR",
        help_heading = "Display",
        help = "Sort direction: asc or desc."
    )]
    pub sort_dir: Option<String>,

    #[arg(
        short = 'x',
        long = "ex",
        visible_alias = "expand",
        value_name = "ID",
        help_heading = "Display",
        help = "Show detail for the row with this id."
    )]
    pub expand: Option<String>,

    #[arg(
        long = "nsf",
        visible_alias = "no-status-filter",
        help_heading = "Display",
        help = "Hide the status filter."
    )]
    pub no_status_filter: bool,

    #[arg(
        long = "nre",
        visible_alias = "no-row-expansion",
        help_heading = "Display",
        help = "Disable row detail expansion."
    )]
    pub no_row_expansion: bool,

    #[arg(
        long = "sdb",
        visible_alias = "search-debounce",
        value_name = "MS",
        help_heading = "Display",
        help = "Delay before a typed search is applied in watch mode (0 = immediate)."
    )]
    pub search_debounce_ms: Option<u64>,

    #[arg(
        short = 'w',
        long = "watch",
        help_heading = "Refresh",
        help = "Interactive session reading commands from stdin."
    )]
    pub watch: bool,

    #[arg(
        short = 'a',
        long = "ar",
        visible_alias = "auto-refresh",
        help_heading = "Refresh",
        help = "Start the watch session with periodic refresh enabled."
    )]
    pub auto_refresh: bool,

    #[arg(
        long = "ri",
        visible_alias = "refresh-interval",
        value_name = "SECONDS",
        help_heading = "Refresh",
        help = "Seconds between automatic refreshes (default 15)."
    )]
    pub refresh_interval: Option<u64>,
}
