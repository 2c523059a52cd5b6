use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "omarlens",
    version,
    about = "query, render and relay the omar social-data API",
    long_about = "omarlens queries the omar social-data API with your API key, renders the result as raw JSON or as a following list, and exports it as JSON, HTML or CSV.\n\nExamples:\n  omarlens fetch -u someone -k KEY\n  omarlens fetch -u someone -c following -x 100 --view list -o followings.html\n  omarlens import saved.json --export-csv followings.csv\n  omarlens serve --bind 127.0.0.1:8787\n\nTip: the API key is remembered for a year, so -k can be dropped after the first fetch."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        global = true,
        help_heading = "Output",
        help = "Increase verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        long = "clr",
        visible_alias = "color",
        global = true,
        help_heading = "Output",
        help = "Enable colored output (overrides --no-color)."
    )]
    pub color: bool,

    #[arg(
        long = "nc",
        visible_alias = "no-color",
        global = true,
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        global = true,
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.omarlens/config.yml)."
    )]
    pub config: Option<String>,

    #[command(subcommand)]
    pub action: CliCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CliCommand {
    /// Query the API once and render the result.
    Fetch(FetchArgs),
    /// Load a previously exported JSON file and render it.
    Import(ImportArgs),
    /// Run the relay endpoint.
    Serve(ServeArgs),
    /// Remove the remembered API key.
    ForgetKey(KeyArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct KeyArgs {
    #[arg(
        long = "creds",
        visible_alias = "credentials",
        value_name = "FILE",
        help_heading = "Input",
        help = "Where the API key is remembered (defaults to ~/.omarlens/credentials.yml)."
    )]
    pub credentials: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RenderArgs {
    #[arg(
        long = "vw",
        visible_alias = "view",
        value_name = "VIEW",
        help_heading = "Output",
        help = "Active view: json or list."
    )]
    pub view: Option<String>,

    #[arg(
        short = 'e',
        long = "ea",
        visible_alias = "expand-all",
        help_heading = "Output",
        help = "Expand every follower entry in the list view."
    )]
    pub expand_all: bool,

    #[arg(
        short = 'o',
        long = "o",
        visible_alias = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the active view to a file (format inferred from extension)."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'F',
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format: json, html or csv."
    )]
    pub output_format: Option<String>,

    #[arg(
        long = "ej",
        visible_alias = "export-json",
        value_name = "FILE",
        help_heading = "Export",
        help = "Export the full payload as pretty-printed JSON."
    )]
    pub export_json: Option<String>,

    #[arg(
        long = "ec",
        visible_alias = "export-csv",
        value_name = "FILE",
        help_heading = "Export",
        help = "Export the following list as CSV."
    )]
    pub export_csv: Option<String>,

    #[arg(
        short = 'q',
        long = "qt",
        visible_alias = "quiet",
        help_heading = "Output",
        help = "Do not print the rendered view to stdout."
    )]
    pub quiet: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FetchArgs {
    #[arg(
        short = 'u',
        long = "u",
        visible_alias = "username",
        value_name = "NAME",
        help_heading = "Query",
        help = "Account to look up (not needed for comments)."
    )]
    pub username: Option<String>,

    #[arg(
        short = 'k',
        long = "k",
        visible_alias = "key",
        value_name = "KEY",
        help_heading = "Query",
        help = "API key (remembered for later runs)."
    )]
    pub key: Option<String>,

    #[arg(
        short = 'c',
        long = "cmd",
        visible_alias = "command",
        value_name = "COMMAND",
        help_heading = "Query",
        help = "profile, full, stories, domain, account_info, following or comments (default: profile)."
    )]
    pub command: Option<String>,

    #[arg(
        short = 'x',
        long = "x",
        visible_aliases = ["extra", "limit", "video-url"],
        value_name = "VALUE",
        help_heading = "Query",
        help = "Extra parameter: limit for following, video URL for comments."
    )]
    pub extra: Option<String>,

    #[arg(
        short = 'r',
        long = "rl",
        visible_alias = "relay",
        value_name = "URL",
        help_heading = "HTTP",
        help = "Send the request through a relay (e.g. http://127.0.0.1:8787)."
    )]
    pub relay: Option<String>,

    #[arg(
        long = "ab",
        visible_alias = "api-base",
        value_name = "URL",
        help_heading = "HTTP",
        help = "Upstream API base URL for direct requests."
    )]
    pub api_base: Option<String>,

    #[arg(
        short = 't',
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Give up after this many seconds (default: wait for the network)."
    )]
    pub timeout: Option<u64>,

    #[command(flatten)]
    pub keys: KeyArgs,

    #[command(flatten)]
    pub render: RenderArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ImportArgs {
    #[arg(value_name = "FILE", help = "JSON file to load.")]
    pub file: String,

    #[command(flatten)]
    pub render: RenderArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    #[arg(
        short = 'b',
        long = "bd",
        visible_aliases = ["bind", "listen"],
        value_name = "ADDR",
        help_heading = "Relay",
        help = "Address to listen on (default: 127.0.0.1:8787)."
    )]
    pub bind: Option<String>,

    #[arg(
        long = "up",
        visible_alias = "upstream",
        value_name = "URL",
        help_heading = "Relay",
        help = "Upstream API base the relay forwards to."
    )]
    pub upstream: Option<String>,

    #[arg(
        short = 'a',
        long = "ad",
        visible_alias = "assets-dir",
        value_name = "DIR",
        help_heading = "Relay",
        help = "Serve static files from this directory for paths other than /api-proxy."
    )]
    pub assets_dir: Option<String>,
}
