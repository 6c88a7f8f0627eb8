use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "campusdir",
    version,
    about = "school directory and dashboard client",
    long_about = "campusdir browses the student and teacher directories of a school tenant and shows class, schedule and CAT dashboards from the school-management API.\n\nExamples:\n  campusdir --slug acme students\n  campusdir --slug acme teachers --all --filter Physics --search ada\n  campusdir --slug acme students --interactive\n  campusdir --user-id 12 classes\n  campusdir --config ~/.campusdir/config.yml dashboard\n\nTip: Use --init-config once and keep api_url and slug in the config file."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv). RUST_LOG overrides."
    )]
    pub verbose: u8,

    #[arg(
        short = 'n',
        long = "no-color",
        global = true,
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'A',
        long = "format",
        visible_alias = "output-format",
        value_name = "FORMAT",
        global = true,
        help_heading = "Output",
        help = "Output format (text or json)."
    )]
    pub format: Option<String>,

    #[arg(
        short = 'u',
        long = "api-url",
        value_name = "URL",
        global = true,
        help_heading = "Connection",
        help = "Base URL of the school API (defaults to http://localhost:8080)."
    )]
    pub api_url: Option<String>,

    #[arg(
        short = 's',
        long = "slug",
        value_name = "SLUG",
        global = true,
        help_heading = "Connection",
        help = "Tenant slug used by the directory endpoints."
    )]
    pub slug: Option<String>,

    #[arg(
        long = "timeout",
        value_name = "SECONDS",
        global = true,
        help_heading = "Connection",
        help = "Request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        long = "cookie",
        value_name = "COOKIE",
        global = true,
        help_heading = "Connection",
        help = "Cookie header sent with every request (carries a signed-in session)."
    )]
    pub cookie: Option<String>,

    #[arg(
        short = 'C',
        long = "config",
        value_name = "FILE",
        global = true,
        help_heading = "Config",
        help = "Path to config file (defaults to ~/.campusdir/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "init-config",
        help_heading = "Config",
        help = "Write a commented default config file and exit."
    )]
    pub init_config: bool,

    #[arg(
        long = "user-id",
        value_name = "ID",
        global = true,
        help_heading = "Identity",
        help = "Act for this user id instead of the signed-in session."
    )]
    pub user_id: Option<i64>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Browse the student directory.
    Students(DirectoryArgs),
    /// Browse the teacher directory.
    Teachers(DirectoryArgs),
    /// A student's classes this week and the next class.
    Classes,
    /// Upcoming CATs with urgency and the three-week alert list.
    Cats {
        #[arg(long = "teacher", help = "Load the CATs a teacher set instead of a student's.")]
        teacher: bool,
    },
    /// A teacher's weekly schedule.
    Schedule,
    /// The dashboard for the signed-in user (or --user-id).
    Dashboard {
        #[arg(long = "teacher", help = "Treat --user-id as a teacher.")]
        teacher: bool,
    },
    /// Courses offered by one department.
    Courses {
        #[arg(short = 'd', long = "department", value_name = "DEPARTMENT")]
        department: String,
    },
    /// Show who the API thinks is signed in.
    Whoami,
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryArgs {
    #[arg(
        short = 'd',
        long = "department",
        value_name = "DEPARTMENT",
        conflicts_with = "all",
        help = "Open one department's roster."
    )]
    pub department: Option<String>,

    #[arg(short = 'a', long = "all", help = "Show every record in one list.")]
    pub all: bool,

    #[arg(
        short = 'f',
        long = "filter",
        value_name = "DEPARTMENT",
        requires = "all",
        help = "Narrow the --all list to one department."
    )]
    pub filter: Option<String>,

    #[arg(
        short = 'q',
        long = "search",
        value_name = "TERM",
        help = "Case-insensitive search over names, departments and courses."
    )]
    pub search: Option<String>,

    #[arg(
        short = 'i',
        long = "interactive",
        help = "Keep reading navigation commands from stdin."
    )]
    pub interactive: bool,
}
