use clap::Parser;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Personal finance tracker API", long_about = None)]
pub struct Args {
    #[arg(long, default_value_t = String::from(""), help = "The log directory e.g. '/var/logs'. If this is not provided, only logs out to stdout.")]
    pub base_log_dir: String,

    #[arg(
        long,
        env = "DATABASE_URL",
        default_value_t = String::from("sqlite://finance-tracker.db"),
        help = "SQLite database URL that is compliant with sqlx SqlitePool e.g. 'sqlite:///var/data/finance-tracker.db'"
    )]
    pub database_url: String,

    #[arg(long, env = "SECRET_KEY", help = "Secret key used to sign access tokens")]
    pub secret_key: String,

    #[arg(
        long,
        default_value_t = 30i64,
        help = "Number of days before an issued access token expires"
    )]
    pub token_expire_days: i64,

    #[arg(long, default_value_t = 8080u32)]
    pub port: u32,
}

pub fn parse_args() -> Args {
    return Args::parse();
}
