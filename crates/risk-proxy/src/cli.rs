use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "risk-proxy",
    version,
    about = "Health risk prediction and recommendation proxy"
)]
pub(crate) struct Args {
    #[arg(long, default_value = "127.0.0.1:3000")]
    pub(crate) listen_addr: String,
    /// Optional TOML file with upstream fallbacks; environment variables win.
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
    /// Also write daily-rolling JSON logs into this directory.
    #[arg(long)]
    pub(crate) log_dir: Option<PathBuf>,
    #[arg(long, default_value_t = false)]
    pub(crate) log_to_stderr: bool,
}
