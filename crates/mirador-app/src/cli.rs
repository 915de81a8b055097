use clap::Parser;

/// Mirador — a desktop workspace compositing embedded browser views.
#[derive(Parser, Debug)]
#[command(name = "mirador", version, about)]
pub struct Args {
    /// URL to open in a browser window at startup.
    #[arg(short = 'o', long)]
    pub open: Option<String>,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Log filter override (e.g. "mirador=debug").
    #[arg(long)]
    pub log_level: Option<String>,

    /// Layout file path override.
    #[arg(long)]
    pub layout: Option<String>,

    /// Start with a fresh workspace instead of restoring the saved layout.
    #[arg(long)]
    pub fresh: bool,
}

pub fn parse() -> Args {
    Args::parse()
}
