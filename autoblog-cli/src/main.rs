//! Entry point for the `autoblog` binary: headless, one job per process.

use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = autoblog_cli::Cli::parse();
    let exit_code = autoblog_cli::run_main(cli).await?;
    std::process::exit(exit_code);
}
