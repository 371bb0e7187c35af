use anyhow::Result;
use clap::Parser;
use git_semver_tagging::{run, Args};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    run(args).await
}
