use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt as _, BufReader};

mod git;
mod prompt;
mod version;

use git::{Git, GitCli};

#[derive(Parser, Debug, PartialEq)]
#[command(about, long_about = None)]
pub struct Args {
    /// The semver version type to increment (major|minor|patch)
    #[arg(long, default_value = "patch")]
    version: String,
    /// The path to the directory to run the tagging update within, defaults to current
    #[arg(long, default_value = "")]
    dir: String,
    /// Only print the git commands that would create and push the tag.
    #[arg(long, default_value = "false")]
    dry_run: bool,
    /// Fail if a git command cannot be run or exits unsuccessfully.
    #[arg(long, default_value = "false")]
    strict: bool,
}

pub async fn run(args: Args) -> Result<()> {
    let git = GitCli::new(&args.dir);
    let mut stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();

    release(&args, &git, &mut stdin, &mut stdout).await
}

async fn release<G, R, W>(args: &Args, git: &G, input: &mut R, output: &mut W) -> Result<()>
where
    G: Git,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let tags = git::fetch_tags(git, args.strict).await?;

    let mut version = version::latest_version(&tags)
        .context("Cannot determine the current version from the repository's tags")?;
    info!("Current version is {version}");

    if version::bump(&mut version, &args.version) {
        info!("Bumped {} to {version}", args.version);
    } else {
        info!("Unknown version type {}, keeping {version}", args.version);
    }

    if !prompt::confirm_tag(input, output, &args.dir, &version).await? {
        return Ok(());
    }

    if args.dry_run {
        let tag_args = git::tag_args(&version);
        let tag_args = tag_args.iter().map(|arg| quote(arg)).collect::<Vec<_>>();
        say(output, &format!("Would run git {}\n", tag_args.join(" "))).await?;
    } else {
        git::create_tag(git, &version, args.strict).await?;
    }

    if !prompt::confirm_push(input, output, args.dry_run).await? {
        return Ok(());
    }

    if args.dry_run {
        say(output, &format!("Would run git {}\n", git::PUSH_ARGS.join(" "))).await?;
    } else {
        git::push_tags(git, args.strict).await?;
    }

    Ok(())
}

fn quote(arg: &str) -> String {
    if arg.contains(char::is_whitespace) {
        format!("\"{arg}\"")
    } else {
        arg.to_string()
    }
}

async fn say<W: AsyncWrite + Unpin>(output: &mut W, message: &str) -> Result<()> {
    output
        .write_all(message.as_bytes())
        .await
        .context("Cannot write to stdout")?;
    output.flush().await.context("Cannot write to stdout")
}
