use anyhow::{anyhow, Context, Result};
use semver::Version;
use tokio::io::{AsyncBufRead, AsyncBufReadExt as _, AsyncWrite, AsyncWriteExt as _};

pub(crate) async fn confirm_tag<R, W>(
    input: &mut R,
    output: &mut W,
    dir: &str,
    version: &Version,
) -> Result<bool>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let question =
        format!("Project [{dir}] will be updated to Version [{version}], is this correct? (y/n)\n");
    ask(input, output, &question).await
}

pub(crate) async fn confirm_push<R, W>(input: &mut R, output: &mut W, dry_run: bool) -> Result<bool>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let question = if dry_run {
        "Nothing was tagged (dry run), would you like to push to remote? (y/n)"
    } else {
        "Tags updated locally, would you like to push to remote? (y/n)"
    };
    ask(input, output, question).await
}

/// Prints `question` and reads a single line. Only a plain `y` is affirmative.
async fn ask<R, W>(input: &mut R, output: &mut W, question: &str) -> Result<bool>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output
        .write_all(question.as_bytes())
        .await
        .context("Cannot write prompt")?;
    output.flush().await.context("Cannot write prompt")?;

    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .await
        .context("Cannot read answer from stdin")?;

    let answer = answer
        .strip_suffix('\n')
        .ok_or_else(|| anyhow!("Unexpected end of input while waiting for an answer"))?;
    let answer = answer.strip_suffix('\r').unwrap_or(answer);

    Ok(answer == "y")
}
