use anyhow::{anyhow, Context, Result};
use log::debug;
use semver::Version;
use std::{io, path::PathBuf};
use tokio::process::Command;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GitOutput {
    /// Exit code, `None` if git was terminated by a signal.
    pub(crate) code: Option<i32>,
    /// Standard output followed by standard error.
    pub(crate) combined: String,
}

impl GitOutput {
    fn success(&self) -> bool {
        self.code == Some(0)
    }
}

pub(crate) trait Git {
    async fn exec(&self, args: &[&str]) -> io::Result<GitOutput>;
}

/// Runs the `git` executable found on `PATH`.
pub(crate) struct GitCli {
    dir: Option<PathBuf>,
}

impl GitCli {
    /// An empty `dir` runs git in the current working directory.
    pub(crate) fn new(dir: &str) -> Self {
        Self {
            dir: (!dir.is_empty()).then(|| PathBuf::from(dir)),
        }
    }
}

impl Git for GitCli {
    async fn exec(&self, args: &[&str]) -> io::Result<GitOutput> {
        let mut command = Command::new("git");
        command.args(args).kill_on_drop(true);
        if let Some(dir) = &self.dir {
            command.current_dir(dir);
        }

        let output = command.output().await?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(GitOutput {
            code: output.status.code(),
            combined,
        })
    }
}

/// Runs a git command and applies the error policy.
///
/// Unless `strict` is set, spawn failures and non-zero exits are only logged.
/// A failed spawn then yields an empty output.
async fn step<G: Git>(git: &G, args: &[&str], strict: bool) -> Result<String> {
    let command_line = format!("git {}", args.join(" "));
    debug!("Running {command_line}");

    match git.exec(args).await {
        Ok(output) if output.success() => Ok(output.combined),
        Ok(output) => {
            let code = output
                .code
                .map(|code| code.to_string())
                .unwrap_or_else(|| String::from("signal"));
            if strict {
                return Err(anyhow!(
                    "{command_line} failed with exit code {code}: {}",
                    output.combined.trim_end()
                ));
            }
            debug!("Ignoring exit code {code} of {command_line}");
            Ok(output.combined)
        }
        Err(err) => {
            if strict {
                return Err(err).with_context(|| format!("Cannot run {command_line}"));
            }
            debug!("Ignoring failure to run {command_line}: {err}");
            Ok(String::new())
        }
    }
}

pub(crate) async fn fetch_tags<G: Git>(git: &G, strict: bool) -> Result<String> {
    step(git, &["tag"], strict).await
}

pub(crate) async fn create_tag<G: Git>(git: &G, version: &Version, strict: bool) -> Result<()> {
    let args = tag_args(version);
    let args = args.iter().map(String::as_str).collect::<Vec<_>>();
    step(git, &args, strict).await.map(|_| ())
}

pub(crate) async fn push_tags<G: Git>(git: &G, strict: bool) -> Result<()> {
    step(git, &PUSH_ARGS, strict).await.map(|_| ())
}

pub(crate) const PUSH_ARGS: [&str; 3] = ["push", "origin", "--tags"];

pub(crate) fn tag_args(version: &Version) -> Vec<String> {
    vec![
        String::from("tag"),
        String::from("-a"),
        version.to_string(),
        String::from("-m"),
        format!("Release {version}"),
    ]
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::{cell::RefCell, collections::VecDeque};

    /// Records every invocation and answers with canned results.
    #[derive(Default)]
    pub(crate) struct FakeGit {
        calls: RefCell<Vec<Vec<String>>>,
        responses: RefCell<VecDeque<io::Result<GitOutput>>>,
    }

    impl FakeGit {
        pub(crate) fn respond(self, response: io::Result<GitOutput>) -> Self {
            self.responses.borrow_mut().push_back(response);
            self
        }

        pub(crate) fn calls(&self) -> Vec<Vec<String>> {
            self.calls.borrow().clone()
        }
    }

    pub(crate) fn ok(combined: &str) -> io::Result<GitOutput> {
        Ok(GitOutput {
            code: Some(0),
            combined: combined.to_string(),
        })
    }

    fn exit(code: i32, combined: &str) -> io::Result<GitOutput> {
        Ok(GitOutput {
            code: Some(code),
            combined: combined.to_string(),
        })
    }

    fn not_found() -> io::Result<GitOutput> {
        Err(io::Error::new(io::ErrorKind::NotFound, "No such file or directory"))
    }

    impl Git for FakeGit {
        async fn exec(&self, args: &[&str]) -> io::Result<GitOutput> {
            self.calls
                .borrow_mut()
                .push(args.iter().map(|arg| arg.to_string()).collect());
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| ok(""))
        }
    }

    #[test]
    fn empty_dir_means_current_directory() {
        assert_eq!(GitCli::new("").dir, None);
        assert_eq!(
            GitCli::new("/tmp/project").dir,
            Some(PathBuf::from("/tmp/project"))
        );
    }

    #[test]
    fn tag_is_annotated_with_release_message() {
        assert_eq!(
            tag_args(&Version::new(1, 3, 3)),
            vec!["tag", "-a", "1.3.3", "-m", "Release 1.3.3"]
        );
    }

    #[tokio::test]
    async fn fetch_keeps_output_of_failing_git() {
        let git = FakeGit::default().respond(exit(128, "fatal: not a git repository\n"));

        assert_eq!(
            fetch_tags(&git, false).await.unwrap(),
            "fatal: not a git repository\n"
        );
        assert_eq!(git.calls(), vec![vec!["tag"]]);
    }

    #[tokio::test]
    async fn fetch_yields_nothing_if_git_cannot_be_spawned() {
        let git = FakeGit::default().respond(not_found());

        assert_eq!(fetch_tags(&git, false).await.unwrap(), "");
    }

    #[tokio::test]
    async fn ignore_tag_and_push_failures() {
        let git = FakeGit::default()
            .respond(exit(128, "fatal: tag '0.0.1' already exists\n"))
            .respond(not_found());

        create_tag(&git, &Version::new(0, 0, 1), false).await.unwrap();
        push_tags(&git, false).await.unwrap();

        assert_eq!(
            git.calls(),
            vec![
                vec!["tag", "-a", "0.0.1", "-m", "Release 0.0.1"],
                vec!["push", "origin", "--tags"],
            ]
        );
    }

    #[tokio::test]
    async fn strict_surfaces_non_zero_exit() {
        let git = FakeGit::default().respond(exit(128, "fatal: tag '0.0.1' already exists\n"));

        let err = create_tag(&git, &Version::new(0, 0, 1), true)
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "git tag -a 0.0.1 -m Release 0.0.1 failed with exit code 128: fatal: tag '0.0.1' already exists"
        )
    }

    #[tokio::test]
    async fn strict_surfaces_spawn_failure() {
        let git = FakeGit::default().respond(not_found());

        let err = push_tags(&git, true).await.unwrap_err();

        assert_eq!(err.to_string(), "Cannot run git push origin --tags");
    }
}
