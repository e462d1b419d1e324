//! Running the external check command.
//!
//! Images are probed by exporting them with the container CLI
//! (`docker save <reference>`) and throwing the archive away. If the engine
//! cannot read every layer of the image the export fails with a non-zero
//! exit code.

use std::{
    process::{Command, Stdio},
    time::Instant,
};

use log::warn;

use crate::audit::ImageCheck;

/// Default program used to export images.
pub const DEFAULT_CHECKER: &str = "docker";

/// Runs a program to completion and reports its exit code.
pub trait CommandRunner {
    fn run(&mut self, program: &str, args: &[&str]) -> std::io::Result<i32>;
}

/// Runs commands as child processes of this one.
///
/// The child's stdout is discarded and its stderr goes to ours. A line with
/// the command and its wall-clock time is printed after each run.
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&mut self, program: &str, args: &[&str]) -> std::io::Result<i32> {
        let start = Instant::now();
        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .status()?;

        println!(
            "command: '{program} {}' : time: {}ms",
            args.join(" "),
            start.elapsed().as_millis()
        );

        Ok(match status.code() {
            Some(code) => code,
            None => {
                warn!("{program} terminated without an exit code: {status}");
                -1
            }
        })
    }
}

/// Checks an image by running `<program> save <reference>`.
#[derive(Debug)]
pub struct SaveCheck<R> {
    runner: R,
    program: String,
}

impl<R: CommandRunner> SaveCheck<R> {
    pub fn new(runner: R, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }
}

impl<R: CommandRunner> ImageCheck for SaveCheck<R> {
    fn check(&mut self, reference: &str) -> std::io::Result<i32> {
        self.runner.run(&self.program, &["save", reference])
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        invocations: Vec<(String, Vec<String>)>,
    }

    impl CommandRunner for Recorder {
        fn run(&mut self, program: &str, args: &[&str]) -> std::io::Result<i32> {
            self.invocations.push((
                program.to_string(),
                args.iter().map(|a| a.to_string()).collect(),
            ));
            Ok(0)
        }
    }

    #[test]
    fn test_save_check_arguments() {
        let mut check = SaveCheck::new(Recorder::default(), DEFAULT_CHECKER);
        assert_eq!(check.check("app/web").unwrap(), 0);
        assert_eq!(
            check.runner.invocations,
            [("docker".to_string(), vec!["save".to_string(), "app/web".to_string()])]
        );
    }

    #[test]
    fn test_missing_program_is_an_error() {
        let err = ProcessRunner
            .run("/nonexistent/image-audit-checker", &["save", "app/web"])
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test_with::executable(sh)]
    fn test_exit_code_is_reported() {
        let mut runner = ProcessRunner;
        assert_eq!(runner.run("sh", &["-c", "exit 0"]).unwrap(), 0);
        assert_eq!(runner.run("sh", &["-c", "exit 3"]).unwrap(), 3);
        // stdout must not leak into ours, and a chatty child must not block
        assert_eq!(
            runner
                .run("sh", &["-c", "head -c 1000000 /dev/zero; exit 1"])
                .unwrap(),
            1
        );
    }

    #[test_with::executable(sh)]
    fn test_killed_child_counts_as_failure() {
        assert_eq!(
            ProcessRunner.run("sh", &["-c", "kill -9 $$"]).unwrap(),
            -1
        );
    }
}
