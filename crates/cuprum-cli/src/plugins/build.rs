//! Running `cargo build` over the whole workspace

use crate::errors::{BuildError, CliError};
use crate::workspace::Workspace;
use crate::GlobalOpts;
use cuprum_config::{Config, Profile};
use cuprum_logger::{self as logger, Spinner, Verbosity};
use std::ffi::OsString;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

/// `cuprum-plugins build`: build every workspace member without copying
pub fn run_build(opts: &GlobalOpts, cargo_args: &[String]) -> Result<(), CliError> {
    let config = Config::load()?;
    let workspace = Workspace::resolve(opts, &config)?;
    let cargo = config.resolve_cargo()?;
    build_workspace(&cargo, &workspace, cargo_args)?;
    Ok(())
}

/// Arguments for `cargo build` covering every workspace member
pub fn build_args(profile: Profile, quiet: bool, extra: &[String]) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["build".into(), "--workspace".into()];
    if profile == Profile::Release {
        args.push("--release".into());
    }
    if quiet {
        // cargo still prints warnings and errors with --quiet
        args.push("--quiet".into());
    }
    args.extend(extra.iter().map(OsString::from));
    args
}

/// Build all workspace members. Returns once cargo has exited; a non-zero
/// exit is reported as `BuildError::Failed` carrying cargo's exit code.
///
/// cargo's output always reaches the terminal as it is produced. stdout is
/// inherited; stderr is inherited too unless a spinner is drawn, in which
/// case each line is printed above the spinner as it arrives.
pub fn build_workspace(
    cargo: &Path,
    workspace: &Workspace,
    extra: &[String],
) -> Result<(), BuildError> {
    let quiet = logger::get_verbosity() == Verbosity::Quiet;
    let args = build_args(workspace.profile, quiet, extra);
    logger::step(&format!(
        "Building workspace ({} profile)",
        workspace.profile
    ));
    logger::debug(&format!(
        "Running: {} {} (in {})",
        cargo.display(),
        args.iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" "),
        workspace.root.display()
    ));

    let mut command = Command::new(cargo);
    command.args(&args).current_dir(&workspace.root);

    let spawn_error = |source| BuildError::Spawn {
        cargo: cargo.to_path_buf(),
        source,
    };

    let spinner = Spinner::start("Compiling plugins");
    let status = if spinner.is_drawn() {
        let result = run_forwarding_stderr(&mut command, &spinner);
        spinner.finish();
        result.map_err(spawn_error)?
    } else {
        spinner.finish();
        command.status().map_err(spawn_error)?
    };

    logger::debug(&format!("cargo build exited with {}", status));
    check_status(status)?;
    logger::success("Build finished");
    Ok(())
}

fn run_forwarding_stderr(command: &mut Command, spinner: &Spinner) -> io::Result<ExitStatus> {
    let mut child = command
        .stdout(Stdio::inherit())
        .stderr(Stdio::piped())
        .spawn()?;
    if let Some(stderr) = child.stderr.take() {
        forward_lines(BufReader::new(stderr), |line| spinner.println(line))?;
    }
    child.wait()
}

/// Hand every line of `reader` to `emit` as soon as it is complete.
fn forward_lines<R: BufRead>(mut reader: R, mut emit: impl FnMut(&str)) -> io::Result<()> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        emit(line.trim_end_matches(['\n', '\r']));
    }
}

fn check_status(status: ExitStatus) -> Result<(), BuildError> {
    if status.success() {
        return Ok(());
    }
    match status.code() {
        Some(code) => Err(BuildError::Failed { code }),
        None => Err(BuildError::Terminated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args_debug() {
        let args = build_args(Profile::Debug, false, &[]);
        assert_eq!(args, vec![OsString::from("build"), OsString::from("--workspace")]);
    }

    #[test]
    fn test_build_args_release_with_extra() {
        let extra = vec!["--features".to_string(), "tracing".to_string()];
        let args = build_args(Profile::Release, false, &extra);
        assert_eq!(
            args,
            vec![
                OsString::from("build"),
                OsString::from("--workspace"),
                OsString::from("--release"),
                OsString::from("--features"),
                OsString::from("tracing"),
            ]
        );
    }

    #[test]
    fn test_build_args_quiet_keeps_diagnostics_from_cargo() {
        let args = build_args(Profile::Debug, true, &[]);
        assert_eq!(args.last(), Some(&OsString::from("--quiet")));
    }

    #[test]
    fn test_forward_lines_emits_each_line() {
        let input = "   Compiling alpha v0.1.0\nwarning: unused variable `x`\r\n\npartial";
        let mut seen = Vec::new();
        forward_lines(io::Cursor::new(input), |line| seen.push(line.to_string())).unwrap();
        assert_eq!(
            seen,
            vec![
                "   Compiling alpha v0.1.0",
                "warning: unused variable `x`",
                "",
                "partial",
            ]
        );
    }

    #[test]
    fn test_forward_lines_survives_invalid_utf8() {
        let mut seen = Vec::new();
        forward_lines(io::Cursor::new(b"ok\n\xff\n".to_vec()), |line| {
            seen.push(line.to_string())
        })
        .unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], "ok");
    }

    #[cfg(unix)]
    #[test]
    fn test_check_status_propagates_exit_code() {
        use std::os::unix::process::ExitStatusExt;

        assert!(check_status(ExitStatus::from_raw(0)).is_ok());
        // wait status encodes the exit code in the high byte
        let err = check_status(ExitStatus::from_raw(3 << 8)).unwrap_err();
        assert!(matches!(err, BuildError::Failed { code: 3 }));
        let err = check_status(ExitStatus::from_raw(9)).unwrap_err();
        assert!(matches!(err, BuildError::Terminated));
    }
}
