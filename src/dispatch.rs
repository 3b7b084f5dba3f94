//! Execution of resolved invocations.
//!
//! A single strategy covers every combination of redirection kind and
//! foreground/background:
//!
//! | redirection | foreground                               | background                         |
//! |-------------|------------------------------------------|------------------------------------|
//! | none        | spawn, wait                              | spawn, hand to registry            |
//! | `>` / `>>`  | open file, spawn onto it, wait           | open file, spawn onto it, hand off |
//! | `>>>`       | spawn onto a pipe, read, reverse, append | same, on a helper thread           |
//!
//! Redirect targets are always opened before anything is spawned, so a bad path
//! never starts the program.

use crate::builtin::{Bello, run_builtin};
use crate::command::{ExitClass, ExitCode, Stdout};
use crate::error::{Result, ShellError};
use crate::io_adapters::{MemWriter, is_capture_overflow};
use crate::parser::Redirection;
use crate::registry::BackgroundJob;
use crate::session::Session;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;

/// What an invocation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Program {
    /// An executable found on the search path.
    External(PathBuf),
    /// The report builtin, run in-process under a redirection or `&`.
    Report,
}

/// A fully resolved command ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: Program,
    /// `argv[0]` is the name as typed; the rest are the arguments.
    pub argv: Vec<String>,
    pub redirection: Redirection,
    pub background: bool,
}

impl Invocation {
    pub fn name(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or_default()
    }
}

/// How a dispatched line ended, when it didn't fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to run.
    Idle,
    /// A builtin or foreground program finished with this status.
    Completed(ExitCode),
    /// A background program was started and left running.
    Detached { pid: u32 },
    /// The interpreter should stop.
    Exit,
}

enum Sink {
    Inherit,
    Redirect(Box<dyn Stdout>),
    /// Destination of a reverse-capture, already opened for appending.
    Capture(File),
}

/// Runs `invocation` and updates the session's process bookkeeping.
pub fn execute(invocation: &Invocation, session: &mut Session) -> Result<Outcome> {
    let sink = open_sink(&invocation.redirection, &session.env.current_dir)?;
    match &invocation.program {
        Program::Report => run_report(invocation, sink, session),
        Program::External(path) => run_external(path, invocation, sink, session),
    }
}

/// Opens the redirect target; relative paths are taken from `cwd`, like the child's.
fn open_sink(redirection: &Redirection, cwd: &Path) -> Result<Sink> {
    Ok(match redirection {
        Redirection::None => Sink::Inherit,
        Redirection::Truncate(path) => {
            Sink::Redirect(Box::new(open_output(&cwd.join(path), false)?))
        }
        Redirection::Append(path) => Sink::Redirect(Box::new(open_output(&cwd.join(path), true)?)),
        Redirection::ReverseCapture(path) => Sink::Capture(open_output(&cwd.join(path), true)?),
    })
}

/// Opens `path` for writing, creating it readable by everyone and writable by the owner.
fn open_output(path: &Path, append: bool) -> Result<File> {
    let mut options = OpenOptions::new();
    options.create(true);
    if append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }
    options
        .open(path)
        .map_err(|e| ShellError::io(format!("can't open {}", path.display()), e))
}

fn run_external(
    path: &Path,
    invocation: &Invocation,
    sink: Sink,
    session: &mut Session,
) -> Result<Outcome> {
    let program = invocation.name().to_string();
    let mut cmd = Command::new(path);
    cmd.args(invocation.argv.iter().skip(1))
        .env_clear()
        .envs(&session.env.vars)
        .current_dir(&session.env.current_dir);

    let capture = match sink {
        Sink::Inherit => None,
        Sink::Redirect(out) => {
            cmd.stdout(out.stdio());
            None
        }
        Sink::Capture(dest) => {
            cmd.stdout(Stdio::piped());
            Some(dest)
        }
    };

    session.processes.record_spawn();
    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            // No child to wait for; balance the spawn count.
            session.processes.record_lost();
            return Err(spawn_error(&program, e));
        }
    };
    log::debug!(
        "started {} as {} ({:?}, background: {})",
        program,
        child.id(),
        invocation.redirection,
        invocation.background
    );

    let limit = session.config.capture_limit;
    if invocation.background {
        let pid = child.id();
        let job = match capture {
            None => BackgroundJob::Process { program, child },
            Some(dest) => {
                let name = program.clone();
                let handle = thread::spawn(move || capture_reversed(&name, child, dest, limit));
                BackgroundJob::Capture {
                    program,
                    pid,
                    handle,
                }
            }
        };
        session.processes.adopt(job);
        // Best effort: lets the child print before the next prompt does.
        thread::sleep(session.config.background_delay);
        return Ok(Outcome::Detached { pid });
    }

    let status = match capture {
        None => wait_for(&program, child),
        Some(dest) => capture_reversed(&program, child, dest, limit),
    };
    match status {
        Ok(status) => finish(&program, status, session),
        Err(e) => {
            session.processes.record_lost();
            Err(e)
        }
    }
}

fn wait_for(program: &str, mut child: Child) -> Result<ExitStatus> {
    child
        .wait()
        .map_err(|e| ShellError::io(format!("can't wait for {program}"), e))
}

fn finish(program: &str, status: ExitStatus, session: &mut Session) -> Result<Outcome> {
    match session.processes.record_exit(status) {
        ExitClass::Success => Ok(Outcome::Completed(0)),
        ExitClass::Failure(code) => Err(ShellError::ChildFailed {
            program: program.to_string(),
            code,
        }),
        ExitClass::Abnormal(code) => Err(ShellError::ChildSignaled {
            program: program.to_string(),
            code,
        }),
    }
}

/// Failures of the exec step itself (missing, not permitted, not a valid executable)
/// are `Exec`; anything else went wrong while creating the process.
fn spawn_error(program: &str, source: io::Error) -> ShellError {
    let program = program.to_string();
    if is_exec_failure(&source) {
        ShellError::Exec { program, source }
    } else {
        ShellError::Spawn { program, source }
    }
}

fn is_exec_failure(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
    ) || is_exec_format_error(e)
}

#[cfg(unix)]
fn is_exec_format_error(e: &io::Error) -> bool {
    e.raw_os_error() == Some(nix::errno::Errno::ENOEXEC as i32)
}

#[cfg(not(unix))]
fn is_exec_format_error(_: &io::Error) -> bool {
    false
}

/// Reads the child's whole output, waits for it, and appends the reversed output to
/// `dest`.
///
/// The file is written even when the child exits with a failure status. A read
/// error or an output larger than `limit` kills the child and writes nothing.
fn capture_reversed(
    program: &str,
    mut child: Child,
    mut dest: File,
    limit: usize,
) -> Result<ExitStatus> {
    let mut output = Vec::new();
    // one byte past the limit is enough to detect an overflow
    let read_cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    let read = match child.stdout.take() {
        Some(pipe) => pipe.take(read_cap).read_to_end(&mut output),
        None => Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdout is not piped")),
    };

    let failure = match read {
        Err(e) => Some(ShellError::io(format!("can't read output of {program}"), e)),
        Ok(_) if output.len() > limit => Some(ShellError::CaptureOverflow { limit }),
        Ok(_) => None,
    };
    if let Some(e) = failure {
        // Reap it so it doesn't linger; the dispatch has already failed.
        let _ = child.kill();
        let _ = child.wait();
        return Err(e);
    }

    let status = wait_for(program, child)?;
    dest.write_all(&reverse_output(&output))
        .map_err(|e| ShellError::io("can't append reversed output", e))?;
    Ok(status)
}

/// Reverses captured output, keeping a newline at the end.
///
/// The last byte (normally the program's trailing newline) is dropped, the rest is
/// written back to front, and a `\n` closes the result, so `"abc\n"` becomes `"cba\n"`.
/// Output that doesn't end in a newline loses its last byte.
pub fn reverse_output(output: &[u8]) -> Vec<u8> {
    let Some((&last, body)) = output.split_last() else {
        return Vec::new();
    };
    if last != b'\n' {
        log::warn!("captured output has no trailing newline; its last byte is dropped");
    }
    let mut reversed: Vec<u8> = body.iter().rev().copied().collect();
    reversed.push(b'\n');
    reversed
}

fn run_report(invocation: &Invocation, sink: Sink, session: &mut Session) -> Result<Outcome> {
    let args: Vec<&str> = invocation.argv.iter().skip(1).map(String::as_str).collect();
    if invocation.background {
        log::debug!("{} runs in-process; `&` has no effect", invocation.name());
    }

    let code = match sink {
        Sink::Inherit => {
            let mut out = io::stdout();
            let code = run_builtin::<Bello>(&args, &mut out, session)?;
            out.flush()
                .map_err(|e| ShellError::io("can't flush stdout", e))?;
            code
        }
        Sink::Redirect(mut out) => run_builtin::<Bello>(&args, &mut out, session)?,
        Sink::Capture(mut dest) => {
            let limit = session.config.capture_limit;
            let (mut writer, captured) = MemWriter::with_handle(limit);
            let code = match run_builtin::<Bello>(&args, &mut writer, session) {
                Err(ShellError::Builtin { error, .. })
                    if error
                        .downcast_ref::<io::Error>()
                        .is_some_and(is_capture_overflow) =>
                {
                    return Err(ShellError::CaptureOverflow { limit });
                }
                other => other?,
            };
            dest.write_all(&reverse_output(&captured.borrow()))
                .map_err(|e| ShellError::io("can't append reversed output", e))?;
            code
        }
    };
    Ok(Outcome::Completed(code))
}
