use std::io::Write;
use std::process::{ExitStatus, Stdio};

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// Abstraction over a writable output stream that can also be converted into
/// a [`Stdio`] handle for spawning external processes.
///
/// Redirect targets are opened as `Box<dyn Stdout>` so the same handle can feed a
/// child process or an in-process builtin. A blanket implementation exists for any
/// type that implements `Write` and `Into<Stdio>` (e.g. `File`).
pub trait Stdout: Write {
    /// Convert this output into a [`Stdio`] handle suitable for `std::process::Command`.
    fn stdio(self: Box<Self>) -> Stdio;
}

impl<T: Write + Into<Stdio>> Stdout for T {
    fn stdio(self: Box<Self>) -> Stdio {
        (*self).into()
    }
}

/// How a finished child ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitClass {
    /// Normal exit with status 0.
    Success,
    /// Normal exit with a nonzero status.
    Failure(ExitCode),
    /// Killed by a signal; carries the shell-style `128 + signal` code.
    Abnormal(ExitCode),
}

impl ExitClass {
    pub fn from_status(status: ExitStatus) -> Self {
        match status.code() {
            Some(0) => ExitClass::Success,
            Some(code) => ExitClass::Failure(code),
            None => ExitClass::Abnormal(terminated_by_signal(status)),
        }
    }

    pub fn is_success(self) -> bool {
        self == ExitClass::Success
    }

    pub fn code(self) -> ExitCode {
        match self {
            ExitClass::Success => 0,
            ExitClass::Failure(code) | ExitClass::Abnormal(code) => code,
        }
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}
