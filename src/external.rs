use crate::env::Environment;
use crate::error::{Result, ShellError};
use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Locate `name` the way `execvp` would, reporting why it can't be found.
///
/// Fails with [`ShellError::PathUnset`] when the environment has no `PATH` and with
/// [`ShellError::NotFound`] when no candidate is an executable file.
pub fn resolve_program(env: &Environment, name: &str) -> Result<PathBuf> {
    let search_paths = env.get_var("PATH").ok_or(ShellError::PathUnset)?;
    match find_command_path(OsStr::new(&search_paths), Path::new(name)) {
        Some(found) => Ok(found.into_owned()),
        None => Err(ShellError::NotFound {
            name: name.to_string(),
        }),
    }
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it is executable.
/// - `./foo`, or a relative path with several components (e.g. `bin/sh`): returns it
///   if it is executable.
/// - Single path component (no separators): tests `<dir>/<name>` for each directory in
///   `search_paths` (PATH), left to right, and returns the first executable match.
/// - Empty path: returns `None`.
///
/// Returns either a borrowed reference to the provided `path` or an owned `PathBuf`
/// when the result is discovered via PATH lookup.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        (None, None) => None,
        (Some(x), None) => find_in_path(search_paths, x.as_os_str()).map(Cow::Owned),
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|candidate| is_executable(candidate))
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if is_executable(path) { Some(path) } else { None }
}

/// True for regular files with at least one execute bit set.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub fn is_executable(path: &Path) -> bool {
    path.is_file()
}
