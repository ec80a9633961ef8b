//! Remote path helpers: normalization and command-line fragment resolution

/// Commands whose trailing argument is conventionally a filesystem path
pub const PATH_COMMANDS: &[&str] = &[
    "cd", "ls", "ll", "cat", "less", "more", "head", "tail", "cp", "mv", "rm", "rmdir", "mkdir",
    "touch", "grep", "egrep", "find", "du", "stat", "file", "chmod", "chown", "chgrp", "tar",
    "nano", "vim", "vi", "source", "bat", "tree", "wc", "diff", "ln", "readlink", "realpath",
];

/// Whether `command` takes a path as its trailing argument
pub fn is_path_command(command: &str) -> bool {
    PATH_COMMANDS.contains(&command)
}

/// Normalize a remote path into absolute form
///
/// The result always starts with `/`, contains no empty or `.` segments,
/// has `..` resolved (never above root) and has no trailing slash unless it
/// is the root itself.
pub fn normalize_path(raw: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in raw.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Join `relative` onto the absolute `base` and normalize the result
pub fn join_path(base: &str, relative: &str) -> String {
    if relative.starts_with('/') {
        normalize_path(relative)
    } else {
        normalize_path(&format!("{}/{}", base, relative))
    }
}

/// Split a normalized path into its parent directory and basename
///
/// Returns `None` for the root.
pub fn split_parent(path: &str) -> Option<(&str, &str)> {
    if path == "/" {
        return None;
    }
    let idx = path.rfind('/')?;
    let parent = if idx == 0 { "/" } else { &path[..idx] };
    Some((parent, &path[idx + 1..]))
}

/// All ancestors of a normalized path, nearest first, ending with the root
pub fn ancestors(path: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut current = path;
    while let Some((parent, _)) = split_parent(current) {
        out.push(parent);
        current = parent;
    }
    out
}

/// Quote a string for a POSIX shell
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// The trailing path argument of a partially typed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathFragment {
    /// Input verbatim up to the fragment (command, flags, earlier args)
    pub base: String,
    /// Directory portion as the user typed it, including its trailing `/`
    pub typed_dir: String,
    /// Basename filter (everything after the last `/`)
    pub prefix: String,
    /// Absolute, normalized directory to list
    pub directory: String,
}

impl PathFragment {
    /// Full command line for a completed child (`child` may carry a `/`)
    pub fn complete(&self, child: &str) -> String {
        format!("{}{}{}", self.base, self.typed_dir, child)
    }
}

/// Resolve the trailing path fragment of `input` against `current_directory`
///
/// Returns `None` when the command is not path-consuming, when no argument
/// has been started yet, or when the trailing token is a flag or uses `~`.
pub fn parse_path_fragment(input: &str, current_directory: &str) -> Option<PathFragment> {
    let mut tokens = input.split_whitespace();
    let command = tokens.next()?;
    if !is_path_command(command) {
        return None;
    }

    let ends_with_space = input.ends_with(char::is_whitespace);
    let fragment = if ends_with_space {
        ""
    } else {
        // Bare command name: still typing the command itself
        tokens.last()?
    };

    if fragment.starts_with('-') || fragment.starts_with('~') {
        return None;
    }

    let base = input[..input.len() - fragment.len()].to_string();
    let (typed_dir, prefix) = match fragment.rfind('/') {
        Some(idx) => (&fragment[..=idx], &fragment[idx + 1..]),
        None => ("", fragment),
    };

    let directory = if typed_dir.starts_with('/') {
        normalize_path(typed_dir)
    } else {
        join_path(&normalize_path(current_directory), typed_dir)
    };

    Some(PathFragment {
        base,
        typed_dir: typed_dir.to_string(),
        prefix: prefix.to_string(),
        directory,
    })
}
