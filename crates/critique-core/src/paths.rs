//! Path handling for the write guard.
//!
//! Normalized paths are for comparison only. Nothing here touches the
//! filesystem: `..` segments are resolved lexically, symlinks are not followed.

use std::path::{Component, Path, PathBuf};

/// Infix inserted before the extension of an annotated copy
pub const ANNOTATED_INFIX: &str = "critique";

/// Resolve a user-supplied path to an absolute, lexically clean form.
///
/// Strips one leading `@`, expands `~` with the home directory, and resolves
/// relative paths against `cwd`.
pub fn normalize_path(raw: &str, cwd: &Path) -> PathBuf {
    normalize_path_with_home(raw, cwd, dirs::home_dir().as_deref())
}

/// Like [`normalize_path`] with an explicit home directory. `None` leaves
/// `~` unexpanded.
pub fn normalize_path_with_home(raw: &str, cwd: &Path, home: Option<&Path>) -> PathBuf {
    let trimmed = raw.strip_prefix('@').unwrap_or(raw).trim();
    let expanded = expand_home(trimmed, home);

    if expanded.is_absolute() {
        lexical_clean(&expanded)
    } else {
        lexical_clean(&cwd.join(expanded))
    }
}

/// The path as the user typed it, minus the `@` reference prefix.
pub fn display_label(raw: &str) -> String {
    raw.strip_prefix('@').unwrap_or(raw).trim().to_string()
}

/// Path equality for guard checks. Case-insensitive on Windows only.
pub fn paths_equal(a: &Path, b: &Path) -> bool {
    #[cfg(windows)]
    {
        a.to_string_lossy()
            .eq_ignore_ascii_case(&b.to_string_lossy())
    }
    #[cfg(not(windows))]
    {
        a == b
    }
}

/// `report.md` becomes `report.critique.md`; `Makefile` becomes `Makefile.critique`.
pub fn annotated_path(source: &Path) -> PathBuf {
    match source.extension() {
        Some(ext) => source.with_extension(format!(
            "{}.{}",
            ANNOTATED_INFIX,
            ext.to_string_lossy()
        )),
        None => {
            let mut name = source.as_os_str().to_owned();
            name.push(".");
            name.push(ANNOTATED_INFIX);
            PathBuf::from(name)
        }
    }
}

fn expand_home(path: &str, home: Option<&Path>) -> PathBuf {
    match home {
        Some(home) if path == "~" => home.to_path_buf(),
        Some(home) => match path.strip_prefix("~/") {
            Some(rest) => home.join(rest),
            None => PathBuf::from(path),
        },
        None => PathBuf::from(path),
    }
}

fn lexical_clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if out.file_name().is_some() {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
                // `..` at the root stays at the root
            }
            Component::Normal(part) => out.push(part),
        }
    }

    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}
