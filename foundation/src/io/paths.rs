//! Relative path computation over URLs, and display helpers.

use std::path::{Component, MAIN_SEPARATOR, MAIN_SEPARATOR_STR, Path, PathBuf};

use percent_encoding::percent_decode_str;
use url::Url;

/// `to_path` expressed relative to `from_path`.
///
/// Both values may be local paths or URLs. Local paths are turned into
/// `file:` URLs; a `from_path` naming an existing directory (or ending in a
/// separator) is treated as a directory. When the schemes differ, or no
/// relative form exists, `to_path` comes back unchanged. The result is
/// percent-decoded and, for `file:` targets, uses the native separator.
pub fn get_relative_path(from_path: &str, to_path: &str) -> String {
    let (Some(from), Some(to)) = (to_url(from_path, true), to_url(to_path, false)) else {
        return to_path.to_string();
    };
    if from.scheme() != to.scheme() {
        return to_path.to_string();
    }
    let Some(relative) = from.make_relative(&to) else {
        return to_path.to_string();
    };

    let decoded = percent_decode_str(&relative)
        .decode_utf8_lossy()
        .into_owned();
    if to.scheme().eq_ignore_ascii_case("file") {
        decoded.replace('/', MAIN_SEPARATOR_STR)
    } else {
        decoded
    }
}

/// Parses as a URL with an authority marker; drive letters and relative
/// paths containing a colon stay local.
fn parse_remote(value: &str) -> Option<Url> {
    if !value.contains("://") {
        return None;
    }
    Url::parse(value).ok().filter(|url| url.scheme().len() > 1)
}

fn to_url(value: &str, as_base: bool) -> Option<Url> {
    if let Some(url) = parse_remote(value) {
        return Some(url);
    }
    let path = normalize(&std::path::absolute(value).ok()?);
    let is_dir = value.ends_with('/')
        || value.ends_with(MAIN_SEPARATOR)
        || matches!(
            Path::new(value).components().next_back(),
            Some(Component::CurDir | Component::ParentDir)
        )
        || path.is_dir();
    if as_base && is_dir {
        Url::from_directory_path(&path).ok()
    } else {
        Url::from_file_path(&path).ok()
    }
}

/// Resolve `.` and `..` lexically; `..` never climbs above the root.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir | Component::Prefix(_))
                ) {
                    out.pop();
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// How a path should be shown to the user.
///
/// Debug mode shows `path` verbatim. Otherwise the file name, or the path
/// relative to `relative_to` when given.
pub fn view_file_path(path: &str, relative_to: Option<&str>, debug_enabled: bool) -> String {
    if debug_enabled {
        return path.to_string();
    }
    match relative_to {
        Some(base) => get_relative_path(base, path),
        None => Path::new(path)
            .file_name()
            .map_or_else(|| path.to_string(), |name| name.to_string_lossy().into_owned()),
    }
}
