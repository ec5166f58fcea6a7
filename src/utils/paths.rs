use std::borrow::Cow;
use std::env;
use std::path::Path;

use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE_NO_PAD};
use base64::engine::DecodePaddingMode;
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

/// Character the Claude CLI substitutes for `/` when naming project directories
pub const LEGACY_FILLER: char = '-';

// Everything that is a separator, the filler itself, '%' or URL-unsafe gets escaped
const ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'-')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'\\')
    .add(b':')
    .add(b'@')
    .add(b'[')
    .add(b']')
    .add(b'!');

// Accepts base64url ids with or without trailing padding
const CWD_DECODER: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encodes an absolute path into a collision-free project directory name
///
/// The leading `/` becomes the legacy `-` prefix; every other `/`, `-` and `%` is
/// percent-escaped, so distinct paths never share an encoding.
///
/// # Examples
///
/// ```
/// use agent_log_viewer::encode_path;
///
/// assert_eq!(encode_path("/Users/foo/bar"), "-Users%2Ffoo%2Fbar");
/// assert_eq!(encode_path("/Users/foo-bar"), "-Users%2Ffoo%2Dbar");
/// ```
pub fn encode_path(path: &str) -> String {
    let without_leading_slash = path.strip_prefix('/').unwrap_or(path);
    let encoded = utf8_percent_encode(without_leading_slash, ENCODE_SET).to_string();
    format!("{}{}", LEGACY_FILLER, encoded)
}

/// Encodes a path the way the Claude CLI names its project directories
///
/// Lossy: `/a/b-c` and `/a/b/c` both encode to `-a-b-c`. Kept to build fixtures and to
/// document the collision; new ids should use [`encode_path`].
pub fn encode_path_legacy(path: &str) -> String {
    path.replace('/', &LEGACY_FILLER.to_string())
}

/// Decodes a project directory name back to the working-directory path
///
/// Names containing `%` were produced by [`encode_path`] and are percent-decoded. Anything
/// else is treated as a legacy name, with every filler character read back as `/`, so a
/// real `-` in the original path cannot be recovered.
///
/// # Examples
///
/// ```
/// use agent_log_viewer::decode_path;
///
/// assert_eq!(decode_path("-Users%2Ffoo%2Dbar"), "/Users/foo-bar");
/// assert_eq!(decode_path("-Users-foo-bar"), "/Users/foo/bar");
/// ```
pub fn decode_path(encoded: &str) -> String {
    if !encoded.contains('%') {
        return encoded.replace(LEGACY_FILLER, "/");
    }

    let without_prefix = encoded.strip_prefix(LEGACY_FILLER).unwrap_or(encoded);
    let decoded = percent_decode_str(without_prefix).decode_utf8_lossy();
    format!("/{}", decoded)
}

/// Reversible project id for a working directory that has no native project concept
pub fn encode_cwd(cwd: &str) -> String {
    URL_SAFE_NO_PAD.encode(cwd.as_bytes())
}

/// Inverse of [`encode_cwd`]
///
/// # Errors
///
/// Returns an error if `project_id` is not base64url or does not decode to UTF-8.
pub fn decode_cwd(project_id: &str) -> Result<String> {
    let bytes = CWD_DECODER
        .decode(project_id)
        .with_context(|| format!("Invalid project id (not base64url): {}", project_id))?;
    String::from_utf8(bytes)
        .with_context(|| format!("Invalid project id (not UTF-8): {}", project_id))
}

/// Display name for a project: the last non-empty path component
pub fn project_name(path: &str) -> String {
    path.split('/').rfind(|part| !part.is_empty()).unwrap_or(path).to_string()
}

/// Checks that a caller-supplied id can be used as a single path component
///
/// # Errors
///
/// Returns an error if the id:
/// - is empty, `.` or `..`
/// - contains a path separator or NUL byte
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() || id == "." || id == ".." {
        bail!("Invalid id: {:?}", id);
    }
    if id.contains(['/', '\\', '\0']) {
        bail!("Id must not contain path separators: {:?}", id);
    }
    Ok(())
}

/// Formats a path with ~ substitution for the home directory
///
/// # Examples
///
/// ```no_run
/// use std::path::PathBuf;
/// use agent_log_viewer::format_path_with_tilde;
///
/// let path = PathBuf::from("/Users/alice/Documents");
/// // Returns "~/Documents" if HOME=/Users/alice
/// let formatted = format_path_with_tilde(&path);
/// ```
pub fn format_path_with_tilde(path: &Path) -> String {
    format_path_with_tilde_internal(path, None)
}

/// Internal helper for path formatting with optional home override (for testing)
pub(crate) fn format_path_with_tilde_internal(path: &Path, home_override: Option<&str>) -> String {
    let home_from_env = env::var("HOME").ok();
    let home = home_override.or(home_from_env.as_deref());

    let path_str = path.to_string_lossy();
    if let Some(home) = home
        && !home.is_empty()
        && path_str.starts_with(home)
    {
        return path_str.replacen(home, "~", 1);
    }

    match path_str {
        Cow::Borrowed(s) => s.to_string(),
        Cow::Owned(s) => s,
    }
}
