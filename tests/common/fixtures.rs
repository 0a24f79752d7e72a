//! Test fixtures: fake renderer scripts.
//!
//! Each script is run as `sh <script> <source>` and stands in for PlantUML.

/// PNG signature followed by the diagram source, written next to the source
/// like the real renderer does. Output is a pure function of the input.
pub const ECHO_PNG: &str =
    r#"out="${1%.*}.png"; printf '\211PNG\r\n\032\n' > "$out"; cat "$1" >> "$out""#;

/// Like [`ECHO_PNG`] but sleeps first, widening any race between requests
pub const SLOW_ECHO_PNG: &str = r#"sleep 0.2; out="${1%.*}.png"; printf '\211PNG\r\n\032\n' > "$out"; cat "$1" >> "$out""#;

/// Rejects the diagram with a syntax error on stderr
pub const SYNTAX_ERROR: &str = r#"echo "Error line 1 in file: $1" >&2; echo "Syntax Error?" >&2; exit 200"#;

/// Exits successfully without writing an image
pub const NO_OUTPUT: &str = "exit 0";

/// Never finishes on its own
pub const HANG: &str = "exec sleep 30";

/// Records its own pid and a background helper's pid in `pids` next to the
/// script, then waits on the helper
pub const HANG_WITH_HELPER: &str =
    r#"sleep 30 & echo "$$ $!" > "$(dirname "$0")/pids"; wait"#;

/// A background helper writes the image after two seconds while the script
/// waits for it
pub const LATE_WRITER: &str = r#"(sleep 2; printf 'late' > "${1%.*}.png") & wait"#;

/// Writes a partial image and then fails
pub const PARTIAL_THEN_FAIL: &str = r#"printf 'partial' > "${1%.*}.png"; exit 1"#;

/// A command that cannot be spawned
pub const MISSING_COMMAND: &str = "/nonexistent/umlserve-test-renderer";

pub const PNG_MAGIC: [u8; 4] = [0x89, 0x50, 0x4E, 0x47];
