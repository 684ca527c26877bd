//! Splits `git log -p` diff text into per-file sections.

/// Marker that begins a per-file section in unified diff output. Paths
/// follow either plain (`a/x b/x`) or C-quoted (`"a/x\ty" "b/x\ty"`).
const FILE_DIFF_MARKER: &str = "diff --git ";

/// One file's slice of a unified diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSection<'a> {
    /// Path on the `a/` side of the header (the pre-change path).
    pub old_path: String,
    /// Path on the `b/` side of the header (the post-change path).
    pub new_path: String,
    /// Raw text of this file's diff, header and hunks included.
    pub content: &'a str,
}

/// A diff broken at `diff --git` boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitDiff<'a> {
    /// Anything before the first file section (usually empty).
    pub preamble: &'a str,
    /// File sections in input order.
    pub files: Vec<FileSection<'a>>,
}

/// Splits a flat unified diff at `diff --git` line boundaries.
///
/// Concatenating the preamble and every section's content reproduces the
/// input exactly.
pub fn split_by_file(diff: &str) -> SplitDiff<'_> {
    let mut positions = Vec::new();

    if diff.starts_with(FILE_DIFF_MARKER) {
        positions.push(0);
    }
    let search = format!("\n{FILE_DIFF_MARKER}");
    let mut start = 0;
    while let Some(pos) = diff[start..].find(&search) {
        // +1 skips the newline; the section starts at `diff`.
        positions.push(start + pos + 1);
        start = start + pos + 1;
    }

    let preamble_end = positions.first().copied().unwrap_or(diff.len());
    let files = positions
        .iter()
        .enumerate()
        .map(|(i, &pos)| {
            let end = positions.get(i + 1).copied().unwrap_or(diff.len());
            let content = &diff[pos..end];
            let header = content.lines().next().unwrap_or("");
            let (old_path, new_path) = paths_from_header(header);
            FileSection {
                old_path,
                new_path,
                content,
            }
        })
        .collect();

    SplitDiff {
        preamble: &diff[..preamble_end],
        files,
    }
}

/// Extracts `(old, new)` paths from a `diff --git a/<old> b/<new>` line.
///
/// Plain headers use the last ` b/` so that paths containing spaces
/// survive. Quoted paths are unescaped.
fn paths_from_header(header_line: &str) -> (String, String) {
    let rest = header_line
        .strip_prefix(FILE_DIFF_MARKER)
        .unwrap_or(header_line)
        .trim_end();

    let (old, new) = if rest.starts_with('"') || rest.ends_with('"') {
        split_quoted(rest)
    } else {
        match rest.rfind(" b/") {
            Some(b_pos) => (rest[..b_pos].to_string(), rest[b_pos + 1..].to_string()),
            None => (rest.to_string(), rest.to_string()),
        }
    };

    (
        old.strip_prefix("a/").unwrap_or(&old).to_string(),
        new.strip_prefix("b/").unwrap_or(&new).to_string(),
    )
}

/// Splits a header where at least one side is quoted.
fn split_quoted(rest: &str) -> (String, String) {
    let (old, tail) = match rest.strip_prefix('"').and_then(unquote) {
        Some((path, tail)) => (path, tail.trim_start()),
        None => match rest.find(" \"") {
            Some(pos) => (rest[..pos].to_string(), &rest[pos + 1..]),
            None => return (rest.to_string(), rest.to_string()),
        },
    };
    let new = match tail.strip_prefix('"').and_then(unquote) {
        Some((path, _)) => path,
        None => tail.to_string(),
    };
    (old, new)
}

/// Reads a C-quoted string up to its closing quote, returning the unescaped
/// text and whatever follows the quote.
fn unquote(quoted: &str) -> Option<(String, &str)> {
    let bytes = quoted.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                let text = String::from_utf8_lossy(&out).into_owned();
                return Some((text, &quoted[i + 1..]));
            }
            b'\\' => {
                let escaped = *bytes.get(i + 1)?;
                i += 2;
                match escaped {
                    b'n' => out.push(b'\n'),
                    b't' => out.push(b'\t'),
                    b'r' => out.push(b'\r'),
                    b'a' => out.push(0x07),
                    b'b' => out.push(0x08),
                    b'f' => out.push(0x0c),
                    b'v' => out.push(0x0b),
                    b'0'..=b'7' => {
                        let digits = bytes.get(i - 1..i + 2)?;
                        let octal = std::str::from_utf8(digits).ok()?;
                        out.push(u8::from_str_radix(octal, 8).ok()?);
                        i += 2;
                    }
                    other => out.push(other),
                }
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }
    None
}
