//! The project-owned block inside a hosts file
//!
//! Rewriting is a two-state scan over the existing lines. `Outside` keeps
//! lines, a begin marker switches to `InsideBlock`, which drops lines until
//! the matching end marker. The fresh block is then appended.

use std::fmt;

/// Line terminator detected in an existing hosts file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    CrLf,
}

impl LineEnding {
    /// CRLF if the content contains any `\r\n`, LF otherwise
    pub fn detect(content: &[u8]) -> Self {
        if content.windows(2).any(|pair| pair == b"\r\n") {
            Self::CrLf
        } else {
            Self::Lf
        }
    }

    /// Terminator text
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lf => "LF",
            Self::CrLf => "CRLF",
        })
    }
}

/// Begin marker, one mapping line, end marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostsBlock {
    project: String,
    address: String,
    hostname: String,
}

impl HostsBlock {
    /// Block mapping `proxy<suffix>` to `address` for `project`
    pub fn new(project: &str, address: &str, suffix: &str) -> Self {
        Self {
            project: project.to_string(),
            address: address.to_string(),
            hostname: format!("proxy{suffix}"),
        }
    }

    /// Project the block belongs to
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Name the block maps
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Address the name maps to
    pub fn address(&self) -> &str {
        &self.address
    }

    /// `# >>> locom <project> loopback apps >>>`
    pub fn begin_marker(&self) -> String {
        begin_marker(&self.project)
    }

    /// `# <<< locom <project> loopback apps <<<`
    pub fn end_marker(&self) -> String {
        end_marker(&self.project)
    }

    /// `<address> <hostname>`
    pub fn mapping_line(&self) -> String {
        format!("{} {}", self.address, self.hostname)
    }

    /// The three block lines, each terminated with `ending`
    pub fn render(&self, ending: LineEnding) -> String {
        let eol = ending.as_str();
        format!(
            "{}{eol}{}{eol}{}{eol}",
            self.begin_marker(),
            self.mapping_line(),
            self.end_marker()
        )
    }
}

fn begin_marker(project: &str) -> String {
    format!("# >>> locom {project} loopback apps >>>")
}

fn end_marker(project: &str) -> String {
    format!("# <<< locom {project} loopback apps <<<")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Outside,
    InsideBlock,
}

/// Lines left after removing a project's blocks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrippedContent<'a> {
    /// Lines kept, byte-for-byte with their own terminators
    pub retained: Vec<&'a [u8]>,
    /// Detected line ending
    pub ending: LineEnding,
    /// Number of begin markers seen
    pub blocks_removed: usize,
    /// A begin marker had no end marker; everything after it was dropped
    pub unterminated: bool,
}

/// Remove every block owned by `project` from `content`
///
/// Lines are split on `\n` whatever the detected ending, so a file mixing
/// LF and CRLF lines still has its markers recognized. Content need not be
/// UTF-8.
pub fn strip_block<'a>(content: &'a [u8], project: &str) -> StrippedContent<'a> {
    let ending = LineEnding::detect(content);
    let begin = begin_marker(project);
    let end = end_marker(project);

    let mut state = ScanState::Outside;
    let mut retained = Vec::new();
    let mut blocks_removed = 0;
    for line in content.split_inclusive(|b| *b == b'\n') {
        let marker = line.trim_ascii();
        match state {
            ScanState::Outside if marker == begin.as_bytes() => {
                state = ScanState::InsideBlock;
                blocks_removed += 1;
            }
            // stray end markers are dropped too
            ScanState::Outside if marker == end.as_bytes() => {}
            ScanState::Outside => retained.push(line),
            ScanState::InsideBlock if marker == end.as_bytes() => state = ScanState::Outside,
            ScanState::InsideBlock => {}
        }
    }

    StrippedContent {
        retained,
        ending,
        blocks_removed,
        unterminated: state == ScanState::InsideBlock,
    }
}

fn join(lines: &[&[u8]], ending: LineEnding) -> Vec<u8> {
    let mut out = lines.concat();
    if out.last().is_some_and(|b| *b != b'\n') {
        out.extend_from_slice(ending.as_str().as_bytes());
    }
    out
}

/// Replace the project's block in `content` with `block`, appended at the end
pub fn apply_block<'a>(content: &'a [u8], block: &HostsBlock) -> (Vec<u8>, StrippedContent<'a>) {
    let stripped = strip_block(content, block.project());
    let mut updated = join(&stripped.retained, stripped.ending);
    updated.extend_from_slice(block.render(stripped.ending).as_bytes());
    (updated, stripped)
}

/// Remove the project's block from `content`
pub fn remove_block<'a>(content: &'a [u8], project: &str) -> (Vec<u8>, StrippedContent<'a>) {
    let stripped = strip_block(content, project);
    let updated = join(&stripped.retained, stripped.ending);
    (updated, stripped)
}
