//! Splits a reply into named segments.
//!
//! A text segment opens with `<NAME>` on its own line and closes with
//! `</NAME>`; the line break after the start marker and the one before the
//! end marker are framing, not body. Raw segments (`<BINARY>`) carry their
//! bytes directly between the markers and are never trimmed. The end marker
//! is located by exact byte search, so a body may hold arbitrary binary data.
//! Whitespace between segments is ignored; anything else outside a segment is
//! an error.

use crate::error::ReplyError;
use crate::reply::BINARY;

/// Segments whose body is taken byte for byte, without line framing.
pub const RAW_SEGMENTS: &[&str] = &[BINARY];

/// A completed segment borrowed from the reply bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub name: &'a str,
    pub body: &'a [u8],
    /// Byte offset of the start marker.
    pub offset: usize,
}

/// A segment kept verbatim because no parser handles its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSegment {
    pub name: String,
    pub body: Vec<u8>,
}

impl From<Segment<'_>> for RawSegment {
    fn from(s: Segment<'_>) -> Self {
        Self {
            name: s.name.to_string(),
            body: s.body.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State<'a> {
    Scanning,
    InSegment {
        name: &'a str,
        marker: usize,
        body: usize,
        framed: bool,
    },
    Done,
}

pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn is_name(name: &[u8]) -> bool {
    !name.is_empty()
        && name
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || *b == b'-' || *b == b'_')
}

/// Length of the line break at `at`, if any.
fn line_break(input: &[u8], at: usize) -> Option<usize> {
    match &input[at..] {
        [] => Some(0),
        [b'\n', ..] => Some(1),
        [b'\r', b'\n', ..] => Some(2),
        _ => None,
    }
}

fn stray(input: &[u8], at: usize) -> ReplyError {
    let end = input[at..]
        .iter()
        .position(|b| *b == b'\n')
        .map_or(input.len(), |n| at + n);
    let end = end.min(at + 80);
    ReplyError::StrayContent {
        offset: at,
        text: String::from_utf8_lossy(&input[at..end]).trim_end().to_string(),
    }
}

/// Iterator over the segments of a reply.
///
/// Yields an error and then stops on the first malformed or truncated
/// segment.
pub struct Segments<'a> {
    input: &'a [u8],
    pos: usize,
    state: State<'a>,
}

impl<'a> Segments<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            state: State::Scanning,
        }
    }

    fn fail(&mut self, err: ReplyError) -> Option<Result<Segment<'a>, ReplyError>> {
        self.state = State::Done;
        Some(Err(err))
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Result<Segment<'a>, ReplyError>;

    fn next(&mut self) -> Option<Self::Item> {
        let input = self.input;
        loop {
            match self.state {
                State::Done => return None,
                State::Scanning => {
                    while self.pos < input.len() && input[self.pos].is_ascii_whitespace() {
                        self.pos += 1;
                    }
                    let at = self.pos;
                    if at == input.len() {
                        self.state = State::Done;
                        return None;
                    }
                    if input[at] != b'<' {
                        return self.fail(stray(input, at));
                    }
                    let Some(close) = input[at..].iter().position(|b| *b == b'>') else {
                        return self.fail(stray(input, at));
                    };
                    let tag = &input[at + 1..at + close];
                    if let Some(name) = tag.strip_prefix(b"/") {
                        if is_name(name) {
                            return self.fail(ReplyError::TruncatedResponse {
                                segment: String::from_utf8_lossy(name).into_owned(),
                                offset: at,
                            });
                        }
                        return self.fail(stray(input, at));
                    }
                    let after = at + close + 1;
                    let Some(name) = std::str::from_utf8(tag).ok().filter(|_| is_name(tag)) else {
                        return self.fail(stray(input, at));
                    };
                    let (body, framed) = if RAW_SEGMENTS.contains(&name) {
                        (after, false)
                    } else {
                        match line_break(input, after) {
                            Some(nl) => (after + nl, nl > 0),
                            None => return self.fail(stray(input, at)),
                        }
                    };
                    self.state = State::InSegment {
                        name,
                        marker: at,
                        body,
                        framed,
                    };
                }
                State::InSegment {
                    name,
                    marker,
                    body,
                    framed,
                } => {
                    let end_marker = format!("</{name}>");
                    let Some(len) = find(&input[body..], end_marker.as_bytes()) else {
                        return self.fail(ReplyError::TruncatedResponse {
                            segment: name.to_string(),
                            offset: marker,
                        });
                    };
                    let mut content = &input[body..body + len];
                    if framed {
                        if let Some(stripped) = content.strip_suffix(b"\n") {
                            content = stripped.strip_suffix(b"\r").unwrap_or(stripped);
                        }
                    }
                    self.pos = body + len + end_marker.len();
                    self.state = State::Scanning;
                    return Some(Ok(Segment {
                        name,
                        body: content,
                        offset: marker,
                    }));
                }
            }
        }
    }
}

/// Collects every segment, failing on the first error.
pub fn split(input: &[u8]) -> Result<Vec<Segment<'_>>, ReplyError> {
    Segments::new(input).collect()
}
