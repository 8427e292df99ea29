//! Line-oriented driving of chunking state machines.
//!
//! Lines are produced by splitting on `\n` only, so a `\r` before the newline
//! stays part of the line. Every line carries its byte range in the source,
//! which lets an accumulated run of lines be emitted as an exact slice.

use docingest_shared::Chunk;

/// One line of the source document.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Line<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

/// Split `content` on `\n`, keeping byte offsets.
pub(crate) fn lines(content: &str) -> impl Iterator<Item = Line<'_>> {
    let mut offset = 0;
    content.split('\n').map(move |text| {
        let start = offset;
        let end = start + text.len();
        offset = end + 1;
        Line { text, start, end }
    })
}

/// A line-at-a-time chunker: one transition per line, one terminal flush.
pub(crate) trait LineMachine<'a> {
    fn on_line(&mut self, line: Line<'a>);

    /// Flush whatever is still buffered and hand back the chunks.
    fn finish(self) -> Vec<Chunk>;
}

/// Feed every line of `content` to `machine` in order, then finish it.
///
/// Empty content feeds no lines at all, so no strategy emits an empty chunk.
pub(crate) fn run<'a, M: LineMachine<'a>>(content: &'a str, mut machine: M) -> Vec<Chunk> {
    if !content.is_empty() {
        for line in lines(content) {
            machine.on_line(line);
        }
    }
    machine.finish()
}

/// A run of consecutive lines, tracked as a byte range plus its joined length
/// in characters (lines + separating newlines).
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    span: Option<(usize, usize)>,
    chars: usize,
}

impl LineBuffer {
    pub fn push(&mut self, line: &Line<'_>) {
        let line_chars = line.text.chars().count();
        match &mut self.span {
            Some((_, end)) => {
                *end = line.end;
                self.chars += 1 + line_chars;
            }
            None => {
                self.span = Some((line.start, line.end));
                self.chars = line_chars;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.span.is_none()
    }

    /// Length of the lines joined with `\n`, in characters.
    pub fn char_len(&self) -> usize {
        self.chars
    }

    /// The buffered text as a slice of `content`.
    pub fn text<'a>(&self, content: &'a str) -> Option<&'a str> {
        self.span.map(|(start, end)| &content[start..end])
    }

    /// Return the buffered text and reset the buffer.
    pub fn take<'a>(&mut self, content: &'a str) -> Option<&'a str> {
        let text = self.text(content);
        self.span = None;
        self.chars = 0;
        text
    }
}
