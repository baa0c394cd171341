//! Line scanning for informal, line-oriented mesh and result files.
//!
//! None of the supported formats declare a grammar. Readers walk the text line by
//! line, skip blank and comment lines, read a count and then consume exactly that
//! many records. This crate provides the shared pieces:
//!
//! - [`LineStream`]: a forward cursor over raw text that knows which lines are
//!   significant for a given set of comment markers.
//! - [`LineCursor`]: pre-loaded lines with an explicit, rewindable position, for
//!   sections that need lookahead.
//! - [`Record`]: whitespace-separated fields with typed, column-indexed access.

use std::str::FromStr;

use thiserror::Error;

/// Comment markers used by Frame3DD input files.
pub const HASH_COMMENTS: &[char] = &['#'];
/// Comment markers used by Elmer and SU2 mesh files.
pub const PERCENT_COMMENTS: &[char] = &['%'];

/// Input ran out before a declared record count was satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unexpected end of input while reading {section} (last line {last_line})")]
pub struct UnexpectedEndOfInput {
    /// Section that was being read
    pub section: &'static str,
    /// 1-based number of the last line available, 0 for empty input
    pub last_line: usize,
}

/// A field of a record is missing or does not parse.
///
/// The message leaves out the line number; callers attach it from [`FieldError::line`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("missing {what} in field {field}")]
    Missing {
        line: usize,
        field: usize,
        what: &'static str,
    },

    #[error("invalid {what} `{value}` in field {field}")]
    Invalid {
        line: usize,
        field: usize,
        what: &'static str,
        value: String,
    },

    #[error("expected keyword `{keyword}=`")]
    MissingKeyword { line: usize, keyword: &'static str },
}

impl FieldError {
    /// 1-based line number the error refers to.
    pub fn line(&self) -> usize {
        match self {
            FieldError::Missing { line, .. }
            | FieldError::Invalid { line, .. }
            | FieldError::MissingKeyword { line, .. } => *line,
        }
    }
}

/// One physical line of input, trimmed, with its 1-based line number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    pub number: usize,
    pub text: &'a str,
}

impl<'a> Line<'a> {
    pub fn new(number: usize, text: &'a str) -> Self {
        Self {
            number,
            text: text.trim(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }

    pub fn first_token(&self) -> Option<&'a str> {
        self.text.split_whitespace().next()
    }

    pub fn record(&self) -> Record<'a> {
        Record {
            line: self.number,
            fields: self.text.split_whitespace().collect(),
        }
    }

    /// Token-wise comparison against a literal banner.
    ///
    /// Runs of whitespace are equivalent, so a banner matches regardless of how
    /// the producing tool padded its columns.
    pub fn matches(&self, literal: &str) -> bool {
        self.text.split_whitespace().eq(literal.split_whitespace())
    }

    /// Keyword name of a `KEY= value` line, without the `=`.
    pub fn keyword(&self) -> Option<&'a str> {
        let (key, _) = self.text.split_once('=')?;
        let key = key.trim();
        (!key.is_empty() && !key.contains(char::is_whitespace)).then_some(key)
    }

    /// First value of a `KEY= value` or `KEY=value` line.
    pub fn keyword_value(&self, keyword: &'static str) -> Result<&'a str, FieldError> {
        let missing = || FieldError::MissingKeyword {
            line: self.number,
            keyword,
        };
        let rest = self
            .text
            .strip_prefix(keyword)
            .map(str::trim_start)
            .and_then(|rest| rest.strip_prefix('='))
            .ok_or_else(missing)?;
        rest.split_whitespace().next().ok_or(FieldError::Missing {
            line: self.number,
            field: 2,
            what: keyword,
        })
    }

    /// Parsed value of a `KEY= value` line.
    pub fn keyword_parse<T: FromStr>(&self, keyword: &'static str) -> Result<T, FieldError> {
        let raw = self.keyword_value(keyword)?;
        raw.parse().map_err(|_| FieldError::Invalid {
            line: self.number,
            field: 2,
            what: keyword,
            value: raw.to_string(),
        })
    }
}

/// Whitespace-separated fields of one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<'a> {
    line: usize,
    fields: Vec<&'a str>,
}

impl<'a> Record<'a> {
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, column: usize) -> Option<&'a str> {
        self.fields.get(column).copied()
    }

    pub fn parse<T: FromStr>(&self, column: usize, what: &'static str) -> Result<T, FieldError> {
        let raw = self.get(column).ok_or(FieldError::Missing {
            line: self.line,
            field: column + 1,
            what,
        })?;
        raw.parse().map_err(|_| FieldError::Invalid {
            line: self.line,
            field: column + 1,
            what,
            value: raw.to_string(),
        })
    }

    pub fn int(&self, column: usize) -> Result<i32, FieldError> {
        self.parse(column, "integer")
    }

    pub fn float(&self, column: usize) -> Result<f64, FieldError> {
        self.parse(column, "number")
    }

    pub fn count(&self, column: usize) -> Result<usize, FieldError> {
        self.parse(column, "count")
    }
}

/// Whether `text` carries content for a reader using `comment_markers`.
pub fn is_significant(text: &str, comment_markers: &[char]) -> bool {
    match text.trim_start().chars().next() {
        None => false,
        Some(first) => !comment_markers.contains(&first),
    }
}

/// Forward cursor over raw text.
#[derive(Debug, Clone)]
pub struct LineStream<'a> {
    lines: Vec<&'a str>,
    position: usize,
    comment_markers: &'static [char],
}

impl<'a> LineStream<'a> {
    pub fn new(text: &'a str, comment_markers: &'static [char]) -> Self {
        Self {
            lines: text.lines().collect(),
            position: 0,
            comment_markers,
        }
    }

    /// Number of physical lines consumed so far.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Next physical line without any skipping.
    pub fn next_raw(&mut self) -> Option<Line<'a>> {
        let text = self.lines.get(self.position)?;
        self.position += 1;
        Some(Line::new(self.position, text))
    }

    /// Next line that is neither blank nor a comment.
    pub fn next_significant(&mut self) -> Option<Line<'a>> {
        while let Some(line) = self.next_raw() {
            if is_significant(line.text, self.comment_markers) {
                return Some(line);
            }
        }
        None
    }

    pub fn expect_significant(
        &mut self,
        section: &'static str,
    ) -> Result<Line<'a>, UnexpectedEndOfInput> {
        self.next_significant().ok_or(UnexpectedEndOfInput {
            section,
            last_line: self.lines.len(),
        })
    }

    /// Remaining significant lines, pre-loaded for indexed access.
    pub fn significant_lines(self) -> LineCursor<'a> {
        let markers = self.comment_markers;
        LineCursor::new(
            self.lines
                .iter()
                .enumerate()
                .skip(self.position)
                .filter(|(_, text)| is_significant(text, markers))
                .map(|(index, text)| Line::new(index + 1, text))
                .collect(),
        )
    }

    /// Remaining physical lines, pre-loaded for indexed access.
    pub fn raw_lines(self) -> LineCursor<'a> {
        LineCursor::new(
            self.lines
                .iter()
                .enumerate()
                .skip(self.position)
                .map(|(index, text)| Line::new(index + 1, text))
                .collect(),
        )
    }
}

/// Pre-loaded lines walked with an explicit position.
#[derive(Debug, Clone, Default)]
pub struct LineCursor<'a> {
    lines: Vec<Line<'a>>,
    position: usize,
}

impl<'a> LineCursor<'a> {
    pub fn new(lines: Vec<Line<'a>>) -> Self {
        Self { lines, position: 0 }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.lines.len().saturating_sub(self.position)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Line number of the last available line, 0 for empty input.
    pub fn last_line_number(&self) -> usize {
        self.lines.last().map_or(0, |line| line.number)
    }

    pub fn get(
        &self,
        index: usize,
        section: &'static str,
    ) -> Result<Line<'a>, UnexpectedEndOfInput> {
        self.lines.get(index).copied().ok_or(UnexpectedEndOfInput {
            section,
            last_line: self.last_line_number(),
        })
    }

    pub fn peek(&self) -> Option<Line<'a>> {
        self.lines.get(self.position).copied()
    }

    /// Next line, or `None` when the input is exhausted.
    pub fn next_line(&mut self) -> Option<Line<'a>> {
        let line = self.peek()?;
        self.position += 1;
        Some(line)
    }

    /// Next line of a mandatory section.
    pub fn expect_next(&mut self, section: &'static str) -> Result<Line<'a>, UnexpectedEndOfInput> {
        let line = self.get(self.position, section)?;
        self.position += 1;
        Ok(line)
    }

    pub fn step_back(&mut self) {
        self.position = self.position.saturating_sub(1);
    }

    pub fn seek(&mut self, position: usize) {
        self.position = position.min(self.lines.len());
    }

    /// Skip `count` lines of a section whose contents are not retained.
    pub fn skip(&mut self, count: usize, section: &'static str) -> Result<(), UnexpectedEndOfInput> {
        if count > self.remaining() {
            self.position = self.lines.len();
            return Err(UnexpectedEndOfInput {
                section,
                last_line: self.last_line_number(),
            });
        }
        self.position += count;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_significant_skips_blank_and_comment_lines() {
        let src = "% header\n\n   \n  % indented comment\n1 2 3\n# not a comment here\n";
        let mut stream = LineStream::new(src, PERCENT_COMMENTS);
        let line = stream.next_significant().expect("first significant line");
        assert_eq!(line.number, 5);
        assert_eq!(line.text, "1 2 3");
        let line = stream.next_significant().expect("hash is content for elmer");
        assert_eq!(line.text, "# not a comment here");
        assert!(stream.next_significant().is_none());
    }

    #[test]
    fn expect_significant_reports_section_on_exhaustion() {
        let mut stream = LineStream::new("# only a comment\n", HASH_COMMENTS);
        let err = stream
            .expect_significant("node count")
            .expect_err("should run out");
        assert_eq!(err.section, "node count");
        assert_eq!(err.last_line, 1);
    }

    #[test]
    fn raw_lines_keep_blank_lines_and_numbers() {
        let mut stream = LineStream::new("title\n\n  12 NODES  \n", HASH_COMMENTS);
        let title = stream.next_raw().expect("title line");
        assert_eq!(title.text, "title");
        let mut cursor = stream.raw_lines();
        assert_eq!(cursor.len(), 2);
        assert!(cursor.expect_next("blank").expect("blank line").is_blank());
        let counts = cursor.expect_next("counts").expect("counts line");
        assert_eq!(counts.number, 3);
        assert_eq!(counts.text, "12 NODES");
    }

    #[test]
    fn cursor_get_past_end_is_unexpected_end() {
        let cursor = LineStream::new("a\nb\n", PERCENT_COMMENTS).significant_lines();
        assert_eq!(cursor.get(1, "records").expect("in range").text, "b");
        let err = cursor.get(2, "records").expect_err("out of range");
        assert_eq!(err.last_line, 2);
    }

    #[test]
    fn cursor_skip_and_step_back() {
        let mut cursor = LineStream::new("a\nb\nc\n", PERCENT_COMMENTS).significant_lines();
        cursor.skip(2, "markers").expect("two lines available");
        assert_eq!(cursor.peek().map(|l| l.text), Some("c"));
        cursor.step_back();
        assert_eq!(cursor.next_line().map(|l| l.text), Some("b"));
        assert!(cursor.skip(5, "markers").is_err());
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn record_reports_missing_and_invalid_fields() {
        let line = Line::new(7, "  10 17331 abc ");
        let record = line.record();
        assert_eq!(record.int(0).expect("code"), 10);
        assert_eq!(
            record.int(2).expect_err("not a number"),
            FieldError::Invalid {
                line: 7,
                field: 3,
                what: "integer",
                value: "abc".to_string(),
            }
        );
        assert!(matches!(
            record.float(5),
            Err(FieldError::Missing { line: 7, field: 6, .. })
        ));
    }

    #[test]
    fn keyword_values_accept_both_spacings() {
        assert_eq!(Line::new(1, "NELEM= 42").keyword_parse::<usize>("NELEM"), Ok(42));
        assert_eq!(Line::new(1, "NELEM=42").keyword_parse::<usize>("NELEM"), Ok(42));
        assert_eq!(Line::new(1, "NPOIN= 9 8").keyword_parse::<usize>("NPOIN"), Ok(9));
        assert_eq!(Line::new(1, "MARKER_TAG= inlet").keyword(), Some("MARKER_TAG"));
        assert!(matches!(
            Line::new(3, "NDIME= 2").keyword_value("NELEM"),
            Err(FieldError::MissingKeyword { line: 3, .. })
        ));
        assert_eq!(Line::new(1, "1.0 2.0").keyword(), None);
    }

    #[test]
    fn banner_match_ignores_column_padding() {
        let line = Line::new(1, "Node    X-dsp   Y-dsp");
        assert!(line.matches("Node X-dsp Y-dsp"));
        assert!(!line.matches("Node X-dsp"));
    }
}
