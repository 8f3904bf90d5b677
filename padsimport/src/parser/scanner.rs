//! PADS Line Scanner
//!
//! Splits a PADS-Logic ASCII export into classified logical lines. Section
//! markers are `*NAME*` tokens at the start of a line; `*REMARK*` lines are
//! comments. The scanner is lazy and gives the section parsers one line of
//! lookahead, which is all the grammar needs.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::iter::Peekable;
use std::path::Path;
use std::str::Lines;

use super::pads::{parse_header_line, PadsParseError};
use super::pads_schema::Header;

/// Known section markers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    Parameters,
    Fields,
    CaeDecal,
    PartType,
    Parts,
    Signal,
    End,
    /// Any other marker; its contents are skipped
    Other(String),
}

impl Section {
    pub fn from_name(name: &str) -> Section {
        match name {
            "PARAMETERS" | "SCH" => Section::Parameters,
            "FIELDS" => Section::Fields,
            "CAEDECAL" => Section::CaeDecal,
            "PARTTYPE" => Section::PartType,
            "PARTS" | "PART" => Section::Parts,
            "SIGNAL" | "CONNECTION" => Section::Signal,
            "END" => Section::End,
            other => Section::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    Comment,
    Section(Section),
    Data,
}

/// One classified line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedLine<'a> {
    /// 1-based physical line number
    pub number: usize,
    /// Trimmed text
    pub text: &'a str,
    pub kind: LineKind,
}

impl<'a> ScannedLine<'a> {
    pub fn is_section(&self) -> bool {
        matches!(self.kind, LineKind::Section(_))
    }

    pub fn tokens(&self) -> Vec<&'a str> {
        self.text.split_whitespace().collect()
    }

    pub fn first_token(&self) -> &'a str {
        self.text.split_whitespace().next().unwrap_or("")
    }
}

/// Classify a single trimmed line.
pub fn classify(text: &str) -> LineKind {
    if text.is_empty() {
        return LineKind::Blank;
    }
    if text.starts_with('#') || text.to_ascii_uppercase().starts_with("*REMARK*") {
        return LineKind::Comment;
    }
    let first = text.split_whitespace().next().unwrap_or("");
    if first.len() >= 3 && first.starts_with('*') && first.ends_with('*') {
        let name = first.trim_matches('*').to_ascii_uppercase();
        return LineKind::Section(Section::from_name(&name));
    }
    LineKind::Data
}

/// Lazy iterator over classified lines
pub struct LineIter<'a> {
    lines: Lines<'a>,
    number: usize,
}

impl<'a> Iterator for LineIter<'a> {
    type Item = ScannedLine<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = self.lines.next()?;
        self.number += 1;
        let text = raw.trim();
        Some(ScannedLine {
            number: self.number,
            text,
            kind: classify(text),
        })
    }
}

pub fn scan_lines(content: &str) -> LineIter<'_> {
    LineIter {
        lines: content.lines(),
        number: 0,
    }
}

/// Cursor over the classified lines with one line of lookahead
pub struct Scanner<'a> {
    inner: Peekable<LineIter<'a>>,
}

impl<'a> Scanner<'a> {
    pub fn new(content: &'a str) -> Self {
        Self {
            inner: scan_lines(content).peekable(),
        }
    }

    fn skip_insignificant(&mut self) {
        while let Some(line) = self.inner.peek() {
            match line.kind {
                LineKind::Blank | LineKind::Comment => {
                    self.inner.next();
                }
                _ => break,
            }
        }
    }

    /// Next non-blank, non-comment line without consuming it
    pub fn peek(&mut self) -> Option<&ScannedLine<'a>> {
        self.skip_insignificant();
        self.inner.peek()
    }

    /// Consume the next non-blank, non-comment line
    pub fn next_line(&mut self) -> Option<ScannedLine<'a>> {
        self.skip_insignificant();
        self.inner.next()
    }

    /// Consume the next line only if it is a data line
    pub fn next_data(&mut self) -> Option<ScannedLine<'a>> {
        match self.peek() {
            Some(line) if line.kind == LineKind::Data => self.inner.next(),
            _ => None,
        }
    }

    /// True when the next significant line is a section marker or end of input
    pub fn at_section_end(&mut self) -> bool {
        match self.peek() {
            Some(line) => line.is_section(),
            None => true,
        }
    }

    /// Line number of the next significant line, if any
    pub fn line_number(&mut self) -> Option<usize> {
        self.peek().map(|l| l.number)
    }
}

/// Check whether `content` starts with a PADS-Logic / PADS-PowerLogic header.
pub fn check_header_str(content: &str) -> bool {
    first_significant_line(content.lines())
        .map(|line| parse_header_line(line).is_ok())
        .unwrap_or(false)
}

/// Probe a candidate file without parsing it. Only the first line that is
/// neither blank nor a comment is read.
pub fn check_file_header(path: &Path) -> bool {
    read_file_header(path).is_ok()
}

/// Read and parse only the header line of a file.
pub fn read_file_header(path: &Path) -> Result<Header, PadsParseError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    for line in reader.lines() {
        let line = line?;
        if is_insignificant(line.trim()) {
            continue;
        }
        return parse_header_line(line.trim());
    }
    Err(PadsParseError::InvalidFormat("File is empty".to_string()))
}

fn is_insignificant(text: &str) -> bool {
    matches!(classify(text), LineKind::Blank | LineKind::Comment)
}

fn first_significant_line<'a>(mut lines: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    lines.map(str::trim).find(|l| !is_insignificant(l))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_lines() {
        assert_eq!(classify(""), LineKind::Blank);
        assert_eq!(classify("*REMARK* exported by hand"), LineKind::Comment);
        assert_eq!(classify("# note"), LineKind::Comment);
        assert_eq!(classify("*CAEDECAL*  ITEMS"), LineKind::Section(Section::CaeDecal));
        assert_eq!(classify("*PART*"), LineKind::Section(Section::Parts));
        assert_eq!(
            classify("*TEXT*"),
            LineKind::Section(Section::Other("TEXT".to_string()))
        );
        assert_eq!(classify("R1 RES 0 0 0 0 1"), LineKind::Data);
        // a lone star is data, not a marker
        assert_eq!(classify("* 1 2"), LineKind::Data);
    }

    #[test]
    fn test_line_numbers_are_one_based() {
        let lines: Vec<_> = scan_lines("a\n\nb\n").collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].number, 1);
        assert_eq!(lines[2].number, 3);
        assert_eq!(lines[2].text, "b");
    }

    #[test]
    fn test_scanner_skips_blank_and_comments() {
        let mut scanner = Scanner::new("\n*REMARK* x\n  DATA 1\n*END*\n");
        let line = scanner.next_data().expect("data line");
        assert_eq!(line.text, "DATA 1");
        assert_eq!(line.number, 3);
        assert!(scanner.at_section_end());
        assert!(scanner.next_data().is_none());
        let end = scanner.next_line().expect("end marker");
        assert_eq!(end.kind, LineKind::Section(Section::End));
        assert!(scanner.peek().is_none());
    }

    #[test]
    fn test_check_header_str() {
        assert!(check_header_str("\n\n*PADS-LOGIC-V9.0* DESIGN EXPORT FILE\n"));
        assert!(check_header_str("*PADS-POWERLOGIC-V5.2*\n"));
        assert!(!check_header_str("EESchema Schematic File Version 4\n"));
        assert!(!check_header_str(""));
        assert!(!check_header_str("*REMARK* only a comment\n"));
    }

    #[test]
    fn test_header_probe_skips_comments() {
        let content = "*REMARK* exported by hand\n# tool 1.2\n\n*PADS-LOGIC-V9.0*\n*END*\n";
        assert!(check_header_str(content));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("remark.txt");
        std::fs::write(&path, content).unwrap();
        assert!(check_file_header(&path));
        assert_eq!(read_file_header(&path).unwrap().version, "V9.0");
    }
}
