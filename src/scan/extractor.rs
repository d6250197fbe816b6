//! Incremental extraction of path-matched values from a chunked byte stream
//!
//! The extractor consumes arbitrary byte chunks, tracks its location inside
//! the document with a frame stack, and buffers the bytes of any value whose
//! location matches the configured path pattern. A completed buffer is parsed
//! (SIMD fast path, serde_json fallback for error reporting) and handed to
//! the record sink. Everything outside matched values is structurally
//! validated but never materialized.

use std::io;

use serde_json::Value;

use crate::error::ScanError;
use crate::path::{PathPattern, PathStep};

/// Where the scanner sits relative to the surrounding JSON grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Expecting a value (document start, after `:`, after `,` in an array)
    ExpectValue,
    /// Right after `[`: a value or an immediate `]`
    ExpectValueOrClose,
    /// Right after `{`: a key or an immediate `}`
    ExpectKeyOrClose,
    /// After `,` inside an object
    ExpectKey,
    /// After an object key
    ExpectColon,
    /// After a complete value inside a container
    ExpectCommaOrClose,
    /// Root value complete; only trailing whitespace is legal
    Done,
}

/// One open container on the path from the root to the current position
#[derive(Debug)]
enum Frame {
    Object { key: Option<String> },
    Array { index: usize },
}

/// Byte buffer for the value currently being captured
#[derive(Debug)]
struct Capture {
    buf: Vec<u8>,
    /// Stack depth at which the captured value started
    depth: usize,
}

/// Streaming path extractor fed one chunk at a time
///
/// Records are emitted in document order. `finish` must be called after the
/// last chunk; an unterminated document is malformed even if every chunk fed
/// cleanly.
pub struct StreamExtractor<'p, S> {
    pattern: &'p PathPattern,
    sink: S,
    state: State,
    stack: Vec<Frame>,
    capture: Option<Capture>,
    in_string: bool,
    str_escape: bool,
    str_is_key: bool,
    key_buf: Vec<u8>,
    in_scalar: bool,
    scalar_buf: Vec<u8>,
    offset: u64,
    records: u64,
}

impl<'p, S> StreamExtractor<'p, S>
where
    S: FnMut(Value) -> io::Result<()>,
{
    pub fn new(pattern: &'p PathPattern, sink: S) -> Self {
        StreamExtractor {
            pattern,
            sink,
            state: State::ExpectValue,
            stack: Vec::new(),
            capture: None,
            in_string: false,
            str_escape: false,
            str_is_key: false,
            key_buf: Vec::new(),
            in_scalar: false,
            scalar_buf: Vec::new(),
            offset: 0,
            records: 0,
        }
    }

    /// Consume one chunk, emitting any records that complete within it
    pub fn feed(&mut self, chunk: &[u8]) -> Result<(), ScanError> {
        for &byte in chunk {
            self.step(byte)?;
            self.offset += 1;
        }
        Ok(())
    }

    /// Verify the document terminated cleanly and return the record count
    pub fn finish(mut self) -> Result<u64, ScanError> {
        // A top-level scalar has no delimiter; end-of-input terminates it
        if self.in_scalar && self.stack.is_empty() {
            self.end_scalar()?;
        }
        if self.state != State::Done || self.in_string || self.in_scalar {
            return Err(ScanError::malformed(self.offset, "unexpected end of input"));
        }
        Ok(self.records)
    }

    /// Records emitted so far
    pub fn records(&self) -> u64 {
        self.records
    }

    fn step(&mut self, byte: u8) -> Result<(), ScanError> {
        if self.in_string {
            return self.string_byte(byte);
        }
        if self.in_scalar {
            if is_scalar_byte(byte) {
                self.scalar_buf.push(byte);
                self.cap_push(byte);
                return Ok(());
            }
            // The delimiter terminates the token, then is handled structurally
            self.end_scalar()?;
        }
        self.structural(byte)
    }

    fn structural(&mut self, byte: u8) -> Result<(), ScanError> {
        if matches!(byte, b' ' | b'\t' | b'\n' | b'\r') {
            self.cap_push(byte);
            return Ok(());
        }

        match self.state {
            State::ExpectValue | State::ExpectValueOrClose => {
                if byte == b']' && self.state == State::ExpectValueOrClose {
                    self.close_array()
                } else {
                    self.begin_value(byte)
                }
            }
            State::ExpectKeyOrClose => match byte {
                b'"' => {
                    self.begin_string(true);
                    Ok(())
                }
                b'}' => self.close_object(),
                _ => Err(self.unexpected(byte, "object key or `}`")),
            },
            State::ExpectKey => match byte {
                b'"' => {
                    self.begin_string(true);
                    Ok(())
                }
                _ => Err(self.unexpected(byte, "object key")),
            },
            State::ExpectColon => match byte {
                b':' => {
                    self.cap_push(byte);
                    self.state = State::ExpectValue;
                    Ok(())
                }
                _ => Err(self.unexpected(byte, "`:`")),
            },
            State::ExpectCommaOrClose => match byte {
                b',' => {
                    self.cap_push(byte);
                    self.state = match self.stack.last() {
                        Some(Frame::Object { .. }) => State::ExpectKey,
                        Some(Frame::Array { .. }) => State::ExpectValue,
                        None => return Err(self.unexpected(byte, "end of document")),
                    };
                    Ok(())
                }
                b'}' => self.close_object(),
                b']' => self.close_array(),
                _ => Err(self.unexpected(byte, "`,` or closing bracket")),
            },
            State::Done => Err(ScanError::malformed(
                self.offset,
                "trailing data after document",
            )),
        }
    }

    /// Dispatch the first byte of a value, starting capture if its location
    /// matches the pattern
    fn begin_value(&mut self, byte: u8) -> Result<(), ScanError> {
        if self.capture.is_none() && self.path_matches() {
            self.capture = Some(Capture {
                buf: Vec::new(),
                depth: self.stack.len(),
            });
        }

        match byte {
            b'{' => {
                self.cap_push(byte);
                self.stack.push(Frame::Object { key: None });
                self.state = State::ExpectKeyOrClose;
                Ok(())
            }
            b'[' => {
                self.cap_push(byte);
                self.stack.push(Frame::Array { index: 0 });
                self.state = State::ExpectValueOrClose;
                Ok(())
            }
            b'"' => {
                self.begin_string(false);
                Ok(())
            }
            b'-' | b'0'..=b'9' | b't' | b'f' | b'n' => {
                self.in_scalar = true;
                self.scalar_buf.clear();
                self.scalar_buf.push(byte);
                self.cap_push(byte);
                Ok(())
            }
            _ => {
                // A capture started for a value that never materialized
                self.capture = None;
                Err(self.unexpected(byte, "JSON value"))
            }
        }
    }

    fn begin_string(&mut self, is_key: bool) {
        self.cap_push(b'"');
        self.in_string = true;
        self.str_escape = false;
        self.str_is_key = is_key;
        if is_key {
            self.key_buf.clear();
        }
    }

    fn string_byte(&mut self, byte: u8) -> Result<(), ScanError> {
        self.cap_push(byte);

        if self.str_escape {
            self.str_escape = false;
            if self.str_is_key {
                self.key_buf.push(byte);
            }
            return Ok(());
        }

        match byte {
            b'\\' => {
                self.str_escape = true;
                if self.str_is_key {
                    self.key_buf.push(byte);
                }
                Ok(())
            }
            b'"' => {
                self.in_string = false;
                self.finish_string()
            }
            0x00..=0x1f => Err(ScanError::malformed(
                self.offset,
                "control character inside string",
            )),
            _ => {
                if self.str_is_key {
                    self.key_buf.push(byte);
                }
                Ok(())
            }
        }
    }

    fn finish_string(&mut self) -> Result<(), ScanError> {
        if !self.str_is_key {
            return self.end_value();
        }

        let key = self.decode_key()?;
        match self.stack.last_mut() {
            Some(Frame::Object { key: slot }) => *slot = Some(key),
            _ => {
                return Err(ScanError::malformed(
                    self.offset,
                    "object key outside object",
                ))
            }
        }
        self.state = State::ExpectColon;
        Ok(())
    }

    /// Unescape the buffered key bytes into the key string
    fn decode_key(&self) -> Result<String, ScanError> {
        if self.key_buf.contains(&b'\\') {
            let mut quoted = Vec::with_capacity(self.key_buf.len() + 2);
            quoted.push(b'"');
            quoted.extend_from_slice(&self.key_buf);
            quoted.push(b'"');
            serde_json::from_slice(&quoted).map_err(|e| {
                ScanError::malformed(self.offset, format!("bad escape in object key: {e}"))
            })
        } else {
            String::from_utf8(self.key_buf.clone())
                .map_err(|_| ScanError::malformed(self.offset, "invalid UTF-8 in object key"))
        }
    }

    fn end_scalar(&mut self) -> Result<(), ScanError> {
        self.in_scalar = false;
        if !is_valid_scalar(&self.scalar_buf) {
            return Err(ScanError::malformed(
                self.offset,
                format!(
                    "invalid literal `{}`",
                    String::from_utf8_lossy(&self.scalar_buf)
                ),
            ));
        }
        self.end_value()
    }

    fn close_object(&mut self) -> Result<(), ScanError> {
        match self.stack.pop() {
            Some(Frame::Object { .. }) => {}
            _ => return Err(ScanError::malformed(self.offset, "mismatched `}`")),
        }
        self.cap_push(b'}');
        self.end_value()
    }

    fn close_array(&mut self) -> Result<(), ScanError> {
        match self.stack.pop() {
            Some(Frame::Array { .. }) => {}
            _ => return Err(ScanError::malformed(self.offset, "mismatched `]`")),
        }
        self.cap_push(b']');
        self.end_value()
    }

    /// Bookkeeping after any value completes: emit a finished capture,
    /// advance the parent array index, pick the follow-up state
    fn end_value(&mut self) -> Result<(), ScanError> {
        if let Some(capture) = self.capture.take() {
            if self.stack.len() == capture.depth {
                let value = self.parse_record(capture.buf)?;
                (self.sink)(value).map_err(ScanError::Io)?;
                self.records += 1;
            } else {
                // An inner value of a still-open captured container
                self.capture = Some(capture);
            }
        }

        if let Some(Frame::Array { index }) = self.stack.last_mut() {
            *index += 1;
        }

        self.state = if self.stack.is_empty() {
            State::Done
        } else {
            State::ExpectCommaOrClose
        };
        Ok(())
    }

    /// Parse a captured value, trying SIMD first and falling back to
    /// serde_json for a useful error message
    fn parse_record(&self, buf: Vec<u8>) -> Result<Value, ScanError> {
        let raw = buf.clone();
        let mut simd_buf = buf;
        match simd_json::serde::from_slice::<Value>(&mut simd_buf) {
            Ok(value) => Ok(value),
            Err(_) => serde_json::from_slice(&raw)
                .map_err(|e| ScanError::malformed(self.offset, e.to_string())),
        }
    }

    /// Does the value about to start sit at a pattern-matched location?
    fn path_matches(&self) -> bool {
        if self.stack.len() != self.pattern.depth() {
            return false;
        }
        let mut steps = Vec::with_capacity(self.stack.len());
        for frame in &self.stack {
            match frame {
                Frame::Object { key: Some(key) } => steps.push(PathStep::Key(key)),
                Frame::Object { key: None } => return false,
                Frame::Array { index } => steps.push(PathStep::Index(*index)),
            }
        }
        self.pattern.matches(&steps)
    }

    fn cap_push(&mut self, byte: u8) {
        if let Some(capture) = self.capture.as_mut() {
            capture.buf.push(byte);
        }
    }

    fn unexpected(&self, byte: u8, expected: &str) -> ScanError {
        ScanError::malformed(
            self.offset,
            format!("unexpected byte `{}`, expected {expected}", byte as char),
        )
    }
}

fn is_scalar_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'+' | b'-' | b'.')
}

/// Validate an unquoted token as one of the JSON literals or a number
fn is_valid_scalar(token: &[u8]) -> bool {
    match token {
        b"true" | b"false" | b"null" => true,
        _ => is_valid_number(token),
    }
}

fn is_valid_number(token: &[u8]) -> bool {
    let mut i = 0;
    let len = token.len();
    if i < len && token[i] == b'-' {
        i += 1;
    }
    // Integer part: `0` alone, or a nonzero digit followed by more digits
    match token.get(i) {
        Some(b'0') => i += 1,
        Some(b'1'..=b'9') => {
            while i < len && token[i].is_ascii_digit() {
                i += 1;
            }
        }
        _ => return false,
    }
    if i < len && token[i] == b'.' {
        i += 1;
        let start = i;
        while i < len && token[i].is_ascii_digit() {
            i += 1;
        }
        if i == start {
            return false;
        }
    }
    if i < len && matches!(token[i], b'e' | b'E') {
        i += 1;
        if i < len && matches!(token[i], b'+' | b'-') {
            i += 1;
        }
        let start = i;
        while i < len && token[i].is_ascii_digit() {
            i += 1;
        }
        if i == start {
            return false;
        }
    }
    i == len
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collect(pattern: &str, input: &[u8]) -> Result<Vec<Value>, ScanError> {
        collect_chunked(pattern, input, input.len().max(1))
    }

    fn collect_chunked(
        pattern: &str,
        input: &[u8],
        chunk: usize,
    ) -> Result<Vec<Value>, ScanError> {
        let pattern = PathPattern::parse(pattern).unwrap();
        let mut seen = Vec::new();
        let mut extractor = StreamExtractor::new(&pattern, |value| {
            seen.push(value);
            Ok(())
        });
        for piece in input.chunks(chunk) {
            extractor.feed(piece)?;
        }
        let records = extractor.finish()?;
        assert_eq!(records as usize, seen.len());
        Ok(seen)
    }

    #[test]
    fn test_array_elements_in_order() {
        let records = collect("hexes.*", br#"{"hexes":[1,2,3]}"#).unwrap();
        assert_eq!(records, vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn test_single_byte_chunks_match_whole_input() {
        let input = br#"{"hexes": [ {"id": 1, "terrain": "sea"}, {"id": 2}, [3, 4], "x" ]}"#;
        let whole = collect("hexes.*", input).unwrap();
        for chunk in [1usize, 2, 3, 7] {
            let pieces = collect_chunked("hexes.*", input, chunk).unwrap();
            assert_eq!(pieces, whole, "chunk size {chunk}");
        }
        assert_eq!(whole.len(), 4);
        assert_eq!(whole[0], json!({"id": 1, "terrain": "sea"}));
        assert_eq!(whole[2], json!([3, 4]));
        assert_eq!(whole[3], json!("x"));
    }

    #[test]
    fn test_empty_target_array() {
        let records = collect("hexes.*", br#"{"hexes":[],"count":0}"#).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_non_matching_siblings_are_skipped() {
        let input = br#"{"meta":{"rows":2},"hexes":[10,20],"extra":[1,2,3]}"#;
        let records = collect("hexes.*", input).unwrap();
        assert_eq!(records, vec![json!(10), json!(20)]);
    }

    #[test]
    fn test_wildcard_over_object_values() {
        let records = collect("*", br#"{"a":1,"b":{"c":2}}"#).unwrap();
        assert_eq!(records, vec![json!(1), json!({"c": 2})]);
    }

    #[test]
    fn test_nested_pattern() {
        let input = br#"{"data":{"items":[true,false,null]}}"#;
        let records = collect("data.items.*", input).unwrap();
        assert_eq!(records, vec![json!(true), json!(false), json!(null)]);
    }

    #[test]
    fn test_index_pattern_selects_one_element() {
        let records = collect("hexes.1", br#"{"hexes":["a","b","c"]}"#).unwrap();
        assert_eq!(records, vec![json!("b")]);
    }

    #[test]
    fn test_strings_with_structural_bytes_inside() {
        let input = br#"{"hexes":["a,b","c]d","e\"f}","{"]}"#;
        let records = collect("hexes.*", input).unwrap();
        assert_eq!(
            records,
            vec![json!("a,b"), json!("c]d"), json!("e\"f}"), json!("{")]
        );
    }

    #[test]
    fn test_escape_split_across_chunks() {
        let input = br#"{"hexes":["a\"b","\\"]}"#;
        for chunk in 1..input.len() {
            let records = collect_chunked("hexes.*", input, chunk).unwrap();
            assert_eq!(records, vec![json!("a\"b"), json!("\\")], "chunk {chunk}");
        }
    }

    #[test]
    fn test_escaped_object_keys_are_unescaped_before_matching() {
        let records = collect("a\"b.*", br#"{"a\"b":[5]}"#).unwrap();
        assert_eq!(records, vec![json!(5)]);
    }

    #[test]
    fn test_numbers_with_exponents() {
        let input = br#"{"hexes":[-1.5e3,0.25,1E+2,-0]}"#;
        let records = collect("hexes.*", input).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0], json!(-1.5e3));
    }

    #[test]
    fn test_top_level_scalar_document() {
        let records = collect("hexes.*", b"42").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_truncated_document_fails_on_finish() {
        let err = collect("hexes.*", br#"{"hexes":[1,2"#).unwrap_err();
        assert!(matches!(err, ScanError::MalformedJson { .. }));
    }

    #[test]
    fn test_double_comma_is_rejected() {
        let err = collect("hexes.*", br#"{"hexes":[1,,2]}"#).unwrap_err();
        assert!(matches!(err, ScanError::MalformedJson { .. }));
    }

    #[test]
    fn test_missing_colon_is_rejected() {
        let err = collect("hexes.*", br#"{"hexes" [1]}"#).unwrap_err();
        assert!(matches!(err, ScanError::MalformedJson { .. }));
    }

    #[test]
    fn test_bad_literal_is_rejected() {
        let err = collect("hexes.*", br#"{"hexes":[tru]}"#).unwrap_err();
        assert!(matches!(
            err,
            ScanError::MalformedJson { ref reason, .. } if reason.contains("tru")
        ));
    }

    #[test]
    fn test_mismatched_close_is_rejected() {
        let err = collect("hexes.*", br#"{"hexes":[1}]"#).unwrap_err();
        assert!(matches!(err, ScanError::MalformedJson { .. }));
    }

    #[test]
    fn test_trailing_garbage_is_rejected() {
        let err = collect("hexes.*", br#"{"hexes":[]} x"#).unwrap_err();
        assert!(matches!(
            err,
            ScanError::MalformedJson { ref reason, .. } if reason.contains("trailing")
        ));
    }

    #[test]
    fn test_empty_input_fails() {
        let err = collect("hexes.*", b"").unwrap_err();
        assert!(matches!(err, ScanError::MalformedJson { .. }));
    }

    #[test]
    fn test_error_offset_points_at_failing_byte() {
        let input = br#"{"hexes":[1,,2]}"#;
        match collect("hexes.*", input) {
            Err(ScanError::MalformedJson { offset, .. }) => {
                assert_eq!(input[offset as usize], b',');
            }
            other => panic!("expected malformed error, got {other:?}"),
        }
    }

    #[test]
    fn test_unicode_strings_pass_through() {
        let input = "{\"hexes\":[\"øre å\",\"雪\"]}".as_bytes();
        let records = collect("hexes.*", input).unwrap();
        assert_eq!(records, vec![json!("øre å"), json!("雪")]);
    }
}
