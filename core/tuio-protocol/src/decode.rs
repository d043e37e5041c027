//! Decoding of TUIO text lines into typed updates.
//!
//! The decoder is deliberately strict about structure and lenient about
//! content: a line must carry the configured profile prefix and one of the
//! three known commands, but `set` may carry trailing arguments (velocity and
//! acceleration in the 2Dcur profile) which are ignored.
//!
//! Coordinates keep only the digits before the decimal point. The fractional
//! digits are validated and then discarded.

use thiserror::Error;

use crate::{Blob, PROFILE_2DCUR};

const CMD_ALIVE: &str = "alive";
const CMD_SET: &str = "set";
const CMD_FSEQ: &str = "fseq";

/// Longest slice of an offending line kept in an error.
const ERROR_LINE_LIMIT: usize = 96;

/// Receiver of `set` updates: the snapshot currently being assembled.
pub trait BlobSink {
    /// Adds or updates a blob. Fails with [`DecodeError::Overflow`] when the
    /// sink is full.
    fn put(&mut self, blob: Blob) -> Result<(), DecodeError>;
}

/// Result of decoding one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// Live id declaration. Continuation only; the snapshot is not touched.
    Alive(Vec<u64>),
    /// A blob was written into the sink.
    Set(Blob),
    /// Bundle terminator with its frame sequence number. Negative numbers
    /// mark heartbeat bundles.
    Complete(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown profile: {line}")]
    UnknownProfile { line: String },

    #[error("malformed message ({reason}): {line}")]
    MalformedMessage { line: String, reason: &'static str },

    #[error("snapshot overflow: more than {capacity} blobs in one bundle")]
    Overflow { capacity: usize },
}

impl DecodeError {
    fn malformed(line: &str, reason: &'static str) -> Self {
        DecodeError::MalformedMessage {
            line: clip(line),
            reason,
        }
    }

    /// Stable short code for logs and counters.
    pub fn code(&self) -> &'static str {
        match self {
            DecodeError::UnknownProfile { .. } => "unknown_profile",
            DecodeError::MalformedMessage { .. } => "malformed_message",
            DecodeError::Overflow { .. } => "overflow",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Decoder {
    profile: String,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(PROFILE_2DCUR)
    }
}

impl Decoder {
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
        }
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Decodes one line, writing `set` blobs into `sink`.
    ///
    /// Trailing whitespace (including the transport's newline) is ignored.
    pub fn decode<S>(&self, line: &str, sink: &mut S) -> Result<Update, DecodeError>
    where
        S: BlobSink + ?Sized,
    {
        let line = line.trim_end();
        let Some(body) = line.strip_prefix(self.profile.as_str()) else {
            return Err(DecodeError::UnknownProfile { line: clip(line) });
        };
        let Some(body) = body.strip_prefix(' ') else {
            return Err(DecodeError::malformed(line, "missing command"));
        };

        let mut tokens = body.split_ascii_whitespace();
        match tokens.next() {
            Some(CMD_ALIVE) => {
                let ids = tokens
                    .map(|token| token.parse::<u64>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|_| DecodeError::malformed(line, "alive id is not an integer"))?;
                Ok(Update::Alive(ids))
            }
            Some(CMD_FSEQ) => {
                let seq = tokens
                    .next()
                    .and_then(|token| token.parse::<i64>().ok())
                    .ok_or_else(|| DecodeError::malformed(line, "fseq needs a signed integer"))?;
                if tokens.next().is_some() {
                    return Err(DecodeError::malformed(line, "fseq takes one argument"));
                }
                Ok(Update::Complete(seq))
            }
            Some(CMD_SET) => {
                let id = tokens
                    .next()
                    .and_then(|token| token.parse::<u64>().ok())
                    .ok_or_else(|| DecodeError::malformed(line, "set id is not an integer"))?;
                let x = tokens
                    .next()
                    .and_then(parse_coordinate)
                    .ok_or_else(|| DecodeError::malformed(line, "set x is not <int>.<digits>"))?;
                let y = tokens
                    .next()
                    .and_then(parse_coordinate)
                    .ok_or_else(|| DecodeError::malformed(line, "set y is not <int>.<digits>"))?;

                let blob = Blob::new(id, x, y);
                sink.put(blob)?;
                Ok(Update::Set(blob))
            }
            _ => Err(DecodeError::malformed(line, "unknown command")),
        }
    }
}

/// Parses `<int>.<digits>` and keeps the integer part.
fn parse_coordinate(token: &str) -> Option<i64> {
    let (whole, fraction) = token.split_once('.')?;
    if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let digits = whole.strip_prefix('-').unwrap_or(whole);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    whole.parse().ok()
}

fn clip(line: &str) -> String {
    if line.len() <= ERROR_LINE_LIMIT {
        return line.to_string();
    }
    let mut end = ERROR_LINE_LIMIT;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &line[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_ALIVE_BLOBS;

    #[derive(Default)]
    struct VecSink(Vec<Blob>);

    impl BlobSink for VecSink {
        fn put(&mut self, blob: Blob) -> Result<(), DecodeError> {
            if self.0.len() >= MAX_ALIVE_BLOBS {
                return Err(DecodeError::Overflow {
                    capacity: MAX_ALIVE_BLOBS,
                });
            }
            self.0.push(blob);
            Ok(())
        }
    }

    fn decode(line: &str) -> (Result<Update, DecodeError>, VecSink) {
        let mut sink = VecSink::default();
        let result = Decoder::default().decode(line, &mut sink);
        (result, sink)
    }

    #[test]
    fn set_discards_fractional_digits() {
        let (result, sink) = decode("/tuio/2Dcur set 9 12.500000 34.250000");
        assert_eq!(result, Ok(Update::Set(Blob::new(9, 12, 34))));
        assert_eq!(sink.0, vec![Blob::new(9, 12, 34)]);
    }

    #[test]
    fn set_ignores_trailing_velocity_fields() {
        let (result, _) =
            decode("/tuio/2Dcur set 4 0.482812 0.412500 0.000000 0.000000 -7.122507\n");
        assert_eq!(result, Ok(Update::Set(Blob::new(4, 0, 0))));
    }

    #[test]
    fn set_accepts_negative_integer_part() {
        let (result, _) = decode("/tuio/2Dcur set 2 -3.5 7.0");
        assert_eq!(result, Ok(Update::Set(Blob::new(2, -3, 7))));
    }

    #[test]
    fn set_rejects_coordinates_without_fraction() {
        let (result, sink) = decode("/tuio/2Dcur set 2 3 7.0");
        assert!(matches!(
            result,
            Err(DecodeError::MalformedMessage { .. })
        ));
        assert!(sink.0.is_empty());
    }

    #[test]
    fn set_rejects_missing_arguments() {
        let (result, _) = decode("/tuio/2Dcur set 2 3.0");
        assert_eq!(result.unwrap_err().code(), "malformed_message");
    }

    #[test]
    fn fseq_returns_complete_with_signed_sequence() {
        assert_eq!(decode("/tuio/2Dcur fseq 1482").0, Ok(Update::Complete(1482)));
        assert_eq!(decode("/tuio/2Dcur fseq -1").0, Ok(Update::Complete(-1)));
    }

    #[test]
    fn fseq_without_number_is_malformed() {
        assert_eq!(decode("/tuio/2Dcur fseq").0.unwrap_err().code(), "malformed_message");
        assert_eq!(
            decode("/tuio/2Dcur fseq 1 2").0.unwrap_err().code(),
            "malformed_message"
        );
    }

    #[test]
    fn alive_lists_ids_and_allows_empty_list() {
        assert_eq!(decode("/tuio/2Dcur alive 4 7").0, Ok(Update::Alive(vec![4, 7])));
        assert_eq!(decode("/tuio/2Dcur alive").0, Ok(Update::Alive(vec![])));
    }

    #[test]
    fn alive_with_garbage_id_is_malformed() {
        assert_eq!(
            decode("/tuio/2Dcur alive 4 x").0.unwrap_err().code(),
            "malformed_message"
        );
    }

    #[test]
    fn other_profiles_are_unknown() {
        let (result, _) = decode("/tuio/2Dobj set 1 0.1 0.2");
        assert!(matches!(result, Err(DecodeError::UnknownProfile { .. })));
    }

    #[test]
    fn unknown_command_is_malformed() {
        assert_eq!(
            decode("/tuio/2Dcur source reactivision").0.unwrap_err().code(),
            "malformed_message"
        );
        assert_eq!(decode("/tuio/2Dcur").0.unwrap_err().code(), "malformed_message");
        assert_eq!(
            decode("/tuio/2Dcurset 1 1.0 1.0").0.unwrap_err().code(),
            "malformed_message"
        );
    }

    #[test]
    fn overflow_propagates_from_sink() {
        let decoder = Decoder::default();
        let mut sink = VecSink::default();
        for id in 0..MAX_ALIVE_BLOBS as u64 {
            decoder
                .decode(&format!("/tuio/2Dcur set {} 1.0 1.0", id), &mut sink)
                .expect("within capacity");
        }
        let result = decoder.decode("/tuio/2Dcur set 99 1.0 1.0", &mut sink);
        assert_eq!(
            result,
            Err(DecodeError::Overflow {
                capacity: MAX_ALIVE_BLOBS
            })
        );
    }

    #[test]
    fn custom_profile_is_honored() {
        let decoder = Decoder::new("/tuio/2Dblb");
        let mut sink = VecSink::default();
        assert_eq!(
            decoder.decode("/tuio/2Dblb fseq 3", &mut sink),
            Ok(Update::Complete(3))
        );
        assert!(decoder.decode("/tuio/2Dcur fseq 3", &mut sink).is_err());
    }

    #[test]
    fn long_lines_are_clipped_in_errors() {
        let line = format!("/bogus {}", "x".repeat(400));
        let Err(DecodeError::UnknownProfile { line: kept }) = decode(&line).0 else {
            panic!("expected unknown profile");
        };
        assert!(kept.len() <= ERROR_LINE_LIMIT + 3);
        assert!(kept.ends_with("..."));
    }
}
