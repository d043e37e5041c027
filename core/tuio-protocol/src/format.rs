//! Composition of OSC messages into protocol lines.
//!
//! The network side receives a path plus typed arguments and flattens them
//! into `"<path> <arg0> <arg1> ..."`. Floats print with six decimals, which is
//! the form the decoder expects for coordinates.

use std::fmt::Write as _;

use thiserror::Error;
use tracing::warn;

use crate::MAX_LINE_BYTES;

/// Bytes of the shared buffer held back for the newline and terminator.
const LINE_RESERVED_BYTES: usize = 2;

/// One typed OSC argument.
#[derive(Debug, Clone, PartialEq)]
pub enum OscArg {
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Str(String),
    Symbol(String),
    Char(char),
    /// Not rendered; logged and skipped.
    TimeTag(u64),
    /// A type tag this formatter does not know; logged and skipped.
    Unknown(char),
}

impl OscArg {
    pub fn type_tag(&self) -> char {
        match self {
            OscArg::Int32(_) => 'i',
            OscArg::Int64(_) => 'h',
            OscArg::Float32(_) => 'f',
            OscArg::Float64(_) => 'd',
            OscArg::Str(_) => 's',
            OscArg::Symbol(_) => 'S',
            OscArg::Char(_) => 'c',
            OscArg::TimeTag(_) => 't',
            OscArg::Unknown(tag) => *tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("composed line is {len} bytes; limit is {max}")]
    LineTooLong { len: usize, max: usize },

    #[error("argument {value:?} does not match type tag '{tag}'")]
    BadArgument { tag: char, value: String },

    #[error("type string declares {expected} arguments but {got} were given")]
    ArityMismatch { expected: usize, got: usize },
}

/// Largest line [`compose_line`] produces.
pub const fn max_line_len() -> usize {
    MAX_LINE_BYTES - LINE_RESERVED_BYTES
}

/// Flattens `path` and `args` into one protocol line (no trailing newline).
pub fn compose_line(path: &str, args: &[OscArg]) -> Result<String, FormatError> {
    let mut line = String::with_capacity(path.len() + args.len() * 10);
    line.push_str(path);

    for arg in args {
        let _ = match arg {
            OscArg::Int32(value) => write!(line, " {}", value),
            OscArg::Int64(value) => write!(line, " {}", value),
            OscArg::Float32(value) => write!(line, " {:.6}", value),
            OscArg::Float64(value) => write!(line, " {:.6}", value),
            OscArg::Str(value) | OscArg::Symbol(value) => write!(line, " {}", value),
            OscArg::Char(value) => write!(line, " {}", value),
            OscArg::TimeTag(_) => {
                warn!(path = %path, "OSC time tags are not supported; argument skipped");
                Ok(())
            }
            OscArg::Unknown(tag) => {
                warn!(path = %path, tag = %tag, "Unknown OSC type tag; argument skipped");
                Ok(())
            }
        };

        if line.len() > max_line_len() {
            return Err(FormatError::LineTooLong {
                len: line.len(),
                max: max_line_len(),
            });
        }
    }

    if line.len() > max_line_len() {
        return Err(FormatError::LineTooLong {
            len: line.len(),
            max: max_line_len(),
        });
    }
    Ok(line)
}

/// Builds typed arguments from an OSC type string and textual values, e.g.
/// `parse_args("sifff", &["set", "4", "0.5", "0.25", "0.0"])`.
pub fn parse_args(types: &str, values: &[&str]) -> Result<Vec<OscArg>, FormatError> {
    let expected = types.chars().count();
    if expected != values.len() {
        return Err(FormatError::ArityMismatch {
            expected,
            got: values.len(),
        });
    }

    types
        .chars()
        .zip(values)
        .map(|(tag, value)| parse_arg(tag, value))
        .collect()
}

fn parse_arg(tag: char, value: &str) -> Result<OscArg, FormatError> {
    let bad = || FormatError::BadArgument {
        tag,
        value: value.to_string(),
    };
    let arg = match tag {
        'i' => OscArg::Int32(value.parse().map_err(|_| bad())?),
        'h' => OscArg::Int64(value.parse().map_err(|_| bad())?),
        'f' => OscArg::Float32(value.parse().map_err(|_| bad())?),
        'd' => OscArg::Float64(value.parse().map_err(|_| bad())?),
        's' => OscArg::Str(value.to_string()),
        'S' => OscArg::Symbol(value.to_string()),
        'c' => {
            let mut chars = value.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => OscArg::Char(c),
                _ => return Err(bad()),
            }
        }
        't' => OscArg::TimeTag(value.parse().map_err(|_| bad())?),
        other => OscArg::Unknown(other),
    };
    Ok(arg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Blob, BlobSink, DecodeError, Decoder, Update};

    #[test]
    fn composes_cursor_set_line() {
        let args = vec![
            OscArg::Str("set".to_string()),
            OscArg::Int32(4),
            OscArg::Float32(0.5),
            OscArg::Float32(0.25),
        ];
        assert_eq!(
            compose_line("/tuio/2Dcur", &args).unwrap(),
            "/tuio/2Dcur set 4 0.500000 0.250000"
        );
    }

    #[test]
    fn renders_every_supported_type() {
        let args = vec![
            OscArg::Int64(-9_000_000_000),
            OscArg::Float64(1.5),
            OscArg::Symbol("sym".to_string()),
            OscArg::Char('z'),
        ];
        assert_eq!(
            compose_line("/p", &args).unwrap(),
            "/p -9000000000 1.500000 sym z"
        );
    }

    #[test]
    fn time_tags_and_unknown_tags_are_skipped() {
        let args = vec![OscArg::TimeTag(42), OscArg::Unknown('m'), OscArg::Int32(1)];
        assert_eq!(compose_line("/p", &args).unwrap(), "/p 1");
    }

    #[test]
    fn overlong_lines_are_rejected() {
        let args = vec![OscArg::Str("x".repeat(MAX_LINE_BYTES))];
        let err = compose_line("/p", &args).unwrap_err();
        assert!(matches!(err, FormatError::LineTooLong { max, .. } if max == max_line_len()));
    }

    #[test]
    fn parse_args_follows_type_string() {
        let args = parse_args("sif", &["set", "4", "0.5"]).unwrap();
        assert_eq!(
            args,
            vec![
                OscArg::Str("set".to_string()),
                OscArg::Int32(4),
                OscArg::Float32(0.5)
            ]
        );
    }

    #[test]
    fn parse_args_rejects_mismatches() {
        assert_eq!(
            parse_args("ii", &["1"]),
            Err(FormatError::ArityMismatch {
                expected: 2,
                got: 1
            })
        );
        assert!(matches!(
            parse_args("i", &["one"]),
            Err(FormatError::BadArgument { tag: 'i', .. })
        ));
        assert!(parse_args("c", &["ab"]).is_err());
    }

    struct One(Option<Blob>);

    impl BlobSink for One {
        fn put(&mut self, blob: Blob) -> Result<(), DecodeError> {
            self.0 = Some(blob);
            Ok(())
        }
    }

    #[test]
    fn composed_lines_decode() {
        let args = parse_args("sifffff", &["set", "12", "640.75", "480.5", "0", "0", "0"])
            .expect("valid args");
        let line = compose_line("/tuio/2Dcur", &args).unwrap();

        let mut sink = One(None);
        let update = Decoder::default().decode(&line, &mut sink).unwrap();
        assert_eq!(update, Update::Set(Blob::new(12, 640, 480)));
    }
}
