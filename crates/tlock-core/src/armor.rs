//! ASCII armor for binary envelopes.
//!
//! ```text
//! -----BEGIN AGE ENCRYPTED FILE-----
//! <padded base64, chunk_width columns per line>
//! <final line, always shorter than chunk_width, possibly empty>
//! -----END AGE ENCRYPTED FILE-----
//! ```
//!
//! Decoding is strict: a full-width final line, an overlong line or a large run
//! of trailing whitespace is rejected rather than tolerated.

use crate::base64::{decode_padded, encode_padded};
use crate::error::{Result, TlockError};

pub const HEADER: &str = "-----BEGIN AGE ENCRYPTED FILE-----";
pub const FOOTER: &str = "-----END AGE ENCRYPTED FILE-----";

/// Default line width of the armored body.
pub const DEFAULT_CHUNK_WIDTH: usize = 64;

/// Most trailing whitespace characters `decode` will trim.
pub const MAX_TRAILING_WHITESPACE: usize = 1024;

/// Armor `data` with `chunk_width` base64 characters per line.
pub fn encode(data: &[u8], chunk_width: usize) -> Result<String> {
    check_width(chunk_width)?;
    let encoded = encode_padded(data);

    let mut lines: Vec<&str> = Vec::with_capacity(encoded.len() / chunk_width + 2);
    let mut rest = encoded.as_str();
    while rest.len() >= chunk_width {
        let (line, tail) = rest.split_at(chunk_width);
        lines.push(line);
        rest = tail;
    }
    // Always shorter than a full line, so the final line marks the end.
    lines.push(rest);

    let mut out = String::with_capacity(HEADER.len() + FOOTER.len() + encoded.len() + lines.len() + 2);
    out.push_str(HEADER);
    out.push('\n');
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(FOOTER);
    out.push('\n');
    Ok(out)
}

/// Decode armored text produced with `chunk_width`.
pub fn decode(text: &str, chunk_width: usize) -> Result<Vec<u8>> {
    check_width(chunk_width)?;

    let text = text.trim_start();
    let trimmed = text.trim_end();
    let trailing = text[trimmed.len()..].chars().count();
    if trailing > MAX_TRAILING_WHITESPACE {
        return Err(TlockError::ExcessiveWhitespace {
            got: trailing,
            max: MAX_TRAILING_WHITESPACE,
        });
    }

    if !trimmed.starts_with(HEADER) {
        return Err(TlockError::MissingHeader);
    }
    if !trimmed.ends_with(FOOTER) || trimmed.len() < HEADER.len() + FOOTER.len() {
        return Err(TlockError::MissingFooter);
    }

    let body = &trimmed[HEADER.len()..trimmed.len() - FOOTER.len()];
    let body = strip_line_break_prefix(body).ok_or(TlockError::MissingHeader)?;
    let body = strip_line_break_suffix(body).ok_or(TlockError::MissingFooter)?;

    let lines: Vec<&str> = body
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();
    let last = lines.len() - 1;

    let mut encoded = String::with_capacity(body.len());
    for (i, line) in lines.iter().enumerate() {
        if line.len() > chunk_width {
            return Err(TlockError::LineTooLong {
                line: i + 1,
                got: line.len(),
                max: chunk_width,
            });
        }
        if i == last {
            if line.len() == chunk_width {
                return Err(TlockError::LastLineTooLong {
                    got: line.len(),
                    width: chunk_width,
                });
            }
        } else if line.len() < chunk_width {
            return Err(TlockError::LineTooShort {
                line: i + 1,
                got: line.len(),
                width: chunk_width,
            });
        }
        encoded.push_str(line);
    }

    decode_padded(&encoded)
}

/// Cheap check for the armor header, ignoring leading whitespace.
pub fn is_probably_armored(text: &str) -> bool {
    text.trim_start().starts_with(HEADER)
}

fn check_width(chunk_width: usize) -> Result<()> {
    if chunk_width == 0 {
        return Err(TlockError::InvalidChunkWidth(chunk_width));
    }
    Ok(())
}

fn strip_line_break_prefix(s: &str) -> Option<&str> {
    s.strip_prefix("\r\n").or_else(|| s.strip_prefix('\n'))
}

fn strip_line_break_suffix(s: &str) -> Option<&str> {
    s.strip_suffix("\r\n").or_else(|| s.strip_suffix('\n'))
}
