//! Stanzas and the age v1 text header that carries them.
//!
//! ```text
//! age-encryption.org/v1
//! -> <type> <arg>...
//! <body, unpadded base64, 64 columns, final line always shorter>
//! --- <unpadded base64 MAC>
//! ```

use crate::base64::{decode_unpadded, encode_unpadded};
use crate::error::{Result, TlockError};

/// First line of every envelope.
pub const VERSION_LINE: &str = "age-encryption.org/v1";

const STANZA_PREFIX: &str = "-> ";
const MAC_PREFIX: &str = "--- ";
const MAC_MARKER: &str = "---";

/// Column width of stanza bodies.
pub const BODY_COLUMNS: usize = 64;

/// Length of the header MAC.
pub const MAC_SIZE: usize = 32;

/// A typed key-wrapping record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stanza {
    pub stanza_type: String,
    pub args: Vec<String>,
    pub body: Vec<u8>,
}

impl Stanza {
    pub fn new(stanza_type: impl Into<String>, args: Vec<String>, body: Vec<u8>) -> Self {
        Self {
            stanza_type: stanza_type.into(),
            args,
            body,
        }
    }

    /// Append this stanza's header lines to `out`.
    pub fn write_to(&self, out: &mut String) -> Result<()> {
        check_arg(&self.stanza_type).map_err(TlockError::MalformedStanza)?;
        for arg in &self.args {
            check_arg(arg).map_err(TlockError::MalformedStanza)?;
        }

        out.push_str(STANZA_PREFIX);
        out.push_str(&self.stanza_type);
        for arg in &self.args {
            out.push(' ');
            out.push_str(arg);
        }
        out.push('\n');

        let body = encode_unpadded(&self.body);
        let mut rest = body.as_str();
        while rest.len() >= BODY_COLUMNS {
            let (line, tail) = rest.split_at(BODY_COLUMNS);
            out.push_str(line);
            out.push('\n');
            rest = tail;
        }
        out.push_str(rest);
        out.push('\n');
        Ok(())
    }
}

/// Arguments are non-empty runs of printable, non-space ASCII.
fn check_arg(arg: &str) -> std::result::Result<(), String> {
    if arg.is_empty() {
        return Err("empty stanza argument".into());
    }
    if let Some(c) = arg.chars().find(|c| !c.is_ascii_graphic()) {
        return Err(format!("invalid character {c:?} in stanza argument"));
    }
    Ok(())
}

/// Serialize the header up to and including the `---` marker, the MAC input.
pub fn header_mac_input(stanzas: &[Stanza]) -> Result<String> {
    let mut out = String::new();
    out.push_str(VERSION_LINE);
    out.push('\n');
    for stanza in stanzas {
        stanza.write_to(&mut out)?;
    }
    out.push_str(MAC_MARKER);
    Ok(out)
}

/// A parsed header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHeader {
    pub stanzas: Vec<Stanza>,
    pub mac: [u8; MAC_SIZE],
    /// Byte offset of the payload that follows the header.
    pub payload_offset: usize,
}

/// Parse an envelope header from the start of `input`.
pub fn parse_header(input: &[u8]) -> Result<ParsedHeader> {
    let mut lines = Lines { input, pos: 0 };

    if lines.next_line()? != VERSION_LINE {
        return Err(TlockError::MalformedHeader("unsupported version line".into()));
    }

    let mut stanzas = Vec::new();
    loop {
        let line = lines.next_line()?;
        if let Some(rest) = line.strip_prefix(STANZA_PREFIX) {
            stanzas.push(parse_stanza(rest, &mut lines)?);
        } else if let Some(mac) = line.strip_prefix(MAC_PREFIX) {
            let mac = decode_unpadded(mac)
                .map_err(|e| TlockError::MalformedHeader(format!("MAC: {e}")))?;
            let mac: [u8; MAC_SIZE] = mac.try_into().map_err(|m: Vec<u8>| {
                TlockError::MalformedHeader(format!("MAC must be {MAC_SIZE} bytes, got {}", m.len()))
            })?;
            if stanzas.is_empty() {
                return Err(TlockError::MalformedHeader("no stanzas".into()));
            }
            return Ok(ParsedHeader {
                stanzas,
                mac,
                payload_offset: lines.pos,
            });
        } else {
            return Err(TlockError::MalformedHeader(format!(
                "unexpected line {:?}",
                truncate_for_display(line)
            )));
        }
    }
}

fn parse_stanza(args_line: &str, lines: &mut Lines<'_>) -> Result<Stanza> {
    let mut parts = args_line.split(' ');
    let mut next_arg = || -> Result<Option<String>> {
        match parts.next() {
            None => Ok(None),
            Some(arg) => {
                check_arg(arg).map_err(TlockError::MalformedHeader)?;
                Ok(Some(arg.to_string()))
            }
        }
    };

    let stanza_type = next_arg()?
        .ok_or_else(|| TlockError::MalformedHeader("stanza without type".into()))?;
    let mut args = Vec::new();
    while let Some(arg) = next_arg()? {
        args.push(arg);
    }

    let mut encoded = String::new();
    loop {
        let line = lines.next_line()?;
        if line.len() > BODY_COLUMNS {
            return Err(TlockError::MalformedHeader(format!(
                "stanza body line of {} columns",
                line.len()
            )));
        }
        encoded.push_str(line);
        if line.len() < BODY_COLUMNS {
            break;
        }
    }
    let body = decode_unpadded(&encoded)
        .map_err(|e| TlockError::MalformedHeader(format!("stanza body: {e}")))?;

    Ok(Stanza {
        stanza_type,
        args,
        body,
    })
}

struct Lines<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lines<'a> {
    /// Next `\n`-terminated line, without the terminator.
    fn next_line(&mut self) -> Result<&'a str> {
        let rest = &self.input[self.pos..];
        let end = rest
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| TlockError::MalformedHeader("unexpected end of header".into()))?;
        let line = std::str::from_utf8(&rest[..end])
            .map_err(|_| TlockError::MalformedHeader("non-UTF-8 header line".into()))?;
        self.pos += end + 1;
        Ok(line)
    }
}

fn truncate_for_display(line: &str) -> &str {
    match line.char_indices().nth(32) {
        Some((i, _)) => &line[..i],
        None => line,
    }
}
