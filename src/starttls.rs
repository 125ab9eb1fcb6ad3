//! Plaintext STARTTLS negotiation.
//!
//! Mail-style protocols begin in cleartext and switch to TLS after an
//! in-band upgrade exchange. The functions here drive that exchange up to
//! the point where the peer has agreed to switch; the actual handshake is
//! performed by the caller on the same stream afterwards.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;

use strum_macros::{Display, EnumString};

use crate::error::CheckError;

/// Name sent in the SMTP EHLO line.
const CLIENT_NAME: &str = "certchecker";

/// Supported plaintext upgrade protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum StartTlsProtocol {
    Smtp,
    Imap,
    Pop3,
}

/// Runs the protocol-specific upgrade exchange on a freshly connected
/// stream. On success the peer is ready for a TLS handshake.
pub fn negotiate(stream: &TcpStream, protocol: StartTlsProtocol) -> Result<(), CheckError> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut writer = stream;
    match protocol {
        StartTlsProtocol::Smtp => negotiate_smtp(&mut reader, &mut writer),
        StartTlsProtocol::Imap => negotiate_imap(&mut reader, &mut writer),
        StartTlsProtocol::Pop3 => negotiate_pop3(&mut reader, &mut writer),
    }
}

fn negotiate_smtp<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
) -> Result<(), CheckError> {
    expect_smtp_reply(reader, "220")?;
    writer.write_all(format!("EHLO {}\r\n", CLIENT_NAME).as_bytes())?;
    expect_smtp_reply(reader, "250")?;
    writer.write_all(b"STARTTLS\r\n")?;
    expect_smtp_reply(reader, "220")?;
    Ok(())
}

/// Consumes one SMTP reply, which may span several lines. Continuation
/// lines carry a `-` right after the status code, the final line a space.
fn expect_smtp_reply<R: BufRead>(reader: &mut R, code: &str) -> Result<(), CheckError> {
    loop {
        let line = read_line(reader, StartTlsProtocol::Smtp)?;
        if !line.starts_with(code) {
            return Err(unexpected_reply(StartTlsProtocol::Smtp, code, &line));
        }
        if line.as_bytes().get(3) != Some(&b'-') {
            return Ok(());
        }
    }
}

fn negotiate_imap<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
) -> Result<(), CheckError> {
    let greeting = read_line(reader, StartTlsProtocol::Imap)?;
    if !greeting.starts_with("* OK") {
        return Err(unexpected_reply(StartTlsProtocol::Imap, "* OK", &greeting));
    }
    writer.write_all(b"a001 STARTTLS\r\n")?;
    // Untagged lines may precede the tagged reply.
    loop {
        let line = read_line(reader, StartTlsProtocol::Imap)?;
        if line.starts_with("a001 ") {
            if line.starts_with("a001 OK") {
                return Ok(());
            }
            return Err(unexpected_reply(StartTlsProtocol::Imap, "a001 OK", &line));
        }
    }
}

fn negotiate_pop3<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
) -> Result<(), CheckError> {
    let greeting = read_line(reader, StartTlsProtocol::Pop3)?;
    if !greeting.starts_with("+OK") {
        return Err(unexpected_reply(StartTlsProtocol::Pop3, "+OK", &greeting));
    }
    writer.write_all(b"STLS\r\n")?;
    let reply = read_line(reader, StartTlsProtocol::Pop3)?;
    if !reply.starts_with("+OK") {
        return Err(unexpected_reply(StartTlsProtocol::Pop3, "+OK", &reply));
    }
    Ok(())
}

fn read_line<R: BufRead>(reader: &mut R, protocol: StartTlsProtocol) -> Result<String, CheckError> {
    let mut line = String::new();
    let read = reader.read_line(&mut line)?;
    if read == 0 {
        return Err(CheckError::StartTlsFailed {
            protocol: protocol.to_string(),
            details: "connection closed during negotiation".to_string(),
        });
    }
    Ok(line.trim_end().to_string())
}

fn unexpected_reply(protocol: StartTlsProtocol, expected: &str, got: &str) -> CheckError {
    CheckError::StartTlsFailed {
        protocol: protocol.to_string(),
        details: format!("expected '{}' but peer replied '{}'", expected, got),
    }
}
