//! TLS certificate retrieval for monitoring checks.
//!
//! Connects to a TLS endpoint (optionally after a plaintext STARTTLS
//! upgrade), reads the peer's leaf certificate and exposes the two facts
//! the check needs: the expiry timestamp and the subject common name.
//! The verdict logic lives in [`check`].

pub mod check;
pub mod config;
pub mod error;
pub mod starttls;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use openssl::nid::Nid;
use openssl::ssl::{Ssl, SslContext, SslMethod, SslVerifyMode};
use openssl::x509::X509;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

pub use crate::error::CheckError;
pub use crate::starttls::StartTlsProtocol;

/// The endpoint a single check probes. Built once from configuration.
#[derive(Debug, Clone)]
pub struct Target {
    pub host: String,
    pub port: u16,
    pub starttls: Option<StartTlsProtocol>,
    /// Bounds connect, read and write on the probe socket.
    pub timeout: Duration,
}

impl Target {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// What the handshake revealed about the peer's leaf certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateFacts {
    /// Certificate `notAfter`, in the certificate's own timezone (GMT).
    pub not_after: DateTime<Utc>,
    /// The `CN=` component of the subject DN, trimmed.
    pub subject_common_name: String,
}

impl CertificateFacts {
    /// Performs one connection attempt against the target and extracts
    /// the leaf certificate facts.
    pub fn from_target(target: &Target) -> Result<CertificateFacts, CheckError> {
        let mut context = SslContext::builder(SslMethod::tls())?;
        context.set_verify(SslVerifyMode::empty());
        let context = context.build();

        let mut connector = Ssl::new(&context)?;
        connector.set_hostname(&target.host)?;

        let address = target.address();
        let socket_addr = address
            .to_socket_addrs()
            .map_err(|e| CheckError::DnsResolution {
                hostname: target.host.clone(),
                details: e.to_string(),
            })?
            .next()
            .ok_or_else(|| CheckError::DnsResolution {
                hostname: target.host.clone(),
                details: "no addresses returned".to_string(),
            })?;

        let tcp_stream = TcpStream::connect_timeout(&socket_addr, target.timeout).map_err(|e| {
            CheckError::ConnectionFailed {
                address: address.clone(),
                source: e,
            }
        })?;
        tcp_stream.set_read_timeout(Some(target.timeout))?;
        tcp_stream.set_write_timeout(Some(target.timeout))?;

        if let Some(protocol) = target.starttls {
            starttls::negotiate(&tcp_stream, protocol)?;
        }

        let stream = connector.connect(tcp_stream)?;

        let cert = stream
            .ssl()
            .peer_certificate()
            .ok_or(CheckError::NoPeerCertificate)?;

        facts_from_certificate(&cert)
    }
}

fn facts_from_certificate(cert: &X509) -> Result<CertificateFacts, CheckError> {
    let cn_entry = cert
        .subject_name()
        .entries_by_nid(Nid::COMMONNAME)
        .next()
        .ok_or_else(|| CheckError::CertificateParse {
            reason: "subject has no common name".to_string(),
        })?;
    let subject_common_name = cn_entry
        .data()
        .as_utf8()
        .map_err(|e| CheckError::CertificateParse {
            reason: format!("subject common name is not valid UTF-8: {}", e),
        })?
        .to_string()
        .trim()
        .to_string();

    let not_after = parse_asn1_time(&cert.not_after().to_string())?;

    Ok(CertificateFacts {
        not_after,
        subject_common_name,
    })
}

/// Parses openssl's ASN.1 time rendering, e.g. `May 12 23:59:59 2026 GMT`.
/// ASN.1 validity times are always GMT; anything else is treated as a
/// parse failure. chrono's `%Z` is format-only, so the zone token is
/// matched by hand.
fn parse_asn1_time(raw: &str) -> Result<DateTime<Utc>, CheckError> {
    let parse_failure = || CheckError::CertificateParse {
        reason: format!("could not parse expiration date: {}", raw),
    };

    let (datetime, zone) = raw.trim().rsplit_once(' ').ok_or_else(parse_failure)?;
    if zone != "GMT" && zone != "UTC" {
        return Err(parse_failure());
    }
    let naive = NaiveDateTime::parse_from_str(datetime, "%b %e %H:%M:%S %Y")
        .map_err(|_| parse_failure())?;
    Ok(Utc.from_utc_datetime(&naive))
}
