//! Error types for the certificate check.
//!
//! This module defines the failures that can occur while retrieving the
//! peer certificate. Every variant ends up as an UNKNOWN check result at
//! the outermost boundary; the variants exist so the message can say what
//! actually went wrong.

use std::fmt;
use std::io;

/// Error type for certificate retrieval failures.
#[derive(Debug)]
pub enum CheckError {
    /// DNS resolution failed for the given hostname
    DnsResolution {
        /// The hostname that failed to resolve
        hostname: String,
        /// Why resolution failed
        details: String,
    },

    /// TCP connection failed to the target address
    ConnectionFailed {
        /// The address (host:port) that connection failed to
        address: String,
        /// The underlying I/O error
        source: io::Error,
    },

    /// TLS handshake failed
    HandshakeFailed {
        /// Details about why the handshake failed
        details: String,
    },

    /// The plaintext STARTTLS exchange did not reach the TLS upgrade
    StartTlsFailed {
        /// The protocol being negotiated
        protocol: String,
        /// What the peer said, or why the exchange broke off
        details: String,
    },

    /// The handshake completed but the peer presented no certificate
    NoPeerCertificate,

    /// Certificate fields were present but could not be extracted
    CertificateParse {
        /// Description of what went wrong
        reason: String,
    },

    /// Invalid input provided to the check
    InvalidInput {
        /// Which field/parameter was invalid
        field: String,
        /// Why it was invalid
        reason: String,
    },

    /// OpenSSL error occurred
    OpenSslError {
        /// The underlying OpenSSL error
        details: String,
    },

    /// Generic I/O error
    IoError {
        /// The underlying I/O error
        source: io::Error,
    },
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DnsResolution { hostname, details } => {
                write!(f, "Failed to resolve hostname {}: {}", hostname, details)
            }
            Self::ConnectionFailed { address, source } => {
                write!(f, "Connection failed to {}: {}", address, source)
            }
            Self::HandshakeFailed { details } => {
                write!(f, "TLS handshake failed: {}", details)
            }
            Self::StartTlsFailed { protocol, details } => {
                write!(f, "StartTLS {} negotiation failed: {}", protocol, details)
            }
            Self::NoPeerCertificate => {
                write!(f, "Got no output from openssl, maybe could not connect.")
            }
            Self::CertificateParse { reason } => {
                write!(f, "Certificate error: {}", reason)
            }
            Self::InvalidInput { field, reason } => {
                write!(f, "Invalid input for '{}': {}", field, reason)
            }
            Self::OpenSslError { details } => {
                write!(f, "OpenSSL error: {}", details)
            }
            Self::IoError { source } => {
                write!(f, "I/O error: {}", source)
            }
        }
    }
}

impl std::error::Error for CheckError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ConnectionFailed { source, .. } => Some(source),
            Self::IoError { source } => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for CheckError {
    fn from(e: io::Error) -> Self {
        Self::IoError { source: e }
    }
}

impl From<openssl::error::ErrorStack> for CheckError {
    fn from(e: openssl::error::ErrorStack) -> Self {
        Self::OpenSslError {
            details: e.to_string(),
        }
    }
}

impl<S: fmt::Debug> From<openssl::ssl::HandshakeError<S>> for CheckError {
    fn from(e: openssl::ssl::HandshakeError<S>) -> Self {
        Self::HandshakeFailed {
            details: format!("{}", e),
        }
    }
}
