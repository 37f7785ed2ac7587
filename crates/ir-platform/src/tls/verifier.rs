use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, warn};

use ir_core::crypto::{CertificateFingerprint, CertificatePinner};

use super::error::TrustError;

#[derive(Debug)]
enum Pins {
    /// One fingerprint, whatever name the client dialed.
    Single(CertificateFingerprint),
    /// Pins scoped per host.
    Hosts(CertificatePinner),
}

/// Server certificate verifier that trusts exactly the pinned leaf.
///
/// No CA chain, validity period or hostname checks are made: the peer's
/// identity is its certificate fingerprint. Handshake signatures are still
/// verified with the provider's algorithms.
#[derive(Debug)]
pub struct PinnedCertVerifier {
    pins: Pins,
    provider: Arc<CryptoProvider>,
}

impl PinnedCertVerifier {
    pub fn new(expected: CertificateFingerprint, provider: Arc<CryptoProvider>) -> Self {
        Self {
            pins: Pins::Single(expected),
            provider,
        }
    }

    pub fn for_hosts(pinner: CertificatePinner, provider: Arc<CryptoProvider>) -> Self {
        Self {
            pins: Pins::Hosts(pinner),
            provider,
        }
    }

    /// Accept `chain` when its leaf matches the pin for `host`.
    pub fn check_server_trusted(
        &self,
        chain: &[CertificateDer<'_>],
        host: &str,
    ) -> Result<(), TrustError> {
        let leaf = chain.first().ok_or(TrustError::EmptyChain)?;
        let actual = CertificateFingerprint::from_der(leaf.as_ref());

        match &self.pins {
            Pins::Single(expected) => {
                if *expected == actual {
                    Ok(())
                } else {
                    Err(TrustError::FingerprintMismatch {
                        expected: expected.to_colon_hex(),
                        actual: actual.to_colon_hex(),
                    })
                }
            }
            Pins::Hosts(pinner) => pinner.check(host, leaf.as_ref()).map_err(|e| {
                debug!(host, error = %e, "Host pin check failed");
                TrustError::FingerprintMismatch {
                    expected: pinner
                        .pins_for(host)
                        .iter()
                        .map(CertificateFingerprint::to_colon_hex)
                        .collect::<Vec<_>>()
                        .join(", "),
                    actual: actual.to_colon_hex(),
                }
            }),
        }
    }
}

fn host_of(server_name: &ServerName<'_>) -> String {
    match server_name {
        ServerName::DnsName(name) => name.as_ref().to_string(),
        ServerName::IpAddress(ip) => IpAddr::from(*ip).to_string(),
        _ => String::new(),
    }
}

impl ServerCertVerifier for PinnedCertVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let host = host_of(server_name);
        let mut chain = Vec::with_capacity(1 + intermediates.len());
        chain.push(end_entity.clone());
        chain.extend(intermediates.iter().cloned());

        match self.check_server_trusted(&chain, &host) {
            Ok(()) => {
                debug!(host = %host, "Pinned certificate accepted");
                Ok(ServerCertVerified::assertion())
            }
            Err(e) => {
                warn!(host = %host, error = %e, "Rejecting server certificate");
                Err(e.into())
            }
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
