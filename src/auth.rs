//! `Authorizer` — pure mapping from an already-verified peer certificate to
//! a [`Role`]. Trust verification itself happens inside the
//! TLS handshake (`transport` module); this only reads identity attributes
//! out of the certificate that handshake already accepted.

use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer;

use crate::error::AuthError;

const MAX_COMMON_NAME_LEN: usize = 63;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Operator,
    Viewer,
    /// Reserved sentinel: no current OU mapping produces it,
    /// but the server-side rejection path for it is kept live.
    Unauthorized,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Operator => "OPERATOR",
            Role::Viewer => "VIEWER",
            Role::Unauthorized => "UNAUTHORIZED",
        }
    }

    fn from_organizational_unit(ou: Option<&str>) -> Role {
        match ou {
            Some(ou) if ou.eq_ignore_ascii_case("ADMIN") => Role::Admin,
            Some(ou) if ou.eq_ignore_ascii_case("OPERATOR") => Role::Operator,
            _ => Role::Viewer,
        }
    }
}

/// Created once per session at handshake; immutable for the session's
/// lifetime.
#[derive(Debug, Clone)]
pub struct AuthenticatedIdentity {
    pub common_name: String,
    pub role: Role,
}

pub struct Authorizer;

impl Authorizer {
    /// Extracts `commonName`/`organizationalUnitName` from the DER-encoded
    /// leaf certificate and maps them to a [`Role`].
    pub fn authorize(peer_cert_der: Option<&[u8]>) -> Result<AuthenticatedIdentity, AuthError> {
        let der = peer_cert_der.ok_or(AuthError::NoCertificate)?;
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| AuthError::MalformedCertificate(format!("{e:?}")))?;

        let common_name = cert
            .subject()
            .iter_common_name()
            .next()
            .and_then(|attr| attr.as_str().ok())
            .unwrap_or_default()
            .chars()
            .take(MAX_COMMON_NAME_LEN)
            .collect::<String>();

        let organizational_unit = cert
            .subject()
            .iter_organizational_unit()
            .next()
            .and_then(|attr| attr.as_str().ok());

        let role = Role::from_organizational_unit(organizational_unit);

        Ok(AuthenticatedIdentity { common_name, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_der(path: &str) -> Vec<u8> {
        let pem = std::fs::read(path).expect("fixture cert");
        let (_, cert) = x509_parser::pem::parse_x509_pem(&pem).expect("parse pem");
        cert.contents
    }

    #[test]
    fn admin_ou_maps_to_admin_role() {
        let der = load_der("tests/fixtures/client_admin.crt");
        let id = Authorizer::authorize(Some(&der)).unwrap();
        assert_eq!(id.role, Role::Admin);
        assert_eq!(id.common_name, "alice-admin");
    }

    #[test]
    fn operator_ou_maps_to_operator_role() {
        let der = load_der("tests/fixtures/client_operator.crt");
        let id = Authorizer::authorize(Some(&der)).unwrap();
        assert_eq!(id.role, Role::Operator);
        assert_eq!(id.common_name, "alice");
    }

    #[test]
    fn unrecognized_ou_maps_to_viewer_role() {
        let der = load_der("tests/fixtures/client_viewer.crt");
        let id = Authorizer::authorize(Some(&der)).unwrap();
        assert_eq!(id.role, Role::Viewer);
    }

    #[test]
    fn missing_certificate_is_rejected() {
        let err = Authorizer::authorize(None).unwrap_err();
        assert!(matches!(err, AuthError::NoCertificate));
    }

    #[test]
    fn absent_ou_maps_to_viewer_not_unauthorized() {
        // The current mapping table never produces `Unauthorized`; document
        // that explicitly rather than leaving it an assumption.
        assert_eq!(Role::from_organizational_unit(None), Role::Viewer);
        assert_ne!(Role::from_organizational_unit(None), Role::Unauthorized);
    }
}
