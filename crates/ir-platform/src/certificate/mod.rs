//! Local certificate supply.

mod self_signed;

pub use self_signed::{generate_self_signed, SelfSignedCertificateService};
