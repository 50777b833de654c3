//! CLI command implementations.

pub(crate) mod expand;
pub(crate) mod fingerprint;

pub(crate) use expand::ExpandArgs;
pub(crate) use fingerprint::FingerprintArgs;
