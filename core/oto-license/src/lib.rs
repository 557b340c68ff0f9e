//! Credential model, code generation and offline verification.
//!
//! Two credential classes exist:
//! - **Master**: self-describing. The code embeds its expiry date and a
//!   signature over that date, so a client holding the shared secret can
//!   check it without the registry. Optional expiry, optional single use.
//! - **Normal**: bound to a device id, always time limited, and only
//!   meaningful as a key into the registry.
//!
//! # Code Format
//!
//! ```text
//! MASTER-{UNLIMITED|YYYYMMDD}-{SIG8}-{SINGLE|MULTI}-{RAND8}
//! {DEVICE8}-{RAND8}-{RAND8}
//! ```
//!
//! # Security Notes
//!
//! The Master signature is a truncated SHA-256 over the date component and
//! one long-lived shared secret. It is identical for every code with the
//! same expiry date and authenticates nothing but that date: the use-type
//! tag and the random suffix can be altered freely without invalidating
//! it. Shipped clients depend on this exact construction, so it is kept
//! as is. The device digest in Normal codes is a plain MD5 fingerprint and
//! is not a security boundary either.

mod credential;
mod device;
mod duration;
mod error;
mod generator;
mod master;

pub use credential::{ConsumeRefusal, Credential, CredentialDetail, CredentialKind};
pub use device::{device_digest, NormalCode};
pub use duration::{Days, MASTER_MAX_DAYS, NORMAL_MAX_DAYS};
pub use error::{LicenseError, LicenseResult};
pub use generator::{CredentialGenerator, Minted};
pub use master::{
    master_signature, normalize_code, verify_master_code, DateComponent, MasterCode, SharedSecret,
    UseType, DEFAULT_SHARED_SECRET, MASTER_PREFIX, UNLIMITED_MARKER,
};

/// Delimiter between code segments.
pub const CODE_DELIMITER: char = '-';

/// Length of every fixed-width code segment (signature, digest, random).
pub const SEGMENT_LEN: usize = 8;
