use std::io;

use anyhow::anyhow;
use hmac::{Hmac, Mac};
use rocket::{
    data::{ByteUnit, FromData, Outcome},
    http::Status,
    Data, Request,
};
use sha1::Sha1;
use sha2::Sha256;
use thiserror::Error;
use tracing::trace;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

pub const X_HUB_SIGNATURE: &str = "X-Hub-Signature";
pub const X_HUB_SIGNATURE_256: &str = "X-Hub-Signature-256";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signatures did not match")]
    SignatureMismatch,
}

/// Digest algorithms GitHub signs deliveries with. Each one has its own header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    Sha1,
    Sha256,
}

impl SignatureAlgorithm {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1=",
            Self::Sha256 => "sha256=",
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            Self::Sha1 => X_HUB_SIGNATURE,
            Self::Sha256 => X_HUB_SIGNATURE_256,
        }
    }

    /// Splits `sha1=<hex>` or `sha256=<hex>` into its algorithm and hex digest.
    fn split(signature: &str) -> Option<(Self, &str)> {
        [Self::Sha256, Self::Sha1]
            .into_iter()
            .find_map(|algo| Some((algo, signature.strip_prefix(algo.prefix())?)))
    }
}

/// Checks that `signature` is the HMAC of `body` keyed by `secret`.
///
/// The comparison is done by the MAC itself, in constant time. Callers must reject empty
/// signatures beforehand: those are a missing header, not a mismatch.
pub fn verify(body: &[u8], secret: &str, signature: &str) -> Result<(), SignatureError> {
    trace!("validating signature...");

    // GitHub puts a prefix in front of its hex digest
    let (algorithm, hex_digest) = match SignatureAlgorithm::split(signature) {
        Some(split) => split,
        None => {
            trace!("couldn't strip prefix from signature `{}`", signature);
            return Err(SignatureError::SignatureMismatch);
        }
    };

    let expected = match hex::decode(hex_digest) {
        Ok(bytes) => bytes,
        Err(_) => {
            trace!("couldn't decode hex-encoded signature {}", hex_digest);
            return Err(SignatureError::SignatureMismatch);
        }
    };

    let verified = match algorithm {
        SignatureAlgorithm::Sha1 => HmacSha1::new_from_slice(secret.as_bytes())
            .map(|mut mac| {
                mac.update(body);
                mac.verify_slice(&expected).is_ok()
            })
            .unwrap_or(false),
        SignatureAlgorithm::Sha256 => HmacSha256::new_from_slice(secret.as_bytes())
            .map(|mut mac| {
                mac.update(body);
                mac.verify_slice(&expected).is_ok()
            })
            .unwrap_or(false),
    };

    if verified {
        Ok(())
    } else {
        Err(SignatureError::SignatureMismatch)
    }
}

/// Produces the header value GitHub would send for `body`.
#[cfg(test)]
pub fn sign(body: &[u8], secret: &str, algorithm: SignatureAlgorithm) -> String {
    let digest = match algorithm {
        SignatureAlgorithm::Sha1 => {
            let mut mac = HmacSha1::new_from_slice(secret.as_bytes()).unwrap();
            mac.update(body);
            mac.finalize().into_bytes().to_vec()
        }
        SignatureAlgorithm::Sha256 => {
            let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
            mac.update(body);
            mac.finalize().into_bytes().to_vec()
        }
    };

    format!("{}{}", algorithm.prefix(), hex::encode(digest))
}

/// The raw, not yet verified, body of a webhook delivery.
///
/// Signatures are computed over the exact bytes GitHub sent, so the body can't go through a
/// `Json` guard before being checked.
pub struct RawPayload(pub Vec<u8>);

const LIMIT: ByteUnit = ByteUnit::Mebibyte(1);

// Tracking issue for chaining Data guards to avoid reimplementing all this:
// https://github.com/SergioBenitez/Rocket/issues/775
#[rocket::async_trait]
impl<'r> FromData<'r> for RawPayload {
    type Error = anyhow::Error;

    async fn from_data(request: &'r Request<'_>, data: Data<'r>) -> Outcome<'r, Self> {
        trace!("received payload on command webhook endpoint: {:?}", request);

        let size_limit = request.limits().get("json").unwrap_or(LIMIT);
        match data.open(size_limit).into_bytes().await {
            Ok(bytes) if bytes.is_complete() => Outcome::Success(RawPayload(bytes.into_inner())),
            Ok(_) => {
                let eof = io::ErrorKind::UnexpectedEof;
                trace!("payload was too big");
                Outcome::Error((
                    Status::PayloadTooLarge,
                    io::Error::new(eof, "data limit exceeded").into(),
                ))
            }
            Err(e) => Outcome::Error((Status::BadRequest, anyhow!(e))),
        }
    }
}
