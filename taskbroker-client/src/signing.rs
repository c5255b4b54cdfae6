//! Signs outbound broker requests with a shared secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tonic::metadata::{Ascii, MetadataValue};

/// Metadata key carrying the request signature.
pub const SIGNATURE_HEADER: &str = "sentry-signature";

type HmacSha256 = Hmac<Sha256>;

/// Computes `HMAC-SHA256(secret, "<path>:<body>")` over outbound requests.
///
/// Several secrets may be configured so brokers can rotate them, but requests
/// are only ever signed with the first one.
#[derive(Clone)]
pub struct RequestSigner {
    mac: HmacSha256,
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner").finish_non_exhaustive()
    }
}

impl RequestSigner {
    /// Build a signer from the configured secrets, or `None` if there are none.
    pub fn from_secrets<I, S>(secrets: I) -> Result<Option<Self>, anyhow::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        match secrets.into_iter().next() {
            Some(primary) => Self::new(primary.as_ref()).map(Some),
            None => Ok(None),
        }
    }

    pub fn new(secret: &str) -> Result<Self, anyhow::Error> {
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|err| anyhow::anyhow!("invalid shared secret: {err}"))?;
        Ok(Self { mac })
    }

    /// Lowercase hex signature of `body` sent to `path`.
    pub fn sign(&self, path: &str, body: &[u8]) -> String {
        let mut mac = self.mac.clone();
        mac.update(path.as_bytes());
        mac.update(b":");
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    /// Wrap `message` in a request carrying its signature.
    pub fn signed_request<M: prost::Message>(
        &self,
        path: &str,
        message: M,
    ) -> Result<tonic::Request<M>, tonic::Status> {
        let signature = self.sign(path, &message.encode_to_vec());
        let value = MetadataValue::<Ascii>::try_from(signature)
            .map_err(|err| tonic::Status::internal(format!("invalid signature header: {err}")))?;

        let mut request = tonic::Request::new(message);
        request.metadata_mut().insert(SIGNATURE_HEADER, value);
        Ok(request)
    }
}
