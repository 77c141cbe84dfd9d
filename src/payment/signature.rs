//! Checkout signature verification.
//!
//! The widget signs `order_id|payment_id` with the merchant key secret:
//! `hex(HMAC-SHA256(secret, order_id + "|" + payment_id))`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{Result, StoreError};

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Arc<String>,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier").finish_non_exhaustive()
    }
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: Arc::new(secret.into()) }
    }

    fn mac(&self, order_id: &str, payment_id: &str) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|_| StoreError::Internal("invalid payment key secret".into()))?;
        mac.update(order_id.as_bytes());
        mac.update(b"|");
        mac.update(payment_id.as_bytes());
        Ok(mac)
    }

    /// Constant-time check of a hex signature.
    pub fn verify(&self, order_id: &str, payment_id: &str, signature: &str) -> Result<()> {
        let Ok(expected) = hex::decode(signature.trim()) else {
            warn!(payment_id, "Payment signature is not hex");
            return Err(StoreError::InvalidPaymentSignature);
        };
        self.mac(order_id, payment_id)?.verify_slice(&expected).map_err(|_| {
            warn!(payment_id, order_id, "Payment signature mismatch");
            StoreError::InvalidPaymentSignature
        })?;
        debug!(payment_id, "Payment signature verified");
        Ok(())
    }

    /// Produces the signature the widget would send. Used by tests and tooling.
    pub fn sign(&self, order_id: &str, payment_id: &str) -> Result<String> {
        Ok(hex::encode(self.mac(order_id, payment_id)?.finalize().into_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let v = SignatureVerifier::new("secret");
        let sig = v.sign("order_1", "pay_1").unwrap();
        assert_eq!(sig.len(), 64);
        v.verify("order_1", "pay_1", &sig).unwrap();
        v.verify("order_1", "pay_1", &sig.to_uppercase()).unwrap();
    }

    #[test]
    fn test_forgeries_rejected() {
        let v = SignatureVerifier::new("secret");
        let sig = v.sign("order_1", "pay_1").unwrap();
        for (order, payment, signature) in [
            ("order_1", "pay_2", sig.as_str()),
            ("order_2", "pay_1", sig.as_str()),
            ("order_1", "pay_1", "not-hex"),
            ("order_1", "pay_1", ""),
        ] {
            assert!(matches!(v.verify(order, payment, signature), Err(StoreError::InvalidPaymentSignature)));
        }
        let other = SignatureVerifier::new("other").sign("order_1", "pay_1").unwrap();
        assert!(v.verify("order_1", "pay_1", &other).is_err());
    }
}
