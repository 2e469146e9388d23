//!
//! The test account.
//!

use web3::signing::Key;
use web3::signing::SecretKey;
use web3::signing::SecretKeyRef;
use web3::signing::Signature;
use web3::signing::SigningError;
use web3::types::Address;

///
/// A key pair with its derived address.
///
#[derive(Clone)]
pub struct Account {
    /// The secp256k1 secret key.
    secret: SecretKey,
    /// The address derived from the public key.
    address: Address,
}

impl Account {
    ///
    /// Parses a hex-encoded secret key, with or without the `0x` prefix.
    ///
    pub fn from_hex(secret: &str) -> anyhow::Result<Self> {
        let secret = secret.trim();
        let bytes = hex::decode(secret.strip_prefix("0x").unwrap_or(secret))
            .map_err(|error| anyhow::anyhow!("Private key is not valid hex: {error}"))?;
        let secret = SecretKey::from_slice(bytes.as_slice())
            .map_err(|error| anyhow::anyhow!("Private key is not a valid secp256k1 secret: {error}"))?;
        Ok(Self::new(secret))
    }

    ///
    /// A shortcut constructor.
    ///
    pub fn new(secret: SecretKey) -> Self {
        let address = SecretKeyRef::new(&secret).address();
        Self { secret, address }
    }

    ///
    /// The account address.
    ///
    pub fn address(&self) -> Address {
        self.address
    }

    ///
    /// Signs a 32-byte message hash.
    ///
    /// With a chain identifier the `v` value is replay-protected, otherwise
    /// it is `27 + recovery id`.
    ///
    pub fn sign(&self, hash: &[u8], chain_id: Option<u64>) -> Result<Signature, SigningError> {
        SecretKeyRef::new(&self.secret).sign(hash, chain_id)
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
