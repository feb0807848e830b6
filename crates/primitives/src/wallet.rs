//! A `Wallet` is a wrapper around an ethers wallet that owns (signs for) a smart account
use crate::authorization::{Authorization, SignedAuthorization};
use ethers::{
    prelude::{k256::ecdsa::SigningKey, rand},
    signers::{coins_bip39::English, LocalWallet, MnemonicBuilder, Signer},
    types::{transaction::eip712::Eip712, Address, Signature, H256},
};
use expanded_pathbuf::ExpandedPathBuf;
use std::fs;

/// Derivation path of the owner key
const DERIVATION_PATH: &str = "m/44'/60'/0'/0/0";

/// Wrapper around ethers wallet
#[derive(Clone, Debug)]
pub struct Wallet {
    /// Signing key of the wallet
    pub signer: ethers::signers::Wallet<SigningKey>,
}

impl Wallet {
    /// Builds a `Wallet` from a randomly generated mnemonic phrase
    ///
    /// # Arguments
    /// * `path` - The directory where the mnemonic phrase will be written
    /// * `chain_id` - The chain id of the blockchain network to be used
    ///
    /// # Returns
    /// * `Self` - A new `Wallet` instance
    pub fn build_random(path: ExpandedPathBuf, chain_id: u64) -> eyre::Result<Self> {
        let mut rng = rand::thread_rng();

        fs::create_dir_all(&path)?;

        let wallet = MnemonicBuilder::<English>::default()
            .write_to(path.to_path_buf())
            .derivation_path(DERIVATION_PATH)?
            .build_random(&mut rng)?;

        Ok(Self { signer: wallet.with_chain_id(chain_id) })
    }

    /// Create a new wallet from the given file containing the mnemonic phrase
    ///
    /// # Arguments
    /// * `path` - The path to the file where the mnemonic phrase is stored
    /// * `chain_id` - The chain id of the blockchain network to be used
    ///
    /// # Returns
    /// * `Self` - A new `Wallet` instance
    pub fn from_file(path: ExpandedPathBuf, chain_id: u64) -> eyre::Result<Self> {
        let wallet = MnemonicBuilder::<English>::default()
            .phrase(path.to_path_buf())
            .derivation_path(DERIVATION_PATH)?
            .build()?;

        Ok(Self { signer: wallet.with_chain_id(chain_id) })
    }

    /// Create a new wallet from the given mnemonic phrase
    ///
    /// # Arguments
    /// * `phrase` - The mnemonic phrase
    /// * `chain_id` - The chain id of the blockchain network to be used
    ///
    /// # Returns
    /// * `Self` - A new `Wallet` instance
    pub fn from_phrase(phrase: &str, chain_id: u64) -> eyre::Result<Self> {
        let wallet = MnemonicBuilder::<English>::default()
            .phrase(phrase)
            .derivation_path(DERIVATION_PATH)?
            .build()?;

        Ok(Self { signer: wallet.with_chain_id(chain_id) })
    }

    /// Create a new wallet from a hex encoded private key
    pub fn from_private_key(key: &str, chain_id: u64) -> eyre::Result<Self> {
        let wallet: LocalWallet = key.parse()?;
        Ok(Self { signer: wallet.with_chain_id(chain_id) })
    }

    /// Address of the owner
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Signs a 32-byte digest as is (no EIP-191 prefix)
    pub fn sign_hash(&self, hash: H256) -> eyre::Result<Signature> {
        Ok(self.signer.sign_hash(hash)?)
    }

    /// Signs a message with the EIP-191 personal message prefix
    pub async fn sign_message<S: AsRef<[u8]> + Send + Sync>(
        &self,
        message: S,
    ) -> eyre::Result<Signature> {
        Ok(self.signer.sign_message(message).await?)
    }

    /// Signs EIP-712 typed data
    pub async fn sign_typed_data<T: Eip712 + Send + Sync>(
        &self,
        payload: &T,
    ) -> eyre::Result<Signature> {
        Ok(self.signer.sign_typed_data(payload).await?)
    }

    /// Signs an EIP-7702 authorization delegating the owner account
    pub fn sign_authorization(
        &self,
        authorization: Authorization,
    ) -> eyre::Result<SignedAuthorization> {
        let signature = self.sign_hash(authorization.signature_hash())?;
        Ok(authorization.into_signed(signature))
    }
}
