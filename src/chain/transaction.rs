use anyhow::{anyhow, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use solana_sdk::{
    signature::{Keypair, Signature, Signer},
    transaction::{TransactionVersion, VersionedTransaction},
};
use tracing::{debug, info};

/// Decodes the aggregator's base64 blob. Legacy and v0 messages share the same
/// outer encoding, so both land in a `VersionedTransaction`.
pub fn decode_swap_transaction(encoded: &str) -> Result<VersionedTransaction> {
    let raw = STANDARD
        .decode(encoded.trim())
        .map_err(|e| anyhow!("swap transaction is not valid base64: {}", e))?;

    let tx: VersionedTransaction = bincode::deserialize(&raw)
        .map_err(|e| anyhow!("could not deserialize swap transaction: {}", e))?;

    debug!(
        "Decoded {} swap transaction, {} bytes, {} signer slot(s)",
        version_label(&tx),
        raw.len(),
        tx.signatures.len()
    );

    Ok(tx)
}

/// Puts the keypair's signature in its slot and leaves other signer slots alone.
pub fn sign_swap_transaction(mut tx: VersionedTransaction, keypair: &Keypair) -> Result<VersionedTransaction> {
    let owner = keypair.pubkey();
    let required = tx.message.header().num_required_signatures as usize;

    let signers = tx
        .message
        .static_account_keys()
        .get(..required)
        .ok_or_else(|| anyhow!("transaction lists fewer accounts than required signers"))?;

    let position = signers
        .iter()
        .position(|key| *key == owner)
        .ok_or_else(|| anyhow!("{} is not a signer of the swap transaction", owner))?;

    if tx.signatures.len() != required {
        tx.signatures.resize(required, Signature::default());
    }
    tx.signatures[position] = keypair.sign_message(&tx.message.serialize());

    info!("Signed {} transaction as {}", version_label(&tx), owner);

    Ok(tx)
}

pub fn version_label(tx: &VersionedTransaction) -> String {
    match tx.version() {
        TransactionVersion::Legacy(_) => "legacy".to_string(),
        TransactionVersion::Number(n) => format!("v{}", n),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use solana_sdk::{
        hash::Hash,
        instruction::Instruction,
        message::{v0, Message as LegacyMessage, VersionedMessage},
        pubkey::Pubkey,
        system_instruction,
    };

    fn encode(message: VersionedMessage) -> String {
        let slots = message.header().num_required_signatures as usize;
        let tx = VersionedTransaction {
            signatures: vec![Signature::default(); slots],
            message,
        };
        STANDARD.encode(bincode::serialize(&tx).unwrap())
    }

    /// A base64 unsigned transaction shaped like an aggregator reply.
    pub(crate) fn unsigned_swap_tx(payer: &Pubkey, legacy: bool) -> String {
        let ix = system_instruction::transfer(payer, &Pubkey::new_unique(), 1_000);
        let message = if legacy {
            VersionedMessage::Legacy(LegacyMessage::new(&[ix], Some(payer)))
        } else {
            VersionedMessage::V0(v0::Message::try_compile(payer, &[ix], &[], Hash::new_unique()).unwrap())
        };
        encode(message)
    }

    #[test]
    fn test_sign_v0() {
        let keypair = Keypair::new();
        let tx = decode_swap_transaction(&unsigned_swap_tx(&keypair.pubkey(), false)).unwrap();
        assert_eq!(version_label(&tx), "v0");

        let signed = sign_swap_transaction(tx, &keypair).unwrap();
        assert_eq!(signed.verify_with_results(), vec![true]);
    }

    #[test]
    fn test_sign_legacy() {
        let keypair = Keypair::new();
        let tx = decode_swap_transaction(&unsigned_swap_tx(&keypair.pubkey(), true)).unwrap();
        assert_eq!(version_label(&tx), "legacy");

        let signed = sign_swap_transaction(tx, &keypair).unwrap();
        assert_eq!(signed.verify_with_results(), vec![true]);
    }

    #[test]
    fn test_partial_sign_keeps_other_slot() {
        let fee_payer = Keypair::new();
        let user = Keypair::new();
        let ix: Instruction = system_instruction::transfer(&user.pubkey(), &Pubkey::new_unique(), 5);
        let message = VersionedMessage::V0(
            v0::Message::try_compile(&fee_payer.pubkey(), &[ix], &[], Hash::new_unique()).unwrap(),
        );

        let tx = decode_swap_transaction(&encode(message)).unwrap();
        let signed = sign_swap_transaction(tx, &user).unwrap();

        assert_eq!(signed.signatures[0], Signature::default());
        assert_eq!(signed.verify_with_results(), vec![false, true]);
    }

    #[test]
    fn test_foreign_key_rejected() {
        let owner = Pubkey::new_unique();
        let tx = decode_swap_transaction(&unsigned_swap_tx(&owner, false)).unwrap();

        let err = sign_swap_transaction(tx, &Keypair::new()).unwrap_err();
        assert!(err.to_string().contains("is not a signer"));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(decode_swap_transaction("%%%").is_err());
        assert!(decode_swap_transaction("AQID").is_err());
    }
}
