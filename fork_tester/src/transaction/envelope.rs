//!
//! The transaction network encodings.
//!
//! Legacy transactions are RLP lists signed with the chain identifier folded
//! into `v`. Typed transactions are a type byte followed by an RLP list, and
//! are signed with a y-parity value instead.
//!

use rlp::RlpStream;
use sha3::Digest;
use web3::signing::Signature;
use web3::types::H256;
use web3::types::U256;

use super::AccessListItem;
use super::TransactionIntent;
use super::TransactionKind;

/// The access list envelope type.
pub const ACCESS_LIST_TX_TYPE: u8 = 0x01;

/// The dynamic fee envelope type.
pub const DYNAMIC_FEE_TX_TYPE: u8 = 0x02;

/// The `v` offset of signatures produced without a chain identifier.
const UNPROTECTED_V_OFFSET: u64 = 27;

///
/// Returns the hash to be signed.
///
pub fn signing_hash(intent: &TransactionIntent, nonce: U256, chain_id: u64) -> H256 {
    keccak256(signing_payload(intent, nonce, chain_id).as_slice())
}

///
/// Returns the unsigned encoding covered by the signature.
///
pub fn signing_payload(intent: &TransactionIntent, nonce: U256, chain_id: u64) -> Vec<u8> {
    match intent.kind {
        TransactionKind::Legacy { gas_price } => {
            let mut stream = RlpStream::new_list(9);
            append_legacy_fields(&mut stream, intent, nonce, gas_price);
            stream.append(&chain_id);
            stream.append_empty_data();
            stream.append_empty_data();
            stream.out().to_vec()
        }
        _ => {
            let mut stream = RlpStream::new_list(typed_field_count(&intent.kind));
            append_typed_fields(&mut stream, intent, nonce, chain_id);
            typed(&intent.kind, stream)
        }
    }
}

///
/// Returns the network encoding of the signed transaction.
///
/// The signature must have been produced over [`signing_hash`], with the chain
/// identifier for legacy transactions and without it for typed ones.
///
pub fn signed_payload(
    intent: &TransactionIntent,
    nonce: U256,
    chain_id: u64,
    signature: &Signature,
) -> Vec<u8> {
    let r = U256::from_big_endian(signature.r.as_bytes());
    let s = U256::from_big_endian(signature.s.as_bytes());

    match intent.kind {
        TransactionKind::Legacy { gas_price } => {
            let mut stream = RlpStream::new_list(9);
            append_legacy_fields(&mut stream, intent, nonce, gas_price);
            stream.append(&signature.v);
            append_u256(&mut stream, &r);
            append_u256(&mut stream, &s);
            stream.out().to_vec()
        }
        _ => {
            let y_parity = signature.v.saturating_sub(UNPROTECTED_V_OFFSET);

            let mut stream = RlpStream::new_list(typed_field_count(&intent.kind) + 3);
            append_typed_fields(&mut stream, intent, nonce, chain_id);
            stream.append(&y_parity);
            append_u256(&mut stream, &r);
            append_u256(&mut stream, &s);
            typed(&intent.kind, stream)
        }
    }
}

///
/// Appends an integer in its minimal big-endian form.
///
pub fn append_u256(stream: &mut RlpStream, value: &U256) {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    let start = bytes
        .iter()
        .position(|byte| *byte != 0)
        .unwrap_or(bytes.len());
    stream.append(&bytes[start..].to_vec());
}

///
/// The Keccak-256 hash.
///
pub fn keccak256(data: &[u8]) -> H256 {
    H256::from_slice(sha3::Keccak256::digest(data).as_slice())
}

fn append_legacy_fields(
    stream: &mut RlpStream,
    intent: &TransactionIntent,
    nonce: U256,
    gas_price: U256,
) {
    append_u256(stream, &nonce);
    append_u256(stream, &gas_price);
    append_u256(stream, &intent.gas_limit);
    append_call_fields(stream, intent);
}

fn append_typed_fields(
    stream: &mut RlpStream,
    intent: &TransactionIntent,
    nonce: U256,
    chain_id: u64,
) {
    stream.append(&chain_id);
    append_u256(stream, &nonce);
    match intent.kind {
        TransactionKind::Legacy { .. } => unreachable!("Legacy transactions are not typed"),
        TransactionKind::AccessList {
            gas_price,
            ref access_list,
        } => {
            append_u256(stream, &gas_price);
            append_u256(stream, &intent.gas_limit);
            append_call_fields(stream, intent);
            append_access_list(stream, access_list.as_slice());
        }
        TransactionKind::DynamicFee { fee_cap, tip_cap } => {
            append_u256(stream, &tip_cap);
            append_u256(stream, &fee_cap);
            append_u256(stream, &intent.gas_limit);
            append_call_fields(stream, intent);
            append_access_list(stream, &[]);
        }
    }
}

fn append_call_fields(stream: &mut RlpStream, intent: &TransactionIntent) {
    match intent.recipient {
        Some(recipient) => stream.append(&recipient.as_bytes().to_vec()),
        None => stream.append_empty_data(),
    };
    append_u256(stream, &intent.value);
    stream.append(&intent.data);
}

fn append_access_list(stream: &mut RlpStream, access_list: &[AccessListItem]) {
    stream.begin_list(access_list.len());
    for item in access_list.iter() {
        stream.begin_list(2);
        stream.append(&item.address.as_bytes().to_vec());
        stream.begin_list(item.storage_keys.len());
        for key in item.storage_keys.iter() {
            stream.append(&key.as_bytes().to_vec());
        }
    }
}

fn typed_field_count(kind: &TransactionKind) -> usize {
    match kind {
        TransactionKind::Legacy { .. } => 9,
        TransactionKind::AccessList { .. } => 8,
        TransactionKind::DynamicFee { .. } => 9,
    }
}

fn typed(kind: &TransactionKind, stream: RlpStream) -> Vec<u8> {
    let body = stream.out();
    let mut payload = Vec::with_capacity(body.len() + 1);
    payload.extend(kind.envelope_type());
    payload.extend_from_slice(body.as_ref());
    payload
}

#[cfg(test)]
mod tests {
    use web3::signing::Signature;
    use web3::types::Address;
    use web3::types::H256;
    use web3::types::U256;

    use crate::account::Account;
    use crate::transaction::AccessListItem;
    use crate::transaction::TransactionIntent;
    use crate::transaction::TransactionKind;

    fn key() -> Account {
        Account::from_hex("4646464646464646464646464646464646464646464646464646464646464646")
            .expect("Valid key")
    }

    fn recipient() -> Address {
        Address::repeat_byte(0x35)
    }

    fn sign(intent: &TransactionIntent, nonce: u64, chain_id: u64) -> (H256, Vec<u8>) {
        let hash = super::signing_hash(intent, nonce.into(), chain_id);
        let protection = match intent.kind {
            TransactionKind::Legacy { .. } => Some(chain_id),
            _ => None,
        };
        let signature: Signature = key()
            .sign(hash.as_bytes(), protection)
            .expect("Signing succeeded");
        let raw = super::signed_payload(intent, nonce.into(), chain_id, &signature);
        (hash, raw)
    }

    #[test]
    fn legacy_replay_protected_vector() {
        let intent = TransactionIntent::transfer(
            TransactionKind::Legacy {
                gas_price: U256::from(20_000_000_000u64),
            },
            recipient(),
            U256::from(1_000_000_000_000_000_000u64),
            21_000,
        );

        assert_eq!(
            hex::encode(super::signing_payload(&intent, 9.into(), 1)),
            "ec098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a764000080018080"
        );

        let (hash, raw) = sign(&intent, 9, 1);
        assert_eq!(
            hex::encode(hash.as_bytes()),
            "daf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"
        );
        assert_eq!(
            hex::encode(raw.as_slice()),
            "f86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
        );
        assert_eq!(
            hex::encode(super::keccak256(raw.as_slice()).as_bytes()),
            "33469b22e9f636356c4160a87eb19df52b7412e8eac32a4a55ffe88ea8350788"
        );
    }

    #[test]
    fn dynamic_fee_envelope() {
        let intent = TransactionIntent::transfer(
            TransactionKind::DynamicFee {
                fee_cap: U256::from(2_000_000_000u64),
                tip_cap: U256::from(1_000_000_000u64),
            },
            recipient(),
            U256::one(),
            21_000,
        );

        let (hash, raw) = sign(&intent, 0, 1337);

        assert_eq!(
            hex::encode(hash.as_bytes()),
            "cd44813437dc3e9d0b883384672df19c216e6145a387eeb4a3d58afc4f226189"
        );
        assert_eq!(
            hex::encode(raw.as_slice()),
            "02f86c82053980843b9aca0084773594008252089435353535353535353535353535353535353535350180c080a02f18291525b9caa0aebfd224933d4048e527c4e58e031fbb5a577f9d810b3935a00a9892b0eae406ed4ba0b2fc6ff2145b6ad0390f37481c44135102725ff74939"
        );
    }

    #[test]
    fn access_list_envelope() {
        let intent = TransactionIntent::transfer(
            TransactionKind::AccessList {
                gas_price: U256::from(1_000_000_000u64),
                access_list: vec![AccessListItem {
                    address: recipient(),
                    storage_keys: vec![H256::zero()],
                }],
            },
            recipient(),
            U256::one(),
            30_000,
        );

        let (hash, raw) = sign(&intent, 3, 1337);

        assert_eq!(
            hex::encode(hash.as_bytes()),
            "0bf13a68df74bcdd5a8f46901636c742ddef917473d476465f5ece00efb4d7f2"
        );
        assert_eq!(
            hex::encode(super::keccak256(raw.as_slice()).as_bytes()),
            "ca4820b82769a7f69c523a4998db55527bcbbcf84e22fb5578ae93bf248654c5"
        );
    }

    #[test]
    fn deployment_has_empty_recipient() {
        let intent = TransactionIntent::deployment(U256::one(), vec![0x60, 0x00], 60_000);

        let payload = super::signing_payload(&intent, 0.into(), 1337);
        let rlp = rlp::Rlp::new(payload.as_slice());

        assert!(rlp.at(3).expect("Recipient field").is_empty());
        assert_eq!(
            rlp.at(5).expect("Data field").data().expect("Bytes"),
            &[0x60, 0x00]
        );
    }
}
