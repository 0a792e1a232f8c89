//! Boneh-Franklin IBE with the Fujisaki-Okamoto transform.
//!
//! The identity is a beacon round; its private key is the beacon signature for
//! that round. Encryption:
//!
//! ```text
//! sigma <- random, |sigma| = |m|
//! r     =  H3(sigma, m)
//! U     =  r * G            (G generates the public key's group)
//! V     =  sigma XOR H2(e(P, Q_id)^r)
//! W     =  m XOR H4(sigma)
//! ```
//!
//! Decryption recovers sigma from `e(U, sig)`, then m, then recomputes `r` and
//! requires `r * G == U`.

use ark_bls12_381::{Bls12_381, G1Affine, G2Affine};
use ark_ec::pairing::{Pairing, PairingOutput};
use ark_ec::{AffineRepr, CurveGroup};
use zeroize::Zeroizing;

use crate::error::IbeError;
use crate::hash::{h2, h3, h4, hash_identity, HASH_SIZE};
use crate::point::GroupPoint;
use crate::scheme::{Group, IbeVariant};

/// Largest message the IBE encrypts in one ciphertext.
pub const MAX_MESSAGE_SIZE: usize = HASH_SIZE;

/// An IBE ciphertext `(U, V, W)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ciphertext {
    pub u: GroupPoint,
    pub v: Vec<u8>,
    pub w: Vec<u8>,
}

impl Ciphertext {
    /// Serialize as `U || V || W`.
    pub fn to_bytes(&self) -> Result<Vec<u8>, IbeError> {
        let mut out = self.u.to_compressed()?;
        out.extend_from_slice(&self.v);
        out.extend_from_slice(&self.w);
        Ok(out)
    }

    /// Parse `U || V || W` for `variant`.
    ///
    /// `V` and `W` split the remainder evenly, so ciphertexts over 16-byte and
    /// 32-byte messages are both accepted.
    pub fn from_bytes(variant: IbeVariant, bytes: &[u8]) -> Result<Self, IbeError> {
        let group = variant.public_key_group();
        let point_size = group.point_size();
        if bytes.len() <= point_size {
            return Err(IbeError::InvalidCiphertext(format!(
                "expected more than {point_size} bytes, got {}",
                bytes.len()
            )));
        }

        let (u_bytes, rest) = bytes.split_at(point_size);
        if rest.len() % 2 != 0 || rest.len() > 2 * MAX_MESSAGE_SIZE {
            return Err(IbeError::InvalidCiphertext(format!(
                "body of {} bytes cannot split into V and W",
                rest.len()
            )));
        }

        let u = GroupPoint::from_compressed(group, u_bytes)?;
        let (v, w) = rest.split_at(rest.len() / 2);
        Ok(Self {
            u,
            v: v.to_vec(),
            w: w.to_vec(),
        })
    }
}

/// Encrypt `message` to `identity` under a chain public key.
pub fn encrypt(
    variant: IbeVariant,
    public_key: &[u8],
    identity: &[u8],
    message: &[u8],
) -> Result<Ciphertext, IbeError> {
    check_message_len(message.len())?;
    let mut sigma = Zeroizing::new(vec![0u8; message.len()]);
    getrandom::getrandom(&mut sigma).map_err(|e| IbeError::RngFailed(e.to_string()))?;
    encrypt_with_sigma(variant, public_key, identity, message, &sigma)
}

/// Encryption with caller-supplied randomness.
pub(crate) fn encrypt_with_sigma(
    variant: IbeVariant,
    public_key: &[u8],
    identity: &[u8],
    message: &[u8],
    sigma: &[u8],
) -> Result<Ciphertext, IbeError> {
    check_message_len(message.len())?;
    let public_key = GroupPoint::from_compressed(variant.public_key_group(), public_key)?;
    let q_id = hash_identity(variant, identity)?;
    let r = h3(sigma, message)?;

    let (u, gid) = match (public_key, q_id) {
        (GroupPoint::G1(pk), GroupPoint::G2(q)) => {
            let u = (G1Affine::generator() * r).into_affine();
            let r_pk = (pk * r).into_affine();
            (GroupPoint::G1(u), Bls12_381::pairing(r_pk, q))
        }
        (GroupPoint::G2(pk), GroupPoint::G1(q)) => {
            let u = (G2Affine::generator() * r).into_affine();
            let r_pk = (pk * r).into_affine();
            (GroupPoint::G2(u), Bls12_381::pairing(q, r_pk))
        }
        _ => return Err(IbeError::UnsupportedScheme(format!("{variant:?}"))),
    };

    let v = xor(sigma, &h2(&gid, sigma.len())?);
    let w = xor(message, &h4(sigma, message.len()));
    Ok(Ciphertext { u, v, w })
}

/// Decrypt with the beacon signature for the ciphertext's identity.
pub fn decrypt(
    variant: IbeVariant,
    signature: &[u8],
    ciphertext: &Ciphertext,
) -> Result<Vec<u8>, IbeError> {
    let len = ciphertext.v.len();
    if len != ciphertext.w.len() {
        return Err(IbeError::InvalidCiphertext(format!(
            "V is {len} bytes but W is {} bytes",
            ciphertext.w.len()
        )));
    }
    check_message_len(len)?;

    let signature = GroupPoint::from_compressed(variant.signature_group(), signature)?;
    let gid = pair(ciphertext.u, signature)?;

    let sigma = Zeroizing::new(xor(&ciphertext.v, &h2(&gid, len)?));
    let message = xor(&ciphertext.w, &h4(&sigma, len));

    let r = h3(&sigma, &message)?;
    let expected_u = match ciphertext.u.group() {
        Group::G1 => GroupPoint::G1((G1Affine::generator() * r).into_affine()),
        Group::G2 => GroupPoint::G2((G2Affine::generator() * r).into_affine()),
    };
    if expected_u != ciphertext.u {
        return Err(IbeError::IntegrityCheckFailed);
    }
    Ok(message)
}

fn pair(u: GroupPoint, signature: GroupPoint) -> Result<PairingOutput<Bls12_381>, IbeError> {
    match (u, signature) {
        (GroupPoint::G1(u), GroupPoint::G2(sig)) => Ok(Bls12_381::pairing(u, sig)),
        (GroupPoint::G2(u), GroupPoint::G1(sig)) => Ok(Bls12_381::pairing(sig, u)),
        (u, _) => Err(IbeError::InvalidCiphertext(format!(
            "U on {} does not pair with the signature",
            u.group()
        ))),
    }
}

fn check_message_len(len: usize) -> Result<(), IbeError> {
    if len == 0 || len > MAX_MESSAGE_SIZE {
        return Err(IbeError::InvalidMessageLength {
            max: MAX_MESSAGE_SIZE,
            got: len,
        });
    }
    Ok(())
}

/// Bytewise XOR over the shorter of the two inputs.
pub fn xor(a: &[u8], b: &[u8]) -> Vec<u8> {
    a.iter().zip(b).map(|(x, y)| x ^ y).collect()
}
