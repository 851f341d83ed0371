//! Password checks for the standard security handler (RC4, revisions 2 and 3).
//!
//! lopdf only verifies user passwords. Owner passwords are turned back into
//! the user password they wrap, then verified the same way.

use lopdf::encryption::get_encryption_key;
use lopdf::{Document, Object};
use md5::{Digest, Md5};

const PAD_BYTES: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

/// Encryption parameters copied out of a document before it is decrypted.
pub(super) struct StandardSecurity {
    /// Holds only the `/Encrypt` dictionary and the trailer `/ID`.
    handler: Document,
}

impl StandardSecurity {
    /// Capture the encryption dictionary of `doc`, if it has a usable one.
    pub fn capture(doc: &Document) -> Option<Self> {
        let dict = doc.get_encrypted().ok()?.clone();
        let id = doc.trailer.get(b"ID").ok()?.clone();

        let mut handler = Document::new();
        let encrypt_id = handler.add_object(dict);
        handler.trailer.set("Encrypt", encrypt_id);
        handler.trailer.set("ID", id);
        Some(Self { handler })
    }

    /// The user password unlocked by `password`.
    ///
    /// `password` may be either the user or the owner password; `None` means
    /// it is neither.
    pub fn user_password(&self, password: &[u8]) -> Option<Vec<u8>> {
        if get_encryption_key(&self.handler, password, true).is_ok() {
            return Some(password.to_vec());
        }

        let recovered = self.unwrap_owner_password(password)?;
        match get_encryption_key(&self.handler, &recovered, true) {
            Ok(_) => Some(recovered),
            Err(e) => {
                log::debug!("not an owner password: {}", e);
                None
            }
        }
    }

    /// Decrypt `/O` with the key derived from a candidate owner password.
    fn unwrap_owner_password(&self, owner: &[u8]) -> Option<Vec<u8>> {
        let dict = self.handler.get_encrypted().ok()?;
        let revision = dict.get(b"R").and_then(Object::as_i64).ok()?;
        if !(2..=3).contains(&revision) {
            return None;
        }
        let key_len = dict
            .get(b"Length")
            .and_then(Object::as_i64)
            .map_or(5, |bits| (bits / 8).clamp(5, 16) as usize);
        let hashed_owner = dict.get(b"O").and_then(Object::as_str).ok()?;

        let mut digest = Md5::digest(pad(owner)).to_vec();
        if revision >= 3 {
            for _ in 0..50 {
                digest = Md5::digest(&digest).to_vec();
            }
        }
        let key = &digest[..key_len];

        if revision == 2 {
            return Some(rc4(key, hashed_owner));
        }
        let mut data = hashed_owner.to_vec();
        for round in (0..20u8).rev() {
            let round_key: Vec<u8> = key.iter().map(|b| b ^ round).collect();
            data = rc4(&round_key, &data);
        }
        Some(data)
    }
}

fn pad(password: &[u8]) -> Vec<u8> {
    let len = password.len().min(32);
    let mut padded = password[..len].to_vec();
    padded.extend_from_slice(&PAD_BYTES[..32 - len]);
    padded
}

/// RC4 keystream applied to `data`.
fn rc4(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut state: [u8; 256] = std::array::from_fn(|i| i as u8);
    let mut j = 0u8;
    for i in 0..256 {
        j = j.wrapping_add(state[i]).wrapping_add(key[i % key.len()]);
        state.swap(i, j as usize);
    }

    let (mut i, mut j) = (0u8, 0u8);
    data.iter()
        .map(|byte| {
            i = i.wrapping_add(1);
            j = j.wrapping_add(state[i as usize]);
            state.swap(i as usize, j as usize);
            byte ^ state[state[i as usize].wrapping_add(state[j as usize]) as usize]
        })
        .collect()
}
