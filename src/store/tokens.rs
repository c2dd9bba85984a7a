use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::Rng;
use rustc_hash::FxHashSet;
use sha2::{Digest, Sha256};

/// Random alphanumeric token of exactly `length` characters.
pub fn random_token(rng: &mut impl Rng, length: usize) -> String {
    let mut token = String::with_capacity(length + 4);
    while token.len() < length {
        let mut bytes = vec![0u8; (length * 3).div_ceil(4).max(1)];
        rng.fill(&mut bytes[..]);
        token.extend(
            STANDARD
                .encode(&bytes)
                .chars()
                .filter(char::is_ascii_alphanumeric),
        );
    }
    token.truncate(length);
    token
}

/// Random token not present in `existing`.
pub fn unique_token(rng: &mut impl Rng, length: usize, existing: &FxHashSet<&str>) -> String {
    loop {
        let token = random_token(rng, length);
        if !existing.contains(token.as_str()) {
            return token;
        }
    }
}

/// Hex SHA-256 of a client address. Raw addresses are never stored.
pub fn hash_ip(ip: &str) -> String {
    format!("{:x}", Sha256::digest(ip.as_bytes()))
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn tokens_have_requested_length_and_alphabet() {
        let mut rng = StdRng::seed_from_u64(11);
        for length in [1, 11, 12, 40] {
            let token = random_token(&mut rng, length);
            assert_eq!(token.len(), length);
            assert!(token.chars().all(|c| c.is_ascii_alphanumeric()), "{token}");
        }
    }

    #[test]
    fn unique_token_skips_existing() {
        let mut probe = StdRng::seed_from_u64(5);
        let taken = random_token(&mut probe, 11);
        let existing: FxHashSet<&str> = [taken.as_str()].into_iter().collect();

        let mut rng = StdRng::seed_from_u64(5);
        let token = unique_token(&mut rng, 11, &existing);
        assert_ne!(token, taken);
    }

    #[test]
    fn ip_hash_is_sha256_hex() {
        assert_eq!(
            hash_ip("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
