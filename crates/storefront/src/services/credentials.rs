//! IPTV service login generation.

use rand::Rng;

use streamstick_core::order::ServiceCredentials;

const USERNAME_PREFIX: &str = "ssp_";
const USERNAME_SUFFIX_LEN: usize = 8;
const PASSWORD_LEN: usize = 16;

/// Generate a fresh username/password pair.
///
/// Usernames are `ssp_` plus lowercase alphanumerics so support staff can
/// read them over the phone; passwords use the full alphanumeric set.
#[must_use]
pub fn generate() -> ServiceCredentials {
    const LOWER: &[u8] = b"abcdefghijkmnpqrstuvwxyz23456789";
    const FULL: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnpqrstuvwxyz23456789";

    ServiceCredentials {
        username: format!("{USERNAME_PREFIX}{}", random_string(LOWER, USERNAME_SUFFIX_LEN)),
        password: random_string(FULL, PASSWORD_LEN),
    }
}

fn random_string(charset: &[u8], length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .filter_map(|_| charset.get(rng.random_range(0..charset.len())).copied())
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_shape() {
        let creds = generate();
        assert!(creds.username.starts_with(USERNAME_PREFIX));
        assert_eq!(creds.username.len(), USERNAME_PREFIX.len() + USERNAME_SUFFIX_LEN);
        assert_eq!(creds.password.len(), PASSWORD_LEN);
        assert!(creds.password.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generate_is_not_constant() {
        assert_ne!(generate().password, generate().password);
    }
}
