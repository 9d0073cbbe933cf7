use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use pbkdf2::pbkdf2_hmac;
use sha2::{Sha256, Sha512};
use subtle::ConstantTimeEq;
use tracing::warn;

/// Iteration count werkzeug uses when the method string omits one.
const WERKZEUG_DEFAULT_ITERATIONS: u32 = 600_000;

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let argon2 = Argon2::default();
    let salt = SaltString::generate(&mut OsRng);

    Ok(argon2.hash_password(password.as_bytes(), &salt)?.to_string())
}

/// Checks `password` against a stored hash.
///
/// Accepts argon2 PHC strings and werkzeug `pbkdf2:<digest>[:<iterations>]$<salt>$<hex>`
/// strings, which is what the HR provisioning sheet has historically held.
/// Any other scheme never verifies.
pub fn verify_password(password: &str, stored: &str) -> bool {
    if stored.starts_with("$argon2") {
        return match PasswordHash::new(stored) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                warn!(error = %e, "Malformed argon2 hash");
                false
            }
        };
    }

    if stored.starts_with("pbkdf2:") {
        return verify_werkzeug_pbkdf2(password, stored).unwrap_or_else(|| {
            warn!("Malformed pbkdf2 hash");
            false
        });
    }

    warn!("Unsupported password hash scheme");
    false
}

fn verify_werkzeug_pbkdf2(password: &str, stored: &str) -> Option<bool> {
    let mut parts = stored.splitn(3, '$');
    let method = parts.next()?;
    let salt = parts.next()?;
    let expected = hex::decode(parts.next()?).ok()?;

    let mut method_parts = method.split(':').skip(1);
    let digest = method_parts.next()?;
    let iterations = match method_parts.next() {
        Some(n) => n.parse().ok()?,
        None => WERKZEUG_DEFAULT_ITERATIONS,
    };

    let mut computed = vec![0u8; expected.len()];
    match digest {
        "sha256" => pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut computed),
        "sha512" => pbkdf2_hmac::<Sha512>(password.as_bytes(), salt.as_bytes(), iterations, &mut computed),
        _ => return None,
    }

    Some(!expected.is_empty() && bool::from(computed.ct_eq(&expected)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const WERKZEUG_PW1: &str =
        "pbkdf2:sha256:1000$NaClSalt$8e5c1cb1a5cbb059b77a59766ae93fd357b070d5d656bf98c0eda8a06686a1f8";

    #[test]
    fn argon2_hash_verifies() {
        let hash = hash_password("pw1").unwrap();
        assert!(verify_password("pw1", &hash));
        assert!(!verify_password("pw2", &hash));
    }

    #[test]
    fn werkzeug_pbkdf2_hash_verifies() {
        assert!(verify_password("pw1", WERKZEUG_PW1));
        assert!(!verify_password("pw1 ", WERKZEUG_PW1));
    }

    #[test]
    fn unknown_or_broken_schemes_never_verify() {
        assert!(!verify_password("pw1", "scrypt:32768:8:1$salt$abcd"));
        assert!(!verify_password("pw1", "pbkdf2:sha256:1000$NaClSalt$nothex"));
        assert!(!verify_password("pw1", "pbkdf2:md5:1000$NaClSalt$00"));
        assert!(!verify_password("pw1", ""));
    }
}
