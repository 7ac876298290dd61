use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::core::tokener::{Payload, Tokener};
use crate::error::Error;

/// HS256 signer. Keys and validation rules are built once; expiry is
/// checked without leeway.
#[derive(Clone)]
pub struct JWT {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JWT {
    pub fn new(secret: Vec<u8>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        Self {
            encoding: EncodingKey::from_secret(&secret),
            decoding: DecodingKey::from_secret(&secret),
            validation,
        }
    }
}

impl<P> Tokener<P> for JWT
where
    P: Payload,
{
    fn gen_token(&self, payload: &P) -> Result<String, Error> {
        Ok(encode(&Header::new(Algorithm::HS256), payload, &self.encoding)?)
    }

    fn verify_token(&self, token: &str) -> Result<P, Error> {
        Ok(decode::<P>(token, &self.decoding, &self.validation)?.claims)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Deserialize, Serialize)]
    struct Claim {
        user: String,
        exp: i64,
    }

    impl Payload for Claim {}

    fn in_an_hour() -> i64 {
        (chrono::offset::Utc::now() + chrono::Duration::hours(1)).timestamp()
    }

    #[test]
    fn test_gen_and_verify_token() {
        let jwt = JWT::new(vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 0]);
        let claim = Claim {
            user: "bob@acme.com".into(),
            exp: in_an_hour(),
        };
        let token = jwt.gen_token(&claim).unwrap();
        let c: Claim = jwt.verify_token(&token).unwrap();
        assert_eq!(claim.user, c.user);
    }

    #[test]
    fn test_expired_token_rejected() {
        let jwt = JWT::new(vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 0]);
        let claim = Claim {
            user: "a".into(),
            exp: (chrono::offset::Utc::now() - chrono::Duration::hours(1)).timestamp(),
        };
        let token = jwt.gen_token(&claim).unwrap();
        assert!(<JWT as Tokener<Claim>>::verify_token(&jwt, &token).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let claim = Claim { user: "a".into(), exp: in_an_hour() };
        let token = JWT::new(b"one".to_vec()).gen_token(&claim).unwrap();
        assert!(<JWT as Tokener<Claim>>::verify_token(&JWT::new(b"two".to_vec()), &token).is_err());
    }

    #[test]
    fn test_token_without_expiry_rejected() {
        #[derive(Debug, Deserialize, Serialize)]
        struct Forever {
            user: String,
        }
        impl Payload for Forever {}

        let jwt = JWT::new(b"secret".to_vec());
        let token = jwt.gen_token(&Forever { user: "a".into() }).unwrap();
        assert!(<JWT as Tokener<Forever>>::verify_token(&jwt, &token).is_err());
    }
}
