//! Bearer token decoding/validation: decode, check signature, check expiry.
//! Token issuance is out of scope — tokens are externally issued.

use crate::auth::Role;
use crate::ids::{TenantId, UserId};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub tenant_id: TenantId,
    pub role: Role,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct TokenValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn validate(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding_key, &self.validation).map(|data| data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn issue(secret: &str, exp: i64) -> String {
        let claims = Claims {
            sub: UserId::new(),
            tenant_id: TenantId::new(),
            role: Role::Waiter,
            exp,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn validates_a_well_formed_token() {
        let secret = "test-secret";
        let token = issue(secret, chrono::Utc::now().timestamp() + 3600);
        let validator = TokenValidator::new(secret);
        assert!(validator.validate(&token).is_ok());
    }

    #[test]
    fn rejects_an_expired_token() {
        let secret = "test-secret";
        let token = issue(secret, chrono::Utc::now().timestamp() - 3600);
        let validator = TokenValidator::new(secret);
        assert!(validator.validate(&token).is_err());
    }

    #[test]
    fn rejects_token_signed_with_wrong_secret() {
        let token = issue("wrong-secret", chrono::Utc::now().timestamp() + 3600);
        let validator = TokenValidator::new("test-secret");
        assert!(validator.validate(&token).is_err());
    }
}
