use serde::{Deserialize, Serialize};

/// Distinguishes short-lived access tokens from long-lived refresh tokens.
/// Only refresh tokens are ever blacklisted; access tokens simply expire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims carried by both token kinds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthClaims {
    pub sub: String, // user id
    pub username: String,
    pub player_id: Option<String>,
    pub is_staff: bool,
    pub kind: TokenKind,
    pub jti: String, // unique token id, blacklist key for refresh tokens
    pub exp: usize,  // Expiration timestamp (standard JWT claim)
    pub iat: usize,  // Issued at timestamp (standard JWT claim)
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response for a successful login: a fresh token pair plus the caller's
/// player identity so clients can load their profile immediately
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub player_id: Option<String>,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DetailResponse {
    pub detail: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthenticatedUserResponse {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub is_staff: bool,
    pub player_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_claims_serialization() {
        let claims = AuthClaims {
            sub: "user-1".to_string(),
            username: "alice".to_string(),
            player_id: Some("player-1".to_string()),
            is_staff: false,
            kind: TokenKind::Access,
            jti: "token-id".to_string(),
            exp: 1234567890,
            iat: 1234567800,
        };

        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains("\"kind\":\"access\""));
        assert!(json.contains("alice"));

        let deserialized: AuthClaims = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, claims);
    }

    #[test]
    fn test_token_kind_roundtrip() {
        let json = serde_json::to_string(&TokenKind::Refresh).unwrap();
        assert_eq!(json, "\"refresh\"");

        let kind: TokenKind = serde_json::from_str("\"access\"").unwrap();
        assert_eq!(kind, TokenKind::Access);
    }
}
