use serde::{Deserialize, Serialize};

/// Visitor role. Authoritative only as stored server-side; never accepted
/// from client-supplied state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Parses a stored role value, defaulting to `user` for anything
    /// unrecognized or absent.
    pub fn parse_or_default(raw: &str) -> Role {
        match raw {
            "admin" => Role::Admin,
            _ => Role::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

/// Optional profile fields used to prefill the checkout form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_role_defaults_to_user() {
        assert_eq!(Role::parse_or_default("admin"), Role::Admin);
        assert_eq!(Role::parse_or_default("superuser"), Role::User);
        assert_eq!(Role::parse_or_default(""), Role::User);
    }
}
