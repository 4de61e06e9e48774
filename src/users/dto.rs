use serde::{Deserialize, Deserializer, Serialize};

use crate::users::repo_types::{User, UserId};

/// Request body for create and update. Absent or `null` fields deserialize as empty.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserPayload {
    #[serde(deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub password: String,
}

fn null_as_empty<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

/// Public part of the user returned to the client.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserResponse {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
        }
    }
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_never_carries_password() {
        let user = User {
            id: 7,
            name: "Ann".into(),
            email: "ann@x.com".into(),
            password: "secret".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(UserResponse::from(&user)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 7, "name": "Ann", "email": "ann@x.com"})
        );
    }

    #[test]
    fn empty_response_is_zero_valued() {
        let json = serde_json::to_string(&UserResponse::default()).unwrap();
        assert_eq!(json, r#"{"id":0,"name":"","email":""}"#);
    }

    #[test]
    fn payload_missing_fields_default_to_empty() {
        let p: UserPayload = serde_json::from_str(r#"{"name":"Ann"}"#).unwrap();
        assert_eq!(p.name, "Ann");
        assert!(p.email.is_empty());
        assert!(p.password.is_empty());
    }

    #[test]
    fn payload_null_fields_become_empty() {
        let p: UserPayload =
            serde_json::from_str(r#"{"name":null,"email":"a@x.com","password":null}"#).unwrap();
        assert!(p.name.is_empty());
        assert_eq!(p.email, "a@x.com");
        assert!(p.password.is_empty());
    }

    #[test]
    fn payload_rejects_wrong_types() {
        assert!(serde_json::from_str::<UserPayload>(r#"{"name":5}"#).is_err());
    }
}
