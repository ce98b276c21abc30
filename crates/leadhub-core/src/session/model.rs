//! Session state and the credentials that change it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{HubError, Result};

/// The authenticated admin, as reported by the identity check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Reads the identity out of a `/check` response body.
    ///
    /// The user may be wrapped in `user` or `data`, or be the body itself.
    /// Null, `false` and `{success: false}` bodies mean nobody is logged in.
    pub fn from_check_response(body: &Value) -> Result<Option<Self>> {
        let candidate = match body {
            Value::Object(map) => {
                if map.get("success").and_then(Value::as_bool) == Some(false) {
                    return Ok(None);
                }
                ["user", "data"]
                    .iter()
                    .find_map(|key| map.get(*key).filter(|v| v.is_object()))
                    .unwrap_or(body)
            }
            Value::Null | Value::Bool(false) => return Ok(None),
            other => {
                return Err(HubError::Serialization {
                    format: "JSON".to_string(),
                    message: format!("unexpected identity payload: {}", other),
                });
            }
        };
        Ok(Some(serde_json::from_value(candidate.clone())?))
    }

    /// Best label for display: name, then e-mail, then id.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .or(self.id.as_deref())
            .unwrap_or("admin")
    }
}

/// The three-way session state.
///
/// `Loading` is inconclusive: consumers must not treat it as logged out.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Loading,
    Authenticated(User),
    Unauthenticated,
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// Login form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_filled(&[("email", &self.email), ("password", &self.password)])
    }
}

/// Settings form for replacing the admin login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsUpdate {
    pub old_email: String,
    pub old_password: String,
    pub new_email: String,
    pub new_password: String,
}

impl CredentialsUpdate {
    pub fn validate(&self) -> Result<()> {
        check_filled(&[
            ("oldEmail", &self.old_email),
            ("oldPassword", &self.old_password),
            ("newEmail", &self.new_email),
            ("newPassword", &self.new_password),
        ])
    }
}

fn check_filled(fields: &[(&str, &String)]) -> Result<()> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(HubError::validation(missing))
    }
}
