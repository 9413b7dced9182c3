// Projections of Keycloak admin API representations.
// Known fields are typed; everything else is kept in `extra` and written back
// out unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ==================================================================================================
// Realms (GET /admin/realms)
// ==================================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealmSummary {
    pub id: String,
    pub realm: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_required: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_allowed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_with_email_allowed: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ==================================================================================================
// Users (GET /admin/realms/{realm}/users)
// ==================================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_timestamp: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ==================================================================================================
// Single user (GET /admin/realms/{realm}/users/{id})
// ==================================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    pub id: String,
    pub username: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_actions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub federation_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totp: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_realm_keeps_unknown_fields() {
        let raw = json!({
            "id": "master",
            "realm": "master",
            "displayName": "Keycloak",
            "enabled": true,
            "sslRequired": "external",
            "bruteForceProtected": false,
            "smtpServer": {"host": "mail"}
        });

        let realm: RealmSummary = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(realm.display_name.as_deref(), Some("Keycloak"));
        assert_eq!(realm.ssl_required.as_deref(), Some("external"));
        assert_eq!(realm.extra.get("bruteForceProtected"), Some(&json!(false)));

        assert_eq!(serde_json::to_value(&realm).unwrap(), raw);
    }

    #[test]
    fn test_unset_fields_are_omitted() {
        let realm: RealmSummary =
            serde_json::from_value(json!({"id": "t", "realm": "t", "displayName": null}))
                .unwrap();
        assert_eq!(
            serde_json::to_value(&realm).unwrap(),
            json!({"id": "t", "realm": "t"})
        );
    }

    #[test]
    fn test_realm_requires_id_and_name() {
        assert!(serde_json::from_value::<RealmSummary>(json!({"realm": "t"})).is_err());
        assert!(serde_json::from_value::<RealmSummary>(json!({"id": "t"})).is_err());
    }

    #[test]
    fn test_user_summary_camel_case() {
        let user: UserSummary = serde_json::from_value(json!({
            "id": "user-123",
            "username": "john.doe",
            "enabled": true,
            "firstName": "John",
            "emailVerified": false,
            "createdTimestamp": 1609459200000i64,
            "totp": false
        }))
        .unwrap();

        assert_eq!(user.first_name.as_deref(), Some("John"));
        assert_eq!(user.email_verified, Some(false));
        assert_eq!(user.created_timestamp, Some(1_609_459_200_000));
        assert_eq!(user.extra.get("totp"), Some(&json!(false)));
    }

    #[test]
    fn test_user_detail_round_trips_nested_fields() {
        let raw = json!({
            "id": "user-123",
            "username": "john.doe",
            "enabled": true,
            "attributes": {"department": ["engineering"]},
            "requiredActions": [],
            "access": {"manageGroupMembership": true}
        });

        let user: UserDetail = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(user.required_actions, Some(vec![]));
        assert!(user.extra.contains_key("access"));
        assert_eq!(serde_json::to_value(&user).unwrap(), raw);
    }
}
