use chrono::{DateTime, Utc};

use crate::model::ids::{ChatId, UserId};

/// Identity record of a chat user as reported by the transport.
///
/// Profile fields are optional; blank strings are normalized to `None` so an
/// unset value never collides with a real one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    first_name: Option<String>,
    last_name: Option<String>,
    username: Option<String>,
    language_code: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
}

/// Profile fields supplied by the transport on each inbound event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub language_code: Option<String>,
}

impl User {
    #[must_use]
    pub fn new(id: UserId, profile: UserProfile, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            first_name: normalize_optional(profile.first_name),
            last_name: normalize_optional(profile.last_name),
            username: normalize_optional(profile.username),
            language_code: normalize_optional(profile.language_code),
            active: true,
            created_at,
        }
    }

    /// Rehydrate a user from storage.
    #[must_use]
    pub fn from_persisted(
        id: UserId,
        profile: UserProfile,
        active: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            active,
            ..Self::new(id, profile, created_at)
        }
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    #[must_use]
    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    #[must_use]
    pub fn language_code(&self) -> Option<&str> {
        self.language_code.as_deref()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The private chat with this user shares the user's id.
    #[must_use]
    pub fn private_chat(&self) -> ChatId {
        ChatId::new(self.id.value())
    }

    /// Best-effort human readable name for greetings.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (self.first_name(), self.last_name(), self.username()) {
            (Some(first), Some(last), _) => format!("{first} {last}"),
            (Some(first), None, _) => first.to_owned(),
            (None, _, Some(username)) => format!("@{username}"),
            _ => format!("user {}", self.id),
        }
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn blank_profile_fields_become_none() {
        let user = User::new(
            UserId::new(7),
            UserProfile {
                first_name: Some("  ".into()),
                username: Some(" amina ".into()),
                ..UserProfile::default()
            },
            fixed_now(),
        );

        assert_eq!(user.first_name(), None);
        assert_eq!(user.username(), Some("amina"));
        assert!(user.is_active());
    }

    #[test]
    fn display_name_falls_back_to_id() {
        let user = User::new(UserId::new(42), UserProfile::default(), fixed_now());
        assert_eq!(user.display_name(), "user 42");
        assert_eq!(user.private_chat(), ChatId::new(42));
    }
}
