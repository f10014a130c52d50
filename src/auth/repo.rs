use dashmap::{mapref::entry::Entry, DashMap};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{Profile, Role, User};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    #[error("email already registered")]
    EmailTaken,

    #[error("user {0} not found")]
    UnknownUser(Uuid),
}

/// In-process account store, indexed by id and by normalized email.
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: DashMap<Uuid, User>,
    emails: DashMap<String, Uuid>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a user by normalized email.
    pub fn find_by_email(&self, email: &str) -> Option<User> {
        let id = *self.emails.get(email)?;
        self.find_by_id(id)
    }

    pub fn find_by_id(&self, id: Uuid) -> Option<User> {
        self.users.get(&id).map(|u| u.value().clone())
    }

    /// Create a new user with an already hashed password.
    pub fn create(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
        organization: &str,
    ) -> Result<User, AccountError> {
        match self.emails.entry(email.to_string()) {
            Entry::Occupied(_) => Err(AccountError::EmailTaken),
            Entry::Vacant(slot) => {
                let user = User {
                    id: Uuid::new_v4(),
                    email: email.to_string(),
                    password_hash: password_hash.to_string(),
                    role,
                    organization: organization.to_string(),
                    profile: Profile::default(),
                    created_at: OffsetDateTime::now_utc(),
                };
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(user)
            }
        }
    }

    /// Overwrites the profile fields that are `Some` in `changes`.
    pub fn update_profile(&self, id: Uuid, changes: Profile) -> Result<User, AccountError> {
        let mut user = self.users.get_mut(&id).ok_or(AccountError::UnknownUser(id))?;
        let Profile {
            name,
            phone,
            address,
        } = changes;
        if name.is_some() {
            user.profile.name = name;
        }
        if phone.is_some() {
            user.profile.phone = phone;
        }
        if address.is_some() {
            user.profile.address = address;
        }
        Ok(user.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_find() {
        let dir = UserDirectory::new();
        let user = dir
            .create("chef@spicy.test", "hash", Role::Restaurant, "Spicy Bites")
            .unwrap();
        assert_eq!(dir.find_by_email("chef@spicy.test").unwrap().id, user.id);
        assert_eq!(dir.find_by_id(user.id).unwrap().organization, "Spicy Bites");
        assert!(dir.find_by_email("nobody@spicy.test").is_none());
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let dir = UserDirectory::new();
        dir.create("ops@hope.test", "h1", Role::Ngo, "Hope Foundation")
            .unwrap();
        let err = dir
            .create("ops@hope.test", "h2", Role::Ngo, "Hope Again")
            .unwrap_err();
        assert_eq!(err, AccountError::EmailTaken);
        assert_eq!(
            dir.find_by_email("ops@hope.test").unwrap().organization,
            "Hope Foundation"
        );
    }

    #[test]
    fn profile_update_keeps_unset_fields() {
        let dir = UserDirectory::new();
        let user = dir
            .create("ops@angels.test", "h", Role::Ngo, "Food Angels")
            .unwrap();
        dir.update_profile(
            user.id,
            Profile {
                name: Some("John Doe".into()),
                phone: Some("+1 234 567 890".into()),
                address: None,
            },
        )
        .unwrap();
        let updated = dir
            .update_profile(
                user.id,
                Profile {
                    address: Some("123 Main St".into()),
                    ..Profile::default()
                },
            )
            .unwrap();
        assert_eq!(updated.profile.name.as_deref(), Some("John Doe"));
        assert_eq!(updated.profile.address.as_deref(), Some("123 Main St"));
    }

    #[test]
    fn profile_update_unknown_user() {
        let dir = UserDirectory::new();
        let id = Uuid::new_v4();
        assert_eq!(
            dir.update_profile(id, Profile::default()).unwrap_err(),
            AccountError::UnknownUser(id)
        );
    }
}
