//! Borrower model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::require_text;
use crate::error::{AppError, AppResult};

/// A registered library member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
pub struct Borrower {
    id: i32,
    name: String,
    /// Unique across all borrowers
    email: String,
}

impl Borrower {
    pub(crate) fn from_new(id: i32, new: NewBorrower) -> Self {
        Self {
            id,
            name: new.name,
            email: new.email,
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Apply an update command; nothing changes if any field is invalid
    pub fn apply_update(&mut self, update: &UpdateBorrower) -> AppResult<()> {
        let name = update
            .name
            .as_deref()
            .map(|n| require_text(n, "Name is required."))
            .transpose()?;
        let email = update
            .email
            .as_deref()
            .map(|e| require_text(e, "Email is required."))
            .transpose()?;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(email) = email {
            self.email = email;
        }
        Ok(())
    }
}

/// A validated borrower that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBorrower {
    name: String,
    email: String,
}

impl NewBorrower {
    pub fn new(name: &str, email: &str) -> AppResult<Self> {
        Ok(Self {
            name: require_text(name, "Name is required.")?,
            email: require_text(email, "Email is required.")?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl TryFrom<&CreateBorrower> for NewBorrower {
    type Error = AppError;

    fn try_from(data: &CreateBorrower) -> AppResult<Self> {
        NewBorrower::new(&data.name, &data.email)
    }
}

/// Create borrower request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBorrower {
    #[validate(length(min = 1, max = 150, message = "Name must be between 1 and 150 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Update borrower request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBorrower {
    #[validate(length(min = 1, max = 150, message = "Name must be between 1 and 150 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_borrower_requires_name_and_email() {
        assert!(NewBorrower::new("", "a@example.com").is_err());
        assert!(NewBorrower::new("Alice", "   ").is_err());
        assert!(NewBorrower::new("Alice", "a@example.com").is_ok());
    }

    #[test]
    fn test_update_keeps_previous_values_on_failure() {
        let mut borrower = Borrower::from_new(1, NewBorrower::new("Alice", "a@example.com").unwrap());
        let update = UpdateBorrower {
            name: Some("Alice Smith".into()),
            email: Some(String::new()),
        };
        assert!(borrower.apply_update(&update).is_err());
        assert_eq!(borrower.name(), "Alice");

        let update = UpdateBorrower {
            email: Some("alice@example.org".into()),
            ..Default::default()
        };
        borrower.apply_update(&update).unwrap();
        assert_eq!(borrower.email(), "alice@example.org");
        assert_eq!(borrower.name(), "Alice");
    }

    #[test]
    fn test_create_request_validates_email_format() {
        let request = CreateBorrower {
            name: "Bob".into(),
            email: "not-an-email".into(),
        };
        assert!(request.validate().is_err());
    }
}
