//! Client update builder.

use serde::{Deserialize, Serialize};

use super::{SetClauses, double_option};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub company: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

impl ClientUpdate {
    pub(crate) fn to_set_clauses(&self) -> SetClauses {
        let mut sets = SetClauses::default();
        if let Some(ref name) = self.name {
            sets.push("name", name.clone());
        }
        if let Some(ref email) = self.email {
            sets.push_opt("email", email.clone());
        }
        if let Some(ref phone) = self.phone {
            sets.push_opt("phone", phone.clone());
        }
        if let Some(ref company) = self.company {
            sets.push_opt("company", company.clone());
        }
        if let Some(ref notes) = self.notes {
            sets.push_opt("notes", notes.clone());
        }
        sets
    }
}

pub struct ClientUpdateBuilder(ClientUpdate);

impl ClientUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(ClientUpdate::default())
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.0.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn email(mut self, email: Option<String>) -> Self {
        self.0.email = Some(email);
        self
    }

    #[must_use]
    pub fn phone(mut self, phone: Option<String>) -> Self {
        self.0.phone = Some(phone);
        self
    }

    #[must_use]
    pub fn company(mut self, company: Option<String>) -> Self {
        self.0.company = Some(company);
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.0.notes = Some(notes);
        self
    }

    #[must_use]
    pub fn build(self) -> ClientUpdate {
        self.0
    }
}

impl Default for ClientUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
