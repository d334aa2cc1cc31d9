//! Person directory use-case service.

use crate::model::person::{Person, PersonId, PersonRole};
use crate::repo::person_repo::PersonRepository;
use crate::repo::RepoResult;

/// Input for registering a person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonDraft {
    pub name: String,
    pub national_id: String,
    pub role: PersonRole,
    pub email: String,
    pub phone: Option<String>,
}

pub struct PersonService<R: PersonRepository> {
    repo: R,
}

impl<R: PersonRepository> PersonService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a person. Duplicate national id or email yields
    /// `RepoError::Conflict`.
    pub fn create(&self, draft: &PersonDraft) -> RepoResult<Person> {
        let mut person = Person::new(
            draft.name.trim(),
            draft.national_id.trim(),
            draft.role,
            draft.email.trim(),
        );
        person.phone = draft
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|phone| !phone.is_empty())
            .map(str::to_string);
        self.repo.create_person(&person)?;
        Ok(person)
    }

    pub fn update(&self, person: &Person) -> RepoResult<()> {
        self.repo.update_person(person)
    }

    pub fn get(&self, id: PersonId) -> RepoResult<Option<Person>> {
        self.repo.get_person(id)
    }

    pub fn get_by_national_id(&self, national_id: &str) -> RepoResult<Option<Person>> {
        self.repo.get_person_by_national_id(national_id.trim())
    }

    pub fn get_by_email(&self, email: &str) -> RepoResult<Option<Person>> {
        self.repo.get_person_by_email(email.trim())
    }

    pub fn list(&self, role: Option<PersonRole>) -> RepoResult<Vec<Person>> {
        self.repo.list_persons(role)
    }
}
