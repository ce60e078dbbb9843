//! Application directory protocol.

use async_trait::async_trait;

use crate::error::DirectoryError;
use crate::message::Application;
use crate::types::{ApplicationId, UserId};

/// Resolves applications and their owners.
#[async_trait]
pub trait ApplicationDirectory: Send + Sync {
    /// All applications owned by a user.
    async fn applications_owned_by(&self, user_id: UserId) -> Result<Vec<Application>, DirectoryError>;

    /// Look up a single application.
    async fn get_application(
        &self,
        application_id: ApplicationId,
    ) -> Result<Option<Application>, DirectoryError>;

    /// The user owning an application, if the application exists.
    async fn owner_of(&self, application_id: ApplicationId) -> Result<Option<UserId>, DirectoryError> {
        Ok(self.get_application(application_id).await?.map(|app| app.user_id))
    }
}
