//! Organization participant lookup and caller authorization.

use std::sync::Arc;

use block_accounting_domain::{
    OrganizationId, ParticipantId,
    participant::{OrganizationParticipant, User},
};
use block_accounting_store::{ParticipantFilter, ParticipantStore};

use crate::error::{EngineError, Result};

/// Role a caller needs for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Any active user participant.
    Member,
    /// An active user participant flagged as admin.
    Admin,
    /// An active user participant flagged as admin or owner.
    AdminOrOwner,
}

impl Role {
    fn permits(self, participant: &OrganizationParticipant) -> bool {
        match self {
            Self::Member => true,
            Self::Admin => participant.is_admin(),
            Self::AdminOrOwner => participant.is_admin() || participant.is_owner(),
        }
    }
}

/// Resolves participants of an organization on behalf of a caller.
#[derive(Clone)]
pub struct ParticipantDirectory {
    store: Arc<dyn ParticipantStore>,
}

impl ParticipantDirectory {
    pub fn new(store: Arc<dyn ParticipantStore>) -> Self {
        Self { store }
    }

    /// Loads the user behind an authenticated user id, as seen from one organization.
    ///
    /// Activation and roles are not checked here; every operation authorizes on its own.
    #[tracing::instrument(skip_all, fields(%user_id, %organization_id))]
    pub async fn identify(
        &self,
        user_id: ParticipantId,
        organization_id: OrganizationId,
    ) -> Result<User> {
        let filter = ParticipantFilter::builder()
            .organization_id(organization_id)
            .ids(vec![user_id])
            .users_only(true)
            .build();

        self.store
            .participants(&filter)
            .await?
            .into_iter()
            .find_map(|participant| participant.as_user().map(|p| p.user().clone()))
            .ok_or(EngineError::unauthorized("unknown user for the organization"))
    }

    /// Resolves `caller` as an active user participant of the organization holding `role`.
    ///
    /// A missing, inactive or under-privileged caller yields [`EngineError::Unauthorized`].
    #[tracing::instrument(skip_all, fields(caller = %caller.id(), %organization_id, ?role))]
    pub async fn authorize(
        &self,
        caller: &User,
        organization_id: OrganizationId,
        role: Role,
    ) -> Result<OrganizationParticipant> {
        let filter = ParticipantFilter::builder()
            .organization_id(organization_id)
            .ids(vec![caller.id()])
            .users_only(true)
            .build();

        let participant = self
            .store
            .participants(&filter)
            .await?
            .into_iter()
            .next()
            .ok_or(EngineError::unauthorized("caller is not a participant of the organization"))?;

        if !participant.is_active() {
            return Err(EngineError::unauthorized("caller is not an active participant"));
        }

        if !role.permits(&participant) {
            return Err(EngineError::unauthorized("caller lacks the required role"));
        }

        Ok(participant)
    }

    /// Returns the participants matching `filter` after checking that `caller` is a member of
    /// the filter's organization.
    ///
    /// An empty result yields [`EngineError::NotFound`].
    #[tracing::instrument(
        skip_all,
        fields(caller = %caller.id(), organization_id = %filter.organization_id())
    )]
    pub async fn participants(
        &self,
        caller: &User,
        filter: &ParticipantFilter,
    ) -> Result<Vec<OrganizationParticipant>> {
        self.authorize(caller, filter.organization_id(), Role::Member).await?;

        self.find(filter).await
    }

    /// Returns the first participant matching `filter`, checking `caller` the same way
    /// [`participants`](Self::participants) does.
    pub async fn participant(
        &self,
        caller: &User,
        filter: &ParticipantFilter,
    ) -> Result<OrganizationParticipant> {
        self.participants(caller, filter)
            .await?
            .into_iter()
            .next()
            .ok_or(EngineError::not_found("no participant matches the filter"))
    }

    /// Looks participants up without checking the caller. Callers must have authorized the
    /// request already.
    pub(crate) async fn find(
        &self,
        filter: &ParticipantFilter,
    ) -> Result<Vec<OrganizationParticipant>> {
        let participants = self.store.participants(filter).await?;

        if participants.is_empty() {
            return Err(EngineError::not_found("no participant matches the filter"));
        }

        Ok(participants)
    }
}

#[cfg(test)]
mod tests {
    use block_accounting_domain::{Timestamps, participant::OrganizationUser};
    use block_accounting_store::InMemoryStore;
    use chrono::Utc;

    use super::*;

    fn user(activated: bool) -> User {
        User::builder()
            .id(ParticipantId::new_v7())
            .name("carol".into())
            .maybe_activated_at(activated.then(Utc::now))
            .timestamps(Timestamps::created(Utc::now()))
            .build()
    }

    async fn directory_with(
        user: &User,
        organization_id: OrganizationId,
        is_admin: bool,
    ) -> ParticipantDirectory {
        let store = InMemoryStore::new();

        let participant: OrganizationParticipant = OrganizationUser::builder()
            .user(user.clone())
            .organization_id(organization_id)
            .is_admin(is_admin)
            .timestamps(Timestamps::created(Utc::now()))
            .build()
            .into();

        store.add_participant(&participant).await.unwrap();

        ParticipantDirectory::new(Arc::new(store))
    }

    #[tokio::test]
    async fn admin_role_requires_admin_flag() {
        let org = OrganizationId::new_v7();
        let caller = user(true);
        let directory = directory_with(&caller, org, false).await;

        assert!(directory.authorize(&caller, org, Role::Member).await.is_ok());
        assert!(matches!(
            directory.authorize(&caller, org, Role::Admin).await,
            Err(EngineError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn inactive_or_foreign_caller_is_unauthorized() {
        let org = OrganizationId::new_v7();
        let inactive = user(false);
        let directory = directory_with(&inactive, org, true).await;

        assert!(matches!(
            directory.authorize(&inactive, org, Role::Member).await,
            Err(EngineError::Unauthorized(_))
        ));
        assert!(matches!(
            directory.authorize(&inactive, OrganizationId::new_v7(), Role::Member).await,
            Err(EngineError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn empty_lookup_is_not_found() {
        let org = OrganizationId::new_v7();
        let caller = user(true);
        let directory = directory_with(&caller, org, false).await;

        let filter = ParticipantFilter::builder()
            .organization_id(org)
            .ids(vec![ParticipantId::new_v7()])
            .build();

        let result = directory.participant(&caller, &filter).await;

        assert!(matches!(result, Err(EngineError::NotFound(_))));
    }

    #[tokio::test]
    async fn identify_loads_the_user_of_the_organization() {
        let org = OrganizationId::new_v7();
        let caller = user(false);
        let directory = directory_with(&caller, org, false).await;

        assert_eq!(directory.identify(caller.id(), org).await.unwrap(), caller);
        assert!(matches!(
            directory.identify(caller.id(), OrganizationId::new_v7()).await,
            Err(EngineError::Unauthorized(_))
        ));
    }
}
