use block_accounting_domain::{
    OrganizationId, ParticipantId, Timestamps,
    participant::{Employee, OrganizationParticipant, OrganizationUser, User},
};
use block_accounting_store::{InMemoryStore, ParticipantStore};
use chrono::Utc;

use crate::random_bytes;

/// One organization backed by an [`InMemoryStore`].
#[derive(Debug, Clone)]
pub struct OrgFixture {
    store: InMemoryStore,
    organization_id: OrganizationId,
}

impl Default for OrgFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[bon::bon]
impl OrgFixture {
    /// Creates a fresh organization in a fresh store.
    pub fn new() -> Self {
        Self::with_store(InMemoryStore::new())
    }

    /// Creates a fresh organization in `store`, which may already hold other organizations.
    pub fn with_store(store: InMemoryStore) -> Self {
        Self { store, organization_id: OrganizationId::new_v7() }
    }

    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }

    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Registers a user participant with a random seed and public key.
    ///
    /// Users are active unless `active(false)` is given.
    #[builder]
    pub async fn user(
        &self,
        #[builder(into, default = "user".to_owned())] name: String,
        #[builder(default)] admin: bool,
        #[builder(default)] owner: bool,
        #[builder(default = true)] active: bool,
        mnemonic: Option<String>,
    ) -> User {
        let now = Utc::now();

        let mut public_key = vec![0x02];
        public_key.extend(random_bytes(32));

        let user = User::builder()
            .id(ParticipantId::new_v7())
            .name(name)
            .seed(random_bytes(32))
            .public_key(public_key)
            .maybe_mnemonic(mnemonic)
            .maybe_activated_at(active.then_some(now))
            .timestamps(Timestamps::created(now))
            .build();

        let participant: OrganizationParticipant = OrganizationUser::builder()
            .user(user.clone())
            .organization_id(self.organization_id)
            .is_admin(admin)
            .is_owner(owner)
            .timestamps(Timestamps::created(now))
            .build()
            .into();

        self.register(&participant).await;
        user
    }

    /// Registers an employee without a login, holding a random wallet address.
    #[builder]
    pub async fn employee(
        &self,
        #[builder(into, default = "employee".to_owned())] name: String,
        wallet_address: Option<Vec<u8>>,
    ) -> Employee {
        let employee = Employee::builder()
            .id(ParticipantId::new_v7())
            .name(name)
            .organization_id(self.organization_id)
            .wallet_address(wallet_address.unwrap_or_else(|| random_bytes(20)))
            .timestamps(Timestamps::created(Utc::now()))
            .build();

        self.register(&OrganizationParticipant::from(employee.clone())).await;
        employee
    }

    /// Registers an arbitrary participant.
    ///
    /// # Panics
    ///
    /// If the store rejects the participant.
    pub async fn register(&self, participant: &OrganizationParticipant) {
        self.store.add_participant(participant).await.expect("failed to register participant");
    }
}
