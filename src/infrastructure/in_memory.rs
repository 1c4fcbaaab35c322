use crate::domain::commission::Commission;
use crate::domain::package::{Package, PackageId};
use crate::domain::ports::{CommitOutcome, Ledger, WriteBatch};
use crate::domain::purchase::{Purchase, PurchaseId, PurchaseStatus, WalletId};
use crate::domain::schedule::BenefitSchedule;
use crate::domain::user::{User, UserId};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct LedgerState {
    purchases: HashMap<PurchaseId, Purchase>,
    users: HashMap<UserId, User>,
    packages: HashMap<PackageId, Package>,
    commissions: HashMap<PurchaseId, Vec<Commission>>,
    schedules: HashMap<PurchaseId, BenefitSchedule>,
    held_wallets: HashSet<WalletId>,
}

/// In-memory ledger backend.
///
/// The whole state sits behind one `RwLock`: `commit` takes the write guard
/// once, which is what makes the batch atomic and isolated — readers and
/// concurrent commits observe either none of a batch or all of it. The guard
/// never outlives a single call.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeding entry points for checkout-created records and test fixtures.
    pub async fn seed_user(&self, user: User) {
        self.state.write().await.users.insert(user.id, user);
    }

    pub async fn seed_package(&self, package: Package) {
        self.state.write().await.packages.insert(package.id, package);
    }

    pub async fn seed_purchase(&self, purchase: Purchase) {
        let mut state = self.state.write().await;
        if let Some(wallet) = purchase.assigned_wallet {
            state.held_wallets.insert(wallet);
        }
        state.purchases.insert(purchase.id, purchase);
    }

    /// Whether a wallet slot is still held by some purchase.
    pub async fn wallet_held(&self, wallet: WalletId) -> bool {
        self.state.read().await.held_wallets.contains(&wallet)
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn purchase(&self, id: PurchaseId) -> Result<Option<Purchase>> {
        Ok(self.state.read().await.purchases.get(&id).cloned())
    }

    async fn user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn package(&self, id: PackageId) -> Result<Option<Package>> {
        Ok(self.state.read().await.packages.get(&id).cloned())
    }

    async fn completed_purchases(&self, buyer: UserId) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state
            .purchases
            .values()
            .filter(|p| p.buyer == buyer && p.status == PurchaseStatus::Active)
            .count() as u64)
    }

    async fn commissions_for(&self, purchase: PurchaseId) -> Result<Vec<Commission>> {
        Ok(self
            .state
            .read()
            .await
            .commissions
            .get(&purchase)
            .cloned()
            .unwrap_or_default())
    }

    async fn schedule_for(&self, purchase: PurchaseId) -> Result<Option<BenefitSchedule>> {
        Ok(self.state.read().await.schedules.get(&purchase).cloned())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<CommitOutcome> {
        let mut state = self.state.write().await;

        // Compare-and-set on the purchase status under the write guard: a
        // concurrent commit that got here first already moved the status.
        let current = state
            .purchases
            .get(&batch.purchase.id)
            .map(|p| p.status)
            .unwrap_or(batch.purchase.status);
        if current != batch.expected_status {
            return Ok(CommitOutcome::StaleStatus(current));
        }

        state.purchases.insert(batch.purchase.id, batch.purchase.clone());

        if !batch.commissions.is_empty() {
            let existing = state.commissions.entry(batch.purchase.id).or_default();
            for draft in batch.commissions {
                // Uniqueness per (purchase, recipient, level, kind),
                // enforced defensively even though the CAS already rules out
                // double activation.
                if existing.iter().all(|c| c.dedup_key() != draft.dedup_key()) {
                    existing.push(draft);
                }
            }
        }

        if let Some(schedule) = batch.schedule {
            state.schedules.entry(schedule.purchase).or_insert(schedule);
        }

        if let Some(delta) = batch.package_stats
            && let Some(package) = state.packages.get_mut(&delta.package)
        {
            package.record_activation(delta.revenue);
        }

        if let Some(wallet) = batch.release_wallet {
            // Safe on an already-released wallet.
            state.held_wallets.remove(&wallet);
        }

        Ok(CommitOutcome::Committed)
    }
}
