use crate::domain::commission::Commission;
use crate::domain::package::{Package, PackageId};
use crate::domain::ports::{CommitOutcome, Ledger, WriteBatch};
use crate::domain::purchase::{Purchase, PurchaseId, PurchaseStatus, WalletId};
use crate::domain::schedule::BenefitSchedule;
use crate::domain::user::{User, UserId};
use crate::error::{EngineError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::{Arc, Mutex};

pub const CF_PURCHASES: &str = "purchases";
pub const CF_USERS: &str = "users";
pub const CF_PACKAGES: &str = "packages";
pub const CF_COMMISSIONS: &str = "commissions";
pub const CF_SCHEDULES: &str = "schedules";
pub const CF_WALLETS: &str = "wallets";

const CF_NAMES: [&str; 6] = [
    CF_PURCHASES,
    CF_USERS,
    CF_PACKAGES,
    CF_COMMISSIONS,
    CF_SCHEDULES,
    CF_WALLETS,
];

/// Persistent ledger backend over RocksDB column families.
///
/// `commit` serializes the whole batch into one `rocksdb::WriteBatch`, which
/// RocksDB applies atomically. The status compare-and-set runs under a
/// process-wide commit mutex; the mutex never outlives a single commit call.
#[derive(Clone)]
pub struct RocksDbLedger {
    db: Arc<DB>,
    commit_lock: Arc<Mutex<()>>,
}

impl RocksDbLedger {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = CF_NAMES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect::<Vec<_>>();
        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            commit_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| EngineError::Persistence(format!("column family {name} not found")))
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, cf: &str, key: u64) -> Result<Option<T>> {
        let cf = self.cf(cf)?;
        match self.db.get_cf(cf, key.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_json<T: serde::Serialize>(
        &self,
        batch: &mut rocksdb::WriteBatch,
        cf: &str,
        key: u64,
        value: &T,
    ) -> Result<()> {
        let cf = self.cf(cf)?;
        batch.put_cf(cf, key.to_be_bytes(), serde_json::to_vec(value)?);
        Ok(())
    }

    /// Seeding entry points, mirroring the in-memory backend.
    pub fn seed_user(&self, user: &User) -> Result<()> {
        let mut batch = rocksdb::WriteBatch::default();
        self.put_json(&mut batch, CF_USERS, user.id.0, user)?;
        self.db.write(batch)?;
        Ok(())
    }

    pub fn seed_package(&self, package: &Package) -> Result<()> {
        let mut batch = rocksdb::WriteBatch::default();
        self.put_json(&mut batch, CF_PACKAGES, package.id.0, package)?;
        self.db.write(batch)?;
        Ok(())
    }

    pub fn seed_purchase(&self, purchase: &Purchase) -> Result<()> {
        let mut batch = rocksdb::WriteBatch::default();
        self.put_json(&mut batch, CF_PURCHASES, purchase.id.0, purchase)?;
        if let Some(wallet) = purchase.assigned_wallet {
            let cf = self.cf(CF_WALLETS)?;
            batch.put_cf(cf, wallet.0.to_be_bytes(), [1u8]);
        }
        self.db.write(batch)?;
        Ok(())
    }

    pub fn wallet_held(&self, wallet: WalletId) -> Result<bool> {
        let cf = self.cf(CF_WALLETS)?;
        Ok(self.db.get_pinned_cf(cf, wallet.0.to_be_bytes())?.is_some())
    }
}

#[async_trait]
impl Ledger for RocksDbLedger {
    async fn purchase(&self, id: PurchaseId) -> Result<Option<Purchase>> {
        self.get_json(CF_PURCHASES, id.0)
    }

    async fn user(&self, id: UserId) -> Result<Option<User>> {
        self.get_json(CF_USERS, id.0)
    }

    async fn package(&self, id: PackageId) -> Result<Option<Package>> {
        self.get_json(CF_PACKAGES, id.0)
    }

    async fn completed_purchases(&self, buyer: UserId) -> Result<u64> {
        let cf = self.cf(CF_PURCHASES)?;
        let mut count = 0u64;
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            let purchase: Purchase = serde_json::from_slice(&value)?;
            if purchase.buyer == buyer && purchase.status == PurchaseStatus::Active {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn commissions_for(&self, purchase: PurchaseId) -> Result<Vec<Commission>> {
        Ok(self
            .get_json::<Vec<Commission>>(CF_COMMISSIONS, purchase.0)?
            .unwrap_or_default())
    }

    async fn schedule_for(&self, purchase: PurchaseId) -> Result<Option<BenefitSchedule>> {
        self.get_json(CF_SCHEDULES, purchase.0)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<CommitOutcome> {
        let _guard = self
            .commit_lock
            .lock()
            .map_err(|_| EngineError::Persistence("commit lock poisoned".into()))?;

        let current = self
            .get_json::<Purchase>(CF_PURCHASES, batch.purchase.id.0)?
            .map(|p| p.status)
            .unwrap_or(batch.purchase.status);
        if current != batch.expected_status {
            return Ok(CommitOutcome::StaleStatus(current));
        }

        let mut writes = rocksdb::WriteBatch::default();
        self.put_json(&mut writes, CF_PURCHASES, batch.purchase.id.0, &batch.purchase)?;

        if !batch.commissions.is_empty() {
            let mut existing = self
                .get_json::<Vec<Commission>>(CF_COMMISSIONS, batch.purchase.id.0)?
                .unwrap_or_default();
            for draft in batch.commissions {
                if existing.iter().all(|c| c.dedup_key() != draft.dedup_key()) {
                    existing.push(draft);
                }
            }
            self.put_json(&mut writes, CF_COMMISSIONS, batch.purchase.id.0, &existing)?;
        }

        if let Some(schedule) = &batch.schedule
            && self
                .get_json::<BenefitSchedule>(CF_SCHEDULES, schedule.purchase.0)?
                .is_none()
        {
            self.put_json(&mut writes, CF_SCHEDULES, schedule.purchase.0, schedule)?;
        }

        if let Some(delta) = batch.package_stats
            && let Some(mut package) = self.get_json::<Package>(CF_PACKAGES, delta.package.0)?
        {
            package.record_activation(delta.revenue);
            self.put_json(&mut writes, CF_PACKAGES, package.id.0, &package)?;
        }

        if let Some(wallet) = batch.release_wallet {
            let cf = self.cf(CF_WALLETS)?;
            // Deleting an absent key is a no-op, so repeated release is safe.
            writes.delete_cf(cf, wallet.0.to_be_bytes());
        }

        self.db.write(writes)?;
        Ok(CommitOutcome::Committed)
    }
}
