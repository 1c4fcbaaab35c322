use crate::domain::command::TransitionReceipt;
use crate::domain::commission::{Commission, CommissionKind};
use crate::domain::purchase::Purchase;
use crate::error::Result;
use std::io::Write;

/// Writes receipts and final state as CSV rows tagged by record type.
///
/// Row shapes:
/// `receipt,<purchase>,<status>,<idempotent>`
/// `purchase,<id>,<status>,<wallet|->`
/// `commission,<purchase>,<recipient>,<level>,<kind>,<amount>`
pub struct SummaryWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> SummaryWriter<W> {
    pub fn new(sink: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .flexible(true)
            .has_headers(false)
            .from_writer(sink);
        Self { writer }
    }

    pub fn write_receipt(&mut self, receipt: &TransitionReceipt) -> Result<()> {
        self.writer.write_record([
            "receipt",
            &receipt.purchase_id.0.to_string(),
            &receipt.status.to_string(),
            &receipt.idempotent.to_string(),
        ])?;
        Ok(())
    }

    pub fn write_purchase(&mut self, purchase: &Purchase) -> Result<()> {
        let wallet = purchase
            .assigned_wallet
            .map(|w| w.0.to_string())
            .unwrap_or_else(|| "-".into());
        self.writer.write_record([
            "purchase",
            &purchase.id.0.to_string(),
            &purchase.status.to_string(),
            &wallet,
        ])?;
        Ok(())
    }

    pub fn write_commission(&mut self, commission: &Commission) -> Result<()> {
        let kind = match commission.kind {
            CommissionKind::Level => "level",
            CommissionKind::ParentBonus => "parent_bonus",
        };
        self.writer.write_record([
            "commission",
            &commission.purchase.0.to_string(),
            &commission.recipient.0.to_string(),
            &commission.level.to_string(),
            kind,
            &commission.amount.value().normalize().to_string(),
        ])?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
