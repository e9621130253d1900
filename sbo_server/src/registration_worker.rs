use std::time::Duration;

use log::*;
use sagex3_tools::{SageX3Api, SageX3Config};
use sbo_engine::{SqliteDatabase, TransactionApi};
use tokio::task::JoinHandle;

use crate::integrations::sage_x3::InvoiceRegistrar;

/// Starts the registration worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// The worker periodically scans for `New` and `Failed` transactions and sends them to Sage X3 in small batches, so
/// a transient failure is retried on a later run. Failures for individual transactions are logged and do not stop
/// the run.
pub fn start_registration_worker(
    db: SqliteDatabase,
    sage_config: SageX3Config,
    interval: Duration,
    batch_size: i64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let sage = match SageX3Api::new(sage_config) {
            Ok(sage) => sage,
            Err(e) => {
                error!("🕰️ Could not create the Sage X3 client, registration worker not started. {e}");
                return;
            },
        };
        let api = TransactionApi::new(db.clone());
        let registrar = InvoiceRegistrar::new(TransactionApi::new(db), sage);
        let mut timer = tokio::time::interval(interval);
        info!("🕰️ Invoice registration worker started");
        loop {
            timer.tick().await;
            let batch = match api.registrable_transactions(batch_size).await {
                Ok(batch) => batch,
                Err(e) => {
                    error!("🕰️ Could not fetch registrable transactions: {e}");
                    continue;
                },
            };
            if batch.is_empty() {
                trace!("🕰️ No transactions waiting for registration");
                continue;
            }
            info!("🕰️ Registering {} transactions with Sage X3", batch.len());
            for transaction in batch {
                let reference = transaction.transaction_id;
                match registrar.register(&reference).await {
                    Ok(result) => {
                        info!(
                            "🕰️ Transaction [{reference}]: {} {}",
                            result.status,
                            result.document_number.as_deref().unwrap_or("")
                        );
                    },
                    Err(e) => {
                        error!("🕰️ Could not register transaction [{reference}]: {e}");
                    },
                }
            }
        }
    })
}
