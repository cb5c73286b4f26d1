//! Batch upload of work records into a Notion database.
//!
//! Items are created one at a time in input order. A failed item never stops
//! the ones after it; each failure keeps its original payload so the caller
//! can show or resubmit it. Notion allows roughly 2700 requests per 15
//! minutes and nothing here throttles against that.
use tracing::{info, instrument, warn};

use crate::error::{ErrorCode, ErrorResult};
use crate::model::{Record, UploadItem};
use crate::notion::NotionClient;

#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Created(Record),
    Failed {
        message: String,
        code: ErrorCode,
        item: UploadItem,
    },
}

impl UploadOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, UploadOutcome::Failed { .. })
    }

    /// Boundary form of a failure, carrying the original item as `data`.
    pub fn into_error_result(self) -> Option<ErrorResult> {
        match self {
            UploadOutcome::Created(_) => None,
            UploadOutcome::Failed {
                message,
                code,
                item,
            } => Some(ErrorResult::new(message, code).with_data(item.to_value())),
        }
    }
}

/// Create one page per item, strictly sequentially. Returns exactly one
/// outcome per input item, in input order.
///
/// Items without a parent are sent to `default_parent` when one is given; a
/// failed outcome still carries the item as the caller supplied it.
#[instrument(skip_all, fields(items = items.len()))]
pub async fn upload_works(
    client: &NotionClient,
    items: Vec<UploadItem>,
    default_parent: Option<&str>,
    credential: Option<&str>,
) -> Vec<UploadOutcome> {
    let total = items.len();
    let mut outcomes = Vec::with_capacity(total);

    for (index, item) in items.into_iter().enumerate() {
        let result = match default_parent {
            Some(db) if !item.has_parent() => {
                client
                    .create_page(&item.clone().with_default_parent(db), credential)
                    .await
            }
            _ => client.create_page(&item, credential).await,
        };
        let outcome = match result {
            Ok(record) => {
                info!(index, page_id = %record.id, "work uploaded");
                UploadOutcome::Created(record)
            }
            Err(err) => {
                warn!(index, code = %err.code, message = %err.message, "work upload failed");
                UploadOutcome::Failed {
                    message: err.message,
                    code: err.code,
                    item,
                }
            }
        };
        outcomes.push(outcome);
    }

    let failed = outcomes.iter().filter(|o| o.is_failed()).count();
    info!(total, failed, "upload batch finished");
    outcomes
}

/// The failed subset, as reported to the client. An empty list means every
/// item was created.
pub fn failures(outcomes: Vec<UploadOutcome>) -> Vec<ErrorResult> {
    outcomes
        .into_iter()
        .filter_map(UploadOutcome::into_error_result)
        .collect()
}
