//! インデックス → コンテンツID → 詳細 の並行解決
//!
//! 各インデックスの解決は独立して進むが、結果はインデックス順に集めてから
//! 呼び出し元に返す。途中経過がビューに見えることはない。

use crate::error::PicWitnessError;
use crate::ledger::Ledger;
use futures::stream::{self, StreamExt};
use pic_witness_common::{ContentId, Item, ResolutionGap};
use std::time::Duration;

/// リフレッシュ1回分の結果
#[derive(Debug, Default)]
pub struct Resolution {
    pub items: Vec<Item>,
    pub gaps: Vec<ResolutionGap>,
}

struct ChainFailure {
    content_id: Option<ContentId>,
    error: PicWitnessError,
}

async fn resolve_one(ledger: &dyn Ledger, index: u64) -> Result<Item, ChainFailure> {
    let content_id = ledger
        .item_id_at(index)
        .await
        .map_err(|error| ChainFailure { content_id: None, error })?;

    let details = match ledger.item_details(&content_id).await {
        Ok(details) => details,
        Err(error) => {
            return Err(ChainFailure {
                content_id: Some(content_id),
                error,
            })
        }
    };

    Ok(Item::from_details(content_id, details))
}

/// `[0, count)` を最大 `concurrency` 並列で解決する
pub async fn resolve_items(
    ledger: &dyn Ledger,
    count: u64,
    concurrency: usize,
    timeout: Duration,
) -> Resolution {
    let outcomes: Vec<(u64, Result<Item, ChainFailure>)> = stream::iter(0..count)
        .map(|index| async move {
            let outcome = match tokio::time::timeout(timeout, resolve_one(ledger, index)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(ChainFailure {
                    content_id: None,
                    error: PicWitnessError::Timeout(format!(
                        "index {} did not resolve in {:?}",
                        index, timeout
                    )),
                }),
            };
            (index, outcome)
        })
        // buffered は完了順ではなく投入順に返す
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut resolution = Resolution::default();
    for (index, outcome) in outcomes {
        match outcome {
            Ok(item) => {
                tracing::debug!(index, content_id = %item.content_id, "解決");
                resolution.items.push(item);
            }
            Err(failure) => {
                tracing::warn!(index, error = %failure.error, "写真を解決できませんでした");
                resolution.gaps.push(ResolutionGap {
                    index,
                    content_id: failure.content_id,
                    reason: failure.error.to_string(),
                });
            }
        }
    }

    resolution
}
