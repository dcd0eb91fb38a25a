//! Local/remote snapshot merge
//!
//! Entries are keyed by id. Every local quote is inserted first, then every remote
//! quote, overwriting on collision. An id keeps the position of its first insertion
//! even when its value is replaced.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::quote::Quote;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    /// Local ids the remote did not touch
    pub kept_local: usize,
    /// Local ids whose value the remote replaced
    pub replaced: usize,
    /// Ids only the remote had
    pub added: usize,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Origin {
    Local,
    Replaced,
    Remote,
}

pub fn merge(local: &[Quote], remote: &[Quote]) -> Vec<Quote> {
    merge_with_report(local, remote).0
}

pub fn merge_with_report(local: &[Quote], remote: &[Quote]) -> (Vec<Quote>, MergeReport) {
    let mut merged: Vec<(Quote, Origin)> = Vec::with_capacity(local.len() + remote.len());
    let mut positions: HashMap<u64, usize> = HashMap::with_capacity(merged.capacity());

    for quote in local {
        match positions.get(&quote.id) {
            Some(&idx) => merged[idx].0 = quote.clone(),
            None => {
                positions.insert(quote.id, merged.len());
                merged.push((quote.clone(), Origin::Local));
            }
        }
    }

    for quote in remote {
        match positions.get(&quote.id) {
            Some(&idx) => {
                let slot = &mut merged[idx];
                slot.0 = quote.clone();
                if slot.1 == Origin::Local {
                    slot.1 = Origin::Replaced;
                }
            }
            None => {
                positions.insert(quote.id, merged.len());
                merged.push((quote.clone(), Origin::Remote));
            }
        }
    }

    let mut report = MergeReport::default();
    let quotes = merged
        .into_iter()
        .map(|(quote, origin)| {
            match origin {
                Origin::Local => report.kept_local += 1,
                Origin::Replaced => report.replaced += 1,
                Origin::Remote => report.added += 1,
            }
            quote
        })
        .collect();

    (quotes, report)
}
