// src/dedup.rs
//! Decide which freshly fetched rows are already stored.
//!
//! `history` is a restartable source of stored rows, **most recent first**.
//! Each call must return a fresh lazy iterator from the newest row; the facet
//! mode calls it once per new row and usually reads only a few rows from it.
//!
//! Modes, picked from the key sets:
//!
//! - **facets given**: for each new row find the most recent stored row with
//!   the same facet values. No such row, or any `fields` value differs: keep.
//!   All `fields` equal: drop.
//! - **only fields given** (suffix splice): compare every new row with the
//!   single most recent stored row. A match means the batch overlaps what is
//!   stored, so everything kept so far (and the match) is discarded. Only the
//!   rows after the last match survive. No stored rows: keep everything.
//! - **neither**: keep everything.
//!
//! The suffix splice is not a true set difference. A batch that re-sends stored
//! rows without containing the newest stored row is kept in full, and a batch
//! that contains it out of order keeps whatever follows it.

use std::collections::BTreeSet;

use tracing::debug;

use crate::record::Record;

pub fn dedup<H, I, E, S>(
    mut history: H,
    new_rows: Vec<Record>,
    facets: &[S],
    fields: &[S],
) -> Result<Vec<Record>, E>
where
    H: FnMut() -> Result<I, E>,
    I: Iterator<Item = Result<Record, E>>,
    S: AsRef<str>,
{
    let facets = key_set(facets);
    let fields = key_set(fields);

    if !facets.is_empty() {
        by_facets(&mut history, new_rows, &facets, &fields)
    } else if !fields.is_empty() {
        splice_suffix(&mut history, new_rows, &fields)
    } else {
        Ok(new_rows)
    }
}

fn key_set<S: AsRef<str>>(keys: &[S]) -> Vec<&str> {
    keys.iter().map(AsRef::as_ref).collect::<BTreeSet<_>>().into_iter().collect()
}

fn by_facets<H, I, E>(
    history: &mut H,
    new_rows: Vec<Record>,
    facets: &[&str],
    fields: &[&str],
) -> Result<Vec<Record>, E>
where
    H: FnMut() -> Result<I, E>,
    I: Iterator<Item = Result<Record, E>>,
{
    let mut kept = Vec::with_capacity(new_rows.len());

    for row in new_rows {
        let mut latest = None;
        for stored in history()? {
            let stored = stored?;
            if row.agrees_on(&stored, facets) {
                latest = Some(stored);
                break;
            }
        }

        match latest {
            Some(stored) if row.agrees_on(&stored, fields) => {
                debug!(?facets, "dropping row already stored for its facet");
            }
            _ => kept.push(row),
        }
    }

    Ok(kept)
}

fn splice_suffix<H, I, E>(
    history: &mut H,
    new_rows: Vec<Record>,
    fields: &[&str],
) -> Result<Vec<Record>, E>
where
    H: FnMut() -> Result<I, E>,
    I: Iterator<Item = Result<Record, E>>,
{
    let Some(last) = history()?.next().transpose()? else {
        return Ok(new_rows);
    };

    let mut kept = Vec::with_capacity(new_rows.len());
    for row in new_rows {
        if row.agrees_on(&last, fields) {
            debug!(dropped = kept.len() + 1, "batch overlaps stored data");
            kept.clear();
        } else {
            kept.push(row);
        }
    }

    Ok(kept)
}
