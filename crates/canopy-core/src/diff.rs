//! Edit scripts between two ordered sequences.
//!
//! Items matched by the longest ordered matching stay where they are; other
//! surviving items are moved, the rest are removed or inserted. Operations are
//! meant to be applied in order against one mutable array that starts out as
//! `before`.

/// One step of an edit script.
///
/// `Move` removes `count` items at `from` and re-inserts them so the first one
/// lands at `to`, where `to` is an index into the array after the removal.
#[derive(Clone, Debug, PartialEq)]
pub enum Patch<U> {
    Insert { index: usize, values: Vec<U> },
    Remove { index: usize, count: usize },
    Move { from: usize, to: usize, count: usize },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Slot {
    Old(usize),
    New(usize),
}

pub fn diff<T, U: Clone>(before: &[T], after: &[U], equal: impl Fn(&T, &U) -> bool) -> Vec<Patch<U>> {
    let prefix = before
        .iter()
        .zip(after)
        .take_while(|(b, a)| equal(b, a))
        .count();
    let suffix = before[prefix..]
        .iter()
        .rev()
        .zip(after[prefix..].iter().rev())
        .take_while(|(b, a)| equal(b, a))
        .count();
    let old = &before[prefix..before.len() - suffix];
    let new = &after[prefix..after.len() - suffix];

    let mut script = Vec::new();
    if old.is_empty() && new.is_empty() {
        return script;
    }
    if old.is_empty() {
        script.push(Patch::Insert {
            index: prefix,
            values: new.to_vec(),
        });
        return script;
    }
    if new.is_empty() {
        script.push(Patch::Remove {
            index: prefix,
            count: old.len(),
        });
        return script;
    }

    // Target slot for every position of `new`, and which old items survive.
    let mut target: Vec<Slot> = (0..new.len()).map(Slot::New).collect();
    let mut stable = vec![false; new.len()];
    let mut used = vec![false; old.len()];
    for (i, j) in ordered_matching(old, new, &equal) {
        target[j] = Slot::Old(i);
        stable[j] = true;
        used[i] = true;
    }
    for j in 0..new.len() {
        if stable[j] {
            continue;
        }
        if let Some(i) = (0..old.len()).find(|&i| !used[i] && equal(&old[i], &new[j])) {
            used[i] = true;
            target[j] = Slot::Old(i);
        }
    }

    edit_script(old.len(), new, prefix, &target, &stable, &used)
}

/// Edit script for a pairing decided by the caller: `partners[j]` is the index
/// of the item of the old sequence (of length `old_len`) that new item `j`
/// keeps. Each old index may appear at most once. Inserted values are indices
/// into `partners`.
///
/// Stable items come from a longest increasing run over the partners, so the
/// matching costs `O(m log m)` time and linear memory.
pub fn diff_paired(old_len: usize, partners: &[Option<usize>]) -> Vec<Patch<usize>> {
    let mut target: Vec<Slot> = (0..partners.len()).map(Slot::New).collect();
    let mut used = vec![false; old_len];
    for (j, partner) in partners.iter().enumerate() {
        if let Some(i) = *partner {
            target[j] = Slot::Old(i);
            used[i] = true;
        }
    }
    let mut stable = vec![false; partners.len()];
    for j in longest_increasing(partners) {
        stable[j] = true;
    }
    let indices: Vec<usize> = (0..partners.len()).collect();
    edit_script(old_len, &indices, 0, &target, &stable, &used)
}

/// Positions `j` of a longest strictly increasing run of `partners[j]`.
fn longest_increasing(partners: &[Option<usize>]) -> Vec<usize> {
    let mut tails: Vec<usize> = Vec::new();
    let mut previous = vec![None; partners.len()];
    for (j, partner) in partners.iter().enumerate() {
        if partner.is_none() {
            continue;
        }
        let at = tails.partition_point(|&tail| partners[tail] < *partner);
        if at > 0 {
            previous[j] = Some(tails[at - 1]);
        }
        if at == tails.len() {
            tails.push(j);
        } else {
            tails[at] = j;
        }
    }

    let mut run = Vec::with_capacity(tails.len());
    let mut current = tails.last().copied();
    while let Some(j) = current {
        run.push(j);
        current = previous[j];
    }
    run.reverse();
    run
}

/// Removes unused old items, then walks `new` backwards inserting fresh items
/// and moving displaced ones in front of the next placed item. Locating a
/// slot scans the working array, so heavy reordering stays quadratic in time.
fn edit_script<U: Clone>(
    old_len: usize,
    new: &[U],
    prefix: usize,
    target: &[Slot],
    stable: &[bool],
    used: &[bool],
) -> Vec<Patch<U>> {
    let mut script = Vec::new();
    let mut work: Vec<Slot> = (0..old_len).map(Slot::Old).collect();
    let mut i = old_len;
    while i > 0 {
        if used[i - 1] {
            i -= 1;
            continue;
        }
        let end = i;
        while i > 0 && !used[i - 1] {
            i -= 1;
        }
        work.drain(i..end);
        script.push(Patch::Remove {
            index: prefix + i,
            count: end - i,
        });
    }

    let position = |work: &[Slot], slot: Slot| work.iter().position(|&s| s == slot);
    let mut next: Option<Slot> = None;
    let mut j = new.len();
    while j > 0 {
        j -= 1;
        if stable[j] {
            next = Some(target[j]);
            continue;
        }
        match target[j] {
            Slot::New(_) => {
                let end = j + 1;
                while j > 0 && !stable[j - 1] && matches!(target[j - 1], Slot::New(_)) {
                    j -= 1;
                }
                let at = next
                    .and_then(|slot| position(&work, slot))
                    .unwrap_or(work.len());
                work.splice(at..at, (j..end).map(Slot::New));
                script.push(Patch::Insert {
                    index: prefix + at,
                    values: new[j..end].to_vec(),
                });
            }
            Slot::Old(_) => {
                let Some(mut from) = position(&work, target[j]) else {
                    continue;
                };
                let mut count = 1;
                while j > 0
                    && from > 0
                    && !stable[j - 1]
                    && work[from - 1] == target[j - 1]
                {
                    j -= 1;
                    from -= 1;
                    count += 1;
                }
                let in_place = match next.and_then(|slot| position(&work, slot)) {
                    Some(at) => at == from + count,
                    None => from + count == work.len(),
                };
                if !in_place {
                    let moved: Vec<Slot> = work.drain(from..from + count).collect();
                    let to = next
                        .and_then(|slot| position(&work, slot))
                        .unwrap_or(work.len());
                    work.splice(to..to, moved);
                    script.push(Patch::Move {
                        from: prefix + from,
                        to: prefix + to,
                        count,
                    });
                }
            }
        }
        next = Some(target[j]);
    }

    script
}

/// Longest ordered matching between `old` and `new`. Among equally long
/// matchings the one keeping the earliest items of `old` wins.
///
/// Fills an `(n + 1) * (m + 1)` table, so callers with an existing one-to-one
/// pairing should use [`diff_paired`].
fn ordered_matching<T, U>(old: &[T], new: &[U], equal: &impl Fn(&T, &U) -> bool) -> Vec<(usize, usize)> {
    let (n, m) = (old.len(), new.len());
    let width = m + 1;
    let mut lengths = vec![0u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lengths[i * width + j] = if equal(&old[i], &new[j]) {
                lengths[(i + 1) * width + j + 1] + 1
            } else {
                lengths[(i + 1) * width + j].max(lengths[i * width + j + 1])
            };
        }
    }

    let mut pairs = Vec::with_capacity(lengths[0] as usize);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if equal(&old[i], &new[j]) {
            pairs.push((i, j));
            i += 1;
            j += 1;
        } else if lengths[i * width + j + 1] >= lengths[(i + 1) * width + j] {
            j += 1;
        } else {
            i += 1;
        }
    }
    pairs
}

/// Applies `script` to `items`; used to check scripts in tests and benchmarks.
pub fn apply<T: Clone>(items: &mut Vec<T>, script: &[Patch<T>]) -> Result<(), usize> {
    for (step, patch) in script.iter().enumerate() {
        match patch {
            Patch::Insert { index, values } => {
                if *index > items.len() {
                    return Err(step);
                }
                items.splice(*index..*index, values.iter().cloned());
            }
            Patch::Remove { index, count } => {
                if index + count > items.len() {
                    return Err(step);
                }
                items.drain(*index..index + count);
            }
            Patch::Move { from, to, count } => {
                if from + count > items.len() || *to > items.len() - count {
                    return Err(step);
                }
                let moved: Vec<T> = items.drain(*from..from + count).collect();
                items.splice(*to..*to, moved);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/diff_tests.rs"]
mod tests;
