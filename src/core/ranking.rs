use crate::models::RankingEntry;
use std::cmp::Ordering;
use uuid::Uuid;

/// Leaderboard order: rating desc, then vote count desc, then id asc
#[inline]
pub fn compare_standing(
    (rating_a, votes_a, id_a): (f64, i64, Uuid),
    (rating_b, votes_b, id_b): (f64, i64, Uuid),
) -> Ordering {
    rating_b
        .total_cmp(&rating_a)
        .then_with(|| votes_b.cmp(&votes_a))
        .then_with(|| id_a.cmp(&id_b))
}

/// Sort standings and cut out one page, numbering positions from `offset + 1`
///
/// Standings are `(id, title, rating, vote_count)`.
pub fn paginate_rankings(
    mut standings: Vec<(Uuid, String, f64, i64)>,
    offset: u64,
    limit: u64,
) -> Vec<RankingEntry> {
    standings.sort_by(|a, b| compare_standing((a.2, a.3, a.0), (b.2, b.3, b.0)));

    standings
        .into_iter()
        .enumerate()
        .skip(usize::try_from(offset).unwrap_or(usize::MAX))
        .take(usize::try_from(limit).unwrap_or(usize::MAX))
        .map(|(index, (id, title, rating, vote_count))| RankingEntry {
            position: index as u64 + 1,
            id,
            title,
            rating,
            vote_count,
        })
        .collect()
}

/// True when `entries` follow leaderboard order
pub fn is_ranked(entries: &[RankingEntry]) -> bool {
    entries.windows(2).all(|pair| {
        compare_standing(
            (pair[0].rating, pair[0].vote_count, pair[0].id),
            (pair[1].rating, pair[1].vote_count, pair[1].id),
        ) != Ordering::Greater
    })
}
