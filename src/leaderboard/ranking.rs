// src/leaderboard/ranking.rs

/// Ordering used for ranks, shared with the SQL window in the repository:
/// total descending, ties broken by the lower user id.
pub const RANK_ORDER_SQL: &str = "total_points DESC, user_id ASC";

/// Assigns ranks 1..=n over `(user_id, total)` pairs after a full sort.
/// Returns `(user_id, rank)` in rank order.
pub fn assign_ranks(totals: &[(i64, i64)]) -> Vec<(i64, i64)> {
    let mut sorted = totals.to_vec();
    sorted.sort_by(|(a_id, a_total), (b_id, b_total)| {
        b_total.cmp(a_total).then_with(|| a_id.cmp(b_id))
    });
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, (user_id, _))| (user_id, i as i64 + 1))
        .collect()
}
