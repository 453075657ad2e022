//! Splice-and-rerank helpers.

use crate::domain::{Coin, RankUpdate};

/// Move the element at `source` to `destination`.
///
/// Removal happens first, so `destination` indexes the shortened sequence:
/// moving 0 to 2 in `[A, B, C, D]` gives `[B, C, A, D]`.
/// Returns false (and leaves `items` alone) when either index is out of bounds.
pub fn move_index<T>(items: &mut Vec<T>, source: usize, destination: usize) -> bool {
    if source >= items.len() || destination >= items.len() {
        return false;
    }
    let moved = items.remove(source);
    items.insert(destination, moved);
    true
}

/// Rank every coin by position (`index + 1`) and return the full update list.
pub fn assign_dense_ranks(coins: &mut [Coin]) -> Vec<RankUpdate> {
    coins
        .iter_mut()
        .enumerate()
        .map(|(index, coin)| {
            coin.rank = index as u32 + 1;
            coin.rank_update()
        })
        .collect()
}

/// True when ranks are exactly `1..=N` in sequence order
pub fn ranks_are_dense(coins: &[Coin]) -> bool {
    coins
        .iter()
        .enumerate()
        .all(|(index, coin)| coin.rank == index as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CoinDisplay;

    fn coins(ranks: &[u32]) -> Vec<Coin> {
        ranks
            .iter()
            .enumerate()
            .map(|(i, rank)| Coin {
                id: i as u32 + 1,
                rank: *rank,
                ..Coin::new("owner", CoinDisplay::named(format!("coin {}", i + 1)))
            })
            .collect()
    }

    #[test]
    fn test_move_forward_uses_post_removal_index() {
        let mut items = vec!['A', 'B', 'C', 'D'];
        assert!(move_index(&mut items, 0, 2));
        assert_eq!(items, vec!['B', 'C', 'A', 'D']);
    }

    #[test]
    fn test_move_backward_and_adjacent() {
        let mut items = vec!['A', 'B', 'C', 'D'];
        assert!(move_index(&mut items, 3, 0));
        assert_eq!(items, vec!['D', 'A', 'B', 'C']);

        let mut items = vec!['A', 'B', 'C'];
        assert!(move_index(&mut items, 1, 2));
        assert_eq!(items, vec!['A', 'C', 'B']);

        let mut items = vec!['A', 'B', 'C'];
        assert!(move_index(&mut items, 1, 1));
        assert_eq!(items, vec!['A', 'B', 'C']);
    }

    #[test]
    fn test_move_out_of_bounds_is_rejected() {
        let mut items = vec![1, 2, 3];
        assert!(!move_index(&mut items, 3, 0));
        assert!(!move_index(&mut items, 0, 3));
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[test]
    fn test_dense_ranks_ignore_prior_values() {
        let mut list = coins(&[4, 4, 10, 0]);
        assert!(!ranks_are_dense(&list));

        let updates = assign_dense_ranks(&mut list);
        assert!(ranks_are_dense(&list));
        assert_eq!(
            updates,
            vec![
                RankUpdate { id: 1, rank: 1 },
                RankUpdate { id: 2, rank: 2 },
                RankUpdate { id: 3, rank: 3 },
                RankUpdate { id: 4, rank: 4 },
            ]
        );
    }
}
