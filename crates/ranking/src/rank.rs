use polars::prelude::*;

/// Dense descending rank.
///
/// The largest value gets rank 1, equal values share a rank and the next
/// distinct value gets the next integer. Missing values get rank 0 and do
/// not take a slot.
pub fn dense_rank(values: &Float64Chunked) -> PolarsResult<Int64Chunked> {
    let ranks = values.clone().into_series().rank(
        RankOptions {
            method: RankMethod::Dense,
            descending: true,
        },
        None,
    );
    let ranks = ranks.cast(&DataType::Int64)?;
    Ok(values
        .into_iter()
        .zip(ranks.i64()?)
        .map(|(value, rank)| Some(value.and(rank).unwrap_or(0)))
        .collect::<Int64Chunked>()
        .with_name(values.name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn ranks(values: &[Option<f64>]) -> Vec<i64> {
        let values = Float64Chunked::new("score", values);
        dense_rank(&values).unwrap().into_iter().flatten().collect()
    }

    #[test]
    fn ties_share_a_rank_without_gaps() {
        assert_eq!(
            ranks(&[Some(10.0), Some(10.0), Some(5.0), Some(1.0)]),
            vec![1, 1, 2, 3]
        );
        assert_eq!(
            ranks(&[Some(1.0), Some(5.0), Some(10.0), Some(10.0)]),
            vec![3, 2, 1, 1]
        );
    }

    #[test]
    fn missing_values_get_the_sentinel() {
        assert_eq!(
            ranks(&[None, Some(2.0), None, Some(3.0)]),
            vec![0, 2, 0, 1]
        );
        assert_eq!(ranks(&[None, None]), vec![0, 0]);
        assert_eq!(ranks(&[None]), vec![0]);
        assert_eq!(ranks(&[Some(4.0)]), vec![1]);
        assert_eq!(ranks(&[]), Vec::<i64>::new());
    }

    proptest! {
        #[test]
        fn ranks_are_contiguous_and_order_preserving(
            xs in proptest::collection::vec(proptest::option::of(-100i32..100), 0..50)
        ) {
            let values: Vec<Option<f64>> = xs.iter().map(|x| x.map(f64::from)).collect();
            let ranks = ranks(&values);

            let mut distinct: Vec<i32> = xs.iter().flatten().copied().collect();
            distinct.sort_unstable();
            distinct.dedup();
            let max_rank = ranks.iter().copied().max().unwrap_or(0);
            prop_assert_eq!(max_rank as usize, distinct.len());

            for (i, a) in values.iter().enumerate() {
                prop_assert_eq!(a.is_none(), ranks[i] == 0);
                for (j, b) in values.iter().enumerate() {
                    if let (Some(a), Some(b)) = (a, b) {
                        if a > b {
                            prop_assert!(ranks[i] < ranks[j]);
                        }
                    }
                }
            }
        }
    }
}
