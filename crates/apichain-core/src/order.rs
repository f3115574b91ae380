//! Execution ordering: producers before consumers
//!
//! Not a dependency sort. Parameter-free endpoints are assumed to emit the
//! identifiers that parameterized endpoints need, and that is all.

use crate::endpoint::Endpoint;

/// Stable two-bucket partition: endpoints without `{` in their path first,
/// endpoints with at least one `{` after. Relative order is kept in both.
#[must_use]
pub fn order(endpoints: &[Endpoint]) -> Vec<Endpoint> {
    let (consumers, producers): (Vec<&Endpoint>, Vec<&Endpoint>) =
        endpoints.iter().partition(|ep| ep.has_placeholders());
    producers.into_iter().chain(consumers).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn paths(eps: &[Endpoint]) -> Vec<&str> {
        eps.iter().map(|e| e.path.as_str()).collect()
    }

    #[test]
    fn producer_moves_ahead_of_consumer() {
        let eps = vec![Endpoint::new("GET", "/a/{id}"), Endpoint::new("GET", "/a")];
        assert_eq!(paths(&order(&eps)), vec!["/a", "/a/{id}"]);
    }

    #[test]
    fn relative_order_preserved_in_both_buckets() {
        let eps = vec![
            Endpoint::new("GET", "/drivers/{driver_id}"),
            Endpoint::new("GET", "/vehicles"),
            Endpoint::new("DELETE", "/vehicles/{vehicle_id}"),
            Endpoint::new("POST", "/drivers"),
            Endpoint::new("GET", "/health"),
        ];
        assert_eq!(
            paths(&order(&eps)),
            vec![
                "/vehicles",
                "/drivers",
                "/health",
                "/drivers/{driver_id}",
                "/vehicles/{vehicle_id}",
            ]
        );
    }

    #[test]
    fn empty_batch() {
        assert!(order(&[]).is_empty());
    }

    proptest! {
        #[test]
        fn partition_is_stable_permutation(flags in proptest::collection::vec(any::<bool>(), 0..24)) {
            let eps: Vec<Endpoint> = flags
                .iter()
                .enumerate()
                .map(|(i, &param)| {
                    let path = if param { format!("/r{i}/{{id}}") } else { format!("/r{i}") };
                    Endpoint::new("GET", path)
                })
                .collect();

            let ordered = order(&eps);
            prop_assert_eq!(ordered.len(), eps.len());

            let split = ordered.iter().position(Endpoint::has_placeholders).unwrap_or(ordered.len());
            prop_assert!(ordered[..split].iter().all(|e| !e.has_placeholders()));
            prop_assert!(ordered[split..].iter().all(Endpoint::has_placeholders));

            let expected: Vec<&Endpoint> = eps
                .iter()
                .filter(|e| !e.has_placeholders())
                .chain(eps.iter().filter(|e| e.has_placeholders()))
                .collect();
            let got: Vec<&Endpoint> = ordered.iter().collect();
            prop_assert_eq!(got, expected);
        }
    }
}
