mod common;

use common::strategies::*;
use proptest::prelude::*;

use nfvo_core::models::Status;
use nfvo_core::orchestration::{calculate_weights, deployment_order, deployment_waves};

proptest! {
    /// Property: every dependency target weighs strictly more than its source
    #[test]
    fn targets_outweigh_their_sources(descriptor in acyclic_descriptor_strategy()) {
        let weights = calculate_weights(&descriptor).unwrap();
        prop_assert_eq!(weights.len(), descriptor.functions.len());
        for dependency in &descriptor.dependencies {
            prop_assert!(
                weights[&dependency.target] > weights[&dependency.source],
                "{} -> {}: {:?}", dependency.source, dependency.target, weights
            );
        }
    }

    /// Property: sources are always ordered before their targets
    #[test]
    fn deployment_order_respects_dependencies(descriptor in acyclic_descriptor_strategy()) {
        let order: Vec<String> = deployment_order(&descriptor)
            .unwrap()
            .into_iter()
            .map(|function| function.name.clone())
            .collect();
        prop_assert_eq!(order.len(), descriptor.functions.len());

        let position = |name: &str| order.iter().position(|candidate| candidate == name).unwrap();
        for dependency in &descriptor.dependencies {
            prop_assert!(position(&dependency.source) < position(&dependency.target));
        }
    }

    /// Property: waves partition the functions and never hold both ends of an edge
    #[test]
    fn waves_partition_functions(descriptor in acyclic_descriptor_strategy()) {
        let waves = deployment_waves(&descriptor).unwrap();
        let total: usize = waves.iter().map(Vec::len).sum();
        prop_assert_eq!(total, descriptor.functions.len());

        let wave_of = |name: &str| {
            waves
                .iter()
                .position(|wave| wave.iter().any(|function| function.name == name))
                .unwrap()
        };
        for dependency in &descriptor.dependencies {
            prop_assert!(wave_of(&dependency.source) < wave_of(&dependency.target));
        }
    }

    /// Property: aggregation does not depend on the order statuses arrive in
    #[test]
    fn aggregate_is_order_independent(statuses in statuses_strategy()) {
        let forward = Status::aggregate(statuses.iter().copied());
        let backward = Status::aggregate(statuses.iter().rev().copied());
        prop_assert_eq!(forward, backward);
        prop_assert_eq!(Some(forward), statuses.iter().copied().min());
    }

    /// Property: one ERROR record makes the whole service ERROR
    #[test]
    fn error_dominates_aggregate(mut statuses in statuses_strategy(), index in any::<prop::sample::Index>()) {
        let at = index.index(statuses.len());
        statuses[at] = Status::Error;
        prop_assert_eq!(Status::aggregate(statuses), Status::Error);
    }
}
