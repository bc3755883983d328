#![allow(dead_code)]

use proptest::prelude::*;

use nfvo_core::models::{Dependency, FunctionDescriptor, ServiceDescriptor, Status};

/// Strategy for generating any status
pub fn status_strategy() -> impl Strategy<Value = Status> {
    prop::sample::select(Status::ALL.to_vec())
}

/// Strategy for generating non-empty status sets
pub fn statuses_strategy() -> impl Strategy<Value = Vec<Status>> {
    prop::collection::vec(status_strategy(), 1..20)
}

/// Strategy for generating acyclic service descriptors.
///
/// Functions are named `vnf-0..vnf-n`; every dependency points from a lower
/// index to a higher one, so the graph cannot contain a cycle.
pub fn acyclic_descriptor_strategy() -> impl Strategy<Value = ServiceDescriptor> {
    (1usize..12)
        .prop_flat_map(|size| {
            let edges = prop::collection::vec((0..size, 0..size), 0..size * 2);
            (Just(size), edges)
        })
        .prop_map(|(size, edges)| {
            let mut descriptor = ServiceDescriptor::new("generated");
            descriptor.functions = (0..size)
                .map(|i| FunctionDescriptor::new(format!("vnf-{i}"), "generic"))
                .collect();
            for (a, b) in edges {
                if a == b {
                    continue;
                }
                let (source, target) = if a < b { (a, b) } else { (b, a) };
                let dependency = Dependency::new(format!("vnf-{source}"), format!("vnf-{target}"));
                if !descriptor.dependencies.contains(&dependency) {
                    descriptor.dependencies.push(dependency);
                }
            }
            descriptor
        })
}
