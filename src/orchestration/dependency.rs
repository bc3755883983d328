//! # Dependency Weights
//!
//! Deployment ordering over the functions of a service descriptor.
//!
//! The weight of a function is the sum, over every dependency whose target is
//! that function, of `1 + weight(source)`. Functions deploy in ascending
//! weight, so the target of a dependency always deploys after its source.
//! Weights are only defined for acyclic graphs; a cycle is rejected with
//! [`NfvoError::CyclicDependency`].

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::{NfvoError, NfvoResult};
use crate::models::{FunctionDescriptor, ServiceDescriptor};

/// Function name -> deployment weight.
pub type Weights = BTreeMap<String, u64>;

/// Dependency edges of one descriptor, indexed by target.
struct DependencyGraph<'a> {
    descriptor: &'a str,
    sources_by_target: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> DependencyGraph<'a> {
    fn new(descriptor: &'a ServiceDescriptor) -> Self {
        let mut sources_by_target: HashMap<&str, Vec<&str>> = HashMap::new();
        for dependency in &descriptor.dependencies {
            sources_by_target
                .entry(dependency.target.as_str())
                .or_default()
                .push(dependency.source.as_str());
        }
        Self {
            descriptor: &descriptor.name,
            sources_by_target,
        }
    }

    fn weight(
        &self,
        function: &'a str,
        memo: &mut HashMap<&'a str, u64>,
        visiting: &mut HashSet<&'a str>,
    ) -> NfvoResult<u64> {
        if let Some(weight) = memo.get(function) {
            return Ok(*weight);
        }
        if !visiting.insert(function) {
            return Err(NfvoError::CyclicDependency {
                descriptor: self.descriptor.to_string(),
                function: function.to_string(),
            });
        }

        let mut weight = 0u64;
        if let Some(sources) = self.sources_by_target.get(function) {
            for &source in sources {
                let source_weight = self.weight(source, memo, visiting)?;
                weight = weight.saturating_add(source_weight.saturating_add(1));
            }
        }

        visiting.remove(function);
        memo.insert(function, weight);
        Ok(weight)
    }
}

/// Weight of every function of `descriptor`.
pub fn calculate_weights(descriptor: &ServiceDescriptor) -> NfvoResult<Weights> {
    let graph = DependencyGraph::new(descriptor);
    let mut memo = HashMap::new();
    let mut visiting = HashSet::new();

    let mut weights = Weights::new();
    for function in &descriptor.functions {
        let weight = graph.weight(&function.name, &mut memo, &mut visiting)?;
        weights.insert(function.name.clone(), weight);
    }

    // A cycle among names no function declares is still a cycle
    for dependency in &descriptor.dependencies {
        graph.weight(&dependency.target, &mut memo, &mut visiting)?;
    }

    Ok(weights)
}

/// Functions of `descriptor` sorted by ascending weight.
///
/// The sort is stable: functions of equal weight keep their declaration order.
pub fn deployment_order(descriptor: &ServiceDescriptor) -> NfvoResult<Vec<&FunctionDescriptor>> {
    let weights = calculate_weights(descriptor)?;
    let mut ordered: Vec<&FunctionDescriptor> = descriptor.functions.iter().collect();
    ordered.sort_by_key(|function| weights.get(&function.name).copied().unwrap_or_default());
    Ok(ordered)
}

/// Functions of `descriptor` grouped by weight, lightest group first.
pub fn deployment_waves(descriptor: &ServiceDescriptor) -> NfvoResult<Vec<Vec<FunctionDescriptor>>> {
    let weights = calculate_weights(descriptor)?;
    let mut waves: BTreeMap<u64, Vec<FunctionDescriptor>> = BTreeMap::new();
    for function in &descriptor.functions {
        let weight = weights.get(&function.name).copied().unwrap_or_default();
        waves.entry(weight).or_default().push(function.clone());
    }
    Ok(waves.into_values().collect())
}
