use crate::resource::Resource;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Compare two resources for the within-band stable sort (§4.6: "stable sort
/// within each band by (in-viewport > render-blocking > weight > type >
/// url)"). Band itself is not compared here — callers sort within a single
/// band, or rely on `priority_key` to group by band first.
fn compare_within_band(a: &Resource, b: &Resource) -> Ordering {
    b.in_viewport
        .cmp(&a.in_viewport)
        .then_with(|| b.render_blocking.cmp(&a.render_blocking))
        .then_with(|| b.weight.partial_cmp(&a.weight).unwrap_or(Ordering::Equal))
        .then_with(|| a.resource_type.sort_rank().cmp(&b.resource_type.sort_rank()))
        .then_with(|| a.url.cmp(&b.url))
}

/// Stable-sort `resources` by band (descending, i.e. `Critical` first), then
/// within each band by [`compare_within_band`].
pub(crate) fn priority_order(resources: &mut Vec<&Resource>) {
    resources.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| compare_within_band(a, b)));
}

/// Re-sequence `initial_order` (already in priority order) so that every
/// resource's explicit dependencies appear before it, via a depth-first
/// postorder traversal that visits dependencies in URL-lexical order. This
/// preserves the relative order of resources with no dependency relationship
/// and only pulls a resource's dependencies earlier when required.
///
/// Cycles are broken by refusing to re-enter a resource that is currently on
/// the traversal stack (a back edge); since dependencies are always visited
/// in lexical order, the specific edge dropped for a given cycle is
/// deterministic (§4.6: "cycles are broken by dropping back-edges in URL
/// lexical order").
pub(crate) fn topological_pass(initial_order: &[String], resources: &HashMap<String, Resource>) -> Vec<String> {
    let mut visited = HashSet::new();
    let mut visiting = HashSet::new();
    let mut output = Vec::with_capacity(initial_order.len());

    for url in initial_order {
        visit(url, resources, &mut visited, &mut visiting, &mut output);
    }
    output
}

fn visit(
    url: &str,
    resources: &HashMap<String, Resource>,
    visited: &mut HashSet<String>,
    visiting: &mut HashSet<String>,
    output: &mut Vec<String>,
) {
    if visited.contains(url) || visiting.contains(url) {
        return;
    }
    let Some(resource) = resources.get(url) else {
        return;
    };

    visiting.insert(url.to_string());
    let mut deps = resource.dependencies.clone();
    deps.sort();
    for dep in &deps {
        visit(dep, resources, visited, visiting, output);
    }
    visiting.remove(url);

    visited.insert(url.to_string());
    output.push(url.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceType;

    fn resource(url: &str) -> Resource {
        Resource::new(url, ResourceType::Js)
    }

    #[test]
    fn dependencies_are_ordered_before_dependents() {
        let mut resources = HashMap::new();
        resources.insert("a".to_string(), resource("a").depends_on("b"));
        resources.insert("b".to_string(), resource("b"));

        let order = topological_pass(&["a".to_string(), "b".to_string()], &resources);
        assert_eq!(order, vec!["b", "a"]);
    }

    #[test]
    fn independent_resources_keep_their_relative_order() {
        let mut resources = HashMap::new();
        resources.insert("a".to_string(), resource("a"));
        resources.insert("b".to_string(), resource("b"));

        let order = topological_pass(&["a".to_string(), "b".to_string()], &resources);
        assert_eq!(order, vec!["a", "b"]);
    }

    #[test]
    fn cycles_do_not_infinite_loop_and_place_every_node_once() {
        let mut resources = HashMap::new();
        resources.insert("a".to_string(), resource("a").depends_on("b"));
        resources.insert("b".to_string(), resource("b").depends_on("a"));

        let order = topological_pass(&["a".to_string(), "b".to_string()], &resources);
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(sorted, vec!["a", "b"]);
    }
}
