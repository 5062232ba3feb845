use crate::error::{Error, Result};
use crate::ordering;
use crate::resource::Resource;
use crate::task::PrefetchTask;
use crate::weight;
use std::collections::{HashMap, HashSet};

/// The full set of known resources for a page, plus their dependency edges
/// (§4.6). Bands and weights are recomputed lazily by [`ResourceGraph::plan`];
/// mutate resources via [`ResourceGraph::add_resource`] beforehand.
#[derive(Debug, Default)]
pub struct ResourceGraph {
    resources: HashMap<String, Resource>,
}

impl ResourceGraph {
    /// An empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource. Errors if `resource.url` was already registered.
    pub fn add_resource(&mut self, resource: Resource) -> Result<()> {
        if self.resources.contains_key(&resource.url) {
            return Err(Error::DuplicateUrl(resource.url));
        }
        self.resources.insert(resource.url.clone(), resource);
        Ok(())
    }

    /// Number of registered resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the graph holds no resources.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Look up a resource by URL.
    pub fn get(&self, url: &str) -> Option<&Resource> {
        self.resources.get(url)
    }

    /// Mark every resource reachable from the seed set {HTML documents, CSS,
    /// render-blocking resources, in-viewport JS/fonts} by following
    /// dependency edges, per §4.6's critical-path discovery: "the transitive
    /// closure over the dependency graph of the seed set".
    pub fn mark_critical_path(&mut self) {
        use crate::resource::ResourceType;

        let seeds: Vec<String> = self
            .resources
            .values()
            .filter(|r| {
                r.resource_type == ResourceType::Html
                    || r.resource_type == ResourceType::Css
                    || r.render_blocking
                    || (r.in_viewport && matches!(r.resource_type, ResourceType::Js | ResourceType::Font))
            })
            .map(|r| r.url.clone())
            .collect();

        let mut reachable = HashSet::new();
        let mut stack = seeds;
        while let Some(url) = stack.pop() {
            if !reachable.insert(url.clone()) {
                continue;
            }
            if let Some(resource) = self.resources.get(&url) {
                stack.extend(resource.dependencies.iter().cloned());
            }
        }

        for url in &reachable {
            if let Some(resource) = self.resources.get_mut(url) {
                resource.is_critical_path = true;
            }
        }
    }

    /// Recompute every resource's band (§4.6's band-adjustment rules) and
    /// weight (§4.6's weight formula), using each resource's current
    /// in/out-degree in the dependency graph. Call after
    /// [`ResourceGraph::mark_critical_path`] and before [`ResourceGraph::plan`].
    pub fn recompute(&mut self) {
        let mut inbound: HashMap<String, usize> = HashMap::new();
        for resource in self.resources.values() {
            for dep in &resource.dependencies {
                *inbound.entry(dep.clone()).or_insert(0) += 1;
            }
        }

        let urls: Vec<String> = self.resources.keys().cloned().collect();
        for url in urls {
            let (band, weight) = {
                let resource = &self.resources[&url];
                let inbound_deps = inbound.get(&url).copied().unwrap_or(0);
                let outbound_deps = resource.dependencies.len();
                (resource.resolve_band(), weight::compute_weight(resource, inbound_deps, outbound_deps))
            };
            if let Some(resource) = self.resources.get_mut(&url) {
                resource.priority = band;
                resource.weight = weight;
            }
        }
    }

    /// Produce the final prefetch schedule: a priority- and
    /// dependency-respecting ordering of every registered resource (§4.6
    /// "Ordering"). Call [`ResourceGraph::mark_critical_path`] and
    /// [`ResourceGraph::recompute`] first so bands/weights reflect the
    /// current graph shape.
    pub fn plan(&self) -> Vec<PrefetchTask> {
        let mut by_priority: Vec<&Resource> = self.resources.values().collect();
        ordering::priority_order(&mut by_priority);
        let initial_order: Vec<String> = by_priority.into_iter().map(|r| r.url.clone()).collect();

        ordering::topological_pass(&initial_order, &self.resources)
            .into_iter()
            .map(|url| {
                let resource = &self.resources[&url];
                PrefetchTask::new(resource.url.clone(), resource.resource_type, resource.priority)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::PriorityBand;
    use crate::resource::ResourceType;

    #[test]
    fn duplicate_url_is_rejected() {
        let mut graph = ResourceGraph::new();
        graph.add_resource(Resource::new("https://example.com/a.css", ResourceType::Css)).unwrap();
        let err = graph.add_resource(Resource::new("https://example.com/a.css", ResourceType::Css));
        assert!(matches!(err, Err(Error::DuplicateUrl(_))));
    }

    #[test]
    fn critical_path_follows_dependencies_from_render_blocking_seed() {
        let mut graph = ResourceGraph::new();
        graph
            .add_resource(Resource::new("https://example.com/app.css", ResourceType::Css).render_blocking(true).depends_on("https://example.com/font.woff2"))
            .unwrap();
        graph.add_resource(Resource::new("https://example.com/font.woff2", ResourceType::Font)).unwrap();
        graph.add_resource(Resource::new("https://example.com/analytics.js", ResourceType::Js)).unwrap();

        graph.mark_critical_path();

        assert!(graph.get("https://example.com/app.css").unwrap().is_critical_path);
        assert!(graph.get("https://example.com/font.woff2").unwrap().is_critical_path);
        assert!(!graph.get("https://example.com/analytics.js").unwrap().is_critical_path);
    }

    #[test]
    fn plan_orders_dependencies_before_dependents_regardless_of_band() {
        let mut graph = ResourceGraph::new();
        graph
            .add_resource(Resource::new("https://example.com/app.js", ResourceType::Js).in_viewport(true).depends_on("https://example.com/vendor.js"))
            .unwrap();
        graph.add_resource(Resource::new("https://example.com/vendor.js", ResourceType::Js)).unwrap();
        graph.recompute();

        let plan = graph.plan();
        let vendor_pos = plan.iter().position(|t| t.url == "https://example.com/vendor.js").unwrap();
        let app_pos = plan.iter().position(|t| t.url == "https://example.com/app.js").unwrap();
        assert!(vendor_pos < app_pos);
    }

    #[test]
    fn higher_band_resources_sort_before_lower_band_ones() {
        let mut graph = ResourceGraph::new();
        graph.add_resource(Resource::new("https://example.com/bg.mp4", ResourceType::Video)).unwrap();
        graph.add_resource(Resource::new("https://example.com/app.css", ResourceType::Css)).unwrap();
        graph.recompute();

        let plan = graph.plan();
        assert_eq!(plan[0].priority, PriorityBand::High);
        let css_pos = plan.iter().position(|t| t.url == "https://example.com/app.css").unwrap();
        let video_pos = plan.iter().position(|t| t.url == "https://example.com/bg.mp4").unwrap();
        assert!(css_pos < video_pos);
    }
}
