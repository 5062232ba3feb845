use crate::resource::Resource;

/// Bodies above this size lose a small amount of weight (§4.6: "0.9 if size >
/// 100 kB").
const LARGE_SIZE_THRESHOLD: u64 = 100 * 1024;

/// Compute a resource's scheduling weight (§4.6's weight formula), given how
/// many other known resources point at it (`inbound_deps`) and how many it
/// itself points at (`outbound_deps`).
///
/// Starts at 1.0 and multiplies in, in the order the spec lists them: 1.5 if
/// in-viewport, 2.0 if render-blocking, `1 + 0.2 * inbound_deps`, `1 / (1 +
/// 0.1 * outbound_deps)`, 0.9 if over the large-size threshold, 1.5 if on the
/// critical path, 1.2 if preload-hinted, and finally the resource type's
/// multiplier.
pub fn compute_weight(resource: &Resource, inbound_deps: usize, outbound_deps: usize) -> f64 {
    let mut weight = 1.0;
    if resource.in_viewport {
        weight *= 1.5;
    }
    if resource.render_blocking {
        weight *= 2.0;
    }
    weight *= 1.0 + 0.2 * inbound_deps as f64;
    weight *= 1.0 / (1.0 + 0.1 * outbound_deps as f64);
    if resource.size_estimate.is_some_and(|size| size > LARGE_SIZE_THRESHOLD) {
        weight *= 0.9;
    }
    if resource.is_critical_path {
        weight *= 1.5;
    }
    if resource.is_preload {
        weight *= 1.2;
    }
    weight *= resource.resource_type.weight_multiplier();
    weight
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceType;

    #[test]
    fn baseline_weight_is_the_type_multiplier() {
        let r = Resource::new("https://example.com/a.css", ResourceType::Css);
        assert!((compute_weight(&r, 0, 0) - 1.3).abs() < 1e-9);
    }

    #[test]
    fn render_blocking_and_in_viewport_compound() {
        let r = Resource::new("https://example.com/a.js", ResourceType::Js).render_blocking(true).in_viewport(true);
        let expected = 1.5 * 2.0 * 1.2;
        assert!((compute_weight(&r, 0, 0) - expected).abs() < 1e-9);
    }

    #[test]
    fn more_inbound_dependencies_raise_weight() {
        let r = Resource::new("https://example.com/a.css", ResourceType::Css);
        assert!(compute_weight(&r, 5, 0) > compute_weight(&r, 0, 0));
    }

    #[test]
    fn more_outbound_dependencies_lower_weight() {
        let r = Resource::new("https://example.com/a.css", ResourceType::Css);
        assert!(compute_weight(&r, 0, 5) < compute_weight(&r, 0, 0));
    }

    #[test]
    fn large_size_applies_a_discount() {
        let small = Resource::new("https://example.com/a.png", ResourceType::Image).with_size_estimate(1024);
        let large = Resource::new("https://example.com/b.png", ResourceType::Image).with_size_estimate(200 * 1024);
        assert!(compute_weight(&large, 0, 0) < compute_weight(&small, 0, 0));
    }
}
