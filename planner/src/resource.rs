use crate::band::PriorityBand;

/// The kind of payload a [`Resource`] represents (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    /// `text/html`
    Html,
    /// `text/css`
    Css,
    /// `text/javascript` / `application/javascript`
    Js,
    /// raster or vector image formats
    Image,
    /// web font formats (woff2, woff, ttf, otf)
    Font,
    /// audio media
    Audio,
    /// video media
    Video,
    /// `application/json`
    Json,
    /// `application/xml` / `text/xml`
    Xml,
    /// anything not covered above
    Other,
}

impl ResourceType {
    /// The weight multiplier this type contributes (§4.6: "type multipliers
    /// (HTML 1.5, CSS 1.3, JS 1.2, font 1.1)"); types the spec doesn't name
    /// carry a neutral 1.0.
    pub fn weight_multiplier(self) -> f64 {
        match self {
            ResourceType::Html => 1.5,
            ResourceType::Css => 1.3,
            ResourceType::Js => 1.2,
            ResourceType::Font => 1.1,
            _ => 1.0,
        }
    }

    /// The band a resource of this type starts at before the in-viewport/
    /// render-blocking/user-hint adjustments in §4.6 apply. Document structure
    /// and render-blocking styles default high since they gate first paint;
    /// media and background data default low since they rarely block it. This
    /// resolves an open question `spec.md` leaves to the implementation.
    pub fn default_band(self) -> PriorityBand {
        match self {
            ResourceType::Html | ResourceType::Css | ResourceType::Font => PriorityBand::High,
            ResourceType::Js | ResourceType::Json | ResourceType::Xml => PriorityBand::Normal,
            ResourceType::Image => PriorityBand::Normal,
            ResourceType::Audio | ResourceType::Video => PriorityBand::Low,
            ResourceType::Other => PriorityBand::Background,
        }
    }

    /// Tie-break rank used by the within-band stable sort (§4.6: "... > type >
    /// url"); lower sorts first. Follows the same relative ordering as the
    /// named weight multipliers, with unnamed types ranked below them.
    pub fn sort_rank(self) -> u8 {
        match self {
            ResourceType::Html => 0,
            ResourceType::Css => 1,
            ResourceType::Js => 2,
            ResourceType::Font => 3,
            ResourceType::Json => 4,
            ResourceType::Xml => 5,
            ResourceType::Image => 6,
            ResourceType::Audio => 7,
            ResourceType::Video => 8,
            ResourceType::Other => 9,
        }
    }
}

/// A known resource in the page's dependency graph (§4.6).
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    /// The resource's absolute URL; also its identity within the graph.
    pub url: String,
    /// What kind of payload this is.
    pub resource_type: ResourceType,
    /// The priority band this resource was assigned after adjustment.
    pub priority: PriorityBand,
    /// The computed scheduling weight (§4.6's weight formula).
    pub weight: f64,
    /// URLs of resources this one explicitly depends on (must load first).
    pub dependencies: Vec<String>,
    /// Whether this resource blocks initial render (e.g. a synchronous
    /// stylesheet or blocking script).
    pub render_blocking: bool,
    /// An explicit caller-supplied band override, if any; wins over every
    /// other adjustment (§4.6: "user hint (overrides)").
    pub user_hint: Option<PriorityBand>,
    /// Whether this resource is visible in the current viewport.
    pub in_viewport: bool,
    /// Estimated payload size in bytes, if known.
    pub size_estimate: Option<u64>,
    /// Whether this resource was discovered via a `<link rel=preload>` (or
    /// equivalent) hint rather than ordinary page parsing.
    pub is_preload: bool,
    /// Whether this resource lies on the critical render path. Computed by
    /// [`crate::graph::ResourceGraph::mark_critical_path`], not set directly.
    pub is_critical_path: bool,
}

impl Resource {
    /// A new resource with its band defaulted from `resource_type` and no
    /// adjustments yet applied. Call [`crate::graph::ResourceGraph::add_resource`]
    /// to register it and have bands/weights computed.
    pub fn new(url: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            url: url.into(),
            priority: resource_type.default_band(),
            resource_type,
            weight: 1.0,
            dependencies: Vec::new(),
            render_blocking: false,
            user_hint: None,
            in_viewport: false,
            size_estimate: None,
            is_preload: false,
            is_critical_path: false,
        }
    }

    /// Builder-style: mark this resource as render-blocking.
    pub fn render_blocking(mut self, value: bool) -> Self {
        self.render_blocking = value;
        self
    }

    /// Builder-style: mark this resource as in-viewport.
    pub fn in_viewport(mut self, value: bool) -> Self {
        self.in_viewport = value;
        self
    }

    /// Builder-style: record an explicit dependency edge.
    pub fn depends_on(mut self, url: impl Into<String>) -> Self {
        self.dependencies.push(url.into());
        self
    }

    /// Builder-style: set a caller-pinned priority override.
    pub fn with_user_hint(mut self, band: PriorityBand) -> Self {
        self.user_hint = Some(band);
        self
    }

    /// Builder-style: record an estimated payload size.
    pub fn with_size_estimate(mut self, bytes: u64) -> Self {
        self.size_estimate = Some(bytes);
        self
    }

    /// Builder-style: mark this resource as preload-hinted.
    pub fn preload(mut self, value: bool) -> Self {
        self.is_preload = value;
        self
    }

    /// Apply the §4.6 band-adjustment rules in order: start from the type
    /// default, bump one band if in-viewport, floor at `High` if
    /// render-blocking, then let an explicit user hint override everything.
    pub(crate) fn resolve_band(&self) -> PriorityBand {
        if let Some(hint) = self.user_hint {
            return hint;
        }
        let mut band = self.resource_type.default_band();
        if self.in_viewport {
            band = band.bump();
        }
        if self.render_blocking {
            band = band.floor_at_high();
        }
        band
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_viewport_bumps_one_band() {
        let r = Resource::new("https://example.com/a.json", ResourceType::Json).in_viewport(true);
        assert_eq!(r.resolve_band(), PriorityBand::High);
    }

    #[test]
    fn render_blocking_floors_at_high_even_for_low_default_types() {
        let r = Resource::new("https://example.com/a.mp4", ResourceType::Video).render_blocking(true);
        assert_eq!(r.resolve_band(), PriorityBand::High);
    }

    #[test]
    fn user_hint_overrides_every_other_adjustment() {
        let r = Resource::new("https://example.com/a.html", ResourceType::Html)
            .render_blocking(true)
            .in_viewport(true)
            .with_user_hint(PriorityBand::Background);
        assert_eq!(r.resolve_band(), PriorityBand::Background);
    }
}
