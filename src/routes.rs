use crate::{core::Viewport, error::StagecraftResult, model::SiteSpec};

#[derive(Clone, Debug)]
struct SceneEntry {
    id: String,
    path: String,
    subsections: Vec<String>,
}

/// Pure URL-to-offset mapping over the fixed scene order.
///
/// Unknown paths, scenes, and hashes always fail closed to index 0; offsets
/// are computed from the live viewport on every call and never cached.
#[derive(Clone, Debug)]
pub struct RouteTable {
    order: Vec<SceneEntry>,
}

impl RouteTable {
    pub fn from_site(site: &SiteSpec) -> StagecraftResult<Self> {
        site.validate()?;
        Ok(Self {
            order: site
                .scenes
                .iter()
                .map(|s| SceneEntry {
                    id: s.id.clone(),
                    path: s.path.clone(),
                    subsections: s.subsections.clone(),
                })
                .collect(),
        })
    }

    /// First scene in the order; the fallback for anything unknown.
    pub fn default_scene(&self) -> &str {
        &self.order[0].id
    }

    pub fn scene_for_path(&self, path: &str) -> &str {
        self.order
            .iter()
            .find(|s| s.path == path)
            .map(|s| s.id.as_str())
            .unwrap_or_else(|| self.default_scene())
    }

    pub fn index_of(&self, scene: &str) -> usize {
        self.order.iter().position(|s| s.id == scene).unwrap_or(0)
    }

    pub fn subsections(&self, scene: &str) -> &[String] {
        self.order
            .iter()
            .find(|s| s.id == scene)
            .map(|s| s.subsections.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_subsections(&self, scene: &str) -> bool {
        !self.subsections(scene).is_empty()
    }

    /// World Y for a scene: `-index * viewport height`.
    pub fn vertical_offset(&self, scene: &str, viewport: Viewport) -> f64 {
        -(self.index_of(scene) as f64) * viewport.height
    }

    /// World X for a sub-section hash within a scene: `-index * viewport
    /// width`. Scenes without sub-sections and unknown hashes sit at 0.
    pub fn horizontal_offset(&self, scene: &str, hash: &str, viewport: Viewport) -> f64 {
        let subs = self.subsections(scene);
        let key = normalize_hash(hash);
        let index = subs.iter().position(|s| s == key).unwrap_or(0);
        -(index as f64) * viewport.width
    }

    pub fn scene_ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.id.as_str())
    }
}

/// Strip a leading `#` so callers can pass `location.hash` verbatim.
pub fn normalize_hash(hash: &str) -> &str {
    hash.strip_prefix('#').unwrap_or(hash)
}

/// What to do with a clicked href.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkTarget {
    /// Same-origin: intercept, push history, pan.
    Internal { path: String, hash: String },
    /// Cross-origin: leave it to the browser untouched.
    External,
}

/// Classify an href against the page origin (e.g. `https://example.com`).
///
/// The origin must be followed by a path, hash, query, or nothing at all, so
/// `https://example.com.evil.net` never passes as `https://example.com`. Any
/// other scheme-qualified href (`https:`, `mailto:`, `tel:`, ...) is
/// external.
pub fn resolve_link(href: &str, origin: &str) -> LinkTarget {
    let origin = origin.trim_end_matches('/');
    let rest = match href.strip_prefix(origin) {
        Some(rest) if rest.is_empty() || rest.starts_with(['/', '#', '?']) => rest,
        _ if href.starts_with("//") || has_scheme(href) => return LinkTarget::External,
        _ => href,
    };

    let (path_part, hash) = match rest.split_once('#') {
        Some((p, h)) => (p, format!("#{h}")),
        None => (rest, String::new()),
    };
    let path = if path_part.is_empty() { "/" } else { path_part };
    LinkTarget::Internal {
        path: path.to_string(),
        hash,
    }
}

// RFC 3986 scheme: ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) ":".
fn has_scheme(href: &str) -> bool {
    let Some((scheme, _)) = href.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
