use std::collections::{BTreeMap, BTreeSet};

use crate::{
    core::DesignSpace,
    error::{StagecraftError, StagecraftResult},
};

/// Static site registry: scene order, routes, sub-sections, visual content.
/// Validated once at mount; everything downstream may assume it is sound.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SiteSpec {
    pub design: DesignSpace,
    /// Pre-resolved asset handles (intrinsic pixel dimensions). Loading is
    /// the collaborator's concern.
    pub assets: BTreeMap<String, AssetInfo>,
    /// Scene order is vertical order on the plane.
    pub scenes: Vec<SceneSpec>,
}

#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct AssetInfo {
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SceneSpec {
    pub id: String,
    /// Route path, e.g. `/about`.
    pub path: String,
    /// Horizontal sub-section order; empty for scenes without sub-sections.
    #[serde(default)]
    pub subsections: Vec<String>,
    #[serde(default)]
    pub bands: Bands,
}

/// Depth bands, painted far to near.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Bands {
    #[serde(default)]
    pub far: Vec<VisualSpec>,
    #[serde(default)]
    pub mid: Vec<VisualSpec>,
    #[serde(default)]
    pub near: Vec<VisualSpec>,
}

impl Bands {
    pub fn iter(&self) -> impl Iterator<Item = &VisualSpec> {
        self.far.iter().chain(self.mid.iter()).chain(self.near.iter())
    }
}

/// One visual element inside a band, placed by design-space center and sized
/// uniformly. Optional markers attach ambient drift, pointer parallax,
/// scroll scrub, or a visibility-gated effect to the element.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct VisualSpec {
    pub asset: String,
    pub center: [f64; 2],
    pub size: SizeBy,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drift: Option<DriftSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointer: Option<PointerLayerSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scrub: Option<ScrubSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<TriggerSpec>,
}

fn default_opacity() -> f64 {
    1.0
}

#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeBy {
    /// Target width; height follows the asset's aspect ratio.
    Width(f64),
    /// Target height; width follows the asset's aspect ratio.
    Height(f64),
    /// Repeating band extent. Width should far exceed the design width so
    /// horizontal parallax never exposes an edge.
    Band { width: f64, height: f64 },
}

/// Continuous per-frame horizontal drift with wraparound, run only while the
/// owning scene is active.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct DriftSpec {
    pub speed_px_per_ms: f64,
    pub wrap_min: f64,
    pub wrap_max: f64,
}

/// Pointer-driven parallax layer.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct PointerLayerSpec {
    /// Depth coefficient in [0, 1].
    pub depth: f64,
    /// Displacement in design pixels at full depth and full pointer swing.
    pub max_shift: f64,
}

/// Scroll-scrubbed parallax layer: displacement is a direct function of
/// scroll progress through `span`, no easing.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct ScrubSpec {
    /// Depth coefficient in [0, 1].
    pub depth: f64,
    /// Scroll-space span `[start, end)` the scrub runs across.
    pub span: [f64; 2],
    /// Also displace horizontally (vertical displacement is always applied).
    #[serde(default)]
    pub horizontal: bool,
}

/// Visibility-gated effect: active exactly while `span` intersects the
/// viewport per the enter/exit thresholds.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TriggerSpec {
    pub id: String,
    /// Scroll-space extent of the trigger region.
    pub span: [f64; 2],
    #[serde(default = "default_enter_frac")]
    pub enter_frac: f64,
    #[serde(default = "default_exit_frac")]
    pub exit_frac: f64,
    pub effect: EffectInstance,
}

fn default_enter_frac() -> f64 {
    0.8
}

fn default_exit_frac() -> f64 {
    0.2
}

/// Open effect descriptor; parsed strictly into a typed effect at mount.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct EffectInstance {
    pub kind: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub params: serde_json::Value,
}

impl SiteSpec {
    pub fn validate(&self) -> StagecraftResult<()> {
        if self.scenes.is_empty() {
            return Err(StagecraftError::validation("site must declare at least one scene"));
        }
        DesignSpace::new(self.design.width, self.design.height)?;

        let mut ids = BTreeSet::new();
        let mut paths = BTreeSet::new();
        let mut trigger_ids = BTreeSet::new();
        for scene in &self.scenes {
            if scene.id.trim().is_empty() {
                return Err(StagecraftError::validation("scene id must be non-empty"));
            }
            if !ids.insert(scene.id.as_str()) {
                return Err(StagecraftError::validation(format!(
                    "duplicate scene id '{}'",
                    scene.id
                )));
            }
            if !paths.insert(scene.path.as_str()) {
                return Err(StagecraftError::validation(format!(
                    "duplicate route path '{}'",
                    scene.path
                )));
            }
            let mut subs = BTreeSet::new();
            for sub in &scene.subsections {
                if !subs.insert(sub.as_str()) {
                    return Err(StagecraftError::validation(format!(
                        "scene '{}' has duplicate sub-section '{}'",
                        scene.id, sub
                    )));
                }
            }

            for visual in scene.bands.iter() {
                self.validate_visual(scene, visual, &mut trigger_ids)?;
            }
        }
        Ok(())
    }

    fn validate_visual<'a>(
        &self,
        scene: &SceneSpec,
        visual: &'a VisualSpec,
        trigger_ids: &mut BTreeSet<&'a str>,
    ) -> StagecraftResult<()> {
        if !self.assets.contains_key(&visual.asset) {
            return Err(StagecraftError::validation(format!(
                "scene '{}' references missing asset key '{}'",
                scene.id, visual.asset
            )));
        }
        if !(0.0..=1.0).contains(&visual.opacity) {
            return Err(StagecraftError::validation(format!(
                "scene '{}': opacity must be in [0, 1]",
                scene.id
            )));
        }
        if let Some(p) = &visual.pointer {
            if !(0.0..=1.0).contains(&p.depth) {
                return Err(StagecraftError::validation(
                    "pointer depth coefficient must be in [0, 1]",
                ));
            }
        }
        if let Some(s) = &visual.scrub {
            if !(0.0..=1.0).contains(&s.depth) {
                return Err(StagecraftError::validation(
                    "scrub depth coefficient must be in [0, 1]",
                ));
            }
            if s.span[0] >= s.span[1] {
                return Err(StagecraftError::validation("scrub span must have start < end"));
            }
        }
        if let Some(t) = &visual.trigger {
            if t.span[0] >= t.span[1] {
                return Err(StagecraftError::validation(format!(
                    "trigger '{}' span must have start < end",
                    t.id
                )));
            }
            if !trigger_ids.insert(t.id.as_str()) {
                return Err(StagecraftError::validation(format!(
                    "duplicate trigger id '{}'",
                    t.id
                )));
            }
        }
        Ok(())
    }

    pub fn scene(&self, id: &str) -> Option<&SceneSpec> {
        self.scenes.iter().find(|s| s.id == id)
    }
}
