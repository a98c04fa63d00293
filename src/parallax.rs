use std::collections::BTreeMap;

use crate::{
    core::Viewport,
    ease::Ease,
    error::{StagecraftError, StagecraftResult},
    graph::{NodeId, SceneGraph},
    model::{EffectInstance, PointerLayerSpec, ScrubSpec},
    nav::MotionPreference,
    tween::{PropertySet, Repeat, Timing, TweenId, TweenRuntime},
};

const POINTER_CATCHUP_MS: f64 = 1000.0;
const SCRUB_SHIFT_X: f64 = 60.0;
const SCRUB_SHIFT_Y: f64 = 120.0;

/// Typed looping effects a trigger region can run while visible.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EffectKind {
    /// Rising drift that fades out each cycle (steam).
    Drift { dy: f64, duration_ms: f64 },
    /// Opacity pulse toward a dim value and back (sparkle).
    Pulse { opacity: f64, duration_ms: f64 },
}

/// Strictly parse an open effect descriptor.
pub fn parse_effect(inst: &EffectInstance) -> StagecraftResult<EffectKind> {
    let kind = inst.kind.trim().to_ascii_lowercase();
    if kind.is_empty() {
        return Err(StagecraftError::validation("effect kind must be non-empty"));
    }

    match kind.as_str() {
        "drift" => {
            let dy = get_f64(&inst.params, "dy")?.unwrap_or(-20.0);
            let duration_ms = get_f64(&inst.params, "duration_ms")?.unwrap_or(2000.0);
            if !dy.is_finite() {
                return Err(StagecraftError::validation("drift.dy must be finite"));
            }
            if !(duration_ms > 0.0) {
                return Err(StagecraftError::validation("drift.duration_ms must be > 0"));
            }
            Ok(EffectKind::Drift { dy, duration_ms })
        }
        "pulse" => {
            let opacity = get_f64(&inst.params, "opacity")?.unwrap_or(0.2);
            let duration_ms = get_f64(&inst.params, "duration_ms")?.unwrap_or(900.0);
            if !(0.0..=1.0).contains(&opacity) {
                return Err(StagecraftError::validation("pulse.opacity must be in [0, 1]"));
            }
            if !(duration_ms > 0.0) {
                return Err(StagecraftError::validation("pulse.duration_ms must be > 0"));
            }
            Ok(EffectKind::Pulse { opacity, duration_ms })
        }
        _ => Err(StagecraftError::validation(format!(
            "unknown effect kind '{kind}'"
        ))),
    }
}

fn get_f64(params: &serde_json::Value, key: &str) -> StagecraftResult<Option<f64>> {
    match params.get(key) {
        None => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| StagecraftError::validation(format!("effect param '{key}' must be a number"))),
    }
}

#[derive(Clone, Copy, Debug)]
struct Neutral {
    x: f64,
    y: f64,
    opacity: f64,
}

#[derive(Clone, Debug)]
struct ActiveEffect {
    handle: TweenId,
    neutral: Neutral,
}

#[derive(Clone, Debug)]
struct TriggerRegion {
    node: NodeId,
    span: [f64; 2],
    enter_frac: f64,
    exit_frac: f64,
    effect: EffectKind,
}

#[derive(Clone, Copy, Debug)]
struct PointerLayer {
    node: NodeId,
    depth: f64,
    max_shift: f64,
    base_x: f64,
    base_y: f64,
}

#[derive(Clone, Copy, Debug)]
struct ScrubLayer {
    node: NodeId,
    depth: f64,
    span: [f64; 2],
    horizontal: bool,
    base_x: f64,
    base_y: f64,
}

/// Runs effects gated on viewport intersection, pointer-driven depth layers,
/// and scroll-scrubbed layers.
///
/// Each trigger region is a tiny `Inactive <-> Active` state machine keyed by
/// trigger id; the active record holds the looping tween handle and the
/// neutral snapshot taken on entry, so a leave can always cancel totally and
/// restore the exact pre-enter state — unboundedly restartable.
#[derive(Debug, Default)]
pub struct ParallaxController {
    motion_reduced: bool,
    triggers: BTreeMap<String, TriggerRegion>,
    active: BTreeMap<String, ActiveEffect>,
    pointer_layers: Vec<PointerLayer>,
    scrub_layers: Vec<ScrubLayer>,
}

impl ParallaxController {
    pub fn new(motion: MotionPreference) -> Self {
        Self {
            motion_reduced: motion == MotionPreference::Reduced,
            ..Self::default()
        }
    }

    pub fn register_trigger(
        &mut self,
        id: &str,
        node: NodeId,
        span: [f64; 2],
        enter_frac: f64,
        exit_frac: f64,
        effect: &EffectInstance,
    ) -> StagecraftResult<()> {
        let effect = parse_effect(effect)?;
        if self.triggers.contains_key(id) {
            return Err(StagecraftError::validation(format!(
                "duplicate trigger id '{id}'"
            )));
        }
        self.triggers.insert(
            id.to_string(),
            TriggerRegion {
                node,
                span,
                enter_frac,
                exit_frac,
                effect,
            },
        );
        Ok(())
    }

    /// Register a pointer-driven depth layer. The node's current position is
    /// its neutral base; displacement is added to it.
    pub fn register_pointer_layer(
        &mut self,
        graph: &SceneGraph,
        node: NodeId,
        spec: PointerLayerSpec,
    ) {
        let n = graph.node(node);
        self.pointer_layers.push(PointerLayer {
            node,
            depth: spec.depth,
            max_shift: spec.max_shift,
            base_x: n.x,
            base_y: n.y,
        });
    }

    pub fn register_scrub_layer(&mut self, graph: &SceneGraph, node: NodeId, spec: ScrubSpec) {
        let n = graph.node(node);
        self.scrub_layers.push(ScrubLayer {
            node,
            depth: spec.depth,
            span: spec.span,
            horizontal: spec.horizontal,
            base_x: n.x,
            base_y: n.y,
        });
    }

    /// Pointer sample with both axes normalized to [-0.5, 0.5]. Each layer
    /// animates toward `base - axis * depth * max_shift` with overwrite
    /// semantics: the latest sample always wins, nothing queues, and the
    /// layer catches up smoothly from wherever it currently is.
    pub fn on_pointer(
        &mut self,
        graph: &mut SceneGraph,
        tweens: &mut TweenRuntime,
        norm_x: f64,
        norm_y: f64,
    ) {
        if self.motion_reduced {
            return;
        }
        for layer in &self.pointer_layers {
            let shift = layer.depth * layer.max_shift;
            tweens.animate(
                graph,
                layer.node,
                PropertySet::new()
                    .x(layer.base_x - norm_x * shift)
                    .y(layer.base_y - norm_y * shift),
                Timing::new(POINTER_CATCHUP_MS, Ease::OutQuad),
            );
        }
    }

    /// Scroll sample. Scrub layers track 1:1 with no easing; trigger regions
    /// flip between active and inactive as their span crosses the
    /// viewport-relative thresholds.
    pub fn on_scroll(
        &mut self,
        graph: &mut SceneGraph,
        tweens: &mut TweenRuntime,
        scroll_y: f64,
        viewport: Viewport,
    ) {
        if self.motion_reduced {
            return;
        }

        for layer in &self.scrub_layers {
            let len = layer.span[1] - layer.span[0];
            let progress = ((scroll_y - layer.span[0]) / len).clamp(0.0, 1.0);
            let mut props = PropertySet::new().y(layer.base_y - layer.depth * SCRUB_SHIFT_Y * progress);
            if layer.horizontal {
                props = props.x(layer.base_x - layer.depth * SCRUB_SHIFT_X * progress);
            }
            tweens.set_immediate(graph, layer.node, props);
        }

        let mut entries = Vec::new();
        let mut exits = Vec::new();
        for (id, region) in &self.triggers {
            let visible = region.span[0] < scroll_y + viewport.height * region.enter_frac
                && region.span[1] > scroll_y + viewport.height * region.exit_frac;
            let is_active = self.active.contains_key(id);
            if visible && !is_active {
                entries.push(id.clone());
            } else if !visible && is_active {
                exits.push(id.clone());
            }
        }
        for id in entries {
            self.activate(graph, tweens, &id);
        }
        for id in exits {
            self.deactivate(graph, tweens, &id);
        }
    }

    /// Cancel every active effect and restore neutral state (teardown path).
    pub fn deactivate_all(&mut self, graph: &mut SceneGraph, tweens: &mut TweenRuntime) {
        let ids: Vec<String> = self.active.keys().cloned().collect();
        for id in ids {
            self.deactivate(graph, tweens, &id);
        }
    }

    pub fn active_trigger_count(&self) -> usize {
        self.active.len()
    }

    fn activate(&mut self, graph: &mut SceneGraph, tweens: &mut TweenRuntime, id: &str) {
        let Some(region) = self.triggers.get(id) else {
            return;
        };
        let n = graph.node(region.node);
        let neutral = Neutral {
            x: n.x,
            y: n.y,
            opacity: n.opacity,
        };
        tracing::debug!(trigger = id, "effect enter");
        let handle = match region.effect {
            EffectKind::Drift { dy, duration_ms } => tweens.animate(
                graph,
                region.node,
                PropertySet::new().y(neutral.y + dy).opacity(0.0),
                Timing::new(duration_ms, Ease::InOutSine).with_repeat(Repeat::Loop),
            ),
            EffectKind::Pulse { opacity, duration_ms } => tweens.animate(
                graph,
                region.node,
                PropertySet::new().opacity(opacity),
                Timing::new(duration_ms, Ease::InOutSine).with_repeat(Repeat::Yoyo),
            ),
        };
        self.active.insert(id.to_string(), ActiveEffect { handle, neutral });
    }

    fn deactivate(&mut self, graph: &mut SceneGraph, tweens: &mut TweenRuntime, id: &str) {
        let Some(active) = self.active.remove(id) else {
            return;
        };
        let Some(region) = self.triggers.get(id) else {
            return;
        };
        tracing::debug!(trigger = id, "effect leave");
        tweens.cancel(active.handle);
        tweens.set_immediate(
            graph,
            region.node,
            PropertySet::new()
                .x(active.neutral.x)
                .y(active.neutral.y)
                .opacity(active.neutral.opacity),
        );
    }
}
