use crate::{
    core::{DesignSpace, FitTransform, Viewport, cover_fit},
    ease::Ease,
    graph::{NodeId, SceneGraph},
    routes::RouteTable,
    tween::{PropertySet, Timing, TweenId, TweenRuntime},
};

/// OS-level motion preference. `Reduced` collapses every transition to its
/// endpoint with no animation, no lift, no wipe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionPreference {
    Full,
    Reduced,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavState {
    Idle,
    Transitioning,
}

const PAN_MS: f64 = 1050.0;
const LIFT_SCALE: f64 = 1.03;
const LIFT_IN_MS: f64 = 180.0;
const LIFT_OUT_MS: f64 = 350.0;
const LIFT_OUT_AT_MS: f64 = 650.0;
const WIPE_IN_MS: f64 = 160.0;
const WIPE_IN_AT_MS: f64 = 120.0;
const WIPE_OUT_MS: f64 = 200.0;
const WIPE_OUT_AT_MS: f64 = 220.0;
const WIPE_SNAP_AT_MS: f64 = 200.0;
const EXIT_FADE_MS: f64 = 250.0;
const ENTER_FADE_MS: f64 = 450.0;

#[derive(Clone, Copy, Debug)]
enum Deferred {
    SnapWorld { x: f64, y: f64 },
    WipeOut,
    FadeSwap { out: Option<NodeId>, inn: Option<NodeId> },
    LiftSettle,
}

/// Navigation state machine owning the world transform.
///
/// At most one transition is authoritative at a time: starting any pan kills
/// the previous transition's tweens and pending actions first, and the new
/// animation departs from the current (possibly mid-flight) transform. The
/// live tween ids form the single-slot "current operation" register; nothing
/// is ever queued behind them.
#[derive(Debug)]
pub struct Navigator {
    routes: RouteTable,
    design: DesignSpace,
    viewport: Viewport,
    motion: MotionPreference,
    world: NodeId,
    camera: Option<NodeId>,
    wipe: Option<NodeId>,
    current: Vec<TweenId>,
    deferred: Vec<(f64, Deferred)>,
    fade_roots: Vec<NodeId>,
}

impl Navigator {
    pub fn new(
        routes: RouteTable,
        design: DesignSpace,
        viewport: Viewport,
        motion: MotionPreference,
        world: NodeId,
        camera: Option<NodeId>,
        wipe: Option<NodeId>,
    ) -> Self {
        Self {
            routes,
            design,
            viewport,
            motion,
            world,
            camera,
            wipe,
            current: Vec::new(),
            deferred: Vec::new(),
            fade_roots: Vec::new(),
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Cover fit for the current viewport; derived on every call, never
    /// stored.
    pub fn fit(&self) -> FitTransform {
        cover_fit(self.viewport, self.design)
    }

    pub fn state(&self, tweens: &TweenRuntime) -> NavState {
        if self.current.iter().any(|id| tweens.is_active(*id)) || !self.deferred.is_empty() {
            NavState::Transitioning
        } else {
            NavState::Idle
        }
    }

    /// Vertical navigation: pan to `to`'s scene offset. The horizontal
    /// offset resets to 0 whenever the scene changes and is preserved only
    /// when `from == to`.
    #[tracing::instrument(skip(self, graph, tweens))]
    pub fn pan_to_scene(
        &mut self,
        graph: &mut SceneGraph,
        tweens: &mut TweenRuntime,
        from: &str,
        to: &str,
        immediate: bool,
    ) {
        let x = if from == to { graph.node(self.world).x } else { 0.0 };
        let y = self.routes.vertical_offset(to, self.viewport);
        self.animate_world_to(graph, tweens, x, y, immediate);
    }

    /// Horizontal navigation: pan to the sub-section hash within `scene`,
    /// preserving the vertical offset.
    #[tracing::instrument(skip(self, graph, tweens))]
    pub fn pan_to_section(
        &mut self,
        graph: &mut SceneGraph,
        tweens: &mut TweenRuntime,
        scene: &str,
        hash: &str,
        immediate: bool,
    ) {
        let x = self.routes.horizontal_offset(scene, hash, self.viewport);
        let y = graph.node(self.world).y;
        self.animate_world_to(graph, tweens, x, y, immediate);
    }

    /// Re-derive the whole world transform from the URL. Horizontal offset
    /// applies only on scenes that declare sub-sections.
    #[tracing::instrument(skip(self, graph, tweens))]
    pub fn sync_from_url(
        &mut self,
        graph: &mut SceneGraph,
        tweens: &mut TweenRuntime,
        path: &str,
        hash: &str,
        immediate: bool,
    ) {
        let scene = self.routes.scene_for_path(path).to_string();
        let y = self.routes.vertical_offset(&scene, self.viewport);
        let x = if self.routes.has_subsections(&scene) {
            self.routes.horizontal_offset(&scene, hash, self.viewport)
        } else {
            0.0
        };
        self.animate_world_to(graph, tweens, x, y, immediate);
    }

    /// Resize re-snap: update the viewport and take the immediate path for
    /// the current URL. Never animates, so a resize can never race a pan.
    pub fn resize(
        &mut self,
        graph: &mut SceneGraph,
        tweens: &mut TweenRuntime,
        viewport: Viewport,
        path: &str,
        hash: &str,
    ) {
        self.viewport = viewport;
        self.sync_from_url(graph, tweens, path, hash, true);
    }

    /// Pan with a full-screen opacity wipe: the world snaps to the target
    /// mid-wipe instead of panning, and the outgoing/incoming scene roots
    /// crossfade around the snap.
    #[tracing::instrument(skip(self, graph, tweens, fade_out, fade_in))]
    pub fn wipe_to_scene(
        &mut self,
        graph: &mut SceneGraph,
        tweens: &mut TweenRuntime,
        to: &str,
        fade_out: Option<NodeId>,
        fade_in: Option<NodeId>,
    ) {
        let x = 0.0;
        let y = self.routes.vertical_offset(to, self.viewport);
        let wipe = match self.wipe {
            Some(wipe) if self.motion == MotionPreference::Full => wipe,
            _ => {
                self.animate_world_to(graph, tweens, x, y, true);
                return;
            }
        };

        self.supersede(graph, tweens);
        self.fade_roots.extend(fade_out.into_iter().chain(fade_in));
        tracing::debug!(to, x, y, "wipe transition start");

        let in_id = tweens.animate(
            graph,
            wipe,
            PropertySet::new().opacity(1.0),
            Timing::new(WIPE_IN_MS, Ease::InSine).with_delay(WIPE_IN_AT_MS),
        );
        self.current.push(in_id);
        if let Some(out) = fade_out {
            let id = tweens.animate(
                graph,
                out,
                PropertySet::new().opacity(0.0),
                Timing::new(EXIT_FADE_MS, Ease::InQuad),
            );
            self.current.push(id);
        }
        self.deferred.push((WIPE_SNAP_AT_MS, Deferred::SnapWorld { x, y }));
        self.deferred.push((
            WIPE_SNAP_AT_MS,
            Deferred::FadeSwap {
                out: fade_out,
                inn: fade_in,
            },
        ));
        self.deferred.push((WIPE_OUT_AT_MS, Deferred::WipeOut));
    }

    /// Advance deferred mid-transition actions and re-derive wipe
    /// interactivity from its opacity. The overlay blocks pointer events iff
    /// it is visible at all; deriving the flag here (rather than in
    /// completion callbacks) means an interrupted wipe can never leave the
    /// page blocked.
    pub fn tick(&mut self, graph: &mut SceneGraph, tweens: &mut TweenRuntime, dt_ms: f64) {
        let mut due = Vec::new();
        for (left, action) in &mut self.deferred {
            *left -= dt_ms;
            if *left <= 0.0 {
                due.push(*action);
            }
        }
        self.deferred.retain(|(left, _)| *left > 0.0);

        for action in due {
            match action {
                Deferred::SnapWorld { x, y } => {
                    tweens.set_immediate(graph, self.world, PropertySet::new().x(x).y(y));
                }
                Deferred::FadeSwap { out, inn } => {
                    if let Some(out) = out {
                        tweens.set_immediate(graph, out, PropertySet::new().opacity(1.0));
                    }
                    if let Some(inn) = inn {
                        tweens.set_immediate(graph, inn, PropertySet::new().opacity(0.0));
                        let id = tweens.animate(
                            graph,
                            inn,
                            PropertySet::new().opacity(1.0),
                            Timing::new(ENTER_FADE_MS, Ease::OutQuad),
                        );
                        self.current.push(id);
                    }
                }
                Deferred::WipeOut => {
                    if let Some(wipe) = self.wipe {
                        let id = tweens.animate(
                            graph,
                            wipe,
                            PropertySet::new().opacity(0.0),
                            Timing::new(WIPE_OUT_MS, Ease::OutSine),
                        );
                        self.current.push(id);
                    }
                }
                Deferred::LiftSettle => {
                    if let Some(camera) = self.camera {
                        let id = tweens.animate(
                            graph,
                            camera,
                            PropertySet::new().scale(1.0),
                            Timing::new(LIFT_OUT_MS, Ease::OutCubic),
                        );
                        self.current.push(id);
                    }
                }
            }
        }

        if let Some(wipe) = self.wipe {
            let opaque = graph.node(wipe).opacity > 0.0;
            graph.node_mut(wipe).interactive = opaque;
        }
    }

    fn animate_world_to(
        &mut self,
        graph: &mut SceneGraph,
        tweens: &mut TweenRuntime,
        x: f64,
        y: f64,
        immediate: bool,
    ) {
        self.supersede(graph, tweens);

        if immediate || self.motion == MotionPreference::Reduced {
            tweens.set_immediate(graph, self.world, PropertySet::new().x(x).y(y));
            if let Some(camera) = self.camera {
                tweens.set_immediate(graph, camera, PropertySet::new().scale(1.0));
            }
            if let Some(wipe) = self.wipe {
                tweens.set_immediate(graph, wipe, PropertySet::new().opacity(0.0));
                graph.node_mut(wipe).interactive = false;
            }
            return;
        }

        tracing::debug!(x, y, "world pan start");

        // A superseded wipe may have left the overlay partially opaque; it
        // must still reach zero so interactivity is revoked.
        if let Some(wipe) = self.wipe {
            if graph.node(wipe).opacity > 0.0 {
                let id = tweens.animate(
                    graph,
                    wipe,
                    PropertySet::new().opacity(0.0),
                    Timing::new(WIPE_OUT_MS, Ease::OutSine),
                );
                self.current.push(id);
            }
        }

        let pan = tweens.animate(
            graph,
            self.world,
            PropertySet::new().x(x).y(y),
            Timing::new(PAN_MS, Ease::InOutCubic),
        );
        self.current.push(pan);

        // Cosmetic lift: up before the pan midpoint, back to neutral before
        // the pan completes. Never gates the position tween.
        if let Some(camera) = self.camera {
            let up = tweens.animate(
                graph,
                camera,
                PropertySet::new().scale(LIFT_SCALE),
                Timing::new(LIFT_IN_MS, Ease::InOutCubic),
            );
            self.current.push(up);
            self.deferred.push((LIFT_OUT_AT_MS, Deferred::LiftSettle));
        }
    }

    /// Cancel the in-flight transition, if any: kill its tweens and drop its
    /// pending actions. No completion fires for any of them. Scene roots left
    /// mid-crossfade are restored to full opacity so a dropped wipe cannot
    /// strand a scene half-faded.
    fn supersede(&mut self, graph: &mut SceneGraph, tweens: &mut TweenRuntime) {
        if !self.current.is_empty() || !self.deferred.is_empty() {
            tracing::debug!("superseding in-flight transition");
        }
        for id in self.current.drain(..) {
            tweens.cancel(id);
        }
        self.deferred.clear();
        for node in self.fade_roots.drain(..) {
            tweens.set_immediate(graph, node, PropertySet::new().opacity(1.0));
        }
        tweens.kill_tweens_of(self.world);
        if let Some(camera) = self.camera {
            tweens.kill_tweens_of(camera);
        }
    }
}
