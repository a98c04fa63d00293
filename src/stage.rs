use crate::{
    compositor::Compositor,
    core::{Viewport, WorldTransform},
    error::StagecraftResult,
    graph::{NodeId, SceneGraph},
    history::History,
    model::SiteSpec,
    nav::{MotionPreference, NavState, Navigator},
    parallax::ParallaxController,
    routes::{LinkTarget, resolve_link},
    tween::TweenRuntime,
};

#[derive(Clone, Debug)]
pub struct StageOpts {
    pub viewport: Viewport,
    pub motion: MotionPreference,
    /// Page origin used to recognize cross-origin link targets.
    pub origin: String,
}

/// The owned engine context: scene graph, tween runtime, navigation state
/// machine, parallax controller, and compositor behind one set of
/// browser-shaped entry points. Multiple stages are fully independent.
///
/// The URL (via the [`History`] seam) is the single source of truth: the
/// current scene and sub-section are derived from it on every read.
pub struct Stage<H: History> {
    graph: SceneGraph,
    tweens: TweenRuntime,
    nav: Navigator,
    parallax: ParallaxController,
    compositor: Compositor,
    history: H,
    wipe: NodeId,
    origin: String,
}

impl<H: History> Stage<H> {
    /// Build the whole plane from a validated site registry and snap to the
    /// current URL. Registry problems are construction-time fatal; a scene
    /// with no visuals mounts fine and stays navigable.
    #[tracing::instrument(skip(site, history, opts))]
    pub fn mount(site: &SiteSpec, history: H, opts: StageOpts) -> StagecraftResult<Self> {
        let mut graph = SceneGraph::new();
        let (compositor, marked) = Compositor::mount(&mut graph, site)?;

        // Full-screen wipe overlay, above everything, invisible at rest.
        let wipe = graph.add_container(graph.root());
        graph.set_opacity(wipe, 0.0);

        let routes = crate::routes::RouteTable::from_site(site)?;
        let nav = Navigator::new(
            routes,
            site.design,
            opts.viewport,
            opts.motion,
            compositor.world(),
            Some(compositor.camera()),
            Some(wipe),
        );

        let mut parallax = ParallaxController::new(opts.motion);
        for mv in marked {
            if let Some(pointer) = mv.spec.pointer {
                parallax.register_pointer_layer(&graph, mv.node, pointer);
            }
            if let Some(scrub) = mv.spec.scrub {
                parallax.register_scrub_layer(&graph, mv.node, scrub);
            }
            if let Some(trigger) = &mv.spec.trigger {
                parallax.register_trigger(
                    &trigger.id,
                    mv.node,
                    trigger.span,
                    trigger.enter_frac,
                    trigger.exit_frac,
                    &trigger.effect,
                )?;
            }
        }

        let mut stage = Self {
            graph,
            tweens: TweenRuntime::new(),
            nav,
            parallax,
            compositor,
            history,
            wipe,
            origin: opts.origin,
        };
        stage.compositor.relayout(&mut stage.graph, opts.viewport);
        stage.sync_from_url(true);
        Ok(stage)
    }

    /// Internal link click. Cross-origin targets are not intercepted and
    /// the caller should let the browser navigate; returns whether the
    /// click was consumed.
    #[tracing::instrument(skip(self))]
    pub fn click(&mut self, href: &str) -> bool {
        let LinkTarget::Internal { path, hash } = resolve_link(href, &self.origin) else {
            return false;
        };

        let from = self.current_scene().to_string();
        let to = self.nav.routes().scene_for_path(&path).to_string();

        if to == from && !hash.is_empty() && self.nav.routes().has_subsections(&to) {
            self.history.push(&path, &hash);
            self.nav
                .pan_to_section(&mut self.graph, &mut self.tweens, &to, &hash, false);
            self.compositor.set_active_scene(&to);
            return true;
        }

        // Scene-changing pushes drop any hash so the URL always matches the
        // rest transform the pan ends at.
        self.history.push(&path, "");
        if from != to
            && self.nav.routes().has_subsections(&from)
            && to == self.nav.routes().default_scene()
        {
            // Hand-off out of the sub-section scene back home runs the wipe
            // instead of the long pan.
            let fade_out = self.compositor.scene_root(&from);
            let fade_in = self.compositor.scene_root(&to);
            self.nav
                .wipe_to_scene(&mut self.graph, &mut self.tweens, &to, fade_out, fade_in);
        } else {
            self.nav
                .pan_to_scene(&mut self.graph, &mut self.tweens, &from, &to, false);
        }
        self.compositor.set_active_scene(&to);
        true
    }

    /// Back/forward arrived: re-derive everything from the URL, animated.
    pub fn popstate(&mut self) {
        self.sync_from_url(false);
    }

    /// Hash-only change: horizontal pan when the current scene has
    /// sub-sections, otherwise nothing.
    pub fn hashchange(&mut self) {
        let scene = self.current_scene().to_string();
        if self.nav.routes().has_subsections(&scene) {
            let hash = self.history.hash();
            self.nav
                .pan_to_section(&mut self.graph, &mut self.tweens, &scene, &hash, false);
        }
    }

    /// Viewport changed: re-snap scale and position immediately. Never
    /// animates, so spurious resize events are harmless.
    pub fn resize(&mut self, viewport: Viewport) {
        let path = self.history.path();
        let hash = self.history.hash();
        self.compositor.relayout(&mut self.graph, viewport);
        self.nav
            .resize(&mut self.graph, &mut self.tweens, viewport, &path, &hash);
    }

    /// Pointer sample, both axes normalized to [-0.5, 0.5].
    pub fn pointer_move(&mut self, norm_x: f64, norm_y: f64) {
        self.parallax
            .on_pointer(&mut self.graph, &mut self.tweens, norm_x, norm_y);
    }

    /// Scroll sample in page pixels.
    pub fn scroll(&mut self, scroll_y: f64) {
        let viewport = self.nav.viewport();
        self.parallax
            .on_scroll(&mut self.graph, &mut self.tweens, scroll_y, viewport);
    }

    /// Per-frame step: advance tweens, run deferred navigation actions,
    /// drive the active scene's ambient effects.
    pub fn tick(&mut self, dt_ms: f64) {
        self.tweens.advance(&mut self.graph, dt_ms);
        self.nav.tick(&mut self.graph, &mut self.tweens, dt_ms);
        self.compositor.tick(&mut self.graph, dt_ms);
    }

    /// Stop every effect and in-flight animation, restoring neutral state.
    /// The graph itself persists for the page's lifetime.
    pub fn teardown(&mut self) {
        self.parallax
            .deactivate_all(&mut self.graph, &mut self.tweens);
        self.sync_from_url(true);
    }

    pub fn world_transform(&self) -> WorldTransform {
        let world = self.graph.node(self.compositor.world());
        WorldTransform {
            x: world.x,
            y: world.y,
            scale: self.nav.fit().scale,
        }
    }

    /// Scene the URL currently addresses (derived, never cached).
    pub fn current_scene(&self) -> &str {
        self.nav.routes().scene_for_path(&self.history.path())
    }

    /// True iff the current scene declares sub-sections (drives the side
    /// navigation's active state).
    pub fn subsection_nav_active(&self) -> bool {
        let scene = self.current_scene();
        self.nav.routes().has_subsections(scene)
    }

    pub fn nav_state(&self) -> NavState {
        self.nav.state(&self.tweens)
    }

    pub fn active_scene(&self) -> &str {
        self.compositor.active_scene()
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut H {
        &mut self.history
    }

    pub fn wipe_overlay(&self) -> NodeId {
        self.wipe
    }

    fn sync_from_url(&mut self, immediate: bool) {
        let path = self.history.path();
        let hash = self.history.hash();
        self.nav
            .sync_from_url(&mut self.graph, &mut self.tweens, &path, &hash, immediate);
        let scene = self.nav.routes().scene_for_path(&path).to_string();
        self.compositor.set_active_scene(&scene);
    }
}
