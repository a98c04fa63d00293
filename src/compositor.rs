use crate::{
    core::{DesignSpace, FitTransform, Point, Viewport, cover_fit},
    error::{StagecraftError, StagecraftResult},
    graph::{NodeId, SceneGraph},
    model::{DriftSpec, SiteSpec, SizeBy, VisualSpec},
};

#[derive(Clone, Debug)]
struct AmbientDrift {
    node: NodeId,
    speed_px_per_ms: f64,
    wrap_min: f64,
    wrap_max: f64,
}

#[derive(Clone, Debug)]
struct MountedScene {
    id: String,
    root: NodeId,
    ambients: Vec<AmbientDrift>,
}

/// A built visual carrying its spec so the caller can wire parallax layers,
/// scrub layers, and trigger regions to the node.
#[derive(Clone, Debug)]
pub struct MountedVisual {
    pub node: NodeId,
    pub scene: String,
    pub spec: VisualSpec,
}

/// Arranges every scene's content into depth bands under one world
/// container and lays the whole plane out against the live viewport.
///
/// Scene roots stack vertically at viewport-height intervals and carry the
/// cover-fit scale, so the world container pans in screen pixels while scene
/// content stays authored in design space. Ambient per-frame effects run
/// only for the active scene; inactive scenes cost nothing per frame.
#[derive(Debug)]
pub struct Compositor {
    design: DesignSpace,
    camera: NodeId,
    world: NodeId,
    scenes: Vec<MountedScene>,
    active: usize,
}

impl Compositor {
    /// Build the whole plane from a validated site registry. Returns the
    /// compositor plus every visual that carries effect or parallax markers.
    #[tracing::instrument(skip(graph, site))]
    pub fn mount(
        graph: &mut SceneGraph,
        site: &SiteSpec,
    ) -> StagecraftResult<(Self, Vec<MountedVisual>)> {
        site.validate()?;

        let camera = graph.add_container(graph.root());
        let world = graph.add_container(camera);
        let mut scenes = Vec::new();
        let mut marked = Vec::new();

        for scene in &site.scenes {
            let root = graph.add_container(world);
            let mut ambients = Vec::new();
            // Painted far to near; child order is paint order.
            for band in [&scene.bands.far, &scene.bands.mid, &scene.bands.near] {
                let band_root = graph.add_container(root);
                for visual in band {
                    let node = build_visual(graph, band_root, site, visual)?;
                    if let Some(drift) = &visual.drift {
                        ambients.push(ambient(node, drift));
                    }
                    if visual.pointer.is_some()
                        || visual.scrub.is_some()
                        || visual.trigger.is_some()
                    {
                        marked.push(MountedVisual {
                            node,
                            scene: scene.id.clone(),
                            spec: visual.clone(),
                        });
                    }
                }
            }
            tracing::debug!(scene = %scene.id, "scene mounted");
            scenes.push(MountedScene {
                id: scene.id.clone(),
                root,
                ambients,
            });
        }

        Ok((
            Self {
                design: site.design,
                camera,
                world,
                scenes,
                active: 0,
            },
            marked,
        ))
    }

    pub fn camera(&self) -> NodeId {
        self.camera
    }

    pub fn world(&self) -> NodeId {
        self.world
    }

    pub fn scene_root(&self, id: &str) -> Option<NodeId> {
        self.scenes.iter().find(|s| s.id == id).map(|s| s.root)
    }

    pub fn active_scene(&self) -> &str {
        &self.scenes[self.active].id
    }

    /// Switch the active scene, stopping the old scene's ambient effects
    /// and starting the new one's from their current state.
    pub fn set_active_scene(&mut self, id: &str) {
        if let Some(index) = self.scenes.iter().position(|s| s.id == id) {
            self.active = index;
        }
    }

    /// Re-derive scene-root layout from the viewport: cover-fit scale plus
    /// centering offsets, stacked at viewport-height intervals. Pure in the
    /// viewport; calling it twice with the same size is a no-op.
    pub fn relayout(&self, graph: &mut SceneGraph, viewport: Viewport) -> FitTransform {
        let fit = cover_fit(viewport, self.design);
        for (index, scene) in self.scenes.iter().enumerate() {
            graph.set_position(
                scene.root,
                fit.offset_x,
                index as f64 * viewport.height + fit.offset_y,
            );
            graph.set_uniform_scale(scene.root, fit.scale);
        }
        fit
    }

    /// Per-frame ambient step for the active scene only.
    pub fn tick(&self, graph: &mut SceneGraph, dt_ms: f64) {
        for drift in &self.scenes[self.active].ambients {
            let node = graph.node_mut(drift.node);
            node.x += drift.speed_px_per_ms * dt_ms;
            if node.x > drift.wrap_max {
                node.x = drift.wrap_min;
            }
        }
    }
}

fn ambient(node: NodeId, spec: &DriftSpec) -> AmbientDrift {
    AmbientDrift {
        node,
        speed_px_per_ms: spec.speed_px_per_ms,
        wrap_min: spec.wrap_min,
        wrap_max: spec.wrap_max,
    }
}

fn build_visual(
    graph: &mut SceneGraph,
    parent: NodeId,
    site: &SiteSpec,
    visual: &VisualSpec,
) -> StagecraftResult<NodeId> {
    let center = Point::new(visual.center[0], visual.center[1]);
    let node = match visual.size {
        SizeBy::Width(w) => {
            let info = asset_info(site, &visual.asset)?;
            let node = graph.add_sprite(parent, info.width, info.height)?;
            graph.place_centered_by_width(node, center, w)?;
            node
        }
        SizeBy::Height(h) => {
            let info = asset_info(site, &visual.asset)?;
            let node = graph.add_sprite(parent, info.width, info.height)?;
            graph.place_centered_by_height(node, center, h)?;
            node
        }
        SizeBy::Band { width, height } => {
            let node = graph.add_tiling_band(parent, width, height)?;
            graph.place_band_centered(node, center)?;
            node
        }
    };
    graph.set_opacity(node, visual.opacity);
    Ok(node)
}

fn asset_info<'a>(site: &'a SiteSpec, key: &str) -> StagecraftResult<&'a crate::model::AssetInfo> {
    site.assets
        .get(key)
        .ok_or_else(|| StagecraftError::mount(format!("missing asset '{key}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AssetInfo, Bands, SceneSpec};
    use std::collections::BTreeMap;

    fn site() -> SiteSpec {
        let mut assets = BTreeMap::new();
        assets.insert("cloud".to_string(), AssetInfo { width: 200.0, height: 120.0 });
        assets.insert("trees".to_string(), AssetInfo { width: 512.0, height: 150.0 });
        SiteSpec {
            design: DesignSpace::FULL_HD,
            assets,
            scenes: vec![
                SceneSpec {
                    id: "home".to_string(),
                    path: "/".to_string(),
                    subsections: vec![],
                    bands: Bands {
                        far: vec![
                            VisualSpec {
                                asset: "cloud".to_string(),
                                center: [1400.0, 200.0],
                                size: SizeBy::Width(300.0),
                                opacity: 1.0,
                                drift: Some(DriftSpec {
                                    speed_px_per_ms: 0.015,
                                    wrap_min: -300.0,
                                    wrap_max: 2100.0,
                                }),
                                pointer: None,
                                scrub: None,
                                trigger: None,
                            },
                            VisualSpec {
                                asset: "trees".to_string(),
                                center: [960.0, 500.0],
                                size: SizeBy::Band {
                                    width: 4000.0,
                                    height: 150.0,
                                },
                                opacity: 0.9,
                                drift: None,
                                pointer: None,
                                scrub: None,
                                trigger: None,
                            },
                        ],
                        ..Bands::default()
                    },
                },
                SceneSpec {
                    id: "shop".to_string(),
                    path: "/shop".to_string(),
                    subsections: vec![],
                    bands: Bands::default(),
                },
            ],
        }
    }

    #[test]
    fn relayout_stacks_scenes_with_cover_fit() {
        let mut graph = SceneGraph::new();
        let (comp, _) = Compositor::mount(&mut graph, &site()).unwrap();
        let vp = Viewport::new(960.0, 540.0);
        let fit = comp.relayout(&mut graph, vp);
        assert_eq!(fit.scale, 0.5);
        let home = graph.node(comp.scene_root("home").unwrap());
        let shop = graph.node(comp.scene_root("shop").unwrap());
        assert_eq!((home.x, home.y), (0.0, 0.0));
        assert_eq!((shop.x, shop.y), (0.0, 540.0));
        assert_eq!(home.scale_x, 0.5);
    }

    #[test]
    fn relayout_is_idempotent() {
        let mut graph = SceneGraph::new();
        let (comp, _) = Compositor::mount(&mut graph, &site()).unwrap();
        let vp = Viewport::new(1234.0, 777.0);
        comp.relayout(&mut graph, vp);
        let before = graph.node(comp.scene_root("home").unwrap()).clone();
        comp.relayout(&mut graph, vp);
        let after = graph.node(comp.scene_root("home").unwrap());
        assert_eq!((before.x, before.y, before.scale_x), (after.x, after.y, after.scale_x));
    }

    #[test]
    fn ambient_drift_runs_only_for_active_scene() {
        let mut graph = SceneGraph::new();
        let (mut comp, _) = Compositor::mount(&mut graph, &site()).unwrap();
        let cloud = {
            let home = comp.scene_root("home").unwrap();
            let far = graph.node(home).children[0];
            graph.node(far).children[0]
        };
        let x0 = graph.node(cloud).x;

        comp.set_active_scene("shop");
        comp.tick(&mut graph, 1000.0);
        assert_eq!(graph.node(cloud).x, x0);

        comp.set_active_scene("home");
        comp.tick(&mut graph, 1000.0);
        assert_eq!(graph.node(cloud).x, x0 + 15.0);
    }

    #[test]
    fn ambient_drift_wraps_around() {
        let mut graph = SceneGraph::new();
        let (comp, _) = Compositor::mount(&mut graph, &site()).unwrap();
        let cloud = {
            let home = comp.scene_root("home").unwrap();
            let far = graph.node(home).children[0];
            graph.node(far).children[0]
        };
        graph.node_mut(cloud).x = 2099.0;
        comp.tick(&mut graph, 1000.0);
        assert_eq!(graph.node(cloud).x, -300.0);
    }

    #[test]
    fn band_spans_past_design_edges() {
        let mut graph = SceneGraph::new();
        let (comp, _) = Compositor::mount(&mut graph, &site()).unwrap();
        let home = comp.scene_root("home").unwrap();
        let far = graph.node(home).children[0];
        let band = graph.node(far).children[1];
        let n = graph.node(band);
        assert!(n.x < 0.0);
        assert!(n.x + 4000.0 > DesignSpace::FULL_HD.width);
    }

    #[test]
    fn unknown_active_scene_is_ignored() {
        let mut graph = SceneGraph::new();
        let (mut comp, _) = Compositor::mount(&mut graph, &site()).unwrap();
        comp.set_active_scene("nope");
        assert_eq!(comp.active_scene(), "home");
    }
}
