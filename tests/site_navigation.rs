use std::collections::BTreeMap;

use stagecraft::{
    DesignSpace, MemoryHistory, MotionPreference, NavState, Stage, StageOpts, Viewport,
    model::{
        AssetInfo, Bands, DriftSpec, EffectInstance, PointerLayerSpec, SceneSpec, ScrubSpec,
        SiteSpec, SizeBy, TriggerSpec, VisualSpec,
    },
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn visual(asset: &str, center: [f64; 2], size: SizeBy) -> VisualSpec {
    VisualSpec {
        asset: asset.to_string(),
        center,
        size,
        opacity: 1.0,
        drift: None,
        pointer: None,
        scrub: None,
        trigger: None,
    }
}

/// The stock storefront: six vertically stacked scenes, a sub-sectioned
/// about scene, and a home scene with layered hero content.
fn storefront() -> SiteSpec {
    let mut assets = BTreeMap::new();
    for (key, w, h) in [
        ("cloud", 200.0, 120.0),
        ("watertower", 130.0, 260.0),
        ("treeline", 512.0, 150.0),
        ("store", 400.0, 300.0),
        ("steam", 60.0, 90.0),
        ("grass", 600.0, 360.0),
    ] {
        assets.insert(key.to_string(), AssetInfo { width: w, height: h });
    }

    let home_bands = Bands {
        far: vec![
            VisualSpec {
                drift: Some(DriftSpec {
                    speed_px_per_ms: 0.015,
                    wrap_min: -300.0,
                    wrap_max: 2100.0,
                }),
                ..visual("cloud", [1400.0, 200.0], SizeBy::Width(300.0))
            },
            visual("watertower", [1600.0, 400.0], SizeBy::Width(260.0)),
            VisualSpec {
                scrub: Some(ScrubSpec {
                    depth: 0.3,
                    span: [0.0, 4800.0],
                    horizontal: false,
                }),
                ..visual(
                    "treeline",
                    [960.0, 500.0],
                    SizeBy::Band {
                        width: 4000.0,
                        height: 150.0,
                    },
                )
            },
            VisualSpec {
                trigger: Some(TriggerSpec {
                    id: "steam".to_string(),
                    span: [200.0, 700.0],
                    enter_frac: 0.8,
                    exit_frac: 0.2,
                    effect: EffectInstance {
                        kind: "drift".to_string(),
                        params: serde_json::Value::Null,
                    },
                }),
                ..visual("steam", [1600.0, 260.0], SizeBy::Width(60.0))
            },
        ],
        mid: vec![VisualSpec {
            pointer: Some(PointerLayerSpec {
                depth: 0.4,
                max_shift: 100.0,
            }),
            ..visual("store", [960.0, 585.0], SizeBy::Width(600.0))
        }],
        near: vec![VisualSpec {
            pointer: Some(PointerLayerSpec {
                depth: 1.0,
                max_shift: 100.0,
            }),
            ..visual("grass", [960.0, 870.0], SizeBy::Height(360.0))
        }],
    };

    let scene = |id: &str, path: &str, subs: &[&str], bands: Bands| SceneSpec {
        id: id.to_string(),
        path: path.to_string(),
        subsections: subs.iter().map(|s| s.to_string()).collect(),
        bands,
    };

    SiteSpec {
        design: DesignSpace::FULL_HD,
        assets,
        scenes: vec![
            scene("home", "/", &[], home_bands),
            scene(
                "about",
                "/about",
                &["story", "location", "team", "faq"],
                Bands::default(),
            ),
            scene("shop", "/shop", &[], Bands::default()),
            scene("gallery", "/gallery", &[], Bands::default()),
            scene("contact", "/contact", &[], Bands::default()),
            scene("blog", "/blog", &[], Bands::default()),
        ],
    }
}

fn mount(path: &str, hash: &str, motion: MotionPreference) -> Stage<MemoryHistory> {
    init_tracing();
    Stage::mount(
        &storefront(),
        MemoryHistory::new(path, hash),
        StageOpts {
            viewport: Viewport::new(1000.0, 800.0),
            motion,
            origin: "https://example.com".to_string(),
        },
    )
    .unwrap()
}

fn settle(stage: &mut Stage<MemoryHistory>) {
    for _ in 0..300 {
        stage.tick(16.0);
    }
}

#[test]
fn full_browsing_session_tracks_the_url() {
    let mut stage = mount("/", "", MotionPreference::Full);
    assert_eq!(stage.world_transform().y, 0.0);

    // Down to the shop, then on to the gallery mid-flight: the second
    // request supersedes the first.
    stage.click("/shop");
    stage.tick(200.0);
    stage.click("/gallery");
    settle(&mut stage);
    assert_eq!(stage.world_transform().y, -2400.0);
    assert_eq!(stage.current_scene(), "gallery");

    // Over to about and sideways through its sub-sections.
    stage.click("/about");
    settle(&mut stage);
    stage.click("/about#team");
    settle(&mut stage);
    let wt = stage.world_transform();
    assert_eq!((wt.x, wt.y), (-2000.0, -800.0));

    // Back button restores the previous sub-section.
    stage.history_mut().back();
    stage.popstate();
    settle(&mut stage);
    assert_eq!(stage.world_transform().x, 0.0);
}

#[test]
fn resize_mid_session_resnap_is_exact_and_silent() {
    let mut stage = mount("/shop", "", MotionPreference::Full);
    stage.resize(Viewport::new(1200.0, 900.0));
    let wt = stage.world_transform();
    assert_eq!(wt.y, -1800.0);
    assert_eq!(stage.nav_state(), NavState::Idle);

    let fit_scale = wt.scale;
    assert!(fit_scale * 1920.0 >= 1200.0);
    assert!(fit_scale * 1080.0 >= 900.0);

    stage.resize(Viewport::new(1200.0, 900.0));
    assert_eq!(stage.world_transform(), wt);
}

#[test]
fn steam_runs_only_while_its_region_is_on_screen() {
    let mut stage = mount("/", "", MotionPreference::Full);
    let steam = {
        // camera -> world -> home scene -> far band, fourth child.
        let camera = stage.graph().node(stage.graph().root()).children[0];
        let world = stage.graph().node(camera).children[0];
        let scene = stage.graph().node(world).children[0];
        let far = stage.graph().node(scene).children[0];
        stage.graph().node(far).children[3]
    };
    let neutral_y = stage.graph().node(steam).y;

    stage.scroll(0.0);
    stage.tick(700.0);
    assert_ne!(stage.graph().node(steam).y, neutral_y);

    // Scrolled far past: effect cancelled, steam back to neutral.
    stage.scroll(6000.0);
    assert_eq!(stage.graph().node(steam).y, neutral_y);
    assert_eq!(stage.graph().node(steam).opacity, 1.0);

    // Scrolling back up restarts it.
    stage.scroll(0.0);
    stage.tick(700.0);
    assert_ne!(stage.graph().node(steam).y, neutral_y);
}

#[test]
fn pointer_layers_track_latest_sample_by_depth() {
    let mut stage = mount("/", "", MotionPreference::Full);
    let (store, grass) = {
        let camera = stage.graph().node(stage.graph().root()).children[0];
        let world = stage.graph().node(camera).children[0];
        let scene = stage.graph().node(world).children[0];
        let mid = stage.graph().node(scene).children[1];
        let near = stage.graph().node(scene).children[2];
        (
            stage.graph().node(mid).children[0],
            stage.graph().node(near).children[0],
        )
    };

    stage.pointer_move(0.5, 0.0);
    stage.pointer_move(-0.5, 0.0);
    settle(&mut stage);
    // Deeper layers shift further; both track the latest sample only.
    assert_eq!(stage.graph().node(store).x, 960.0 + 0.5 * 0.4 * 100.0);
    assert_eq!(stage.graph().node(grass).x, 960.0 + 0.5 * 1.0 * 100.0);
}

#[test]
fn reduced_motion_session_reaches_identical_rest_states() {
    let mut full = mount("/", "", MotionPreference::Full);
    let mut reduced = mount("/", "", MotionPreference::Reduced);

    for stage in [&mut full, &mut reduced] {
        stage.click("/about");
        settle(stage);
        stage.click("/about#faq");
        settle(stage);
    }

    assert_eq!(full.world_transform(), reduced.world_transform());
    assert_eq!(reduced.world_transform().x, -3000.0);
}

#[test]
fn scene_without_visuals_is_still_navigable() {
    let mut stage = mount("/", "", MotionPreference::Full);
    stage.click("/blog");
    settle(&mut stage);
    assert_eq!(stage.current_scene(), "blog");
    assert_eq!(stage.world_transform().y, -5.0 * 800.0);
}
