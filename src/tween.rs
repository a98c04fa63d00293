use crate::{
    ease::Ease,
    graph::{NodeId, SceneGraph},
};

/// Animatable property slots on a display node. `Scale` writes both axes
/// uniformly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Prop {
    X,
    Y,
    Scale,
    Opacity,
}

/// Handle to an in-flight tween. Stable for the life of the runtime; stale
/// handles are simply inert.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TweenId(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Repeat {
    /// Run once to completion.
    None,
    /// Restart from the beginning each period. Never completes on its own.
    Loop,
    /// Alternate forward/backward each period. Never completes on its own.
    Yoyo,
}

#[derive(Clone, Copy, Debug)]
pub struct Timing {
    pub duration_ms: f64,
    pub delay_ms: f64,
    pub ease: Ease,
    pub repeat: Repeat,
}

impl Timing {
    pub fn new(duration_ms: f64, ease: Ease) -> Self {
        Self {
            duration_ms: duration_ms.max(0.0),
            delay_ms: 0.0,
            ease,
            repeat: Repeat::None,
        }
    }

    pub fn with_delay(mut self, delay_ms: f64) -> Self {
        self.delay_ms = delay_ms.max(0.0);
        self
    }

    pub fn with_repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }
}

/// Target values for one `animate`/`set_immediate` call. Unset slots are
/// left untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PropertySet {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub scale: Option<f64>,
    pub opacity: Option<f64>,
}

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn x(mut self, v: f64) -> Self {
        self.x = Some(v);
        self
    }

    pub fn y(mut self, v: f64) -> Self {
        self.y = Some(v);
        self
    }

    pub fn scale(mut self, v: f64) -> Self {
        self.scale = Some(v);
        self
    }

    pub fn opacity(mut self, v: f64) -> Self {
        self.opacity = Some(v);
        self
    }

    fn entries(self) -> impl Iterator<Item = (Prop, f64)> {
        [
            self.x.map(|v| (Prop::X, v)),
            self.y.map(|v| (Prop::Y, v)),
            self.scale.map(|v| (Prop::Scale, v)),
            self.opacity.map(|v| (Prop::Opacity, v)),
        ]
        .into_iter()
        .flatten()
    }
}

#[derive(Clone, Copy, Debug)]
struct Channel {
    prop: Prop,
    from: f64,
    to: f64,
}

#[derive(Clone, Debug)]
struct Tween {
    id: TweenId,
    node: NodeId,
    channels: Vec<Channel>,
    timing: Timing,
    elapsed_ms: f64,
    alive: bool,
}

/// Cooperative tween runtime stepped once per render frame.
///
/// One tween owns a set of property channels on one node. Starting a tween
/// (or an immediate write) on a property that already has a live tween kills
/// the old tween first — last writer wins, nothing queues. Cancellation is
/// synchronous and leaves the current interpolated values in place.
#[derive(Debug, Default)]
pub struct TweenRuntime {
    tweens: Vec<Tween>,
    next_id: u64,
}

impl TweenRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Animate `node` toward the set values. Start values are captured from
    /// the graph now, so a superseding call mid-flight continues from the
    /// current on-screen state.
    pub fn animate(
        &mut self,
        graph: &SceneGraph,
        node: NodeId,
        props: PropertySet,
        timing: Timing,
    ) -> TweenId {
        self.kill_conflicting(node, props);
        let channels = props
            .entries()
            .map(|(prop, to)| Channel {
                prop,
                from: read_prop(graph, node, prop),
                to,
            })
            .collect();
        let id = TweenId(self.next_id);
        self.next_id += 1;
        self.tweens.push(Tween {
            id,
            node,
            channels,
            timing,
            elapsed_ms: 0.0,
            alive: true,
        });
        id
    }

    /// Apply values with no animation. Kills live tweens on the written
    /// properties first so nothing fights the write on later frames.
    pub fn set_immediate(&mut self, graph: &mut SceneGraph, node: NodeId, props: PropertySet) {
        self.kill_conflicting(node, props);
        for (prop, value) in props.entries() {
            write_prop(graph, node, prop, value);
        }
    }

    /// Stop a tween immediately. Its property values stay wherever the last
    /// step left them, and it will never be reported as completed.
    pub fn cancel(&mut self, id: TweenId) {
        if let Some(tw) = self.tweens.iter_mut().find(|t| t.id == id) {
            tw.alive = false;
        }
    }

    /// Kill every live tween touching `node`.
    pub fn kill_tweens_of(&mut self, node: NodeId) {
        for tw in self.tweens.iter_mut().filter(|t| t.node == node) {
            tw.alive = false;
        }
    }

    pub fn is_active(&self, id: TweenId) -> bool {
        self.tweens.iter().any(|t| t.id == id && t.alive)
    }

    pub fn active_count(&self) -> usize {
        self.tweens.iter().filter(|t| t.alive).count()
    }

    /// Step all live tweens by `dt_ms` and write the interpolated values.
    /// Returns the tweens that ran to completion this step; cancelled tweens
    /// never appear here.
    pub fn advance(&mut self, graph: &mut SceneGraph, dt_ms: f64) -> Vec<TweenId> {
        let mut completed = Vec::new();
        for tw in &mut self.tweens {
            if !tw.alive {
                continue;
            }
            tw.elapsed_ms += dt_ms.max(0.0);
            let local = tw.elapsed_ms - tw.timing.delay_ms;
            if local < 0.0 {
                continue;
            }

            let (t, done) = progress(local, &tw.timing);
            let eased = tw.timing.ease.apply(t);
            for ch in &tw.channels {
                write_prop(graph, tw.node, ch.prop, ch.from + (ch.to - ch.from) * eased);
            }
            if done {
                tw.alive = false;
                completed.push(tw.id);
            }
        }
        self.tweens.retain(|t| t.alive);
        completed
    }

    fn kill_conflicting(&mut self, node: NodeId, props: PropertySet) {
        let incoming: Vec<Prop> = props.entries().map(|(p, _)| p).collect();
        for tw in self.tweens.iter_mut().filter(|t| t.alive && t.node == node) {
            if tw.channels.iter().any(|c| incoming.contains(&c.prop)) {
                tw.alive = false;
            }
        }
    }
}

fn progress(local_ms: f64, timing: &Timing) -> (f64, bool) {
    let dur = timing.duration_ms;
    if dur <= 0.0 {
        return (1.0, timing.repeat == Repeat::None);
    }
    match timing.repeat {
        Repeat::None => {
            let t = (local_ms / dur).min(1.0);
            (t, local_ms >= dur)
        }
        Repeat::Loop => ((local_ms / dur).fract(), false),
        Repeat::Yoyo => {
            let phase = (local_ms / dur) % 2.0;
            let t = if phase <= 1.0 { phase } else { 2.0 - phase };
            (t, false)
        }
    }
}

fn read_prop(graph: &SceneGraph, node: NodeId, prop: Prop) -> f64 {
    let n = graph.node(node);
    match prop {
        Prop::X => n.x,
        Prop::Y => n.y,
        Prop::Scale => n.scale_x,
        Prop::Opacity => n.opacity,
    }
}

fn write_prop(graph: &mut SceneGraph, node: NodeId, prop: Prop, value: f64) {
    match prop {
        Prop::X => graph.node_mut(node).x = value,
        Prop::Y => graph.node_mut(node).y = value,
        Prop::Scale => graph.set_uniform_scale(node, value),
        Prop::Opacity => graph.set_opacity(node, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (SceneGraph, NodeId, TweenRuntime) {
        let mut g = SceneGraph::new();
        let root = g.root();
        let n = g.add_container(root);
        (g, n, TweenRuntime::new())
    }

    #[test]
    fn linear_tween_reaches_target() {
        let (mut g, n, mut rt) = setup();
        let id = rt.animate(&g, n, PropertySet::new().x(100.0), Timing::new(100.0, Ease::Linear));
        rt.advance(&mut g, 50.0);
        assert_eq!(g.node(n).x, 50.0);
        let done = rt.advance(&mut g, 50.0);
        assert_eq!(g.node(n).x, 100.0);
        assert_eq!(done, vec![id]);
        assert!(!rt.is_active(id));
    }

    #[test]
    fn new_tween_supersedes_old_on_same_property() {
        let (mut g, n, mut rt) = setup();
        let a = rt.animate(&g, n, PropertySet::new().x(100.0), Timing::new(100.0, Ease::Linear));
        rt.advance(&mut g, 50.0);
        let b = rt.animate(&g, n, PropertySet::new().x(0.0), Timing::new(100.0, Ease::Linear));
        assert!(!rt.is_active(a));
        let done = rt.advance(&mut g, 100.0);
        assert_eq!(g.node(n).x, 0.0);
        // The superseded tween never reports completion.
        assert_eq!(done, vec![b]);
    }

    #[test]
    fn superseding_starts_from_current_value() {
        let (mut g, n, mut rt) = setup();
        rt.animate(&g, n, PropertySet::new().x(100.0), Timing::new(100.0, Ease::Linear));
        rt.advance(&mut g, 50.0);
        rt.animate(&g, n, PropertySet::new().x(200.0), Timing::new(100.0, Ease::Linear));
        rt.advance(&mut g, 50.0);
        assert_eq!(g.node(n).x, 125.0);
    }

    #[test]
    fn cancel_leaves_values_in_place() {
        let (mut g, n, mut rt) = setup();
        let id = rt.animate(&g, n, PropertySet::new().x(100.0), Timing::new(100.0, Ease::Linear));
        rt.advance(&mut g, 30.0);
        rt.cancel(id);
        let done = rt.advance(&mut g, 1000.0);
        assert!(done.is_empty());
        assert_eq!(g.node(n).x, 30.0);
    }

    #[test]
    fn set_immediate_kills_live_tweens() {
        let (mut g, n, mut rt) = setup();
        rt.animate(&g, n, PropertySet::new().x(100.0), Timing::new(100.0, Ease::Linear));
        rt.set_immediate(&mut g, n, PropertySet::new().x(7.0));
        assert_eq!(g.node(n).x, 7.0);
        rt.advance(&mut g, 1000.0);
        assert_eq!(g.node(n).x, 7.0);
        assert_eq!(rt.active_count(), 0);
    }

    #[test]
    fn delay_defers_first_write() {
        let (mut g, n, mut rt) = setup();
        rt.animate(
            &g,
            n,
            PropertySet::new().x(100.0),
            Timing::new(100.0, Ease::Linear).with_delay(50.0),
        );
        rt.advance(&mut g, 40.0);
        assert_eq!(g.node(n).x, 0.0);
        rt.advance(&mut g, 60.0);
        assert_eq!(g.node(n).x, 50.0);
    }

    #[test]
    fn looping_tween_never_completes() {
        let (mut g, n, mut rt) = setup();
        let id = rt.animate(
            &g,
            n,
            PropertySet::new().opacity(0.0),
            Timing::new(100.0, Ease::Linear).with_repeat(Repeat::Loop),
        );
        for _ in 0..20 {
            assert!(rt.advance(&mut g, 37.0).is_empty());
        }
        assert!(rt.is_active(id));
    }

    #[test]
    fn yoyo_reverses_each_period() {
        let (mut g, n, mut rt) = setup();
        rt.animate(
            &g,
            n,
            PropertySet::new().x(10.0),
            Timing::new(100.0, Ease::Linear).with_repeat(Repeat::Yoyo),
        );
        rt.advance(&mut g, 150.0);
        assert_eq!(g.node(n).x, 5.0);
    }

    #[test]
    fn zero_duration_completes_immediately() {
        let (mut g, n, mut rt) = setup();
        let id = rt.animate(&g, n, PropertySet::new().x(9.0), Timing::new(0.0, Ease::Linear));
        let done = rt.advance(&mut g, 0.0);
        assert_eq!(done, vec![id]);
        assert_eq!(g.node(n).x, 9.0);
    }

    #[test]
    fn kill_tweens_of_clears_all_node_tweens() {
        let (mut g, n, mut rt) = setup();
        rt.animate(&g, n, PropertySet::new().x(1.0), Timing::new(100.0, Ease::Linear));
        rt.animate(&g, n, PropertySet::new().opacity(0.5), Timing::new(100.0, Ease::Linear));
        rt.kill_tweens_of(n);
        assert_eq!(rt.active_count(), 0);
    }
}
