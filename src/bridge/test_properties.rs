//! Property-based tests for timeline reducer invariants.
//!
//! Drives arbitrary message sequences through `update`, executing the
//! returned commands against a recording surface the way a host would, and
//! checks that selection, hover, and the published position table stay
//! consistent with the viewport.

use std::time::Duration;

use chrono::NaiveDate;
use proptest::prelude::*;

use super::input::{Key, KeyInput};
use super::model::{TimelineCmd, TimelineModel, TimelineMsg};
use super::update::{paint_detail, paint_full, update};
use crate::timeline::event::{Event, EventCatalog};
use crate::timeline::layout::layout_frame;
use crate::timeline::render::Theme;
use crate::timeline::scale::Coord;
use crate::timeline::surface::{RecordingSurface, Surface as _};

// ──────────────────── strategies ────────────────────

fn arb_catalog() -> impl Strategy<Value = EventCatalog> {
    prop::collection::vec((0i64..9_000, "[A-Za-z ]{1,24}"), 0..12).prop_map(|specs| {
        let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        EventCatalog::from_events(
            specs
                .into_iter()
                .enumerate()
                .map(|(n, (days, title))| {
                    Event::on(format!("e{n}"), title, start + chrono::Duration::days(days))
                })
                .collect(),
        )
    })
}

fn arb_key() -> impl Strategy<Value = Key> {
    prop_oneof![
        Just(Key::ArrowUp),
        Just(Key::ArrowDown),
        Just(Key::ArrowLeft),
        Just(Key::ArrowRight),
        Just(Key::PageUp),
        Just(Key::PageDown),
        Just(Key::Home),
        Just(Key::End),
        Just(Key::Enter),
        Just(Key::Char('c')),
        Just(Key::Char('x')),
    ]
}

#[derive(Debug, Clone)]
enum Step {
    Msg(TimelineMsg),
    /// Fire whatever hover timer the host has armed.
    FireTimer,
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => arb_key().prop_map(|key| Step::Msg(TimelineMsg::Key(KeyInput::plain(key)))),
        3 => (0i64..1_000, 0i64..200).prop_map(|(x, y)| Step::Msg(TimelineMsg::PointerMove {
            x: Coord::from_px(x),
            y: Coord::from_px(y),
        })),
        1 => Just(Step::Msg(TimelineMsg::PointerLeave)),
        1 => (200i64..1_600).prop_map(|w| Step::Msg(TimelineMsg::Resize {
            width: Coord::from_px(w),
        })),
        2 => Just(Step::FireTimer),
    ]
}

// ──────────────────── harness ────────────────────

struct Host {
    model: TimelineModel,
    surface: RecordingSurface,
    armed: Option<u64>,
    theme: Theme,
}

impl Host {
    fn new(catalog: EventCatalog) -> Self {
        let mut host = Self {
            model: TimelineModel::new(catalog, Coord::from_px(800)),
            surface: RecordingSurface::new(800.0, 200.0),
            armed: None,
            theme: Theme::default(),
        };
        paint_full(&mut host.model, Some(&mut host.surface), &host.theme);
        host
    }

    fn step(&mut self, step: Step) {
        let cmd = match step {
            Step::Msg(msg) => {
                if let TimelineMsg::Resize { width } = msg {
                    self.surface.resize(width.to_px(), 200.0);
                }
                update(&mut self.model, msg)
            }
            Step::FireTimer => match self.armed.take() {
                Some(token) => update(&mut self.model, TimelineMsg::HoverTimerFired(token)),
                None => TimelineCmd::None,
            },
        };
        self.execute(cmd);
    }

    fn execute(&mut self, cmd: TimelineCmd) {
        for cmd in cmd.flatten() {
            match cmd {
                TimelineCmd::RenderFull => {
                    paint_full(&mut self.model, Some(&mut self.surface), &self.theme);
                }
                TimelineCmd::RenderDetail { index } => {
                    paint_detail(&self.model, Some(&mut self.surface), &self.theme, index);
                }
                TimelineCmd::ScheduleHover { token, after } => {
                    assert_eq!(after, Duration::from_millis(100));
                    self.armed = Some(token);
                }
                TimelineCmd::CancelHover => self.armed = None,
                TimelineCmd::None | TimelineCmd::Quit | TimelineCmd::Batch(_) => {}
            }
        }
    }
}

fn assert_invariants(model: &TimelineModel) {
    let state = model.state();
    if let Some(index) = state.selected_index {
        assert!(index < model.catalog.len(), "selection {index} out of range");
    }

    let fresh = layout_frame(
        &model.catalog,
        state,
        model.viewport.canvas_width(),
        &model.layout,
    );
    assert_eq!(
        fresh.positions, model.positions,
        "published position table drifted from the viewport"
    );

    if model.hover.detail_shown() {
        assert!(
            model.hover.hovered_event_id().is_some(),
            "detail overlay without a hovered target"
        );
    }

    if model.hover.pending().is_some() {
        assert!(
            model.hover.hovered_event_id().is_some(),
            "pending hover without a target"
        );
    }
}

// ──────────────────── property tests ────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Any sequence of messages keeps selection in range and the position
    /// table in sync with the last full render.
    #[test]
    fn reducer_preserves_invariants(
        catalog in arb_catalog(),
        steps in prop::collection::vec(arb_step(), 1..60)
    ) {
        let mut host = Host::new(catalog);
        for step in steps {
            host.step(step);
            assert_invariants(&host.model);
        }
    }

    /// Selecting any event puts it exactly at the canvas midpoint.
    #[test]
    fn selection_recenters(
        catalog in arb_catalog(),
        pick in any::<prop::sample::Index>(),
        width in 100i64..2_000
    ) {
        prop_assume!(!catalog.is_empty());
        let index = pick.index(catalog.len());
        let mut model = TimelineModel::new(catalog, Coord::from_px(width));
        let _ = model.viewport.select_by_index(index, &model.catalog);
        let state = model.state();
        let vx = model.catalog.virtual_x(index, state.zoom).unwrap();
        prop_assert_eq!(state.screen_x(vx), Coord::from_px(width).half());
    }

    /// Navigation never leaves the catalog bounds.
    #[test]
    fn navigation_stays_in_bounds(
        catalog in arb_catalog(),
        keys in prop::collection::vec(
            prop_oneof![Just(Key::ArrowLeft), Just(Key::ArrowRight), Just(Key::Home), Just(Key::End)],
            1..40
        )
    ) {
        let len = catalog.len();
        let mut model = TimelineModel::new(catalog, Coord::from_px(800));
        for key in keys {
            let _ = update(&mut model, TimelineMsg::Key(KeyInput::plain(key)));
            match model.state().selected_index {
                Some(index) => prop_assert!(index < len),
                None => prop_assert_eq!(len, 0),
            }
        }
    }

    /// The quit flag only transitions from false to true.
    #[test]
    fn quit_is_monotonic(
        keys in prop::collection::vec(
            prop_oneof![Just(Key::Char('q')), Just(Key::ArrowUp), Just(Key::PageDown)],
            1..20
        )
    ) {
        let mut model = TimelineModel::new(EventCatalog::default(), Coord::from_px(800));
        let mut ever_quit = false;
        for key in keys {
            let _ = update(&mut model, TimelineMsg::Key(KeyInput::plain(key)));
            ever_quit |= model.should_quit;
            prop_assert_eq!(model.should_quit, ever_quit);
        }
    }
}
