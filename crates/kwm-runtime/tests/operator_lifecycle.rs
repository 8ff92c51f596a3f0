#![forbid(unsafe_code)]

//! Operator lifecycle through the dispatch loop: modal handlers, cursor
//! grabs, macros, undo bookkeeping and window teardown.
//!
//! Run:
//!   cargo test -p kwm-runtime --test operator_lifecycle

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use kwm_core::event::{Event, EventType, KeyValue, Point, Rect};
use kwm_core::input::WindowId;
use kwm_core::keys::Key;
use kwm_runtime::cursor_grab::CursorGrab;
use kwm_runtime::{
    CallContext, Context, Handler, Host, KeyMap, KeyMapItem, OperatorResult, OperatorType,
    OperatorTypeFlags, RegionKind, Screen, UiAction, WindowManager,
};
use web_time::Instant;

// ============================================================================
// Test Infrastructure
// ============================================================================

/// Host that records every request as a short string.
#[derive(Clone, Default)]
struct RecordingHost {
    log: Rc<RefCell<Vec<String>>>,
}

impl RecordingHost {
    fn entries(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    fn count(&self, prefix: &str) -> usize {
        self.log.borrow().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

impl Host for RecordingHost {
    fn undo_push(&mut self, name: &str) {
        self.log.borrow_mut().push(format!("undo {name}"));
    }

    fn cursor_grab(&mut self, window: WindowId, _grab: &CursorGrab) {
        self.log.borrow_mut().push(format!("grab {window}"));
    }

    fn cursor_ungrab(&mut self, window: WindowId) {
        self.log.borrow_mut().push(format!("ungrab {window}"));
    }
}

/// One window with a header and a main region; the main region routes
/// through the "View3D" keymap.
fn setup() -> (WindowManager, WindowId, RecordingHost) {
    let host = RecordingHost::default();
    let mut wm = WindowManager::new().with_host(Box::new(host.clone()));
    let win = wm.add_window(Point::new(0, 0), 400, 300);

    let mut screen = Screen::new();
    let area = screen.add_area(Rect::new(0, 0, 399, 299));
    screen.add_region(area, RegionKind::Header, Rect::new(0, 280, 399, 299));
    let main = screen.add_region(area, RegionKind::Window, Rect::new(0, 0, 399, 279));
    let main = main.expect("area was just added");
    screen.region_mut(main).unwrap().add_handler(Handler::keymap("View3D"));
    wm.window_mut(win).unwrap().set_screen(screen);
    (wm, win, host)
}

fn push(wm: &mut WindowManager, win: WindowId, event: Event) {
    wm.window_mut(win).expect("window is open").input.queue.push_back(event);
}

fn bind(wm: &mut WindowManager, item: KeyMapItem) {
    wm.add_keymap(KeyMap::new("View3D").with_item(item));
}

fn modal_count(wm: &WindowManager, win: WindowId) -> usize {
    wm.window(win).expect("window is open").modal_handlers().len()
}

/// Modal operator finishing on left release, counting modal calls.
fn rotate_type(calls: &Rc<Cell<u32>>) -> OperatorType {
    let calls = Rc::clone(calls);
    OperatorType::new("VIEW3D_OT_rotate")
        .with_flags(OperatorTypeFlags::BLOCKING)
        .with_invoke(|_, _, _| OperatorResult::RUNNING_MODAL)
        .with_modal(move |_, _, event| {
            calls.set(calls.get() + 1);
            if event.kind == EventType::LeftMouse && event.value == KeyValue::Release {
                OperatorResult::FINISHED
            } else {
                OperatorResult::RUNNING_MODAL
            }
        })
}

// ============================================================================
// Modal operators
// ============================================================================

#[test]
fn blocking_modal_grabs_until_finished() {
    let (mut wm, win, host) = setup();
    let calls = Rc::new(Cell::new(0));
    wm.register_operator(rotate_type(&calls)).unwrap();
    bind(
        &mut wm,
        KeyMapItem::new("VIEW3D_OT_rotate", EventType::LeftMouse, KeyValue::Press),
    );

    push(&mut wm, win, Event::new(EventType::LeftMouse, KeyValue::Press).at(100, 100));
    wm.handle_events(Instant::now());
    assert_eq!(modal_count(&wm, win), 1);
    assert!(wm.window(win).is_some_and(|w| w.cursor_grab().is_some()));
    assert_eq!(host.entries(), vec![format!("grab {win}")]);

    push(&mut wm, win, Event::new(EventType::MouseMove, KeyValue::Nothing).at(120, 100));
    push(&mut wm, win, Event::new(EventType::LeftMouse, KeyValue::Release).at(120, 100));
    wm.handle_events(Instant::now());

    // Move, the synthesized click-drag, and the release.
    assert_eq!(calls.get(), 3);
    assert_eq!(modal_count(&wm, win), 0);
    assert!(wm.window(win).is_some_and(|w| w.cursor_grab().is_none()));
    assert_eq!(host.count("ungrab"), 1);
}

#[test]
fn modal_handler_sees_events_before_region_handlers() {
    let (mut wm, win, _host) = setup();
    let calls = Rc::new(Cell::new(0));
    wm.register_operator(rotate_type(&calls)).unwrap();
    bind(
        &mut wm,
        KeyMapItem::new("VIEW3D_OT_rotate", EventType::LeftMouse, KeyValue::Press),
    );
    let region_seen = Rc::new(Cell::new(0));
    let seen = Rc::clone(&region_seen);
    wm.window_mut(win).unwrap().add_handler(Handler::ui(move |_, _| {
        seen.set(seen.get() + 1);
        UiAction::Continue
    }));

    push(&mut wm, win, Event::new(EventType::LeftMouse, KeyValue::Press).at(10, 10));
    push(&mut wm, win, Event::new(EventType::Key(Key::Letter(b'X')), KeyValue::Release).at(10, 10));
    wm.handle_events(Instant::now());

    assert_eq!(calls.get(), 1);
    assert_eq!(region_seen.get(), 0);
}

#[test]
fn modal_running_with_pass_through_lets_event_continue() {
    let (mut wm, win, _host) = setup();
    wm.register_operator(
        OperatorType::new("VIEW3D_OT_fly")
            .with_invoke(|_, _, _| OperatorResult::RUNNING_MODAL)
            .with_modal(|_, _, _| OperatorResult::RUNNING_MODAL | OperatorResult::PASS_THROUGH),
    )
    .unwrap();
    bind(&mut wm, KeyMapItem::new("VIEW3D_OT_fly", EventType::Key(Key::F(1)), KeyValue::Press));

    push(&mut wm, win, Event::new(EventType::Key(Key::F(1)), KeyValue::Press).at(10, 10));
    push(&mut wm, win, Event::new(EventType::WheelUp, KeyValue::Press).at(10, 10));
    wm.handle_events(Instant::now());

    // Not consumed, yet the operator keeps running.
    assert_eq!(modal_count(&wm, win), 1);
}

#[test]
fn cancelled_modal_is_removed() {
    let (mut wm, win, _host) = setup();
    wm.register_operator(
        OperatorType::new("VIEW3D_OT_zoom_border")
            .with_invoke(|_, _, _| OperatorResult::RUNNING_MODAL)
            .with_modal(|_, _, event| {
                if event.kind == EventType::Key(Key::Esc) {
                    OperatorResult::CANCELLED
                } else {
                    OperatorResult::RUNNING_MODAL
                }
            }),
    )
    .unwrap();
    bind(
        &mut wm,
        KeyMapItem::new("VIEW3D_OT_zoom_border", EventType::Key(Key::Letter(b'B')), KeyValue::Press)
            .shift(kwm_runtime::ModMatch::On),
    );

    push(
        &mut wm,
        win,
        Event::new(EventType::Key(Key::Letter(b'B')), KeyValue::Press).at(5, 5).with_shift(),
    );
    wm.handle_events(Instant::now());
    assert_eq!(modal_count(&wm, win), 1);

    push(&mut wm, win, Event::new(EventType::Key(Key::Esc), KeyValue::Press).at(5, 5));
    wm.handle_events(Instant::now());
    assert_eq!(modal_count(&wm, win), 0);
}

#[test]
fn starting_modal_sends_ui_cancel_to_region_handlers() {
    let (mut wm, win, _host) = setup();
    let calls = Rc::new(Cell::new(0));
    wm.register_operator(rotate_type(&calls)).unwrap();
    bind(
        &mut wm,
        KeyMapItem::new("VIEW3D_OT_rotate", EventType::LeftMouse, KeyValue::Press),
    );
    let cancels = Rc::new(Cell::new(0));
    let c = Rc::clone(&cancels);
    let screen = wm.window_mut(win).unwrap().screen.as_mut().unwrap();
    let main = screen.areas()[0].region_of_kind(RegionKind::Window).unwrap().id();
    screen.region_mut(main).unwrap().add_handler(Handler::ui(move |_, event| {
        if event.kind == EventType::UiCancel {
            c.set(c.get() + 1);
        }
        UiAction::Continue
    }));

    push(&mut wm, win, Event::new(EventType::LeftMouse, KeyValue::Press).at(40, 40));
    wm.handle_events(Instant::now());
    assert_eq!(cancels.get(), 1);
}

// ============================================================================
// Window teardown
// ============================================================================

#[test]
fn closing_window_from_a_handler_cancels_its_modal_operators() {
    let (mut wm, win, host) = setup();
    let cancelled = Rc::new(Cell::new(0));
    let c = Rc::clone(&cancelled);
    wm.register_operator(
        OperatorType::new("VIEW3D_OT_walk")
            .with_flags(OperatorTypeFlags::BLOCKING)
            .with_invoke(|_, _, _| OperatorResult::RUNNING_MODAL)
            .with_modal(|_, _, _| OperatorResult::PASS_THROUGH)
            .with_cancel(move |_, _| c.set(c.get() + 1)),
    )
    .unwrap();
    bind(&mut wm, KeyMapItem::new("VIEW3D_OT_walk", EventType::LeftMouse, KeyValue::Press));

    let wheel_seen = Rc::new(Cell::new(0));
    let wheel = Rc::clone(&wheel_seen);
    wm.window_mut(win).unwrap().add_handler(Handler::ui(move |ctx, event| match event.kind {
        EventType::Key(Key::Letter(b'Q')) => {
            let window = ctx.window().expect("handler runs inside a window");
            ctx.close_window(window);
            UiAction::Break
        }
        EventType::WheelDown => {
            wheel.set(wheel.get() + 1);
            UiAction::Continue
        }
        _ => UiAction::Continue,
    }));

    push(&mut wm, win, Event::new(EventType::LeftMouse, KeyValue::Press).at(10, 10));
    wm.handle_events(Instant::now());
    assert_eq!(modal_count(&wm, win), 1);

    push(&mut wm, win, Event::new(EventType::Key(Key::Letter(b'Q')), KeyValue::Press).at(10, 10));
    push(&mut wm, win, Event::new(EventType::WheelDown, KeyValue::Press).at(10, 10));
    wm.handle_events(Instant::now());

    assert!(wm.window(win).is_none());
    assert_eq!(cancelled.get(), 1);
    assert_eq!(host.count("ungrab"), 1);
    assert_eq!(wheel_seen.get(), 0);
}

#[test]
fn modal_callback_closing_its_own_window_is_cancelled() {
    let (mut wm, win, _host) = setup();
    let cancelled = Rc::new(Cell::new(0));
    let c = Rc::clone(&cancelled);
    wm.register_operator(
        OperatorType::new("WM_OT_close_on_key")
            .with_invoke(|_, _, _| OperatorResult::RUNNING_MODAL)
            .with_modal(|ctx, _, _| {
                let window = ctx.window().expect("modal runs inside a window");
                ctx.close_window(window);
                OperatorResult::RUNNING_MODAL
            })
            .with_cancel(move |_, _| c.set(c.get() + 1)),
    )
    .unwrap();
    bind(&mut wm, KeyMapItem::new("WM_OT_close_on_key", EventType::LeftMouse, KeyValue::Press));

    push(&mut wm, win, Event::new(EventType::LeftMouse, KeyValue::Press).at(10, 10));
    push(&mut wm, win, Event::new(EventType::Key(Key::Space), KeyValue::Press).at(10, 10));
    wm.handle_events(Instant::now());

    assert!(wm.window(win).is_none());
    assert_eq!(cancelled.get(), 1);
}

#[test]
fn close_window_runs_ui_remove_callbacks() {
    let (mut wm, win, _host) = setup();
    let removed = Rc::new(Cell::new(false));
    let r = Rc::clone(&removed);
    let mut handler = Handler::ui(|_, _| UiAction::Continue);
    let Handler::Ui(ui) = &mut handler else {
        unreachable!("Handler::ui builds a ui handler");
    };
    ui.remove = Some(Rc::new(move |_| r.set(true)));
    wm.window_mut(win).unwrap().add_handler(handler);
    assert!(wm.close_window(win, Instant::now()));
    assert!(removed.get());
    assert!(!wm.close_window(win, Instant::now()));
}

// ============================================================================
// Macros
// ============================================================================

#[test]
fn macro_continues_after_modal_step_and_pushes_one_undo() {
    let (mut wm, win, host) = setup();
    let extrude = Rc::new(Cell::new(0));
    let merge = Rc::new(Cell::new(0));
    let (e, m) = (Rc::clone(&extrude), Rc::clone(&merge));

    wm.register_operator(
        OperatorType::new("MESH_OT_extrude")
            .with_flags(OperatorTypeFlags::UNDO)
            .with_exec(move |_, _| {
                e.set(e.get() + 1);
                OperatorResult::FINISHED
            }),
    )
    .unwrap();
    wm.register_operator(
        OperatorType::new("TRANSFORM_OT_translate")
            .with_flags(OperatorTypeFlags::UNDO)
            .with_invoke(|_, _, _| OperatorResult::RUNNING_MODAL)
            .with_modal(|_, _, event| {
                if event.value == KeyValue::Release {
                    OperatorResult::FINISHED
                } else {
                    OperatorResult::RUNNING_MODAL
                }
            }),
    )
    .unwrap();
    wm.register_operator(
        OperatorType::new("MESH_OT_merge").with_exec(move |_, _| {
            m.set(m.get() + 1);
            OperatorResult::FINISHED
        }),
    )
    .unwrap();
    wm.register_operator(
        OperatorType::new_macro("MESH_OT_extrude_move")
            .with_name("Extrude and Move")
            .with_flags(OperatorTypeFlags::UNDO | OperatorTypeFlags::REGISTER)
            .with_step("MESH_OT_extrude")
            .with_step("TRANSFORM_OT_translate")
            .with_step("MESH_OT_merge"),
    )
    .unwrap();
    bind(
        &mut wm,
        KeyMapItem::new("MESH_OT_extrude_move", EventType::Key(Key::Letter(b'E')), KeyValue::Press),
    );

    push(&mut wm, win, Event::new(EventType::Key(Key::Letter(b'E')), KeyValue::Press).at(50, 50));
    wm.handle_events(Instant::now());
    assert_eq!(extrude.get(), 1);
    assert_eq!(merge.get(), 0);
    assert_eq!(modal_count(&wm, win), 1);

    push(&mut wm, win, Event::new(EventType::LeftMouse, KeyValue::Release).at(60, 50));
    wm.handle_events(Instant::now());
    assert_eq!(merge.get(), 1);
    assert_eq!(modal_count(&wm, win), 0);
    assert_eq!(host.entries().iter().filter(|e| e.starts_with("undo")).count(), 1);
    assert_eq!(host.entries().last().map(String::as_str), Some("undo Extrude and Move"));
    assert_eq!(
        wm.history().map(|r| r.idname.as_str()).collect::<Vec<_>>(),
        vec!["MESH_OT_extrude_move"]
    );
}

#[test]
fn macro_step_poll_failure_blocks_the_macro() {
    let (mut wm, _win, _host) = setup();
    wm.register_operator(
        OperatorType::new("OBJECT_OT_never")
            .with_poll(|_| false)
            .with_exec(|_, _| OperatorResult::FINISHED),
    )
    .unwrap();
    wm.register_operator(OperatorType::new_macro("OBJECT_OT_wrap").with_step("OBJECT_OT_never"))
        .unwrap();
    let mut ctx = Context::new(&mut wm, Instant::now());
    assert_eq!(
        ctx.call_operator("OBJECT_OT_wrap", CallContext::ExecDefault, None),
        OperatorResult::PASS_THROUGH
    );
    assert_eq!(wm.operators().instances_created(), 0);
}

// ============================================================================
// Undo and poll
// ============================================================================

#[test]
fn poll_failure_creates_no_instance() {
    let mut wm = WindowManager::new();
    let ran = Rc::new(Cell::new(false));
    let r = Rc::clone(&ran);
    wm.register_operator(
        OperatorType::new("SCREEN_OT_blocked")
            .with_poll(|ctx| ctx.window().is_some())
            .with_exec(move |_, _| {
                r.set(true);
                OperatorResult::FINISHED
            }),
    )
    .unwrap();
    let mut ctx = Context::new(&mut wm, Instant::now());
    let result = ctx.call_operator("SCREEN_OT_blocked", CallContext::ExecDefault, None);
    assert_eq!(result, OperatorResult::PASS_THROUGH);
    assert!(!ran.get());
    assert_eq!(wm.operators().instances_created(), 0);
}

#[test]
fn nested_undo_operators_push_once() {
    let host = RecordingHost::default();
    let mut wm = WindowManager::new().with_host(Box::new(host.clone()));
    let inner_depth = Rc::new(Cell::new(0));
    let d = Rc::clone(&inner_depth);
    wm.register_operator(
        OperatorType::new("OBJECT_OT_inner")
            .with_name("Inner")
            .with_flags(OperatorTypeFlags::UNDO)
            .with_exec(move |ctx, _| {
                d.set(ctx.wm().undo_depth());
                OperatorResult::FINISHED
            }),
    )
    .unwrap();
    wm.register_operator(
        OperatorType::new("OBJECT_OT_outer")
            .with_name("Outer")
            .with_flags(OperatorTypeFlags::UNDO)
            .with_exec(|ctx, _| ctx.call_operator("OBJECT_OT_inner", CallContext::ExecDefault, None)),
    )
    .unwrap();

    let mut ctx = Context::new(&mut wm, Instant::now());
    let result = ctx.call_operator("OBJECT_OT_outer", CallContext::ExecDefault, None);
    assert_eq!(result, OperatorResult::FINISHED);
    assert_eq!(inner_depth.get(), 2);
    assert_eq!(host.entries(), vec!["undo Outer".to_string()]);
    assert_eq!(wm.undo_depth(), 0);
}

#[test]
fn session_replaced_inside_an_operator_resets_undo_depth() {
    let mut wm = WindowManager::new();
    let win = wm.add_window(Point::new(0, 0), 100, 100);
    wm.register_operator(
        OperatorType::new("WM_OT_open_mainfile")
            .with_flags(OperatorTypeFlags::UNDO)
            .with_exec(|ctx, _| {
                let now = ctx.now();
                ctx.wm_mut().replace_session(now);
                OperatorResult::FINISHED
            }),
    )
    .unwrap();
    let mut ctx = Context::new(&mut wm, Instant::now());
    ctx.call_operator("WM_OT_open_mainfile", CallContext::ExecDefault, None);

    assert_eq!(wm.undo_depth(), 0);
    assert_eq!(wm.generation(), 1);
    assert!(wm.window(win).is_none());
    assert!(wm.notifiers().contains(
        kwm_runtime::notifier::NC_WM | kwm_runtime::notifier::ND_FILEREAD,
        None
    ));
}

#[test]
fn history_is_capped() {
    let mut prefs = kwm_runtime::Preferences::default();
    prefs.dispatch.max_registered_operators = 2;
    let mut wm = WindowManager::with_prefs(prefs);
    wm.register_operator(
        OperatorType::new("ED_OT_step")
            .with_flags(OperatorTypeFlags::REGISTER)
            .with_property("n", 0_i64)
            .with_exec(|_, _| OperatorResult::FINISHED),
    )
    .unwrap();
    let mut ctx = Context::new(&mut wm, Instant::now());
    for n in 0..3_i64 {
        let props = kwm_runtime::Properties::new().with("n", n);
        ctx.call_operator("ED_OT_step", CallContext::ExecDefault, Some(&props));
    }
    let kept: Vec<_> = wm.history().filter_map(|r| r.properties.get_int("n")).collect();
    assert_eq!(kept, vec![1, 2]);
}
