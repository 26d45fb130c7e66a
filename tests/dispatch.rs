mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use guipp::event::handler::{Close, EventContext, EventSpec, Resized};
use guipp::{
    Color, Event, EventKind, EventMask, KeyState, MouseButton, NativePoint, Point, Rect, Size, WindowClass,
};

use common::{context, main_window, settle};

#[test]
fn handlers_run_in_registration_order() {
    let (mut ctx, _) = context();
    let (top, _) = main_window(&mut ctx, Rect::new(0.0, 0.0, 100.0, 100.0));
    let log = Rc::new(RefCell::new(Vec::new()));
    for name in ["h1", "h2"] {
        let log = Rc::clone(&log);
        ctx.on::<Resized>(top, move |_, _| log.borrow_mut().push(name)).unwrap();
    }

    ctx.resize(top, Size::new(120.0, 100.0));
    assert_eq!(*log.borrow(), ["h1", "h2"]);
}

#[test]
fn consuming_close_handler_short_circuits() {
    let (mut ctx, _) = context();
    let (top, _) = main_window(&mut ctx, Rect::new(0.0, 0.0, 100.0, 100.0));
    let first = Rc::new(Cell::new(0));
    let second = Rc::new(Cell::new(0));
    let counter = Rc::clone(&first);
    ctx.on::<Close>(top, move |_, ()| counter.set(counter.get() + 1)).unwrap();
    let counter = Rc::clone(&second);
    ctx.on::<Close>(top, move |_, ()| counter.set(counter.get() + 1)).unwrap();

    assert!(!ctx.close(top));
    assert_eq!((first.get(), second.get()), (1, 0));
    assert!(ctx.is_valid(top));
}

#[test]
fn unconsumed_close_destroys() {
    let (mut ctx, display) = context();
    let (top, _) = main_window(&mut ctx, Rect::new(0.0, 0.0, 100.0, 100.0));
    let notified = Rc::new(Cell::new(false));
    let flag = Rc::clone(&notified);
    ctx.on_destroy(top, move |_| flag.set(true)).unwrap();

    assert!(ctx.close(top));
    assert!(notified.get());
    assert!(!ctx.is_valid(top));
    assert_eq!(display.window_count(), 0);
}

#[test]
fn nested_dispatch_of_same_kind_is_rejected() {
    let (mut ctx, _) = context();
    let (top, _) = main_window(&mut ctx, Rect::new(0.0, 0.0, 100.0, 100.0));
    let calls = Rc::new(Cell::new(0));
    let nested = Rc::new(Cell::new(None));

    let counter = Rc::clone(&calls);
    let result = Rc::clone(&nested);
    ctx.on_size(top, move |ctx, size| {
        counter.set(counter.get() + 1);
        let again = Event::geometry(EventKind::Size, Rect::with_size(size));
        result.set(Some(ctx.handle_event(top, &again)));
        // geometry changes still apply, only the nested notification is dropped
        ctx.resize(top, Size::new(50.0, 50.0));
    })
    .unwrap();

    ctx.resize(top, Size::new(200.0, 200.0));
    assert_eq!(calls.get(), 1);
    assert_eq!(nested.get(), Some(false));
    assert_eq!(ctx.size(top), Size::new(50.0, 50.0));

    ctx.resize(top, Size::new(60.0, 60.0));
    assert_eq!(calls.get(), 2);
}

#[test]
fn nested_dispatch_of_other_kind_runs() {
    let (mut ctx, _) = context();
    let (top, _) = main_window(&mut ctx, Rect::new(0.0, 0.0, 100.0, 100.0));
    let moved = Rc::new(Cell::new(0));
    let counter = Rc::clone(&moved);
    ctx.on_move(top, move |_, _| counter.set(counter.get() + 1)).unwrap();
    ctx.on_size(top, move |ctx, _| ctx.move_to(top, Point::new(5.0, 5.0)))
        .unwrap();

    ctx.resize(top, Size::new(80.0, 80.0));
    assert_eq!(moved.get(), 1);
}

#[test]
fn wheel_delta_is_one_step_per_event() {
    let (mut ctx, display) = context();
    let (top, handle) = main_window(&mut ctx, Rect::new(0.0, 0.0, 100.0, 100.0));
    let steps = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&steps);
    ctx.on_wheel_y(top, move |_, step, at| log.borrow_mut().push((step, at)))
        .unwrap();

    display.push_to(
        handle,
        Event::wheel(NativePoint::new(10, 20), NativePoint::new(0, -360), KeyState::empty()),
    );
    display.push_to(
        handle,
        Event::wheel(NativePoint::new(10, 20), NativePoint::new(0, 120), KeyState::empty()),
    );
    display.push_to(
        handle,
        Event::wheel(NativePoint::new(10, 20), NativePoint::new(120, 0), KeyState::empty()),
    );
    settle(&mut ctx);

    assert_eq!(
        *steps.borrow(),
        [(-1, Point::new(10.0, 20.0)), (1, Point::new(10.0, 20.0))]
    );
}

#[test]
fn unhandled_wheel_bubbles_to_ancestors() {
    let (mut ctx, display) = context();
    let (top, handle) = main_window(&mut ctx, Rect::new(0.0, 0.0, 100.0, 100.0));
    let child = ctx
        .create_child(top, WindowClass::panel(), Rect::new(40.0, 40.0, 20.0, 20.0))
        .unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&seen);
    ctx.on_wheel_y(top, move |_, step, at| log.borrow_mut().push((step, at)))
        .unwrap();

    display.push_to(
        handle,
        Event::wheel(NativePoint::new(45, 45), NativePoint::new(0, -120), KeyState::empty()),
    );
    settle(&mut ctx);

    assert_eq!(ctx.window_at(top, Point::new(45.0, 45.0)), Some(child));
    assert_eq!(*seen.borrow(), [(-1, Point::new(45.0, 45.0))]);
}

#[test]
fn button_handlers_get_client_coordinates() {
    let (mut ctx, display) = context();
    let (top, handle) = main_window(&mut ctx, Rect::new(0.0, 0.0, 100.0, 100.0));
    let child = ctx
        .create_child(top, WindowClass::control(), Rect::new(10.0, 20.0, 50.0, 50.0))
        .unwrap();
    let presses = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&presses);
    ctx.on_any_button_down(child, move |_, button, state, at| {
        log.borrow_mut().push((button, state, at))
    })
    .unwrap();
    let left = Rc::new(Cell::new(0));
    let counter = Rc::clone(&left);
    ctx.on_left_btn_down(child, move |_, _, _| counter.set(counter.get() + 1))
        .unwrap();

    display.push_to(
        handle,
        Event::button_down(MouseButton::Right, NativePoint::new(15, 25), KeyState::SHIFT),
    );
    settle(&mut ctx);

    assert_eq!(
        *presses.borrow(),
        [(MouseButton::Right, KeyState::SHIFT | KeyState::BUTTON_RIGHT, Point::new(5.0, 5.0))]
    );
    assert_eq!(left.get(), 0);
}

#[test]
fn paint_draws_backgrounds_then_handlers() {
    let (mut ctx, display) = context();
    let (top, handle) = main_window(&mut ctx, Rect::new(0.0, 0.0, 100.0, 100.0));
    let red = WindowClass::panel().with_background(Color::from_rgba8(255, 0, 0, 255));
    let child = ctx
        .create_child(top, red, Rect::new(10.0, 10.0, 20.0, 20.0))
        .unwrap();
    let painted = Rc::new(Cell::new(0));
    let counter = Rc::clone(&painted);
    ctx.on_paint(child, move |_, graphics| {
        counter.set(counter.get() + 1);
        graphics.fill_rect(Rect::new(0.0, 0.0, 5.0, 5.0), Color::BLACK);
    })
    .unwrap();

    settle(&mut ctx);
    assert_eq!(painted.get(), 1);
    assert_eq!(display.presented().len(), 1);

    let frame = display.last_frame(handle).unwrap();
    let rgba = |x, y| {
        let c = frame.pixel(NativePoint::new(x, y)).unwrap();
        (c.red(), c.green(), c.blue(), c.alpha())
    };
    assert_eq!(rgba(50, 50), (255, 255, 255, 255));
    assert_eq!(rgba(20, 20), (255, 0, 0, 255));
    assert_eq!(rgba(12, 12), (0, 0, 0, 255));
}

#[test]
fn redraw_paints_without_waiting() {
    let (mut ctx, display) = context();
    let (top, _) = main_window(&mut ctx, Rect::new(0.0, 0.0, 100.0, 100.0));
    settle(&mut ctx);
    let painted = Rc::new(Cell::new(0));
    let counter = Rc::clone(&painted);
    ctx.on_paint(top, move |_, _| counter.set(counter.get() + 1)).unwrap();

    ctx.redraw(top);
    assert_eq!(painted.get(), 1);
    assert_eq!(display.presented().len(), 2);
}

/// Wheel notches made while Control is held
struct ZoomStep;

impl EventSpec for ZoomStep {
    type Args = i32;
    const MASK: EventMask = EventMask::of(EventKind::Wheel);

    fn extract(event: &Event, _: &EventContext) -> Option<i32> {
        event
            .key_state()
            .contains(KeyState::CONTROL)
            .then(|| event.wheel_delta_y())
    }
}

#[test]
fn wheel_declined_by_child_still_bubbles() {
    let (mut ctx, display) = context();
    let (top, handle) = main_window(&mut ctx, Rect::new(0.0, 0.0, 100.0, 100.0));
    let child = ctx
        .create_child(top, WindowClass::panel(), Rect::new(40.0, 40.0, 20.0, 20.0))
        .unwrap();
    let zoomed = Rc::new(Cell::new(0));
    let counter = Rc::clone(&zoomed);
    ctx.on::<ZoomStep>(child, move |_, step| counter.set(counter.get() + step))
        .unwrap();
    let scrolled = Rc::new(Cell::new(0));
    let counter = Rc::clone(&scrolled);
    ctx.on_wheel_y(top, move |_, step, _| counter.set(counter.get() + step))
        .unwrap();

    display.push_to(
        handle,
        Event::wheel(NativePoint::new(45, 45), NativePoint::new(0, 120), KeyState::empty()),
    );
    display.push_to(
        handle,
        Event::wheel(NativePoint::new(45, 45), NativePoint::new(0, 120), KeyState::CONTROL),
    );
    settle(&mut ctx);

    assert_eq!(zoomed.get(), 1);
    assert_eq!(scrolled.get(), 1);
}
