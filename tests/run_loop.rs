mod common;

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use guipp::{
    Event, EventKind, HotKey, HotKeyError, KeyState, MouseButton, NativeEvent, NativePoint, Rect,
    WindowClass, WindowState, keys,
};
use guipp::event::EventData;

use common::{context, main_window, settle};

fn user(code: u32) -> Event {
    Event::new(EventKind::User, EventData::User(code))
}

#[test]
fn run_on_main_from_another_thread() {
    let (mut ctx, _) = context();
    let handle = ctx.main_thread_handle();
    let ran = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ran);

    let worker = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        handle.run_on_main(move |ctx| {
            counter.fetch_add(1, Ordering::SeqCst);
            ctx.quit_main_loop();
        })
    });

    ctx.run_main_loop();
    assert!(worker.join().unwrap());
    assert_eq!(ran.load(Ordering::SeqCst), 1);
    assert!(!ctx.is_running());
}

#[test]
fn quit_from_another_thread() {
    let (mut ctx, _) = context();
    let handle = ctx.main_thread_handle();
    let worker = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        handle.quit();
    });

    ctx.run_main_loop();
    worker.join().unwrap();
    assert!(!ctx.is_running());
}

#[test]
fn unconsumed_close_stops_the_loop() {
    let (mut ctx, display) = context();
    let (top, handle) = main_window(&mut ctx, Rect::new(0.0, 0.0, 100.0, 100.0));
    display.push_to(handle, Event::simple(EventKind::Close));

    ctx.run_main_loop();
    assert!(!ctx.is_valid(top));
    assert_eq!(display.window_count(), 0);
}

#[test]
fn consumed_close_keeps_running() {
    let (mut ctx, display) = context();
    let (top, handle) = main_window(&mut ctx, Rect::new(0.0, 0.0, 100.0, 100.0));
    let asked = Rc::new(Cell::new(0));
    let counter = Rc::clone(&asked);
    ctx.on_close(top, move |_| counter.set(counter.get() + 1)).unwrap();

    display.push_to(handle, Event::simple(EventKind::Close));
    settle(&mut ctx);

    assert_eq!(asked.get(), 1);
    assert!(ctx.is_running());
    assert!(ctx.is_valid(top));
}

#[test]
fn handler_panic_is_contained() {
    let (mut ctx, display) = context();
    let (top, handle) = main_window(&mut ctx, Rect::new(0.0, 0.0, 100.0, 100.0));
    let handled = Rc::new(Cell::new(0));
    let counter = Rc::clone(&handled);
    ctx.on_user(top, move |_, code| {
        if code == 1 {
            panic!("handler failure");
        }
        counter.set(counter.get() + 1);
    })
    .unwrap();

    display.push_to(handle, user(1));
    display.push_to(handle, user(2));
    settle(&mut ctx);

    assert!(ctx.is_running());
    assert_eq!(handled.get(), 1);
    assert!(!ctx.state(top).contains(WindowState::IN_EVENT_HANDLE));
}

#[test]
fn second_hot_key_registration_is_rejected() {
    let (mut ctx, display) = context();
    let (_, handle) = main_window(&mut ctx, Rect::new(0.0, 0.0, 100.0, 100.0));
    let key = HotKey::new(keys::F2, KeyState::CONTROL);
    let fired = Rc::new(Cell::new(Vec::new()));

    let log = Rc::clone(&fired);
    ctx.register_hot_key(key, None, move |_| {
        let mut seen = log.take();
        seen.push("first");
        log.set(seen);
    })
    .unwrap();
    let log = Rc::clone(&fired);
    let second = ctx.register_hot_key(key, None, move |_| {
        let mut seen = log.take();
        seen.push("second");
        log.set(seen);
    });
    assert_eq!(second, Err(HotKeyError::AlreadyRegistered(key)));
    assert_eq!(display.grabbed_hot_keys(), [key]);

    display.push_to(handle, Event::key_down(keys::F2, KeyState::CONTROL, ""));
    settle(&mut ctx);
    assert_eq!(fired.take(), ["first"]);
}

#[test]
fn hot_key_bound_to_a_window_fires_only_there() {
    let (mut ctx, display) = context();
    let (one, one_handle) = main_window(&mut ctx, Rect::new(0.0, 0.0, 100.0, 100.0));
    let (_, two_handle) = main_window(&mut ctx, Rect::new(200.0, 0.0, 100.0, 100.0));
    let child = ctx.create_child(one, WindowClass::control(), Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();

    let fired = Rc::new(Cell::new(0));
    let counter = Rc::clone(&fired);
    let key = HotKey::new(keys::F3, KeyState::empty());
    ctx.register_hot_key(key, Some(child), move |_| counter.set(counter.get() + 1))
        .unwrap();

    let typed = Rc::new(Cell::new(0));
    let counter = Rc::clone(&typed);
    ctx.on_key_down(one, move |_, _, _, _| counter.set(counter.get() + 1)).unwrap();

    display.push_to(two_handle, Event::key_down(keys::F3, KeyState::empty(), ""));
    display.push_to(one_handle, Event::key_down(keys::F3, KeyState::empty(), ""));
    settle(&mut ctx);

    assert_eq!(fired.get(), 1);
    assert_eq!(typed.get(), 0);
}

#[test]
fn modal_loop_blocks_other_windows() {
    let (mut ctx, display) = context();
    let (main, main_handle) = main_window(&mut ctx, Rect::new(0.0, 0.0, 100.0, 100.0));
    let dialog = ctx
        .create_overlapped(WindowClass::main_window(), Rect::new(20.0, 20.0, 50.0, 50.0), "dialog")
        .unwrap();
    let dialog_handle = ctx.native_handle(dialog).unwrap();

    let clicks = Rc::new(Cell::new(0));
    let counter = Rc::clone(&clicks);
    ctx.on_left_btn_down(main, move |_, _, _| counter.set(counter.get() + 1)).unwrap();

    let modal_key = HotKey::new(keys::F9, KeyState::empty());
    ctx.on_user(dialog, move |ctx, _| {
        assert_eq!(ctx.modal_window(), Some(dialog));
        ctx.register_hot_key(modal_key, None, |_| {}).unwrap();
        ctx.end_modal(dialog);
    })
    .unwrap();

    display.push_to(
        main_handle,
        Event::button_down(MouseButton::Left, NativePoint::new(5, 5), KeyState::empty()),
    );
    display.push_to(dialog_handle, user(0));
    ctx.run_modal(dialog).unwrap();

    assert_eq!(clicks.get(), 0);
    assert_eq!(ctx.modal_window(), None);
    assert!(ctx.is_visible(dialog));
    assert!(display.grabbed_hot_keys().is_empty());

    display.push_to(
        main_handle,
        Event::button_down(MouseButton::Left, NativePoint::new(5, 5), KeyState::empty()),
    );
    settle(&mut ctx);
    assert_eq!(clicks.get(), 1);
}

#[test]
fn closing_the_modal_window_ends_only_the_modal_loop() {
    let (mut ctx, display) = context();
    let _ = main_window(&mut ctx, Rect::new(0.0, 0.0, 100.0, 100.0));
    let dialog = ctx
        .create_overlapped(WindowClass::main_window(), Rect::new(20.0, 20.0, 50.0, 50.0), "dialog")
        .unwrap();
    let dialog_handle = ctx.native_handle(dialog).unwrap();

    display.push_to(dialog_handle, Event::simple(EventKind::Close));
    ctx.run_modal(dialog).unwrap();

    assert!(!ctx.is_valid(dialog));
    assert!(ctx.is_running());
}

#[test]
fn filters_see_events_before_windows() {
    let (mut ctx, display) = context();
    let (top, handle) = main_window(&mut ctx, Rect::new(0.0, 0.0, 100.0, 100.0));
    let seen = Rc::new(Cell::new(0));
    let counter = Rc::clone(&seen);
    ctx.on_user(top, move |_, _| counter.set(counter.get() + 1)).unwrap();
    ctx.add_filter(move |ctx, native: &NativeEvent| {
        native.event.kind() == EventKind::User && ctx.focus().is_none()
    });

    display.push_to(handle, user(3));
    settle(&mut ctx);
    assert_eq!(seen.get(), 0);
}

#[test]
fn panic_inside_modal_loop_keeps_the_outer_dispatch_marked() {
    let (mut ctx, display) = context();
    let (main, main_handle) = main_window(&mut ctx, Rect::new(0.0, 0.0, 100.0, 100.0));
    let dialog = ctx
        .create_overlapped(WindowClass::main_window(), Rect::new(20.0, 20.0, 50.0, 50.0), "dialog")
        .unwrap();
    let dialog_handle = ctx.native_handle(dialog).unwrap();

    ctx.on_user(dialog, move |ctx, code| {
        if code == 1 {
            panic!("dialog handler failure");
        }
        ctx.end_modal(dialog);
    })
    .unwrap();

    let marked = Rc::new(Cell::new(None));
    let seen = Rc::clone(&marked);
    ctx.on_user(main, move |ctx, _| {
        ctx.run_modal(dialog).unwrap();
        seen.set(Some(ctx.state(main).contains(WindowState::IN_EVENT_HANDLE)));
    })
    .unwrap();

    display.push_to(main_handle, user(0));
    display.push_to(dialog_handle, user(1));
    display.push_to(dialog_handle, user(2));
    settle(&mut ctx);

    assert_eq!(marked.get(), Some(true));
    assert!(!ctx.state(main).contains(WindowState::IN_EVENT_HANDLE));
    assert!(!ctx.state(dialog).contains(WindowState::IN_EVENT_HANDLE));
    assert_eq!(ctx.modal_window(), None);
}
