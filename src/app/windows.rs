//! Window operations on the context
//!
//! Lifecycle, geometry, visibility, focus and the coordinate chain.
//!
//! Coordinate spaces, from innermost out:
//! - client: origin at the window's own top-left corner
//! - surface: origin at the top-level window's client corner; what the native
//!   window draws and reports pointer positions in (native units)
//! - screen: the top-level window's position plus its surface coordinates

use tracing::{debug, trace};

use crate::app::Context;
use crate::config::ToolkitConfig;
use crate::domain::geometry::{Point, Rect, Size};
use crate::domain::keyboard::{KeyState, KeySymbol, MouseButton};
use crate::domain::native::{FromNative, NativePoint, NativeRect, Scale, ToNative};
use crate::event::handler::{
    Activated, AnyButtonDown, AnyButtonUp, Close, Created, Destroyed, EventSpec, FocusGained,
    FocusLost, Hidden, KeyDown, KeyUp, LeftButtonDoubleClick, LeftButtonDown, LeftButtonUp,
    MiddleButtonDown, MiddleButtonUp, MouseEntered, MouseLeft, MouseMoved, Moved, Paint, Resized,
    RightButtonDown, RightButtonUp, ScaleChanged, Shown, User, WheelX, WheelY,
};
use crate::event::{Event, EventKind, HandlerId};
use crate::platform::NativeHandle;
use crate::ui::Graphics;
use crate::window::{Layout, WindowClass, WindowError, WindowId, WindowNode, WindowState};

macro_rules! on_notification {
    ($($(#[$meta:meta])* $fn_name:ident => $spec:ty;)*) => {
        $(
            $(#[$meta])*
            pub fn $fn_name(
                &mut self,
                id: WindowId,
                mut handler: impl FnMut(&mut Context) + 'static,
            ) -> Result<HandlerId, WindowError> {
                self.on::<$spec>(id, move |ctx, ()| handler(ctx))
            }
        )*
    };
}

macro_rules! on_pointer {
    ($($(#[$meta:meta])* $fn_name:ident => $spec:ty;)*) => {
        $(
            $(#[$meta])*
            pub fn $fn_name(
                &mut self,
                id: WindowId,
                mut handler: impl FnMut(&mut Context, KeyState, Point) + 'static,
            ) -> Result<HandlerId, WindowError> {
                self.on::<$spec>(id, move |ctx, (state, at)| handler(ctx, state, at))
            }
        )*
    };
}

impl Context {
    /// Adds an inert window
    ///
    /// Nothing is allocated natively and no event is delivered until
    /// [`create`](Self::create). Handlers registered in between see `Create`.
    pub fn add_window(&mut self, class: WindowClass) -> WindowId {
        self.windows.insert(WindowNode::new(class))
    }

    /// Attaches an inert window to `parent`, or makes it top-level
    ///
    /// `area` is relative to the parent's client area, or the screen position
    /// and client size for a top-level window. Top-level windows start
    /// hidden; children start visible unless `area` is empty.
    pub fn create(
        &mut self,
        id: WindowId,
        parent: Option<WindowId>,
        area: Rect,
    ) -> Result<(), WindowError> {
        let node = self.windows.get(id).ok_or(WindowError::Invalid(id))?;
        if node.is_created() || node.is_overlapped() || node.parent.is_some() {
            return Err(WindowError::AlreadyCreated(id));
        }

        match parent {
            None => {
                let (class, title) = (node.class.clone(), node.title.clone());
                let handle = self
                    .backend
                    .create_window(&class, area.to_native(self.scale), &title)?;
                self.native_map.insert(handle, id);
                if let Some(node) = self.windows.get_mut(id) {
                    node.native = Some(handle);
                    node.area = area;
                    node.state |= WindowState::CREATED | WindowState::OVERLAPPED;
                }
            }
            Some(parent) => {
                let parent_node = self.windows.get_mut(parent).ok_or(WindowError::Invalid(parent))?;
                if !parent_node.is_created() {
                    return Err(WindowError::NotCreated(parent));
                }
                parent_node.children.push(id);
                if let Some(node) = self.windows.get_mut(id) {
                    node.parent = Some(parent);
                    node.area = area;
                    node.state |= WindowState::CREATED;
                    if !area.empty() {
                        node.state |= WindowState::VISIBLE;
                    }
                }
            }
        }

        debug!(target: "guipp::window", ?id, ?parent, ?area, "window created");
        self.handle_event(id, &Event::simple(EventKind::Create));
        if parent.is_some() {
            self.invalidate(id);
        }
        Ok(())
    }

    /// Creates a hidden top-level window with its own native surface
    pub fn create_overlapped(
        &mut self,
        class: WindowClass,
        area: Rect,
        title: &str,
    ) -> Result<WindowId, WindowError> {
        let id = self.add_window(class);
        if let Some(node) = self.windows.get_mut(id) {
            node.title = title.to_owned();
        }
        if let Err(err) = self.create(id, None, area) {
            self.windows.remove(id);
            return Err(err);
        }
        Ok(id)
    }

    pub fn create_child(
        &mut self,
        parent: WindowId,
        class: WindowClass,
        area: Rect,
    ) -> Result<WindowId, WindowError> {
        let id = self.add_window(class);
        if let Err(err) = self.create(id, Some(parent), area) {
            self.windows.remove(id);
            return Err(err);
        }
        Ok(id)
    }

    /// Destroys `id` and its children, children first
    ///
    /// Each window receives `Destroy` before it is detached. Destroying a
    /// window that is already gone, or being destroyed, does nothing.
    pub fn destroy(&mut self, id: WindowId) {
        let Some(node) = self.windows.get(id) else {
            return;
        };
        if !node.is_created() {
            if !node.is_overlapped() && node.parent.is_none() {
                self.windows.remove(id);
            }
            return;
        }

        let children = node.children.clone();
        self.invalidate(id);
        if let Some(node) = self.windows.get_mut(id) {
            node.state.remove(WindowState::CREATED);
        }
        self.drop_focus_within(id);
        for child in children {
            self.destroy(child);
        }

        self.handle_event(id, &Event::simple(EventKind::Destroy));

        let Some(node) = self.windows.remove(id) else {
            return;
        };
        if let Some(parent) = node.parent.and_then(|parent| self.windows.get_mut(parent)) {
            parent.children.retain(|child| *child != id);
            if let Some(layout) = parent.layout.as_mut() {
                layout.forget(id);
            }
        }
        if let Some(handle) = node.native {
            self.native_map.remove(&handle);
            self.backend.destroy_window(handle);
        }
        if self.mouse_inside == Some(id) {
            self.mouse_inside = None;
        }
        self.modal_stack.retain(|modal| *modal != id);
        debug!(target: "guipp::window", ?id, "window destroyed");
    }

    /// Asks `id` to close
    ///
    /// Returns true if no handler consumed `Close` and the window was destroyed.
    pub fn close(&mut self, id: WindowId) -> bool {
        if !self.is_valid(id) {
            return false;
        }
        let outcome = self.dispatch_to(id, &Event::simple(EventKind::Close));
        if outcome.consumed {
            trace!(target: "guipp::window", ?id, "close consumed");
            return false;
        }
        self.destroy(id);
        true
    }

    /// Created and not being destroyed
    pub fn is_valid(&self, id: WindowId) -> bool {
        self.windows.get(id).is_some_and(WindowNode::is_created)
    }

    pub fn state(&self, id: WindowId) -> WindowState {
        self.windows.get(id).map(|node| node.state).unwrap_or_default()
    }

    pub fn is_visible(&self, id: WindowId) -> bool {
        self.state(id).contains(WindowState::VISIBLE)
    }

    pub fn is_enabled(&self, id: WindowId) -> bool {
        self.state(id).contains(WindowState::ENABLED)
    }

    pub fn has_focus(&self, id: WindowId) -> bool {
        self.state(id).contains(WindowState::FOCUSED)
    }

    /// Visible along with every ancestor
    pub fn is_shown(&self, id: WindowId) -> bool {
        let mut current = Some(id);
        while let Some(window) = current {
            match self.windows.get(window) {
                Some(node) if node.is_created() && node.is_visible() => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    pub fn parent(&self, id: WindowId) -> Option<WindowId> {
        self.windows.get(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: WindowId) -> &[WindowId] {
        self.windows
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// The overlapped window `id` is painted into
    pub fn top_level(&self, id: WindowId) -> Option<WindowId> {
        let mut current = id;
        loop {
            match self.windows.get(current)?.parent {
                Some(parent) => current = parent,
                None => return Some(current),
            }
        }
    }

    /// Whether `ancestor` is `id` or one of its parents
    pub fn is_ancestor(&self, ancestor: WindowId, id: WindowId) -> bool {
        let mut current = Some(id);
        while let Some(window) = current {
            if window == ancestor {
                return true;
            }
            current = self.parent(window);
        }
        false
    }

    pub fn class(&self, id: WindowId) -> Option<&WindowClass> {
        self.windows.get(id).map(|node| &node.class)
    }

    pub fn title(&self, id: WindowId) -> &str {
        self.windows.get(id).map(|node| node.title.as_str()).unwrap_or("")
    }

    pub fn set_title(&mut self, id: WindowId, title: &str) {
        let Some(node) = self.windows.get_mut(id) else {
            return;
        };
        node.title = title.to_owned();
        if let Some(handle) = node.native {
            self.backend.set_title(handle, title);
        }
    }

    /// Native handle of a top-level window
    pub fn native_handle(&self, id: WindowId) -> Option<NativeHandle> {
        self.windows.get(id).and_then(|node| node.native)
    }

    /// Area relative to the parent's client area, [`Rect::DEF`] for a stale id
    pub fn geometry(&self, id: WindowId) -> Rect {
        self.windows.get(id).map(|node| node.area).unwrap_or(Rect::DEF)
    }

    pub fn position(&self, id: WindowId) -> Point {
        self.geometry(id).position()
    }

    pub fn size(&self, id: WindowId) -> Size {
        self.geometry(id).size()
    }

    /// Client area; always at the origin
    pub fn client_geometry(&self, id: WindowId) -> Rect {
        Rect::with_size(self.size(id))
    }

    pub fn set_geometry(&mut self, id: WindowId, area: Rect) {
        self.place(id, area, true);
    }

    pub fn move_to(&mut self, id: WindowId, position: Point) {
        if let Some(node) = self.windows.get(id) {
            let area = Rect::from_parts(position, node.area.size());
            self.place(id, area, true);
        }
    }

    /// Resizes keeping the position
    ///
    /// An empty size hides the window; growing from an empty size shows it.
    pub fn resize(&mut self, id: WindowId, size: Size) {
        if let Some(node) = self.windows.get(id) {
            let area = Rect::from_parts(node.area.position(), size);
            self.place(id, area, true);
        }
    }

    /// Moves and resizes, with or without invalidating the affected area
    pub fn place(&mut self, id: WindowId, area: Rect, repaint: bool) {
        self.update_area(id, area, true, repaint);
    }

    /// Applies a new area and delivers `Move`/`Size`
    ///
    /// `sync_native` is false when the backend reported the change itself.
    pub(crate) fn update_area(&mut self, id: WindowId, area: Rect, sync_native: bool, repaint: bool) {
        let Some(node) = self.windows.get_mut(id) else {
            return;
        };
        if !node.is_created() || node.area == area {
            return;
        }
        let old = node.area;
        node.area = area;
        let overlapped = node.is_overlapped();
        let parent = node.parent;
        let native = node.native.filter(|_| sync_native);

        if let Some(handle) = native {
            self.backend.set_geometry(handle, area.to_native(self.scale));
        }
        trace!(target: "guipp::window", ?id, ?old, ?area, "geometry changed");

        if repaint && self.is_shown(id) {
            if overlapped {
                if old.size() != area.size() {
                    self.invalidate(id);
                }
            } else if let Some(parent) = parent {
                let offset = self.surface_position(parent).to_size();
                let dirty = old.translated(offset) | area.translated(offset);
                self.invalidate_surface(id, dirty);
            }
        }

        if old.position() != area.position() {
            self.handle_event(id, &Event::geometry(EventKind::Move, area));
        }
        if old.size() != area.size() {
            self.handle_event(id, &Event::geometry(EventKind::Size, area));
            self.do_layout(id);
        }

        if area.empty() && !old.empty() {
            self.set_visible(id, false);
        } else if old.empty() && !area.empty() {
            self.set_visible(id, true);
        }
    }

    /// Installs a layout strategy and arranges the children right away
    pub fn set_layout(&mut self, id: WindowId, layout: impl Layout + 'static) {
        if let Some(node) = self.windows.get_mut(id) {
            node.layout = Some(Box::new(layout));
            self.do_layout(id);
        }
    }

    pub fn clear_layout(&mut self, id: WindowId) {
        if let Some(node) = self.windows.get_mut(id) {
            node.layout = None;
        }
    }

    pub fn has_layout(&self, id: WindowId) -> bool {
        self.windows.get(id).is_some_and(|node| node.layout.is_some())
    }

    /// Re-arranges the children of `id` and delivers `Layout`
    ///
    /// Children are placed without invalidation; the window itself is
    /// expected to repaint as a whole.
    pub fn do_layout(&mut self, id: WindowId) {
        let Some(node) = self.windows.get_mut(id) else {
            return;
        };
        let client = Rect::with_size(node.area.size());
        if let Some(mut layout) = node.layout.take() {
            let placements = layout.arrange(client);
            if let Some(node) = self.windows.get_mut(id) {
                node.layout.get_or_insert(layout);
            }
            for (child, area) in placements {
                if self.parent(child) == Some(id) {
                    self.place(child, area, false);
                }
            }
        }
        self.handle_event(id, &Event::geometry(EventKind::Layout, client));
    }

    pub fn set_visible(&mut self, id: WindowId, visible: bool) {
        let Some(node) = self.windows.get_mut(id) else {
            return;
        };
        if !node.is_created() || node.is_visible() == visible {
            return;
        }
        node.state.set(WindowState::VISIBLE, visible);
        let overlapped = node.is_overlapped();
        if let Some(handle) = node.native {
            self.backend.set_visible(handle, visible);
        }

        if !visible {
            self.drop_focus_within(id);
            if self.mouse_inside.is_some_and(|inside| self.is_ancestor(id, inside)) {
                self.mouse_inside = None;
            }
        }
        if overlapped {
            self.invalidate(id);
        } else {
            let area = self.surface_geometry(id);
            self.invalidate_surface(id, area);
        }

        let kind = if visible { EventKind::Show } else { EventKind::Hide };
        self.handle_event(id, &Event::simple(kind));
    }

    pub fn enable(&mut self, id: WindowId, enabled: bool) {
        let Some(node) = self.windows.get_mut(id) else {
            return;
        };
        if node.is_enabled() == enabled {
            return;
        }
        node.state.set(WindowState::ENABLED, enabled);
        if !enabled {
            self.drop_focus_within(id);
        }
    }

    /// Moves keyboard focus to `id`, delivering `LostFocus` then `SetFocus`
    ///
    /// Returns false if the window cannot take input.
    pub fn set_focus(&mut self, id: WindowId) -> bool {
        if !self.windows.get(id).is_some_and(WindowNode::accepts_input) {
            return false;
        }
        if self.focus == Some(id) {
            return true;
        }
        if let Some(old) = self.focus.take() {
            if let Some(node) = self.windows.get_mut(old) {
                node.state.remove(WindowState::FOCUSED);
            }
            self.handle_event(old, &Event::simple(EventKind::LostFocus));
        }
        // a LostFocus handler may have focused something else
        if self.focus.is_some() {
            return self.focus == Some(id);
        }
        self.focus = Some(id);
        if let Some(node) = self.windows.get_mut(id) {
            node.state.insert(WindowState::FOCUSED);
        }
        trace!(target: "guipp::window", ?id, "focus");
        self.handle_event(id, &Event::simple(EventKind::SetFocus));
        true
    }

    fn drop_focus_within(&mut self, id: WindowId) {
        let Some(focus) = self.focus else {
            return;
        };
        if !self.is_ancestor(id, focus) {
            return;
        }
        self.focus = None;
        if let Some(node) = self.windows.get_mut(focus) {
            node.state.remove(WindowState::FOCUSED);
        }
        self.handle_event(focus, &Event::simple(EventKind::LostFocus));
    }

    /// Stops invalidation of `id` and its children until re-enabled
    pub fn set_redraw_disabled(&mut self, id: WindowId, disabled: bool) {
        let Some(node) = self.windows.get_mut(id) else {
            return;
        };
        node.state.set(WindowState::REDRAW_DISABLED, disabled);
        if !disabled {
            self.invalidate(id);
        }
    }

    fn redraw_disabled(&self, id: WindowId) -> bool {
        let mut current = Some(id);
        while let Some(window) = current {
            match self.windows.get(window) {
                Some(node) if node.state.contains(WindowState::REDRAW_DISABLED) => return true,
                Some(node) => current = node.parent,
                None => return false,
            }
        }
        false
    }

    /// Client origin on the top-level surface, logical units
    pub fn surface_position(&self, id: WindowId) -> Point {
        let mut position = Point::ZERO;
        let mut current = id;
        while let Some(node) = self.windows.get(current) {
            match node.parent {
                Some(parent) => {
                    position = position + node.area.position().to_size();
                    current = parent;
                }
                None => break,
            }
        }
        position
    }

    pub fn surface_geometry(&self, id: WindowId) -> Rect {
        Rect::from_parts(self.surface_position(id), self.size(id))
    }

    /// Client origin in screen coordinates
    pub fn absolute_position(&self, id: WindowId) -> Point {
        let screen = self
            .top_level(id)
            .map(|top| self.position(top))
            .unwrap_or(Point::ZERO);
        screen + self.surface_position(id).to_size()
    }

    pub fn client_to_screen(&self, id: WindowId, p: Point) -> Point {
        p + self.absolute_position(id).to_size()
    }

    pub fn screen_to_client(&self, id: WindowId, p: Point) -> Point {
        p - self.absolute_position(id).to_size()
    }

    /// Native surface point to logical client coordinates of `id`
    pub fn surface_to_client(&self, id: WindowId, p: NativePoint) -> Point {
        p.to_logical(self.scale) - self.surface_position(id).to_size()
    }

    pub fn client_to_surface(&self, id: WindowId, p: Point) -> NativePoint {
        (p + self.surface_position(id).to_size()).to_native(self.scale)
    }

    /// Deepest window under client point `p` of `id` that takes input
    ///
    /// Later children are on top. Returns `id` itself when no child is hit,
    /// and `None` when `p` is outside `id`.
    pub fn window_at(&self, id: WindowId, p: Point) -> Option<WindowId> {
        let node = self.windows.get(id)?;
        if !Rect::with_size(node.area.size()).is_inside(p) {
            return None;
        }
        for &child in node.children.iter().rev() {
            let Some(child_node) = self.windows.get(child) else {
                continue;
            };
            if child_node.accepts_input() && child_node.area.is_inside(p) {
                let local = p - child_node.area.position().to_size();
                return self.window_at(child, local).or(Some(child));
            }
        }
        Some(id)
    }

    /// Marks the whole window dirty; the paint arrives on a later iteration
    pub fn invalidate(&mut self, id: WindowId) {
        if !self.is_shown(id) {
            return;
        }
        let area = self.surface_geometry(id);
        self.invalidate_surface(id, area);
    }

    /// Marks part of the client area dirty
    pub fn invalidate_rect(&mut self, id: WindowId, area: Rect) {
        if !self.is_shown(id) {
            return;
        }
        let surface = self.surface_geometry(id);
        let dirty = area.translated(surface.position().to_size()) & surface;
        self.invalidate_surface(id, dirty);
    }

    /// Forwards a dirty surface rectangle to the top-level native window
    fn invalidate_surface(&mut self, id: WindowId, area: Rect) {
        if area.empty() || self.redraw_disabled(id) {
            return;
        }
        let Some(top) = self.top_level(id) else {
            return;
        };
        let Some(node) = self.windows.get(top) else {
            return;
        };
        let Some(handle) = node.native.filter(|_| node.is_visible()) else {
            return;
        };
        let bounds = NativeRect::from_parts(NativePoint::ZERO, node.area.size().to_native(self.scale));
        let dirty = area.to_native(self.scale).intersection(&bounds);
        if !dirty.empty() {
            self.backend.invalidate(handle, dirty);
        }
    }

    /// Paints `id` now, bypassing the native paint cycle
    pub fn redraw(&mut self, id: WindowId) {
        if !self.is_shown(id) {
            return;
        }
        let Some(top) = self.top_level(id) else {
            return;
        };
        let area = self.surface_geometry(id).to_native(self.scale);
        self.paint_native(top, area);
    }

    /// Changes the process-wide scale and delivers `ScaleChanged` everywhere
    ///
    /// Logical geometry is kept; nothing is re-laid out.
    pub fn set_scale_factor(&mut self, factor: f32) {
        let factor = ToolkitConfig::sanitize_scale_factor(factor);
        if self.scale.factor() == factor {
            return;
        }
        self.scale = Scale::new(factor);
        debug!(target: "guipp::window", factor, "scale factor changed");

        let windows: Vec<(WindowId, bool)> = self
            .windows
            .iter()
            .filter(|(_, node)| node.is_created())
            .map(|(id, node)| (id, node.is_overlapped()))
            .collect();
        for &(id, _) in &windows {
            self.handle_event(id, &Event::scale_changed(factor));
        }
        for (id, overlapped) in windows {
            if overlapped {
                self.invalidate(id);
            }
        }
    }

    /// Registers a typed handler on `id`
    ///
    /// Handlers run in registration order. Returns the id to pass to
    /// [`unregister_event_handler`](Self::unregister_event_handler).
    pub fn on<S: EventSpec>(
        &mut self,
        id: WindowId,
        handler: impl FnMut(&mut Context, S::Args) + 'static,
    ) -> Result<HandlerId, WindowError> {
        let node = self.windows.get_mut(id).ok_or(WindowError::Invalid(id))?;
        Ok(node.dispatcher.register::<S, _>(handler))
    }

    /// Like [`on`](Self::on), only for events `filter` accepts
    pub fn on_filtered<S: EventSpec>(
        &mut self,
        id: WindowId,
        filter: impl Fn(&Event) -> bool + 'static,
        handler: impl FnMut(&mut Context, S::Args) + 'static,
    ) -> Result<HandlerId, WindowError> {
        let node = self.windows.get_mut(id).ok_or(WindowError::Invalid(id))?;
        Ok(node.dispatcher.register_filtered::<S, _, _>(filter, handler))
    }

    pub fn unregister_event_handler(&mut self, id: WindowId, handler: HandlerId) -> bool {
        self.windows
            .get_mut(id)
            .is_some_and(|node| node.dispatcher.unregister(handler))
    }

    on_notification! {
        on_create => Created;
        on_destroy => Destroyed;
        on_show => Shown;
        on_hide => Hidden;
        on_set_focus => FocusGained;
        on_lost_focus => FocusLost;
        on_activate => Activated;
        on_mouse_enter => MouseEntered;
        on_mouse_leave => MouseLeft;
        /// Consumes `Close`: the window stays open unless the handler destroys it
        on_close => Close;
    }

    on_pointer! {
        on_mouse_move => MouseMoved;
        on_left_btn_down => LeftButtonDown;
        on_left_btn_up => LeftButtonUp;
        on_left_btn_dblclk => LeftButtonDoubleClick;
        on_right_btn_down => RightButtonDown;
        on_right_btn_up => RightButtonUp;
        on_middle_btn_down => MiddleButtonDown;
        on_middle_btn_up => MiddleButtonUp;
    }

    pub fn on_paint(
        &mut self,
        id: WindowId,
        handler: impl FnMut(&mut Context, Graphics) + 'static,
    ) -> Result<HandlerId, WindowError> {
        self.on::<Paint>(id, handler)
    }

    pub fn on_move(
        &mut self,
        id: WindowId,
        handler: impl FnMut(&mut Context, Point) + 'static,
    ) -> Result<HandlerId, WindowError> {
        self.on::<Moved>(id, handler)
    }

    pub fn on_size(
        &mut self,
        id: WindowId,
        handler: impl FnMut(&mut Context, Size) + 'static,
    ) -> Result<HandlerId, WindowError> {
        self.on::<Resized>(id, handler)
    }

    pub fn on_layout(
        &mut self,
        id: WindowId,
        handler: impl FnMut(&mut Context, Rect) + 'static,
    ) -> Result<HandlerId, WindowError> {
        self.on::<crate::event::handler::Layout>(id, handler)
    }

    pub fn on_any_button_down(
        &mut self,
        id: WindowId,
        mut handler: impl FnMut(&mut Context, MouseButton, KeyState, Point) + 'static,
    ) -> Result<HandlerId, WindowError> {
        self.on::<AnyButtonDown>(id, move |ctx, (button, state, at)| handler(ctx, button, state, at))
    }

    pub fn on_any_button_up(
        &mut self,
        id: WindowId,
        mut handler: impl FnMut(&mut Context, MouseButton, KeyState, Point) + 'static,
    ) -> Result<HandlerId, WindowError> {
        self.on::<AnyButtonUp>(id, move |ctx, (button, state, at)| handler(ctx, button, state, at))
    }

    /// Vertical wheel, one call per notch with a step of `-1` or `1`
    pub fn on_wheel_y(
        &mut self,
        id: WindowId,
        mut handler: impl FnMut(&mut Context, i32, Point) + 'static,
    ) -> Result<HandlerId, WindowError> {
        self.on::<WheelY>(id, move |ctx, (step, at)| handler(ctx, step, at))
    }

    pub fn on_wheel_x(
        &mut self,
        id: WindowId,
        mut handler: impl FnMut(&mut Context, i32, Point) + 'static,
    ) -> Result<HandlerId, WindowError> {
        self.on::<WheelX>(id, move |ctx, (step, at)| handler(ctx, step, at))
    }

    pub fn on_key_down(
        &mut self,
        id: WindowId,
        mut handler: impl FnMut(&mut Context, KeyState, KeySymbol, String) + 'static,
    ) -> Result<HandlerId, WindowError> {
        self.on::<KeyDown>(id, move |ctx, (state, key, chars)| handler(ctx, state, key, chars))
    }

    pub fn on_key_up(
        &mut self,
        id: WindowId,
        mut handler: impl FnMut(&mut Context, KeyState, KeySymbol) + 'static,
    ) -> Result<HandlerId, WindowError> {
        self.on::<KeyUp>(id, move |ctx, (state, key)| handler(ctx, state, key))
    }

    pub fn on_scale_changed(
        &mut self,
        id: WindowId,
        handler: impl FnMut(&mut Context, f32) + 'static,
    ) -> Result<HandlerId, WindowError> {
        self.on::<ScaleChanged>(id, handler)
    }

    pub fn on_user(
        &mut self,
        id: WindowId,
        handler: impl FnMut(&mut Context, u32) + 'static,
    ) -> Result<HandlerId, WindowError> {
        self.on::<User>(id, handler)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::platform::{Headless, HeadlessHandle};

    fn context(scale: f32) -> (Context, HeadlessHandle) {
        let (backend, handle) = Headless::new(Scale::new(scale));
        (Context::with_backend(Box::new(backend), ToolkitConfig::default()), handle)
    }

    fn approx(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-4 && (a.y - b.y).abs() < 1e-4
    }

    #[test]
    fn create_and_destroy_children_first() {
        let (mut ctx, display) = context(1.0);
        let top = ctx
            .create_overlapped(WindowClass::main_window(), Rect::new(10.0, 10.0, 300.0, 200.0), "main")
            .unwrap();
        let panel = ctx.create_child(top, WindowClass::panel(), Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        let button = ctx.create_child(panel, WindowClass::control(), Rect::new(5.0, 5.0, 20.0, 10.0)).unwrap();
        assert_eq!(display.window_count(), 1);
        assert_eq!(ctx.children(top), [panel]);

        let log = Rc::new(RefCell::new(Vec::new()));
        for (id, name) in [(top, "top"), (panel, "panel"), (button, "button")] {
            let log = Rc::clone(&log);
            ctx.on_destroy(id, move |_| log.borrow_mut().push(name)).unwrap();
        }

        ctx.destroy(top);
        assert_eq!(*log.borrow(), ["button", "panel", "top"]);
        assert_eq!(ctx.window_count(), 0);
        assert_eq!(display.window_count(), 0);

        ctx.destroy(top);
        assert_eq!(ctx.geometry(top), Rect::DEF);
    }

    #[test]
    fn create_event_reaches_handlers_registered_while_inert() {
        let (mut ctx, _) = context(1.0);
        let top = ctx.add_window(WindowClass::main_window());
        let created = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&created);
        ctx.on_create(top, move |_| *flag.borrow_mut() = true).unwrap();
        assert!(!ctx.is_valid(top));

        ctx.create(top, None, Rect::new(0.0, 0.0, 50.0, 50.0)).unwrap();
        assert!(*created.borrow());
        assert!(matches!(
            ctx.create(top, None, Rect::DEF),
            Err(WindowError::AlreadyCreated(_))
        ));
    }

    #[test]
    fn child_of_inert_parent_is_rejected() {
        let (mut ctx, _) = context(1.0);
        let parent = ctx.add_window(WindowClass::panel());
        let result = ctx.create_child(parent, WindowClass::panel(), Rect::DEF);
        assert!(matches!(result, Err(WindowError::NotCreated(id)) if id == parent));
        assert_eq!(ctx.window_count(), 1);
    }

    #[test]
    fn coordinate_chain() {
        let (mut ctx, _) = context(1.5);
        let top = ctx
            .create_overlapped(WindowClass::main_window(), Rect::new(100.0, 50.0, 400.0, 300.0), "main")
            .unwrap();
        let outer = ctx.create_child(top, WindowClass::panel(), Rect::new(10.0, 20.0, 200.0, 200.0)).unwrap();
        let inner = ctx.create_child(outer, WindowClass::panel(), Rect::new(5.0, 5.0, 50.0, 50.0)).unwrap();

        assert_eq!(ctx.position(inner), Point::new(5.0, 5.0));
        assert_eq!(ctx.surface_position(inner), Point::new(15.0, 25.0));
        assert_eq!(ctx.absolute_position(inner), Point::new(115.0, 75.0));

        let screen = ctx.client_to_screen(inner, Point::new(1.0, 2.0));
        assert_eq!(screen, Point::new(116.0, 77.0));
        assert_eq!(ctx.screen_to_client(inner, screen), Point::new(1.0, 2.0));

        let native = ctx.client_to_surface(inner, Point::new(1.0, 1.0));
        assert_eq!(native, NativePoint::new(24, 39));
        assert!(approx(ctx.surface_to_client(inner, native), Point::new(1.0, 1.0)));
    }

    #[test]
    fn resize_to_empty_hides_and_back_shows() {
        let (mut ctx, _) = context(1.0);
        let top = ctx
            .create_overlapped(WindowClass::main_window(), Rect::new(0.0, 0.0, 100.0, 100.0), "main")
            .unwrap();
        let child = ctx.create_child(top, WindowClass::panel(), Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        assert!(ctx.is_visible(child));

        ctx.resize(child, Size::ZERO);
        assert!(!ctx.is_visible(child));
        ctx.resize(child, Size::new(5.0, 5.0));
        assert!(ctx.is_visible(child));
    }

    #[test]
    fn window_at_prefers_topmost_child() {
        let (mut ctx, _) = context(1.0);
        let top = ctx
            .create_overlapped(WindowClass::main_window(), Rect::new(0.0, 0.0, 100.0, 100.0), "main")
            .unwrap();
        let below = ctx.create_child(top, WindowClass::panel(), Rect::new(0.0, 0.0, 50.0, 50.0)).unwrap();
        let above = ctx.create_child(top, WindowClass::panel(), Rect::new(25.0, 25.0, 50.0, 50.0)).unwrap();

        assert_eq!(ctx.window_at(top, Point::new(10.0, 10.0)), Some(below));
        assert_eq!(ctx.window_at(top, Point::new(30.0, 30.0)), Some(above));
        assert_eq!(ctx.window_at(top, Point::new(90.0, 10.0)), Some(top));
        assert_eq!(ctx.window_at(top, Point::new(200.0, 10.0)), None);

        ctx.enable(above, false);
        assert_eq!(ctx.window_at(top, Point::new(30.0, 30.0)), Some(below));
    }

    #[test]
    fn focus_moves_with_notifications() {
        let (mut ctx, _) = context(1.0);
        let top = ctx
            .create_overlapped(WindowClass::main_window(), Rect::new(0.0, 0.0, 100.0, 100.0), "main")
            .unwrap();
        ctx.set_visible(top, true);
        let a = ctx.create_child(top, WindowClass::control(), Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        let b = ctx.create_child(top, WindowClass::control(), Rect::new(20.0, 0.0, 10.0, 10.0)).unwrap();

        let log = Rc::new(RefCell::new(Vec::new()));
        let lost = Rc::clone(&log);
        ctx.on_lost_focus(a, move |_| lost.borrow_mut().push("a lost")).unwrap();
        let gained = Rc::clone(&log);
        ctx.on_set_focus(b, move |_| gained.borrow_mut().push("b gained")).unwrap();

        assert!(ctx.set_focus(a));
        assert!(ctx.set_focus(b));
        assert_eq!(*log.borrow(), ["a lost", "b gained"]);
        assert!(ctx.has_focus(b) && !ctx.has_focus(a));

        ctx.set_visible(b, false);
        assert_eq!(ctx.focus(), None);
    }

    #[test]
    fn invalidate_is_suppressed_while_redraw_disabled() {
        let (mut ctx, display) = context(1.0);
        let top = ctx
            .create_overlapped(WindowClass::main_window(), Rect::new(0.0, 0.0, 100.0, 100.0), "main")
            .unwrap();
        assert!(display.pending_paints().is_empty());

        ctx.set_redraw_disabled(top, true);
        ctx.set_visible(top, true);
        assert!(display.pending_paints().is_empty());

        ctx.set_redraw_disabled(top, false);
        let handle = ctx.native_handle(top).unwrap();
        assert_eq!(display.pending_paints(), [(handle, NativeRect::new(0, 0, 100, 100))]);
    }

    #[test]
    fn handlers_can_be_unregistered() {
        let (mut ctx, _) = context(1.0);
        let top = ctx
            .create_overlapped(WindowClass::main_window(), Rect::new(0.0, 0.0, 100.0, 100.0), "main")
            .unwrap();
        let count = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&count);
        let id = ctx.on_size(top, move |_, _| *counter.borrow_mut() += 1).unwrap();

        ctx.resize(top, Size::new(120.0, 100.0));
        assert!(ctx.unregister_event_handler(top, id));
        ctx.resize(top, Size::new(140.0, 100.0));
        assert_eq!(*count.borrow(), 1);
    }
}
