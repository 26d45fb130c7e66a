//! Hot-key table
//!
//! Hot keys are process-global, so the table is a stack of frames: the base
//! frame holds the application's keys and every modal loop pushes its own
//! frame for its lifetime. Only the top frame is consulted when a key fires.
//!
//! The table only tracks bindings. Grabbing the key combination from the OS
//! is the backend's job; the native id handed out here is what the backend
//! registers and later reports back.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::domain::keyboard::{HotKey, KeyState, KeySymbol};
use crate::window::WindowId;

/// Hot-key registration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HotKeyError {
    #[error("hot key {0} is already registered")]
    AlreadyRegistered(HotKey),

    #[error("hot key {0} is not registered")]
    NotRegistered(HotKey),
}

pub type HotKeyCallback<T> = Box<dyn FnMut(&mut T)>;

/// A registered hot key
pub struct HotKeyBinding<T> {
    /// Identifier passed to the backend when grabbing the key
    pub native_id: i32,
    /// Fire only for key events aimed at this window's top-level window
    pub window: Option<WindowId>,
    pub callback: Rc<RefCell<HotKeyCallback<T>>>,
}

impl<T> Clone for HotKeyBinding<T> {
    fn clone(&self) -> Self {
        Self {
            native_id: self.native_id,
            window: self.window,
            callback: Rc::clone(&self.callback),
        }
    }
}

impl<T> fmt::Debug for HotKeyBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotKeyBinding")
            .field("native_id", &self.native_id)
            .field("window", &self.window)
            .finish()
    }
}

pub struct HotKeyTable<T> {
    frames: Vec<HashMap<HotKey, HotKeyBinding<T>>>,
    next_id: i32,
}

impl<T> Default for HotKeyTable<T> {
    fn default() -> Self {
        Self {
            frames: vec![HashMap::new()],
            next_id: 1,
        }
    }
}

impl<T> HotKeyTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn top(&self) -> &HashMap<HotKey, HotKeyBinding<T>> {
        // the base frame is never popped
        &self.frames[self.frames.len() - 1]
    }

    fn top_mut(&mut self) -> &mut HashMap<HotKey, HotKeyBinding<T>> {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    /// Adds a binding to the current frame
    ///
    /// A key already bound in the current frame is rejected and the first
    /// binding stays in place.
    pub fn register(
        &mut self,
        key: HotKey,
        window: Option<WindowId>,
        callback: HotKeyCallback<T>,
    ) -> Result<i32, HotKeyError> {
        if self.top().contains_key(&key) {
            return Err(HotKeyError::AlreadyRegistered(key));
        }
        let native_id = self.next_id;
        self.next_id += 1;
        self.top_mut().insert(
            key,
            HotKeyBinding {
                native_id,
                window,
                callback: Rc::new(RefCell::new(callback)),
            },
        );
        Ok(native_id)
    }

    /// Removes a binding from the current frame, returning its native id
    pub fn unregister(&mut self, key: HotKey) -> Result<i32, HotKeyError> {
        self.top_mut()
            .remove(&key)
            .map(|binding| binding.native_id)
            .ok_or(HotKeyError::NotRegistered(key))
    }

    pub fn contains(&self, key: &HotKey) -> bool {
        self.top().contains_key(key)
    }

    /// Binding for a key press with `state` held
    pub fn lookup(&self, symbol: KeySymbol, state: KeyState) -> Option<(HotKey, HotKeyBinding<T>)> {
        let key = HotKey::new(symbol, state);
        self.top().get(&key).map(|binding| (key, binding.clone()))
    }

    /// Binding by the id the backend reported
    pub fn lookup_native(&self, native_id: i32) -> Option<(HotKey, HotKeyBinding<T>)> {
        self.top()
            .iter()
            .find(|(_, binding)| binding.native_id == native_id)
            .map(|(key, binding)| (*key, binding.clone()))
    }

    /// Starts an empty frame for a modal loop
    pub fn push_frame(&mut self) {
        self.frames.push(HashMap::new());
    }

    /// Drops the current frame and returns its keys so they can be ungrabbed
    ///
    /// The base frame stays; popping it returns nothing.
    pub fn pop_frame(&mut self) -> Vec<(HotKey, i32)> {
        if self.frames.len() == 1 {
            return Vec::new();
        }
        self.frames
            .pop()
            .map(|frame| {
                frame
                    .into_iter()
                    .map(|(key, binding)| (key, binding.native_id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every key in every frame, for teardown
    pub fn drain_all(&mut self) -> Vec<(HotKey, i32)> {
        let keys = self
            .frames
            .drain(..)
            .flat_map(|frame| frame.into_iter().map(|(key, binding)| (key, binding.native_id)))
            .collect();
        self.frames.push(HashMap::new());
        keys
    }

    /// Number of frames, including the base frame
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Keys bound in the current frame
    pub fn len(&self) -> usize {
        self.top().len()
    }

    pub fn is_empty(&self) -> bool {
        self.top().is_empty()
    }
}

impl<T> fmt::Debug for HotKeyTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotKeyTable")
            .field("depth", &self.frames.len())
            .field("active", &self.top().keys().collect::<Vec<_>>())
            .finish()
    }
}
