use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crossterm::event::KeyCode;

/// An idle session that never drains its hits must not grow without bound.
const MAX_PENDING_HITS: usize = 32;

/// Logical keys the games understand. Anything else on the keyboard is
/// irrelevant to a session and never reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameKey {
    Up,
    Down,
    Left,
    Right,
    /// Rhythm lane strike, lanes 0..5.
    Lane(u8),
    Restart,
}

impl GameKey {
    pub fn from_key_code(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(GameKey::Up),
            KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Some(GameKey::Down),
            KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(GameKey::Left),
            KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(GameKey::Right),
            KeyCode::Char(c @ '1'..='5') => Some(GameKey::Lane(c as u8 - b'1')),
            KeyCode::Char('r') | KeyCode::Char('R') => Some(GameKey::Restart),
            _ => None,
        }
    }
}

#[derive(Default)]
struct PortState {
    pressed: HashMap<GameKey, bool>,
    hits: Vec<GameKey>,
}

#[derive(Default)]
struct Bus {
    next_id: u64,
    ports: Vec<(u64, Rc<RefCell<PortState>>)>,
}

/// The shared, process-wide input source. The terminal event pump feeds it;
/// sessions attach `InputPort`s to observe it. Cloning shares the bus.
#[derive(Clone, Default)]
pub struct InputBus {
    inner: Rc<RefCell<Bus>>,
}

impl InputBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire a port. The port stops observing the bus when released
    /// (or dropped), so a torn-down session cannot see later events.
    pub fn attach(&self) -> InputPort {
        let mut bus = self.inner.borrow_mut();
        bus.next_id += 1;
        let id = bus.next_id;
        let state = Rc::new(RefCell::new(PortState::default()));
        bus.ports.push((id, state.clone()));
        InputPort {
            id,
            bus: self.inner.clone(),
            state,
            released: false,
        }
    }

    pub fn key_down(&self, key: GameKey) {
        for (_, state) in &self.inner.borrow().ports {
            let mut state = state.borrow_mut();
            state.pressed.insert(key, true);
            if state.hits.len() < MAX_PENDING_HITS {
                state.hits.push(key);
            }
        }
    }

    pub fn key_up(&self, key: GameKey) {
        for (_, state) in &self.inner.borrow().ports {
            state.borrow_mut().pressed.insert(key, false);
        }
    }

    #[cfg(test)]
    fn port_count(&self) -> usize {
        self.inner.borrow().ports.len()
    }
}

/// A session's view of the bus: a last-known pressed-state map sampled once
/// per update tick, plus a drainable queue of discrete key hits for
/// edge-triggered actions.
pub struct InputPort {
    id: u64,
    bus: Rc<RefCell<Bus>>,
    state: Rc<RefCell<PortState>>,
    released: bool,
}

impl InputPort {
    pub fn is_pressed(&self, key: GameKey) -> bool {
        !self.released && self.state.borrow().pressed.get(&key).copied().unwrap_or(false)
    }

    /// Drain the key hits received since the last tick.
    pub fn take_hits(&mut self) -> Vec<GameKey> {
        if self.released {
            return Vec::new();
        }
        std::mem::take(&mut self.state.borrow_mut().hits)
    }

    /// Detach from the bus. Idempotent.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.bus.borrow_mut().ports.retain(|(id, _)| *id != self.id);
        let mut state = self.state.borrow_mut();
        state.pressed.clear();
        state.hits.clear();
    }
}

impl Drop for InputPort {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pressed_state_tracks_down_and_up() {
        let bus = InputBus::new();
        let port = bus.attach();
        assert!(!port.is_pressed(GameKey::Up));
        bus.key_down(GameKey::Up);
        assert!(port.is_pressed(GameKey::Up));
        bus.key_up(GameKey::Up);
        assert!(!port.is_pressed(GameKey::Up));
    }

    #[test]
    fn hits_drain_once() {
        let bus = InputBus::new();
        let mut port = bus.attach();
        bus.key_down(GameKey::Lane(2));
        bus.key_down(GameKey::Left);
        assert_eq!(port.take_hits(), vec![GameKey::Lane(2), GameKey::Left]);
        assert!(port.take_hits().is_empty());
    }

    #[test]
    fn ports_are_independent() {
        let bus = InputBus::new();
        let mut first = bus.attach();
        bus.key_down(GameKey::Down);
        let second = bus.attach();
        assert_eq!(first.take_hits(), vec![GameKey::Down]);
        // A port only sees events from after it attached.
        assert!(!second.is_pressed(GameKey::Down));
    }

    #[test]
    fn released_port_sees_nothing() {
        let bus = InputBus::new();
        let mut port = bus.attach();
        port.release();
        port.release(); // idempotent
        bus.key_down(GameKey::Up);
        assert!(!port.is_pressed(GameKey::Up));
        assert!(port.take_hits().is_empty());
        assert_eq!(bus.port_count(), 0);
    }

    #[test]
    fn dropping_a_port_detaches_it() {
        let bus = InputBus::new();
        {
            let _port = bus.attach();
            assert_eq!(bus.port_count(), 1);
        }
        assert_eq!(bus.port_count(), 0);
    }

    #[test]
    fn hit_queue_is_bounded() {
        let bus = InputBus::new();
        let mut port = bus.attach();
        for _ in 0..100 {
            bus.key_down(GameKey::Up);
        }
        assert_eq!(port.take_hits().len(), MAX_PENDING_HITS);
    }

    #[test]
    fn lane_keys_map_to_lane_indices() {
        assert_eq!(GameKey::from_key_code(KeyCode::Char('1')), Some(GameKey::Lane(0)));
        assert_eq!(GameKey::from_key_code(KeyCode::Char('5')), Some(GameKey::Lane(4)));
        assert_eq!(GameKey::from_key_code(KeyCode::Char('6')), None);
        assert_eq!(GameKey::from_key_code(KeyCode::Esc), None);
    }
}
