use tracing::debug;

use crate::app::state::{reducer, Action, AppState};

pub type Listener = Box<dyn Fn(&AppState, &Action) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

pub struct Store {
    state: AppState,
    listeners: Vec<(Subscription, Listener)>,
    next_id: u64,
}

impl Store {
    pub fn new(initial: AppState) -> Self {
        Store {
            state: initial,
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn dispatch(&mut self, action: Action) {
        let previous = std::mem::take(&mut self.state);
        self.state = reducer(previous, &action);
        debug!(
            action = action.kind(),
            loading = self.state.loading,
            history = self.state.history.len(),
            "Dispatched action"
        );
        for (_, listener) in &self.listeners {
            listener(&self.state, &action);
        }
    }

    pub fn subscribe(&mut self, listener: impl Fn(&AppState, &Action) + Send + 'static) -> Subscription {
        let subscription = Subscription(self.next_id);
        self.next_id += 1;
        self.listeners.push((subscription, Box::new(listener)));
        subscription
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(id, _)| *id != subscription);
        self.listeners.len() != before
    }
}

impl Default for Store {
    fn default() -> Self {
        Store::new(AppState::default())
    }
}
