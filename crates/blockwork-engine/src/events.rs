//! Per-block event channel.
//!
//! Listeners run synchronously inside `set_data` and `submit`. A `PreSetData`
//! listener may replace the incoming data or restructure the block's children,
//! but must not bind data on the same block again.

use std::fmt;
use std::rc::Rc;

use crate::block::Block;
use crate::error::BlockError;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockEvents {
    /// Before data is bound. The event data is the incoming model data.
    PreSetData,
    /// After data is bound and children are synchronized.
    PostSetData,
    /// Before a submitted value is processed. The event data is the raw value.
    PreSubmit,
    /// After the view data was reverse transformed. The event data is normalized.
    Submit,
    /// After submission finished.
    PostSubmit,
}

pub struct BlockEvent {
    block: Block,
    data: Value,
    propagation_stopped: bool,
}

impl BlockEvent {
    pub fn new(block: Block, data: Value) -> Self {
        Self {
            block,
            data,
            propagation_stopped: false,
        }
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn set_data(&mut self, data: Value) {
        self.data = data;
    }

    pub fn into_data(self) -> Value {
        self.data
    }

    /// Listeners with a lower priority are not called for this event.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

pub type Listener = Rc<dyn Fn(&mut BlockEvent) -> Result<(), BlockError>>;

/// A listener bundle registered as a unit.
pub trait EventSubscriber {
    /// Events to listen to, with their priority.
    fn subscribed_events(&self) -> Vec<(BlockEvents, i32)>;

    fn handle(&self, kind: BlockEvents, event: &mut BlockEvent) -> Result<(), BlockError>;
}

struct Registration {
    event: BlockEvents,
    priority: i32,
    listener: Listener,
}

#[derive(Clone, Default)]
pub struct EventDispatcher {
    // Sorted by descending priority, registration order within a priority
    listeners: Vec<Rc<Registration>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener<F>(&mut self, event: BlockEvents, priority: i32, listener: F)
    where
        F: Fn(&mut BlockEvent) -> Result<(), BlockError> + 'static,
    {
        self.register(event, priority, Rc::new(listener));
    }

    pub fn add_subscriber(&mut self, subscriber: Rc<dyn EventSubscriber>) {
        for (event, priority) in subscriber.subscribed_events() {
            let subscriber = Rc::clone(&subscriber);
            self.register(
                event,
                priority,
                Rc::new(move |e: &mut BlockEvent| subscriber.handle(event, e)),
            );
        }
    }

    pub fn has_listeners(&self, event: BlockEvents) -> bool {
        self.listeners.iter().any(|r| r.event == event)
    }

    pub fn dispatch(&self, event: BlockEvents, payload: &mut BlockEvent) -> Result<(), BlockError> {
        for registration in self.listeners.iter().filter(|r| r.event == event) {
            if payload.is_propagation_stopped() {
                break;
            }
            (registration.listener)(payload)?;
        }
        Ok(())
    }

    fn register(&mut self, event: BlockEvents, priority: i32, listener: Listener) {
        let position = self
            .listeners
            .iter()
            .position(|r| r.priority < priority)
            .unwrap_or(self.listeners.len());
        self.listeners.insert(
            position,
            Rc::new(Registration {
                event,
                priority,
                listener,
            }),
        );
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let events: Vec<_> = self
            .listeners
            .iter()
            .map(|r| (r.event, r.priority))
            .collect();
        f.debug_struct("EventDispatcher")
            .field("listeners", &events)
            .finish()
    }
}
