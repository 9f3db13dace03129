//! Test doubles for driving forms without a UI.
//!
//! `CountingAllocator` hands out fake preview URLs and records every
//! allocation and release, so tests can check that handles are balanced.
//! `RecordingNotifier` keeps the warnings a form emits.
//!
//! # Example
//!
//! ```rust
//! use formwork::testing::{CountingAllocator, RecordingNotifier};
//! use formwork::{FieldKind, FieldSchema, Form, FormDefinition};
//!
//! let definition = FormDefinition::new(vec![FieldSchema::array(
//!     "contacts",
//!     vec![FieldSchema::new("key", FieldKind::Text).required()],
//! )]);
//! let mut form = Form::new(definition, CountingAllocator::new());
//! let notifier = RecordingNotifier::new();
//!
//! assert!(form.add_entry(&"contacts".into(), &notifier).unwrap());
//! assert!(!form.add_entry(&"contacts".into(), &notifier).unwrap());
//! assert_eq!(notifier.messages().len(), 1);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use formwork_types::{FileHandle, Notifier};

use crate::PreviewAllocator;

#[derive(Debug, Default)]
struct AllocatorLog {
    next: usize,
    live: Vec<String>,
    allocations: usize,
    releases: usize,
    double_releases: usize,
}

/// A preview allocator that counts what it does.
///
/// Clones share one log, so a test can keep a clone while the form owns
/// the others.
#[derive(Debug, Clone, Default)]
pub struct CountingAllocator {
    log: Rc<RefCell<AllocatorLog>>,
}

impl CountingAllocator {
    /// Create a new allocator with an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total handles allocated so far.
    pub fn allocations(&self) -> usize {
        self.log.borrow().allocations
    }

    /// Total handles released so far.
    pub fn releases(&self) -> usize {
        self.log.borrow().releases
    }

    /// Handles allocated and not yet released.
    pub fn outstanding(&self) -> usize {
        self.log.borrow().live.len()
    }

    /// Releases of URLs that were not live (never allocated or already released).
    pub fn double_releases(&self) -> usize {
        self.log.borrow().double_releases
    }
}

impl PreviewAllocator for CountingAllocator {
    fn allocate(&mut self, _file: &FileHandle) -> String {
        let mut log = self.log.borrow_mut();
        let url = format!("blob:formwork/{}", log.next);
        log.next += 1;
        log.allocations += 1;
        log.live.push(url.clone());
        url
    }

    fn release(&mut self, url: &str) {
        let mut log = self.log.borrow_mut();
        log.releases += 1;
        match log.live.iter().position(|u| u == url) {
            Some(pos) => {
                log.live.remove(pos);
            }
            None => log.double_releases += 1,
        }
    }
}

/// A notifier that stores every message.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    messages: Rc<RefCell<Vec<String>>>,
}

impl RecordingNotifier {
    /// Create a new notifier with no messages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages received so far, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn warn(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}
