use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::descriptor::ConnectionDescriptor;
use crate::driver::Driver;
use crate::error::DriverError;
use crate::types::{SqlType, SqlValue, TypeParserRegistry};

/// Scripted driver used by lifecycle tests. Failure outcomes are queued in
/// FIFO order; an empty queue means success.
#[derive(Default)]
pub(crate) struct MockDriver {
    open_failures: Mutex<VecDeque<DriverError>>,
    probe_failures: Mutex<VecDeque<DriverError>>,
    pub(crate) opened: AtomicUsize,
    pub(crate) probed: AtomicUsize,
    pub(crate) closed: AtomicUsize,
    pub(crate) last_descriptor: Mutex<Option<ConnectionDescriptor>>,
    pub(crate) last_probe: Mutex<Vec<SqlValue>>,
}

pub(crate) struct MockConnection;

impl MockDriver {
    pub(crate) fn healthy() -> Self {
        Self::default()
    }

    pub(crate) fn fail_open(self, err: DriverError) -> Self {
        self.open_failures.lock().unwrap().push_back(err);
        self
    }

    pub(crate) fn fail_probe(self, err: DriverError) -> Self {
        self.probe_failures.lock().unwrap().push_back(err);
        self
    }
}

#[async_trait]
impl Driver for MockDriver {
    type Connection = MockConnection;

    async fn open(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> Result<MockConnection, DriverError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        *self.last_descriptor.lock().unwrap() = Some(descriptor.clone());
        match self.open_failures.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(MockConnection),
        }
    }

    async fn probe(
        &self,
        _conn: &mut MockConnection,
        _statement: &str,
        parsers: &TypeParserRegistry,
    ) -> Result<Vec<SqlValue>, DriverError> {
        self.probed.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.probe_failures.lock().unwrap().pop_front() {
            return Err(err);
        }

        // the scripted probe row is a single int column with raw text "1"
        let value = parsers
            .parse(SqlType::Int, "1")
            .unwrap_or(SqlValue::Int(1));
        *self.last_probe.lock().unwrap() = vec![value.clone()];
        Ok(vec![value])
    }

    async fn close(&self, _conn: MockConnection) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}
