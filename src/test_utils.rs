//! # Test Utilities Module
//!
//! A scripted in-process driver that follows the native contract to the
//! letter, so the connection, executor and decoder can be tested against
//! exact native behaviour: which calls were made, in what order, and how many
//! times handles were released.

use crate::core::db::driver::{Driver, NativeResult, RawRow};
use crate::core::db::field::FieldDescriptor;
use crate::core::db::options::ConnectParams;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// A row as the fake connector stores it.
#[derive(Debug, Clone)]
pub struct ScriptedRow {
    values: Vec<Option<Vec<u8>>>,
    lengths: Vec<u64>,
}

impl ScriptedRow {
    /// A row with explicit lengths, which may disagree with the buffers.
    pub fn new(values: Vec<Option<Vec<u8>>>, lengths: Vec<u64>) -> Self {
        ScriptedRow { values, lengths }
    }

    /// A well-formed row whose lengths match its buffers.
    pub fn values(values: Vec<Option<Vec<u8>>>) -> Self {
        let lengths = values
            .iter()
            .map(|value| value.as_ref().map_or(0, |bytes| bytes.len() as u64))
            .collect();
        ScriptedRow { values, lengths }
    }
}

/// A stored result that counts how often it is freed.
#[derive(Debug)]
pub struct ScriptedResult {
    fields: Vec<FieldDescriptor>,
    rows: VecDeque<ScriptedRow>,
    current: Option<ScriptedRow>,
    reaches_eof: bool,
    exhausted: bool,
    frees: Rc<Cell<usize>>,
}

impl ScriptedResult {
    pub fn new(
        fields: Vec<FieldDescriptor>,
        rows: Vec<ScriptedRow>,
        frees: Rc<Cell<usize>>,
    ) -> Self {
        ScriptedResult {
            fields,
            rows: rows.into(),
            current: None,
            reaches_eof: true,
            exhausted: false,
            frees,
        }
    }

    /// Simulates a read failure: the fetch loop ends but eof stays unset.
    pub fn without_eof(mut self) -> Self {
        self.reaches_eof = false;
        self
    }
}

impl NativeResult for ScriptedResult {
    fn num_fields(&self) -> usize {
        self.fields.len()
    }

    fn fetch_field(&self, index: usize) -> FieldDescriptor {
        self.fields[index].clone()
    }

    fn fetch_row(&mut self) -> Option<RawRow<'_>> {
        self.current = self.rows.pop_front();
        match &self.current {
            Some(row) => Some(RawRow::new(
                row.values.iter().map(|value| value.as_deref()).collect(),
                row.lengths.clone(),
            )),
            None => {
                self.exhausted = true;
                None
            }
        }
    }

    fn eof(&self) -> bool {
        self.exhausted && self.reaches_eof
    }
}

impl Drop for ScriptedResult {
    fn drop(&mut self) {
        self.frees.set(self.frees.get() + 1);
    }
}

/// What the fake connector does for one exec call.
#[derive(Debug)]
pub enum ExecOutcome {
    /// Exec fails with this code and message
    Fail(u32, &'static str),
    /// Exec succeeds and buffers a result
    Rows {
        fields: Vec<FieldDescriptor>,
        rows: Vec<ScriptedRow>,
        reaches_eof: bool,
    },
    /// Exec succeeds, store-result yields nothing, field count as given
    NoResult { field_count: u32 },
}

impl ExecOutcome {
    pub fn rows(fields: Vec<FieldDescriptor>, rows: Vec<ScriptedRow>) -> Self {
        ExecOutcome::Rows { fields, rows, reaches_eof: true }
    }
}

/// Instructions and counters for the next `ScriptedDriver::init` on this thread.
#[derive(Debug, Default)]
pub struct Script {
    pub init_fails: bool,
    pub connect_error: Option<(u32, &'static str)>,
    pub admin_error: Option<(u32, &'static str)>,
    pub exec: VecDeque<ExecOutcome>,
    pub host_info: Option<String>,
    pub closes: Rc<Cell<usize>>,
    pub frees: Rc<Cell<usize>>,
    pub calls: Rc<RefCell<Vec<String>>>,
}

impl Script {
    pub fn new() -> Self {
        Script::default()
    }

    pub fn exec(mut self, outcome: ExecOutcome) -> Self {
        self.exec.push_back(outcome);
        self
    }

    /// Makes this script the one the next `init` on this thread picks up.
    pub fn install(self) -> ScriptTally {
        let tally = ScriptTally {
            closes: self.closes.clone(),
            frees: self.frees.clone(),
            calls: self.calls.clone(),
        };
        SCRIPT.with(|slot| *slot.borrow_mut() = Some(self));
        tally
    }
}

/// Shared counters that outlive the driver.
#[derive(Debug, Clone)]
pub struct ScriptTally {
    pub closes: Rc<Cell<usize>>,
    pub frees: Rc<Cell<usize>>,
    pub calls: Rc<RefCell<Vec<String>>>,
}

impl ScriptTally {
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

thread_local! {
    static SCRIPT: RefCell<Option<Script>> = RefCell::new(None);
}

/// A fake native connection driven by a [`Script`].
#[derive(Debug)]
pub struct ScriptedDriver {
    script: Script,
    errno: u32,
    error: Option<String>,
    field_count: u32,
    pending: Option<ScriptedResult>,
}

impl ScriptedDriver {
    fn record(&self, call: &str) {
        self.script.calls.borrow_mut().push(call.to_string());
    }

    fn set_error(&mut self, failure: Option<(u32, &'static str)>) -> bool {
        match failure {
            Some((code, message)) => {
                self.errno = code;
                self.error = Some(message.to_string());
                false
            }
            None => {
                self.errno = 0;
                self.error = None;
                true
            }
        }
    }
}

impl Driver for ScriptedDriver {
    type Stored<'conn> = ScriptedResult;

    fn init() -> Option<Self> {
        let script = SCRIPT.with(|slot| slot.borrow_mut().take()).unwrap_or_default();
        if script.init_fails {
            return None;
        }
        Some(ScriptedDriver {
            script,
            errno: 0,
            error: None,
            field_count: 0,
            pending: None,
        })
    }

    fn real_connect(&mut self, params: &ConnectParams<'_>) -> bool {
        self.record(&format!("connect {}@{}:{}", params.user, params.host, params.port));
        let failure = self.script.connect_error;
        self.set_error(failure)
    }

    fn select_db(&mut self, name: &str) -> bool {
        self.record(&format!("select_db {}", name));
        let failure = self.script.admin_error;
        self.set_error(failure)
    }

    fn create_db(&mut self, name: &str) -> bool {
        self.record(&format!("create_db {}", name));
        let failure = self.script.admin_error;
        self.set_error(failure)
    }

    fn drop_db(&mut self, name: &str) -> bool {
        self.record(&format!("drop_db {}", name));
        let failure = self.script.admin_error;
        self.set_error(failure)
    }

    fn exec_sql(&mut self, sql: &str) -> bool {
        self.record(&format!("exec {}", sql));
        self.pending = None;
        match self.script.exec.pop_front() {
            Some(ExecOutcome::Fail(code, message)) => self.set_error(Some((code, message))),
            Some(ExecOutcome::Rows { fields, rows, reaches_eof }) => {
                self.field_count = fields.len() as u32;
                let result = ScriptedResult::new(fields, rows, self.script.frees.clone());
                self.pending = Some(if reaches_eof { result } else { result.without_eof() });
                self.set_error(None)
            }
            Some(ExecOutcome::NoResult { field_count }) => {
                self.field_count = field_count;
                self.set_error(None)
            }
            None => {
                self.field_count = 0;
                self.set_error(None)
            }
        }
    }

    fn store_result(&mut self) -> Option<Self::Stored<'_>> {
        self.record("store_result");
        self.pending.take()
    }

    fn field_count(&self) -> u32 {
        self.record("field_count");
        self.field_count
    }

    fn errno(&self) -> u32 {
        self.errno
    }

    fn error(&self) -> Option<String> {
        self.error.clone()
    }

    fn host_info(&self) -> Option<String> {
        self.script.host_info.clone()
    }

    fn close(&mut self) {
        self.record("close");
        self.script.closes.set(self.script.closes.get() + 1);
    }

    fn client_info() -> Option<String> {
        Some("scripted 1.0".to_string())
    }

    fn client_version() -> u64 {
        10000
    }
}

#[macro_export]
macro_rules! assert_bridge_error {
    ($result:expr, $expected:ident, $context:expr) => {
        match $result {
            Err($crate::core::BridgeError::$expected { .. }) => {}
            Ok(_) => panic!("Expected {} error but got Ok in {}", stringify!($expected), $context),
            Err(other) => panic!(
                "Expected {} but got {:?} in {}",
                stringify!($expected),
                other,
                $context
            ),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_is_consumed_by_init() {
        let tally = Script::new().install();
        let mut driver = ScriptedDriver::init().unwrap();
        driver.close();
        assert_eq!(tally.closes.get(), 1);

        // a second init on this thread falls back to the default script
        assert!(ScriptedDriver::init().is_some());
    }

    #[test]
    fn test_failing_init() {
        Script { init_fails: true, ..Script::default() }.install();
        assert!(ScriptedDriver::init().is_none());
    }
}
