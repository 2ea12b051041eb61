//! Wall-clock spans recorded into a `RuntimeRecord`.

use std::time::Instant;

use tracing::{debug, warn};

use crate::core::RuntimeRecord;

/// Anything that owns a `RuntimeRecord` can time named blocks of work.
///
/// The duration is recorded whether the block returns `Ok` or `Err`. Spans nest:
/// an outer span measures its own wall time and is stored next to the inner
/// ones, never derived from them.
pub trait Timed {
    fn runtimes_mut(&mut self) -> &mut RuntimeRecord;

    fn timed<T>(&mut self, name: &str, f: impl FnOnce(&mut Self) -> T) -> T
    where
        Self: Sized,
    {
        let start = Instant::now();
        let out = f(self);
        let secs = start.elapsed().as_secs_f64();
        record_span(self.runtimes_mut(), name, secs);
        out
    }
}

impl Timed for RuntimeRecord {
    fn runtimes_mut(&mut self) -> &mut RuntimeRecord {
        self
    }
}

fn record_span(runtimes: &mut RuntimeRecord, name: &str, secs: f64) {
    debug!(stage = name, secs, "span finished");
    if let Some(previous) = runtimes.record(name, secs) {
        warn!(stage = name, previous, secs, "stage timed twice, earlier duration replaced");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_timed_records_duration() {
        let mut rt = RuntimeRecord::new();
        let v = rt.timed("sleep", |_| {
            std::thread::sleep(Duration::from_millis(20));
            7
        });
        assert_eq!(v, 7);
        assert!(rt.get("sleep").unwrap() >= 0.02);
    }

    #[test]
    fn test_timed_records_on_error() {
        let mut rt = RuntimeRecord::new();
        let res: Result<(), &str> = rt.timed("broken", |_| Err("boom"));
        assert!(res.is_err());
        assert!(rt.get("broken").unwrap() >= 0.0);
    }

    #[test]
    fn test_nested_spans_are_independent() {
        let mut rt = RuntimeRecord::new();
        rt.timed("outer", |rt| {
            rt.timed("a", |_| std::thread::sleep(Duration::from_millis(5)));
            rt.timed("b", |_| std::thread::sleep(Duration::from_millis(5)));
            std::thread::sleep(Duration::from_millis(10));
        });
        let names: Vec<_> = rt.names().collect();
        assert_eq!(names, vec!["a", "b", "outer"]);
        let inner = rt.get("a").unwrap() + rt.get("b").unwrap();
        assert!(rt.get("outer").unwrap() > inner);
    }
}
