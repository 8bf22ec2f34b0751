//! The fixed-size parse worker pool.
//!
//! Workers pull whole `(path, source)` packages off a shared queue guarded
//! by a mutex and condition variable, run the external parser plus the AST
//! importer, and deliver the arena through a per-job channel. A stop flag
//! with acquire/release ordering terminates the workers between packages;
//! in-flight packages run to completion.

use crate::parser::{ParseError, ParserBackend};
use nodelint_ast::{AstArena, NodeId, import_babel_ast};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use tracing::debug;

/// A parsed module ready to become a `Module`.
#[derive(Debug)]
pub struct ParsedAst {
    pub arena: AstArena,
    pub root: NodeId,
}

struct ParseJob {
    path: PathBuf,
    source: String,
    reply: mpsc::Sender<Result<ParsedAst, ParseError>>,
}

struct PoolShared {
    queue: Mutex<VecDeque<ParseJob>>,
    condvar: Condvar,
    stop: AtomicBool,
    parser: Arc<dyn ParserBackend>,
}

/// Handle to one submitted package; `wait` blocks until its worker is done.
pub struct ParseFuture {
    receiver: mpsc::Receiver<Result<ParsedAst, ParseError>>,
    path: PathBuf,
}

impl ParseFuture {
    pub fn wait(self) -> Result<ParsedAst, ParseError> {
        self.receiver
            .recv()
            .unwrap_or_else(|_| Err(ParseError::new(self.path, "parse worker disappeared")))
    }
}

pub struct ParsePool {
    shared: Arc<PoolShared>,
    workers: Vec<JoinHandle<()>>,
}

fn worker_count() -> usize {
    let cores = std::thread::available_parallelism().map_or(4, |n| n.get());
    (cores / 2).max(4)
}

fn worker_loop(shared: &PoolShared) {
    let mut queue = shared.queue.lock().expect("parse queue");
    while !shared.stop.load(Ordering::Acquire) {
        let Some(job) = queue.pop_front() else {
            queue = shared
                .condvar
                .wait(queue)
                .expect("parse queue");
            continue;
        };
        drop(queue);

        let result = shared
            .parser
            .parse(&job.path, &job.source)
            .and_then(|json| {
                import_babel_ast(&json)
                    .map(|(arena, root)| ParsedAst { arena, root })
                    .map_err(|e| ParseError::new(&job.path, e.message))
            });
        // The submitter may have given up; that is not the worker's problem.
        let _ = job.reply.send(result);

        queue = shared.queue.lock().expect("parse queue");
    }
}

impl ParsePool {
    /// Start the workers. Worker count is fixed for the pool's lifetime.
    pub fn start(parser: Arc<dyn ParserBackend>) -> Self {
        let shared = Arc::new(PoolShared {
            queue: Mutex::new(VecDeque::new()),
            condvar: Condvar::new(),
            stop: AtomicBool::new(false),
            parser,
        });
        let count = worker_count();
        debug!(workers = count, "starting parse pool");
        let workers = (0..count)
            .map(|_| {
                let shared = Arc::clone(&shared);
                std::thread::spawn(move || worker_loop(&shared))
            })
            .collect();
        ParsePool { shared, workers }
    }

    /// Queue one `(path, source)` package.
    pub fn submit(&self, path: PathBuf, source: String) -> ParseFuture {
        let (reply, receiver) = mpsc::channel();
        let job = ParseJob {
            path: path.clone(),
            source,
            reply,
        };
        self.shared
            .queue
            .lock()
            .expect("parse queue")
            .push_back(job);
        self.shared.condvar.notify_one();
        ParseFuture { receiver, path }
    }

    /// Cooperative shutdown: workers finish their in-flight package, then
    /// exit. Blocks until every worker has joined.
    pub fn stop(self) {
        self.shared.stop.store(true, Ordering::Release);
        {
            let _queue = self.shared.queue.lock().expect("parse queue");
            self.shared.condvar.notify_all();
        }
        for worker in self.workers {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::StaticParser;
    use nodelint_ast::testing as t;

    #[test]
    fn packages_parse_concurrently_and_deliver_through_futures() {
        let parser = StaticParser::new();
        for i in 0..16 {
            parser.insert(
                format!("/m{i}.js"),
                t::program(vec![t::expr_stmt(t::num(f64::from(i)))]),
            );
        }
        let pool = ParsePool::start(Arc::new(parser));

        let futures: Vec<_> = (0..16)
            .map(|i| pool.submit(PathBuf::from(format!("/m{i}.js")), String::new()))
            .collect();
        for future in futures {
            let parsed = future.wait().expect("fixture parses");
            assert!(parsed.arena.len() >= 3);
        }
        pool.stop();
    }

    #[test]
    fn parse_failures_come_back_as_errors() {
        let pool = ParsePool::start(Arc::new(StaticParser::new()));
        let future = pool.submit(PathBuf::from("/missing.js"), String::new());
        let err = future.wait().unwrap_err();
        assert!(err.message.contains("no fixture AST"));
        pool.stop();
    }

    #[test]
    fn stop_terminates_every_worker() {
        let pool = ParsePool::start(Arc::new(StaticParser::new()));
        pool.stop(); // would hang if a worker missed the flag
    }
}
