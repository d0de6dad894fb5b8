//!
//! Thread-pool for the remote operations.
//!
//! The event loop never blocks on a remote call. A [Task] is sent to
//! the pool, a worker runs it against the [Commands] and sends back
//! a [Reply]. The event loop polls for replies with [TaskPool::try_recv].
//!
use crate::commands::{CommandError, Commands};
use crossbeam::channel::{bounded, unbounded, Receiver, SendError, Sender, TryRecvError};
use log::{debug, error};
use std::mem;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// A remote operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    Login { username: String, password: String },
    DailyLimit,
    Upload { geojson: String, mileage: f64, end_time: i64 },
}

/// Result of a remote operation.
#[derive(Debug)]
pub enum Reply {
    LoggedIn(Result<(), CommandError>),
    DailyLimit(Result<f64, CommandError>),
    Uploaded(Result<(), CommandError>),
}

impl Task {
    /// Run against the backend.
    pub fn run(self, commands: &dyn Commands) -> Reply {
        match self {
            Task::Login { username, password } => {
                Reply::LoggedIn(commands.login(&username, &password))
            }
            Task::DailyLimit => Reply::DailyLimit(commands.get_daily_limit()),
            Task::Upload {
                geojson,
                mileage,
                end_time,
            } => Reply::Uploaded(commands.upload(&geojson, mileage, end_time)),
        }
    }

    /// Reply with an error.
    pub fn fail(&self, err: CommandError) -> Reply {
        match self {
            Task::Login { .. } => Reply::LoggedIn(Err(err)),
            Task::DailyLimit => Reply::DailyLimit(Err(err)),
            Task::Upload { .. } => Reply::Uploaded(Err(err)),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Task::Login { .. } => "login",
            Task::DailyLimit => "getDailyLimit",
            Task::Upload { .. } => "upload",
        }
    }
}

/// Something that accepts tasks.
///
/// The screens only need this, which keeps them testable
/// without threads.
pub trait Spawn {
    fn spawn(&self, task: Task) -> Result<(), SendError<()>>;
}

/// Basic thread-pool.
#[derive(Debug)]
pub struct TaskPool {
    send: Sender<Task>,
    recv: Receiver<Reply>,
    handles: Vec<JoinHandle<()>>,
}

impl TaskPool {
    /// New thread-pool with n workers.
    pub fn new(commands: Arc<dyn Commands>, n_worker: usize) -> Self {
        let (send, t_recv) = unbounded::<Task>();
        let (t_send, recv) = unbounded::<Reply>();

        let mut handles = Vec::new();
        for _ in 0..n_worker {
            let t_recv = t_recv.clone();
            let t_send = t_send.clone();
            let commands = commands.clone();

            let handle = thread::spawn(move || {
                'l: loop {
                    match t_recv.recv() {
                        Ok(task) => {
                            debug!("task {}", task.name());
                            let fallback = task.clone();
                            let reply = match catch_unwind(AssertUnwindSafe(|| {
                                task.run(commands.as_ref())
                            })) {
                                Ok(v) => v,
                                Err(_) => {
                                    error!("task {} panicked", fallback.name());
                                    fallback.fail(CommandError::Backend("internal error".into()))
                                }
                            };
                            if let Err(err) = t_send.send(reply) {
                                debug!("{:?}", err);
                                break 'l;
                            }
                        }
                        Err(err) => {
                            debug!("{:?}", err);
                            break 'l;
                        }
                    }
                }
            });
            handles.push(handle);
        }

        Self {
            send,
            recv,
            handles,
        }
    }

    /// Check the workers for liveness.
    pub fn check_liveness(&self) -> bool {
        self.handles.iter().all(|h| !h.is_finished())
    }

    /// Receive a reply if there is one.
    pub fn try_recv(&self) -> Option<Reply> {
        match self.recv.try_recv() {
            Ok(v) => Some(v),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => None,
        }
    }
}

impl Spawn for TaskPool {
    fn spawn(&self, task: Task) -> Result<(), SendError<()>> {
        if self.handles.is_empty() {
            return Err(SendError(()));
        }
        self.send.send(task).map_err(|_| SendError(()))
    }
}

impl Drop for TaskPool {
    fn drop(&mut self) {
        // dropping the channel will be noticed by the workers.
        drop(mem::replace(&mut self.send, bounded(0).0));
        for h in self.handles.drain(..) {
            _ = h.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[derive(Debug)]
    struct Flaky;

    impl Commands for Flaky {
        fn login(&self, username: &str, _password: &str) -> Result<(), CommandError> {
            if username == "panic" {
                panic!("boom");
            }
            Ok(())
        }

        fn get_daily_limit(&self) -> Result<f64, CommandError> {
            Ok(7.5)
        }

        fn upload(&self, _geojson: &str, _mileage: f64, _end_time: i64) -> Result<(), CommandError> {
            Err(CommandError::Backend("offline".into()))
        }
    }

    fn wait(pool: &TaskPool) -> Reply {
        let start = Instant::now();
        loop {
            if let Some(r) = pool.try_recv() {
                return r;
            }
            assert!(start.elapsed() < Duration::from_secs(5));
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_pool() {
        let pool = TaskPool::new(Arc::new(Flaky), 1);
        assert!(pool.try_recv().is_none());

        pool.spawn(Task::DailyLimit).unwrap();
        assert!(matches!(wait(&pool), Reply::DailyLimit(Ok(v)) if v == 7.5));

        pool.spawn(Task::Upload {
            geojson: String::new(),
            mileage: 1.0,
            end_time: 0,
        })
        .unwrap();
        assert!(matches!(wait(&pool), Reply::Uploaded(Err(_))));
    }

    #[test]
    fn test_panic() {
        let pool = TaskPool::new(Arc::new(Flaky), 1);
        pool.spawn(Task::Login {
            username: "panic".into(),
            password: "x".into(),
        })
        .unwrap();
        assert!(matches!(
            wait(&pool),
            Reply::LoggedIn(Err(CommandError::Backend(_)))
        ));
        assert!(pool.check_liveness());
    }
}
