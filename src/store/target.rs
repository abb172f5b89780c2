//! Execution contexts that subscriber notifications are delivered on.

use super::error::TargetError;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::warn;

/// A unit of delivery work: one observer call with one state value.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Where a subscription's observer runs.
///
/// The store decides *whether* to deliver inside its serialized section;
/// the target only decides *where and when* the observer call runs.
/// Targets that run jobs in submission order preserve the store's state
/// order for that subscription.
pub trait DeliveryTarget: Send + Sync {
    /// Schedule a job. Targets that no longer accept work drop it.
    fn deliver(&self, job: Job);
}

impl<T: DeliveryTarget + ?Sized> DeliveryTarget for Arc<T> {
    fn deliver(&self, job: Job) {
        (**self).deliver(job);
    }
}

/// Runs the observer synchronously on the notifying thread.
///
/// This is the default target. Observers run inside the store's
/// serialized section, so they see states strictly in order and the
/// store's state is already updated when they run.
#[derive(Clone, Copy, Debug, Default)]
pub struct Immediate;

impl DeliveryTarget for Immediate {
    fn deliver(&self, job: Job) {
        job();
    }
}

/// A dedicated, named worker thread running jobs in FIFO order.
///
/// Dropping the queue stops accepting work, lets already queued jobs
/// finish, and joins the worker.
///
/// # Example
///
/// ```rust
/// use unistore::store::{DeliveryTarget, SerialQueue};
/// use std::sync::mpsc;
///
/// let queue = SerialQueue::new("ui").unwrap();
/// let (tx, rx) = mpsc::channel();
/// queue.deliver(Box::new(move || {
///     tx.send(std::thread::current().name().map(str::to_string)).unwrap();
/// }));
/// assert_eq!(rx.recv().unwrap().as_deref(), Some("ui"));
/// ```
pub struct SerialQueue {
    name: String,
    sender: Mutex<Option<Sender<Job>>>,
    worker: Option<JoinHandle<()>>,
}

impl SerialQueue {
    /// Spawn the worker thread.
    pub fn new(name: impl Into<String>) -> Result<Self, TargetError> {
        let name = name.into();
        let (sender, receiver) = mpsc::channel::<Job>();
        let worker = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                for job in receiver {
                    job();
                }
            })
            .map_err(|source| TargetError::Spawn {
                name: name.clone(),
                source,
            })?;

        Ok(Self {
            name,
            sender: Mutex::new(Some(sender)),
            worker: Some(worker),
        })
    }

    /// Name of the worker thread.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stop accepting jobs. Jobs already queued still run.
    pub fn close(&self) {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

impl DeliveryTarget for SerialQueue {
    fn deliver(&self, job: Job) {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let rejected = match sender.as_ref() {
            Some(sender) => sender.send(job).is_err(),
            None => true,
        };
        if rejected {
            warn!(target: "unistore::target", queue = %self.name, "Queue closed, dropping delivery");
        }
    }
}

impl Drop for SerialQueue {
    fn drop(&mut self) {
        self.close();
        if let Some(worker) = self.worker.take() {
            // A job may drop the last handle to its own queue.
            if worker.thread().id() != thread::current().id() {
                let _ = worker.join();
            }
        }
    }
}

/// A target backed by a closure that receives each job.
pub struct FnTarget<F> {
    schedule: F,
}

impl<F> DeliveryTarget for FnTarget<F>
where
    F: Fn(Job) + Send + Sync,
{
    fn deliver(&self, job: Job) {
        (self.schedule)(job);
    }
}

/// Build a target from a scheduling function.
///
/// # Example
///
/// ```rust
/// use unistore::store::target;
/// use unistore::store::DeliveryTarget;
///
/// // Every delivery on a fresh thread, with no ordering between them.
/// let detached = target::from_fn(|job| {
///     std::thread::spawn(job);
/// });
/// detached.deliver(Box::new(|| {}));
/// ```
pub fn from_fn<F>(schedule: F) -> FnTarget<F>
where
    F: Fn(Job) + Send + Sync,
{
    FnTarget { schedule }
}

/// Runs each delivery as a task on a tokio runtime.
///
/// Tasks are not ordered with respect to each other.
#[cfg(feature = "tokio")]
impl DeliveryTarget for tokio::runtime::Handle {
    fn deliver(&self, job: Job) {
        self.spawn(async move { job() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn immediate_runs_inline() {
        let caller = thread::current().id();
        let (tx, rx) = mpsc::channel();
        Immediate.deliver(Box::new(move || tx.send(thread::current().id()).unwrap()));
        assert_eq!(rx.try_recv().unwrap(), caller);
    }

    #[test]
    fn serial_queue_runs_in_order_on_named_thread() {
        let queue = SerialQueue::new("delivery-test").unwrap();
        let (tx, rx) = mpsc::channel();

        for i in 0..20 {
            let tx = tx.clone();
            queue.deliver(Box::new(move || {
                tx.send((i, thread::current().name().map(str::to_string)))
                    .unwrap();
            }));
        }

        let received: Vec<_> = (0..20)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        let order: Vec<i32> = received.iter().map(|(i, _)| *i).collect();

        assert_eq!(order, (0..20).collect::<Vec<_>>());
        assert!(received
            .iter()
            .all(|(_, name)| name.as_deref() == Some("delivery-test")));
        assert_eq!(queue.name(), "delivery-test");
    }

    #[test]
    fn closed_queue_drops_jobs() {
        let queue = SerialQueue::new("closed").unwrap();
        queue.close();

        let (tx, rx) = mpsc::channel::<()>();
        queue.deliver(Box::new(move || tx.send(()).unwrap()));
        drop(queue);

        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn drop_drains_queued_jobs() {
        let (tx, rx) = mpsc::channel();
        {
            let queue = SerialQueue::new("drain").unwrap();
            for i in 0..5 {
                let tx = tx.clone();
                queue.deliver(Box::new(move || tx.send(i).unwrap()));
            }
        }
        let drained: Vec<i32> = rx.try_iter().collect();
        assert_eq!(drained, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn shared_targets_deliver_through_arc() {
        let target: Arc<dyn DeliveryTarget> = Arc::new(Immediate);
        let (tx, rx) = mpsc::channel();
        Arc::clone(&target).deliver(Box::new(move || tx.send(1).unwrap()));
        assert_eq!(rx.try_recv().unwrap(), 1);
    }

    #[cfg(feature = "tokio")]
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn tokio_handle_runs_jobs_as_tasks() {
        let handle = tokio::runtime::Handle::current();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        handle.deliver(Box::new(move || tx.send(5).unwrap()));
        assert_eq!(rx.recv().await, Some(5));
    }

    #[test]
    fn fn_target_receives_jobs() {
        let (tx, rx) = mpsc::channel();
        let inline = from_fn(|job: Job| job());
        inline.deliver(Box::new(move || tx.send("ran").unwrap()));
        assert_eq!(rx.try_recv().unwrap(), "ran");
    }
}
