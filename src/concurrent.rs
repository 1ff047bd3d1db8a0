use tokio::sync::Semaphore;
use tokio::task::{AbortHandle, JoinSet};
use std::future::Future;
use std::sync::Arc;

/// Bounded fan-out for non-blocking network probes.
///
/// Every submitted task runs to completion (or panics) before `execute` returns,
/// so a stage never hands partial results downstream. Dropping the `execute`
/// future aborts whatever is still running.
pub struct ConcurrentProbe {
    semaphore: Arc<Semaphore>,
}

impl ConcurrentProbe {
    pub fn new(concurrency: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// Execute multiple tasks concurrently with semaphore-based admission.
    /// Results come back in completion order; a panicked task yields `None`.
    pub async fn execute<T, F, Fut>(
        &self,
        tasks: Vec<T>,
        task_fn: F,
    ) -> Vec<Option<Fut::Output>>
    where
        F: Fn(T) -> Fut + Clone + Send + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
        T: Send + 'static,
    {
        let mut set = JoinSet::new();

        for task in tasks {
            let semaphore = self.semaphore.clone();
            let task_fn = task_fn.clone();

            set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok()?;
                Some(task_fn(task).await)
            });
        }

        let mut results = Vec::with_capacity(set.len());
        while let Some(joined) = set.join_next().await {
            results.push(joined.ok().flatten());
        }
        results
    }
}

/// Bounded pool for the external-tool work (port scans, WHOIS, screenshots).
///
/// At most `workers` jobs run at once across every clone of the pool. Excess jobs
/// wait for a permit; there is no queue limit. Jobs live in a `JoinSet`, so the
/// owner going away aborts queued and running jobs alike.
#[derive(Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            permits: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Queue a job tracked by `set`, so a caller can drain or abort a batch of jobs.
    /// The job yields `None` if it panicked.
    pub fn submit_into<F, R>(&self, set: &mut JoinSet<Option<R>>, job: F) -> AbortHandle
    where
        F: Future<Output = R> + Send + 'static,
        R: Send + 'static,
    {
        set.spawn(Self::admit(self.permits.clone(), job))
    }

    async fn admit<F, R>(permits: Arc<Semaphore>, job: F) -> Option<R>
    where
        F: Future<Output = R> + Send + 'static,
        R: Send + 'static,
    {
        let _permit = permits.acquire_owned().await.ok()?;
        Some(job.await)
    }

    /// Run one job under a permit and wait for it.
    pub async fn run<F, R>(&self, job: F) -> Option<R>
    where
        F: Future<Output = R> + Send + 'static,
        R: Send + 'static,
    {
        let mut set = JoinSet::new();
        self.submit_into(&mut set, job);
        set.join_next().await.and_then(|joined| joined.ok().flatten())
    }

    /// Submit every job and wait for all of them. Output order matches input order.
    pub async fn run_all<F, R>(&self, jobs: Vec<F>) -> Vec<Option<R>>
    where
        F: Future<Output = R> + Send + 'static,
        R: Send + 'static,
    {
        let mut results: Vec<Option<R>> = (0..jobs.len()).map(|_| None).collect();
        let mut set = JoinSet::new();
        for (index, job) in jobs.into_iter().enumerate() {
            self.submit_into(&mut set, async move { (index, job.await) });
        }
        while let Some(joined) = set.join_next().await {
            if let Ok(Some((index, output))) = joined {
                results[index] = Some(output);
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn probe_waits_for_every_task() {
        let probe = ConcurrentProbe::new(3);
        let results = probe
            .execute((0..20).collect(), |n: u64| async move {
                tokio::time::sleep(Duration::from_millis(n % 4)).await;
                n * 2
            })
            .await;
        assert_eq!(results.len(), 20);
        let mut values: Vec<u64> = results.into_iter().flatten().collect();
        values.sort();
        assert_eq!(values, (0..20).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn pool_never_exceeds_worker_count() {
        let pool = WorkerPool::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let jobs: Vec<_> = (0..8)
            .map(|i| {
                let running = running.clone();
                let peak = peak.clone();
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    i
                }
            })
            .collect();

        let results = pool.run_all(jobs).await;
        assert_eq!(results, (0..8).map(Some).collect::<Vec<_>>());
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    async fn scan_job(n: u8) -> u8 {
        if n == 0 {
            panic!("scanner crashed");
        }
        n
    }

    #[tokio::test]
    async fn panicking_job_yields_none() {
        let pool = WorkerPool::new(1);
        let results = pool.run_all(vec![scan_job(1), scan_job(0)]).await;
        assert_eq!(results, vec![Some(1), None]);
    }

    #[tokio::test]
    async fn tracked_jobs_can_be_drained() {
        let pool = WorkerPool::new(2);
        let mut set = JoinSet::new();
        for i in 0..5u32 {
            pool.submit_into(&mut set, async move { i * 10 });
        }
        let mut seen = Vec::new();
        while let Some(joined) = set.join_next().await {
            seen.extend(joined.ok().flatten());
        }
        seen.sort();
        assert_eq!(seen, vec![0, 10, 20, 30, 40]);
    }

    #[tokio::test]
    async fn dropping_run_all_abandons_running_and_queued_jobs() {
        struct CountDrop(Arc<AtomicUsize>);
        impl Drop for CountDrop {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let pool = WorkerPool::new(1);
        let dropped = Arc::new(AtomicUsize::new(0));
        let started = Arc::new(AtomicUsize::new(0));
        let jobs: Vec<_> = (0..3)
            .map(|_| {
                let guard = CountDrop(dropped.clone());
                let started = started.clone();
                async move {
                    let _guard = guard;
                    started.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_secs(30)).await;
                }
            })
            .collect();

        let cut = tokio::time::timeout(Duration::from_millis(50), pool.run_all(jobs)).await;
        assert!(cut.is_err());
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert_eq!(dropped.load(Ordering::SeqCst), 3);
        // the permit went back with the aborted job
        assert_eq!(pool.run(async { 7 }).await, Some(7));
    }

    #[test]
    fn zero_workers_still_admits_one() {
        assert_eq!(WorkerPool::new(0).workers(), 1);
    }
}
