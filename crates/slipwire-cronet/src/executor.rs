//! The executor thread Cronet delivers callbacks on.
//!
//! Cronet does not own threads for callback delivery; the app hands it a
//! `Cronet_Executor` and every request callback arrives as a
//! `Cronet_Runnable` posted to it. This module backs that executor with
//! one OS thread draining a channel. Runnables still queued when the
//! thread stops are destroyed without running.

use std::sync::mpsc;
use std::thread;

use tracing::debug;

use crate::ffi;
use crate::types::EngineError;

/// A posted Cronet work item.
///
/// Safety: the engine hands runnables off wholesale; whichever thread
/// runs (or destroys) one has exclusive access to it.
pub(crate) struct Runnable(pub(crate) ffi::Cronet_RunnablePtr);

unsafe impl Send for Runnable {}

pub(crate) enum Job {
    /// Run one engine work item.
    Run(Runnable),
    /// Run a cleanup closure after the current work item has returned.
    Reclaim(Box<dyn FnOnce() + Send>),
    /// Stop the thread.
    Shutdown,
}

/// Single-threaded executor handed to the engine at startup.
///
/// Must outlive every request submitted against it; the engine is shut
/// down before this is dropped, so nothing posts to a stopped executor.
pub(crate) struct Executor {
    ptr: ffi::Cronet_ExecutorPtr,
    context: *mut mpsc::Sender<Job>,
    jobs: mpsc::Sender<Job>,
    worker: Option<thread::JoinHandle<()>>,
}

impl Executor {
    pub(crate) fn new() -> Result<Self, EngineError> {
        let (tx, rx) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("cronet-executor".to_string())
            .spawn(move || drain(rx))
            .map_err(|e| EngineError::Startup(format!("executor thread spawn failed: {e}")))?;

        let ptr = unsafe { ffi::Cronet_Executor_CreateWith(execute) };
        if ptr.is_null() {
            let _ = tx.send(Job::Shutdown);
            let _ = worker.join();
            return Err(EngineError::Startup(
                "Cronet_Executor_CreateWith returned null".to_string(),
            ));
        }

        // The trampoline reaches the channel through the client context.
        let context = Box::into_raw(Box::new(tx.clone()));
        unsafe { ffi::Cronet_Executor_SetClientContext(ptr, context as ffi::Cronet_ClientContext) };

        Ok(Self {
            ptr,
            context,
            jobs: tx,
            worker: Some(worker),
        })
    }

    pub(crate) fn ptr(&self) -> ffi::Cronet_ExecutorPtr {
        self.ptr
    }

    /// Sender for posting reclamation jobs behind in-flight callbacks.
    pub(crate) fn jobs(&self) -> mpsc::Sender<Job> {
        self.jobs.clone()
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        let _ = self.jobs.send(Job::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        unsafe {
            ffi::Cronet_Executor_Destroy(self.ptr);
            drop(Box::from_raw(self.context));
        }
        debug!("cronet executor stopped");
    }
}

/// `Cronet_Executor_ExecuteFunc` trampoline: queue the runnable for the
/// worker thread. Called by the engine from its network thread.
unsafe extern "C" fn execute(executor: ffi::Cronet_ExecutorPtr, runnable: ffi::Cronet_RunnablePtr) {
    let context = unsafe { ffi::Cronet_Executor_GetClientContext(executor) };
    if context.is_null() {
        unsafe { ffi::Cronet_Runnable_Destroy(runnable) };
        return;
    }
    let jobs = unsafe { &*(context as *const mpsc::Sender<Job>) };
    if jobs.send(Job::Run(Runnable(runnable))).is_err() {
        // Worker already stopped; late work is dropped unrun.
        unsafe { ffi::Cronet_Runnable_Destroy(runnable) };
    }
}

fn drain(rx: mpsc::Receiver<Job>) {
    loop {
        match rx.recv() {
            Ok(Job::Run(runnable)) => unsafe {
                ffi::Cronet_Runnable_Run(runnable.0);
                ffi::Cronet_Runnable_Destroy(runnable.0);
            },
            Ok(Job::Reclaim(cleanup)) => cleanup(),
            Ok(Job::Shutdown) | Err(_) => break,
        }
    }
    // Past this point nothing runs; queued work is destroyed, queued
    // cleanups still execute so request memory is returned.
    while let Ok(job) = rx.try_recv() {
        match job {
            Job::Run(runnable) => unsafe { ffi::Cronet_Runnable_Destroy(runnable.0) },
            Job::Reclaim(cleanup) => cleanup(),
            Job::Shutdown => {}
        }
    }
}
