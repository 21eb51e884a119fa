//! Safe Rust wrapper around the Cronet C API.
//!
//! With the `link-cronet` feature enabled, this crate links against
//! `libcronet` (search path taken from `CRONET_DIR`) and drives real
//! network requests. Without it, the crate still compiles everywhere and
//! `Engine::new` returns `EngineError::NotAvailable`, so dependent crates
//! can build and test against their own engine implementations.
//!
//! One [`Engine`] owns one native engine and one executor thread. Every
//! callback for every request runs on that thread; submission and
//! cancellation may come from any thread.

pub mod ffi;
pub mod types;

#[cfg(feature = "link-cronet")]
mod executor;

pub use types::{
    EngineConfig, EngineError, RedirectAction, RequestCallbacks, RequestSpec, ResponseHead,
};

#[cfg(feature = "link-cronet")]
use std::collections::HashMap;
#[cfg(feature = "link-cronet")]
use std::ffi::{CStr, CString};
#[cfg(feature = "link-cronet")]
use std::sync::atomic::{AtomicU64, Ordering};
#[cfg(feature = "link-cronet")]
use std::sync::mpsc;
#[cfg(feature = "link-cronet")]
use std::sync::{Arc, Mutex};
#[cfg(feature = "link-cronet")]
use std::time::{Duration, Instant};

#[cfg(feature = "link-cronet")]
use tracing::{debug, info, trace, warn};

/// Response body read granularity.
#[cfg(feature = "link-cronet")]
const READ_BUFFER_SIZE: u64 = 32 * 1024;

/// How long `Engine::drop` waits for cancelled requests to finish their
/// callback sequences before shutting down anyway.
#[cfg(feature = "link-cronet")]
const DRAIN_ON_DROP: Duration = Duration::from_secs(2);

/// A live native request, cancellable from any thread.
///
/// Safety: `Cronet_UrlRequest_Cancel` is thread-safe; destruction only
/// happens on the executor thread after the terminal callback.
#[cfg(feature = "link-cronet")]
struct LiveRequest(ffi::Cronet_UrlRequestPtr);

#[cfg(feature = "link-cronet")]
unsafe impl Send for LiveRequest {}

#[cfg(feature = "link-cronet")]
type LiveTable = Mutex<HashMap<u64, LiveRequest>>;

/// Per-request state reachable from the C trampolines through the
/// request's client context. Created on submit, freed by a reclamation
/// job after the terminal callback.
#[cfg(feature = "link-cronet")]
struct RequestState {
    handle: u64,
    request: ffi::Cronet_UrlRequestPtr,
    callback: ffi::Cronet_UrlRequestCallbackPtr,
    callbacks: Box<dyn RequestCallbacks>,
    live: Arc<LiveTable>,
    jobs: mpsc::Sender<executor::Job>,
    upload: Option<UploadState>,
}

// Safety: the state is owned by the executor thread for the lifetime of
// the request; it is only sent once, into the reclamation job that frees
// it after the terminal callback has returned.
#[cfg(feature = "link-cronet")]
unsafe impl Send for RequestState {}

#[cfg(feature = "link-cronet")]
struct UploadState {
    body: Vec<u8>,
    pos: usize,
    provider: ffi::Cronet_UploadDataProviderPtr,
}

/// A running network engine.
///
/// Wraps a `Cronet_Engine` plus the executor thread its callbacks run
/// on. Shuts the native engine down and joins the executor on drop.
pub struct Engine {
    #[cfg(feature = "link-cronet")]
    engine: ffi::Cronet_EnginePtr,
    #[cfg(feature = "link-cronet")]
    live: Arc<LiveTable>,
    #[cfg(feature = "link-cronet")]
    next_handle: AtomicU64,
    // Declared last: dropped after the engine pointer work in `drop`.
    #[cfg(feature = "link-cronet")]
    executor: executor::Executor,
    #[cfg(not(feature = "link-cronet"))]
    _phantom: std::marker::PhantomData<()>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").finish_non_exhaustive()
    }
}

// Safety: the Cronet C API is thread-safe except for callback delivery,
// which stays on the executor thread. The raw pointers held here are
// only passed to those thread-safe entry points.
unsafe impl Send for Engine {}
unsafe impl Sync for Engine {}

impl Engine {
    /// Start a native engine with the given settings.
    #[cfg(feature = "link-cronet")]
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let user_agent = CString::new(config.user_agent.as_str())
            .map_err(|_| EngineError::Startup("user agent contains NUL".to_string()))?;

        let executor = executor::Executor::new()?;

        let params = unsafe { ffi::Cronet_EngineParams_Create() };
        let cache_mode = if config.enable_http_cache {
            ffi::Cronet_EngineParams_HTTP_CACHE_MODE::InMemory
        } else {
            ffi::Cronet_EngineParams_HTTP_CACHE_MODE::Disabled
        };
        unsafe {
            ffi::Cronet_EngineParams_user_agent_set(params, user_agent.as_ptr());
            ffi::Cronet_EngineParams_enable_quic_set(params, config.enable_quic);
            ffi::Cronet_EngineParams_enable_http2_set(params, config.enable_http2);
            ffi::Cronet_EngineParams_http_cache_mode_set(params, cache_mode);
        }

        let engine = unsafe { ffi::Cronet_Engine_Create() };
        if engine.is_null() {
            unsafe { ffi::Cronet_EngineParams_Destroy(params) };
            return Err(EngineError::Startup(
                "Cronet_Engine_Create returned null".to_string(),
            ));
        }
        let rc = unsafe { ffi::Cronet_Engine_StartWithParams(engine, params) };
        unsafe { ffi::Cronet_EngineParams_Destroy(params) };
        if rc != 0 {
            unsafe { ffi::Cronet_Engine_Destroy(engine) };
            return Err(EngineError::Startup(format!(
                "engine start failed (code {rc})"
            )));
        }

        let version =
            unsafe { cstr_to_string(ffi::Cronet_Engine_GetVersionString(engine)) };
        info!(%version, user_agent = %config.user_agent, "cronet engine started");

        Ok(Self {
            engine,
            live: Arc::new(Mutex::new(HashMap::new())),
            next_handle: AtomicU64::new(1),
            executor,
        })
    }

    #[cfg(not(feature = "link-cronet"))]
    pub fn new(_config: EngineConfig) -> Result<Self, EngineError> {
        Err(EngineError::NotAvailable)
    }

    /// Start one request. Returns an opaque handle usable with
    /// [`Engine::cancel`] until the terminal callback fires.
    #[cfg(feature = "link-cronet")]
    pub fn submit(
        &self,
        spec: RequestSpec,
        callbacks: Box<dyn RequestCallbacks>,
    ) -> Result<u64, EngineError> {
        let url = CString::new(spec.url.as_str())
            .map_err(|_| EngineError::Submit("url contains NUL".to_string()))?;
        let method = CString::new(spec.method.as_str())
            .map_err(|_| EngineError::Submit("method contains NUL".to_string()))?;
        let mut c_headers = Vec::with_capacity(spec.headers.len());
        for (name, value) in &spec.headers {
            let n = CString::new(name.as_str())
                .map_err(|_| EngineError::Submit(format!("header name {name:?} contains NUL")))?;
            let v = CString::new(value.as_str()).map_err(|_| {
                EngineError::Submit(format!("value of header {name:?} contains NUL"))
            })?;
            c_headers.push((n, v));
        }

        let handle = self.next_handle.fetch_add(1, Ordering::Relaxed);
        let mut state = Box::new(RequestState {
            handle,
            request: std::ptr::null_mut(),
            callback: std::ptr::null_mut(),
            callbacks,
            live: Arc::clone(&self.live),
            jobs: self.executor.jobs(),
            upload: None,
        });

        let params = unsafe { ffi::Cronet_UrlRequestParams_Create() };
        unsafe {
            ffi::Cronet_UrlRequestParams_http_method_set(params, method.as_ptr());
            for (n, v) in &c_headers {
                let header = ffi::Cronet_HttpHeader_Create();
                ffi::Cronet_HttpHeader_name_set(header, n.as_ptr());
                ffi::Cronet_HttpHeader_value_set(header, v.as_ptr());
                ffi::Cronet_UrlRequestParams_request_headers_add(params, header);
                // The params block copies the header.
                ffi::Cronet_HttpHeader_Destroy(header);
            }
        }
        if let Some(body) = spec.body {
            let provider = unsafe {
                ffi::Cronet_UploadDataProvider_CreateWith(
                    upload_length,
                    upload_read,
                    upload_rewind,
                    upload_close,
                )
            };
            unsafe { ffi::Cronet_UrlRequestParams_upload_data_provider_set(params, provider) };
            state.upload = Some(UploadState {
                body,
                pos: 0,
                provider,
            });
        }

        let callback = unsafe {
            ffi::Cronet_UrlRequestCallback_CreateWith(
                on_redirect_received,
                on_response_started,
                on_read_completed,
                on_succeeded,
                on_failed,
                on_canceled,
            )
        };
        let request = unsafe { ffi::Cronet_UrlRequest_Create() };
        state.callback = callback;
        state.request = request;

        let state_ptr = Box::into_raw(state);
        unsafe {
            ffi::Cronet_UrlRequest_SetClientContext(request, state_ptr as ffi::Cronet_ClientContext);
            if let Some(upload) = &(*state_ptr).upload {
                ffi::Cronet_UploadDataProvider_SetClientContext(
                    upload.provider,
                    state_ptr as ffi::Cronet_ClientContext,
                );
            }
        }

        let rc = unsafe {
            ffi::Cronet_UrlRequest_InitWithParams(
                request,
                self.engine,
                url.as_ptr(),
                params,
                callback,
                self.executor.ptr(),
            )
        };
        unsafe { ffi::Cronet_UrlRequestParams_Destroy(params) };
        if rc != 0 {
            unsafe { destroy_unsubmitted(state_ptr) };
            return Err(EngineError::Submit(format!(
                "request init failed (code {rc})"
            )));
        }

        // Insert before Start so a fast terminal callback always finds
        // its entry.
        self.live
            .lock()
            .unwrap()
            .insert(handle, LiveRequest(request));

        let rc = unsafe { ffi::Cronet_UrlRequest_Start(request) };
        if rc != 0 {
            self.live.lock().unwrap().remove(&handle);
            unsafe { destroy_unsubmitted(state_ptr) };
            return Err(EngineError::Submit(format!(
                "request start failed (code {rc})"
            )));
        }

        debug!(handle, method = %spec.method, url = %spec.url, "request submitted");
        Ok(handle)
    }

    #[cfg(not(feature = "link-cronet"))]
    pub fn submit(
        &self,
        _spec: RequestSpec,
        _callbacks: Box<dyn RequestCallbacks>,
    ) -> Result<u64, EngineError> {
        Err(EngineError::NotAvailable)
    }

    /// Cancel a live request. The request still finishes its callback
    /// sequence (with `on_canceled`, unless a terminal event won the
    /// race). Unknown or already-finished handles are ignored.
    #[cfg(feature = "link-cronet")]
    pub fn cancel(&self, handle: u64) {
        let live = self.live.lock().unwrap();
        match live.get(&handle) {
            Some(request) => {
                debug!(handle, "cancelling request");
                unsafe { ffi::Cronet_UrlRequest_Cancel(request.0) };
            }
            None => debug!(handle, "cancel for unknown or finished request"),
        }
    }

    #[cfg(not(feature = "link-cronet"))]
    pub fn cancel(&self, _handle: u64) {}

    /// The native library's version string.
    #[cfg(feature = "link-cronet")]
    pub fn version(&self) -> String {
        unsafe { cstr_to_string(ffi::Cronet_Engine_GetVersionString(self.engine)) }
    }

    #[cfg(not(feature = "link-cronet"))]
    pub fn version(&self) -> String {
        String::new()
    }
}

#[cfg(feature = "link-cronet")]
impl Drop for Engine {
    fn drop(&mut self) {
        // Cancel whatever is still in flight, then give the callback
        // sequences a bounded window to finish; Shutdown requires the
        // network thread to be quiet.
        let handles: Vec<u64> = self.live.lock().unwrap().keys().copied().collect();
        for handle in handles {
            self.cancel(handle);
        }
        let deadline = Instant::now() + DRAIN_ON_DROP;
        while Instant::now() < deadline {
            if self.live.lock().unwrap().is_empty() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        let stuck = self.live.lock().unwrap().len();
        if stuck > 0 {
            warn!(stuck, "shutting down with requests still live");
        }
        unsafe {
            ffi::Cronet_Engine_Shutdown(self.engine);
            ffi::Cronet_Engine_Destroy(self.engine);
        }
        info!("cronet engine stopped");
        // The executor field drops after this body and joins its thread.
    }
}

#[cfg(feature = "link-cronet")]
unsafe fn cstr_to_string(ptr: ffi::Cronet_String) -> String {
    if ptr.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

#[cfg(feature = "link-cronet")]
unsafe fn head_from_info(info: ffi::Cronet_UrlResponseInfoPtr) -> ResponseHead {
    if info.is_null() {
        return ResponseHead::default();
    }
    unsafe {
        let url = cstr_to_string(ffi::Cronet_UrlResponseInfo_url_get(info));
        let status = ffi::Cronet_UrlResponseInfo_http_status_code_get(info)
            .clamp(0, i32::from(u16::MAX)) as u16;
        let count = ffi::Cronet_UrlResponseInfo_all_headers_list_size(info);
        let mut headers = Vec::with_capacity(count as usize);
        for i in 0..count {
            let header = ffi::Cronet_UrlResponseInfo_all_headers_list_at(info, i);
            headers.push((
                cstr_to_string(ffi::Cronet_HttpHeader_name_get(header)),
                cstr_to_string(ffi::Cronet_HttpHeader_value_get(header)),
            ));
        }
        ResponseHead {
            url,
            status,
            headers,
        }
    }
}

#[cfg(feature = "link-cronet")]
unsafe fn state_of(request: ffi::Cronet_UrlRequestPtr) -> *mut RequestState {
    unsafe { ffi::Cronet_UrlRequest_GetClientContext(request) as *mut RequestState }
}

/// Free a request that never made it past submission.
#[cfg(feature = "link-cronet")]
unsafe fn destroy_unsubmitted(state_ptr: *mut RequestState) {
    let state = unsafe { Box::from_raw(state_ptr) };
    unsafe {
        ffi::Cronet_UrlRequest_Destroy(state.request);
        ffi::Cronet_UrlRequestCallback_Destroy(state.callback);
        if let Some(upload) = &state.upload {
            ffi::Cronet_UploadDataProvider_Destroy(upload.provider);
        }
    }
}

/// Terminal bookkeeping: drop the live-table entry and queue a job that
/// frees the native objects once the current runnable has returned.
/// Destroying a request from inside its own callback is not allowed.
#[cfg(feature = "link-cronet")]
unsafe fn finish(state_ptr: *mut RequestState) {
    let state = unsafe { Box::from_raw(state_ptr) };
    state.live.lock().unwrap().remove(&state.handle);
    let jobs = state.jobs.clone();
    let reclaim = executor::Job::Reclaim(Box::new(move || {
        unsafe {
            ffi::Cronet_UrlRequest_Destroy(state.request);
            ffi::Cronet_UrlRequestCallback_Destroy(state.callback);
            if let Some(upload) = &state.upload {
                ffi::Cronet_UploadDataProvider_Destroy(upload.provider);
            }
        }
        // Dropping `state` here also drops the callbacks box.
    }));
    if jobs.send(reclaim).is_err() {
        // Executor already stopped; nothing else can touch the request.
        warn!("executor gone before request reclamation");
    }
}

// ── Request callback trampolines ────────────────────────────────
// All run on the executor thread, one at a time.

#[cfg(feature = "link-cronet")]
unsafe extern "C" fn on_redirect_received(
    _callback: ffi::Cronet_UrlRequestCallbackPtr,
    request: ffi::Cronet_UrlRequestPtr,
    info: ffi::Cronet_UrlResponseInfoPtr,
    new_location_url: ffi::Cronet_String,
) {
    let state = unsafe { &mut *state_of(request) };
    let location = unsafe { cstr_to_string(new_location_url) };
    let head = unsafe { head_from_info(info) };
    trace!(handle = state.handle, status = head.status, %location, "redirect received");
    match state.callbacks.on_redirect_received(&location, head) {
        RedirectAction::Follow => unsafe {
            ffi::Cronet_UrlRequest_FollowRedirect(request);
        },
        RedirectAction::Stop => unsafe { ffi::Cronet_UrlRequest_Cancel(request) },
    }
}

#[cfg(feature = "link-cronet")]
unsafe extern "C" fn on_response_started(
    _callback: ffi::Cronet_UrlRequestCallbackPtr,
    request: ffi::Cronet_UrlRequestPtr,
    info: ffi::Cronet_UrlResponseInfoPtr,
) {
    let state = unsafe { &mut *state_of(request) };
    let head = unsafe { head_from_info(info) };
    trace!(handle = state.handle, status = head.status, "response started");
    state.callbacks.on_response_started(head);
    unsafe {
        let buffer = ffi::Cronet_Buffer_Create();
        ffi::Cronet_Buffer_InitWithAlloc(buffer, READ_BUFFER_SIZE);
        ffi::Cronet_UrlRequest_Read(request, buffer);
    }
}

#[cfg(feature = "link-cronet")]
unsafe extern "C" fn on_read_completed(
    _callback: ffi::Cronet_UrlRequestCallbackPtr,
    request: ffi::Cronet_UrlRequestPtr,
    _info: ffi::Cronet_UrlResponseInfoPtr,
    buffer: ffi::Cronet_BufferPtr,
    bytes_read: u64,
) {
    let state = unsafe { &mut *state_of(request) };
    let data = unsafe { ffi::Cronet_Buffer_GetData(buffer) } as *const u8;
    let chunk: &[u8] = if data.is_null() || bytes_read == 0 {
        &[]
    } else {
        unsafe { std::slice::from_raw_parts(data, bytes_read as usize) }
    };
    state.callbacks.on_read_completed(chunk);
    // Same buffer goes straight back out for the next chunk.
    unsafe { ffi::Cronet_UrlRequest_Read(request, buffer) };
}

#[cfg(feature = "link-cronet")]
unsafe extern "C" fn on_succeeded(
    _callback: ffi::Cronet_UrlRequestCallbackPtr,
    request: ffi::Cronet_UrlRequestPtr,
    _info: ffi::Cronet_UrlResponseInfoPtr,
) {
    let state_ptr = unsafe { state_of(request) };
    let state = unsafe { &mut *state_ptr };
    trace!(handle = state.handle, "request succeeded");
    state.callbacks.on_succeeded();
    unsafe { finish(state_ptr) };
}

#[cfg(feature = "link-cronet")]
unsafe extern "C" fn on_failed(
    _callback: ffi::Cronet_UrlRequestCallbackPtr,
    request: ffi::Cronet_UrlRequestPtr,
    _info: ffi::Cronet_UrlResponseInfoPtr,
    error: ffi::Cronet_ErrorPtr,
) {
    let state_ptr = unsafe { state_of(request) };
    let state = unsafe { &mut *state_ptr };
    let message = if error.is_null() {
        "unknown network error".to_string()
    } else {
        unsafe { cstr_to_string(ffi::Cronet_Error_message_get(error)) }
    };
    debug!(handle = state.handle, %message, "request failed");
    state.callbacks.on_failed(message);
    unsafe { finish(state_ptr) };
}

#[cfg(feature = "link-cronet")]
unsafe extern "C" fn on_canceled(
    _callback: ffi::Cronet_UrlRequestCallbackPtr,
    request: ffi::Cronet_UrlRequestPtr,
    _info: ffi::Cronet_UrlResponseInfoPtr,
) {
    let state_ptr = unsafe { state_of(request) };
    let state = unsafe { &mut *state_ptr };
    trace!(handle = state.handle, "request canceled");
    state.callbacks.on_canceled();
    unsafe { finish(state_ptr) };
}

// ── Upload provider trampolines ─────────────────────────────────

#[cfg(feature = "link-cronet")]
unsafe extern "C" fn upload_length(provider: ffi::Cronet_UploadDataProviderPtr) -> i64 {
    let context = unsafe { ffi::Cronet_UploadDataProvider_GetClientContext(provider) };
    let state = unsafe { &*(context as *const RequestState) };
    state.upload.as_ref().map_or(0, |u| u.body.len() as i64)
}

#[cfg(feature = "link-cronet")]
unsafe extern "C" fn upload_read(
    provider: ffi::Cronet_UploadDataProviderPtr,
    sink: ffi::Cronet_UploadDataSinkPtr,
    buffer: ffi::Cronet_BufferPtr,
) {
    let context = unsafe { ffi::Cronet_UploadDataProvider_GetClientContext(provider) };
    let state = unsafe { &mut *(context as *mut RequestState) };
    let Some(upload) = state.upload.as_mut() else {
        unsafe { ffi::Cronet_UploadDataSink_OnReadSucceeded(sink, 0, true) };
        return;
    };
    let capacity = unsafe { ffi::Cronet_Buffer_GetSize(buffer) } as usize;
    let remaining = &upload.body[upload.pos..];
    let n = remaining.len().min(capacity);
    unsafe {
        let data = ffi::Cronet_Buffer_GetData(buffer) as *mut u8;
        std::ptr::copy_nonoverlapping(remaining.as_ptr(), data, n);
    }
    upload.pos += n;
    let final_chunk = upload.pos == upload.body.len();
    unsafe { ffi::Cronet_UploadDataSink_OnReadSucceeded(sink, n as u64, final_chunk) };
}

#[cfg(feature = "link-cronet")]
unsafe extern "C" fn upload_rewind(
    provider: ffi::Cronet_UploadDataProviderPtr,
    sink: ffi::Cronet_UploadDataSinkPtr,
) {
    let context = unsafe { ffi::Cronet_UploadDataProvider_GetClientContext(provider) };
    let state = unsafe { &mut *(context as *mut RequestState) };
    if let Some(upload) = state.upload.as_mut() {
        upload.pos = 0;
    }
    unsafe { ffi::Cronet_UploadDataSink_OnRewindSucceeded(sink) };
}

#[cfg(feature = "link-cronet")]
unsafe extern "C" fn upload_close(_provider: ffi::Cronet_UploadDataProviderPtr) {
    // The provider itself is destroyed with the request.
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(feature = "link-cronet"))]
    #[test]
    fn new_returns_not_available_without_the_library() {
        let result = Engine::new(EngineConfig::default());
        assert!(matches!(result.unwrap_err(), EngineError::NotAvailable));
    }

    #[test]
    fn callbacks_are_boxable_and_send() {
        struct NoopCallbacks;
        impl RequestCallbacks for NoopCallbacks {
            fn on_redirect_received(&mut self, _: &str, _: ResponseHead) -> RedirectAction {
                RedirectAction::Follow
            }
            fn on_response_started(&mut self, _: ResponseHead) {}
            fn on_read_completed(&mut self, _: &[u8]) {}
            fn on_succeeded(&mut self) {}
            fn on_failed(&mut self, _: String) {}
            fn on_canceled(&mut self) {}
        }
        fn assert_send<T: Send + ?Sized>(_: &T) {}
        let boxed: Box<dyn RequestCallbacks> = Box::new(NoopCallbacks);
        assert_send(boxed.as_ref());
    }
}
