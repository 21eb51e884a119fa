//! Raw FFI bindings to the Cronet C API.
//!
//! Covers the subset of `cronet_c.h` this crate drives: engine lifecycle,
//! a caller-supplied executor, URL requests with the six-method callback,
//! read buffers and upload data providers.
//!
//! Without the `link-cronet` feature the extern block is absent and the
//! module only supplies the type vocabulary.

#![allow(non_camel_case_types)]
#![allow(dead_code)]

use std::os::raw::{c_char, c_void};

/// Opaque engine handle.
#[repr(C)]
pub struct Cronet_Engine {
    _private: [u8; 0],
}

/// Opaque engine parameter block.
#[repr(C)]
pub struct Cronet_EngineParams {
    _private: [u8; 0],
}

/// Opaque executor handle.
#[repr(C)]
pub struct Cronet_Executor {
    _private: [u8; 0],
}

/// Opaque work item posted to an executor.
#[repr(C)]
pub struct Cronet_Runnable {
    _private: [u8; 0],
}

/// Opaque URL request handle.
#[repr(C)]
pub struct Cronet_UrlRequest {
    _private: [u8; 0],
}

/// Opaque URL request parameter block.
#[repr(C)]
pub struct Cronet_UrlRequestParams {
    _private: [u8; 0],
}

/// Opaque callback record built from six function pointers.
#[repr(C)]
pub struct Cronet_UrlRequestCallback {
    _private: [u8; 0],
}

/// Opaque response metadata (url, status, headers).
#[repr(C)]
pub struct Cronet_UrlResponseInfo {
    _private: [u8; 0],
}

/// Opaque network error record.
#[repr(C)]
pub struct Cronet_Error {
    _private: [u8; 0],
}

/// Opaque byte buffer.
#[repr(C)]
pub struct Cronet_Buffer {
    _private: [u8; 0],
}

/// Opaque header name/value pair.
#[repr(C)]
pub struct Cronet_HttpHeader {
    _private: [u8; 0],
}

/// Opaque upload body source.
#[repr(C)]
pub struct Cronet_UploadDataProvider {
    _private: [u8; 0],
}

/// Opaque sink the upload provider reports reads to.
#[repr(C)]
pub struct Cronet_UploadDataSink {
    _private: [u8; 0],
}

pub type Cronet_EnginePtr = *mut Cronet_Engine;
pub type Cronet_EngineParamsPtr = *mut Cronet_EngineParams;
pub type Cronet_ExecutorPtr = *mut Cronet_Executor;
pub type Cronet_RunnablePtr = *mut Cronet_Runnable;
pub type Cronet_UrlRequestPtr = *mut Cronet_UrlRequest;
pub type Cronet_UrlRequestParamsPtr = *mut Cronet_UrlRequestParams;
pub type Cronet_UrlRequestCallbackPtr = *mut Cronet_UrlRequestCallback;
pub type Cronet_UrlResponseInfoPtr = *mut Cronet_UrlResponseInfo;
pub type Cronet_ErrorPtr = *mut Cronet_Error;
pub type Cronet_BufferPtr = *mut Cronet_Buffer;
pub type Cronet_HttpHeaderPtr = *mut Cronet_HttpHeader;
pub type Cronet_UploadDataProviderPtr = *mut Cronet_UploadDataProvider;
pub type Cronet_UploadDataSinkPtr = *mut Cronet_UploadDataSink;

/// Borrowed NUL-terminated string.
pub type Cronet_String = *const c_char;
/// Raw pointer slot the app may attach to engine-owned objects.
pub type Cronet_ClientContext = *mut c_void;
/// Raw pointer to buffer storage.
pub type Cronet_RawDataPtr = *mut c_void;
/// Result code; `0` is success (matches `Cronet_RESULT_SUCCESS`).
pub type Cronet_RESULT = i32;

/// HTTP cache modes (matches `Cronet_EngineParams_HTTP_CACHE_MODE`).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cronet_EngineParams_HTTP_CACHE_MODE {
    Disabled = 0,
    InMemory = 1,
    DiskNoHttp = 2,
    Disk = 3,
}

pub type Cronet_Executor_ExecuteFunc =
    unsafe extern "C" fn(executor: Cronet_ExecutorPtr, runnable: Cronet_RunnablePtr);

pub type Cronet_UrlRequestCallback_OnRedirectReceivedFunc = unsafe extern "C" fn(
    callback: Cronet_UrlRequestCallbackPtr,
    request: Cronet_UrlRequestPtr,
    info: Cronet_UrlResponseInfoPtr,
    new_location_url: Cronet_String,
);
pub type Cronet_UrlRequestCallback_OnResponseStartedFunc = unsafe extern "C" fn(
    callback: Cronet_UrlRequestCallbackPtr,
    request: Cronet_UrlRequestPtr,
    info: Cronet_UrlResponseInfoPtr,
);
pub type Cronet_UrlRequestCallback_OnReadCompletedFunc = unsafe extern "C" fn(
    callback: Cronet_UrlRequestCallbackPtr,
    request: Cronet_UrlRequestPtr,
    info: Cronet_UrlResponseInfoPtr,
    buffer: Cronet_BufferPtr,
    bytes_read: u64,
);
pub type Cronet_UrlRequestCallback_OnSucceededFunc = unsafe extern "C" fn(
    callback: Cronet_UrlRequestCallbackPtr,
    request: Cronet_UrlRequestPtr,
    info: Cronet_UrlResponseInfoPtr,
);
pub type Cronet_UrlRequestCallback_OnFailedFunc = unsafe extern "C" fn(
    callback: Cronet_UrlRequestCallbackPtr,
    request: Cronet_UrlRequestPtr,
    info: Cronet_UrlResponseInfoPtr,
    error: Cronet_ErrorPtr,
);
pub type Cronet_UrlRequestCallback_OnCanceledFunc = unsafe extern "C" fn(
    callback: Cronet_UrlRequestCallbackPtr,
    request: Cronet_UrlRequestPtr,
    info: Cronet_UrlResponseInfoPtr,
);

pub type Cronet_UploadDataProvider_GetLengthFunc =
    unsafe extern "C" fn(provider: Cronet_UploadDataProviderPtr) -> i64;
pub type Cronet_UploadDataProvider_ReadFunc = unsafe extern "C" fn(
    provider: Cronet_UploadDataProviderPtr,
    sink: Cronet_UploadDataSinkPtr,
    buffer: Cronet_BufferPtr,
);
pub type Cronet_UploadDataProvider_RewindFunc = unsafe extern "C" fn(
    provider: Cronet_UploadDataProviderPtr,
    sink: Cronet_UploadDataSinkPtr,
);
pub type Cronet_UploadDataProvider_CloseFunc =
    unsafe extern "C" fn(provider: Cronet_UploadDataProviderPtr);

#[cfg(feature = "link-cronet")]
unsafe extern "C" {
    // ── Engine ──────────────────────────────────────────────────
    pub fn Cronet_Engine_Create() -> Cronet_EnginePtr;
    pub fn Cronet_Engine_StartWithParams(
        engine: Cronet_EnginePtr,
        params: Cronet_EngineParamsPtr,
    ) -> Cronet_RESULT;
    pub fn Cronet_Engine_Shutdown(engine: Cronet_EnginePtr) -> Cronet_RESULT;
    pub fn Cronet_Engine_Destroy(engine: Cronet_EnginePtr);
    pub fn Cronet_Engine_GetVersionString(engine: Cronet_EnginePtr) -> Cronet_String;

    pub fn Cronet_EngineParams_Create() -> Cronet_EngineParamsPtr;
    pub fn Cronet_EngineParams_Destroy(params: Cronet_EngineParamsPtr);
    pub fn Cronet_EngineParams_user_agent_set(
        params: Cronet_EngineParamsPtr,
        user_agent: Cronet_String,
    );
    pub fn Cronet_EngineParams_enable_quic_set(params: Cronet_EngineParamsPtr, enable: bool);
    pub fn Cronet_EngineParams_enable_http2_set(params: Cronet_EngineParamsPtr, enable: bool);
    pub fn Cronet_EngineParams_http_cache_mode_set(
        params: Cronet_EngineParamsPtr,
        mode: Cronet_EngineParams_HTTP_CACHE_MODE,
    );

    // ── Executor and runnables ──────────────────────────────────
    pub fn Cronet_Executor_CreateWith(execute: Cronet_Executor_ExecuteFunc) -> Cronet_ExecutorPtr;
    pub fn Cronet_Executor_SetClientContext(
        executor: Cronet_ExecutorPtr,
        context: Cronet_ClientContext,
    );
    pub fn Cronet_Executor_GetClientContext(executor: Cronet_ExecutorPtr) -> Cronet_ClientContext;
    pub fn Cronet_Executor_Destroy(executor: Cronet_ExecutorPtr);
    pub fn Cronet_Runnable_Run(runnable: Cronet_RunnablePtr);
    pub fn Cronet_Runnable_Destroy(runnable: Cronet_RunnablePtr);

    // ── URL requests ────────────────────────────────────────────
    pub fn Cronet_UrlRequest_Create() -> Cronet_UrlRequestPtr;
    pub fn Cronet_UrlRequest_Destroy(request: Cronet_UrlRequestPtr);
    pub fn Cronet_UrlRequest_SetClientContext(
        request: Cronet_UrlRequestPtr,
        context: Cronet_ClientContext,
    );
    pub fn Cronet_UrlRequest_GetClientContext(request: Cronet_UrlRequestPtr)
    -> Cronet_ClientContext;
    pub fn Cronet_UrlRequest_InitWithParams(
        request: Cronet_UrlRequestPtr,
        engine: Cronet_EnginePtr,
        url: Cronet_String,
        params: Cronet_UrlRequestParamsPtr,
        callback: Cronet_UrlRequestCallbackPtr,
        executor: Cronet_ExecutorPtr,
    ) -> Cronet_RESULT;
    pub fn Cronet_UrlRequest_Start(request: Cronet_UrlRequestPtr) -> Cronet_RESULT;
    pub fn Cronet_UrlRequest_FollowRedirect(request: Cronet_UrlRequestPtr) -> Cronet_RESULT;
    pub fn Cronet_UrlRequest_Read(
        request: Cronet_UrlRequestPtr,
        buffer: Cronet_BufferPtr,
    ) -> Cronet_RESULT;
    pub fn Cronet_UrlRequest_Cancel(request: Cronet_UrlRequestPtr);

    pub fn Cronet_UrlRequestParams_Create() -> Cronet_UrlRequestParamsPtr;
    pub fn Cronet_UrlRequestParams_Destroy(params: Cronet_UrlRequestParamsPtr);
    pub fn Cronet_UrlRequestParams_http_method_set(
        params: Cronet_UrlRequestParamsPtr,
        method: Cronet_String,
    );
    pub fn Cronet_UrlRequestParams_request_headers_add(
        params: Cronet_UrlRequestParamsPtr,
        header: Cronet_HttpHeaderPtr,
    );
    pub fn Cronet_UrlRequestParams_upload_data_provider_set(
        params: Cronet_UrlRequestParamsPtr,
        provider: Cronet_UploadDataProviderPtr,
    );

    pub fn Cronet_UrlRequestCallback_CreateWith(
        on_redirect_received: Cronet_UrlRequestCallback_OnRedirectReceivedFunc,
        on_response_started: Cronet_UrlRequestCallback_OnResponseStartedFunc,
        on_read_completed: Cronet_UrlRequestCallback_OnReadCompletedFunc,
        on_succeeded: Cronet_UrlRequestCallback_OnSucceededFunc,
        on_failed: Cronet_UrlRequestCallback_OnFailedFunc,
        on_canceled: Cronet_UrlRequestCallback_OnCanceledFunc,
    ) -> Cronet_UrlRequestCallbackPtr;
    pub fn Cronet_UrlRequestCallback_Destroy(callback: Cronet_UrlRequestCallbackPtr);

    // ── Headers and response metadata ───────────────────────────
    pub fn Cronet_HttpHeader_Create() -> Cronet_HttpHeaderPtr;
    pub fn Cronet_HttpHeader_Destroy(header: Cronet_HttpHeaderPtr);
    pub fn Cronet_HttpHeader_name_set(header: Cronet_HttpHeaderPtr, name: Cronet_String);
    pub fn Cronet_HttpHeader_value_set(header: Cronet_HttpHeaderPtr, value: Cronet_String);
    pub fn Cronet_HttpHeader_name_get(header: Cronet_HttpHeaderPtr) -> Cronet_String;
    pub fn Cronet_HttpHeader_value_get(header: Cronet_HttpHeaderPtr) -> Cronet_String;

    pub fn Cronet_UrlResponseInfo_url_get(info: Cronet_UrlResponseInfoPtr) -> Cronet_String;
    pub fn Cronet_UrlResponseInfo_http_status_code_get(info: Cronet_UrlResponseInfoPtr) -> i32;
    pub fn Cronet_UrlResponseInfo_all_headers_list_size(info: Cronet_UrlResponseInfoPtr) -> u32;
    pub fn Cronet_UrlResponseInfo_all_headers_list_at(
        info: Cronet_UrlResponseInfoPtr,
        index: u32,
    ) -> Cronet_HttpHeaderPtr;

    pub fn Cronet_Error_message_get(error: Cronet_ErrorPtr) -> Cronet_String;

    // ── Buffers ─────────────────────────────────────────────────
    pub fn Cronet_Buffer_Create() -> Cronet_BufferPtr;
    pub fn Cronet_Buffer_Destroy(buffer: Cronet_BufferPtr);
    pub fn Cronet_Buffer_InitWithAlloc(buffer: Cronet_BufferPtr, size: u64);
    pub fn Cronet_Buffer_GetSize(buffer: Cronet_BufferPtr) -> u64;
    pub fn Cronet_Buffer_GetData(buffer: Cronet_BufferPtr) -> Cronet_RawDataPtr;

    // ── Upload bodies ───────────────────────────────────────────
    pub fn Cronet_UploadDataProvider_CreateWith(
        get_length: Cronet_UploadDataProvider_GetLengthFunc,
        read: Cronet_UploadDataProvider_ReadFunc,
        rewind: Cronet_UploadDataProvider_RewindFunc,
        close: Cronet_UploadDataProvider_CloseFunc,
    ) -> Cronet_UploadDataProviderPtr;
    pub fn Cronet_UploadDataProvider_Destroy(provider: Cronet_UploadDataProviderPtr);
    pub fn Cronet_UploadDataProvider_SetClientContext(
        provider: Cronet_UploadDataProviderPtr,
        context: Cronet_ClientContext,
    );
    pub fn Cronet_UploadDataProvider_GetClientContext(
        provider: Cronet_UploadDataProviderPtr,
    ) -> Cronet_ClientContext;
    pub fn Cronet_UploadDataSink_OnReadSucceeded(
        sink: Cronet_UploadDataSinkPtr,
        bytes_read: u64,
        final_chunk: bool,
    );
    pub fn Cronet_UploadDataSink_OnRewindSucceeded(sink: Cronet_UploadDataSinkPtr);
}
