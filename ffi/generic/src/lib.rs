#![allow(clippy::missing_safety_doc)]

use std::cell::RefCell;
use std::ffi::{c_char, c_void, CStr, CString};
use std::mem::ManuallyDrop;
use std::ptr::null_mut;
use std::slice;

use hce::{Aid, Config, DeactivationReason, Dispatcher, HostCardService, Lifecycle, StatusWord};

thread_local! {
    static LAST_ERROR: RefCell<Option<String>> = RefCell::new(None);
}

fn unwrap_or<T, E>(result: Result<T, E>, default: T) -> T
where
    E: ToString,
{
    // If result is an error, sets the message to LAST_ERROR.
    // Clears the last error otherwise.
    LAST_ERROR.with(|last_error| {
        *last_error.borrow_mut() = result.as_ref().err().map(|e| e.to_string());
    });

    match result {
        Ok(value) => value,
        Err(_) => default,
    }
}

/// A struct represents a byte array.
/// Dependents can read it from ptr to ptr+len, and should ignore about cap.
/// ptr can be null pointer, so dependents must check the ptr is not null.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct ByteArray {
    ptr: *mut u8,
    len: usize,
    cap: usize,
}

impl Default for ByteArray {
    fn default() -> Self {
        Self {
            ptr: null_mut(),
            len: 0,
            cap: 0,
        }
    }
}

impl From<Vec<u8>> for ByteArray {
    fn from(bytes: Vec<u8>) -> Self {
        let mut bytes = ManuallyDrop::new(bytes);

        Self {
            ptr: bytes.as_mut_ptr(),
            len: bytes.len(),
            cap: bytes.capacity(),
        }
    }
}

impl ByteArray {
    fn drain(self) {
        let Self { ptr, len, cap } = self;
        if !ptr.is_null() {
            let _ = unsafe { Vec::from_raw_parts(ptr, len, cap) };
        }
    }
}

/// Callbacks into the host around a session with a reader.
/// Both are optional. `user_data` is passed back as is.
#[repr(C)]
pub struct Callbacks {
    on_session_start: Option<extern "C" fn(user_data: *mut c_void)>,
    on_session_end: Option<extern "C" fn(user_data: *mut c_void, reason: i32)>,
    user_data: *mut c_void,
}

impl Lifecycle for Callbacks {
    fn on_session_start(&self) {
        if let Some(f) = self.on_session_start {
            f(self.user_data)
        }
    }

    fn on_session_end(&self, reason: DeactivationReason) {
        if let Some(f) = self.on_session_end {
            f(self.user_data, reason.into())
        }
    }
}

/// An emulated card answering `SELECT` for a single AID.
pub struct HceService {
    inner: HostCardService<Dispatcher, Callbacks>,
}

unsafe fn config_from(aid: *const c_char, cla_not_supported: u16) -> Result<Config, String> {
    let mut config = Config::default();
    if !aid.is_null() {
        let aid = CStr::from_ptr(aid).to_str().map_err(|e| e.to_string())?;
        config = config.with_aid(aid.parse::<Aid>().map_err(|e| e.to_string())?);
    }

    if cla_not_supported != 0 {
        config = config.with_cla_not_supported(StatusWord(cla_not_supported));
    }

    Ok(config)
}

/// Initiates the libhce library.
/// Currently this occur no side effects, but it will be added in the future.
/// So dependents should call this before using other functions.
#[no_mangle]
pub extern "C" fn hce_init() {}

/// Returns the latest error occurred on this thread before calling this function.
/// If no error occurred before or failed to get the error, returns null pointer.
/// The string must be released with `hce_string_free`.
#[no_mangle]
pub extern "C" fn hce_last_error() -> *mut c_char {
    let last_error = LAST_ERROR.with(|e| e.borrow().clone());

    match last_error.and_then(|e| CString::new(e).ok()) {
        Some(str) => str.into_raw(),
        None => null_mut(),
    }
}

/// Releases a string returned from this library.
#[no_mangle]
pub unsafe extern "C" fn hce_string_free(str: *mut c_char) {
    if !str.is_null() {
        let _ = CString::from_raw(str);
    }
}

/// Creates a new service answering for the AID, given as a hex string.
/// If aid is null, the default AID is used.
/// If cla_not_supported is not zero, it replaces the status word for an unsupported class.
/// Returns null pointer if the AID is invalid.
#[no_mangle]
pub unsafe extern "C" fn hce_new_service(
    aid: *const c_char,
    cla_not_supported: u16,
    callbacks: Callbacks,
) -> *mut HceService {
    unwrap_or(
        config_from(aid, cla_not_supported).map(|config| {
            let inner = HostCardService::with_lifecycle(Dispatcher::new(config), callbacks);

            Box::into_raw(Box::new(HceService { inner }))
        }),
        null_mut(),
    )
}

/// Notifies the service has been brought up by the host.
#[no_mangle]
pub unsafe extern "C" fn hce_service_start(service: *const HceService) {
    if let Some(service) = service.as_ref() {
        service.inner.start();
    }
}

/// Processes a command APDU, then returns the response APDU.
/// If command is null, the command is treated as absent.
/// The returned array must be released with `hce_byte_array_free`.
#[no_mangle]
pub unsafe extern "C" fn hce_service_process(
    service: *const HceService,
    command: *const u8,
    len: usize,
) -> ByteArray {
    let service = match service.as_ref() {
        Some(service) => service,
        None => return ByteArray::default(),
    };

    let command = match command.is_null() {
        true => None,
        _ => Some(slice::from_raw_parts(command, len)),
    };

    service.inner.process_command_apdu(command, None).into()
}

/// Notifies the link with the reader has been deactivated.
#[no_mangle]
pub unsafe extern "C" fn hce_service_deactivated(service: *const HceService, reason: i32) {
    if let Some(service) = service.as_ref() {
        service.inner.on_deactivated(reason);
    }
}

/// Closes the service.
#[no_mangle]
pub unsafe extern "C" fn hce_service_close(service: *mut HceService) {
    if !service.is_null() {
        let _ = Box::from_raw(service);
    }
}

/// Releases a byte array returned from this library.
#[no_mangle]
pub extern "C" fn hce_byte_array_free(array: ByteArray) {
    array.drain();
}
