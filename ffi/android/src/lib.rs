#![allow(clippy::missing_safety_doc)]

#[macro_use]
extern crate log;
extern crate android_log;

use std::cell::RefCell;

use jni::objects::{JClass, JString};
use jni::sys::{jbyteArray, jint, jlong, jstring};
use jni::JNIEnv;

use hce::{
    config, Aid, Config, DeactivationReason, Dispatcher, HostCardService, Lifecycle, StatusWord,
};

const NULL: jbyteArray = 0 as jbyteArray;

thread_local! {
    static LAST_ERROR: RefCell<Option<String>> = RefCell::new(None);
}

#[derive(thiserror::Error, Debug)]
enum Error {
    #[error("Config Error: {0}")]
    Config(#[from] config::Error),

    #[error("JNI Error: {0}")]
    Jni(#[from] jni::errors::Error),

    #[error("Status word out of range: {0:#X}")]
    StatusWordOutOfRange(jint),

    #[error("Service handle is null")]
    NullService,
}

/// Reports the session boundaries to logcat.
struct LogLifecycle;

impl Lifecycle for LogLifecycle {
    fn on_session_start(&self) {
        info!("Session started");
    }

    fn on_session_end(&self, reason: DeactivationReason) {
        info!("Session ended: {}", reason);
    }
}

type Service = HostCardService<Dispatcher, LogLifecycle>;

fn unwrap_or_default<T, E>(result: Result<T, E>, default: T) -> T
where
    E: std::error::Error,
{
    match result {
        Ok(value) => value,
        Err(err) => {
            error!("{}", err);
            LAST_ERROR.with(|e| *e.borrow_mut() = Some(err.to_string()));
            default
        }
    }
}

/// Builds the configuration for a new service.
/// A non-zero `cla_not_supported` must fit in two octets.
fn build_config(aid: Option<&str>, cla_not_supported: jint) -> Result<Config, Error> {
    let mut config = Config::default();
    if let Some(aid) = aid {
        config = config.with_aid(aid.parse::<Aid>()?);
    }

    if cla_not_supported != 0 {
        let sw = u16::try_from(cla_not_supported)
            .map_err(|_| Error::StatusWordOutOfRange(cla_not_supported))?;
        config = config.with_cla_not_supported(StatusWord(sw));
    }

    Ok(config)
}

/// Answers a command, or `FAILED` if there is no service behind the handle.
fn respond(service: Option<&Service>, command: Option<&[u8]>) -> Vec<u8> {
    match service {
        Some(service) => service.process_command_apdu(command, None),
        None => unwrap_or_default(Err(Error::NullService), StatusWord::FAILED.into()),
    }
}

macro_rules! wrap {
    (jbyteArray, $inner: expr) => {
        unwrap_or_default((|| -> Result<jbyteArray, Error> { $inner })(), NULL)
    };

    ($t: ty, $inner: expr) => {
        unwrap_or_default((|| -> Result<$t, Error> { $inner })(), <$t>::default())
    };
}

#[no_mangle]
pub extern "C" fn Java_io_github_hce_ffi_LibHce_init() {
    // Fails only if a logger is already installed.
    let _ = android_log::init("HCE.FFI");
}

#[no_mangle]
pub unsafe extern "C" fn Java_io_github_hce_ffi_LibHce_lastError(
    env: JNIEnv,
    _class: JClass,
) -> jstring {
    match LAST_ERROR.with(|e| e.borrow().clone()) {
        Some(message) => match env.new_string(message) {
            Ok(str) => str.into_raw(),
            Err(_) => 0 as jstring,
        },
        None => 0 as jstring,
    }
}

/// Creates a service answering for the AID in hex, or the default AID if it is null.
/// A non-zero `cla_not_supported` replaces the status word for an unsupported class.
/// Returns 0 on error, including a `cla_not_supported` outside `0..=0xFFFF`.
#[no_mangle]
pub unsafe extern "C" fn Java_io_github_hce_ffi_LibHce_newService(
    env: JNIEnv,
    _class: JClass,
    aid: jstring,
    cla_not_supported: jint,
) -> jlong {
    wrap!(jlong, {
        let aid: Option<String> = match aid.is_null() {
            true => None,
            _ => Some(env.get_string(JString::from_raw(aid))?.into()),
        };

        let config = build_config(aid.as_deref(), cla_not_supported)?;
        let service: Service =
            HostCardService::with_lifecycle(Dispatcher::new(config), LogLifecycle);

        Ok(Box::into_raw(Box::new(service)) as jlong)
    })
}

#[no_mangle]
pub unsafe extern "C" fn Java_io_github_hce_ffi_LibHce_start(
    _env: JNIEnv,
    _class: JClass,
    service: jlong,
) {
    if let Some(service) = (service as *const Service).as_ref() {
        service.start();
    }
}

#[no_mangle]
pub unsafe extern "C" fn Java_io_github_hce_ffi_LibHce_processCommandApdu(
    env: JNIEnv,
    _class: JClass,
    service: jlong,
    command: jbyteArray,
) -> jbyteArray {
    wrap!(jbyteArray, {
        let command = match command.is_null() {
            true => None,
            _ => Some(env.convert_byte_array(command)?),
        };

        let response = respond((service as *const Service).as_ref(), command.as_deref());

        Ok(env.byte_array_from_slice(&response)?)
    })
}

#[no_mangle]
pub unsafe extern "C" fn Java_io_github_hce_ffi_LibHce_onDeactivated(
    _env: JNIEnv,
    _class: JClass,
    service: jlong,
    reason: jint,
) {
    if let Some(service) = (service as *const Service).as_ref() {
        service.on_deactivated(reason);
    }
}

#[no_mangle]
pub unsafe extern "C" fn Java_io_github_hce_ffi_LibHce_close(
    _env: JNIEnv,
    _class: JClass,
    service: jlong,
) {
    if service != 0 {
        let _ = Box::from_raw(service as *mut Service);
    }
}
