//! Browser implementations of the platform traits

use wasm_bindgen::JsValue;

use super::SurfaceProbe;
use crate::persistence::{Storage, StorageError};

/// `window.localStorage`, or nothing if the browser refuses it (private mode, sandboxed iframe)
pub struct LocalStorage {
    inner: Option<web_sys::Storage>,
}

impl LocalStorage {
    pub fn open() -> Self {
        let inner = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();
        if inner.is_none() {
            log::warn!("LocalStorage unavailable - session will not survive a reload");
        }
        Self { inner }
    }
}

fn describe(err: JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{:?}", err))
}

impl Storage for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let Some(storage) = &self.inner else {
            return Ok(None);
        };
        storage.get_item(key).map_err(|e| StorageError::ReadFailed {
            key: key.to_string(),
            reason: describe(e),
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let storage = self.inner.as_ref().ok_or(StorageError::Unavailable)?;
        storage
            .set_item(key, value)
            .map_err(|e| StorageError::WriteFailed {
                key: key.to_string(),
                reason: describe(e),
            })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let Some(storage) = &self.inner else {
            return Ok(());
        };
        storage.remove_item(key).map_err(|e| StorageError::WriteFailed {
            key: key.to_string(),
            reason: describe(e),
        })
    }
}

/// Measures the plank element
pub struct PlankProbe {
    element: web_sys::Element,
}

impl PlankProbe {
    pub fn new(element: web_sys::Element) -> Self {
        Self { element }
    }
}

impl SurfaceProbe for PlankProbe {
    fn surface_width(&self) -> f32 {
        self.element.get_bounding_client_rect().width() as f32
    }
}

/// Resolve after `ms` milliseconds on the browser event loop
pub async fn sleep_ms(ms: u32) {
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        let scheduled = web_sys::window().is_some_and(|w| {
            w.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms as i32)
                .is_ok()
        });
        if !scheduled {
            let _ = resolve.call0(&JsValue::NULL);
        }
    });
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}

/// Seed for the weight dealer
pub fn clock_seed() -> u64 {
    js_sys::Date::now() as u64
}
