//! Environment isolation for tests that read `DYNAMIC_LIBRARY_PATH`,
//! `CONDA_PREFIX` or `NATIVELIB_PLATFORM`.
//!
//! Hold [`ENV_LOCK`] for as long as any [`EnvVarGuard`] is alive.

use std::env;
use std::sync::Mutex;

pub static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Overrides one variable and puts the previous value back on drop.
pub struct EnvVarGuard {
    key: String,
    previous: Option<String>,
}

impl EnvVarGuard {
    pub fn set(key: &str, value: &str) -> Self {
        Self::replace(key, Some(value))
    }

    pub fn remove(key: &str) -> Self {
        Self::replace(key, None)
    }

    fn replace(key: &str, value: Option<&str>) -> Self {
        let previous = env::var(key).ok();
        write_var(key, value);
        Self {
            key: key.to_string(),
            previous,
        }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        write_var(&self.key, self.previous.as_deref());
    }
}

#[allow(unsafe_code)]
fn write_var(key: &str, value: Option<&str>) {
    // SAFETY: every caller holds ENV_LOCK.
    unsafe {
        match value {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "NATIVELIB_TEST_UTILS_GUARD";

    #[test]
    fn nested_guards_restore_in_reverse() {
        let _lock = ENV_LOCK.lock().unwrap();
        {
            let _outer = EnvVarGuard::set(KEY, "outer");
            {
                let _inner = EnvVarGuard::remove(KEY);
                assert!(env::var(KEY).is_err());
            }
            assert_eq!(env::var(KEY).unwrap(), "outer");
        }
        assert!(env::var(KEY).is_err());
    }
}
