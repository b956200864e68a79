use std::ops::{Deref, DerefMut};

pub(crate) trait NullCheck {
    fn is_null(&self) -> bool;
}

impl<T> NullCheck for *const T {
    fn is_null(&self) -> bool {
        (*self as *const T).is_null()
    }
}

impl<T> NullCheck for *mut T {
    fn is_null(&self) -> bool {
        (*self as *const T).is_null()
    }
}

/// Owner of a handle allocated by sqlite (a connection or a statement), released with
/// `dealloc` unless null.
#[derive(Debug)]
pub(crate) struct CBox<T: NullCheck> {
    pub(crate) ptr: T,
    dealloc: fn(T),
}

impl<T: NullCheck> CBox<T> {
    pub fn new(ptr: T, dealloc: fn(T)) -> Self {
        Self { ptr, dealloc }
    }
}

impl<T: NullCheck> Drop for CBox<T> {
    fn drop(&mut self) {
        if !self.is_null() {
            unsafe {
                (self.dealloc)(std::ptr::read(&self.ptr as *const T));
            }
        }
    }
}

impl<T: NullCheck> Deref for CBox<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.ptr
    }
}

impl<T: NullCheck> DerefMut for CBox<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.ptr
    }
}

unsafe impl<T: NullCheck> Send for CBox<T> {}

#[cfg(test)]
mod tests {
    use crate::cbox::CBox;
    use std::{
        ptr,
        sync::atomic::{AtomicUsize, Ordering},
    };

    static RELEASED: AtomicUsize = AtomicUsize::new(0);

    fn release(_: *mut u8) {
        RELEASED.fetch_add(1, Ordering::Relaxed);
    }

    #[test]
    fn null_pointer_is_not_released() {
        static NULL_RELEASED: AtomicUsize = AtomicUsize::new(0);
        {
            let handle = CBox::new(ptr::null_mut::<u8>(), |_| {
                NULL_RELEASED.fetch_add(1, Ordering::Relaxed);
            });
            assert!(handle.is_null());
        }
        assert_eq!(NULL_RELEASED.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn pointer_is_released_once() {
        let mut byte = 7u8;
        {
            let mut handle = CBox::new(ptr::null_mut(), release);
            // Filled in place, the way sqlite3_open_v2 writes its output parameter
            *handle = &mut byte as *mut u8;
            assert_eq!(unsafe { **handle }, 7);
            assert_eq!(RELEASED.load(Ordering::Relaxed), 0);
        }
        assert_eq!(RELEASED.load(Ordering::Relaxed), 1);
    }
}
