use std::ffi::CString;
use std::sync::Arc;

use hdf5_sys::h5::herr_t;
use hdf5_sys::h5a::H5Aclose;
use hdf5_sys::h5d::H5Dclose;
use hdf5_sys::h5f::H5Fclose;
use hdf5_sys::h5g::H5Gclose;
use hdf5_sys::h5i::hid_t;
use hdf5_sys::h5p::H5Pclose;
use hdf5_sys::h5s::H5Sclose;
use hdf5_sys::h5t::H5Tclose;
use log::{error, trace};

/// Check the status of a raw HDF5 call, turning a negative return value into
/// an error naming the call.
macro_rules! h5check {
    ($call:expr) => {{
        let ret = unsafe { $call };
        if ret < 0 {
            Err(::anyhow::anyhow!(
                "{} failed (status {})",
                stringify!($call).split('(').next().unwrap(),
                ret
            ))
        } else {
            Ok(ret)
        }
    }};
}

pub(crate) use h5check;

/// The native entity a handle identifies, and therefore how to release it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    File,
    Group,
    Dataset,
    Dataspace,
    Attribute,
    Datatype,
    // Only acquired for collective transfer and file-access lists; serial
    // paths pass the borrowed default list instead.
    #[cfg_attr(not(feature = "mpio"), allow(dead_code))]
    PropertyList,
    /// Predefined or default ids owned by the library itself; never closed.
    Borrowed,
}

impl Kind {
    fn close_fn(self) -> Option<unsafe extern "C" fn(hid_t) -> herr_t> {
        match self {
            Kind::File => Some(H5Fclose),
            Kind::Group => Some(H5Gclose),
            Kind::Dataset => Some(H5Dclose),
            Kind::Dataspace => Some(H5Sclose),
            Kind::Attribute => Some(H5Aclose),
            Kind::Datatype => Some(H5Tclose),
            Kind::PropertyList => Some(H5Pclose),
            Kind::Borrowed => None,
        }
    }
}

/// A shared, reference-counted wrapper around one native HDF5 handle.
///
/// The disposal action is fixed at construction by [`Kind`] and fires exactly
/// once, when the last clone is dropped. Handles of kind
/// [`Borrowed`](Kind::Borrowed) are aliases of library-owned ids and are
/// never closed.
#[derive(Debug, Clone)]
pub(crate) struct Handle {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    id: hid_t,
    kind: Kind,
}

impl Handle {
    /// Take ownership of a freshly acquired id, or fail if the producing
    /// call returned an invalid one.
    pub fn try_new(id: hid_t, kind: Kind) -> Result<Handle, anyhow::Error> {
        ensure!(id >= 0, "failed to acquire {:?} handle (status {})", kind, id);
        trace!("acquired {:?} handle {}", kind, id);
        Ok(Handle {
            inner: Arc::new(Inner { id, kind }),
        })
    }

    /// Wrap an id whose lifetime is managed elsewhere.
    pub fn borrowed(id: hid_t) -> Handle {
        Handle {
            inner: Arc::new(Inner {
                id,
                kind: Kind::Borrowed,
            }),
        }
    }

    pub fn id(&self) -> hid_t {
        self.inner.id
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(close) = self.kind.close_fn() {
            let ret = unsafe { close(self.id) };
            if ret < 0 {
                // Drop cannot propagate; surface the leak instead.
                error!("failed to close {:?} handle {}", self.kind, self.id);
            } else {
                trace!("released {:?} handle {}", self.kind, self.id);
            }
        }
    }
}

/// NUL-terminate a link, attribute or file name for the C API.
pub(crate) fn to_cstring(name: &str) -> Result<CString, anyhow::Error> {
    CString::new(name).map_err(|_| anyhow!("name contains an interior NUL: {:?}", name))
}
