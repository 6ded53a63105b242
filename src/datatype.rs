//! Mapping from element types to native HDF5 type descriptors.
//!
//! Primitive scalars alias the predefined native types and own nothing;
//! complex scalars build a compound descriptor with adjacent `"r"`/`"i"`
//! fields and own its disposal. The set of supported element types is closed:
//! [`Element`] is sealed, so an unsupported type is a compile error rather
//! than a runtime fault.

use std::mem;

use hdf5_sys::h5i::hid_t;
use hdf5_sys::h5t::{
    H5T_class_t, H5Tcreate, H5Tinsert, H5T_NATIVE_DOUBLE, H5T_NATIVE_FLOAT, H5T_NATIVE_INT,
    H5T_NATIVE_LLONG, H5T_NATIVE_UINT, H5T_NATIVE_ULLONG,
};
use num_complex::Complex;

use crate::handle::{h5check, Handle, Kind};

/// A resolved native type descriptor, used for every attribute and dataset
/// I/O call.
#[derive(Debug, Clone)]
pub struct Datatype {
    handle: Handle,
}

impl Datatype {
    pub(crate) fn id(&self) -> hid_t {
        self.handle.id()
    }

    /// Alias one of the predefined native types. Shared with the library,
    /// not owned.
    fn predefined(id: hid_t) -> Datatype {
        Datatype {
            handle: Handle::borrowed(id),
        }
    }

    /// Build an owned compound descriptor for a complex type: two `field`
    /// members, real part `"r"` at offset 0 and imaginary part `"i"`
    /// directly after it. `num_complex::Complex` is `repr(C)` with exactly
    /// that layout, so the descriptor reads the value bit-for-bit.
    fn complex(field: hid_t, size: usize) -> Result<Datatype, anyhow::Error> {
        let handle = Handle::try_new(
            unsafe { H5Tcreate(H5T_class_t::H5T_COMPOUND, size) },
            Kind::Datatype,
        )?;
        h5check!(H5Tinsert(handle.id(), c"r".as_ptr(), 0, field))?;
        h5check!(H5Tinsert(handle.id(), c"i".as_ptr(), size / 2, field))?;
        Ok(Datatype { handle })
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Scalar types storable in datasets and attributes.
pub trait Element: sealed::Sealed + Copy + Default + 'static {
    /// Resolve the native descriptor for this type.
    fn datatype() -> Result<Datatype, anyhow::Error>;
}

macro_rules! native_element {
    ($($ty:ty => $native:ident,)*) => {$(
        impl sealed::Sealed for $ty {}

        impl Element for $ty {
            fn datatype() -> Result<Datatype, anyhow::Error> {
                Ok(Datatype::predefined(unsafe { *$native }))
            }
        }
    )*};
}

native_element! {
    f32 => H5T_NATIVE_FLOAT,
    f64 => H5T_NATIVE_DOUBLE,
    i32 => H5T_NATIVE_INT,
    u32 => H5T_NATIVE_UINT,
    i64 => H5T_NATIVE_LLONG,
    u64 => H5T_NATIVE_ULLONG,
}

impl sealed::Sealed for Complex<f32> {}

impl Element for Complex<f32> {
    fn datatype() -> Result<Datatype, anyhow::Error> {
        Datatype::complex(
            unsafe { *H5T_NATIVE_FLOAT },
            mem::size_of::<Complex<f32>>(),
        )
    }
}

impl sealed::Sealed for Complex<f64> {}

impl Element for Complex<f64> {
    fn datatype() -> Result<Datatype, anyhow::Error> {
        Datatype::complex(
            unsafe { *H5T_NATIVE_DOUBLE },
            mem::size_of::<Complex<f64>>(),
        )
    }
}
