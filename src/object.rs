//! The shared identity of every named entity in a file, and generic
//! attribute I/O on it.

use std::ffi::CStr;
use std::os::raw::{c_char, c_void};
use std::ptr;

use anyhow::Context;
use hdf5_sys::h5::hsize_t;
use hdf5_sys::h5a::{H5Acreate2, H5Aget_space, H5Aopen, H5Aread, H5Awrite};
use hdf5_sys::h5i::hid_t;
use hdf5_sys::h5p::H5P_DEFAULT;
use hdf5_sys::h5s::{
    H5S_class_t, H5Screate, H5Screate_simple, H5Sget_simple_extent_dims,
    H5Sget_simple_extent_ndims,
};
use hdf5_sys::h5t::{H5T_cset_t, H5Tcopy, H5Tset_cset, H5Tset_size, H5T_C_S1, H5T_VARIABLE};
use ndarray::Array2;
use num_complex::Complex;

use crate::datatype::{Datatype, Element};
use crate::handle::{h5check, to_cstring, Handle, Kind};

/// Anything identified by a name inside a file: the file root, groups and
/// datasets. Carries the name, the collective-I/O flag and the native
/// handle; the flag is fixed for the object's lifetime and inherited by
/// every operation it performs.
#[derive(Debug, Clone)]
pub struct Object {
    name: String,
    mpi: bool,
    handle: Handle,
}

impl Object {
    pub(crate) fn new(name: String, mpi: bool, handle: Handle) -> Object {
        Object { name, mpi, handle }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether operations on this object take part in MPI-collective I/O.
    pub fn is_collective(&self) -> bool {
        self.mpi
    }

    pub(crate) fn id(&self) -> hid_t {
        self.handle.id()
    }

    /// Read the attribute `name`, decoded as `A`.
    pub fn attr<A: AttrValue>(&self, name: &str) -> Result<A, anyhow::Error> {
        A::read(self, name)
    }

    /// Create the attribute `name` and write `value` to it.
    pub fn write_attr<A: AttrValue>(&self, name: &str, value: &A) -> Result<(), anyhow::Error> {
        A::write(self, name, value)
    }
}

/// One decode/encode strategy per supported attribute shape: every
/// [`Element`] scalar, `bool` (stored as a native int), `String`
/// (variable-length UTF-8) and [`Array2`] (rank-2 numeric matrix).
pub trait AttrValue: Sized {
    fn read(object: &Object, name: &str) -> Result<Self, anyhow::Error>;
    fn write(object: &Object, name: &str, value: &Self) -> Result<(), anyhow::Error>;
}

fn open_attr(object: &Object, name: &str) -> Result<Handle, anyhow::Error> {
    let cname = to_cstring(name)?;
    Handle::try_new(
        unsafe { H5Aopen(object.id(), cname.as_ptr(), H5P_DEFAULT) },
        Kind::Attribute,
    )
    .with_context(|| format!("no attribute {:?} on {:?}", name, object.name()))
}

fn create_attr(
    object: &Object,
    name: &str,
    dtype: hid_t,
    space: hid_t,
) -> Result<Handle, anyhow::Error> {
    let cname = to_cstring(name)?;
    Handle::try_new(
        unsafe { H5Acreate2(object.id(), cname.as_ptr(), dtype, space, H5P_DEFAULT, H5P_DEFAULT) },
        Kind::Attribute,
    )
    .with_context(|| format!("could not create attribute {:?} on {:?}", name, object.name()))
}

fn scalar_space() -> Result<Handle, anyhow::Error> {
    Handle::try_new(
        unsafe { H5Screate(H5S_class_t::H5S_SCALAR) },
        Kind::Dataspace,
    )
}

fn read_scalar<T: Default>(
    object: &Object,
    name: &str,
    dtype: &Datatype,
) -> Result<T, anyhow::Error> {
    let attr = open_attr(object, name)?;
    let mut value = T::default();
    h5check!(H5Aread(
        attr.id(),
        dtype.id(),
        &mut value as *mut T as *mut c_void
    ))?;
    Ok(value)
}

fn write_scalar<T>(
    object: &Object,
    name: &str,
    dtype: &Datatype,
    value: &T,
) -> Result<(), anyhow::Error> {
    let space = scalar_space()?;
    let attr = create_attr(object, name, dtype.id(), space.id())?;
    h5check!(H5Awrite(
        attr.id(),
        dtype.id(),
        value as *const T as *const c_void
    ))?;
    Ok(())
}

macro_rules! scalar_attr {
    ($($ty:ty),* $(,)?) => {$(
        impl AttrValue for $ty {
            fn read(object: &Object, name: &str) -> Result<Self, anyhow::Error> {
                read_scalar(object, name, &<$ty as Element>::datatype()?)
            }

            fn write(object: &Object, name: &str, value: &Self) -> Result<(), anyhow::Error> {
                write_scalar(object, name, &<$ty as Element>::datatype()?, value)
            }
        }
    )*};
}

scalar_attr!(f32, f64, i32, u32, i64, u64, Complex<f32>, Complex<f64>);

/// Stored as a 4-byte native integer, the h5py enum convention; any non-zero
/// value reads as true.
impl AttrValue for bool {
    fn read(object: &Object, name: &str) -> Result<Self, anyhow::Error> {
        Ok(i32::read(object, name)? != 0)
    }

    fn write(object: &Object, name: &str, value: &Self) -> Result<(), anyhow::Error> {
        i32::write(object, name, &(*value as i32))
    }
}

/// The variable-length UTF-8 string type h5py writes, so foreign readers
/// agree on the encoding.
fn varlen_utf8() -> Result<Handle, anyhow::Error> {
    let string_type = Handle::try_new(unsafe { H5Tcopy(*H5T_C_S1) }, Kind::Datatype)?;
    h5check!(H5Tset_cset(string_type.id(), H5T_cset_t::H5T_CSET_UTF8))?;
    h5check!(H5Tset_size(string_type.id(), H5T_VARIABLE))?;
    Ok(string_type)
}

impl AttrValue for String {
    fn read(object: &Object, name: &str) -> Result<Self, anyhow::Error> {
        let string_type = varlen_utf8()?;
        let attr = open_attr(object, name)?;

        // For a variable-length string the library allocates the receiving
        // buffer; it must be released with free() once copied out.
        let mut data: *mut c_char = ptr::null_mut();
        h5check!(H5Aread(
            attr.id(),
            string_type.id(),
            &mut data as *mut *mut c_char as *mut c_void
        ))?;
        ensure!(!data.is_null(), "attribute {:?}: null string buffer", name);

        let bytes = unsafe { CStr::from_ptr(data) }.to_bytes().to_vec();
        unsafe { libc::free(data as *mut libc::c_void) };
        Ok(String::from_utf8(bytes)?)
    }

    fn write(object: &Object, name: &str, value: &Self) -> Result<(), anyhow::Error> {
        let string_type = varlen_utf8()?;
        let cvalue = to_cstring(value)?;
        let space = scalar_space()?;
        let attr = create_attr(object, name, string_type.id(), space.id())?;

        // The write buffer for a variable-length string is a pointer to the
        // character pointer.
        let data = cvalue.as_ptr();
        h5check!(H5Awrite(
            attr.id(),
            string_type.id(),
            &data as *const *const c_char as *const c_void
        ))?;
        Ok(())
    }
}

impl<T: Element> AttrValue for Array2<T> {
    fn read(object: &Object, name: &str) -> Result<Self, anyhow::Error> {
        let dtype = T::datatype()?;
        let attr = open_attr(object, name)?;
        let space = Handle::try_new(unsafe { H5Aget_space(attr.id()) }, Kind::Dataspace)?;

        let ndims = h5check!(H5Sget_simple_extent_ndims(space.id()))?;
        assert_eq!(ndims, 2, "attribute {:?} is not a matrix", name);

        let mut dims: [hsize_t; 2] = [0; 2];
        h5check!(H5Sget_simple_extent_dims(
            space.id(),
            dims.as_mut_ptr(),
            ptr::null_mut()
        ))?;
        let (rows, cols) = (dims[0] as usize, dims[1] as usize);

        let mut data = vec![T::default(); rows * cols];
        h5check!(H5Aread(
            attr.id(),
            dtype.id(),
            data.as_mut_ptr() as *mut c_void
        ))?;

        // On-disk order is row-major, the same as Array2's standard layout.
        Ok(Array2::from_shape_vec((rows, cols), data)?)
    }

    fn write(object: &Object, name: &str, value: &Self) -> Result<(), anyhow::Error> {
        let dtype = T::datatype()?;
        let dims: [hsize_t; 2] = [value.nrows() as hsize_t, value.ncols() as hsize_t];
        let space = Handle::try_new(
            unsafe { H5Screate_simple(2, dims.as_ptr(), ptr::null()) },
            Kind::Dataspace,
        )?;
        let attr = create_attr(object, name, dtype.id(), space.id())?;

        let data: Vec<T> = value.iter().copied().collect();
        h5check!(H5Awrite(
            attr.id(),
            dtype.id(),
            data.as_ptr() as *const c_void
        ))?;
        Ok(())
    }
}
