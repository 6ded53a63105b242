//! A typed, rectangular array stored under a name, with full, selection and
//! hyperslab writes.

use std::marker::PhantomData;
use std::ops::Deref;
use std::os::raw::{c_int, c_void};
use std::ptr;

use anyhow::Context;
use hdf5_sys::h5::hsize_t;
use hdf5_sys::h5d::{H5Dcreate2, H5Dget_space, H5Dget_type, H5Dopen2, H5Dread, H5Dwrite};
use hdf5_sys::h5i::hid_t;
use hdf5_sys::h5p::H5P_DEFAULT;
use hdf5_sys::h5s::{
    H5S_seloper_t, H5Screate_simple, H5Sget_simple_extent_dims, H5Sget_simple_extent_ndims,
    H5Sselect_elements, H5Sselect_hyperslab, H5Sselect_none, H5S_ALL,
};
use hdf5_sys::h5t::H5Tequal;
use log::debug;
use ndarray::Array2;

#[cfg(feature = "mpio")]
use hdf5_sys::h5fd::H5FD_mpio_xfer_t;
#[cfg(feature = "mpio")]
use hdf5_sys::h5p::{H5Pcreate, H5Pset_dxpl_mpio, H5P_CLS_DATASET_XFER};

use crate::datatype::{Datatype, Element};
use crate::handle::{h5check, to_cstring, Handle, Kind};
use crate::object::Object;

/// One typed, rectangular array stored under a name.
///
/// The dataset handle and its dataspace are released in that order: field
/// declaration order is drop order.
#[derive(Debug)]
pub struct Dataset<T: Element> {
    object: Object,
    space: Handle,
    dims: Vec<hsize_t>,
    size: usize,
    dtype: Datatype,
    _element: PhantomData<T>,
}

impl<T: Element> Deref for Dataset<T> {
    type Target = Object;

    fn deref(&self) -> &Object {
        &self.object
    }
}

impl<T: Element> Dataset<T> {
    /// Declare a brand-new array of the given dimensions under `parent`.
    pub(crate) fn create(
        parent: hid_t,
        name: &str,
        shape: &[usize],
        mpi: bool,
    ) -> Result<Dataset<T>, anyhow::Error> {
        let dtype = T::datatype()?;
        let cname = to_cstring(name)?;
        let dims: Vec<hsize_t> = shape.iter().map(|&d| d as hsize_t).collect();

        let space = Handle::try_new(
            unsafe { H5Screate_simple(dims.len() as c_int, dims.as_ptr(), ptr::null()) },
            Kind::Dataspace,
        )?;
        let handle = Handle::try_new(
            unsafe {
                H5Dcreate2(
                    parent,
                    cname.as_ptr(),
                    dtype.id(),
                    space.id(),
                    H5P_DEFAULT,
                    H5P_DEFAULT,
                    H5P_DEFAULT,
                )
            },
            Kind::Dataset,
        )
        .with_context(|| format!("could not create dataset {:?}", name))?;
        debug!("created dataset {:?}, shape {:?}", name, shape);

        let size = dims.iter().product::<hsize_t>() as usize;
        Ok(Dataset {
            object: Object::new(name.to_owned(), mpi, handle),
            space,
            dims,
            size,
            dtype,
            _element: PhantomData,
        })
    }

    /// Attach to the existing dataset `name` under `parent`.
    ///
    /// The handle obtained here is a dataset handle, never a group or other
    /// entity, the dataspace is derived from it, and the stored element type
    /// must match `T`.
    pub(crate) fn open(parent: hid_t, name: &str, mpi: bool) -> Result<Dataset<T>, anyhow::Error> {
        let dtype = T::datatype()?;
        let cname = to_cstring(name)?;

        let handle = Handle::try_new(
            unsafe { H5Dopen2(parent, cname.as_ptr(), H5P_DEFAULT) },
            Kind::Dataset,
        )
        .with_context(|| format!("could not open dataset {:?}", name))?;

        let stored = Handle::try_new(unsafe { H5Dget_type(handle.id()) }, Kind::Datatype)?;
        ensure!(
            h5check!(H5Tequal(stored.id(), dtype.id()))? > 0,
            "dataset {:?} does not store {}",
            name,
            std::any::type_name::<T>()
        );

        let space = Handle::try_new(unsafe { H5Dget_space(handle.id()) }, Kind::Dataspace)?;
        let rank = h5check!(H5Sget_simple_extent_ndims(space.id()))? as usize;
        let mut dims = vec![0 as hsize_t; rank];
        h5check!(H5Sget_simple_extent_dims(
            space.id(),
            dims.as_mut_ptr(),
            ptr::null_mut()
        ))?;
        debug!("opened dataset {:?}, shape {:?}", name, dims);

        let size = dims.iter().product::<hsize_t>() as usize;
        Ok(Dataset {
            object: Object::new(name.to_owned(), mpi, handle),
            space,
            dims,
            size,
            dtype,
            _element: PhantomData,
        })
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Per-axis extents.
    pub fn shape(&self) -> Vec<usize> {
        self.dims.iter().map(|&d| d as usize).collect()
    }

    /// Total number of elements over all axes.
    pub fn size(&self) -> usize {
        self.size
    }

    fn raw_write(
        &self,
        memory_space: hid_t,
        file_space: hid_t,
        data: *const c_void,
    ) -> Result<(), anyhow::Error> {
        let plist = transfer_list(self.is_collective())?;
        h5check!(H5Dwrite(
            self.id(),
            self.dtype.id(),
            memory_space,
            file_space,
            plist.id(),
            data
        ))?;
        Ok(())
    }

    /// Write the entire declared extent from a flat, row-major buffer.
    pub fn write(&self, data: &[T]) -> Result<(), anyhow::Error> {
        assert_eq!(
            data.len(),
            self.size,
            "buffer does not match the dataset extent"
        );
        self.raw_write(H5S_ALL, H5S_ALL, data.as_ptr() as *const c_void)
    }

    /// Write the entire declared extent from a dense matrix.
    pub fn write_matrix(&self, data: &Array2<T>) -> Result<(), anyhow::Error> {
        assert_eq!(
            data.len(),
            self.size,
            "matrix does not match the dataset extent"
        );
        match data.as_slice() {
            Some(slice) => self.raw_write(H5S_ALL, H5S_ALL, slice.as_ptr() as *const c_void),
            None => {
                let copied: Vec<T> = data.iter().copied().collect();
                self.raw_write(H5S_ALL, H5S_ALL, copied.as_ptr() as *const c_void)
            }
        }
    }

    /// Write `data` to the elements named by `coordinates`: groups of
    /// [`rank()`](Self::rank) consecutive indices, one group per element of
    /// `data`.
    pub fn write_selection(&self, data: &[T], coordinates: &[usize]) -> Result<(), anyhow::Error> {
        assert_eq!(
            coordinates.len(),
            data.len() * self.rank(),
            "one coordinate per axis per element"
        );
        let coords: Vec<hsize_t> = coordinates.iter().map(|&c| c as hsize_t).collect();

        let memory = flat_space(data.len())?;
        h5check!(H5Sselect_elements(
            self.space.id(),
            H5S_seloper_t::H5S_SELECT_SET,
            data.len(),
            coords.as_ptr()
        ))?;
        self.raw_write(memory.id(), self.space.id(), data.as_ptr() as *const c_void)
    }

    /// Write `data` into the contiguous rectangular block of extent `count`
    /// starting at `offset`.
    pub fn write_hyperslab(
        &self,
        data: &[T],
        offset: &[usize],
        count: &[usize],
    ) -> Result<(), anyhow::Error> {
        self.select_hyperslab(data.len(), offset, count)?;
        let memory = flat_space(data.len())?;
        self.raw_write(memory.id(), self.space.id(), data.as_ptr() as *const c_void)
    }

    /// Matrix form of [`write_hyperslab`](Self::write_hyperslab).
    pub fn write_hyperslab_matrix(
        &self,
        data: &Array2<T>,
        offset: &[usize],
        count: &[usize],
    ) -> Result<(), anyhow::Error> {
        self.select_hyperslab(data.len(), offset, count)?;
        let dims: [hsize_t; 2] = [data.nrows() as hsize_t, data.ncols() as hsize_t];
        let memory = Handle::try_new(
            unsafe { H5Screate_simple(2, dims.as_ptr(), ptr::null()) },
            Kind::Dataspace,
        )?;
        match data.as_slice() {
            Some(slice) => {
                self.raw_write(memory.id(), self.space.id(), slice.as_ptr() as *const c_void)
            }
            None => {
                let copied: Vec<T> = data.iter().copied().collect();
                self.raw_write(memory.id(), self.space.id(), copied.as_ptr() as *const c_void)
            }
        }
    }

    fn select_hyperslab(
        &self,
        len: usize,
        offset: &[usize],
        count: &[usize],
    ) -> Result<(), anyhow::Error> {
        assert_eq!(offset.len(), self.rank(), "offset must name every axis");
        assert_eq!(count.len(), self.rank(), "count must name every axis");
        assert_eq!(
            count.iter().product::<usize>(),
            len,
            "buffer does not match the selected block"
        );
        let offset: Vec<hsize_t> = offset.iter().map(|&o| o as hsize_t).collect();
        let count: Vec<hsize_t> = count.iter().map(|&c| c as hsize_t).collect();
        h5check!(H5Sselect_hyperslab(
            self.space.id(),
            H5S_seloper_t::H5S_SELECT_SET,
            offset.as_ptr(),
            ptr::null(),
            count.as_ptr(),
            ptr::null()
        ))?;
        Ok(())
    }

    /// Write nothing: an empty on-disk selection and a null buffer.
    ///
    /// Under collective I/O every rank of the communicator must issue a
    /// write in each round; ranks contributing zero elements issue this one,
    /// or the peers block forever.
    pub fn write_none(&self) -> Result<(), anyhow::Error> {
        let memory = flat_space(0)?;
        h5check!(H5Sselect_none(self.space.id()))?;
        self.raw_write(memory.id(), self.space.id(), ptr::null())
    }

    /// Read the entire extent into a flat, row-major vector.
    pub fn read(&self) -> Result<Vec<T>, anyhow::Error> {
        let plist = transfer_list(self.is_collective())?;
        let mut data = vec![T::default(); self.size];
        h5check!(H5Dread(
            self.id(),
            self.dtype.id(),
            H5S_ALL,
            H5S_ALL,
            plist.id(),
            data.as_mut_ptr() as *mut c_void
        ))?;
        Ok(data)
    }

    /// Read a rank-2 dataset into a dense matrix.
    pub fn read_matrix(&self) -> Result<Array2<T>, anyhow::Error> {
        assert_eq!(self.rank(), 2, "dataset {:?} is not a matrix", self.name());
        let (rows, cols) = (self.dims[0] as usize, self.dims[1] as usize);
        Ok(Array2::from_shape_vec((rows, cols), self.read()?)?)
    }
}

/// Rank-1 memory dataspace describing a flat buffer of `len` elements.
fn flat_space(len: usize) -> Result<Handle, anyhow::Error> {
    let dims: [hsize_t; 1] = [len as hsize_t];
    Handle::try_new(
        unsafe { H5Screate_simple(1, dims.as_ptr(), ptr::null()) },
        Kind::Dataspace,
    )
}

/// Transfer context for one data operation: a collective MPI transfer list
/// when the owning object is collective (released after the operation on all
/// paths), the library default otherwise.
fn transfer_list(collective: bool) -> Result<Handle, anyhow::Error> {
    if collective {
        collective_transfer_list()
    } else {
        Ok(Handle::borrowed(H5P_DEFAULT))
    }
}

#[cfg(feature = "mpio")]
fn collective_transfer_list() -> Result<Handle, anyhow::Error> {
    let plist = Handle::try_new(
        unsafe { H5Pcreate(*H5P_CLS_DATASET_XFER) },
        Kind::PropertyList,
    )?;
    h5check!(H5Pset_dxpl_mpio(
        plist.id(),
        H5FD_mpio_xfer_t::H5FD_MPIO_COLLECTIVE
    ))?;
    Ok(plist)
}

/// Objects can only be collective when a file was opened through the
/// parallel constructors, which require the `mpio` feature.
#[cfg(not(feature = "mpio"))]
fn collective_transfer_list() -> Result<Handle, anyhow::Error> {
    unreachable!("collective transfer requested, but MPI support is not compiled in");
}
